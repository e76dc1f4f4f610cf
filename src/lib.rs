//! Crossbook - cross-venue spatial arbitrage core.
//!
//! This crate detects transient price dislocations for the same instrument
//! across trading venues and converts them into sized, liquidity-aware
//! execution plans. It owns decisions, not execution: venue connectivity and
//! order placement live in external collaborators that push book updates in
//! and report trade outcomes back.
//!
//! # Architecture
//!
//! The pipeline is a closed loop of five components:
//!
//! - [`aggregator::BookAggregator`] - normalizes and holds the latest order
//!   book per (venue, instrument), dropping malformed or stale snapshots
//! - [`detector::SpreadDetector`] - scans the aggregate for profitable
//!   cross-venue spreads and emits ranked [`domain::Opportunity`] values
//! - [`router::OrderRouter`] - slices an opportunity across venues by
//!   execution quality and visible depth, producing an
//!   [`domain::ExecutionPlan`]
//! - [`sizer::KellySizer`] - scales plan notional by a Kelly-derived capital
//!   fraction computed from rolling per-strategy statistics
//! - [`ledger::PerformanceLedger`] - records resolved trades and derives the
//!   performance metrics that feed back into sizing
//!
//! # Modules
//!
//! - [`config`] - Typed configuration loaded from TOML with validation
//! - [`domain`] - Venue-agnostic types: books, opportunities, plans, trades
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use crossbook::aggregator::BookAggregator;
//! use crossbook::config::Config;
//! use crossbook::detector::SpreadDetector;
//! use crossbook::domain::{InstrumentId, VenueDirectory};
//!
//! let config = Config::default();
//! let venues = Arc::new(VenueDirectory::new());
//! let aggregator = Arc::new(BookAggregator::new(config.aggregator.clone()));
//! let detector = SpreadDetector::new(
//!     aggregator.clone(),
//!     venues.clone(),
//!     config.detector.clone(),
//! );
//!
//! let opportunities = detector.scan(&InstrumentId::from("BTC-USDT"));
//! ```

pub mod aggregator;
pub mod config;
pub mod detector;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod router;
pub mod sizer;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use error::{Error, Result};
