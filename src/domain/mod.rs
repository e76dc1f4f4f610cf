//! Venue-agnostic domain types.

mod book;
mod ids;
mod money;
mod opportunity;
mod plan;
mod stats;
mod strategy;
mod trade;
mod venue;

pub use book::{OrderBook, PriceLevel};
pub use ids::{InstrumentId, VenueId};
pub use money::{Price, Volume};
pub use opportunity::Opportunity;
pub use plan::{ExecutionPlan, ExecutionSlice, Side};
pub use stats::{PerformanceMetrics, PerformanceReport, StrategyStats};
pub use strategy::StrategyKind;
pub use trade::{TradeBuildError, TradeRecord, TradeRecordBuilder};
pub use venue::{VenueDirectory, VenueProfile, VenueTier};
