//! Order book types with invariant validation.
//!
//! An [`OrderBook`] is a validated snapshot: bids strictly descending, asks
//! strictly ascending, every level positive. Snapshots are replaced
//! wholesale on update, never patched in place, so a book that exists is
//! always internally consistent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ids::{InstrumentId, VenueId};
use super::money::{Price, Volume};
use super::plan::Side;
use crate::error::BookError;

/// A single price level in the order book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevel {
    price: Price,
    quantity: Volume,
}

impl PriceLevel {
    /// Create a new price level.
    #[must_use]
    pub const fn new(price: Price, quantity: Volume) -> Self {
        Self { price, quantity }
    }

    /// Get the price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Get the quantity available at this price.
    #[must_use]
    pub const fn quantity(&self) -> Volume {
        self.quantity
    }
}

/// Validated order book snapshot for one instrument on one venue.
#[derive(Debug, Clone)]
pub struct OrderBook {
    venue: VenueId,
    instrument: InstrumentId,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    observed_at: DateTime<Utc>,
}

impl OrderBook {
    /// Build a snapshot, validating book invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BookError`] when a level has a non-positive price or
    /// quantity, bids are not strictly descending, or asks are not strictly
    /// ascending.
    pub fn try_new(
        venue: VenueId,
        instrument: InstrumentId,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        observed_at: DateTime<Utc>,
    ) -> Result<Self, BookError> {
        validate_levels(&bids)?;
        validate_levels(&asks)?;

        for (index, pair) in bids.windows(2).enumerate() {
            if pair[1].price >= pair[0].price {
                return Err(BookError::MisorderedBids { index: index + 1 });
            }
        }
        for (index, pair) in asks.windows(2).enumerate() {
            if pair[1].price <= pair[0].price {
                return Err(BookError::MisorderedAsks { index: index + 1 });
            }
        }

        Ok(Self {
            venue,
            instrument,
            bids,
            asks,
            observed_at,
        })
    }

    /// Get the venue this snapshot came from.
    #[must_use]
    pub const fn venue(&self) -> &VenueId {
        &self.venue
    }

    /// Get the instrument.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Get all bid levels, best first.
    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    /// Get all ask levels, best first.
    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    /// When the venue observed this snapshot.
    #[must_use]
    pub const fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Best bid (highest buy price).
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Best ask (lowest sell price).
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Levels on the side a taker order of `side` would consume.
    ///
    /// A buy consumes asks, a sell consumes bids.
    #[must_use]
    pub fn taker_levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }

    /// Top-of-book mid price, when both sides are quoted.
    #[must_use]
    pub fn mid_price(&self) -> Option<Price> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some((bid + ask) / Decimal::TWO)
    }
}

fn validate_levels(levels: &[PriceLevel]) -> Result<(), BookError> {
    for (index, level) in levels.iter().enumerate() {
        if level.price <= Decimal::ZERO || level.quantity <= Decimal::ZERO {
            return Err(BookError::InvalidLevel {
                index,
                price: level.price,
                quantity: level.quantity,
            });
        }
    }
    Ok(())
}
