//! Builders for domain primitives used across tests.
//!
//! Provides concise factory functions for [`OrderBook`], [`TradeRecord`],
//! and identifier types so tests focus on assertions rather than
//! construction boilerplate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    InstrumentId, OrderBook, PriceLevel, Side, TradeRecord, VenueId,
};

/// Create a [`VenueId`] from a string.
pub fn venue(id: &str) -> VenueId {
    VenueId::from(id)
}

/// Create an [`InstrumentId`] from a string.
pub fn instrument(id: &str) -> InstrumentId {
    InstrumentId::from(id)
}

/// Build levels from (price, quantity) pairs.
pub fn levels(pairs: &[(Decimal, Decimal)]) -> Vec<PriceLevel> {
    pairs
        .iter()
        .map(|(price, quantity)| PriceLevel::new(*price, *quantity))
        .collect()
}

/// Build a valid order book observed now.
///
/// # Panics
///
/// Panics when the levels violate book invariants; fixtures are expected
/// to be well formed.
pub fn book(
    venue_id: &str,
    instrument_id: &str,
    bids: &[(Decimal, Decimal)],
    asks: &[(Decimal, Decimal)],
) -> OrderBook {
    book_at(venue_id, instrument_id, bids, asks, Utc::now())
}

/// Build a valid order book with an explicit observation time.
///
/// # Panics
///
/// Panics when the levels violate book invariants.
pub fn book_at(
    venue_id: &str,
    instrument_id: &str,
    bids: &[(Decimal, Decimal)],
    asks: &[(Decimal, Decimal)],
    observed_at: DateTime<Utc>,
) -> OrderBook {
    OrderBook::try_new(
        venue(venue_id),
        instrument(instrument_id),
        levels(bids),
        levels(asks),
        observed_at,
    )
    .expect("test book should satisfy invariants")
}

/// Build a resolved trade with the given profit and timestamp.
///
/// # Panics
///
/// Panics when the builder rejects the fixture, which would be a bug in
/// the fixture itself.
pub fn trade_at(strategy_key: &str, profit_loss: Decimal, timestamp: DateTime<Utc>) -> TradeRecord {
    TradeRecord::builder()
        .strategy_key(strategy_key)
        .instrument(instrument("BTC-USDT"))
        .venue(venue("kraken"))
        .side(Side::Buy)
        .amount(Decimal::ONE)
        .prices(Decimal::ONE_HUNDRED, Decimal::ONE_HUNDRED + profit_loss)
        .profit_loss(profit_loss)
        .timestamp(timestamp)
        .success(profit_loss >= Decimal::ZERO)
        .build()
        .expect("test trade should satisfy builder requirements")
}
