//! Resolved trade records reported by the execution collaborator.
//!
//! A [`TradeRecord`] is append-only: never mutated after creation, only
//! superseded by new records. Use [`TradeRecord::builder`] to construct
//! instances; the builder fills bookkeeping defaults (ID, timestamp) and
//! rejects records missing required economics.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ids::{InstrumentId, VenueId};
use super::money::{Price, Volume};
use super::plan::Side;

/// Error returned when building a TradeRecord fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeBuildError {
    /// Strategy key is required but was not provided.
    MissingStrategyKey,
    /// Instrument is required but was not provided.
    MissingInstrument,
    /// Venue is required but was not provided.
    MissingVenue,
    /// Side is required but was not provided.
    MissingSide,
    /// Amount is required but was not provided.
    MissingAmount,
    /// Entry and exit prices are required but were not provided.
    MissingPrices,
    /// Realized profit or loss is required but was not provided.
    MissingProfitLoss,
}

impl fmt::Display for TradeBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStrategyKey => write!(f, "strategy_key is required"),
            Self::MissingInstrument => write!(f, "instrument is required"),
            Self::MissingVenue => write!(f, "venue is required"),
            Self::MissingSide => write!(f, "side is required"),
            Self::MissingAmount => write!(f, "amount is required"),
            Self::MissingPrices => write!(f, "entry_price and exit_price are required"),
            Self::MissingProfitLoss => write!(f, "profit_loss is required"),
        }
    }
}

impl std::error::Error for TradeBuildError {}

/// A resolved trade as reported back by the execution collaborator.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    id: Uuid,
    strategy_key: String,
    instrument: InstrumentId,
    venue: VenueId,
    side: Side,
    amount: Volume,
    entry_price: Price,
    exit_price: Price,
    profit_loss: Decimal,
    fees: Decimal,
    execution_time: Duration,
    slippage: Decimal,
    timestamp: DateTime<Utc>,
    success: bool,
}

impl TradeRecord {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> TradeRecordBuilder {
        TradeRecordBuilder::default()
    }

    /// Get the trade ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the strategy key.
    #[must_use]
    pub fn strategy_key(&self) -> &str {
        &self.strategy_key
    }

    /// Get the instrument.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Get the venue the trade executed on.
    #[must_use]
    pub const fn venue(&self) -> &VenueId {
        &self.venue
    }

    /// Get the side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Get the executed quantity.
    #[must_use]
    pub const fn amount(&self) -> Volume {
        self.amount
    }

    /// Get the entry price.
    #[must_use]
    pub const fn entry_price(&self) -> Price {
        self.entry_price
    }

    /// Get the exit price.
    #[must_use]
    pub const fn exit_price(&self) -> Price {
        self.exit_price
    }

    /// Realized profit (positive) or loss (negative), gross of fees.
    #[must_use]
    pub const fn profit_loss(&self) -> Decimal {
        self.profit_loss
    }

    /// Fees paid.
    #[must_use]
    pub const fn fees(&self) -> Decimal {
        self.fees
    }

    /// Wall-clock execution time.
    #[must_use]
    pub const fn execution_time(&self) -> Duration {
        self.execution_time
    }

    /// Realized slippage fraction.
    #[must_use]
    pub const fn slippage(&self) -> Decimal {
        self.slippage
    }

    /// Logical trade timestamp used for rollups and drawdown ordering.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether the execution collaborator reports the trade as filled.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }
}

/// Builder for [`TradeRecord`] instances.
#[derive(Debug, Default)]
pub struct TradeRecordBuilder {
    strategy_key: Option<String>,
    instrument: Option<InstrumentId>,
    venue: Option<VenueId>,
    side: Option<Side>,
    amount: Option<Volume>,
    entry_price: Option<Price>,
    exit_price: Option<Price>,
    profit_loss: Option<Decimal>,
    fees: Decimal,
    execution_time: Duration,
    slippage: Decimal,
    timestamp: Option<DateTime<Utc>>,
    success: bool,
}

impl TradeRecordBuilder {
    /// Set the strategy key.
    pub fn strategy_key(mut self, key: impl Into<String>) -> Self {
        self.strategy_key = Some(key.into());
        self
    }

    /// Set the instrument.
    pub fn instrument(mut self, instrument: InstrumentId) -> Self {
        self.instrument = Some(instrument);
        self
    }

    /// Set the venue.
    pub fn venue(mut self, venue: VenueId) -> Self {
        self.venue = Some(venue);
        self
    }

    /// Set the side.
    pub fn side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Set the executed quantity.
    pub fn amount(mut self, amount: Volume) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set entry and exit prices.
    pub fn prices(mut self, entry: Price, exit: Price) -> Self {
        self.entry_price = Some(entry);
        self.exit_price = Some(exit);
        self
    }

    /// Set realized profit or loss, gross of fees.
    pub fn profit_loss(mut self, profit_loss: Decimal) -> Self {
        self.profit_loss = Some(profit_loss);
        self
    }

    /// Set fees paid. Defaults to zero.
    pub fn fees(mut self, fees: Decimal) -> Self {
        self.fees = fees;
        self
    }

    /// Set execution time. Defaults to zero.
    pub fn execution_time(mut self, execution_time: Duration) -> Self {
        self.execution_time = execution_time;
        self
    }

    /// Set realized slippage fraction. Defaults to zero.
    pub fn slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    /// Set the logical timestamp. Defaults to now.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Mark the trade as filled or rejected. Defaults to rejected.
    pub fn success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }

    /// Build the record.
    ///
    /// # Errors
    ///
    /// Returns [`TradeBuildError`] if any required field is missing.
    pub fn build(self) -> Result<TradeRecord, TradeBuildError> {
        Ok(TradeRecord {
            id: Uuid::new_v4(),
            strategy_key: self
                .strategy_key
                .ok_or(TradeBuildError::MissingStrategyKey)?,
            instrument: self.instrument.ok_or(TradeBuildError::MissingInstrument)?,
            venue: self.venue.ok_or(TradeBuildError::MissingVenue)?,
            side: self.side.ok_or(TradeBuildError::MissingSide)?,
            amount: self.amount.ok_or(TradeBuildError::MissingAmount)?,
            entry_price: self.entry_price.ok_or(TradeBuildError::MissingPrices)?,
            exit_price: self.exit_price.ok_or(TradeBuildError::MissingPrices)?,
            profit_loss: self.profit_loss.ok_or(TradeBuildError::MissingProfitLoss)?,
            fees: self.fees,
            execution_time: self.execution_time,
            slippage: self.slippage,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            success: self.success,
        })
    }
}
