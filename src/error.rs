use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{InstrumentId, Side, VenueId};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Order-book validation errors.
///
/// Returned when a snapshot violates book invariants or arrives out of
/// order. A rejected snapshot is never partially applied.
#[derive(Error, Debug, Clone)]
pub enum BookError {
    /// Bid levels must be strictly descending in price.
    #[error("bids not strictly descending at level {index}")]
    MisorderedBids { index: usize },

    /// Ask levels must be strictly ascending in price.
    #[error("asks not strictly ascending at level {index}")]
    MisorderedAsks { index: usize },

    /// Every level needs a positive price and quantity.
    #[error("level {index} has non-positive price {price} or quantity {quantity}")]
    InvalidLevel {
        index: usize,
        price: Decimal,
        quantity: Decimal,
    },

    /// Snapshot is older than the one currently held for this key.
    #[error(
        "stale snapshot for {venue}/{instrument}: offered {offered}, holding {held}"
    )]
    StaleSnapshot {
        venue: VenueId,
        instrument: InstrumentId,
        held: DateTime<Utc>,
        offered: DateTime<Utc>,
    },
}

/// Routing errors.
#[derive(Error, Debug, Clone)]
pub enum RouteError {
    /// No venue offers usable depth for a required leg. The plan request
    /// fails closed rather than returning an empty plan.
    #[error("no usable {side} liquidity for {instrument}")]
    NoLiquidity {
        instrument: InstrumentId,
        side: Side,
    },

    /// The opportunity's validity deadline has passed.
    #[error("opportunity {id} expired at {expires_at}")]
    OpportunityExpired {
        id: Uuid,
        expires_at: DateTime<Utc>,
    },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Book(#[from] BookError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

pub type Result<T> = std::result::Result<T, Error>;
