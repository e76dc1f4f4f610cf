//! Detected cross-venue spread opportunities.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::ids::{InstrumentId, VenueId};
use super::money::{Price, Volume};

/// A detected spatial arbitrage opportunity.
///
/// Created by the detector, read-only downstream. `expires_at` is a hard
/// validity deadline: book-derived spreads decay in seconds, so every
/// consumer must re-check [`Opportunity::is_expired`] before acting.
#[derive(Debug, Clone)]
pub struct Opportunity {
    id: Uuid,
    instrument: InstrumentId,
    buy_venue: VenueId,
    sell_venue: VenueId,
    buy_price: Price,
    sell_price: Price,
    profit_fraction: Price,
    profit_notional_estimate: Price,
    confidence: f64,
    detected_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Opportunity {
    /// Create an opportunity, calculating derived fields.
    ///
    /// `tradable_quantity` is the quantity executable at top of book on
    /// both legs; it feeds the notional profit estimate. `buy_price` must
    /// be positive, which book validation guarantees for any price taken
    /// from an [`super::OrderBook`].
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        instrument: InstrumentId,
        buy_venue: VenueId,
        sell_venue: VenueId,
        buy_price: Price,
        sell_price: Price,
        tradable_quantity: Volume,
        confidence: f64,
        detected_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let spread = sell_price - buy_price;
        Self {
            id: Uuid::new_v4(),
            instrument,
            buy_venue,
            sell_venue,
            buy_price,
            sell_price,
            profit_fraction: spread / buy_price,
            profit_notional_estimate: spread * tradable_quantity,
            confidence: confidence.clamp(0.0, 1.0),
            detected_at,
            expires_at: detected_at + ttl,
        }
    }

    /// Get the opportunity ID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Get the instrument.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    /// Venue offering the cheaper ask.
    #[must_use]
    pub const fn buy_venue(&self) -> &VenueId {
        &self.buy_venue
    }

    /// Venue offering the richer bid.
    #[must_use]
    pub const fn sell_venue(&self) -> &VenueId {
        &self.sell_venue
    }

    /// Best ask on the buy venue at detection time.
    #[must_use]
    pub const fn buy_price(&self) -> Price {
        self.buy_price
    }

    /// Best bid on the sell venue at detection time.
    #[must_use]
    pub const fn sell_price(&self) -> Price {
        self.sell_price
    }

    /// Spread as a fraction of the buy price.
    #[must_use]
    pub const fn profit_fraction(&self) -> Price {
        self.profit_fraction
    }

    /// Spread times the top-of-book tradable quantity.
    #[must_use]
    pub const fn profit_notional_estimate(&self) -> Price {
        self.profit_notional_estimate
    }

    /// Detection confidence in [0, 1].
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// When the spread was observed.
    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Hard validity deadline.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true once the validity deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
