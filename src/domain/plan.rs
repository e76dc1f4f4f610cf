//! Execution plan types produced by the order router.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::ids::{InstrumentId, VenueId};
use super::money::{Price, Volume};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The portion of an order routed to one venue.
#[derive(Debug, Clone)]
pub struct ExecutionSlice {
    /// Target venue.
    pub venue: VenueId,
    /// Instrument being traded.
    pub instrument: InstrumentId,
    /// Side of this slice.
    pub side: Side,
    /// Quantity routed to the venue.
    pub amount: Volume,
    /// Limit price for the slice.
    pub limit_price: Price,
    /// Expected time for the venue to fill.
    pub expected_fill_latency: Duration,
    /// Notional value of the slice at the limit price.
    pub estimated_cost: Price,
}

/// Liquidity-aware execution plan for one opportunity.
///
/// Slices are ordered buy leg first, then sell leg, each leg in allocation
/// order. A plan may cover less than `total_amount` when visible depth runs
/// out; callers inspect [`ExecutionPlan::coverage_fraction`] and decide
/// whether partial coverage is still worth executing.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    opportunity_id: Uuid,
    total_amount: Volume,
    slices: Vec<ExecutionSlice>,
    total_cost: Price,
    estimated_slippage_fraction: Decimal,
    estimated_duration: Duration,
    risk_score: f64,
}

impl ExecutionPlan {
    /// Assemble a plan from routed slices.
    #[must_use]
    pub fn new(
        opportunity_id: Uuid,
        total_amount: Volume,
        slices: Vec<ExecutionSlice>,
        total_cost: Price,
        estimated_slippage_fraction: Decimal,
        estimated_duration: Duration,
        risk_score: f64,
    ) -> Self {
        Self {
            opportunity_id,
            total_amount,
            slices,
            total_cost,
            estimated_slippage_fraction,
            estimated_duration,
            risk_score: risk_score.clamp(0.0, 1.0),
        }
    }

    /// ID of the opportunity this plan executes.
    #[must_use]
    pub const fn opportunity_id(&self) -> Uuid {
        self.opportunity_id
    }

    /// Requested quantity per leg.
    #[must_use]
    pub const fn total_amount(&self) -> Volume {
        self.total_amount
    }

    /// All slices, buy leg before sell leg.
    #[must_use]
    pub fn slices(&self) -> &[ExecutionSlice] {
        &self.slices
    }

    /// Capital required to execute the buy leg.
    #[must_use]
    pub const fn total_cost(&self) -> Price {
        self.total_cost
    }

    /// Liquidity-weighted deviation from top-of-book mid.
    #[must_use]
    pub const fn estimated_slippage_fraction(&self) -> Decimal {
        self.estimated_slippage_fraction
    }

    /// Slowest slice's expected fill latency.
    #[must_use]
    pub const fn estimated_duration(&self) -> Duration {
        self.estimated_duration
    }

    /// Composite execution risk in [0, 1].
    #[must_use]
    pub const fn risk_score(&self) -> f64 {
        self.risk_score
    }

    /// Quantity covered on one leg.
    #[must_use]
    pub fn filled_amount(&self, side: Side) -> Volume {
        self.slices
            .iter()
            .filter(|s| s.side == side)
            .map(|s| s.amount)
            .sum()
    }

    /// Executable fraction of the requested amount.
    ///
    /// Limited by the thinner leg: an arbitrage quantity only exists where
    /// both legs are covered.
    #[must_use]
    pub fn coverage_fraction(&self) -> Decimal {
        if self.total_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let buy = self.filled_amount(Side::Buy);
        let sell = self.filled_amount(Side::Sell);
        buy.min(sell) / self.total_amount
    }

    /// Distinct venues receiving at least one slice.
    #[must_use]
    pub fn venues_used(&self) -> usize {
        let mut venues: Vec<&VenueId> = self.slices.iter().map(|s| &s.venue).collect();
        venues.sort();
        venues.dedup();
        venues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn slice(venue: &str, side: Side, amount: Decimal) -> ExecutionSlice {
        ExecutionSlice {
            venue: VenueId::from(venue),
            instrument: InstrumentId::from("BTC-USDT"),
            side,
            amount,
            limit_price: dec!(100),
            expected_fill_latency: Duration::from_millis(50),
            estimated_cost: amount * dec!(100),
        }
    }

    #[test]
    fn coverage_limited_by_thinner_leg() {
        let plan = ExecutionPlan::new(
            Uuid::new_v4(),
            dec!(10),
            vec![
                slice("a", Side::Buy, dec!(10)),
                slice("b", Side::Sell, dec!(4)),
            ],
            dec!(1000),
            dec!(0.001),
            Duration::from_millis(50),
            0.2,
        );

        assert_eq!(plan.filled_amount(Side::Buy), dec!(10));
        assert_eq!(plan.filled_amount(Side::Sell), dec!(4));
        assert_eq!(plan.coverage_fraction(), dec!(0.4));
    }

    #[test]
    fn venues_used_deduplicates() {
        let plan = ExecutionPlan::new(
            Uuid::new_v4(),
            dec!(10),
            vec![
                slice("a", Side::Buy, dec!(5)),
                slice("b", Side::Buy, dec!(5)),
                slice("a", Side::Sell, dec!(10)),
            ],
            dec!(1000),
            dec!(0.001),
            Duration::from_millis(50),
            0.2,
        );

        assert_eq!(plan.venues_used(), 2);
    }

    #[test]
    fn risk_score_is_clamped() {
        let plan = ExecutionPlan::new(
            Uuid::new_v4(),
            dec!(1),
            vec![],
            dec!(0),
            dec!(0),
            Duration::ZERO,
            1.4,
        );

        assert_eq!(plan.risk_score(), 1.0);
    }
}
