//! Liquidity-aware order routing.
//!
//! Turns a detected opportunity into an execution plan by slicing each leg
//! across venues in descending execution-quality order. Depth is pulled
//! from every non-stale venue holding the instrument, not only the pair
//! the spread was detected on: any venue can supply liquidity for a leg.
//!
//! The router reads aggregator state and nothing else. It never places
//! orders.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::aggregator::BookAggregator;
use crate::config::RouterConfig;
use crate::domain::{
    ExecutionPlan, ExecutionSlice, Opportunity, OrderBook, Price, Side, VenueDirectory, VenueId,
    VenueTier, Volume,
};
use crate::error::{Result, RouteError};

/// A venue's usable liquidity for one leg.
struct LegCandidate {
    venue: VenueId,
    top_price: Price,
    mid_price: Price,
    usable_depth: Volume,
    latency_ms: u64,
    score: f64,
}

/// Builds execution plans from live aggregated liquidity.
pub struct OrderRouter {
    aggregator: Arc<BookAggregator>,
    venues: Arc<VenueDirectory>,
    config: RouterConfig,
}

impl OrderRouter {
    /// Create a router reading from the given aggregator.
    #[must_use]
    pub fn new(
        aggregator: Arc<BookAggregator>,
        venues: Arc<VenueDirectory>,
        config: RouterConfig,
    ) -> Self {
        Self {
            aggregator,
            venues,
            config,
        }
    }

    /// Build a liquidity-aware execution plan for an opportunity.
    ///
    /// Allocation per venue is capped at `max_venue_fraction` of the
    /// requested amount and `max_depth_fraction` of the venue's usable
    /// depth, reserving headroom against adverse selection. When visible
    /// depth cannot cover the full request the plan is still returned with
    /// the slices that fit; the caller decides whether partial coverage is
    /// worth executing.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::OpportunityExpired`] when called past the
    /// opportunity deadline, and [`RouteError::NoLiquidity`] when either
    /// leg has no usable slice.
    pub fn plan(
        &self,
        opportunity: &Opportunity,
        max_total_amount: Volume,
        max_slippage_fraction: Decimal,
    ) -> Result<ExecutionPlan> {
        if opportunity.is_expired(Utc::now()) {
            return Err(RouteError::OpportunityExpired {
                id: opportunity.id(),
                expires_at: opportunity.expires_at(),
            }
            .into());
        }

        let instrument = opportunity.instrument();
        let snapshot = self.aggregator.snapshot(instrument);

        let mut slices = Vec::new();
        let mut mids: HashMap<VenueId, Price> = HashMap::new();

        for side in [Side::Buy, Side::Sell] {
            let candidates = self.leg_candidates(&snapshot, side, max_slippage_fraction);
            let leg = self.allocate_leg(opportunity, &candidates, side, max_total_amount);
            if leg.is_empty() {
                return Err(RouteError::NoLiquidity {
                    instrument: instrument.clone(),
                    side,
                }
                .into());
            }
            for candidate in &candidates {
                mids.insert(candidate.venue.clone(), candidate.mid_price);
            }
            slices.extend(leg);
        }

        let covered = slices
            .iter()
            .filter(|s| s.side == Side::Buy)
            .map(|s| s.amount)
            .sum::<Decimal>()
            .min(
                slices
                    .iter()
                    .filter(|s| s.side == Side::Sell)
                    .map(|s| s.amount)
                    .sum(),
            );
        if covered < max_total_amount {
            warn!(
                instrument = %instrument,
                requested = %max_total_amount,
                covered = %covered,
                "Routed partial coverage, visible depth exhausted"
            );
        }

        let total_cost = slices
            .iter()
            .filter(|s| s.side == Side::Buy)
            .map(|s| s.estimated_cost)
            .sum();
        let estimated_slippage = weighted_slippage(&slices, &mids);
        let estimated_duration = slices
            .iter()
            .map(|s| s.expected_fill_latency)
            .max()
            .unwrap_or(Duration::ZERO);
        let risk_score = self.risk_score(&slices, estimated_duration);

        debug!(
            opportunity = %opportunity.id(),
            slices = slices.len(),
            total_cost = %total_cost,
            risk_score,
            "Built execution plan"
        );

        Ok(ExecutionPlan::new(
            opportunity.id(),
            max_total_amount,
            slices,
            total_cost,
            estimated_slippage,
            estimated_duration,
            risk_score,
        ))
    }

    /// Usable liquidity per venue for one leg, best execution score first.
    fn leg_candidates(
        &self,
        snapshot: &HashMap<VenueId, OrderBook>,
        side: Side,
        max_slippage_fraction: Decimal,
    ) -> Vec<LegCandidate> {
        let mut candidates: Vec<LegCandidate> = snapshot
            .iter()
            .filter_map(|(venue, book)| {
                let levels = book.taker_levels(side);
                let top = levels.first()?.price();

                // Only depth priced within the slippage budget of the top
                // counts as usable.
                let bound = match side {
                    Side::Buy => top * (Decimal::ONE + max_slippage_fraction),
                    Side::Sell => top * (Decimal::ONE - max_slippage_fraction),
                };
                let usable_depth: Volume = levels
                    .iter()
                    .take(self.config.depth_levels)
                    .filter(|level| match side {
                        Side::Buy => level.price() <= bound,
                        Side::Sell => level.price() >= bound,
                    })
                    .map(|level| level.quantity())
                    .sum();
                if usable_depth <= Decimal::ZERO {
                    return None;
                }

                let latency_ms = self.venues.latency_ms(venue);
                let tier = self.venues.tier(venue);
                Some(LegCandidate {
                    venue: venue.clone(),
                    top_price: top,
                    mid_price: book.mid_price().unwrap_or(top),
                    usable_depth,
                    latency_ms,
                    score: self.execution_score(tier, usable_depth, latency_ms),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.venue.cmp(&b.venue))
        });
        candidates
    }

    /// Additive venue quality score clamped to [0, 1].
    fn execution_score(&self, tier: VenueTier, depth: Volume, latency_ms: u64) -> f64 {
        let score = &self.config.score;
        let tier_bonus = match tier {
            VenueTier::Tier1 => score.tier1_bonus,
            VenueTier::Tier2 => score.tier2_bonus,
            VenueTier::Tier3 => score.tier3_bonus,
        };
        let volume_bonus = (depth.to_f64().unwrap_or(0.0) / score.volume_saturation)
            .min(score.volume_bonus_cap);
        let latency_penalty =
            (latency_ms as f64 / score.latency_scale_ms).min(score.latency_penalty_cap);

        (score.base + tier_bonus + volume_bonus - latency_penalty).clamp(0.0, 1.0)
    }

    /// Greedily fill one leg across candidates in score order.
    fn allocate_leg(
        &self,
        opportunity: &Opportunity,
        candidates: &[LegCandidate],
        side: Side,
        max_total_amount: Volume,
    ) -> Vec<ExecutionSlice> {
        let mut slices = Vec::new();
        let mut remaining = max_total_amount;

        for candidate in candidates {
            if remaining <= Decimal::ZERO {
                break;
            }

            let amount = remaining
                .min(candidate.usable_depth * self.config.max_depth_fraction)
                .min(max_total_amount * self.config.max_venue_fraction);
            if amount < self.config.min_viable_amount {
                continue;
            }

            slices.push(ExecutionSlice {
                venue: candidate.venue.clone(),
                instrument: opportunity.instrument().clone(),
                side,
                amount,
                limit_price: candidate.top_price,
                expected_fill_latency: Duration::from_millis(candidate.latency_ms),
                estimated_cost: amount * candidate.top_price,
            });
            remaining -= amount;
        }

        slices
    }

    /// Composite execution risk: concentration, duration, and the share of
    /// capital outside tier-1 venues.
    fn risk_score(&self, slices: &[ExecutionSlice], duration: Duration) -> f64 {
        let risk = &self.config.risk;

        let mut venues: Vec<&VenueId> = slices.iter().map(|s| &s.venue).collect();
        venues.sort();
        venues.dedup();
        let concentration_risk = 1.0 - (venues.len() as f64 / risk.venue_spread_scale).min(1.0);

        let duration_risk = (duration.as_secs_f64() / risk.duration_scale_secs).min(1.0);

        let filled: Volume = slices.iter().map(|s| s.amount).sum();
        let tier1: Volume = slices
            .iter()
            .filter(|s| self.venues.tier(&s.venue) == VenueTier::Tier1)
            .map(|s| s.amount)
            .sum();
        let tier1_weight = if filled > Decimal::ZERO {
            (tier1 / filled).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };
        let tier_risk = 1.0 - tier1_weight;

        (risk.concentration_weight * concentration_risk
            + risk.duration_weight * duration_risk
            + risk.tier_weight * tier_risk)
            .clamp(0.0, 1.0)
    }
}

/// Liquidity-weighted average deviation of slice prices from their venue's
/// top-of-book mid.
fn weighted_slippage(slices: &[ExecutionSlice], mids: &HashMap<VenueId, Price>) -> Decimal {
    let total: Volume = slices.iter().map(|s| s.amount).sum();
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let mut weighted = Decimal::ZERO;
    for slice in slices {
        let Some(&mid) = mids.get(&slice.venue) else {
            continue;
        };
        if mid <= Decimal::ZERO {
            continue;
        }
        let deviation = (slice.limit_price - mid).abs() / mid;
        weighted += deviation * slice.amount;
    }
    weighted / total
}
