//! Kelly-criterion position sizing from rolling trade statistics.
//!
//! Sizing learns from outcomes: each resolved trade updates a bounded
//! per-strategy history, and the Kelly fraction derived from that history
//! scales how much capital the next opportunity receives. Strategies with
//! thin history are deliberately under-sized until enough evidence
//! accrues; a negative-edge strategy sizes to zero, never short.

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use parking_lot::RwLock;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use tracing::debug;
use uuid::Uuid;

use crate::config::SizerConfig;
use crate::domain::{StrategyKind, StrategyStats};

/// Risk scores below this floor are treated as this floor when ranking
/// opportunities, so a near-zero denominator cannot dominate the ordering.
const RISK_FLOOR: f64 = 0.1;

/// A resolved outcome reported back by the execution collaborator.
#[derive(Debug, Clone)]
struct TradeOutcome {
    strategy_key: String,
    profit: Decimal,
    #[allow(dead_code)]
    return_fraction: Decimal,
}

/// Cached statistics with their computation time.
///
/// Staleness is checked at read time; there is no background expiry.
struct CachedStats {
    stats: StrategyStats,
    computed_at: Instant,
}

/// Sizing request for one opportunity in a portfolio allocation.
#[derive(Debug, Clone)]
pub struct SizingRequest {
    /// Opportunity being sized.
    pub opportunity_id: Uuid,
    /// Strategy key for statistics lookup.
    pub strategy_key: String,
    /// Expected profit of the full execution plan.
    pub expected_profit: Decimal,
    /// Execution risk score of the plan, in [0, 1].
    pub risk_score: f64,
}

/// Kelly-criterion position sizer.
pub struct KellySizer {
    config: SizerConfig,
    history: RwLock<VecDeque<TradeOutcome>>,
    cache: RwLock<HashMap<String, CachedStats>>,
    volatility_factor: RwLock<f64>,
}

impl KellySizer {
    /// Create a sizer with an empty outcome history.
    #[must_use]
    pub fn new(config: SizerConfig) -> Self {
        let volatility = config.default_volatility_factor;
        Self {
            config,
            history: RwLock::new(VecDeque::new()),
            cache: RwLock::new(HashMap::new()),
            volatility_factor: RwLock::new(volatility),
        }
    }

    /// Update the market volatility discount from an external signal.
    ///
    /// Values below 1 shrink every subsequent sizing decision.
    pub fn set_volatility_factor(&self, factor: f64) {
        *self.volatility_factor.write() = factor.clamp(0.0, 1.0);
    }

    /// Capital to allocate to one opportunity.
    ///
    /// With fewer than the configured minimum of resolved outcomes for the
    /// strategy, or a history without both wins and losses, returns the
    /// conservative default of half the maximum position. Otherwise the
    /// raw Kelly fraction `(b*p - q) / b` is clamped non-negative,
    /// discounted by execution risk, strategy-kind conservatism, and the
    /// volatility factor, then capped at `max_position_fraction` and the
    /// absolute hard cap.
    #[must_use]
    pub fn size(
        &self,
        strategy_key: &str,
        expected_profit_fraction: Decimal,
        estimated_risk: f64,
        available_capital: Decimal,
        max_position_fraction: f64,
    ) -> Decimal {
        let default_size = available_capital
            * Decimal::from_f64(max_position_fraction / 2.0).unwrap_or(Decimal::ZERO);

        let stats = self.strategy_stats(strategy_key);
        if stats.sample_count < self.config.min_sample_size
            || stats.avg_loss <= Decimal::ZERO
            || stats.avg_win <= Decimal::ZERO
        {
            debug!(
                strategy = strategy_key,
                samples = stats.sample_count,
                "Insufficient history, using conservative default size"
            );
            return default_size;
        }

        let raw = kelly_fraction(
            stats.win_rate,
            stats.avg_win.to_f64().unwrap_or(0.0),
            stats.avg_loss.to_f64().unwrap_or(0.0),
        );

        let kind = StrategyKind::from_key(strategy_key);
        let adjusted = raw
            * (1.0 - 0.5 * estimated_risk.clamp(0.0, 1.0))
            * self.conservatism(kind)
            * *self.volatility_factor.read();

        let final_fraction = adjusted
            .min(max_position_fraction)
            .min(self.config.kelly_hard_cap)
            .max(0.0);

        debug!(
            strategy = strategy_key,
            expected_profit_fraction = %expected_profit_fraction,
            raw,
            adjusted,
            final_fraction,
            "Kelly sizing"
        );

        available_capital * Decimal::from_f64(final_fraction).unwrap_or(Decimal::ZERO)
    }

    /// Allocate capital across several opportunities.
    ///
    /// Opportunities are ranked by expected profit per unit of risk,
    /// descending, with the opportunity ID as a tie-break so the same
    /// input always produces the same allocation. Capital is granted
    /// greedily against the remaining balance until it is exhausted.
    #[must_use]
    pub fn allocate_portfolio(
        &self,
        requests: &[SizingRequest],
        total_capital: Decimal,
    ) -> HashMap<Uuid, Decimal> {
        let mut ordered: Vec<&SizingRequest> = requests.iter().collect();
        ordered.sort_by(|a, b| {
            let ratio_a = a.expected_profit.to_f64().unwrap_or(0.0) / a.risk_score.max(RISK_FLOOR);
            let ratio_b = b.expected_profit.to_f64().unwrap_or(0.0) / b.risk_score.max(RISK_FLOOR);
            ratio_b
                .partial_cmp(&ratio_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.opportunity_id.cmp(&b.opportunity_id))
        });

        let mut allocations = HashMap::new();
        let mut remaining = total_capital;

        for request in ordered {
            if remaining <= Decimal::ZERO {
                break;
            }
            let amount = self.size(
                &request.strategy_key,
                request.expected_profit,
                request.risk_score,
                remaining,
                self.config.max_position_fraction,
            );
            if amount > Decimal::ZERO {
                allocations.insert(request.opportunity_id, amount);
                remaining -= amount;
            }
        }

        allocations
    }

    /// Record a resolved trade outcome.
    ///
    /// Appends to the bounded history (oldest outcomes fall off past the
    /// retention limit) and invalidates the cached statistics for the
    /// strategy so the next sizing call recomputes them.
    pub fn record_outcome(&self, strategy_key: &str, profit: Decimal, capital_used: Decimal) {
        let return_fraction = if capital_used > Decimal::ZERO {
            profit / capital_used
        } else {
            Decimal::ZERO
        };

        {
            let mut history = self.history.write();
            history.push_back(TradeOutcome {
                strategy_key: strategy_key.to_string(),
                profit,
                return_fraction,
            });
            while history.len() > self.config.history_retention {
                history.pop_front();
            }
        }

        self.cache.write().remove(strategy_key);
    }

    /// Rolling statistics for a strategy, recomputed when the cached value
    /// is older than the configured TTL.
    #[must_use]
    pub fn strategy_stats(&self, strategy_key: &str) -> StrategyStats {
        {
            let cache = self.cache.read();
            if let Some(entry) = cache.get(strategy_key) {
                if entry.computed_at.elapsed().as_secs() < self.config.stats_cache_ttl_secs {
                    return entry.stats.clone();
                }
            }
        }

        let stats = self.compute_stats(strategy_key);
        self.cache.write().insert(
            strategy_key.to_string(),
            CachedStats {
                stats: stats.clone(),
                computed_at: Instant::now(),
            },
        );
        stats
    }

    fn compute_stats(&self, strategy_key: &str) -> StrategyStats {
        let history = self.history.read();
        let outcomes: Vec<&TradeOutcome> = history
            .iter()
            .filter(|o| o.strategy_key == strategy_key)
            .collect();

        let wins: Vec<Decimal> = outcomes
            .iter()
            .filter(|o| o.profit > Decimal::ZERO)
            .map(|o| o.profit)
            .collect();
        let losses: Vec<Decimal> = outcomes
            .iter()
            .filter(|o| o.profit < Decimal::ZERO)
            .map(|o| -o.profit)
            .collect();

        let sample_count = outcomes.len();
        let win_rate = if sample_count > 0 {
            wins.len() as f64 / sample_count as f64
        } else {
            0.0
        };
        let avg_win = mean(&wins);
        let avg_loss = mean(&losses);

        StrategyStats {
            strategy_key: strategy_key.to_string(),
            win_rate,
            avg_win,
            avg_loss,
            sample_count,
        }
    }

    fn conservatism(&self, kind: Option<StrategyKind>) -> f64 {
        let factors = &self.config.conservatism;
        match kind {
            Some(StrategyKind::Spatial) => factors.spatial,
            Some(StrategyKind::Triangular) => factors.triangular,
            Some(StrategyKind::CrossChain) => factors.cross_chain,
            Some(StrategyKind::FundingRate) => factors.funding_rate,
            Some(StrategyKind::Statistical) => factors.statistical,
            None => factors.unknown,
        }
    }
}

/// Raw Kelly fraction `(b*p - q) / b`, clamped non-negative.
///
/// `b` is the win/loss payoff ratio, `p` the win rate, `q = 1 - p`.
fn kelly_fraction(win_rate: f64, avg_win: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return 0.0;
    }
    let b = avg_win / avg_loss;
    let p = win_rate;
    let q = 1.0 - win_rate;
    ((b * p - q) / b).max(0.0)
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn kelly_fraction_reference_value() {
        // b = 100/50 = 2, p = 0.6, q = 0.4: f = (2*0.6 - 0.4) / 2 = 0.4
        let f = kelly_fraction(0.6, 100.0, 50.0);
        assert!((f - 0.4).abs() < 1e-12);
    }

    #[test]
    fn kelly_fraction_never_negative() {
        let f = kelly_fraction(0.1, 10.0, 100.0);
        assert_eq!(f, 0.0);
    }

    #[test]
    fn kelly_fraction_zero_loss_is_zero() {
        assert_eq!(kelly_fraction(0.9, 100.0, 0.0), 0.0);
    }

    #[test]
    fn stats_reflect_recorded_outcomes() {
        let sizer = KellySizer::new(SizerConfig::default());
        for _ in 0..6 {
            sizer.record_outcome("spatial:BTC", dec!(100), dec!(1000));
        }
        for _ in 0..4 {
            sizer.record_outcome("spatial:BTC", dec!(-50), dec!(1000));
        }

        let stats = sizer.strategy_stats("spatial:BTC");
        assert_eq!(stats.sample_count, 10);
        assert!((stats.win_rate - 0.6).abs() < 1e-12);
        assert_eq!(stats.avg_win, dec!(100));
        assert_eq!(stats.avg_loss, dec!(50));
    }

    #[test]
    fn history_is_bounded() {
        let config = SizerConfig {
            history_retention: 5,
            ..Default::default()
        };
        let sizer = KellySizer::new(config);
        for i in 0..8 {
            sizer.record_outcome("spatial", Decimal::from(i), dec!(100));
        }

        let stats = sizer.strategy_stats("spatial");
        assert_eq!(stats.sample_count, 5);
    }

    #[test]
    fn record_outcome_invalidates_cache() {
        let sizer = KellySizer::new(SizerConfig::default());
        sizer.record_outcome("spatial", dec!(10), dec!(100));
        let before = sizer.strategy_stats("spatial").sample_count;

        sizer.record_outcome("spatial", dec!(10), dec!(100));
        let after = sizer.strategy_stats("spatial").sample_count;

        assert_eq!(before, 1);
        assert_eq!(after, 2);
    }
}
