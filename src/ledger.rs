//! Append-only trade ledger and derived performance metrics.
//!
//! Trades arrive whenever the execution collaborator resolves them; the
//! ledger orders analytics by the logical trade timestamp, not arrival
//! order, so late reports land in the right place in the P&L curve.
//! Metrics are a pure function of the filtered history and are always
//! defined: an empty or degenerate trade set yields zeros, division by
//! zero cases map to the documented infinities, and nothing here panics.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::LedgerConfig;
use crate::domain::{PerformanceMetrics, PerformanceReport, TradeRecord};

#[derive(Default)]
struct LedgerState {
    trades: Vec<TradeRecord>,
    daily_pnl: BTreeMap<NaiveDate, Decimal>,
    strategy_index: HashMap<String, Vec<usize>>,
}

/// Append-only performance ledger.
pub struct PerformanceLedger {
    config: LedgerConfig,
    state: RwLock<LedgerState>,
}

impl PerformanceLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Record a resolved trade.
    ///
    /// Appends to the history, the per-day P&L rollup (UTC calendar date),
    /// and the per-strategy index.
    pub fn record(&self, trade: TradeRecord) {
        info!(
            strategy = trade.strategy_key(),
            instrument = %trade.instrument(),
            venue = %trade.venue(),
            profit_loss = %trade.profit_loss(),
            success = trade.success(),
            "Recorded trade"
        );

        let mut state = self.state.write();
        let index = state.trades.len();

        let date = trade.timestamp().date_naive();
        *state.daily_pnl.entry(date).or_insert(Decimal::ZERO) += trade.profit_loss();
        state
            .strategy_index
            .entry(trade.strategy_key().to_string())
            .or_default()
            .push(index);
        state.trades.push(trade);
    }

    /// Number of recorded trades.
    #[must_use]
    pub fn trade_count(&self) -> usize {
        self.state.read().trades.len()
    }

    /// Performance metrics over an optionally filtered view.
    ///
    /// `strategy_key` restricts to one strategy; `lookback_days` restricts
    /// to trades whose timestamp falls within the trailing window. An
    /// empty filtered set returns the all-zero metrics.
    #[must_use]
    pub fn metrics(
        &self,
        strategy_key: Option<&str>,
        lookback_days: Option<i64>,
    ) -> PerformanceMetrics {
        let state = self.state.read();
        let cutoff = lookback_days.map(|days| Utc::now() - Duration::days(days));

        let filtered: Vec<&TradeRecord> = state
            .trades
            .iter()
            .filter(|t| strategy_key.map_or(true, |key| t.strategy_key() == key))
            .filter(|t| cutoff.map_or(true, |c| t.timestamp() >= c))
            .collect();

        compute_metrics(&filtered, &self.config)
    }

    /// Metrics per strategy key, for cross-strategy comparison.
    #[must_use]
    pub fn strategy_comparison(&self) -> BTreeMap<String, PerformanceMetrics> {
        let keys: Vec<String> = {
            let state = self.state.read();
            state.strategy_index.keys().cloned().collect()
        };

        keys.into_iter()
            .map(|key| {
                let metrics = self.metrics(Some(&key), None);
                (key, metrics)
            })
            .collect()
    }

    /// Net P&L per UTC calendar day over the trailing window, zero-filled
    /// for days without trades.
    #[must_use]
    pub fn daily_pnl(&self, days: u32) -> BTreeMap<NaiveDate, Decimal> {
        let state = self.state.read();
        let today = Utc::now().date_naive();
        let start = today - Duration::days(i64::from(days));

        let mut series = BTreeMap::new();
        let mut date = start;
        while date <= today {
            let pnl = state.daily_pnl.get(&date).copied().unwrap_or(Decimal::ZERO);
            series.insert(date, pnl);
            date += Duration::days(1);
        }
        series
    }

    /// Full serializable report for observability collaborators.
    #[must_use]
    pub fn generate_report(&self, strategy_key: Option<&str>) -> PerformanceReport {
        PerformanceReport {
            overall: self.metrics(strategy_key, None),
            strategies: self.strategy_comparison(),
            daily_pnl: self.daily_pnl(30),
            generated_at: Utc::now(),
        }
    }
}

fn compute_metrics(trades: &[&TradeRecord], config: &LedgerConfig) -> PerformanceMetrics {
    if trades.is_empty() {
        return PerformanceMetrics::default();
    }

    let total_trades = trades.len() as u64;
    let winning_trades = trades
        .iter()
        .filter(|t| t.profit_loss() > Decimal::ZERO)
        .count() as u64;
    let losing_trades = total_trades - winning_trades;
    let win_rate = winning_trades as f64 / total_trades as f64;

    let total_profit: Decimal = trades.iter().map(|t| t.profit_loss()).sum();
    let total_fees: Decimal = trades.iter().map(|t| t.fees()).sum();
    let net_profit = total_profit - total_fees;
    let avg_profit_per_trade = net_profit / Decimal::from(total_trades);

    let gross_profit: Decimal = trades
        .iter()
        .map(|t| t.profit_loss())
        .filter(|p| *p > Decimal::ZERO)
        .sum();
    let gross_loss: Decimal = -trades
        .iter()
        .map(|t| t.profit_loss())
        .filter(|p| *p < Decimal::ZERO)
        .sum::<Decimal>();

    let max_profit = trades
        .iter()
        .map(|t| t.profit_loss())
        .filter(|p| *p > Decimal::ZERO)
        .max()
        .unwrap_or(Decimal::ZERO);
    let max_loss = trades
        .iter()
        .map(|t| t.profit_loss())
        .filter(|p| *p < Decimal::ZERO)
        .min()
        .unwrap_or(Decimal::ZERO);

    let profit_factor = if gross_loss > Decimal::ZERO {
        (gross_profit / gross_loss).to_f64().unwrap_or(0.0)
    } else if gross_profit > Decimal::ZERO {
        f64::INFINITY
    } else {
        0.0
    };

    let returns: Vec<f64> = trades
        .iter()
        .map(|t| t.profit_loss().to_f64().unwrap_or(0.0))
        .collect();
    let sharpe_ratio = sharpe(&returns, config.risk_free_rate, config.annualization_factor);

    let max_drawdown = max_drawdown(trades);
    let recovery_factor = if max_drawdown > Decimal::ZERO {
        (net_profit / max_drawdown).to_f64().unwrap_or(0.0)
    } else if net_profit > Decimal::ZERO {
        f64::INFINITY
    } else {
        0.0
    };

    let avg_execution_time_secs = trades
        .iter()
        .map(|t| t.execution_time().as_secs_f64())
        .sum::<f64>()
        / total_trades as f64;

    PerformanceMetrics {
        total_trades,
        winning_trades,
        losing_trades,
        win_rate,
        total_profit,
        total_fees,
        net_profit,
        avg_profit_per_trade,
        max_profit,
        max_loss,
        profit_factor,
        sharpe_ratio,
        max_drawdown,
        recovery_factor,
        avg_execution_time_secs,
    }
}

/// Annualized Sharpe ratio over per-trade returns.
///
/// Fewer than two returns, or zero dispersion, yields zero rather than a
/// division error.
fn sharpe(returns: &[f64], risk_free_rate: f64, annualization: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let per_period_rf = risk_free_rate / annualization;
    let excess: Vec<f64> = returns.iter().map(|r| r - per_period_rf).collect();

    let mean = excess.iter().sum::<f64>() / excess.len() as f64;
    let variance = excess.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / excess.len() as f64;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return 0.0;
    }
    mean / std_dev * annualization.sqrt()
}

/// Largest peak-to-trough drop of the cumulative P&L curve.
///
/// Trades are ordered by timestamp; the stable sort keeps insertion order
/// for equal timestamps.
fn max_drawdown(trades: &[&TradeRecord]) -> Decimal {
    let mut ordered: Vec<&TradeRecord> = trades.to_vec();
    ordered.sort_by_key(|t| t.timestamp());

    let mut running = Decimal::ZERO;
    let mut peak = Decimal::ZERO;
    let mut worst = Decimal::ZERO;
    let mut first = true;

    for trade in ordered {
        running += trade.profit_loss();
        if first {
            peak = running;
            first = false;
        } else if running > peak {
            peak = running;
        }
        let drawdown = peak - running;
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst
}
