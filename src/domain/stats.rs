//! Statistics and performance reporting types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Rolling per-strategy statistics feeding the Kelly sizer.
#[derive(Debug, Clone)]
pub struct StrategyStats {
    /// Strategy key these statistics describe.
    pub strategy_key: String,
    /// Fraction of resolved outcomes with positive profit, in [0, 1].
    pub win_rate: f64,
    /// Mean profit of winning outcomes.
    pub avg_win: Decimal,
    /// Mean magnitude of losing outcomes (positive number).
    pub avg_loss: Decimal,
    /// Number of resolved outcomes in the window.
    pub sample_count: usize,
}

/// Derived performance metrics over a filtered trade set.
///
/// A pure function of the trade history snapshot: recomputed on demand,
/// never persisted as a mutable entity. An empty filter yields the
/// all-zero default rather than an error.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceMetrics {
    /// Trades in the filtered set.
    pub total_trades: u64,
    /// Trades with positive profit.
    pub winning_trades: u64,
    /// Trades with zero or negative profit.
    pub losing_trades: u64,
    /// winning_trades / total_trades, in [0, 1].
    pub win_rate: f64,
    /// Sum of per-trade profit and loss, gross of fees.
    pub total_profit: Decimal,
    /// Sum of fees paid.
    pub total_fees: Decimal,
    /// total_profit minus total_fees.
    pub net_profit: Decimal,
    /// net_profit / total_trades.
    pub avg_profit_per_trade: Decimal,
    /// Largest single-trade profit.
    pub max_profit: Decimal,
    /// Largest single-trade loss (negative or zero).
    pub max_loss: Decimal,
    /// Gross profit / gross loss. Positive infinity when gross loss is
    /// zero with positive gross profit, zero with no trades.
    pub profit_factor: f64,
    /// Annualized Sharpe ratio over per-trade P&L.
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough drop of the cumulative P&L curve, ordered by
    /// trade timestamp with ties broken by insertion order.
    pub max_drawdown: Decimal,
    /// net_profit / |max_drawdown|. Positive infinity when drawdown is
    /// zero with positive net profit.
    pub recovery_factor: f64,
    /// Mean execution time in seconds.
    pub avg_execution_time_secs: f64,
}

/// Serializable performance report for observability collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// Metrics over the requested filter.
    pub overall: PerformanceMetrics,
    /// Metrics per strategy key.
    pub strategies: BTreeMap<String, PerformanceMetrics>,
    /// Per-day net P&L for the trailing window, zero-filled.
    pub daily_pnl: BTreeMap<NaiveDate, Decimal>,
    /// Report generation time.
    pub generated_at: DateTime<Utc>,
}
