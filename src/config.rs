//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct aggregating the tunable policy
//! surface: detection thresholds, routing caps and score weights, sizing
//! limits, and metric parameters. Load from a TOML file with
//! [`Config::load`] or parse directly with [`Config::parse_toml`]; every
//! field has a serde default so a partial file works.
//!
//! # Example
//!
//! ```no_run
//! use crossbook::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("crossbook.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{VenueDirectory, VenueId, VenueProfile, VenueTier};
use crate::error::{ConfigError, Result};

/// Logging and tracing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Book aggregation configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregatorConfig {
    /// Venues with no update in this many seconds are excluded from
    /// snapshots rather than served stale.
    #[serde(default = "default_staleness_window_secs")]
    pub staleness_window_secs: u64,
    /// Capacity of the book-update broadcast channel.
    #[serde(default = "default_notify_capacity")]
    pub notify_capacity: usize,
}

fn default_staleness_window_secs() -> u64 {
    5
}

fn default_notify_capacity() -> usize {
    256
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            staleness_window_secs: default_staleness_window_secs(),
            notify_capacity: default_notify_capacity(),
        }
    }
}

/// Spread detection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Minimum profit fraction for a spread to qualify.
    #[serde(default = "default_min_profit_fraction")]
    pub min_profit_fraction: Decimal,
    /// Opportunity validity window in seconds.
    #[serde(default = "default_opportunity_ttl_secs")]
    pub opportunity_ttl_secs: u64,
    /// Confidence policy knobs.
    #[serde(default)]
    pub confidence: ConfidenceConfig,
}

fn default_min_profit_fraction() -> Decimal {
    dec!(0.005)
}

fn default_opportunity_ttl_secs() -> u64 {
    5
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_profit_fraction: default_min_profit_fraction(),
            opportunity_ttl_secs: default_opportunity_ttl_secs(),
            confidence: ConfidenceConfig::default(),
        }
    }
}

/// Confidence scoring policy.
///
/// Confidence rises with profit fraction and top-of-book depth and falls
/// with combined venue round-trip latency. The scales are tunable policy,
/// not calibrated constants.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceConfig {
    /// Starting confidence before the factors apply.
    #[serde(default = "default_confidence_base")]
    pub base: f64,
    /// Profit fraction at which the profit factor saturates.
    #[serde(default = "default_profit_saturation")]
    pub profit_saturation: f64,
    /// Tradable quantity at which the depth factor saturates.
    #[serde(default = "default_depth_saturation")]
    pub depth_saturation: f64,
    /// Round-trip latency normalization in milliseconds.
    #[serde(default = "default_latency_scale_ms")]
    pub latency_scale_ms: f64,
    /// Floor for the latency factor so slow venues degrade rather than
    /// zero out confidence.
    #[serde(default = "default_latency_floor")]
    pub latency_floor: f64,
}

fn default_confidence_base() -> f64 {
    0.7
}

fn default_profit_saturation() -> f64 {
    0.01
}

fn default_depth_saturation() -> f64 {
    10.0
}

fn default_latency_scale_ms() -> f64 {
    1000.0
}

fn default_latency_floor() -> f64 {
    0.1
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            base: default_confidence_base(),
            profit_saturation: default_profit_saturation(),
            depth_saturation: default_depth_saturation(),
            latency_scale_ms: default_latency_scale_ms(),
            latency_floor: default_latency_floor(),
        }
    }
}

/// Order routing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Depth levels considered per venue.
    #[serde(default = "default_depth_levels")]
    pub depth_levels: usize,
    /// Fraction of a venue's visible depth the router may consume.
    #[serde(default = "default_max_depth_fraction")]
    pub max_depth_fraction: Decimal,
    /// Fraction of the total order any single venue may absorb.
    #[serde(default = "default_max_venue_fraction")]
    pub max_venue_fraction: Decimal,
    /// Slices below this quantity are not worth routing.
    #[serde(default = "default_min_viable_amount")]
    pub min_viable_amount: Decimal,
    /// Execution score policy.
    #[serde(default)]
    pub score: ScoreConfig,
    /// Plan risk policy.
    #[serde(default)]
    pub risk: PlanRiskConfig,
}

fn default_depth_levels() -> usize {
    10
}

fn default_max_depth_fraction() -> Decimal {
    dec!(0.8)
}

fn default_max_venue_fraction() -> Decimal {
    dec!(0.4)
}

fn default_min_viable_amount() -> Decimal {
    dec!(0.01)
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            depth_levels: default_depth_levels(),
            max_depth_fraction: default_max_depth_fraction(),
            max_venue_fraction: default_max_venue_fraction(),
            min_viable_amount: default_min_viable_amount(),
            score: ScoreConfig::default(),
            risk: PlanRiskConfig::default(),
        }
    }
}

/// Venue execution score policy.
///
/// `score = base + tier_bonus + volume_bonus - latency_penalty`, clamped
/// to [0, 1]. Additive weights are tunable policy.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreConfig {
    #[serde(default = "default_base_score")]
    pub base: f64,
    #[serde(default = "default_tier1_bonus")]
    pub tier1_bonus: f64,
    #[serde(default = "default_tier2_bonus")]
    pub tier2_bonus: f64,
    #[serde(default = "default_tier3_bonus")]
    pub tier3_bonus: f64,
    /// Depth at which the volume bonus saturates.
    #[serde(default = "default_volume_saturation")]
    pub volume_saturation: f64,
    /// Maximum volume bonus.
    #[serde(default = "default_volume_bonus_cap")]
    pub volume_bonus_cap: f64,
    /// Latency normalization in milliseconds.
    #[serde(default = "default_score_latency_scale_ms")]
    pub latency_scale_ms: f64,
    /// Maximum latency penalty.
    #[serde(default = "default_latency_penalty_cap")]
    pub latency_penalty_cap: f64,
}

fn default_base_score() -> f64 {
    0.5
}

fn default_tier1_bonus() -> f64 {
    0.3
}

fn default_tier2_bonus() -> f64 {
    0.2
}

fn default_tier3_bonus() -> f64 {
    0.1
}

fn default_volume_saturation() -> f64 {
    100.0
}

fn default_volume_bonus_cap() -> f64 {
    0.2
}

fn default_score_latency_scale_ms() -> f64 {
    1000.0
}

fn default_latency_penalty_cap() -> f64 {
    0.2
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            base: default_base_score(),
            tier1_bonus: default_tier1_bonus(),
            tier2_bonus: default_tier2_bonus(),
            tier3_bonus: default_tier3_bonus(),
            volume_saturation: default_volume_saturation(),
            volume_bonus_cap: default_volume_bonus_cap(),
            latency_scale_ms: default_score_latency_scale_ms(),
            latency_penalty_cap: default_latency_penalty_cap(),
        }
    }
}

/// Composite plan risk policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanRiskConfig {
    /// Weight of venue concentration risk.
    #[serde(default = "default_concentration_weight")]
    pub concentration_weight: f64,
    /// Weight of execution duration risk.
    #[serde(default = "default_duration_weight")]
    pub duration_weight: f64,
    /// Weight of non-tier-1 capital risk.
    #[serde(default = "default_tier_weight")]
    pub tier_weight: f64,
    /// Venue count at which concentration risk reaches zero.
    #[serde(default = "default_venue_spread_scale")]
    pub venue_spread_scale: f64,
    /// Duration in seconds at which duration risk saturates.
    #[serde(default = "default_duration_scale_secs")]
    pub duration_scale_secs: f64,
}

fn default_concentration_weight() -> f64 {
    0.3
}

fn default_duration_weight() -> f64 {
    0.4
}

fn default_tier_weight() -> f64 {
    0.3
}

fn default_venue_spread_scale() -> f64 {
    10.0
}

fn default_duration_scale_secs() -> f64 {
    5.0
}

impl Default for PlanRiskConfig {
    fn default() -> Self {
        Self {
            concentration_weight: default_concentration_weight(),
            duration_weight: default_duration_weight(),
            tier_weight: default_tier_weight(),
            venue_spread_scale: default_venue_spread_scale(),
            duration_scale_secs: default_duration_scale_secs(),
        }
    }
}

/// Kelly position sizing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SizerConfig {
    /// Outcomes required before Kelly sizing replaces the conservative
    /// default.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
    /// Default cap on the capital fraction of any single position.
    #[serde(default = "default_max_position_fraction")]
    pub max_position_fraction: f64,
    /// Absolute ceiling on the sized fraction regardless of edge.
    #[serde(default = "default_kelly_hard_cap")]
    pub kelly_hard_cap: f64,
    /// Strategy statistics cache lifetime in seconds.
    #[serde(default = "default_stats_cache_ttl_secs")]
    pub stats_cache_ttl_secs: u64,
    /// Most-recent outcomes retained per the rolling window.
    #[serde(default = "default_history_retention")]
    pub history_retention: usize,
    /// Volatility discount applied until an external signal updates it.
    #[serde(default = "default_volatility_factor")]
    pub default_volatility_factor: f64,
    /// Per-kind conservatism multipliers.
    #[serde(default)]
    pub conservatism: ConservatismConfig,
}

fn default_min_sample_size() -> usize {
    10
}

fn default_max_position_fraction() -> f64 {
    0.02
}

fn default_kelly_hard_cap() -> f64 {
    0.25
}

fn default_stats_cache_ttl_secs() -> u64 {
    3600
}

fn default_history_retention() -> usize {
    1000
}

fn default_volatility_factor() -> f64 {
    0.9
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            min_sample_size: default_min_sample_size(),
            max_position_fraction: default_max_position_fraction(),
            kelly_hard_cap: default_kelly_hard_cap(),
            stats_cache_ttl_secs: default_stats_cache_ttl_secs(),
            history_retention: default_history_retention(),
            default_volatility_factor: default_volatility_factor(),
            conservatism: ConservatismConfig::default(),
        }
    }
}

/// Per-strategy-kind conservatism multipliers.
///
/// More novel or operationally complex strategy kinds get a lower
/// multiplier. Unknown kinds use `unknown`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConservatismConfig {
    #[serde(default = "default_spatial_factor")]
    pub spatial: f64,
    #[serde(default = "default_triangular_factor")]
    pub triangular: f64,
    #[serde(default = "default_cross_chain_factor")]
    pub cross_chain: f64,
    #[serde(default = "default_funding_rate_factor")]
    pub funding_rate: f64,
    #[serde(default = "default_statistical_factor")]
    pub statistical: f64,
    #[serde(default = "default_unknown_factor")]
    pub unknown: f64,
}

fn default_spatial_factor() -> f64 {
    0.8
}

fn default_triangular_factor() -> f64 {
    0.7
}

fn default_cross_chain_factor() -> f64 {
    0.6
}

fn default_funding_rate_factor() -> f64 {
    0.9
}

fn default_statistical_factor() -> f64 {
    0.5
}

fn default_unknown_factor() -> f64 {
    0.7
}

impl Default for ConservatismConfig {
    fn default() -> Self {
        Self {
            spatial: default_spatial_factor(),
            triangular: default_triangular_factor(),
            cross_chain: default_cross_chain_factor(),
            funding_rate: default_funding_rate_factor(),
            statistical: default_statistical_factor(),
            unknown: default_unknown_factor(),
        }
    }
}

/// Performance ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Annual risk-free rate for the Sharpe ratio.
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Periods per year for Sharpe annualization.
    #[serde(default = "default_annualization_factor")]
    pub annualization_factor: f64,
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_annualization_factor() -> f64 {
    252.0
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            annualization_factor: default_annualization_factor(),
        }
    }
}

/// One venue entry of the externally supplied classification.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueEntry {
    /// Reliability tier.
    #[serde(default)]
    pub tier: VenueTier,
    /// Latency prior in milliseconds. Defaults to the tier target.
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Book aggregation settings.
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Spread detection settings.
    #[serde(default)]
    pub detector: DetectorConfig,

    /// Order routing settings.
    #[serde(default)]
    pub router: RouterConfig,

    /// Kelly sizing settings.
    #[serde(default)]
    pub sizer: SizerConfig,

    /// Performance ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Venue tier classification, keyed by venue name.
    #[serde(default)]
    pub venues: BTreeMap<String, VenueEntry>,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation
    /// fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Build the venue directory from the configured classification.
    #[must_use]
    pub fn venue_directory(&self) -> VenueDirectory {
        let directory = VenueDirectory::new();
        for (name, entry) in &self.venues {
            let latency = entry.latency_ms.unwrap_or(entry.tier.target_latency_ms());
            directory.register(
                VenueId::from(name.as_str()),
                VenueProfile::new(entry.tier, latency),
            );
        }
        directory
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.aggregator.staleness_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "staleness_window_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.detector.opportunity_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "opportunity_ttl_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.detector.min_profit_fraction < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "min_profit_fraction",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        if self.router.depth_levels == 0 {
            return Err(ConfigError::InvalidValue {
                field: "depth_levels",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (field, value) in [
            ("max_depth_fraction", self.router.max_depth_fraction),
            ("max_venue_fraction", self.router.max_venue_fraction),
        ] {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be between 0 exclusive and 1 inclusive".to_string(),
                }
                .into());
            }
        }
        if self.router.min_viable_amount < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "min_viable_amount",
                reason: "must be 0 or greater".to_string(),
            }
            .into());
        }
        for (field, value) in [
            ("max_position_fraction", self.sizer.max_position_fraction),
            ("kelly_hard_cap", self.sizer.kelly_hard_cap),
        ] {
            if value <= 0.0 || value > 1.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be between 0 exclusive and 1 inclusive".to_string(),
                }
                .into());
            }
        }
        if self.sizer.min_sample_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_sample_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.sizer.history_retention == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history_retention",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.annualization_factor <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "annualization_factor",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for name in self.venues.keys() {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "venues",
                    reason: "venue name cannot be empty".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = Config::parse_toml("").unwrap();

        assert_eq!(config.aggregator.staleness_window_secs, 5);
        assert_eq!(config.detector.min_profit_fraction, dec!(0.005));
        assert_eq!(config.router.max_venue_fraction, dec!(0.4));
        assert_eq!(config.sizer.kelly_hard_cap, 0.25);
        assert_eq!(config.ledger.annualization_factor, 252.0);
    }

    #[test]
    fn parses_venue_classification() {
        let config = Config::parse_toml(
            r#"
            [venues.binance]
            tier = "tier1"
            latency_ms = 35

            [venues.lbank]
            tier = "tier3"
            "#,
        )
        .unwrap();

        let directory = config.venue_directory();
        assert_eq!(directory.tier(&VenueId::from("binance")), VenueTier::Tier1);
        assert_eq!(directory.latency_ms(&VenueId::from("binance")), 35);
        assert_eq!(directory.latency_ms(&VenueId::from("lbank")), 200);
    }

    #[test]
    fn rejects_zero_staleness_window() {
        let result = Config::parse_toml("[aggregator]\nstaleness_window_secs = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_venue_fraction() {
        let result = Config::parse_toml("[router]\nmax_venue_fraction = 1.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn rejects_out_of_range_hard_cap() {
        let result = Config::parse_toml("[sizer]\nkelly_hard_cap = 0.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn overrides_apply() {
        let config = Config::parse_toml(
            r#"
            [detector]
            min_profit_fraction = "0.01"
            opportunity_ttl_secs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.detector.min_profit_fraction, dec!(0.01));
        assert_eq!(config.detector.opportunity_ttl_secs, 2);
    }
}
