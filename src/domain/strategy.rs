//! Strategy classification.

use std::fmt;

/// Closed set of strategy kinds the sizer knows how to discount.
///
/// Keys arriving from collaborators are strings like `"spatial:BTC-USDT"`;
/// the kind is the prefix before the first `:`. Unknown prefixes parse to
/// `None` and sizing falls back to the configured default conservatism
/// factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Same instrument priced differently across venues.
    Spatial,
    /// Three-pair cycle within one venue.
    Triangular,
    /// Same asset priced differently across chains.
    CrossChain,
    /// Funding-rate capture on perpetuals.
    FundingRate,
    /// Mean-reversion and other statistical signals.
    Statistical,
}

impl StrategyKind {
    /// Parse the kind prefix of a strategy key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let prefix = key.split(':').next().unwrap_or(key);
        match prefix {
            "spatial" => Some(Self::Spatial),
            "triangular" => Some(Self::Triangular),
            "cross_chain" => Some(Self::CrossChain),
            "funding_rate" => Some(Self::FundingRate),
            "statistical" => Some(Self::Statistical),
            _ => None,
        }
    }

    /// Canonical key prefix for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spatial => "spatial",
            Self::Triangular => "triangular",
            Self::CrossChain => "cross_chain",
            Self::FundingRate => "funding_rate",
            Self::Statistical => "statistical",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_kind() {
        assert_eq!(StrategyKind::from_key("spatial"), Some(StrategyKind::Spatial));
    }

    #[test]
    fn parses_kind_with_instrument_suffix() {
        assert_eq!(
            StrategyKind::from_key("cross_chain:WETH"),
            Some(StrategyKind::CrossChain)
        );
    }

    #[test]
    fn unknown_kind_is_none() {
        assert_eq!(StrategyKind::from_key("martingale:BTC"), None);
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(
            StrategyKind::from_key(StrategyKind::FundingRate.as_str()),
            Some(StrategyKind::FundingRate)
        );
    }
}
