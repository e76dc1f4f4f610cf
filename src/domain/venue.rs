//! Venue classification and latency tracking.
//!
//! Tiers are an externally supplied classification: tier-1 venues carry
//! higher reliability and fill-rate priors and score higher during routing.
//! Latency starts at the tier's target and is refined as collaborators
//! report observed round-trip times.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Deserialize;

use super::ids::VenueId;

/// Venue reliability tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueTier {
    /// Major venues, sub-50ms latency target.
    Tier1,
    /// Regional venues, sub-100ms latency target.
    Tier2,
    /// Emerging or niche venues, sub-200ms latency target.
    #[default]
    Tier3,
}

impl VenueTier {
    /// Latency prior for venues in this tier, in milliseconds.
    #[must_use]
    pub const fn target_latency_ms(self) -> u64 {
        match self {
            Self::Tier1 => 50,
            Self::Tier2 => 100,
            Self::Tier3 => 200,
        }
    }
}

/// Classification and latency profile for one venue.
#[derive(Debug, Clone, Copy)]
pub struct VenueProfile {
    tier: VenueTier,
    latency_ms: u64,
}

impl VenueProfile {
    /// Create a profile with an explicit latency estimate.
    #[must_use]
    pub const fn new(tier: VenueTier, latency_ms: u64) -> Self {
        Self { tier, latency_ms }
    }

    /// Create a profile using the tier's latency target as the prior.
    #[must_use]
    pub const fn from_tier(tier: VenueTier) -> Self {
        Self::new(tier, tier.target_latency_ms())
    }

    /// Get the tier.
    #[must_use]
    pub const fn tier(&self) -> VenueTier {
        self.tier
    }

    /// Get the current latency estimate in milliseconds.
    #[must_use]
    pub const fn latency_ms(&self) -> u64 {
        self.latency_ms
    }
}

/// Thread-safe registry of venue profiles.
///
/// Unregistered venues fall back to a tier-3 profile rather than failing,
/// so a new venue feed can come online without a config change blocking
/// detection.
#[derive(Debug, Default)]
pub struct VenueDirectory {
    profiles: RwLock<HashMap<VenueId, VenueProfile>>,
}

impl VenueDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a venue profile.
    pub fn register(&self, venue: VenueId, profile: VenueProfile) {
        self.profiles.write().insert(venue, profile);
    }

    /// Get the profile for a venue, defaulting to tier 3.
    #[must_use]
    pub fn profile(&self, venue: &VenueId) -> VenueProfile {
        self.profiles
            .read()
            .get(venue)
            .copied()
            .unwrap_or_else(|| VenueProfile::from_tier(VenueTier::Tier3))
    }

    /// Get the tier for a venue.
    #[must_use]
    pub fn tier(&self, venue: &VenueId) -> VenueTier {
        self.profile(venue).tier
    }

    /// Get the latency estimate for a venue in milliseconds.
    #[must_use]
    pub fn latency_ms(&self, venue: &VenueId) -> u64 {
        self.profile(venue).latency_ms
    }

    /// Record an observed round-trip latency for a venue.
    ///
    /// Keeps the existing tier; an unknown venue is registered as tier 3.
    pub fn record_latency(&self, venue: &VenueId, latency_ms: u64) {
        let mut profiles = self.profiles.write();
        let tier = profiles.get(venue).map_or(VenueTier::Tier3, |p| p.tier);
        profiles.insert(venue.clone(), VenueProfile::new(tier, latency_ms));
    }

    /// Number of registered venues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    /// Returns true if no venue is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
