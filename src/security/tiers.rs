//! Billing tiers and their rate-limit strategies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TierConfig;

/// Tier used when a key's tier is not configured.
pub const FALLBACK_TIER: &str = "starter";

const FALLBACK_CONFIG: TierConfig = TierConfig {
    requests_per_minute: 10,
    strategy: Strategy::SlidingWindow,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Counts within aligned 60 s windows. Allows bursts across a boundary.
    FixedWindow,
    /// Counts over the trailing 60 s.
    SlidingWindow,
    /// Capacity = limit, refilled at limit/60 per second.
    TokenBucket,
    /// Reported when the usage store failed and the request was let through.
    FailOpen,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::FixedWindow => "fixed_window",
            Strategy::SlidingWindow => "sliding_window",
            Strategy::TokenBucket => "token_bucket",
            Strategy::FailOpen => "fail_open",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier name resolved to its quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTier {
    pub name: String,
    pub config: TierConfig,
}

/// Lookup table from tier name to quota.
#[derive(Debug, Clone)]
pub struct TierTable {
    tiers: BTreeMap<String, TierConfig>,
}

impl TierTable {
    pub fn new(tiers: BTreeMap<String, TierConfig>) -> Self {
        Self { tiers }
    }

    /// Resolve a tier, falling back to `starter` for unknown names.
    pub fn resolve(&self, tier: &str) -> ResolvedTier {
        if let Some(config) = self.tiers.get(tier) {
            return ResolvedTier {
                name: tier.to_string(),
                config: *config,
            };
        }
        let config = self
            .tiers
            .get(FALLBACK_TIER)
            .copied()
            .unwrap_or(FALLBACK_CONFIG);
        ResolvedTier {
            name: FALLBACK_TIER.to_string(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use rstest::rstest;

    #[rstest]
    #[case("trial", 5, Strategy::FixedWindow)]
    #[case("starter", 10, Strategy::SlidingWindow)]
    #[case("professional", 50, Strategy::SlidingWindow)]
    #[case("enterprise", 200, Strategy::TokenBucket)]
    #[case("platinum", 10, Strategy::SlidingWindow)]
    fn test_default_tiers(#[case] tier: &str, #[case] limit: u32, #[case] strategy: Strategy) {
        let table = TierTable::new(RateLimitConfig::default().tiers);
        let resolved = table.resolve(tier);
        assert_eq!(resolved.config.requests_per_minute, limit);
        assert_eq!(resolved.config.strategy, strategy);
    }

    #[test]
    fn test_unknown_tier_reports_fallback_name() {
        let table = TierTable::new(BTreeMap::new());
        let resolved = table.resolve("platinum");
        assert_eq!(resolved.name, FALLBACK_TIER);
        assert_eq!(resolved.config, FALLBACK_CONFIG);
    }
}
