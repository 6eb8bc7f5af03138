//! Engine configuration.
//!
//! Every tunable constant the engine consumes lives here. Defaults match the
//! values the surrounding application has always used; individual values
//! can be overridden with `with_*` builders, environment variables, or a
//! serialized config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for extraction, inference, and persistence sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of characters scanned per text.
    pub max_text_length: usize,

    /// Maximum raw pattern matches considered per text.
    pub max_total_matches: usize,

    /// Maximum raw matches taken from any single pattern.
    pub max_matches_per_pattern: usize,

    /// Minimum winning score before a gender is assigned.
    pub min_gender_score: f64,

    /// Score difference that maps to confidence 1.0.
    pub confidence_normalizer: f64,

    /// Lower bound of the medium confidence tier.
    pub medium_confidence: f64,

    /// Lower bound of the high confidence tier.
    pub high_confidence: f64,

    /// Records below this confidence are re-analyzed when mentioned again.
    pub reanalysis_threshold: f64,

    /// A partner must be at least this confident to drive relationship inference.
    pub relationship_min_confidence: f64,

    /// Maximum evidence strings kept per persisted record.
    pub evidence_cap: usize,

    /// Maximum characters listed in the generated summary.
    pub summary_limit: usize,

    /// Bounded wait for each persistence call, in milliseconds.
    pub sync_timeout_ms: u64,

    /// Key analysis caches by full text instead of a 64-bit hash.
    pub strict_cache_keys: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_text_length: 100_000,
            max_total_matches: 1_000,
            max_matches_per_pattern: 200,
            min_gender_score: 3.0,
            confidence_normalizer: 8.0,
            medium_confidence: 0.4,
            high_confidence: 0.75,
            reanalysis_threshold: 0.7,
            relationship_min_confidence: 0.7,
            evidence_cap: 5,
            summary_limit: 10,
            sync_timeout_ms: 10_000,
            strict_cache_keys: false,
        }
    }
}

impl EngineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with overrides from `CAST_*` environment variables.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("CAST_SYNC_TIMEOUT_MS") {
            config.sync_timeout_ms = ms;
        }
        if let Some(strict) = env_parse::<bool>("CAST_STRICT_CACHE_KEYS") {
            config.strict_cache_keys = strict;
        }
        if let Some(max) = env_parse::<usize>("CAST_MAX_TEXT_LENGTH") {
            config.max_text_length = max;
        }

        config
    }

    /// Persistence call timeout as a `Duration`.
    pub fn sync_timeout(&self) -> Duration {
        Duration::from_millis(self.sync_timeout_ms)
    }

    /// Set the scanned text length cap.
    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.max_text_length = max;
        self
    }

    /// Set the total and per-pattern match caps.
    pub fn with_match_caps(mut self, total: usize, per_pattern: usize) -> Self {
        self.max_total_matches = total;
        self.max_matches_per_pattern = per_pattern;
        self
    }

    /// Set the minimum winning score.
    pub fn with_min_gender_score(mut self, score: f64) -> Self {
        self.min_gender_score = score;
        self
    }

    /// Set the persistence timeout.
    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Key caches by full text.
    pub fn with_strict_cache_keys(mut self, strict: bool) -> Self {
        self.strict_cache_keys = strict;
        self
    }

    /// Set the evidence cap.
    pub fn with_evidence_cap(mut self, cap: usize) -> Self {
        self.evidence_cap = cap;
        self
    }

    /// Set the summary length.
    pub fn with_summary_limit(mut self, limit: usize) -> Self {
        self.summary_limit = limit;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparseable {key}={raw:?}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_text_length, 100_000);
        assert_eq!(config.max_total_matches, 1_000);
        assert_eq!(config.max_matches_per_pattern, 200);
        assert_eq!(config.evidence_cap, 5);
        assert_eq!(config.sync_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"summary_limit": 3, "strict_cache_keys": true}"#).unwrap();
        assert_eq!(config.summary_limit, 3);
        assert!(config.strict_cache_keys);
        assert_eq!(config.min_gender_score, 3.0);
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::new()
            .with_match_caps(10, 2)
            .with_sync_timeout(Duration::from_millis(10));
        assert_eq!(config.max_total_matches, 10);
        assert_eq!(config.max_matches_per_pattern, 2);
        assert_eq!(config.sync_timeout(), Duration::from_millis(10));
    }
}
