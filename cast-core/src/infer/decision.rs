//! Turning an evidence score into a gender with a confidence.

use super::analyzer::EvidenceScore;
use crate::config::EngineConfig;
use crate::gender::Gender;
use serde::{Deserialize, Serialize};

/// Confidence band used for display and re-analysis decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn of(confidence: f64, config: &EngineConfig) -> Self {
        if confidence >= config.high_confidence {
            ConfidenceTier::High
        } else if confidence >= config.medium_confidence {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// Gender, confidence and justification for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderDecision {
    pub gender: Gender,
    pub confidence: f64,
    pub evidence: Option<String>,
}

impl GenderDecision {
    /// Decide from a score.
    ///
    /// The larger side wins if it reaches `min_gender_score`; confidence is
    /// the score difference over `confidence_normalizer`, capped at 1.
    /// Ties and weak evidence give `Unknown` with confidence 0.
    pub fn from_score(score: &EvidenceScore, config: &EngineConfig) -> Self {
        let (winner, winning, losing) = if score.male_score > score.female_score {
            (Gender::Male, score.male_score, score.female_score)
        } else if score.female_score > score.male_score {
            (Gender::Female, score.female_score, score.male_score)
        } else {
            (Gender::Unknown, 0.0, 0.0)
        };

        if !winner.is_known() || winning < config.min_gender_score {
            return Self {
                gender: Gender::Unknown,
                confidence: 0.0,
                evidence: score.evidence.clone(),
            };
        }

        let confidence = if config.confidence_normalizer > 0.0 {
            ((winning - losing) / config.confidence_normalizer).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            gender: winner,
            confidence,
            evidence: score.evidence.clone(),
        }
    }

    pub fn tier(&self, config: &EngineConfig) -> ConfidenceTier {
        ConfidenceTier::of(self.confidence, config)
    }
}
