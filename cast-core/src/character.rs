//! Character records and the per-novel character map.

use crate::extract::CandidateMap;
use crate::gender::Gender;
use crate::infer::GenderDecision;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything known about one character in a novel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Unique key within the novel.
    pub name: String,
    /// Current best gender.
    pub gender: Gender,
    /// Confidence in `gender`, 0.0 to 1.0.
    pub confidence: f64,
    /// Number of mentions seen so far.
    pub appearances: u32,
    /// Human-readable justifications, oldest first.
    #[serde(default)]
    pub evidence: Vec<String>,
    /// Stable numeric identity, once the registry has assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<u32>,
}

impl CharacterRecord {
    /// A freshly discovered character: unknown gender, one appearance.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: Gender::Unknown,
            confidence: 0.0,
            appearances: 1,
            evidence: Vec::new(),
            identity: None,
        }
    }

    /// Set gender and confidence.
    pub fn with_gender(mut self, gender: Gender, confidence: f64) -> Self {
        self.gender = gender;
        self.confidence = confidence;
        self
    }

    /// Set the appearance count.
    pub fn with_appearances(mut self, appearances: u32) -> Self {
        self.appearances = appearances;
        self
    }

    /// Add an evidence string.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.add_evidence(evidence);
        self
    }

    /// Count additional mentions.
    pub fn record_mentions(&mut self, count: u32) {
        self.appearances = self.appearances.saturating_add(count);
    }

    /// Whether gender data is weak enough to re-run analysis.
    pub fn needs_analysis(&self, threshold: f64) -> bool {
        !self.gender.is_known() || self.confidence < threshold
    }

    /// Append an evidence string unless it is already present.
    pub fn add_evidence(&mut self, evidence: impl Into<String>) {
        let evidence = evidence.into();
        if !evidence.is_empty() && !self.evidence.contains(&evidence) {
            self.evidence.push(evidence);
        }
    }

    /// Fold an analysis decision into this record.
    ///
    /// Unknown decisions never overwrite a known gender. A matching gender
    /// keeps the higher confidence; a conflicting one wins only with
    /// strictly higher confidence. Returns whether gender or confidence
    /// changed.
    pub fn apply_decision(&mut self, decision: &GenderDecision) -> bool {
        if !decision.gender.is_known() {
            return false;
        }

        let changed = if !self.gender.is_known() || decision.confidence > self.confidence {
            let changed = self.gender != decision.gender || self.confidence != decision.confidence;
            self.gender = decision.gender;
            self.confidence = decision.confidence;
            changed
        } else {
            false
        };

        if self.gender == decision.gender {
            if let Some(evidence) = &decision.evidence {
                self.add_evidence(evidence.clone());
            }
        }
        changed
    }

    /// Merge another record for the same name (e.g. one loaded from storage).
    ///
    /// Appearances never go down, the stronger gender wins, evidence is
    /// unioned, and an existing identity is kept.
    pub fn merge(&mut self, other: &CharacterRecord) {
        self.appearances = self.appearances.max(other.appearances);

        if other.gender.is_known()
            && (!self.gender.is_known() || other.confidence > self.confidence)
        {
            self.gender = other.gender;
            self.confidence = other.confidence;
        }

        for evidence in &other.evidence {
            self.add_evidence(evidence.clone());
        }

        if self.identity.is_none() {
            self.identity = other.identity;
        }
    }
}

/// Characters of one novel keyed by name.
pub type CharacterMap = BTreeMap<String, CharacterRecord>;

/// Fold extraction results into a character map.
///
/// New names get a fresh record; known names have their appearance count
/// increased. Returns the names touched, in name order.
pub fn merge_candidates(map: &mut CharacterMap, candidates: &CandidateMap) -> Vec<String> {
    let mut touched = Vec::with_capacity(candidates.len());
    for (name, candidate) in candidates {
        let mentions = candidate.appearances.max(1);
        map.entry(name.clone())
            .and_modify(|record| record.record_mentions(mentions))
            .or_insert_with(|| CharacterRecord::new(name.clone()).with_appearances(mentions));
        touched.push(name.clone());
    }
    touched
}
