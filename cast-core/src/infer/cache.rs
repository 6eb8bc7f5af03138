//! Memoization for per-text analysis work.
//!
//! Keys default to a 64-bit FNV-1a hash of the full text. Two different texts
//! with the same hash will share cache entries; this is an accepted risk for
//! speed. Callers that cannot tolerate it should enable strict keys, which
//! store the full text in the key instead.

use super::analyzer::EvidenceScore;
use crate::text::content_hash;
use std::collections::HashMap;
use std::ops::Range;

/// Identifies a text inside the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKey {
    Hash(u64),
    Text(String),
}

impl ContentKey {
    pub fn new(text: &str, strict: bool) -> Self {
        if strict {
            ContentKey::Text(text.to_string())
        } else {
            ContentKey::Hash(content_hash(text))
        }
    }
}

type CacheKey = (String, ContentKey);

/// Hit/miss counters, mostly for tests and debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Sentence and dialogue memoization owned by one analyzer.
///
/// Entries are never evicted automatically. Call [`AnalysisCache::clear`]
/// between unrelated documents to bound memory.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    strict_keys: bool,
    /// Sentence byte ranges that mention the target.
    sentences: HashMap<CacheKey, Vec<Range<usize>>>,
    /// Dialogue attribution scores.
    dialogue: HashMap<CacheKey, EvidenceScore>,
    stats: CacheStats,
}

impl AnalysisCache {
    pub fn new(strict_keys: bool) -> Self {
        Self {
            strict_keys,
            ..Self::default()
        }
    }

    fn key(&self, target: &str, text: &str) -> CacheKey {
        (target.to_string(), ContentKey::new(text, self.strict_keys))
    }

    /// Sentence ranges in `text` that mention `target`, computing them with
    /// `compute` on a miss.
    ///
    /// Ranges from a colliding hash may not fit `text`; callers must slice
    /// with `str::get`.
    pub fn sentences_or_insert_with(
        &mut self,
        target: &str,
        text: &str,
        compute: impl FnOnce() -> Vec<Range<usize>>,
    ) -> Vec<Range<usize>> {
        let key = self.key(target, text);
        if let Some(ranges) = self.sentences.get(&key) {
            self.stats.hits += 1;
            return ranges.clone();
        }
        self.stats.misses += 1;
        let ranges = compute();
        self.sentences.insert(key, ranges.clone());
        ranges
    }

    /// Dialogue score for `target` in `text`, computing it on a miss.
    pub fn dialogue_or_insert_with(
        &mut self,
        target: &str,
        text: &str,
        compute: impl FnOnce() -> EvidenceScore,
    ) -> EvidenceScore {
        let key = self.key(target, text);
        if let Some(score) = self.dialogue.get(&key) {
            self.stats.hits += 1;
            return score.clone();
        }
        self.stats.misses += 1;
        let score = compute();
        self.dialogue.insert(key, score.clone());
        score
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.sentences.clear();
        self.dialogue.clear();
    }

    /// Total number of cached entries.
    pub fn len(&self) -> usize {
        self.sentences.len() + self.dialogue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_memoization() {
        let mut cache = AnalysisCache::new(false);
        let first = cache.sentences_or_insert_with("Mary", "Mary ran.", || vec![0..9]);
        let second = cache.sentences_or_insert_with("Mary", "Mary ran.", || unreachable!());
        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_keys_include_target() {
        let mut cache = AnalysisCache::new(false);
        cache.sentences_or_insert_with("Mary", "text", Vec::new);
        cache.sentences_or_insert_with("John", "text", Vec::new);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = AnalysisCache::new(true);
        cache.dialogue_or_insert_with("Mary", "text", EvidenceScore::default);
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        cache.dialogue_or_insert_with("Mary", "text", EvidenceScore::default);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_strict_key_holds_text() {
        assert_eq!(
            ContentKey::new("abc", true),
            ContentKey::Text("abc".to_string())
        );
        assert!(matches!(ContentKey::new("abc", false), ContentKey::Hash(_)));
    }
}
