//! NovelSession - the primary public API.
//!
//! A session owns everything for one novel: the character map, the
//! extractor and analyzer, the identity registry and (optionally) a store
//! connection. Feed it chapters in reading order, sync whenever convenient.

use crate::character::{merge_candidates, CharacterMap, CharacterRecord};
use crate::config::EngineConfig;
use crate::extract::NameCandidateExtractor;
use crate::infer::{ConfidenceTier, GenderDecision, GenderEvidenceAnalyzer};
use crate::persist::{CharacterStore, StoreClient, SyncError};
use crate::registry::IdentityRegistry;
use crate::summary::character_summary;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;

/// Errors from NovelSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No store configured for this session")]
    NoStore,
}

/// What processing one chapter changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterReport {
    /// Names seen for the first time.
    pub new_characters: Vec<String>,
    /// Every name found in the chapter.
    pub mentioned: Vec<String>,
    /// Names whose gender evidence was re-examined.
    pub analyzed: Vec<String>,
    /// Names whose gender or confidence changed.
    pub updated: Vec<String>,
}

/// Character tracking for one novel.
pub struct NovelSession {
    novel_id: String,
    config: EngineConfig,
    extractor: NameCandidateExtractor,
    analyzer: GenderEvidenceAnalyzer,
    registry: IdentityRegistry,
    characters: CharacterMap,
    client: Option<StoreClient>,
}

impl std::fmt::Debug for NovelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NovelSession")
            .field("novel_id", &self.novel_id)
            .field("characters", &self.characters.len())
            .field("has_store", &self.client.is_some())
            .finish()
    }
}

impl NovelSession {
    /// Create a session with default configuration and no store.
    pub fn new(novel_id: impl Into<String>) -> Self {
        Self::with_config(novel_id, EngineConfig::default())
    }

    /// Create a session with a specific configuration.
    pub fn with_config(novel_id: impl Into<String>, config: EngineConfig) -> Self {
        let novel_id = novel_id.into();
        Self {
            extractor: NameCandidateExtractor::from_config(&config),
            analyzer: GenderEvidenceAnalyzer::from_config(&config),
            registry: IdentityRegistry::new(novel_id.clone()).with_evidence_cap(config.evidence_cap),
            characters: CharacterMap::new(),
            client: None,
            novel_id,
            config,
        }
    }

    /// Attach a store. Every call is bounded by the configured sync timeout.
    pub fn with_store(mut self, store: Arc<dyn CharacterStore>) -> Self {
        self.client = Some(StoreClient::from_config(store, &self.config));
        self
    }

    pub fn novel_id(&self) -> &str {
        &self.novel_id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// All characters known so far.
    pub fn characters(&self) -> &CharacterMap {
        &self.characters
    }

    pub fn character(&self, name: &str) -> Option<&CharacterRecord> {
        self.characters.get(name)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn confidence_tier(&self, name: &str) -> Option<ConfidenceTier> {
        self.characters
            .get(name)
            .map(|record| ConfidenceTier::of(record.confidence, &self.config))
    }

    /// Extract names from a chapter and update gender evidence.
    ///
    /// Only characters mentioned in this chapter whose gender is unknown or
    /// below the re-analysis threshold are analyzed, in name order, so a
    /// character decided earlier in the pass can anchor relationship
    /// inference for later ones.
    pub fn process_chapter(&mut self, text: &str) -> ChapterReport {
        let candidates = self.extractor.extract(text);
        let mut report = ChapterReport {
            new_characters: candidates
                .keys()
                .filter(|name| !self.characters.contains_key(*name))
                .cloned()
                .collect(),
            mentioned: merge_candidates(&mut self.characters, &candidates),
            ..ChapterReport::default()
        };

        let threshold = self.config.reanalysis_threshold;
        report.analyzed = report
            .mentioned
            .iter()
            .filter(|name| {
                self.characters
                    .get(*name)
                    .is_some_and(|record| record.needs_analysis(threshold))
            })
            .cloned()
            .collect();

        for name in &report.analyzed {
            let score = self.analyzer.analyze(name, text, &self.characters);
            let decision = GenderDecision::from_score(&score, &self.config);
            if let Some(record) = self.characters.get_mut(name) {
                if record.apply_decision(&decision) {
                    log::debug!(
                        "{name}: {} at {:.2} ({:?})",
                        record.gender,
                        record.confidence,
                        decision.tier(&self.config)
                    );
                    report.updated.push(name.clone());
                }
            }
        }

        log::info!(
            "Chapter processed: {} names, {} new, {} updated",
            report.mentioned.len(),
            report.new_characters.len(),
            report.updated.len()
        );
        report
    }

    /// Read a chapter from disk and process it.
    pub async fn process_chapter_file(&mut self, path: impl AsRef<Path>) -> Result<ChapterReport, SessionError> {
        let text = fs::read_to_string(path).await?;
        Ok(self.process_chapter(&text))
    }

    fn client(&self) -> Result<&StoreClient, SessionError> {
        self.client.as_ref().ok_or(SessionError::NoStore)
    }

    /// Pull stored characters into the session. Returns how many were stored.
    pub async fn load(&mut self) -> Result<usize, SessionError> {
        let client = self.client()?.clone();
        let stored = client.load_characters(&self.novel_id).await?;
        let loaded = self.registry.absorb(&stored);
        let count = loaded.len();

        for (name, record) in loaded {
            match self.characters.get_mut(&name) {
                Some(existing) => existing.merge(&record),
                None => {
                    self.characters.insert(name, record);
                }
            }
        }

        log::info!("Loaded {count} stored characters for novel {}", self.novel_id);
        Ok(count)
    }

    /// Merge with the store and write the compact map back.
    ///
    /// On failure the in-memory state stays usable and a later sync can
    /// retry.
    pub async fn sync(&mut self) -> Result<usize, SessionError> {
        let client = self.client()?.clone();
        Ok(self.registry.sync(&client, &mut self.characters).await?)
    }

    pub async fn is_chapter_enhanced(&self, chapter: u32) -> Result<bool, SessionError> {
        Ok(self.client()?.is_chapter_enhanced(&self.novel_id, chapter).await?)
    }

    pub async fn mark_chapter_enhanced(&self, chapter: u32) -> Result<(), SessionError> {
        Ok(self.client()?.mark_chapter_enhanced(&self.novel_id, chapter).await?)
    }

    /// Store a style descriptor for the novel.
    pub async fn set_style(&self, style: serde_json::Value) -> Result<(), SessionError> {
        Ok(self.client()?.set_style(&self.novel_id, style).await?)
    }

    /// Character summary using the configured limit.
    pub fn summary(&self) -> String {
        character_summary(&self.characters, self.config.summary_limit)
    }

    /// Drop memoized analysis. Call between unrelated documents.
    pub fn clear_caches(&mut self) {
        self.analyzer.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gender::Gender;
    use crate::persist::MemoryStore;

    #[test]
    fn test_process_chapter_tracks_appearances() {
        let mut session = NovelSession::new("novel");
        let report = session.process_chapter("\"Go,\" Tom said. Tom picked up his bag and he left.");
        assert_eq!(report.new_characters, vec!["Tom"]);
        assert_eq!(report.analyzed, vec!["Tom"]);

        let tom = session.character("Tom").unwrap();
        assert_eq!(tom.gender, Gender::Male);
        assert!(tom.confidence > 0.0);

        let report = session.process_chapter("Tom said nothing.");
        assert!(report.new_characters.is_empty());
        assert_eq!(report.mentioned, vec!["Tom"]);
    }

    #[test]
    fn test_confident_characters_are_not_reanalyzed() {
        let mut session = NovelSession::new("novel");
        let text = "\"Run,\" Tom said. He ran. He jumped. He laughed. His dog barked.";
        session.process_chapter(text);
        assert_eq!(session.confidence_tier("Tom"), Some(ConfidenceTier::High));

        let report = session.process_chapter("Tom said she was late.");
        assert!(report.analyzed.is_empty());
        assert_eq!(session.character("Tom").unwrap().gender, Gender::Male);
    }

    #[tokio::test]
    async fn test_store_operations_need_a_store() {
        let mut session = NovelSession::new("novel");
        assert!(matches!(session.sync().await, Err(SessionError::NoStore)));
        assert!(matches!(session.load().await, Err(SessionError::NoStore)));
    }

    #[tokio::test]
    async fn test_chapter_tracking() {
        let session = NovelSession::new("novel").with_store(Arc::new(MemoryStore::new()));
        assert!(!session.is_chapter_enhanced(1).await.unwrap());
        session.mark_chapter_enhanced(1).await.unwrap();
        assert!(session.is_chapter_enhanced(1).await.unwrap());
    }

    #[test]
    fn test_summary_uses_config_limit() {
        let config = EngineConfig::default().with_summary_limit(1);
        let mut session = NovelSession::with_config("novel", config);
        session.process_chapter("Ann said hi. Bob said hi. Bob said bye.");
        assert_eq!(session.summary(), "- Bob: unknown (they/them), 2 appearances");
    }
}
