//! Persistence for character maps and chapter progress.
//!
//! Storage is a request/response protocol so the engine can sit in front of
//! any transport. The engine only ever talks to a [`CharacterStore`]
//! through a [`StoreClient`], which bounds every call with a timeout.
//!
//! Two stores ship with the crate: [`MemoryStore`] for tests and embedding,
//! and [`JsonFileStore`], which keeps one pretty-printed JSON document per
//! novel in a directory.

use crate::config::EngineConfig;
use crate::registry::{CompactRecord, StoredCharacters};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Errors seen by the engine when talking to a store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Store reported an error: {0}")]
    Rejected(String),
}

// ============================================================================
// Protocol
// ============================================================================

/// Operation requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreAction {
    GetCharacterMap,
    UpdateCharacterMap,
    IsChapterEnhanced,
    MarkChapterEnhanced,
    SetStyle,
}

/// A request to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub action: StoreAction,
    pub novel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chars: Option<BTreeMap<u32, CompactRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
}

impl StoreRequest {
    fn new(action: StoreAction, novel_id: impl Into<String>) -> Self {
        Self {
            action,
            novel_id: novel_id.into(),
            chars: None,
            chapter_number: None,
            style: None,
        }
    }

    pub fn get_character_map(novel_id: impl Into<String>) -> Self {
        Self::new(StoreAction::GetCharacterMap, novel_id)
    }

    pub fn update_character_map(novel_id: impl Into<String>, chars: BTreeMap<u32, CompactRecord>) -> Self {
        Self {
            chars: Some(chars),
            ..Self::new(StoreAction::UpdateCharacterMap, novel_id)
        }
    }

    pub fn is_chapter_enhanced(novel_id: impl Into<String>, chapter: u32) -> Self {
        Self {
            chapter_number: Some(chapter),
            ..Self::new(StoreAction::IsChapterEnhanced, novel_id)
        }
    }

    pub fn mark_chapter_enhanced(novel_id: impl Into<String>, chapter: u32) -> Self {
        Self {
            chapter_number: Some(chapter),
            ..Self::new(StoreAction::MarkChapterEnhanced, novel_id)
        }
    }

    pub fn set_style(novel_id: impl Into<String>, style: Value) -> Self {
        Self {
            style: Some(style),
            ..Self::new(StoreAction::SetStyle, novel_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

/// The store's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Compact or name-indexed character data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_map: Option<Value>,
    /// Fallback character data, possibly a JSON string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_character_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_chapter_enhanced: Option<bool>,
}

impl StoreResponse {
    pub fn ok() -> Self {
        Self {
            status: ResponseStatus::Ok,
            error: None,
            character_map: None,
            raw_character_data: None,
            style: None,
            is_chapter_enhanced: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            error: Some(message.into()),
            ..Self::ok()
        }
    }

    pub fn with_character_map(mut self, map: Value) -> Self {
        self.character_map = Some(map);
        self
    }

    pub fn with_raw_character_data(mut self, raw: Value) -> Self {
        self.raw_character_data = Some(raw);
        self
    }

    pub fn with_style(mut self, style: Option<Value>) -> Self {
        self.style = style;
        self
    }

    pub fn with_chapter_enhanced(mut self, enhanced: bool) -> Self {
        self.is_chapter_enhanced = Some(enhanced);
        self
    }

    /// Turn an error status into `SyncError::Rejected`.
    pub fn into_result(self) -> Result<Self, SyncError> {
        match self.status {
            ResponseStatus::Ok => Ok(self),
            ResponseStatus::Error => Err(SyncError::Rejected(
                self.error.unwrap_or_else(|| "unspecified error".to_string()),
            )),
        }
    }

    /// Character data, preferring `characterMap` over `rawCharacterData`.
    pub fn stored_characters(&self) -> StoredCharacters {
        let primary = self
            .character_map
            .clone()
            .map(StoredCharacters::from_value)
            .filter(|stored| !stored.is_empty());

        match (primary, &self.raw_character_data) {
            (Some(stored), _) => stored,
            (None, Some(raw)) => StoredCharacters::from_value(raw.clone()),
            (None, None) => StoredCharacters::default(),
        }
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Something that answers store requests.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn handle(&self, request: StoreRequest) -> Result<StoreResponse, StoreError>;
}

/// Seconds since the Unix epoch.
fn unix_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Everything stored for one novel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NovelDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Value>,
    #[serde(default)]
    pub enhanced_chapters: BTreeSet<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
    /// Last write, in seconds since the Unix epoch.
    #[serde(default)]
    pub updated_at: u64,
}

impl NovelDocument {
    /// Apply a request. Returns the response and whether the document changed.
    pub fn apply(&mut self, request: StoreRequest) -> (StoreResponse, bool) {
        match request.action {
            StoreAction::GetCharacterMap => {
                let response = StoreResponse::ok()
                    .with_character_map(self.characters.clone().unwrap_or(Value::Null))
                    .with_style(self.style.clone());
                (response, false)
            }
            StoreAction::UpdateCharacterMap => {
                let Some(chars) = request.chars else {
                    return (StoreResponse::error("updateCharacterMap requires chars"), false);
                };
                match serde_json::to_value(chars) {
                    Ok(value) => {
                        self.characters = Some(value);
                        self.touch();
                        (StoreResponse::ok(), true)
                    }
                    Err(e) => (StoreResponse::error(e.to_string()), false),
                }
            }
            StoreAction::IsChapterEnhanced => match request.chapter_number {
                Some(chapter) => {
                    let enhanced = self.enhanced_chapters.contains(&chapter);
                    (StoreResponse::ok().with_chapter_enhanced(enhanced), false)
                }
                None => (StoreResponse::error("isChapterEnhanced requires chapterNumber"), false),
            },
            StoreAction::MarkChapterEnhanced => match request.chapter_number {
                Some(chapter) => {
                    self.enhanced_chapters.insert(chapter);
                    self.touch();
                    (StoreResponse::ok().with_chapter_enhanced(true), true)
                }
                None => (StoreResponse::error("markChapterEnhanced requires chapterNumber"), false),
            },
            StoreAction::SetStyle => {
                self.style = request.style;
                self.touch();
                (StoreResponse::ok().with_style(self.style.clone()), true)
            }
        }
    }

    fn touch(&mut self) {
        self.updated_at = unix_now();
    }

    fn is_older_than(&self, max_age: Duration, now: u64) -> bool {
        self.updated_at.saturating_add(max_age.as_secs()) < now
    }
}

fn check_novel_id(novel_id: &str) -> Result<(), StoreError> {
    if novel_id.trim().is_empty() {
        return Err(StoreError::Rejected("empty novel id".to_string()));
    }
    Ok(())
}

/// In-memory store, one document per novel.
#[derive(Debug, Default)]
pub struct MemoryStore {
    novels: RwLock<HashMap<String, NovelDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a novel's document wholesale.
    pub async fn insert_document(&self, novel_id: impl Into<String>, document: NovelDocument) {
        self.novels.write().await.insert(novel_id.into(), document);
    }

    pub async fn document(&self, novel_id: &str) -> Option<NovelDocument> {
        self.novels.read().await.get(novel_id).cloned()
    }

    /// Drop novels not written within `max_age`. Returns how many were dropped.
    pub async fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = unix_now();
        let mut novels = self.novels.write().await;
        let before = novels.len();
        novels.retain(|_, document| !document.is_older_than(max_age, now));
        before - novels.len()
    }
}

#[async_trait]
impl CharacterStore for MemoryStore {
    async fn handle(&self, request: StoreRequest) -> Result<StoreResponse, StoreError> {
        check_novel_id(&request.novel_id)?;

        if request.action == StoreAction::GetCharacterMap || request.action == StoreAction::IsChapterEnhanced {
            let novels = self.novels.read().await;
            let mut document = novels.get(&request.novel_id).cloned().unwrap_or_default();
            return Ok(document.apply(request).0);
        }

        let mut novels = self.novels.write().await;
        let document = novels.entry(request.novel_id.clone()).or_default();
        Ok(document.apply(request).0)
    }
}

/// Directory of JSON documents, one file per novel.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Use `dir`, which is created on first write if missing.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding a novel's document.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte, `_`
    /// included, becomes `_XX` so distinct ids never share a file.
    pub fn path_for(&self, novel_id: &str) -> PathBuf {
        let mut encoded = String::with_capacity(novel_id.len());
        for byte in novel_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                encoded.push(char::from(byte));
            } else {
                encoded.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{encoded}.json"))
    }

    async fn read_document(&self, path: &Path) -> Result<NovelDocument, StoreError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(NovelDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, path: &Path, document: &NovelDocument) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string_pretty(document)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Delete documents not written within `max_age`. Returns how many were
    /// deleted. Unreadable files are left alone.
    pub async fn evict_older_than(&self, max_age: Duration) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let now = unix_now();
        let mut evicted = 0;

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.read_document(&path).await {
                    Ok(document) if document.is_older_than(max_age, now) => {
                        fs::remove_file(&path).await?;
                        evicted += 1;
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Skipping unreadable store file {}: {e}", path.display()),
                }
            }
        }

        if evicted > 0 {
            log::info!("Evicted {evicted} stale novels from {}", self.dir.display());
        }
        Ok(evicted)
    }
}

#[async_trait]
impl CharacterStore for JsonFileStore {
    async fn handle(&self, request: StoreRequest) -> Result<StoreResponse, StoreError> {
        check_novel_id(&request.novel_id)?;
        let path = self.path_for(&request.novel_id);

        let _guard = self.lock.lock().await;
        let mut document = self.read_document(&path).await?;
        let (response, changed) = document.apply(request);
        if changed {
            self.write_document(&path, &document).await?;
        }
        Ok(response)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Typed, time-bounded access to a store.
#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn CharacterStore>,
    timeout: Duration,
}

impl std::fmt::Debug for StoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl StoreClient {
    pub fn new(store: Arc<dyn CharacterStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn from_config(store: Arc<dyn CharacterStore>, config: &EngineConfig) -> Self {
        Self::new(store, config.sync_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send one request. No retries.
    pub async fn send(&self, request: StoreRequest) -> Result<StoreResponse, SyncError> {
        let action = request.action;
        match tokio::time::timeout(self.timeout, self.store.handle(request)).await {
            Err(_) => {
                log::warn!("Store timed out after {:?} on {action:?}", self.timeout);
                Err(SyncError::Timeout(self.timeout))
            }
            Ok(Err(e)) => {
                log::warn!("Store failed on {action:?}: {e}");
                Err(e.into())
            }
            Ok(Ok(response)) => response.into_result(),
        }
    }

    pub async fn load_characters(&self, novel_id: &str) -> Result<StoredCharacters, SyncError> {
        let response = self.send(StoreRequest::get_character_map(novel_id)).await?;
        Ok(response.stored_characters())
    }

    pub async fn save_characters(
        &self,
        novel_id: &str,
        chars: BTreeMap<u32, CompactRecord>,
    ) -> Result<(), SyncError> {
        self.send(StoreRequest::update_character_map(novel_id, chars)).await?;
        Ok(())
    }

    pub async fn is_chapter_enhanced(&self, novel_id: &str, chapter: u32) -> Result<bool, SyncError> {
        let response = self.send(StoreRequest::is_chapter_enhanced(novel_id, chapter)).await?;
        Ok(response.is_chapter_enhanced.unwrap_or(false))
    }

    pub async fn mark_chapter_enhanced(&self, novel_id: &str, chapter: u32) -> Result<(), SyncError> {
        self.send(StoreRequest::mark_chapter_enhanced(novel_id, chapter)).await?;
        Ok(())
    }

    pub async fn set_style(&self, novel_id: &str, style: Value) -> Result<(), SyncError> {
        self.send(StoreRequest::set_style(novel_id, style)).await?;
        Ok(())
    }
}
