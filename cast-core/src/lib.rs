//! Character discovery, gender inference and stable identities for
//! serialized fiction.
//!
//! This crate provides:
//! - Name extraction from narrative text with a fixed set of surface patterns
//! - Weighted gender evidence from pronouns, dialogue attribution,
//!   possessives and relationship phrasing
//! - Stable per-novel numeric identities and a compact storage format
//! - A store protocol with in-memory and JSON file implementations
//!
//! # Quick Start
//!
//! ```ignore
//! use cast_core::{JsonFileStore, NovelSession};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(JsonFileStore::new("characters"));
//!     let mut session = NovelSession::new("my-novel").with_store(store);
//!
//!     session.load().await?;
//!     session.process_chapter("\"I'm fine,\" Mary said. She smiled.");
//!     session.sync().await?;
//!
//!     println!("{}", session.summary());
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod config;
pub mod extract;
pub mod gender;
pub mod infer;
pub mod persist;
pub mod registry;
pub mod session;
pub mod summary;
pub mod testing;
pub mod text;

// Primary public API
pub use character::{CharacterMap, CharacterRecord};
pub use config::EngineConfig;
pub use extract::{Candidate, CandidateMap, CandidateMatch, NameCandidateExtractor, PatternKind};
pub use gender::Gender;
pub use infer::{ConfidenceTier, EvidenceScore, GenderDecision, GenderEvidenceAnalyzer};
pub use persist::{
    CharacterStore, JsonFileStore, MemoryStore, StoreClient, StoreError, StoreRequest, StoreResponse,
    SyncError,
};
pub use registry::{CompactRecord, IdentityRegistry, StoredCharacters};
pub use session::{ChapterReport, NovelSession, SessionError};
pub use summary::character_summary;
pub use testing::FlakyStore;
