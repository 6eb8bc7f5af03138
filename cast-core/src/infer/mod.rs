//! Gender inference: evidence passes, pronoun resolution, relationship
//! rules, memoization and the final decision.

pub mod analyzer;
pub mod cache;
pub mod decision;
pub mod relationship;
pub mod resolver;

pub use analyzer::{EvidenceScore, GenderEvidenceAnalyzer};
pub use cache::{AnalysisCache, CacheStats, ContentKey};
pub use decision::{ConfidenceTier, GenderDecision};
pub use relationship::{RelationGroup, RelationRule};
pub use resolver::Mention;
