//! Translation engine: per-word dictionary matching with confidence scores,
//! optionally merged with a retrieval-grounded LLM translation.
pub mod confidence;
pub mod matcher;
pub mod orchestrator;

pub use confidence::{band, score, ConfidenceBand, MatchKind};
pub use matcher::resolve_word;
pub use orchestrator::{DictionaryPass, HealthReport, Translator};
