//! Example retrieval for LLM grounding.
//!
//! Example sentences from the dictionary are embedded into an immutable
//! [`RetrievalSnapshot`]; [`ExampleRetriever`] serves cosine-ranked lookups
//! from the current snapshot and replaces it wholesale on re-index.
pub mod cache;
pub mod ops;
pub mod retriever;

pub use cache::{content_hash, EmbeddingCache};
pub use retriever::{ExampleRetriever, IndexStats, IndexedExample, RetrievalSnapshot, RetrievalStatus};
