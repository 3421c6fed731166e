//! tabrus-dict
//!
//! The dictionary store: entries loaded from JSON, indexed for exact, fuzzy,
//! prefix, root and target-language lookup in both directions. Each load
//! produces an immutable [`DictionaryIndex`]; [`DictionaryStore`] swaps
//! snapshots atomically so readers never observe a half-built index.

pub mod fuzzy;
pub mod loader;
pub mod store;

pub use loader::load_entries;
pub use store::{DictionaryIndex, DictionaryStore};
