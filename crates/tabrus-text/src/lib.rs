//! tabrus-text
//!
//! Tantivy full-text index over the target-language side of the dictionary.
//! Backs search-by-Russian-word for the lookup surface.
pub mod tantivy_utils;
pub mod index;

pub use index::{TranslationHit, TranslationIndex};
