//! tabrus-morph
//!
//! Surface-level text handling for the translation engine: a lossless
//! tokenizer and a heuristic affix stripper producing lookup candidates.

pub mod normalize;
pub mod tokenizer;

pub use normalize::{fold, normalize_key, MorphNormalizer};
pub use tokenizer::{render, tokenize, Tokenizer};
