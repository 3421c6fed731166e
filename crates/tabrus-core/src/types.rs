//! Domain types shared by the dictionary, retrieval and translation engines.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub type EntryId = u64;

/// Which language is the source of a request.
///
/// Serialized as `"tab-rus"` / `"rus-tab"`, the shape the frontend expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    #[serde(rename = "tab-rus")]
    TabRus,
    #[serde(rename = "rus-tab")]
    RusTab,
}

impl Direction {
    pub fn toggle(self) -> Self {
        match self {
            Direction::TabRus => Direction::RusTab,
            Direction::RusTab => Direction::TabRus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TabRus => "tab-rus",
            Direction::RusTab => "rus-tab",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tab-rus" | "tab_rus" => Ok(Direction::TabRus),
            "rus-tab" | "rus_tab" => Ok(Direction::RusTab),
            other => Err(Error::InvalidInput(format!("unknown direction '{}'", other))),
        }
    }
}

/// A slice of the input text. `start`/`end` are byte offsets into the
/// original string, so `&text[start..end] == self.text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub is_word: bool,
    pub start: usize,
    pub end: usize,
}

/// Usage example attached to a dictionary entry.
///
/// `source_text` is always Tabasaran and `target_text` Russian, regardless of
/// the direction a request runs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(alias = "tabasaran")]
    pub source_text: String,
    #[serde(alias = "russian")]
    pub target_text: String,
    #[serde(default, alias = "source", skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

/// A headword with its senses, as produced by the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: EntryId,
    pub word: String,
    #[serde(default)]
    pub word_normalized: String,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub part_of_speech: Option<String>,
    /// Senses, most common first.
    pub translations: Vec<String>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Per-word result of the dictionary pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTranslation {
    pub word: String,
    pub translations: Vec<String>,
    pub part_of_speech: Option<String>,
    pub confidence: f32,
    pub is_unknown: bool,
}

impl WordTranslation {
    pub fn unknown(word: &str) -> Self {
        Self { word: word.to_string(), translations: Vec::new(), part_of_speech: None, confidence: 0.0, is_unknown: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default = "default_use_llm")]
    pub use_llm: bool,
}

fn default_use_llm() -> bool { true }

/// Final response of one translation request.
///
/// `words` holds one item per word-token in input order; punctuation only
/// shows up inside `translated_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResult {
    pub original_text: String,
    pub translated_text: String,
    pub words: Vec<WordTranslation>,
    pub direction: Direction,
    pub llm_used: bool,
}
