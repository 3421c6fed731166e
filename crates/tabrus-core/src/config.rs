//! Layered configuration and path helpers.
//!
//! Figment merges compiled defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` env vars (`__` separates nested keys, e.g. `APP_LLM__MODEL`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    /// Load `config.toml` and friends from the current directory.
    pub fn load() -> Result<Self> { Self::load_from(Path::new(".")) }

    pub fn load_from(base_dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base_dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base_dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base_dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base_dir: base_dir.to_path_buf() };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Resolve a configured path against the directory the config was loaded from.
    pub fn resolve_path<S: AsRef<str>>(&self, p: S) -> PathBuf { resolve_with_base(&self.base_dir, p) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dictionary: DictionarySettings,
    pub matching: MatchingSettings,
    pub morphology: MorphologySettings,
    pub retrieval: RetrievalSettings,
    pub llm: LlmSettings,
    pub input: InputSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.matching.fuzzy_min_confidence) {
            return Err(Error::InvalidConfig(format!(
                "matching.fuzzy_min_confidence must be within [0, 1], got {}",
                self.matching.fuzzy_min_confidence
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::InvalidConfig("llm.timeout_secs must be positive".to_string()));
        }
        if self.input.max_text_chars == 0 {
            return Err(Error::InvalidConfig("input.max_text_chars must be positive".to_string()));
        }
        for (name, rules) in [("tab", &self.morphology.tab), ("rus", &self.morphology.rus)] {
            if rules.min_stem_chars == 0 {
                return Err(Error::InvalidConfig(format!("morphology.{}.min_stem_chars must be positive", name)));
            }
            if rules.suffixes.iter().chain(rules.prefixes.iter()).any(|a| a.trim().is_empty()) {
                return Err(Error::InvalidConfig(format!("morphology.{} contains an empty affix", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionarySettings {
    /// A JSON file, or a directory scanned for `*.json` files.
    pub path: String,
}

impl Default for DictionarySettings {
    fn default() -> Self { Self { path: "data/dictionary".to_string() } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub fuzzy_max_distance: usize,
    /// Fuzzy matches scoring below this are reported as unknown words.
    pub fuzzy_min_confidence: f32,
    pub fuzzy_limit: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self { Self { fuzzy_max_distance: 2, fuzzy_min_confidence: 0.2, fuzzy_limit: 10 } }
}

/// Affix inventory for one source language. Treated as linguistic data:
/// the defaults are a starting point and are expected to be overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AffixRules {
    pub suffixes: Vec<String>,
    pub prefixes: Vec<String>,
    pub min_stem_chars: usize,
}

impl Default for AffixRules {
    fn default() -> Self { Self { suffixes: Vec::new(), prefixes: Vec::new(), min_stem_chars: 2 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologySettings {
    pub tab: AffixRules,
    pub rus: AffixRules,
}

impl Default for MorphologySettings {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            tab: AffixRules {
                // plural, genitive, dative, ergative, locatives, 1pl, infinitive, adjectival
                suffixes: owned(&["ар", "ер", "ин", "ди", "из", "на", "хъ", "ъ", "з", "уз", "ру", "ан"]),
                prefixes: owned(&["дар"]),
                min_stem_chars: 2,
            },
            rus: AffixRules {
                suffixes: owned(&[
                    "ться", "ется", "ются", "ами", "ями", "ого", "его", "ому", "ему", "ыми", "ими", "ешь", "ете",
                    "ишь", "ите", "ать", "ять", "ить", "еть", "уть", "ая", "яя", "ое", "ее", "ые", "ие", "ой", "ей",
                    "ий", "ый", "ом", "ем", "ах", "ях", "ам", "ям", "ов", "ев", "а", "я", "о", "е", "ы", "и", "у",
                    "ю", "ь",
                ]),
                prefixes: Vec::new(),
                min_stem_chars: 3,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub model_dir: Option<String>,
    pub use_fake_embeddings: bool,
    pub max_len: usize,
    pub fake_dim: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 5, model_dir: None, use_fake_embeddings: false, max_len: 256, fake_dim: 384 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_p: f32,
    /// Upper bound on dictionary glossary lines sent with the prompt.
    pub max_glossary: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral:7b".to_string(),
            timeout_secs: 30,
            temperature: 0.3,
            top_p: 0.9,
            max_glossary: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub max_text_chars: usize,
}

impl Default for InputSettings {
    fn default() -> Self { Self { max_text_chars: 5000 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
