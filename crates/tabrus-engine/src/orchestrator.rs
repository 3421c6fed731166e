use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use tabrus_core::config::Settings;
use tabrus_core::error::{Error, Result};
use tabrus_core::types::{Direction, TranslateRequest, TranslateResult, WordTranslation};
use tabrus_dict::{DictionaryIndex, DictionaryStore};
use tabrus_llm::{ContextualTranslator, GlossaryLine, LlmRequest};
use tabrus_morph::{render, tokenize, MorphNormalizer};
use tabrus_vector::{ExampleRetriever, IndexStats, RetrievalStatus};

use crate::confidence::MatchKind;
use crate::matcher::resolve_word;

/// Word-by-word translation of one text.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryPass {
    /// One per word-token, in input order.
    pub words: Vec<WordTranslation>,
    /// Input with every resolved word replaced by its first translation.
    pub translated_text: String,
}

impl DictionaryPass {
    /// Resolved words as prompt glossary lines, first occurrence only.
    pub fn glossary(&self) -> Vec<GlossaryLine> {
        let mut out: Vec<GlossaryLine> = Vec::new();
        for w in self.words.iter().filter(|w| !w.is_unknown) {
            let word = w.word.to_lowercase();
            if out.iter().any(|g| g.word == word) { continue; }
            out.push(GlossaryLine { word, translations: w.translations.clone() });
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// `ok` when the dictionary is loaded, `degraded` otherwise.
    pub status: &'static str,
    pub dictionary: bool,
    pub dictionary_entries: usize,
    pub vector_store: bool,
    pub retrieval: Option<RetrievalStatus>,
    pub llm_server: bool,
}

/// The translation engine: dictionary pass, optional grounded LLM pass, merge.
pub struct Translator {
    store: Arc<DictionaryStore>,
    normalizer: MorphNormalizer,
    retriever: Option<Arc<ExampleRetriever>>,
    llm: Option<Arc<dyn ContextualTranslator>>,
    settings: Settings,
}

impl Translator {
    pub fn new(store: Arc<DictionaryStore>, settings: Settings) -> Self {
        Self { normalizer: MorphNormalizer::new(&settings.morphology), store, retriever: None, llm: None, settings }
    }

    pub fn with_retriever(mut self, retriever: Arc<ExampleRetriever>) -> Self { self.retriever = Some(retriever); self }

    pub fn with_llm(mut self, llm: Arc<dyn ContextualTranslator>) -> Self { self.llm = Some(llm); self }

    pub fn store(&self) -> &Arc<DictionaryStore> { &self.store }

    pub fn settings(&self) -> &Settings { &self.settings }

    /// Trimmed input, or `InvalidInput` when blank or over the length limit.
    fn validate<'t>(&self, text: &'t str) -> Result<&'t str> {
        let text = text.trim();
        if text.is_empty() { return Err(Error::InvalidInput("text is empty".to_string())); }
        let chars = text.chars().count();
        let limit = self.settings.input.max_text_chars;
        if chars > limit { return Err(Error::InvalidInput(format!("text is {} characters, limit is {}", chars, limit))); }
        Ok(text)
    }

    /// Dictionary-only translation against one snapshot. Never fails.
    pub fn dictionary_pass(&self, index: &DictionaryIndex, text: &str, direction: Direction) -> DictionaryPass {
        let tokens: Vec<_> = tokenize(text).collect();
        let mut words = Vec::new();
        let mut fuzzy = 0usize;
        let mut substitutes: Vec<Option<String>> = Vec::with_capacity(tokens.len());
        for token in &tokens {
            if !token.is_word { substitutes.push(None); continue; }
            let (wt, kind) = resolve_word(index, &self.normalizer, &token.text, direction, &self.settings.matching);
            substitutes.push(wt.translations.first().cloned());
            words.push(wt);
            if matches!(kind, Some(MatchKind::Fuzzy(_))) { fuzzy += 1; }
        }
        let mut slots = substitutes.into_iter();
        let translated_text = render(text, &tokens, |t| slots.next().flatten().unwrap_or_else(|| t.text.clone()));
        debug!(words = words.len(), fuzzy, "words resolved");
        DictionaryPass { words, translated_text }
    }

    /// Translate one request.
    ///
    /// Only blank/oversized input and a missing dictionary are errors; an
    /// unavailable LLM or retriever falls back to the dictionary translation.
    pub async fn translate(&self, req: &TranslateRequest) -> Result<TranslateResult> {
        let text = self.validate(&req.text)?;
        let direction = req.direction;
        let index = self.store.snapshot()?;
        let pass = self.dictionary_pass(&index, text, direction);
        drop(index);
        let unknown = pass.words.iter().filter(|w| w.is_unknown).count();
        debug!(%direction, words = pass.words.len(), unknown, "dictionary pass done");

        let mut result = TranslateResult {
            original_text: text.to_string(),
            translated_text: pass.translated_text.clone(),
            words: pass.words.clone(),
            direction,
            llm_used: false,
        };

        if req.use_llm {
            if let Some(llm) = &self.llm {
                let examples = self.grounding_examples(text, direction).await;
                let glossary = pass.glossary();
                let timeout = Duration::from_secs(self.settings.llm.timeout_secs);
                let call = llm.contextual_translate(LlmRequest { text, direction, examples: &examples, glossary: &glossary, timeout });
                match tokio::time::timeout(timeout, call).await {
                    Ok(Ok(contextual)) => { result.translated_text = contextual; result.llm_used = true; }
                    Ok(Err(reason)) => warn!(%reason, "LLM unavailable; keeping dictionary translation"),
                    Err(_) => warn!(timeout_secs = timeout.as_secs(), "LLM call exceeded timeout; keeping dictionary translation"),
                }
            } else {
                debug!("no LLM configured");
            }
        }
        Ok(result)
    }

    /// Retrieval runs on the blocking pool; any failure means no examples.
    async fn grounding_examples(&self, text: &str, direction: Direction) -> Vec<(String, String)> {
        let Some(retriever) = self.retriever.clone() else { return Vec::new() };
        let k = self.settings.retrieval.top_k;
        let text = text.to_string();
        match tokio::task::spawn_blocking(move || retriever.retrieve(&text, direction, k)).await {
            Ok(examples) => examples,
            Err(e) => { warn!(error = %e, "retrieval task failed"); Vec::new() }
        }
    }

    /// Rebuild the retrieval index from the current dictionary snapshot.
    pub fn reindex(&self) -> Result<Option<IndexStats>> {
        let Some(retriever) = &self.retriever else { return Ok(None) };
        let index = self.store.snapshot()?;
        let stats = retriever.index(index.entries()).context("retrieval reindex").map_err(|e| Error::Operation(format!("{:#}", e)))?;
        info!(examples = stats.examples, "retrieval index ready");
        Ok(Some(stats))
    }

    pub async fn health(&self) -> HealthReport {
        let (dictionary, dictionary_entries) = match self.store.snapshot() {
            Ok(index) => (true, index.len()),
            Err(_) => (false, 0),
        };
        let retrieval = self.retriever.as_ref().map(|r| r.status());
        let vector_store = retrieval.as_ref().map(|r| r.examples > 0).unwrap_or(false);
        let llm_server = match &self.llm {
            Some(llm) => llm.is_available().await,
            None => false,
        };
        HealthReport { status: if dictionary { "ok" } else { "degraded" }, dictionary, dictionary_entries, vector_store, retrieval, llm_server }
    }
}
