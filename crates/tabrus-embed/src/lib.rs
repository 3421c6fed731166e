//! Sentence embedders for example retrieval.
//!
//! `EmbeddingModel` runs BGE-M3 (XLM-RoBERTa) locally through candle.
//! `HashingEmbedder` is a lexical stand-in that needs no model files: it is
//! what tests use and what the engine falls back to when no model is present.

mod device;
mod pool;
mod tokenize;

use anyhow::{Result, anyhow};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::xlm_roberta::{Config as XLMRobertaConfig, XLMRobertaModel};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

use tabrus_core::config::RetrievalSettings;
use tabrus_core::traits::Embedder;

pub use device::select_device;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

pub struct EmbeddingModel { model: XLMRobertaModel, tokenizer: Tokenizer, device: Device, id: String, dim: usize, max_len: usize }

impl EmbeddingModel {
    /// Load `tokenizer.json`, `config.json` and `pytorch_model.bin` from `model_dir`.
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let raw_config = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: XLMRobertaConfig = serde_json::from_str(&raw_config)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)?["hidden_size"].as_u64().unwrap_or(1024) as usize;
        let weights = candle_core::pickle::read_all(model_dir.join("pytorch_model.bin"))?;
        let weights_map: std::collections::HashMap<String, Tensor> = weights.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights_map, DType::F32, &device);
        let model = XLMRobertaModel::new(&config, vb)?;
        let name = model_dir.file_name().and_then(|n| n.to_str()).unwrap_or("xlm-roberta");
        info!(dim, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, id: format!("{}:d{}:t{}", name, dim, max_len), dim, max_len })
    }

    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = Tensor::zeros((1, self.max_len), DType::I64, &self.device)?;
        let hidden = self.model.forward(&input_ids, &attention_mask, &token_type_ids, None, None, None)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v: Vec<f32> = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1()?;
        if v.len() != self.dim { return Err(anyhow!("embedding dim {} != {}", v.len(), self.dim)); }
        let elapsed = start.elapsed().as_millis();
        if elapsed > 100 { debug!(elapsed_ms = elapsed as u64, "slow embedding"); }
        Ok(v)
    }
}

impl Embedder for EmbeddingModel {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { texts.iter().map(|t| self.embed_text(t)).collect() }
}

/// Feature-hashing embedder over lowercase words and their character trigrams.
///
/// Texts sharing words or word fragments get a positive cosine similarity,
/// which is enough to rank examples by lexical overlap. Deterministic.
pub struct HashingEmbedder { dim: usize, id: String }

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self { let dim = dim.max(1); Self { dim, id: format!("hash:d{}", dim) } }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut v, word, 1.0);
            let padded: Vec<char> = std::iter::once('^').chain(word.chars()).chain(std::iter::once('$')).collect();
            for gram in padded.windows(3) { self.add_feature(&mut v, &gram.iter().collect::<String>(), 0.5); }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }

    fn add_feature(&self, v: &mut [f32], feature: &str, weight: f32) {
        let mut hasher = XxHash64::with_seed(0);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
        v[(h as usize) % self.dim] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

fn fake_requested(settings: &RetrievalSettings) -> bool {
    settings.use_fake_embeddings
        || std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// The embedder `settings` ask for: the hashing embedder when fake embeddings
/// are requested, otherwise the model found by [`resolve_model_dir`].
pub fn get_default_embedder(settings: &RetrievalSettings) -> Result<Arc<dyn Embedder>> {
    if fake_requested(settings) {
        info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Arc::new(HashingEmbedder::new(settings.fake_dim)));
    }
    let dir = resolve_model_dir(settings.model_dir.as_deref().map(Path::new))?;
    Ok(Arc::new(EmbeddingModel::load(&dir, settings.max_len)?))
}

/// Like [`get_default_embedder`], but falls back to the hashing embedder when
/// the model cannot be loaded.
pub fn embedder_or_fallback(settings: &RetrievalSettings) -> Arc<dyn Embedder> {
    match get_default_embedder(settings) {
        Ok(e) => e,
        Err(e) => {
            warn!(error = %e, "embedding model unavailable; using hashing embedder");
            Arc::new(HashingEmbedder::new(settings.fake_dim))
        }
    }
}

/// First existing directory among `configured`, `APP_MODEL_DIR`, `models/bge-m3`.
pub fn resolve_model_dir(configured: Option<&Path>) -> Result<PathBuf> {
    let env_dir = std::env::var("APP_MODEL_DIR").ok().map(PathBuf::from);
    let candidates = configured.map(Path::to_path_buf).into_iter().chain(env_dir).chain(std::iter::once(PathBuf::from("models/bge-m3")));
    for dir in candidates {
        if dir.exists() { return Ok(dir); }
        debug!(dir = %dir.display(), "model dir not found");
    }
    Err(anyhow!("Could not locate embedding model directory"))
}
