use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use tabrus_core::config::LlmSettings;
use tabrus_core::error::{Error, Result};
use tabrus_core::types::Direction;

use crate::error::LlmUnavailable;
use crate::prompt::{build_prompt, clean_reply, GlossaryLine};

const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything one contextual translation call needs.
#[derive(Debug, Clone, Copy)]
pub struct LlmRequest<'a> {
    pub text: &'a str,
    pub direction: Direction,
    pub examples: &'a [(String, String)],
    pub glossary: &'a [GlossaryLine],
    pub timeout: Duration,
}

/// A remote model that can translate a whole text given grounding context.
///
/// Implementations make a single attempt bounded by `req.timeout`. Dropping
/// the returned future abandons the call.
pub trait ContextualTranslator: Send + Sync {
    fn contextual_translate<'a>(&'a self, req: LlmRequest<'a>) -> BoxFuture<'a, std::result::Result<String, LlmUnavailable>>;

    fn is_available(&self) -> BoxFuture<'_, bool>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for Ollama's non-streaming `/api/generate`.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
    max_glossary: usize,
}

impl OllamaClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let http = reqwest::Client::builder().build().map_err(|e| Error::Operation(format!("http client: {}", e)))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            top_p: settings.top_p,
            max_glossary: settings.max_glossary,
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub fn model(&self) -> &str { &self.model }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, LlmUnavailable> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature, top_p: self.top_p },
        };
        let resp = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmUnavailable::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() { return Err(LlmUnavailable::Status(status.as_u16())); }
        let bytes = resp.bytes().await.map_err(|e| LlmUnavailable::Transport(e.to_string()))?;
        let parsed: GenerateResponse = serde_json::from_slice(&bytes).map_err(|e| LlmUnavailable::Malformed(e.to_string()))?;
        parsed.response.ok_or_else(|| LlmUnavailable::Malformed("missing `response` field".to_string()))
    }
}

impl ContextualTranslator for OllamaClient {
    fn contextual_translate<'a>(&'a self, req: LlmRequest<'a>) -> BoxFuture<'a, std::result::Result<String, LlmUnavailable>> {
        async move {
            let prompt = build_prompt(req.text, req.direction, req.examples, req.glossary, self.max_glossary);
            let start = Instant::now();
            let raw = match tokio::time::timeout(req.timeout, self.generate(&prompt)).await {
                Ok(result) => result?,
                Err(_) => return Err(LlmUnavailable::Timeout),
            };
            debug!(model = %self.model, elapsed_ms = start.elapsed().as_millis() as u64, "LLM replied");
            clean_reply(&raw).ok_or_else(|| LlmUnavailable::Malformed("empty reply".to_string()))
        }
        .boxed()
    }

    fn is_available(&self) -> BoxFuture<'_, bool> {
        async move {
            let probe = self.http.get(format!("{}/api/tags", self.base_url)).send();
            match tokio::time::timeout(AVAILABILITY_TIMEOUT, probe).await {
                Ok(Ok(resp)) => resp.status().is_success(),
                Ok(Err(e)) => { warn!(error = %e, url = %self.base_url, "LLM endpoint unreachable"); false }
                Err(_) => { warn!(url = %self.base_url, "LLM availability probe timed out"); false }
            }
        }
        .boxed()
    }
}
