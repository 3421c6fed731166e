//! Contextual translation through a remote text-completion model.
//!
//! [`ContextualTranslator`] is the seam the engine calls; [`OllamaClient`]
//! implements it against an Ollama-compatible `/api/generate` endpoint. Every
//! failure is an [`LlmUnavailable`], which callers treat as a degraded path.
mod client;
mod error;
mod prompt;

pub use client::{ContextualTranslator, LlmRequest, OllamaClient};
pub use error::LlmUnavailable;
pub use prompt::{build_prompt, clean_reply, GlossaryLine};
