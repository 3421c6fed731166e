use thiserror::Error;

/// Why a contextual translation could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmUnavailable {
    #[error("LLM call timed out")]
    Timeout,

    #[error("LLM endpoint returned status {0}")]
    Status(u16),

    #[error("LLM transport error: {0}")]
    Transport(String),

    #[error("LLM reply malformed: {0}")]
    Malformed(String),
}
