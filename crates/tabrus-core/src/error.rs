use thiserror::Error;

/// Failures that reach the caller of the engine.
///
/// Unknown words, LLM outages and empty retrieval are not listed here: they
/// degrade into a valid response instead of an error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
