//! Error types for the text-generation client.

use thiserror::Error;

/// Result type alias for client operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to a text-generation backend.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("No API key configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    NotConfigured,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },
}
