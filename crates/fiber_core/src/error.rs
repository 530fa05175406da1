//! Error types for the generation pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during plan extraction, scaffolding and generation.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Structure response contains no <answer> block")]
    MissingDelimiters,

    #[error("Structure response is not a valid plan: {0}")]
    PlanParse(#[from] serde_json::Error),

    #[error("No description declared for file: {0}")]
    MissingDescription(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] fiber_llm::LlmError),

    #[error("Starter template not found at {0}")]
    StarterMissing(std::path::PathBuf),

    #[error("Dependency installation failed: {0}")]
    InstallFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
