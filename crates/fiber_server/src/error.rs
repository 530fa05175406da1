//! Error types for server lifecycle management.

use thiserror::Error;

/// Result type alias for lifecycle operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while managing the dev server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("No free port found starting at {start} ({attempts} attempts)")]
    PortExhausted { start: u16, attempts: u16 },

    #[error("Failed to launch dev server: {0}")]
    LaunchFailed(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
