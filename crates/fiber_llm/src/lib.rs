//! Text-generation client for FiberForge.
//!
//! Wraps a request/response exchange with a text-generation capability.
//! Two backends are supported (OpenAI and Anthropic), selected by
//! configuration at construction time through [`make_generator`].
//!
//! The client deliberately carries no retry logic. Transient failures are
//! surfaced as [`LlmError`] and retried by the pipeline orchestrator, which
//! owns the retry policy for the whole run.

mod client;
mod error;
mod types;

pub use client::{
    from_env, make_generator, AnthropicGenerator, LlmProvider, OpenAiGenerator, TextGenerator,
};
pub use error::{LlmError, LlmResult};
pub use types::{Completion, Message, MessageRole};
