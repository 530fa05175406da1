//! Generation backends for OpenAI and Anthropic.
//!
//! Both backends implement [`TextGenerator`]; which one a run uses is decided
//! once, at construction, by [`make_generator`] or [`from_env`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LlmError, LlmResult};
use crate::types::{Completion, Message, MessageRole};

const MAX_TOKENS: u32 = 4096;

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    /// Parse a provider name as given on the command line.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-5-mini",
            Self::Anthropic => "claude-sonnet-4.5",
        }
    }

    fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// A text-generation capability.
///
/// Given an ordered conversation, returns generated text and an optional
/// structured tool invocation. Implementations must not retry internally;
/// the caller owns the retry policy.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete a conversation.
    async fn complete(&self, messages: &[Message]) -> LlmResult<Completion>;

    /// The model this generator is configured for.
    fn model(&self) -> &str;
}

/// Create a generator for the given provider.
pub fn make_generator(
    provider: LlmProvider,
    api_key: String,
    model: Option<String>,
) -> Arc<dyn TextGenerator> {
    let model = model.unwrap_or_else(|| provider.default_model().to_string());
    match provider {
        LlmProvider::OpenAi => Arc::new(OpenAiGenerator::new(api_key, model)),
        LlmProvider::Anthropic => Arc::new(AnthropicGenerator::new(api_key, model)),
    }
}

/// Create a generator from environment variables.
///
/// With an explicit provider the matching key variable must be set. Without
/// one, checks in order:
/// 1. OPENAI_API_KEY
/// 2. ANTHROPIC_API_KEY
///
/// `FIBERFORGE_MODEL` overrides the default model unless `model` is given.
pub fn from_env(
    provider: Option<LlmProvider>,
    model: Option<String>,
) -> LlmResult<Arc<dyn TextGenerator>> {
    let model = model.or_else(|| std::env::var("FIBERFORGE_MODEL").ok());

    if let Some(provider) = provider {
        let api_key = std::env::var(provider.api_key_var())
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::NotConfigured)?;
        return Ok(make_generator(provider, api_key, model));
    }

    for provider in [LlmProvider::OpenAi, LlmProvider::Anthropic] {
        if let Ok(api_key) = std::env::var(provider.api_key_var()) {
            if !api_key.is_empty() {
                return Ok(make_generator(provider, api_key, model));
            }
        }
    }

    Err(LlmError::NotConfigured)
}

/// OpenAI chat-completions backend.
pub struct OpenAiGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn complete(&self, messages: &[Message]) -> LlmResult<Completion> {
        let url = "https://api.openai.com/v1/chat/completions";

        let openai_messages: Vec<OpenAIMessage> = messages
            .iter()
            .map(|m| OpenAIMessage {
                role: match m.role {
                    MessageRole::System => "system".to_string(),
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: openai_messages,
            max_completion_tokens: Some(MAX_TOKENS),
        };

        debug!("OpenAI completion request, model={}", self.model);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "OpenAI",
                status: status.as_u16(),
                body,
            });
        }

        let result: OpenAIResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse {
                    provider: "OpenAI",
                    reason: e.to_string(),
                })?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: "OpenAI",
                reason: "empty choices".to_string(),
            })?;

        // Tool arguments arrive as a JSON-encoded string
        let tool_call = choice
            .message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .and_then(|call| serde_json::from_str(&call.function.arguments).ok());

        Ok(Completion {
            text: choice.message.content.unwrap_or_default(),
            tool_call,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Anthropic messages backend.
pub struct AnthropicGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn complete(&self, messages: &[Message]) -> LlmResult<Completion> {
        let url = "https://api.anthropic.com/v1/messages";

        // Anthropic requires the system message to be separate
        let system_message = messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.clone());

        let anthropic_messages: Vec<AnthropicMessage> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| AnthropicMessage {
                role: match m.role {
                    MessageRole::User | MessageRole::System => "user".to_string(),
                    MessageRole::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system_message,
            messages: anthropic_messages,
        };

        debug!("Anthropic completion request, model={}", self.model);

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "Anthropic",
                status: status.as_u16(),
                body,
            });
        }

        let result: AnthropicResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse {
                    provider: "Anthropic",
                    reason: e.to_string(),
                })?;

        let mut text = None;
        let mut tool_call = None;
        for block in result.content {
            match block.kind.as_str() {
                "tool_use" => tool_call = block.input,
                _ => text = block.text,
            }
        }

        Ok(Completion {
            text: text.ok_or_else(|| LlmError::MalformedResponse {
                provider: "Anthropic",
                reason: "no text block in response".to_string(),
            })?,
            tool_call,
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    function: OpenAIToolFunction,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolFunction {
    arguments: String,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!(LlmProvider::from_str("openai"), Some(LlmProvider::OpenAi));
        assert_eq!(
            LlmProvider::from_str("Anthropic"),
            Some(LlmProvider::Anthropic)
        );
        assert_eq!(LlmProvider::from_str("gemini"), None);
    }

    #[test]
    fn test_default_models() {
        let openai = make_generator(LlmProvider::OpenAi, "key".to_string(), None);
        assert_eq!(openai.model(), "gpt-5-mini");

        let anthropic = make_generator(LlmProvider::Anthropic, "key".to_string(), None);
        assert_eq!(anthropic.model(), "claude-sonnet-4.5");
    }

    #[test]
    fn test_custom_model() {
        let generator = make_generator(
            LlmProvider::OpenAi,
            "key".to_string(),
            Some("gpt-4o".to_string()),
        );
        assert_eq!(generator.model(), "gpt-4o");
    }

    #[test]
    fn test_provider_detection_from_env() {
        // Clear env vars for predictable test
        std::env::remove_var("OPENAI_API_KEY");
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("FIBERFORGE_MODEL");

        // Should fail when no keys are set
        assert!(from_env(None, None).is_err());

        // Explicit provider requires its own key
        std::env::set_var("OPENAI_API_KEY", "test-key");
        assert!(from_env(Some(LlmProvider::Anthropic), None).is_err());

        let generator = from_env(None, None).unwrap();
        assert_eq!(generator.model(), "gpt-5-mini");
        std::env::remove_var("OPENAI_API_KEY");

        std::env::set_var("ANTHROPIC_API_KEY", "test-key");
        let generator = from_env(None, None).unwrap();
        assert_eq!(generator.model(), "claude-sonnet-4.5");
        std::env::remove_var("ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_openai_response_with_tool_call() {
        let raw = r#"{
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{"function": {"arguments": "{\"count\": 3}"}}]
                }
            }]
        }"#;
        let parsed: OpenAIResponse = serde_json::from_str(raw).unwrap();
        let call = parsed.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(call[0].function.arguments, "{\"count\": 3}");
    }

    #[test]
    fn test_anthropic_response_blocks() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "const x = 1;"},
                {"type": "tool_use", "input": {"name": "cube"}}
            ]
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.content[0].text.as_deref(), Some("const x = 1;"));
        assert!(parsed.content[1].input.is_some());
    }
}
