//! Wire types for the OpenAI-compatible chat completions endpoint.

use serde::{Deserialize, Serialize};

// ============================================================================
// Request Types
// ============================================================================

/// Request body for POST /chat/completions.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Remote model identifier.
    pub model: String,

    /// Conversation so far; the benchmark always sends a single user turn.
    pub messages: Vec<ChatMessage>,

    pub max_tokens: u32,

    pub temperature: f32,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user", "assistant" or "system".
    pub role: String,

    /// Text content. Some providers return `null` for empty replies.
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// Response body of a chat completion.
///
/// OpenRouter may answer with HTTP 200 and an `error` object instead of
/// choices, so both are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub choices: Vec<Choice>,

    #[serde(default)]
    pub usage: Option<Usage>,

    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// One generated alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Error payload, either top-level or wrapped in `{"error": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: String,

    /// Numeric or string code depending on the upstream provider.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

/// Envelope used for non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ApiErrorBody,
}
