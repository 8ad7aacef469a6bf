//! The completion gateway abstraction.

use async_trait::async_trait;

use crate::error::GatewayError;

/// Sampling configuration for a completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl GenerationParams {
    /// Budget used for benchmark problems. Fixed for reproducibility.
    pub const BENCHMARK: Self = Self {
        max_tokens: 4000,
        temperature: 0.1,
    };

    /// Small budget used by connectivity probes.
    pub const PROBE: Self = Self {
        max_tokens: 300,
        temperature: 0.1,
    };
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::BENCHMARK
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Remote model identifier (e.g. "anthropic/claude-sonnet-4.5").
    pub model_id: String,
    /// User prompt, sent verbatim.
    pub prompt: String,
    pub params: GenerationParams,
}

impl CompletionRequest {
    pub fn new(
        model_id: impl Into<String>,
        prompt: impl Into<String>,
        params: GenerationParams,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            prompt: prompt.into(),
            params,
        }
    }
}

/// Generated text and total token usage of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub text: String,
    pub token_count: u64,
}

/// A remote service that turns prompts into completions.
///
/// Implementations perform exactly one attempt per call; retries and pacing
/// are the caller's concern.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResult, GatewayError>;
}
