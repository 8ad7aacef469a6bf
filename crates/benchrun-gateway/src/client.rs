//! HTTP client for OpenRouter's OpenAI-compatible API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::{CompletionGateway, CompletionRequest, CompletionResult};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ErrorEnvelope};

/// Default OpenRouter API root.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_REFERER: &str = "http://localhost:3000";
const DEFAULT_TITLE: &str = "BenchRun-Baseline";

/// Completion gateway backed by an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    inner: reqwest::Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    /// Create a client for the default OpenRouter endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_timeout(api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GatewayError::MissingApiKey);
        }

        let inner = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        })
    }

    /// Point the client at another OpenAI-compatible API root.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the application title reported to the service.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionGateway for OpenRouterClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResult, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: request.model_id.clone(),
            messages: vec![ChatMessage::user(request.prompt.as_str())],
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
        };

        debug!(
            url = %url,
            model = %request.model_id,
            prompt_len = request.prompt.len(),
            "POST chat completion"
        );

        let response = self
            .inner
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;

        interpret_response(status, &text)
    }
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Http(err)
    }
}

/// Turn an HTTP status and body into a completion or a classified error.
fn interpret_response(status: StatusCode, body: &str) -> Result<CompletionResult, GatewayError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.trim().to_string());

        warn!(status = status.as_u16(), message = %message, "Completion request rejected");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::RateLimited(message));
        }
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    if let Some(error) = parsed.error {
        let code = error
            .code
            .as_ref()
            .and_then(|c| c.as_u64())
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(status.as_u16());
        if code == StatusCode::TOO_MANY_REQUESTS.as_u16() {
            return Err(GatewayError::RateLimited(error.message));
        }
        return Err(GatewayError::Api {
            status: code,
            message: error.message,
        });
    }

    let text = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GatewayError::MalformedResponse("response has no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| GatewayError::MalformedResponse("choice has no content".to_string()))?;

    let token_count = parsed.usage.map(|u| u.total_tokens).unwrap_or(0);

    Ok(CompletionResult { text, token_count })
}
