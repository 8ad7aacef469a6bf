//! Error types for the completion gateway.

use std::fmt;

use thiserror::Error;

/// Errors that can occur during a completion call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level HTTP failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request exceeded the client timeout.
    #[error("Request timed out")]
    Timeout,

    /// The service refused the request because of rate limits or quota.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The service answered with an error status or error payload.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No API key was configured.
    #[error("Missing API key")]
    MissingApiKey,
}

/// Coarse classification of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Timeout,
    RateLimited,
    Api,
    Malformed,
    Config,
}

impl GatewayError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(e) if e.is_timeout() => ErrorKind::Timeout,
            Self::Http(e) if e.is_decode() => ErrorKind::Malformed,
            Self::Http(_) => ErrorKind::Transport,
            Self::Timeout => ErrorKind::Timeout,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Api { .. } => ErrorKind::Api,
            Self::MalformedResponse(_) => ErrorKind::Malformed,
            Self::MissingApiKey => ErrorKind::Config,
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Api => "api",
            Self::Malformed => "malformed",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
