//! Completion gateway for BenchRun
//!
//! This crate sends prompts to a remote completion service and returns the
//! generated text with its token usage. Callers branch on an explicit
//! `Result<CompletionResult, GatewayError>`; `GatewayError::kind()` gives a
//! coarse classification for logging and reporting.
//!
//! # Example
//!
//! ```rust,no_run
//! use benchrun_gateway::{
//!     CompletionGateway, CompletionRequest, GenerationParams, OpenRouterClient,
//! };
//!
//! async fn ask() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = OpenRouterClient::new("sk-or-...")?;
//!     let request = CompletionRequest::new(
//!         "openai/gpt-5-mini",
//!         "What is 5 + 3? Just say the number.",
//!         GenerationParams::PROBE,
//!     );
//!
//!     let result = client.complete(&request).await?;
//!     println!("{} ({} tokens)", result.text, result.token_count);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod gateway;
mod types;

// Re-export main types
pub use client::{OpenRouterClient, DEFAULT_BASE_URL};
pub use error::{ErrorKind, GatewayError};
pub use gateway::{CompletionGateway, CompletionRequest, CompletionResult, GenerationParams};
pub use types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Usage};
