//! Text completion service abstraction.
//!
//! The agent only needs raw prompt-in, text-out completions with a literal
//! stop sequence, so the trait mirrors the classic `/completions` contract
//! rather than a chat API.

mod vllm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use vllm::VllmClient;

/// Errors produced by a completion backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion server returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid completion response: {0}")]
    InvalidResponse(String),
}

/// Sampling parameters for one completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    /// Literal substrings that end generation; the stop text is not returned.
    pub stop: Vec<String>,
}

/// A single generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
}

/// Prompt-in, text-out completion backend.
///
/// Implementations return one [`Completion`] per prompt, in prompt order.
#[async_trait]
pub trait TextCompletionService: Send + Sync {
    /// Identifier of the model behind this service.
    fn model_id(&self) -> &str;

    async fn complete(
        &self,
        prompts: &[String],
        config: &SamplingConfig,
    ) -> Result<Vec<Completion>, LlmError>;
}
