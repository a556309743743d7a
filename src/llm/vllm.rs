//! Client for vLLM's OpenAI-compatible `/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Completion, LlmError, SamplingConfig, TextCompletionService};
use crate::config::LlmConfig;

/// Completion client for a vLLM server (or any OpenAI-compatible completions API).
pub struct VllmClient {
    client: reqwest::Client,
    completions_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a [String],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    text: String,
}

impl VllmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            completions_url: completions_url(&config.base_url),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TextCompletionService for VllmClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        prompts: &[String],
        config: &SamplingConfig,
    ) -> Result<Vec<Completion>, LlmError> {
        let body = CompletionRequest {
            model: &self.model,
            prompt: prompts,
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            stop: (!config.stop.is_empty()).then_some(config.stop.as_slice()),
        };

        tracing::debug!(
            url = %self.completions_url,
            prompts = prompts.len(),
            max_tokens = config.max_tokens,
            "Requesting completion"
        );

        let mut request = self.client.post(&self.completions_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response.json().await?;
        into_completions(parsed, prompts.len())
    }
}

/// Normalize a base URL into the completions endpoint.
fn completions_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/completions") {
        base.to_string()
    } else {
        format!("{}/completions", base)
    }
}

/// Order choices by prompt index and check one exists per prompt.
fn into_completions(
    mut response: CompletionResponse,
    expected: usize,
) -> Result<Vec<Completion>, LlmError> {
    if response.choices.len() != expected {
        return Err(LlmError::InvalidResponse(format!(
            "expected {} choices, got {}",
            expected,
            response.choices.len()
        )));
    }

    response.choices.sort_by_key(|c| c.index);
    Ok(response
        .choices
        .into_iter()
        .map(|c| Completion { text: c.text })
        .collect())
}
