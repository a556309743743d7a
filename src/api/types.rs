//! API request and response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::{GenerationParams, LoopResult, Outcome, ReasoningStep};

/// Request to answer a question.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// The user's question
    #[serde(alias = "question")]
    pub prompt: String,

    /// Maximum reasoning iterations (default: 5)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Sampling temperature (default: 0.7)
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Top-p sampling parameter (default: 0.9)
    #[serde(default)]
    pub top_p: Option<f32>,
}

fn default_max_iterations() -> usize {
    GenerationParams::default().max_iterations
}

impl GenerateRequest {
    /// Generation parameters with defaults filled in.
    pub fn params(&self) -> GenerationParams {
        let defaults = GenerationParams::default();
        GenerationParams {
            max_iterations: self.max_iterations,
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
        }
    }
}

/// Answer plus the reasoning that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    /// The original question
    pub prompt: String,

    pub final_answer: String,

    pub reasoning_steps: Vec<ReasoningStep>,

    /// Number of tool invocations
    pub tool_call_count: usize,

    /// How the reasoning loop ended
    pub outcome: Outcome,
}

impl GenerateResponse {
    pub fn new(prompt: String, result: LoopResult) -> Self {
        Self {
            prompt,
            final_answer: result.final_answer,
            reasoning_steps: result.reasoning_steps,
            tool_call_count: result.tool_call_count,
            outcome: result.outcome,
        }
    }
}

/// Service metadata returned by `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub message: String,
    pub model: String,
    pub framework: String,
    pub tools: Vec<String>,
    pub endpoints: BTreeMap<String, String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}
