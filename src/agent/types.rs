//! Reasoning transcript and result types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One Thought/Action/Observation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub thought: String,
    pub action: Option<String>,
    pub action_input: Option<String>,
    pub observation: Option<String>,
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The model produced `Final Answer`
    FinalAnswer,
    /// The model named an unknown action and the fallback prompt answered
    Recovered,
    /// A completion request failed
    GenerationFailed,
    /// `max_iterations` ran out
    IterationLimit,
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize)]
pub struct LoopResult {
    pub final_answer: String,
    pub reasoning_steps: Vec<ReasoningStep>,
    pub tool_call_count: usize,
    pub outcome: Outcome,
}

/// Per-request generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_iterations: usize,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("max_iterations must be at least 1")]
    ZeroIterations,

    #[error("max_iterations must be at most {limit}, got {value}")]
    TooManyIterations { value: usize, limit: usize },

    #[error("temperature must be within [0, 1], got {0}")]
    Temperature(f32),

    #[error("top_p must be within (0, 1], got {0}")]
    TopP(f32),
}

impl GenerationParams {
    /// Check ranges. `limit`, when set, caps `max_iterations`.
    pub fn validate(&self, limit: Option<usize>) -> Result<(), ParamsError> {
        if self.max_iterations == 0 {
            return Err(ParamsError::ZeroIterations);
        }
        if let Some(limit) = limit.filter(|&limit| self.max_iterations > limit) {
            return Err(ParamsError::TooManyIterations {
                value: self.max_iterations,
                limit,
            });
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(ParamsError::Temperature(self.temperature));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(ParamsError::TopP(self.top_p));
        }
        Ok(())
    }
}
