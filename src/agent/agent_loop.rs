//! Core ReAct loop implementation.

use std::sync::Arc;

use crate::llm::{LlmError, SamplingConfig, TextCompletionService};
use crate::tools::{is_final_answer, ToolRegistry};

use super::parser::parse_continuation;
use super::prompt::{append_observation, build_direct_answer_prompt, build_react_prompt};
use super::types::{GenerationParams, LoopResult, Outcome, ReasoningStep};

/// Stop sequence that keeps the model from writing its own observations.
pub const OBSERVATION_STOP: &str = "Observation:";

const TASK_COMPLETED: &str = "Task completed";
const INVALID_ACTION: &str = "Invalid action, attempting to provide answer";
const ITERATION_LIMIT_MESSAGE: &str =
    "I apologize, but I couldn't complete the reasoning process within the iteration limit.";

/// The ReAct agent.
///
/// Holds only shared, read-only collaborators. All per-question state lives
/// inside [`Agent::run`], so one agent can serve concurrent requests.
pub struct Agent {
    llm: Arc<dyn TextCompletionService>,
    tools: Arc<ToolRegistry>,
    max_tokens: u32,
}

impl Agent {
    /// Create a new agent with the given completion service and tools.
    pub fn new(llm: Arc<dyn TextCompletionService>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            llm,
            tools,
            max_tokens: 512,
        }
    }

    /// Set the token budget for each completion.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Answer a question, returning the answer and the reasoning transcript.
    ///
    /// Never fails: generation errors end the run with an error-describing answer.
    pub async fn run(&self, question: &str, params: &GenerationParams) -> LoopResult {
        let sampling = self.sampling(params);
        let mut steps: Vec<ReasoningStep> = Vec::new();
        let mut tool_calls = 0;
        let mut prompt = build_react_prompt(question, &self.tools);

        for iteration in 1..=params.max_iterations {
            tracing::debug!("Agent iteration {}", iteration);

            let output = match self.generate(&prompt, &sampling).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::warn!(iteration, error = %e, "Generation failed");
                    steps.push(ReasoningStep {
                        thought: format!("Error during generation: {}", e),
                        action: Some("Error".to_string()),
                        action_input: None,
                        observation: Some(format!("Generation failed at iteration {}", iteration)),
                    });
                    return LoopResult {
                        final_answer: format!(
                            "Error during reasoning at iteration {}: {}",
                            iteration, e
                        ),
                        reasoning_steps: steps,
                        tool_call_count: tool_calls,
                        outcome: Outcome::GenerationFailed,
                    };
                }
            };

            let parsed = parse_continuation(&output);
            let mut step = ReasoningStep {
                thought: parsed.thought,
                action: non_empty(&parsed.action),
                action_input: non_empty(&parsed.action_input),
                observation: None,
            };

            if is_final_answer(&parsed.action) {
                step.observation = Some(TASK_COMPLETED.to_string());
                steps.push(step);
                tracing::info!(iteration, tool_calls, "Final answer reached");
                return LoopResult {
                    final_answer: parsed.action_input,
                    reasoning_steps: steps,
                    tool_call_count: tool_calls,
                    outcome: Outcome::FinalAnswer,
                };
            }

            if let Some(observation) = self
                .tools
                .execute(&parsed.action, &parsed.action_input)
                .await
            {
                tool_calls += 1;
                tracing::info!(
                    "{} call #{} with input: {}",
                    parsed.action,
                    tool_calls,
                    parsed.action_input
                );
                append_observation(&mut prompt, &output, &observation);
                step.observation = Some(observation);
                steps.push(step);
                continue;
            }

            tracing::warn!(iteration, action = %parsed.action, "Unrecognized action, asking for a direct answer");
            step.observation = Some(INVALID_ACTION.to_string());
            steps.push(step);

            let fallback = build_direct_answer_prompt(question, &self.observations(&steps));
            let (final_answer, outcome) = match self.generate(&fallback, &sampling).await {
                Ok(answer) => (answer, Outcome::Recovered),
                Err(e) => (
                    format!("Error generating final answer: {}", e),
                    Outcome::GenerationFailed,
                ),
            };
            return LoopResult {
                final_answer,
                reasoning_steps: steps,
                tool_call_count: tool_calls,
                outcome,
            };
        }

        tracing::info!(
            max_iterations = params.max_iterations,
            tool_calls,
            "Iteration limit reached"
        );
        LoopResult {
            final_answer: ITERATION_LIMIT_MESSAGE.to_string(),
            reasoning_steps: steps,
            tool_call_count: tool_calls,
            outcome: Outcome::IterationLimit,
        }
    }

    fn sampling(&self, params: &GenerationParams) -> SamplingConfig {
        SamplingConfig {
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: self.max_tokens,
            stop: vec![OBSERVATION_STOP.to_string()],
        }
    }

    /// One prompt in, trimmed text out.
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, LlmError> {
        let completions = self.llm.complete(&[prompt.to_string()], sampling).await?;
        completions
            .into_iter()
            .next()
            .map(|c| c.text.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse("no completion returned".to_string()))
    }

    /// Tool observations gathered so far, used as context for the fallback prompt.
    fn observations<'a>(&self, steps: &'a [ReasoningStep]) -> Vec<&'a str> {
        steps
            .iter()
            .filter(|s| s.action.as_deref().is_some_and(|a| self.tools.contains(a)))
            .filter_map(|s| s.observation.as_deref())
            .collect()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
