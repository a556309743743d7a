//! Agent module - the ReAct reasoning loop.
//!
//! The agent follows a "think, act, observe" pattern:
//! 1. Build a ReAct prompt with the question and available tools
//! 2. Ask the model for a Thought / Action / Action Input block
//! 3. If the action is a tool, run it and append the observation to the prompt
//! 4. Repeat until the model gives a Final Answer or max iterations is reached

mod agent_loop;
mod parser;
mod prompt;
mod types;

pub use agent_loop::{Agent, OBSERVATION_STOP};
pub use parser::{parse_continuation, parse_react_output, ReactOutput};
pub use prompt::{build_direct_answer_prompt, build_react_prompt};
pub use types::{GenerationParams, LoopResult, Outcome, ParamsError, ReasoningStep};
