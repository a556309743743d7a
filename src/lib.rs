//! # ReAct Agent
//!
//! A question-answering agent built on the ReAct (Reasoning + Acting) pattern.
//!
//! This library provides:
//! - A reasoning loop that drives a text completion model through
//!   Thought / Action / Observation cycles
//! - A web search tool that scrapes the top search results
//! - An HTTP API for submitting questions
//!
//! ## Architecture
//!
//! 1. Receive a question via the API
//! 2. Build a ReAct prompt listing the available tools
//! 3. Call the model, parse `Thought:` / `Action:` / `Action Input:`
//! 4. Run the named tool and append its observation to the prompt
//! 5. Repeat until the model emits `Final Answer` or the iteration limit is hit
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use react_agent::{agent::{Agent, GenerationParams}, llm::VllmClient, tools::ToolRegistry, Config};
//!
//! let config = Config::from_env()?;
//! let llm = Arc::new(VllmClient::new(&config.llm)?);
//! let tools = Arc::new(ToolRegistry::with_defaults(&config.search));
//! let agent = Agent::new(llm, tools);
//! let result = agent.run("What is the weather in Paris?", &GenerationParams::default()).await;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
