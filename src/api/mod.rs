//! HTTP API for the agent.
//!
//! - `POST /generate` - answer a question with the ReAct loop
//! - `GET /` - service metadata (model, framework, tools, endpoints)
//! - `GET /health` - liveness check

mod error;
mod routes;
pub mod types;

pub use error::ApiError;
pub use routes::{router, serve, AppState};
