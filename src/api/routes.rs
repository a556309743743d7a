//! HTTP routes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use super::error::ApiError;
use super::types::{GenerateRequest, GenerateResponse, HealthResponse, InfoResponse};
use crate::agent::{Agent, GenerationParams, LoopResult};
use crate::config::Config;
use crate::llm::VllmClient;
use crate::tools::ToolRegistry;

/// Shared, read-only state for all requests.
pub struct AppState {
    pub agent: Arc<Agent>,

    /// Largest `max_iterations` a request may ask for, if any
    pub max_iterations_limit: Option<usize>,

    /// Timeout for a whole generate call
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
            max_iterations_limit: config.max_iterations_limit,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/generate", post(generate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the agent from configuration and serve until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let llm = Arc::new(VllmClient::new(&config.llm)?);
    let tools = Arc::new(ToolRegistry::with_defaults(&config.search));
    tracing::info!(tools = ?tools.names(), "Registered tools");

    let agent = Agent::new(llm, tools).with_max_tokens(config.llm.max_tokens);
    let state = Arc::new(AppState::new(&config, agent));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// GET / - Service metadata.
async fn root(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    let mut endpoints = BTreeMap::new();
    endpoints.insert(
        "/generate".to_string(),
        "POST - Generate AI responses using ReAct framework".to_string(),
    );
    endpoints.insert("/health".to_string(), "GET - Liveness check".to_string());

    Json(InfoResponse {
        message: "ReAct AI Agent with Web Search Tool is running".to_string(),
        model: state.agent.model_id().to_string(),
        framework: "ReAct (Reasoning + Acting)".to_string(),
        tools: state.agent.tools().names(),
        endpoints,
    })
}

/// GET /health - Liveness check.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /generate - Answer a question with the ReAct loop.
async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(req) = payload?;

    let question = req.prompt.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::InvalidRequest("prompt is required".to_string()));
    }

    let params = req.params();
    params.validate(state.max_iterations_limit)?;

    let request_id = Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        prompt_len = question.len(),
        max_iterations = params.max_iterations,
        temperature = params.temperature,
        top_p = params.top_p,
        "Received generate request"
    );

    let result = run_agent(&state, question, params).await.map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Generate request failed");
        e
    })?;

    tracing::info!(
        request_id = %request_id,
        outcome = ?result.outcome,
        steps = result.reasoning_steps.len(),
        tool_calls = result.tool_call_count,
        "Generate request finished"
    );

    Ok(Json(GenerateResponse::new(req.prompt, result)))
}

/// Aborts the wrapped task when dropped.
///
/// Ties the agent task to the request: a timeout or a client disconnect
/// drops the handler future, and with it every piece of per-invocation state.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run the agent on its own task so panics and timeouts become errors.
async fn run_agent(
    state: &AppState,
    question: String,
    params: GenerationParams,
) -> Result<LoopResult, ApiError> {
    let agent = state.agent.clone();
    let mut task = AbortOnDrop(tokio::spawn(async move {
        agent.run(&question, &params).await
    }));

    match tokio::time::timeout(state.request_timeout, &mut task.0).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) if e.is_panic() => Err(ApiError::Generation(panic_message(e.into_panic()))),
        Ok(Err(e)) => Err(ApiError::Generation(e.to_string())),
        Err(_) => Err(ApiError::Generation(format!(
            "timed out after {} seconds",
            state.request_timeout.as_secs_f64()
        ))),
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm::testing::ScriptedLlm;
    use crate::llm::{Completion, LlmError, SamplingConfig, TextCompletionService};
    use crate::tools::testing::StubTool;

    fn app_limited(
        llm: Arc<dyn TextCompletionService>,
        timeout: Duration,
        max_iterations_limit: Option<usize>,
    ) -> Router {
        let tools = ToolRegistry::new()
            .with(Arc::new(StubTool::ok("WebSearch", "scraped text")))
            .expect("register tool");
        let state = AppState {
            agent: Arc::new(Agent::new(llm, Arc::new(tools))),
            max_iterations_limit,
            request_timeout: timeout,
        };
        router(Arc::new(state))
    }

    fn app_with(llm: Arc<dyn TextCompletionService>, timeout: Duration) -> Router {
        app_limited(llm, timeout, None)
    }

    fn app(replies: Vec<Result<&'static str, &'static str>>) -> Router {
        app_with(Arc::new(ScriptedLlm::new(replies)), Duration::from_secs(5))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_generate(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    struct PanickingLlm;

    #[async_trait]
    impl TextCompletionService for PanickingLlm {
        fn model_id(&self) -> &str {
            "panicking-model"
        }

        async fn complete(
            &self,
            _prompts: &[String],
            _config: &SamplingConfig,
        ) -> Result<Vec<Completion>, LlmError> {
            panic!("model crashed");
        }
    }

    struct StalledLlm;

    #[async_trait]
    impl TextCompletionService for StalledLlm {
        fn model_id(&self) -> &str {
            "stalled-model"
        }

        async fn complete(
            &self,
            _prompts: &[String],
            _config: &SamplingConfig,
        ) -> Result<Vec<Completion>, LlmError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    /// Keeps searching forever, counting every completion it is asked for.
    #[derive(Default)]
    struct SearchingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextCompletionService for SearchingLlm {
        fn model_id(&self) -> &str {
            "searching-model"
        }

        async fn complete(
            &self,
            _prompts: &[String],
            _config: &SamplingConfig,
        ) -> Result<Vec<Completion>, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(vec![Completion {
                text: "Thought: keep looking\nAction: WebSearch\nAction Input: more".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn root_reports_service_metadata() {
        let request = Request::builder().uri("/").body(Body::empty()).expect("request");
        let (status, body) = send(app(vec![]), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "scripted-model");
        assert_eq!(body["framework"], "ReAct (Reasoning + Acting)");
        assert_eq!(body["tools"], json!(["WebSearch"]));
        assert!(body["endpoints"]["/generate"]
            .as_str()
            .is_some_and(|s| s.starts_with("POST")));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");
        let (status, body) = send(app(vec![]), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn generate_returns_answer_and_transcript() {
        let app = app(vec![
            Ok("Thought: look it up\nAction: WebSearch\nAction Input: 2+2"),
            Ok("Thought: trivial\nAction: Final Answer\nAction Input: 4"),
        ]);
        let (status, body) = send(app, post_generate(json!({ "prompt": "What is 2+2?" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompt"], "What is 2+2?");
        assert_eq!(body["final_answer"], "4");
        assert_eq!(body["tool_call_count"], 1);
        assert_eq!(body["outcome"], "final_answer");
        assert_eq!(body["reasoning_steps"][0]["observation"], "scraped text");
        assert_eq!(body["reasoning_steps"][1]["action"], "Final Answer");
    }

    #[tokio::test]
    async fn generation_failure_is_a_result_not_an_error_status() {
        let app = app(vec![Err("engine offline")]);
        let (status, body) = send(app, post_generate(json!({ "question": "hi" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "generation_failed");
        assert!(body["final_answer"]
            .as_str()
            .is_some_and(|s| s.contains("iteration 1")));
    }

    #[tokio::test]
    async fn invalid_parameters_are_rejected() {
        let (status, body) = send(
            app(vec![]),
            post_generate(json!({ "prompt": "hi", "max_iterations": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"]
            .as_str()
            .is_some_and(|s| s.contains("max_iterations")));

        let (status, _) = send(
            app(vec![]),
            post_generate(json!({ "prompt": "hi", "top_p": 1.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = send(app(vec![]), post_generate(json!({ "prompt": "   " }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "prompt is required");
    }

    #[tokio::test]
    async fn large_iteration_counts_are_accepted_by_default() {
        let (status, body) = send(
            app(vec![Ok("Thought: trivial\nAction: Final Answer\nAction Input: 4")]),
            post_generate(json!({ "prompt": "What is 2+2?", "max_iterations": 25 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["final_answer"], "4");
    }

    #[tokio::test]
    async fn configured_iteration_limit_is_enforced() {
        let replies: Vec<Result<&'static str, &'static str>> = Vec::new();
        let app = app_limited(
            Arc::new(ScriptedLlm::new(replies)),
            Duration::from_secs(5),
            Some(10),
        );
        let (status, body) = send(
            app,
            post_generate(json!({ "prompt": "hi", "max_iterations": 11 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"], "max_iterations must be at most 10, got 11");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_as_json() {
        let (status, body) = send(app(vec![]), post_generate(json!({ "max_iterations": 2 }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());
    }

    #[tokio::test]
    async fn panics_become_generic_failures() {
        let app = app_with(Arc::new(PanickingLlm), Duration::from_secs(5));
        let (status, body) = send(app, post_generate(json!({ "prompt": "hi" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Generation failed: model crashed");
    }

    #[tokio::test]
    async fn slow_invocations_time_out() {
        let app = app_with(Arc::new(StalledLlm), Duration::from_millis(50));
        let (status, body) = send(app, post_generate(json!({ "prompt": "hi" }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"]
            .as_str()
            .is_some_and(|s| s.starts_with("Generation failed: timed out")));
    }

    #[tokio::test]
    async fn client_disconnect_stops_the_agent() {
        let llm = Arc::new(SearchingLlm::default());
        let app = app_with(llm.clone(), Duration::from_secs(30));

        let request = post_generate(json!({ "prompt": "hi", "max_iterations": 1000 }));
        let dropped = tokio::time::timeout(Duration::from_millis(10), app.oneshot(request)).await;
        assert!(dropped.is_err());

        let calls_at_disconnect = llm.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(calls_at_disconnect <= 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), calls_at_disconnect);
    }
}
