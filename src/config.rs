//! Configuration management for the ReAct agent.
//!
//! Configuration can be set via environment variables:
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible completion server (vLLM). Defaults to `http://127.0.0.1:8000/v1`.
//! - `LLM_MODEL` - Optional. Model served by the completion server. Defaults to `Qwen/Qwen3-4B-Instruct-2507`.
//! - `LLM_API_KEY` - Optional. Bearer token for the completion server.
//! - `LLM_TIMEOUT_SECS` - Optional. Per-request completion timeout. Defaults to `120`.
//! - `LLM_MAX_TOKENS` - Optional. Maximum tokens generated per iteration. Defaults to `512`.
//! - `GOOGLE_API_KEY` - Required. Google Custom Search API key.
//! - `GOOGLE_CSE_ID` - Required. Google Custom Search engine id.
//! - `SEARCH_ENDPOINT` - Optional. Defaults to `https://www.googleapis.com/customsearch/v1`.
//! - `SEARCH_MAX_RESULTS` - Optional. Pages scraped per search. Defaults to `3`.
//! - `SEARCH_MAX_PAGE_CHARS` - Optional. Characters kept per scraped page. Defaults to `2000`.
//! - `SEARCH_TIMEOUT_SECS` - Optional. Defaults to `30`.
//! - `PAGE_TIMEOUT_SECS` - Optional. Defaults to `10`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_ITERATIONS_LIMIT` - Optional. Upper bound on `max_iterations` per request. Unset means no bound.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Timeout for a whole `/generate` call. Defaults to `300`.

use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "Qwen/Qwen3-4B-Instruct-2507";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Text completion server configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API (without `/completions`)
    pub base_url: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Optional bearer token
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum tokens generated per completion
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 120,
            max_tokens: 512,
        }
    }
}

/// Web search tool configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Google Custom Search API key
    pub api_key: String,

    /// Custom Search engine id (`cx`)
    pub engine_id: String,

    /// Search API endpoint
    pub endpoint: String,

    /// Number of top results to scrape
    pub max_results: usize,

    /// Characters of extracted text kept per page
    pub max_page_chars: usize,

    /// Timeout for the search request, in seconds
    pub search_timeout_secs: u64,

    /// Timeout for each page fetch, in seconds
    pub page_timeout_secs: u64,
}

impl SearchConfig {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_results: 3,
            max_page_chars: 2000,
            search_timeout_secs: 30,
            page_timeout_secs: 10,
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion server settings
    pub llm: LlmConfig,

    /// Web search settings
    pub search: SearchConfig,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Largest `max_iterations` a request may ask for, if any
    pub max_iterations_limit: Option<usize>,

    /// Timeout for a whole generate call, in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GOOGLE_API_KEY` or `GOOGLE_CSE_ID` is not set,
    /// and `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))?;
        let engine_id = std::env::var("GOOGLE_CSE_ID")
            .map_err(|_| ConfigError::MissingEnvVar("GOOGLE_CSE_ID".to_string()))?;

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            base_url: std::env::var("LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("LLM_MODEL").unwrap_or(defaults.model),
            api_key: std::env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", defaults.timeout_secs)?,
            max_tokens: env_or("LLM_MAX_TOKENS", defaults.max_tokens)?,
        };

        let base = SearchConfig::new(api_key, engine_id);
        let search = SearchConfig {
            endpoint: std::env::var("SEARCH_ENDPOINT").unwrap_or(base.endpoint.clone()),
            max_results: env_or("SEARCH_MAX_RESULTS", base.max_results)?,
            max_page_chars: env_or("SEARCH_MAX_PAGE_CHARS", base.max_page_chars)?,
            search_timeout_secs: env_or("SEARCH_TIMEOUT_SECS", base.search_timeout_secs)?,
            page_timeout_secs: env_or("PAGE_TIMEOUT_SECS", base.page_timeout_secs)?,
            ..base
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env_or("PORT", 3000u16)?;

        let max_iterations_limit = match std::env::var("MAX_ITERATIONS_LIMIT") {
            Ok(raw) => Some(parse_iterations_limit(&raw)?),
            Err(_) => None,
        };

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 300u64)?;

        Ok(Self {
            llm,
            search,
            host,
            port,
            max_iterations_limit,
            request_timeout_secs,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(llm: LlmConfig, search: SearchConfig) -> Self {
        Self {
            llm,
            search,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_iterations_limit: None,
            request_timeout_secs: 300,
        }
    }
}

fn parse_iterations_limit(raw: &str) -> Result<usize, ConfigError> {
    let limit: usize = parse_value("MAX_ITERATIONS_LIMIT", raw)?;
    if limit == 0 {
        return Err(ConfigError::InvalidValue(
            "MAX_ITERATIONS_LIMIT".to_string(),
            "must be at least 1".to_string(),
        ));
    }
    Ok(limit)
}

fn env_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
