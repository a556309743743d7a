//! Errors surfaced at the HTTP boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::ErrorResponse;
use crate::agent::ParamsError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or parameters are invalid
    #[error("{0}")]
    InvalidRequest(String),

    /// Anything that escaped the reasoning loop (panic, timeout)
    #[error("Generation failed: {0}")]
    Generation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ParamsError> for ApiError {
    fn from(e: ParamsError) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::InvalidRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
