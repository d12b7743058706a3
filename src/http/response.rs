//! Error responses.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes and JSON bodies
//! - Keep raw upstream error text out of client-facing bodies
//!
//! ```text
//! GenerationError (any kind)  → 503 {"error": <kind message>, "retry": false}
//! BadRequest                  → 400 {"error": "BadRequest: ..."}
//! everything else             → 500 {"error": "<Type>: <detail>"}
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::prompts::PromptError;
use crate::resilience::GenerationError;

/// Failure of an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("PromptError: {0}")]
    Prompt(#[from] PromptError),

    #[error("ConfigurationError: {0}")]
    Configuration(String),

    #[error("BadRequest: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Generation(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Prompt(_) | ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Generation(e) => json!({ "error": e.user_message(), "retry": false }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::ErrorKind;

    #[test]
    fn test_generation_errors_hide_upstream_text() {
        let err = ApiError::from(GenerationError::new(
            ErrorKind::InvalidCredentials,
            "401 Unauthorized: API key sk-123 rejected",
        ));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Prompt(PromptError::NotFound("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Configuration("Gemini API key missing".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadRequest("bad json".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_display_prefixes_type() {
        let err = ApiError::Prompt(PromptError::MissingValue("who".into()));
        assert_eq!(err.to_string(), "PromptError: missing value for placeholder 'who'");
    }
}
