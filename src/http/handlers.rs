//! API handlers.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::parsing::{parse_structured, ParsedResult};
use crate::prompts::{merge_context, TRACK_PROMPT};

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ApiStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub configured: bool,
    pub model: String,
    pub circuit_open: bool,
}

#[derive(Serialize)]
pub struct TrackResponse {
    pub track: String,
    pub parsed: ParsedResult,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

pub async fn api_status(State(state): State<AppState>) -> Json<ApiStatus> {
    let upstream = state.caller.upstream();
    Json(ApiStatus {
        service: "ai_relay",
        version: env!("CARGO_PKG_VERSION"),
        configured: upstream.is_configured(),
        model: upstream.model().to_string(),
        circuit_open: state.caller.breaker().is_open(),
    })
}

/// Generate a personalised track level.
pub async fn generate_track(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TrackResponse>, ApiError> {
    const ENDPOINT: &str = "generate/track";

    let result = generate(&state, ENDPOINT, TRACK_PROMPT, &body).await;
    match &result {
        Ok(_) => metrics::record_request(ENDPOINT, StatusCode::OK.as_u16()),
        Err(e) => {
            tracing::error!(endpoint = ENDPOINT, error = %e, "HANDLED ERROR");
            metrics::record_request(ENDPOINT, e.status().as_u16());
        }
    }
    result.map(Json)
}

async fn generate(
    state: &AppState,
    endpoint: &str,
    template: &str,
    body: &[u8],
) -> Result<TrackResponse, ApiError> {
    let data = decode_body(body)?;
    let context = merge_context(data);
    let prompt = state.prompts.render(template, &context)?;

    if !state.caller.upstream().is_configured() {
        return Err(ApiError::Configuration("Gemini API key missing".to_string()));
    }

    let text = state.caller.generate(&prompt, endpoint).await?;

    let parsed = parse_structured(&text);
    if parsed.is_parse_error() {
        tracing::warn!(endpoint, "Upstream output could not be parsed as JSON");
        metrics::record_parse_fallback();
    }

    Ok(TrackResponse { track: text, parsed })
}

fn decode_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}
