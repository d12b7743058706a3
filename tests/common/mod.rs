//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use ai_relay::config::RelayConfig;
use ai_relay::http::{AppState, HttpServer};
use ai_relay::lifecycle::Shutdown;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

type Responder = dyn Fn(u32) -> (u16, String) + Send + Sync;

#[derive(Clone)]
struct MockState {
    respond: Arc<Responder>,
    hits: Arc<AtomicU32>,
    prompts: Arc<Mutex<Vec<String>>>,
}

/// A running mock of the generateContent API.
pub struct MockUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// Start a programmable upstream. `respond` receives the zero-based call
/// number and returns status code and JSON body.
pub async fn start_programmable_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(u32) -> (u16, String) + Send + Sync + 'static,
{
    let state = MockState {
        respond: Arc::new(respond),
        hits: Arc::new(AtomicU32::new(0)),
        prompts: Arc::new(Mutex::new(Vec::new())),
    };
    let hits = state.hits.clone();
    let prompts = state.prompts.clone();

    let app = Router::new().fallback(handle).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, hits, prompts }
}

async fn handle(State(state): State<MockState>, body: Bytes) -> Response {
    let call = state.hits.fetch_add(1, Ordering::SeqCst);

    if let Ok(request) = serde_json::from_slice::<Value>(&body) {
        if let Some(text) = request["contents"][0]["parts"][0]["text"].as_str() {
            state.prompts.lock().unwrap().push(text.to_string());
        }
    }

    let (status, body) = (state.respond)(call);
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Successful generateContent body carrying `text`.
pub fn gemini_text(text: &str) -> String {
    json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

/// Error body in the provider's envelope format.
pub fn gemini_error(code: u16, message: &str, status: &str) -> String {
    json!({ "error": { "code": code, "message": message, "status": status } }).to_string()
}

pub const TRACK_TEMPLATE: &str =
    "Build a {track_theme} track for {user_name} (mood: {mood}). Reply as JSON {{\"title\": \"...\"}}.";

/// Directory holding the track template.
pub fn prompt_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("track_prompt.txt"), TRACK_TEMPLATE).unwrap();
    dir
}

/// Relay config pointed at a mock upstream, with short backoff.
pub fn relay_config(upstream: &MockUpstream, prompts: &Path) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream.base_url();
    config.upstream.api_key = Some("test-key".to_string());
    config.upstream.request_timeout_secs = 5;
    config.upstream.system_proxy = false;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 100;
    config.prompts.directory = prompts.to_string_lossy().into_owned();
    config
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(config: RelayConfig) -> (SocketAddr, Shutdown) {
    let state = AppState::from_config(config).unwrap();
    let server = HttpServer::new(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
