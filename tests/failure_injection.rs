//! Failure injection tests: upstream errors, retries and the circuit breaker.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

use common::{gemini_error, gemini_text};

async fn post_track(client: &reqwest::Client, relay: std::net::SocketAddr) -> (StatusCode, Value) {
    let res = client
        .post(format!("http://{}/generate/track", relay))
        .json(&json!({"context": {"user_name": "Ada"}}))
        .send()
        .await
        .expect("Relay unreachable");
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn test_retry_on_unavailable() {
    let upstream = common::start_programmable_upstream(|call| {
        if call < 2 {
            (503, gemini_error(503, "The model is overloaded.", "UNAVAILABLE"))
        } else {
            (200, gemini_text(r#"{"title": "Deep Work"}"#))
        }
    })
    .await;
    let prompts = common::prompt_dir();
    let (relay, shutdown) =
        common::start_relay(common::relay_config(&upstream, prompts.path())).await;

    let (status, body) = post_track(&common::client(), relay).await;

    assert_eq!(status, StatusCode::OK, "Should eventually succeed after retries");
    assert_eq!(body["parsed"]["title"], "Deep Work");
    assert_eq!(upstream.hits(), 3, "Should have attempted 3 times");

    shutdown.trigger();
}

#[tokio::test]
async fn test_quota_is_not_retried() {
    let upstream = common::start_programmable_upstream(|_| {
        (429, gemini_error(429, "Resource has been exhausted.", "RESOURCE_EXHAUSTED"))
    })
    .await;
    let prompts = common::prompt_dir();
    let (relay, shutdown) =
        common::start_relay(common::relay_config(&upstream, prompts.path())).await;

    let (status, body) = post_track(&common::client(), relay).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"error": "API quota exceeded.", "retry": false}));
    assert_eq!(upstream.hits(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_exhausted_retries_hide_upstream_text() {
    let upstream = common::start_programmable_upstream(|_| {
        (500, gemini_error(500, "secret internal stack trace", "INTERNAL"))
    })
    .await;
    let prompts = common::prompt_dir();
    let (relay, shutdown) =
        common::start_relay(common::relay_config(&upstream, prompts.path())).await;

    let (status, body) = post_track(&common::client(), relay).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "An unexpected error occurred.");
    assert!(!body.to_string().contains("secret"));
    assert_eq!(upstream.hits(), 3);

    shutdown.trigger();
}

#[tokio::test]
async fn test_circuit_opens_after_threshold() {
    let upstream = common::start_programmable_upstream(|_| {
        (401, gemini_error(401, "API key not valid. Please pass a valid API key.", "UNAUTHENTICATED"))
    })
    .await;
    let prompts = common::prompt_dir();
    let mut config = common::relay_config(&upstream, prompts.path());
    config.circuit_breaker.failure_threshold = 2;
    let (relay, shutdown) = common::start_relay(config).await;
    let client = common::client();

    for _ in 0..2 {
        let (status, body) = post_track(&client, relay).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "API key is invalid or expired.");
    }
    assert_eq!(upstream.hits(), 2);

    let (status, body) = post_track(&client, relay).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Service temporarily disabled.");
    assert_eq!(upstream.hits(), 2, "Open circuit must not reach the upstream");

    let status: Value = client
        .get(format!("http://{}/api-status", relay))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["circuit_open"], true);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop a listener to get a port nothing is serving on.
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed_addr = closed.local_addr().unwrap();
    drop(closed);

    let upstream = common::start_programmable_upstream(|_| (200, gemini_text("unused"))).await;
    let prompts = common::prompt_dir();
    let mut config = common::relay_config(&upstream, prompts.path());
    config.upstream.base_url = format!("http://{}", closed_addr);
    config.retries.max_attempts = 2;
    let (relay, shutdown) = common::start_relay(config).await;

    let (status, body) = post_track(&common::client(), relay).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["retry"], false);
    assert_eq!(upstream.hits(), 0);

    shutdown.trigger();
}
