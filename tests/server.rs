//! HTTP surface tests driven through the router in-process, no sockets.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use futures_util::stream;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chorus::config::Runtime;
use chorus::error::ProviderError;
use chorus::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};
use chorus::orchestrator::Orchestrator;
use chorus::provider::ProviderId;
use chorus::provider::openai::OpenAiProvider;
use chorus::server::router;
use chorus::types::ProviderOutcome;
use chorus::usage::UsageLog;

use common::{StubBehavior, StubProvider};

fn stub_runtime() -> Arc<Runtime> {
    let usage = Arc::new(UsageLog::default());
    let orchestrator = Orchestrator::builder()
        .register(Arc::new(StubProvider::new(
            ProviderId::OpenAi,
            StubBehavior::Reply("hello".to_string()),
        )))
        .usage(usage.clone())
        .build();
    Arc::new(Runtime {
        orchestrator,
        usage,
        openai: None,
    })
}

/// Streaming-only transport replaying a canned SSE feed.
struct SseFeedTransport {
    chunks: Mutex<Vec<Result<Vec<u8>, ProviderError>>>,
}

#[async_trait]
impl HttpTransport for SseFeedTransport {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        Err(ProviderError::transport("feed transport is streaming-only"))
    }

    async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, ProviderError> {
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        Ok(HttpStreamResponse {
            status: 200,
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

/// Runtime whose OpenAI adapter streams the given feed.
fn streaming_runtime(chunks: Vec<Result<Vec<u8>, ProviderError>>) -> Arc<Runtime> {
    let usage = Arc::new(UsageLog::default());
    let transport = Arc::new(SseFeedTransport {
        chunks: Mutex::new(chunks),
    });
    Arc::new(Runtime {
        orchestrator: Orchestrator::builder().usage(usage.clone()).build(),
        usage,
        openai: Some(Arc::new(OpenAiProvider::new(transport, "sk-test"))),
    })
}

fn delta_chunk(text: &str) -> Result<Vec<u8>, ProviderError> {
    Ok(format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{text}\"}}}}]}}\n\n").into_bytes())
}

/// Parses the `data:` payloads out of a raw SSE body, in order.
fn sse_events(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("event payload is JSON"))
        .collect()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ask_rejects_blank_prompt_with_400() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json("/api/ask", json!({"prompt": "   "})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn ask_returns_aggregate_keyed_by_requested_provider() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json(
            "/api/ask",
            json!({"prompt": "hi", "providers": {"openai": true}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["openai"]["ok"], json!(true));
    assert_eq!(body["openai"]["text"], json!("hello"));
    assert!(
        body.get("claude").is_none(),
        "unrequested providers must not appear"
    );
}

#[tokio::test]
async fn ask_without_provider_block_asks_everyone() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json("/api/ask", json!({"prompt": "hi"})))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(body["openai"]["ok"], json!(true));
    // No credentials registered for the other two.
    assert_eq!(body["claude"]["ok"], json!(false));
    assert_eq!(body["gemini"]["ok"], json!(false));
    assert_eq!(body["claude"]["latencyMs"], json!(0));
}

#[tokio::test]
async fn stream_emits_deltas_in_order_then_one_done_event() {
    let runtime = streaming_runtime(vec![
        delta_chunk("Hel"),
        delta_chunk("lo"),
        Ok(b"data: [DONE]\n\n".to_vec()),
    ]);
    let app = router(runtime.clone());

    let response = app
        .oneshot(post_json("/api/stream", json!({"prompt": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/event-stream")
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&body).unwrap());

    assert_eq!(events.len(), 3, "two deltas then done: {events:?}");
    assert_eq!(events[0], json!({"provider": "openai", "delta": "Hel"}));
    assert_eq!(events[1], json!({"provider": "openai", "delta": "lo"}));
    assert_eq!(events[2]["provider"], json!("openai"));
    assert_eq!(events[2]["done"], json!(true));
    assert_eq!(
        events[2]["text"],
        json!("Hello"),
        "done event carries the full concatenated text"
    );
    assert!(events[2]["latencyMs"].is_u64());

    let entries = runtime.usage.snapshot();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].ok, "clean stream counts as a success");
}

#[tokio::test]
async fn stream_fault_emits_single_error_event_and_stops() {
    let runtime = streaming_runtime(vec![
        delta_chunk("par"),
        Err(ProviderError::transport("connection reset")),
    ]);
    let app = router(runtime.clone());

    let response = app
        .oneshot(post_json("/api/stream", json!({"prompt": "hi"})))
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&body).unwrap());

    assert_eq!(events.len(), 2, "one delta then one error: {events:?}");
    assert_eq!(events[0]["delta"], json!("par"));
    assert!(
        events[1]["error"]
            .as_str()
            .unwrap()
            .contains("connection reset"),
        "error event carries the fault: {events:?}"
    );
    assert!(events[1].get("delta").is_none());
    assert!(events[1].get("done").is_none());

    let entries = runtime.usage.snapshot();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].ok, "faulted stream counts as a failure");
}

#[tokio::test]
async fn stream_without_openai_credential_emits_error_event() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json("/api/stream", json!({"prompt": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let events = sse_events(std::str::from_utf8(&body).unwrap());
    assert_eq!(events.len(), 1);
    assert!(events[0]["error"].as_str().unwrap().contains("openai"));
}

#[tokio::test]
async fn stream_rejects_missing_prompt_with_plain_400() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json("/api/stream", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"prompt is required");
}

#[tokio::test]
async fn draw_reports_failure_via_ok_field_not_status() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(post_json("/api/draw", json!({"prompt": "a fox"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("openai"));
}

#[tokio::test]
async fn providers_reflects_registered_credentials() {
    let app = router(stub_runtime());
    let response = app
        .oneshot(Request::get("/api/providers").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({"openai": true, "claude": false, "gemini": false})
    );
}

#[tokio::test]
async fn usage_returns_most_recent_entries_first() {
    let runtime = stub_runtime();
    runtime.usage.record(&ProviderOutcome::success(
        ProviderId::OpenAi,
        "gpt-4o-mini".to_string(),
        "first".to_string(),
        10,
    ));
    runtime.usage.record(&ProviderOutcome::failure(
        ProviderId::Gemini,
        "gemini-2.0-flash".to_string(),
        "nope".to_string(),
        20,
    ));

    let app = router(runtime);
    let response = app
        .oneshot(Request::get("/api/usage").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let body = body_json(response).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["provider"], json!("gemini"));
    assert_eq!(entries[1]["provider"], json!("openai"));
}
