//! Hugging Face backend against an in-process stub of the inference API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
use medpulse_llm::{HuggingFaceBackend, HuggingFaceSettings, SummaryBackend};
use secrecy::SecretString;
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<AtomicUsize>,
    /// Number of leading calls answered with "model loading".
    loading_calls: usize,
    /// Status for every non-loading call.
    status: u16,
    inputs: Arc<Mutex<Vec<String>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn handle(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let n = stub.calls.fetch_add(1, Ordering::SeqCst);
    stub.inputs.lock().unwrap().push(body["inputs"].as_str().unwrap_or("").to_string());
    if let Some(v) = headers.get("authorization") {
        stub.auth.lock().unwrap().push(v.to_str().unwrap_or("").to_string());
    }

    if n < stub.loading_calls {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Model test-model is currently loading", "estimated_time": 20.0})),
        );
    }
    let status = StatusCode::from_u16(stub.status).unwrap();
    if status.is_success() {
        (status, Json(json!([{"summary_text": format!("summary{n}")}])))
    } else {
        (status, Json(json!({"error": "internal failure"})))
    }
}

async fn spawn_stub(stub: Stub) -> String {
    let app = Router::new().fallback(handle).with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/models")
}

fn backend(base_url: String) -> HuggingFaceBackend {
    let settings = HuggingFaceSettings {
        base_url,
        chunk_size: 100,
        max_input_chars: 200,
        retry_delay: Duration::from_millis(20),
        ..Default::default()
    };
    HuggingFaceBackend::new("test-model", Some(SecretString::from("hf_test".to_string())), &settings).unwrap()
}

#[tokio::test]
async fn test_loading_once_then_success_retries_once() {
    let stub = Stub { loading_calls: 1, status: 200, ..Default::default() };
    let calls = stub.calls.clone();
    let b = backend(spawn_stub(stub.clone()).await);

    let out = b.summarize("Title: short paper").await;

    assert_eq!(out, "summary1");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(stub.auth.lock().unwrap()[0], "Bearer hf_test");
}

#[tokio::test]
async fn test_loading_twice_gives_error_after_single_retry() {
    let stub = Stub { loading_calls: 5, status: 200, ..Default::default() };
    let calls = stub.calls.clone();
    let b = backend(spawn_stub(stub).await);

    let out = b.summarize("Title: short paper").await;

    assert!(out.starts_with("Error: Model is currently loading"), "{out}");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let stub = Stub { status: 500, ..Default::default() };
    let calls = stub.calls.clone();
    let b = backend(spawn_stub(stub).await);

    let out = b.summarize("Title: short paper").await;

    assert!(out.starts_with("Error: API error [500]"), "{out}");
    assert!(out.contains("| Response: "), "{out}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_long_input_is_chunked_and_joined() {
    let stub = Stub { status: 200, ..Default::default() };
    let calls = stub.calls.clone();
    let inputs = stub.inputs.clone();
    let b = backend(spawn_stub(stub).await);

    let text = "lorem ipsum dolor sit amet ".repeat(20); // 540 chars, 100 words
    let out = b.summarize(&text).await;

    let n = calls.load(Ordering::SeqCst);
    assert!(n > 1, "expected several chunk calls, got {n}");
    let expected: Vec<String> = (0..n).map(|i| format!("summary{i}")).collect();
    assert_eq!(out, expected.join(" "));

    let sent = inputs.lock().unwrap();
    let rejoined: Vec<&str> = sent.iter().flat_map(|s| s.split_whitespace()).collect();
    let original: Vec<&str> = text.split_whitespace().collect();
    assert_eq!(rejoined, original);
    assert!(sent.iter().all(|s| s.chars().count() < 100));
}

#[tokio::test]
async fn test_unreachable_endpoint_yields_error_string() {
    // Port 9 (discard) is never served by the test host.
    let b = backend("http://127.0.0.1:9/models".to_string());
    let out = b.summarize("Title: x").await;
    assert!(out.starts_with("Error: HTTP error"), "{out}");
}
