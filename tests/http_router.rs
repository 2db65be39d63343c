//! Remote-function HTTP contract, end to end through the axum router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bq_genai_bridge::handler::ReplyEnvelope;
use bq_genai_bridge::{server, BatchDispatcher, RequestHandler};
use common::{text_chunk, EchoCaller, MockGemini};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(caller: Arc<EchoCaller>, limit: usize) -> axum::Router {
    server::router(Arc::new(RequestHandler::new(
        caller,
        BatchDispatcher::new(limit),
    )))
}

async fn post(app: axum::Router, body: &str) -> (StatusCode, Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn single_row_reply() {
    let (status, body) = post(app(Arc::default(), 4), r#"{"calls": [["Acme Corp"]]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"replies": ["Acme Medical"]}));
}

#[tokio::test]
async fn non_string_row_gets_literal_error() {
    let caller = Arc::new(EchoCaller::default());
    let (status, body) = post(app(caller.clone(), 4), r#"{"calls": [["x"], [42]]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"replies": ["<generated for x>", "ERROR: INPUT WAS NOT A STRING"]})
    );
    assert_eq!(caller.calls(), 1);
}

#[tokio::test]
async fn failed_row_keeps_success_status() {
    let (status, body) = post(app(Arc::default(), 4), r#"{"calls": [["x"], ["y"]]}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"replies": [
            "<generated for x>",
            "ERROR: Processing failed - connection refused"
        ]})
    );
}

#[tokio::test]
async fn malformed_envelopes_get_400() {
    for raw in [r#"{"calls": "not-a-list"}"#, r#"{"other": 1}"#, "garbage"] {
        let (status, body) = post(app(Arc::default(), 4), raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", raw);
        assert!(body["errorMessage"].is_string(), "{}", raw);
        assert!(body.get("replies").is_none());
    }
}

#[tokio::test]
async fn oversized_body_gets_json_error() {
    let caller = Arc::new(EchoCaller::default());
    let row = "a".repeat(11 * 1024 * 1024);
    let request = json!({ "calls": [[row]] }).to_string();

    let (status, body) = post(app(caller.clone(), 4), &request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["errorMessage"].as_str().unwrap();
    assert!(message.contains("length limit"), "{}", message);
    assert!(body.get("replies").is_none());
    assert_eq!(caller.calls(), 0);
}

#[tokio::test]
async fn empty_batch() {
    let caller = Arc::new(EchoCaller::default());
    let (status, body) = post(app(caller.clone(), 4), r#"{"calls": []}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"replies": []}));
    assert_eq!(caller.calls(), 0);
}

#[tokio::test]
async fn large_batch_stays_aligned() {
    let caller = Arc::new(EchoCaller {
        delay: Duration::from_millis(2),
        ..EchoCaller::default()
    });
    let calls: Vec<Value> = (0..40)
        .map(|i| if i % 7 == 0 { json!([i]) } else { json!([format!("r{}", i)]) })
        .collect();
    let request = json!({ "calls": calls }).to_string();

    let (status, body) = post(app(caller.clone(), 5), &request).await;

    assert_eq!(status, StatusCode::OK);
    let ReplyEnvelope { replies } = serde_json::from_value(body).unwrap();
    assert_eq!(replies.len(), 40);
    for (i, r) in replies.iter().enumerate() {
        if i % 7 == 0 {
            assert_eq!(r, "ERROR: INPUT WAS NOT A STRING");
        } else {
            assert_eq!(r, &format!("<generated for r{}>", i));
        }
    }
    assert_eq!(caller.calls(), 34);
}

#[tokio::test]
async fn healthz() {
    let resp = app(Arc::default(), 1)
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_stack_against_mock_gemini() {
    let mut mock = MockGemini::new().await;
    mock.mock_stream("Acme Corp", &[text_chunk("Acme\nMedical")]).await;
    mock.mock_error(
        "Globex",
        503,
        r#"{"error":{"code":503,"message":"The model is overloaded"}}"#,
    )
    .await;

    let handler = RequestHandler::new(Arc::new(mock.caller()), BatchDispatcher::new(2));
    let router = server::router(Arc::new(handler));

    let (status, body) = post(
        router,
        r#"{"requestId":"abc","calls": [["Acme Corp"], [null], ["Globex"]]}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"replies": [
            "AcmeMedical",
            "ERROR: INPUT WAS NOT A STRING",
            "ERROR: Processing failed - HTTP 503: The model is overloaded"
        ]})
    );
}
