//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bq_genai_bridge::config::BridgeConfig;
use bq_genai_bridge::transport::Credentials;
use bq_genai_bridge::{Failure, GeminiCaller, RemoteCaller};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const API_KEY: &str = "test-key";

pub const STREAM_PATH: &str = r"^/models/gemini-2\.5-flash:streamGenerateContent";

/// Mock Gemini endpoint.
pub struct MockGemini {
    pub server: ServerGuard,
}

impl MockGemini {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    /// Developer-API config pointed at the mock server.
    pub fn config(&self) -> BridgeConfig {
        let mut cfg = BridgeConfig {
            use_vertex_ai: false,
            ..BridgeConfig::default()
        };
        cfg.http.base_url = Some(self.server.url());
        cfg.http.timeout_secs = 5;
        cfg
    }

    pub fn caller(&self) -> GeminiCaller {
        GeminiCaller::new(
            Arc::new(self.config()),
            Some(Credentials::ApiKey(API_KEY.to_string())),
        )
        .expect("caller builds")
    }

    /// Stream `chunks` as SSE frames for requests whose body matches `body_pattern`.
    pub async fn mock_stream(&mut self, body_pattern: &str, chunks: &[String]) -> Mock {
        let body: String = chunks
            .iter()
            .map(|c| format!("data: {}\r\n\r\n", c))
            .collect();
        self.server
            .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
            .match_header("x-goog-api-key", API_KEY)
            .match_body(Matcher::Regex(body_pattern.to_string()))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await
    }

    /// Answer requests matching `body_pattern` with an error status and JSON body.
    pub async fn mock_error(&mut self, body_pattern: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", Matcher::Regex(STREAM_PATH.to_string()))
            .match_body(Matcher::Regex(body_pattern.to_string()))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

/// One streamed text chunk in Gemini's response shape.
pub fn text_chunk(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

/// In-process caller: `"y"` fails, everything else is echoed after `delay`.
#[derive(Default)]
pub struct EchoCaller {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl EchoCaller {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteCaller for EchoCaller {
    async fn call(&self, value: &str) -> Result<String, Failure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match value {
            "Acme Corp" => Ok("Acme Medical".to_string()),
            "y" => Err(Failure::transport("connection refused")),
            other => Ok(format!("<generated for {}>", other)),
        }
    }
}
