use crate::config::{BridgeConfig, HttpConfig};
use crate::error::Failure;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use futures::Stream;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use url::Url;

/// How outbound calls authenticate.
///
/// Credentials are opaque and fixed for the life of the process. A Vertex
/// access token is never refreshed: once it expires (typically after an
/// hour) every call fails with `HTTP 401` until the process is restarted
/// with a fresh `GOOGLE_ACCESS_TOKEN`.
#[derive(Clone)]
pub enum Credentials {
    /// OAuth access token sent as `Authorization: Bearer` (Vertex AI).
    Bearer(String),
    /// Developer API key sent as `x-goog-api-key`.
    ApiKey(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

impl Credentials {
    /// Pick credentials from the environment for the configured API flavour.
    ///
    /// 1. Vertex AI: `GOOGLE_ACCESS_TOKEN`
    /// 2. Developer API: `GEMINI_API_KEY`, then `GOOGLE_API_KEY`
    pub fn from_env(use_vertex_ai: bool) -> Option<Self> {
        let get = |k: &str| env::var(k).ok().filter(|v| !v.trim().is_empty());
        if use_vertex_ai {
            get("GOOGLE_ACCESS_TOKEN").map(Credentials::Bearer)
        } else {
            get("GEMINI_API_KEY")
                .or_else(|| get("GOOGLE_API_KEY"))
                .map(Credentials::ApiKey)
        }
    }
}

/// Pooled HTTP client bound to one streaming model endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    pub fn new(cfg: &BridgeConfig, credentials: Option<Credentials>) -> Result<Self> {
        let endpoint = crate::gemini::stream_endpoint(cfg)?;
        let client = Self::build_client(&cfg.http)?;
        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    fn build_client(http: &HttpConfig) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs.max(1)))
            .pool_max_idle_per_host(http.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(http.pool_idle_timeout_secs)))
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &http.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy url: {}", e),
                    ErrorContext::new()
                        .with_field_path("http.proxy_url")
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST `body` and return the response byte stream.
    ///
    /// Non-success statuses are turned into a [`Failure`] carrying the status
    /// and the service's error message when one can be extracted.
    pub async fn post_stream(
        &self,
        body: &serde_json::Value,
        request_id: &str,
    ) -> std::result::Result<impl Stream<Item = reqwest::Result<Bytes>>, Failure> {
        let mut req = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .header("accept", "text/event-stream")
            .header("x-bq-bridge-request-id", request_id);

        match &self.credentials {
            Some(Credentials::Bearer(token)) => req = req.bearer_auth(token),
            Some(Credentials::ApiKey(key)) => req = req.header("x-goog-api-key", key),
            None => {}
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Failure::remote(
                status.as_u16(),
                error_message(status.as_u16(), &text),
            ));
        }
        Ok(resp.bytes_stream())
    }
}

/// Best-effort extraction of `error.message` from a Google API error body.
fn error_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            // Error bodies are sometimes wrapped in a one-element array.
            let v = match v {
                serde_json::Value::Array(mut a) if !a.is_empty() => a.swap_remove(0),
                other => other,
            };
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        });
    match from_json {
        Some(msg) => format!("HTTP {}: {}", status, msg),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("HTTP {}: {}", status, body.trim()),
    }
}
