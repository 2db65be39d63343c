//! Bridge configuration
//!
//! Everything here is fixed deployment configuration. A [`BridgeConfig`] is
//! built once at startup (YAML file plus env overrides), validated, and then
//! shared read-only behind an `Arc` by every request.
//!
//! Environment overrides:
//! - `BQ_BRIDGE_CONFIG`: path to a YAML file (optional)
//! - `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`
//! - `BQ_BRIDGE_MODEL`
//! - `BQ_BRIDGE_CONCURRENCY`
//! - `BQ_BRIDGE_ITEM_TIMEOUT_SECS`
//! - `BQ_BRIDGE_HTTP_TIMEOUT_SECS`
//! - `BQ_BRIDGE_PROXY_URL`
//! - `PORT`

mod model;

pub use model::{
    default_safety_settings, GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting,
    ToolsConfig,
};

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Placeholder replaced by the row value when rendering the prompt.
pub const ROW_VALUE_PLACEHOLDER: &str = "{bigquery_row_value}";

const DEFAULT_PROMPT: &str =
    "find the medical device manufacturer for this: {bigquery_row_value}";

/// Top-level immutable configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub project: Option<String>,
    pub location: String,
    pub use_vertex_ai: bool,
    pub model: String,
    pub prompt_template: String,
    pub generation: GenerationConfig,
    pub safety: Vec<SafetySetting>,
    pub tools: ToolsConfig,
    pub dispatch: DispatchConfig,
    pub http: HttpConfig,
    pub server: ServerConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: "global".to_string(),
            use_vertex_ai: true,
            model: "gemini-2.5-flash".to_string(),
            prompt_template: DEFAULT_PROMPT.to_string(),
            generation: GenerationConfig::default(),
            safety: default_safety_settings(),
            tools: ToolsConfig::default(),
            dispatch: DispatchConfig::default(),
            http: HttpConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Batch dispatch knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum number of simultaneously in-flight remote calls per batch.
    pub concurrency_limit: usize,
    /// Optional deadline for a single remote call. `None` waits indefinitely.
    pub item_timeout_secs: Option<u64>,
    pub retry: RetryConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 8,
            item_timeout_secs: None,
            retry: RetryConfig::default(),
        }
    }
}

impl DispatchConfig {
    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_secs.map(Duration::from_secs)
    }
}

/// Retry knobs for transient remote failures. Disabled (`max_retries = 0`) by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            min_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout_secs: u64,
    pub proxy_url: Option<String>,
    /// Override the model endpoint base (mock servers in tests).
    pub base_url: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
            proxy_url: None,
            base_url: None,
        }
    }
}

/// Listening socket of the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl BridgeConfig {
    /// Load from `BQ_BRIDGE_CONFIG` (if set), apply env overrides, and validate.
    pub fn load() -> Result<Self> {
        let mut cfg = match env::var("BQ_BRIDGE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path)?,
            _ => Self::default(),
        };
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = non_empty_env("GOOGLE_CLOUD_PROJECT") {
            self.project = Some(v);
        }
        if let Some(v) = non_empty_env("GOOGLE_CLOUD_LOCATION") {
            self.location = v;
        }
        if let Some(v) = non_empty_env("BQ_BRIDGE_MODEL") {
            self.model = v;
        }
        if let Some(v) = parsed_env::<usize>("BQ_BRIDGE_CONCURRENCY")? {
            self.dispatch.concurrency_limit = v;
        }
        if let Some(v) = parsed_env::<u64>("BQ_BRIDGE_ITEM_TIMEOUT_SECS")? {
            self.dispatch.item_timeout_secs = Some(v);
        }
        if let Some(v) = parsed_env::<u64>("BQ_BRIDGE_HTTP_TIMEOUT_SECS")? {
            self.http.timeout_secs = v;
        }
        if let Some(v) = non_empty_env("BQ_BRIDGE_PROXY_URL") {
            self.http.proxy_url = Some(v);
        }
        if let Some(v) = parsed_env::<u16>("PORT")? {
            self.server.port = v;
        }
        Ok(())
    }

    /// Reject configurations that would fail on every call.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(invalid("model must not be empty", "model"));
        }
        if self.dispatch.concurrency_limit == 0 {
            return Err(invalid(
                "concurrency limit must be at least 1",
                "dispatch.concurrency_limit",
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(invalid(
                "temperature must be within [0, 2]",
                "generation.temperature",
            ));
        }
        if !(0.0..=1.0).contains(&self.generation.top_p) {
            return Err(invalid("top_p must be within [0, 1]", "generation.top_p"));
        }
        if self.generation.max_output_tokens == 0 {
            return Err(invalid(
                "max_output_tokens must be positive",
                "generation.max_output_tokens",
            ));
        }
        if self.dispatch.item_timeout_secs == Some(0) {
            return Err(invalid(
                "item timeout must be positive when set",
                "dispatch.item_timeout_secs",
            ));
        }
        if self.dispatch.retry.min_delay_ms > self.dispatch.retry.max_delay_ms {
            return Err(invalid(
                "min_delay_ms must not exceed max_delay_ms",
                "dispatch.retry",
            ));
        }
        if self.use_vertex_ai
            && self.http.base_url.is_none()
            && self.project.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return Err(invalid(
                "a project is required when calling Vertex AI",
                "project",
            ));
        }
        if !self.prompt_template.contains(ROW_VALUE_PLACEHOLDER) {
            return Err(invalid(
                "prompt template must contain {bigquery_row_value}",
                "prompt_template",
            ));
        }
        Ok(())
    }

    /// Substitute the row value into the prompt template.
    pub fn render_prompt(&self, row_value: &str) -> String {
        self.prompt_template.replace(ROW_VALUE_PLACEHOLDER, row_value)
    }
}

fn invalid(msg: &str, field: &str) -> Error {
    Error::configuration_with_context(
        msg,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config_validator"),
    )
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match non_empty_env(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Error::configuration_with_context(
                format!("cannot parse environment variable {}", key),
                ErrorContext::new()
                    .with_field_path(key)
                    .with_details(raw)
                    .with_source("config_loader"),
            )
        }),
    }
}
