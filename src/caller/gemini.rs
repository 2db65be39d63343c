use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::RemoteCaller;
use crate::config::BridgeConfig;
use crate::error::Failure;
use crate::gemini::{build_body, chunk_text, decode_sse, strip_line_breaks, ChunkText};
use crate::transport::{Credentials, HttpTransport};
use crate::Result;

/// [`RemoteCaller`] backed by Gemini `streamGenerateContent`.
///
/// The stream is fully buffered; callers only ever see the assembled,
/// single-line answer.
pub struct GeminiCaller {
    config: Arc<BridgeConfig>,
    transport: HttpTransport,
}

impl GeminiCaller {
    pub fn new(config: Arc<BridgeConfig>, credentials: Option<Credentials>) -> Result<Self> {
        let transport = HttpTransport::new(&config, credentials)?;
        Ok(Self { config, transport })
    }

    /// Build with credentials taken from the environment.
    pub fn from_env(config: Arc<BridgeConfig>) -> Result<Self> {
        let credentials = Credentials::from_env(config.use_vertex_ai);
        if credentials.is_none() {
            tracing::warn!(
                vertex = config.use_vertex_ai,
                "no model credentials found in environment; calls will be sent unauthenticated"
            );
        }
        Self::new(config, credentials)
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait]
impl RemoteCaller for GeminiCaller {
    async fn call(&self, value: &str) -> std::result::Result<String, Failure> {
        let request_id = Uuid::new_v4().to_string();
        let prompt = self.config.render_prompt(value);
        let body = build_body(&self.config, &prompt);

        let bytes = self.transport.post_stream(&body, &request_id).await?;
        let mut frames = Box::pin(decode_sse(Box::pin(bytes)));

        let mut answer = String::new();
        let mut chunks = 0usize;
        while let Some(frame) = frames.next().await {
            let frame = frame?;
            chunks += 1;
            if let ChunkText::Text(t) = chunk_text(&frame)? {
                answer.push_str(&t);
            }
        }

        if chunks == 0 {
            return Err(Failure::malformed("empty response stream"));
        }

        debug!(
            request_id = %request_id,
            chunks,
            chars = answer.len(),
            "generation stream complete"
        );
        Ok(strip_line_breaks(&answer))
    }
}
