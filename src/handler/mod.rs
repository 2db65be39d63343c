//! Batch request handling.
//!
//! Decodes the envelope, screens every row, hands the string rows to the
//! [`BatchDispatcher`] in one go and stitches the replies back together by
//! row index. Per-row problems become reply strings; only a broken envelope
//! (or an internal fault) turns into an [`ErrorEnvelope`].

mod envelope;

pub use envelope::{
    processing_failed, validate_row, BatchRequest, ErrorEnvelope, ReplyEnvelope, NOT_A_STRING,
};

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::batch::{BatchDispatcher, Outcome, WorkItem};
use crate::caller::RemoteCaller;
use crate::{Error, ErrorContext, Result};

/// Result of handling one HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// One reply per call, in call order.
    Replies(Vec<String>),
    /// Envelope-level failure; no partial replies.
    Error(String),
}

impl HandlerResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, HandlerResponse::Replies(_))
    }

    /// HTTP status for this response: 200 or 400.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerResponse::Replies(_) => 200,
            HandlerResponse::Error(_) => 400,
        }
    }

    /// Wire body as a JSON value: a [`ReplyEnvelope`] or an [`ErrorEnvelope`].
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            HandlerResponse::Replies(replies) => serde_json::json!(ReplyEnvelope {
                replies: replies.clone(),
            }),
            HandlerResponse::Error(msg) => serde_json::json!(ErrorEnvelope {
                error_message: msg.clone(),
            }),
        }
    }
}

pub struct RequestHandler {
    caller: Arc<dyn RemoteCaller>,
    dispatcher: BatchDispatcher,
}

impl RequestHandler {
    pub fn new(caller: Arc<dyn RemoteCaller>, dispatcher: BatchDispatcher) -> Self {
        Self { caller, dispatcher }
    }

    pub fn dispatcher(&self) -> &BatchDispatcher {
        &self.dispatcher
    }

    /// Handle one raw request body. Never fails: errors become [`HandlerResponse::Error`].
    pub async fn handle(&self, body: &[u8]) -> HandlerResponse {
        match AssertUnwindSafe(self.process(body)).catch_unwind().await {
            Ok(Ok(replies)) => HandlerResponse::Replies(replies),
            Ok(Err(e)) => {
                warn!(error = %e, "rejecting batch");
                HandlerResponse::Error(e.to_string())
            }
            Err(_) => {
                warn!("batch processing panicked");
                HandlerResponse::Error("internal error while processing batch".to_string())
            }
        }
    }

    /// Decode, validate, dispatch and assemble. Errors are envelope-level.
    pub async fn process(&self, body: &[u8]) -> Result<Vec<String>> {
        let request = BatchRequest::from_slice(body)?;
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let rows = request.len();

        let span = info_span!("batch", request_id = %request_id, rows);
        self.assemble(request).instrument(span).await
    }

    async fn assemble(&self, request: BatchRequest) -> Result<Vec<String>> {
        let rows = request.len();
        let mut replies: Vec<Option<String>> = vec![None; rows];
        let mut work = Vec::with_capacity(rows);
        for (i, row) in request.rows.iter().enumerate() {
            match validate_row(row) {
                Ok(value) => work.push(WorkItem::new(i, value)),
                Err(literal) => replies[i] = Some(literal.to_string()),
            }
        }

        let outcome = self.dispatcher.dispatch(work, self.caller.as_ref()).await;

        for result in outcome.results {
            let slot = replies.get_mut(result.index).ok_or_else(|| {
                Error::runtime_with_context(
                    "dispatcher returned an unknown row index",
                    ErrorContext::new()
                        .with_details(result.index.to_string())
                        .with_source("reply_assembly"),
                )
            })?;
            *slot = Some(match result.outcome {
                Outcome::Success(text) => text,
                Outcome::Failure(f) => processing_failed(&f),
            });
        }

        replies
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                r.ok_or_else(|| {
                    Error::runtime_with_context(
                        "no reply produced for row",
                        ErrorContext::new()
                            .with_field_path(format!("calls[{}]", i))
                            .with_source("reply_assembly"),
                    )
                })
            })
            .collect()
    }
}
