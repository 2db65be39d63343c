//! BigQuery remote-function envelopes.
//!
//! Request: `{"calls": [[v1], [v2], ...], "requestId": "..."}`. Only the first
//! argument of each call is used.
//! Success: `{"replies": [r1, r2, ...]}`. Failure: `{"errorMessage": "..."}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Failure;
use crate::{Error, ErrorContext, Result};

/// Reply placed in the slot of a row whose value is not a string.
pub const NOT_A_STRING: &str = "ERROR: INPUT WAS NOT A STRING";

/// Reply placed in the slot of a row whose remote call failed.
pub fn processing_failed(failure: &Failure) -> String {
    format!("ERROR: Processing failed - {}", failure.message)
}

/// Check that a row value can be sent to the model.
///
/// The verdict depends only on the value, never on its position in the batch.
pub fn validate_row(row: &Value) -> std::result::Result<&str, &'static str> {
    match row {
        Value::String(s) => Ok(s),
        _ => Err(NOT_A_STRING),
    }
}

/// Decoded request envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// First argument of every call, in call order.
    pub rows: Vec<Value>,
    /// Opaque id BigQuery attaches to the HTTP call, used for log correlation.
    pub request_id: Option<String>,
}

impl BatchRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let root: Value = serde_json::from_slice(body).map_err(|e| {
            envelope_error(format!("request body is not valid JSON: {}", e), None)
        })?;

        let calls = match root.get("calls") {
            None => {
                return Err(envelope_error(
                    "missing required field 'calls'",
                    Some("calls".into()),
                ))
            }
            Some(Value::Array(calls)) => calls,
            Some(_) => {
                return Err(envelope_error(
                    "'calls' must be an array",
                    Some("calls".into()),
                ))
            }
        };

        let rows = calls
            .iter()
            .enumerate()
            .map(|(i, call)| match call {
                Value::Array(args) if !args.is_empty() => Ok(args[0].clone()),
                Value::Array(_) => Err(envelope_error(
                    "call has no arguments",
                    Some(format!("calls[{}]", i)),
                )),
                _ => Err(envelope_error(
                    "call must be an array of arguments",
                    Some(format!("calls[{}]", i)),
                )),
            })
            .collect::<Result<Vec<_>>>()?;

        let request_id = root
            .get("requestId")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self { rows, request_id })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn envelope_error(msg: impl Into<String>, field: Option<String>) -> Error {
    let mut ctx = ErrorContext::new().with_source("envelope_decoder");
    if let Some(f) = field {
        ctx = ctx.with_field_path(f);
    }
    Error::envelope_with_context(msg, ctx)
}

/// `{"replies": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub replies: Vec<String>,
}

/// `{"errorMessage": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}
