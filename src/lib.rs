//! # bq-genai-bridge
//!
//! BigQuery remote-function bridge to Gemini.
//!
//! ## Overview
//!
//! BigQuery calls a remote function over HTTP with a batch of rows. This
//! crate fans the rows out to the Gemini `streamGenerateContent` API with a
//! bounded number of concurrent calls and answers with one string per row,
//! in the original row order.
//!
//! ## Core Guarantees
//!
//! - **Aligned**: `replies.len() == calls.len()`, reply `i` belongs to call `i`
//! - **Bounded**: never more than `dispatch.concurrency_limit` calls in flight per batch
//! - **Isolated**: a failing row gets an error string; its siblings are untouched
//! - **Atomic**: the reply is sent once the whole batch is done
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bq_genai_bridge::{BatchDispatcher, BridgeConfig, GeminiCaller, RequestHandler};
//!
//! #[tokio::main]
//! async fn main() -> bq_genai_bridge::Result<()> {
//!     let config = Arc::new(BridgeConfig::load()?);
//!     let caller = Arc::new(GeminiCaller::from_env(config.clone())?);
//!     let handler = RequestHandler::new(caller, BatchDispatcher::from_config(&config.dispatch));
//!
//!     let reply = handler.handle(br#"{"calls": [["Acme Corp"]]}"#).await;
//!     println!("{}", reply.to_json());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Immutable deployment configuration |
//! | [`caller`] | The remote generation capability and its Gemini implementation |
//! | [`gemini`] | Gemini request/stream wire format |
//! | [`transport`] | Outbound HTTP client |
//! | [`resilience`] | Retry policy for transient failures |
//! | [`batch`] | Bounded-concurrency, order-preserving dispatch |
//! | [`handler`] | Envelope decoding, validation and reply assembly |
//! | [`server`] | axum router and server loop |

pub mod batch;
pub mod caller;
pub mod config;
pub mod gemini;
pub mod handler;
pub mod resilience;
pub mod server;
pub mod transport;

// Re-export main types for convenience
pub use batch::{BatchDispatcher, BatchOutcome, Outcome, WorkItem, WorkResult};
pub use caller::{GeminiCaller, RemoteCaller};
pub use config::BridgeConfig;
pub use handler::{HandlerResponse, RequestHandler};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, Failure, FailureKind};
