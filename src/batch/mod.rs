//! Concurrent batch dispatch.
//!
//! # Batch Dispatch Module
//!
//! Turns an ordered list of row values into an ordered list of outcomes,
//! running the remote calls concurrently.
//!
//! ## Guarantees
//!
//! - Exactly one [`WorkResult`] per [`WorkItem`], in input order, whatever
//!   order the calls complete in.
//! - At most `concurrency_limit` calls in flight; the rest wait for a slot.
//! - A failing call only affects its own slot. Nothing is cancelled.
//! - The outcome is returned only once every item has finished.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`WorkItem`] | Row index plus the value to send |
//! | [`WorkResult`] | Row index plus its [`Outcome`] |
//! | [`BatchDispatcher`] | Bounded fan-out with optional timeout and retry |
//! | [`BatchOutcome`] | Ordered results and timing of one dispatch |
//!
//! ## Example
//!
//! ```rust,no_run
//! use bq_genai_bridge::batch::{BatchDispatcher, WorkItem};
//! use bq_genai_bridge::caller::RemoteCaller;
//!
//! # async fn run(caller: &dyn RemoteCaller) {
//! let dispatcher = BatchDispatcher::new(8);
//! let items = vec![WorkItem::new(0, "Acme Corp"), WorkItem::new(1, "Globex")];
//! let outcome = dispatcher.dispatch(items, caller).await;
//! assert_eq!(outcome.len(), 2);
//! # }
//! ```

mod executor;
mod item;

pub use executor::{BatchDispatcher, BatchOutcome};
pub use item::{Outcome, WorkItem, WorkResult};
