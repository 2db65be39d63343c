//! Resilience primitives for remote calls.

pub mod retry;

pub use retry::RetryPolicy;
