//! Remote generation capability.
//!
//! [`RemoteCaller`] is the only seam between the batch machinery and the
//! model service. Production uses [`GeminiCaller`]; tests plug in their own
//! implementations to script latency and failures.

mod gemini;

pub use gemini::GeminiCaller;

use crate::error::Failure;
use async_trait::async_trait;

/// One blocking-from-the-caller's-view generation call per row value.
///
/// Implementations must not retry on their own and must keep no per-call
/// mutable state, so one instance can serve every concurrent request.
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    async fn call(&self, value: &str) -> Result<String, Failure>;
}
