//! Gemini `streamGenerateContent` wire format.
//!
//! Differences from chat-completion style APIs that matter here:
//! - Uses `contents` with `parts` instead of `messages`.
//! - `generationConfig` wraps temperature, `topP`, `seed`, `maxOutputTokens`, thinking.
//! - `safetySettings` and `tools` are top-level fields.
//! - Streaming with `alt=sse` emits one full response object per `data:` frame.

mod request;
mod stream;

pub use request::{build_body, stream_endpoint};
pub use stream::{chunk_text, decode_sse, strip_line_breaks, ChunkText};
