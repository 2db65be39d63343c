//! Streamed response decoding (SSE bytes -> JSON chunks -> text)
//!
//! `streamGenerateContent?alt=sse` answers with `data: {...}` frames separated
//! by a blank line. Each frame is a complete `GenerateContentResponse`.

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde_json::Value;

use crate::error::Failure;

const DELIMITER: &[u8] = b"\n\n";

/// Incrementally split an SSE byte stream into decoded JSON frames.
///
/// Comment lines (`:`) and non-data fields are ignored. A frame whose data
/// is not valid JSON yields a malformed-response failure and ends the stream.
pub fn decode_sse<S, E>(input: S) -> impl Stream<Item = Result<Value, Failure>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<Failure>,
{
    stream::unfold(
        Some((input, Vec::<u8>::new())),
        |state| async move {
            let (mut input, mut buf) = state?;
            loop {
                if let Some(idx) = find(&buf, DELIMITER) {
                    let frame: Vec<u8> = buf.drain(..idx + DELIMITER.len()).collect();
                    match parse_frame(&frame[..idx]) {
                        Ok(Some(v)) => return Some((Ok(v), Some((input, buf)))),
                        Ok(None) => continue,
                        Err(f) => return Some((Err(f), None)),
                    }
                }

                match input.next().await {
                    Some(Ok(bytes)) => {
                        buf.extend_from_slice(&bytes);
                        normalize_newlines(&mut buf);
                    }
                    Some(Err(e)) => return Some((Err(Into::<Failure>::into(e)), None)),
                    None => {
                        // Trailing frame without the final blank line.
                        let rest = std::mem::take(&mut buf);
                        return match parse_frame(&rest) {
                            Ok(Some(v)) => Some((Ok(v), None)),
                            Ok(None) => None,
                            Err(f) => Some((Err(f), None)),
                        };
                    }
                }
            }
        },
    )
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn normalize_newlines(buf: &mut Vec<u8>) {
    if buf.contains(&b'\r') {
        let mut out = Vec::with_capacity(buf.len());
        let mut i = 0;
        while i < buf.len() {
            if buf[i] == b'\r' {
                // A lone '\r' at the end may be the first half of "\r\n"; keep it for now.
                if i + 1 == buf.len() {
                    out.push(b'\r');
                } else if buf[i + 1] != b'\n' {
                    out.push(b'\n');
                }
            } else {
                out.push(buf[i]);
            }
            i += 1;
        }
        *buf = out;
    }
}

fn parse_frame(frame: &[u8]) -> Result<Option<Value>, Failure> {
    let text = std::str::from_utf8(frame)
        .map_err(|e| Failure::malformed(format!("stream frame is not UTF-8: {}", e)))?;

    let mut data = String::new();
    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }

    let payload = data.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    serde_json::from_str(payload)
        .map(Some)
        .map_err(|e| Failure::malformed(format!("cannot decode stream chunk: {}", e)))
}

/// What one decoded chunk contributes to the final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkText {
    /// Text of the first candidate's parts, in order.
    Text(String),
    /// No candidate, content or parts: nothing to append.
    Empty,
}

/// Extract the visible text of a chunk, or the error it carries.
///
/// Thought-summary parts (`"thought": true`) are not part of the answer.
pub fn chunk_text(chunk: &Value) -> Result<ChunkText, Failure> {
    if let Some(err) = chunk.get("error") {
        let status = err
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(500);
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("remote stream reported an error");
        return Err(Failure::remote(status, message));
    }

    let parts = match chunk
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
    {
        Some(p) if !p.is_empty() => p,
        _ => return Ok(ChunkText::Empty),
    };

    let text: String = parts
        .iter()
        .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    Ok(ChunkText::Text(text))
}

/// Remove line breaks so the value fits a single table cell line.
pub fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}
