//! Benchmarks for batch dispatch overhead
//!
//! This benchmark measures:
//! - Fan-out and reassembly cost with a zero-latency caller
//! - Envelope decoding and reply assembly through the handler
//! - Gemini SSE frame decoding

use async_trait::async_trait;
use bq_genai_bridge::gemini::{chunk_text, decode_sse};
use bq_genai_bridge::{BatchDispatcher, Failure, RemoteCaller, RequestHandler, WorkItem};
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::StreamExt;
use std::sync::Arc;

struct Immediate;

#[async_trait]
impl RemoteCaller for Immediate {
    async fn call(&self, value: &str) -> Result<String, Failure> {
        Ok(value.len().to_string())
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("dispatch");

    for n in [10usize, 100, 1000] {
        let items: Vec<WorkItem> = (0..n).map(|i| WorkItem::new(i, format!("row {}", i))).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("bounded_8", n), &items, |b, items| {
            let dispatcher = BatchDispatcher::new(8);
            b.to_async(&rt)
                .iter(|| async { black_box(dispatcher.dispatch(items.clone(), &Immediate).await) })
        });
    }

    group.finish();
}

fn bench_handler(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let handler = RequestHandler::new(Arc::new(Immediate), BatchDispatcher::new(8));
    let calls: Vec<serde_json::Value> = (0..500)
        .map(|i| {
            if i % 10 == 0 {
                serde_json::json!([i])
            } else {
                serde_json::json!([format!("company {}", i)])
            }
        })
        .collect();
    let body = serde_json::json!({ "calls": calls }).to_string().into_bytes();

    let mut group = c.benchmark_group("handler");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("handle_500_rows", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(handler.handle(&body).await) })
    });
    group.finish();
}

fn bench_sse(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let frame = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Acme Medical Devices"}]}}]}"#;
    let body: String = (0..50).map(|_| format!("data: {}\r\n\r\n", frame)).collect();

    let mut group = c.benchmark_group("gemini_sse");
    group.throughput(Throughput::Bytes(body.len() as u64));
    group.bench_function("decode_50_frames", |b| {
        b.to_async(&rt).iter(|| async {
            let input = futures::stream::iter(
                body.as_bytes()
                    .chunks(512)
                    .map(|c| Ok::<_, Failure>(Bytes::copy_from_slice(c)))
                    .collect::<Vec<_>>(),
            );
            let mut frames = Box::pin(decode_sse(input));
            let mut out = String::new();
            while let Some(v) = frames.next().await {
                if let Ok(bq_genai_bridge::gemini::ChunkText::Text(t)) = chunk_text(&v.unwrap()) {
                    out.push_str(&t);
                }
            }
            black_box(out)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_handler, bench_sse);
criterion_main!(benches);
