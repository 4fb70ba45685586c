//! Benchmarks for the request dispatch path
//!
//! This benchmark measures:
//! - Guardrail evaluation on clean and rejected input
//! - End-to-end aggregate dispatch through the echo provider
//! - Frame encoding

use ai_gateway::guardrails::{GuardrailEngine, GuardrailsConfig};
use ai_gateway::pipeline::encode_frame;
use ai_gateway::{ChatRequest, Gateway, Message};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tokio_util::sync::CancellationToken;

const CLEAN_INPUT: &str = "Summarise the attached quarterly report in three bullet points, \
    focusing on revenue growth and regional performance.";

fn bench_guardrails(c: &mut Criterion) {
    let mut group = c.benchmark_group("guardrails");
    group.throughput(Throughput::Bytes(CLEAN_INPUT.len() as u64));

    let keyword = GuardrailEngine::default();
    group.bench_function("keyword_clean", |b| {
        b.iter(|| keyword.check_input(black_box(CLEAN_INPUT)).is_ok())
    });

    let config = GuardrailsConfig::builder()
        .add_banned_term("banned")
        .add_pattern(r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b")
        .add_pattern(r"(?:api|secret)[_-]?key")
        .build();
    let staged = match GuardrailEngine::new(&config) {
        Ok(engine) => engine,
        Err(e) => panic!("bench patterns must compile: {e}"),
    };
    group.bench_function("keyword_and_patterns_clean", |b| {
        b.iter(|| staged.check_input(black_box(CLEAN_INPUT)).is_ok())
    });
    group.bench_function("keyword_rejected", |b| {
        b.iter(|| staged.check_input(black_box("this is banned")).is_err())
    });

    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let gateway = rt.block_on(Gateway::builder().build()).unwrap();
    let ctx = CancellationToken::new();

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("aggregate_echo", |b| {
        b.to_async(&rt).iter(|| async {
            let req = ChatRequest::new("echo", vec![Message::user("Hello")]);
            black_box(gateway.chat_request(req, &ctx).await.unwrap())
        })
    });
    group.bench_function("aggregate_echo_raw_body", |b| {
        let body = br#"{"model":"echo","messages":[{"role":"user","content":"Hello"}]}"#;
        b.to_async(&rt)
            .iter(|| async { black_box(gateway.chat(black_box(body), &ctx).await.unwrap()) })
    });
    group.finish();
}

fn bench_framing(c: &mut Criterion) {
    let message = Message::assistant("Echo: ".repeat(32));
    c.bench_function("encode_frame", |b| {
        b.iter(|| encode_frame(black_box(&message)).unwrap())
    });
}

criterion_group!(benches, bench_guardrails, bench_dispatch, bench_framing);
criterion_main!(benches);
