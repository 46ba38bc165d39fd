//! Worker round trip over an in-process bus, including trace-context
//! propagation across the asynchronous hop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use boomer_core::observability::{Logger, Propagation};
use boomer_core::queue::{Connection, Message, QueueError, BOOM_SUBJECT};
use boomer_server::grpc::proto::{BoomRequest, BoomResponse};
use boomer_server::worker::Worker;
use common::TestBus;
use opentelemetry::trace::{SpanContext, SpanId, TraceFlags, TraceId, TraceState};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::Context;
use prost::Message as _;

fn remote_context() -> Context {
    let span_context = SpanContext::new(
        TraceId::from_hex("0af7651916cd43dd8448eb211c80319c").unwrap(),
        SpanId::from_hex("b7ad6b7169203331").unwrap(),
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    );
    Context::new().with_remote_span_context(span_context)
}

async fn spawn_worker(bus: &TestBus) {
    Worker::start(
        Arc::new(bus.clone()),
        Propagation::new(),
        Logger::new().with("service_name", "boomer-worker"),
    )
    .await
    .expect("worker subscription failed");
}

#[tokio::test]
async fn worker_replies_boom_to_a_traced_request() {
    let bus = TestBus::default();
    spawn_worker(&bus).await;

    let propagation = Propagation::new();
    let request = BoomRequest {
        name: "old dude".to_string(),
    };
    let mut msg = Message::new(BOOM_SUBJECT, request.encode_to_vec());
    propagation.inject(&remote_context(), &mut msg.headers);
    assert!(msg.headers.first("traceparent").is_some());

    let reply = bus
        .request(msg, Duration::from_secs(1))
        .await
        .expect("round trip failed");

    let resp = BoomResponse::decode(reply.payload.as_slice()).expect("bad reply payload");
    assert_eq!(resp.message, "Boom!");
}

#[tokio::test]
async fn worker_replies_even_without_trace_headers() {
    let bus = TestBus::default();
    spawn_worker(&bus).await;

    let request = BoomRequest {
        name: "anonymous".to_string(),
    };
    let msg = Message::new(BOOM_SUBJECT, request.encode_to_vec());

    let reply = bus
        .request(msg, Duration::from_secs(1))
        .await
        .expect("round trip failed");

    let resp = BoomResponse::decode(reply.payload.as_slice()).expect("bad reply payload");
    assert_eq!(resp.message, "Boom!");
}

#[tokio::test]
async fn request_times_out_without_a_worker() {
    let bus = TestBus::default();

    let err = bus
        .request(
            Message::new(BOOM_SUBJECT, Vec::new()),
            Duration::from_millis(50),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::Timeout(_)));
}

#[tokio::test]
async fn undecodable_payload_gets_no_reply() {
    let bus = TestBus::default();
    spawn_worker(&bus).await;

    // not a valid BoomRequest: invalid wire type
    let msg = Message::new(BOOM_SUBJECT, vec![0xff, 0xff, 0xff]);

    let err = bus
        .request(msg, Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, QueueError::Timeout(_)));
}
