//! Queue worker: consumes boom requests and responds over the bus.

use std::sync::Arc;

use async_trait::async_trait;
use boomer_core::observability::{tracelog, Logger, Propagation};
use boomer_core::queue::{Connection, Message, MessageHandler, QueueError, Reply, BOOM_SUBJECT};
use prost::Message as _;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::grpc::proto::{BoomRequest, BoomResponse};

/// Processes and responds to boom requests from the message queue.
pub struct Worker;

impl Worker {
    /// Subscribe a handler on the boom subject. The subscription runs until
    /// the connection is dropped.
    pub async fn start(
        conn: Arc<dyn Connection>,
        propagation: Propagation,
        logger: Logger,
    ) -> Result<(), QueueError> {
        conn.subscribe(BOOM_SUBJECT, Arc::new(BoomHandler { propagation, logger }))
            .await
    }
}

struct BoomHandler {
    propagation: Propagation,
    logger: Logger,
}

#[async_trait]
impl MessageHandler for BoomHandler {
    async fn handle(&self, msg: Message) -> Result<Reply, QueueError> {
        // The caller's trace continues here: its context rides in the
        // message headers.
        let remote_cx = self.propagation.extract(&msg.headers);
        let cx = tracelog::attach(&remote_cx, Some(self.logger.clone()));

        tracelog::resolve(&cx).info(
            "received request",
            &[
                ("subject", msg.subject.as_str()),
                ("reply", msg.reply.as_deref().unwrap_or("")),
            ],
        );

        let span = tracing::info_span!("handle_boom", subject = %msg.subject);
        span.set_parent(remote_cx);
        let _enter = span.enter();

        let req = match BoomRequest::decode(msg.payload.as_slice()) {
            Ok(req) => req,
            Err(err) => {
                let error = err.to_string();
                tracelog::resolve(&cx).warn("dropping malformed request", &[("error", error.as_str())]);
                return Err(QueueError::Payload(error));
            }
        };
        tracelog::resolve(&cx).debug("booming", &[("name", req.name.as_str())]);

        let resp = BoomResponse {
            message: "Boom!".to_string(),
        };
        Ok(Some(resp.encode_to_vec()))
    }
}
