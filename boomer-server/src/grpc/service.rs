//! The Boomer gRPC service: receives a unary call, forwards it to the
//! worker over the message bus, and returns the worker's response.

use std::sync::Arc;
use std::time::Duration;

use boomer_core::grpc::request_logger;
use boomer_core::observability::{tracelog, Propagation};
use boomer_core::queue::{Connection, Message, BOOM_SUBJECT};
use prost::Message as _;
use tonic::{Request, Response, Status};
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::proto::boomer_server::Boomer;
use super::proto::{BoomRequest, BoomResponse};

const WORKER_TIMEOUT: Duration = Duration::from_secs(10);

pub struct BoomerGrpcService {
    conn: Arc<dyn Connection>,
    propagation: Propagation,
}

impl BoomerGrpcService {
    pub fn new(conn: Arc<dyn Connection>, propagation: Propagation) -> Self {
        Self { conn, propagation }
    }
}

#[tonic::async_trait]
impl Boomer for BoomerGrpcService {
    async fn boom(
        &self,
        request: Request<BoomRequest>,
    ) -> Result<Response<BoomResponse>, Status> {
        let base_logger = request_logger(&request);
        let parent_cx = self.propagation.extract_metadata(request.metadata());
        let req = request.into_inner();

        let span = tracing::info_span!("boom", boomer.name = %req.name);
        span.set_parent(parent_cx);

        let conn = Arc::clone(&self.conn);
        let propagation = self.propagation.clone();

        async move {
            let cx = tracelog::attach(&tracing::Span::current().context(), base_logger);
            tracelog::resolve(&cx).info("boom", &[("boomer_name", req.name.as_str())]);

            let mut msg = Message::new(BOOM_SUBJECT, req.encode_to_vec());
            propagation.inject(&cx, &mut msg.headers);
            tracing::debug!(headers = %msg.headers, "forwarding request to worker");

            let reply = match conn.request(msg, WORKER_TIMEOUT).await {
                Ok(reply) => reply,
                Err(err) => {
                    let error = err.to_string();
                    tracelog::resolve(&cx)
                        .error("worker round trip failed", &[("error", error.as_str())]);
                    return Err(Status::unavailable(format!(
                        "worker round trip failed: {error}"
                    )));
                }
            };

            let resp = BoomResponse::decode(reply.payload.as_slice())
                .map_err(|err| Status::internal(format!("malformed worker response: {err}")))?;

            metrics::counter!("boomer_boom_total").increment(1);

            tracelog::resolve(&cx).info("boom-child", &[("name", req.name.as_str())]);

            tracing::info!(pid = 1234, origin = "reddit", "tick");
            tracing::info!(pid = 5678, precedes = "gen-x", "tick");

            Ok(Response::new(resp))
        }
        .instrument(span)
        .await
    }
}
