//! Messaging transport abstraction: the capability set this demo consumes
//! from a message broker, plus the message envelope and its header carrier.

pub mod carrier;
mod redis;

pub use carrier::HeaderBag;
pub use self::redis::RedisConnection;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Subject the boomer worker listens on.
pub const BOOM_SUBJECT: &str = "boomer.req";

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("broker error: {0}")]
    Broker(#[from] ::redis::RedisError),

    #[error("envelope encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("reply subscription closed before a response arrived")]
    Closed,

    #[error("malformed payload: {0}")]
    Payload(String),
}

/// A single in-flight message.
///
/// The header bag lives exactly as long as the message: created at send,
/// consumed at receive, then discarded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(default)]
    pub headers: HeaderBag,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(subject: impl Into<String>, payload: Vec<u8>) -> Self {
        Message {
            subject: subject.into(),
            reply: None,
            headers: HeaderBag::new(),
            payload,
        }
    }
}

/// Reply payload produced by a handler, if any.
pub type Reply = Option<Vec<u8>>;

/// Callback invoked by a subscription for every inbound message.
///
/// Returning `Err` is the negative-acknowledge path: the subscriber logs the
/// failure and sends no reply, leaving the requester to time out.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, msg: Message) -> Result<Reply, QueueError>;
}

/// The capability set consumed from a message broker: publish, request with
/// timeout, subscribe with callback. Implemented by adapters wrapping real
/// clients.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    async fn publish(&self, msg: Message) -> Result<(), QueueError>;

    /// Publish `msg` and wait up to `timeout` for a response on a private
    /// reply subject.
    async fn request(&self, msg: Message, timeout: Duration) -> Result<Message, QueueError>;

    /// Deliver every message published to `subject` to `handler`.
    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), QueueError>;
}
