//! Redis pub/sub adapter for the [`Connection`] capability.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use super::{Connection, Message, MessageHandler, QueueError};

/// Message-bus connection backed by Redis pub/sub.
///
/// Request-reply subscribes to a unique reply subject before publishing, so
/// the response cannot race the subscription.
#[derive(Clone)]
pub struct RedisConnection {
    client: redis::Client,
    publisher: ConnectionManager,
}

impl RedisConnection {
    pub async fn connect(url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(url)?;
        let publisher = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, publisher })
    }

    async fn send(&self, msg: &Message) -> Result<(), QueueError> {
        let envelope = serde_json::to_vec(msg)?;
        let mut conn = self.publisher.clone();
        let _: () = conn.publish(msg.subject.as_str(), envelope).await?;
        Ok(())
    }
}

fn decode(raw: &redis::Msg) -> Result<Message, QueueError> {
    Ok(serde_json::from_slice(raw.get_payload_bytes())?)
}

#[async_trait]
impl Connection for RedisConnection {
    async fn publish(&self, msg: Message) -> Result<(), QueueError> {
        self.send(&msg).await
    }

    async fn request(&self, mut msg: Message, timeout: Duration) -> Result<Message, QueueError> {
        let reply_subject = format!("boomer.reply.{}", Uuid::new_v4());
        msg.reply = Some(reply_subject.clone());

        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(reply_subject.as_str()).await?;

        self.send(&msg).await?;

        let mut stream = pubsub.on_message();
        match tokio::time::timeout(timeout, stream.next()).await {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Err(QueueError::Timeout(timeout)),
        }
    }

    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), QueueError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(subject).await?;

        let publisher = self.clone();
        let subject = subject.to_string();
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(raw) = stream.next().await {
                let msg = match decode(&raw) {
                    Ok(msg) => msg,
                    Err(err) => {
                        tracing::warn!(subject = %subject, error = %err, "dropping undecodable message");
                        continue;
                    }
                };

                let reply = msg.reply.clone();
                match handler.handle(msg).await {
                    Ok(Some(payload)) => {
                        if let Some(reply) = reply {
                            if let Err(err) = publisher.send(&Message::new(reply, payload)).await {
                                tracing::warn!(subject = %subject, error = %err, "failed to publish reply");
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        // nak: no reply, the requester times out
                        tracing::warn!(subject = %subject, error = %err, "handler failed");
                    }
                }
            }
        });

        Ok(())
    }
}
