//! Shared test helpers: an in-process bus implementing the `Connection`
//! capability, so the worker round trip runs without a broker.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use boomer_core::queue::{Connection, Message, MessageHandler, QueueError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Clone, Default)]
pub struct TestBus {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    topics: Mutex<HashMap<String, UnboundedSender<Message>>>,
}

impl TestBus {
    fn register(&self, subject: &str) -> UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .topics
            .lock()
            .unwrap()
            .insert(subject.to_string(), tx);
        rx
    }

    fn sender_for(&self, subject: &str) -> Option<UnboundedSender<Message>> {
        self.inner.topics.lock().unwrap().get(subject).cloned()
    }
}

#[async_trait]
impl Connection for TestBus {
    async fn publish(&self, msg: Message) -> Result<(), QueueError> {
        // pub/sub semantics: no subscriber means the message is dropped
        if let Some(tx) = self.sender_for(&msg.subject) {
            let _ = tx.send(msg);
        }
        Ok(())
    }

    async fn request(&self, mut msg: Message, timeout: Duration) -> Result<Message, QueueError> {
        let reply_subject = format!("test.reply.{}", uuid::Uuid::new_v4());
        let mut rx = self.register(&reply_subject);
        msg.reply = Some(reply_subject);

        self.publish(msg).await?;

        match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Err(QueueError::Timeout(timeout)),
        }
    }

    async fn subscribe(
        &self,
        subject: &str,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<(), QueueError> {
        let mut rx = self.register(subject);
        let bus = self.clone();

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let reply = msg.reply.clone();
                if let Ok(Some(payload)) = handler.handle(msg).await {
                    if let Some(reply) = reply {
                        let _ = bus.publish(Message::new(reply, payload)).await;
                    }
                }
            }
        });

        Ok(())
    }
}
