use crate::{BusError, Message};
use log::debug;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Registry of named bounded queues. Cheap to clone; clones share queues.
#[derive(Clone, Default)]
pub struct Broker {
    queues: Arc<RwLock<HashMap<String, mpsc::Sender<Message>>>>,
}

pub struct Consumer {
    name: String,
    rx: mpsc::Receiver<Message>,
}

impl Consumer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `name` and hands back its only consumer. A queue whose
    /// consumer was dropped may be declared again.
    pub async fn declare(&self, name: &str, capacity: usize) -> Result<Consumer, BusError> {
        let mut queues = self.queues.write().await;

        if let Some(existing) = queues.get(name) {
            if !existing.is_closed() {
                return Err(BusError::QueueExists(name.to_string()));
            }
        }

        let (tx, rx) = mpsc::channel(capacity.max(1));
        queues.insert(name.to_string(), tx);
        debug!("declared queue `{name}` (capacity {capacity})");

        Ok(Consumer {
            name: name.to_string(),
            rx,
        })
    }

    pub async fn publish(&self, name: &str, message: Message) -> Result<(), BusError> {
        let sender = self
            .queues
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| BusError::NoSuchQueue(name.to_string()))?;

        sender
            .send(message)
            .await
            .map_err(|_| BusError::QueueClosed(name.to_string()))
    }

    pub async fn delete(&self, name: &str) -> bool {
        self.queues.write().await.remove(name).is_some()
    }
}

#[cfg(test)]
mod test {
    use super::Broker;
    use crate::{BusError, Message};

    fn message(id: u64) -> Message {
        Message {
            correlation_id: id,
            reply_to: None,
            payload: id.to_be_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn publish_in_order() {
        let broker = Broker::new();
        let mut consumer = broker.declare("q", 8).await.unwrap();

        for id in 0..3 {
            broker.publish("q", message(id)).await.unwrap();
        }

        for id in 0..3 {
            assert_eq!(consumer.recv().await, Some(message(id)));
        }
        assert_eq!(consumer.name(), "q");
    }

    #[tokio::test]
    async fn unknown_and_closed_queues() {
        let broker = Broker::new();

        assert!(matches!(
            broker.publish("nowhere", message(0)).await,
            Err(BusError::NoSuchQueue(_))
        ));

        let consumer = broker.declare("q", 1).await.unwrap();
        assert!(matches!(
            broker.declare("q", 1).await,
            Err(BusError::QueueExists(_))
        ));

        drop(consumer);
        assert!(matches!(
            broker.publish("q", message(0)).await,
            Err(BusError::QueueClosed(_))
        ));

        // The dead queue can be taken over.
        let mut consumer = broker.declare("q", 1).await.unwrap();
        broker.publish("q", message(1)).await.unwrap();
        assert_eq!(consumer.recv().await, Some(message(1)));

        assert!(broker.delete("q").await);
        assert!(!broker.delete("q").await);
    }
}
