use crate::{Broker, BusError, Consumer, CorrelationId, Message};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};
use tokio::{sync::oneshot, task::JoinHandle};

type Waiters = HashMap<CorrelationId, oneshot::Sender<Vec<u8>>>;
type Pending = Arc<Mutex<Waiters>>;

// The map holds no invariant a panicking holder could break.
fn lock(pending: &Pending) -> MutexGuard<'_, Waiters> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unregisters a call however it ends, including when the caller's future is
/// dropped mid-flight.
struct PendingCall<'a> {
    pending: &'a Pending,
    correlation_id: CorrelationId,
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.correlation_id);
    }
}

/// Request/response over the bus. Each client owns the reply queue it was
/// connected with.
pub struct RpcClient {
    broker: Broker,
    reply_queue: String,
    next_id: AtomicU64,
    pending: Pending,
    dispatcher: JoinHandle<()>,
}

impl RpcClient {
    pub async fn connect(
        broker: Broker,
        reply_queue: &str,
        capacity: usize,
    ) -> Result<Self, BusError> {
        let consumer = broker.declare(reply_queue, capacity).await?;
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let dispatcher = tokio::spawn(dispatch_replies(consumer, Arc::clone(&pending)));

        Ok(Self {
            broker,
            reply_queue: reply_queue.to_string(),
            next_id: AtomicU64::new(0),
            pending,
            dispatcher,
        })
    }

    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }

    pub async fn call(
        &self,
        route: &str,
        payload: Vec<u8>,
        timeout: Duration,
    ) -> Result<Vec<u8>, BusError> {
        let correlation_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(correlation_id, tx);
        let _registered = PendingCall {
            pending: &self.pending,
            correlation_id,
        };

        let message = Message {
            correlation_id,
            reply_to: Some(self.reply_queue.clone()),
            payload,
        };

        let exchange = async {
            self.broker.publish(route, message).await?;
            rx.await.map_err(|_| BusError::Disconnected)
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(BusError::Timeout(timeout)),
        }
    }

    pub async fn call_json<Req, Resp>(
        &self,
        route: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp, BusError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;
        let reply = self.call(route, payload, timeout).await?;

        Ok(serde_json::from_slice(&reply)?)
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

async fn dispatch_replies(mut consumer: Consumer, pending: Pending) {
    while let Some(message) = consumer.recv().await {
        let waiter = lock(&pending).remove(&message.correlation_id);

        match waiter {
            Some(tx) => {
                if tx.send(message.payload).is_err() {
                    debug!("caller of {} went away", message.correlation_id);
                }
            }
            None => warn!(
                "dropping reply {} on `{}`: no caller waiting",
                message.correlation_id,
                consumer.name()
            ),
        }
    }
}

/// Answers `request` on its reply queue. Requests published without a
/// reply queue expect no answer.
pub async fn reply(broker: &Broker, request: &Message, payload: Vec<u8>) -> Result<(), BusError> {
    match &request.reply_to {
        Some(reply_to) => {
            broker
                .publish(
                    reply_to,
                    Message {
                        correlation_id: request.correlation_id,
                        reply_to: None,
                        payload,
                    },
                )
                .await
        }
        None => Ok(()),
    }
}
