use crate::{
    context::QueryContext,
    errors::ServiceError,
    score::Score,
    types::{ServiceRequest, ServiceResponse},
};
use icon_bus::{reply, Broker, Consumer, Message};
use icon_storage::{AccountStorage, KeyValueStore};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Sits between the bus and the Score: decodes requests, pins them to a
/// block height, and sends back whatever the Score answered.
pub struct IconService {
    score: Arc<dyn Score>,
    storage: AccountStorage<dyn KeyValueStore>,
}

impl IconService {
    pub fn new(score: Arc<dyn Score>, storage: AccountStorage<dyn KeyValueStore>) -> Self {
        Self { score, storage }
    }

    /// Only the latest state is kept, so any other height is refused.
    fn context_for(&self, request: &ServiceRequest) -> Result<QueryContext, ServiceError> {
        let last = self.storage.get_last_block_height()?.unwrap_or_default();

        match request.height() {
            None => Ok(QueryContext::new(last)),
            Some(height) if height == last => Ok(QueryContext::new(height)),
            Some(height) if height > last => Err(ServiceError::InvalidParams(format!(
                "Invalid block height: {height:#x}"
            ))),
            Some(height) => Err(ServiceError::StateUnavailable(height)),
        }
    }

    pub async fn handle(&self, request: ServiceRequest) -> ServiceResponse {
        let ctx = self.context_for(&request)?;

        self.score.query(&ctx, &request).await
    }

    async fn handle_message(&self, message: &Message) -> ServiceResponse {
        match serde_json::from_slice::<ServiceRequest>(&message.payload) {
            Ok(request) => self.handle(request).await,
            Err(e) => Err(ServiceError::InvalidRequest(e.to_string())),
        }
    }

    /// Consumes requests until the queue closes, one task per request.
    pub async fn serve(self: Arc<Self>, mut consumer: Consumer, broker: Broker) {
        info!("serving queue `{}`", consumer.name());

        while let Some(message) = consumer.recv().await {
            let service = Arc::clone(&self);
            let broker = broker.clone();

            tokio::spawn(async move {
                let response = service.handle_message(&message).await;
                debug!("request {} -> {:?}", message.correlation_id, response);

                let payload = match serde_json::to_vec(&response) {
                    Ok(payload) => payload,
                    Err(e) => {
                        error!("cannot encode reply {}: {e}", message.correlation_id);
                        return;
                    }
                };

                if let Err(e) = reply(&broker, &message, payload).await {
                    warn!("reply {} not delivered: {e}", message.correlation_id);
                }
            });
        }

        info!("queue `{}` closed", consumer.name());
    }
}
