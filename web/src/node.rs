use icon_bus::{Broker, BusError, RpcClient};
use icon_storage::{AccountStorage, KeyValueStore};
use iconservice::{route_name, IconService, IcxScore, ServiceRequest, ServiceResponse};
use log::info;
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

pub struct NodeConfig {
    pub channel: String,
    pub timeout: Duration,
    pub queue_capacity: usize,
}

/// Front end's handle on the bus, optionally owning the service consuming
/// the route.
pub struct Node {
    route: String,
    timeout: Duration,
    client: RpcClient,
    service: Option<JoinHandle<()>>,
}

impl Node {
    /// Starts the service on `store` and connects the front end to it.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        config: &NodeConfig,
    ) -> Result<Self, BusError> {
        let broker = Broker::new();
        let route = route_name(&config.channel);

        let storage = AccountStorage::new(store);
        let score = Arc::new(IcxScore::new(storage.clone()));
        let service = Arc::new(IconService::new(score, storage));

        let consumer = broker.declare(&route, config.queue_capacity).await?;
        let handle = tokio::spawn(service.serve(consumer, broker.clone()));

        let mut node = Self::connect(broker, config).await?;
        node.service = Some(handle);

        Ok(node)
    }

    /// Connects to a route served elsewhere on `broker`.
    pub async fn connect(broker: Broker, config: &NodeConfig) -> Result<Self, BusError> {
        let route = route_name(&config.channel);
        let client =
            RpcClient::connect(broker, &format!("{route}.reply"), config.queue_capacity).await?;
        info!("front end connected to `{route}`");

        Ok(Self {
            route,
            timeout: config.timeout,
            client,
            service: None,
        })
    }

    pub async fn call(&self, request: &ServiceRequest) -> Result<ServiceResponse, BusError> {
        self.client
            .call_json(&self.route, request, self.timeout)
            .await
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(service) = &self.service {
            service.abort();
        }
    }
}
