#![deny(clippy::all)]
#![deny(clippy::dbg_macro)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Error;
use env_logger::{Builder, Env};
use icon_storage::{
    genesis::load_genesis, AccountStorage, KeyValueStore, MemoryStore, WritableStore,
};
use log::{error, info, warn};
use node::{Node, NodeConfig};
use std::{path::PathBuf, sync::Arc, time::Duration};
use structopt::StructOpt;

mod api;
mod node;

const RESTART_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ICON JSON-RPC params",
    about = "Parameters for the ICON JSON-RPC query node."
)]
struct Opt {
    /// Set logging level
    #[structopt(short, long, default_value = "warn")]
    log: String,

    /// Set IP address
    #[structopt(long, short, default_value = "127.0.0.1")]
    ip: String,

    /// Set port number
    #[structopt(long, short, default_value = "9000")]
    port: u16,

    /// Bus channel the service consumes
    #[structopt(long, env = "ICON_CHANNEL", default_value = "icon_dex")]
    channel: String,

    /// Bus round-trip timeout in milliseconds
    #[structopt(long, env = "ICON_RPC_TIMEOUT_MS", default_value = "3000")]
    timeout_ms: u64,

    /// Capacity of each bus queue
    #[structopt(long, env = "ICON_QUEUE_CAPACITY", default_value = "1024")]
    queue_capacity: usize,

    /// Genesis accounts file, applied to an empty store
    #[structopt(long, env = "ICON_GENESIS", parse(from_os_str))]
    genesis: Option<PathBuf>,

    /// RocksDB directory (needs the `rocksdb` feature)
    #[structopt(long, env = "ICON_DB_PATH", parse(from_os_str))]
    db_path: Option<PathBuf>,
}

impl Opt {
    fn node_config(&self) -> NodeConfig {
        NodeConfig {
            channel: self.channel.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            queue_capacity: self.queue_capacity,
        }
    }
}

#[tokio::main]
async fn main() -> ! {
    dotenv::dotenv().ok();

    let opt = Opt::from_args();

    Builder::from_env(Env::default().default_filter_or(&opt.log)).init();

    loop {
        if let Err(e) = try_main(&opt).await {
            error!("{e}");
            tokio::time::sleep(RESTART_DELAY).await;
        } else {
            info!("Exiting gracefully");
            std::process::exit(0);
        }
    }
}

async fn try_main(opt: &Opt) -> Result<(), Error> {
    let store = open_store(opt)?;
    let node = web::Data::new(
        Node::start(store, &opt.node_config())
            .await
            .map_err(Error::msg)?,
    );

    info!("Listening on http://{}:{}", opt.ip, opt.port);

    use api::router::*;

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(node.clone())
            .service(json_rpc)
            .service(health)
    })
    .bind((opt.ip.as_str(), opt.port))
    .map_err(Error::msg)?
    .run()
    .await
    .map_err(Error::msg)
}

#[cfg(feature = "rocksdb")]
fn open_store(opt: &Opt) -> Result<Arc<dyn KeyValueStore>, Error> {
    match &opt.db_path {
        Some(path) => {
            let db = Arc::new(icon_storage::RocksStore::open(path).map_err(Error::msg)?);
            seed(&db, opt.genesis.as_ref())?;

            let db: Arc<dyn KeyValueStore> = db;
            Ok(db)
        }
        None => open_memory(opt),
    }
}

#[cfg(not(feature = "rocksdb"))]
fn open_store(opt: &Opt) -> Result<Arc<dyn KeyValueStore>, Error> {
    if opt.db_path.is_some() {
        warn!("built without the `rocksdb` feature, ignoring --db-path");
    }

    open_memory(opt)
}

fn open_memory(opt: &Opt) -> Result<Arc<dyn KeyValueStore>, Error> {
    let db = Arc::new(MemoryStore::new());
    seed(&db, opt.genesis.as_ref())?;

    let db: Arc<dyn KeyValueStore> = db;
    Ok(db)
}

/// Applies genesis only to a store that has never seen a block.
fn seed<S: WritableStore>(db: &Arc<S>, genesis: Option<&PathBuf>) -> Result<(), Error> {
    let storage = AccountStorage::new(Arc::clone(db));

    match (genesis, storage.get_last_block_height().map_err(Error::msg)?) {
        (Some(path), None) => {
            load_genesis(path, &storage).map_err(Error::msg)?;
        }
        (Some(_), Some(height)) => {
            warn!("store already at height {height}, genesis skipped");
        }
        (None, None) => warn!("no genesis given, every balance reads as zero"),
        (None, Some(height)) => info!("resuming at height {height}"),
    }

    Ok(())
}
