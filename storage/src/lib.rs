#![deny(clippy::dbg_macro)]

pub mod account;
pub mod address;
pub mod genesis;
pub mod memory;
pub mod quantity;
#[cfg(feature = "rocksdb")]
pub mod rocks;

use thiserror::Error;

pub use account::{Account, AccountStorage};
pub use address::{Address, AddressError, AddressKind};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStore;

pub type Balance = u128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid account record: {0}")]
    Codec(String),
    #[error("Storage lock poisoned")]
    LockPoisoned,
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Genesis error: {0}")]
    Genesis(String),
}

/// Read side of an ordered key-value store. Query paths only ever receive
/// this half.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
}

pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

pub trait WritableStore: KeyValueStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Applies every operation or none of them.
    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError>;
}

#[macro_export]
macro_rules! address {
    ($addr:expr) => {{
        use std::str::FromStr;
        $crate::Address::from_str($addr).expect(&format!("Invalid address {}", $addr))
    }};
}
