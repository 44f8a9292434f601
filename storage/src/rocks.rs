use crate::{BatchOp, KeyValueStore, StorageError, WritableStore};
use log::info;
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;

pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref()).map_err(backend)?;
        info!("opened rocksdb at {}", path.as_ref().display());

        Ok(Self { db })
    }
}

fn backend(e: rocksdb::Error) -> StorageError {
    StorageError::Backend(e.into_string())
}

impl KeyValueStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.db.get(key).map_err(backend)
    }
}

impl WritableStore for RocksStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put(key, value).map_err(backend)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.db.delete(key).map_err(backend)
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> Result<(), StorageError> {
        let mut batch = WriteBatch::default();

        for op in ops {
            match op {
                BatchOp::Put(key, value) => batch.put(key, value),
                BatchOp::Delete(key) => batch.delete(key),
            }
        }

        self.db.write(batch).map_err(backend)
    }
}

#[cfg(test)]
mod test {
    use super::RocksStore;
    use crate::{address, Account, AccountStorage};
    use std::sync::Arc;

    #[test]
    fn reopen_keeps_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let addr = address!("hxe7af5fcfd8dfc67530a01a0e403882687528dfcb");

        {
            let storage = AccountStorage::new(Arc::new(RocksStore::open(dir.path()).unwrap()));
            storage
                .put_batch(&[Account::new(addr, 1_000_000_000_000_000_000)], Some(1))
                .unwrap();
        }

        let storage = AccountStorage::new(Arc::new(RocksStore::open(dir.path()).unwrap()));

        assert_eq!(storage.get_balance(&addr).unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(storage.get_last_block_height().unwrap(), Some(1));
    }
}
