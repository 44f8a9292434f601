use crate::{Address, AddressKind, Balance, BatchOp, KeyValueStore, StorageError, WritableStore};
use log::debug;
use std::sync::Arc;

const RECORD_VERSION: u8 = 0;
const BALANCE_LEN: usize = 32;
const RECORD_LEN: usize = 3 + BALANCE_LEN;
// Address keys are 21 bytes, so this can never collide with an account.
const LAST_BLOCK_HEIGHT_KEY: &[u8] = b"last_block_height";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub balance: Balance,
    pub flags: u8,
}

impl Account {
    pub fn new(address: Address, balance: Balance) -> Self {
        Self {
            address,
            balance,
            flags: 0,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECORD_LEN);
        out.push(RECORD_VERSION);
        out.push(kind_tag(self.address.kind()));
        out.push(self.flags);
        out.extend_from_slice(&[0u8; BALANCE_LEN - 16]);
        out.extend_from_slice(&self.balance.to_be_bytes());
        out
    }

    pub fn from_bytes(address: Address, bytes: &[u8]) -> Result<Self, StorageError> {
        if bytes.len() != RECORD_LEN {
            return Err(StorageError::Codec(format!(
                "expected {RECORD_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != RECORD_VERSION {
            return Err(StorageError::Codec(format!(
                "unknown version {}",
                bytes[0]
            )));
        }
        if bytes[1] != kind_tag(address.kind()) {
            return Err(StorageError::Codec(format!(
                "kind {} does not match {address}",
                bytes[1]
            )));
        }

        let (high, low) = bytes[3..].split_at(BALANCE_LEN - 16);
        if high.iter().any(|b| *b != 0) {
            return Err(StorageError::Codec("balance overflows u128".into()));
        }

        let mut raw = [0u8; 16];
        raw.copy_from_slice(low);

        Ok(Self {
            address,
            balance: Balance::from_be_bytes(raw),
            flags: bytes[2],
        })
    }
}

fn kind_tag(kind: AddressKind) -> u8 {
    match kind {
        AddressKind::Eoa => 0,
        AddressKind::Contract => 1,
    }
}

/// Typed account access on top of a raw key-value store.
pub struct AccountStorage<S: ?Sized> {
    db: Arc<S>,
}

impl<S: ?Sized> Clone for AccountStorage<S> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

impl<S: KeyValueStore + ?Sized> AccountStorage<S> {
    pub fn new(db: Arc<S>) -> Self {
        Self { db }
    }

    /// A missing record is an empty account.
    pub fn get_account(&self, address: &Address) -> Result<Account, StorageError> {
        match self.db.get(&address.to_bytes())? {
            Some(bytes) => Account::from_bytes(*address, &bytes),
            None => {
                debug!("no record for {address}, reading as empty account");
                Ok(Account::new(*address, 0))
            }
        }
    }

    pub fn get_balance(&self, address: &Address) -> Result<Balance, StorageError> {
        self.get_account(address).map(|account| account.balance)
    }

    pub fn get_last_block_height(&self) -> Result<Option<u64>, StorageError> {
        match self.db.get(LAST_BLOCK_HEIGHT_KEY)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| StorageError::Codec("invalid block height".into()))?;

                Ok(Some(u64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }
}

impl<S: WritableStore + ?Sized> AccountStorage<S> {
    pub fn put_account(&self, account: &Account) -> Result<(), StorageError> {
        self.db.put(&account.address.to_bytes(), &account.to_bytes())
    }

    pub fn put_last_block_height(&self, height: u64) -> Result<(), StorageError> {
        self.db.put(LAST_BLOCK_HEIGHT_KEY, &height.to_be_bytes())
    }

    pub fn put_batch(&self, accounts: &[Account], height: Option<u64>) -> Result<(), StorageError> {
        let mut ops: Vec<BatchOp> = accounts
            .iter()
            .map(|a| BatchOp::Put(a.address.to_bytes().to_vec(), a.to_bytes()))
            .collect();

        if let Some(height) = height {
            ops.push(BatchOp::Put(
                LAST_BLOCK_HEIGHT_KEY.to_vec(),
                height.to_be_bytes().to_vec(),
            ));
        }

        self.db.write_batch(ops)
    }
}
