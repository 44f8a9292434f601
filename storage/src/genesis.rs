use crate::{
    quantity::u128_from_str, Account, AccountStorage, Address, Balance, StorageError,
    WritableStore,
};
use log::info;
use serde::Deserialize;
use std::{collections::HashSet, fs, path::Path};

#[derive(Deserialize, Debug)]
pub struct GenesisAccount {
    pub address: Address,
    #[serde(deserialize_with = "u128_from_str")]
    pub balance: Balance,
}

#[derive(Deserialize, Debug)]
pub struct Genesis {
    #[serde(default)]
    pub height: u64,
    pub accounts: Vec<GenesisAccount>,
}

impl Genesis {
    pub fn from_json(data: &str) -> Result<Self, StorageError> {
        let genesis: Genesis =
            serde_json::from_str(data).map_err(|e| StorageError::Genesis(e.to_string()))?;

        let mut seen = HashSet::new();
        for account in &genesis.accounts {
            if !seen.insert(account.address) {
                return Err(StorageError::Genesis(format!(
                    "duplicate account `{}`",
                    account.address
                )));
            }
        }

        Ok(genesis)
    }

    /// Writes all accounts and the height in a single batch.
    pub fn apply<S: WritableStore + ?Sized>(
        &self,
        storage: &AccountStorage<S>,
    ) -> Result<(), StorageError> {
        let accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|a| Account::new(a.address, a.balance))
            .collect();

        storage.put_batch(&accounts, Some(self.height))?;
        info!(
            "genesis applied: {} accounts at height {}",
            accounts.len(),
            self.height
        );

        Ok(())
    }
}

pub fn load_genesis<P, S>(path: P, storage: &AccountStorage<S>) -> Result<Genesis, StorageError>
where
    P: AsRef<Path>,
    S: WritableStore + ?Sized,
{
    let data = fs::read_to_string(path.as_ref()).map_err(|e| {
        StorageError::Genesis(format!("{}: {e}", path.as_ref().display()))
    })?;
    let genesis = Genesis::from_json(&data)?;
    genesis.apply(storage)?;

    Ok(genesis)
}
