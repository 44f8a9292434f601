use crate::{
    context::QueryContext,
    errors::ServiceError,
    types::{AccountInfo, QueryResult, ServiceRequest},
};
use async_trait::async_trait;
use icon_storage::{AccountStorage, KeyValueStore};
use log::debug;

/// Query engine. Implementations read state and return it as stored.
#[async_trait]
pub trait Score: Send + Sync {
    async fn query(
        &self,
        ctx: &QueryContext,
        request: &ServiceRequest,
    ) -> Result<QueryResult, ServiceError>;
}

/// Native coin queries answered straight from account storage.
pub struct IcxScore {
    storage: AccountStorage<dyn KeyValueStore>,
}

impl IcxScore {
    pub fn new(storage: AccountStorage<dyn KeyValueStore>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Score for IcxScore {
    async fn query(
        &self,
        ctx: &QueryContext,
        request: &ServiceRequest,
    ) -> Result<QueryResult, ServiceError> {
        debug!("query {} at height {}", request.method(), ctx.block_height);

        Ok(match request {
            ServiceRequest::GetBalance(params) => QueryResult::Balance {
                value: self.storage.get_balance(&params.address)?,
            },
            ServiceRequest::GetAccount(params) => {
                let account = self.storage.get_account(&params.address)?;

                QueryResult::Account {
                    account: AccountInfo {
                        address: account.address,
                        balance: account.balance,
                        is_contract: account.address.is_contract(),
                    },
                }
            }
            ServiceRequest::GetLastBlockHeight => QueryResult::BlockHeight {
                height: ctx.block_height,
            },
        })
    }
}

#[cfg(test)]
mod test {
    use super::{IcxScore, Score};
    use crate::{
        types::{AccountInfo, BalanceParams},
        QueryContext, QueryResult, ServiceRequest,
    };
    use icon_storage::{address, Account, AccountStorage, KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn score_with(accounts: &[Account]) -> IcxScore {
        let store = Arc::new(MemoryStore::new());
        AccountStorage::new(Arc::clone(&store))
            .put_batch(accounts, Some(5))
            .unwrap();

        let view: Arc<dyn KeyValueStore> = store;
        IcxScore::new(AccountStorage::new(view))
    }

    #[tokio::test]
    async fn balance_is_returned_unchanged() {
        let addr = address!("hxe7af5fcfd8dfc67530a01a0e403882687528dfcb");
        let score = score_with(&[Account::new(addr, 1_000_000_000_000_000_000)]);
        let ctx = QueryContext::new(5);

        let request = ServiceRequest::GetBalance(BalanceParams {
            address: addr,
            height: None,
        });

        assert_eq!(
            score.query(&ctx, &request).await.unwrap(),
            QueryResult::Balance {
                value: 1_000_000_000_000_000_000
            }
        );

        let unknown = ServiceRequest::GetBalance(BalanceParams {
            address: address!("hx0000000000000000000000000000000000000009"),
            height: None,
        });

        assert_eq!(
            score.query(&ctx, &unknown).await.unwrap(),
            QueryResult::Balance { value: 0 }
        );
    }

    #[tokio::test]
    async fn account_and_height() {
        let contract = address!("cx0000000000000000000000000000000000000001");
        let score = score_with(&[Account::new(contract, 3)]);
        let ctx = QueryContext::new(5);

        assert_eq!(
            score
                .query(
                    &ctx,
                    &ServiceRequest::GetAccount(BalanceParams {
                        address: contract,
                        height: None,
                    })
                )
                .await
                .unwrap(),
            QueryResult::Account {
                account: AccountInfo {
                    address: contract,
                    balance: 3,
                    is_contract: true,
                }
            }
        );
        assert_eq!(
            score
                .query(&ctx, &ServiceRequest::GetLastBlockHeight)
                .await
                .unwrap(),
            QueryResult::BlockHeight { height: 5 }
        );
    }
}
