use crate::errors::ServiceError;
use icon_storage::{
    quantity::{u128_from_str, u128_to_hex},
    Address, Balance,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Method {
    GetBalance,
    GetAccount,
    GetLastBlockHeight,
}

lazy_static::lazy_static! {
    static ref METHODS: HashMap<&'static str, Method> = {
        let mut h = HashMap::new();

        h.insert("icx_getBalance", Method::GetBalance);
        h.insert("icx_getAccount", Method::GetAccount);
        h.insert("icx_getLastBlockHeight", Method::GetLastBlockHeight);

        h
    };
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::GetBalance => "icx_getBalance",
            Method::GetAccount => "icx_getAccount",
            Method::GetLastBlockHeight => "icx_getLastBlockHeight",
        }
    }
}

impl FromStr for Method {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        METHODS
            .get(s)
            .copied()
            .ok_or_else(|| ServiceError::MethodNotFound(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct BalanceParams {
    pub address: Address,
    pub height: Option<u64>,
}

/// A decoded query as it travels over the bus.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "method", content = "params")]
pub enum ServiceRequest {
    #[serde(rename = "icx_getBalance")]
    GetBalance(BalanceParams),
    #[serde(rename = "icx_getAccount")]
    GetAccount(BalanceParams),
    #[serde(rename = "icx_getLastBlockHeight")]
    GetLastBlockHeight,
}

impl ServiceRequest {
    pub fn method(&self) -> Method {
        match self {
            ServiceRequest::GetBalance(_) => Method::GetBalance,
            ServiceRequest::GetAccount(_) => Method::GetAccount,
            ServiceRequest::GetLastBlockHeight => Method::GetLastBlockHeight,
        }
    }

    /// Block the caller asked to read at, if any.
    pub fn height(&self) -> Option<u64> {
        match self {
            ServiceRequest::GetBalance(p) | ServiceRequest::GetAccount(p) => p.height,
            ServiceRequest::GetLastBlockHeight => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub address: Address,
    #[serde(serialize_with = "u128_to_hex", deserialize_with = "u128_from_str")]
    pub balance: Balance,
    pub is_contract: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(tag = "type")]
pub enum QueryResult {
    Balance {
        #[serde(serialize_with = "u128_to_hex", deserialize_with = "u128_from_str")]
        value: Balance,
    },
    Account {
        account: AccountInfo,
    },
    BlockHeight {
        height: u64,
    },
}

pub type ServiceResponse = Result<QueryResult, ServiceError>;
