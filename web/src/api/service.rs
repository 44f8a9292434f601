use crate::{
    api::jsonrpc::{JsonRpcResponse, RpcError, RpcReply, JSONRPC_VERSION},
    node::Node,
};
use icon_storage::{quantity, Address};
use iconservice::{types::BalanceParams, Method, QueryResult, ServiceError, ServiceRequest};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

#[derive(Deserialize, Debug)]
struct AddressParams {
    address: String,
    height: Option<String>,
}

/// Handles a raw request body: one request or a batch.
pub async fn handle_body(node: &Node, body: &[u8]) -> RpcReply {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            return RpcReply::Single(JsonRpcResponse::failure(
                Value::Null,
                &RpcError::Parse(e.to_string()),
            ))
        }
    };

    match value {
        Value::Array(items) if items.is_empty() => RpcReply::Single(JsonRpcResponse::failure(
            Value::Null,
            &RpcError::InvalidRequest("empty batch".into()),
        )),
        Value::Array(items) => RpcReply::Batch(
            futures::future::join_all(items.iter().map(|item| handle_single(node, item))).await,
        ),
        single => RpcReply::Single(handle_single(node, &single).await),
    }
}

async fn handle_single(node: &Node, item: &Value) -> JsonRpcResponse {
    let id = match item.get("id") {
        Some(id @ (Value::String(_) | Value::Number(_))) => id.clone(),
        _ => Value::Null,
    };

    let result = match parse_request(item) {
        Ok(request) => dispatch(node, &request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            log::debug!("request {id} failed: {e}");
            JsonRpcResponse::failure(id, &e)
        }
    }
}

pub fn parse_request(item: &Value) -> Result<ServiceRequest, RpcError> {
    let obj = item
        .as_object()
        .ok_or_else(|| RpcError::InvalidRequest("request must be an object".into()))?;

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(RpcError::InvalidRequest("jsonrpc must be \"2.0\"".into()));
    }

    match obj.get("id") {
        Some(Value::String(_) | Value::Number(_) | Value::Null) => {}
        Some(_) => return Err(RpcError::InvalidRequest("invalid id".into())),
        None => return Err(RpcError::InvalidRequest("missing id".into())),
    }

    let method = obj
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::InvalidRequest("method must be a string".into()))?;
    let method = Method::from_str(method)?;

    let params = match obj.get("params") {
        None | Some(Value::Null) => None,
        Some(Value::Object(params)) => Some(params),
        Some(_) => return Err(RpcError::InvalidRequest("params must be an object".into())),
    };

    Ok(match method {
        Method::GetBalance => ServiceRequest::GetBalance(address_params(params)?),
        Method::GetAccount => ServiceRequest::GetAccount(address_params(params)?),
        Method::GetLastBlockHeight => match params {
            Some(p) if !p.is_empty() => {
                return Err(RpcError::InvalidParams(format!("{method} takes no params")))
            }
            _ => ServiceRequest::GetLastBlockHeight,
        },
    })
}

fn address_params(params: Option<&Map<String, Value>>) -> Result<BalanceParams, RpcError> {
    let params = params.ok_or_else(|| RpcError::InvalidParams("missing params".into()))?;
    let raw: AddressParams = serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| RpcError::InvalidParams(e.to_string()))?;

    let address = Address::from_str(&raw.address)
        .map_err(|e| RpcError::InvalidParams(e.to_string()))?;
    let height = match raw.height {
        Some(h) if h.starts_with("0x") => {
            Some(quantity::parse_u64(&h).map_err(RpcError::InvalidParams)?)
        }
        Some(h) => {
            return Err(RpcError::InvalidParams(format!(
                "height must be 0x-prefixed hex, got `{h}`"
            )))
        }
        None => None,
    };

    Ok(BalanceParams { address, height })
}

async fn dispatch(node: &Node, request: &ServiceRequest) -> Result<Value, RpcError> {
    let result = node.call(request).await??;

    Ok(match result {
        QueryResult::Balance { value } => Value::String(quantity::to_hex(value)),
        QueryResult::BlockHeight { height } => Value::String(quantity::to_hex(height.into())),
        QueryResult::Account { account } => serde_json::to_value(account)
            .map_err(|e| ServiceError::Internal(e.to_string()))?,
    })
}

#[cfg(test)]
mod test {
    use super::parse_request;
    use crate::api::jsonrpc::RpcError;
    use icon_storage::address;
    use iconservice::{types::BalanceParams, ServiceError, ServiceRequest};
    use serde_json::json;

    #[test]
    fn parse_balance_request() {
        let request = parse_request(&json!({
            "jsonrpc": "2.0",
            "id": 1234,
            "method": "icx_getBalance",
            "params": { "address": "hxe7af5fcfd8dfc67530a01a0e403882687528dfcb", "height": "0x10" }
        }))
        .unwrap();

        assert_eq!(
            request,
            ServiceRequest::GetBalance(BalanceParams {
                address: address!("hxe7af5fcfd8dfc67530a01a0e403882687528dfcb"),
                height: Some(16),
            })
        );
    }

    #[test]
    fn reject_bad_envelopes() {
        let cases = [
            json!([1]),
            json!({ "jsonrpc": "1.0", "id": 1, "method": "icx_getBalance" }),
            json!({ "jsonrpc": "2.0", "method": "icx_getBalance" }),
            json!({ "jsonrpc": "2.0", "id": {}, "method": "icx_getBalance" }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": 7 }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance", "params": ["hx"] }),
        ];

        for case in cases {
            assert!(
                matches!(parse_request(&case), Err(RpcError::InvalidRequest(_))),
                "{case}"
            );
        }

        assert!(matches!(
            parse_request(&json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_call" })),
            Err(RpcError::Service(ServiceError::MethodNotFound(_)))
        ));
    }

    #[test]
    fn reject_bad_params() {
        let cases = [
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance" }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance", "params": {} }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance", "params": { "address": "hx12" } }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance",
                    "params": { "address": "hxe7af5fcfd8dfc67530a01a0e403882687528dfcb", "height": "16" } }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance",
                    "params": { "address": "hxe7af5fcfd8dfc67530a01a0e403882687528dfcb", "height": "0xzz" } }),
            json!({ "jsonrpc": "2.0", "id": 1, "method": "icx_getLastBlockHeight", "params": { "a": 1 } }),
        ];

        for case in cases {
            assert!(
                matches!(parse_request(&case), Err(RpcError::InvalidParams(_))),
                "{case}"
            );
        }

        assert_eq!(
            parse_request(&json!({ "jsonrpc": "2.0", "id": "x", "method": "icx_getLastBlockHeight" }))
                .unwrap(),
            ServiceRequest::GetLastBlockHeight
        );
    }
}
