use crate::{
    api::router::{health, json_rpc},
    node::{Node, NodeConfig},
};
use actix_web::{test, web, App};
use icon_bus::Broker;
use icon_storage::{address, Account, AccountStorage, KeyValueStore, MemoryStore};
use iconservice::route_name;
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

const ADDRESS: &str = "hxe7af5fcfd8dfc67530a01a0e403882687528dfcb";
const ONE_ICX: u128 = 1_000_000_000_000_000_000;

fn config(timeout: Duration) -> NodeConfig {
    NodeConfig {
        channel: "test".into(),
        timeout,
        queue_capacity: 16,
    }
}

async fn node_with(accounts: &[Account], height: u64) -> Node {
    let store = Arc::new(MemoryStore::new());
    AccountStorage::new(Arc::clone(&store))
        .put_batch(accounts, Some(height))
        .unwrap();

    let view: Arc<dyn KeyValueStore> = store;
    Node::start(view, &config(Duration::from_secs(5))).await.unwrap()
}

async fn post(node: Node, body: &str) -> Value {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(node))
            .service(json_rpc)
            .service(health),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v3")
        .set_payload(body.to_string())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    test::read_body_json(resp).await
}

fn get_balance(id: u64, address: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "icx_getBalance",
        "params": { "address": address }
    })
}

#[actix_web::test]
async fn balance_reaches_client_unchanged() {
    let node = node_with(&[Account::new(address!(ADDRESS), ONE_ICX)], 1).await;

    let resp = post(node, &get_balance(1234, ADDRESS).to_string()).await;

    assert_eq!(
        resp,
        json!({ "jsonrpc": "2.0", "id": 1234, "result": "0xde0b6b3a7640000" })
    );

    let value = resp["result"].as_str().unwrap();
    assert_eq!(
        u128::from_str_radix(value.trim_start_matches("0x"), 16).unwrap(),
        ONE_ICX
    );
}

#[actix_web::test]
async fn batch_keeps_order() {
    let other = "hx0000000000000000000000000000000000000002";
    let node = node_with(
        &[
            Account::new(address!(ADDRESS), ONE_ICX),
            Account::new(address!(other), 2),
        ],
        7,
    )
    .await;

    let body = json!([
        get_balance(1, other),
        { "jsonrpc": "2.0", "id": 2, "method": "icx_getLastBlockHeight" },
        get_balance(3, ADDRESS),
        { "jsonrpc": "2.0", "id": 4, "method": "icx_getAccount", "params": { "address": other } },
        { "jsonrpc": "2.0", "id": 5, "method": "icx_getTransactionResult", "params": {} }
    ]);
    let resp = post(node, &body.to_string()).await;

    assert_eq!(resp[0]["result"], "0x2");
    assert_eq!(resp[1]["result"], "0x7");
    assert_eq!(resp[2]["result"], "0xde0b6b3a7640000");
    assert_eq!(
        resp[3]["result"],
        json!({ "address": other, "balance": "0x2", "isContract": false })
    );
    assert_eq!(resp[4]["id"], 5);
    assert_eq!(resp[4]["error"]["code"], -32601);
}

#[actix_web::test]
async fn protocol_errors() {
    let node = node_with(&[], 0).await;
    let app = test::init_service(App::new().app_data(web::Data::new(node)).service(json_rpc)).await;

    let cases = [
        ("{not json", -32700),
        ("[]", -32600),
        (r#"{"jsonrpc":"2.0","id":1}"#, -32600),
        (
            r#"{"jsonrpc":"2.0","id":1,"method":"icx_getBalance","params":{"address":"0x00"}}"#,
            -32602,
        ),
    ];

    for (body, code) in cases {
        let req = test::TestRequest::post()
            .uri("/api/v3")
            .set_payload(body)
            .to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp["error"]["code"], code, "{body}");
        assert!(resp.get("result").is_none());
    }
}

#[actix_web::test]
async fn historical_height_is_unavailable() {
    let node = node_with(&[Account::new(address!(ADDRESS), ONE_ICX)], 10).await;

    let body = json!([
        { "jsonrpc": "2.0", "id": 1, "method": "icx_getBalance",
          "params": { "address": ADDRESS, "height": "0x9" } },
        { "jsonrpc": "2.0", "id": 2, "method": "icx_getBalance",
          "params": { "address": ADDRESS, "height": "0xb" } },
        { "jsonrpc": "2.0", "id": 3, "method": "icx_getBalance",
          "params": { "address": ADDRESS, "height": "0xa" } }
    ]);
    let resp = post(node, &body.to_string()).await;

    assert_eq!(resp[0]["error"]["code"], -32000);
    assert_eq!(resp[1]["error"]["code"], -32602);
    assert_eq!(resp[2]["result"], "0xde0b6b3a7640000");
}

#[actix_web::test]
async fn silent_service_times_out() {
    let broker = Broker::new();
    // Declared but never consumed.
    let _queue = broker.declare(&route_name("test"), 16).await.unwrap();
    let node = Node::connect(broker, &config(Duration::from_millis(50)))
        .await
        .unwrap();

    let resp = post(node, &get_balance(9, ADDRESS).to_string()).await;

    assert_eq!(resp["id"], 9);
    assert_eq!(resp["error"]["code"], -32006);
}

#[actix_web::test]
async fn health_check() {
    let node = node_with(&[], 0).await;
    let app = test::init_service(App::new().app_data(web::Data::new(node)).service(health)).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(resp, json!({ "status": "ok" }));
}
