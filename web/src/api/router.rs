use crate::{api::service, node::Node};
use actix_web::{get, post, web, HttpResponse, Responder};

#[post("/api/v3")]
async fn json_rpc(node: web::Data<Node>, body: web::Bytes) -> impl Responder {
    log::info!("json_rpc - {}", String::from_utf8_lossy(&body));
    web::Json(service::handle_body(&node, &body).await)
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
