use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use tracing::{debug, instrument};

use crate::broker::TaskBroker;
use crate::config::AppConfig;
use crate::rpc;

pub type SharedBroker = Arc<dyn TaskBroker>;

/// `POST /rpc` — the single JSON-RPC 2.0 entry point. A
/// notification (no `id`) yields `204 No Content`; everything else always
/// returns `200` with a JSON-RPC envelope, success or error.
#[instrument(skip(body, broker, config))]
pub async fn rpc_handler(
    body: web::Bytes,
    broker: web::Data<SharedBroker>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    match rpc::dispatch_raw(&body, broker.get_ref().as_ref(), config.get_ref()).await {
        Some(response) => HttpResponse::Ok()
            .insert_header(("Access-Control-Allow-Origin", "*"))
            .json(response),
        None => {
            debug!("notification handled, returning 204");
            HttpResponse::NoContent()
                .insert_header(("Access-Control-Allow-Origin", "*"))
                .finish()
        }
    }
}

/// `GET /` — a plain liveness probe, independent of the broker.
pub async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// `OPTIONS /rpc` — this service is meant to be called from arbitrary
/// browser-hosted tooling, so CORS is permissive and handled by hand rather
/// than via a dedicated crate.
pub async fn rpc_options() -> impl Responder {
    HttpResponse::NoContent()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"))
        .finish()
}

/// Any non-POST verb on `/rpc` is itself an invalid JSON-RPC request.
pub async fn rpc_method_not_allowed(_req: HttpRequest) -> impl Responder {
    HttpResponse::MethodNotAllowed().json(json!({
        "jsonrpc": "2.0",
        "error": {"code": -32600, "message": "invalid request"},
        "id": null,
    }))
}
