mod handlers;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::info;

use crate::broker::TaskBroker;
use crate::config::AppConfig;

pub use handlers::SharedBroker;

/// Starts the stateless gateway: binds the JSON-RPC HTTP surface and hands
/// every request straight through to `broker`, never touching a browser
/// itself.
pub async fn start_server(config: AppConfig, broker: Arc<dyn TaskBroker>) -> Result<()> {
    let host = config.host.clone();
    let port = config.port;

    info!(host, port, "starting gateway");

    let broker_data = web::Data::new(broker);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(broker_data.clone())
            .app_data(config_data.clone())
            .route("/", web::get().to(handlers::index))
            .service(
                web::resource("/rpc")
                    .route(web::post().to(handlers::rpc_handler))
                    .route(web::method(actix_web::http::Method::OPTIONS).to(handlers::rpc_options))
                    .default_service(web::to(handlers::rpc_method_not_allowed)),
            )
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("failed to bind gateway to {}:{}", host, port))?
    .run()
    .await
    .context("gateway server error")
}
