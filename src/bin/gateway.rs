use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use screenshot_api::broker::RedisTaskBroker;
use screenshot_api::config::AppConfig;
use screenshot_api::gateway;
use screenshot_api::logging;

/// Stateless JSON-RPC gateway: accepts requests, hands them to the broker,
/// and never touches a browser itself.
#[derive(Parser, Debug)]
#[command(name = "gateway", version, about)]
struct Args {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    log_level: Option<String>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    logging::init(&config.log_level)?;
    info!(?config, "gateway configuration loaded");

    let broker: Arc<dyn screenshot_api::broker::TaskBroker> = Arc::new(RedisTaskBroker::connect(&config).await?);

    gateway::start_server(config, broker).await
}
