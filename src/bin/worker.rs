use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use screenshot_api::broker::RedisTaskBroker;
use screenshot_api::config::AppConfig;
use screenshot_api::logging;
use screenshot_api::worker_loop;

/// A stateful browser worker: any number may run against one broker.
/// Each process runs a single sequential claim/render/publish loop;
/// horizontal scale comes from running more processes, not more
/// in-process consumers.
#[derive(Parser, Debug)]
#[command(name = "worker", version, about)]
struct Args {
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load()?;

    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    logging::init(&config.log_level)?;
    info!(?config, "worker configuration loaded");

    let broker: Arc<dyn screenshot_api::broker::TaskBroker> = Arc::new(RedisTaskBroker::connect(&config).await?);

    let should_exit = Arc::new(AtomicBool::new(false));
    spawn_shutdown_listener(should_exit.clone());

    worker_loop::run(config, broker, should_exit).await;
    Ok(())
}

/// Flips `should_exit` on SIGINT or SIGTERM so the main loop finishes its
/// current iteration and stops cleanly rather than abandoning a claimed job.
fn spawn_shutdown_listener(should_exit: Arc<AtomicBool>) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("failed to install SIGTERM handler: {}", e);
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        info!("shutdown signal received, finishing current task before exit");
        should_exit.store(true, Ordering::Relaxed);
    });
}
