use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::broker::TaskBroker;
use crate::config::AppConfig;
use crate::model::{JobStatus, ScreenshotResult};
use crate::render::RenderEngine;

const POP_TIMEOUT: Duration = Duration::from_secs(5);
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// The worker's entire job: pop one task, render it, publish the result,
/// repeat. This is a single sequential loop per process rather than a
/// fan-out of consumer tasks — concurrency across renders comes from
/// running more worker processes against the same broker, while the
/// render engine's own semaphore is the only in-process concurrency gate.
pub async fn run(config: AppConfig, broker: Arc<dyn TaskBroker>, should_exit: Arc<AtomicBool>) {
    let engine = RenderEngine::new(&config);

    info!("worker loop started");

    while !should_exit.load(Ordering::Relaxed) {
        let envelope = match broker.pop_task(POP_TIMEOUT).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => continue,
            Err(e) => {
                error!("failed to pop task: {}", e);
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        debug!(job_id = %envelope.job_id, "claimed task");

        if let Err(e) = broker.update_job_status(&envelope.job_id, JobStatus::Processing, None).await {
            error!(job_id = %envelope.job_id, "failed to mark job processing: {}", e);
            continue;
        }

        let (status, result) = match envelope.params.resolve(&config) {
            Ok(resolved) => match engine.render(&resolved).await {
                Ok(result) => (JobStatus::Success, result),
                Err(e) => {
                    warn!(job_id = %envelope.job_id, "render failed: {}", e);
                    (JobStatus::Failed, ScreenshotResult::error(e.to_string()))
                }
            },
            Err(errors) => {
                warn!(job_id = %envelope.job_id, "worker-side re-validation rejected params: {:?}", errors);
                (JobStatus::Failed, ScreenshotResult::error(errors.join("; ")))
            }
        };

        if let Err(e) = broker.update_job_status(&envelope.job_id, status, Some(result)).await {
            error!(job_id = %envelope.job_id, "failed to publish result: {}", e);
        }
    }

    info!("worker loop exiting");
}
