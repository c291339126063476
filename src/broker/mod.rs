mod mock;
mod redis_broker;

pub use mock::MockTaskBroker;
pub use redis_broker::RedisTaskBroker;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::model::{JobResult, JobStatus, ScreenshotParams, ScreenshotResult, TaskEnvelope};

/// Typed facade over the broker, grounded in the `Client` trait shape of the
/// `common-redis` crate: one trait, one production implementation, one
/// in-memory double for tests. The gateway and worker binaries depend only
/// on this trait, never on `redis` directly.
#[async_trait]
pub trait TaskBroker: Send + Sync {
    /// Generates a `job_id`, writes a pending [`JobResult`] and enqueues the
    /// task atomically, then returns the new `job_id`.
    async fn submit_task(&self, params: ScreenshotParams) -> Result<String, ServiceError>;

    /// Blocking pop from the task queue; `None` on timeout.
    async fn pop_task(&self, timeout: Duration) -> Result<Option<TaskEnvelope>, ServiceError>;

    /// Reads the current status record without consuming anything.
    async fn get_job(&self, job_id: &str) -> Result<Option<JobResult>, ServiceError>;

    /// Mutates the status record and, if `status` is terminal, publishes a
    /// full copy (including the image) to the job's result mailbox before
    /// nulling the image out of the long-lived status key.
    async fn update_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
        result: Option<ScreenshotResult>,
    ) -> Result<(), ServiceError>;

    /// Blocking pop from the job's result mailbox; `None` on timeout. Drains
    /// at most once per job — a second call after the first succeeds will
    /// see an empty mailbox.
    async fn wait_for_result(&self, job_id: &str, timeout: Duration) -> Result<Option<JobResult>, ServiceError>;
}
