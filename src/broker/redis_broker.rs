use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::model::{JobResult, JobStatus, ScreenshotParams, ScreenshotResult, TaskEnvelope};

use super::TaskBroker;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// `TaskBroker` implementation over `redis::aio::ConnectionManager`, the
/// auto-reconnecting connection type the `redis` crate ships for long-lived
/// services (the same role `common-redis`'s `RedisClient` plays around
/// `MultiplexedConnection`).
pub struct RedisTaskBroker {
    conn: ConnectionManager,
    task_queue: String,
    result_prefix: String,
    result_ttl: u64,
}

impl RedisTaskBroker {
    pub async fn connect(config: &AppConfig) -> Result<Self, ServiceError> {
        let client = redis::Client::open(config.redis_url())
            .map_err(|e| ServiceError::Internal(format!("invalid redis url: {}", e)))?;
        let conn = client.get_connection_manager().await?;
        Ok(Self {
            conn,
            task_queue: config.redis_task_queue.clone(),
            result_prefix: config.redis_result_prefix.clone(),
            result_ttl: config.redis_result_ttl_seconds,
        })
    }

    fn status_key(&self, job_id: &str) -> String {
        format!("{}{}", self.result_prefix, job_id)
    }

    fn mailbox_key(job_id: &str) -> String {
        format!("result_queue:{}", job_id)
    }
}

#[async_trait]
impl TaskBroker for RedisTaskBroker {
    async fn submit_task(&self, params: ScreenshotParams) -> Result<String, ServiceError> {
        let job_id = Uuid::new_v4().to_string();
        let created_at = now_secs();
        let pending = JobResult {
            job_id: job_id.clone(),
            status: JobStatus::Pending,
            created_at,
            updated_at: created_at,
            result: None,
        };
        let envelope = TaskEnvelope {
            job_id: job_id.clone(),
            params,
        };

        let status_key = self.status_key(&job_id);
        let status_json = serde_json::to_string(&pending)?;
        let task_json = serde_json::to_string(&envelope)?;

        debug!(job_id = %job_id, "submitting task atomically");
        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .set_ex(&status_key, &status_json, self.result_ttl)
            .rpush(&self.task_queue, &task_json)
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(job_id)
    }

    async fn pop_task(&self, timeout: Duration) -> Result<Option<TaskEnvelope>, ServiceError> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> = conn.blpop(&self.task_queue, timeout.as_secs_f64()).await?;
        match reply {
            Some((_key, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobResult>, ServiceError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.status_key(job_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn update_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
        result: Option<ScreenshotResult>,
    ) -> Result<(), ServiceError> {
        let mut conn = self.conn.clone();
        let status_key = self.status_key(job_id);

        let raw: Option<String> = conn.get(&status_key).await?;
        let Some(raw) = raw else {
            trace!(job_id = %job_id, "status key absent, TTL already lapsed");
            return Ok(());
        };
        let mut job: JobResult = serde_json::from_str(&raw)?;

        job.status = status;
        job.updated_at = now_secs();
        job.result = result;

        let is_terminal = matches!(status, JobStatus::Success | JobStatus::Failed);
        if is_terminal {
            let mailbox_key = Self::mailbox_key(job_id);
            let mailbox_json = serde_json::to_string(&job)?;
            redis::pipe()
                .atomic()
                .rpush(&mailbox_key, &mailbox_json)
                .expire(&mailbox_key, 60)
                .query_async::<_, ()>(&mut conn)
                .await?;

            if let Some(r) = &job.result {
                job.result = Some(r.without_image());
            }
        }

        let status_json = serde_json::to_string(&job)?;
        conn.set_ex(&status_key, status_json, self.result_ttl).await?;
        Ok(())
    }

    async fn wait_for_result(&self, job_id: &str, timeout: Duration) -> Result<Option<JobResult>, ServiceError> {
        let mut conn = self.conn.clone();
        let reply: Option<(String, String)> = conn
            .blpop(Self::mailbox_key(job_id), timeout.as_secs_f64())
            .await?;
        match reply {
            Some((_key, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }
}
