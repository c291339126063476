use std::collections::{HashMap, VecDeque};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::model::{JobResult, JobStatus, ScreenshotParams, ScreenshotResult, TaskEnvelope};

use super::TaskBroker;

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

struct State {
    statuses: HashMap<String, JobResult>,
    queue: VecDeque<TaskEnvelope>,
    mailboxes: HashMap<String, VecDeque<JobResult>>,
}

/// In-memory `TaskBroker` double, grounded in the mock pattern the
/// `common-redis` crate ships alongside its real client. Lets the JSON-RPC
/// dispatcher and task-lifecycle invariants run without a live Redis.
pub struct MockTaskBroker {
    state: Mutex<State>,
}

impl Default for MockTaskBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskBroker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                statuses: HashMap::new(),
                queue: VecDeque::new(),
                mailboxes: HashMap::new(),
            }),
        }
    }
}

#[async_trait]
impl TaskBroker for MockTaskBroker {
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

        let mut state = self.state.lock().await;
        state.statuses.insert(job_id.clone(), pending);
        state.queue.push_back(TaskEnvelope {
            job_id: job_id.clone(),
            params,
        });
        Ok(job_id)
    }

    async fn pop_task(&self, _timeout: Duration) -> Result<Option<TaskEnvelope>, ServiceError> {
        let mut state = self.state.lock().await;
        Ok(state.queue.pop_front())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobResult>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.statuses.get(job_id).cloned())
    }

    async fn update_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
        result: Option<ScreenshotResult>,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().await;
        let Some(job) = state.statuses.get(job_id).cloned() else {
            return Ok(());
        };

        let mut updated = job;
        updated.status = status;
        updated.updated_at = now_secs();
        updated.result = result;

        if matches!(status, JobStatus::Success | JobStatus::Failed) {
            state
                .mailboxes
                .entry(job_id.to_string())
                .or_default()
                .push_back(updated.clone());
            if let Some(r) = &updated.result {
                updated.result = Some(r.without_image());
            }
        }

        state.statuses.insert(job_id.to_string(), updated);
        Ok(())
    }

    async fn wait_for_result(&self, job_id: &str, _timeout: Duration) -> Result<Option<JobResult>, ServiceError> {
        let mut state = self.state.lock().await;
        Ok(state.mailboxes.get_mut(job_id).and_then(|m| m.pop_front()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScreenshotParams;
    use std::collections::HashMap as Map;

    fn sample_params() -> ScreenshotParams {
        ScreenshotParams {
            html: Some("<p>hi</p>".to_string()),
            selector: None,
            clip: None,
            full_page: false,
            viewport: None,
            wait_until: None,
            wait_for_selector: None,
            timeout_ms: None,
            extra_http_headers: Map::new(),
            style_overrides: None,
            image_type: None,
            quality: None,
            scale: None,
            omit_background: false,
            encoding: None,
        }
    }

    #[tokio::test]
    async fn submit_is_atomically_visible() {
        let broker = MockTaskBroker::new();
        let job_id = broker.submit_task(sample_params()).await.unwrap();
        let job = broker.get_job(&job_id).await.unwrap();
        assert!(job.is_some());
        assert_eq!(job.unwrap().status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn mailbox_delivers_once_then_empties() {
        let broker = MockTaskBroker::new();
        let job_id = broker.submit_task(sample_params()).await.unwrap();

        let result = ScreenshotResult {
            image: Some("AAAA".to_string()),
            image_type: Some("png".to_string()),
            width: Some(10),
            height: Some(10),
            size_bytes: Some(4),
            error: None,
        };
        broker
            .update_job_status(&job_id, JobStatus::Success, Some(result))
            .await
            .unwrap();

        let status = broker.get_job(&job_id).await.unwrap().unwrap();
        assert!(status.result.unwrap().image.is_none(), "status key must never retain the image");

        let first = broker.wait_for_result(&job_id, Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.unwrap().result.unwrap().image.as_deref(), Some("AAAA"));

        let second = broker.wait_for_result(&job_id, Duration::from_millis(10)).await.unwrap();
        assert!(second.is_none(), "a second waiter must see an empty mailbox");
    }

    #[tokio::test]
    async fn status_sequence_is_monotonic_prefix() {
        let broker = MockTaskBroker::new();
        let job_id = broker.submit_task(sample_params()).await.unwrap();
        assert_eq!(broker.get_job(&job_id).await.unwrap().unwrap().status, JobStatus::Pending);

        broker.update_job_status(&job_id, JobStatus::Processing, None).await.unwrap();
        assert_eq!(broker.get_job(&job_id).await.unwrap().unwrap().status, JobStatus::Processing);

        broker
            .update_job_status(&job_id, JobStatus::Success, Some(ScreenshotResult::default()))
            .await
            .unwrap();
        assert_eq!(broker.get_job(&job_id).await.unwrap().unwrap().status, JobStatus::Success);
    }
}
