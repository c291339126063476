use serde::Deserialize;
use serde_json::{json, Value};

use crate::broker::TaskBroker;
use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::model::{JobStatus, ScreenshotParams};

/// The registry's sorted name list — the source of truth for `get_methods`
/// and for routing in [`call`].
pub const METHOD_NAMES: &[&str] = &["get_job_status", "get_methods", "ping", "screenshot"];

/// Dispatch-layer error: distinguishes "no such method" and "bad params"
/// (both carrying caller-facing detail) from a domain [`ServiceError`].
#[derive(Debug)]
pub enum RpcError {
    MethodNotFound(String),
    InvalidParams(Vec<String>),
    Service(ServiceError),
}

impl From<ServiceError> for RpcError {
    fn from(err: ServiceError) -> Self {
        RpcError::Service(err)
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::Service(ServiceError::Internal(err.to_string()))
    }
}

pub async fn call(
    method: &str,
    params: Option<Value>,
    broker: &dyn TaskBroker,
    config: &AppConfig,
) -> Result<Value, RpcError> {
    match method {
        "ping" => Ok(ping()),
        "get_methods" => Ok(get_methods()),
        "screenshot" => screenshot(params, broker, config).await,
        "get_job_status" => get_job_status(params, broker).await,
        other => Err(RpcError::MethodNotFound(other.to_string())),
    }
}

fn ping() -> Value {
    json!({"pong": true, "status": "online"})
}

fn get_methods() -> Value {
    let mut names = METHOD_NAMES.to_vec();
    names.sort_unstable();
    json!({"methods": names})
}

async fn screenshot(params: Option<Value>, broker: &dyn TaskBroker, config: &AppConfig) -> Result<Value, RpcError> {
    let raw: ScreenshotParams = match params {
        Some(v) => serde_json::from_value(v).map_err(|e| RpcError::InvalidParams(vec![format!("params: {}", e)]))?,
        None => return Err(RpcError::InvalidParams(vec!["html: field required and must not be empty".to_string()])),
    };

    let resolved = raw.clone().resolve(config).map_err(RpcError::InvalidParams)?;
    let timeout = config.gateway_wait_timeout(resolved.timeout_ms);

    let job_id = broker.submit_task(raw).await?;

    match broker.wait_for_result(&job_id, timeout).await? {
        Some(job) => match job.status {
            JobStatus::Success => Ok(serde_json::to_value(job.result.unwrap_or_default())?),
            JobStatus::Failed => {
                let message = job
                    .result
                    .and_then(|r| r.error)
                    .unwrap_or_else(|| "screenshot failed".to_string());
                Err(ServiceError::ScreenshotFailed(message).into())
            }
            JobStatus::Pending | JobStatus::Processing => {
                Err(ServiceError::Timeout(format!("job {} did not complete in time", job_id)).into())
            }
        },
        None => Err(ServiceError::Timeout(format!("no result for job {} within {:?}", job_id, timeout)).into()),
    }
}

#[derive(Deserialize)]
struct JobStatusRequest {
    job_id: String,
}

async fn get_job_status(params: Option<Value>, broker: &dyn TaskBroker) -> Result<Value, RpcError> {
    let req: JobStatusRequest = match params {
        Some(v) => serde_json::from_value(v).map_err(|e| RpcError::InvalidParams(vec![format!("job_id: {}", e)]))?,
        None => return Err(RpcError::InvalidParams(vec!["job_id: field required".to_string()])),
    };

    match broker.get_job(&req.job_id).await? {
        Some(job) => Ok(serde_json::to_value(job)?),
        None => Err(ServiceError::JobNotFound(req.job_id).into()),
    }
}
