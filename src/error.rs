use thiserror::Error;

/// Domain error taxonomy, carried end to end from the render engine through
/// the worker loop, the broker, and finally re-synthesized as a JSON-RPC
/// error envelope at the gateway.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    ScreenshotFailed(String),

    #[error("browser not started: {0}")]
    BrowserError(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// The JSON-RPC error code associated with this variant.
    pub fn code(&self) -> i64 {
        match self {
            ServiceError::ScreenshotFailed(_) => -32001,
            ServiceError::BrowserError(_) => -32002,
            ServiceError::SelectorNotFound(_) => -32003,
            ServiceError::Timeout(_) => -32004,
            ServiceError::JobNotFound(_) => -32005,
            ServiceError::InvalidParams(_) => -32602,
            ServiceError::Internal(_) => -32603,
        }
    }
}

impl From<fantoccini::error::CmdError> for ServiceError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        ServiceError::ScreenshotFailed(err.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for ServiceError {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        ServiceError::BrowserError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        ServiceError::Internal(format!("broker error: {}", err))
    }
}
