use serde_json::json;
use tracing::{error, warn};

use crate::broker::TaskBroker;
use crate::config::AppConfig;
use crate::error::ServiceError;
use crate::rpc::envelope::{JsonRpcRequest, JsonRpcResponse, RpcId};
use crate::rpc::methods::{self, RpcError};

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Parses, validates, and routes one raw request body. Returns `None` only
/// for a well-formed notification (no `id`) — those never get a response
/// body, success or error, regardless of what the handler did.
pub async fn dispatch_raw(body: &[u8], broker: &dyn TaskBroker, config: &AppConfig) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            warn!("failed to parse JSON-RPC request: {}", e);
            return Some(JsonRpcResponse::error(None, PARSE_ERROR, "parse error", None));
        }
    };

    if !request.is_valid_envelope() {
        return Some(JsonRpcResponse::error(
            request.id.clone(),
            INVALID_REQUEST,
            "invalid request",
            None,
        ));
    }

    let id = request.id.clone();
    let is_notification = request.is_notification();
    let method = request.method.as_deref().unwrap_or_default();

    let outcome = methods::call(method, request.params, broker, config).await;

    if is_notification {
        return None;
    }

    Some(match outcome {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(err) => rpc_error_response(id, err),
    })
}

fn rpc_error_response(id: Option<RpcId>, err: RpcError) -> JsonRpcResponse {
    match err {
        RpcError::MethodNotFound(method) => {
            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", method), None)
        }
        RpcError::InvalidParams(details) => JsonRpcResponse::error(
            id,
            INVALID_PARAMS,
            "invalid params",
            Some(json!({ "details": details })),
        ),
        RpcError::Service(service_err) => service_error_response(id, service_err),
    }
}

fn service_error_response(id: Option<RpcId>, err: ServiceError) -> JsonRpcResponse {
    let code = err.code();
    if code == INTERNAL_ERROR {
        error!("internal error: {}", err);
        return JsonRpcResponse::error(id, INTERNAL_ERROR, "internal server error", None);
    }
    JsonRpcResponse::error(id, code, err.to_string(), None)
}
