use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC `id`: string, integer, or absent. `#[serde(untagged)]` is what
/// preserves the caller's chosen type across a round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RpcId {
    String(String),
    Number(i64),
}

/// `jsonrpc`/`method` are kept optional here (rather than required `String`
/// fields) so a body that is valid JSON but an invalid envelope — missing
/// or wrong-typed `jsonrpc`/`method` — still deserializes successfully and
/// can be rejected explicitly as `-32600 INVALID_REQUEST`, instead of
/// falling through to the generic `-32700 PARSE_ERROR` path reserved for
/// JSON that doesn't parse at all.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<RpcId>,
}

impl JsonRpcRequest {
    /// A request with no `id` is a notification: run it, report nothing.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// A well-formed envelope declares `"jsonrpc": "2.0"` and a non-empty
    /// `method`.
    pub fn is_valid_envelope(&self) -> bool {
        self.jsonrpc.as_deref() == Some("2.0") && self.method.as_deref().is_some_and(|m| !m.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorBody>,
    pub id: Option<RpcId>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RpcId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<RpcId>, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcErrorBody {
                code,
                message: message.into(),
                data,
            }),
            id,
        }
    }
}
