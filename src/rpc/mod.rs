mod dispatch;
mod envelope;
mod methods;

pub use dispatch::dispatch_raw;
pub use envelope::{JsonRpcErrorBody, JsonRpcRequest, JsonRpcResponse, RpcId};
