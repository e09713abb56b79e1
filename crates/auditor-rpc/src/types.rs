//! JSON-RPC 2.0 envelope types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
	pub jsonrpc: &'static str,
	pub method: String,
	pub params: Value,
	pub id: u64,
}

impl RpcRequest {
	pub fn new(method: &str, params: Value) -> Self {
		Self {
			jsonrpc: "2.0",
			method: method.to_string(),
			params,
			id: 1,
		}
	}
}

/// Error object carried by a JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
	pub code: i64,
	pub message: String,
}

/// Incoming JSON-RPC 2.0 response envelope.
///
/// `result` may be `null` and an `error` object may be present even on a
/// well-formed response; interpreting either is the caller's concern.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
	#[serde(default)]
	pub result: Option<Value>,
	#[serde(default)]
	pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
	/// Returns the result if it is present and not `null`.
	pub fn usable_result(&self) -> Option<&Value> {
		self.result.as_ref().filter(|v| !v.is_null())
	}
}
