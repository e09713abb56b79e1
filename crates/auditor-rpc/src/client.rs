//! JSON-RPC client with per-attempt timeout and bounded retry.
//!
//! Transport failures (timeouts, connection errors) are retried up to the
//! policy's attempt bound with a fixed delay between attempts. A response
//! that was received but cannot be decoded is surfaced immediately without
//! retrying; whether a decoded envelope is usable is the caller's concern.

use crate::retry::RetryPolicy;
use crate::types::{RpcRequest, RpcResponse};
use crate::{NodeRpc, RpcError};
use async_trait::async_trait;
use auditor_types::BlockNumber;
use backoff::backoff::Backoff;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Method used to fetch a block with full transaction objects.
pub const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
/// Method used to fetch a single transaction by hash.
pub const ETH_GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";

/// JSON-RPC 2.0 client over a shared HTTP connection pool.
pub struct RpcClient {
	endpoint: String,
	http: reqwest::Client,
	retry: RetryPolicy,
}

enum SendError {
	/// The request never produced a response (timeout, connection refused).
	Transport(String),
	/// A response arrived but its body could not be decoded as JSON.
	Malformed(String),
}

impl RpcClient {
	pub fn new(
		endpoint: impl Into<String>,
		request_timeout: Duration,
		retry: RetryPolicy,
	) -> Result<Self, RpcError> {
		let http = reqwest::Client::builder()
			.timeout(request_timeout)
			.build()
			.map_err(|e| RpcError::Client(e.to_string()))?;

		Ok(Self {
			endpoint: endpoint.into(),
			http,
			retry,
		})
	}

	/// Issues one JSON-RPC call, retrying transport failures per the policy.
	///
	/// Exhausted retries return [`RpcError::TransportExhausted`]; callers
	/// classify that as their failure signal rather than propagating it.
	pub async fn call(&self, method: &str, params: Value) -> Result<RpcResponse, RpcError> {
		let request = RpcRequest::new(method, params);
		let mut backoff = self.retry.backoff();
		let mut attempt = 0u32;

		loop {
			attempt += 1;
			match self.send(&request).await {
				Ok(response) => {
					debug!("{} succeeded on attempt {}", method, attempt);
					return Ok(response);
				}
				Err(SendError::Malformed(message)) => {
					return Err(RpcError::Malformed(message));
				}
				Err(SendError::Transport(message)) => {
					if attempt >= self.retry.max_attempts {
						warn!(
							"{} failed after {} attempts, giving up: {}",
							method, attempt, message
						);
						return Err(RpcError::TransportExhausted {
							method: method.to_string(),
							attempts: attempt,
							message,
						});
					}

					// Constant backoff never runs out of intervals.
					let delay = backoff.next_backoff().unwrap_or(self.retry.delay);
					warn!(
						"{} attempt {}/{} failed, retrying in {:?}: {}",
						method, attempt, self.retry.max_attempts, delay, message
					);
					tokio::time::sleep(delay).await;
				}
			}
		}
	}

	async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, SendError> {
		let response = self
			.http
			.post(&self.endpoint)
			.json(request)
			.send()
			.await
			.map_err(|e| SendError::Transport(e.to_string()))?;

		response.json::<RpcResponse>().await.map_err(|e| {
			if e.is_decode() {
				SendError::Malformed(e.to_string())
			} else {
				SendError::Transport(e.to_string())
			}
		})
	}
}

#[async_trait]
impl NodeRpc for RpcClient {
	async fn get_block_by_number(&self, number: BlockNumber) -> Result<RpcResponse, RpcError> {
		self.call(
			ETH_GET_BLOCK_BY_NUMBER,
			json!([format!("{:#x}", number), true]),
		)
		.await
	}

	async fn get_transaction_by_hash(&self, hash: &str) -> Result<RpcResponse, RpcError> {
		self.call(ETH_GET_TRANSACTION_BY_HASH, json!([hash])).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Instant;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};

	/// Serves exactly one canned HTTP response on a fresh local port.
	async fn serve_once(body: String) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			if let Ok((mut stream, _)) = listener.accept().await {
				let mut buf = [0u8; 4096];
				let _ = stream.read(&mut buf).await;
				let response = format!(
					"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
					body.len(),
					body
				);
				let _ = stream.write_all(response.as_bytes()).await;
			}
		});

		format!("http://{}", addr)
	}

	/// Binds then drops a listener so the port is known to refuse connections.
	async fn refused_endpoint() -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		drop(listener);
		format!("http://{}", addr)
	}

	fn fast_policy(max_attempts: u32) -> RetryPolicy {
		RetryPolicy::new(max_attempts, Duration::from_millis(100))
	}

	#[tokio::test]
	async fn test_call_returns_envelope() {
		let endpoint = serve_once(
			r#"{"jsonrpc":"2.0","id":1,"result":{"hash":"0xfeed"}}"#.to_string(),
		)
		.await;
		let client =
			RpcClient::new(endpoint, Duration::from_secs(5), fast_policy(3)).unwrap();

		let response = client.get_transaction_by_hash("0xfeed").await.unwrap();
		let result = response.usable_result().unwrap();
		assert_eq!(result.get("hash").unwrap().as_str(), Some("0xfeed"));
	}

	#[tokio::test]
	async fn test_null_result_is_returned_not_retried() {
		let endpoint = serve_once(r#"{"jsonrpc":"2.0","id":1,"result":null}"#.to_string()).await;
		let client =
			RpcClient::new(endpoint, Duration::from_secs(5), fast_policy(3)).unwrap();

		let response = client.get_transaction_by_hash("0xmissing").await.unwrap();
		assert!(response.usable_result().is_none());
	}

	#[tokio::test]
	async fn test_malformed_body_is_not_retried() {
		// serve_once accepts a single connection; a retry would hit a dead
		// port and surface as TransportExhausted instead.
		let endpoint = serve_once("definitely not json".to_string()).await;
		let client =
			RpcClient::new(endpoint, Duration::from_secs(5), fast_policy(3)).unwrap();

		let err = client.call(ETH_GET_TRANSACTION_BY_HASH, json!(["0x1"])).await.unwrap_err();
		assert!(matches!(err, RpcError::Malformed(_)));
	}

	#[tokio::test]
	async fn test_transport_failure_retries_to_the_bound() {
		let endpoint = refused_endpoint().await;
		let client =
			RpcClient::new(endpoint, Duration::from_secs(5), fast_policy(3)).unwrap();

		let started = Instant::now();
		let err = client.call(ETH_GET_BLOCK_BY_NUMBER, json!(["0x1", true])).await.unwrap_err();
		let elapsed = started.elapsed();

		match err {
			RpcError::TransportExhausted { attempts, .. } => assert_eq!(attempts, 3),
			other => panic!("expected TransportExhausted, got {:?}", other),
		}
		// Two inter-attempt delays of 100ms each.
		assert!(elapsed >= Duration::from_millis(200));
		assert!(elapsed < Duration::from_secs(5));
	}

	#[tokio::test]
	async fn test_single_attempt_policy_fails_fast() {
		let endpoint = refused_endpoint().await;
		let client =
			RpcClient::new(endpoint, Duration::from_secs(5), fast_policy(1)).unwrap();

		let started = Instant::now();
		let err = client.call(ETH_GET_BLOCK_BY_NUMBER, json!(["0x1", true])).await.unwrap_err();

		match err {
			RpcError::TransportExhausted { attempts, .. } => assert_eq!(attempts, 1),
			other => panic!("expected TransportExhausted, got {:?}", other),
		}
		assert!(started.elapsed() < Duration::from_millis(100));
	}
}
