//! JSON-RPC access to the audited node.
//!
//! The [`NodeRpc`] trait is the seam between the verification pipeline and
//! the wire: production code goes through [`RpcClient`], tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use auditor_types::BlockNumber;
use thiserror::Error;

mod client;
mod retry;
mod types;

pub use client::{RpcClient, ETH_GET_BLOCK_BY_NUMBER, ETH_GET_TRANSACTION_BY_HASH};
pub use retry::RetryPolicy;
pub use types::{RpcErrorObject, RpcRequest, RpcResponse};

/// Errors surfaced by the RPC client.
#[derive(Debug, Error)]
pub enum RpcError {
	#[error("failed to build HTTP client: {0}")]
	Client(String),

	#[error("{method} exhausted {attempts} attempts: {message}")]
	TransportExhausted {
		method: String,
		attempts: u32,
		message: String,
	},

	#[error("malformed RPC response: {0}")]
	Malformed(String),
}

/// Typed surface of the upstream node.
///
/// Implementations must retry transient transport failures internally;
/// an `Err` means the call is definitively unanswerable and callers treat
/// it as their verification-failure signal.
#[async_trait]
pub trait NodeRpc: Send + Sync {
	/// Fetches a block by number with full transaction objects included.
	async fn get_block_by_number(&self, number: BlockNumber) -> Result<RpcResponse, RpcError>;

	/// Fetches a single transaction by its hash.
	async fn get_transaction_by_hash(&self, hash: &str) -> Result<RpcResponse, RpcError>;
}
