//! Configuration types for the auditor.

use auditor_types::BlockNumber;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete auditor configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditorConfig {
	/// Upstream JSON-RPC node settings
	pub node: NodeConfig,
	/// Block range and concurrency settings
	pub scan: ScanConfig,
	/// Persisted state locations
	#[serde(default)]
	pub storage: StorageConfig,
}

/// Upstream JSON-RPC node settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
	/// HTTP JSON-RPC endpoint URL
	pub rpc_url: String,
	/// Per-attempt request timeout in seconds
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
	/// Total attempts per call, including the first
	#[serde(default = "default_retry_attempts")]
	pub retry_attempts: u32,
	/// Fixed delay between attempts in seconds
	#[serde(default = "default_retry_delay_secs")]
	pub retry_delay_secs: u64,
}

impl NodeConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}

	pub fn retry_delay(&self) -> Duration {
		Duration::from_secs(self.retry_delay_secs)
	}
}

/// Block range and concurrency settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
	/// Start block used when no progress marker exists
	pub default_start_block: BlockNumber,
	/// Last block of the audited range, inclusive
	pub end_block: BlockNumber,
	/// Fixed ceiling on concurrently verified blocks
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
}

/// Persisted state locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Text file holding the last processed block number
	#[serde(default = "default_progress_path")]
	pub progress_path: PathBuf,
	/// Append-only CSV of failed transactions
	#[serde(default = "default_failure_log_path")]
	pub failure_log_path: PathBuf,
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			progress_path: default_progress_path(),
			failure_log_path: default_failure_log_path(),
		}
	}
}

fn default_request_timeout_secs() -> u64 {
	15
}

fn default_retry_attempts() -> u32 {
	3
}

fn default_retry_delay_secs() -> u64 {
	2
}

fn default_concurrency() -> usize {
	1000
}

fn default_progress_path() -> PathBuf {
	PathBuf::from("last_processed_block.txt")
}

fn default_failure_log_path() -> PathBuf {
	PathBuf::from("tx_ids.csv")
}
