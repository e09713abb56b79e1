//! Per-block verification: fetch the block, then independently refetch
//! every transaction it declares.

use crate::CoreError;
use auditor_rpc::{NodeRpc, RpcError};
use auditor_storage::FailureLog;
use auditor_types::{
	BlockNumber, FailureReason, FailureRecord, TransactionRef, VerificationOutcome,
	BLOCK_UNAVAILABLE, MISSING_HASH,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Verifies that every transaction a block declares is retrievable on its
/// own, streaming each failure to the durable log as it is found.
pub struct BlockVerifier {
	rpc: Arc<dyn NodeRpc>,
	failure_log: Arc<FailureLog>,
}

impl BlockVerifier {
	pub fn new(rpc: Arc<dyn NodeRpc>, failure_log: Arc<FailureLog>) -> Self {
		Self { rpc, failure_log }
	}

	/// Verifies one block and returns the failures it produced.
	///
	/// RPC-level problems are classified and recorded, never escalated;
	/// only failure-log I/O faults surface as errors.
	pub async fn verify(&self, block_number: BlockNumber) -> Result<Vec<FailureRecord>, CoreError> {
		let block = match self.rpc.get_block_by_number(block_number).await {
			Ok(response) => response,
			Err(err) => {
				warn!("failed to fetch block {}: {}", block_number, err);
				return self.block_unavailable(block_number).await;
			}
		};

		let Some(result) = block.usable_result() else {
			warn!("no usable result for block {}", block_number);
			return self.block_unavailable(block_number).await;
		};

		let Some(block_timestamp) = decode_timestamp(result) else {
			warn!("block {} carries no decodable timestamp", block_number);
			return self.block_unavailable(block_number).await;
		};

		let Some(transactions) = result.get("transactions").and_then(Value::as_array) else {
			warn!("block {} result lacks a transactions list", block_number);
			return self.block_unavailable(block_number).await;
		};

		info!(
			"found {} transactions in block {}",
			transactions.len(),
			block_number
		);

		let mut refs = Vec::with_capacity(transactions.len());
		let mut failures = Vec::new();
		for tx in transactions {
			match tx.get("hash").and_then(Value::as_str) {
				Some(hash) => refs.push(TransactionRef {
					block_number,
					hash: hash.to_string(),
					block_timestamp,
				}),
				// A declared transaction with no hash cannot be refetched.
				None => {
					self.record(
						&mut failures,
						FailureRecord {
							block_number,
							tx_hash: MISSING_HASH.to_string(),
							timestamp: block_timestamp,
							reason: FailureReason::MalformedResult,
						},
					)
					.await?;
				}
			}
		}

		for tx in &refs {
			match self.verify_transaction(&tx.hash).await {
				VerificationOutcome::Confirmed => {
					debug!("transaction {} retrieved", tx.hash);
				}
				VerificationOutcome::Failed { reason } => {
					warn!(
						"transaction {} in block {} failed verification: {}",
						tx.hash, tx.block_number, reason
					);
					self.record(
						&mut failures,
						FailureRecord {
							block_number: tx.block_number,
							tx_hash: tx.hash.clone(),
							timestamp: tx.block_timestamp,
							reason,
						},
					)
					.await?;
				}
			}
		}

		Ok(failures)
	}

	/// Classifies one transaction fetch.
	async fn verify_transaction(&self, hash: &str) -> VerificationOutcome {
		let response = match self.rpc.get_transaction_by_hash(hash).await {
			Ok(response) => response,
			Err(RpcError::TransportExhausted { .. }) => {
				return VerificationOutcome::Failed {
					reason: FailureReason::TransportExhausted,
				};
			}
			Err(_) => {
				return VerificationOutcome::Failed {
					reason: FailureReason::MalformedResult,
				};
			}
		};

		let Some(result) = response.usable_result() else {
			return VerificationOutcome::Failed {
				reason: FailureReason::MissingResult,
			};
		};

		if result.get("hash").and_then(Value::as_str).is_none() {
			return VerificationOutcome::Failed {
				reason: FailureReason::MalformedResult,
			};
		}

		VerificationOutcome::Confirmed
	}

	/// Records an unfetchable block as a single sentinel entry. The block's
	/// own timestamp is unknowable here, so the audit wall-clock is used.
	async fn block_unavailable(
		&self,
		block_number: BlockNumber,
	) -> Result<Vec<FailureRecord>, CoreError> {
		let mut failures = Vec::new();
		self.record(
			&mut failures,
			FailureRecord {
				block_number,
				tx_hash: BLOCK_UNAVAILABLE.to_string(),
				timestamp: Utc::now(),
				reason: FailureReason::BlockUnavailable,
			},
		)
		.await?;
		Ok(failures)
	}

	/// Streams the record to the durable log before collecting it, so the
	/// line survives a crash later in the same block.
	async fn record(
		&self,
		failures: &mut Vec<FailureRecord>,
		record: FailureRecord,
	) -> Result<(), CoreError> {
		self.failure_log.append(&record).await?;
		failures.push(record);
		Ok(())
	}
}

/// Decodes the node's hex-encoded Unix timestamp into a UTC datetime.
fn decode_timestamp(result: &Value) -> Option<DateTime<Utc>> {
	let raw = result.get("timestamp")?.as_str()?;
	let seconds = u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()?;
	DateTime::from_timestamp(seconds as i64, 0)
}
