//! Range scheduling: one verification task per block under a fixed
//! concurrency ceiling.

use crate::{BlockVerifier, CoreError};
use auditor_storage::ProgressStore;
use auditor_types::{AuditReport, BlockNumber, FailureReason, FailureRecord};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Scheduler parameters, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
	/// Fixed ceiling on concurrently verified blocks.
	pub concurrency: usize,
}

/// Fans block verification out across a semaphore-gated task group and
/// owns the end-of-run progress marker update.
pub struct RangeScheduler {
	verifier: Arc<BlockVerifier>,
	progress: ProgressStore,
	config: SchedulerConfig,
}

impl RangeScheduler {
	pub fn new(
		verifier: Arc<BlockVerifier>,
		progress: ProgressStore,
		config: SchedulerConfig,
	) -> Self {
		Self {
			verifier,
			progress,
			config,
		}
	}

	/// Audits every block in `[start, end]` inclusive.
	///
	/// All dispatched tasks run to completion regardless of per-block
	/// failures; the progress marker advances to `end` only after every
	/// task has joined cleanly, so a faulted run resumes from the prior
	/// marker.
	pub async fn run(
		&self,
		start: BlockNumber,
		end: BlockNumber,
	) -> Result<AuditReport, CoreError> {
		if start > end {
			info!("empty range {}..={}, nothing to audit", start, end);
			return Ok(AuditReport::default());
		}

		info!(
			"auditing blocks {}..={} with concurrency {}",
			start, end, self.config.concurrency
		);

		let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
		let mut tasks: JoinSet<Result<Vec<FailureRecord>, CoreError>> = JoinSet::new();

		for block_number in start..=end {
			let permit = semaphore
				.clone()
				.acquire_owned()
				.await
				.map_err(|e| CoreError::Scheduler(e.to_string()))?;
			let verifier = self.verifier.clone();
			tasks.spawn(async move {
				let _permit = permit;
				verifier.verify(block_number).await
			});
		}

		let mut report = AuditReport::default();
		while let Some(joined) = tasks.join_next().await {
			let failures = joined??;
			report.blocks_scanned += 1;
			if failures
				.iter()
				.any(|f| f.reason == FailureReason::BlockUnavailable)
			{
				report.blocks_unavailable += 1;
			}
			report.failures.extend(failures);
		}

		if report.all_retrievable() {
			info!(
				"all {} blocks verified, every transaction retrievable",
				report.blocks_scanned
			);
		} else {
			warn!(
				"{} transactions failed verification ({} blocks unavailable)",
				report.failures.len(),
				report.blocks_unavailable
			);
			for record in &report.failures {
				warn!("{}", record);
			}
		}

		self.progress.write(end).await?;
		info!("progress marker advanced to block {}", end);

		Ok(report)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use auditor_rpc::{NodeRpc, RpcError, RpcResponse};
	use auditor_storage::FailureLog;
	use serde_json::{json, Value};
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;
	use std::time::Duration;

	/// Fake node serving empty blocks while tracking per-block visits and
	/// the peak number of in-flight block fetches.
	struct CountingNode {
		visits: Mutex<HashMap<BlockNumber, u32>>,
		in_flight: AtomicUsize,
		peak_in_flight: AtomicUsize,
		unavailable: Vec<BlockNumber>,
	}

	impl CountingNode {
		fn new(unavailable: Vec<BlockNumber>) -> Self {
			Self {
				visits: Mutex::new(HashMap::new()),
				in_flight: AtomicUsize::new(0),
				peak_in_flight: AtomicUsize::new(0),
				unavailable,
			}
		}
	}

	#[async_trait]
	impl NodeRpc for CountingNode {
		async fn get_block_by_number(
			&self,
			number: BlockNumber,
		) -> Result<RpcResponse, RpcError> {
			let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

			*self.visits.lock().unwrap().entry(number).or_insert(0) += 1;
			tokio::time::sleep(Duration::from_millis(10)).await;

			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			if self.unavailable.contains(&number) {
				return Ok(RpcResponse {
					result: Some(Value::Null),
					error: None,
				});
			}
			Ok(RpcResponse {
				result: Some(json!({"timestamp": "0x1", "transactions": []})),
				error: None,
			})
		}

		async fn get_transaction_by_hash(&self, _hash: &str) -> Result<RpcResponse, RpcError> {
			Ok(RpcResponse {
				result: None,
				error: None,
			})
		}
	}

	async fn scheduler_with(
		node: Arc<CountingNode>,
		dir: &tempfile::TempDir,
		concurrency: usize,
	) -> (RangeScheduler, ProgressStore) {
		let log = FailureLog::open(dir.path().join("tx_ids.csv")).await.unwrap();
		let verifier = BlockVerifier::new(node, Arc::new(log));
		let progress_path = dir.path().join("last_processed_block.txt");
		let scheduler = RangeScheduler::new(
			Arc::new(verifier),
			ProgressStore::new(&progress_path),
			SchedulerConfig { concurrency },
		);
		(scheduler, ProgressStore::new(&progress_path))
	}

	#[tokio::test]
	async fn test_every_block_visited_exactly_once() {
		let node = Arc::new(CountingNode::new(Vec::new()));
		let dir = tempfile::tempdir().unwrap();
		let (scheduler, progress) = scheduler_with(node.clone(), &dir, 2).await;

		let report = scheduler.run(100, 105).await.unwrap();

		assert_eq!(report.blocks_scanned, 6);
		assert!(report.all_retrievable());

		let visits = node.visits.lock().unwrap();
		for block in 100..=105u64 {
			assert_eq!(visits.get(&block), Some(&1), "block {}", block);
		}
		assert_eq!(visits.len(), 6);

		assert_eq!(progress.read().await.unwrap(), Some(105));
	}

	#[tokio::test]
	async fn test_concurrency_ceiling_is_respected() {
		let node = Arc::new(CountingNode::new(Vec::new()));
		let dir = tempfile::tempdir().unwrap();
		let (scheduler, _progress) = scheduler_with(node.clone(), &dir, 2).await;

		scheduler.run(100, 119).await.unwrap();

		assert!(node.peak_in_flight.load(Ordering::SeqCst) <= 2);
	}

	#[tokio::test]
	async fn test_unavailable_blocks_are_aggregated_not_fatal() {
		let node = Arc::new(CountingNode::new(vec![102, 104]));
		let dir = tempfile::tempdir().unwrap();
		let (scheduler, progress) = scheduler_with(node, &dir, 4).await;

		let report = scheduler.run(100, 105).await.unwrap();

		assert_eq!(report.blocks_scanned, 6);
		assert_eq!(report.blocks_unavailable, 2);
		assert_eq!(report.failures.len(), 2);
		// Failures never stop the marker from advancing.
		assert_eq!(progress.read().await.unwrap(), Some(105));
	}

	#[tokio::test]
	async fn test_empty_range_leaves_marker_untouched() {
		let node = Arc::new(CountingNode::new(Vec::new()));
		let dir = tempfile::tempdir().unwrap();
		let (scheduler, progress) = scheduler_with(node, &dir, 2).await;

		let report = scheduler.run(200, 100).await.unwrap();

		assert_eq!(report.blocks_scanned, 0);
		assert_eq!(progress.read().await.unwrap(), None);
	}
}
