use auditor_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
	#[error("storage error: {0}")]
	Storage(#[from] StorageError),

	#[error("verification task failed: {0}")]
	Join(#[from] tokio::task::JoinError),

	#[error("scheduler error: {0}")]
	Scheduler(String),
}
