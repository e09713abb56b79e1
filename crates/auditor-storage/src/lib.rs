//! Durable state for the auditor: the resumable progress marker and the
//! append-only failure log.

use thiserror::Error;

mod failure_log;
mod progress;

pub use failure_log::FailureLog;
pub use progress::ProgressStore;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
