//! Append-only CSV log of transactions that failed verification.

use crate::StorageError;
use auditor_types::FailureRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Durable record of every failed transaction, one CSV line per record,
/// no header row. Prior lines are never rewritten or truncated.
///
/// Appends from concurrent block tasks are serialized through a mutex so a
/// line is always written whole.
pub struct FailureLog {
	path: PathBuf,
	writer: Mutex<File>,
}

impl FailureLog {
	/// Opens the log for appending, creating it if necessary.
	pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
		let path = path.into();
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}

		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&path)
			.await?;

		Ok(Self {
			path,
			writer: Mutex::new(file),
		})
	}

	/// Appends one record as a single line, flushed before the lock drops.
	pub async fn append(&self, record: &FailureRecord) -> Result<(), StorageError> {
		let line = format!("{}\n", record.csv_line());

		let mut writer = self.writer.lock().await;
		writer.write_all(line.as_bytes()).await?;
		writer.flush().await?;

		Ok(())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}
