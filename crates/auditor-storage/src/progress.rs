//! Persisted progress marker: the block boundary a resumed run starts from.

use crate::StorageError;
use auditor_types::BlockNumber;
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

/// Single decimal block number in a text file, overwritten at end of run.
pub struct ProgressStore {
	path: PathBuf,
}

impl ProgressStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Reads the stored marker.
	///
	/// A missing file and unparseable contents both read as `None`; the
	/// caller falls back to its configured default start block.
	pub async fn read(&self) -> Result<Option<BlockNumber>, StorageError> {
		let contents = match fs::read_to_string(&self.path).await {
			Ok(contents) => contents,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		match contents.trim().parse::<BlockNumber>() {
			Ok(number) => Ok(Some(number)),
			Err(_) => {
				warn!("unparseable progress marker in {:?}, ignoring", self.path);
				Ok(None)
			}
		}
	}

	/// Overwrites the marker.
	///
	/// Writes a temp file then renames it over the target so a reader never
	/// observes a torn value.
	pub async fn write(&self, number: BlockNumber) -> Result<(), StorageError> {
		if let Some(parent) = self.path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent).await?;
			}
		}

		let temp_path = self.path.with_extension("tmp");
		fs::write(&temp_path, number.to_string()).await?;
		fs::rename(&temp_path, &self.path).await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::new(dir.path().join("last_processed_block.txt"));

		store.write(12345).await.unwrap();
		assert_eq!(store.read().await.unwrap(), Some(12345));

		// Overwrite, not append.
		store.write(67890).await.unwrap();
		assert_eq!(store.read().await.unwrap(), Some(67890));
	}

	#[tokio::test]
	async fn test_missing_file_reads_as_absent() {
		let dir = tempfile::tempdir().unwrap();
		let store = ProgressStore::new(dir.path().join("absent.txt"));

		assert_eq!(store.read().await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_corrupt_file_reads_as_absent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("corrupt.txt");
		std::fs::write(&path, "not-a-number").unwrap();

		let store = ProgressStore::new(path);
		assert_eq!(store.read().await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_no_temp_file_left_behind() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("marker.txt");
		let store = ProgressStore::new(path.clone());

		store.write(42).await.unwrap();
		assert!(path.exists());
		assert!(!path.with_extension("tmp").exists());
	}
}
