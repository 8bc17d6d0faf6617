//! Repository boundary.
//!
//! The repository owns the relational records of a backup run: file entries
//! carried over from prior runs, metadata-set registrations, and the
//! directory/symlink/unmodified rows this pipeline produces. Its schema and
//! storage engine live outside this crate; concurrent callers rely on the
//! repository to serialize its own writes.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A failed repository call, with enough context to diagnose from the log.
#[derive(Error, Debug)]
#[error("repository operation '{operation}' failed: {message}")]
pub struct RepositoryError {
	pub operation: &'static str,
	pub message: String,
}

impl RepositoryError {
	pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
		Self {
			operation,
			message: message.into(),
		}
	}
}

/// A file's state as recorded by the previous backup run.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntryRecord {
	pub id: i64,
	pub modified: DateTime<Utc>,
	pub file_size: i64,
	pub metadata_hash: Option<String>,
	pub metadata_size: i64,
}

#[async_trait]
pub trait Repository: Send + Sync {
	/// Prior-run record for a path, `Ok(None)` for a file never seen before.
	async fn get_file_entry(&self, path: &Path)
		-> Result<Option<FileEntryRecord>, RepositoryError>;

	/// Register a metadata set `(hash, size)` and return its identifier. A
	/// record is created per call even when the hash already exists; block
	/// dedup happens in the block store, not here.
	async fn add_metadata_set(&self, hash: &str, size: u64) -> Result<i64, RepositoryError>;

	async fn add_directory_entry(
		&self,
		path: &Path,
		metadata_set_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError>;

	async fn add_symlink_entry(
		&self,
		path: &Path,
		metadata_set_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError>;

	/// Carry a file's identity into the current run without re-hashing its
	/// content. `modified` is the timestamp read this run, so the next run's
	/// comparison still succeeds.
	async fn add_unmodified(
		&self,
		file_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError>;
}
