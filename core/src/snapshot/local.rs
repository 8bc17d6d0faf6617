//! Live local-filesystem snapshot.
//!
//! A thin wrapper around `tokio::fs` with no consistency guarantees beyond
//! what the OS gives us. Real deployments substitute a point-in-time
//! implementation; this one also backs the integration tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;

use cairn_utils::FileIOError;

use super::{FileAttributes, Snapshot, SnapshotError};

#[derive(Debug, Clone)]
pub struct LocalSnapshot {
	/// Root of the backup source; relative paths resolve against it.
	root: PathBuf,
}

impl LocalSnapshot {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn resolve_path(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		}
	}

	fn attributes_from_metadata(path: &Path, metadata: &std::fs::Metadata) -> FileAttributes {
		let (unix_mode, unix_uid, unix_gid) = unix_ownership(metadata);

		FileAttributes {
			is_symlink: metadata.file_type().is_symlink(),
			is_directory: metadata.is_dir(),
			read_only: metadata.permissions().readonly(),
			hidden: is_hidden(path),
			unix_mode,
			unix_uid,
			unix_gid,
		}
	}
}

#[cfg(unix)]
fn unix_ownership(metadata: &std::fs::Metadata) -> (Option<u32>, Option<u32>, Option<u32>) {
	use std::os::unix::fs::MetadataExt;
	(
		Some(metadata.mode()),
		Some(metadata.uid()),
		Some(metadata.gid()),
	)
}

#[cfg(not(unix))]
fn unix_ownership(_metadata: &std::fs::Metadata) -> (Option<u32>, Option<u32>, Option<u32>) {
	(None, None, None)
}

fn is_hidden(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.map(|name| name.starts_with('.'))
		.unwrap_or(false)
}

#[async_trait]
impl Snapshot for LocalSnapshot {
	async fn last_write_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::symlink_metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from((full_path.as_path(), e)))?;

		let modified = metadata
			.modified()
			.map_err(|e| FileIOError::from_std_io_err_with_msg(&full_path, e, "read mtime"))?;

		Ok(modified.into())
	}

	async fn created_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::symlink_metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from((full_path.as_path(), e)))?;

		// Not every filesystem records birth times (notably some Linux ones)
		metadata
			.created()
			.map(Into::into)
			.map_err(|_| SnapshotError::Unsupported {
				path: full_path.into_boxed_path(),
				attribute: "created",
			})
	}

	async fn attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::symlink_metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from((full_path.as_path(), e)))?;

		Ok(Self::attributes_from_metadata(&full_path, &metadata))
	}

	async fn follow_attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from_std_io_err_with_msg(&full_path, e, "follow symlink"))?;

		Ok(Self::attributes_from_metadata(&full_path, &metadata))
	}

	async fn symlink_target(&self, path: &Path) -> Result<Option<PathBuf>, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::symlink_metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from((full_path.as_path(), e)))?;

		if !metadata.file_type().is_symlink() {
			return Ok(None);
		}

		fs::read_link(&full_path)
			.await
			.map(Some)
			.map_err(|e| FileIOError::from_std_io_err_with_msg(&full_path, e, "read link").into())
	}

	async fn file_size(&self, path: &Path) -> Result<u64, SnapshotError> {
		let full_path = self.resolve_path(path);
		let metadata = fs::metadata(&full_path)
			.await
			.map_err(|e| FileIOError::from((full_path.as_path(), e)))?;

		Ok(metadata.len())
	}
}
