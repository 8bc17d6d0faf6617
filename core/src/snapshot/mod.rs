//! Filesystem snapshot abstraction.
//!
//! A [`Snapshot`] provides the filesystem reads the pipeline needs, and is
//! expected to stay consistent for the duration of one backup run (the
//! platform-specific machinery behind that — VSS, APFS snapshots — lives
//! outside this crate). Every read is independently failable; callers treat
//! failures as transient, log them, and continue with sentinel values.

mod local;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cairn_utils::FileIOError;

pub use local::LocalSnapshot;

#[derive(Error, Debug)]
pub enum SnapshotError {
	#[error(transparent)]
	FileIO(#[from] FileIOError),

	#[error("the backing filesystem does not record '{attribute}' for '{}'", path.display())]
	Unsupported {
		path: Box<Path>,
		attribute: &'static str,
	},
}

/// Attribute flags for one path, read without following symlinks.
///
/// Classification order is most specific first: symlink, then directory,
/// then regular file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttributes {
	pub is_symlink: bool,
	pub is_directory: bool,
	pub read_only: bool,
	pub hidden: bool,
	/// Unix permission bits, when the platform has them.
	pub unix_mode: Option<u32>,
	pub unix_uid: Option<u32>,
	pub unix_gid: Option<u32>,
}

impl FileAttributes {
	/// Textual flag list in the form stored into metadata sets, e.g.
	/// `"Directory, ReadOnly"`. A plain file with nothing set reads `"Normal"`.
	pub fn flag_string(&self) -> String {
		let mut flags = Vec::with_capacity(4);
		if self.is_symlink {
			flags.push("ReparsePoint");
		}
		if self.is_directory {
			flags.push("Directory");
		}
		if self.read_only {
			flags.push("ReadOnly");
		}
		if self.hidden {
			flags.push("Hidden");
		}
		if flags.is_empty() {
			"Normal".to_string()
		} else {
			flags.join(", ")
		}
	}
}

/// Filesystem reads against a point-in-time view of the disk.
#[async_trait]
pub trait Snapshot: Send + Sync {
	/// Last write timestamp of the path itself (symlinks are not followed).
	async fn last_write_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError>;

	/// Creation timestamp of the path itself.
	async fn created_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError>;

	/// Attribute flags of the path itself (symlinks are not followed).
	async fn attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError>;

	/// Attribute flags with symlinks resolved, for the `Follow` policy.
	async fn follow_attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError>;

	/// Target of a symlink, `Ok(None)` when the path is not a link.
	async fn symlink_target(&self, path: &Path) -> Result<Option<PathBuf>, SnapshotError>;

	/// Current byte length of a regular file.
	async fn file_size(&self, path: &Path) -> Result<u64, SnapshotError>;
}
