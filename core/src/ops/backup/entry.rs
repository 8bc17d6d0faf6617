//! The record that travels between the pipeline stages.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::{metadata::MetadataValue, repo::FileEntryRecord, snapshot::FileAttributes};

/// Sentinel for "no prior repository record" (a file new to this run).
pub const NO_PRIOR_RECORD: i64 = -1;
/// Sentinel for a file size that could not be read.
pub const UNKNOWN_SIZE: i64 = -1;

/// One regular file in flight between the classifier and the change detector.
///
/// Created by the classifier from an incoming path plus a repository lookup,
/// mutated exactly once by the change detector, then either moved to the
/// content scanner or dropped after an unmodified write. Move semantics keep
/// ownership strictly downstream; no entry is ever shared between stages.
#[derive(Debug, Clone)]
pub struct CandidateEntry {
	pub path: PathBuf,

	/// Prior repository record id, [`NO_PRIOR_RECORD`] for a new file.
	pub old_id: i64,
	/// Last write time recorded by the prior run; epoch when absent.
	pub old_modified: DateTime<Utc>,
	/// File size recorded by the prior run; [`UNKNOWN_SIZE`] when absent.
	pub last_file_size: i64,
	pub old_meta_hash: Option<String>,
	pub old_meta_size: i64,

	/// Last write time read this run; epoch when the read failed.
	pub last_write: DateTime<Utc>,
	/// Attributes read this run; defaults when the read failed.
	pub attributes: FileAttributes,

	/// This run's metadata digest, populated by the change detector.
	pub meta_hash_and_size: Option<MetadataValue>,
	/// Computed by the change detector.
	pub metadata_changed: bool,
}

impl CandidateEntry {
	pub(crate) fn new(
		path: PathBuf,
		prior: Option<FileEntryRecord>,
		last_write: DateTime<Utc>,
		attributes: FileAttributes,
	) -> Self {
		let (old_id, old_modified, last_file_size, old_meta_hash, old_meta_size) = match prior {
			Some(record) => (
				record.id,
				record.modified,
				record.file_size,
				record.metadata_hash,
				record.metadata_size,
			),
			None => (
				NO_PRIOR_RECORD,
				DateTime::UNIX_EPOCH,
				UNKNOWN_SIZE,
				None,
				UNKNOWN_SIZE,
			),
		};

		Self {
			path,
			old_id,
			old_modified,
			last_file_size,
			old_meta_hash,
			old_meta_size,
			last_write,
			attributes,
			meta_hash_and_size: None,
			metadata_changed: false,
		}
	}

	pub fn is_new_file(&self) -> bool {
		self.old_id < 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_entry_without_prior_record_uses_sentinels() {
		let entry = CandidateEntry::new(
			PathBuf::from("/data/new.txt"),
			None,
			Utc::now(),
			FileAttributes::default(),
		);

		assert!(entry.is_new_file());
		assert_eq!(entry.old_id, NO_PRIOR_RECORD);
		assert_eq!(entry.old_modified, DateTime::UNIX_EPOCH);
		assert_eq!(entry.last_file_size, UNKNOWN_SIZE);
		assert_eq!(entry.old_meta_hash, None);
		assert_eq!(entry.old_meta_size, UNKNOWN_SIZE);
	}

	#[test]
	fn test_entry_with_prior_record() {
		let modified = Utc::now();
		let entry = CandidateEntry::new(
			PathBuf::from("/data/old.txt"),
			Some(FileEntryRecord {
				id: 42,
				modified,
				file_size: 100,
				metadata_hash: Some("abc".to_string()),
				metadata_size: 2,
			}),
			modified,
			FileAttributes::default(),
		);

		assert!(!entry.is_new_file());
		assert_eq!(entry.old_id, 42);
		assert_eq!(entry.last_file_size, 100);
	}
}
