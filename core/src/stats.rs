//! Run-wide counters, updated atomically by every worker.
//!
//! The collector is injected into the pipeline as an `Arc` rather than held
//! as ambient global state, so two concurrent backup runs never share
//! counters. All counts are observational; nothing in the pipeline branches
//! on them.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct BackupStats {
	/// Paths ingested by the classifier stage, of any kind.
	processed_paths: AtomicU64,
	/// Regular files examined by the change detector.
	examined_files: AtomicU64,
	/// Bytes across examined files with a known size.
	examined_bytes: AtomicU64,
	/// Files recorded as unmodified instead of being forwarded.
	unmodified_files: AtomicU64,
	/// Files dropped by the skip-files-larger-than threshold.
	skipped_large_files: AtomicU64,
}

/// Point-in-time copy of the counters, for reporting and assertions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
	pub processed_paths: u64,
	pub examined_files: u64,
	pub examined_bytes: u64,
	pub unmodified_files: u64,
	pub skipped_large_files: u64,
}

impl BackupStats {
	pub fn add_processed_path(&self) {
		self.processed_paths.fetch_add(1, Ordering::Relaxed);
	}

	/// Record an examined file. A negative `size` means the size read failed;
	/// the file still counts, its bytes do not.
	pub fn add_examined_file(&self, size: i64) {
		self.examined_files.fetch_add(1, Ordering::Relaxed);
		if size > 0 {
			self.examined_bytes.fetch_add(size as u64, Ordering::Relaxed);
		}
	}

	pub fn add_unmodified_file(&self) {
		self.unmodified_files.fetch_add(1, Ordering::Relaxed);
	}

	pub fn add_skipped_large_file(&self) {
		self.skipped_large_files.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> StatsSnapshot {
		StatsSnapshot {
			processed_paths: self.processed_paths.load(Ordering::Relaxed),
			examined_files: self.examined_files.load(Ordering::Relaxed),
			examined_bytes: self.examined_bytes.load(Ordering::Relaxed),
			unmodified_files: self.unmodified_files.load(Ordering::Relaxed),
			skipped_large_files: self.skipped_large_files.load(Ordering::Relaxed),
		}
	}
}
