//! Configuration for a backup run.
//!
//! Options are read-only for the lifetime of a pipeline. Everything here is
//! serde-friendly so a run configuration can be loaded from the engine's
//! config file or constructed in code.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Default maximum payload length of a single stored block (100 KiB).
pub const DEFAULT_BLOCK_SIZE: u64 = 100 * 1024;

const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// How reparse points (symlinks and friends) are treated during classification.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SymlinkPolicy {
	/// Drop the path entirely: no block, no repository entry.
	Ignore,
	/// Record the link itself as a metadata set carrying its target path.
	#[default]
	Store,
	/// Classify the path as whatever the link resolves to.
	Follow,
}

/// Read-only options for one backup run.
///
/// `skip_files_larger_than` follows the engine's convention that `0` and
/// `i64::MAX` both mean "disabled".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupOptions {
	/// Maximum payload length of a single stored block, in bytes. Metadata
	/// sets must always fit in one block.
	pub block_size: u64,
	/// Generate and store filesystem metadata sets for each entry.
	pub store_metadata: bool,
	/// Leave metadata out of the change-detection decision.
	pub skip_metadata: bool,
	pub symlink_policy: SymlinkPolicy,
	/// Treat every file as changed regardless of its recorded timestamp.
	pub disable_filetime_check: bool,
	/// Files above this size are not handed to the content scanner.
	pub skip_files_larger_than: i64,
	/// Classifier worker fan-out.
	pub classifier_workers: usize,
	/// ChangeDetector worker fan-out.
	pub change_detector_workers: usize,
	/// Capacity of the bounded channels between stages; this is the
	/// backpressure window.
	pub channel_capacity: usize,
}

impl Default for BackupOptions {
	fn default() -> Self {
		Self {
			block_size: DEFAULT_BLOCK_SIZE,
			store_metadata: true,
			skip_metadata: false,
			symlink_policy: SymlinkPolicy::default(),
			disable_filetime_check: false,
			skip_files_larger_than: 0,
			classifier_workers: 1,
			change_detector_workers: 1,
			channel_capacity: DEFAULT_CHANNEL_CAPACITY,
		}
	}
}

impl BackupOptions {
	/// Whether the large-file skip is active at all.
	pub fn skip_large_files_enabled(&self) -> bool {
		self.skip_files_larger_than > 0 && self.skip_files_larger_than != i64::MAX
	}
}
