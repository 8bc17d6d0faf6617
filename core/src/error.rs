//! Error taxonomy for the pipeline.
//!
//! Transient filesystem read failures never surface here; they are logged at
//! the call site and replaced by sentinel values. `BackupError` only carries
//! the conditions that abort a stage, plus the per-item repository failures
//! that the stages log and drop.

use std::path::Path;

use thiserror::Error;

use crate::repo::RepositoryError;

#[derive(Error, Debug)]
pub enum BackupError {
	/// A metadata set must fit in exactly one block. Exceeding the block size
	/// signals a caller-level bug or misconfiguration and aborts the stage.
	#[error(
		"metadata set for '{}' is {size} bytes, exceeding the configured block size of {block_size} bytes",
		path.display()
	)]
	MetadataBlockTooLarge {
		path: Box<Path>,
		size: u64,
		block_size: u64,
	},

	/// The block output channel was closed while entries still needed blocks
	/// persisted. Input closure is the only cooperative shutdown signal, so
	/// this is an error, not a cancellation.
	#[error("block output channel closed while the pipeline was still producing")]
	BlockChannelClosed,

	#[error("backup worker panicked: {0}")]
	WorkerPanicked(String),

	#[error(transparent)]
	Repository(#[from] RepositoryError),
}

impl BackupError {
	/// Whether this error must abort the stage instead of being logged and
	/// skipped with the offending item.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			Self::MetadataBlockTooLarge { .. } | Self::BlockChannelClosed | Self::WorkerPanicked(_)
		)
	}
}
