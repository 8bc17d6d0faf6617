//! ChangeDetector stage.
//!
//! Consumes candidate entries and makes the one decision this crate exists
//! for: does the file's content need to be re-scanned, or can the prior
//! run's record be carried forward untouched? Content hashing is the
//! expensive step downstream; a file whose timestamp, size and metadata all
//! match the prior run is never re-hashed, no matter how large it is.

use std::sync::Arc;

use async_channel as chan;
use chrono::{DateTime, Utc};
use tracing::{debug, error, trace, warn};

use crate::{
	config::BackupOptions,
	error::BackupError,
	metadata::{generate_metadata, wrap_metadata, MetadataValue},
};

use super::{entry::UNKNOWN_SIZE, CandidateEntry, StageContext};

/// The four booleans behind the forward-or-skip decision, kept separate from
/// the I/O so the decision table is unit-testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ChangeSignals {
	pub timestamp_changed: bool,
	pub filesize_changed: bool,
	pub metadata_changed: bool,
	pub too_large: bool,
}

impl ChangeSignals {
	pub(super) fn evaluate(
		entry: &CandidateEntry,
		current_size: i64,
		current_metadata: &MetadataValue,
		options: &BackupOptions,
	) -> Self {
		let epoch = DateTime::<Utc>::UNIX_EPOCH;

		// An unknown timestamp on either side always counts as changed
		let timestamp_changed = entry.last_write != entry.old_modified
			|| entry.last_write == epoch
			|| entry.old_modified == epoch;

		let filesize_changed = current_size < 0
			|| entry.last_file_size < 0
			|| current_size != entry.last_file_size;

		let too_large = options.skip_large_files_enabled()
			&& current_size >= 0
			&& current_size > options.skip_files_larger_than;

		let metadata_changed = !options.skip_metadata
			&& (current_metadata.size as i64 != entry.old_meta_size
				|| entry.old_meta_hash.as_deref() != Some(current_metadata.hash.as_str()));

		Self {
			timestamp_changed,
			filesize_changed,
			metadata_changed,
			too_large,
		}
	}

	pub(super) fn should_forward(&self, entry: &CandidateEntry, options: &BackupOptions) -> bool {
		(entry.is_new_file()
			|| options.disable_filetime_check
			|| self.timestamp_changed
			|| self.filesize_changed
			|| self.metadata_changed)
			&& !self.too_large
	}
}

/// One change-detector worker. Multiple workers may share the same channels.
pub(super) async fn run(
	ctx: Arc<StageContext>,
	candidate_rx: chan::Receiver<CandidateEntry>,
	changed_tx: chan::Sender<CandidateEntry>,
) -> Result<(), BackupError> {
	while let Ok(mut entry) = candidate_rx.recv().await {
		// One size read serves the decision, the stats collector and the
		// skip log below.
		let current_size = match ctx.snapshot.file_size(&entry.path).await {
			Ok(size) => i64::try_from(size).unwrap_or(i64::MAX),
			Err(e) => {
				warn!("failed to read size of '{}': {e}", entry.path.display());
				UNKNOWN_SIZE
			}
		};
		ctx.stats.add_examined_file(current_size);

		let current_metadata = if ctx.options.store_metadata {
			wrap_metadata(
				&generate_metadata(&entry.path, entry.attributes, ctx.snapshot.as_ref()).await,
			)
		} else {
			ctx.empty_metadata.clone()
		};

		let signals = ChangeSignals::evaluate(&entry, current_size, &current_metadata, &ctx.options);
		entry.metadata_changed = signals.metadata_changed;
		entry.meta_hash_and_size = Some(current_metadata);

		if signals.should_forward(&entry, &ctx.options) {
			trace!("submitting '{}' for content scanning", entry.path.display());
			if changed_tx.send(entry).await.is_err() {
				error!("changed-file channel closed, stopping change detector");
				break;
			}
			continue;
		}

		if signals.too_large {
			debug!(
				"skipping '{}': size {current_size} is over the skip-files-larger-than limit of {}",
				entry.path.display(),
				ctx.options.skip_files_larger_than
			);
			ctx.stats.add_skipped_large_file();
		} else {
			trace!(
				"skipping '{}': timestamp, size and metadata are unchanged",
				entry.path.display()
			);
			ctx.stats.add_unmodified_file();
		}

		if entry.is_new_file() {
			// A brand-new file over the size limit has no identity to carry
			// forward.
			debug!(
				"no prior record to mark unmodified for '{}'",
				entry.path.display()
			);
		} else if let Err(e) = ctx
			.repository
			.add_unmodified(entry.old_id, entry.last_write)
			.await
		{
			error!(
				"failed to record '{}' as unmodified: {e}",
				entry.path.display()
			);
		}
	}

	Ok(())
}
