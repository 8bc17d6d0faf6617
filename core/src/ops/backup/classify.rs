//! Classifier stage.
//!
//! Consumes raw paths, reads their attributes and timestamp with per-item
//! fault isolation, and dispatches: symlinks and directories are written to
//! content-addressed storage right here and never travel further; regular
//! files are paired with their prior-run record and forwarded as candidates.

use std::{path::PathBuf, sync::Arc};

use async_channel as chan;
use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use cairn_utils::NonUtf8PathError;

use crate::{
	block::DataBlock,
	config::SymlinkPolicy,
	error::BackupError,
	metadata::{generate_metadata, wrap_metadata, SYMLINK_TARGET_KEY},
	snapshot::FileAttributes,
};

use super::{
	blocks::{write_metadata_entry, MetadataEntryKind},
	CandidateEntry, StageContext,
};

/// One classifier worker. Multiple workers may share the same channels.
///
/// Terminates when the path channel is closed and drained, dropping its
/// sender clones so closure propagates downstream. Only integrity violations
/// abort the stage; everything else is logged per path and skipped.
pub(super) async fn run(
	ctx: Arc<StageContext>,
	path_rx: chan::Receiver<PathBuf>,
	candidate_tx: chan::Sender<CandidateEntry>,
	block_tx: chan::Sender<DataBlock>,
) -> Result<(), BackupError> {
	while let Ok(path) = path_rx.recv().await {
		ctx.stats.add_processed_path();

		// Timestamp and attributes are read independently; either may fail
		// without dropping the path.
		let last_write = match ctx.snapshot.last_write_time_utc(&path).await {
			Ok(last_write) => last_write,
			Err(e) => {
				warn!(
					"failed to read last write time of '{}': {e}",
					path.display()
				);
				DateTime::UNIX_EPOCH
			}
		};

		let mut attributes = match ctx.snapshot.attributes(&path).await {
			Ok(attributes) => attributes,
			Err(e) => {
				warn!("failed to read attributes of '{}': {e}", path.display());
				FileAttributes::default()
			}
		};

		if attributes.is_symlink {
			match ctx.options.symlink_policy {
				SymlinkPolicy::Ignore => {
					debug!("ignoring symlink '{}'", path.display());
					continue;
				}
				SymlinkPolicy::Store => {
					match store_symlink(&ctx, &block_tx, &path, attributes, last_write).await {
						Ok(()) => {}
						Err(e) if e.is_fatal() => return Err(e),
						Err(e) => {
							error!("failed to store symlink '{}': {e}", path.display())
						}
					}
					continue;
				}
				SymlinkPolicy::Follow => {
					// The link is classified as whatever it points at. A
					// broken link keeps its own attributes and falls through
					// to the regular-file path.
					match ctx.snapshot.follow_attributes(&path).await {
						Ok(resolved) => attributes = resolved,
						Err(e) => {
							warn!("failed to resolve symlink '{}': {e}", path.display())
						}
					}
				}
			}
		}

		if attributes.is_directory {
			let metadata = if ctx.options.store_metadata {
				wrap_metadata(&generate_metadata(&path, attributes, ctx.snapshot.as_ref()).await)
			} else {
				ctx.empty_metadata.clone()
			};

			debug!("adding directory '{}'", path.display());
			match write_metadata_entry(
				&ctx,
				&block_tx,
				&path,
				MetadataEntryKind::Directory,
				metadata,
				last_write,
			)
			.await
			{
				Ok(()) => {}
				Err(e) if e.is_fatal() => return Err(e),
				Err(e) => error!("failed to record directory '{}': {e}", path.display()),
			}
			continue;
		}

		// Regular file: pair with the prior-run record and hand downstream
		let prior = match ctx.repository.get_file_entry(&path).await {
			Ok(prior) => prior,
			Err(e) => {
				error!("prior record lookup failed for '{}': {e}", path.display());
				continue;
			}
		};

		let entry = CandidateEntry::new(path, prior, last_write, attributes);
		if candidate_tx.send(entry).await.is_err() {
			// A closed downstream is permanent; stop instead of failing every
			// remaining path one by one.
			error!("candidate channel closed, stopping classifier");
			break;
		}
	}

	Ok(())
}

/// Store-policy symlink handling: metadata (with the link target folded in)
/// becomes the entry's entire content.
async fn store_symlink(
	ctx: &StageContext,
	block_tx: &chan::Sender<DataBlock>,
	path: &std::path::Path,
	attributes: FileAttributes,
	last_write: DateTime<Utc>,
) -> Result<(), BackupError> {
	let mut metadata = generate_metadata(path, attributes, ctx.snapshot.as_ref()).await;

	if !metadata.contains_key(SYMLINK_TARGET_KEY) {
		match ctx.snapshot.symlink_target(path).await {
			Ok(Some(target)) => match target.to_str() {
				Some(target) if !target.trim().is_empty() => {
					metadata.insert(SYMLINK_TARGET_KEY.to_string(), target.to_string());
				}
				Some(_) => debug!("symlink '{}' has an empty target", path.display()),
				None => warn!(
					"dropping symlink target from metadata of '{}': {}",
					path.display(),
					NonUtf8PathError(target.clone().into_boxed_path())
				),
			},
			Ok(None) => debug!(
				"'{}' no longer reads as a symlink, storing without target",
				path.display()
			),
			Err(e) => warn!(
				"failed to read symlink target of '{}': {e}",
				path.display()
			),
		}
	}

	debug!("storing symlink '{}'", path.display());
	write_metadata_entry(
		ctx,
		block_tx,
		path,
		MetadataEntryKind::Symlink,
		wrap_metadata(&metadata),
		last_write,
	)
	.await
}
