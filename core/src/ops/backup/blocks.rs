//! Shared metadata-block write protocol.
//!
//! Both directory and symlink entries persist their metadata set the same
//! way: size check, block write, metadata-set registration, repository entry.
//! Within one path this sequence is strictly ordered.

use std::path::Path;

use async_channel as chan;
use chrono::{DateTime, Utc};

use crate::{block::DataBlock, error::BackupError, metadata::MetadataValue};

use super::StageContext;

pub(super) enum MetadataEntryKind {
	Directory,
	Symlink,
}

/// Write one metadata set as a content-addressed block plus its repository
/// entry.
///
/// A metadata set must fit in exactly one block; a blob over the block size
/// is rejected before anything is written and aborts the stage. The block
/// store deduplicates by hash, so re-sending known content is a no-op there,
/// while `add_metadata_set` registers a record per call.
pub(super) async fn write_metadata_entry(
	ctx: &StageContext,
	block_tx: &chan::Sender<DataBlock>,
	path: &Path,
	kind: MetadataEntryKind,
	metadata: MetadataValue,
	modified: DateTime<Utc>,
) -> Result<(), BackupError> {
	if metadata.size > ctx.options.block_size {
		return Err(BackupError::MetadataBlockTooLarge {
			path: path.into(),
			size: metadata.size,
			block_size: ctx.options.block_size,
		});
	}

	let MetadataValue { blob, hash, size } = metadata;

	block_tx
		.send(DataBlock::for_metadata(hash.clone(), blob))
		.await
		.map_err(|_| BackupError::BlockChannelClosed)?;

	let metadata_set_id = ctx.repository.add_metadata_set(&hash, size).await?;

	match kind {
		MetadataEntryKind::Directory => {
			ctx.repository
				.add_directory_entry(path, metadata_set_id, modified)
				.await?
		}
		MetadataEntryKind::Symlink => {
			ctx.repository
				.add_symlink_entry(path, metadata_set_id, modified)
				.await?
		}
	}

	Ok(())
}
