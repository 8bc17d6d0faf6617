//! Items of the block output stream.
//!
//! Blocks are opaque to this crate; the content-addressed store deduplicates
//! them by hash, so emitting the same content twice costs nothing beyond the
//! send itself.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Advice for the compression stage downstream of the block store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionHint {
	Compressible,
	Incompressible,
}

/// One content-addressed block on its way to persistent storage.
#[derive(Debug, Clone)]
pub struct DataBlock {
	/// Lower-hex blake3 digest of `blob`; the block's content address.
	pub hash: String,
	pub blob: Bytes,
	pub size: u64,
	pub hint: CompressionHint,
	/// Set when the payload is already compressed and should be stored as-is.
	pub is_precompressed: bool,
}

impl DataBlock {
	/// Block carrying a serialized metadata set. Metadata is JSON, so it is
	/// always worth compressing.
	pub fn for_metadata(hash: String, blob: Bytes) -> Self {
		let size = blob.len() as u64;
		Self {
			hash,
			blob,
			size,
			hint: CompressionHint::Compressible,
			is_precompressed: false,
		}
	}
}
