//! Metadata sets: generation, canonical serialization, content addressing.
//!
//! A metadata set is a string-to-string mapping captured per path, serialized
//! to a canonical JSON blob and addressed by its blake3 digest. Two paths
//! with identical metadata therefore produce the same block hash, which is
//! the whole dedup mechanism: the block store treats a repeated hash as a
//! no-op write.

use std::{collections::BTreeMap, path::Path};

use bytes::Bytes;
use tracing::warn;

use crate::snapshot::{FileAttributes, Snapshot};

/// Attribute flag list, e.g. `"Directory, Hidden"`.
pub const ATTRIBUTES_KEY: &str = "CoreAttributes";
/// Last write timestamp, RFC 3339.
pub const LAST_WRITE_TIME_KEY: &str = "CoreLastWritetime";
/// Creation timestamp, RFC 3339.
pub const CREATE_TIME_KEY: &str = "CoreCreatetime";
/// Target path of a stored symlink.
pub const SYMLINK_TARGET_KEY: &str = "CoreSymlinkTarget";
/// Unix permission bits, octal.
pub const UNIX_MODE_KEY: &str = "unix:mode";
pub const UNIX_UID_KEY: &str = "unix:uid";
pub const UNIX_GID_KEY: &str = "unix:gid";

/// A serialized metadata set together with its content address.
///
/// Invariant: `size` never exceeds the configured block size — metadata sets
/// are stored in exactly one block, enforced before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataValue {
	pub blob: Bytes,
	/// Lower-hex blake3 digest of `blob`.
	pub hash: String,
	pub size: u64,
}

/// Serialize and hash a metadata mapping.
///
/// The mapping is a `BTreeMap`, so serialization order is deterministic and
/// equal mappings yield byte-identical blobs and equal hashes.
pub fn wrap_metadata(metadata: &BTreeMap<String, String>) -> MetadataValue {
	let blob = serde_json::to_vec(metadata).expect("string map serialization cannot fail");
	let hash = blake3::hash(&blob).to_hex().to_string();
	let size = blob.len() as u64;

	MetadataValue {
		blob: Bytes::from(blob),
		hash,
		size,
	}
}

/// The metadata value used for every path when metadata storage is disabled.
pub fn empty_metadata() -> MetadataValue {
	wrap_metadata(&BTreeMap::new())
}

/// Collect the metadata mapping for one path.
///
/// Reads degrade independently: a failed timestamp read logs a warning and
/// leaves the key out rather than failing the path.
pub async fn generate_metadata(
	path: &Path,
	attributes: FileAttributes,
	snapshot: &dyn Snapshot,
) -> BTreeMap<String, String> {
	let mut metadata = BTreeMap::new();

	metadata.insert(ATTRIBUTES_KEY.to_string(), attributes.flag_string());

	match snapshot.last_write_time_utc(path).await {
		Ok(last_write) => {
			metadata.insert(LAST_WRITE_TIME_KEY.to_string(), last_write.to_rfc3339());
		}
		Err(e) => warn!(
			"failed to read last write time for metadata of '{}': {e}",
			path.display()
		),
	}

	match snapshot.created_time_utc(path).await {
		Ok(created) => {
			metadata.insert(CREATE_TIME_KEY.to_string(), created.to_rfc3339());
		}
		Err(e) => warn!(
			"failed to read creation time for metadata of '{}': {e}",
			path.display()
		),
	}

	if let Some(mode) = attributes.unix_mode {
		metadata.insert(UNIX_MODE_KEY.to_string(), format!("{mode:o}"));
	}
	if let Some(uid) = attributes.unix_uid {
		metadata.insert(UNIX_UID_KEY.to_string(), uid.to_string());
	}
	if let Some(gid) = attributes.unix_gid {
		metadata.insert(UNIX_GID_KEY.to_string(), gid.to_string());
	}

	metadata
}
