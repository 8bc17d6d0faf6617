//! # Cairn Core
//!
//! The change-detection and metadata-dedup stage of the cairn backup engine.
//!
//! Given a stream of filesystem paths, this crate decides, per path, whether
//! the path's content needs to be re-scanned and re-hashed this run. Directory
//! and symlink metadata is written straight into content-addressed storage
//! without further scanning; regular files are compared against their prior
//! backup-run state and either forwarded to the content-scanning stage or
//! recorded as unmodified.
//!
//! The crate deliberately does not own the filesystem snapshot machinery, the
//! repository schema, or the content chunking/hashing of regular file bytes.
//! Those are collaborators behind the [`snapshot::Snapshot`] and
//! [`repo::Repository`] traits and the block output channel.

pub mod block;
pub mod config;
pub mod error;
pub mod metadata;
pub mod ops;
pub mod repo;
pub mod snapshot;
pub mod stats;

pub use block::{CompressionHint, DataBlock};
pub use config::{BackupOptions, SymlinkPolicy};
pub use error::BackupError;
pub use ops::backup::{BackupPipeline, CandidateEntry};
pub use stats::BackupStats;
