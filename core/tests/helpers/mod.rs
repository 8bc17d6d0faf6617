//! Test doubles and plumbing shared by the integration tests.

// Not every test binary exercises every helper
#![allow(dead_code)]

use std::{
	collections::HashMap,
	path::{Path, PathBuf},
	sync::{Arc, Mutex},
};

use async_channel as chan;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use cairn_core::{
	repo::{FileEntryRecord, Repository, RepositoryError},
	snapshot::{FileAttributes, Snapshot, SnapshotError},
	BackupOptions, BackupPipeline, BackupStats, CandidateEntry, DataBlock,
};
use cairn_utils::FileIOError;

/// A timestamp far from the epoch sentinel.
pub fn known_time() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

/// One entry of the in-memory filesystem picture.
#[derive(Debug, Clone, Default)]
pub struct FakeEntry {
	pub attributes: FileAttributes,
	/// Attributes seen when resolving through a symlink; `None` makes the
	/// follow read fail (broken link).
	pub follow_attributes: Option<FileAttributes>,
	/// `None` makes the timestamp read fail.
	pub last_write: Option<DateTime<Utc>>,
	pub created: Option<DateTime<Utc>>,
	/// `None` makes the size read fail.
	pub size: Option<u64>,
	pub symlink_target: Option<PathBuf>,
}

impl FakeEntry {
	pub fn file(size: u64, last_write: DateTime<Utc>) -> Self {
		Self {
			attributes: FileAttributes::default(),
			follow_attributes: None,
			last_write: Some(last_write),
			created: Some(last_write),
			size: Some(size),
			symlink_target: None,
		}
	}

	pub fn directory(last_write: DateTime<Utc>) -> Self {
		Self {
			attributes: FileAttributes {
				is_directory: true,
				..Default::default()
			},
			last_write: Some(last_write),
			created: Some(last_write),
			..Default::default()
		}
	}

	pub fn symlink(target: impl Into<PathBuf>, last_write: DateTime<Utc>) -> Self {
		Self {
			attributes: FileAttributes {
				is_symlink: true,
				..Default::default()
			},
			last_write: Some(last_write),
			created: Some(last_write),
			symlink_target: Some(target.into()),
			..Default::default()
		}
	}
}

/// Snapshot double backed by a path map. Absent paths and `None` fields
/// produce read failures, which is how the fault-isolation tests poke the
/// sentinel paths.
#[derive(Debug, Default)]
pub struct MemorySnapshot {
	entries: HashMap<PathBuf, FakeEntry>,
}

impl MemorySnapshot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, path: impl Into<PathBuf>, entry: FakeEntry) -> Self {
		self.entries.insert(path.into(), entry);
		self
	}

	fn get(&self, path: &Path) -> Result<&FakeEntry, SnapshotError> {
		self.entries
			.get(path)
			.ok_or_else(|| not_found(path, "no such entry"))
	}
}

fn not_found(path: &Path, context: &str) -> SnapshotError {
	FileIOError::from_std_io_err_with_msg(
		path,
		std::io::Error::new(std::io::ErrorKind::NotFound, "simulated read failure"),
		context,
	)
	.into()
}

#[async_trait]
impl Snapshot for MemorySnapshot {
	async fn last_write_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError> {
		self.get(path)?
			.last_write
			.ok_or_else(|| not_found(path, "mtime"))
	}

	async fn created_time_utc(&self, path: &Path) -> Result<DateTime<Utc>, SnapshotError> {
		self.get(path)?
			.created
			.ok_or_else(|| not_found(path, "created"))
	}

	async fn attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError> {
		self.get(path).map(|entry| entry.attributes)
	}

	async fn follow_attributes(&self, path: &Path) -> Result<FileAttributes, SnapshotError> {
		let entry = self.get(path)?;
		if entry.attributes.is_symlink {
			entry
				.follow_attributes
				.ok_or_else(|| not_found(path, "broken link"))
		} else {
			Ok(entry.attributes)
		}
	}

	async fn symlink_target(&self, path: &Path) -> Result<Option<PathBuf>, SnapshotError> {
		self.get(path).map(|entry| entry.symlink_target.clone())
	}

	async fn file_size(&self, path: &Path) -> Result<u64, SnapshotError> {
		self.get(path)?.size.ok_or_else(|| not_found(path, "size"))
	}
}

/// Repository double that records every write for assertions.
#[derive(Debug, Default)]
pub struct MemoryRepository {
	pub prior_entries: Mutex<HashMap<PathBuf, FileEntryRecord>>,
	pub metadata_sets: Mutex<Vec<(String, u64)>>,
	pub directories: Mutex<Vec<(PathBuf, i64, DateTime<Utc>)>>,
	pub symlinks: Mutex<Vec<(PathBuf, i64, DateTime<Utc>)>>,
	pub unmodified: Mutex<Vec<(i64, DateTime<Utc>)>>,
}

impl MemoryRepository {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_prior(self, path: impl Into<PathBuf>, record: FileEntryRecord) -> Self {
		self.prior_entries
			.lock()
			.unwrap()
			.insert(path.into(), record);
		self
	}
}

#[async_trait]
impl Repository for MemoryRepository {
	async fn get_file_entry(
		&self,
		path: &Path,
	) -> Result<Option<FileEntryRecord>, RepositoryError> {
		Ok(self.prior_entries.lock().unwrap().get(path).cloned())
	}

	async fn add_metadata_set(&self, hash: &str, size: u64) -> Result<i64, RepositoryError> {
		let mut sets = self.metadata_sets.lock().unwrap();
		sets.push((hash.to_string(), size));
		Ok(sets.len() as i64)
	}

	async fn add_directory_entry(
		&self,
		path: &Path,
		metadata_set_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError> {
		self.directories
			.lock()
			.unwrap()
			.push((path.to_path_buf(), metadata_set_id, modified));
		Ok(())
	}

	async fn add_symlink_entry(
		&self,
		path: &Path,
		metadata_set_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError> {
		self.symlinks
			.lock()
			.unwrap()
			.push((path.to_path_buf(), metadata_set_id, modified));
		Ok(())
	}

	async fn add_unmodified(
		&self,
		file_id: i64,
		modified: DateTime<Utc>,
	) -> Result<(), RepositoryError> {
		self.unmodified.lock().unwrap().push((file_id, modified));
		Ok(())
	}
}

/// Opt-in log output while debugging tests: `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.try_init();
}

/// Everything a finished pipeline run produced.
pub struct RunOutput {
	pub changed: Vec<CandidateEntry>,
	pub blocks: Vec<DataBlock>,
	pub result: Result<(), cairn_core::BackupError>,
	pub stats: Arc<BackupStats>,
}

/// Drive a full pipeline run: feed `paths`, drain both outputs, shut down.
pub async fn run_pipeline(
	snapshot: Arc<dyn Snapshot>,
	repository: Arc<dyn Repository>,
	options: BackupOptions,
	paths: impl IntoIterator<Item = &str>,
) -> RunOutput {
	init_tracing();

	let stats = Arc::new(BackupStats::default());
	let pipeline = BackupPipeline::spawn(snapshot, repository, options, Arc::clone(&stats));

	let changed = tokio::spawn(drain(pipeline.changed_files()));
	let blocks = tokio::spawn(drain(pipeline.blocks()));

	let path_tx = pipeline.path_sender();
	for path in paths {
		path_tx
			.send(PathBuf::from(path))
			.await
			.expect("pipeline accepts paths while running");
	}
	path_tx.close();

	let result = pipeline.shutdown().await;

	RunOutput {
		changed: changed.await.expect("drain task"),
		blocks: blocks.await.expect("drain task"),
		result,
		stats,
	}
}

async fn drain<T>(rx: chan::Receiver<T>) -> Vec<T> {
	let mut items = Vec::new();
	while let Ok(item) = rx.recv().await {
		items.push(item);
	}
	items
}
