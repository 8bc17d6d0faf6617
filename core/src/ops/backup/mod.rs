//! The backup pipeline: `paths → Classifier → ChangeDetector → [scanner]`.
//!
//! Stages are tokio tasks talking over bounded `async-channel` channels; a
//! full downstream queue throttles the whole pipeline instead of buffering
//! without limit. Closing the path channel is the only cancellation signal:
//! workers finish their in-flight item, observe the closed+drained input,
//! and drop their senders so closure propagates stage to stage.

mod blocks;
mod change_detect;
mod classify;
mod entry;

pub use entry::{CandidateEntry, NO_PRIOR_RECORD, UNKNOWN_SIZE};

use std::{path::PathBuf, sync::Arc};

use async_channel as chan;
use tokio::task::JoinHandle;

use crate::{
	block::DataBlock,
	config::BackupOptions,
	error::BackupError,
	metadata::{empty_metadata, MetadataValue},
	repo::Repository,
	snapshot::Snapshot,
	stats::BackupStats,
};

/// Everything a stage worker needs, shared read-only across all workers of
/// one run.
pub(crate) struct StageContext {
	pub snapshot: Arc<dyn Snapshot>,
	pub repository: Arc<dyn Repository>,
	pub options: BackupOptions,
	pub stats: Arc<BackupStats>,
	/// Wrapped empty mapping, computed once per run and shared by every path
	/// that skips metadata generation.
	pub empty_metadata: MetadataValue,
}

/// A running pipeline.
///
/// Feed paths through [`BackupPipeline::path_sender`], consume
/// [`BackupPipeline::changed_files`] and [`BackupPipeline::blocks`]
/// concurrently (the channels are bounded; an undrained output eventually
/// stalls the run — that is the backpressure contract, not a bug), then close
/// the path channel and await [`BackupPipeline::shutdown`].
pub struct BackupPipeline {
	path_tx: chan::Sender<PathBuf>,
	changed_rx: chan::Receiver<CandidateEntry>,
	block_rx: chan::Receiver<DataBlock>,
	workers: Vec<JoinHandle<Result<(), BackupError>>>,
}

impl BackupPipeline {
	pub fn spawn(
		snapshot: Arc<dyn Snapshot>,
		repository: Arc<dyn Repository>,
		options: BackupOptions,
		stats: Arc<BackupStats>,
	) -> Self {
		let capacity = options.channel_capacity.max(1);
		let (path_tx, path_rx) = chan::bounded::<PathBuf>(capacity);
		let (candidate_tx, candidate_rx) = chan::bounded::<CandidateEntry>(capacity);
		let (changed_tx, changed_rx) = chan::bounded::<CandidateEntry>(capacity);
		let (block_tx, block_rx) = chan::bounded::<DataBlock>(capacity);

		let ctx = Arc::new(StageContext {
			snapshot,
			repository,
			empty_metadata: empty_metadata(),
			stats,
			options,
		});

		let classifier_workers = ctx.options.classifier_workers.max(1);
		let change_detector_workers = ctx.options.change_detector_workers.max(1);

		let mut workers = Vec::with_capacity(classifier_workers + change_detector_workers);

		for _ in 0..classifier_workers {
			workers.push(tokio::spawn(classify::run(
				Arc::clone(&ctx),
				path_rx.clone(),
				candidate_tx.clone(),
				block_tx.clone(),
			)));
		}

		for _ in 0..change_detector_workers {
			workers.push(tokio::spawn(change_detect::run(
				Arc::clone(&ctx),
				candidate_rx.clone(),
				changed_tx.clone(),
			)));
		}

		// The worker clones are now the only senders for the intermediate
		// and output channels; once the last classifier exits, the candidate
		// and block channels close, and so on downstream.
		Self {
			path_tx,
			changed_rx,
			block_rx,
			workers,
		}
	}

	/// Input: the raw path stream. Close it (or drop every clone) to start
	/// cooperative shutdown.
	pub fn path_sender(&self) -> chan::Sender<PathBuf> {
		self.path_tx.clone()
	}

	/// Output: entries that need content scanning, with
	/// `meta_hash_and_size`/`metadata_changed` populated.
	pub fn changed_files(&self) -> chan::Receiver<CandidateEntry> {
		self.changed_rx.clone()
	}

	/// Output: content-addressed blocks for the block store.
	pub fn blocks(&self) -> chan::Receiver<DataBlock> {
		self.block_rx.clone()
	}

	/// Close the input and wait for every worker to drain and exit.
	/// Returns the first fatal stage error, if any worker hit one.
	pub async fn shutdown(self) -> Result<(), BackupError> {
		self.path_tx.close();

		let mut first_error = None;
		for worker in self.workers {
			match worker.await {
				Ok(Ok(())) => {}
				Ok(Err(e)) => {
					if first_error.is_none() {
						first_error = Some(e);
					}
				}
				Err(e) => {
					if first_error.is_none() {
						first_error = Some(BackupError::WorkerPanicked(e.to_string()));
					}
				}
			}
		}

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}
}
