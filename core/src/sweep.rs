//! # Sweep Orchestration
//!
//! Wires the journal, the sampler, the probe transport and N workers
//! together, then waits for the whole fleet to finish. Shutdown is driven
//! from outside through [`ShutdownSignals`]; the orchestrator's only job on
//! the way down is to keep waiting until every worker has actually stopped,
//! so nothing is left half-flushed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinSet;

use sweepr_common::config::SweepConfig;
use sweepr_common::network::exclusions::ExclusionList;
use sweepr_common::probe::ProbeTransport;
use sweepr_common::{error, info};

use crate::claims::ClaimJournal;
use crate::sampler::BlockSampler;
use crate::shutdown::ShutdownSignals;
use crate::worker::Worker;

/// Counts reported to the progress callback while a sweep runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepProgress {
    pub blocks_scanned: u64,
    pub servers_found: u64,
}

/// Called after every finished block and every discovered server.
pub type ProgressFn = Box<dyn Fn(SweepProgress) + Send + Sync>;

/// Final counts for the operator once every worker reached DONE.
#[derive(Debug, Clone, Copy)]
pub struct SweepReport {
    /// Blocks on record in the journal, this run and earlier ones together.
    pub blocks_claimed_total: usize,
    pub blocks_scanned: u64,
    pub servers_found: u64,
    pub workers: usize,
}

/// Shared state handed to each worker at construction.
pub struct SweepContext {
    pub journal: Arc<ClaimJournal>,
    pub transport: Arc<dyn ProbeTransport>,
    pub config: SweepConfig,
    pub shutdown: ShutdownSignals,
    progress: Option<ProgressFn>,
    blocks_scanned: AtomicU64,
    servers_found: AtomicU64,
}

impl SweepContext {
    pub fn new(
        journal: Arc<ClaimJournal>,
        transport: Arc<dyn ProbeTransport>,
        config: SweepConfig,
        shutdown: ShutdownSignals,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            journal,
            transport,
            config,
            shutdown,
            progress,
            blocks_scanned: AtomicU64::new(0),
            servers_found: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> SweepProgress {
        SweepProgress {
            blocks_scanned: self.blocks_scanned.load(Ordering::Relaxed),
            servers_found: self.servers_found.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn note_block_scanned(&self) {
        self.blocks_scanned.fetch_add(1, Ordering::Relaxed);
        self.report_progress();
    }

    pub(crate) fn note_server_found(&self) {
        self.servers_found.fetch_add(1, Ordering::Relaxed);
        self.report_progress();
    }

    fn report_progress(&self) {
        if let Some(callback) = &self.progress {
            callback(self.stats());
        }
    }
}

pub struct Sweep {
    config: SweepConfig,
    transport: Arc<dyn ProbeTransport>,
    shutdown: ShutdownSignals,
    progress: Option<ProgressFn>,
}

impl Sweep {
    pub fn new(
        config: SweepConfig,
        transport: Arc<dyn ProbeTransport>,
        shutdown: ShutdownSignals,
    ) -> Self {
        Self {
            config,
            transport,
            shutdown,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Loads earlier progress, runs the worker fleet to joint completion
    /// and reports the final counts.
    pub async fn run(self) -> anyhow::Result<SweepReport> {
        let journal = Arc::new(ClaimJournal::new(
            &self.config.progress_file,
            &self.config.results_file,
        ));
        let restored = journal.load().await?;
        info!("restored {restored} previously claimed blocks");

        let worker_count = self.config.workers;
        let ctx = Arc::new(SweepContext::new(
            journal,
            self.transport,
            self.config,
            self.shutdown,
            self.progress,
        ));

        let mut workers = JoinSet::new();
        for id in 0..worker_count {
            let sampler = BlockSampler::new(ctx.config.block_prefix, ExclusionList::reserved());
            workers.spawn(Worker::new(id, sampler, Arc::clone(&ctx)).run());
        }
        info!(
            "started {worker_count} workers, {} concurrent probes each, sweeping /{} blocks on port {}",
            ctx.config.concurrency, ctx.config.block_prefix, ctx.config.port
        );

        // Workers handle forced shutdown internally; joining after
        // cancellation is what guarantees nothing is still in flight when
        // the report goes out.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    error!("worker task panicked: {e}");
                }
            }
        }

        let stats = ctx.stats();
        Ok(SweepReport {
            blocks_claimed_total: ctx.journal.claimed_len().await,
            blocks_scanned: stats.blocks_scanned,
            servers_found: stats.servers_found,
            workers: worker_count,
        })
    }
}
