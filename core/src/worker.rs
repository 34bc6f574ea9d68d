//! # Worker Loop
//!
//! One worker owns a claim-scan-repeat cycle: win an unclaimed block, probe
//! every address in it with bounded concurrency, then go back for another.
//! A worker is done when the graceful signal arrives, when the claim journal
//! fails hard, or when it cannot win a block within the attempt cap, which
//! near full coverage simply means there is nothing left worth looking for.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use sweepr_common::network::block::Ipv4Block;
use sweepr_common::probe::ProbeOutcome;
use sweepr_common::{error, info, success};

use crate::sampler::BlockSampler;
use crate::sweep::SweepContext;

/// How a block scan ended. Cancellation is its own outcome so the loop can
/// tell "stop now" apart from an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Cancelled,
}

pub struct Worker {
    id: usize,
    sampler: BlockSampler,
    ctx: Arc<SweepContext>,
}

impl Worker {
    pub fn new(id: usize, sampler: BlockSampler, ctx: Arc<SweepContext>) -> Self {
        Self { id, sampler, ctx }
    }

    /// Runs until shutdown or saturation. Never panics its siblings: every
    /// failure is handled or logged here.
    pub async fn run(self) {
        while !self.ctx.shutdown.graceful_requested() {
            let block = match self.acquire_block().await {
                Ok(Some(block)) => block,
                Ok(None) => break,
                Err(e) => {
                    error!("[worker {}] giving up, block acquisition failed: {e:#}", self.id);
                    break;
                }
            };

            info!("[worker {}] scanning {block}", self.id);
            match self.scan_block(&block).await {
                ScanOutcome::Completed => {
                    self.ctx.note_block_scanned();
                    info!("[worker {}] finished {block}", self.id);
                }
                ScanOutcome::Cancelled => {
                    // The claim stays on record; partially covered blocks
                    // are never handed back.
                    info!("[worker {}] abandoned {block} mid-scan", self.id);
                    break;
                }
            }
        }
        info!("[worker {}] exiting", self.id);
    }

    /// Samples and claims until a block is won or the attempt cap runs out.
    /// `Ok(None)` means stop cleanly: shutdown began, or every candidate we
    /// could find was already claimed (saturation).
    async fn acquire_block(&self) -> anyhow::Result<Option<Ipv4Block>> {
        for _ in 0..self.ctx.config.max_claim_attempts {
            if self.ctx.shutdown.graceful_requested() {
                return Ok(None);
            }
            let candidate = self.sampler.sample()?;
            if self.ctx.journal.claim(&candidate).await? {
                return Ok(Some(candidate));
            }
        }

        info!(
            "[worker {}] no unclaimed block in {} attempts, the space looks saturated",
            self.id, self.ctx.config.max_claim_attempts
        );
        Ok(None)
    }

    /// Probes every address in `block`, at most `concurrency` in flight at
    /// once. On forced shutdown every outstanding probe is aborted and
    /// awaited before this returns, instead of waiting out their timeouts.
    async fn scan_block(&self, block: &Ipv4Block) -> ScanOutcome {
        let gate = Arc::new(Semaphore::new(self.ctx.config.concurrency));
        let mut probes: JoinSet<()> = JoinSet::new();

        for addr in block.addresses() {
            let gate = Arc::clone(&gate);
            let ctx = Arc::clone(&self.ctx);
            probes.spawn(async move {
                // The gate is only closed by aborting this task, so a
                // failed acquire just means we are shutting down.
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                probe_one(&ctx, addr).await;
            });
        }

        tokio::select! {
            _ = self.ctx.shutdown.wait_forced() => {
                probes.shutdown().await;
                ScanOutcome::Cancelled
            }
            _ = drain(&mut probes) => ScanOutcome::Completed,
        }
    }
}

async fn drain(probes: &mut JoinSet<()>) {
    while let Some(joined) = probes.join_next().await {
        if let Err(e) = joined {
            if !e.is_cancelled() {
                error!("probe task panicked: {e}");
            }
        }
    }
}

/// One address. A missing server is silence, not an error; only a failure
/// to record a found one is worth a log line, and even that never stops the
/// scan.
async fn probe_one(ctx: &SweepContext, addr: Ipv4Addr) {
    let port = ctx.config.port;
    let timeout: Duration = ctx.config.handshake_timeout;

    match ctx.transport.probe(addr, port, timeout).await {
        ProbeOutcome::ServerPresent => {
            success!("server found at {addr}:{port}");
            ctx.note_server_found();
            if let Err(e) = ctx.journal.record_server(addr).await {
                error!("failed to record {addr}: {e:#}");
            }
        }
        ProbeOutcome::NoServer(_) => {}
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
