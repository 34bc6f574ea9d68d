use std::sync::Arc;
use std::time::Duration;

use anyhow::ensure;

use sweepr_common::config::SweepConfig;
use sweepr_common::{info, warn};
use sweepr_core::shutdown::ShutdownSignals;
use sweepr_core::sweep::Sweep;
use sweepr_protocols::quic::QuicProbe;

use crate::commands::SweepArgs;
use crate::terminal::{print, spinner};

pub async fn sweep(args: SweepArgs) -> anyhow::Result<()> {
    let config = into_config(args)?;

    print::header("starting sweep");
    info!(
        "press Ctrl+C to stop gracefully (current blocks finish), twice to abort in-flight scans"
    );

    let shutdown = ShutdownSignals::new();
    watch_for_interrupts(shutdown.clone());

    spinner::start();
    let transport = Arc::new(QuicProbe::new()?);
    let report = Sweep::new(config, transport, shutdown)
        .with_progress(Box::new(spinner::update))
        .run()
        .await;
    spinner::finish();

    print::summary(&report?);
    Ok(())
}

fn into_config(args: SweepArgs) -> anyhow::Result<SweepConfig> {
    ensure!(args.workers > 0, "at least one worker is required");
    ensure!(args.concurrency > 0, "concurrency must be at least 1");
    ensure!(
        (8..=32).contains(&args.block_prefix),
        "block size must be between 8 and 32 bits"
    );
    ensure!(args.timeout_ms > 0, "handshake timeout must be non-zero");

    Ok(SweepConfig {
        workers: args.workers,
        concurrency: args.concurrency,
        block_prefix: args.block_prefix,
        port: args.port,
        handshake_timeout: Duration::from_millis(args.timeout_ms),
        max_claim_attempts: args.max_claim_attempts,
        progress_file: args.progress_file,
        results_file: args.results_file,
    })
}

/// First interrupt asks the workers to wind down, the second one aborts
/// whatever is still in flight. The orchestrator keeps joining either way.
fn watch_for_interrupts(shutdown: ShutdownSignals) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("shutdown requested, finishing blocks in flight (Ctrl+C again to abort)");
        shutdown.request_graceful();

        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("forced shutdown, abandoning in-flight scans");
        shutdown.request_forced();
    });
}
