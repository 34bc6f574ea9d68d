use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sweepr_common::config::SweepConfig;
use sweepr_common::network::block::Ipv4Block;
use sweepr_common::network::exclusions::ExclusionList;
use sweepr_core::shutdown::ShutdownSignals;
use sweepr_core::sweep::{Sweep, SweepReport};

use crate::util::{AlwaysFail, NeverAnswers, SweepFiles};

fn config(files: &SweepFiles) -> SweepConfig {
    SweepConfig {
        progress_file: files.progress.clone(),
        results_file: files.results.clone(),
        ..SweepConfig::default()
    }
}

/// Polls until the progress file holds at least `n` lines. Sweeps claim
/// their first blocks within milliseconds, so a short deadline is plenty.
async fn wait_for_claims(files: &SweepFiles, n: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while files.progress_lines().len() < n {
        assert!(
            Instant::now() < deadline,
            "no {n} claims appeared within the deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn a_graceful_sweep_finishes_every_claimed_block() {
    let files = SweepFiles::new("graceful");
    let shutdown = ShutdownSignals::new();
    let handle = shutdown.clone();

    let sweep = Sweep::new(config(&files), Arc::new(AlwaysFail), shutdown);
    let run = tokio::spawn(async move { sweep.run().await });

    wait_for_claims(&files, 4).await;
    handle.request_graceful();
    let report: SweepReport = run.await.unwrap().unwrap();

    let lines = files.progress_lines();
    assert_eq!(report.workers, 4);
    // Under graceful shutdown nothing is abandoned: every claim was scanned.
    assert_eq!(report.blocks_scanned as usize, lines.len());
    assert_eq!(report.blocks_claimed_total, lines.len());

    // Claims are distinct, well-formed and never in reserved space.
    let exclusions = ExclusionList::reserved();
    let unique: HashSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), lines.len());
    for line in &lines {
        let block: Ipv4Block = line.parse().expect("claim keys are canonical blocks");
        assert_eq!(block.prefix(), 24);
        assert!(exclusions.permits(&block), "{block} is in reserved space");
    }

    // Nothing was found, nothing recorded.
    assert_eq!(report.servers_found, 0);
    assert!(!files.results.exists());
}

#[tokio::test]
async fn a_restarted_sweep_never_reclaims_earlier_blocks() {
    let files = SweepFiles::new("restart");

    let first_run: Vec<String> = {
        let shutdown = ShutdownSignals::new();
        let handle = shutdown.clone();
        let sweep = Sweep::new(config(&files), Arc::new(AlwaysFail), shutdown);
        let run = tokio::spawn(async move { sweep.run().await });
        wait_for_claims(&files, 4).await;
        handle.request_graceful();
        run.await.unwrap().unwrap();
        files.progress_lines()
    };
    assert!(!first_run.is_empty());

    let shutdown = ShutdownSignals::new();
    let handle = shutdown.clone();
    let sweep = Sweep::new(config(&files), Arc::new(AlwaysFail), shutdown);
    let run = tokio::spawn(async move { sweep.run().await });
    wait_for_claims(&files, first_run.len() + 4).await;
    handle.request_graceful();
    run.await.unwrap().unwrap();

    let combined = files.progress_lines();
    // Append-only: the first run's claims lead the file untouched.
    assert_eq!(&combined[..first_run.len()], &first_run[..]);
    // And no block was ever claimed twice across the restart.
    let unique: HashSet<&String> = combined.iter().collect();
    assert_eq!(unique.len(), combined.len());
}

#[tokio::test]
async fn a_forced_shutdown_stops_mid_scan_without_releasing_claims() {
    let files = SweepFiles::new("forced");
    let cfg = SweepConfig {
        workers: 2,
        concurrency: 8,
        ..config(&files)
    };

    let shutdown = ShutdownSignals::new();
    let handle = shutdown.clone();
    let sweep = Sweep::new(cfg, Arc::new(NeverAnswers), shutdown);
    let run = tokio::spawn(async move { sweep.run().await });

    // Both workers are now stuck scanning a block whose probes never answer.
    wait_for_claims(&files, 2).await;
    let forced_at = Instant::now();
    handle.request_forced();

    let report = run.await.unwrap().unwrap();
    // Prompt: bounded by cancellation, not by the 600 s probe sleeps.
    assert!(forced_at.elapsed() < Duration::from_secs(10));

    // No block ran to completion, yet both claims are on record for good.
    assert_eq!(report.blocks_scanned, 0);
    assert_eq!(files.progress_lines().len(), 2);
    assert_eq!(report.blocks_claimed_total, 2);
}
