use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use sweepr_common::probe::{ProbeFailure, ProbeOutcome, ProbeTransport};

/// Unique on-disk progress/results pair per test, cleaned up on drop.
pub struct SweepFiles {
    pub progress: PathBuf,
    pub results: PathBuf,
}

impl SweepFiles {
    pub fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir();
        let pid = std::process::id();
        Self {
            progress: dir.join(format!("sweepr-it-{tag}-{pid}-progress.txt")),
            results: dir.join(format!("sweepr-it-{tag}-{pid}-found.txt")),
        }
    }

    pub fn progress_lines(&self) -> Vec<String> {
        match fs::read_to_string(&self.progress) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Drop for SweepFiles {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.progress);
        let _ = fs::remove_file(&self.results);
    }
}

/// Every probe misses instantly; blocks scan as fast as tasks schedule.
pub struct AlwaysFail;

#[async_trait]
impl ProbeTransport for AlwaysFail {
    async fn probe(&self, _addr: Ipv4Addr, _port: u16, _timeout: Duration) -> ProbeOutcome {
        ProbeOutcome::NoServer(ProbeFailure::Timeout)
    }
}

/// Every probe hangs far longer than any test runs, so a block scan only
/// ends by cancellation.
pub struct NeverAnswers;

#[async_trait]
impl ProbeTransport for NeverAnswers {
    async fn probe(&self, _addr: Ipv4Addr, _port: u16, _timeout: Duration) -> ProbeOutcome {
        tokio::time::sleep(Duration::from_secs(600)).await;
        ProbeOutcome::NoServer(ProbeFailure::Timeout)
    }
}
