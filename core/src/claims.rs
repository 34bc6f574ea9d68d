//! # Claim Journal
//!
//! The durable record of which blocks have been claimed and which servers
//! have been found, shared by every worker in this process and by any other
//! process pointed at the same files.
//!
//! The progress file on disk is the single source of truth for claims. The
//! in-memory set is a mirror kept for reporting; it is never consulted to
//! decide a claim. A claim transaction takes an exclusive advisory lock on
//! the file, re-reads it, checks membership, and only then appends and
//! forces the record to stable storage, so exactly one claimant can win a
//! block even across process restarts and concurrent runs.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use fs2::FileExt;
use tokio::sync::Mutex;

use sweepr_common::network::block::Ipv4Block;

pub struct ClaimJournal {
    progress_path: PathBuf,
    results_path: PathBuf,
    /// Mirror of the progress file. Doubles as the in-process serializer
    /// for claim transactions: holding it keeps two tasks in this process
    /// from interleaving their file locks.
    claimed: Mutex<HashSet<String>>,
    results_lock: Mutex<()>,
}

impl ClaimJournal {
    pub fn new(progress_path: impl Into<PathBuf>, results_path: impl Into<PathBuf>) -> Self {
        Self {
            progress_path: progress_path.into(),
            results_path: results_path.into(),
            claimed: Mutex::new(HashSet::new()),
            results_lock: Mutex::new(()),
        }
    }

    /// Restores the mirror from the progress file, creating the file when
    /// absent. Returns how many blocks earlier runs already claimed.
    pub async fn load(&self) -> anyhow::Result<usize> {
        let path = self.progress_path.clone();
        let restored = tokio::task::spawn_blocking(move || read_claims(&path))
            .await
            .context("claim journal load task died")??;

        let mut claimed = self.claimed.lock().await;
        let count = restored.len();
        *claimed = restored;
        Ok(count)
    }

    /// Atomically and durably claims `block`. Returns `false` when anyone,
    /// including a previous run or another process, already holds it.
    pub async fn claim(&self, block: &Ipv4Block) -> anyhow::Result<bool> {
        let key = block.to_string();
        let mut claimed = self.claimed.lock().await;

        let path = self.progress_path.clone();
        let tx_key = key.clone();
        let won = tokio::task::spawn_blocking(move || claim_on_disk(&path, &tx_key))
            .await
            .context("claim transaction task died")??;

        if won {
            claimed.insert(key);
        }
        Ok(won)
    }

    /// Durably appends one discovered server to the results file. Duplicates
    /// are not filtered here; correct claiming already prevents them.
    pub async fn record_server(&self, addr: Ipv4Addr) -> anyhow::Result<()> {
        let _guard = self.results_lock.lock().await;
        let path = self.results_path.clone();
        let line = addr.to_string();
        tokio::task::spawn_blocking(move || append_durably(&path, &line))
            .await
            .context("result append task died")?
    }

    /// Blocks claimed so far, this run and earlier ones together.
    /// Informational only.
    pub async fn claimed_len(&self) -> usize {
        self.claimed.lock().await.len()
    }
}

fn open_progress(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("opening progress file {}", path.display()))
}

fn read_claims(path: &Path) -> anyhow::Result<HashSet<String>> {
    let file = open_progress(path)?;
    let mut claims = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.context("reading progress file")?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            claims.insert(trimmed.to_string());
        }
    }
    Ok(claims)
}

/// One claim transaction. The advisory lock spans the whole read-check-append
/// sequence; the file contents at lock time, not any cache, decide the
/// outcome. `lock_exclusive` waits rather than fails, so a contended but
/// unclaimed block can never be lost to lock contention. Dropping the handle
/// releases the lock on every exit path.
fn claim_on_disk(path: &Path, key: &str) -> anyhow::Result<bool> {
    let mut file = open_progress(path)?;
    file.lock_exclusive()
        .with_context(|| format!("locking progress file {}", path.display()))?;

    file.seek(SeekFrom::Start(0))
        .context("rewinding progress file")?;
    for line in BufReader::new(&file).lines() {
        let line = line.context("reading progress file")?;
        if line.trim() == key {
            return Ok(false);
        }
    }

    // The handle is in append mode, so this lands at the end regardless of
    // the read position.
    writeln!(file, "{key}").context("appending claim record")?;
    file.sync_data().context("forcing claim record to disk")?;
    Ok(true)
}

fn append_durably(path: &Path, line: &str) -> anyhow::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("opening results file {}", path.display()))?;
    writeln!(file, "{line}").context("appending result record")?;
    file.sync_data().context("forcing result record to disk")?;
    Ok(())
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    struct TempFiles {
        progress: PathBuf,
        results: PathBuf,
    }

    impl TempFiles {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir();
            let pid = std::process::id();
            Self {
                progress: dir.join(format!("sweepr-{tag}-{pid}-progress.txt")),
                results: dir.join(format!("sweepr-{tag}-{pid}-found.txt")),
            }
        }

        fn journal(&self) -> ClaimJournal {
            ClaimJournal::new(&self.progress, &self.results)
        }

        fn progress_lines(&self) -> Vec<String> {
            match fs::read_to_string(&self.progress) {
                Ok(text) => text.lines().map(str::to_string).collect(),
                Err(_) => Vec::new(),
            }
        }
    }

    impl Drop for TempFiles {
        fn drop(&mut self) {
            let _ = fs::remove_file(&self.progress);
            let _ = fs::remove_file(&self.results);
        }
    }

    fn block(s: &str) -> Ipv4Block {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn a_block_can_be_claimed_exactly_once() {
        let files = TempFiles::new("claim-once");
        let journal = files.journal();
        journal.load().await.unwrap();

        assert!(journal.claim(&block("93.184.0.0/24")).await.unwrap());
        assert!(!journal.claim(&block("93.184.0.0/24")).await.unwrap());
        assert!(journal.claim(&block("93.185.0.0/24")).await.unwrap());

        assert_eq!(
            files.progress_lines(),
            vec!["93.184.0.0/24", "93.185.0.0/24"]
        );
        assert_eq!(journal.claimed_len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_claims_have_a_single_winner() {
        let files = TempFiles::new("claim-race");
        let journal = Arc::new(files.journal());
        journal.load().await.unwrap();

        let contested = block("93.184.0.0/24");
        let mut attempts = Vec::new();
        for _ in 0..8 {
            let journal = Arc::clone(&journal);
            attempts.push(tokio::spawn(
                async move { journal.claim(&contested).await },
            ));
        }

        let mut wins = 0;
        for attempt in attempts {
            if attempt.await.unwrap().unwrap() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(files.progress_lines(), vec!["93.184.0.0/24"]);
    }

    #[tokio::test]
    async fn a_restart_sees_every_earlier_claim() {
        let files = TempFiles::new("claim-restart");
        {
            let journal = files.journal();
            journal.load().await.unwrap();
            for key in ["1.2.3.0/24", "4.5.6.0/24", "7.8.9.0/24"] {
                assert!(journal.claim(&block(key)).await.unwrap());
            }
        }

        let reloaded = files.journal();
        assert_eq!(reloaded.load().await.unwrap(), 3);
        assert_eq!(reloaded.claimed_len().await, 3);
        assert!(!reloaded.claim(&block("4.5.6.0/24")).await.unwrap());
        assert!(reloaded.claim(&block("10.11.12.0/24")).await.unwrap());
    }

    #[tokio::test]
    async fn separate_journals_on_the_same_file_race_cleanly() {
        // Two journals with independent mirrors stand in for two processes;
        // only the advisory file lock separates them.
        let files = TempFiles::new("claim-crossproc");
        let left = Arc::new(files.journal());
        let right = Arc::new(files.journal());
        left.load().await.unwrap();
        right.load().await.unwrap();

        let contested = block("203.0.113.0/24");
        let mut attempts = Vec::new();
        for journal in [&left, &right, &left, &right, &left, &right] {
            let journal = Arc::clone(journal);
            attempts.push(tokio::spawn(
                async move { journal.claim(&contested).await },
            ));
        }

        let mut wins = 0;
        for attempt in attempts {
            if attempt.await.unwrap().unwrap() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(files.progress_lines(), vec!["203.0.113.0/24"]);
    }

    #[tokio::test]
    async fn discovered_servers_are_appended_in_order() {
        let files = TempFiles::new("results");
        let journal = files.journal();

        journal
            .record_server(Ipv4Addr::new(93, 184, 0, 7))
            .await
            .unwrap();
        journal
            .record_server(Ipv4Addr::new(93, 184, 0, 9))
            .await
            .unwrap();

        let text = fs::read_to_string(&files.results).unwrap();
        assert_eq!(text, "93.184.0.7\n93.184.0.9\n");
    }
}
