use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5520;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_BLOCK_PREFIX: u8 = 24;
pub const DEFAULT_MAX_CLAIM_ATTEMPTS: usize = 1000;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_PROGRESS_FILE: &str = "progress.txt";
pub const DEFAULT_RESULTS_FILE: &str = "found.txt";

/// Everything a sweep needs to know. Owned by the caller, consumed by the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Number of concurrently running worker tasks.
    pub workers: usize,
    /// Probes in flight at once, per worker.
    pub concurrency: usize,
    /// Prefix length of the blocks a sweep claims (24 = /24 = 256 addresses).
    pub block_prefix: u8,
    /// Target UDP port.
    pub port: u16,
    /// How long one handshake attempt may take before it counts as "no server".
    pub handshake_timeout: Duration,
    /// Failed claim attempts per acquisition before a worker treats the
    /// address space as saturated and exits.
    pub max_claim_attempts: usize,
    /// Durable record of claimed blocks, shared between runs and processes.
    pub progress_file: PathBuf,
    /// Durable record of discovered servers.
    pub results_file: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            concurrency: DEFAULT_CONCURRENCY,
            block_prefix: DEFAULT_BLOCK_PREFIX,
            port: DEFAULT_PORT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_claim_attempts: DEFAULT_MAX_CLAIM_ATTEMPTS,
            progress_file: PathBuf::from(DEFAULT_PROGRESS_FILE),
            results_file: PathBuf::from(DEFAULT_RESULTS_FILE),
        }
    }
}
