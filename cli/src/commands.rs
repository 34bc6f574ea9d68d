pub mod probe;
pub mod sweep;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sweepr_common::config::{
    DEFAULT_BLOCK_PREFIX, DEFAULT_CONCURRENCY, DEFAULT_HANDSHAKE_TIMEOUT,
    DEFAULT_MAX_CLAIM_ATTEMPTS, DEFAULT_PORT, DEFAULT_PROGRESS_FILE, DEFAULT_RESULTS_FILE,
    DEFAULT_WORKERS,
};

#[derive(Parser)]
#[command(name = "sweepr")]
#[command(about = "Internet-scale discovery of QUIC game servers.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Continuously claim and scan random address blocks
    #[command(alias = "s")]
    Sweep(SweepArgs),
    /// Check a single host for a running server
    #[command(alias = "p")]
    Probe {
        /// Hostname or IPv4 address
        host: String,
        /// Target UDP port
        #[arg(default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

#[derive(Args)]
pub struct SweepArgs {
    /// Number of concurrent workers
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Concurrent probes per worker
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// CIDR block size in bits (24 = /24 = 256 addresses)
    #[arg(long = "block-size", default_value_t = DEFAULT_BLOCK_PREFIX)]
    pub block_prefix: u8,

    /// Target UDP port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Handshake timeout in milliseconds
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Failed claim attempts per acquisition before a worker gives up
    #[arg(long, default_value_t = DEFAULT_MAX_CLAIM_ATTEMPTS)]
    pub max_claim_attempts: usize,

    /// File recording claimed blocks, shared across runs
    #[arg(long, default_value = DEFAULT_PROGRESS_FILE)]
    pub progress_file: PathBuf,

    /// File recording discovered servers
    #[arg(long, default_value = DEFAULT_RESULTS_FILE)]
    pub results_file: PathBuf,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
