//! The boundary between the sweep machinery and the protocol handshake.
//!
//! Workers only ever see this trait; the actual QUIC implementation lives in
//! `sweepr-protocols`, and tests substitute their own transports.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;

/// What a single handshake attempt concluded about an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The full protocol handshake completed: a live server.
    ServerPresent,
    /// No server at this address, with the way the attempt ended.
    NoServer(ProbeFailure),
}

/// Expected, non-error ways a probe comes back empty. These are ordinary
/// scan outcomes, never propagated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Nothing answered within the handshake timeout.
    Timeout,
    /// The local network stack failed before reaching the target.
    Transport,
    /// The endpoint answered but refused or broke off the handshake.
    Rejected,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => write!(f, "timed out"),
            ProbeFailure::Transport => write!(f, "transport error"),
            ProbeFailure::Rejected => write!(f, "handshake rejected"),
        }
    }
}

/// One handshake attempt against `addr:port`, bounded by `timeout`.
///
/// Implementations are infallible by contract: anything unexpected inside
/// the transport collapses to [`ProbeOutcome::NoServer`] so a single bad
/// address can never take down a scan.
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn probe(&self, addr: Ipv4Addr, port: u16, timeout: Duration) -> ProbeOutcome;
}
