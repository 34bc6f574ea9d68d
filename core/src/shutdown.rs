//! Two-stage shutdown shared by the orchestrator and every worker.
//!
//! The first signal is *graceful*: workers stop claiming new blocks but
//! finish the one in flight. The second is *forced*: in-flight scans are
//! abandoned on the spot. Both are plain cancellation tokens handed to each
//! worker at construction; nothing here is process-global.

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignals {
    graceful: CancellationToken,
    forced: CancellationToken,
}

impl ShutdownSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop taking new work, finish what is in flight.
    pub fn request_graceful(&self) {
        self.graceful.cancel();
    }

    /// Abandon in-flight work immediately. Implies graceful. Idempotent.
    pub fn request_forced(&self) {
        self.graceful.cancel();
        self.forced.cancel();
    }

    pub fn graceful_requested(&self) -> bool {
        self.graceful.is_cancelled()
    }

    pub fn forced_requested(&self) -> bool {
        self.forced.is_cancelled()
    }

    /// Resolves once forced shutdown is requested.
    pub async fn wait_forced(&self) {
        self.forced.cancelled().await
    }
}
