pub mod config;
pub mod network;
pub mod probe;

/// Logging facade used across the workspace.
///
/// Call sites import these from `sweepr_common` so every crate logs through
/// the same tracing targets; the CLI formatter turns them into symbols.
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) };
}

/// A positive outcome worth standing out from plain progress chatter,
/// e.g. a discovered server.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => { tracing::info!(target: "sweepr::success", $($arg)*) };
}
