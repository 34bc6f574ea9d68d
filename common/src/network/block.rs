//! # Address Block Model
//!
//! A sweep works in fixed-size CIDR blocks rather than single addresses.
//! The canonical string form (`base/prefix`) doubles as the claim key, so a
//! block is only ever constructed with its base masked to the prefix
//! boundary; two blocks with the same key are the same block.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use pnet::ipnetwork::Ipv4Network;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("invalid prefix length /{0}, expected 0-32")]
    BadPrefix(u8),
    #[error("'{0}' is not a CIDR block")]
    Unparsable(String),
    #[error("{0} is not aligned to a /{1} boundary")]
    Misaligned(Ipv4Addr, u8),
}

/// A contiguous IPv4 range identified by base address and prefix length.
/// Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Block {
    network: Ipv4Network,
}

impl Ipv4Block {
    /// Builds the block rooted exactly at `base`. Fails when `base` carries
    /// host bits, since an unaligned base would produce a non-canonical
    /// claim key.
    pub fn new(base: Ipv4Addr, prefix: u8) -> Result<Self, BlockError> {
        let block = Self::containing(base, prefix)?;
        if block.base() != base {
            return Err(BlockError::Misaligned(base, prefix));
        }
        Ok(block)
    }

    /// The unique /`prefix` block that `addr` belongs to.
    pub fn containing(addr: Ipv4Addr, prefix: u8) -> Result<Self, BlockError> {
        if prefix > 32 {
            return Err(BlockError::BadPrefix(prefix));
        }
        let mask: u32 = u32::MAX.checked_shl(u32::from(32 - prefix)).unwrap_or(0);
        let base = Ipv4Addr::from(u32::from(addr) & mask);
        let network =
            Ipv4Network::new(base, prefix).map_err(|_| BlockError::BadPrefix(prefix))?;
        Ok(Self { network })
    }

    pub fn base(&self) -> Ipv4Addr {
        self.network.ip()
    }

    pub fn prefix(&self) -> u8 {
        self.network.prefix()
    }

    pub fn network(&self) -> Ipv4Network {
        self.network
    }

    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.network.contains(addr)
    }

    pub fn address_count(&self) -> u64 {
        1u64 << (32 - self.prefix())
    }

    /// Every address in the block in ascending order, network address
    /// through broadcast address inclusive. The order is deterministic;
    /// concurrency, not shuffling, is what spreads probes out.
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + use<> {
        let start: u32 = self.network.network().into();
        let end: u32 = self.network.broadcast().into();
        (start..=end).map(Ipv4Addr::from)
    }
}

impl fmt::Display for Ipv4Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base(), self.prefix())
    }
}

impl FromStr for Ipv4Block {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((base_str, prefix_str)) = s.split_once('/') else {
            return Err(BlockError::Unparsable(s.to_string()));
        };
        let base: Ipv4Addr = base_str
            .parse()
            .map_err(|_| BlockError::Unparsable(s.to_string()))?;
        let prefix: u8 = prefix_str
            .parse()
            .map_err(|_| BlockError::Unparsable(s.to_string()))?;
        Self::new(base, prefix)
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
