//! Reserved and private ranges a sweep must never touch.

use std::sync::LazyLock;

use pnet::ipnetwork::Ipv4Network;

use super::block::Ipv4Block;

/// Address space that is not publicly routable or not ours to probe.
pub static RESERVED_RANGES: LazyLock<Vec<Ipv4Network>> = LazyLock::new(|| {
    [
        "0.0.0.0/8",           // current network
        "10.0.0.0/8",          // private
        "127.0.0.0/8",         // loopback
        "169.254.0.0/16",      // link-local
        "172.16.0.0/12",       // private
        "192.168.0.0/16",      // private
        "224.0.0.0/4",         // multicast
        "240.0.0.0/4",         // reserved
        "255.255.255.255/32",  // broadcast
    ]
    .iter()
    .map(|s| s.parse().expect("reserved range table is well-formed"))
    .collect()
});

/// The set of ranges a block must not touch to be eligible for scanning.
#[derive(Debug, Clone)]
pub struct ExclusionList {
    ranges: Vec<Ipv4Network>,
}

impl ExclusionList {
    /// The standard list: loopback, link-local, multicast, private,
    /// reserved and broadcast space.
    pub fn reserved() -> Self {
        Self {
            ranges: RESERVED_RANGES.clone(),
        }
    }

    pub fn from_ranges(ranges: Vec<Ipv4Network>) -> Self {
        Self { ranges }
    }

    /// True when the block shares no address with any excluded range.
    /// Partial overlap disqualifies the whole block.
    pub fn permits(&self, block: &Ipv4Block) -> bool {
        let net = block.network();
        !self
            .ranges
            .iter()
            .any(|skip| net.is_subnet_of(*skip) || net.overlaps(*skip))
    }
}

impl Default for ExclusionList {
    fn default() -> Self {
        Self::reserved()
    }
}
