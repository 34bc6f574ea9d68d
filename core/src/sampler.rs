//! # Random Block Sampling
//!
//! Candidate blocks are drawn uniformly from the whole 32-bit space and
//! rejected against the exclusion list until an eligible one comes up. The
//! draw uses the operating system's entropy source rather than a seeded
//! PRNG: the scan order must not be predictable from outside, and workers
//! sampling concurrently must not correlate.

use std::net::Ipv4Addr;

use anyhow::{Context, bail};
use rand::TryRngCore;
use rand::rngs::OsRng;

use sweepr_common::network::block::Ipv4Block;
use sweepr_common::network::exclusions::ExclusionList;

/// Redraw ceiling. With the standard exclusion list a draw succeeds within a
/// handful of attempts; only a list covering nearly the whole address space
/// can run this out, and that is a configuration error worth failing on
/// rather than spinning forever.
const MAX_SAMPLE_ATTEMPTS: u32 = 4096;

pub struct BlockSampler {
    prefix: u8,
    exclusions: ExclusionList,
}

impl BlockSampler {
    pub fn new(prefix: u8, exclusions: ExclusionList) -> Self {
        Self { prefix, exclusions }
    }

    /// Draws one eligible block uniformly at random. Never performs I/O and
    /// never yields an address overlapping an excluded range.
    pub fn sample(&self) -> anyhow::Result<Ipv4Block> {
        for _ in 0..MAX_SAMPLE_ATTEMPTS {
            let raw: u32 = OsRng
                .try_next_u32()
                .context("drawing from the system entropy source")?;
            let candidate = Ipv4Block::containing(Ipv4Addr::from(raw), self.prefix)?;
            if self.exclusions.permits(&candidate) {
                return Ok(candidate);
            }
        }
        bail!(
            "no eligible /{} block in {} draws; the exclusion list rejects nearly the whole address space",
            self.prefix,
            MAX_SAMPLE_ATTEMPTS
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::ipnetwork::Ipv4Network;
    use sweepr_common::network::exclusions::RESERVED_RANGES;

    #[test]
    fn samples_are_aligned_and_sized() {
        let sampler = BlockSampler::new(24, ExclusionList::reserved());
        for _ in 0..100 {
            let block = sampler.sample().unwrap();
            assert_eq!(block.prefix(), 24);
            assert_eq!(u32::from(block.base()) & 0xff, 0);
        }
    }

    #[test]
    fn ten_thousand_samples_never_touch_reserved_space() {
        let sampler = BlockSampler::new(24, ExclusionList::reserved());
        for _ in 0..10_000 {
            let block = sampler.sample().unwrap();
            let net = block.network();
            for skip in RESERVED_RANGES.iter() {
                assert!(
                    !net.overlaps(*skip),
                    "sampled {block} overlaps excluded {skip}"
                );
            }
        }
    }

    #[test]
    fn ten_thousand_samples_respect_a_custom_exclusion() {
        let ten_slash_eight: Ipv4Network = "10.0.0.0/8".parse().unwrap();
        let sampler = BlockSampler::new(24, ExclusionList::from_ranges(vec![ten_slash_eight]));
        for _ in 0..10_000 {
            let block = sampler.sample().unwrap();
            assert!(
                !block.network().overlaps(ten_slash_eight),
                "sampled {block} inside 10.0.0.0/8"
            );
        }
    }

    #[test]
    fn an_exclusion_list_covering_everything_fails_distinctly() {
        let everything: Ipv4Network = "0.0.0.0/0".parse().unwrap();
        let sampler = BlockSampler::new(24, ExclusionList::from_ranges(vec![everything]));
        let err = sampler.sample().unwrap_err();
        assert!(err.to_string().contains("exclusion list"));
    }
}
