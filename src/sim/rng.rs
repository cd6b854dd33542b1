//! Linear congruential generator: `x' = x * 22695477 + 1` (wrapping u32).
//!
//! Chosen for bit-reproducibility rather than statistical quality. The word
//! lives inside `State`, so snapshots carry the generator with them.

use bytemuck::{Pod, Zeroable};
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

const MULTIPLIER: u32 = 22_695_477;
const INCREMENT: u32 = 1;

/// Deterministic generator state
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Lcg(u32);

impl Lcg {
    pub const fn new(state: u32) -> Self {
        Self(state)
    }

    pub const fn state(self) -> u32 {
        self.0
    }

    /// Advance and return the new word
    #[inline]
    pub fn step(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT);
        self.0
    }
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let low = self.step() as u64;
        let high = self.step() as u64;
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for Lcg {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self(u32::from_le_bytes(seed))
    }
}
