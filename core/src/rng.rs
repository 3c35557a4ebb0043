//! Deterministic random number generation.
//!
//! RULE: No game or offer draw may call a platform RNG.
//! All randomness flows through StreamRng instances derived from the
//! single master seed the Economy service was opened with.
//!
//! Each concern gets its own stream, seeded from (master_seed XOR slot):
//!   - Adding a new stream never changes existing streams.
//!   - A roulette spin never shifts which jobs get offered next.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single concern.
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream from the master seed and a stable slot index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, slot_index: u64) -> Self {
        let derived_seed = master_seed ^ (slot_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a usize in [0, n).
    pub fn below(&mut self, n: usize) -> usize {
        assert!(n > 0, "n must be > 0");
        self.inner.gen_range(0..n)
    }

    /// Roll an integer in [lo, hi]. Callers validate `lo <= hi` at config load.
    pub fn range_inclusive(&mut self, lo: i64, hi: i64) -> i64 {
        self.inner.gen_range(lo..=hi)
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// `amount` distinct indices from [0, length), in draw order.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.inner, length, amount.min(length)).into_vec()
    }
}

/// Seeds every stream for one Economy instance.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> StreamRng {
        StreamRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }

    pub fn streams(&self) -> RngStreams {
        RngStreams {
            offers:  self.for_stream(StreamSlot::Offers),
            casino:  self.for_stream(StreamSlot::Casino),
            crime:   self.for_stream(StreamSlot::Crime),
            rob:     self.for_stream(StreamSlot::Rob),
            lottery: self.for_stream(StreamSlot::Lottery),
        }
    }
}

/// Live streams owned by the Economy service; each advances as it is used.
pub struct RngStreams {
    pub offers:  StreamRng,
    pub casino:  StreamRng,
    pub crime:   StreamRng,
    pub rob:     StreamRng,
    pub lottery: StreamRng,
}

/// Stable stream slot assignments.
/// NEVER reorder or remove entries; only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Offers = 0,
    Casino = 1,
    Crime = 2,
    Rob = 3,
    Lottery = 4,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Offers => "offers",
            Self::Casino => "casino",
            Self::Crime => "crime",
            Self::Rob => "rob",
            Self::Lottery => "lottery",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RngBank::new(12345).for_stream(StreamSlot::Casino);
        let mut b = RngBank::new(12345).for_stream(StreamSlot::Casino);
        for _ in 0..32 {
            assert_eq!(a.range_inclusive(1, 11), b.range_inclusive(1, 11));
        }
    }

    #[test]
    fn streams_are_independent() {
        let bank = RngBank::new(7);
        let mut offers = bank.for_stream(StreamSlot::Offers);
        let mut casino = bank.for_stream(StreamSlot::Casino);
        let a: Vec<f64> = (0..8).map(|_| offers.next_f64()).collect();
        let b: Vec<f64> = (0..8).map(|_| casino.next_f64()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn sample_indices_are_distinct_and_clamped() {
        let mut rng = RngBank::new(99).for_stream(StreamSlot::Offers);
        for _ in 0..50 {
            let mut picked = rng.sample_indices(9, 3);
            assert_eq!(picked.len(), 3);
            picked.sort_unstable();
            picked.dedup();
            assert_eq!(picked.len(), 3, "indices must be distinct");
            assert!(picked.iter().all(|&i| i < 9));
        }
        assert_eq!(rng.sample_indices(2, 5).len(), 2);
        assert!(rng.sample_indices(0, 3).is_empty());
    }
}
