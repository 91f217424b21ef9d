//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG for seeded shuffles and the tie-breaker used
//! when two candidate splits have identical gain.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// (Knuth's MMIX constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed ^ 0x5DEECE66D),
        }
    }

    /// Next raw 64-bit output (upper bits of the state are the strongest)
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        let x = self.state.0;
        x ^ (x >> 33)
    }

    /// Uniform value in `[0, max)`; returns 0 when `max == 0`
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % max as u64) as usize
    }

    /// Seeded Fisher-Yates permutation of `0..n`
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.next_range(i + 1);
            order.swap(i, j);
        }
        order
    }
}

/// Deterministic tie-breaker for split selection
/// Lower (feature_idx, threshold, node_id) wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: i64,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: i64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold,
            node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        for _ in 0..100 {
            assert!(rng.next_range(10) < 10);
        }
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_permutation() {
        let p1 = LcgRng::new(7).permutation(50);
        let p2 = LcgRng::new(7).permutation(50);
        let p3 = LcgRng::new(8).permutation(50);

        assert_eq!(p1, p2);
        assert_ne!(p1, p3);

        let mut sorted = p1.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 100, 0);
        let t2 = SplitTieBreaker::new(0, 100, 1);
        let t3 = SplitTieBreaker::new(1, 50, 0);

        assert!(t1 < t2);
        assert!(t1 < t3);
    }
}
