//! Pseudo-random index assignment.
//!
//! The engine never reads entropy directly; it asks an [`IndexSource`]. The
//! default [`HashIndexSource`] hashes the requester, a running nonce and a
//! 32 byte seed. Tests plug in [`SequenceIndexSource`] or a seeded
//! [`RngIndexSource`] to get reproducible triples.

use std::collections::VecDeque;

use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use surety_common::{utils::generate_entropy, Identity, OracleIndex};

/// Draws after which `draw_triple` stops resampling and picks the lowest free index.
const MAX_RESAMPLES: usize = 64;

pub trait IndexSource: Send + Sync {
    /// Returns an index in `0..bound`.
    fn next_index(&mut self, requester: &Identity, bound: OracleIndex) -> OracleIndex;
}

/// Draws three distinct indexes for `requester`, resampling collisions.
pub fn draw_triple(
    source: &mut dyn IndexSource,
    requester: &Identity,
    bound: OracleIndex,
) -> [OracleIndex; 3] {
    let mut triple: Vec<OracleIndex> = Vec::with_capacity(3);
    while triple.len() < 3 {
        let mut picked = None;
        for _ in 0..MAX_RESAMPLES {
            let candidate = source.next_index(requester, bound) % bound;
            if !triple.contains(&candidate) {
                picked = Some(candidate);
                break;
            }
        }
        let index = picked.unwrap_or_else(|| {
            (0..bound)
                .find(|i| !triple.contains(i))
                .unwrap_or_default()
        });
        triple.push(index);
    }
    [triple[0], triple[1], triple[2]]
}

/// Hash-based source: `sha256(seed || nonce || requester) mod bound`.
#[derive(Clone)]
pub struct HashIndexSource {
    seed: [u8; 32],
    nonce: u64,
}

impl HashIndexSource {
    /// Seeds from OS randomness.
    pub fn new() -> Self {
        Self::with_entropy(generate_entropy())
    }

    pub fn with_entropy(seed: [u8; 32]) -> Self {
        tracing::debug!("🎲 Index source seeded ({}…)", &hex::encode(seed)[..8]);
        Self { seed, nonce: 0 }
    }
}

impl Default for HashIndexSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSource for HashIndexSource {
    fn next_index(&mut self, requester: &Identity, bound: OracleIndex) -> OracleIndex {
        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(requester.as_str().as_bytes());
        let digest = hasher.finalize();
        self.nonce = self.nonce.wrapping_add(1);

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(head) % u64::from(bound.max(1))) as OracleIndex
    }
}

/// Adapter over any `rand` generator.
pub struct RngIndexSource<R> {
    rng: R,
}

impl<R: RngCore + Send + Sync> RngIndexSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore + Send + Sync> IndexSource for RngIndexSource<R> {
    fn next_index(&mut self, _requester: &Identity, bound: OracleIndex) -> OracleIndex {
        self.rng.gen_range(0..bound.max(1))
    }
}

/// Replays a fixed sequence of indexes, cycling when exhausted.
#[derive(Debug, Clone, Default)]
pub struct SequenceIndexSource {
    values: VecDeque<OracleIndex>,
}

impl SequenceIndexSource {
    pub fn new(values: impl IntoIterator<Item = OracleIndex>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl IndexSource for SequenceIndexSource {
    fn next_index(&mut self, _requester: &Identity, bound: OracleIndex) -> OracleIndex {
        match self.values.pop_front() {
            Some(value) => {
                self.values.push_back(value);
                value % bound.max(1)
            }
            None => 0,
        }
    }
}
