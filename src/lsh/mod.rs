//! Locality-sensitive hash families.
//!
//! A family hands out sub-hash functions; a [hash source](crate::source)
//! concatenates several of them into per-repetition codes. The engine only
//! relies on the contract below: sampled functions map a stored point to a
//! small integer, and the family can price collisions — the probability
//! that two points of a given similarity agree on a concatenation of a
//! given bit length, monotone non-increasing in that length.
//!
//! Implemented families:
//!
//! | Family | Similarity | Bits/function |
//! |--------|------------|---------------|
//! | [`SimHash`](simhash::SimHash) | angular | 1 |
//! | [`CrossPolytope`](crosspolytope::CrossPolytope) | angular | log2(2·dim′) |
//! | [`MinHash`](minhash::MinHash) | jaccard | log2(universe)+1 |
//! | [`MinHashOneBit`](minhash::MinHashOneBit) | jaccard | 1 |
//! | [`L2Hash`](euclidean::L2Hash) | euclidean | 4 |
//!
//! # References
//!
//! - Charikar (2002): "Similarity estimation techniques from rounding
//!   algorithms" (SimHash)
//! - Andoni et al. (2015): "Practical and optimal LSH for angular distance"
//!   (cross-polytope)
//! - Broder (1997): "On the resemblance and containment of documents"
//!   (MinHash)
//! - Datar et al. (2004): "Locality-sensitive hashing scheme based on
//!   p-stable distributions" (bucketed projections)

use std::io::{Read, Write};

use rand::rngs::StdRng;

use crate::error::Result;

pub mod crosspolytope;
pub mod euclidean;
pub mod minhash;
pub mod simhash;

pub use crosspolytope::CrossPolytope;
pub use euclidean::L2Hash;
pub use minhash::{MinHash, MinHashOneBit};
pub use simhash::SimHash;

/// A sampled sub-hash function.
pub trait LshFunction: Send + Sync {
    type Elem: Copy;

    /// Map a stored point to an integer of the family's
    /// `bits_per_function` bits.
    fn hash(&self, point: &[Self::Elem]) -> u64;
}

/// A family of locality-sensitive sub-hash functions.
pub trait LshFamily: Send + Sync + Sized {
    type Elem: Copy;
    type Function: LshFunction<Elem = Self::Elem>;

    /// Draw a fresh function.
    fn sample(&self, rng: &mut StdRng) -> Self::Function;

    /// Width of a single function's output.
    fn bits_per_function(&self) -> u32;

    /// Collision probability of one sub-hash at `similarity`.
    ///
    /// Must be monotone non-decreasing in `similarity` and land in [0, 1].
    fn function_probability(&self, similarity: f32) -> f32;

    /// Probability that two points at `similarity` agree on the first
    /// `num_bits` bits of a concatenated code.
    ///
    /// Fractional function counts interpolate geometrically, which keeps
    /// the value monotone non-increasing in `num_bits` even when a prefix
    /// boundary cuts through a sub-hash.
    fn collision_probability(&self, similarity: f32, num_bits: u32) -> f32 {
        let p = self.function_probability(similarity);
        p.powf(num_bits as f32 / self.bits_per_function() as f32)
    }

    /// Similarity at which a single sub-hash collides with probability `p`.
    ///
    /// The default inverts [`function_probability`](Self::function_probability)
    /// by bisection; families with a closed form override it.
    fn icollision_probability(&self, p: f32) -> f32 {
        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        for _ in 0..40 {
            let mid = (lo + hi) / 2.0;
            if self.function_probability(mid) < p {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        (lo + hi) / 2.0
    }

    /// Approximate bytes one sampled function occupies, for the planner.
    fn function_memory(&self) -> u64;

    /// Serialize a sampled function.
    fn write_function<W: Write>(&self, f: &Self::Function, w: &mut W) -> Result<()>;

    /// Counterpart of [`write_function`](Self::write_function).
    fn read_function<R: Read>(&self, r: &mut R) -> Result<Self::Function>;
}
