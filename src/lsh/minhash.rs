//! MinHash for jaccard similarity.
//!
//! Each function holds a random permutation of the id universe and maps a
//! set to the smallest permuted rank of its members. Two sets agree on that
//! minimum exactly when it falls in their intersection, so a full-width
//! function collides with probability J(A, B).
//!
//! [`MinHashOneBit`] keeps only the lowest bit of the rank, trading
//! per-function selectivity ((1 + J) / 2 instead of J) for one bit of code,
//! which is the usual choice for 64-bit filter sketches.

use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::dataset::DatasetDescription;
use crate::error::Result;
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_vec, write_slice};

/// Permutation MinHash family over sets of ids in `[0, universe)`.
#[derive(Debug, Clone)]
pub struct MinHash {
    universe: u32,
    bits: u32,
}

/// One sampled permutation.
pub struct MinHashFunction {
    permutation: Vec<u32>,
    universe: u32,
}

impl MinHash {
    pub fn new(desc: &DatasetDescription) -> Self {
        let universe = desc.args.max(1);
        // Ranks go up to `universe` inclusive: the empty set hashes to the
        // one value no member can produce.
        let bits = 32 - universe.leading_zeros();
        MinHash { universe, bits }
    }
}

impl LshFunction for MinHashFunction {
    type Elem = u32;

    #[inline]
    fn hash(&self, point: &[u32]) -> u64 {
        point
            .iter()
            .map(|&e| self.permutation[e as usize])
            .min()
            .unwrap_or(self.universe) as u64
    }
}

impl LshFamily for MinHash {
    type Elem = u32;
    type Function = MinHashFunction;

    fn sample(&self, rng: &mut StdRng) -> MinHashFunction {
        let mut permutation: Vec<u32> = (0..self.universe).collect();
        permutation.shuffle(rng);
        MinHashFunction { permutation, universe: self.universe }
    }

    fn bits_per_function(&self) -> u32 {
        self.bits
    }

    fn function_probability(&self, similarity: f32) -> f32 {
        similarity.clamp(0.0, 1.0)
    }

    /// A prefix that cuts through a rank keeps its `rem` top bits: two
    /// distinct minima still agree on those with probability about
    /// `2^-rem`, so the truncated factor is `J + (1 - J) / 2^rem` rather
    /// than a geometric interpolation.
    fn collision_probability(&self, similarity: f32, num_bits: u32) -> f32 {
        let j = similarity.clamp(0.0, 1.0);
        let full = (num_bits / self.bits) as i32;
        let rem = num_bits % self.bits;
        let mut p = j.powi(full);
        if rem > 0 {
            p *= j + (1.0 - j) / (1u64 << rem) as f32;
        }
        p
    }

    fn icollision_probability(&self, p: f32) -> f32 {
        p.clamp(0.0, 1.0)
    }

    fn function_memory(&self) -> u64 {
        self.universe as u64 * 4
    }

    fn write_function<W: Write>(&self, f: &MinHashFunction, w: &mut W) -> Result<()> {
        write_slice(w, &f.permutation)
    }

    fn read_function<R: Read>(&self, r: &mut R) -> Result<MinHashFunction> {
        Ok(MinHashFunction { permutation: read_vec(r, "minhash permutation")?, universe: self.universe })
    }
}

/// One-bit MinHash: the parity of the permuted rank.
#[derive(Debug, Clone)]
pub struct MinHashOneBit {
    inner: MinHash,
}

/// A [`MinHashFunction`] truncated to its lowest bit.
pub struct MinHashOneBitFunction {
    inner: MinHashFunction,
}

impl MinHashOneBit {
    pub fn new(desc: &DatasetDescription) -> Self {
        MinHashOneBit { inner: MinHash::new(desc) }
    }
}

impl LshFunction for MinHashOneBitFunction {
    type Elem = u32;

    #[inline]
    fn hash(&self, point: &[u32]) -> u64 {
        self.inner.hash(point) & 1
    }
}

impl LshFamily for MinHashOneBit {
    type Elem = u32;
    type Function = MinHashOneBitFunction;

    fn sample(&self, rng: &mut StdRng) -> MinHashOneBitFunction {
        MinHashOneBitFunction { inner: self.inner.sample(rng) }
    }

    fn bits_per_function(&self) -> u32 {
        1
    }

    fn function_probability(&self, similarity: f32) -> f32 {
        // Collides when the minimum is shared (J) or when two distinct
        // minima agree on parity (probability 1/2 of the remainder).
        (1.0 + similarity.clamp(0.0, 1.0)) / 2.0
    }

    fn icollision_probability(&self, p: f32) -> f32 {
        (2.0 * p - 1.0).clamp(0.0, 1.0)
    }

    fn function_memory(&self) -> u64 {
        self.inner.function_memory()
    }

    fn write_function<W: Write>(&self, f: &MinHashOneBitFunction, w: &mut W) -> Result<()> {
        self.inner.write_function(&f.inner, w)
    }

    fn read_function<R: Read>(&self, r: &mut R) -> Result<MinHashOneBitFunction> {
        Ok(MinHashOneBitFunction { inner: self.inner.read_function(r)? })
    }
}
