//! Hash sources: turning one family into many repetitions.
//!
//! A hash source owns sampled functions from an [`LshFamily`] and derives
//! one concatenated code per repetition from them. Three strategies trade
//! hashing cost against independence:
//!
//! - [`Independent`](independent::Independent): every repetition owns its
//!   own functions. Highest quality, most hashing work.
//! - [`Pool`](pool::Pool): repetitions sample (with replacement) from a
//!   shared function pool, so far fewer functions are evaluated per point.
//! - [`Tensored`](tensor::Tensored): repetitions pair half-codes from two
//!   √R-sized banks, cutting hashing to O(√R) per point.
//!
//! All three expose the same failure bound — the probability that a point
//! at a given similarity stayed hidden after a number of repetitions at
//! the current prefix length, with the rest still at the previous, longer
//! length. Pool and tensored codes are not actually independent across
//! repetitions; they reuse the independent bound anyway and accept the
//! under-estimate.

use std::io::{Read, Write};

use rand::rngs::StdRng;

use crate::error::{IndexError, Result};
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_u32, read_u8, write_u32, write_u8};
use crate::word::LshWord;

pub mod independent;
pub mod pool;
pub mod tensor;

use independent::Independent;
use pool::Pool;
use tensor::Tensored;

/// Which hash source to build, with its per-strategy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategy {
    /// Disjoint functions per repetition.
    Independent,
    /// A shared pool of `pool_bits` worth of functions.
    Pool { pool_bits: u32 },
    /// Paired half-codes from two √R banks.
    Tensored,
}

impl Default for HashStrategy {
    fn default() -> Self {
        HashStrategy::Independent
    }
}

impl HashStrategy {
    /// Bytes of function state the strategy needs for `tables` repetitions
    /// of `code_bits` each. Used by the memory planner.
    pub fn source_memory<F: LshFamily>(&self, family: &F, code_bits: u32, tables: u32) -> u64 {
        let bpf = family.bits_per_function();
        let per_rep = code_bits.div_ceil(bpf) as u64;
        match *self {
            HashStrategy::Independent => tables as u64 * per_rep * family.function_memory(),
            HashStrategy::Pool { pool_bits } => {
                let pool = (pool_bits / bpf).max(1) as u64;
                pool * family.function_memory() + tables as u64 * per_rep * 2
            }
            HashStrategy::Tensored => {
                let groups = (tables as f64).sqrt().ceil() as u64;
                let per_half = (code_bits / 2).div_ceil(bpf) as u64;
                2 * groups * per_half * family.function_memory()
            }
        }
    }

    fn to_wire(self) -> u8 {
        match self {
            HashStrategy::Independent => 0,
            HashStrategy::Pool { .. } => 1,
            HashStrategy::Tensored => 2,
        }
    }
}

/// Concatenate sub-hash values into a `bits`-wide code.
///
/// The first value lands in the most significant position. When `bits` is
/// not a multiple of the function width, the last function contributes
/// only its high bits — the same result as building the full concatenation
/// in a wider register and shifting the excess off the low end.
pub(crate) fn concatenate<W: LshWord>(
    values: impl Iterator<Item = u64>,
    bits: u32,
    bpf: u32,
) -> W {
    let mut word = W::ZERO;
    let mut remaining = bits;
    for value in values {
        if remaining == 0 {
            break;
        }
        let take = bpf.min(remaining);
        word = word.concat(value >> (bpf - take), take);
        remaining -= take;
    }
    debug_assert_eq!(remaining, 0, "not enough functions for {bits} bits");
    word
}

/// A built hash source: family plus per-repetition derivation state.
pub struct HashSource<F: LshFamily> {
    family: F,
    repetitions: u32,
    code_bits: u32,
    inner: Inner<F>,
}

enum Inner<F: LshFamily> {
    Independent(Independent<F>),
    Pool(Pool<F>),
    Tensored(Tensored<F>),
}

impl<F: LshFamily> HashSource<F> {
    /// Sample a source producing `repetitions` codes of `code_bits` bits.
    pub fn build(
        family: F,
        strategy: HashStrategy,
        repetitions: u32,
        code_bits: u32,
        rng: &mut StdRng,
    ) -> Self {
        let inner = match strategy {
            HashStrategy::Independent => {
                Inner::Independent(Independent::sample(&family, repetitions, code_bits, rng))
            }
            HashStrategy::Pool { pool_bits } => {
                Inner::Pool(Pool::sample(&family, pool_bits, repetitions, code_bits, rng))
            }
            HashStrategy::Tensored => {
                Inner::Tensored(Tensored::sample(&family, repetitions, code_bits, rng))
            }
        };
        HashSource { family, repetitions, code_bits, inner }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// The strategy this source was built with.
    pub fn strategy(&self) -> HashStrategy {
        match &self.inner {
            Inner::Independent(_) => HashStrategy::Independent,
            Inner::Pool(p) => HashStrategy::Pool { pool_bits: p.pool_bits() },
            Inner::Tensored(_) => HashStrategy::Tensored,
        }
    }

    pub fn code_bits(&self) -> u32 {
        self.code_bits
    }

    pub fn bits_per_function(&self) -> u32 {
        self.family.bits_per_function()
    }

    pub fn family(&self) -> &F {
        &self.family
    }

    /// Compute all repetition codes for one point.
    pub fn hash_repetitions<W: LshWord>(&self, point: &[F::Elem]) -> Vec<W> {
        let mut out = Vec::with_capacity(self.repetitions as usize);
        self.hash_repetitions_into(point, &mut out);
        out
    }

    /// Like [`hash_repetitions`](Self::hash_repetitions), reusing `out`.
    pub fn hash_repetitions_into<W: LshWord>(&self, point: &[F::Elem], out: &mut Vec<W>) {
        out.clear();
        match &self.inner {
            Inner::Independent(s) => s.hash_into(&self.family, point, self.code_bits, out),
            Inner::Pool(s) => s.hash_into(&self.family, point, self.code_bits, out),
            Inner::Tensored(s) => {
                s.hash_into(&self.family, point, self.repetitions, self.code_bits, out)
            }
        }
    }

    /// Probability of two points at `similarity` agreeing on a
    /// `num_bits`-long code prefix.
    pub fn collision_probability(&self, similarity: f32, num_bits: u32) -> f32 {
        self.family.collision_probability(similarity, num_bits)
    }

    /// Probability that no point with similarity ≥ `kth_sim` surfaced
    /// after `tables_done` of `max_tables` repetitions were searched at
    /// `prefix_bits`, the remainder still at the previous length.
    pub fn failure_probability(
        &self,
        prefix_bits: u32,
        tables_done: u32,
        max_tables: u32,
        kth_sim: f32,
    ) -> f32 {
        let bpf = self.family.bits_per_function();
        let cur = self.family.collision_probability(kth_sim, prefix_bits);
        let prev_bits = (prefix_bits + bpf).min(self.code_bits);
        let prev = self.family.collision_probability(kth_sim, prev_bits);
        (1.0 - cur).powi(tables_done as i32) * (1.0 - prev).powi((max_tables - tables_done) as i32)
    }

    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u8(w, self.strategy().to_wire())?;
        write_u32(w, self.repetitions)?;
        write_u32(w, self.code_bits)?;
        match &self.inner {
            Inner::Independent(s) => s.write_to(&self.family, w),
            Inner::Pool(s) => s.write_to(&self.family, w),
            Inner::Tensored(s) => s.write_to(&self.family, w),
        }
    }

    pub(crate) fn read_from<R: Read>(family: F, r: &mut R) -> Result<Self> {
        let tag = read_u8(r)?;
        let repetitions = read_u32(r)?;
        let code_bits = read_u32(r)?;
        let inner = match tag {
            0 => Inner::Independent(Independent::read_from(&family, repetitions, code_bits, r)?),
            1 => Inner::Pool(Pool::read_from(&family, r)?),
            2 => Inner::Tensored(Tensored::read_from(&family, r)?),
            other => {
                return Err(IndexError::CorruptSnapshot(format!("unknown hash source tag {other}")))
            }
        };
        Ok(HashSource { family, repetitions, code_bits, inner })
    }
}

/// Shared helper: sample `n` functions from a family.
pub(crate) fn sample_functions<F: LshFamily>(
    family: &F,
    n: usize,
    rng: &mut StdRng,
) -> Vec<F::Function> {
    (0..n).map(|_| family.sample(rng)).collect()
}

/// Shared helper: evaluate functions on a point.
pub(crate) fn evaluate<F: LshFamily>(functions: &[F::Function], point: &[F::Elem]) -> Vec<u64> {
    functions.iter().map(|f| f.hash(point)).collect()
}
