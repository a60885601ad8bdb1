//! Filter sketches.
//!
//! Every point carries a handful of 64-bit sketches, one per sketch
//! repetition. Before paying for an exact similarity, the query compares
//! its own sketch against the candidate's with a popcount; candidates
//! whose Hamming distance exceeds a similarity-derived threshold are
//! discarded. The threshold is chosen so a point actually at the current
//! kth similarity still survives with probability at least one half.

use std::io::{Read, Write};

use crate::dataset::VectorId;
use crate::error::{IndexError, Result};
use crate::serialize::{read_u32, read_vec, write_slice, write_u32};
use crate::word::LshWord;

/// Bits in a filter sketch.
pub const NUM_FILTER_HASHBITS: u32 = 64;

/// Dense point-major store of per-repetition sketches.
pub struct SketchStore {
    rows: Vec<u64>,
    repetitions: u32,
}

impl SketchStore {
    pub fn new(repetitions: u32) -> Self {
        SketchStore { rows: Vec::new(), repetitions }
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }

    /// Number of points with stored sketches.
    pub fn len(&self) -> u32 {
        (self.rows.len() / self.repetitions.max(1) as usize) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append one point's sketches; points must arrive in id order.
    pub fn push_row(&mut self, sketches: &[u64]) {
        debug_assert_eq!(sketches.len(), self.repetitions as usize);
        self.rows.extend_from_slice(sketches);
    }

    /// Sketch of `id` under repetition `rep`.
    #[inline]
    pub fn get(&self, id: VectorId, rep: u32) -> u64 {
        self.rows[id as usize * self.repetitions as usize + rep as usize]
    }

    /// Does `id` pass the filter against `query_sketch` at `threshold`?
    #[inline]
    pub fn admits(&self, query_sketch: u64, id: VectorId, rep: u32, threshold: u32) -> bool {
        query_sketch.hamming(self.get(id, rep)) <= threshold
    }

    /// Bytes `n` points of `repetitions` sketches occupy.
    pub fn memory_usage(n: u64, repetitions: u64) -> u64 {
        n * repetitions * 8
    }

    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u32(w, self.repetitions)?;
        write_slice(w, &self.rows)
    }

    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let repetitions = read_u32(r)?;
        let rows: Vec<u64> = read_vec(r, "sketch rows")?;
        if repetitions == 0 && !rows.is_empty()
            || repetitions > 0 && rows.len() % repetitions as usize != 0
        {
            return Err(IndexError::CorruptSnapshot("sketch rows not a repetition multiple".into()));
        }
        Ok(SketchStore { rows, repetitions })
    }
}

/// Largest Hamming distance a candidate may have and still be admitted,
/// given the sketch family's per-bit collision probability at the current
/// kth similarity.
///
/// Sketch bits disagree independently with probability `1 − p`, so the
/// distance of a point at exactly the kth similarity is binomial with
/// mean `64 · (1 − p)`. Admitting up to the mean plus 1.28 standard
/// deviations keeps such a point with probability ≥ 0.9. The termination
/// bound does not account for filter misses, so the survival constant
/// must stay near one; rejected near-neighbors get a fresh draw each
/// phase from the rotated sketch repetition, pushing effective survival
/// higher still.
pub fn sketch_threshold(bit_collision_probability: f32) -> u32 {
    let p = bit_collision_probability.clamp(0.0, 1.0);
    let miss = 1.0 - p;
    let bits = NUM_FILTER_HASHBITS as f32;
    let mean = bits * miss;
    let sigma = (bits * miss * p).sqrt();
    ((mean + 1.28 * sigma).ceil() as u32).min(NUM_FILTER_HASHBITS)
}
