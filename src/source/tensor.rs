//! Tensored hash source.
//!
//! Codes are split in two halves. Two banks of ⌈√R⌉ half-codes are hashed
//! per point and every repetition combines one left and one right half by
//! bit interleaving, so relaxing the combined prefix shortens both halves
//! evenly. Hashing cost is O(√R) per point; repetitions sharing a half are
//! pairwise dependent.

use std::io::{Read, Write};

use rand::rngs::StdRng;

use crate::error::Result;
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_u32, write_u32};
use crate::source::{concatenate, sample_functions};
use crate::word::{interleave, LshWord};

pub struct Tensored<F: LshFamily> {
    left: Vec<F::Function>,
    right: Vec<F::Function>,
    groups: u32,
    per_half: u32,
}

impl<F: LshFamily> Tensored<F> {
    pub(crate) fn sample(family: &F, repetitions: u32, code_bits: u32, rng: &mut StdRng) -> Self {
        debug_assert!(code_bits % 2 == 0, "tensoring needs an even code length");
        let half_bits = code_bits / 2;
        let groups = (repetitions as f64).sqrt().ceil() as u32;
        let per_half = half_bits.div_ceil(family.bits_per_function());
        let bank = |rng: &mut StdRng| sample_functions(family, (groups * per_half) as usize, rng);
        Tensored { left: bank(rng), right: bank(rng), groups, per_half }
    }

    pub(crate) fn hash_into<W: LshWord>(
        &self,
        family: &F,
        point: &[F::Elem],
        repetitions: u32,
        code_bits: u32,
        out: &mut Vec<W>,
    ) {
        let bpf = family.bits_per_function();
        let half_bits = code_bits / 2;
        let halves = |bank: &[F::Function]| -> Vec<W> {
            bank.chunks_exact(self.per_half as usize)
                .map(|slice| concatenate(slice.iter().map(|f| f.hash(point)), half_bits, bpf))
                .collect()
        };
        let left = halves(&self.left);
        let right = halves(&self.right);
        for rep in 0..repetitions {
            let l = left[(rep / self.groups) as usize];
            let r = right[(rep % self.groups) as usize];
            out.push(interleave(l, r, half_bits));
        }
    }

    pub(crate) fn write_to<W: Write>(&self, family: &F, w: &mut W) -> Result<()> {
        write_u32(w, self.groups)?;
        write_u32(w, self.per_half)?;
        for f in self.left.iter().chain(&self.right) {
            family.write_function(f, w)?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(family: &F, r: &mut R) -> Result<Self> {
        let groups = read_u32(r)?;
        let per_half = read_u32(r)?;
        let bank_len = (groups * per_half) as usize;
        let mut bank = |r: &mut R| -> Result<Vec<F::Function>> {
            let mut fs = Vec::with_capacity(bank_len.min(1 << 20));
            for _ in 0..bank_len {
                fs.push(family.read_function(r)?);
            }
            Ok(fs)
        };
        let left = bank(r)?;
        let right = bank(r)?;
        Ok(Tensored { left, right, groups, per_half })
    }
}
