//! Fully independent hash source.
//!
//! Every repetition owns a disjoint slice of sampled functions. This is
//! the default: the failure bound is exact for it, at the price of
//! `R · ⌈L / bits_per_function⌉` function evaluations per hashed point.

use std::io::{Read, Write};

use rand::rngs::StdRng;

use crate::error::{IndexError, Result};
use crate::lsh::{LshFamily, LshFunction};
use crate::source::{concatenate, sample_functions};
use crate::word::LshWord;

pub struct Independent<F: LshFamily> {
    functions: Vec<F::Function>,
    per_rep: u32,
}

impl<F: LshFamily> Independent<F> {
    pub(crate) fn sample(family: &F, repetitions: u32, code_bits: u32, rng: &mut StdRng) -> Self {
        let per_rep = code_bits.div_ceil(family.bits_per_function());
        let functions = sample_functions(family, (repetitions * per_rep) as usize, rng);
        Independent { functions, per_rep }
    }

    pub(crate) fn hash_into<W: LshWord>(
        &self,
        family: &F,
        point: &[F::Elem],
        code_bits: u32,
        out: &mut Vec<W>,
    ) {
        let bpf = family.bits_per_function();
        for slice in self.functions.chunks_exact(self.per_rep as usize) {
            out.push(concatenate(slice.iter().map(|f| f.hash(point)), code_bits, bpf));
        }
    }

    pub(crate) fn write_to<W: Write>(&self, family: &F, w: &mut W) -> Result<()> {
        for f in &self.functions {
            family.write_function(f, w)?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(
        family: &F,
        repetitions: u32,
        code_bits: u32,
        r: &mut R,
    ) -> Result<Self> {
        let per_rep = code_bits.div_ceil(family.bits_per_function());
        let count = repetitions.checked_mul(per_rep).ok_or_else(|| {
            IndexError::CorruptSnapshot("hash source shape overflows".into())
        })?;
        let mut functions = Vec::with_capacity(count as usize);
        for _ in 0..count {
            functions.push(family.read_function(r)?);
        }
        Ok(Independent { functions, per_rep })
    }
}
