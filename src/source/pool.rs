//! Pooled hash source.
//!
//! A fixed pool of functions is evaluated once per point; each repetition
//! concatenates a random (with replacement) selection of pool members.
//! Hashing cost drops from `R · ⌈L/b⌉` to `pool_size` evaluations, but
//! repetitions sharing pool members are correlated, so recall can fall
//! short of the independent bound when the pool is too small.

use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand::Rng;
use smallvec::SmallVec;

use crate::error::{IndexError, Result};
use crate::lsh::LshFamily;
use crate::serialize::{read_u32, write_u32, write_u64};
use crate::source::{concatenate, evaluate, sample_functions};
use crate::word::LshWord;

/// Pool member choices of one repetition; 8 covers 24-bit codes down to
/// 3-bit functions without spilling.
type RepIndices = SmallVec<[u16; 8]>;

pub struct Pool<F: LshFamily> {
    functions: Vec<F::Function>,
    indices: Vec<RepIndices>,
    pool_bits: u32,
}

impl<F: LshFamily> Pool<F> {
    pub(crate) fn sample(
        family: &F,
        pool_bits: u32,
        repetitions: u32,
        code_bits: u32,
        rng: &mut StdRng,
    ) -> Self {
        let bpf = family.bits_per_function();
        let pool_size = (pool_bits / bpf).max(1) as usize;
        let functions = sample_functions(family, pool_size, rng);
        let per_rep = code_bits.div_ceil(bpf);
        let indices = (0..repetitions)
            .map(|_| (0..per_rep).map(|_| rng.gen_range(0..pool_size as u16)).collect())
            .collect();
        Pool { functions, indices, pool_bits }
    }

    pub(crate) fn pool_bits(&self) -> u32 {
        self.pool_bits
    }

    pub(crate) fn hash_into<W: LshWord>(
        &self,
        family: &F,
        point: &[F::Elem],
        code_bits: u32,
        out: &mut Vec<W>,
    ) {
        let bpf = family.bits_per_function();
        let pool = evaluate::<F>(&self.functions, point);
        for rep in &self.indices {
            out.push(concatenate(rep.iter().map(|&i| pool[i as usize]), code_bits, bpf));
        }
    }

    pub(crate) fn write_to<W: Write>(&self, family: &F, w: &mut W) -> Result<()> {
        write_u32(w, self.pool_bits)?;
        write_u64(w, self.functions.len() as u64)?;
        for f in &self.functions {
            family.write_function(f, w)?;
        }
        write_u64(w, self.indices.len() as u64)?;
        for rep in &self.indices {
            write_u64(w, rep.len() as u64)?;
            for &i in rep {
                write_u32(w, i as u32)?;
            }
        }
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(family: &F, r: &mut R) -> Result<Self> {
        let pool_bits = read_u32(r)?;
        let pool_size = crate::serialize::read_len(r, "hash pool")?;
        let mut functions = Vec::with_capacity(pool_size.min(1 << 20));
        for _ in 0..pool_size {
            functions.push(family.read_function(r)?);
        }
        let reps = crate::serialize::read_len(r, "pool repetitions")?;
        let mut indices = Vec::with_capacity(reps.min(1 << 20));
        for _ in 0..reps {
            let len = crate::serialize::read_len(r, "pool selection")?;
            let mut rep = RepIndices::new();
            for _ in 0..len {
                let i = read_u32(r)?;
                if i as usize >= pool_size {
                    return Err(IndexError::CorruptSnapshot(format!(
                        "pool selection {i} out of range {pool_size}"
                    )));
                }
                rep.push(i as u16);
            }
            indices.push(rep);
        }
        Ok(Pool { functions, indices, pool_bits })
    }
}
