//! Cross-polytope LSH for angular similarity.
//!
//! A point is pseudo-rotated by three rounds of sign flips and fast
//! Hadamard transforms, then snapped to the nearest signed basis vector of
//! the padded space. The function value encodes that axis and its sign, so
//! one function yields log2(2·dim′) bits at once.
//!
//! The collision probability uses the asymptotic bound of Andoni et al.:
//! for unit vectors at squared euclidean distance τ², a single hash
//! collides with probability ≈ (2·dim′)^(−τ²/(4−τ²)).

use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand::Rng;

use crate::dataset::DatasetDescription;
use crate::error::Result;
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_vec, write_slice};

/// Pseudo-rotation cross-polytope family.
#[derive(Debug, Clone)]
pub struct CrossPolytope {
    storage_len: u32,
    padded_len: u32,
}

/// One sampled pseudo-rotation: three diagonal ±1 matrices.
pub struct CrossPolytopeFunction {
    diagonals: [Vec<f32>; 3],
}

impl CrossPolytope {
    pub fn new(desc: &DatasetDescription) -> Self {
        let padded_len = desc.storage_len.next_power_of_two().max(2);
        CrossPolytope { storage_len: desc.storage_len, padded_len }
    }
}

/// In-place fast Hadamard transform; `v.len()` must be a power of two.
fn fht(v: &mut [f32]) {
    let n = v.len();
    let mut half = 1;
    while half < n {
        let mut i = 0;
        while i < n {
            for j in i..i + half {
                let x = v[j];
                let y = v[j + half];
                v[j] = x + y;
                v[j + half] = x - y;
            }
            i += 2 * half;
        }
        half *= 2;
    }
}

impl LshFunction for CrossPolytopeFunction {
    type Elem = f32;

    fn hash(&self, point: &[f32]) -> u64 {
        let padded = self.diagonals[0].len();
        let mut buf = vec![0.0f32; padded];
        buf[..point.len()].copy_from_slice(point);
        for diag in &self.diagonals {
            for (x, d) in buf.iter_mut().zip(diag) {
                *x *= d;
            }
            fht(&mut buf);
        }
        let mut best = 0;
        let mut best_abs = buf[0].abs();
        for (i, &x) in buf.iter().enumerate().skip(1) {
            if x.abs() > best_abs {
                best = i;
                best_abs = x.abs();
            }
        }
        ((best as u64) << 1) | (buf[best] < 0.0) as u64
    }
}

impl LshFamily for CrossPolytope {
    type Elem = f32;
    type Function = CrossPolytopeFunction;

    fn sample(&self, rng: &mut StdRng) -> CrossPolytopeFunction {
        let diag = |rng: &mut StdRng| {
            (0..self.padded_len).map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 }).collect()
        };
        CrossPolytopeFunction { diagonals: [diag(rng), diag(rng), diag(rng)] }
    }

    fn bits_per_function(&self) -> u32 {
        // Axis index plus sign: values in [0, 2 * padded_len).
        self.padded_len.trailing_zeros() + 1
    }

    fn function_probability(&self, similarity: f32) -> f32 {
        let sim = similarity.clamp(0.0, 1.0);
        if sim >= 1.0 {
            return 1.0;
        }
        // Unit vectors: cos = 2 * sim - 1, tau^2 = 2 - 2 cos = 4 - 4 sim.
        let tau_sq = 4.0 - 4.0 * sim;
        if tau_sq >= 4.0 - 1e-6 {
            return 0.0;
        }
        let vocab = (2 * self.padded_len) as f32;
        vocab.powf(-tau_sq / (4.0 - tau_sq))
    }

    /// Like MinHash, a prefix cutting through an axis value keeps its top
    /// `rem` bits, on which two differing axes still agree with
    /// probability about `2^-rem`.
    fn collision_probability(&self, similarity: f32, num_bits: u32) -> f32 {
        let bits = self.bits_per_function();
        let p1 = self.function_probability(similarity);
        let full = (num_bits / bits) as i32;
        let rem = num_bits % bits;
        let mut p = p1.powi(full);
        if rem > 0 {
            p *= p1 + (1.0 - p1) / (1u64 << rem) as f32;
        }
        p
    }

    fn function_memory(&self) -> u64 {
        3 * self.padded_len as u64 * 4
    }

    fn write_function<W: Write>(&self, f: &CrossPolytopeFunction, w: &mut W) -> Result<()> {
        for diag in &f.diagonals {
            write_slice(w, diag)?;
        }
        Ok(())
    }

    fn read_function<R: Read>(&self, r: &mut R) -> Result<CrossPolytopeFunction> {
        let a = read_vec(r, "cross-polytope diagonal")?;
        let b = read_vec(r, "cross-polytope diagonal")?;
        let c = read_vec(r, "cross-polytope diagonal")?;
        Ok(CrossPolytopeFunction { diagonals: [a, b, c] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FormatTag;
    use rand::SeedableRng;

    #[test]
    fn fht_matches_direct_transform() {
        let mut v = vec![1.0, 0.0, 0.0, 0.0];
        fht(&mut v);
        assert_eq!(v, vec![1.0, 1.0, 1.0, 1.0]);

        let mut v = vec![1.0, 1.0, 1.0, 1.0];
        fht(&mut v);
        assert_eq!(v, vec![4.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn hash_stays_in_declared_range() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 10);
        let family = CrossPolytope::new(&desc);
        let bits = family.bits_per_function();
        let mut rng = StdRng::seed_from_u64(3);
        let point: Vec<f32> = (0..desc.storage_len).map(|i| (i as f32).sin()).collect();
        for _ in 0..32 {
            let f = family.sample(&mut rng);
            assert!(f.hash(&point) < 1 << bits);
        }
    }

    #[test]
    fn probability_endpoints() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 16);
        let family = CrossPolytope::new(&desc);
        assert!((family.function_probability(1.0) - 1.0).abs() < 1e-6);
        assert!(family.function_probability(0.0) < 1e-6);
        // Orthogonal vectors collide with probability 1/vocab.
        let p = family.function_probability(0.5);
        let vocab = 2.0 * desc.storage_len.next_power_of_two() as f32;
        assert!((p - 1.0 / vocab).abs() < 1e-4);
    }

    #[test]
    fn near_duplicates_usually_collide() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 8);
        let family = CrossPolytope::new(&desc);
        let mut rng = StdRng::seed_from_u64(11);
        let dim = desc.storage_len as usize;
        let mut a = vec![0.0f32; dim];
        a[0] = 1.0;
        let mut b = vec![0.02f32; dim];
        b[0] = 1.0;
        let norm: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in &mut b {
            *x /= norm;
        }
        let mut hits = 0;
        for _ in 0..200 {
            let f = family.sample(&mut rng);
            if f.hash(&a) == f.hash(&b) {
                hits += 1;
            }
        }
        assert!(hits > 150, "only {hits}/200 collisions for near-duplicates");
    }
}
