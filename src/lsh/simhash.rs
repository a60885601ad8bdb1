//! SimHash: one-bit hyperplane rounding for angular similarity.
//!
//! Each function draws a gaussian vector and reports the sign of the dot
//! product. Two unit vectors at angle θ land on the same side of a random
//! hyperplane with probability 1 − θ/π, which ties the per-bit collision
//! probability directly to angular similarity.

use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use crate::dataset::DatasetDescription;
use crate::error::Result;
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_vec, write_slice};

/// Hyperplane-rounding family over unit vectors.
#[derive(Debug, Clone)]
pub struct SimHash {
    storage_len: u32,
}

/// One sampled hyperplane.
pub struct SimHashFunction {
    plane: Vec<f32>,
}

impl SimHash {
    pub fn new(desc: &DatasetDescription) -> Self {
        SimHash { storage_len: desc.storage_len }
    }
}

impl LshFunction for SimHashFunction {
    type Elem = f32;

    #[inline]
    fn hash(&self, point: &[f32]) -> u64 {
        let dot: f32 = self.plane.iter().zip(point).map(|(a, b)| a * b).sum();
        (dot >= 0.0) as u64
    }
}

impl LshFamily for SimHash {
    type Elem = f32;
    type Function = SimHashFunction;

    fn sample(&self, rng: &mut StdRng) -> SimHashFunction {
        let plane = (0..self.storage_len).map(|_| StandardNormal.sample(rng)).collect();
        SimHashFunction { plane }
    }

    fn bits_per_function(&self) -> u32 {
        1
    }

    fn function_probability(&self, similarity: f32) -> f32 {
        // similarity = (1 + cos θ) / 2
        let cos = (2.0 * similarity - 1.0).clamp(-1.0, 1.0);
        1.0 - cos.acos() / std::f32::consts::PI
    }

    fn icollision_probability(&self, p: f32) -> f32 {
        let theta = std::f32::consts::PI * (1.0 - p.clamp(0.0, 1.0));
        (1.0 + theta.cos()) / 2.0
    }

    fn function_memory(&self) -> u64 {
        self.storage_len as u64 * 4
    }

    fn write_function<W: Write>(&self, f: &SimHashFunction, w: &mut W) -> Result<()> {
        write_slice(w, &f.plane)
    }

    fn read_function<R: Read>(&self, r: &mut R) -> Result<SimHashFunction> {
        Ok(SimHashFunction { plane: read_vec(r, "simhash plane")? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FormatTag;
    use rand::SeedableRng;

    #[test]
    fn identical_points_always_collide() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 8);
        let family = SimHash::new(&desc);
        let mut rng = StdRng::seed_from_u64(7);
        let point = vec![0.5f32; desc.storage_len as usize];
        for _ in 0..16 {
            let f = family.sample(&mut rng);
            assert_eq!(f.hash(&point), f.hash(&point));
        }
    }

    #[test]
    fn opposite_points_never_collide() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 8);
        let family = SimHash::new(&desc);
        let mut rng = StdRng::seed_from_u64(7);
        let a = vec![1.0f32; desc.storage_len as usize];
        let b: Vec<f32> = a.iter().map(|x| -x).collect();
        let f = family.sample(&mut rng);
        assert_ne!(f.hash(&a), f.hash(&b));
    }

    #[test]
    fn probability_endpoints() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 8);
        let family = SimHash::new(&desc);
        assert!((family.function_probability(1.0) - 1.0).abs() < 1e-6);
        assert!(family.function_probability(0.0).abs() < 1e-6);
        assert!((family.function_probability(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn inverse_is_exact() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 8);
        let family = SimHash::new(&desc);
        for &p in &[0.1f32, 0.5, 0.9] {
            let sim = family.icollision_probability(p);
            assert!((family.function_probability(sim) - p).abs() < 1e-5);
        }
    }

    #[test]
    fn empirical_collision_rate_tracks_formula() {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 16);
        let family = SimHash::new(&desc);
        let mut rng = StdRng::seed_from_u64(42);
        // Two unit vectors with cos = 0.6 -> similarity 0.8.
        let dim = desc.storage_len as usize;
        let mut a = vec![0.0f32; dim];
        let mut b = vec![0.0f32; dim];
        a[0] = 1.0;
        b[0] = 0.6;
        b[1] = 0.8;
        let trials = 4000;
        let mut hits = 0;
        for _ in 0..trials {
            let f = family.sample(&mut rng);
            if f.hash(&a) == f.hash(&b) {
                hits += 1;
            }
        }
        let expected = family.function_probability(0.8);
        let observed = hits as f32 / trials as f32;
        assert!((observed - expected).abs() < 0.05, "observed {observed}, expected {expected}");
    }
}
