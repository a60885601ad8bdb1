//! Bucketed scalar projections for euclidean similarity.
//!
//! Each function projects onto a gaussian direction, shifts by a random
//! offset and buckets the line into windows of width `r = 4`. Bucket ids
//! are clamped into four bits; everything past the representable range
//! lands in the boundary buckets.
//!
//! The window-collision probability for two points at distance `d` with
//! `c = d / r` is the standard p-stable expression
//! `erf(1/(√2·c)) − c·√(2/π)·(1 − exp(−1/(2c²)))`; euclidean similarity
//! `s = 1/(1+d)` is converted back to a distance before applying it.

use std::io::{Read, Write};

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, StandardNormal};

use crate::dataset::DatasetDescription;
use crate::error::Result;
use crate::lsh::{LshFamily, LshFunction};
use crate::serialize::{read_f32, read_vec, write_f32, write_slice};

/// Bucket width of the projection line.
const BUCKET_WIDTH: f32 = 4.0;
/// Output width of one function.
const BITS: u32 = 4;
/// Largest representable bucket.
const MAX_BUCKET: f32 = ((1u32 << BITS) - 1) as f32;

/// Projection-and-bucket family over real vectors.
#[derive(Debug, Clone)]
pub struct L2Hash {
    storage_len: u32,
}

/// One sampled projection line.
pub struct L2HashFunction {
    direction: Vec<f32>,
    r: f32,
    b: f32,
}

impl L2Hash {
    pub fn new(desc: &DatasetDescription) -> Self {
        L2Hash { storage_len: desc.storage_len }
    }
}

impl LshFunction for L2HashFunction {
    type Elem = f32;

    #[inline]
    fn hash(&self, point: &[f32]) -> u64 {
        let dot: f32 = self.direction.iter().zip(point).map(|(a, b)| a * b).sum();
        ((dot + self.b) / self.r).floor().clamp(0.0, MAX_BUCKET) as u64
    }
}

/// Abramowitz & Stegun 7.1.26, accurate to ~1.5e-7.
fn erf(x: f32) -> f32 {
    let sign = x.signum();
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = ((((1.061_405_429 * t - 1.453_152_027) * t) + 1.421_413_741) * t - 0.284_496_736)
        * t
        + 0.254_829_592;
    sign * (1.0 - poly * t * (-x * x).exp())
}

impl LshFamily for L2Hash {
    type Elem = f32;
    type Function = L2HashFunction;

    fn sample(&self, rng: &mut StdRng) -> L2HashFunction {
        let direction = (0..self.storage_len).map(|_| StandardNormal.sample(rng)).collect();
        let b = Normal::new(0.0, BUCKET_WIDTH).expect("valid offset distribution").sample(rng);
        L2HashFunction { direction, r: BUCKET_WIDTH, b }
    }

    fn bits_per_function(&self) -> u32 {
        BITS
    }

    fn function_probability(&self, similarity: f32) -> f32 {
        let sim = similarity.clamp(1e-6, 1.0);
        let distance = 1.0 / sim - 1.0;
        let c = distance / BUCKET_WIDTH;
        if c < 1e-3 {
            return 1.0;
        }
        let p = erf(1.0 / (std::f32::consts::SQRT_2 * c))
            - c * (2.0 / std::f32::consts::PI).sqrt() * (1.0 - (-0.5 / (c * c)).exp());
        p.clamp(0.0, 1.0)
    }

    fn function_memory(&self) -> u64 {
        self.storage_len as u64 * 4 + 8
    }

    fn write_function<W: Write>(&self, f: &L2HashFunction, w: &mut W) -> Result<()> {
        // Field order here is r then b; the reader must match exactly.
        write_f32(w, f.r)?;
        write_f32(w, f.b)?;
        write_slice(w, &f.direction)
    }

    fn read_function<R: Read>(&self, r: &mut R) -> Result<L2HashFunction> {
        let width = read_f32(r)?;
        let b = read_f32(r)?;
        let direction = read_vec(r, "l2 direction")?;
        Ok(L2HashFunction { direction, r: width, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::FormatTag;
    use rand::SeedableRng;

    #[test]
    fn erf_reference_values() {
        assert!(erf(0.0).abs() < 1e-6);
        assert!((erf(1.0) - 0.8427).abs() < 1e-3);
        assert!((erf(-1.0) + 0.8427).abs() < 1e-3);
        assert!((erf(3.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn buckets_stay_in_four_bits() {
        let desc = DatasetDescription::vector(FormatTag::RealVector, 4);
        let family = L2Hash::new(&desc);
        let mut rng = StdRng::seed_from_u64(1);
        let far = vec![1000.0f32; desc.storage_len as usize];
        let near = vec![-1000.0f32; desc.storage_len as usize];
        for _ in 0..32 {
            let f = family.sample(&mut rng);
            assert!(f.hash(&far) <= MAX_BUCKET as u64);
            assert!(f.hash(&near) <= MAX_BUCKET as u64);
        }
    }

    #[test]
    fn probability_decreases_with_distance() {
        let desc = DatasetDescription::vector(FormatTag::RealVector, 4);
        let family = L2Hash::new(&desc);
        // Similarities for distances 0, 1, 4, 16.
        let sims = [1.0f32, 0.5, 0.2, 1.0 / 17.0];
        let probs: Vec<f32> = sims.iter().map(|&s| family.function_probability(s)).collect();
        assert!((probs[0] - 1.0).abs() < 1e-3);
        for pair in probs.windows(2) {
            assert!(pair[0] > pair[1], "{probs:?} not decreasing");
        }
    }

    #[test]
    fn function_round_trip_preserves_order() {
        let desc = DatasetDescription::vector(FormatTag::RealVector, 4);
        let family = L2Hash::new(&desc);
        let mut rng = StdRng::seed_from_u64(2);
        let f = family.sample(&mut rng);

        let mut buf = Vec::new();
        family.write_function(&f, &mut buf).unwrap();
        let g = family.read_function(&mut &buf[..]).unwrap();

        assert_eq!(f.r, g.r);
        assert_eq!(f.b, g.b);
        assert_eq!(f.direction, g.direction);
        let point = vec![0.3f32; desc.storage_len as usize];
        assert_eq!(f.hash(&point), g.hash(&point));
    }
}
