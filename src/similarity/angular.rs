//! Angular (cosine) similarity over unit vectors.
//!
//! Points are normalized on insert, so the stored dot product equals the
//! cosine of the angle. Similarity is mapped to `(1 + cos θ) / 2` to land
//! in [0, 1] as the collision-probability math requires.

use crate::dataset::{DatasetDescription, FormatTag};
use crate::error::{IndexError, Result};
use crate::lsh::{CrossPolytope, SimHash};
use crate::similarity::SimilarityMeasure;

/// Cosine similarity on unit-normalized float vectors.
#[derive(Debug, Clone, Copy)]
pub struct Angular;

impl SimilarityMeasure for Angular {
    type Elem = f32;
    type Hash = CrossPolytope;
    type Sketch = SimHash;

    const TAG: &'static str = "angular";

    fn describe(args: u32) -> DatasetDescription {
        DatasetDescription::vector(FormatTag::UnitVector, args)
    }

    fn prepare(point: &[f32], desc: &DatasetDescription) -> Result<Vec<f32>> {
        if point.len() != desc.args as usize {
            return Err(IndexError::DimensionMismatch {
                expected: desc.args as usize,
                got: point.len(),
            });
        }
        let norm = point.iter().map(|x| x * x).sum::<f32>().sqrt().max(f32::MIN_POSITIVE);
        Ok(point.iter().map(|x| x / norm).collect())
    }

    fn similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        ((1.0 + dot) / 2.0).clamp(0.0, 1.0)
    }

    fn hash_family(desc: &DatasetDescription) -> CrossPolytope {
        CrossPolytope::new(desc)
    }

    fn sketch_family(desc: &DatasetDescription) -> SimHash {
        SimHash::new(desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_normalizes() {
        let desc = Angular::describe(3);
        let p = Angular::prepare(&[3.0, 0.0, 4.0], &desc).unwrap();
        let norm: f32 = p.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn prepare_rejects_wrong_dimensions() {
        let desc = Angular::describe(3);
        assert!(matches!(
            Angular::prepare(&[1.0, 0.0], &desc),
            Err(IndexError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn similarity_endpoints() {
        let a = [1.0f32, 0.0];
        let b = [-1.0f32, 0.0];
        let c = [0.0f32, 1.0];
        assert!((Angular::similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!(Angular::similarity(&a, &b).abs() < 1e-6);
        assert!((Angular::similarity(&a, &c) - 0.5).abs() < 1e-6);
    }
}
