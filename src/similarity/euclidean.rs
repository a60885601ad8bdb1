//! Euclidean similarity over real vectors.
//!
//! Distance is folded into [0, 1] as `1 / (1 + d)`, which the bucketed
//! projection family unfolds again when pricing collisions.

use crate::dataset::{DatasetDescription, FormatTag};
use crate::error::{IndexError, Result};
use crate::lsh::L2Hash;
use crate::similarity::SimilarityMeasure;

/// L2 similarity on unconstrained float vectors.
#[derive(Debug, Clone, Copy)]
pub struct Euclidean;

impl SimilarityMeasure for Euclidean {
    type Elem = f32;
    type Hash = L2Hash;
    type Sketch = L2Hash;

    const TAG: &'static str = "euclidean";

    fn describe(args: u32) -> DatasetDescription {
        DatasetDescription::vector(FormatTag::RealVector, args)
    }

    fn prepare(point: &[f32], desc: &DatasetDescription) -> Result<Vec<f32>> {
        if point.len() != desc.args as usize {
            return Err(IndexError::DimensionMismatch {
                expected: desc.args as usize,
                got: point.len(),
            });
        }
        Ok(point.to_vec())
    }

    fn similarity(a: &[f32], b: &[f32]) -> f32 {
        let dist_sq: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
        1.0 / (1.0 + dist_sq.sqrt())
    }

    fn hash_family(desc: &DatasetDescription) -> L2Hash {
        L2Hash::new(desc)
    }

    fn sketch_family(desc: &DatasetDescription) -> L2Hash {
        L2Hash::new(desc)
    }
}
