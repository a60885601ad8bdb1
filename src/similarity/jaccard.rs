//! Jaccard similarity over sets of ids.
//!
//! Points are sets of unique ids below a fixed universe size, stored
//! sorted so similarity is a single merge pass. Unsorted input is sorted
//! and deduplicated on insert; ids outside the universe are rejected.

use crate::dataset::DatasetDescription;
use crate::error::{IndexError, Result};
use crate::lsh::{MinHash, MinHashOneBit};
use crate::similarity::SimilarityMeasure;

/// Jaccard similarity on sorted unique id sets.
#[derive(Debug, Clone, Copy)]
pub struct Jaccard;

impl SimilarityMeasure for Jaccard {
    type Elem = u32;
    type Hash = MinHash;
    type Sketch = MinHashOneBit;

    const TAG: &'static str = "jaccard";

    fn describe(args: u32) -> DatasetDescription {
        DatasetDescription::id_set(args)
    }

    fn prepare(point: &[u32], desc: &DatasetDescription) -> Result<Vec<u32>> {
        if let Some(&id) = point.iter().find(|&&id| id >= desc.args) {
            return Err(IndexError::DimensionMismatch {
                expected: desc.args as usize,
                got: id as usize,
            });
        }
        let mut set = point.to_vec();
        set.sort_unstable();
        set.dedup();
        Ok(set)
    }

    fn similarity(a: &[u32], b: &[u32]) -> f32 {
        if a.is_empty() && b.is_empty() {
            return 1.0;
        }
        let mut inter = 0usize;
        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    inter += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        inter as f32 / (a.len() + b.len() - inter) as f32
    }

    fn hash_family(desc: &DatasetDescription) -> MinHash {
        MinHash::new(desc)
    }

    fn sketch_family(desc: &DatasetDescription) -> MinHashOneBit {
        MinHashOneBit::new(desc)
    }
}
