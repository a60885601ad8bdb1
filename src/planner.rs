//! Memory planning.
//!
//! Given a byte budget, decide how many hash repetitions and sketch
//! repetitions the index may allocate. Hash length is not negotiated: index
//! codes always use [`MAX_HASHBITS`] bits and sketches 64. Sketches are
//! cheap and fixed first (up to [`NUM_SKETCHES`] rows); whatever remains
//! buys tables, since recall grows with every extra repetition.

use crate::error::{IndexError, Result};
use crate::lsh::LshFamily;
use crate::prefix_map::PrefixMap;
use crate::sketch::{SketchStore, NUM_FILTER_HASHBITS};
use crate::source::HashStrategy;

/// Active bits of an index hash code.
pub const MAX_HASHBITS: u32 = 24;

/// Preferred number of sketch repetitions.
pub const NUM_SKETCHES: u32 = 32;

/// Upper bound on hash repetitions, far above anything a sane budget buys.
const MAX_TABLES: u32 = 1024;

/// What the planner decided to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Hash repetitions (prefix map tables).
    pub tables: u32,
    /// Sketch repetitions.
    pub sketch_reps: u32,
}

/// Choose table and sketch counts for `points` points under `budget`
/// bytes, which must also cover `dataset_bytes` of stored points.
pub fn plan<F: LshFamily, G: LshFamily>(
    dataset_bytes: u64,
    points: u64,
    budget: u64,
    strategy: HashStrategy,
    hash_family: &F,
    sketch_family: &G,
) -> Result<Plan> {
    let table_bytes = PrefixMap::<u32>::memory_usage(points);
    let sketch_fns = NUM_FILTER_HASHBITS.div_ceil(sketch_family.bits_per_function()) as u64;
    let sketch_rep_bytes =
        SketchStore::memory_usage(points, 1) + sketch_fns * sketch_family.function_memory();

    // An empty index gets a single placeholder table; the first real
    // rebuild replans with the actual point count.
    let table_cap = if points == 0 { 1 } else { MAX_TABLES };

    for sketch_reps in (1..=NUM_SKETCHES).rev() {
        let fixed = dataset_bytes + sketch_reps as u64 * sketch_rep_bytes;
        if fixed >= budget {
            continue;
        }
        let mut tables = 0;
        while tables < table_cap {
            let next = tables + 1;
            let cost = fixed
                + strategy.source_memory(hash_family, MAX_HASHBITS, next)
                + next as u64 * table_bytes;
            if cost > budget {
                break;
            }
            tables = next;
        }
        if tables >= 1 {
            return Ok(Plan { tables, sketch_reps });
        }
    }
    Err(IndexError::InsufficientMemory { budget })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetDescription, FormatTag};
    use crate::lsh::SimHash;

    fn families() -> (SimHash, SimHash) {
        let desc = DatasetDescription::vector(FormatTag::UnitVector, 32);
        (SimHash::new(&desc), SimHash::new(&desc))
    }

    #[test]
    fn more_budget_buys_more_tables() {
        let (h, s) = families();
        let small =
            plan(40_000, 1000, 2_000_000, HashStrategy::Independent, &h, &s).unwrap();
        let large =
            plan(40_000, 1000, 20_000_000, HashStrategy::Independent, &h, &s).unwrap();
        assert!(large.tables > small.tables, "{small:?} vs {large:?}");
        assert_eq!(large.sketch_reps, NUM_SKETCHES);
    }

    #[test]
    fn tight_budget_sheds_sketches_before_failing() {
        let (h, s) = families();
        // Just enough for the dataset, one table and a few sketch rows.
        let table = PrefixMap::<u32>::memory_usage(1000);
        let source = HashStrategy::Independent.source_memory(&h, MAX_HASHBITS, 1);
        let budget = 40_000 + table + source + 5 * (8 * 1000 + 64 * h.function_memory()) + 1;
        let plan = plan(40_000, 1000, budget, HashStrategy::Independent, &h, &s).unwrap();
        assert!(plan.sketch_reps < NUM_SKETCHES);
        assert!(plan.tables >= 1);
    }

    #[test]
    fn hopeless_budget_errors() {
        let (h, s) = families();
        let err = plan(40_000, 1000, 10_000, HashStrategy::Independent, &h, &s).unwrap_err();
        assert!(matches!(err, IndexError::InsufficientMemory { budget: 10_000 }));
    }

    #[test]
    fn pooled_tables_are_cheaper_than_independent() {
        let (h, s) = families();
        let budget = 8_000_000;
        let ind = plan(40_000, 1000, budget, HashStrategy::Independent, &h, &s).unwrap();
        let pool =
            plan(40_000, 1000, budget, HashStrategy::Pool { pool_bits: 512 }, &h, &s).unwrap();
        assert!(pool.tables >= ind.tables);
    }
}
