//! The index: insert, rebuild, adaptive search, snapshots.
//!
//! An [`Index`] is generic over its [`SimilarityMeasure`]; one concrete
//! variant exists per supported measure, collected in [`AnyIndex`] for
//! callers that dispatch on a tag string (the shape a foreign-function
//! shim consumes).
//!
//! # Search
//!
//! A query hashes once per repetition, positions a
//! [`PrefixMapQuery`](crate::prefix_map::PrefixMapQuery) at its insertion
//! point in every table and then walks phases of decreasing prefix
//! length. Each phase visits the repetitions in order, pulls the newly
//! covered candidate ranges, filters them against the phase's sketch row
//! and pushes sketch survivors through an exact similarity computation
//! into a bounded [`TopK`]. After every repetition the failure bound of
//! the hash source is compared against `1 − recall`; as soon as the
//! remaining chance of having missed a kth-best point drops under it, the
//! heap is returned.
//!
//! # Rebuild
//!
//! Inserts only stage points. `rebuild` plans table counts under the
//! memory budget, hashes the staged points in parallel into per-shard
//! buffers and hands them to each table for merge and sort. When the
//! planned shape matches the existing tables the rebuild is incremental;
//! otherwise fresh tables are staged from scratch and swapped in whole,
//! so a failed plan never leaves a half-built index.

use std::collections::HashSet;
use std::io::{Read, Write};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::dataset::{Dataset, DatasetDescription, FormatTag, VectorId};
use crate::error::{IndexError, Result};
use crate::metrics::{self, Section, Timer};
use crate::planner::{self, Plan, MAX_HASHBITS};
use crate::prefix_map::PrefixMap;
use crate::serialize::{read_u32, read_u64, read_u8, write_u32, write_u64, write_u8};
use crate::sketch::{sketch_threshold, SketchStore, NUM_FILTER_HASHBITS};
use crate::similarity::{Angular, Euclidean, Jaccard, SimilarityMeasure};
use crate::source::{HashSource, HashStrategy};
use crate::topk::TopK;

/// Construction-time options.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexConfig {
    /// How repetition codes are derived from the hash family.
    pub strategy: HashStrategy,
    /// Seed for all sampling; entropy-seeded when absent.
    pub seed: Option<u64>,
}

/// Everything allocated by a rebuild.
struct Tables<S: SimilarityMeasure> {
    source: HashSource<S::Hash>,
    maps: Vec<PrefixMap<u32>>,
    sketch_source: HashSource<S::Sketch>,
    sketches: SketchStore,
}

/// An LSH nearest-neighbor index over one similarity measure.
pub struct Index<S: SimilarityMeasure> {
    desc: DatasetDescription,
    memory_limit: u64,
    config: IndexConfig,
    rng: StdRng,
    dataset: Dataset<S::Elem>,
    /// Points covered by the current tables; later inserts wait for the
    /// next rebuild.
    built_count: u32,
    tables: Option<Tables<S>>,
}

impl<S: SimilarityMeasure> Index<S> {
    /// Create an empty index for the format argument (dimensions or
    /// universe size) under a byte budget.
    pub fn new(args: u32, memory_limit: u64) -> Result<Self> {
        Self::with_config(args, memory_limit, IndexConfig::default())
    }

    /// [`new`](Self::new) with explicit strategy and seed.
    pub fn with_config(args: u32, memory_limit: u64, config: IndexConfig) -> Result<Self> {
        if args == 0 {
            return Err(IndexError::DimensionMismatch { expected: 1, got: 0 });
        }
        let desc = S::describe(args);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Index {
            desc,
            memory_limit,
            config,
            rng,
            dataset: Dataset::new(desc),
            built_count: 0,
            tables: None,
        })
    }

    pub fn description(&self) -> &DatasetDescription {
        &self.desc
    }

    /// Points inserted so far, including ones not yet rebuilt into tables.
    pub fn len(&self) -> u32 {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Stage a point for the next rebuild and return its id.
    pub fn insert(&mut self, point: &[S::Elem]) -> Result<VectorId> {
        let prepared = S::prepare(point, &self.desc)?;
        Ok(self.dataset.push(&prepared))
    }

    /// Build or extend all repetition state to cover every staged insert.
    ///
    /// Idempotent when nothing was inserted since the last call. On a
    /// planner failure the index is left exactly as it was.
    pub fn rebuild(&mut self) -> Result<()> {
        let _t = Timer::start(Section::Rebuild);
        let n = self.dataset.len();
        if self.tables.is_some() && self.built_count == n {
            return Ok(());
        }

        let hash_family = S::hash_family(&self.desc);
        let sketch_family = S::sketch_family(&self.desc);
        let plan = planner::plan(
            self.dataset.current_memory(),
            n as u64,
            self.memory_limit,
            self.config.strategy,
            &hash_family,
            &sketch_family,
        )?;

        let incremental = matches!(
            &self.tables,
            Some(t) if t.maps.len() == plan.tables as usize
                && t.sketches.repetitions() == plan.sketch_reps
        );
        debug!(
            "rebuild: {} points, {} tables, {} sketch repetitions ({})",
            n,
            plan.tables,
            plan.sketch_reps,
            if incremental { "incremental" } else { "full" }
        );

        if incremental {
            let tables = self.tables.as_mut().expect("incremental implies tables");
            extend_tables::<S>(tables, &self.dataset, self.built_count, n);
        } else {
            let mut staged =
                Tables::build(hash_family, sketch_family, plan, self.config.strategy, &mut self.rng);
            extend_tables::<S>(&mut staged, &self.dataset, 0, n);
            self.tables = Some(staged);
        }
        self.built_count = n;
        Ok(())
    }

    /// Approximate top-`k` search.
    ///
    /// Returns at most `k` ids in decreasing similarity order, each of the
    /// true `k` nearest expected to be present with probability `recall`.
    /// `max_similarity` is an optional hint bounding the best achievable
    /// similarity, letting the controller stop earlier.
    pub fn search(
        &self,
        query: &[S::Elem],
        k: usize,
        recall: f32,
        max_similarity: Option<f32>,
    ) -> Result<Vec<VectorId>> {
        let tables = self.tables.as_ref().ok_or(IndexError::EmptyIndex)?;
        let point = S::prepare(query, &self.desc)?;
        if self.built_count == 0 || k == 0 {
            return Ok(Vec::new());
        }
        let _t = Timer::start(Section::Scan);

        let codes: Vec<u32> = tables.source.hash_repetitions(&point);
        let query_sketches: Vec<u64> = tables.sketch_source.hash_repetitions(&point);
        let mut queries: Vec<_> =
            tables.maps.iter().zip(&codes).map(|(m, &c)| m.create_query(c)).collect();

        let initial_guess = max_similarity.unwrap_or(0.0).clamp(0.0, 1.0);
        let allowed_failure = 1.0 - recall.clamp(0.0, 1.0);
        let num_tables = tables.maps.len() as u32;
        let bpf = tables.source.bits_per_function();
        let code_bits = tables.source.code_bits();
        let phases = code_bits.div_ceil(bpf);

        let mut top = TopK::new(k);
        let mut seen: HashSet<VectorId> = HashSet::new();

        for phase in 0..phases {
            let prefix_bits = code_bits.saturating_sub((phase + 1) * bpf);
            let sketch_rep = phase % tables.sketches.repetitions();
            let query_sketch = query_sketches[sketch_rep as usize];

            for (r, (map, query_state)) in
                tables.maps.iter().zip(queries.iter_mut()).enumerate()
            {
                let kth = top.kth_similarity().unwrap_or(initial_guess);
                let threshold =
                    sketch_threshold(tables.sketch_source.collision_probability(kth, 1));

                for range in map.get_next_range(query_state, bpf) {
                    metrics::count_candidates(range.len() as u64);
                    for &id in range {
                        if !tables.sketches.admits(query_sketch, id, sketch_rep, threshold) {
                            metrics::count_sketch_rejection();
                            continue;
                        }
                        if !seen.insert(id) {
                            continue;
                        }
                        let sim = S::similarity(self.dataset.get(id), &point);
                        metrics::count_distance_computation();
                        top.push(sim, id);
                    }
                }

                let kth = top.kth_similarity().unwrap_or(initial_guess);
                let failure =
                    tables.source.failure_probability(prefix_bits, r as u32 + 1, num_tables, kth);
                if failure <= allowed_failure {
                    trace!(
                        "search done at prefix {prefix_bits}, table {}/{num_tables}: \
                         failure {failure:.3e} within budget",
                        r + 1
                    );
                    return Ok(top.into_ids());
                }
            }
        }
        trace!("search exhausted all prefixes");
        Ok(top.into_ids())
    }

    /// Serialize the full index state.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        self.desc.write_to(w)?;
        write_u64(w, self.memory_limit)?;
        write_u32(w, self.built_count)?;
        self.dataset.write_to(w)?;
        match &self.tables {
            None => write_u8(w, 0),
            Some(t) => {
                write_u8(w, 1)?;
                t.source.write_to(w)?;
                for map in &t.maps {
                    map.write_to(w)?;
                }
                t.sketch_source.write_to(w)?;
                t.sketches.write_to(w)
            }
        }
    }

    /// Deserialize an index previously written by [`save`](Self::save).
    pub fn load<R: Read>(r: &mut R) -> Result<Self> {
        let desc = DatasetDescription::read_from(r)?;
        Self::load_body(desc, r)
    }

    fn load_body<R: Read>(desc: DatasetDescription, r: &mut R) -> Result<Self> {
        if desc != S::describe(desc.args) {
            return Err(IndexError::CorruptSnapshot(format!(
                "snapshot format {:?} does not fit a {} index",
                desc.format,
                S::TAG
            )));
        }
        let memory_limit = read_u64(r)?;
        let built_count = read_u32(r)?;
        let dataset = Dataset::read_from(r, desc)?;
        if built_count > dataset.len() {
            return Err(IndexError::CorruptSnapshot("built count exceeds dataset".into()));
        }

        let tables = match read_u8(r)? {
            0 => None,
            1 => {
                let source = HashSource::read_from(S::hash_family(&desc), r)?;
                let mut maps = Vec::with_capacity(source.repetitions() as usize);
                for _ in 0..source.repetitions() {
                    let map = PrefixMap::read_from(r, source.code_bits())?;
                    if map.len() != built_count as usize {
                        return Err(IndexError::CorruptSnapshot(
                            "prefix map does not cover every built point".into(),
                        ));
                    }
                    maps.push(map);
                }
                let sketch_source = HashSource::read_from(S::sketch_family(&desc), r)?;
                let sketches = SketchStore::read_from(r)?;
                if sketches.repetitions() == 0
                    || sketches.len() != built_count
                    || sketches.repetitions() != sketch_source.repetitions()
                {
                    return Err(IndexError::CorruptSnapshot(
                        "sketch store does not cover every built point".into(),
                    ));
                }
                Some(Tables { source, maps, sketch_source, sketches })
            }
            other => {
                return Err(IndexError::CorruptSnapshot(format!("unknown table marker {other}")))
            }
        };

        let config = IndexConfig {
            strategy: tables
                .as_ref()
                .map(|t| t.source.strategy())
                .unwrap_or_default(),
            seed: None,
        };
        Ok(Index {
            desc,
            memory_limit,
            config,
            rng: StdRng::from_entropy(),
            dataset,
            built_count,
            tables,
        })
    }
}

impl<S: SimilarityMeasure> Tables<S> {
    fn build(
        hash_family: S::Hash,
        sketch_family: S::Sketch,
        plan: Plan,
        strategy: HashStrategy,
        rng: &mut StdRng,
    ) -> Self {
        let source = HashSource::build(hash_family, strategy, plan.tables, MAX_HASHBITS, rng);
        let maps = (0..plan.tables).map(|_| PrefixMap::new(MAX_HASHBITS)).collect();
        let sketch_source = HashSource::build(
            sketch_family,
            HashStrategy::Independent,
            plan.sketch_reps,
            NUM_FILTER_HASHBITS,
            rng,
        );
        let sketches = SketchStore::new(plan.sketch_reps);
        Tables { source, maps, sketch_source, sketches }
    }
}

/// Chunk size of the parallel hashing fork-join.
const HASH_CHUNK: usize = 1024;

/// Hash points `[from, to)` and absorb them into maps and sketch store.
fn extend_tables<S: SimilarityMeasure>(
    tables: &mut Tables<S>,
    dataset: &Dataset<S::Elem>,
    from: u32,
    to: u32,
) {
    if from == to {
        // Still rebuild empty maps once so a pointless rebuild keeps its
        // invariants.
        for map in &mut tables.maps {
            map.rebuild(&mut [Vec::new()]);
        }
        return;
    }
    let ids: Vec<VectorId> = (from..to).collect();
    let repetitions = tables.source.repetitions() as usize;
    let source = &tables.source;

    // Fork: each chunk hashes its points into one shard per repetition.
    let shards: Vec<Vec<Vec<(VectorId, u32)>>> = ids
        .par_chunks(HASH_CHUNK)
        .map(|chunk| {
            let mut per_rep: Vec<Vec<(VectorId, u32)>> =
                (0..repetitions).map(|_| Vec::with_capacity(chunk.len())).collect();
            let mut codes: Vec<u32> = Vec::with_capacity(repetitions);
            for &id in chunk {
                source.hash_repetitions_into(dataset.get(id), &mut codes);
                for (rep, &code) in codes.iter().enumerate() {
                    per_rep[rep].push((id, code));
                }
            }
            per_rep
        })
        .collect();

    // Join: regroup shards by repetition and let every map merge its own.
    let mut by_rep: Vec<Vec<Vec<(VectorId, u32)>>> =
        (0..repetitions).map(|_| Vec::with_capacity(shards.len())).collect();
    for chunk_shards in shards {
        for (rep, shard) in chunk_shards.into_iter().enumerate() {
            by_rep[rep].push(shard);
        }
    }
    tables
        .maps
        .par_iter_mut()
        .zip(by_rep.par_iter_mut())
        .for_each(|(map, shards)| map.rebuild(shards));

    // Sketches are append-only rows in id order.
    let sketch_source = &tables.sketch_source;
    let rows: Vec<Vec<u64>> = ids
        .par_iter()
        .map(|&id| sketch_source.hash_repetitions(dataset.get(id)))
        .collect();
    for row in &rows {
        tables.sketches.push_row(row);
    }
}

/// Tag-dispatched index over the supported similarity measures.
///
/// This is the surface a foreign-function shim wraps: creation by tag
/// string, typed insert/search per storage format, and snapshot i/o that
/// recovers the right variant from the stored dataset description.
pub enum AnyIndex {
    Angular(Index<Angular>),
    Jaccard(Index<Jaccard>),
    Euclidean(Index<Euclidean>),
}

impl std::fmt::Debug for AnyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            AnyIndex::Angular(_) => "Angular",
            AnyIndex::Jaccard(_) => "Jaccard",
            AnyIndex::Euclidean(_) => "Euclidean",
        };
        f.debug_tuple("AnyIndex").field(&variant).finish()
    }
}

impl AnyIndex {
    /// Create an index for a similarity tag: `"angular"`, `"jaccard"` or
    /// `"euclidean"`. `args` is dimensions (vector formats) or universe
    /// size (sets).
    pub fn create(similarity: &str, args: u32, memory_limit: u64) -> Result<Self> {
        match similarity {
            "angular" => Ok(AnyIndex::Angular(Index::new(args, memory_limit)?)),
            "jaccard" => Ok(AnyIndex::Jaccard(Index::new(args, memory_limit)?)),
            "euclidean" => Ok(AnyIndex::Euclidean(Index::new(args, memory_limit)?)),
            other => Err(IndexError::UnsupportedSimilarity(other.to_string())),
        }
    }

    /// The tag this index was created with.
    pub fn tag(&self) -> &'static str {
        match self {
            AnyIndex::Angular(_) => Angular::TAG,
            AnyIndex::Jaccard(_) => Jaccard::TAG,
            AnyIndex::Euclidean(_) => Euclidean::TAG,
        }
    }

    /// Insert a float vector (angular or euclidean indexes).
    pub fn insert_vector(&mut self, point: &[f32]) -> Result<VectorId> {
        match self {
            AnyIndex::Angular(i) => i.insert(point),
            AnyIndex::Euclidean(i) => i.insert(point),
            AnyIndex::Jaccard(_) => {
                Err(IndexError::UnsupportedSimilarity("jaccard index stores id sets".into()))
            }
        }
    }

    /// Insert an id set (jaccard indexes).
    pub fn insert_set(&mut self, set: &[u32]) -> Result<VectorId> {
        match self {
            AnyIndex::Jaccard(i) => i.insert(set),
            _ => Err(IndexError::UnsupportedSimilarity(format!(
                "{} index stores float vectors",
                self.tag()
            ))),
        }
    }

    /// Rebuild whichever variant this is.
    pub fn rebuild(&mut self) -> Result<()> {
        match self {
            AnyIndex::Angular(i) => i.rebuild(),
            AnyIndex::Jaccard(i) => i.rebuild(),
            AnyIndex::Euclidean(i) => i.rebuild(),
        }
    }

    /// Search with a float vector query.
    pub fn search_vector(
        &self,
        query: &[f32],
        k: usize,
        recall: f32,
        max_similarity: Option<f32>,
    ) -> Result<Vec<VectorId>> {
        match self {
            AnyIndex::Angular(i) => i.search(query, k, recall, max_similarity),
            AnyIndex::Euclidean(i) => i.search(query, k, recall, max_similarity),
            AnyIndex::Jaccard(_) => {
                Err(IndexError::UnsupportedSimilarity("jaccard index stores id sets".into()))
            }
        }
    }

    /// Search with an id-set query.
    pub fn search_set(
        &self,
        query: &[u32],
        k: usize,
        recall: f32,
        max_similarity: Option<f32>,
    ) -> Result<Vec<VectorId>> {
        match self {
            AnyIndex::Jaccard(i) => i.search(query, k, recall, max_similarity),
            _ => Err(IndexError::UnsupportedSimilarity(format!(
                "{} index stores float vectors",
                self.tag()
            ))),
        }
    }

    /// Serialize the index; [`load`](Self::load) recovers the variant.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<()> {
        match self {
            AnyIndex::Angular(i) => i.save(w),
            AnyIndex::Jaccard(i) => i.save(w),
            AnyIndex::Euclidean(i) => i.save(w),
        }
    }

    /// Deserialize any snapshot, dispatching on its dataset description.
    pub fn load<R: Read>(r: &mut R) -> Result<Self> {
        let desc = DatasetDescription::read_from(r)?;
        match desc.format {
            FormatTag::UnitVector => Ok(AnyIndex::Angular(Index::load_body(desc, r)?)),
            FormatTag::IdSet => Ok(AnyIndex::Jaccard(Index::load_body(desc, r)?)),
            FormatTag::RealVector => Ok(AnyIndex::Euclidean(Index::load_body(desc, r)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_angular() -> Index<Angular> {
        let config = IndexConfig { strategy: HashStrategy::Independent, seed: Some(17) };
        Index::with_config(4, 2_000_000, config).unwrap()
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = AnyIndex::create("hamming", 16, 1 << 20).unwrap_err();
        assert!(matches!(err, IndexError::UnsupportedSimilarity(t) if t == "hamming"));
    }

    #[test]
    fn search_before_rebuild_is_an_error() {
        let index = tiny_angular();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.8, None),
            Err(IndexError::EmptyIndex)
        ));
    }

    #[test]
    fn rebuild_with_nothing_inserted_searches_empty() {
        let mut index = tiny_angular();
        index.rebuild().unwrap();
        let res = index.search(&[1.0, 0.0, 0.0, 0.0], 5, 0.8, None).unwrap();
        assert!(res.is_empty());
    }

    #[test]
    fn insert_is_invisible_until_rebuild() {
        let mut index = tiny_angular();
        index.rebuild().unwrap();
        index.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.9, None).unwrap().is_empty());
        index.rebuild().unwrap();
        assert_eq!(index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.9, None).unwrap(), vec![0]);
    }

    #[test]
    fn exact_point_is_found() {
        let mut index = tiny_angular();
        for i in 0..4u32 {
            let mut v = [0.0f32; 4];
            v[i as usize] = 1.0;
            index.insert(&v).unwrap();
        }
        index.rebuild().unwrap();
        let res = index.search(&[0.0, 0.0, 1.0, 0.0], 1, 0.9, None).unwrap();
        assert_eq!(res, vec![2]);
    }

    #[test]
    fn duplicate_points_tie_break_by_id() {
        let mut index = tiny_angular();
        index.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.rebuild().unwrap();
        let res = index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.9, None).unwrap();
        assert_eq!(res, vec![0]);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut index = tiny_angular();
        index.insert(&[0.0, 1.0, 0.0, 0.0]).unwrap();
        index.rebuild().unwrap();
        let before = index.search(&[0.0, 1.0, 0.0, 0.0], 1, 0.9, None).unwrap();
        index.rebuild().unwrap();
        let after = index.search(&[0.0, 1.0, 0.0, 0.0], 1, 0.9, None).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn insufficient_memory_leaves_index_usable() {
        let config = IndexConfig { strategy: HashStrategy::Independent, seed: Some(3) };
        let mut index: Index<Angular> = Index::with_config(4, 2_000_000, config).unwrap();
        index.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.rebuild().unwrap();
        // Shrink the budget below anything workable and try again.
        index.memory_limit = 16;
        index.insert(&[0.0, 1.0, 0.0, 0.0]).unwrap();
        assert!(matches!(index.rebuild(), Err(IndexError::InsufficientMemory { .. })));
        // The old tables still answer for the old points.
        assert_eq!(index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.9, None).unwrap(), vec![0]);
    }

    #[test]
    fn jaccard_round_trip_through_any_index() {
        let mut any = AnyIndex::create("jaccard", 64, 2_000_000).unwrap();
        any.insert_set(&[1, 2, 3, 4]).unwrap();
        any.insert_set(&[1, 2, 3, 5]).unwrap();
        any.insert_set(&[40, 41, 42]).unwrap();
        any.rebuild().unwrap();
        let res = any.search_set(&[1, 2, 3, 4], 2, 0.9, None).unwrap();
        assert_eq!(res[0], 0);
        assert!(any.insert_vector(&[1.0]).is_err());
    }

    #[test]
    fn snapshot_preserves_results() {
        let mut index = tiny_angular();
        for i in 0..16u32 {
            let angle = i as f32 / 3.0;
            index.insert(&[angle.cos(), angle.sin(), 0.1, 0.0]).unwrap();
        }
        index.rebuild().unwrap();
        let mut buf = Vec::new();
        index.save(&mut buf).unwrap();
        let restored: Index<Angular> = Index::load(&mut &buf[..]).unwrap();
        for i in 0..16u32 {
            let angle = i as f32 / 3.0 + 0.05;
            let q = [angle.cos(), angle.sin(), 0.0, 0.1];
            assert_eq!(
                index.search(&q, 3, 0.9, None).unwrap(),
                restored.search(&q, 3, 0.9, None).unwrap(),
                "query {i} diverged after reload"
            );
        }
    }

    #[test]
    fn wrong_variant_snapshot_is_rejected() {
        let mut index = tiny_angular();
        index.insert(&[1.0, 0.0, 0.0, 0.0]).unwrap();
        index.rebuild().unwrap();
        let mut buf = Vec::new();
        index.save(&mut buf).unwrap();
        assert!(matches!(
            Index::<Jaccard>::load(&mut &buf[..]),
            Err(IndexError::CorruptSnapshot(_))
        ));
        assert!(matches!(AnyIndex::load(&mut &buf[..]).unwrap(), AnyIndex::Angular(_)));
    }
}
