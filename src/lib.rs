//! proximity: LSH nearest-neighbor search with adaptive termination.
//!
//! An in-memory approximate nearest-neighbor index built on
//! locality-sensitive hashing. Instead of a fixed number of probes, every
//! query carries a **recall target**: the engine keeps widening its search
//! — more repetitions, shorter hash prefixes — until the probability of
//! having missed one of the true top-k drops below `1 − recall`, then
//! stops.
//!
//! # Moving Parts
//!
//! | Component | Role |
//! |-----------|------|
//! | [`lsh`] | Hash families (SimHash, cross-polytope, MinHash, L2) |
//! | [`source`] | Per-repetition code derivation (independent / pool / tensored) |
//! | [`prefix_map`] | Sorted repetition tables with expanding-prefix lookup |
//! | [`sketch`] | 64-bit Hamming prefilter ahead of exact distances |
//! | [`planner`] | Table and sketch counts under a byte budget |
//! | [`index`] | Insert, rebuild, adaptive search, snapshots |
//!
//! # Example
//!
//! ```
//! use proximity::{Index, IndexConfig, similarity::Angular};
//!
//! let config = IndexConfig { seed: Some(42), ..Default::default() };
//! let mut index: Index<Angular> = Index::with_config(3, 10_000_000, config)?;
//! index.insert(&[1.0, 0.0, 0.0])?;
//! index.insert(&[0.0, 1.0, 0.0])?;
//! index.insert(&[0.9, 0.1, 0.0])?;
//! index.rebuild()?;
//!
//! let neighbors = index.search(&[1.0, 0.05, 0.0], 2, 0.9, None)?;
//! assert_eq!(neighbors[0], 0);
//! # Ok::<(), proximity::IndexError>(())
//! ```
//!
//! # What This Is Not
//!
//! No deletions or updates, no paged or distributed storage, no exact
//! search. Snapshots are a point-in-time format, not a log: inserts are
//! only visible after an explicit [`Index::rebuild`], and an index is
//! immutable (and freely shareable across threads) between rebuilds.

pub mod dataset;
pub mod error;
pub mod index;
pub mod lsh;
pub mod metrics;
pub mod planner;
pub mod prefix_map;
pub mod similarity;
pub mod sketch;
pub mod source;
pub mod topk;
pub mod word;

#[doc(hidden)]
pub mod serialize;

pub use dataset::{DatasetDescription, FormatTag, VectorId};
pub use error::{IndexError, Result};
pub use index::{AnyIndex, Index, IndexConfig};
pub use metrics::{clear_distance_computations, get_distance_computations};
pub use planner::{MAX_HASHBITS, NUM_SKETCHES};
pub use similarity::{Angular, Euclidean, Jaccard, SimilarityMeasure};
pub use sketch::NUM_FILTER_HASHBITS;
pub use source::HashStrategy;
pub use word::LshWord;
