//! Similarity measures.
//!
//! A measure ties together a storage format, a similarity function bounded
//! in [0, 1] and the default hash and sketch families the index uses for
//! it. The engine is generic over this trait; one concrete index type
//! exists per measure (see [`AnyIndex`](crate::AnyIndex)).

use std::fmt::Debug;

use crate::dataset::DatasetDescription;
use crate::error::Result;
use crate::lsh::LshFamily;
use crate::serialize::WireElem;

mod angular;
mod euclidean;
mod jaccard;

pub use angular::Angular;
pub use euclidean::Euclidean;
pub use jaccard::Jaccard;

/// A pluggable similarity measure.
pub trait SimilarityMeasure: Send + Sync + Sized + 'static {
    /// Stored element type (`f32` for vectors, `u32` for id sets).
    type Elem: WireElem + PartialEq + Debug + Send + Sync;
    /// Default family for index codes.
    type Hash: LshFamily<Elem = Self::Elem>;
    /// Default family for filter sketches.
    type Sketch: LshFamily<Elem = Self::Elem>;

    /// Tag accepted by [`AnyIndex::create`](crate::AnyIndex::create).
    const TAG: &'static str;

    /// Describe storage for the format argument (dimensions or universe).
    fn describe(args: u32) -> DatasetDescription;

    /// Validate a raw point and produce its stored form.
    fn prepare(point: &[Self::Elem], desc: &DatasetDescription) -> Result<Vec<Self::Elem>>;

    /// Similarity of two stored points, in [0, 1].
    fn similarity(a: &[Self::Elem], b: &[Self::Elem]) -> f32;

    /// Default hash family for this measure.
    fn hash_family(desc: &DatasetDescription) -> Self::Hash;

    /// Default sketch family for this measure.
    fn sketch_family(desc: &DatasetDescription) -> Self::Sketch;
}
