//! Point storage.
//!
//! Inserted points live in a single dense arena. Vector formats use a fixed
//! stride rounded up to a 32-byte boundary so each point starts aligned;
//! set formats (sorted unique ids) have no natural stride and use an offset
//! table instead. Points are appended on insert and never mutated.

use std::io::{Read, Write};

use crate::error::{IndexError, Result};
use crate::serialize::{
    read_len, read_u32, read_u8, read_vec, write_slice, write_u32, write_u64, write_u8, WireElem,
};

/// Identifier of an inserted point, assigned in insertion order.
pub type VectorId = u32;

/// Storage alignment for vector formats, in bytes.
pub const ALIGNMENT: usize = 32;

/// Storage layout of a similarity's points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// Unit-length float vectors (angular similarity).
    UnitVector,
    /// Unconstrained float vectors (euclidean similarity).
    RealVector,
    /// Sorted sets of unique ids below a universe size (jaccard similarity).
    IdSet,
}

impl FormatTag {
    fn to_wire(self) -> u8 {
        match self {
            FormatTag::UnitVector => 0,
            FormatTag::RealVector => 1,
            FormatTag::IdSet => 2,
        }
    }

    fn from_wire(v: u8) -> Result<Self> {
        match v {
            0 => Ok(FormatTag::UnitVector),
            1 => Ok(FormatTag::RealVector),
            2 => Ok(FormatTag::IdSet),
            other => Err(IndexError::CorruptSnapshot(format!("unknown format tag {other}"))),
        }
    }
}

/// Shape of a dataset: format, format argument (dimensions or universe
/// size) and padded storage stride. A stride of zero marks a
/// variable-length format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetDescription {
    pub format: FormatTag,
    pub args: u32,
    pub storage_len: u32,
}

impl DatasetDescription {
    /// Describe a dense float format of `dimensions`, padding the stride
    /// so consecutive points stay 32-byte aligned.
    pub fn vector(format: FormatTag, dimensions: u32) -> Self {
        let per_line = (ALIGNMENT / std::mem::size_of::<f32>()) as u32;
        let storage_len = dimensions.div_ceil(per_line) * per_line;
        DatasetDescription { format, args: dimensions, storage_len }
    }

    /// Describe a set format over ids in `[0, universe)`.
    pub fn id_set(universe: u32) -> Self {
        DatasetDescription { format: FormatTag::IdSet, args: universe, storage_len: 0 }
    }

    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        write_u8(w, self.format.to_wire())?;
        write_u32(w, self.args)?;
        write_u32(w, self.storage_len)
    }

    pub(crate) fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let format = FormatTag::from_wire(read_u8(r)?)?;
        let args = read_u32(r)?;
        let storage_len = read_u32(r)?;
        if matches!(format, FormatTag::IdSet) != (storage_len == 0) {
            return Err(IndexError::CorruptSnapshot("stride does not match format".into()));
        }
        Ok(DatasetDescription { format, args, storage_len })
    }
}

/// Dense append-only arena of points.
#[derive(Debug, Clone)]
pub struct Dataset<E> {
    desc: DatasetDescription,
    data: Vec<E>,
    /// Point boundaries for variable-length formats; empty when strided.
    offsets: Vec<u64>,
}

impl<E: WireElem> Dataset<E> {
    pub fn new(desc: DatasetDescription) -> Self {
        let offsets = if desc.storage_len == 0 { vec![0] } else { Vec::new() };
        Dataset { desc, data: Vec::new(), offsets }
    }

    pub fn description(&self) -> &DatasetDescription {
        &self.desc
    }

    /// Number of stored points.
    pub fn len(&self) -> u32 {
        if self.desc.storage_len == 0 {
            (self.offsets.len() - 1) as u32
        } else {
            (self.data.len() / self.desc.storage_len as usize) as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an already prepared point and return its id.
    ///
    /// Strided formats are zero-padded up to the stride; variable formats
    /// record a new offset.
    pub fn push(&mut self, point: &[E]) -> VectorId {
        let id = self.len();
        if self.desc.storage_len == 0 {
            self.data.extend_from_slice(point);
            self.offsets.push(self.data.len() as u64);
        } else {
            debug_assert!(point.len() <= self.desc.storage_len as usize);
            self.data.extend_from_slice(point);
            self.data.resize((id as usize + 1) * self.desc.storage_len as usize, E::default());
        }
        id
    }

    /// Borrow the stored representation of a point.
    pub fn get(&self, id: VectorId) -> &[E] {
        if self.desc.storage_len == 0 {
            let start = self.offsets[id as usize] as usize;
            let end = self.offsets[id as usize + 1] as usize;
            &self.data[start..end]
        } else {
            let stride = self.desc.storage_len as usize;
            &self.data[id as usize * stride..(id as usize + 1) * stride]
        }
    }

    /// Current footprint in bytes.
    pub fn current_memory(&self) -> u64 {
        (self.data.len() * std::mem::size_of::<E>()) as u64 + (self.offsets.len() * 8) as u64
    }

    pub(crate) fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        write_slice(w, &self.data)?;
        write_u64(w, self.offsets.len() as u64)?;
        for &o in &self.offsets {
            write_u64(w, o)?;
        }
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(r: &mut R, desc: DatasetDescription) -> Result<Self> {
        let data: Vec<E> = read_vec(r, "dataset")?;
        let offsets_len = read_len(r, "dataset offsets")?;
        let mut offsets = Vec::with_capacity(offsets_len.min(1 << 20));
        for _ in 0..offsets_len {
            offsets.push(crate::serialize::read_u64(r)?);
        }
        let ds = Dataset { desc, data, offsets };
        if desc.storage_len == 0 {
            if ds.offsets.is_empty() || *ds.offsets.last().unwrap() as usize != ds.data.len() {
                return Err(IndexError::CorruptSnapshot("set offsets do not cover data".into()));
            }
        } else if ds.data.len() % desc.storage_len as usize != 0 {
            return Err(IndexError::CorruptSnapshot("dataset length is not a stride multiple".into()));
        }
        Ok(ds)
    }
}
