//! Sorted-hash repetition tables with expanding-prefix lookup.
//!
//! A `PrefixMap` keeps every inserted id sorted by its hash code, padded on
//! both ends with `SEGMENT_SIZE` all-ones sentinels so neighborhood scans
//! never bounds-check. Lookup starts at the insertion point of the query
//! hash and grows outward one sub-hash at a time: each call to
//! [`PrefixMap::get_next_range`] relaxes the prefix mask and returns the
//! newly covered entries on both sides, never revisiting consumed ones.
//!
//! A precomputed table of the first position of every
//! [`PREFIX_INDEX_BITS`]-bit prefix seeds the insertion-point search, so
//! the binary search runs over at most one prefix bucket.

use std::io::{Read, Write};

use crate::dataset::VectorId;
use crate::error::{IndexError, Result};
use crate::metrics::{Section, Timer};
use crate::serialize::{read_vec, write_slice};
use crate::word::LshWord;

/// Scan granularity: expansion moves in steps of this many entries, and
/// the sentinel pads are this long. Within a step the prefix comparison is
/// a straight-line loop the compiler can vectorize.
pub const SEGMENT_SIZE: usize = 12;

/// Bits of the hash whose first occurrence is precomputed.
pub const PREFIX_INDEX_BITS: u32 = 13;

const PREFIX_SLOTS: usize = 1 << PREFIX_INDEX_BITS;

/// Live lookup state for one repetition of one query.
#[derive(Debug, Clone)]
pub struct PrefixMapQuery<W: LshWord> {
    /// The query's full hash code.
    pub hash: W,
    /// Mask selecting the prefix still considered a match.
    pub prefix_mask: W,
    /// First index of the consumed region.
    pub prefix_start: u32,
    /// One past the last index of the consumed region.
    pub prefix_end: u32,
}

/// One repetition: ids sorted by hash code, with lookup acceleration.
pub struct PrefixMap<W: LshWord> {
    hashes: Vec<W>,
    indices: Vec<VectorId>,
    hash_length: u32,
    /// `prefix_index[p]` is the position of the first entry whose top
    /// `PREFIX_INDEX_BITS` bits are ≥ `p`; one extra slot closes the last
    /// bucket.
    prefix_index: Vec<u32>,
}

impl<W: LshWord> PrefixMap<W> {
    /// An empty map that can be queried before anything is inserted.
    pub fn new(hash_length: u32) -> Self {
        let mut map = PrefixMap {
            hashes: Vec::new(),
            indices: Vec::new(),
            hash_length,
            prefix_index: vec![0; PREFIX_SLOTS + 1],
        };
        map.rebuild(&mut [Vec::new()]);
        map
    }

    pub fn hash_length(&self) -> u32 {
        self.hash_length
    }

    /// Entries excluding the sentinel pads.
    pub fn len(&self) -> usize {
        self.hashes.len() - 2 * SEGMENT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absorb pending `(id, hash)` shards, merge them with the existing
    /// entries and rebuild the sorted layout and prefix index. Shards are
    /// drained; entries are ordered by hash with ties broken by id.
    pub fn rebuild(&mut self, shards: &mut [Vec<(VectorId, W)>]) {
        let pending: usize = shards.iter().map(|s| s.len()).sum();
        let existing = self.hashes.len().saturating_sub(2 * SEGMENT_SIZE);

        let mut pairs: Vec<(W, VectorId)> = Vec::with_capacity(existing + pending);
        for i in SEGMENT_SIZE..SEGMENT_SIZE + existing {
            pairs.push((self.hashes[i], self.indices[i]));
        }
        for shard in shards.iter_mut() {
            pairs.extend(shard.drain(..).map(|(id, hash)| (hash, id)));
        }
        pairs.sort_unstable();

        let n = pairs.len();
        self.hashes.clear();
        self.hashes.reserve(n + 2 * SEGMENT_SIZE);
        self.indices.clear();
        self.indices.reserve(n + 2 * SEGMENT_SIZE);

        self.hashes.extend(std::iter::repeat(W::IMPOSSIBLE_PREFIX).take(SEGMENT_SIZE));
        self.indices.extend(std::iter::repeat(0).take(SEGMENT_SIZE));
        for &(hash, id) in &pairs {
            self.hashes.push(hash);
            self.indices.push(id);
        }
        self.hashes.extend(std::iter::repeat(W::IMPOSSIBLE_PREFIX).take(SEGMENT_SIZE));
        self.indices.extend(std::iter::repeat(0).take(SEGMENT_SIZE));

        // First occurrence of each prefix over the real merged entries.
        let shift = self.hash_length.saturating_sub(PREFIX_INDEX_BITS);
        let mut idx = 0usize;
        for prefix in 0..PREFIX_SLOTS {
            while idx < n && (pairs[idx].0.shr(shift).to_u64() as usize) < prefix {
                idx += 1;
            }
            self.prefix_index[prefix] = (SEGMENT_SIZE + idx) as u32;
        }
        self.prefix_index[PREFIX_SLOTS] = (SEGMENT_SIZE + n) as u32;
    }

    /// Locate the insertion point of `hash` and return a query positioned
    /// there with an empty consumed region and an exact-match mask.
    pub fn create_query(&self, hash: W) -> PrefixMapQuery<W> {
        let _t = Timer::start(Section::CreateQuery);
        let shift = self.hash_length.saturating_sub(PREFIX_INDEX_BITS);
        let bucket = (hash.shr(shift).to_u64() as usize).min(PREFIX_SLOTS - 1);

        // Branch-free lower bound inside the bucket's hinted range.
        let mut base = self.prefix_index[bucket];
        let mut len = self.prefix_index[bucket + 1] - base;
        while len > 0 {
            let half = len / 2;
            let mid = base + half;
            if self.hashes[mid as usize] < hash {
                base = mid + 1;
                len -= half + 1;
            } else {
                len = half;
            }
        }

        PrefixMapQuery {
            hash,
            prefix_mask: W::IMPOSSIBLE_PREFIX,
            prefix_start: base,
            prefix_end: base,
        }
    }

    /// Drop one sub-hash from the query's prefix and return the two newly
    /// covered runs of ids, left and right of the consumed region.
    ///
    /// Expansion probes every `SEGMENT_SIZE`-th entry, so each run may
    /// spill up to `SEGMENT_SIZE − 1` entries past the true prefix
    /// boundary; callers filter those downstream. Runs are clamped to the
    /// real data so sentinels are never yielded.
    pub fn get_next_range<'a>(
        &'a self,
        query: &mut PrefixMapQuery<W>,
        bits_per_function: u32,
    ) -> [&'a [VectorId]; 2] {
        query.prefix_mask = query.prefix_mask.pop(bits_per_function);
        let mask = query.prefix_mask;
        let prefix = query.hash.and(mask);

        let len = self.hashes.len() as u32;
        let data_start = SEGMENT_SIZE as u32;
        let data_end = len - SEGMENT_SIZE as u32;
        let old_start = query.prefix_start;
        let old_end = query.prefix_end;

        let mut next = old_end;
        while next < len && prefix.prefix_eq(self.hashes[next as usize], mask) {
            next += SEGMENT_SIZE as u32;
        }
        let end_right = next.min(data_end);

        let mut start_left = old_start;
        while start_left > data_start
            && prefix.prefix_eq(self.hashes[(start_left - 1) as usize], mask)
        {
            start_left = start_left.saturating_sub(SEGMENT_SIZE as u32).max(data_start);
        }

        query.prefix_start = start_left;
        query.prefix_end = end_right;
        [
            &self.indices[start_left as usize..old_start as usize],
            &self.indices[old_end as usize..end_right as usize],
        ]
    }

    /// Bytes one map of `entries` entries occupies.
    pub fn memory_usage(entries: u64) -> u64 {
        let padded = entries + 2 * SEGMENT_SIZE as u64;
        padded * (std::mem::size_of::<W>() as u64 + 4) + (PREFIX_SLOTS as u64 + 1) * 4
    }

    pub(crate) fn write_to<Wr: Write>(&self, w: &mut Wr) -> Result<()>
    where
        W: crate::serialize::WireElem,
    {
        write_slice(w, &self.indices)?;
        write_slice(w, &self.hashes)?;
        write_slice(w, &self.prefix_index)?;
        Ok(())
    }

    pub(crate) fn read_from<R: Read>(r: &mut R, hash_length: u32) -> Result<Self>
    where
        W: crate::serialize::WireElem,
    {
        let indices: Vec<VectorId> = read_vec(r, "prefix map indices")?;
        let hashes: Vec<W> = read_vec(r, "prefix map hashes")?;
        let prefix_index: Vec<u32> = read_vec(r, "prefix index")?;

        if hashes.len() != indices.len() || hashes.len() < 2 * SEGMENT_SIZE {
            return Err(IndexError::CorruptSnapshot("prefix map shape mismatch".into()));
        }
        if prefix_index.len() != PREFIX_SLOTS + 1 {
            return Err(IndexError::CorruptSnapshot("prefix index length mismatch".into()));
        }
        let real = &hashes[SEGMENT_SIZE..hashes.len() - SEGMENT_SIZE];
        if real.windows(2).any(|w| w[0] > w[1]) {
            return Err(IndexError::CorruptSnapshot("prefix map hashes not sorted".into()));
        }
        if hashes[..SEGMENT_SIZE].iter().any(|&h| h != W::IMPOSSIBLE_PREFIX)
            || hashes[hashes.len() - SEGMENT_SIZE..].iter().any(|&h| h != W::IMPOSSIBLE_PREFIX)
        {
            return Err(IndexError::CorruptSnapshot("prefix map padding damaged".into()));
        }
        Ok(PrefixMap { hashes, indices, hash_length, prefix_index })
    }

    #[cfg(test)]
    pub(crate) fn raw_hashes(&self) -> &[W] {
        &self.hashes
    }

    #[cfg(test)]
    pub(crate) fn raw_indices(&self) -> &[VectorId] {
        &self.indices
    }

    #[cfg(test)]
    pub(crate) fn raw_prefix_index(&self) -> &[u32] {
        &self.prefix_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(hashes: &[u32], hash_length: u32) -> PrefixMap<u32> {
        let mut map = PrefixMap::new(hash_length);
        let shard: Vec<(VectorId, u32)> =
            hashes.iter().enumerate().map(|(i, &h)| (i as u32, h)).collect();
        map.rebuild(&mut [shard]);
        map
    }

    #[test]
    fn empty_map_is_queryable() {
        let map: PrefixMap<u32> = PrefixMap::new(24);
        assert!(map.is_empty());
        let mut q = map.create_query(0x0000_1234);
        assert_eq!(q.prefix_start, q.prefix_end);
        let [l, r] = map.get_next_range(&mut q, 4);
        assert!(l.is_empty() && r.is_empty());
    }

    #[test]
    fn rebuild_sorts_and_pads() {
        let map = build(&[0x30_0000, 0x10_0000, 0x20_0000], 24);
        let h = map.raw_hashes();
        assert_eq!(h.len(), 3 + 2 * SEGMENT_SIZE);
        assert!(h[..SEGMENT_SIZE].iter().all(|&x| x == u32::MAX));
        assert!(h[h.len() - SEGMENT_SIZE..].iter().all(|&x| x == u32::MAX));
        assert_eq!(&h[SEGMENT_SIZE..SEGMENT_SIZE + 3], &[0x10_0000, 0x20_0000, 0x30_0000]);
        assert_eq!(&map.raw_indices()[SEGMENT_SIZE..SEGMENT_SIZE + 3], &[1, 2, 0]);
    }

    #[test]
    fn equal_hashes_tie_break_by_id() {
        let mut map = PrefixMap::new(24);
        map.rebuild(&mut [vec![(5, 0x111111u32), (1, 0x111111), (3, 0x111111)]]);
        assert_eq!(&map.raw_indices()[SEGMENT_SIZE..SEGMENT_SIZE + 3], &[1, 3, 5]);
    }

    #[test]
    fn incremental_rebuild_merges() {
        let mut map = build(&[0x10_0000, 0x30_0000], 24);
        map.rebuild(&mut [vec![(2, 0x20_0000u32)]]);
        assert_eq!(map.len(), 3);
        assert_eq!(
            &map.raw_hashes()[SEGMENT_SIZE..SEGMENT_SIZE + 3],
            &[0x10_0000, 0x20_0000, 0x30_0000]
        );
    }

    #[test]
    fn prefix_index_is_monotone_and_aligned() {
        let map = build(&[0x00_0001, 0x40_0000, 0x80_0000, 0xC0_0000, 0xFF_FFFF], 24);
        let pi = map.raw_prefix_index();
        assert!(pi.windows(2).all(|w| w[0] <= w[1]));
        let shift = 24 - PREFIX_INDEX_BITS;
        for p in 0..PREFIX_SLOTS {
            let at = pi[p] as usize;
            if at < SEGMENT_SIZE + map.len() {
                assert!(map.raw_hashes()[at] >> shift >= p as u32);
            }
        }
        assert_eq!(pi[PREFIX_SLOTS] as usize, SEGMENT_SIZE + map.len());
    }

    #[test]
    fn create_query_finds_insertion_slot() {
        // Scenario from the query-expansion design: four hashes, query
        // lands between the 0x0001xx pair and 0x0002xx.
        let map = build(&[0x00010000, 0x00010001, 0x00020000, 0x00F00000], 24);
        let q = map.create_query(0x00010002);
        assert_eq!(q.prefix_start, q.prefix_end);
        assert_eq!(q.prefix_start as usize, SEGMENT_SIZE + 2);
        assert_eq!(q.prefix_mask, u32::MAX);
    }

    #[test]
    fn first_expansion_collects_shared_prefix_on_the_left() {
        let map = build(&[0x00010000, 0x00010001, 0x00020000, 0x00F00000], 24);
        let mut q = map.create_query(0x00010002);
        let [left, right] = map.get_next_range(&mut q, 4);
        // 0x0001000x entries share the 20-bit prefix and sit left of the
        // insertion point; nothing to the right matches.
        assert_eq!(left, &[0, 1]);
        assert!(right.is_empty());
        assert_eq!(q.prefix_start as usize, SEGMENT_SIZE);
        assert_eq!(q.prefix_end as usize, SEGMENT_SIZE + 2);
    }

    #[test]
    fn ranges_are_disjoint_from_consumed_region() {
        let hashes: Vec<u32> = (0..60).map(|i| 0x00010000 + i).collect();
        let map = build(&hashes, 24);
        let mut q = map.create_query(0x00010020);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..6 {
            let [l, r] = map.get_next_range(&mut q, 4);
            for &id in l.iter().chain(r) {
                assert!(seen.insert(id), "id {id} yielded twice");
            }
        }
        // Everything shares the hash's top byte, so by mask 0 all 60 ids
        // must have been produced exactly once.
        assert_eq!(seen.len(), 60);
    }

    #[test]
    fn expansion_never_yields_padding() {
        let map = build(&[0x00FFFFFF, 0x00FFFFFE], 24);
        let mut q = map.create_query(0x00FFFFFF);
        for _ in 0..6 {
            let [l, r] = map.get_next_range(&mut q, 4);
            assert!(l.len() + r.len() <= 2);
        }
        assert!(q.prefix_start as usize >= SEGMENT_SIZE);
        assert!(q.prefix_end as usize <= SEGMENT_SIZE + map.len());
    }

    #[test]
    fn final_mask_covers_everything() {
        let hashes: Vec<u32> = vec![0x00000000, 0x00400000, 0x00800000, 0x00C00000];
        let map = build(&hashes, 24);
        let mut q = map.create_query(0x00000001);
        let mut collected = 0;
        for _ in 0..6 {
            let [l, r] = map.get_next_range(&mut q, 4);
            collected += l.len() + r.len();
        }
        assert_eq!(collected, 4);
    }

    #[test]
    fn snapshot_round_trip() {
        let map = build(&[0x00010000, 0x00010001, 0x00020000], 24);
        let mut buf = Vec::new();
        map.write_to(&mut buf).unwrap();
        let restored: PrefixMap<u32> = PrefixMap::read_from(&mut &buf[..], 24).unwrap();
        assert_eq!(restored.raw_hashes(), map.raw_hashes());
        assert_eq!(restored.raw_indices(), map.raw_indices());
        assert_eq!(restored.raw_prefix_index(), map.raw_prefix_index());
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let map = build(&[0x00010000, 0x00020000], 24);
        let mut buf = Vec::new();
        map.write_to(&mut buf).unwrap();
        let restored = PrefixMap::<u32>::read_from(&mut &buf[..buf.len() - 8], 24);
        assert!(matches!(restored, Err(IndexError::CorruptSnapshot(_))));
    }

    #[test]
    fn unsorted_snapshot_is_rejected() {
        let map = build(&[0x00010000, 0x00020000], 24);
        let mut buf = Vec::new();
        map.write_to(&mut buf).unwrap();
        // The hashes slice follows the indices slice; swap its two real
        // entries so ordering breaks.
        let hashes_off = 8 + map.raw_indices().len() * 4 + 8 + SEGMENT_SIZE * 4;
        buf.swap(hashes_off, hashes_off + 4);
        buf.swap(hashes_off + 1, hashes_off + 5);
        buf.swap(hashes_off + 2, hashes_off + 6);
        let restored = PrefixMap::<u32>::read_from(&mut &buf[..], 24);
        assert!(matches!(restored, Err(IndexError::CorruptSnapshot(_))));
    }
}
