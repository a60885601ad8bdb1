//! Bounded top-k result collection.
//!
//! A min-heap of at most `k` `(similarity, id)` pairs whose root is the
//! current kth best: that root similarity is what the adaptive controller
//! feeds into the termination bound. Ordering is deterministic — higher
//! similarity wins, equal similarities go to the smaller id.

use std::collections::BinaryHeap;

use crate::dataset::VectorId;

#[derive(Debug, Clone, Copy)]
struct Entry {
    similarity: f32,
    id: VectorId,
}

// Ordered so that the heap root is the *worst* kept entry: lower
// similarity is greater, and among equal similarities the larger id is
// greater (so the smaller id survives displacement).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .similarity
            .total_cmp(&self.similarity)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Entry {}

/// Max-size-`k` collection of the best `(similarity, id)` pairs seen.
pub struct TopK {
    heap: BinaryHeap<Entry>,
    k: usize,
}

impl TopK {
    pub fn new(k: usize) -> Self {
        TopK { heap: BinaryHeap::with_capacity(k + 1), k }
    }

    /// Offer a candidate; it is kept iff it beats the current kth best.
    pub fn push(&mut self, similarity: f32, id: VectorId) {
        let entry = Entry { similarity, id };
        if self.heap.len() < self.k {
            self.heap.push(entry);
        } else if let Some(&worst) = self.heap.peek() {
            if entry < worst {
                self.heap.pop();
                self.heap.push(entry);
            }
        }
    }

    /// Similarity of the kth best entry, once `k` entries are held.
    pub fn kth_similarity(&self) -> Option<f32> {
        if self.heap.len() == self.k {
            self.heap.peek().map(|e| e.similarity)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into ids ordered by decreasing similarity (ties: smaller id
    /// first).
    pub fn into_ids(self) -> Vec<VectorId> {
        let mut entries = self.heap.into_vec();
        entries.sort_by(|a, b| {
            b.similarity.total_cmp(&a.similarity).then_with(|| a.id.cmp(&b.id))
        });
        entries.into_iter().map(|e| e.id).collect()
    }
}
