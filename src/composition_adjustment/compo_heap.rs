//! Bounded per-query heap of the most significant subjects
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/compo_heap.c
//!   BlastCompo_HeapInsert / BlastCompo_HeapWouldInsert / BlastCompo_HeapFilledToCutoff
//!   redo_alignment.c BlastCompo_EarlyTermination

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[inline]
fn compare_keys(a: (f64, i32, usize), b: (f64, i32, usize)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.2.cmp(&b.2))
}

/// One subject's best result for a query
#[derive(Debug, Clone)]
pub struct HeapEntry<P> {
    pub evalue: f64,
    pub score: i32,
    pub subject_index: usize,
    pub payload: P,
}

impl<P> HeapEntry<P> {
    /// Ordering where `Greater` means less significant: higher e-value,
    /// then lower score, then later subject.
    // [C] s_CompoHeapRecordCompare
    fn significance_cmp(&self, other: &Self) -> Ordering {
        compare_keys((self.evalue, self.score, self.subject_index), (other.evalue, other.score, other.subject_index))
    }
}

impl<P> PartialEq for HeapEntry<P> {
    fn eq(&self, other: &Self) -> bool {
        self.significance_cmp(other) == Ordering::Equal
    }
}

impl<P> Eq for HeapEntry<P> {}

impl<P> PartialOrd for HeapEntry<P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<P> Ord for HeapEntry<P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.significance_cmp(other)
    }
}

/// Keeps at most `heap_threshold` entries with e-value within the cutoff.
///
/// Once full, the effective cutoff tightens to the worst kept e-value and
/// only ever moves down.
#[derive(Debug, Clone)]
pub struct CompoHeap<P> {
    heap: BinaryHeap<HeapEntry<P>>,
    heap_threshold: usize,
    ecutoff: f64,
}

impl<P> CompoHeap<P> {
    pub fn new(heap_threshold: usize, cutoff_e: f64) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(heap_threshold.saturating_add(1).min(1 << 16)),
            heap_threshold: heap_threshold.max(1),
            ecutoff: cutoff_e,
        }
    }

    /// True when inserting (`evalue`, `score`, `subject_index`) would keep it
    pub fn would_insert(&self, evalue: f64, score: i32, subject_index: usize) -> bool {
        if evalue > self.ecutoff {
            return false;
        }
        if !self.filled_to_cutoff() {
            return true;
        }
        match self.heap.peek() {
            Some(worst) => {
                compare_keys((evalue, score, subject_index), (worst.evalue, worst.score, worst.subject_index)) == Ordering::Less
            }
            None => true,
        }
    }

    /// Insert, evicting the least significant entry when full.
    /// Returns whether the entry was kept.
    pub fn insert(&mut self, entry: HeapEntry<P>) -> bool {
        if !self.would_insert(entry.evalue, entry.score, entry.subject_index) {
            return false;
        }
        self.heap.push(entry);
        if self.heap.len() > self.heap_threshold {
            self.heap.pop();
        }
        if self.filled_to_cutoff() {
            if let Some(worst) = self.heap.peek() {
                self.ecutoff = self.ecutoff.min(worst.evalue);
            }
        }
        true
    }

    /// Move every entry of `other` into `self`
    pub fn merge(&mut self, other: CompoHeap<P>) {
        for entry in other.heap.into_vec() {
            self.insert(entry);
        }
    }

    #[inline]
    pub fn filled_to_cutoff(&self) -> bool {
        self.heap.len() >= self.heap_threshold
    }

    pub fn worst_evalue(&self) -> Option<f64> {
        self.heap.peek().map(|e| e.evalue)
    }

    #[inline]
    pub fn ecutoff(&self) -> f64 {
        self.ecutoff
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Most significant first
    pub fn into_sorted_vec(self) -> Vec<HeapEntry<P>> {
        self.heap.into_sorted_vec()
    }
}

/// Whether a match with `evalue` can no longer enter query `query_index`'s heap
pub fn early_termination<P>(evalue: f64, heaps: &[CompoHeap<P>], query_index: usize) -> bool {
    heaps
        .get(query_index)
        .map(|heap| heap.filled_to_cutoff() && evalue > heap.ecutoff())
        .unwrap_or(false)
}

/// True when no query's heap would accept a match with `evalue`, so the
/// rest of the subject can be skipped.
///
/// Reference: redo_alignment.c BlastCompo_EarlyTermination
pub fn early_termination_all<P>(evalue: f64, heaps: &[CompoHeap<P>]) -> bool {
    !heaps.is_empty() && (0..heaps.len()).all(|q| early_termination(evalue, heaps, q))
}
