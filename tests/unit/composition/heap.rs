//! Unit tests for composition_adjustment/compo_heap.rs

use blastcore::composition_adjustment::{early_termination, early_termination_all, CompoHeap, HeapEntry};

fn entry(evalue: f64, score: i32, subject_index: usize) -> HeapEntry<usize> {
    HeapEntry {
        evalue,
        score,
        subject_index,
        payload: subject_index,
    }
}

#[test]
fn test_heap_keeps_most_significant_subjects() {
    let mut heap = CompoHeap::new(3, 10.0);
    let evalues = [5.0, 1e-3, 2.0, 1e-8, 0.5, 9.0];
    for (i, &e) in evalues.iter().enumerate() {
        heap.insert(entry(e, 100 - i as i32, i));
    }
    assert_eq!(heap.len(), 3);
    let kept: Vec<usize> = heap.into_sorted_vec().into_iter().map(|e| e.payload).collect();
    assert_eq!(kept, vec![3, 1, 4]);
}

#[test]
fn test_ecutoff_tightens_once_full() {
    let mut heap = CompoHeap::new(2, 10.0);
    assert!(heap.insert(entry(1.0, 50, 0)));
    assert_eq!(heap.ecutoff(), 10.0);
    assert!(heap.insert(entry(3.0, 40, 1)));
    assert!(heap.filled_to_cutoff());
    assert_eq!(heap.ecutoff(), 3.0);

    assert!(!heap.would_insert(4.0, 100, 2));
    assert!(!heap.insert(entry(4.0, 100, 2)));
    assert!(heap.insert(entry(0.1, 60, 3)));
    assert_eq!(heap.ecutoff(), 1.0);
    assert_eq!(heap.worst_evalue(), Some(1.0));
}

#[test]
fn test_entries_above_cutoff_rejected() {
    let mut heap = CompoHeap::new(5, 1e-3);
    assert!(!heap.insert(entry(0.01, 30, 0)));
    assert!(heap.is_empty());
}

#[test]
fn test_ties_prefer_higher_score_then_earlier_subject() {
    let mut heap = CompoHeap::new(1, 10.0);
    heap.insert(entry(1e-5, 40, 7));
    assert!(heap.insert(entry(1e-5, 41, 9)));
    assert!(!heap.insert(entry(1e-5, 41, 12)));
    assert!(heap.insert(entry(1e-5, 41, 3)));
    let kept = heap.into_sorted_vec();
    assert_eq!(kept[0].subject_index, 3);
}

#[test]
fn test_merge_respects_threshold() {
    let mut a = CompoHeap::new(2, 10.0);
    a.insert(entry(1.0, 10, 0));
    let mut b = CompoHeap::new(2, 10.0);
    b.insert(entry(0.5, 20, 1));
    b.insert(entry(0.1, 30, 2));
    a.merge(b);
    let kept: Vec<usize> = a.into_sorted_vec().into_iter().map(|e| e.subject_index).collect();
    assert_eq!(kept, vec![2, 1]);
}

#[test]
fn test_early_termination_requires_every_query_full() {
    let mut full = CompoHeap::new(1, 10.0);
    full.insert(entry(1e-10, 90, 0));
    let open: CompoHeap<usize> = CompoHeap::new(1, 10.0);
    let heaps = vec![full, open];

    assert!(early_termination(1e-5, &heaps, 0));
    assert!(!early_termination(1e-12, &heaps, 0));
    assert!(!early_termination(1e-5, &heaps, 1));
    assert!(!early_termination_all(1e-5, &heaps));
    assert!(early_termination_all(1e-5, &heaps[..1]));
    assert!(!early_termination_all::<usize>(1e-5, &[]));
}
