//! Candidate alignments passed into and out of the redo engine
//!
//! Reference: ncbi-blast/c++/src/algo/blast/composition_adjustment/redo_alignment.h
//!   BlastCompo_Alignment / BlastCompo_GappingParams

use std::collections::VecDeque;

/// How the scoring matrix was adjusted for an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixAdjustRule {
    #[default]
    DontAdjust,
    /// Start matrix rescaled by the composition lambda ratio
    ScaleOldMatrix,
}

/// One local alignment. Coordinates are half-open, query coordinates are
/// relative to the query's own start, subject coordinates are in the frame
/// given by `frame`.
///
/// `context` carries the traceback (or whatever the alignment callbacks
/// attach); it is dropped with the alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment<T> {
    pub score: i32,
    pub matrix_adjust_rule: MatrixAdjustRule,
    pub query_index: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub match_start: usize,
    pub match_end: usize,
    pub frame: i32,
    pub context: Option<T>,
}

impl<T> Alignment<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        score: i32,
        matrix_adjust_rule: MatrixAdjustRule,
        query_index: usize,
        query_start: usize,
        query_end: usize,
        match_start: usize,
        match_end: usize,
        frame: i32,
        context: Option<T>,
    ) -> Self {
        debug_assert!(query_start <= query_end && match_start <= match_end);
        Self {
            score,
            matrix_adjust_rule,
            query_index,
            query_start,
            query_end,
            match_start,
            match_end,
            frame,
            context,
        }
    }

    /// True when (`query_pos`, `match_pos`) lies inside this alignment's box
    #[inline]
    pub fn contains_start(&self, query_pos: usize, match_pos: usize) -> bool {
        self.query_start <= query_pos
            && query_pos < self.query_end
            && self.match_start <= match_pos
            && match_pos < self.match_end
    }

    /// Score rounded back to unscaled matrix units
    pub fn normalized_score(&self, scaling_factor: f64) -> i32 {
        crate::core::ncbi_math::nint(self.score as f64 / scaling_factor) as i32
    }
}

/// Alignments in reverse order of discovery: the newest is first.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentList<T> {
    items: VecDeque<Alignment<T>>,
}

impl<T> Default for AlignmentList<T> {
    fn default() -> Self {
        Self { items: VecDeque::new() }
    }
}

impl<T> AlignmentList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly found alignment ahead of the older ones
    pub fn push_front(&mut self, alignment: Alignment<T>) {
        self.items.push_front(alignment);
    }

    pub fn pop_front(&mut self) -> Option<Alignment<T>> {
        self.items.pop_front()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Alignment<T>> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Newest first, as stored
    pub fn into_vec(self) -> Vec<Alignment<T>> {
        self.items.into()
    }
}

impl<T> FromIterator<Alignment<T>> for AlignmentList<T> {
    /// Items are taken as already ordered newest first
    fn from_iter<I: IntoIterator<Item = Alignment<T>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Gap costs and x-drop settings for the redo pass, plus algorithm extras
#[derive(Debug, Clone)]
pub struct GappingParams<E> {
    pub gap_open: i32,
    pub gap_extend: i32,
    /// Penalty for declining to align a pair
    pub decline_align: i32,
    pub x_dropoff: i32,
    pub context: E,
}
