/// Edit operation for traceback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Match (identical residues)
    Match,
    /// Mismatch (different residues)
    Mismatch,
    /// Insertion in query (gap in subject)
    Ins,
    /// Deletion from query (gap in query)
    Del,
}

impl EditOp {
    #[inline]
    pub fn consumes_query(self) -> bool {
        !matches!(self, EditOp::Del)
    }

    #[inline]
    pub fn consumes_subject(self) -> bool {
        !matches!(self, EditOp::Ins)
    }
}

/// Column statistics of an aligned pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentStats {
    pub matches: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
    /// Total gap columns
    pub gaps: usize,
    pub alignment_len: usize,
}

impl AlignmentStats {
    /// Percent identity over alignment columns
    pub fn identity(&self) -> f64 {
        if self.alignment_len == 0 {
            return 0.0;
        }
        100.0 * self.matches as f64 / self.alignment_len as f64
    }
}

/// Column-by-column description of a gapped alignment, first column first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ops(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn push(&mut self, op: EditOp) {
        self.ops.push(op);
    }

    pub fn reverse(&mut self) {
        self.ops.reverse();
    }

    /// Append `other` after the last column of `self`
    pub fn append(&mut self, other: &EditScript) {
        self.ops.extend_from_slice(&other.ops);
    }

    /// Query residues covered
    pub fn query_len(&self) -> usize {
        self.ops.iter().filter(|op| op.consumes_query()).count()
    }

    /// Subject residues covered
    pub fn subject_len(&self) -> usize {
        self.ops.iter().filter(|op| op.consumes_subject()).count()
    }

    pub fn stats(&self) -> AlignmentStats {
        let mut stats = AlignmentStats {
            alignment_len: self.ops.len(),
            ..AlignmentStats::default()
        };
        let mut prev_op: Option<EditOp> = None;
        for &op in &self.ops {
            match op {
                EditOp::Match => stats.matches += 1,
                EditOp::Mismatch => stats.mismatches += 1,
                EditOp::Ins | EditOp::Del => {
                    stats.gaps += 1;
                    if prev_op != Some(op) {
                        stats.gap_opens += 1;
                    }
                }
            }
            prev_op = Some(op);
        }
        stats
    }

    /// Re-score the script over `query`/`subject` starting at the given
    /// offsets. A gap of length L costs `gap_open + L * gap_extend`.
    pub fn score<F>(&self, query: &[u8], subject: &[u8], q_start: usize, s_start: usize, gap_open: i32, gap_extend: i32, mut substitution: F) -> i32
    where
        F: FnMut(u8, u8) -> i32,
    {
        let mut q = q_start;
        let mut s = s_start;
        let mut score = 0;
        let mut prev_op: Option<EditOp> = None;
        for &op in &self.ops {
            match op {
                EditOp::Match | EditOp::Mismatch => {
                    score += substitution(query[q], subject[s]);
                    q += 1;
                    s += 1;
                }
                EditOp::Ins => {
                    score -= if prev_op == Some(EditOp::Ins) { gap_extend } else { gap_open + gap_extend };
                    q += 1;
                }
                EditOp::Del => {
                    score -= if prev_op == Some(EditOp::Del) { gap_extend } else { gap_open + gap_extend };
                    s += 1;
                }
            }
            prev_op = Some(op);
        }
        score
    }
}
