//! Unit tests for common.rs

use blastcore::common::{score_compare_hsps, write_hits, Hit};

fn hit(raw_score: i32, q_start: usize, q_end: usize) -> Hit {
    Hit {
        query_id: "query1".to_string(),
        subject_id: "subject1".to_string(),
        identity: 87.5,
        length: q_end + 1 - q_start,
        mismatch: 1,
        gapopen: 0,
        q_start,
        q_end,
        s_start: 10,
        s_end: 10 + q_end - q_start,
        e_value: 3.2e-5,
        bit_score: 41.23,
        q_idx: 0,
        s_idx: 0,
        raw_score,
    }
}

#[test]
fn test_query_coordinates_break_ties() {
    let mut hits = vec![hit(40, 5, 12), hit(40, 1, 8), hit(40, 1, 20)];
    hits.sort_by(score_compare_hsps);
    let starts: Vec<(usize, usize)> = hits.iter().map(|h| (h.q_start, h.q_end)).collect();
    // Subject ends differ, so they decide first
    assert_eq!(starts, vec![(1, 20), (1, 8), (5, 12)]);
}

#[test]
fn test_tabular_line_format() {
    let mut out = Vec::new();
    write_hits(&mut out, &[hit(40, 1, 8)]).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "query1\tsubject1\t87.500\t8\t1\t0\t1\t8\t10\t17\t3.2e-5\t41.2\n"
    );
}
