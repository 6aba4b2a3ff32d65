//! Neighboring word generation
//!
//! Reference: blast_aalookup.c s_AddNeighboringWords / blast_lookup.c MakeAllWordSequence

use super::builder::LookupTableBuilder;
use crate::utils::matrix::ScoreMatrix;

/// Linear de Bruijn sequence over `0..alphabet_size` for words of length
/// `word_size`: every possible word occurs exactly once as a substring.
///
/// The cyclic sequence (length a^k) comes from concatenating Lyndon words in
/// lexicographic order (Fredricksen-Kessler-Maiorana); its first k-1 symbols
/// are appended so the wrap-around words are also contiguous, giving length
/// a^k + k - 1.
pub fn make_all_word_sequence(alphabet_size: usize, word_size: usize) -> Vec<u8> {
    debug_assert!(alphabet_size >= 1 && alphabet_size <= 256 && word_size >= 1);

    let total = alphabet_size.pow(word_size as u32);
    let mut seq: Vec<u8> = Vec::with_capacity(total + word_size - 1);
    let mut a = vec![0u8; word_size + 1];

    fkm(1, 1, word_size, alphabet_size, &mut a, &mut seq);

    debug_assert_eq!(seq.len(), total);
    let head: Vec<u8> = seq[..word_size - 1].to_vec();
    seq.extend_from_slice(&head);
    seq
}

fn fkm(t: usize, p: usize, n: usize, k: usize, a: &mut [u8], seq: &mut Vec<u8>) {
    if t > n {
        if n % p == 0 {
            seq.extend_from_slice(&a[1..=p]);
        }
        return;
    }
    a[t] = a[t - p];
    fkm(t + 1, p, n, k, a, seq);
    for j in (a[t - p] as usize + 1)..k {
        a[t] = j as u8;
        fkm(t + 1, t, n, k, a, seq);
    }
}

impl LookupTableBuilder {
    /// Index `query_offset` under every word that scores at least the
    /// threshold against `word`, and under `word` itself.
    ///
    /// Walks every window of the de Bruijn sequence, so each candidate word
    /// is scored exactly once.
    pub(super) fn add_neighboring_words(&mut self, matrix: &ScoreMatrix, word: &[u8], query_offset: u32) {
        let word_size = self.options.word_size;
        let threshold = self.options.threshold;

        let neighbors = match self.neighbors.take() {
            Some(seq) => seq,
            None => make_all_word_sequence(self.options.alphabet_size, word_size),
        };

        for candidate in neighbors.windows(word_size) {
            if candidate == word {
                self.add_word_hit(candidate, query_offset);
                self.stats.exact_matches += 1;
            } else if matrix.word_score(word, candidate) >= threshold {
                self.add_word_hit(candidate, query_offset);
                self.stats.neighbor_matches += 1;
            }
        }

        self.neighbors = Some(neighbors);
    }
}
