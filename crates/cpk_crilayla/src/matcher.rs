//! Longest-backreference search.
//!
//! An exhaustive search tries every window offset `i` in `0..8192` in
//! ascending order, measures how far the bytes at `pos` and `pos + i + 3`
//! agree walking toward lower addresses, and keeps the first longest match.
//!
//! Only candidates whose three leading bytes agree can yield a usable
//! match, so candidates are drawn from an index of 3-byte sequences. The
//! index is scanned in the same ascending order with the same strict
//! comparison, which keeps the chosen offset identical to the exhaustive
//! scan.

use crate::backref::{BackreferenceOp, MIN_MATCH, OFFSET_BIAS, WINDOW_SIZE};
use std::collections::HashMap;

type Trigram = [u8; 3];

pub(crate) struct MatchFinder<'a> {
    data: &'a [u8],
    /// Positions `s` (ascending) keyed by `data[s-2..=s]`.
    chains: HashMap<Trigram, Vec<usize>>,
}

impl<'a> MatchFinder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        let mut chains: HashMap<Trigram, Vec<usize>> = HashMap::new();
        for s in 2..data.len() {
            chains.entry(trigram(data, s)).or_default().push(s);
        }
        Self { data, chains }
    }

    /// Longest usable backreference for the byte at `pos`, if any.
    pub(crate) fn longest(&self, pos: usize) -> Option<BackreferenceOp> {
        // Index 0 never takes part in a match, so three matching bytes
        // need `pos >= 3`.
        if (pos as u64) < MIN_MATCH {
            return None;
        }

        let candidates = self.chains.get(&trigram(self.data, pos))?;
        let first = pos + OFFSET_BIAS;
        let last = (first + WINDOW_SIZE - 1).min(self.data.len().checked_sub(1)?);
        if first > last {
            return None;
        }

        let start = candidates.partition_point(|&s| s < first);
        let mut best: Option<BackreferenceOp> = None;
        let mut best_len = 0usize;

        for &source in candidates[start..].iter().take_while(|&&s| s <= last) {
            let len = self.match_len(pos, source);
            if len > best_len {
                best_len = len;
                best = Some(BackreferenceOp {
                    offset: (source - first) as u16,
                    length: len as u64,
                });
                if len == pos {
                    break;
                }
            }
        }

        best.filter(|op| op.length >= MIN_MATCH)
    }

    /// Number of agreeing bytes walking down from `pos` and `source`,
    /// never counting index 0.
    fn match_len(&self, pos: usize, source: usize) -> usize {
        let mut d = pos;
        let mut s = source;
        while d > 0 && self.data[d] == self.data[s] {
            d -= 1;
            s -= 1;
        }
        pos - d
    }
}

fn trigram(data: &[u8], end: usize) -> Trigram {
    [data[end - 2], data[end - 1], data[end]]
}

/// Exhaustive window scan, used to check the indexed search.
#[cfg(test)]
pub(crate) fn longest_exhaustive(data: &[u8], pos: usize) -> Option<BackreferenceOp> {
    let mut best_offset = 0usize;
    let mut best_len = 0usize;

    for i in 0..WINDOW_SIZE {
        let source = pos + i + OFFSET_BIAS;
        if source >= data.len() {
            break;
        }
        let mut d = pos;
        let mut s = source;
        while d > 0 && data[d] == data[s] {
            d -= 1;
            s -= 1;
        }
        if pos - d > best_len {
            best_len = pos - d;
            best_offset = i;
        }
    }

    (best_len as u64 >= MIN_MATCH).then(|| BackreferenceOp {
        offset: best_offset as u16,
        length: best_len as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn repeated_phrase_is_found() {
        let data = b"xabcdQQabcd";
        let finder = MatchFinder::new(data);
        // "abcd" ending at 4 reappears ending at 10: distance 6 -> offset 3.
        let op = finder.longest(4).unwrap();
        assert_eq!(op, BackreferenceOp { offset: 3, length: 4 });
        assert_eq!(Some(op), longest_exhaustive(data, 4));
    }

    #[test]
    fn short_positions_have_no_match() {
        let data = [5u8; 64];
        let finder = MatchFinder::new(&data);
        assert_eq!(finder.longest(0), None);
        assert_eq!(finder.longest(2), None);
        assert_eq!(finder.longest(3).unwrap().length, 3);
    }

    #[test]
    fn run_matches_up_to_but_not_including_index_zero() {
        let data = [9u8; 300];
        let finder = MatchFinder::new(&data);
        let op = finder.longest(296).unwrap();
        assert_eq!(op, BackreferenceOp { offset: 0, length: 296 });
    }

    #[test]
    fn last_positions_have_no_window() {
        let data = [1u8; 10];
        let finder = MatchFinder::new(&data);
        assert_eq!(finder.longest(7), None);
        assert_eq!(finder.longest(9), None);
    }

    #[test]
    fn ties_keep_the_smallest_offset() {
        // "abc" at 1..=3 recurs at 5..=7 and 9..=11.
        let data = b"zabcQabcRabcS";
        let finder = MatchFinder::new(data);
        let op = finder.longest(3).unwrap();
        assert_eq!(op.offset, 1);
        assert_eq!(Some(op), longest_exhaustive(data, 3));
    }

    proptest! {
        #[test]
        fn indexed_search_matches_exhaustive(
            data in prop::collection::vec(0u8..4, 4..600),
            probe in any::<prop::sample::Index>(),
        ) {
            let finder = MatchFinder::new(&data);
            let pos = probe.index(data.len());
            prop_assert_eq!(finder.longest(pos), longest_exhaustive(&data, pos));
        }
    }
}
