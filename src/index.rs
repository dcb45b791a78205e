//! Exact-match shingle dictionary used by the compressor.
//!
//! Every length-`MIN_MATCH` window of the input is keyed by its value tuple.
//! Positions are appended in ascending order during construction, so each
//! list is sorted and windowed lookups are a binary search.

use std::collections::HashMap;

use crate::format::{MAX_LENGTH, MAX_OFFSET, MIN_MATCH};

pub type Shingle = [i32; MIN_MATCH];

/// A back-reference candidate chosen by [`ShingleIndex::best_match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub distance: usize,
    pub length: usize,
}

pub struct ShingleIndex<'a> {
    input: &'a [i32],
    positions: HashMap<Shingle, Vec<usize>>,
}

impl<'a> ShingleIndex<'a> {
    pub fn build(input: &'a [i32]) -> Self {
        let mut positions: HashMap<Shingle, Vec<usize>> = HashMap::new();
        for (pos, window) in input.windows(MIN_MATCH).enumerate() {
            positions.entry(shingle(window)).or_default().push(pos);
        }
        Self { input, positions }
    }

    /// Prior occurrences of the shingle at `pos` inside the window, nearest
    /// first.
    fn candidates(&self, pos: usize) -> impl Iterator<Item = usize> + '_ {
        let list = self
            .input
            .get(pos..pos + MIN_MATCH)
            .and_then(|window| self.positions.get(&shingle(window)))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let floor = pos.saturating_sub(MAX_OFFSET);
        let lo = list.partition_point(|&p| p < floor);
        let hi = list.partition_point(|&p| p < pos);
        list[lo..hi].iter().rev().copied()
    }

    /// Longest back-reference available at `pos`, ties going to the smaller
    /// distance. Matches may run into the region they copy to.
    pub fn best_match(&self, pos: usize) -> Option<Match> {
        let limit = MAX_LENGTH.min(self.input.len() - pos);
        let mut best: Option<Match> = None;
        for candidate in self.candidates(pos) {
            let mut length = MIN_MATCH;
            while length < limit && self.input[candidate + length] == self.input[pos + length] {
                length += 1;
            }
            if best.map_or(true, |b| length > b.length) {
                best = Some(Match {
                    distance: pos - candidate,
                    length,
                });
                if length == limit {
                    break;
                }
            }
        }
        best
    }
}

fn shingle(window: &[i32]) -> Shingle {
    let mut key = [0; MIN_MATCH];
    key.copy_from_slice(window);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_for_first_occurrence() {
        let input = [1, 2, 3, 4, 5];
        let index = ShingleIndex::build(&input);
        for pos in 0..input.len() {
            assert_eq!(index.best_match(pos), None);
        }
    }

    #[test]
    fn test_prefers_longest_then_nearest() {
        // Shingle [1,2,3] occurs at 0, 4 and 8. Position 0 extends to 4 values
        // for the match at 8, position 4 only to 3.
        let input = [1, 2, 3, 4, 1, 2, 3, 0, 1, 2, 3, 4];
        let index = ShingleIndex::build(&input);
        assert_eq!(
            index.best_match(8),
            Some(Match {
                distance: 8,
                length: 4
            })
        );

        // Equal lengths go to the nearer candidate.
        let input = [5, 6, 7, 5, 6, 7, 5, 6, 7];
        let index = ShingleIndex::build(&input);
        assert_eq!(
            index.best_match(6),
            Some(Match {
                distance: 3,
                length: 3
            })
        );
    }

    #[test]
    fn test_overlapping_run() {
        let input = [7; 10];
        let index = ShingleIndex::build(&input);
        assert_eq!(
            index.best_match(1),
            Some(Match {
                distance: 1,
                length: 9
            })
        );
    }

    #[test]
    fn test_tail_too_short_for_shingle() {
        let input = [1, 2, 3, 1, 2];
        let index = ShingleIndex::build(&input);
        assert_eq!(index.best_match(3), None);
        assert_eq!(index.best_match(4), None);
    }
}
