//! Character-level similarity between criterion terms and title spans
//!
//! The ratio is the classic longest-matching-blocks measure: find the
//! longest common run of characters, recurse on both sides of it, and
//! report `2 * M / (len(a) + len(b))` where `M` is the total size of the
//! matched runs. Identical strings score 1.0, disjoint strings 0.0.

use std::collections::HashMap;

/// A span scoring above this ends the search early
pub const EARLY_EXIT_SIMILARITY: f64 = 0.9;

/// Sequences at least this long drop over-represented characters from
/// the match index
const POPULAR_MIN_LEN: usize = 200;

/// Similarity ratio of `a` and `b` in [0, 1]
///
/// Two empty strings are identical and score 1.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = BlockMatcher::new(&a, &b).matched_len();
    2.0 * matched as f64 / total as f64
}

/// Best similarity between `term` and any contiguous word span of `title`
///
/// Spans are tried in order of start word, then end word. As soon as the
/// best score so far exceeds [`EARLY_EXIT_SIMILARITY`] it is returned
/// without looking at the remaining spans. A title with no words scores 0.
pub fn best_span_similarity(term: &str, title: &str) -> f64 {
    let words: Vec<&str> = title.split_whitespace().collect();
    let mut best = 0.0_f64;

    for start in 0..words.len() {
        for end in start + 1..=words.len() {
            let span = words[start..end].join(" ");
            best = best.max(ratio(term, &span));
            if best > EARLY_EXIT_SIMILARITY {
                return best;
            }
        }
    }

    best
}

/// A matched run: `a[a_start..a_start + len] == b[b_start..b_start + len]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a_start: usize,
    b_start: usize,
    len: usize,
}

struct BlockMatcher<'s> {
    a: &'s [char],
    b: &'s [char],

    /// Positions of each character of `b`, ascending
    b_index: HashMap<char, Vec<usize>>,
}

impl<'s> BlockMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b_index: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b_index.entry(*c).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    /// Longest matching block within `a[a_lo..a_hi]` and `b[b_lo..b_hi]`
    ///
    /// Ties go to the block starting earliest in `a`, then in `b`.
    fn longest_match(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Block {
        let mut best = Block {
            a_start: a_lo,
            b_start: b_lo,
            len: 0,
        };

        // run_len[j]: length of the match ending at a[i - 1], b[j]
        let mut run_len: HashMap<usize, usize> = HashMap::new();
        for i in a_lo..a_hi {
            let mut next_run_len = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run_len.insert(j, k);
                    if k > best.len {
                        best = Block {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            len: k,
                        };
                    }
                }
            }
            run_len = next_run_len;
        }

        // Characters dropped from the index can still extend a block
        while best.a_start > a_lo
            && best.b_start > b_lo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.len += 1;
        }
        while best.a_start + best.len < a_hi
            && best.b_start + best.len < b_hi
            && self.a[best.a_start + best.len] == self.b[best.b_start + best.len]
        {
            best.len += 1;
        }

        best
    }

    /// Total length of all matching blocks
    fn matched_len(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
            let block = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if block.len == 0 {
                continue;
            }
            matched += block.len;

            if a_lo < block.a_start && b_lo < block.b_start {
                pending.push((a_lo, block.a_start, b_lo, block.b_start));
            }
            let a_end = block.a_start + block.len;
            let b_end = block.b_start + block.len;
            if a_end < a_hi && b_end < b_hi {
                pending.push((a_end, a_hi, b_end, b_hi));
            }
        }

        matched
    }
}
