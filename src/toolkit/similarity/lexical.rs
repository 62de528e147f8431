use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{to_percent, DegradeReason, ScoreOutcome};

/// Sequences at least this long get their popular characters junked.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Rows of the longest-match scan between deadline checks.
const DEADLINE_CHECK_ROWS: usize = 256;


/// Ratcliff-Obershelp ratio over characters: `2 * matched / (len(a) + len(b))`,
/// where `matched` sums the blocks found by recursively taking the longest
/// common block and descending into the pieces left and right of it.
///
/// The block search is order-dependent, so the pair is always aligned with
/// the lexicographically smaller text first.
#[derive(Debug, Clone, Copy)]
pub struct LexicalComparator {
    timeout: Duration,
}

impl LexicalComparator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Past the deadline the blocks matched so far are scored as they are.
    pub fn compare(&self, a: &str, b: &str) -> ScoreOutcome {
        if a.is_empty() || b.is_empty() {
            return ScoreOutcome::Degraded(DegradeReason::EmptyInput);
        }
        if a == b {
            return ScoreOutcome::Scored(100.0);
        }

        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let matcher = BlockMatcher::new(&a, &b, Instant::now() + self.timeout);
        let (matched, complete) = matcher.matched_chars();
        if !complete {
            warn!(
                "Lexical alignment hit its {:?} deadline ({} vs {} chars), scoring partial match",
                self.timeout,
                a.len(),
                b.len()
            );
        }

        let ratio = 2.0 * matched as f64 / (a.len() + b.len()) as f64;
        debug!("Lexical ratio {:.4} ({} vs {} chars)", ratio, a.len(), b.len());
        ScoreOutcome::Scored(to_percent(ratio))
    }
}

impl Default for LexicalComparator {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}


struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, popular characters removed.
    b2j: HashMap<char, Vec<usize>>,
    deadline: Instant,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char], deadline: Instant) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        // A character filling more than 1% of a long `b` cannot anchor a block.
        if b.len() >= AUTOJUNK_MIN_LEN {
            let popular = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= popular);
        }

        Self { a, b, b2j, deadline }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Total size of all matching blocks, and whether the search finished
    /// before the deadline.
    fn matched_chars(&self) -> (usize, bool) {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            if self.expired() {
                return (matched, false);
            }
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                queue.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                queue.push((i + k, ahi, j + k, bhi));
            }
        }

        (matched, true)
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges. Ties go
    /// to the earliest `i`, then the earliest `j`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
        // Length of the block ending at (i - 1, j), keyed by j.
        let mut run_ending: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            if (i - alo) % DEADLINE_CHECK_ROWS == DEADLINE_CHECK_ROWS - 1 && self.expired() {
                break;
            }
            let mut next_run: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_run.insert(j, k);
                    if k > best_k {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_k = k;
                    }
                }
            }
            run_ending = next_run;
        }

        // Grow the block over neighbours the index left out.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_k += 1;
        }
        while best_i + best_k < ahi
            && best_j + best_k < bhi
            && self.a[best_i + best_k] == self.b[best_j + best_k]
        {
            best_k += 1;
        }

        (best_i, best_j, best_k)
    }
}
