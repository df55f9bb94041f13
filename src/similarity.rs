//! Gestalt (Ratcliff/Obershelp) string similarity.
//!
//! The ratio is `2 * M / T`, where `M` is the number of characters in the
//! matching blocks found by repeatedly taking the longest common contiguous
//! block and recursing on either side of it, and `T` is the total length of
//! both strings.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a ratio becomes an integer score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// `trunc(ratio) * 100`: 100 for identical strings, 0 otherwise.
    #[default]
    Truncated,
    /// `floor(ratio * 100)`.
    Percent,
}

impl FromStr for ScoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncated" => Ok(Self::Truncated),
            "percent" => Ok(Self::Percent),
            other => Err(format!("unknown score mode: {other}")),
        }
    }
}

/// Similarity in `[0, 1]`. Symmetric; two empty strings score 1.0.
pub fn ratio(a: &str, b: &str) -> f64 {
    // Longest-block ties are broken by position, so fix the argument order
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Integer score on a 0..=100 scale.
pub fn score(a: &str, b: &str, mode: ScoreMode) -> u32 {
    let r = ratio(a, b);
    match mode {
        ScoreMode::Truncated => (r.trunc() as u32) * 100,
        ScoreMode::Percent => (r * 100.0).floor() as u32,
    }
}

/// Score against a field that may be absent. Absent scores 0.
pub fn score_field(found: Option<&str>, expected: &str, mode: ScoreMode) -> u32 {
    found.map_or(0, |found| score(found, expected, mode))
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
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
    matched
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows. Among
/// equally long blocks the one starting earliest in `a`, then in `b`, wins.
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run length of the block ending at b[j], for the previous row of a
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();
        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let k = j.checked_sub(1).and_then(|p| j2len.get(&p)).copied().unwrap_or(0) + 1;
                next.insert(j, k);
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        j2len = next;
    }

    (best_i, best_j, best_k)
}
