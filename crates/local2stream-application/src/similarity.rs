// SPDX-License-Identifier: GPL-3.0-or-later

//! String similarity for candidate scoring.
//!
//! The score blends three signals on normalized text: a Ratcliff/Obershelp
//! ratio, a containment floor for titles carrying extra annotations, and the
//! same ratio with spacing and punctuation removed.

use crate::normalize::{alphanumeric_only, normalize};
use std::collections::HashMap;

/// Score given when one normalized string contains the other.
pub const CONTAINMENT_FLOOR: f64 = 0.85;

/// Similarity of `candidate` to `reference` in `[0.0, 1.0]`.
///
/// Argument order matters only for tie-breaking inside the ratio; callers
/// pass the catalog value first and the local value second.
pub fn similarity(candidate: &str, reference: &str) -> f64 {
    let candidate = normalize(candidate);
    let reference = normalize(reference);

    let mut score = sequence_ratio(&candidate, &reference);

    // The empty string is contained in every string.
    if candidate.contains(&reference) || reference.contains(&candidate) {
        score = score.max(CONTAINMENT_FLOOR);
    }

    let compact = sequence_ratio(
        &alphanumeric_only(&candidate),
        &alphanumeric_only(&reference),
    );
    score.max(compact)
}

/// Ratcliff/Obershelp ratio: `2 * M / (|a| + |b|)` where `M` counts the
/// characters in the recursively found longest common blocks.
///
/// Two empty strings are identical and score 1.0.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        positions.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_block(a, &positions, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }

        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }

    matched
}

/// Longest common block of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Among equally long blocks the one starting earliest in `a`, then
/// earliest in `b`, wins.
fn longest_block(
    a: &[char],
    positions: &HashMap<char, Vec<usize>>,
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
    // Length of the block ending at a[i - 1], b[j], keyed by j.
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(a_hi).skip(a_lo) {
        let mut next_run_lengths = HashMap::new();
        if let Some(indices) = positions.get(c) {
            for &j in indices {
                if j < b_lo {
                    continue;
                }
                if j >= b_hi {
                    break;
                }
                let size = j
                    .checked_sub(1)
                    .and_then(|prev| run_lengths.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_lengths.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
        }
        run_lengths = next_run_lengths;
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn ratio_of_identical_strings_is_one() {
        assert_eq!(sequence_ratio("yesterday", "yesterday"), 1.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
    }

    #[test]
    fn ratio_against_empty_is_zero() {
        assert_eq!(sequence_ratio("abc", ""), 0.0);
        assert_eq!(sequence_ratio("", "abc"), 0.0);
    }

    #[test]
    fn ratio_counts_recursive_blocks() {
        assert_eq!(sequence_ratio("ab", "ac"), 0.5);
        // "abcd" vs "bcde": block "bcd" => 2 * 3 / 8
        assert!(approx(sequence_ratio("abcd", "bcde"), 0.75));
        // Blocks "ab" and "cd"
        assert!(approx(sequence_ratio("qabxcd", "abycdf"), 2.0 * 4.0 / 12.0));
    }

    #[test]
    fn ratio_of_prefix_is_symmetric() {
        assert!(approx(
            sequence_ratio("one more time", "one more tim"),
            sequence_ratio("one more tim", "one more time")
        ));
    }

    #[test]
    fn identical_after_normalization_scores_one() {
        assert_eq!(similarity("Yesterday (Remastered 2009)", "yesterday"), 1.0);
    }

    #[test]
    fn containment_raises_score_to_floor() {
        let raw = sequence_ratio("one more time radio edit", "one more time");
        assert!(raw < CONTAINMENT_FLOOR);
        assert_eq!(
            similarity("One More Time Radio Edit", "One More Time"),
            CONTAINMENT_FLOOR
        );
    }

    #[test]
    fn annotation_only_side_counts_as_contained() {
        assert_eq!(similarity("(Live)", "Yesterday"), CONTAINMENT_FLOOR);
        assert_eq!(similarity("Yesterday", "[Bonus Track]"), CONTAINMENT_FLOOR);
        assert_eq!(similarity("", "a"), CONTAINMENT_FLOOR);
    }

    #[test]
    fn accented_letters_are_kept_distinct() {
        // Letters outside ASCII survive the compact form, so "ö" and "o"
        // differ: blocks "bj" and "rk" give 2 * 4 / 10.
        assert!(approx(similarity("Björk", "Bjork"), 0.8));
        assert_eq!(alphanumeric_only("björk"), "björk");
    }

    #[test]
    fn spacing_differences_score_via_compact_form() {
        assert_eq!(similarity("Hey Jude", "HeyJude"), 1.0);
    }

    #[test]
    fn unrelated_strings_score_low() {
        assert!(similarity("Bohemian Rhapsody", "Yesterday") < 0.4);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let pairs = [
            ("", ""),
            ("a", ""),
            ("Song", "Song (Live)"),
            ("AC/DC", "ACDC"),
            ("x", "y"),
        ];
        for (a, b) in pairs {
            let score = similarity(a, b);
            assert!((0.0..=1.0).contains(&score), "{} for {:?}", score, (a, b));
        }
    }
}
