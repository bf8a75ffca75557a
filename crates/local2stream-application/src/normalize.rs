// SPDX-License-Identifier: GPL-3.0-or-later

//! Canonical form for track titles and artist names.
//!
//! Local tags and catalog entries disagree on casing, punctuation and
//! edition annotations ("(Remastered 2011)", "[Live]"). [`normalize`]
//! strips all of that so the two sides can be compared directly.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Non-nested: runs from an opening paren to the first closing one.
    static ref PARENTHESIZED: Regex =
        Regex::new(r"\([^)]*\)").expect("parenthesized regex is valid");
    static ref BRACKETED: Regex = Regex::new(r"\[[^\]]*\]").expect("bracketed regex is valid");
    static ref HYPHEN: Regex = Regex::new(r"\s*-\s*").expect("hyphen regex is valid");
}

/// Reduce a title or artist name to its comparable form.
///
/// Removes `(...)` and `[...]` groups, turns hyphens into spaces, drops
/// everything that is neither alphanumeric nor whitespace, collapses
/// whitespace, trims and lowercases. Total and idempotent.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = PARENTHESIZED.replace_all(text, "");
    let text = BRACKETED.replace_all(&text, "");
    let text = HYPHEN.replace_all(&text, " ");

    // Lowercase before filtering: case mapping may emit combining marks.
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep only letters and digits.
pub fn alphanumeric_only(text: &str) -> String {
    text.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_parenthesized_annotations() {
        assert_eq!(normalize("Song (Remastered 2011)"), "song");
        assert_eq!(normalize("Song (Remastered 2011)"), normalize("song"));
    }

    #[test]
    fn strips_bracketed_annotations() {
        assert_eq!(normalize("Intro [Live at Wembley]"), "intro");
    }

    #[test]
    fn hyphen_becomes_space() {
        assert_eq!(normalize(" The-Song "), "the song");
        assert_eq!(normalize("Hey Jude - 2015 Remix"), "hey jude 2015 remix");
    }

    #[test]
    fn punctuation_removed_and_whitespace_collapsed() {
        assert_eq!(normalize("  Don't   Stop   Me Now!!  "), "dont stop me now");
        assert_eq!(normalize("AC/DC"), "acdc");
        assert_eq!(normalize("Guns N' Roses"), "guns n roses");
    }

    #[test]
    fn parenthesis_match_is_non_nested() {
        // First closing paren ends the group; the stray one is punctuation.
        assert_eq!(normalize("a (b (c) d) e"), "a d e");
    }

    #[test]
    fn unicode_letters_survive() {
        assert_eq!(normalize("Björk"), "björk");
        assert_eq!(normalize("Sigur Rós - Hoppípolla"), "sigur rós hoppípolla");
        assert_eq!(normalize("坂本龍一"), "坂本龍一");
    }

    #[test]
    fn empty_and_punctuation_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("(Intro)"), "");
        assert_eq!(normalize("?!..."), "");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "Song (Remastered 2011)",
            " The-Song ",
            "Don't Stop - Live [2019]",
            "İstanbul",
            "a (b (c) d) e",
            "ǅemal",
            "  --  ",
            "Mötley Crüe — Kickstart My Heart",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn alphanumeric_only_drops_spaces() {
        assert_eq!(alphanumeric_only("hey jude"), "heyjude");
        assert_eq!(alphanumeric_only(""), "");
    }
}
