//! Line classification heuristic.
//!
//! Decides whether a raw line holds tablature/chord data or lyrics. The rules
//! are evaluated in a fixed order and the first match wins:
//!
//! 1. a tablature-only character (`/`, `#`) means tablature
//! 2. any letter outside the chord-letter allow-list means lyrics
//! 3. any digit means tablature
//! 4. a `.` means lyrics
//! 5. anything else is assumed to be tablature
//!
//! Reordering the rules changes results for lines that mix digits with
//! allow-listed letters, e.g. `a.m2`.

use crate::model::LineKind;

/// Characters that only appear in tablature (slash chords, sharps).
const TABLATURE_CHARS: &[char] = &['/', '#'];

/// Letters used by chord names and fingering notation (`x` for muted strings).
const CHORD_LETTERS: &[char] = &['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'x', 'm', 'j', 'n'];

const LYRIC_CHARS: &[char] = &['.'];

/// Classify a single line.
///
/// # Examples
/// ```
/// use tabsheet::{classify, LineKind};
///
/// assert_eq!(classify("x24442"), LineKind::Tablature);
/// assert_eq!(classify("Hello world"), LineKind::Lyric);
/// assert_eq!(classify("a.m2"), LineKind::Tablature);
/// assert_eq!(classify(""), LineKind::Undetermined);
/// ```
pub fn classify(line: &str) -> LineKind {
    if line.is_empty() {
        return LineKind::Undetermined;
    }

    if line.contains(TABLATURE_CHARS) {
        log::trace!("'{}' is tablature: contains a tablature character", line);
        return LineKind::Tablature;
    }

    let has_lyric_letter = line
        .chars()
        .filter(|c| c.is_alphabetic())
        .any(|c| !c.to_lowercase().all(|lower| CHORD_LETTERS.contains(&lower)));
    if has_lyric_letter {
        log::trace!("'{}' is lyrics: contains non-chord letters", line);
        return LineKind::Lyric;
    }

    if line.chars().any(|c| c.is_numeric()) {
        log::trace!("'{}' is tablature: contains a digit", line);
        return LineKind::Tablature;
    }

    if line.contains(LYRIC_CHARS) {
        log::trace!("'{}' is lyrics: contains a lyric punctuation mark", line);
        return LineKind::Lyric;
    }

    LineKind::Tablature
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line_is_undetermined() {
        assert_eq!(classify(""), LineKind::Undetermined);
    }

    #[test]
    fn test_fingering_is_tablature() {
        assert_eq!(classify("x24442"), LineKind::Tablature);
        assert_eq!(classify("244222"), LineKind::Tablature);
    }

    #[test]
    fn test_chord_names_are_tablature() {
        assert_eq!(classify("G  D"), LineKind::Tablature);
        assert_eq!(classify("Am    Em   C"), LineKind::Tablature);
        assert_eq!(classify("Bbmaj"), LineKind::Tablature);
    }

    #[test]
    fn test_tablature_characters_win_over_lyric_letters() {
        // 'o' and 'w' would make this a lyric line under rule 2
        assert_eq!(classify("D/F# now"), LineKind::Tablature);
        assert_eq!(classify("C#m"), LineKind::Tablature);
    }

    #[test]
    fn test_sung_text_is_lyric() {
        assert_eq!(classify("Hello world"), LineKind::Lyric);
        assert_eq!(classify("I'm on my way 2 you"), LineKind::Lyric);
    }

    #[test]
    fn test_allow_listed_letters_are_case_insensitive() {
        assert_eq!(classify("AM EM"), LineKind::Tablature);
        assert_eq!(classify("HX"), LineKind::Tablature);
    }

    #[test]
    fn test_digit_rule_runs_before_dot_rule() {
        assert_eq!(classify("a.m2"), LineKind::Tablature);
    }

    #[test]
    fn test_non_ascii_digits_count_as_digits() {
        assert_eq!(classify("٢.٣"), LineKind::Tablature);
        assert_eq!(classify("x２４"), LineKind::Tablature);
    }

    #[test]
    fn test_dot_without_digits_is_lyric() {
        assert_eq!(classify("a. b. c."), LineKind::Lyric);
        assert_eq!(classify("..."), LineKind::Lyric);
    }

    #[test]
    fn test_unmatched_line_defaults_to_tablature() {
        assert_eq!(classify("|---|---|"), LineKind::Tablature);
        assert_eq!(classify("   "), LineKind::Tablature);
    }

    #[test]
    fn test_non_ascii_letters_are_lyric() {
        assert_eq!(classify("één"), LineKind::Lyric);
    }
}
