//! # Section Assembly
//!
//! Turns the raw lines of one section body into two index-aligned sequences:
//! tablature lines and lyric lines. Row `i` of a section is always the pair
//! `(tablature_lines[i], lyric_lines[i])`.
//!
//! Input transcripts are not reliably alternating: a run of chord-only lines
//! (an intro) or lyric-only lines (a spoken part) is common. The assembler
//! keeps the pairing intact by inserting an empty counterpart whenever two
//! consecutive lines have the same kind.
//!
//! ## State Machine
//! ```text
//! state              input         action                                next state
//! Start              Tablature     push tab                              LastWasTablature
//! Start              Lyric         push lyric                            LastWasLyric
//! LastWasTablature   Tablature     push tab, push "" lyric               LastWasTablature
//! LastWasTablature   Lyric         push lyric                            LastWasLyric
//! LastWasLyric       Lyric         push lyric, push "" tab               LastWasLyric
//! LastWasLyric       Tablature     push tab                              LastWasTablature
//! any                blank row     push "" tab, push "" lyric            unchanged
//! ```
//!
//! When the walk is done the two sequences may differ by one line (the last
//! row was only half filled); the shorter one is padded. Anything larger is a
//! [`TabError::SectionMismatch`].

use crate::classify::classify;
use crate::error::TabError;
use crate::model::{LineKind, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    Start,
    LastWasTablature,
    LastWasLyric,
}

/// Incremental builder for one section.
#[derive(Debug)]
pub struct SectionAssembler {
    header: String,
    state: AssemblerState,
    lyric_lines: Vec<String>,
    tablature_lines: Vec<String>,
}

impl SectionAssembler {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            state: AssemblerState::Start,
            lyric_lines: Vec::new(),
            tablature_lines: Vec::new(),
        }
    }

    /// Add a line whose kind is already known.
    ///
    /// `Undetermined` lines are treated as blank rows.
    pub fn push(&mut self, line: &str, kind: LineKind) {
        let line = line.to_string();
        self.state = match (self.state, kind) {
            (_, LineKind::Undetermined) => {
                self.push_blank_row();
                return;
            }
            (AssemblerState::LastWasTablature, LineKind::Tablature) => {
                log::trace!("Inserting empty lyric line in '{}'", self.header);
                self.tablature_lines.push(line);
                self.lyric_lines.push(String::new());
                AssemblerState::LastWasTablature
            }
            (AssemblerState::LastWasLyric, LineKind::Lyric) => {
                log::trace!("Inserting empty tablature line in '{}'", self.header);
                self.lyric_lines.push(line);
                self.tablature_lines.push(String::new());
                AssemblerState::LastWasLyric
            }
            (_, LineKind::Tablature) => {
                self.tablature_lines.push(line);
                AssemblerState::LastWasTablature
            }
            (_, LineKind::Lyric) => {
                self.lyric_lines.push(line);
                AssemblerState::LastWasLyric
            }
        };
    }

    /// Add a line and let the classifier decide its kind.
    ///
    /// Whitespace-only lines become blank rows and do not change the state.
    pub fn push_guessed(&mut self, line: &str) {
        if line.trim().is_empty() {
            self.push_blank_row();
            return;
        }
        let kind = classify(line);
        log::debug!("Line '{}' classified as {:?}", line, kind);
        self.push(line, kind);
    }

    /// Add an empty tablature line and an empty lyric line.
    pub fn push_blank_row(&mut self) {
        self.tablature_lines.push(String::new());
        self.lyric_lines.push(String::new());
    }

    /// Check the row counts and produce the section.
    pub fn finish(mut self) -> Result<Section, TabError> {
        let lyrics = self.lyric_lines.len();
        let tabs = self.tablature_lines.len();
        if lyrics.abs_diff(tabs) > 1 {
            log::error!(
                "Unable to parse section '{}': {} lyric lines vs {} tablature lines",
                self.header,
                lyrics,
                tabs
            );
            return Err(TabError::SectionMismatch {
                header: self.header,
                lyric_lines: lyrics,
                tablature_lines: tabs,
            });
        }
        if lyrics > tabs {
            self.tablature_lines.push(String::new());
        } else if tabs > lyrics {
            self.lyric_lines.push(String::new());
        }

        Ok(Section {
            header: self.header,
            lyric_lines: self.lyric_lines,
            tablature_lines: self.tablature_lines,
            dimensions: None,
        })
    }
}

/// Assemble a section from freely mixed lines, classifying each one.
pub fn assemble_guessed<'a, I>(header: &str, lines: I) -> Result<Section, TabError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut assembler = SectionAssembler::new(header);
    for line in lines {
        assembler.push_guessed(line);
    }
    assembler.finish()
}

/// Assemble a section whose lines strictly alternate tablature, lyric,
/// tablature, ... Line roles are positional; nothing is classified.
pub fn assemble_alternating<'a, I>(header: &str, lines: I) -> Result<Section, TabError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut assembler = SectionAssembler::new(header);
    for (i, line) in lines.into_iter().enumerate() {
        let kind = if i % 2 == 0 {
            LineKind::Tablature
        } else {
            LineKind::Lyric
        };
        assembler.push(line, kind);
    }
    assembler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_alternating_lines_pair_up() {
        let section = assemble_guessed("Verse", ["G  D", "Hello world", "C  G", "Goodbye now"]).unwrap();
        assert_eq!(section.tablature_lines, strings(&["G  D", "C  G"]));
        assert_eq!(section.lyric_lines, strings(&["Hello world", "Goodbye now"]));
    }

    #[test]
    fn test_tablature_run_gets_empty_lyrics() {
        let section = assemble_guessed("Intro", ["G  D", "Em C", "x02120", "Hello world"]).unwrap();
        assert_eq!(section.tablature_lines, strings(&["G  D", "Em C", "x02120"]));
        assert_eq!(section.lyric_lines, strings(&["", "", "Hello world"]));
    }

    #[test]
    fn test_lyric_run_gets_empty_tablature() {
        let section = assemble_guessed("Outro", ["Say it loud", "Say it clear"]).unwrap();
        assert_eq!(section.lyric_lines, strings(&["Say it loud", "Say it clear"]));
        assert_eq!(section.tablature_lines, strings(&["", ""]));
    }

    #[test]
    fn test_trailing_half_row_is_padded() {
        let section = assemble_guessed("Verse", ["G  D", "Hello world", "C"]).unwrap();
        assert_eq!(section.tablature_lines, strings(&["G  D", "C"]));
        assert_eq!(section.lyric_lines, strings(&["Hello world", ""]));
    }

    #[test]
    fn test_blank_line_is_a_blank_row_and_keeps_state() {
        let section = assemble_guessed("Verse", ["G  D", "Hello world", "  ", "Goodbye"]).unwrap();
        // "Goodbye" follows a lyric line, the blank row does not reset that
        assert_eq!(section.lyric_lines, strings(&["Hello world", "", "Goodbye"]));
        assert_eq!(section.tablature_lines, strings(&["G  D", "", ""]));
    }

    #[test]
    fn test_empty_body_gives_empty_section() {
        let section = assemble_guessed("Solo", std::iter::empty()).unwrap();
        assert!(section.lyric_lines.is_empty());
        assert!(section.tablature_lines.is_empty());
    }

    #[test]
    fn test_lengths_always_match() {
        let bodies: [&[&str]; 4] = [
            &["x24442", "x46654", "x02120", "Sing"],
            &["Sing", "la", "la", "la"],
            &["", "G", "", "Hello", "D", "D"],
            &["Hi", "G", "Hi", "G", "G"],
        ];
        for body in bodies {
            let section = assemble_guessed("Any", body.iter().copied()).unwrap();
            assert_eq!(section.lyric_lines.len(), section.tablature_lines.len(), "{:?}", body);
        }
    }

    #[test]
    fn test_alternating_mode_ignores_classification() {
        // Both lines look like lyrics, position decides
        let section = assemble_alternating("Verse", ["words here", "more words", "third"]).unwrap();
        assert_eq!(section.tablature_lines, strings(&["words here", "third"]));
        assert_eq!(section.lyric_lines, strings(&["more words", ""]));
    }

    #[test]
    fn test_alternating_mode_keeps_blank_lines_positional() {
        let section = assemble_alternating("Verse", ["", "Hello world"]).unwrap();
        assert_eq!(section.tablature_lines, strings(&[""]));
        assert_eq!(section.lyric_lines, strings(&["Hello world"]));
    }

    #[test]
    fn test_mismatch_is_reported() {
        let assembler = SectionAssembler {
            header: "Broken".to_string(),
            state: AssemblerState::LastWasLyric,
            lyric_lines: strings(&["a", "b", "c"]),
            tablature_lines: strings(&["x"]),
        };
        match assembler.finish() {
            Err(TabError::SectionMismatch { header, lyric_lines, tablature_lines }) => {
                assert_eq!(header, "Broken");
                assert_eq!(lyric_lines, 3);
                assert_eq!(tablature_lines, 1);
            }
            other => panic!("Expected SectionMismatch but got: {:?}", other),
        }
    }
}
