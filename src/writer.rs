//! # Text Writer
//!
//! Serializes a parsed song back to plain text, with a predictable layout:
//!
//! ```text
//! metadata
//! [section header]
//! <tablature line>
//! <lyric line>
//! ...
//! ```
//!
//! ## Formats
//! - [`TextFormat::Readable`] (`.txt`) drops the empty half of a row, writes a
//!   single blank line for a fully empty row and separates blocks with blank
//!   lines unless empty lines were kept from the input
//! - [`TextFormat::Raw`] (`.rawtxt`) writes both halves of every row, so the
//!   file parses back in strict mode to the same rows
//!
//! Every output line is recorded in a [`LineIndex`] by role, which tools that
//! only need part of the song (chords, lyrics) can use instead of re-parsing.

use crate::error::TabError;
use crate::model::Song;
use serde::Serialize;

/// Which text layout to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Readable,
    Raw,
}

impl TextFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TextFormat::Readable => "txt",
            TextFormat::Raw => "rawtxt",
        }
    }
}

/// 0-based output line numbers grouped by role
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineIndex {
    pub empty_lines: Vec<usize>,
    pub lyric_lines: Vec<usize>,
    pub non_lyric_lines: Vec<usize>,
    pub section_headers: Vec<usize>,
    pub metadata_lines: Vec<usize>,
}

impl LineIndex {
    pub fn to_json(&self) -> Result<String, TabError> {
        serde_json::to_string_pretty(self).map_err(|e| TabError::Serialize {
            what: "line index".to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextOutput {
    pub text: String,
    pub index: LineIndex,
}

#[derive(Clone, Copy)]
enum Role {
    Empty,
    Lyric,
    NonLyric,
    Header,
    Metadata,
}

#[derive(Default)]
struct LineWriter {
    text: String,
    index: LineIndex,
    line: usize,
}

impl LineWriter {
    fn push(&mut self, content: &str, role: Role) {
        self.text.push_str(content);
        self.text.push_str("\r\n");
        let bucket = match role {
            Role::Empty => &mut self.index.empty_lines,
            Role::Lyric => &mut self.index.lyric_lines,
            Role::NonLyric => &mut self.index.non_lyric_lines,
            Role::Header => &mut self.index.section_headers,
            Role::Metadata => &mut self.index.metadata_lines,
        };
        bucket.push(self.line);
        self.line += 1;
    }
}

/// Write a song as text.
///
/// `keep_empty_lines` must match the value the song was parsed with: when the
/// input's blank lines were kept, no extra separators are added.
pub fn write_text(song: &Song, format: TextFormat, keep_empty_lines: bool) -> Result<TextOutput, TabError> {
    let raw = format == TextFormat::Raw;
    let separate_blocks = !raw && !keep_empty_lines;
    let mut out = LineWriter::default();

    for line in song.metadata.lines() {
        if !keep_empty_lines && line.trim().is_empty() {
            continue;
        }
        out.push(line, Role::Metadata);
    }
    if separate_blocks {
        out.push("", Role::Empty);
    }

    for section in &song.sections {
        if section.lyric_lines.len() != section.tablature_lines.len() {
            log::error!("Cannot write section '{}' of '{}'", section.header, song.title);
            return Err(TabError::SectionMismatch {
                header: section.header.clone(),
                lyric_lines: section.lyric_lines.len(),
                tablature_lines: section.tablature_lines.len(),
            });
        }

        out.push(section.header_line().trim_end(), Role::Header);
        for (tab, lyric) in section.rows() {
            let tab = tab.trim_end();
            let lyric = lyric.trim_end();
            if raw || !tab.is_empty() {
                out.push(tab, Role::NonLyric);
            }
            if raw || !lyric.is_empty() {
                out.push(lyric, Role::Lyric);
            }
            if !raw && tab.is_empty() && lyric.is_empty() {
                out.push("", Role::Empty);
            }
        }
        if separate_blocks {
            out.push("", Role::Empty);
        }
    }

    log::debug!(
        "Wrote {} lines of '{}' as {}",
        out.line,
        song.title,
        format.extension()
    );
    Ok(TextOutput {
        text: out.text,
        index: out.index,
    })
}
