use crate::assemble::{assemble_alternating, assemble_guessed};
use crate::error::TabError;
use crate::model::{Section, Song};
use std::path::Path;

/// How section bodies are turned into tablature/lyric rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Lines are freely mixed; each one is classified (`.txt` files)
    Guess,
    /// Lines strictly alternate tablature, lyric, ... (`.rawtxt` files)
    Strict,
}

impl InputMode {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" => Some(InputMode::Guess),
            "rawtxt" => Some(InputMode::Strict),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Options affecting how the raw text is cleaned up before parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Keep blank input lines (as blank rows) instead of dropping them
    pub keep_empty_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            keep_empty_lines: true,
        }
    }
}

/// Parse a document in the given mode.
pub fn parse_document(
    source: &str,
    title: &str,
    mode: InputMode,
    options: &ParseOptions,
) -> Result<Song, TabError> {
    match mode {
        InputMode::Guess => parse_guessed(source, title, options),
        InputMode::Strict => parse_alternating(source, title),
    }
}

/// Rewrite every line ending as CRLF and strip trailing whitespace, optionally
/// dropping blank lines
pub fn normalize_line_endings(source: &str, keep_empty_lines: bool) -> String {
    let mut normalized = String::with_capacity(source.len() + source.len() / 16);
    for line in source.lines().map(str::trim_end) {
        if keep_empty_lines || !line.is_empty() {
            normalized.push_str(line);
            normalized.push_str("\r\n");
        }
    }
    normalized
}

/// Parse a document whose section bodies mix tablature and lyric lines freely.
///
/// The text before the first `[` becomes the metadata. Every section starts at a
/// `[` and its header ends at the next `]` followed by a line break; the body
/// runs until the next `[` or the end of the document.
pub fn parse_guessed(source: &str, title: &str, options: &ParseOptions) -> Result<Song, TabError> {
    let data = normalize_line_endings(source, options.keep_empty_lines);
    log::trace!("Normalized input of '{}': {:?}", title, data);

    let start = data.find('[').ok_or_else(|| TabError::StructuralParse {
        line: 1,
        message: "document is not delimited by '[<section name>]' entries".to_string(),
    })?;

    let mut song = Song::new(title, &data[..start]);
    log::debug!("Metadata of '{}': {:?}", title, song.metadata);

    let mut offset = start;
    while offset < data.len() {
        let rest = &data[offset..];
        let close = rest.find("]\r\n").ok_or_else(|| TabError::StructuralParse {
            line: line_number(&data, offset),
            message: "section header is not closed with ']'".to_string(),
        })?;
        let header = rest[1..close].trim();
        if header.contains('\n') {
            return Err(TabError::StructuralParse {
                line: line_number(&data, offset),
                message: "section header is not closed with ']' on its own line".to_string(),
            });
        }
        let body_start = close + 3;
        let body_end = rest[body_start..]
            .find('[')
            .map_or(rest.len(), |idx| body_start + idx);
        let body = &rest[body_start..body_end];
        offset += body_end;

        match assemble_guessed(header, body.lines()) {
            Ok(section) => song.sections.push(section),
            Err(err) => return stop_at_failed_section(song, err),
        }
    }

    Ok(song)
}

/// Parse a preprocessed document: after each `[header]` line the body lines
/// alternate tablature, lyric, tablature, ... and a new section starts at any
/// line beginning with `[`.
pub fn parse_alternating(source: &str, title: &str) -> Result<Song, TabError> {
    let start = source.find('[').ok_or_else(|| TabError::StructuralParse {
        line: 1,
        message: "document is not delimited by '[<section name>]' entries".to_string(),
    })?;

    let mut song = Song::new(title, &source[..start]);
    let first_line = line_number(source, start);

    let mut current: Option<(String, Vec<&str>)> = None;
    for (idx, line) in source[start..].lines().enumerate() {
        if line.starts_with('[') {
            if let Some((header, body)) = current.take() {
                match assemble_alternating(&header, body) {
                    Ok(section) => song.sections.push(section),
                    Err(err) => return stop_at_failed_section(song, err),
                }
            }
            let header = parse_header_line(line, first_line + idx)?;
            log::debug!("Header is '{}'", header);
            current = Some((header, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line.trim_end());
        }
    }

    if let Some((header, body)) = current {
        match assemble_alternating(&header, body) {
            Ok(section) => song.sections.push(section),
            Err(err) => return stop_at_failed_section(song, err),
        }
    }

    Ok(song)
}

fn parse_header_line(line: &str, line_no: usize) -> Result<String, TabError> {
    let trimmed = line.trim_end();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(|s| s.trim().to_string())
        .ok_or_else(|| TabError::StructuralParse {
            line: line_no,
            message: format!("section header '{}' is not closed with ']'", trimmed),
        })
}

/// A failing section ends the document. Sections parsed before it are kept,
/// unless there are none, in which case the whole document fails.
fn stop_at_failed_section(mut song: Song, err: TabError) -> Result<Song, TabError> {
    if song.sections.is_empty() {
        return Err(err);
    }
    log::error!(
        "Aborting parse of '{}' after {} sections: {}",
        song.title,
        song.sections.len(),
        err
    );
    song.truncated = true;
    Ok(song)
}

fn line_number(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Rebuild a section from explicit rows, used by callers that already know
/// the pairing (tests, generated content).
pub fn section_from_rows(header: &str, rows: &[(&str, &str)]) -> Section {
    Section {
        header: header.to_string(),
        tablature_lines: rows.iter().map(|(tab, _)| tab.to_string()).collect(),
        lyric_lines: rows.iter().map(|(_, lyric)| lyric.to_string()).collect(),
        dimensions: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_verse_document() {
        let song = parse_guessed("Title\n[Verse]\r\nG  D\r\nHello world\r\n", "demo", &ParseOptions::default()).unwrap();
        assert_eq!(song.metadata, "Title\r\n");
        assert_eq!(song.sections.len(), 1);
        assert_eq!(song.sections[0].header, "Verse");
        assert_eq!(song.sections[0].lyric_lines, vec!["Hello world"]);
        assert_eq!(song.sections[0].tablature_lines, vec!["G  D"]);
        assert!(!song.truncated);
    }

    #[test]
    fn test_lf_input_is_normalized() {
        let source = "Song\nBy someone\n\n[Intro]\nx02120\n[Verse]\nAm  G\nWalking down\n";
        let song = parse_guessed(source, "demo", &ParseOptions { keep_empty_lines: false }).unwrap();
        assert_eq!(song.metadata, "Song\r\nBy someone\r\n");
        assert_eq!(song.sections.len(), 2);
        assert_eq!(song.sections[0].header, "Intro");
        assert_eq!(song.sections[0].tablature_lines, vec!["x02120"]);
        assert_eq!(song.sections[0].lyric_lines, vec![""]);
        assert_eq!(song.sections[1].lyric_lines, vec!["Walking down"]);
    }

    #[test]
    fn test_kept_empty_lines_become_blank_rows() {
        let source = "T\n[Verse]\nG\nHello world\n\n[Chorus]\nC\nLa la la\n";
        let song = parse_guessed(source, "demo", &ParseOptions::default()).unwrap();
        assert_eq!(song.sections[0].tablature_lines, vec!["G", ""]);
        assert_eq!(song.sections[0].lyric_lines, vec!["Hello world", ""]);
        assert_eq!(song.sections[1].lyric_lines, vec!["La la la"]);
    }

    #[test]
    fn test_dropped_empty_lines() {
        let source = "T\n[Verse]\nG\nHello world\n\n[Chorus]\nC\nLa la la\n";
        let song = parse_guessed(source, "demo", &ParseOptions { keep_empty_lines: false }).unwrap();
        assert_eq!(song.sections[0].tablature_lines, vec!["G"]);
        assert_eq!(song.sections[0].lyric_lines, vec!["Hello world"]);
    }

    #[test]
    fn test_trailing_whitespace_is_stripped() {
        let source = "T  \n[Verse] \nG  D   \nHello world  \n[Chorus]\t\nC\nLa la\n";
        let song = parse_guessed(source, "demo", &ParseOptions::default()).unwrap();
        let headers: Vec<&str> = song.sections.iter().map(|s| s.header.as_str()).collect();
        assert_eq!(headers, vec!["Verse", "Chorus"]);
        assert_eq!(song.metadata, "T\r\n");
        assert_eq!(song.sections[0].tablature_lines, vec!["G  D"]);
        assert_eq!(song.sections[0].lyric_lines, vec!["Hello world"]);

        let strict = parse_alternating(source, "demo").unwrap();
        assert_eq!(strict.sections[0].tablature_lines, vec!["G  D"]);
        assert_eq!(strict.sections[0].lyric_lines, vec!["Hello world"]);
    }

    #[test]
    fn test_header_with_trailing_text_fails() {
        let result = parse_guessed("T\n[Verse] x\nG\nHello\n[Chorus]\nC\n", "demo", &ParseOptions::default());
        match result {
            Err(TabError::StructuralParse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("own line"));
            }
            other => panic!("Expected StructuralParse but got: {:?}", other),
        }
    }

    #[test]
    fn test_missing_section_delimiter_fails() {
        let result = parse_guessed("just some words\nand more", "demo", &ParseOptions::default());
        match result {
            Err(TabError::StructuralParse { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("not delimited"));
            }
            other => panic!("Expected StructuralParse but got: {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_header_fails() {
        let result = parse_guessed("Title\n[Verse\nG\nHello\n", "demo", &ParseOptions::default());
        match result {
            Err(TabError::StructuralParse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("not closed"));
            }
            other => panic!("Expected StructuralParse but got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_metadata() {
        let song = parse_guessed("[Verse]\nG\nHello\n", "demo", &ParseOptions::default()).unwrap();
        assert_eq!(song.metadata, "");
        assert_eq!(song.sections.len(), 1);
    }

    #[test]
    fn test_strict_mode_is_positional() {
        let source = "Title\r\n[Verse]\r\nG  D\r\nHello world\r\nwords\r\nmore words\r\n[Chorus]\r\nC\r\n";
        let song = parse_alternating(source, "demo").unwrap();
        assert_eq!(song.sections.len(), 2);
        assert_eq!(song.sections[0].tablature_lines, vec!["G  D", "words"]);
        assert_eq!(song.sections[0].lyric_lines, vec!["Hello world", "more words"]);
        assert_eq!(song.sections[1].tablature_lines, vec!["C"]);
        assert_eq!(song.sections[1].lyric_lines, vec![""]);
    }

    #[test]
    fn test_strict_mode_unclosed_header_reports_line() {
        let result = parse_alternating("Title\n[Verse]\nG\nHello\n[Chorus\nC\n", "demo");
        match result {
            Err(TabError::StructuralParse { line, .. }) => assert_eq!(line, 5),
            other => panic!("Expected StructuralParse but got: {:?}", other),
        }
    }

    #[test]
    fn test_failed_first_section_fails_document() {
        let err = TabError::SectionMismatch {
            header: "Verse".to_string(),
            lyric_lines: 3,
            tablature_lines: 1,
        };
        let result = stop_at_failed_section(Song::new("demo", ""), err);
        assert!(matches!(result, Err(TabError::SectionMismatch { .. })));
    }

    #[test]
    fn test_failed_later_section_keeps_earlier_ones() {
        let mut song = Song::new("demo", "");
        song.sections.push(section_from_rows("Verse", &[("G", "Hello")]));
        let err = TabError::SectionMismatch {
            header: "Chorus".to_string(),
            lyric_lines: 3,
            tablature_lines: 1,
        };
        let song = stop_at_failed_section(song, err).unwrap();
        assert!(song.truncated);
        assert_eq!(song.sections.len(), 1);
    }

    #[test]
    fn test_input_mode_from_path() {
        assert_eq!(InputMode::from_path(Path::new("a/song.txt")), Some(InputMode::Guess));
        assert_eq!(InputMode::from_path(Path::new("song.rawtxt")), Some(InputMode::Strict));
        assert_eq!(InputMode::from_path(Path::new("song.png")), None);
        assert_eq!(InputMode::from_path(Path::new("README")), None);
    }
}
