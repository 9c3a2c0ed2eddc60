//! # Song Model
//!
//! Data types shared by the parser, the layout engine and the writers.
//!
//! ## Type Hierarchy
//! ```text
//! Song
//!   ├── metadata: String (free text before the first [header])
//!   ├── metadata_dimensions: Option<Size>
//!   ├── font_size / metadata_font_size (the two values the layout engine steers)
//!   ├── Vec<Section> (owned, document order)
//!   │     ├── header: String
//!   │     ├── lyric_lines / tablature_lines (same length, index aligned)
//!   │     └── dimensions: Option<SectionDimensions>
//!   └── Vec<Page> (derived, rebuilt by every pack)
//!         ├── sections: Vec<usize> (indices into Song::sections)
//!         └── total_height
//! ```
//!
//! Measured sizes are `Option`s: `None` means "not measured at the current
//! font size yet". The layout engine always re-measures after changing a font
//! size, so a `None` reaching the packer or the renderer is an internal error.

use serde::Serialize;

/// Rendered size of a piece of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Role of a single raw input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Fingering, chord or instrumental data
    Tablature,
    /// Sung or spoken text
    Lyric,
    /// Empty input; the caller decides what to do with it
    Undetermined,
}

/// Measured bounding box of a section at the current font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionDimensions {
    /// Widest line, header included
    pub width: u32,
    /// Header plus every tablature/lyric row
    pub height: u32,
    /// Height of the header line alone
    pub header_height: u32,
}

/// A named block of aligned tablature/lyric rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Section {
    pub header: String,
    pub lyric_lines: Vec<String>,
    pub tablature_lines: Vec<String>,
    pub dimensions: Option<SectionDimensions>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Default::default()
        }
    }

    /// The header as it appears in the document and on the page.
    pub fn header_line(&self) -> String {
        format!("[{}]", self.header)
    }

    /// Iterate `(tablature, lyric)` rows in order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tablature_lines
            .iter()
            .zip(self.lyric_lines.iter())
            .map(|(tab, lyric)| (tab.as_str(), lyric.as_str()))
    }
}

/// A run of sections that fits the page height budget.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Indices into `Song::sections`, ascending
    pub sections: Vec<usize>,
    /// Cumulative height including margins, recorded when the page is closed
    pub total_height: u32,
}

/// A parsed song and its current layout state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Song {
    pub title: String,
    pub metadata: String,
    pub metadata_dimensions: Option<Size>,
    pub sections: Vec<Section>,
    pub pages: Vec<Page>,
    /// Shared size of lyric and tablature text
    pub font_size: u32,
    pub metadata_font_size: u32,
    /// Parsing stopped at a section that failed to assemble; earlier sections were kept
    pub truncated: bool,
}

impl Song {
    pub fn new(title: impl Into<String>, metadata: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            metadata: metadata.into(),
            ..Default::default()
        }
    }

    /// Non-blank metadata lines with trailing whitespace removed.
    pub fn metadata_lines(&self) -> impl Iterator<Item = &str> {
        self.metadata
            .split('\n')
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Sections of a page, in order.
    pub fn page_sections<'a>(&'a self, page: &'a Page) -> impl Iterator<Item = &'a Section> + 'a {
        page.sections.iter().filter_map(move |&idx| self.sections.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line_restores_delimiters() {
        let section = Section::new("Chorus");
        assert_eq!(section.header_line(), "[Chorus]");
    }

    #[test]
    fn test_rows_pair_tablature_with_lyrics() {
        let mut section = Section::new("Verse");
        section.tablature_lines = vec!["G  D".to_string(), "".to_string()];
        section.lyric_lines = vec!["Hello world".to_string(), "again".to_string()];

        let rows: Vec<_> = section.rows().collect();
        assert_eq!(rows, vec![("G  D", "Hello world"), ("", "again")]);
    }

    #[test]
    fn test_metadata_lines_skip_blank_lines() {
        let song = Song::new("demo", "Title\r\n\r\nArtist  \r\n");
        let lines: Vec<_> = song.metadata_lines().collect();
        assert_eq!(lines, vec!["Title", "Artist"]);
    }
}
