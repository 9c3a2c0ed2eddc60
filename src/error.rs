//! # Error Types
//!
//! This module defines all error types for the tabsheet pipeline.
//!
//! Every error is scoped to a single document: a failure while parsing or laying
//! out one song never touches the state of another.
//!
//! ## Error Types
//! - `StructuralParse` - Missing `[` delimiters or unclosed section headers
//! - `SectionMismatch` - Lyric and tablature rows could not be aligned
//! - `DimensionsNotComputed` - Layout or rendering reached an unmeasured section
//! - `ConfigRead` / `ConfigParse` / `InvalidConfig` - Configuration problems
//! - `Io` - Reading inputs or writing outputs failed
//!
//! Non-fatal layout outcomes (degenerate font sizes, missed page targets) are
//! not errors; see [`crate::layout::LayoutWarning`].
//!
//! ## Usage
//! ```rust
//! use tabsheet::{parse_guessed, ParseOptions, TabError};
//!
//! match parse_guessed("no sections here", "demo", &ParseOptions::default()) {
//!     Ok(song) => println!("{} sections", song.sections.len()),
//!     Err(TabError::StructuralParse { line, message }) => {
//!         eprintln!("Structure error at line {}: {}", line, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    /// The document does not follow the `[header]` delimited layout.
    ///
    /// # Example
    /// ```
    /// # use tabsheet::TabError;
    /// let err = TabError::StructuralParse {
    ///     line: 3,
    ///     message: "section header is not closed with ']'".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Structure error at line 3: section header is not closed with ']'"
    /// );
    /// ```
    #[error("Structure error at line {line}: {message}")]
    StructuralParse { line: usize, message: String },

    /// Lyric and tablature rows of a section differ by more than one line.
    #[error(
        "Section '{header}' has {lyric_lines} lyric lines and {tablature_lines} tablature lines"
    )]
    SectionMismatch {
        header: String,
        lyric_lines: usize,
        tablature_lines: usize,
    },

    /// A section was packed or rendered before it was measured.
    #[error("Section '{section}' has no computed dimensions")]
    DimensionsNotComputed { section: String },

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to serialize {what}: {message}")]
    Serialize { what: String, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
