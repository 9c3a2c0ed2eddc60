pub mod api;
pub mod assemble;
pub mod classify;
pub mod config;
pub mod error;
pub mod input;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod render;
pub mod writer;

pub use api::{export_song, layout_song, layout_song_with, paginate, process_file, process_source};
pub use assemble::SectionAssembler;
pub use classify::classify;
pub use config::{Config, LayoutConfig};
pub use input::{discover, SongSource};
pub use error::*;
pub use layout::{LayoutEngine, LayoutReport, LayoutWarning};
pub use metrics::{CachedMetrics, FontFamily, MonospaceMetrics, TextMetrics};
pub use model::*;
pub use parser::{parse_alternating, parse_document, parse_guessed, InputMode, ParseOptions};
pub use render::{build_render_plan, RenderPlan};
pub use writer::{write_text, LineIndex, TextFormat, TextOutput};

/// Parse a transcript in guess mode and lay it out with default settings.
/// This is the main entry point for the library.
pub fn typeset(source: &str, title: &str) -> Result<(Song, LayoutReport), TabError> {
    process_source(source, title, InputMode::Guess, &LayoutConfig::default())
}
