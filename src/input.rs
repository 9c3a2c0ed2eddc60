//! Song discovery and output locations.

use crate::config::InputConfig;
use crate::parser::InputMode;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Suffix of the per-song output folder
pub const OUTPUT_DIR_SUFFIX: &str = "-tabsheet";

/// A discovered input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongSource {
    pub path: PathBuf,
    pub mode: InputMode,
    /// File stem
    pub title: String,
}

impl SongSource {
    /// Build a source from a path, if its extension is a known input format.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let mode = InputMode::from_path(&path)?;
        let title = path.file_stem()?.to_string_lossy().into_owned();
        Some(Self { path, mode, title })
    }

    /// `<dir>/<stem>-tabsheet/`
    pub fn output_dir(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!("{}{}", self.title, OUTPUT_DIR_SUFFIX))
    }

    fn is_enabled(&self, config: &InputConfig) -> bool {
        match self.mode {
            InputMode::Guess => config.read_txt,
            InputMode::Strict => config.read_raw,
        }
    }
}

fn is_output_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| name.ends_with(OUTPUT_DIR_SUFFIX))
}

/// Find every enabled input file under `root`, down to `max-depth` levels.
/// A file given as `root` is returned on its own when its format is enabled.
pub fn discover_in(root: &Path, config: &InputConfig) -> Vec<SongSource> {
    if !root.exists() {
        log::warn!("Input folder {} does not exist", root.display());
        return Vec::new();
    }

    let mut sources: Vec<SongSource> = WalkDir::new(root)
        .max_depth(config.max_depth)
        .into_iter()
        .filter_entry(|e| !is_output_dir(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| SongSource::from_path(e.into_path()))
        .filter(|s| s.is_enabled(config))
        .collect();

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    log::debug!("Found {} songs in {}", sources.len(), root.display());
    sources
}

/// Discover songs in every configured folder.
pub fn discover(config: &InputConfig) -> Vec<SongSource> {
    config
        .folders
        .iter()
        .flat_map(|folder| discover_in(folder, config))
        .collect()
}
