//! # Configuration
//!
//! All tunables live in one explicit [`Config`] value that is loaded once and
//! handed to the parser and layout engine. Nothing is global.
//!
//! The file is YAML with kebab-case keys. Every key is optional; missing keys
//! take the defaults below.
//!
//! ```yaml
//! input:
//!   folders: ["songs"]
//!   max-depth: 2
//! options:
//!   export-txt: true
//! output:
//!   ppi: 144
//!   min-pages: 2
//!   max-pages: 4
//!   prefer-even-page-numbers: true
//! ```

use crate::error::TabError;
use crate::metrics::FontFamily;
use crate::parser::ParseOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Millimetres to inches
const INCHES_PER_MM: f64 = 0.03937;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub input: InputConfig,
    pub options: OptionsConfig,
    pub output: LayoutConfig,
}

/// Where to look for songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct InputConfig {
    pub folders: Vec<PathBuf>,
    pub max_depth: usize,
    /// Pick up `.txt` files (guess mode)
    pub read_txt: bool,
    /// Pick up `.rawtxt` files (strict mode)
    pub read_raw: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            folders: vec![PathBuf::from(".")],
            max_depth: 1,
            read_txt: true,
            read_raw: true,
        }
    }
}

/// Which outputs to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OptionsConfig {
    pub export_txt: bool,
    pub export_raw: bool,
    /// Render plan JSON for an external rasterizer
    pub export_layout: bool,
    /// 0 = off, 1 = error, 2 = warn, 3 = info, 4 = debug, 5 = trace
    pub log_level: u8,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            export_txt: false,
            export_raw: false,
            export_layout: true,
            log_level: 3,
        }
    }
}

impl OptionsConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        match self.log_level {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Physical paper format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paper {
    #[default]
    A4,
    A5,
}

impl Paper {
    /// (width, height) in millimetres
    pub fn size_mm(self) -> (f64, f64) {
        match self {
            Paper::A4 => (210.0, 297.0),
            Paper::A5 => (148.0, 210.0),
        }
    }
}

/// An RGB colour, written as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Page geometry, fonts and the thresholds that steer the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LayoutConfig {
    pub paper: Paper,
    /// Pixels per inch of the target raster
    pub ppi: u32,
    pub lyric_font_family: FontFamily,
    pub tablature_font_family: FontFamily,
    pub metadata_font_family: FontFamily,
    /// Starting point size of the metadata block
    pub metadata_font_size: u32,
    pub background_colour: Rgb,
    pub font_colour: Rgb,
    pub metadata_colour: Rgb,
    pub vertical_margin: u32,
    pub horizontal_margin: u32,
    /// Binding margin, added on one side only
    pub extra_horizontal_margin: u32,
    /// Shrink when the next page's first section misses the previous page by
    /// less than this fraction of the page height
    pub try_to_shrink_ratio: f64,
    /// Stop shrinking once the narrowest section leaves more than this
    /// fraction of the usable width empty
    pub shortest_line_whitespace_ratio: f64,
    /// Stop shrinking once the widest section leaves more than this fraction
    /// of the usable width empty
    pub longest_line_whitespace_ratio: f64,
    pub keep_empty_lines: bool,
    /// Write the JSON line index next to text outputs
    pub write_index: bool,
    pub min_pages: usize,
    pub max_pages: usize,
    pub prefer_even_page_numbers: bool,
    pub min_font_size: u32,
    /// Defaults to `ppi`
    pub max_font_size: Option<u32>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            ppi: 144,
            lyric_font_family: FontFamily::new("fonts/CourierPrime-Regular.ttf"),
            tablature_font_family: FontFamily::new("fonts/CourierPrime-Bold.ttf"),
            metadata_font_family: FontFamily::new("fonts/CourierPrime-Regular.ttf"),
            metadata_font_size: 32,
            background_colour: Rgb(255, 255, 255),
            font_colour: Rgb(0, 0, 0),
            metadata_colour: Rgb(128, 128, 128),
            vertical_margin: 50,
            horizontal_margin: 100,
            extra_horizontal_margin: 100,
            try_to_shrink_ratio: 0.4,
            shortest_line_whitespace_ratio: 0.95,
            longest_line_whitespace_ratio: 0.30,
            keep_empty_lines: true,
            write_index: false,
            min_pages: 2,
            max_pages: 4,
            prefer_even_page_numbers: false,
            min_font_size: 1,
            max_font_size: None,
        }
    }
}

impl LayoutConfig {
    pub fn page_width(&self) -> u32 {
        let (width_mm, _) = self.paper.size_mm();
        (self.ppi as f64 * width_mm * INCHES_PER_MM) as u32
    }

    pub fn page_height(&self) -> u32 {
        let (_, height_mm) = self.paper.size_mm();
        (self.ppi as f64 * height_mm * INCHES_PER_MM) as u32
    }

    /// Width left for text once both margins and the binding margin are taken
    pub fn usable_width(&self) -> u32 {
        self.page_width()
            .saturating_sub(self.extra_horizontal_margin)
            .saturating_sub(2 * self.horizontal_margin)
    }

    /// At 72 ppi 18pt is a good start; shrinking and growing does the rest
    pub fn initial_font_size(&self) -> u32 {
        (self.ppi / 4).clamp(self.min_font_size, self.max_font_size())
    }

    /// Below this size density shrinking stops
    pub fn density_floor(&self) -> u32 {
        self.ppi / 6
    }

    pub fn max_font_size(&self) -> u32 {
        self.max_font_size.unwrap_or(self.ppi).max(self.min_font_size)
    }

    /// Page ceiling, never below the page floor
    pub fn effective_max_pages(&self) -> usize {
        self.max_pages.max(self.min_pages)
    }

    /// Vertical gap between sections; kept blank lines already space them out
    pub fn section_gap(&self) -> u32 {
        if self.keep_empty_lines {
            0
        } else {
            self.vertical_margin
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            keep_empty_lines: self.keep_empty_lines,
        }
    }

    pub fn validate(&self) -> Result<(), TabError> {
        if self.ppi == 0 {
            return Err(TabError::InvalidConfig("ppi must be greater than zero".to_string()));
        }
        if self.min_font_size == 0 {
            return Err(TabError::InvalidConfig(
                "min-font-size must be at least 1".to_string(),
            ));
        }
        if let Some(max) = self.max_font_size {
            if max < self.min_font_size {
                return Err(TabError::InvalidConfig(format!(
                    "max-font-size ({}) is below min-font-size ({})",
                    max, self.min_font_size
                )));
            }
        }
        let ratios = [
            ("try-to-shrink-ratio", self.try_to_shrink_ratio),
            ("shortest-line-whitespace-ratio", self.shortest_line_whitespace_ratio),
            ("longest-line-whitespace-ratio", self.longest_line_whitespace_ratio),
        ];
        for (name, ratio) in ratios {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(TabError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, ratio
                )));
            }
        }
        if self.usable_width() == 0 {
            return Err(TabError::InvalidConfig(format!(
                "margins leave no usable width on a {} pixel wide page",
                self.page_width()
            )));
        }
        Ok(())
    }
}

impl Config {
    /// Load a config file. A missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, TabError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| TabError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content).map_err(|source| TabError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(Some(config))
    }

    pub fn validate(&self) -> Result<(), TabError> {
        if self.input.max_depth == 0 {
            return Err(TabError::InvalidConfig("max-depth must be at least 1".to_string()));
        }
        self.output.validate()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is an empty mapping, not an error
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TabError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TabError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = serde_yaml::to_string(self).map_err(|e| TabError::Serialize {
            what: "configuration".to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|source| TabError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
