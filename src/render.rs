//! # Render Plan
//!
//! Everything a rasterizer needs to draw a laid out song, with no layout
//! decisions left to make: page size, colours, fonts, the metadata block, and
//! per page the left margin and each section's top offset, rows and size.
//!
//! Odd pages (1, 3, ...) carry the extra binding margin on the left, so a
//! printed double-sided booklet keeps its text clear of the binding.
//!
//! Serialized as JSON through `serde_json`.

use crate::config::{LayoutConfig, Rgb};
use crate::error::TabError;
use crate::metrics::FontFamily;
use crate::model::{Size, Song};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderPlan {
    pub title: String,
    pub page_size: Size,
    pub ppi: u32,
    pub background_colour: Rgb,
    pub font_colour: Rgb,
    pub metadata_colour: Rgb,
    pub fonts: FontSet,
    pub font_size: u32,
    pub metadata_font_size: u32,
    pub metadata: MetadataBlock,
    pub pages: Vec<PagePlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSet {
    pub lyric: FontFamily,
    pub tablature: FontFamily,
    pub metadata: FontFamily,
}

/// Drawn at the top of the first page only
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataBlock {
    pub top: u32,
    pub lines: Vec<String>,
    pub size: Size,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    /// 1-based
    pub number: usize,
    pub left_margin: u32,
    pub total_height: u32,
    pub sections: Vec<SectionPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionPlan {
    /// Where the header line is drawn
    pub top: u32,
    pub header: String,
    pub size: Size,
    pub header_height: u32,
    pub rows: Vec<RowPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowPlan {
    pub tablature: String,
    pub lyric: String,
}

impl RenderPlan {
    pub fn to_json(&self) -> Result<String, TabError> {
        serde_json::to_string_pretty(self).map_err(|e| TabError::Serialize {
            what: format!("render plan of '{}'", self.title),
            message: e.to_string(),
        })
    }
}

/// Left margin of a 0-based page index
pub fn left_margin(config: &LayoutConfig, page_index: usize) -> u32 {
    if page_index % 2 == 0 {
        config.horizontal_margin + config.extra_horizontal_margin
    } else {
        config.horizontal_margin
    }
}

/// Build the plan for a song that has been measured and packed.
pub fn build_render_plan(song: &Song, config: &LayoutConfig) -> Result<RenderPlan, TabError> {
    let metadata_size = song
        .metadata_dimensions
        .ok_or_else(|| TabError::DimensionsNotComputed {
            section: "metadata".to_string(),
        })?;
    let gap = config.section_gap();

    let mut pages = Vec::with_capacity(song.pages.len());
    for (page_index, page) in song.pages.iter().enumerate() {
        // same running height the packer budgets with
        let mut top = if page_index == 0 {
            config.vertical_margin + metadata_size.height + gap
        } else {
            gap
        };

        let mut sections = Vec::with_capacity(page.sections.len());
        for section in song.page_sections(page) {
            let dims = section
                .dimensions
                .ok_or_else(|| TabError::DimensionsNotComputed {
                    section: section.header.clone(),
                })?;
            sections.push(SectionPlan {
                top,
                header: section.header_line(),
                size: Size::new(dims.width, dims.height),
                header_height: dims.header_height,
                rows: section
                    .rows()
                    .map(|(tab, lyric)| RowPlan {
                        tablature: tab.to_string(),
                        lyric: lyric.to_string(),
                    })
                    .collect(),
            });
            top += dims.header_height + dims.height + gap;
        }

        pages.push(PagePlan {
            number: page_index + 1,
            left_margin: left_margin(config, page_index),
            total_height: page.total_height,
            sections,
        });
    }

    Ok(RenderPlan {
        title: song.title.clone(),
        page_size: Size::new(config.page_width(), config.page_height()),
        ppi: config.ppi,
        background_colour: config.background_colour,
        font_colour: config.font_colour,
        metadata_colour: config.metadata_colour,
        fonts: FontSet {
            lyric: config.lyric_font_family.clone(),
            tablature: config.tablature_font_family.clone(),
            metadata: config.metadata_font_family.clone(),
        },
        font_size: song.font_size,
        metadata_font_size: song.metadata_font_size,
        metadata: MetadataBlock {
            top: config.vertical_margin,
            lines: song.metadata_lines().map(str::to_string).collect(),
            size: metadata_size,
        },
        pages,
    })
}
