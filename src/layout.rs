//! # Layout Engine
//!
//! Steers two values, the shared lyric/tablature `font_size` and the
//! `metadata_font_size`, until a song fits its pages well.
//!
//! ## Operations
//! - [`LayoutEngine::measure`] - recompute every bounding box at the current sizes
//! - [`LayoutEngine::fit_width`] - shrink until nothing overflows the usable width
//! - [`LayoutEngine::pack_pages`] - greedy, order preserving page packing
//! - [`LayoutEngine::can_shrink_for_density`] - would one more shrink step pull
//!   a section back onto the previous page?
//! - [`LayoutEngine::shrink_to_max_pages`] - enforce the page ceiling
//! - [`LayoutEngine::grow_to_target_pages`] - use leftover space by growing the
//!   font while the page count stays on target
//!
//! The engine does not decide the order in which these run; see
//! [`crate::api::paginate`] for the standard sequence.
//!
//! ## Geometry
//! ```text
//! |<-------------------------- page width -------------------------->|
//! | extra margin | margin |<------- usable width ------->| margin |
//! ```
//! Every font step is followed by a full re-measure. Measurements go through
//! [`TextMetrics`], which the caller can wrap in [`crate::CachedMetrics`].
//!
//! ## Termination
//! Every loop moves the font size by one whole point towards `min-font-size`
//! or `max-font-size` and stops at the bound, so all loops terminate.

use crate::config::LayoutConfig;
use crate::error::TabError;
use crate::metrics::TextMetrics;
use crate::model::{Page, Section, SectionDimensions, Size, Song};
use thiserror::Error;

/// A non-fatal layout outcome. Logged when raised and collected for the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutWarning {
    /// The font reached `min-font-size` and text still overflows the page width.
    #[error("{text} still {width}px wide at the minimum font size {font_size} ({usable_width}px available)")]
    DegenerateFontSize {
        text: &'static str,
        font_size: u32,
        width: u32,
        usable_width: u32,
    },

    /// The final page count differs from the requested one.
    #[error("Wanted {target} pages but the layout uses {achieved}")]
    TargetPageCountMiss { target: usize, achieved: usize },
}

/// Summary of a finished layout run
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutReport {
    pub font_size: u32,
    pub metadata_font_size: u32,
    pub pages: usize,
    pub target_pages: usize,
    pub warnings: Vec<LayoutWarning>,
}

pub struct LayoutEngine<'a, M> {
    config: &'a LayoutConfig,
    metrics: M,
    warnings: Vec<LayoutWarning>,
}

impl<'a, M: TextMetrics> LayoutEngine<'a, M> {
    pub fn new(config: &'a LayoutConfig, metrics: M) -> Self {
        Self {
            config,
            metrics,
            warnings: Vec::new(),
        }
    }

    /// Warnings raised so far
    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<LayoutWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, warning: LayoutWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Reset both font sizes to their configured starting points and measure.
    pub fn initialize(&self, song: &mut Song) {
        song.font_size = self.config.initial_font_size();
        song.metadata_font_size = self.config.metadata_font_size.max(self.config.min_font_size);
        self.measure(song);
    }

    /// Recompute the metadata block and every section at the current sizes.
    pub fn measure(&self, song: &mut Song) {
        self.measure_metadata(song);
        let font_size = song.font_size;
        for section in &mut song.sections {
            section.dimensions = Some(self.measure_section(section, font_size));
        }
    }

    fn measure_metadata(&self, song: &mut Song) {
        let family = &self.config.metadata_font_family;
        let mut size = Size::new(0, self.config.vertical_margin);
        for line in song.metadata_lines() {
            let line_size = self.metrics.measure_text(line, family, song.metadata_font_size);
            size.width = size.width.max(line_size.width);
            size.height += line_size.height;
        }
        log::trace!("Metadata of '{}' measures {}x{}", song.title, size.width, size.height);
        song.metadata_dimensions = Some(size);
    }

    fn measure_section(&self, section: &Section, font_size: u32) -> SectionDimensions {
        let tab_family = &self.config.tablature_font_family;
        let lyric_family = &self.config.lyric_font_family;

        let header = self.metrics.measure_text(&section.header_line(), tab_family, font_size);
        let mut dims = SectionDimensions {
            width: header.width,
            height: header.height,
            header_height: header.height,
        };
        for (tab, lyric) in section.rows() {
            let tab_size = self.metrics.measure_text(tab, tab_family, font_size);
            let lyric_size = self.metrics.measure_text(lyric, lyric_family, font_size);
            dims.height += tab_size.height + lyric_size.height;
            dims.width = dims.width.max(tab_size.width).max(lyric_size.width);
        }
        dims
    }

    fn set_font_size(&self, song: &mut Song, font_size: u32) {
        log::debug!("Resizing '{}' from {} to {}", song.title, song.font_size, font_size);
        song.font_size = font_size;
        self.measure(song);
    }

    fn set_metadata_font_size(&self, song: &mut Song, font_size: u32) {
        song.metadata_font_size = font_size;
        self.measure_metadata(song);
    }

    /// Width of the widest section, if it overflows the usable width.
    fn section_overflow(&self, song: &Song) -> Option<u32> {
        let usable = self.config.usable_width();
        song.sections
            .iter()
            .filter_map(|s| s.dimensions)
            .map(|d| d.width)
            .max()
            .filter(|&width| width > usable)
    }

    fn metadata_overflow(&self, song: &Song) -> Option<u32> {
        song.metadata_dimensions
            .map(|d| d.width)
            .filter(|&width| width > self.config.usable_width())
    }

    /// True when no section is wider than the usable width.
    pub fn fits_width(&self, song: &Song) -> bool {
        self.section_overflow(song).is_none()
    }

    /// Shrink the section font, then the metadata font, until neither
    /// overflows the usable width. Returns the number of shrink steps taken.
    ///
    /// Running it again on a fitted song takes no steps.
    pub fn fit_width(&mut self, song: &mut Song) -> usize {
        self.measure(song);
        let usable_width = self.config.usable_width();
        let floor = self.config.min_font_size;
        let mut steps = 0;

        while let Some(width) = self.section_overflow(song) {
            if song.font_size <= floor {
                self.warn(LayoutWarning::DegenerateFontSize {
                    text: "Section",
                    font_size: song.font_size,
                    width,
                    usable_width,
                });
                break;
            }
            log::debug!(
                "Section is {}px wide but only {}px are available, shrinking",
                width,
                usable_width
            );
            let size = song.font_size - 1;
            self.set_font_size(song, size);
            steps += 1;
        }

        while let Some(width) = self.metadata_overflow(song) {
            if song.metadata_font_size <= floor {
                self.warn(LayoutWarning::DegenerateFontSize {
                    text: "Metadata",
                    font_size: song.metadata_font_size,
                    width,
                    usable_width,
                });
                break;
            }
            log::debug!("Metadata is {}px wide, shrinking", width);
            let size = song.metadata_font_size - 1;
            self.set_metadata_font_size(song, size);
            steps += 1;
        }

        steps
    }

    /// Distribute the sections over pages, in order, without splitting any.
    ///
    /// The first page starts below the metadata block. A section that does not
    /// fit the remaining height starts a new page, unless the current page is
    /// still empty: a section taller than a page gets a page of its own.
    pub fn pack_pages(&self, song: &mut Song) -> Result<(), TabError> {
        song.pages.clear();
        let gap = self.config.section_gap();
        let page_height = self.config.page_height();
        let metadata = song
            .metadata_dimensions
            .ok_or_else(|| TabError::DimensionsNotComputed {
                section: "metadata".to_string(),
            })?;

        let mut pages = Vec::new();
        let mut page = Page::default();
        let mut height = self.config.vertical_margin + metadata.height + gap;

        for (idx, section) in song.sections.iter().enumerate() {
            let dims = dimensions_of(section)?;
            if height + dims.height > page_height && !page.sections.is_empty() {
                page.total_height = height;
                pages.push(std::mem::take(&mut page));
                height = gap;
            }
            height += dims.header_height + dims.height + gap;
            page.sections.push(idx);
        }
        page.total_height = height;
        pages.push(page);

        log::debug!(
            "Packed {} sections of '{}' into {} pages at font size {}",
            song.sections.len(),
            song.title,
            pages.len(),
            song.font_size
        );
        song.pages = pages;
        Ok(())
    }

    /// Decide whether one more shrink step is worth it.
    ///
    /// Refuses when the sections already leave too much horizontal whitespace
    /// or the font reached the density floor. Otherwise looks for a page whose
    /// leftover height misses the next page's first section by less than
    /// `try-to-shrink-ratio` of the page height.
    pub fn can_shrink_for_density(&self, song: &Song) -> Result<bool, TabError> {
        let usable = self.config.usable_width() as i64;
        let page_height = self.config.page_height() as i64;

        let mut smallest_whitespace: Option<i64> = None;
        let mut largest_whitespace: Option<i64> = None;
        for page in &song.pages {
            for &idx in &page.sections {
                let whitespace = usable - section_dimensions(song, idx)?.width as i64;
                smallest_whitespace = Some(smallest_whitespace.map_or(whitespace, |w| w.min(whitespace)));
                largest_whitespace = Some(largest_whitespace.map_or(whitespace, |w| w.max(whitespace)));
            }
        }
        let (Some(smallest), Some(largest)) = (smallest_whitespace, largest_whitespace) else {
            return Ok(false);
        };

        let largest_ratio = largest as f64 / usable as f64;
        let smallest_ratio = smallest as f64 / usable as f64;
        log::debug!(
            "Horizontal whitespace ratios: narrowest section {:.3} (limit {}), widest section {:.3} (limit {})",
            largest_ratio,
            self.config.shortest_line_whitespace_ratio,
            smallest_ratio,
            self.config.longest_line_whitespace_ratio
        );
        if largest_ratio > self.config.shortest_line_whitespace_ratio {
            log::debug!("Not shrinking: the narrowest section is {:.0}% whitespace", largest_ratio * 100.0);
            return Ok(false);
        }
        if smallest_ratio > self.config.longest_line_whitespace_ratio {
            log::debug!("Not shrinking: the widest section is {:.0}% whitespace", smallest_ratio * 100.0);
            return Ok(false);
        }
        if song.font_size < self.config.density_floor() || song.font_size <= self.config.min_font_size {
            log::debug!("Not shrinking: font size {} is too small", song.font_size);
            return Ok(false);
        }

        for pair in song.pages.windows(2) {
            let Some(&next_first) = pair[1].sections.first() else {
                continue;
            };
            let next_height = section_dimensions(song, next_first)?.height as i64;
            let whitespace = page_height - pair[0].total_height as i64;
            let short = next_height - whitespace;
            let short_ratio = short as f64 / page_height as f64;
            log::debug!(
                "Page has {}px left, next section needs {}px ({:.1}% of the page short)",
                whitespace,
                next_height,
                short_ratio * 100.0
            );
            if short_ratio < self.config.try_to_shrink_ratio {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Shrink and re-pack while shrinking looks likely to tighten the layout.
    pub fn shrink_for_density(&mut self, song: &mut Song) -> Result<usize, TabError> {
        let mut steps = 0;
        while self.can_shrink_for_density(song)? {
            let size = song.font_size - 1;
            self.set_font_size(song, size);
            self.pack_pages(song)?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Shrink and re-pack until the page count is within `max-pages`.
    pub fn shrink_to_max_pages(&mut self, song: &mut Song) -> Result<usize, TabError> {
        let max_pages = self.config.effective_max_pages();
        let mut steps = 0;
        while song.pages.len() > max_pages {
            if song.font_size <= self.config.min_font_size {
                self.warn(LayoutWarning::TargetPageCountMiss {
                    target: max_pages,
                    achieved: song.pages.len(),
                });
                break;
            }
            log::debug!("{} pages is above the maximum of {}", song.pages.len(), max_pages);
            let size = song.font_size - 1;
            self.set_font_size(song, size);
            self.pack_pages(song)?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Page count the grow pass aims for: at least `min-pages`, rounded up to
    /// an even number when even page counts are preferred.
    pub fn target_page_count(&self, current: usize) -> usize {
        let mut target = current.max(self.config.min_pages);
        if self.config.prefer_even_page_numbers && target % 2 != 0 {
            target += 1;
            log::info!("Increasing target page amount to {} to make it an even number", target);
        }
        target
    }

    /// Grow the font one step at a time while the page count stays at or below
    /// the target and every section still fits the width. The step that breaks
    /// either condition is undone. Returns the target page count.
    pub fn grow_to_target_pages(&mut self, song: &mut Song) -> Result<usize, TabError> {
        let target = self.target_page_count(song.pages.len());
        let start_size = song.font_size;
        let ceiling = self.config.max_font_size();
        log::debug!(
            "Growing '{}' from font size {} towards {} pages",
            song.title,
            start_size,
            target
        );

        while song.font_size < ceiling {
            let size = song.font_size + 1;
            self.set_font_size(song, size);
            self.pack_pages(song)?;
            log::debug!("{} pages at font size {}", song.pages.len(), song.font_size);
            if song.pages.len() > target || !self.fits_width(song) {
                let size = song.font_size - 1;
                self.set_font_size(song, size);
                self.pack_pages(song)?;
                break;
            }
        }

        if song.pages.len() != target {
            self.warn(LayoutWarning::TargetPageCountMiss {
                target,
                achieved: song.pages.len(),
            });
        }
        if song.font_size != start_size {
            log::debug!("Changed the font size from {} to {}", start_size, song.font_size);
        }
        Ok(target)
    }

    /// Snapshot of the current state plus the warnings collected so far.
    pub fn report(&mut self, song: &Song, target_pages: usize) -> LayoutReport {
        LayoutReport {
            font_size: song.font_size,
            metadata_font_size: song.metadata_font_size,
            pages: song.page_count(),
            target_pages,
            warnings: self.take_warnings(),
        }
    }
}

fn dimensions_of(section: &Section) -> Result<SectionDimensions, TabError> {
    section
        .dimensions
        .ok_or_else(|| TabError::DimensionsNotComputed {
            section: section.header.clone(),
        })
}

fn section_dimensions(song: &Song, idx: usize) -> Result<SectionDimensions, TabError> {
    match song.sections.get(idx) {
        Some(section) => dimensions_of(section),
        None => Err(TabError::DimensionsNotComputed {
            section: format!("#{}", idx),
        }),
    }
}
