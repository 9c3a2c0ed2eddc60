//! # Text Metrics
//!
//! The layout engine never touches fonts directly. It asks a [`TextMetrics`]
//! implementation how large a string renders at a given family and point size.
//!
//! Implementations must be deterministic and must never report a smaller size
//! for a larger point size, otherwise the shrink and grow loops in
//! [`crate::layout`] cannot converge.
//!
//! ## Implementations
//! - [`MonospaceMetrics`] - fixed advance and line height per em, matching
//!   the monospaced faces the default configuration uses
//! - [`CachedMetrics`] - memoizes any other implementation for the lifetime of
//!   one song's layout run

use crate::model::Size;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// Identifier of a font face (usually the path of its font file).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontFamily(pub String);

impl FontFamily {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Measures rendered text.
pub trait TextMetrics {
    fn measure_text(&self, text: &str, family: &FontFamily, point_size: u32) -> Size;
}

impl<T: TextMetrics + ?Sized> TextMetrics for &T {
    fn measure_text(&self, text: &str, family: &FontFamily, point_size: u32) -> Size {
        (**self).measure_text(text, family, point_size)
    }
}

/// Metrics for monospaced faces.
///
/// Every character advances `advance` em, every line is `line_height` em tall
/// whatever its content (an empty line still takes vertical space).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for MonospaceMetrics {
    /// Courier Prime proportions
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.13,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn measure_text(&self, text: &str, _family: &FontFamily, point_size: u32) -> Size {
        let columns = text.trim_end_matches(&['\r', '\n'][..]).chars().count() as f32;
        let size = point_size as f32;
        Size {
            width: (columns * self.advance * size).ceil() as u32,
            height: (self.line_height * size).ceil() as u32,
        }
    }
}

type CacheKey = (FontFamily, u32, String);

/// Memoizes measurements keyed by `(family, size, text)`.
///
/// Meant to live as long as one song's layout run; the shrink/grow loops
/// measure the same lines at the same sizes many times.
pub struct CachedMetrics<M> {
    inner: M,
    cache: RefCell<HashMap<CacheKey, Size>>,
}

impl<M: TextMetrics> CachedMetrics<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct measurements stored
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

impl<M: TextMetrics> TextMetrics for CachedMetrics<M> {
    fn measure_text(&self, text: &str, family: &FontFamily, point_size: u32) -> Size {
        let key = (family.clone(), point_size, text.to_string());
        if let Some(size) = self.cache.borrow().get(&key) {
            return *size;
        }
        let size = self.inner.measure_text(text, family, point_size);
        self.cache.borrow_mut().insert(key, size);
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingMetrics {
        calls: Cell<usize>,
    }

    impl TextMetrics for CountingMetrics {
        fn measure_text(&self, text: &str, _family: &FontFamily, point_size: u32) -> Size {
            self.calls.set(self.calls.get() + 1);
            Size::new(text.len() as u32 * point_size, point_size)
        }
    }

    #[test]
    fn test_monospace_width_scales_with_characters() {
        let metrics = MonospaceMetrics { advance: 0.5, line_height: 1.0 };
        let family = FontFamily::new("mono");
        assert_eq!(metrics.measure_text("abcd", &family, 10), Size::new(20, 10));
        assert_eq!(metrics.measure_text("", &family, 10), Size::new(0, 10));
    }

    #[test]
    fn test_monospace_ignores_line_endings() {
        let metrics = MonospaceMetrics::default();
        let family = FontFamily::new("mono");
        assert_eq!(
            metrics.measure_text("G  D\r\n", &family, 20),
            metrics.measure_text("G  D", &family, 20)
        );
    }

    #[test]
    fn test_monospace_is_monotonic_in_size() {
        let metrics = MonospaceMetrics::default();
        let family = FontFamily::new("mono");
        let mut previous = Size::default();
        for size in 1..80 {
            let current = metrics.measure_text("Hello world", &family, size);
            assert!(current.width >= previous.width);
            assert!(current.height >= previous.height);
            previous = current;
        }
    }

    #[test]
    fn test_cache_measures_each_key_once() {
        let cached = CachedMetrics::new(CountingMetrics { calls: Cell::new(0) });
        let family = FontFamily::new("mono");
        assert!(cached.is_empty());

        let first = cached.measure_text("Hello", &family, 12);
        let second = cached.measure_text("Hello", &family, 12);
        cached.measure_text("Hello", &family, 13);

        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.get(), 2);
        assert_eq!(cached.len(), 2);
    }

    #[test]
    fn test_cache_separates_families() {
        let cached = CachedMetrics::new(CountingMetrics { calls: Cell::new(0) });
        cached.measure_text("Hello", &FontFamily::new("regular"), 12);
        cached.measure_text("Hello", &FontFamily::new("bold"), 12);
        assert_eq!(cached.inner.calls.get(), 2);
    }
}
