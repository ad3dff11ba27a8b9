//! Line layout
//!
//! Measures a display string with the styles in effect at each character,
//! optionally word-wraps it to a width and truncates it to a height, then
//! interleaves a line-height marker at the start of every line.
//!
//! Layout never reads its own output: it always starts from the unwrapped
//! string and the markup's style markers, so repeated runs agree exactly.

use serde::Serialize;
use tracing::{debug, warn};

use super::marker::{Marker, MarkerData, StyleKind};
use crate::constants::layout::EPSILON;
use crate::font::FontHandle;
use crate::types::Vector;

/// Box a text is laid out in. `None` leaves a dimension unconstrained; a
/// height only applies together with a width.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Bounds {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Bounds {
    pub const UNCONSTRAINED: Bounds = Bounds { width: None, height: None };

    /// Width and height, non-positive values meaning unconstrained
    pub fn new(width: f32, height: f32) -> Self {
        let width = (width > 0.0).then_some(width);
        Self {
            width,
            height: width.and((height > 0.0).then_some(height)),
        }
    }

    pub fn is_constrained(&self) -> bool {
        self.width.is_some()
    }
}

/// One laid out line; `start..end` excludes the line break
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineMetrics {
    pub start: usize,
    pub end: usize,
    pub width: f32,
    pub height: f32,
}

/// Result of laying out a string
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    /// Display string with wrap breaks inserted, truncated to the height
    pub string: String,
    /// Style markers merged with one line-height marker per line
    pub markers: Vec<Marker>,
    pub lines: Vec<LineMetrics>,
    pub width: f32,
    pub height: f32,
    /// Offset of the first byte cut by height truncation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow_start: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    offset: usize,
    ch: char,
    width: f32,
    height: f32,
}

/// Lay out `source` using `style_markers` (sorted by offset) over `font`
pub fn layout(source: &str, style_markers: &[Marker], font: &FontHandle, bounds: Bounds) -> Layout {
    if source.is_empty() {
        return Layout {
            markers: style_markers.to_vec(),
            ..Layout::default()
        };
    }

    let mut glyphs = measure(source, style_markers, font);
    if let Some(max_width) = bounds.width {
        wrap(&mut glyphs, max_width);
    }
    let mut string: String = glyphs.iter().map(|glyph| glyph.ch).collect();
    let mut lines = split_lines(&glyphs, string.len());

    let mut overflow_start = None;
    if let (Some(_), Some(max_height)) = (bounds.width, bounds.height) {
        if let Some(keep) = fitting_lines(&lines, max_height) {
            overflow_start = Some(lines[keep].start);
            let end = lines[keep - 1].end;
            debug!(kept = keep, total = lines.len(), "Truncating text to height");
            lines.truncate(keep);
            string.truncate(end);
        }
    }

    let width = lines.iter().map(|line| line.width).fold(0.0, f32::max);
    let height: f32 = lines.iter().map(|line| line.height).sum();
    let markers = merge_line_markers(style_markers, &lines, string.len());

    Layout {
        string,
        markers,
        lines,
        width,
        height,
        overflow_start,
    }
}

/// Size of every character under the font and scale in effect at its offset
fn measure(source: &str, style_markers: &[Marker], base: &FontHandle) -> Vec<Glyph> {
    let mut font = base.clone();
    let mut scale = Vector::ONE;
    let mut pending = style_markers.iter().peekable();

    source
        .char_indices()
        .map(|(offset, ch)| {
            while let Some(marker) = pending.next_if(|marker| marker.offset <= offset) {
                match &marker.data {
                    MarkerData::Font(handle) => font = handle.clone(),
                    MarkerData::Scale(factor) => scale = *factor,
                    MarkerData::Default(StyleKind::Font) => font = base.clone(),
                    MarkerData::Default(StyleKind::Scale) => scale = Vector::ONE,
                    MarkerData::Color(_) | MarkerData::Default(StyleKind::Color) | MarkerData::LineHeight(_) => {}
                }
            }

            let line_height = font.line_height();
            let advance = font.advance_width(ch).unwrap_or(line_height);
            Glyph {
                offset,
                ch,
                width: advance * scale.x,
                height: line_height * scale.y,
            }
        })
        .collect()
}

fn is_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Greedy word wrap: when a word runs past `max_width`, the last space on the
/// line becomes a line break. A single word wider than the line overflows.
fn wrap(glyphs: &mut [Glyph], max_width: f32) {
    let mut line_width = 0.0;
    let mut last_space: Option<usize> = None;
    let mut since_space = 0.0;
    let mut warned = false;

    for index in 0..glyphs.len() {
        let glyph = glyphs[index];
        if is_break(glyph.ch) {
            line_width = 0.0;
            since_space = 0.0;
            last_space = None;
            warned = false;
            continue;
        }

        line_width += glyph.width;
        if is_space(glyph.ch) {
            last_space = Some(index);
            since_space = 0.0;
            warned = false;
            continue;
        }
        since_space += glyph.width;

        if line_width > max_width + EPSILON {
            match last_space.take() {
                Some(space) => {
                    glyphs[space].ch = '\n';
                    line_width = since_space;
                }
                None if !warned => {
                    warn!(offset = glyph.offset, max_width = max_width, "Word is wider than the line, letting it overflow");
                    warned = true;
                }
                None => {}
            }
        }
    }
}

/// Split at `\n`, `\r` or `\r\n`. Break characters count toward the height of
/// the line they end; the last line always exists.
fn split_lines(glyphs: &[Glyph], len: usize) -> Vec<LineMetrics> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut width = 0.0;
    let mut height: f32 = 0.0;
    let mut iter = glyphs.iter().peekable();

    while let Some(glyph) = iter.next() {
        height = height.max(glyph.height);
        if !is_break(glyph.ch) {
            width += glyph.width;
            continue;
        }

        let mut next = glyph.offset + glyph.ch.len_utf8();
        if glyph.ch == '\r' {
            if let Some(lf) = iter.next_if(|following| following.ch == '\n') {
                next = lf.offset + 1;
            }
        }
        lines.push(LineMetrics {
            start,
            end: glyph.offset,
            width,
            height,
        });
        start = next;
        width = 0.0;
        height = 0.0;
    }

    lines.push(LineMetrics {
        start,
        end: len,
        width,
        height,
    });
    lines
}

/// Number of lines to keep under `max_height`, `None` when all of them fit.
/// The first line is always kept.
fn fitting_lines(lines: &[LineMetrics], max_height: f32) -> Option<usize> {
    let mut total = 0.0;
    for (index, line) in lines.iter().enumerate() {
        total += line.height;
        if index > 0 && total > max_height + EPSILON {
            return Some(index);
        }
    }
    None
}

fn merge_line_markers(style_markers: &[Marker], lines: &[LineMetrics], len: usize) -> Vec<Marker> {
    let mut merged = Vec::with_capacity(style_markers.len() + lines.len());
    let mut styles = style_markers
        .iter()
        .filter(|marker| marker.offset <= len)
        .peekable();

    for line in lines {
        while let Some(marker) = styles.next_if(|marker| marker.offset < line.start) {
            merged.push(marker.clone());
        }
        merged.push(Marker::new(line.start, MarkerData::LineHeight(line.height)));
    }
    merged.extend(styles.cloned());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FixedFont, FontMetrics};
    use crate::types::Rgba;
    use std::rc::Rc;

    /// 10x20 glyphs, except `#` which has no glyph
    #[derive(Debug)]
    struct GappyFont;

    impl FontMetrics for GappyFont {
        fn name(&self) -> &str {
            "gappy"
        }

        fn advance_width(&self, ch: char) -> Option<f32> {
            (ch != '#').then_some(10.0)
        }

        fn line_height(&self) -> f32 {
            20.0
        }
    }

    fn font() -> FontHandle {
        FixedFont::new("mono", 10.0, 20.0).handle()
    }

    fn line_heights(layout: &Layout) -> Vec<(usize, f32)> {
        layout
            .markers
            .iter()
            .filter_map(|marker| match marker.data {
                MarkerData::LineHeight(height) => Some((marker.offset, height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bounds_from_sizes() {
        assert_eq!(Bounds::new(0.0, 50.0), Bounds::UNCONSTRAINED);
        assert_eq!(Bounds::new(100.0, -1.0), Bounds { width: Some(100.0), height: None });
        assert_eq!(Bounds::new(100.0, 40.0), Bounds { width: Some(100.0), height: Some(40.0) });
    }

    #[test]
    fn test_unconstrained_size() {
        let layout = layout("abc\nde", &[], &font(), Bounds::UNCONSTRAINED);
        assert_eq!(layout.string, "abc\nde");
        assert_eq!(layout.width, 30.0);
        assert_eq!(layout.height, 40.0);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[1], LineMetrics { start: 4, end: 6, width: 20.0, height: 20.0 });
        assert_eq!(line_heights(&layout), vec![(0, 20.0), (4, 20.0)]);
        assert_eq!(layout.overflow_start, None);
    }

    #[test]
    fn test_crlf_is_one_break() {
        let layout = layout("ab\r\ncd\ref", &[], &font(), Bounds::UNCONSTRAINED);
        assert_eq!(layout.lines.len(), 3);
        assert_eq!(layout.lines[1].start, 4);
        assert_eq!(layout.lines[2].start, 7);
        assert_eq!(layout.height, 60.0);
    }

    #[test]
    fn test_trailing_break_opens_empty_line() {
        let layout = layout("ab\n", &[], &font(), Bounds::UNCONSTRAINED);
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[1], LineMetrics { start: 3, end: 3, width: 0.0, height: 0.0 });
        assert_eq!(layout.height, 20.0);
    }

    #[test]
    fn test_empty_string() {
        let layout = layout("", &[], &font(), Bounds::UNCONSTRAINED);
        assert!(layout.lines.is_empty());
        assert_eq!((layout.width, layout.height), (0.0, 0.0));
    }

    #[test]
    fn test_scale_and_font_markers_change_size() {
        let big = FixedFont::new("big", 30.0, 40.0).handle();
        let markers = vec![
            Marker::new(1, MarkerData::Scale(Vector::new(2.0, 2.0, 1.0))),
            Marker::new(2, MarkerData::Default(StyleKind::Scale)),
            Marker::new(3, MarkerData::Font(big)),
            Marker::new(3, MarkerData::Color(Rgba::WHITE)),
            Marker::new(4, MarkerData::Default(StyleKind::Font)),
        ];
        // a(10) b(20, tall 40) c(10) d(30, tall 40) e(10)
        let layout = layout("abcde", &markers, &font(), Bounds::UNCONSTRAINED);
        assert_eq!(layout.width, 80.0);
        assert_eq!(layout.height, 40.0);
        // Line marker comes first at offset 0, style markers follow in order
        assert_eq!(layout.markers[0], Marker::new(0, MarkerData::LineHeight(40.0)));
        assert_eq!(&layout.markers[1..], &markers[..]);
    }

    #[test]
    fn test_missing_glyph_uses_line_height() {
        let font: FontHandle = Rc::new(GappyFont);
        let layout = layout("a#", &[], &font, Bounds::UNCONSTRAINED);
        assert_eq!(layout.width, 30.0);
    }

    #[test]
    fn test_word_wrap() {
        let layout = layout("aaa bbb ccc", &[], &font(), Bounds::new(75.0, 0.0));
        assert_eq!(layout.string, "aaa bbb\nccc");
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].width, 70.0);
        assert_eq!(layout.width, 70.0);
        assert_eq!(line_heights(&layout), vec![(0, 20.0), (8, 20.0)]);
    }

    #[test]
    fn test_wrap_keeps_explicit_breaks() {
        let layout = layout("aa bb\ncc dd", &[], &font(), Bounds::new(45.0, 0.0));
        assert_eq!(layout.string, "aa\nbb\ncc\ndd");
        assert_eq!(layout.lines.len(), 4);
    }

    #[test]
    fn test_long_word_overflows() {
        let layout = layout("abcdefgh ij", &[], &font(), Bounds::new(50.0, 0.0));
        assert_eq!(layout.string, "abcdefgh\nij");
        assert_eq!(layout.width, 80.0);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let markers = vec![
            Marker::new(4, MarkerData::Scale(Vector::new(1.5, 1.5, 1.0))),
            Marker::new(9, MarkerData::Default(StyleKind::Scale)),
        ];
        let text = "some words to wrap across a few lines";
        let first = layout(text, &markers, &font(), Bounds::new(90.0, 0.0));
        let second = layout(text, &markers, &font(), Bounds::new(90.0, 0.0));
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_height_truncation() {
        let markers = vec![Marker::new(12, MarkerData::Color(Rgba::WHITE))];
        let layout = layout("aaa bbb ccc ddd", &markers, &font(), Bounds::new(35.0, 45.0));
        assert_eq!(layout.string, "aaa\nbbb");
        assert_eq!(layout.overflow_start, Some(8));
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.height, 40.0);
        // Markers past the cut are dropped
        assert!(layout.markers.iter().all(|marker| marker.offset <= layout.string.len()));
    }

    #[test]
    fn test_first_line_always_kept() {
        let layout = layout("aaa bbb", &[], &font(), Bounds::new(35.0, 5.0));
        assert_eq!(layout.string, "aaa");
        assert_eq!(layout.overflow_start, Some(4));
    }

    #[test]
    fn test_height_only_bound_is_ignored() {
        let bounds = Bounds { width: None, height: Some(10.0) };
        let layout = layout("a\nb\nc", &[], &font(), bounds);
        assert_eq!(layout.lines.len(), 3);
        assert_eq!(layout.overflow_start, None);
    }
}
