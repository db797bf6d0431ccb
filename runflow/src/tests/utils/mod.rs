// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// Note: This module is only compiled when running tests, which requires std,
// so we don't have to worry about being no_std-compatible.

use std::ops::Range;

use crate::{
    FieldDefaults, FieldHost, FontKey, FontMetrics, Paragraph, RunAttribute, RunStyle, Rgba8,
};

pub(crate) const RED: Rgba8 = Rgba8 {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};

pub(crate) const BLUE: Rgba8 = Rgba8 {
    r: 0,
    g: 0,
    b: 255,
    a: 255,
};

/// A host where every code point advances by the same width.
///
/// Font metrics scale with the font size: ascent equals the size, descent a
/// quarter of it, and leading is two pixels.
pub(crate) struct TestHost {
    pub(crate) defaults: FieldDefaults,
    pub(crate) advance: f32,
    pub(crate) images: Vec<(String, (f32, f32))>,
}

impl TestHost {
    pub(crate) fn new(advance: f32) -> Self {
        Self {
            defaults: FieldDefaults::default(),
            advance,
            images: Vec::new(),
        }
    }

    pub(crate) fn wrapping(advance: f32, wrap_width: f32) -> Self {
        let mut host = Self::new(advance);
        host.defaults.wrap_width = wrap_width;
        host
    }
}

impl FieldHost for TestHost {
    fn defaults(&self) -> &FieldDefaults {
        &self.defaults
    }

    fn measure(&self, _font: &FontKey, text: &[u16]) -> f32 {
        char::decode_utf16(text.iter().copied()).count() as f32 * self.advance
    }

    fn metrics(&self, font: &FontKey) -> FontMetrics {
        let size = f32::from(font.size);
        FontMetrics {
            ascent: size,
            descent: size / 4.0,
            leading: 2.0,
            x_height: size / 2.0,
        }
    }

    fn image_size(&self, source: &str) -> Option<(f32, f32)> {
        self.images
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, size)| *size)
    }
}

/// Builds a paragraph and applies each attribute over its range.
pub(crate) fn styled(text: &str, attributes: &[(Range<usize>, RunAttribute)]) -> Paragraph {
    let mut paragraph = Paragraph::new(text);
    for (range, attribute) in attributes {
        paragraph.set_attribute(range.start, range.end, attribute);
    }
    paragraph
}

/// Non-empty runs as owned `(range, style)` pairs.
pub(crate) fn style_runs(paragraph: &Paragraph) -> Vec<(Range<usize>, Option<RunStyle>)> {
    paragraph
        .char_style_runs()
        .map(|(range, style)| (range, style.cloned()))
        .collect()
}

/// Text ranges of every run, zero-length runs included.
pub(crate) fn run_ranges(paragraph: &Paragraph) -> Vec<Range<usize>> {
    paragraph.runs().iter().map(|run| run.text_range()).collect()
}

/// Style of the character at `offset`.
pub(crate) fn style_of(paragraph: &Paragraph, offset: usize) -> Option<RunStyle> {
    paragraph.runs()[paragraph.find_run(offset, true)]
        .style()
        .cloned()
}

pub(crate) fn color(color: Rgba8) -> RunAttribute {
    RunAttribute::Color(Some(color))
}
