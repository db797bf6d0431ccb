// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The interface a containing field implements for its paragraphs.

use alloc::vec::Vec;

use peniko::color::Rgba8;

use crate::layout::{HAlign, VAlign};
use crate::style::{BaseDirection, FontKey, ListStyle, TextAlign};

/// Vertical font metrics in pixels.
#[derive(Copy, Clone, Default, PartialEq, Debug)]
pub struct FontMetrics {
    /// Distance from the baseline to the top of the tallest glyph.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the lowest glyph.
    pub descent: f32,
    /// Extra space between lines.
    pub leading: f32,
    /// Height of lowercase letters.
    pub x_height: f32,
}

/// Field-wide settings used by paragraphs that do not override them.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldDefaults {
    /// Font used by runs without font overrides.
    pub font: FontKey,
    /// Text color used by runs without a color.
    pub color: Rgba8,
    /// Width of the field's text area in pixels.
    pub wrap_width: f32,
    /// Disable wrapping.
    pub dont_wrap: bool,
    /// Tab stops in pixels.
    pub tabs: Vec<u16>,
    /// Tab cell alignments.
    pub tab_alignments: Vec<HAlign>,
    /// Treat tab stops as fixed cell boundaries.
    pub vgrid: bool,
    /// Vertical alignment of fixed cells.
    pub cell_valign: VAlign,
    /// Horizontal grid lines.
    pub hgrid: bool,
    /// Line alignment; `None` aligns to the start edge of the base direction.
    pub text_align: Option<TextAlign>,
    /// First line indent.
    pub first_indent: i16,
    /// Left indent.
    pub left_indent: i16,
    /// Right indent.
    pub right_indent: i16,
    /// Space above each paragraph.
    pub space_above: i16,
    /// Space below each paragraph.
    pub space_below: i16,
    /// List marker style.
    pub list_style: ListStyle,
    /// Indent per list level.
    pub list_indent: i16,
    /// Border width.
    pub border_width: u8,
    /// Cell padding.
    pub padding: u8,
    /// Paragraph background.
    pub background_color: Option<Rgba8>,
    /// Paragraph border color.
    pub border_color: Option<Rgba8>,
    /// Base direction.
    pub direction: BaseDirection,
}

impl Default for FieldDefaults {
    fn default() -> Self {
        Self {
            font: FontKey::default(),
            color: Rgba8 {
                r: 0,
                g: 0,
                b: 0,
                a: 255,
            },
            wrap_width: f32::INFINITY,
            dont_wrap: false,
            tabs: Vec::new(),
            tab_alignments: Vec::new(),
            vgrid: false,
            cell_valign: VAlign::Top,
            hgrid: false,
            text_align: None,
            first_indent: 0,
            left_indent: 0,
            right_indent: 0,
            space_above: 0,
            space_below: 0,
            list_style: ListStyle::None,
            list_indent: 16,
            border_width: 0,
            padding: 0,
            background_color: None,
            border_color: None,
            direction: BaseDirection::Auto,
        }
    }
}

/// Services a paragraph needs from its container.
///
/// Text handed to [`measure`](Self::measure) never contains tab or line
/// break characters; those are positioned by the layout itself.
pub trait FieldHost {
    /// Field-wide defaults.
    fn defaults(&self) -> &FieldDefaults;

    /// Measures the advance width of `text` in `font`.
    fn measure(&self, font: &FontKey, text: &[u16]) -> f32;

    /// Returns vertical metrics for `font`.
    fn metrics(&self, font: &FontKey) -> FontMetrics;

    /// Resolves an inline image reference to its size in pixels.
    fn image_size(&self, source: &str) -> Option<(f32, f32)> {
        let _ = source;
        None
    }
}
