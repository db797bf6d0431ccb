// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lines and tab cells produced by a layout pass.

pub(crate) mod cursor;
pub(crate) mod flow;
pub(crate) mod segment;
pub(crate) mod tabs;

use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

/// Horizontal alignment of a segment's content within its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum HAlign {
    /// Content starts at the cell's left edge.
    #[default]
    Left,
    /// Content is centered in the cell.
    Center,
    /// Content ends at the cell's right edge.
    Right,
    /// Content starts at the edge matching the base direction.
    Justify,
}

impl HAlign {
    pub(crate) fn to_bits(self) -> u8 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
            Self::Justify => 3,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Center,
            2 => Self::Right,
            3 => Self::Justify,
            _ => Self::Left,
        }
    }
}

/// Vertical alignment of a segment's content within its line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum VAlign {
    /// Share the line's baseline.
    #[default]
    Baseline,
    /// Content top at the line top.
    Top,
    /// Content centered in the line.
    Center,
    /// Content bottom at the line bottom.
    Bottom,
}

/// Identifies a segment by line and position within the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentId {
    /// Line index within the paragraph.
    pub line: u32,
    /// Segment index within the line, in logical order.
    pub index: u32,
}

/// Vertical and horizontal metrics of a line.
#[derive(Copy, Clone, Default, Debug, PartialEq)]
pub struct LineMetrics {
    /// Largest ascent of the line's runs, baseline shifts included.
    pub ascent: f32,
    /// Largest descent of the line's runs, baseline shifts included.
    pub descent: f32,
    /// Largest leading of the line's runs.
    pub leading: f32,
    /// Right edge of the last cell, relative to the line's left edge.
    pub width: f32,
    /// Left edge of the line relative to the paragraph, margins and
    /// alignment included.
    pub offset: f32,
    /// Top of the line relative to the paragraph.
    pub top: f32,
}

impl LineMetrics {
    /// Height of the line without leading.
    pub fn height(&self) -> f32 {
        self.ascent + self.descent
    }

    /// Height of the line including leading.
    pub fn advance(&self) -> f32 {
        self.ascent + self.descent + self.leading
    }

    /// Baseline relative to the paragraph.
    pub fn baseline(&self) -> f32 {
        self.top + self.ascent
    }
}

/// One wrapped row of a paragraph.
#[derive(Clone, Debug, Default)]
pub struct Line {
    pub(crate) runs: Range<usize>,
    pub(crate) text_range: Range<usize>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) metrics: LineMetrics,
    pub(crate) hard_break: bool,
    pub(crate) dirty_width: f32,
    /// Embedding level of the paragraph direction.
    pub(crate) base_level: u8,
}

impl Line {
    /// Returns the metrics for the line.
    pub fn metrics(&self) -> &LineMetrics {
        &self.metrics
    }

    /// Returns the range of text for the line.
    pub fn text_range(&self) -> Range<usize> {
        self.text_range.clone()
    }

    /// Indices of the paragraph runs on this line, in logical order.
    pub fn run_range(&self) -> Range<usize> {
        self.runs.clone()
    }

    /// Segments in logical order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns `true` if the line ends with an explicit line break.
    pub fn is_hard_break(&self) -> bool {
        self.hard_break
    }

    /// Width needing repaint, zero when the line is clean.
    pub fn dirty_width(&self) -> f32 {
        self.dirty_width
    }

    /// Segments sorted by their left edge.
    pub(crate) fn visual_segments(&self) -> SmallVec<[usize; 8]> {
        let mut order: SmallVec<[usize; 8]> = (0..self.segments.len()).collect();
        order.sort_by(|&a, &b| self.segments[a].left.total_cmp(&self.segments[b].left));
        order
    }

    pub(crate) fn same_geometry(&self, other: &Self) -> bool {
        self.text_range == other.text_range
            && self.metrics == other.metrics
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.same_geometry(b))
    }
}

/// A tab-delimited cell of a line.
#[derive(Clone, Debug, Default)]
pub struct Segment {
    pub(crate) runs: Range<usize>,
    pub(crate) visual: SmallVec<[usize; 4]>,
    pub(crate) left: f32,
    pub(crate) right: f32,
    pub(crate) top: f32,
    pub(crate) bottom: f32,
    pub(crate) content_width: f32,
    pub(crate) padding: f32,
    pub(crate) baseline: f32,
    pub(crate) halign: HAlign,
    pub(crate) valign: VAlign,
}

impl Segment {
    /// Indices of the paragraph runs in this segment, in logical order.
    pub fn run_range(&self) -> Range<usize> {
        self.runs.clone()
    }

    /// Run indices from left to right.
    pub fn visual_runs(&self) -> &[usize] {
        &self.visual
    }

    /// Leftmost run in visual order.
    pub fn first_visual(&self) -> Option<usize> {
        self.visual.first().copied()
    }

    /// Rightmost run in visual order.
    pub fn last_visual(&self) -> Option<usize> {
        self.visual.last().copied()
    }

    /// Left edge of the cell relative to the line.
    pub fn left(&self) -> f32 {
        self.left
    }

    /// Right edge of the cell relative to the line.
    pub fn right(&self) -> f32 {
        self.right
    }

    /// Top edge relative to the line.
    pub fn top(&self) -> f32 {
        self.top
    }

    /// Bottom edge relative to the line.
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    /// Measured width of the runs.
    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    /// Cell padding.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Baseline relative to the line top.
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    /// Horizontal alignment within the cell.
    pub fn halign(&self) -> HAlign {
        self.halign
    }

    /// Vertical alignment within the line.
    pub fn valign(&self) -> VAlign {
        self.valign
    }

    fn same_geometry(&self, other: &Self) -> bool {
        self.runs.len() == other.runs.len()
            && self.left == other.left
            && self.right == other.right
            && self.content_width == other.content_width
            && self.baseline == other.baseline
    }
}
