// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style runs.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ops::Range;

use crate::analysis;
use crate::host::{FieldHost, FontMetrics};
use crate::layout::SegmentId;
use crate::style::{FontKey, RunFlags, RunStyle};
use crate::util;

/// A contiguous span of paragraph text sharing one style.
///
/// The position fields that describe layout (`width`, `origin`,
/// `visual_index` and `segment`) are only meaningful between a layout pass
/// and the next mutation of the paragraph.
#[derive(Clone, Debug, Default)]
pub struct Run {
    pub(crate) start: usize,
    pub(crate) len: usize,
    pub(crate) style: Option<Box<RunStyle>>,
    pub(crate) flags: RunFlags,
    pub(crate) level: u8,
    /// Zero-length run left by a deletion or an empty-range style change
    /// that styles the next insertion at its offset.
    pub(crate) pending: bool,
    pub(crate) width: Option<f32>,
    pub(crate) origin: f32,
    pub(crate) visual_index: u32,
    pub(crate) segment: Option<SegmentId>,
}

impl Run {
    pub(crate) fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            len,
            ..Self::default()
        }
    }

    /// Creates a run covering `start..start + len` with this run's attributes.
    pub(crate) fn clone_attrs(&self, start: usize, len: usize) -> Self {
        Self {
            start,
            len,
            style: self.style.clone(),
            flags: self.flags,
            level: self.level,
            ..Self::default()
        }
    }

    /// Offset of the first code unit.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of code units.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for a zero-length run.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset one past the last code unit.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// The covered range of code units.
    pub fn text_range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Formatting, if any field is set.
    pub fn style(&self) -> Option<&RunStyle> {
        self.style.as_deref()
    }

    /// Transient flags.
    pub fn flags(&self) -> RunFlags {
        self.flags
    }

    /// Resolved bidi embedding level.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns `true` if the run's embedding level is odd.
    pub fn is_rtl(&self) -> bool {
        self.level & 1 != 0
    }

    /// Measured width from the last layout pass.
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Horizontal position relative to the containing segment's left edge.
    pub fn origin(&self) -> f32 {
        self.origin
    }

    /// Position of the run in its segment's visual order.
    pub fn visual_index(&self) -> u32 {
        self.visual_index
    }

    /// Segment containing the run after layout.
    pub fn segment(&self) -> Option<SegmentId> {
        self.segment
    }

    /// Inline image source.
    pub fn image(&self) -> Option<&str> {
        self.style.as_ref().and_then(|s| s.image.as_deref())
    }

    /// Baseline shift in pixels.
    pub fn shift(&self) -> i16 {
        self.style.as_ref().and_then(|s| s.shift).unwrap_or(0)
    }

    /// Resolves the run's font against the inherited default.
    pub fn font(&self, default: &FontKey) -> FontKey {
        match &self.style {
            Some(style) => style.font(default),
            None => default.clone(),
        }
    }

    /// Compares formatting.
    ///
    /// The persistent comparison ignores transient flags. Runs carrying an
    /// image never compare equal to anything.
    pub fn same_attributes(&self, other: &Self, persistent_only: bool) -> bool {
        if self.image().is_some() || other.image().is_some() {
            return false;
        }
        if !persistent_only && self.flags != other.flags {
            return false;
        }
        self.style.as_deref() == other.style.as_deref()
    }

    pub(crate) fn style_mut(&mut self) -> &mut RunStyle {
        self.style.get_or_insert_with(Default::default)
    }

    /// Drops the style record once nothing in it is set.
    pub(crate) fn normalize_style(&mut self) {
        if self.style.as_ref().is_some_and(|s| s.is_empty()) {
            self.style = None;
        }
    }

    pub(crate) fn invalidate(&mut self) {
        self.width = None;
        self.segment = None;
    }

    pub(crate) fn ends_with_tab(&self, text: &[u16]) -> bool {
        self.len > 0 && text[self.end() - 1] == util::TAB
    }
}

/// Splits the run at `index` so `at` becomes a run boundary, returning the
/// index of the run that now starts at `at`.
pub(crate) fn split_run(runs: &mut Vec<Run>, index: usize, at: usize) -> usize {
    let run = &runs[index];
    if at <= run.start {
        return index;
    }
    if at >= run.end() {
        return index + 1;
    }
    let tail = run.clone_attrs(at, run.end() - at);
    runs[index].len = at - runs[index].start;
    runs[index].invalidate();
    runs.insert(index + 1, tail);
    index + 1
}

/// Outcome of fitting one run into the remaining width of a line.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct RunFit {
    /// Last break opportunity that fits, trailing spaces included. Equal to
    /// the run's start when none fits.
    pub(crate) break_index: usize,
    /// Pen position at the break, excluding trailing spaces.
    pub(crate) break_x: f32,
    /// A break opportunity inside the run fits.
    pub(crate) break_fits: bool,
    /// The whole run fits.
    pub(crate) whole_fits: bool,
    /// `break_index` follows an explicit line break.
    pub(crate) hard_break: bool,
}

/// Text and measurement services for one layout or caret query.
#[derive(Copy, Clone)]
pub(crate) struct MeasureCx<'a> {
    pub(crate) text: &'a [u16],
    pub(crate) host: &'a dyn FieldHost,
}

impl<'a> MeasureCx<'a> {
    pub(crate) fn new(text: &'a [u16], host: &'a dyn FieldHost) -> Self {
        Self { text, host }
    }

    pub(crate) fn font(&self, run: &Run) -> FontKey {
        run.font(&self.host.defaults().font)
    }

    /// Measures `from..to` of `run`, skipping control characters.
    pub(crate) fn measure(&self, run: &Run, from: usize, to: usize) -> f32 {
        if from >= to {
            return 0.0;
        }
        if let Some(source) = run.image() {
            return self.host.image_size(source).map_or(0.0, |(w, _)| w);
        }
        let font = self.font(run);
        let mut width = 0.0;
        let mut piece = from;
        for i in from..to {
            if util::is_control(self.text[i]) {
                if piece < i {
                    width += self.host.measure(&font, &self.text[piece..i]);
                }
                piece = i + 1;
            }
        }
        if piece < to {
            width += self.host.measure(&font, &self.text[piece..to]);
        }
        width
    }

    pub(crate) fn run_width(&self, run: &Run) -> f32 {
        match run.width {
            Some(width) => width,
            None => self.measure(run, run.start, run.end()),
        }
    }

    /// Vertical metrics of a run with its baseline shift applied.
    pub(crate) fn metrics(&self, run: &Run) -> FontMetrics {
        let mut metrics = match run.image().and_then(|s| self.host.image_size(s)) {
            Some((_, height)) => FontMetrics {
                ascent: height,
                descent: 0.0,
                leading: 0.0,
                x_height: height * 0.5,
            },
            None => self.host.metrics(&self.font(run)),
        };
        let shift = f32::from(run.shift());
        if shift < 0.0 {
            metrics.ascent -= shift;
        } else {
            metrics.descent += shift;
        }
        metrics
    }

    /// Fits `run` starting at pen position `origin_x` into `max_width`.
    ///
    /// Width is accumulated one break opportunity at a time. Trailing spaces
    /// before an opportunity never count against the width, so a fitting
    /// break always swallows the spaces that precede the next word.
    pub(crate) fn fit(&self, run: &Run, origin_x: f32, max_width: f32) -> RunFit {
        let end = run.end();
        let mut fit = RunFit {
            break_index: run.start,
            break_x: origin_x,
            break_fits: false,
            whole_fits: false,
            hard_break: false,
        };
        let mut advance = 0.0;
        let mut chunk = run.start;
        let mut pos = run.start;
        while pos < end {
            let hard = util::is_line_break(self.text[pos]);
            pos = util::next_code_point(self.text, pos).1.min(end);
            if !hard && !analysis::is_break_opportunity(self.text, pos) {
                continue;
            }
            let visible = util::trim_trailing_spaces(self.text, chunk, pos);
            let x = origin_x + advance + self.measure(run, chunk, visible);
            advance += self.measure(run, chunk, pos);
            chunk = pos;
            if x > max_width {
                return fit;
            }
            fit.break_index = pos;
            fit.break_x = x;
            fit.break_fits = true;
            if hard {
                fit.hard_break = true;
                fit.whole_fits = pos == end;
                return fit;
            }
        }
        fit.whole_fits = if chunk < end {
            let visible = util::trim_trailing_spaces(self.text, chunk, end);
            origin_x + advance + self.measure(run, chunk, visible) <= max_width
        } else {
            true
        };
        fit
    }

    /// First break opportunity in the run, extended over following spaces.
    pub(crate) fn first_break(&self, run: &Run) -> Option<usize> {
        let end = run.end();
        let mut pos = run.start;
        while pos < end {
            let hard = util::is_line_break(self.text[pos]);
            pos = util::next_code_point(self.text, pos).1.min(end);
            if hard || analysis::is_break_opportunity(self.text, pos) {
                while pos < end && !hard && util::is_trailing_space(self.text[pos]) {
                    pos += 1;
                }
                return Some(pos);
            }
        }
        None
    }

    /// Caret position of `index` relative to the run's segment.
    pub(crate) fn cursor_x(&self, run: &Run, index: usize) -> f32 {
        let index = index.clamp(run.start, run.end());
        let sub = self.measure(run, run.start, index);
        if run.is_rtl() {
            run.origin + self.run_width(run) - sub
        } else {
            run.origin + sub
        }
    }
}

/// Caret indices inside `run` in logical order, both ends included.
/// `boundaries` are the paragraph's grapheme boundaries.
pub(crate) fn caret_indices(run: &Run, boundaries: &[usize]) -> Vec<usize> {
    let lo = boundaries.partition_point(|&b| b < run.start);
    let hi = boundaries.partition_point(|&b| b <= run.end());
    let mut indices: Vec<usize> = boundaries[lo..hi].to_vec();
    if indices.first() != Some(&run.start) {
        indices.insert(0, run.start);
    }
    if indices.last() != Some(&run.end()) {
        indices.push(run.end());
    }
    indices
}
