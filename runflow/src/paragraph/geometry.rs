// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout passes and geometry queries.

use peniko::kurbo::Rect;

use super::{AttributeCompare, LayoutState, Paragraph};
use crate::analysis;
use crate::bidi;
use crate::host::FieldHost;
use crate::layout::cursor;
use crate::layout::flow::{assign_levels, split_at_tabs, Flow};
use crate::layout::Line;
use crate::run::MeasureCx;
use crate::util;

fn union(a: Option<(f32, f32)>, b: (f32, f32)) -> (f32, f32) {
    match a {
        Some((top, bottom)) => (top.min(b.0), bottom.max(b.1)),
        None => b,
    }
}

impl Paragraph {
    /// Lays the paragraph out if an edit, a changed wrap width or a changed
    /// base direction requires it, or unconditionally with `force`.
    ///
    /// Returns `true` if any line's geometry changed. Lines that changed are
    /// marked dirty.
    pub fn layout(&mut self, host: &dyn FieldHost, force: bool) -> bool {
        let defaults = host.defaults();
        let para = self.style.resolve(defaults);
        let direction = bidi::resolve_direction(&self.text, para.direction);
        let current = self.layout_state.as_ref().is_some_and(|state| {
            state.direction == direction && state.wrap_width == defaults.wrap_width
        });
        if current && !force && !self.needs_layout {
            return false;
        }

        self.defrag_runs(AttributeCompare::InMemory, true);
        assign_levels(&self.text, &mut self.runs, direction);
        split_at_tabs(&self.text, &mut self.runs);
        let flow = Flow {
            cx: MeasureCx::new(&self.text, host),
            para: &para,
            direction,
            cell_valign: defaults.cell_valign,
        };
        let wrap = !para.dont_wrap && para.wrap_width.is_finite();
        let mut lines = flow.run(&mut self.runs, wrap);

        let mut top = para.top_margin();
        let mut width: f32 = 0.0;
        for line in &mut lines {
            line.metrics.top = top;
            if !para.hidden {
                top += line.metrics.advance();
            }
            width = width.max(line.metrics.offset + line.metrics.width);
        }
        let height = if para.hidden {
            0.0
        } else {
            top + para.bottom_margin()
        };

        let old = core::mem::take(&mut self.lines);
        let mut changed = old.len() != lines.len();
        for (index, line) in lines.iter_mut().enumerate() {
            match old.get(index) {
                Some(prev) if prev.same_geometry(line) => line.dirty_width = prev.dirty_width,
                Some(prev) => {
                    line.dirty_width = extent(line).max(extent(prev));
                    changed = true;
                }
                None => {
                    line.dirty_width = extent(line);
                    changed = true;
                }
            }
        }
        let mut removed = self.layout_state.as_ref().and_then(|state| state.removed);
        if let (Some(first), Some(last)) = (old.get(lines.len()), old.last()) {
            removed = Some(union(
                removed,
                (first.metrics.top, last.metrics.top + last.metrics.advance()),
            ));
        }

        log::debug!(
            "laid out {} code units into {} lines, changed: {changed}",
            self.text.len(),
            lines.len()
        );
        self.layout_state = Some(LayoutState {
            direction,
            wrap_width: defaults.wrap_width,
            boundaries: analysis::grapheme_boundaries(&self.text),
            removed,
            height,
            width: width + para.right_margin(),
        });
        self.lines = lines;
        self.needs_layout = false;
        changed
    }

    /// Total height, margins included. Zero for a hidden paragraph.
    pub fn height(&self) -> f32 {
        self.layout_state.as_ref().map_or(0.0, |state| state.height)
    }

    /// Width of the widest line, margins included.
    pub fn width(&self) -> f32 {
        self.layout_state.as_ref().map_or(0.0, |state| state.width)
    }

    pub(crate) fn boundaries(&self) -> &[usize] {
        self.layout_state
            .as_ref()
            .map_or(&[][..], |state| &state.boundaries)
    }

    /// Index of the line holding a caret at `index`.
    ///
    /// A caret at a soft or hard break belongs to the line after it.
    pub fn line_for_index(&self, index: usize) -> usize {
        self.lines
            .partition_point(|line| line.text_range.start <= index)
            .saturating_sub(1)
    }

    /// Index of the line at `y`, clamped to the first and last lines.
    pub fn line_at_y(&self, y: f32) -> usize {
        self.lines
            .partition_point(|line| line.metrics.top <= y)
            .saturating_sub(1)
    }

    /// Caret rectangle for `index`, one pixel wide.
    ///
    /// With `include_spacing` the rectangle extends over the line's leading.
    pub fn cursor_rect(&mut self, host: &dyn FieldHost, index: usize, include_spacing: bool) -> Rect {
        self.layout(host, false);
        let index = util::snap_to_code_point(&self.text, index.min(self.text.len()));
        let Some(line) = self.lines.get(self.line_for_index(index)) else {
            return Rect::ZERO;
        };
        let cx = MeasureCx::new(&self.text, host);
        let x = line.metrics.offset + cursor::cursor_x(&cx, &self.runs, line, index);
        let top = line.metrics.top;
        let bottom = top
            + if include_spacing {
                line.metrics.advance()
            } else {
                line.metrics.height()
            };
        Rect::new(f64::from(x), f64::from(top), f64::from(x + 1.0), f64::from(bottom))
    }

    /// Horizontal caret position of `index` relative to the paragraph.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "The rectangle was built from an f32."
    )]
    pub fn cursor_x(&mut self, host: &dyn FieldHost, index: usize) -> f32 {
        self.cursor_rect(host, index, false).x0 as f32
    }

    /// Caret index nearest to the point `(x, y)` relative to the paragraph.
    pub fn cursor_index(&mut self, host: &dyn FieldHost, x: f32, y: f32) -> usize {
        self.hit_test(host, x, y, false)
    }

    pub(crate) fn hit_test(
        &mut self,
        host: &dyn FieldHost,
        x: f32,
        y: f32,
        moving_forward: bool,
    ) -> usize {
        self.layout(host, false);
        let line_index = self.line_at_y(y);
        let Some(line) = self.lines.get(line_index) else {
            return 0;
        };
        let cx = MeasureCx::new(&self.text, host);
        cursor::cursor_index(
            &cx,
            &self.runs,
            line,
            self.boundaries(),
            x - line.metrics.offset,
            line_index + 1 == self.lines.len(),
            moving_forward,
        )
    }

    /// Area needing repaint since the last [`clean`](Self::clean), relative
    /// to the paragraph. `None` when nothing changed.
    pub fn dirty_rect(&self) -> Option<Rect> {
        let mut span = self.layout_state.as_ref().and_then(|state| state.removed);
        let mut right: f32 = if span.is_some() { self.width() } else { 0.0 };
        for line in self.lines.iter().filter(|line| line.dirty_width > 0.0) {
            let top = line.metrics.top;
            span = Some(union(span, (top, top + line.metrics.advance())));
            right = right.max(line.dirty_width);
        }
        let (top, bottom) = span?;
        Some(Rect::new(0.0, f64::from(top), f64::from(right), f64::from(bottom)))
    }

    /// Marks lines overlapping `start..end` for repaint.
    pub fn mark_dirty(&mut self, start: usize, end: usize) {
        for line in &mut self.lines {
            let range = &line.text_range;
            if range.start <= end && start <= range.end {
                line.dirty_width = line.dirty_width.max(extent(line));
            }
        }
    }

    /// Clears all repaint state.
    pub fn clean(&mut self) {
        for line in &mut self.lines {
            line.dirty_width = 0.0;
        }
        if let Some(state) = &mut self.layout_state {
            state.removed = None;
        }
    }
}

/// Right edge of a line's painted area, at least one pixel so empty lines
/// still register as dirty.
fn extent(line: &Line) -> f32 {
    (line.metrics.offset + line.metrics.width).max(1.0)
}
