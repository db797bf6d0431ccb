// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout pass: run preparation, line wrapping and cell positioning.

use alloc::vec::Vec;
use core::ops::Range;

use super::segment::{fit_segment, resolve_display_order, SegmentFit};
use super::tabs::TabStops;
use super::{HAlign, Line, LineMetrics, Segment, SegmentId, VAlign};
use crate::bidi;
use crate::host::FontMetrics;
use crate::run::{split_run, MeasureCx, Run};
use crate::style::{BaseDirection, ResolvedParagraph, TextAlign};
use crate::util;

/// Splits runs so that none straddles two embedding levels, and assigns
/// each run its level.
pub(crate) fn assign_levels(text: &[u16], runs: &mut Vec<Run>, direction: BaseDirection) {
    let levels = bidi::resolve_levels(text, direction);
    let base = u8::from(direction == BaseDirection::Rtl);
    let level_at = |index: usize| -> u8 {
        levels
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| levels.get(i)))
            .copied()
            .unwrap_or(base)
    };
    let mut k = 0;
    while k < runs.len() {
        let run = &runs[k];
        let level = level_at(run.start);
        let split = (run.start + 1..run.end()).find(|&i| levels[i] != level);
        runs[k].level = level;
        if let Some(at) = split {
            split_run(runs, k, at);
        }
        k += 1;
    }
}

/// Splits runs after every tab so tabs only ever end a run.
pub(crate) fn split_at_tabs(text: &[u16], runs: &mut Vec<Run>) {
    let mut k = 0;
    while k < runs.len() {
        let run = &runs[k];
        if run.len > 1 {
            let tab = text[run.start..run.end() - 1]
                .iter()
                .position(|&unit| unit == util::TAB);
            if let Some(i) = tab {
                let at = run.start + i + 1;
                split_run(runs, k, at);
            }
        }
        k += 1;
    }
}

/// Index one past the last run of the segment starting at `start`.
fn segment_end(text: &[u16], runs: &[Run], start: usize) -> usize {
    let mut k = start;
    while k < runs.len() {
        k += 1;
        if runs[k - 1].ends_with_tab(text) {
            break;
        }
    }
    k
}

struct Cell {
    runs: Range<usize>,
    left: f32,
    content: f32,
}

/// Inputs shared by every line of a layout pass.
pub(crate) struct Flow<'a> {
    pub(crate) cx: MeasureCx<'a>,
    pub(crate) para: &'a ResolvedParagraph,
    pub(crate) direction: BaseDirection,
    pub(crate) cell_valign: VAlign,
}

impl Flow<'_> {
    fn tabs(&self) -> TabStops<'_> {
        TabStops::new(
            &self.para.tabs,
            &self.para.tab_alignments,
            self.para.vgrid,
            self.direction,
        )
    }

    /// Wraps `runs` into lines. Without wrapping, only explicit line breaks
    /// end a line.
    pub(crate) fn run(&self, runs: &mut Vec<Run>, wrap: bool) -> Vec<Line> {
        let (first_width, rest_width) = if wrap {
            (self.para.first_line_width(), self.para.line_width())
        } else {
            (f32::INFINITY, f32::INFINITY)
        };
        let tabs = self.tabs();
        let padding = self.cell_padding(&tabs);
        let text = self.cx.text;
        let mut lines = Vec::new();
        let mut r = 0;
        loop {
            let width = if lines.is_empty() { first_width } else { rest_width };
            let line_start = r;
            let mut cells: Vec<Cell> = Vec::new();
            let mut pen = 0.0;
            let mut hard = false;
            let mut complete = false;
            while r < runs.len() {
                let index = cells.len();
                let seg_end = segment_end(text, runs, r);
                let left = if index == 0 { 0.0 } else { tabs.left(index, pen) };
                let room = width - left - 2.0 * padding;
                let fit = fit_segment(&self.cx, runs, r..seg_end, room, index == 0);
                let end = match fit {
                    SegmentFit::All => seg_end,
                    SegmentFit::Partial { end, hard: h } => {
                        hard = h;
                        end
                    }
                    SegmentFit::Reject => break,
                };
                let content = runs[r..end]
                    .iter()
                    .map(|run| self.cx.measure(run, run.start, run.end()))
                    .sum::<f32>();
                cells.push(Cell {
                    runs: r..end,
                    left,
                    content,
                });
                // Fixed cells are padded on both sides.
                pen = left + content + 2.0 * padding;
                r = end;
                if fit != SegmentFit::All {
                    break;
                }
                complete = r == runs.len();
            }
            if complete && runs.last().is_some_and(|run| run.ends_with_tab(text)) {
                let left = tabs.left(cells.len(), pen);
                cells.push(Cell {
                    runs: r..r,
                    left,
                    content: 0.0,
                });
            }
            if cells.is_empty() {
                cells.push(Cell {
                    runs: r..r,
                    left: 0.0,
                    content: 0.0,
                });
            }
            let avail = if lines.is_empty() { first_width } else { rest_width };
            let line = self.finish_line(runs, line_start..r, cells, hard, lines.len(), avail);
            lines.push(line);
            if r >= runs.len() {
                if hard {
                    let line = self.finish_line(
                        runs,
                        r..r,
                        alloc::vec![Cell {
                            runs: r..r,
                            left: 0.0,
                            content: 0.0,
                        }],
                        false,
                        lines.len(),
                        rest_width,
                    );
                    lines.push(line);
                }
                break;
            }
        }
        lines
    }

    /// Padding on each side of a fixed cell. Free tab stops are unpadded.
    fn cell_padding(&self, tabs: &TabStops<'_>) -> f32 {
        if tabs.is_fixed() {
            f32::from(self.para.padding)
        } else {
            0.0
        }
    }

    fn fallback_metrics(&self, runs: &[Run], at: usize) -> FontMetrics {
        match at.checked_sub(1).and_then(|k| runs.get(k)) {
            Some(run) => self.cx.metrics(run),
            None => self.cx.host.metrics(&self.cx.host.defaults().font),
        }
    }

    fn finish_line(
        &self,
        runs: &mut [Run],
        range: Range<usize>,
        cells: Vec<Cell>,
        hard_break: bool,
        line_index: usize,
        avail: f32,
    ) -> Line {
        let text = self.cx.text;
        let tabs = self.tabs();
        let rtl = self.direction == BaseDirection::Rtl;
        let padding = self.cell_padding(&tabs);

        for run in &mut runs[range.clone()] {
            run.width = Some(self.cx.measure(run, run.start, run.end()));
        }

        // Cell edges in logical space, measured from the start edge.
        let count = cells.len();
        let mut segments: Vec<Segment> = Vec::with_capacity(count);
        for (i, cell) in cells.iter().enumerate() {
            let halign = tabs.alignment(i);
            let content_end = cell.left + cell.content + 2.0 * padding;
            let right = if let Some(next) = cells.get(i + 1) {
                if tabs.is_fixed() {
                    tabs.stop(i).max(content_end).min(next.left)
                } else {
                    next.left
                }
            } else if tabs.is_fixed() {
                tabs.stop(i).max(content_end)
            } else {
                let ends_with_tab = cell
                    .runs
                    .clone()
                    .last()
                    .is_some_and(|k| runs[k].ends_with_tab(text));
                if tabs.opposes_base(halign) || ends_with_tab {
                    tabs.next_after(content_end)
                } else {
                    content_end
                }
            };
            segments.push(Segment {
                runs: cell.runs.clone(),
                left: cell.left,
                right: right.max(content_end),
                content_width: cell.content,
                padding,
                halign,
                valign: if tabs.is_fixed() {
                    self.cell_valign
                } else {
                    VAlign::Baseline
                },
                ..Segment::default()
            });
        }
        let width = segments.last().map_or(0.0, |s| s.right);
        if rtl {
            for segment in &mut segments {
                let (left, right) = (width - segment.right, width - segment.left);
                segment.left = left;
                segment.right = right;
            }
        }

        // Vertical metrics.
        let mut metrics = LineMetrics::default();
        let mut seg_metrics: Vec<FontMetrics> = Vec::with_capacity(count);
        for segment in &segments {
            let mut m = FontMetrics::default();
            let mut any = false;
            for run in &runs[segment.runs.clone()] {
                let rm = self.cx.metrics(run);
                m.ascent = m.ascent.max(rm.ascent);
                m.descent = m.descent.max(rm.descent);
                m.leading = m.leading.max(rm.leading);
                any = true;
            }
            if !any {
                m = self.fallback_metrics(runs, segment.runs.start);
            }
            metrics.ascent = metrics.ascent.max(m.ascent);
            metrics.descent = metrics.descent.max(m.descent);
            metrics.leading = metrics.leading.max(m.leading);
            seg_metrics.push(m);
        }
        metrics.width = width;

        // Horizontal placement of runs inside each cell.
        let height = metrics.height();
        for (index, (segment, m)) in segments.iter_mut().zip(&seg_metrics).enumerate() {
            segment.visual = resolve_display_order(runs, segment.runs.clone());
            segment.top = 0.0;
            segment.bottom = metrics.advance();
            segment.baseline = match segment.valign {
                VAlign::Baseline => metrics.ascent,
                VAlign::Top => m.ascent,
                VAlign::Center => (height - m.ascent - m.descent) * 0.5 + m.ascent,
                VAlign::Bottom => height - m.descent,
            };
            let cell = segment.right - segment.left;
            let start_aligned = if rtl { HAlign::Right } else { HAlign::Left };
            let align = match segment.halign {
                HAlign::Justify => start_aligned,
                other => other,
            };
            let offset = match align {
                HAlign::Left | HAlign::Justify => segment.padding,
                HAlign::Right => cell - segment.padding - segment.content_width,
                HAlign::Center => (cell - segment.content_width) * 0.5,
            };
            let mut x = offset.max(0.0);
            for (visual_index, &k) in segment.visual.iter().enumerate() {
                let run = &mut runs[k];
                run.origin = x;
                run.visual_index = visual_index as u32;
                run.segment = Some(SegmentId {
                    line: line_index as u32,
                    index: index as u32,
                });
                x += run.width.unwrap_or(0.0);
            }
        }

        // Line placement within the paragraph.
        let avail = if avail.is_finite() {
            avail
        } else if self.para.wrap_width.is_finite() {
            self.para.line_width()
        } else {
            width
        };
        let free = (avail - width).max(0.0);
        let align = self.para.text_align.unwrap_or(if rtl {
            TextAlign::Right
        } else {
            TextAlign::Left
        });
        let shift = match (align, rtl) {
            (TextAlign::Left, _) | (TextAlign::Justify, false) => 0.0,
            (TextAlign::Right, _) | (TextAlign::Justify, true) => free,
            (TextAlign::Center, _) => free * 0.5,
        };
        let mut offset = self.para.left_margin() + shift;
        if line_index == 0 && !rtl {
            offset += f32::from(self.para.first_indent);
        }
        metrics.offset = offset;

        let text_range = if range.is_empty() {
            let at = runs.get(range.start).map_or(text.len(), |run| run.start);
            at..at
        } else {
            runs[range.start].start..runs[range.end - 1].end()
        };
        Line {
            runs: range,
            text_range,
            segments,
            metrics,
            hard_break,
            dirty_width: 0.0,
            base_level: u8::from(rtl),
        }
    }
}
