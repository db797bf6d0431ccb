// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping between text offsets and horizontal positions on a line.

use alloc::vec::Vec;

use super::{Line, Segment};
use crate::run::{caret_indices, MeasureCx, Run};
use crate::util;

/// Where the caret for a text index is drawn.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Anchor {
    /// Inside or at an edge of run `k`.
    Run(usize),
    /// At the start edge of a segment's content in the base direction.
    Start(usize),
    /// At the end edge of a segment's content in the base direction.
    End(usize),
}

fn segment_of(run: &Run) -> usize {
    run.segment.map_or(0, |id| id.index as usize)
}

/// Picks the anchor for a caret at `index` on `line`.
///
/// Between two runs of different embedding levels the caret follows the
/// lower level, and the ends of a segment count as runs at the base level.
/// This gives every caret index on a line its own position.
fn anchor(cx: &MeasureCx<'_>, runs: &[Run], line: &Line, index: usize) -> Anchor {
    let mut before = None;
    let mut after = None;
    for k in line.runs.clone() {
        let run = &runs[k];
        if run.is_empty() {
            continue;
        }
        if run.start < index && index < run.end() {
            return Anchor::Run(k);
        }
        if run.end() == index {
            before = Some(k);
        }
        if run.start == index && after.is_none() {
            after = Some(k);
        }
    }
    // The caret after a tab belongs to the next segment.
    let mut next_segment = None;
    if let Some(k) = before {
        if runs[k].ends_with_tab(cx.text) {
            next_segment = Some(segment_of(&runs[k]) + 1);
            before = None;
        }
    }
    let base = line.base_level;
    let before_level = before.map_or(base, |k| runs[k].level);
    let after_level = after.map_or(base, |k| runs[k].level);
    let start = || match after {
        Some(k) => Anchor::Start(segment_of(&runs[k])),
        None => Anchor::Start(next_segment.unwrap_or(0)),
    };
    if before_level < after_level {
        before.map_or_else(start, Anchor::Run)
    } else if after_level < before_level {
        match (after, before) {
            (Some(k), _) => Anchor::Run(k),
            (None, Some(k)) => Anchor::End(segment_of(&runs[k])),
            (None, None) => start(),
        }
    } else {
        after.or(before).map_or_else(start, Anchor::Run)
    }
}

fn segment_text_start(cx: &MeasureCx<'_>, runs: &[Run], segment: &Segment) -> usize {
    runs.get(segment.runs.start)
        .map_or(cx.text.len(), |run| run.start)
}

/// Caret position of `index` relative to the line's left edge.
pub(crate) fn cursor_x(cx: &MeasureCx<'_>, runs: &[Run], line: &Line, index: usize) -> f32 {
    let rtl = line.base_level & 1 != 0;
    let edges = |segment: usize| {
        line.segments
            .get(segment)
            .map_or((0.0, 0.0), |segment| content_extent(runs, segment))
    };
    match anchor(cx, runs, line, index) {
        Anchor::Run(k) => {
            let run = &runs[k];
            let left = line.segments.get(segment_of(run)).map_or(0.0, |s| s.left);
            left + cx.cursor_x(run, index)
        }
        Anchor::Start(segment) if rtl => edges(segment).1,
        Anchor::Start(segment) => edges(segment).0,
        Anchor::End(segment) if rtl => edges(segment).0,
        Anchor::End(segment) => edges(segment).1,
    }
}

/// Horizontal extent of a segment's content, relative to the line.
fn content_extent(runs: &[Run], segment: &Segment) -> (f32, f32) {
    match (segment.first_visual(), segment.last_visual()) {
        (Some(first), Some(last)) => {
            let right = &runs[last];
            (
                segment.left + runs[first].origin,
                segment.left + right.origin + right.width.unwrap_or(0.0),
            )
        }
        _ => {
            let edge = segment.left + segment.padding;
            (edge, edge)
        }
    }
}

/// Caret stops of one segment from left to right. Indices sharing a
/// position keep the logically first one.
fn segment_stops(
    cx: &MeasureCx<'_>,
    runs: &[Run],
    line: &Line,
    segment: &Segment,
    boundaries: &[usize],
) -> Vec<(f32, usize)> {
    let mut indices: Vec<usize> = Vec::new();
    for run in &runs[segment.runs.clone()] {
        if run.is_empty() {
            continue;
        }
        for index in caret_indices(run, boundaries) {
            if indices.last() != Some(&index) {
                indices.push(index);
            }
        }
    }
    let ends_with_tab = segment
        .runs
        .clone()
        .last()
        .is_some_and(|k| runs[k].ends_with_tab(cx.text));
    if ends_with_tab {
        indices.pop();
    }
    if indices.is_empty() {
        indices.push(segment_text_start(cx, runs, segment));
    }
    let mut stops: Vec<(f32, usize)> = indices
        .into_iter()
        .map(|index| (cursor_x(cx, runs, line, index), index))
        .collect();
    stops.sort_by(|a, b| a.0.total_cmp(&b.0));
    stops.dedup_by(|b, a| a.0 == b.0);
    stops
}

/// Caret index nearest to `x`, which is relative to the line's left edge.
///
/// Space inside a cell but outside its content belongs to whichever cell's
/// content is nearer. On a line other than the last, a position past the
/// line's trailing whitespace or line break maps to the index before it, so
/// the caret stays on the clicked line.
pub(crate) fn cursor_index(
    cx: &MeasureCx<'_>,
    runs: &[Run],
    line: &Line,
    boundaries: &[usize],
    x: f32,
    is_last_line: bool,
    moving_forward: bool,
) -> usize {
    let mut best: Option<(f32, usize)> = None;
    for index in line.visual_segments() {
        let (left, right) = content_extent(runs, &line.segments[index]);
        let distance = if x < left {
            left - x
        } else if x > right {
            x - right
        } else {
            0.0
        };
        let better = match best {
            None => true,
            Some((d, _)) => distance < d || (moving_forward && distance == d),
        };
        if better {
            best = Some((distance, index));
        }
    }
    let Some((_, seg_index)) = best else {
        return line.text_range.start;
    };
    let stops = segment_stops(cx, runs, line, &line.segments[seg_index], boundaries);
    let mut index = stops
        .windows(2)
        .find(|pair| x < (pair[0].0 + pair[1].0) * 0.5)
        .or_else(|| stops.last().map(core::slice::from_ref))
        .map_or(line.text_range.start, |pair| pair[0].1);
    let end = line.text_range.end;
    if !is_last_line && index == end && end > line.text_range.start {
        let last = cx.text[end - 1];
        if util::is_trailing_space(last) {
            index = previous_boundary(boundaries, end).max(line.text_range.start);
        }
    }
    index
}

/// Grapheme boundary before `index`.
pub(crate) fn previous_boundary(boundaries: &[usize], index: usize) -> usize {
    let i = boundaries.partition_point(|&b| b < index);
    if i == 0 {
        0
    } else {
        boundaries[i - 1]
    }
}

/// Grapheme boundary after `index`.
pub(crate) fn next_boundary(boundaries: &[usize], index: usize) -> usize {
    let i = boundaries.partition_point(|&b| b <= index);
    boundaries
        .get(i)
        .copied()
        .unwrap_or_else(|| boundaries.last().copied().unwrap_or(0))
}

/// Caret stops of a line from left to right.
pub(crate) fn caret_stops(
    cx: &MeasureCx<'_>,
    runs: &[Run],
    line: &Line,
    boundaries: &[usize],
) -> Vec<(f32, usize)> {
    let mut stops: Vec<(f32, usize)> = Vec::new();
    for seg_index in line.visual_segments() {
        let segment = &line.segments[seg_index];
        for stop in segment_stops(cx, runs, line, segment, boundaries) {
            if stops.last().is_some_and(|&(_, last)| last == stop.1) {
                continue;
            }
            stops.push(stop);
        }
    }
    stops
}
