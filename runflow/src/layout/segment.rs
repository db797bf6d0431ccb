// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fitting and visual ordering of the runs in one tab cell.

use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

use crate::run::{split_run, MeasureCx, Run};
use crate::util;

/// How much of a segment fits on the current line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum SegmentFit {
    /// Every run fits.
    All,
    /// The line ends before run `end`, which may have been created by
    /// splitting the run holding the break.
    Partial { end: usize, hard: bool },
    /// Nothing fits; the line ends before the segment.
    Reject,
}

/// Fits the runs `range` into `max_width`.
///
/// The last fitting break opportunity wins; an explicit line break ends the
/// line unconditionally. When nothing fits and `force` is set, the segment
/// is broken at its first opportunity so the line makes progress.
pub(crate) fn fit_segment(
    cx: &MeasureCx<'_>,
    runs: &mut Vec<Run>,
    range: Range<usize>,
    max_width: f32,
    force: bool,
) -> SegmentFit {
    let mut x = 0.0;
    let mut commit = None;
    let mut overflow = false;
    for k in range.clone() {
        let run = &runs[k];
        if run.is_empty() {
            continue;
        }
        let fit = cx.fit(run, x, max_width);
        log::trace!(
            "fit run {k} at {x}: break {} fits {} whole {}",
            fit.break_index,
            fit.break_fits,
            fit.whole_fits
        );
        if fit.hard_break {
            let end = split_run(runs, k, fit.break_index);
            return SegmentFit::Partial { end, hard: true };
        }
        if fit.break_fits {
            commit = Some((k, fit.break_index));
        }
        if !fit.whole_fits {
            overflow = true;
            break;
        }
        x += cx.measure(run, run.start, run.end());
    }
    if !overflow {
        return SegmentFit::All;
    }
    if let Some((k, at)) = commit {
        return SegmentFit::Partial {
            end: split_run(runs, k, at),
            hard: false,
        };
    }
    if !force {
        return SegmentFit::Reject;
    }
    for k in range.clone() {
        if let Some(at) = cx.first_break(&runs[k]) {
            let hard = util::is_line_break(cx.text[at - 1]);
            return SegmentFit::Partial {
                end: split_run(runs, k, at),
                hard,
            };
        }
    }
    SegmentFit::Partial {
        end: range.end,
        hard: false,
    }
}

/// Orders the runs of a segment from left to right.
///
/// Levels from the highest down to the lowest odd level present reverse
/// every maximal sequence of runs at or above that level.
pub(crate) fn resolve_display_order(runs: &[Run], range: Range<usize>) -> SmallVec<[usize; 4]> {
    let mut order: SmallVec<[usize; 4]> = range.collect();
    let Some(max) = order.iter().map(|&k| runs[k].level).max() else {
        return order;
    };
    let mut min = order.iter().map(|&k| runs[k].level).min().unwrap_or(0);
    if min & 1 == 0 {
        min += 1;
    }
    let mut level = max;
    while level >= min {
        let mut i = 0;
        while i < order.len() {
            if runs[order[i]].level >= level {
                let mut j = i + 1;
                while j < order.len() && runs[order[j]].level >= level {
                    j += 1;
                }
                order[i..j].reverse();
                i = j;
            } else {
                i += 1;
            }
        }
        level -= 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs_with_levels(levels: &[u8]) -> Vec<Run> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| Run {
                level,
                ..Run::new(i, 1)
            })
            .collect()
    }

    #[test]
    fn ltr_runs_keep_logical_order() {
        let runs = runs_with_levels(&[0, 0, 0]);
        assert_eq!(&*resolve_display_order(&runs, 0..3), &[0, 1, 2], "no reordering");
    }

    #[test]
    fn rtl_runs_reverse() {
        let runs = runs_with_levels(&[1, 1, 1]);
        assert_eq!(&*resolve_display_order(&runs, 0..3), &[2, 1, 0], "all reversed");
    }

    #[test]
    fn embedded_ltr_keeps_its_order_inside_rtl() {
        let runs = runs_with_levels(&[1, 2, 2, 1]);
        assert_eq!(
            &*resolve_display_order(&runs, 0..4),
            &[3, 1, 2, 0],
            "level 2 runs are reversed twice"
        );
    }
}
