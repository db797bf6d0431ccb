// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tab stop positions.

use super::HAlign;
use crate::style::BaseDirection;
use crate::DEFAULT_TAB_STRIDE;

/// A tab stop table extended past its end by the gap between its last two
/// stops.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TabStops<'a> {
    stops: &'a [u16],
    alignments: &'a [HAlign],
    fixed: bool,
    rtl: bool,
}

impl<'a> TabStops<'a> {
    pub(crate) fn new(
        stops: &'a [u16],
        alignments: &'a [HAlign],
        fixed: bool,
        direction: BaseDirection,
    ) -> Self {
        Self {
            stops,
            alignments,
            fixed,
            rtl: direction == BaseDirection::Rtl,
        }
    }

    pub(crate) fn is_fixed(&self) -> bool {
        self.fixed
    }

    /// Repeat distance beyond the last stop.
    fn stride(&self) -> f32 {
        match *self.stops {
            [] => f32::from(DEFAULT_TAB_STRIDE),
            [only] => f32::from(only),
            [.., prev, last] => f32::from(last.saturating_sub(prev)),
        }
    }

    fn last(&self) -> f32 {
        self.stops.last().map_or(0.0, |&s| f32::from(s))
    }

    /// The `k`th stop, zero based.
    pub(crate) fn stop(&self, k: usize) -> f32 {
        if let Some(&stop) = self.stops.get(k) {
            return f32::from(stop);
        }
        let beyond = (k + 1 - self.stops.len()) as f32;
        self.last() + self.stride() * beyond
    }

    /// First stop strictly to the right of `x`.
    pub(crate) fn next_after(&self, x: f32) -> f32 {
        if let Some(&stop) = self.stops.iter().find(|&&s| f32::from(s) > x) {
            return f32::from(stop);
        }
        let stride = self.stride();
        let last = self.last();
        if stride <= 0.0 {
            return x + 1.0;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "Stop counts are far below i32::MAX for any realistic width."
        )]
        let steps = ((x - last) / stride) as i32 + 1;
        let stop = last + stride * steps as f32;
        if stop > x {
            stop
        } else {
            stop + stride
        }
    }

    /// Left edge of segment `index` (at least 1) given the pen position at
    /// the end of the previous segment's content.
    pub(crate) fn left(&self, index: usize, pen: f32) -> f32 {
        if self.fixed {
            let stop = self.stop(index - 1);
            if stop > pen {
                stop
            } else {
                pen + 1.0
            }
        } else {
            self.next_after(pen)
        }
    }

    /// Alignment of segment `index`.
    pub(crate) fn alignment(&self, index: usize) -> HAlign {
        match self.alignments.get(index) {
            Some(&align) => align,
            None if self.alignments.is_empty() && self.rtl => HAlign::Right,
            None => HAlign::Left,
        }
    }

    /// Returns `true` if `align` pushes content away from the start edge.
    pub(crate) fn opposes_base(&self, align: HAlign) -> bool {
        matches!(
            (align, self.rtl),
            (HAlign::Right, false) | (HAlign::Left, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_stops_repeat_last_gap() {
        let tabs = TabStops::new(&[50, 80], &[], true, BaseDirection::Ltr);
        assert_eq!(tabs.stop(0), 50.0, "first explicit stop");
        assert_eq!(tabs.stop(2), 110.0, "one stride past the table");
        assert_eq!(tabs.stop(3), 140.0, "two strides past the table");
    }

    #[test]
    fn single_stop_repeats_itself() {
        let tabs = TabStops::new(&[80], &[], false, BaseDirection::Ltr);
        assert_eq!(tabs.next_after(10.0), 80.0, "inside the table");
        assert_eq!(tabs.next_after(80.0), 160.0, "a stop equal to x is skipped");
        assert_eq!(tabs.next_after(170.0), 240.0, "beyond the table");
    }

    #[test]
    fn empty_table_uses_default_stride() {
        let tabs = TabStops::new(&[], &[], false, BaseDirection::Ltr);
        assert_eq!(tabs.next_after(0.0), 32.0, "first default stop");
        assert_eq!(tabs.next_after(40.0), 64.0, "second default stop");
    }

    #[test]
    fn fixed_left_edge_moves_past_touching_content() {
        let tabs = TabStops::new(&[80], &[], true, BaseDirection::Ltr);
        assert_eq!(tabs.left(1, 40.0), 80.0, "content short of the stop");
        assert_eq!(tabs.left(1, 80.0), 81.0, "content ending on the stop");
    }

    #[test]
    fn rtl_without_table_aligns_right() {
        let tabs = TabStops::new(&[], &[], false, BaseDirection::Rtl);
        assert_eq!(tabs.alignment(0), HAlign::Right, "default RTL alignment");
        let tabs = TabStops::new(&[], &[HAlign::Center], false, BaseDirection::Rtl);
        assert_eq!(tabs.alignment(1), HAlign::Left, "past the end of a set table");
    }
}
