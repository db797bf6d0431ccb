// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caret movement.

use alloc::borrow::Cow;
use core::ops::Range;

use super::Paragraph;
use crate::analysis;
use crate::host::FieldHost;
use crate::layout::cursor;
use crate::run::MeasureCx;
use crate::style::BaseDirection;
use crate::util;

impl Paragraph {
    fn graphemes(&self) -> Cow<'_, [usize]> {
        if self.needs_layout || self.layout_state.is_none() {
            Cow::Owned(analysis::grapheme_boundaries(&self.text))
        } else {
            Cow::Borrowed(self.boundaries())
        }
    }

    /// The grapheme boundary after `index`, in logical order.
    pub fn advance_index(&self, index: usize) -> usize {
        cursor::next_boundary(&self.graphemes(), index).min(self.text.len())
    }

    /// The grapheme boundary before `index`, in logical order.
    pub fn retreat_index(&self, index: usize) -> usize {
        cursor::previous_boundary(&self.graphemes(), index.min(self.text.len()))
    }

    /// Start of the word at or before `index`, skipping non-word characters
    /// first.
    pub fn find_word_break_before(&self, index: usize) -> usize {
        let text = &self.text;
        let mut index = util::snap_to_code_point(text, index.min(text.len()));
        while index > 0 {
            let (cp, start) = util::prev_code_point(text, index);
            if util::is_word_char(cp) {
                break;
            }
            index = start;
        }
        while index > 0 {
            let (cp, start) = util::prev_code_point(text, index);
            if !util::is_word_char(cp) {
                break;
            }
            index = start;
        }
        index
    }

    /// End of the word at or after `index`, skipping non-word characters
    /// first.
    pub fn find_word_break_after(&self, index: usize) -> usize {
        let text = &self.text;
        let mut index = util::snap_to_code_point(text, index.min(text.len()));
        while index < text.len() {
            let (cp, next) = util::next_code_point(text, index);
            if util::is_word_char(cp) {
                break;
            }
            index = next;
        }
        while index < text.len() {
            let (cp, next) = util::next_code_point(text, index);
            if !util::is_word_char(cp) {
                break;
            }
            index = next;
        }
        index
    }

    /// The word touching `index`, or an empty range when none does.
    pub fn word_range(&self, index: usize) -> Range<usize> {
        let text = &self.text;
        let index = util::snap_to_code_point(text, index.min(text.len()));
        let mut start = index;
        while start > 0 {
            let (cp, prev) = util::prev_code_point(text, start);
            if !util::is_word_char(cp) {
                break;
            }
            start = prev;
        }
        let mut end = index;
        while end < text.len() {
            let (cp, next) = util::next_code_point(text, end);
            if !util::is_word_char(cp) {
                break;
            }
            end = next;
        }
        start..end
    }

    /// Caret index nearest to `(x, y)`, snapped to the closer edge of the
    /// word under the point.
    pub fn cursor_word_index(&mut self, host: &dyn FieldHost, x: f32, y: f32) -> usize {
        let index = self.hit_test(host, x, y, false);
        let word = self.word_range(index);
        if word.is_empty() {
            return index;
        }
        let start_x = self.cursor_x(host, word.start);
        let end_x = self.cursor_x(host, word.end);
        let distance = |edge: f32| if x > edge { x - edge } else { edge - x };
        if distance(start_x) <= distance(end_x) {
            word.start
        } else {
            word.end
        }
    }

    /// Moves the caret one position to the left on screen.
    pub fn move_left(&mut self, host: &dyn FieldHost, index: usize) -> usize {
        self.move_visual(host, index, false)
    }

    /// Moves the caret one position to the right on screen.
    pub fn move_right(&mut self, host: &dyn FieldHost, index: usize) -> usize {
        self.move_visual(host, index, true)
    }

    fn move_visual(&mut self, host: &dyn FieldHost, index: usize, right: bool) -> usize {
        self.layout(host, false);
        let index = util::snap_to_code_point(&self.text, index.min(self.text.len()));
        let line_index = self.line_for_index(index);
        let Some(line) = self.lines.get(line_index) else {
            return index;
        };
        let cx = MeasureCx::new(&self.text, host);
        let stops = cursor::caret_stops(&cx, &self.runs, line, self.boundaries());
        if let Some(pos) = stops.iter().position(|&(_, stop)| stop == index) {
            let target = if right {
                stops.get(pos + 1)
            } else {
                pos.checked_sub(1).and_then(|p| stops.get(p))
            };
            if let Some(&(_, stop)) = target {
                return stop;
            }
        }
        let rtl = self
            .layout_state
            .as_ref()
            .is_some_and(|state| state.direction == BaseDirection::Rtl);
        if right != rtl {
            match self.lines.get(line_index + 1) {
                Some(next) => next.text_range.start,
                None => self.advance_index(index),
            }
        } else if line_index > 0 {
            self.retreat_index(line.text_range.start)
        } else {
            self.retreat_index(index)
        }
    }
}
