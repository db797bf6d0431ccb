// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text and run editing.

use alloc::vec::Vec;
use core::ops::Range;

use super::Paragraph;
use crate::host::FieldDefaults;
use crate::run::{split_run, Run};
use crate::style::{CharacterStyle, RunAttribute, RunFlags, RunStyle};
use crate::util;
use crate::MAX_TEXT_LENGTH;

/// Which style text typed at the point of a deletion picks up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StylingMode {
    /// The run before the deletion point extends over new text.
    #[default]
    FromBefore,
    /// New text takes the style of the first deleted character.
    FromAfter,
    /// New text is unstyled.
    None,
}

/// How [`Paragraph::defrag_with`] decides two runs may merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AttributeCompare {
    /// Compare formatting and transient flags.
    #[default]
    InMemory,
    /// Compare formatting only.
    Persistent,
}

fn apply(run: &mut Run, attribute: &RunAttribute) {
    match *attribute {
        RunAttribute::Hilite(on) => run.flags.set_hilited(on),
        RunAttribute::Visited(on) => run.flags.set_visited(on),
        RunAttribute::Flagged(on) => run.flags.set_flagged(on),
        _ => {
            run.style_mut().apply(attribute);
            run.normalize_style();
        }
    }
}

impl Paragraph {
    fn clamp(&self, offset: usize) -> usize {
        util::snap_to_code_point(&self.text, offset.min(self.text.len()))
    }

    /// Index of the run holding the character at `offset`.
    ///
    /// When `offset` is the boundary between two runs, `forward` selects the
    /// run starting there and otherwise the run ending there. Offsets at or
    /// past the end of the text resolve to the last run.
    pub fn find_run(&self, offset: usize, forward: bool) -> usize {
        let offset = offset.min(self.text.len());
        let k = self.runs.partition_point(|run| run.end() <= offset);
        if k >= self.runs.len() {
            return self.runs.len().saturating_sub(1);
        }
        if !forward && offset > 0 && self.runs[k].start == offset {
            if let Some(prev) = self.runs[..k].iter().rposition(|run| run.len > 0) {
                return prev;
            }
        }
        k
    }

    fn pending_at(&self, offset: usize) -> Option<usize> {
        self.runs
            .iter()
            .position(|run| run.pending && run.start == offset)
    }

    /// The run whose style new text at `offset` would take.
    fn style_run_at(&self, offset: usize) -> usize {
        match self.pending_at(offset) {
            Some(k) => k,
            None if offset == 0 => self.find_run(0, true),
            None => self.find_run(offset, false),
        }
    }

    /// The run that grows when text is inserted at `offset`.
    ///
    /// Image runs never grow; a zero-length run with the image removed is
    /// created next to them instead.
    fn insertion_run(&mut self, offset: usize) -> usize {
        let k = self.style_run_at(offset);
        if self.runs[k].image().is_none() {
            return k;
        }
        let mut run = self.runs[k].clone_attrs(offset, 0);
        if let Some(style) = &mut run.style {
            style.image = None;
        }
        run.normalize_style();
        let at = if offset <= self.runs[k].start { k } else { k + 1 };
        self.runs.insert(at, run);
        at
    }

    /// Inserts `text` at `offset`, returning the number of code units
    /// inserted.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> usize {
        self.insert_utf16(offset, &util::encode_str(text))
    }

    /// Inserts UTF-16 code units at `offset`, returning how many were
    /// inserted. Text that would grow the paragraph beyond
    /// [`MAX_TEXT_LENGTH`] is dropped.
    pub fn insert_utf16(&mut self, offset: usize, units: &[u16]) -> usize {
        let offset = self.clamp(offset);
        let room = MAX_TEXT_LENGTH - self.text.len();
        let mut count = units.len().min(room);
        if count < units.len() {
            log::warn!("dropping {} code units over the length cap", units.len() - count);
            if count > 0 && util::is_high_surrogate(units[count - 1]) {
                count -= 1;
            }
        }
        if count == 0 {
            return 0;
        }
        let k = self.insertion_run(offset);
        self.runs[k].len += count;
        for run in &mut self.runs[k + 1..] {
            run.start += count;
        }
        self.text
            .splice(offset..offset, units[..count].iter().copied());
        self.clear_pending();
        self.clear_zero_runs(false);
        self.invalidate();
        count
    }

    /// Places a pending zero-length run at `offset`, splitting the run that
    /// contains it.
    fn insert_pending(&mut self, offset: usize, mut run: Run) {
        let mut at = self.runs.partition_point(|r| r.start < offset);
        if at > 0 && self.runs[at - 1].end() > offset {
            at = split_run(&mut self.runs, at - 1, offset);
        }
        run.start = offset;
        run.len = 0;
        run.pending = true;
        self.runs.insert(at, run);
        self.clear_zero_runs(true);
    }

    /// Removes `start..end`.
    ///
    /// `mode` decides the style of text typed at `start` afterwards.
    pub fn delete_range(&mut self, start: usize, end: usize, mode: StylingMode) {
        let start = self.clamp(start);
        let end = self.clamp(end);
        if start >= end {
            return;
        }
        let first = &self.runs[self.find_run(start, true)];
        let first_attrs = first.clone_attrs(start, 0);
        let removed = end - start;
        let map = |p: usize| {
            if p <= start {
                p
            } else if p >= end {
                p - removed
            } else {
                start
            }
        };
        for run in &mut self.runs {
            let s = map(run.start);
            let e = map(run.end());
            run.start = s;
            run.len = e - s;
        }
        self.text.drain(start..end);
        self.clear_pending();
        self.runs.retain(|run| run.len > 0);
        let survivor = match mode {
            StylingMode::FromBefore | StylingMode::FromAfter => first_attrs,
            StylingMode::None => Run::new(start, 0),
        };
        if self.runs.is_empty() {
            self.runs.push(Run {
                pending: mode != StylingMode::FromBefore,
                ..survivor
            });
        } else if mode != StylingMode::FromBefore {
            self.insert_pending(start, survivor);
        }
        self.invalidate();
    }

    /// Splits the paragraph at `offset`, returning the tail.
    ///
    /// The tail copies the paragraph style except for the list index. A
    /// side left without text keeps a zero-length run carrying the style at
    /// the split point.
    pub fn split_at(&mut self, offset: usize) -> Self {
        let offset = self.clamp(offset);
        self.clear_pending();
        let mut k = self.runs.partition_point(|run| run.start < offset);
        if k > 0 && self.runs[k - 1].end() > offset {
            k = split_run(&mut self.runs, k - 1, offset);
        }
        let mut tail_runs: Vec<Run> = self.runs.drain(k..).collect();
        for run in &mut tail_runs {
            run.start -= offset;
            run.invalidate();
        }
        let tail_text = self.text.split_off(offset);
        if self.runs.is_empty() {
            if let Some(first) = tail_runs.first() {
                self.runs.push(first.clone_attrs(0, 0));
            }
        }
        if tail_runs.is_empty() {
            if let Some(last) = self.runs.last() {
                tail_runs.push(last.clone_attrs(0, 0));
            }
        }
        let mut style = self.style.clone();
        style.list_index = None;
        let mut tail = Self::from_parts(tail_text, tail_runs, style);
        tail.clear_zero_runs(false);
        self.clear_zero_runs(false);
        self.heal();
        self.invalidate();
        tail
    }

    /// Appends `next` to this paragraph. Its runs are appended as they are;
    /// runs at the seam are not merged.
    ///
    /// An empty paragraph takes the style of `next` along with its text.
    /// Returns `next` unchanged if the joined text would exceed
    /// [`MAX_TEXT_LENGTH`].
    pub fn join(&mut self, next: Self) -> Result<(), Self> {
        if self.text.len() + next.text.len() > MAX_TEXT_LENGTH {
            log::warn!(
                "refusing to join paragraphs of {} and {} code units",
                self.text.len(),
                next.text.len()
            );
            return Err(next);
        }
        self.clear_pending();
        self.invalidate();
        let Self {
            text,
            mut runs,
            style,
            ..
        } = next;
        if text.is_empty() {
            return Ok(());
        }
        for run in &mut runs {
            run.pending = false;
            run.invalidate();
        }
        if self.text.is_empty() {
            self.text = text;
            self.runs = runs;
            self.style = style;
            self.clear_zero_runs(false);
            return Ok(());
        }
        let offset = self.text.len();
        self.clear_zero_runs(false);
        runs.retain(|run| run.len > 0);
        self.runs.extend(runs.into_iter().map(|mut run| {
            run.start += offset;
            run
        }));
        self.text.extend(text);
        self.heal();
        Ok(())
    }

    /// Makes `offset` a run boundary, returning the index of the first run
    /// starting at or after it.
    fn boundary_at(&mut self, offset: usize) -> usize {
        let k = self.runs.partition_point(|run| run.start < offset);
        if k > 0 && self.runs[k - 1].end() > offset {
            split_run(&mut self.runs, k - 1, offset)
        } else {
            k
        }
    }

    /// Applies `attribute` to `start..end`.
    ///
    /// An empty range styles the text typed next at that offset. Setting an
    /// image gives every code point of the range its own run.
    pub fn set_attribute(&mut self, start: usize, end: usize, attribute: &RunAttribute) {
        let start = self.clamp(start);
        let end = self.clamp(end);
        self.invalidate();
        if start >= end {
            if let Some(k) = self.pending_at(start) {
                apply(&mut self.runs[k], attribute);
                return;
            }
            let k = self.style_run_at(start);
            let mut pending = self.runs[k].clone_attrs(start, 0);
            apply(&mut pending, attribute);
            self.clear_pending();
            self.clear_zero_runs(false);
            self.insert_pending(start, pending);
            return;
        }
        self.clear_pending();
        self.clear_zero_runs(false);
        let first = self.boundary_at(start);
        let mut last = self.boundary_at(end);
        if matches!(attribute, RunAttribute::Image(Some(_))) {
            let mut k = first;
            while k < last {
                let run = &self.runs[k];
                let next = util::next_code_point(&self.text, run.start).1;
                if next < run.end() {
                    split_run(&mut self.runs, k, next);
                    last += 1;
                }
                k += 1;
            }
        }
        for run in &mut self.runs[first..last] {
            apply(run, attribute);
            run.invalidate();
        }
        self.clear_zero_runs(false);
    }

    /// Merges adjacent runs with equal attributes and removes zero-length
    /// runs. Idempotent.
    pub fn defrag(&mut self) {
        self.defrag_with(AttributeCompare::InMemory);
    }

    /// [`defrag`](Self::defrag) with an explicit attribute comparison.
    pub fn defrag_with(&mut self, compare: AttributeCompare) {
        self.clear_pending();
        self.defrag_runs(compare, false);
        self.invalidate();
    }

    pub(crate) fn defrag_runs(&mut self, compare: AttributeCompare, keep_pending: bool) {
        let persistent = compare == AttributeCompare::Persistent;
        if self.runs.iter().all(|run| run.len == 0) {
            let keep = self.runs.iter().position(|run| run.pending).unwrap_or(0);
            let run = self.runs.swap_remove(keep);
            self.runs.clear();
            self.runs.push(Run {
                start: 0,
                ..run
            });
            return;
        }
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for mut run in self.runs.drain(..) {
            let keep = keep_pending && run.pending;
            if run.len == 0 && !keep {
                continue;
            }
            run.invalidate();
            if let Some(prev) = merged.last_mut() {
                if !keep && !prev.pending && prev.same_attributes(&run, persistent) {
                    prev.len += run.len;
                    continue;
                }
            }
            merged.push(run);
        }
        self.runs = merged;
    }

    /// Copies `start..end` into a new paragraph with the same paragraph
    /// style.
    pub fn copy_range(&self, start: usize, end: usize) -> Self {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);
        let mut copy = self.clone();
        copy.lines.clear();
        copy.layout_state = None;
        copy.clear_pending();
        let mut middle = copy.split_at(start);
        middle.split_at(end - start);
        middle.style = self.style.clone();
        middle
    }

    /// Inserts another paragraph's styled text at `offset`, returning the
    /// number of code units inserted.
    ///
    /// Adjacent runs that differ only in transient flags are merged
    /// afterwards.
    pub fn paste(&mut self, offset: usize, other: &Self) -> usize {
        let offset = self.clamp(offset);
        let room = MAX_TEXT_LENGTH - self.text.len();
        let count = util::snap_to_code_point(&other.text, other.text.len().min(room));
        if count < other.text.len() {
            log::warn!("dropping {} pasted code units", other.text.len() - count);
        }
        if count == 0 {
            return 0;
        }
        self.clear_pending();
        self.clear_zero_runs(false);
        let at = self.boundary_at(offset);
        for run in &mut self.runs[at..] {
            run.start += count;
        }
        let incoming = other
            .runs
            .iter()
            .filter(|run| run.len > 0 && run.start < count)
            .map(|run| {
                let len = run.len.min(count - run.start);
                run.clone_attrs(run.start + offset, len)
            });
        let tail = self.runs.split_off(at);
        self.runs.extend(incoming);
        self.runs.extend(tail);
        self.text
            .splice(offset..offset, other.text[..count].iter().copied());
        self.clear_zero_runs(false);
        self.defrag_runs(AttributeCompare::Persistent, false);
        self.heal();
        self.invalidate();
        count
    }

    /// Formatting of the text typed at `offset`.
    pub fn attribute_at(&self, offset: usize) -> Option<&RunStyle> {
        self.runs[self.style_run_at(offset.min(self.text.len()))].style()
    }

    /// Exports the character style at `offset`.
    pub fn export_char_style(
        &self,
        offset: usize,
        defaults: &FieldDefaults,
        flatten: bool,
    ) -> CharacterStyle {
        let run = &self.runs[self.style_run_at(offset.min(self.text.len()))];
        CharacterStyle::export(run.style(), run.flags, defaults, flatten)
    }

    /// Flattened style shared by every character of `start..end`. Fields
    /// that vary across the range are `None`.
    pub fn attributes_in(
        &self,
        start: usize,
        end: usize,
        defaults: &FieldDefaults,
    ) -> CharacterStyle {
        let start = start.min(self.text.len());
        let end = end.min(self.text.len());
        let mut overlapping = self
            .runs
            .iter()
            .filter(|run| run.len > 0 && run.start < end && run.end() > start);
        let Some(first) = overlapping.next() else {
            return self.export_char_style(start, defaults, true);
        };
        let mut shared = CharacterStyle::export(first.style(), first.flags, defaults, true);
        for run in overlapping {
            shared.intersect(&CharacterStyle::export(run.style(), run.flags, defaults, true));
        }
        shared
    }

    /// Applies every field set in `style` to `start..end`.
    pub fn import_char_style(&mut self, start: usize, end: usize, style: &CharacterStyle) {
        for attribute in style.attributes() {
            self.set_attribute(start, end, &attribute);
        }
    }

    /// Non-empty runs as text ranges with their formatting.
    pub fn char_style_runs(&self) -> impl Iterator<Item = (Range<usize>, Option<&RunStyle>)> + '_ {
        self.runs
            .iter()
            .filter(|run| run.len > 0)
            .map(|run| (run.text_range(), run.style()))
    }

    /// Transient flags of the character at `offset`.
    pub fn flags_at(&self, offset: usize) -> RunFlags {
        self.runs[self.find_run(offset, true)].flags
    }
}
