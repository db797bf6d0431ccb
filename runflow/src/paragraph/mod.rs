// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paragraph: text buffer, style runs and the lines laid out from them.

mod edit;
mod geometry;
mod navigate;

use alloc::string::String;
use alloc::vec::Vec;

use crate::layout::Line;
use crate::run::Run;
use crate::style::{BaseDirection, ParagraphStyle};
use crate::util;

pub use edit::{AttributeCompare, StylingMode};

/// A paragraph of styled text.
///
/// The runs always tile `0..len()` contiguously. Edits mark the paragraph
/// as needing layout; geometry queries lay it out again on demand.
#[derive(Clone, Debug)]
pub struct Paragraph {
    pub(crate) text: Vec<u16>,
    pub(crate) runs: Vec<Run>,
    pub(crate) style: ParagraphStyle,
    pub(crate) lines: Vec<Line>,
    pub(crate) needs_layout: bool,
    pub(crate) layout_state: Option<LayoutState>,
}

/// What the current lines were computed from.
#[derive(Clone, Debug, Default)]
pub(crate) struct LayoutState {
    pub(crate) direction: BaseDirection,
    pub(crate) wrap_width: f32,
    pub(crate) boundaries: Vec<usize>,
    /// Vertical span of lines dropped since the last clean.
    pub(crate) removed: Option<(f32, f32)>,
    pub(crate) height: f32,
    pub(crate) width: f32,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::from_utf16(Vec::new())
    }
}

impl Paragraph {
    /// Creates an unstyled paragraph holding `text`.
    pub fn new(text: &str) -> Self {
        Self::from_utf16(util::encode_str(text))
    }

    /// Creates an unstyled paragraph from UTF-16 code units.
    ///
    /// Text longer than [`MAX_TEXT_LENGTH`](crate::MAX_TEXT_LENGTH) is
    /// truncated.
    pub fn from_utf16(mut text: Vec<u16>) -> Self {
        if text.len() > crate::MAX_TEXT_LENGTH {
            log::warn!("truncating paragraph of {} code units", text.len());
            let cut = util::snap_to_code_point(&text, crate::MAX_TEXT_LENGTH);
            text.truncate(cut);
        }
        let runs = alloc::vec![Run::new(0, text.len())];
        Self {
            text,
            runs,
            style: ParagraphStyle::default(),
            lines: Vec::new(),
            needs_layout: true,
            layout_state: None,
        }
    }

    /// Builds a paragraph from parts, healing runs that do not tile the text.
    pub(crate) fn from_parts(text: Vec<u16>, runs: Vec<Run>, style: ParagraphStyle) -> Self {
        let mut paragraph = Self {
            text,
            runs,
            style,
            lines: Vec::new(),
            needs_layout: true,
            layout_state: None,
        };
        paragraph.heal();
        paragraph
    }

    /// The text as UTF-16 code units.
    pub fn text(&self) -> &[u16] {
        &self.text
    }

    /// The text as a `String`, with unpaired surrogates replaced.
    pub fn to_text_string(&self) -> String {
        char::decode_utf16(self.text.iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// Length in code units.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns `true` if the paragraph holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The style runs in logical order.
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Paragraph-level attributes.
    pub fn style(&self) -> &ParagraphStyle {
        &self.style
    }

    /// Replaces the paragraph-level attributes.
    pub fn set_style(&mut self, style: ParagraphStyle) {
        self.style = style;
        self.invalidate();
    }

    /// Applies every attribute set in `style`, keeping the rest.
    pub fn import_style(&mut self, style: &ParagraphStyle) {
        self.style.import(style);
        self.invalidate();
    }

    /// Lines from the last layout pass. Empty before the first pass.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Returns `true` if an edit happened since the last layout pass.
    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub(crate) fn invalidate(&mut self) {
        self.needs_layout = true;
    }

    /// Returns `true` if the runs tile the text without gaps or overlaps.
    pub fn is_tiled(&self) -> bool {
        let mut offset = 0;
        for run in &self.runs {
            if run.start != offset {
                return false;
            }
            offset = run.end();
        }
        !self.runs.is_empty() && offset == self.text.len()
    }

    /// Restores the tiling invariant.
    ///
    /// Runs are laid end to end in order, lengths are clamped to the text,
    /// and a missing tail is covered by extending the last run. An empty run
    /// list becomes one unstyled run over the whole text.
    pub(crate) fn heal(&mut self) {
        if self.runs.is_empty() {
            self.runs.push(Run::new(0, self.text.len()));
            return;
        }
        if self.is_tiled() {
            return;
        }
        log::warn!("healing runs that do not tile {} code units", self.text.len());
        let len = self.text.len();
        let mut offset = 0;
        for run in &mut self.runs {
            run.start = offset;
            run.len = run.len.min(len - offset);
            offset += run.len;
        }
        if offset < len {
            if let Some(last) = self.runs.last_mut() {
                last.len += len - offset;
            }
        }
        self.clear_zero_runs(false);
    }

    /// Removes zero-length runs unless one is the only run. With
    /// `keep_pending`, the pending style run survives.
    pub(crate) fn clear_zero_runs(&mut self, keep_pending: bool) {
        if self.runs.len() <= 1 {
            return;
        }
        if self.runs.iter().all(|run| run.len == 0) {
            let keep = self.runs.iter().position(|run| run.pending).unwrap_or(0);
            let run = self.runs.swap_remove(keep);
            self.runs.clear();
            self.runs.push(run);
            return;
        }
        self.runs
            .retain(|run| run.len > 0 || (keep_pending && run.pending));
    }

    /// Drops the pending flag from every run.
    pub(crate) fn clear_pending(&mut self) {
        for run in &mut self.runs {
            run.pending = false;
        }
    }
}
