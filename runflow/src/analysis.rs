// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Break opportunity and grapheme analysis.
//!
//! Line breaking uses a deliberately small classification: a code point is
//! either ideographic or not, and may prohibit a break before or after
//! itself. Breaks between two non-ideographic code points only happen after
//! whitespace.

use alloc::vec::Vec;

use icu_properties::props::LineBreak;
use icu_properties::CodePointMapData;
use icu_segmenter::GraphemeClusterSegmenter;

use crate::util;

/// Classification bits for a single code point.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) struct BreakClass(u8);

impl BreakClass {
    const IDEOGRAPHIC: u8 = 1 << 0;
    const PROHIBIT_BEFORE: u8 = 1 << 1;
    const PROHIBIT_AFTER: u8 = 1 << 2;

    pub(crate) fn of(cp: u32) -> Self {
        let lb = CodePointMapData::<LineBreak>::new().get32(cp);
        let mut bits = 0;
        if matches!(
            lb,
            LineBreak::Ideographic
                | LineBreak::H2
                | LineBreak::H3
                | LineBreak::JL
                | LineBreak::JV
                | LineBreak::JT
                | LineBreak::ConditionalJapaneseStarter
        ) {
            bits |= Self::IDEOGRAPHIC;
        }
        if matches!(
            lb,
            LineBreak::ClosePunctuation
                | LineBreak::CloseParenthesis
                | LineBreak::Exclamation
                | LineBreak::Nonstarter
                | LineBreak::Glue
                | LineBreak::WordJoiner
                | LineBreak::ConditionalJapaneseStarter
                | LineBreak::PostfixNumeric
        ) {
            bits |= Self::PROHIBIT_BEFORE;
        }
        if matches!(
            lb,
            LineBreak::OpenPunctuation
                | LineBreak::Glue
                | LineBreak::WordJoiner
                | LineBreak::PrefixNumeric
        ) {
            bits |= Self::PROHIBIT_AFTER;
        }
        Self(bits)
    }

    pub(crate) fn is_ideographic(self) -> bool {
        self.0 & Self::IDEOGRAPHIC != 0
    }

    pub(crate) fn prohibits_before(self) -> bool {
        self.0 & Self::PROHIBIT_BEFORE != 0
    }

    pub(crate) fn prohibits_after(self) -> bool {
        self.0 & Self::PROHIBIT_AFTER != 0
    }
}

fn is_no_break_space(cp: u32) -> bool {
    matches!(cp, 0xA0 | 0x2007 | 0x202F)
}

/// Returns `true` if a line may break between code points `before` and
/// `after`.
pub(crate) fn can_break_between(before: u32, after: u32) -> bool {
    if is_no_break_space(after) {
        return false;
    }
    if util::is_latin_space(before) || before == u32::from(util::LINE_SEPARATOR) {
        return true;
    }
    let before = BreakClass::of(before);
    let after = BreakClass::of(after);
    if !before.is_ideographic() && !after.is_ideographic() {
        return false;
    }
    !before.prohibits_after() && !after.prohibits_before()
}

/// Returns `true` if the text may break at `index`.
///
/// The end of the text is always a break opportunity; the start never is.
/// Indices inside a surrogate pair are not opportunities.
pub(crate) fn is_break_opportunity(text: &[u16], index: usize) -> bool {
    if index == 0 {
        return false;
    }
    if index >= text.len() {
        return true;
    }
    if util::is_low_surrogate(text[index]) && util::is_high_surrogate(text[index - 1]) {
        return false;
    }
    let (before, _) = util::prev_code_point(text, index);
    let (after, _) = util::next_code_point(text, index);
    can_break_between(before, after)
}

/// Grapheme cluster boundaries of `text`, including `0` and `text.len()`.
pub(crate) fn grapheme_boundaries(text: &[u16]) -> Vec<usize> {
    if text.is_empty() {
        return alloc::vec![0];
    }
    GraphemeClusterSegmenter::new().segment_utf16(text).collect()
}
