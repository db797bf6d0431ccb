// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph-level bidi resolution.

use alloc::vec;
use alloc::vec::Vec;

use unicode_bidi::{bidi_class, BidiClass, Level};

use crate::style::BaseDirection;
use crate::util;

/// Finds the direction of the first strong character outside of isolates.
///
/// Returns `None` when the text has no strong character.
pub(crate) fn first_strong_direction(text: &[u16]) -> Option<BaseDirection> {
    let mut isolate_depth = 0_usize;
    let mut index = 0;
    while index < text.len() {
        let (cp, next) = util::next_code_point(text, index);
        index = next;
        match bidi_class(util::to_char(cp)) {
            BidiClass::LRI | BidiClass::RLI | BidiClass::FSI => isolate_depth += 1,
            BidiClass::PDI => isolate_depth = isolate_depth.saturating_sub(1),
            BidiClass::L if isolate_depth == 0 => return Some(BaseDirection::Ltr),
            BidiClass::R | BidiClass::AL if isolate_depth == 0 => {
                return Some(BaseDirection::Rtl);
            }
            _ => {}
        }
    }
    None
}

/// Resolves `direction` against the text, turning `Auto` into a concrete
/// direction.
pub(crate) fn resolve_direction(text: &[u16], direction: BaseDirection) -> BaseDirection {
    match direction {
        BaseDirection::Auto => first_strong_direction(text).unwrap_or(BaseDirection::Ltr),
        concrete => concrete,
    }
}

fn needs_resolution(text: &[u16]) -> bool {
    let mut index = 0;
    while index < text.len() {
        let (cp, next) = util::next_code_point(text, index);
        index = next;
        if cp < 0x0590 {
            continue;
        }
        if matches!(
            bidi_class(util::to_char(cp)),
            BidiClass::R
                | BidiClass::AL
                | BidiClass::AN
                | BidiClass::RLE
                | BidiClass::RLO
                | BidiClass::RLI
                | BidiClass::FSI
                | BidiClass::LRE
                | BidiClass::LRO
                | BidiClass::LRI
        ) {
            return true;
        }
    }
    false
}

/// Resolves one embedding level per code unit.
///
/// `direction` must already be concrete.
pub(crate) fn resolve_levels(text: &[u16], direction: BaseDirection) -> Vec<u8> {
    let rtl = direction == BaseDirection::Rtl;
    if !rtl && !needs_resolution(text) {
        return vec![0; text.len()];
    }
    let base = if rtl { Level::rtl() } else { Level::ltr() };
    unicode_bidi::utf16::BidiInfo::new(text, Some(base))
        .levels
        .iter()
        .map(|level| level.number())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::encode_str;

    #[test]
    fn first_strong_skips_isolates() {
        let text = encode_str("\u{2067}abc\u{2069}\u{5D0}");
        assert_eq!(
            first_strong_direction(&text),
            Some(BaseDirection::Rtl),
            "Latin inside the isolate is ignored"
        );
        assert_eq!(first_strong_direction(&encode_str("123 ")), None, "no strong character");
    }

    #[test]
    fn latin_text_takes_fast_path() {
        let levels = resolve_levels(&encode_str("abc"), BaseDirection::Ltr);
        assert_eq!(levels, [0, 0, 0], "plain Latin is all level 0");
    }

    #[test]
    fn hebrew_then_latin_in_rtl_paragraph() {
        let levels = resolve_levels(&encode_str("\u{5D0}\u{5D1}C"), BaseDirection::Rtl);
        assert_eq!(levels, [1, 1, 2], "Latin embeds at level 2 inside an RTL paragraph");
    }
}
