// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! UTF-16 helpers shared by editing, fitting and caret code.

pub(crate) const TAB: u16 = 0x09;
pub(crate) const LINE_TABULATION: u16 = 0x0B;
pub(crate) const LINE_SEPARATOR: u16 = 0x2028;
pub(crate) const REPLACEMENT: u32 = 0xFFFD;

#[inline]
pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

#[inline]
pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

/// Decodes the code point starting at `index`, returning it together with the
/// index of the following code point.
///
/// Unpaired surrogates decode to U+FFFD and occupy a single unit.
pub(crate) fn next_code_point(text: &[u16], index: usize) -> (u32, usize) {
    let unit = text[index];
    if is_high_surrogate(unit) {
        if let Some(&low) = text.get(index + 1) {
            if is_low_surrogate(low) {
                let cp = 0x10000 + (((u32::from(unit) - 0xD800) << 10) | (u32::from(low) - 0xDC00));
                return (cp, index + 2);
            }
        }
        return (REPLACEMENT, index + 1);
    }
    if is_low_surrogate(unit) {
        return (REPLACEMENT, index + 1);
    }
    (u32::from(unit), index + 1)
}

/// Decodes the code point ending at `index`, returning it together with its
/// starting index.
pub(crate) fn prev_code_point(text: &[u16], index: usize) -> (u32, usize) {
    let unit = text[index - 1];
    if is_low_surrogate(unit) && index >= 2 && is_high_surrogate(text[index - 2]) {
        return next_code_point(text, index - 2);
    }
    (next_code_point(text, index - 1).0, index - 1)
}

/// Moves `index` back so it does not point into the middle of a surrogate
/// pair.
pub(crate) fn snap_to_code_point(text: &[u16], index: usize) -> usize {
    let index = index.min(text.len());
    if index > 0
        && index < text.len()
        && is_low_surrogate(text[index])
        && is_high_surrogate(text[index - 1])
    {
        index - 1
    } else {
        index
    }
}

pub(crate) fn to_char(cp: u32) -> char {
    char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Whitespace in the Latin-1 range, matching the C locale's `isspace`.
#[inline]
pub(crate) fn is_latin_space(cp: u32) -> bool {
    matches!(cp, 0x20 | 0x09..=0x0D)
}

#[inline]
pub(crate) fn is_line_break(unit: u16) -> bool {
    unit == LINE_TABULATION || unit == LINE_SEPARATOR
}

/// Characters that never contribute measured width.
#[inline]
pub(crate) fn is_control(unit: u16) -> bool {
    unit < 0x20 || unit == LINE_SEPARATOR || unit == 0x2029
}

/// Characters that may hang past the wrap width at the end of a line.
#[inline]
pub(crate) fn is_trailing_space(unit: u16) -> bool {
    is_latin_space(u32::from(unit)) || unit == LINE_SEPARATOR
}

/// Returns `end` moved back over trailing whitespace, but never before
/// `start`.
pub(crate) fn trim_trailing_spaces(text: &[u16], start: usize, mut end: usize) -> usize {
    while end > start && is_trailing_space(text[end - 1]) {
        end -= 1;
    }
    end
}

/// Word characters for word-wise navigation.
pub(crate) fn is_word_char(cp: u32) -> bool {
    let ch = to_char(cp);
    ch.is_alphanumeric() || ch == '_' || ch == '\''
}

pub(crate) fn encode_str(text: &str) -> alloc::vec::Vec<u16> {
    text.encode_utf16().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrogate_pairs_decode_as_one_code_point() {
        let text = encode_str("a\u{1F600}b");
        assert_eq!(next_code_point(&text, 1), (0x1F600, 3), "pair decodes forward");
        assert_eq!(prev_code_point(&text, 3), (0x1F600, 1), "pair decodes backward");
        assert_eq!(snap_to_code_point(&text, 2), 1, "index inside pair snaps back");
    }

    #[test]
    fn unpaired_surrogate_is_replacement() {
        let text = [0xD800_u16, 0x41];
        assert_eq!(next_code_point(&text, 0), (REPLACEMENT, 1), "lone high surrogate");
    }

    #[test]
    fn trims_only_latin_space() {
        let text = encode_str("ab \u{a0} \t");
        assert_eq!(trim_trailing_spaces(&text, 0, text.len()), 4, "NBSP is kept");
    }
}
