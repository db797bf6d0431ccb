// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::persist::{
    load, load_document, load_from, save, save_document, FontTable, FormatVersion, PersistError,
    Reader, Writer,
};
use crate::{
    BaseDirection, FontKey, FontStyle, HAlign, ListStyle, Paragraph, ParagraphStyle,
    RunAttribute, RunStyle, Rgba8, TextAlign,
};

use super::utils::{color, run_ranges, style_of, styled, BLUE, RED};

const VERSIONS: [FormatVersion; 3] = [FormatVersion::V2_7, FormatVersion::V5_5, FormatVersion::V7_0];

fn sample() -> Paragraph {
    let mut paragraph = styled(
        "Hello wide world!",
        &[
            (0..5, color(RED)),
            (0..5, RunAttribute::BackgroundColor(Some(BLUE))),
            (0..2, RunAttribute::Hilite(true)),
            (5..6, RunAttribute::Shift(Some(-2))),
            (6..10, RunAttribute::FontStyle(Some(FontStyle::BOLD))),
            (6..10, RunAttribute::FontSize(Some(18))),
            (11..16, RunAttribute::Link(Some("https://example.com/".into()))),
            (11..16, RunAttribute::Metadata(Some("note".into()))),
            (16..17, RunAttribute::Image(Some("pic".into()))),
        ],
    );
    paragraph.set_style(ParagraphStyle {
        text_align: Some(TextAlign::Center),
        list_style: Some(ListStyle::Disc),
        list_depth: Some(2),
        list_indent: Some(12),
        list_index: Some(3),
        first_indent: Some(-8),
        left_indent: Some(4),
        right_indent: Some(6),
        space_above: Some(1),
        space_below: Some(2),
        tabs: Some(vec![40, 80]),
        tab_alignments: Some(vec![HAlign::Left, HAlign::Right]),
        background_color: Some(BLUE),
        border_color: Some(RED),
        border_width: Some(1),
        padding: Some(3),
        hgrid: Some(true),
        vgrid: Some(false),
        dont_wrap: Some(true),
        hidden: Some(false),
        metadata: Some("para".into()),
        direction: Some(BaseDirection::Rtl),
    });
    paragraph
}

/// The style a paragraph keeps after a round trip through `version`.
fn expected_style(style: &ParagraphStyle, version: FormatVersion) -> ParagraphStyle {
    match version {
        FormatVersion::V2_7 => ParagraphStyle::default(),
        FormatVersion::V5_5 => ParagraphStyle {
            tab_alignments: None,
            direction: None,
            ..style.clone()
        },
        FormatVersion::V7_0 => style.clone(),
    }
}

fn expected_run_style(style: Option<RunStyle>, version: FormatVersion) -> Option<RunStyle> {
    let mut style = style?;
    if version < FormatVersion::V5_5 {
        style.metadata = None;
    }
    (!style.is_empty()).then_some(style)
}

fn round_trip(paragraphs: &[Paragraph], version: FormatVersion) -> Vec<Paragraph> {
    let bytes = save_document(paragraphs, version).expect("save");
    load_document(&bytes, version).expect("load")
}

#[test]
fn documents_round_trip_per_version() {
    let original = sample();
    for version in VERSIONS {
        let loaded = round_trip(&[original.clone()], version);
        assert_eq!(loaded.len(), 1, "{version:?} paragraph count");
        let loaded = &loaded[0];
        assert!(loaded.is_tiled(), "{version:?} tiling");
        assert_eq!(loaded.text(), original.text(), "{version:?} text");
        assert_eq!(
            loaded.style(),
            &expected_style(original.style(), version),
            "{version:?} paragraph style"
        );
        for offset in 0..original.len() {
            assert_eq!(
                style_of(loaded, offset),
                expected_run_style(style_of(&original, offset), version),
                "{version:?} style at {offset}"
            );
            assert_eq!(
                loaded.flags_at(offset).hilited(),
                original.flags_at(offset).hilited(),
                "{version:?} hilite at {offset}"
            );
        }
    }
}

#[test]
fn colors_load_opaque() {
    let translucent = Rgba8 {
        r: 10,
        g: 20,
        b: 30,
        a: 128,
    };
    let opaque = Rgba8 { a: 255, ..translucent };
    let mut original = styled("tint", &[(0..4, color(translucent))]);
    original.set_style(ParagraphStyle {
        background_color: Some(translucent),
        ..ParagraphStyle::default()
    });
    for version in [FormatVersion::V5_5, FormatVersion::V7_0] {
        let loaded = round_trip(&[original.clone()], version);
        assert_eq!(
            style_of(&loaded[0], 0).and_then(|style| style.color),
            Some(opaque),
            "{version:?} run color"
        );
        assert_eq!(
            loaded[0].style().background_color,
            Some(opaque),
            "{version:?} background color"
        );
    }
}

#[test]
fn several_paragraphs_share_a_font_table() {
    let first = styled("one", &[(0..3, RunAttribute::FontSize(Some(18)))]);
    let second = styled("two", &[(0..3, RunAttribute::FontSize(Some(18)))]);
    let third = Paragraph::new("three");
    let loaded = round_trip(&[first, second, third], FormatVersion::V7_0);
    let texts: Vec<String> = loaded.iter().map(Paragraph::to_text_string).collect();
    assert_eq!(texts, ["one", "two", "three"], "paragraph order");
    assert_eq!(
        style_of(&loaded[1], 0).and_then(|style| style.font_size),
        Some(18),
        "font resolved through the shared table"
    );
    assert_eq!(style_of(&loaded[2], 0), None, "plain paragraph");
}

#[test]
fn single_paragraph_with_caller_table() {
    let paragraph = styled("abc", &[(1..2, RunAttribute::FontName(Some("Courier".into())))]);
    let mut fonts = FontTable::new();
    let bytes = save(&paragraph, &mut fonts, FormatVersion::V7_0).unwrap();
    assert_eq!(fonts.len(), 1, "one font interned");
    let loaded = load(&bytes, &fonts, FormatVersion::V7_0).unwrap();
    assert_eq!(
        style_of(&loaded, 1).and_then(|style| style.font_name),
        Some("Courier".into()),
        "family restored"
    );
    assert_eq!(
        style_of(&loaded, 1).and_then(|style| style.font_size),
        None,
        "size still inherited"
    );
}

#[test]
fn legacy_formats_mix_narrow_and_wide_runs() {
    let original = styled("na\u{EF}ve \u{65E5}\u{672C}", &[(6..8, color(RED))]);
    for version in [FormatVersion::V2_7, FormatVersion::V5_5] {
        let loaded = round_trip(&[original.clone()], version);
        assert_eq!(loaded[0].text(), original.text(), "{version:?} text");
        assert_eq!(run_ranges(&loaded[0]), vec![0..6, 6..8], "{version:?} runs");
        assert_eq!(
            style_of(&loaded[0], 7),
            style_of(&original, 7),
            "{version:?} wide run style"
        );
    }

    let unstyled = Paragraph::new("\u{65E5}\u{672C}");
    let loaded = round_trip(&[unstyled.clone()], FormatVersion::V2_7);
    assert_eq!(loaded[0].text(), unstyled.text(), "wide text without styles");
    assert_eq!(style_of(&loaded[0], 0), None, "no style invented");
}

#[test]
fn transient_flags_other_than_hilite_are_not_saved() {
    let mut paragraph = Paragraph::new("ab");
    paragraph.set_attribute(0, 2, &RunAttribute::Visited(true));
    paragraph.set_attribute(0, 2, &RunAttribute::Flagged(true));
    assert!(paragraph.flags_at(0).visited(), "visited in memory");
    let loaded = round_trip(&[paragraph], FormatVersion::V7_0);
    assert!(!loaded[0].flags_at(0).visited(), "visited dropped");
    assert!(!loaded[0].flags_at(0).flagged(), "flagged dropped");
}

#[test]
fn pending_runs_are_not_saved() {
    let mut paragraph = styled("abcd", &[(2..4, color(RED))]);
    paragraph.delete_range(2, 4, crate::StylingMode::FromAfter);
    let loaded = round_trip(&[paragraph], FormatVersion::V7_0);
    assert_eq!(run_ranges(&loaded[0]), vec![0..2], "one plain run");
}

fn v7_header(writer: &mut Writer, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    writer.u8(1);
    writer.u32(units.len() as u32);
    for unit in units {
        writer.u16(unit);
    }
}

#[test]
fn run_lengths_are_clamped_to_the_text() {
    let mut writer = Writer::new();
    v7_header(&mut writer, "abc");
    writer.u8(3);
    writer.u32(1 << 14);
    writer.color(RED);
    writer.u16(0);
    writer.u16(10);
    let loaded = load(writer.as_bytes(), &FontTable::new(), FormatVersion::V7_0).unwrap();
    assert_eq!(run_ranges(&loaded), vec![0..3], "clamped");
    assert_eq!(
        style_of(&loaded, 2).and_then(|style| style.color),
        Some(RED),
        "style kept"
    );
}

#[test]
fn uncovered_text_extends_the_last_run() {
    let mut writer = Writer::new();
    v7_header(&mut writer, "abcdef");
    writer.u8(3);
    writer.u32(1 << 14);
    writer.color(RED);
    writer.u16(0);
    writer.u16(2);
    let loaded = load(writer.as_bytes(), &FontTable::new(), FormatVersion::V7_0).unwrap();
    assert!(loaded.is_tiled(), "healed");
    assert_eq!(run_ranges(&loaded), vec![0..6], "last run covers the rest");
}

#[test]
fn out_of_range_font_uses_the_default() {
    let mut writer = Writer::new();
    v7_header(&mut writer, "abc");
    writer.u8(3);
    writer.u32(1 << 3);
    writer.u16(5);
    writer.u16(0);
    writer.u16(3);
    let loaded = load(writer.as_bytes(), &FontTable::new(), FormatVersion::V7_0).unwrap();
    let style = style_of(&loaded, 0).expect("font fields set");
    let default = FontKey::default();
    assert_eq!(style.font_name, Some(default.family), "default family");
    assert_eq!(style.font_size, Some(default.size), "default size");
    assert_eq!(style.font_style, Some(default.style), "default style");
}

#[test]
fn extended_run_skips_unknown_fields() {
    let mut writer = Writer::new();
    v7_header(&mut writer, "abc");
    writer.u8(4);
    // Flags, the metadata string and three bytes from a newer writer.
    writer.u16(4 + 7 + 3);
    writer.u32(1 << 15);
    writer.u16(5);
    writer.bytes(b"meta\0");
    writer.bytes(&[0xAA, 0xBB, 0xCC]);
    writer.u16(0);
    writer.u16(3);
    let loaded = load(writer.as_bytes(), &FontTable::new(), FormatVersion::V7_0).unwrap();
    assert_eq!(run_ranges(&loaded), vec![0..3], "run decoded after the skip");
    assert_eq!(
        style_of(&loaded, 0).and_then(|style| style.metadata).as_deref(),
        Some("meta"),
        "known field read"
    );
}

#[test]
fn unknown_tag_ends_the_paragraph() {
    let mut writer = Writer::new();
    v7_header(&mut writer, "ab");
    let end = writer.as_bytes().len();
    writer.u8(9);
    writer.u32(0xDEAD_BEEF);
    let mut reader = Reader::new(writer.as_bytes());
    let loaded = load_from(&mut reader, &FontTable::new(), FormatVersion::V7_0).unwrap();
    assert_eq!(loaded.to_text_string(), "ab", "text read");
    assert_eq!(reader.position(), end, "stopped at the unknown record");
}

#[test]
fn unexpected_first_record_is_an_error() {
    let result = load(&[9, 0, 0], &FontTable::new(), FormatVersion::V7_0);
    assert_eq!(result.unwrap_err(), PersistError::UnexpectedRecord(9), "wrong tag");
    assert_eq!(
        PersistError::UnexpectedRecord(9).to_string(),
        "unexpected record tag 9",
        "display"
    );
}

#[test]
fn truncated_data_is_an_error() {
    let mut fonts = FontTable::new();
    let bytes = save(&sample(), &mut fonts, FormatVersion::V7_0).unwrap();
    // Inside the last run record, then inside the text.
    for len in [bytes.len() - 1, bytes.len() - 3, 20] {
        assert_eq!(
            load(&bytes[..len], &fonts, FormatVersion::V7_0).unwrap_err(),
            PersistError::UnexpectedEof,
            "cut to {len} bytes"
        );
    }
    let document = save_document(&[sample()], FormatVersion::V7_0).unwrap();
    assert_eq!(
        load_document(&document[..1], FormatVersion::V7_0).unwrap_err(),
        PersistError::UnexpectedEof,
        "cut inside the font table"
    );
}

#[test]
fn legacy_text_is_limited_to_u16_bytes() {
    let long = Paragraph::from_utf16(vec![u16::from(b'a'); 70_000]);
    assert_eq!(
        save_document(&[long.clone()], FormatVersion::V5_5).unwrap_err(),
        PersistError::TooLarge,
        "too long for a legacy record"
    );
    let loaded = round_trip(&[long], FormatVersion::V7_0);
    assert_eq!(loaded[0].len(), 70_000, "fits the unicode format");
}
