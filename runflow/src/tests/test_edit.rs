// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    BaseDirection, FieldDefaults, FontStyle, Paragraph, ParagraphStyle, RunAttribute, RunStyle, StylingMode,
    MAX_TEXT_LENGTH,
};

use super::utils::{color, run_ranges, style_of, style_runs, styled, TestHost, BLUE, RED};

fn colored(c: crate::Rgba8) -> Option<RunStyle> {
    Some(RunStyle {
        color: Some(c),
        ..RunStyle::default()
    })
}

#[test]
fn insert_extends_the_run_before() {
    let mut paragraph = styled("hello", &[(0..5, color(RED))]);
    assert_eq!(paragraph.insert_text(5, " world"), 6, "inserted units");
    assert_eq!(paragraph.to_text_string(), "hello world");
    assert_eq!(
        style_runs(&paragraph),
        vec![(0..11, colored(RED))],
        "appended text continues the run"
    );

    let mut paragraph = styled("abcd", &[(0..2, color(RED))]);
    paragraph.insert_text(2, "X");
    assert_eq!(style_of(&paragraph, 2), colored(RED), "boundary insert styles from before");
    paragraph.insert_text(0, "Y");
    assert_eq!(style_of(&paragraph, 0), colored(RED), "insert at start takes the first run");
    assert!(paragraph.needs_layout(), "edits invalidate layout");
}

#[test]
fn runs_tile_through_edits() {
    let host = TestHost::wrapping(7.0, 60.0);
    let mut paragraph = Paragraph::new("The quick brown fox jumps over the lazy dog");
    let modes = [StylingMode::FromBefore, StylingMode::FromAfter, StylingMode::None];
    let mut seed = 0x2545_f491_u32;
    let mut next = |bound: usize| {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (seed >> 16) as usize % bound.max(1)
    };
    for step in 0..300 {
        let len = paragraph.len();
        let a = next(len + 1);
        let b = next(len + 1);
        let (start, end) = (a.min(b), a.max(b));
        match next(6) {
            0 => {
                paragraph.insert_text(a, "xy ");
            }
            1 => paragraph.delete_range(start, end, modes[next(3)]),
            2 => {
                let c = if step % 2 == 0 { RED } else { BLUE };
                paragraph.set_attribute(start, end, &color(c));
            }
            3 => {
                let tail = paragraph.split_at(a);
                assert!(tail.is_tiled(), "tail tiles at step {step}");
                assert!(paragraph.join(tail).is_ok(), "join at step {step}");
            }
            4 => paragraph.defrag(),
            _ => {
                paragraph.layout(&host, false);
            }
        }
        assert!(paragraph.is_tiled(), "runs tile after step {step}");
        assert!(
            paragraph.runs().iter().filter(|run| run.is_empty()).count() <= 1,
            "at most one zero-length run after step {step}: {:?}",
            run_ranges(&paragraph)
        );
    }
}

#[test]
fn deletion_styling_modes() {
    // "ab" blue, "cd" red, "ef" unstyled. Delete "cd", then type "X".
    let cases = [
        (StylingMode::FromBefore, colored(BLUE)),
        (StylingMode::FromAfter, colored(RED)),
        (StylingMode::None, None),
    ];
    for (mode, expected) in cases {
        let mut paragraph = styled("abcdef", &[(0..2, color(BLUE)), (2..4, color(RED))]);
        paragraph.delete_range(2, 4, mode);
        assert_eq!(paragraph.to_text_string(), "abef", "{mode:?} text");
        assert!(paragraph.is_tiled(), "{mode:?} tiling");
        assert_eq!(
            paragraph.attribute_at(2).cloned(),
            expected,
            "{mode:?} pending style"
        );
        paragraph.insert_text(2, "X");
        assert_eq!(paragraph.to_text_string(), "abXef", "{mode:?} text after typing");
        assert_eq!(style_of(&paragraph, 2), expected, "{mode:?} typed style");
        assert_eq!(style_of(&paragraph, 1), colored(BLUE), "{mode:?} left neighbor");
        assert_eq!(style_of(&paragraph, 3), None, "{mode:?} right neighbor");
    }
}

#[test]
fn deleting_everything_keeps_a_run() {
    let mut paragraph = styled("abc", &[(0..3, color(RED))]);
    paragraph.delete_range(0, 3, StylingMode::FromAfter);
    assert!(paragraph.is_empty(), "text removed");
    assert_eq!(paragraph.runs().len(), 1, "one run survives");
    paragraph.insert_text(0, "z");
    assert_eq!(style_of(&paragraph, 0), colored(RED), "style survives");
}

#[test]
fn split_then_join_is_identity() {
    let original = styled("abcdef", &[(2..4, color(RED))]);
    for k in 0..=original.len() {
        let mut head = original.clone();
        let tail = head.split_at(k);
        assert_eq!(head.len(), k, "head length at {k}");
        assert_eq!(tail.len(), 6 - k, "tail length at {k}");
        assert!(head.is_tiled() && tail.is_tiled(), "both sides tile at {k}");
        assert!(head.join(tail).is_ok(), "join at {k}");
        assert_eq!(head.text(), original.text(), "text at {k}");
        head.defrag();
        assert_eq!(style_runs(&head), style_runs(&original), "runs at {k}");
    }
}

#[test]
fn join_keeps_runs_at_the_seam() {
    let host = TestHost::new(10.0);
    let tabbed = Paragraph::new("ab\tcd");
    let mut mixed = Paragraph::new("ab \u{5D0}\u{5D1}");
    mixed.set_style(ParagraphStyle {
        direction: Some(BaseDirection::Ltr),
        ..ParagraphStyle::default()
    });
    for mut paragraph in [tabbed, mixed] {
        paragraph.layout(&host, false);
        let laid_out = run_ranges(&paragraph);
        assert_eq!(laid_out, [0..3, 3..5], "layout splits {:?}", paragraph.to_text_string());
        let tail = paragraph.split_at(3);
        assert!(paragraph.join(tail).is_ok(), "join");
        assert_eq!(run_ranges(&paragraph), laid_out, "runs survive the round trip");
    }
}

#[test]
fn join_into_an_empty_paragraph_takes_the_style() {
    let mut empty = Paragraph::new("");
    let mut next = Paragraph::new("\u{5D0}\u{5D1}");
    next.set_style(ParagraphStyle {
        direction: Some(BaseDirection::Rtl),
        space_above: Some(6),
        ..ParagraphStyle::default()
    });
    assert!(empty.join(next).is_ok(), "join");
    assert_eq!(empty.len(), 2, "text adopted");
    assert_eq!(empty.style().direction, Some(BaseDirection::Rtl), "direction adopted");
    assert_eq!(empty.style().space_above, Some(6), "spacing adopted");
}

#[test]
fn split_tail_drops_list_index() {
    let mut paragraph = Paragraph::new("one two");
    let mut style = paragraph.style().clone();
    style.list_index = Some(3);
    style.left_indent = Some(10);
    paragraph.set_style(style);
    let tail = paragraph.split_at(4);
    assert_eq!(tail.style().list_index, None, "list index not copied");
    assert_eq!(tail.style().left_indent, Some(10), "other fields copied");
}

#[test]
fn join_refuses_to_exceed_the_cap() {
    let mut paragraph = Paragraph::from_utf16(vec![u16::from(b'a'); MAX_TEXT_LENGTH - 1]);
    let next = Paragraph::new("xy");
    let refused = paragraph.join(next).expect_err("join over the cap");
    assert_eq!(refused.to_text_string(), "xy", "the refused paragraph comes back");
    assert_eq!(paragraph.len(), MAX_TEXT_LENGTH - 1, "receiver unchanged");
}

#[test]
fn insert_truncates_at_the_cap() {
    let mut paragraph = Paragraph::from_utf16(vec![u16::from(b'a'); MAX_TEXT_LENGTH - 2]);
    assert_eq!(paragraph.insert_text(0, "xyz"), 2, "only two units fit");
    assert_eq!(paragraph.len(), MAX_TEXT_LENGTH, "at the cap");
    assert_eq!(paragraph.insert_text(0, "w"), 0, "nothing fits");

    let mut paragraph = Paragraph::from_utf16(vec![u16::from(b'a'); MAX_TEXT_LENGTH - 1]);
    assert_eq!(
        paragraph.insert_text(0, "\u{1F600}"),
        0,
        "half a surrogate pair is never inserted"
    );
}

#[test]
fn empty_range_styles_the_next_insertion() {
    let mut paragraph = Paragraph::new("ab");
    paragraph.set_attribute(1, 1, &color(RED));
    assert_eq!(paragraph.attribute_at(1).cloned(), colored(RED), "pending style");
    assert_eq!(style_of(&paragraph, 0), None, "existing text untouched");
    paragraph.insert_text(1, "X");
    assert_eq!(paragraph.to_text_string(), "aXb");
    assert_eq!(
        style_runs(&paragraph),
        vec![(0..1, None), (1..2, colored(RED)), (2..3, None)],
        "typed text picks up the pending style"
    );
}

#[test]
fn pending_style_accumulates() {
    let mut paragraph = Paragraph::new("ab");
    paragraph.set_attribute(2, 2, &color(RED));
    paragraph.set_attribute(2, 2, &RunAttribute::FontStyle(Some(FontStyle::BOLD)));
    paragraph.insert_text(2, "c");
    let style = style_of(&paragraph, 2).expect("styled");
    assert_eq!(style.color, Some(RED), "color kept");
    assert_eq!(style.font_style, Some(FontStyle::BOLD), "bold added");
}

#[test]
fn image_gives_each_code_point_a_run() {
    let mut paragraph = Paragraph::new("abc");
    paragraph.set_attribute(0, 3, &RunAttribute::Image(Some("pic".into())));
    assert_eq!(run_ranges(&paragraph), vec![0..1, 1..2, 2..3], "one run per code point");
    paragraph.defrag();
    assert_eq!(paragraph.runs().len(), 3, "image runs never merge");
    assert!(
        paragraph.runs().iter().all(|run| run.image() == Some("pic")),
        "every run carries the image"
    );
}

#[test]
fn typing_after_an_image_does_not_extend_it() {
    let mut paragraph = Paragraph::new("abc");
    paragraph.set_attribute(1, 2, &RunAttribute::Image(Some("pic".into())));
    paragraph.insert_text(2, "X");
    assert_eq!(paragraph.to_text_string(), "abXc");
    assert_eq!(paragraph.runs()[1].image(), Some("pic"), "image run kept");
    assert_eq!(paragraph.runs()[1].len(), 1, "image run not grown");
    assert_eq!(
        style_of(&paragraph, 2).and_then(|style| style.image),
        None,
        "typed text has no image"
    );
}

#[test]
fn copy_and_paste_keep_styles() {
    let paragraph = styled("hello world", &[(0..5, color(RED))]);
    let copy = paragraph.copy_range(3, 8);
    assert_eq!(copy.to_text_string(), "lo wo");
    assert_eq!(
        style_runs(&copy),
        vec![(0..2, colored(RED)), (2..5, None)],
        "copied runs"
    );

    let mut target = Paragraph::new("AB");
    assert_eq!(target.paste(1, &copy), 5, "pasted units");
    assert_eq!(target.to_text_string(), "Alo woB");
    assert_eq!(
        style_runs(&target),
        vec![(0..1, None), (1..3, colored(RED)), (3..7, None)],
        "pasted runs merge with equal neighbors"
    );
}

#[test]
fn paste_merges_runs_differing_in_flags() {
    let mut source = styled("ab", &[(0..2, color(RED))]);
    source.set_attribute(0, 1, &RunAttribute::Hilite(true));
    let mut target = styled("xy", &[(0..2, color(RED))]);
    target.paste(2, &source);
    assert_eq!(
        style_runs(&target),
        vec![(0..4, colored(RED))],
        "hilite is not persistent"
    );
}

#[test]
fn range_attributes_report_mixed_values() {
    let defaults = FieldDefaults::default();
    let paragraph = styled("abcd", &[(0..2, color(RED)), (2..4, color(BLUE))]);
    let mixed = paragraph.attributes_in(0, 4, &defaults);
    assert_eq!(mixed.style.color, None, "colors differ");
    assert_eq!(mixed.style.font_size, Some(12), "sizes agree");
    let left = paragraph.attributes_in(0, 2, &defaults);
    assert_eq!(left.style.color, Some(RED), "one color");
}

#[test]
fn export_omits_inherited_values() {
    let defaults = FieldDefaults::default();
    let paragraph = styled(
        "ab",
        &[(0..2, RunAttribute::FontSize(Some(12))), (0..2, color(RED))],
    );
    let exported = paragraph.export_char_style(1, &defaults, false);
    assert_eq!(exported.style.font_size, None, "default size left out");
    assert_eq!(exported.style.color, Some(RED), "color kept");
    assert_eq!(exported.hilited, None, "flags left out");

    let flat = paragraph.export_char_style(1, &defaults, true);
    assert_eq!(flat.style.font_size, Some(12), "flattened size");
    assert_eq!(flat.style.font_name.as_deref(), Some("Helvetica"), "flattened family");
    assert_eq!(flat.hilited, Some(false), "flattened flags");

    let mut target = Paragraph::new("xy");
    target.import_char_style(0, 2, &exported);
    assert_eq!(style_of(&target, 0), colored(RED), "imported color");
}

#[test]
fn find_run_breaks_ties_by_direction() {
    let paragraph = styled("abcd", &[(0..2, color(RED))]);
    assert_eq!(paragraph.find_run(2, true), 1, "forward takes the run starting there");
    assert_eq!(paragraph.find_run(2, false), 0, "backward takes the run ending there");
    assert_eq!(paragraph.find_run(1, false), 0, "inside a run");
    assert_eq!(paragraph.find_run(99, true), 1, "past the end clamps");
}

#[test]
fn paragraph_style_export_and_import() {
    let defaults = FieldDefaults::default();
    let mut paragraph = Paragraph::new("text");
    paragraph.set_style(ParagraphStyle {
        left_indent: Some(0),
        right_indent: Some(9),
        ..ParagraphStyle::default()
    });

    let exported = paragraph.style().export(&defaults, false);
    assert_eq!(exported.left_indent, None, "inherited value left out");
    assert_eq!(exported.right_indent, Some(9), "override kept");
    let flat = paragraph.style().export(&defaults, true);
    assert_eq!(flat.list_indent, Some(16), "flattened from the defaults");
    assert_eq!(flat.right_indent, Some(9), "override wins");

    let mut other = Paragraph::new("other");
    other.set_style(ParagraphStyle {
        space_above: Some(4),
        ..ParagraphStyle::default()
    });
    other.import_style(&exported);
    assert_eq!(other.style().right_indent, Some(9), "imported field");
    assert_eq!(other.style().space_above, Some(4), "unset fields keep their value");
    assert!(other.needs_layout(), "import invalidates");
}
