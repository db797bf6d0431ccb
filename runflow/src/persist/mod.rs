// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binary persistence of paragraphs.
//!
//! A paragraph is stored as one record holding its text, followed by an
//! optional attribute block and one record per run. Older formats store text
//! per run as either single-byte Latin-1 or big-endian UTF-16 and address runs
//! by byte offset; [`FormatVersion::V7_0`] stores the whole text as UTF-16 and
//! addresses runs by code unit.
//!
//! Extended records carry their own size, so readers skip fields they do not
//! know. Loading never fails on inconsistent run ranges: runs are laid end to
//! end over the decoded text and clamped.
//!
//! Colors are stored opaque in every format: alpha is dropped on save and
//! loads as 255.

mod fonts;
mod stream;

use alloc::vec::Vec;
use core::fmt;

use crate::layout::HAlign;
use crate::paragraph::{AttributeCompare, Paragraph};
use crate::run::Run;
use crate::style::{BaseDirection, FontKey, ListStyle, ParagraphStyle, RunStyle, TextAlign};
use crate::MAX_TEXT_LENGTH;

pub use fonts::FontTable;
pub use stream::{Reader, Writer};

/// Revision of the on-disk format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormatVersion {
    /// Byte-addressed runs, no extended records.
    V2_7,
    /// Adds extended paragraph and run records.
    V5_5,
    /// UTF-16 text addressed by code unit; persists tab alignments and
    /// direction.
    V7_0,
}

impl FormatVersion {
    fn has_extended_records(self) -> bool {
        self >= Self::V5_5
    }

    fn is_unicode(self) -> bool {
        self >= Self::V7_0
    }
}

/// Errors that can occur when saving or loading paragraphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersistError {
    /// The data ended in the middle of a record.
    UnexpectedEof,
    /// A paragraph record was expected, but another tag was found.
    UnexpectedRecord(u8),
    /// A value does not fit the format's field width.
    TooLarge,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("unexpected end of data"),
            Self::UnexpectedRecord(tag) => write!(f, "unexpected record tag {tag}"),
            Self::TooLarge => f.write_str("value too large for the format"),
        }
    }
}

impl core::error::Error for PersistError {}

const PARAGRAPH: u8 = 1;
const PARAGRAPH_EXT: u8 = 2;
const RUN: u8 = 3;
const RUN_EXT: u8 = 4;

const F_FONT: u32 = 1 << 3;
const F_HAS_COLOR: u32 = 1 << 14;
const F_HAS_METADATA: u32 = 1 << 15;
const F_HAS_SHIFT: u32 = 1 << 16;
const F_HAS_BACK_COLOR: u32 = 1 << 17;
const F_HAS_LINK: u32 = 1 << 21;
const F_HAS_IMAGE: u32 = 1 << 22;
const F_INHERIT_FNAME: u32 = 1 << 24;
const F_INHERIT_FSIZE: u32 = 1 << 25;
const F_INHERIT_FSTYLE: u32 = 1 << 26;
const F_HILITED: u32 = 1 << 27;
const F_HAS_UNICODE: u32 = 1 << 29;
const F_LONG_INDEX: u32 = 1 << 30;

const PA_TEXT_ALIGN: u32 = 1 << 0;
const PA_LIST_STYLE: u32 = 1 << 1;
const PA_LIST_DEPTH: u32 = 1 << 2;
const PA_FIRST_INDENT: u32 = 1 << 3;
const PA_LEFT_INDENT: u32 = 1 << 4;
const PA_RIGHT_INDENT: u32 = 1 << 5;
const PA_SPACE_ABOVE: u32 = 1 << 6;
const PA_SPACE_BELOW: u32 = 1 << 7;
const PA_TABS: u32 = 1 << 8;
const PA_BACK_COLOR: u32 = 1 << 9;
const PA_BORDER_COLOR: u32 = 1 << 10;
const PA_BORDER_WIDTH: u32 = 1 << 11;
const PA_HGRID: u32 = 1 << 12;
const PA_VGRID: u32 = 1 << 13;
const PA_DONT_WRAP: u32 = 1 << 14;
const PA_PADDING: u32 = 1 << 15;
const PA_HIDDEN: u32 = 1 << 16;
const PA_METADATA: u32 = 1 << 17;
const PA_LIST_INDEX: u32 = 1 << 18;
const PA_LIST_INDENT: u32 = 1 << 19;
const PA_TAB_ALIGN: u32 = 1 << 20;
const PA_DIRECTION: u32 = 1 << 21;

const PA_PACKED: u32 =
    PA_TEXT_ALIGN | PA_LIST_STYLE | PA_LIST_DEPTH | PA_VGRID | PA_HGRID | PA_DONT_WRAP | PA_HIDDEN;

/// Saves one paragraph, interning its fonts in `fonts`.
pub fn save(
    paragraph: &Paragraph,
    fonts: &mut FontTable,
    version: FormatVersion,
) -> Result<Vec<u8>, PersistError> {
    let mut writer = Writer::new();
    save_into(paragraph, fonts, version, &mut writer)?;
    Ok(writer.into_bytes())
}

/// Loads one paragraph from the start of `data`.
pub fn load(
    data: &[u8],
    fonts: &FontTable,
    version: FormatVersion,
) -> Result<Paragraph, PersistError> {
    load_from(&mut Reader::new(data), fonts, version)
}

/// Saves a sequence of paragraphs preceded by their font table.
pub fn save_document(
    paragraphs: &[Paragraph],
    version: FormatVersion,
) -> Result<Vec<u8>, PersistError> {
    let mut fonts = FontTable::new();
    let mut body = Writer::new();
    for paragraph in paragraphs {
        save_into(paragraph, &mut fonts, version, &mut body)?;
    }
    let mut writer = Writer::new();
    fonts.save(&mut writer)?;
    writer.bytes(body.as_bytes());
    Ok(writer.into_bytes())
}

/// Loads a document written by [`save_document`].
pub fn load_document(data: &[u8], version: FormatVersion) -> Result<Vec<Paragraph>, PersistError> {
    let mut reader = Reader::new(data);
    let fonts = FontTable::load(&mut reader)?;
    let mut paragraphs = Vec::new();
    while matches!(reader.peek_u8(), Some(PARAGRAPH | PARAGRAPH_EXT)) {
        paragraphs.push(load_from(&mut reader, &fonts, version)?);
    }
    Ok(paragraphs)
}

fn is_wide(units: &[u16]) -> bool {
    units.iter().any(|&unit| unit > 0xFF)
}

/// Appends one paragraph record.
pub fn save_into(
    paragraph: &Paragraph,
    fonts: &mut FontTable,
    version: FormatVersion,
    writer: &mut Writer,
) -> Result<(), PersistError> {
    let mut paragraph = paragraph.clone();
    paragraph.clear_pending();
    paragraph.defrag_runs(AttributeCompare::InMemory, false);
    let text = &paragraph.text;
    let runs = &paragraph.runs;

    let extended = version.has_extended_records() && paragraph.style != ParagraphStyle::default();
    writer.u8(if extended { PARAGRAPH_EXT } else { PARAGRAPH });

    let wide: Vec<bool> = runs
        .iter()
        .map(|run| !version.is_unicode() && is_wide(&text[run.text_range()]))
        .collect();
    if version.is_unicode() {
        writer.u32(u32::try_from(text.len()).map_err(|_| PersistError::TooLarge)?);
        for &unit in text {
            writer.u16(unit);
        }
    } else {
        let bytes: usize = runs
            .iter()
            .zip(&wide)
            .map(|(run, &wide)| if wide { run.len * 2 } else { run.len })
            .sum();
        writer.u16(u16::try_from(bytes).map_err(|_| PersistError::TooLarge)?);
        for (run, &wide) in runs.iter().zip(&wide) {
            for &unit in &text[run.text_range()] {
                if wide {
                    writer.u16(unit);
                } else {
                    writer.u8(unit as u8);
                }
            }
        }
    }

    if extended {
        save_paragraph_attrs(&paragraph.style, version, writer)?;
    }

    let styled = runs.len() > 1
        || runs
            .iter()
            .any(|run| run.style.is_some() || run.flags.hilited())
        || wide.iter().any(|&wide| wide);
    if !styled {
        return Ok(());
    }
    let mut offset = 0;
    for (run, &wide) in runs.iter().zip(&wide) {
        let len = if version.is_unicode() || !wide {
            run.len
        } else {
            run.len * 2
        };
        save_run(run, offset, len, wide, fonts, version, writer)?;
        offset += len;
    }
    Ok(())
}

fn save_run(
    run: &Run,
    index: usize,
    len: usize,
    wide: bool,
    fonts: &mut FontTable,
    version: FormatVersion,
    writer: &mut Writer,
) -> Result<(), PersistError> {
    let empty = RunStyle::default();
    let style = run.style().unwrap_or(&empty);
    let extended = version.has_extended_records() && style.metadata.is_some();
    let long = index > 0xFFFF || len > 0xFFFF;
    if long && !version.is_unicode() {
        return Err(PersistError::TooLarge);
    }

    let mut flags = 0;
    let has_font =
        style.font_name.is_some() || style.font_size.is_some() || style.font_style.is_some();
    if has_font || wide {
        flags |= F_FONT;
        if style.font_name.is_none() {
            flags |= F_INHERIT_FNAME;
        }
        if style.font_size.is_none() {
            flags |= F_INHERIT_FSIZE;
        }
        if style.font_style.is_none() {
            flags |= F_INHERIT_FSTYLE;
        }
    }
    let present = [
        (style.color.is_some(), F_HAS_COLOR),
        (style.background_color.is_some(), F_HAS_BACK_COLOR),
        (style.shift.is_some(), F_HAS_SHIFT),
        (style.link.is_some(), F_HAS_LINK),
        (style.image.is_some(), F_HAS_IMAGE),
        (extended, F_HAS_METADATA),
        (run.flags.hilited(), F_HILITED),
        (wide, F_HAS_UNICODE),
        (long, F_LONG_INDEX),
    ];
    for (set, flag) in present {
        if set {
            flags |= flag;
        }
    }

    let mut attrs = Writer::new();
    attrs.u32(flags);
    if flags & F_FONT != 0 {
        attrs.u16_or_u32(fonts.intern(&style.font(&FontKey::default())))?;
    }
    if let Some(color) = style.color {
        attrs.color(color);
    }
    if let Some(color) = style.background_color {
        attrs.color(color);
    }
    if let Some(shift) = style.shift {
        attrs.i16(shift);
    }
    if let Some(link) = &style.link {
        attrs.string(Some(link))?;
    }
    if let Some(image) = &style.image {
        attrs.string(Some(image))?;
    }
    if extended {
        attrs.string(style.metadata.as_deref())?;
    }

    if extended {
        writer.u8(RUN_EXT);
        writer.u16_or_u32(attrs.as_bytes().len() as u32)?;
    } else {
        writer.u8(RUN);
    }
    writer.bytes(attrs.as_bytes());
    if long {
        writer.u32(index as u32);
        writer.u32(len as u32);
    } else {
        writer.u16(index as u16);
        writer.u16(len as u16);
    }
    Ok(())
}

fn save_paragraph_attrs(
    style: &ParagraphStyle,
    version: FormatVersion,
    writer: &mut Writer,
) -> Result<(), PersistError> {
    let unicode = version.is_unicode();
    let present = [
        (style.text_align.is_some(), PA_TEXT_ALIGN),
        (style.list_style.is_some(), PA_LIST_STYLE),
        (style.list_depth.is_some(), PA_LIST_DEPTH),
        (style.first_indent.is_some(), PA_FIRST_INDENT),
        (style.left_indent.is_some(), PA_LEFT_INDENT),
        (style.right_indent.is_some(), PA_RIGHT_INDENT),
        (style.space_above.is_some(), PA_SPACE_ABOVE),
        (style.space_below.is_some(), PA_SPACE_BELOW),
        (style.tabs.is_some(), PA_TABS),
        (style.background_color.is_some(), PA_BACK_COLOR),
        (style.border_color.is_some(), PA_BORDER_COLOR),
        (style.border_width.is_some(), PA_BORDER_WIDTH),
        (style.hgrid.is_some(), PA_HGRID),
        (style.vgrid.is_some(), PA_VGRID),
        (style.dont_wrap.is_some(), PA_DONT_WRAP),
        (style.padding.is_some(), PA_PADDING),
        (style.hidden.is_some(), PA_HIDDEN),
        (style.metadata.is_some(), PA_METADATA),
        (style.list_index.is_some(), PA_LIST_INDEX),
        (style.list_indent.is_some(), PA_LIST_INDENT),
        (unicode && style.tab_alignments.is_some(), PA_TAB_ALIGN),
        (unicode && style.direction.is_some(), PA_DIRECTION),
    ];
    let flags = present
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |flags, (_, flag)| flags | flag);

    let mut attrs = Writer::new();
    attrs.u32(flags);
    if flags & PA_PACKED != 0 {
        let packed = style.text_align.unwrap_or_default().to_bits()
            | (style.list_style.unwrap_or_default().to_bits() << 2)
            | (u16::from(style.list_depth.unwrap_or(0).min(15)) << 6)
            | (u16::from(style.vgrid.unwrap_or(false)) << 10)
            | (u16::from(style.hgrid.unwrap_or(false)) << 11)
            | (u16::from(style.dont_wrap.unwrap_or(false)) << 12)
            | (u16::from(style.hidden.unwrap_or(false)) << 13);
        attrs.u16(packed);
    }
    if let Some(width) = style.border_width {
        attrs.u8(width);
    }
    for value in [
        style.first_indent,
        style.left_indent,
        style.right_indent,
        style.space_above,
        style.space_below,
    ]
    .into_iter()
    .flatten()
    {
        attrs.i16(value);
    }
    if let Some(tabs) = &style.tabs {
        attrs.u16(u16::try_from(tabs.len()).map_err(|_| PersistError::TooLarge)?);
        for &tab in tabs {
            attrs.u16(tab);
        }
    }
    if let Some(color) = style.background_color {
        attrs.packed_color(color);
    }
    if let Some(color) = style.border_color {
        attrs.packed_color(color);
    }
    if let Some(padding) = style.padding {
        attrs.u8(padding);
    }
    if let Some(metadata) = &style.metadata {
        attrs.string(Some(metadata))?;
    }
    if let Some(index) = style.list_index {
        attrs.u16(index);
    }
    if let Some(indent) = style.list_indent {
        attrs.i16(indent);
    }
    if flags & PA_TAB_ALIGN != 0 {
        let alignments = style.tab_alignments.as_deref().unwrap_or_default();
        attrs.u16(u16::try_from(alignments.len()).map_err(|_| PersistError::TooLarge)?);
        for align in alignments {
            attrs.u8(align.to_bits());
        }
    }
    if flags & PA_DIRECTION != 0 {
        attrs.u8(style.direction.unwrap_or_default().to_bits());
    }

    writer.u16_or_u32(attrs.as_bytes().len() as u32)?;
    writer.bytes(attrs.as_bytes());
    Ok(())
}

fn load_paragraph_attrs(reader: &mut Reader<'_>) -> Result<ParagraphStyle, PersistError> {
    let size = reader.u16_or_u32()? as usize;
    let end = reader.position() + size;
    let flags = reader.u32()?;
    let mut style = ParagraphStyle::default();
    let has = |flag: u32| flags & flag != 0;
    if flags & PA_PACKED != 0 {
        let packed = reader.u16()?;
        let bit = |shift: u16| (packed >> shift) & 1 != 0;
        if has(PA_TEXT_ALIGN) {
            style.text_align = Some(TextAlign::from_bits(packed));
        }
        if has(PA_LIST_STYLE) {
            style.list_style = Some(ListStyle::from_bits(packed >> 2));
        }
        if has(PA_LIST_DEPTH) {
            style.list_depth = Some(((packed >> 6) & 0xF) as u8);
        }
        if has(PA_VGRID) {
            style.vgrid = Some(bit(10));
        }
        if has(PA_HGRID) {
            style.hgrid = Some(bit(11));
        }
        if has(PA_DONT_WRAP) {
            style.dont_wrap = Some(bit(12));
        }
        if has(PA_HIDDEN) {
            style.hidden = Some(bit(13));
        }
    }
    if has(PA_BORDER_WIDTH) {
        style.border_width = Some(reader.u8()?);
    }
    for (flag, field) in [
        (PA_FIRST_INDENT, &mut style.first_indent),
        (PA_LEFT_INDENT, &mut style.left_indent),
        (PA_RIGHT_INDENT, &mut style.right_indent),
        (PA_SPACE_ABOVE, &mut style.space_above),
        (PA_SPACE_BELOW, &mut style.space_below),
    ] {
        if has(flag) {
            *field = Some(reader.i16()?);
        }
    }
    if has(PA_TABS) {
        let count = reader.u16()?;
        let mut tabs = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            tabs.push(reader.u16()?);
        }
        style.tabs = Some(tabs);
    }
    if has(PA_BACK_COLOR) {
        style.background_color = Some(reader.packed_color()?);
    }
    if has(PA_BORDER_COLOR) {
        style.border_color = Some(reader.packed_color()?);
    }
    if has(PA_PADDING) {
        style.padding = Some(reader.u8()?);
    }
    if has(PA_METADATA) {
        style.metadata = reader.string()?;
    }
    if has(PA_LIST_INDEX) {
        style.list_index = Some(reader.u16()?);
    }
    if has(PA_LIST_INDENT) {
        style.list_indent = Some(reader.i16()?);
    }
    if has(PA_TAB_ALIGN) {
        let count = reader.u16()?;
        let mut alignments = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            alignments.push(HAlign::from_bits(reader.u8()?));
        }
        style.tab_alignments = Some(alignments);
    }
    if has(PA_DIRECTION) {
        style.direction = Some(BaseDirection::from_bits(reader.u8()?));
    }
    reader.skip_to(end)?;
    Ok(style)
}

/// A run record before its text has been decoded.
struct LoadedRun {
    run: Run,
    index: usize,
    len: usize,
    wide: bool,
}

fn load_run(
    reader: &mut Reader<'_>,
    fonts: &FontTable,
    version: FormatVersion,
) -> Result<LoadedRun, PersistError> {
    let tag = reader.u8()?;
    let end = if tag == RUN_EXT {
        let size = reader.u16_or_u32()? as usize;
        Some(reader.position() + size)
    } else {
        None
    };
    let flags = reader.u32()?;
    let has = |flag: u32| flags & flag != 0;
    let mut style = RunStyle::default();
    if has(F_FONT) {
        let font = fonts.resolve(reader.u16_or_u32()?);
        if !has(F_INHERIT_FNAME) {
            style.font_name = Some(font.family);
        }
        if !has(F_INHERIT_FSIZE) {
            style.font_size = Some(font.size);
        }
        if !has(F_INHERIT_FSTYLE) {
            style.font_style = Some(font.style);
        }
    }
    if has(F_HAS_COLOR) {
        style.color = Some(reader.color()?);
    }
    if has(F_HAS_BACK_COLOR) {
        style.background_color = Some(reader.color()?);
    }
    if has(F_HAS_SHIFT) {
        style.shift = Some(reader.i16()?);
    }
    if has(F_HAS_LINK) {
        style.link = reader.string()?;
    }
    if has(F_HAS_IMAGE) {
        style.image = reader.string()?;
    }
    if let Some(end) = end {
        if has(F_HAS_METADATA) {
            style.metadata = reader.string()?;
        }
        reader.skip_to(end)?;
    }
    let (index, len) = if version.is_unicode() && has(F_LONG_INDEX) {
        (reader.u32()? as usize, reader.u32()? as usize)
    } else {
        (usize::from(reader.u16()?), usize::from(reader.u16()?))
    };

    let mut run = Run::new(index, len);
    if !style.is_empty() {
        run.style = Some(style.into());
    }
    run.flags.set_hilited(has(F_HILITED));
    Ok(LoadedRun {
        run,
        index,
        len,
        wide: has(F_HAS_UNICODE),
    })
}

fn decode_bytes(bytes: &[u8], wide: bool, out: &mut Vec<u16>) {
    if wide {
        out.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        );
    } else {
        out.extend(bytes.iter().map(|&byte| u16::from(byte)));
    }
}

/// Reads one paragraph record.
pub fn load_from(
    reader: &mut Reader<'_>,
    fonts: &FontTable,
    version: FormatVersion,
) -> Result<Paragraph, PersistError> {
    let tag = reader.u8()?;
    if tag != PARAGRAPH && tag != PARAGRAPH_EXT {
        return Err(PersistError::UnexpectedRecord(tag));
    }
    let bytes = if version.is_unicode() {
        let count = reader.u32()? as usize;
        if count > MAX_TEXT_LENGTH {
            return Err(PersistError::TooLarge);
        }
        reader.take(count * 2)?
    } else {
        let len = usize::from(reader.u16()?);
        reader.take(len)?
    };
    let style = if tag == PARAGRAPH_EXT {
        load_paragraph_attrs(reader)?
    } else {
        ParagraphStyle::default()
    };
    let mut loaded = Vec::new();
    while matches!(reader.peek_u8(), Some(RUN | RUN_EXT)) {
        loaded.push(load_run(reader, fonts, version)?);
    }

    let mut text = Vec::new();
    if version.is_unicode() {
        decode_bytes(bytes, true, &mut text);
        let runs = loaded.into_iter().map(|loaded| loaded.run).collect();
        return Ok(Paragraph::from_parts(text, runs, style));
    }

    // Byte-addressed runs are laid end to end over the decoded text.
    let mut runs = Vec::with_capacity(loaded.len());
    let mut pos = 0;
    for LoadedRun {
        mut run,
        index,
        len,
        wide,
    } in loaded
    {
        if index != pos {
            log::warn!("run at byte {index} does not follow the previous run ending at {pos}");
        }
        let mut take = len.min(bytes.len() - pos);
        if wide {
            take &= !1;
        }
        let start = text.len();
        decode_bytes(&bytes[pos..pos + take], wide, &mut text);
        run.start = start;
        run.len = text.len() - start;
        pos += take;
        runs.push((run, wide));
    }
    if pos < bytes.len() {
        let wide = runs.last().is_some_and(|(_, wide)| *wide);
        if !runs.is_empty() {
            log::warn!("{} bytes of text are not covered by runs", bytes.len() - pos);
        }
        let start = text.len();
        decode_bytes(&bytes[pos..], wide, &mut text);
        if let Some((run, _)) = runs.last_mut() {
            run.len += text.len() - start;
        }
    }
    let runs = runs.into_iter().map(|(run, _)| run).collect();
    Ok(Paragraph::from_parts(text, runs, style))
}
