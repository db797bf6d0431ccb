// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;

use peniko::color::Rgba8;

use super::BaseDirection;
use crate::host::FieldDefaults;
use crate::layout::HAlign;

/// Horizontal alignment of a paragraph's lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center between the margins.
    Center,
    /// Align to the right edge.
    Right,
    /// Justified. Lines are placed at the start edge.
    Justify,
}

impl TextAlign {
    pub(crate) fn to_bits(self) -> u16 {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
            Self::Justify => 3,
        }
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            1 => Self::Center,
            2 => Self::Right,
            3 => Self::Justify,
            _ => Self::Left,
        }
    }
}

/// List marker style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ListStyle {
    /// Not a list item.
    #[default]
    None,
    /// Filled circle.
    Disc,
    /// Hollow circle.
    Circle,
    /// Filled square.
    Square,
    /// 1, 2, 3.
    Decimal,
    /// a, b, c.
    LowerAlpha,
    /// A, B, C.
    UpperAlpha,
    /// i, ii, iii.
    LowerRoman,
    /// I, II, III.
    UpperRoman,
}

impl ListStyle {
    pub(crate) fn to_bits(self) -> u16 {
        self as u16
    }

    pub(crate) fn from_bits(bits: u16) -> Self {
        match bits & 0xF {
            1 => Self::Disc,
            2 => Self::Circle,
            3 => Self::Square,
            4 => Self::Decimal,
            5 => Self::LowerAlpha,
            6 => Self::UpperAlpha,
            7 => Self::LowerRoman,
            8 => Self::UpperRoman,
            _ => Self::None,
        }
    }
}

/// Paragraph-level attributes.
///
/// Each field is either set on the paragraph or `None`, in which case the
/// host's [`FieldDefaults`] apply.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct ParagraphStyle {
    /// Alignment of each line between the margins.
    pub text_align: Option<TextAlign>,
    /// List marker style.
    pub list_style: Option<ListStyle>,
    /// List nesting depth, `0..=15`.
    pub list_depth: Option<u8>,
    /// Indent per list level.
    pub list_indent: Option<i16>,
    /// Explicit list item number.
    pub list_index: Option<u16>,
    /// Extra indent of the first line.
    pub first_indent: Option<i16>,
    /// Left indent.
    pub left_indent: Option<i16>,
    /// Right indent.
    pub right_indent: Option<i16>,
    /// Space before the paragraph.
    pub space_above: Option<i16>,
    /// Space after the paragraph.
    pub space_below: Option<i16>,
    /// Tab stop positions in pixels, ascending.
    pub tabs: Option<Vec<u16>>,
    /// Horizontal alignment of each tab cell.
    pub tab_alignments: Option<Vec<HAlign>>,
    /// Background color.
    pub background_color: Option<Rgba8>,
    /// Border color.
    pub border_color: Option<Rgba8>,
    /// Border width in pixels.
    pub border_width: Option<u8>,
    /// Inner padding in pixels.
    pub padding: Option<u8>,
    /// Draw horizontal grid lines between paragraphs.
    pub hgrid: Option<bool>,
    /// Treat tab stops as fixed cell boundaries.
    pub vgrid: Option<bool>,
    /// Disable wrapping.
    pub dont_wrap: Option<bool>,
    /// Hide the paragraph.
    pub hidden: Option<bool>,
    /// Opaque host metadata.
    pub metadata: Option<String>,
    /// Base direction.
    pub direction: Option<BaseDirection>,
}

/// A [`ParagraphStyle`] with every field resolved against the host defaults.
#[derive(Clone, PartialEq, Debug)]
pub struct ResolvedParagraph {
    /// Explicit alignment, `None` for the direction's natural alignment.
    pub text_align: Option<TextAlign>,
    /// List marker style.
    pub list_style: ListStyle,
    /// List nesting depth.
    pub list_depth: u8,
    /// Indent per list level.
    pub list_indent: i16,
    /// First line indent.
    pub first_indent: i16,
    /// Left indent.
    pub left_indent: i16,
    /// Right indent.
    pub right_indent: i16,
    /// Space above.
    pub space_above: i16,
    /// Space below.
    pub space_below: i16,
    /// Tab stops.
    pub tabs: Vec<u16>,
    /// Tab cell alignments; empty when unset.
    pub tab_alignments: Vec<HAlign>,
    /// Border width.
    pub border_width: u8,
    /// Padding.
    pub padding: u8,
    /// Fixed tab cells.
    pub vgrid: bool,
    /// Wrapping disabled.
    pub dont_wrap: bool,
    /// Hidden.
    pub hidden: bool,
    /// Base direction, possibly still `Auto`.
    pub direction: BaseDirection,
    /// Available width for wrapping, before margins.
    pub wrap_width: f32,
}

impl ResolvedParagraph {
    /// Left margin of the text area, excluding the first line indent.
    pub fn left_margin(&self) -> f32 {
        let mut margin = f32::from(self.left_indent)
            + f32::from(self.border_width)
            + f32::from(self.padding);
        if self.list_style != ListStyle::None {
            margin += f32::from(self.list_indent) * f32::from(self.list_depth + 1);
        }
        margin
    }

    /// Right margin of the text area.
    pub fn right_margin(&self) -> f32 {
        f32::from(self.right_indent) + f32::from(self.border_width) + f32::from(self.padding)
    }

    /// Space between the paragraph's top edge and its first line.
    pub fn top_margin(&self) -> f32 {
        f32::from(self.space_above) + f32::from(self.border_width) + f32::from(self.padding)
    }

    /// Space between the last line and the paragraph's bottom edge.
    pub fn bottom_margin(&self) -> f32 {
        f32::from(self.space_below) + f32::from(self.border_width) + f32::from(self.padding)
    }

    /// Width available to lines after the first.
    pub fn line_width(&self) -> f32 {
        (self.wrap_width - self.left_margin() - self.right_margin()).max(0.0)
    }

    /// Width available to the first line.
    pub fn first_line_width(&self) -> f32 {
        (self.line_width() - f32::from(self.first_indent)).max(0.0)
    }
}

impl ParagraphStyle {
    /// Merges this style over the host defaults.
    pub fn resolve(&self, defaults: &FieldDefaults) -> ResolvedParagraph {
        ResolvedParagraph {
            text_align: self.text_align.or(defaults.text_align),
            list_style: self.list_style.unwrap_or(defaults.list_style),
            list_depth: self.list_depth.unwrap_or(0).min(15),
            list_indent: self.list_indent.unwrap_or(defaults.list_indent),
            first_indent: self.first_indent.unwrap_or(defaults.first_indent),
            left_indent: self.left_indent.unwrap_or(defaults.left_indent),
            right_indent: self.right_indent.unwrap_or(defaults.right_indent),
            space_above: self.space_above.unwrap_or(defaults.space_above),
            space_below: self.space_below.unwrap_or(defaults.space_below),
            tabs: self.tabs.clone().unwrap_or_else(|| defaults.tabs.clone()),
            tab_alignments: self
                .tab_alignments
                .clone()
                .unwrap_or_else(|| defaults.tab_alignments.clone()),
            border_width: self.border_width.unwrap_or(defaults.border_width),
            padding: self.padding.unwrap_or(defaults.padding),
            vgrid: self.vgrid.unwrap_or(defaults.vgrid),
            dont_wrap: self.dont_wrap.unwrap_or(defaults.dont_wrap),
            hidden: self.hidden.unwrap_or(false),
            direction: self.direction.unwrap_or(defaults.direction),
            wrap_width: defaults.wrap_width,
        }
    }

    /// Exports the style for copy and paste.
    ///
    /// Flattened exports fill every field from `defaults`; otherwise fields
    /// equal to the inherited value are left out.
    pub fn export(&self, defaults: &FieldDefaults, flatten: bool) -> Self {
        let inherited = Self::from_defaults(defaults);
        if flatten {
            let mut out = Self {
                list_depth: Some(0),
                hgrid: Some(defaults.hgrid),
                hidden: Some(false),
                ..inherited
            };
            out.import(self);
            out
        } else {
            let mut out = self.clone();
            fn omit<T: PartialEq>(field: &mut Option<T>, inherited: &Option<T>) {
                if field.is_some() && field == inherited {
                    *field = None;
                }
            }
            omit(&mut out.text_align, &inherited.text_align);
            omit(&mut out.list_style, &inherited.list_style);
            omit(&mut out.list_indent, &inherited.list_indent);
            omit(&mut out.first_indent, &inherited.first_indent);
            omit(&mut out.left_indent, &inherited.left_indent);
            omit(&mut out.right_indent, &inherited.right_indent);
            omit(&mut out.space_above, &inherited.space_above);
            omit(&mut out.space_below, &inherited.space_below);
            omit(&mut out.tabs, &inherited.tabs);
            omit(&mut out.tab_alignments, &inherited.tab_alignments);
            omit(&mut out.background_color, &inherited.background_color);
            omit(&mut out.border_color, &inherited.border_color);
            omit(&mut out.border_width, &inherited.border_width);
            omit(&mut out.padding, &inherited.padding);
            omit(&mut out.hgrid, &Some(defaults.hgrid));
            omit(&mut out.vgrid, &inherited.vgrid);
            omit(&mut out.dont_wrap, &inherited.dont_wrap);
            omit(&mut out.direction, &inherited.direction);
            out
        }
    }

    /// Copies every field that is set in `other`.
    pub fn import(&mut self, other: &Self) {
        fn take<T: Clone>(field: &mut Option<T>, other: &Option<T>) {
            if other.is_some() {
                field.clone_from(other);
            }
        }
        take(&mut self.text_align, &other.text_align);
        take(&mut self.list_style, &other.list_style);
        take(&mut self.list_depth, &other.list_depth);
        take(&mut self.list_indent, &other.list_indent);
        take(&mut self.list_index, &other.list_index);
        take(&mut self.first_indent, &other.first_indent);
        take(&mut self.left_indent, &other.left_indent);
        take(&mut self.right_indent, &other.right_indent);
        take(&mut self.space_above, &other.space_above);
        take(&mut self.space_below, &other.space_below);
        take(&mut self.tabs, &other.tabs);
        take(&mut self.tab_alignments, &other.tab_alignments);
        take(&mut self.background_color, &other.background_color);
        take(&mut self.border_color, &other.border_color);
        take(&mut self.border_width, &other.border_width);
        take(&mut self.padding, &other.padding);
        take(&mut self.hgrid, &other.hgrid);
        take(&mut self.vgrid, &other.vgrid);
        take(&mut self.dont_wrap, &other.dont_wrap);
        take(&mut self.hidden, &other.hidden);
        take(&mut self.metadata, &other.metadata);
        take(&mut self.direction, &other.direction);
    }

    fn from_defaults(defaults: &FieldDefaults) -> Self {
        Self {
            text_align: defaults.text_align,
            list_style: Some(defaults.list_style),
            list_indent: Some(defaults.list_indent),
            first_indent: Some(defaults.first_indent),
            left_indent: Some(defaults.left_indent),
            right_indent: Some(defaults.right_indent),
            space_above: Some(defaults.space_above),
            space_below: Some(defaults.space_below),
            tabs: Some(defaults.tabs.clone()),
            tab_alignments: Some(defaults.tab_alignments.clone()),
            background_color: defaults.background_color,
            border_color: defaults.border_color,
            border_width: Some(defaults.border_width),
            padding: Some(defaults.padding),
            vgrid: Some(defaults.vgrid),
            dont_wrap: Some(defaults.dont_wrap),
            direction: Some(defaults.direction),
            ..Self::default()
        }
    }
}
