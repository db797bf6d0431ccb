// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Character and paragraph style attributes.

mod paragraph;

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use peniko::color::Rgba8;

use crate::host::FieldDefaults;

pub use paragraph::{ListStyle, ParagraphStyle, ResolvedParagraph, TextAlign};

/// The paragraph's base direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BaseDirection {
    /// Use the direction of the first strong character, falling back to
    /// left-to-right.
    #[default]
    Auto,
    /// Left-to-right.
    Ltr,
    /// Right-to-left.
    Rtl,
}

impl BaseDirection {
    pub(crate) fn to_bits(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Ltr => 1,
            Self::Rtl => 2,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Ltr,
            2 => Self::Rtl,
            _ => Self::Auto,
        }
    }
}

/// Font style bits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FontStyle(u16);

impl FontStyle {
    /// No style bits set.
    pub const PLAIN: Self = Self(0);
    /// Bold weight.
    pub const BOLD: Self = Self(1 << 0);
    /// Italic slant.
    pub const ITALIC: Self = Self(1 << 1);
    /// Underlined.
    pub const UNDERLINE: Self = Self(1 << 2);
    /// Outlined glyphs.
    pub const OUTLINE: Self = Self(1 << 3);
    /// Drop shadow.
    pub const SHADOW: Self = Self(1 << 4);
    /// Condensed width.
    pub const CONDENSED: Self = Self(1 << 5);
    /// Extended width.
    pub const EXTENDED: Self = Self(1 << 6);
    /// Struck through.
    pub const STRIKEOUT: Self = Self(1 << 7);

    /// Creates a style from raw bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` if every bit in `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both styles.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl fmt::Debug for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 8] = [
            "BOLD",
            "ITALIC",
            "UNDERLINE",
            "OUTLINE",
            "SHADOW",
            "CONDENSED",
            "EXTENDED",
            "STRIKEOUT",
        ];
        if self.0 == 0 {
            return f.write_str("FontStyle(PLAIN)");
        }
        f.write_str("FontStyle(")?;
        let mut first = true;
        for (bit, name) in NAMES.iter().enumerate() {
            if self.0 & (1 << bit) != 0 {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        f.write_str(")")
    }
}

/// Fully resolved font selection passed to the host for measurement.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FontKey {
    /// Family name.
    pub family: Arc<str>,
    /// Size in points.
    pub size: u16,
    /// Style bits.
    pub style: FontStyle,
}

impl FontKey {
    /// Creates a new font key.
    pub fn new(family: &str, size: u16, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            size,
            style,
        }
    }
}

impl Default for FontKey {
    /// Helvetica 12, plain. Also substituted for out-of-range font indices in
    /// persisted data.
    fn default() -> Self {
        Self::new("Helvetica", 12, FontStyle::PLAIN)
    }
}

/// Transient per-run flags.
///
/// These are user-interface state rather than formatting, and are ignored by
/// the persistent attribute comparison.
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct RunFlags(u8);

impl RunFlags {
    const HILITED: u8 = 1 << 0;
    const VISITED: u8 = 1 << 1;
    const FLAGGED: u8 = 1 << 2;

    /// Returns `true` if the run is highlighted.
    pub fn hilited(self) -> bool {
        self.0 & Self::HILITED != 0
    }

    /// Returns `true` if the run's link has been visited.
    pub fn visited(self) -> bool {
        self.0 & Self::VISITED != 0
    }

    /// Returns `true` if the run is flagged, for example as a search hit.
    pub fn flagged(self) -> bool {
        self.0 & Self::FLAGGED != 0
    }

    pub(crate) fn set_hilited(&mut self, on: bool) {
        self.set(Self::HILITED, on);
    }

    pub(crate) fn set_visited(&mut self, on: bool) {
        self.set(Self::VISITED, on);
    }

    pub(crate) fn set_flagged(&mut self, on: bool) {
        self.set(Self::FLAGGED, on);
    }

    fn set(&mut self, mask: u8, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

/// Optional formatting carried by a run.
///
/// Every field is `None` when inherited from the host's defaults. Runs only
/// allocate a `RunStyle` once some field is set.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct RunStyle {
    /// Font family override.
    pub font_name: Option<Arc<str>>,
    /// Font size override, in points.
    pub font_size: Option<u16>,
    /// Font style override.
    pub font_style: Option<FontStyle>,
    /// Text color.
    pub color: Option<Rgba8>,
    /// Background (highlight) color.
    pub background_color: Option<Rgba8>,
    /// Link target.
    pub link: Option<String>,
    /// Inline image source. A run with an image covers exactly one code point.
    pub image: Option<String>,
    /// Opaque host metadata.
    pub metadata: Option<String>,
    /// Baseline shift in pixels; negative values raise the text.
    pub shift: Option<i16>,
}

impl RunStyle {
    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolves the font against the inherited default.
    pub fn font(&self, default: &FontKey) -> FontKey {
        FontKey {
            family: self.font_name.clone().unwrap_or_else(|| default.family.clone()),
            size: self.font_size.unwrap_or(default.size),
            style: self.font_style.unwrap_or(default.style),
        }
    }

    /// Applies a single attribute change. Flag attributes are ignored here.
    pub fn apply(&mut self, attribute: &RunAttribute) {
        match attribute {
            RunAttribute::FontName(v) => self.font_name.clone_from(v),
            RunAttribute::FontSize(v) => self.font_size = *v,
            RunAttribute::FontStyle(v) => self.font_style = *v,
            RunAttribute::Color(v) => self.color = *v,
            RunAttribute::BackgroundColor(v) => self.background_color = *v,
            RunAttribute::Link(v) => self.link.clone_from(v),
            RunAttribute::Image(v) => self.image.clone_from(v),
            RunAttribute::Metadata(v) => self.metadata.clone_from(v),
            RunAttribute::Shift(v) => self.shift = *v,
            RunAttribute::Hilite(_) | RunAttribute::Visited(_) | RunAttribute::Flagged(_) => {}
        }
    }
}

/// One attribute change applied over a range of text.
///
/// `None` values clear the attribute so it is inherited again.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RunAttribute {
    /// Font family.
    FontName(Option<Arc<str>>),
    /// Font size in points.
    FontSize(Option<u16>),
    /// Font style bits.
    FontStyle(Option<FontStyle>),
    /// Text color.
    Color(Option<Rgba8>),
    /// Background color.
    BackgroundColor(Option<Rgba8>),
    /// Link target.
    Link(Option<String>),
    /// Inline image source.
    Image(Option<String>),
    /// Host metadata.
    Metadata(Option<String>),
    /// Baseline shift.
    Shift(Option<i16>),
    /// Highlight flag.
    Hilite(bool),
    /// Visited-link flag.
    Visited(bool),
    /// Search or spelling flag.
    Flagged(bool),
}

/// Character attributes exported for copy and paste or style editing.
///
/// A flattened export has every formatting field filled in, using the host's
/// defaults for inherited values. A non-flattened export leaves out values
/// equal to what would be inherited anyway.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct CharacterStyle {
    /// Formatting fields.
    pub style: RunStyle,
    /// Highlight flag, if known.
    pub hilited: Option<bool>,
}

impl CharacterStyle {
    pub(crate) fn export(
        style: Option<&RunStyle>,
        flags: RunFlags,
        defaults: &FieldDefaults,
        flatten: bool,
    ) -> Self {
        let mut out = style.cloned().unwrap_or_default();
        let font = &defaults.font;
        if flatten {
            out.font_name.get_or_insert_with(|| font.family.clone());
            out.font_size.get_or_insert(font.size);
            out.font_style.get_or_insert(font.style);
            out.color.get_or_insert(defaults.color);
            out.shift.get_or_insert(0);
        } else {
            if out.font_name.as_deref() == Some(&*font.family) {
                out.font_name = None;
            }
            if out.font_size == Some(font.size) {
                out.font_size = None;
            }
            if out.font_style == Some(font.style) {
                out.font_style = None;
            }
            if out.color == Some(defaults.color) {
                out.color = None;
            }
            if out.shift == Some(0) {
                out.shift = None;
            }
        }
        Self {
            style: out,
            hilited: (flatten || flags.hilited()).then_some(flags.hilited()),
        }
    }

    /// Attribute changes that apply this style's set fields.
    pub fn attributes(&self) -> impl Iterator<Item = RunAttribute> + '_ {
        let s = &self.style;
        [
            s.font_name.clone().map(|v| RunAttribute::FontName(Some(v))),
            s.font_size.map(|v| RunAttribute::FontSize(Some(v))),
            s.font_style.map(|v| RunAttribute::FontStyle(Some(v))),
            s.color.map(|v| RunAttribute::Color(Some(v))),
            s.background_color
                .map(|v| RunAttribute::BackgroundColor(Some(v))),
            s.link.clone().map(|v| RunAttribute::Link(Some(v))),
            s.image.clone().map(|v| RunAttribute::Image(Some(v))),
            s.metadata.clone().map(|v| RunAttribute::Metadata(Some(v))),
            s.shift.map(|v| RunAttribute::Shift(Some(v))),
            self.hilited.map(RunAttribute::Hilite),
        ]
        .into_iter()
        .flatten()
    }

    /// Clears every field that differs from `other`.
    pub(crate) fn intersect(&mut self, other: &Self) {
        fn keep<T: PartialEq>(a: &mut Option<T>, b: &Option<T>) {
            if a != b {
                *a = None;
            }
        }
        let (a, b) = (&mut self.style, &other.style);
        keep(&mut a.font_name, &b.font_name);
        keep(&mut a.font_size, &b.font_size);
        keep(&mut a.font_style, &b.font_style);
        keep(&mut a.color, &b.color);
        keep(&mut a.background_color, &b.background_color);
        keep(&mut a.link, &b.link);
        keep(&mut a.image, &b.image);
        keep(&mut a.metadata, &b.metadata);
        keep(&mut a.shift, &b.shift);
        keep(&mut self.hilited, &other.hilited);
    }
}
