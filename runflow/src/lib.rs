// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph layout for editable, style-run based text.
//!
//! A [`Paragraph`] owns a UTF-16 text buffer and an ordered list of [`Run`]s
//! that tile it, each carrying an optional [`RunStyle`]. Editing operations
//! keep the runs consistent; a lazy layout pass then wraps the runs into
//! [`Line`]s, splits lines into tab-delimited [`Segment`]s ("cells"), resolves
//! bidirectional embedding levels and visual order, and exposes the index
//! math that maps text offsets to caret positions and back.
//!
//! Fonts and images are not resolved here. The host container implements
//! [`FieldHost`], which supplies paragraph defaults through [`FieldDefaults`]
//! and measures text for a given [`FontKey`].
//!
//! ## Features
//!
//! - `std` (enabled by default): Use the standard library.
//! - `libm`: Use floating point implementations from `libm` in `no_std` builds.
//!
//! ## Example
//!
//! ```
//! use runflow::{FieldDefaults, FieldHost, FontKey, FontMetrics, Paragraph};
//!
//! struct Mono(FieldDefaults);
//!
//! impl FieldHost for Mono {
//!     fn defaults(&self) -> &FieldDefaults {
//!         &self.0
//!     }
//!     fn measure(&self, _font: &FontKey, text: &[u16]) -> f32 {
//!         text.len() as f32 * 8.0
//!     }
//!     fn metrics(&self, _font: &FontKey) -> FontMetrics {
//!         FontMetrics { ascent: 10.0, descent: 3.0, leading: 1.0, x_height: 5.0 }
//!     }
//! }
//!
//! let host = Mono(FieldDefaults { wrap_width: 48.0, ..FieldDefaults::default() });
//! let mut paragraph = Paragraph::new("hello world");
//! paragraph.layout(&host, false);
//! assert_eq!(paragraph.lines().len(), 2);
//! ```
// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("runflow requires either the `std` or `libm` feature to be enabled");

extern crate alloc;

mod analysis;
mod bidi;
mod host;
mod run;
mod util;

pub mod layout;
pub mod paragraph;
pub mod persist;
pub mod style;

#[cfg(test)]
mod tests;

pub use peniko::color::Rgba8;
pub use peniko::kurbo::Rect;

pub use host::{FieldDefaults, FieldHost, FontMetrics};
pub use layout::{HAlign, Line, LineMetrics, Segment, SegmentId, VAlign};
pub use paragraph::{AttributeCompare, Paragraph, StylingMode};
pub use run::Run;
pub use style::{
    BaseDirection, CharacterStyle, FontKey, FontStyle, ListStyle, ParagraphStyle, RunAttribute,
    RunFlags, RunStyle, TextAlign,
};

/// Maximum number of UTF-16 code units a paragraph may hold.
///
/// Insertions and joins that would grow a paragraph beyond this are truncated
/// or refused.
pub const MAX_TEXT_LENGTH: usize = 1 << 22;

/// Tab stride, in pixels, used when neither the paragraph nor the host sets
/// any tab stops.
pub const DEFAULT_TAB_STRIDE: u16 = 32;
