// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The logical font table shared by every run in a saved document.

use alloc::vec::Vec;

use hashbrown::HashMap;

use super::stream::{Reader, Writer};
use super::PersistError;
use crate::style::{FontKey, FontStyle};

/// Maps fonts to the small indices stored in run records.
///
/// A document saves its table once, after interning the fonts of every run,
/// and loads it before any paragraph.
#[derive(Clone, Default, Debug)]
pub struct FontTable {
    fonts: Vec<FontKey>,
    indices: HashMap<FontKey, u32>,
}

impl FontTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `font`, adding it if needed.
    pub fn intern(&mut self, font: &FontKey) -> u32 {
        if let Some(&index) = self.indices.get(font) {
            return index;
        }
        let index = self.fonts.len() as u32;
        self.fonts.push(font.clone());
        self.indices.insert(font.clone(), index);
        index
    }

    /// The font stored at `index`.
    pub fn get(&self, index: u32) -> Option<&FontKey> {
        self.fonts.get(index as usize)
    }

    /// Resolves `index`, substituting the default font when it is out of
    /// range.
    pub(crate) fn resolve(&self, index: u32) -> FontKey {
        match self.get(index) {
            Some(font) => font.clone(),
            None => {
                log::warn!(
                    "font index {index} is out of range for a table of {}",
                    self.fonts.len()
                );
                FontKey::default()
            }
        }
    }

    /// Number of fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Returns `true` if the table holds no fonts.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Fonts in index order.
    pub fn iter(&self) -> impl Iterator<Item = &FontKey> + '_ {
        self.fonts.iter()
    }

    /// Writes the table.
    pub fn save(&self, writer: &mut Writer) -> Result<(), PersistError> {
        let count = u16::try_from(self.fonts.len()).map_err(|_| PersistError::TooLarge)?;
        writer.u16(count);
        for font in &self.fonts {
            writer.string(Some(&*font.family))?;
            writer.u16(font.size);
            writer.u16(font.style.bits());
        }
        Ok(())
    }

    /// Reads a table written by [`save`](Self::save).
    pub fn load(reader: &mut Reader<'_>) -> Result<Self, PersistError> {
        let count = reader.u16()?;
        let mut table = Self::new();
        for _ in 0..count {
            let family = reader.string()?.unwrap_or_default();
            let size = reader.u16()?;
            let style = FontStyle::from_bits(reader.u16()?);
            // Duplicate entries keep their own index.
            let index = table.fonts.len() as u32;
            let font = FontKey::new(&family, size, style);
            table.indices.entry(font.clone()).or_insert(index);
            table.fonts.push(font);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut table = FontTable::new();
        let a = FontKey::new("Courier", 10, FontStyle::BOLD);
        let b = FontKey::default();
        assert_eq!(table.intern(&a), 0, "first font");
        assert_eq!(table.intern(&b), 1, "second font");
        assert_eq!(table.intern(&a), 0, "same font again");
        assert_eq!(table.len(), 2, "no duplicates");
    }

    #[test]
    fn table_survives_a_round_trip() {
        let mut table = FontTable::new();
        table.intern(&FontKey::new("Courier", 10, FontStyle::ITALIC));
        table.intern(&FontKey::new("Times", 18, FontStyle::PLAIN));
        let mut writer = Writer::new();
        table.save(&mut writer).unwrap();
        let loaded = FontTable::load(&mut Reader::new(writer.as_bytes())).unwrap();
        assert_eq!(
            loaded.iter().collect::<Vec<_>>(),
            table.iter().collect::<Vec<_>>(),
            "same fonts in the same order"
        );
    }

    #[test]
    fn out_of_range_index_falls_back_to_default() {
        let table = FontTable::new();
        assert_eq!(table.resolve(7), FontKey::default(), "default font");
    }
}
