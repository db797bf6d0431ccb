// Copyright 2025 the Runflow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Big-endian primitive encoding.

use alloc::string::String;
use alloc::vec::Vec;

use peniko::color::Rgba8;

use super::PersistError;

/// Appends big-endian records to a byte buffer.
#[derive(Clone, Default, Debug)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the writer, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Two bytes below `0x8000`, otherwise four bytes with the top bit set.
    pub(crate) fn u16_or_u32(&mut self, value: u32) -> Result<(), PersistError> {
        if value < 0x8000 {
            self.u16(value as u16);
            Ok(())
        } else if value < 0x8000_0000 {
            self.u32(value | 0x8000_0000);
            Ok(())
        } else {
            Err(PersistError::TooLarge)
        }
    }

    /// Length-prefixed, NUL-terminated UTF-8. `None` writes a zero length.
    pub(crate) fn string(&mut self, value: Option<&str>) -> Result<(), PersistError> {
        let Some(value) = value else {
            self.u16(0);
            return Ok(());
        };
        let len = u16::try_from(value.len() + 1).map_err(|_| PersistError::TooLarge)?;
        self.u16(len);
        self.bytes(value.as_bytes());
        self.u8(0);
        Ok(())
    }

    /// Three 16-bit channels. Alpha is not stored.
    pub(crate) fn color(&mut self, color: Rgba8) {
        self.u16(u16::from(color.r) * 257);
        self.u16(u16::from(color.g) * 257);
        self.u16(u16::from(color.b) * 257);
    }

    /// `0x00RRGGBB`. Alpha is not stored.
    pub(crate) fn packed_color(&mut self, color: Rgba8) {
        self.u32((u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b));
    }
}

/// Reads big-endian records from a byte slice.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset into the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], PersistError> {
        let end = self.pos.checked_add(len).ok_or(PersistError::UnexpectedEof)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(PersistError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PersistError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn u8(&mut self) -> Result<u8, PersistError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, PersistError> {
        self.array().map(u16::from_be_bytes)
    }

    pub(crate) fn i16(&mut self) -> Result<i16, PersistError> {
        self.array().map(i16::from_be_bytes)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, PersistError> {
        self.array().map(u32::from_be_bytes)
    }

    pub(crate) fn u16_or_u32(&mut self) -> Result<u32, PersistError> {
        let high = self.u16()?;
        if high & 0x8000 == 0 {
            return Ok(u32::from(high));
        }
        let low = self.u16()?;
        Ok((u32::from(high & 0x7FFF) << 16) | u32::from(low))
    }

    pub(crate) fn string(&mut self) -> Result<Option<String>, PersistError> {
        let len = usize::from(self.u16()?);
        if len == 0 {
            return Ok(None);
        }
        let bytes = self.take(len)?;
        let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        Ok(Some(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub(crate) fn color(&mut self) -> Result<Rgba8, PersistError> {
        let r = self.u16()?;
        let g = self.u16()?;
        let b = self.u16()?;
        Ok(Rgba8 {
            r: (r >> 8) as u8,
            g: (g >> 8) as u8,
            b: (b >> 8) as u8,
            a: 255,
        })
    }

    pub(crate) fn packed_color(&mut self) -> Result<Rgba8, PersistError> {
        let [_, r, g, b] = self.u32()?.to_be_bytes();
        Ok(Rgba8 { r, g, b, a: 255 })
    }

    /// Moves to `pos`, which must not be before the current position.
    pub(crate) fn skip_to(&mut self, pos: usize) -> Result<(), PersistError> {
        if pos > self.data.len() {
            return Err(PersistError::UnexpectedEof);
        }
        self.pos = self.pos.max(pos);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_long_sizes() {
        let mut writer = Writer::new();
        writer.u16_or_u32(0x7FFF).unwrap();
        writer.u16_or_u32(0x8000).unwrap();
        assert_eq!(writer.as_bytes(), &[0x7F, 0xFF, 0x80, 0x00, 0x80, 0x00], "encoding");
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.u16_or_u32().unwrap(), 0x7FFF, "short form");
        assert_eq!(reader.u16_or_u32().unwrap(), 0x8000, "long form");
        assert!(reader.is_at_end(), "everything consumed");
    }

    #[test]
    fn absent_string_is_zero_length() {
        let mut writer = Writer::new();
        writer.string(None).unwrap();
        writer.string(Some("ab")).unwrap();
        assert_eq!(writer.as_bytes(), &[0, 0, 0, 3, b'a', b'b', 0], "encoding");
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.string().unwrap(), None, "absent");
        assert_eq!(reader.string().unwrap().as_deref(), Some("ab"), "present");
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut reader = Reader::new(&[0x12]);
        assert_eq!(reader.u16(), Err(PersistError::UnexpectedEof), "one byte short");
    }

    #[test]
    fn colors_keep_eight_bits() {
        let color = Rgba8 {
            r: 0x12,
            g: 0xAB,
            b: 0xFF,
            a: 255,
        };
        let mut writer = Writer::new();
        writer.color(color);
        writer.packed_color(color);
        let mut reader = Reader::new(writer.as_bytes());
        assert_eq!(reader.color().unwrap(), color, "wide channels");
        assert_eq!(reader.packed_color().unwrap(), color, "packed");
    }
}
