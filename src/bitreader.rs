//! Bit and octet access over LCI wire text.
//!
//! The wire form is a hexadecimal string, two characters per octet. This
//! reader decodes octets lazily so that a bad digit only spoils the
//! subelement that contains it.
//!
//! ## Bit Ordering
//! Bit-packed fields (the geodetic subelement) are read LSB-first within each
//! octet:
//! - Bit position 0 of a window is bit 0 (LSB) of its first octet
//! - Bit position 7 is bit 7 (MSB) of its first octet
//! - The first bit read becomes bit 0 of the result
//!
//! Byte-granular integers are big-endian at the octet level.

#![allow(clippy::cast_possible_truncation)]

use crate::error::{LciError, Result};

/// Read-only view of a run of octets in hex wire text.
///
/// Offsets passed to the accessors are relative to the start of the window,
/// so subelement codecs see their payload starting at octet 0. A sequential
/// bit cursor is kept alongside for the bit-packed fields.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    /// Hex characters covering exactly this window.
    text: &'a [u8],
    /// Character index of `text[0]` in the full input, for error reporting.
    base: usize,
    /// Sequential cursor, in bits.
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader over the whole of `hex`.
    ///
    /// A trailing odd character is not part of any octet and is ignored;
    /// use [`BitReader::has_odd_tail`] on the full text to detect it.
    pub fn new(hex: &'a str) -> Self {
        let text = hex.as_bytes();
        let even = text.len() & !1;
        Self {
            text: &text[..even],
            base: 0,
            bit_pos: 0,
        }
    }

    /// Whether `hex` has an odd number of characters.
    pub fn has_odd_tail(hex: &str) -> bool {
        hex.len() % 2 == 1
    }

    /// Number of whole octets in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len() / 2
    }

    /// Check if the window holds no octets.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Sub-window of `len` octets starting at `offset`.
    ///
    /// # Errors
    /// `OutOfBounds` if the range extends past this window.
    pub fn window(&self, offset: usize, len: usize) -> Result<BitReader<'a>> {
        self.check_octets(offset, len)?;
        Ok(BitReader {
            text: &self.text[offset * 2..(offset + len) * 2],
            base: self.base + offset * 2,
            bit_pos: 0,
        })
    }

    fn check_octets(&self, offset: usize, len: usize) -> Result<()> {
        if offset.checked_add(len).map_or(true, |end| end > self.len()) {
            return Err(LciError::OutOfBounds {
                offset,
                len,
                available: self.len(),
            });
        }
        Ok(())
    }

    /// Decode octet `index` from its two hex digits (big-endian nibbles).
    ///
    /// # Errors
    /// - `OutOfBounds` if `index` is past the window
    /// - `InvalidHexDigit` if either character is not a hex digit
    pub fn read_octet(&self, index: usize) -> Result<u8> {
        self.check_octets(index, 1)?;
        let pair = &self.text[index * 2..index * 2 + 2];
        let mut out = [0u8; 1];
        hex::decode_to_slice(pair, &mut out).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index: i } => LciError::InvalidHexDigit {
                index: self.base + index * 2 + i,
                found: c,
            },
            _ => LciError::InvalidHexDigit {
                index: self.base + index * 2,
                found: char::from(pair[0]),
            },
        })?;
        Ok(out[0])
    }

    /// The window's hex characters as received.
    pub fn raw_text(&self) -> String {
        String::from_utf8_lossy(self.text).into_owned()
    }

    /// Decode every octet of the window.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        (0..self.len()).map(|i| self.read_octet(i)).collect()
    }

    /// Read a big-endian unsigned integer of `count` octets (0-8).
    ///
    /// # Errors
    /// - `InvalidBitCount` if `count > 8`
    /// - `OutOfBounds` / `InvalidHexDigit` from the octet reads
    pub fn read_uint(&self, offset: usize, count: usize) -> Result<u64> {
        if count > 8 {
            return Err(LciError::InvalidBitCount(count * 8));
        }
        self.check_octets(offset, count)?;

        let mut value = 0u64;
        for i in offset..offset + count {
            value = (value << 8) | u64::from(self.read_octet(i)?);
        }
        Ok(value)
    }

    /// Read `count` bits (0-64) starting at `bit_offset`, LSB-first.
    ///
    /// # Returns
    /// The bits right-justified; the first bit read is bit 0 of the result.
    ///
    /// # Errors
    /// - `InvalidBitCount` if `count > 64`
    /// - `OutOfBounds` if the range extends past the window
    pub fn read_bits(&self, bit_offset: usize, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(LciError::InvalidBitCount(count));
        }
        if count == 0 {
            return Ok(0);
        }
        let available = self.len() * 8;
        if bit_offset.checked_add(count).map_or(true, |end| end > available) {
            return Err(LciError::OutOfBounds {
                offset: bit_offset,
                len: count,
                available,
            });
        }

        let mut value = 0u64;
        let mut done = 0usize;
        let mut pos = bit_offset;

        while done < count {
            let octet = self.read_octet(pos >> 3)?;
            let bit_in_octet = pos & 7;
            let take = (count - done).min(8 - bit_in_octet);

            // LSB-first: lower bits of the octet come first
            let mask = ((1u16 << take) - 1) as u8;
            let bits = (octet >> bit_in_octet) & mask;

            value |= u64::from(bits) << done;
            done += take;
            pos += take;
        }

        Ok(value)
    }

    /// Read the next `count` bits at the cursor and advance it.
    pub fn take_bits(&mut self, count: usize) -> Result<u64> {
        let value = self.read_bits(self.bit_pos, count)?;
        self.bit_pos += count;
        Ok(value)
    }

    /// Current cursor position in bits.
    #[inline]
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Bits left between the cursor and the end of the window.
    #[inline]
    pub fn remaining(&self) -> usize {
        (self.len() * 8).saturating_sub(self.bit_pos)
    }
}
