//! Growable output buffer for building LCI wire records.
//!
//! Octets are appended at the end; bit-packed fields are appended LSB-first
//! within each octet, the same ordering [`crate::BitReader`] reads. The
//! finished buffer is rendered as lowercase hex.
//!
//! ## Bit Ordering
//! - First bit appended goes to bit position 0 (LSB) of the current octet
//! - Bit 0 of a value is appended first
//!
//! Multi-octet integers are appended big-endian.

#![allow(clippy::cast_possible_truncation)]

use crate::error::{LciError, Result};

/// Output buffer with a separate bit cursor for packed fields.
#[derive(Clone, Debug, Default)]
pub struct BitBuffer {
    /// Octet storage.
    data: Vec<u8>,
    /// Total number of bits written through the bit cursor or octet appends.
    num_bits: usize,
}

impl BitBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with room for `octets` octets.
    pub fn with_capacity(octets: usize) -> Self {
        Self {
            data: Vec::with_capacity(octets),
            num_bits: 0,
        }
    }

    /// Number of octets started so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Total number of bits written.
    #[inline]
    pub fn bit_len(&self) -> usize {
        self.num_bits
    }

    /// Reserved capacity in octets.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Check that the bit cursor sits on an octet boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.num_bits % 8 == 0
    }

    /// Append one octet. Pads any partial octet first.
    pub fn push_octet(&mut self, octet: u8) {
        self.align();
        self.data.push(octet);
        self.num_bits += 8;
    }

    /// Append the low `count` octets (0-8) of `value`, big-endian.
    ///
    /// # Errors
    /// `InvalidBitCount` if `count > 8`.
    pub fn push_uint(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 8 {
            return Err(LciError::InvalidBitCount(count * 8));
        }
        for i in (0..count).rev() {
            self.push_octet((value >> (i * 8)) as u8);
        }
        Ok(())
    }

    /// Append raw octets.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.align();
        self.data.extend_from_slice(bytes);
        self.num_bits += bytes.len() * 8;
    }

    /// Append the low `count` bits (0-64) of `value`, LSB-first.
    ///
    /// # Errors
    /// `InvalidBitCount` if `count > 64`.
    pub fn append_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(LciError::InvalidBitCount(count));
        }
        let end = self.num_bits + count;
        self.data.resize((end + 7) / 8, 0);
        self.write_bits(self.num_bits, count, value)?;
        self.num_bits = end;
        Ok(())
    }

    /// Overwrite `count` bits at `bit_offset` with the low bits of `value`.
    ///
    /// Bits outside `bit_offset..bit_offset + count` are left untouched.
    ///
    /// # Errors
    /// - `InvalidBitCount` if `count > 64`
    /// - `OutOfBounds` if the range is not inside the written octets
    pub fn write_bits(&mut self, bit_offset: usize, count: usize, value: u64) -> Result<()> {
        if count > 64 {
            return Err(LciError::InvalidBitCount(count));
        }
        let available = self.data.len() * 8;
        if bit_offset.checked_add(count).map_or(true, |end| end > available) {
            return Err(LciError::OutOfBounds {
                offset: bit_offset,
                len: count,
                available,
            });
        }

        let mut done = 0usize;
        let mut pos = bit_offset;

        while done < count {
            let bit_in_octet = pos & 7;
            let put = (count - done).min(8 - bit_in_octet);

            let mask = (((1u16 << put) - 1) as u8) << bit_in_octet;
            let bits = (((value >> done) as u8) << bit_in_octet) & mask;

            let octet = &mut self.data[pos >> 3];
            *octet = (*octet & !mask) | bits;

            done += put;
            pos += put;
        }

        Ok(())
    }

    /// Overwrite octet `index`.
    ///
    /// # Errors
    /// `OutOfBounds` if `index` has not been written yet.
    pub fn write_octet(&mut self, index: usize, octet: u8) -> Result<()> {
        let available = self.data.len();
        let slot = self.data.get_mut(index).ok_or(LciError::OutOfBounds {
            offset: index,
            len: 1,
            available,
        })?;
        *slot = octet;
        Ok(())
    }

    /// Overwrite `count` octets (0-8) from `offset` with `value`, big-endian.
    ///
    /// # Errors
    /// - `InvalidBitCount` if `count > 8`
    /// - `OutOfBounds` if the octets have not been written yet
    pub fn write_uint(&mut self, offset: usize, count: usize, value: u64) -> Result<()> {
        if count > 8 {
            return Err(LciError::InvalidBitCount(count * 8));
        }
        if offset.checked_add(count).map_or(true, |end| end > self.data.len()) {
            return Err(LciError::OutOfBounds {
                offset,
                len: count,
                available: self.data.len(),
            });
        }
        for i in 0..count {
            self.data[offset + i] = (value >> ((count - 1 - i) * 8)) as u8;
        }
        Ok(())
    }

    /// Move the bit cursor to the next octet boundary.
    pub fn align(&mut self) {
        let rem = self.num_bits % 8;
        if rem != 0 {
            self.num_bits += 8 - rem;
        }
    }

    /// Borrow the written octets.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Render as lowercase hex, two characters per octet.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    /// Consume the buffer and return its octets.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let bb = BitBuffer::new();
        assert_eq!(bb.len(), 0);
        assert_eq!(bb.bit_len(), 0);
        assert!(bb.is_empty());
    }

    #[test]
    fn test_with_capacity() {
        let bb = BitBuffer::with_capacity(40);
        assert!(bb.capacity() >= 40);
        assert!(bb.is_empty());
    }

    #[test]
    fn test_push_octet_and_uint() {
        let mut bb = BitBuffer::new();
        bb.push_octet(0x01);
        bb.push_uint(0x0203, 2).unwrap();
        bb.push_uint(0x04_0506, 3).unwrap();
        assert_eq!(bb.as_bytes(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(bb.bit_len(), 48);
        assert!(bb.push_uint(0, 9).is_err());
    }

    #[test]
    fn test_append_bits_lsb_first() {
        let mut bb = BitBuffer::new();
        // 6 bits of 18 (01_0010) then 2 bits of 1 -> 0101_0010 = 0x52
        bb.append_bits(18, 6).unwrap();
        bb.append_bits(1, 2).unwrap();
        assert_eq!(bb.as_bytes(), &[0x52]);
        assert!(bb.is_aligned());
    }

    #[test]
    fn test_append_bits_across_octets() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0, 4).unwrap();
        bb.append_bits(0xFF, 8).unwrap();
        bb.append_bits(0, 4).unwrap();
        assert_eq!(bb.as_bytes(), &[0xF0, 0x0F]);
    }

    #[test]
    fn test_append_bits_64() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0x0123_4567_89AB_CDEF, 64).unwrap();
        assert_eq!(bb.to_hex(), "efcdab8967452301");
    }

    #[test]
    fn test_append_masks_high_bits() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0xFF, 3).unwrap();
        bb.append_bits(0, 5).unwrap();
        assert_eq!(bb.as_bytes(), &[0x07]);
    }

    #[test]
    fn test_write_bits_preserves_neighbours() {
        let mut bb = BitBuffer::new();
        bb.push_bytes(&[0xFF, 0xFF]);
        bb.write_bits(4, 8, 0).unwrap();
        assert_eq!(bb.as_bytes(), &[0x0F, 0xF0]);

        bb.write_bits(6, 2, 0b11).unwrap();
        assert_eq!(bb.as_bytes(), &[0xCF, 0xF0]);
    }

    #[test]
    fn test_write_bits_out_of_bounds() {
        let mut bb = BitBuffer::new();
        bb.push_octet(0);
        assert!(matches!(bb.write_bits(4, 8, 0), Err(LciError::OutOfBounds { .. })));
        assert_eq!(bb.write_bits(0, 65, 0), Err(LciError::InvalidBitCount(65)));
    }

    #[test]
    fn test_write_octet() {
        let mut bb = BitBuffer::new();
        bb.push_bytes(&[0x07, 0x00]);
        bb.write_octet(1, 0x13).unwrap();
        assert_eq!(bb.to_hex(), "0713");
        assert!(bb.write_octet(2, 0).is_err());
    }

    #[test]
    fn test_write_uint() {
        let mut bb = BitBuffer::new();
        bb.push_bytes(&[0; 4]);
        bb.write_uint(1, 2, 0x0102).unwrap();
        assert_eq!(bb.to_hex(), "00010200");
        assert!(matches!(bb.write_uint(3, 2, 0), Err(LciError::OutOfBounds { .. })));
        assert_eq!(bb.write_uint(0, 9, 0), Err(LciError::InvalidBitCount(72)));
    }

    #[test]
    fn test_push_octet_pads_partial() {
        let mut bb = BitBuffer::new();
        bb.append_bits(0b101, 3).unwrap();
        bb.push_octet(0xAA);
        assert_eq!(bb.as_bytes(), &[0x05, 0xAA]);
        assert_eq!(bb.bit_len(), 16);
    }

    #[test]
    fn test_to_hex_lowercase() {
        let mut bb = BitBuffer::new();
        bb.push_bytes(&[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(bb.to_hex(), "deadbeef");
        assert_eq!(bb.into_bytes(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
