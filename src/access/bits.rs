//! Packed bit-field accessors.
//!
//! A field is addressed by an absolute *bit* offset and a width of 1–64
//! bits. The byte-aligned offset is `bit_offset >> 3`, the intra-byte
//! offset `bit_offset & 7`. The smallest covering read from the ladder
//! 1, 2, 4, 8, or 9 whole octets is fetched big-endian, the leading
//! intra-byte bits are masked off, and the value is shifted flush-right.
//! A field spilling into a ninth octet reads one more byte and ORs in its
//! top bits.
//!
//! Little-endian *bit* ordering is a programmer-contract violation, not a
//! wire condition: it panics rather than erroring.

use crate::access::Endian;
use crate::buffer::Tvb;
use crate::error::Result;

/// Keeps the low `low_bits` bits of `value`.
const fn mask_keep(value: u64, low_bits: usize) -> u64 {
    if low_bits >= 64 {
        value
    } else {
        value & ((1u64 << low_bits) - 1)
    }
}

/// Masks the intra-byte lead-in out of a `bits`-wide big-endian read and
/// shifts the field flush-right.
const fn extract(value: u64, bits: usize, intra: usize, tot: usize) -> u64 {
    mask_keep(value, bits - intra) >> (bits - tot)
}

impl Tvb {
    fn bits_be(&self, bit_offset: usize, width: usize) -> Result<u64> {
        let byte_off = (bit_offset >> 3) as isize;
        let intra = bit_offset & 7;
        let tot = intra + width;
        let covering = (tot + 7) / 8;
        Ok(match covering {
            1 => extract(u64::from(self.get_u8(byte_off)?), 8, intra, tot),
            2 => extract(u64::from(self.get_u16_be(byte_off)?), 16, intra, tot),
            3 | 4 => extract(u64::from(self.get_u32_be(byte_off)?), 32, intra, tot),
            5..=8 => extract(self.get_u64_be(byte_off)?, 64, intra, tot),
            9 => {
                let head = mask_keep(self.get_u64_be(byte_off)?, 64 - intra);
                let tail = self.get_u8(byte_off + 8)?;
                (head << (tot - 64)) | u64::from(tail >> (72 - tot))
            }
            _ => unreachable!("bit field wider than 64 bits"),
        })
    }

    /// Reads a 1–8 bit field starting at `bit_offset`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside `1..=8`.
    pub fn get_bits8(&self, bit_offset: usize, width: usize) -> Result<u8> {
        assert!(
            (1..=8).contains(&width),
            "get_bits8 width {width} outside 1..=8"
        );
        Ok(self.bits_be(bit_offset, width)? as u8)
    }

    /// Reads an 8–16 bit field starting at `bit_offset`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside `8..=16`, or on little-endian bit
    /// ordering (not implemented).
    pub fn get_bits16(&self, bit_offset: usize, width: usize, endian: Endian) -> Result<u16> {
        assert!(
            (8..=16).contains(&width),
            "get_bits16 width {width} outside 8..=16"
        );
        reject_little_endian(endian);
        Ok(self.bits_be(bit_offset, width)? as u16)
    }

    /// Reads a 17–32 bit field starting at `bit_offset`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside `17..=32`, or on little-endian bit
    /// ordering (not implemented).
    pub fn get_bits32(&self, bit_offset: usize, width: usize, endian: Endian) -> Result<u32> {
        assert!(
            (17..=32).contains(&width),
            "get_bits32 width {width} outside 17..=32"
        );
        reject_little_endian(endian);
        Ok(self.bits_be(bit_offset, width)? as u32)
    }

    /// Reads a 32–64 bit field starting at `bit_offset`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside `32..=64`, or on little-endian bit
    /// ordering (not implemented).
    pub fn get_bits64(&self, bit_offset: usize, width: usize, endian: Endian) -> Result<u64> {
        assert!(
            (32..=64).contains(&width),
            "get_bits64 width {width} outside 32..=64"
        );
        reject_little_endian(endian);
        self.bits_be(bit_offset, width)
    }

    /// Reads a field of any width from 1 to 64 bits.
    ///
    /// # Panics
    ///
    /// Panics if `width` is outside `1..=64`, or on little-endian bit
    /// ordering (not implemented).
    pub fn get_bits(&self, bit_offset: usize, width: usize, endian: Endian) -> Result<u64> {
        assert!(
            (1..=64).contains(&width),
            "get_bits width {width} outside 1..=64"
        );
        reject_little_endian(endian);
        self.bits_be(bit_offset, width)
    }
}

fn reject_little_endian(endian: Endian) {
    assert!(
        endian == Endian::Big,
        "little-endian bit ordering is not implemented"
    );
}
