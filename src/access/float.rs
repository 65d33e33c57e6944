//! IEEE-754 float accessors.
//!
//! Rust guarantees `f32`/`f64` are IEEE-754 binary32/binary64, so the
//! bit-pattern reinterpretation is the whole implementation; there is no
//! non-IEEE host to special-case.

use crate::buffer::Tvb;
use crate::error::Result;

impl Tvb {
    /// Reads a big-endian IEEE-754 single-precision float at `offset`.
    pub fn get_f32_be(&self, offset: isize) -> Result<f32> {
        Ok(f32::from_bits(self.get_u32_be(offset)?))
    }

    /// Reads a little-endian IEEE-754 single-precision float at `offset`.
    pub fn get_f32_le(&self, offset: isize) -> Result<f32> {
        Ok(f32::from_bits(self.get_u32_le(offset)?))
    }

    /// Reads a big-endian IEEE-754 double-precision float at `offset`.
    pub fn get_f64_be(&self, offset: isize) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64_be(offset)?))
    }

    /// Reads a little-endian IEEE-754 double-precision float at `offset`.
    pub fn get_f64_le(&self, offset: isize) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64_le(offset)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f32_both_orders() {
        let be = 1.5f32.to_be_bytes();
        let le = 1.5f32.to_le_bytes();
        let t = Tvb::new_real([be.as_slice(), le.as_slice()].concat(), 8).unwrap();
        assert_eq!(t.get_f32_be(0).unwrap(), 1.5);
        assert_eq!(t.get_f32_le(4).unwrap(), 1.5);
    }

    #[test]
    fn f64_round_trips_bit_patterns() {
        let v = -1234.5678e-9f64;
        let t = Tvb::new_real(v.to_be_bytes().to_vec(), 8).unwrap();
        assert_eq!(t.get_f64_be(0).unwrap().to_bits(), v.to_bits());
    }

    #[test]
    fn nan_payload_is_preserved() {
        let bits = 0x7FF8_0000_0000_1234u64;
        let t = Tvb::new_real(bits.to_be_bytes().to_vec(), 8).unwrap();
        let v = t.get_f64_be(0).unwrap();
        assert!(v.is_nan());
        assert_eq!(v.to_bits(), bits);
    }
}
