//! Fixed-width integer accessors, network order and little-endian.

use crate::buffer::Tvb;
use crate::error::Result;

impl Tvb {
    /// Reads one byte at `offset`.
    pub fn get_u8(&self, offset: isize) -> Result<u8> {
        Ok(self.fast_bytes::<1>(offset)?[0])
    }

    /// Reads a big-endian (network order) `u16` at `offset`.
    pub fn get_u16_be(&self, offset: isize) -> Result<u16> {
        Ok(u16::from_be_bytes(self.fast_bytes::<2>(offset)?))
    }

    /// Reads a little-endian `u16` at `offset`.
    pub fn get_u16_le(&self, offset: isize) -> Result<u16> {
        Ok(u16::from_le_bytes(self.fast_bytes::<2>(offset)?))
    }

    /// Reads a big-endian 24-bit value at `offset`, zero-extended.
    pub fn get_u24_be(&self, offset: isize) -> Result<u32> {
        let b = self.fast_bytes::<3>(offset)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Reads a little-endian 24-bit value at `offset`, zero-extended.
    pub fn get_u24_le(&self, offset: isize) -> Result<u32> {
        let b = self.fast_bytes::<3>(offset)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    /// Reads a big-endian (network order) `u32` at `offset`.
    pub fn get_u32_be(&self, offset: isize) -> Result<u32> {
        Ok(u32::from_be_bytes(self.fast_bytes::<4>(offset)?))
    }

    /// Reads a little-endian `u32` at `offset`.
    pub fn get_u32_le(&self, offset: isize) -> Result<u32> {
        Ok(u32::from_le_bytes(self.fast_bytes::<4>(offset)?))
    }

    /// Reads a big-endian (network order) `u64` at `offset`.
    pub fn get_u64_be(&self, offset: isize) -> Result<u64> {
        Ok(u64::from_be_bytes(self.fast_bytes::<8>(offset)?))
    }

    /// Reads a little-endian `u64` at `offset`.
    pub fn get_u64_le(&self, offset: isize) -> Result<u64> {
        Ok(u64::from_le_bytes(self.fast_bytes::<8>(offset)?))
    }
}
