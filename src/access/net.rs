//! Network-type accessors: IPv4/IPv6 addresses and GUIDs.

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::buffer::Tvb;
use crate::error::Result;

/// Byte-order selector for accessors whose wire format varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Network order.
    Big,
    /// Little-endian.
    Little,
}

/// A 16-byte GUID as carried on the wire: one 32-bit word, two 16-bit
/// words, and an eight-byte trailer that is never byte-swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    /// First field, 32 bits.
    pub data1: u32,
    /// Second field, 16 bits.
    pub data2: u16,
    /// Third field, 16 bits.
    pub data3: u16,
    /// Trailing eight bytes, order-independent.
    pub data4: [u8; 8],
}

impl Tvb {
    /// Reads an IPv4 address at `offset`, preserving network byte order.
    ///
    /// The four bytes are taken as they sit on the wire; no host
    /// conversion happens.
    pub fn get_ipv4(&self, offset: isize) -> Result<Ipv4Addr> {
        Ok(Ipv4Addr::from(self.fast_bytes::<4>(offset)?))
    }

    /// Reads an IPv6 address at `offset`.
    pub fn get_ipv6(&self, offset: isize) -> Result<Ipv6Addr> {
        let b = self.get_bytes(offset, 16)?;
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&b[..]);
        Ok(Ipv6Addr::from(octets))
    }

    /// Reads a GUID at `offset` in the given byte order.
    ///
    /// Only the three leading fields are byte-swapped; the trailer is
    /// copied verbatim either way.
    pub fn get_guid(&self, offset: isize, endian: Endian) -> Result<Guid> {
        // One check up front so a short buffer fails before partial reads.
        self.ensure_bytes_exist(offset, 16)?;
        let (data1, data2, data3) = match endian {
            Endian::Big => (
                self.get_u32_be(offset)?,
                self.get_u16_be(offset + 4)?,
                self.get_u16_be(offset + 6)?,
            ),
            Endian::Little => (
                self.get_u32_le(offset)?,
                self.get_u16_le(offset + 4)?,
                self.get_u16_le(offset + 6)?,
            ),
        };
        let mut data4 = [0u8; 8];
        self.copy_into(&mut data4, offset + 8, 8)?;
        Ok(Guid {
            data1,
            data2,
            data3,
            data4,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID_BYTES: [u8; 16] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
        0x0F, 0x10,
    ];

    #[test]
    fn ipv4_stays_in_network_order() {
        let t = Tvb::new_real([192u8, 0, 2, 1].to_vec(), 4).unwrap();
        assert_eq!(t.get_ipv4(0).unwrap(), Ipv4Addr::new(192, 0, 2, 1));
    }

    #[test]
    fn ipv6_copies_sixteen_bytes() {
        let t = Tvb::new_real(GUID_BYTES.to_vec(), 16).unwrap();
        let addr = t.get_ipv6(0).unwrap();
        assert_eq!(addr.octets(), GUID_BYTES);
    }

    #[test]
    fn guid_endianness_affects_leading_fields_only() {
        let t = Tvb::new_real(GUID_BYTES.to_vec(), 16).unwrap();
        let be = t.get_guid(0, Endian::Big).unwrap();
        assert_eq!(be.data1, 0x0102_0304);
        assert_eq!(be.data2, 0x0506);
        assert_eq!(be.data3, 0x0708);
        let le = t.get_guid(0, Endian::Little).unwrap();
        assert_eq!(le.data1, 0x0403_0201);
        assert_eq!(le.data2, 0x0605);
        assert_eq!(le.data3, 0x0807);
        assert_eq!(be.data4, le.data4);
        assert_eq!(&be.data4[..], &GUID_BYTES[8..]);
    }

    #[test]
    fn guid_short_buffer_fails_before_partial_read() {
        let t = Tvb::new_real(GUID_BYTES[..10].to_vec(), 16).unwrap();
        assert!(t.get_guid(0, Endian::Big).unwrap_err().is_captured());
    }
}
