//! Rendering byte ranges as printable text.
//!
//! The ASCII pretty-printing itself — which bytes pass through, which are
//! escaped, and how — belongs to the dissection engine's formatting
//! helpers, not to this crate. The methods here only resolve the byte
//! range (flattening a Composite if needed) and hand the bytes to the
//! formatter the caller supplies; the original's whitespace-aware
//! variants are just a different formatter passed in. The `stringzpad`
//! form stops at the first zero byte inside the range, for null-padded
//! fixed-width fields.
//!
//! The hex renderers ([`Tvb::bytes_to_str`], [`Tvb::bytes_to_str_punct`])
//! are part of this surface proper and need no collaborator.

use crate::buffer::Tvb;
use crate::error::Result;

fn strip_at_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(pos) => &bytes[..pos],
        None => bytes,
    }
}

impl Tvb {
    /// Resolves `size` bytes at `offset` and renders them with the
    /// caller's formatter.
    pub fn format_text<F>(&self, offset: isize, size: isize, formatter: F) -> Result<String>
    where
        F: FnOnce(&[u8]) -> String,
    {
        Ok(formatter(&self.get_bytes(offset, size)?))
    }

    /// Like [`Tvb::format_text`], but the rendered range stops at the
    /// first zero byte; trailing null padding is never shown.
    pub fn format_stringzpad<F>(&self, offset: isize, size: isize, formatter: F) -> Result<String>
    where
        F: FnOnce(&[u8]) -> String,
    {
        Ok(formatter(strip_at_nul(&self.get_bytes(offset, size)?)))
    }

    /// Renders `len` bytes at `offset` as lowercase hex.
    pub fn bytes_to_str(&self, offset: isize, len: isize) -> Result<String> {
        let b = self.get_bytes(offset, len)?;
        let mut out = String::with_capacity(b.len() * 2);
        for byte in b.iter() {
            out.push_str(&format!("{byte:02x}"));
        }
        Ok(out)
    }

    /// Renders `len` bytes at `offset` as lowercase hex with `punct`
    /// between bytes, e.g. `aa:bb:cc` for a MAC address.
    pub fn bytes_to_str_punct(&self, offset: isize, len: isize, punct: char) -> Result<String> {
        let b = self.get_bytes(offset, len)?;
        let mut out = String::with_capacity(b.len() * 3);
        for (i, byte) in b.iter().enumerate() {
            if i > 0 {
                out.push(punct);
            }
            out.push_str(&format!("{byte:02x}"));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(bytes: &'static [u8]) -> Tvb {
        Tvb::new_real(bytes, bytes.len() as isize).unwrap()
    }

    /// Stand-in for the engine's pretty-printer: printable ASCII passes,
    /// everything else becomes `.`.
    fn dots(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| if (0x20..=0x7E).contains(&b) { char::from(b) } else { '.' })
            .collect()
    }

    #[test]
    fn formatter_receives_the_resolved_range() {
        let t = real(b"GET / HTTP/1.1\r\n");
        assert_eq!(t.format_text(0, 5, dots).unwrap(), "GET /");
        assert_eq!(t.format_text(0, -1, dots).unwrap(), "GET / HTTP/1.1..");
        // The formatter is the caller's choice, not baked in.
        assert_eq!(t.format_text(0, 3, |b| format!("{}b", b.len())).unwrap(), "3b");
    }

    #[test]
    fn format_text_bounds_check_precedes_delegation() {
        let t = real(b"abc");
        assert!(t.format_text(0, 4, dots).is_err());
        assert!(t.format_text(5, 1, dots).is_err());
    }

    #[test]
    fn stringzpad_stops_at_nul() {
        let t = real(b"name\0\0\0\0");
        assert_eq!(t.format_stringzpad(0, 8, dots).unwrap(), "name");
        // No zero byte in range: the whole range is rendered.
        assert_eq!(t.format_stringzpad(0, 4, dots).unwrap(), "name");
    }

    #[test]
    fn stringzpad_works_through_composite() {
        let a = real(b"ab");
        let b = real(b"c\0dd");
        let comp = Tvb::composite().append(&a).append(&b).finalize();
        assert_eq!(comp.format_stringzpad(0, -1, dots).unwrap(), "abc");
    }

    #[test]
    fn hex_rendering() {
        let t = real(&[0xDE, 0xAD, 0xBE]);
        assert_eq!(t.bytes_to_str(0, -1).unwrap(), "deadbe");
        assert_eq!(t.bytes_to_str_punct(0, -1, ':').unwrap(), "de:ad:be");
    }
}
