//! Byte and sub-buffer search.
//!
//! Searches never error once the starting offset normalizes: a search
//! window that runs past the captured data is clamped to it, and "not
//! found" is `None`, not a bounds error. Offsets in results are always
//! relative to the queried buffer.
//!
//! On a Composite whose range has not been flattened, the generic path
//! materializes the window first; the cache then serves every later scan.

use crate::buffer::{check_offset_length, Tvb};
use crate::error::Result;

impl Tvb {
    /// Resolves the absolute start and the clamped search window for a
    /// scan beginning at `offset` over at most `max` bytes (`-1`, or any
    /// negative, meaning "to the end of the captured data").
    fn scan_window(&self, offset: isize, max: isize) -> Result<(usize, usize)> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        let remaining = self.node.len.get() - w.offset;
        let limit = if max < 0 {
            remaining
        } else {
            remaining.min(max.unsigned_abs())
        };
        Ok((w.offset, limit))
    }

    /// Finds the first occurrence of `needle` at or after `offset`,
    /// searching at most `max` bytes (`-1` = to end of captured data).
    ///
    /// Errors only if `offset` itself is out of range; running out of
    /// window is `Ok(None)`.
    pub fn find_byte(&self, offset: isize, max: isize, needle: u8) -> Result<Option<usize>> {
        let (start, limit) = self.scan_window(offset, max)?;
        if limit == 0 {
            return Ok(None);
        }
        let hay = self.contiguous_abs(start, limit);
        Ok(hay.iter().position(|&b| b == needle).map(|pos| start + pos))
    }

    /// Finds the first occurrence of any byte in `needles` at or after
    /// `offset`, searching at most `max` bytes (`-1` = to end).
    pub fn find_any_of(&self, offset: isize, max: isize, needles: &[u8]) -> Result<Option<usize>> {
        let (start, limit) = self.scan_window(offset, max)?;
        if limit == 0 {
            return Ok(None);
        }
        let hay = self.contiguous_abs(start, limit);
        Ok(hay
            .iter()
            .position(|b| needles.contains(b))
            .map(|pos| start + pos))
    }

    /// Finds the bytes of `needle` inside this buffer at or after `from`.
    ///
    /// Both buffers are materialized contiguous first. An empty haystack
    /// or needle never matches.
    pub fn find_sub_buffer(&self, needle: &Tvb, from: isize) -> Result<Option<usize>> {
        if self.len() < 1 || needle.len() < 1 {
            return Ok(None);
        }
        let hay = self.get_bytes(0, -1)?;
        let ndl = needle.get_bytes(0, -1)?;
        let w = check_offset_length(self.extent(), from, -1)?;
        if ndl.len() > w.length {
            return Ok(None);
        }
        let window = &hay[w.offset..w.offset + w.length];
        Ok(window
            .windows(ndl.len())
            .position(|chunk| chunk == &ndl[..])
            .map(|pos| w.offset + pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(bytes: &'static [u8]) -> Tvb {
        Tvb::new_real(bytes, bytes.len() as isize).unwrap()
    }

    #[test]
    fn find_byte_basics() {
        let t = real(b"abcabc");
        assert_eq!(t.find_byte(0, -1, b'b').unwrap(), Some(1));
        assert_eq!(t.find_byte(2, -1, b'b').unwrap(), Some(4));
        assert_eq!(t.find_byte(0, -1, b'z').unwrap(), None);
    }

    #[test]
    fn find_byte_respects_max() {
        let t = real(b"abcabc");
        assert_eq!(t.find_byte(0, 4, b'b').unwrap(), Some(1));
        assert_eq!(t.find_byte(2, 2, b'b').unwrap(), None);
        // A max past the end clamps instead of erroring.
        assert_eq!(t.find_byte(4, 100, b'c').unwrap(), Some(5));
    }

    #[test]
    fn find_byte_bad_offset_errors() {
        let t = real(b"abc");
        assert!(t.find_byte(7, -1, b'a').is_err());
    }

    #[test]
    fn find_any_of_picks_earliest() {
        let t = real(b"hello\r\nworld");
        assert_eq!(t.find_any_of(0, -1, b"\r\n").unwrap(), Some(5));
        assert_eq!(t.find_any_of(6, -1, b"\r\n").unwrap(), Some(6));
        assert_eq!(t.find_any_of(7, -1, b"\r\n").unwrap(), None);
    }

    #[test]
    fn find_in_subset_is_subset_relative() {
        let root = real(b"xxabcxx");
        let sub = root.subset(2, 3, -1).unwrap();
        assert_eq!(sub.find_byte(0, -1, b'c').unwrap(), Some(2));
    }

    #[test]
    fn find_across_composite_members() {
        let a = real(b"ab");
        let b = real(b"cd");
        let comp = Tvb::composite().append(&a).append(&b).finalize();
        // The needle straddles the member boundary.
        assert_eq!(comp.find_byte(0, -1, b'c').unwrap(), Some(2));
        assert_eq!(comp.find_any_of(1, -1, b"dz").unwrap(), Some(3));
    }

    #[test]
    fn find_sub_buffer_locates_needle() {
        let hay = real(b"the quick brown fox");
        let needle = real(b"brown");
        assert_eq!(hay.find_sub_buffer(&needle, 0).unwrap(), Some(10));
        assert_eq!(hay.find_sub_buffer(&needle, 11).unwrap(), None);
        let missing = real(b"green");
        assert_eq!(hay.find_sub_buffer(&missing, 0).unwrap(), None);
    }
}
