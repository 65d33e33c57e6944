//! String extraction and comparison.
//!
//! Null-terminated strings come in three shapes: auto-length
//! ([`Tvb::get_stringz`], which errors if the terminator is missing),
//! fixed-length ([`Tvb::get_string`]), and caller-buffer
//! ([`Tvb::get_nstringz`], which truncates instead of erroring when the
//! packet runs out under the caller's buffer). The `_in` variants place
//! the copy in an arena scope instead of the heap.

use crate::access::Endian;
use crate::arena::Arena;
use crate::buffer::{check_offset_length, Tvb};
use crate::bytes::Bytes;
use crate::error::{BoundsError, Result};

/// Outcome of a caller-buffer string copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nstringz {
    /// The terminator was found; `len` excludes it, `copied` includes it.
    Terminated {
        /// String length, terminator excluded.
        len: usize,
        /// Bytes written to the caller's buffer, terminator included.
        copied: usize,
    },
    /// No terminator within reach; `copied` bytes were written.
    Truncated {
        /// Bytes written to the caller's buffer.
        copied: usize,
    },
}

impl Tvb {
    /// Size of the null-terminated string at `offset`, terminator
    /// included.
    ///
    /// Errors if no terminator exists before the end of the buffer; the
    /// kind says whether the capture ran short of the wire data
    /// (truncated) or the string runs off the packet (malformed).
    pub fn strsize(&self, offset: isize) -> Result<usize> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        match self.find_byte(w.offset as isize, -1, 0)? {
            Some(nul) => Ok(nul - w.offset + 1),
            None => {
                if self.len() < self.reported_len() {
                    Err(BoundsError::captured())
                } else {
                    Err(BoundsError::reported())
                }
            }
        }
    }

    /// Length of the null-terminated string at `offset`, terminator
    /// excluded, looking at most `max` bytes. `None` if no terminator was
    /// found in the window.
    pub fn strnlen(&self, offset: isize, max: isize) -> Result<Option<usize>> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        Ok(self
            .find_byte(w.offset as isize, max, 0)?
            .map(|pos| pos - w.offset))
    }

    /// Copies `length` bytes at `offset` as a (non-terminated) string.
    ///
    /// Any negative length is rejected; size the read from the protocol's
    /// length field.
    pub fn get_string(&self, offset: isize, length: isize) -> Result<Vec<u8>> {
        self.ensure_bytes_exist(offset, length)?;
        self.memdup(offset, length)
    }

    /// Like [`Tvb::get_string`], but the copy lives in `arena`'s scope.
    pub fn get_string_in(&self, arena: &Arena, offset: isize, length: isize) -> Result<Bytes> {
        self.ensure_bytes_exist(offset, length)?;
        self.memdup_in(arena, offset, length)
    }

    /// Copies the null-terminated string at `offset`. Returns the string
    /// bytes (terminator excluded) and the number of bytes consumed
    /// (terminator included).
    pub fn get_stringz(&self, offset: isize) -> Result<(Vec<u8>, usize)> {
        let size = self.strsize(offset)?;
        let mut v = self.memdup(offset, size as isize)?;
        v.pop();
        Ok((v, size))
    }

    /// Like [`Tvb::get_stringz`], but the copy lives in `arena`'s scope.
    pub fn get_stringz_in(&self, arena: &Arena, offset: isize) -> Result<(Bytes, usize)> {
        let (v, size) = self.get_stringz(offset)?;
        Ok((arena.store(v), size))
    }

    /// Copies at most `buf.len()` bytes of the null-terminated string at
    /// `offset` into `buf`, terminator included.
    ///
    /// If the remaining capture is shorter than `buf`, reaching the end
    /// of the packet is not an error: the copy is terminated in place and
    /// reported as [`Nstringz::Truncated`]. A terminator is only missing
    /// from `buf` when the string filled it completely.
    ///
    /// # Panics
    ///
    /// Panics if `buf` is empty — there must at least be room for the
    /// terminator.
    pub fn get_nstringz(&self, offset: isize, buf: &mut [u8]) -> Result<Nstringz> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        assert!(!buf.is_empty(), "get_nstringz needs room for the terminator");
        if buf.len() == 1 {
            buf[0] = 0;
            return Ok(Nstringz::Terminated { len: 0, copied: 1 });
        }

        let remaining = self.len() - w.offset;
        if remaining == 0 {
            return Err(BoundsError::reported());
        }
        let (limit, clamped) = if remaining < buf.len() {
            (remaining, true)
        } else {
            (buf.len(), false)
        };

        match self.strnlen(w.offset as isize, (limit - 1) as isize)? {
            Some(len) => {
                self.copy_abs(w.offset, len + 1, &mut buf[..len + 1]);
                Ok(Nstringz::Terminated {
                    len,
                    copied: len + 1,
                })
            }
            None => {
                self.copy_abs(w.offset, limit, &mut buf[..limit]);
                if clamped {
                    buf[limit] = 0;
                    Ok(Nstringz::Truncated { copied: limit + 1 })
                } else {
                    Ok(Nstringz::Truncated { copied: limit })
                }
            }
        }
    }

    /// Like [`Tvb::get_nstringz`], but `buf` is always terminated: on
    /// truncation the last byte becomes the terminator. Returns the
    /// length of the string left in `buf`.
    pub fn get_nstringz0(&self, offset: isize, buf: &mut [u8]) -> Result<usize> {
        match self.get_nstringz(offset, buf)? {
            Nstringz::Terminated { len, .. } => Ok(len),
            Nstringz::Truncated { copied } => {
                buf[buf.len() - 1] = 0;
                Ok(copied - 1)
            }
        }
    }

    /// Flattens `wordcount` 16-bit units at `offset` into an ASCII-ish
    /// string: units below 256 pass through, everything else becomes
    /// `'.'`. The whole `2 × wordcount` range is bounds-checked up front.
    pub fn fake_unicode(&self, offset: isize, wordcount: usize, endian: Endian) -> Result<String> {
        let byte_len = wordcount
            .checked_mul(2)
            .and_then(|n| isize::try_from(n).ok())
            .ok_or_else(BoundsError::reported)?;
        self.ensure_bytes_exist(offset, byte_len)?;

        let mut s = String::with_capacity(wordcount);
        let mut off = offset;
        for _ in 0..wordcount {
            let unit = match endian {
                Endian::Little => self.get_u16_le(off)?,
                Endian::Big => self.get_u16_be(off)?,
            };
            s.push(if unit < 256 { char::from(unit as u8) } else { '.' });
            off += 2;
        }
        Ok(s)
    }

    /// Compares `other.len()` bytes at `offset` with `other`. Fewer
    /// available bytes than `other` is "not equal", never an error.
    #[must_use]
    pub fn memeql(&self, offset: isize, other: &[u8]) -> bool {
        match self.get_bytes(offset, other.len() as isize) {
            Ok(b) => b.as_slice() == other,
            Err(_) => false,
        }
    }

    /// String form of [`Tvb::memeql`].
    #[must_use]
    pub fn strneql(&self, offset: isize, other: &str) -> bool {
        self.memeql(offset, other.as_bytes())
    }

    /// ASCII case-insensitive form of [`Tvb::strneql`].
    #[must_use]
    pub fn strncaseeql(&self, offset: isize, other: &str) -> bool {
        match self.get_bytes(offset, other.len() as isize) {
            Ok(b) => b.as_slice().eq_ignore_ascii_case(other.as_bytes()),
            Err(_) => false,
        }
    }
}
