//! Line-end scanning and whitespace skipping.
//!
//! Text protocols delimit with CR, LF, or CRLF; the scanners here find
//! the end of the line starting at an offset, optionally treating the
//! contents of double-quoted strings as opaque (a `"` toggles quoting, and
//! CR/LF inside quotes do not terminate the line).

use crate::buffer::{check_offset_length, Tvb};
use crate::error::Result;

/// The result of a line scan: the line's length (terminator excluded) and
/// the offset of the first byte past the terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEnd {
    /// Bytes in the line, not counting the terminator.
    pub linelen: usize,
    /// Offset just past the line terminator (or the end of the window if
    /// no terminator was found).
    pub next_offset: usize,
}

const fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl Tvb {
    /// Resolves a scan window `[abs, abs + max)` clamped to captured data.
    fn line_window(&self, offset: isize, len: isize) -> Result<(usize, usize)> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        let remaining = self.node.len.get() - w.offset;
        let max = if len < 0 {
            remaining
        } else {
            remaining.min(len.unsigned_abs())
        };
        Ok((w.offset, max))
    }

    /// Finds the end of the line starting at `offset`, scanning at most
    /// `len` bytes (`-1` = to end of captured data).
    ///
    /// Returns `None` when no terminator was found and `desegment` is
    /// set — the caller should reassemble more data and retry. With
    /// `desegment` unset, a missing terminator pretends the line runs to
    /// the end of the window. A CR as the window's last byte is treated
    /// the same way under `desegment` (it might be half of a CRLF).
    pub fn find_line_end(
        &self,
        offset: isize,
        len: isize,
        desegment: bool,
    ) -> Result<Option<LineEnd>> {
        let (start, max) = self.line_window(offset, len)?;
        let eob = start + max;

        let Some(eol) = self.find_any_of(start as isize, max as isize, b"\r\n")? else {
            if desegment {
                return Ok(None);
            }
            return Ok(Some(LineEnd {
                linelen: max,
                next_offset: eob,
            }));
        };

        let linelen = eol - start;
        let mut end = eol;
        if self.get_u8(eol as isize)? == b'\r' {
            if eol + 1 >= eob {
                // The potential LF half is not in this window.
                if desegment {
                    return Ok(None);
                }
            } else if self.get_u8((eol + 1) as isize)? == b'\n' {
                end += 1;
            }
        }
        Ok(Some(LineEnd {
            linelen,
            next_offset: end + 1,
        }))
    }

    /// Like [`Tvb::find_line_end`], but newlines inside double-quoted
    /// strings do not terminate the line. Never desegments: a missing
    /// terminator pretends the line runs to the end of the window.
    pub fn find_line_end_unquoted(&self, offset: isize, len: isize) -> Result<LineEnd> {
        let (start, max) = self.line_window(offset, len)?;
        let eob = start + max;

        let mut cur = start;
        let mut quoted = false;
        loop {
            let limit = (eob - cur) as isize;
            let found = if quoted {
                self.find_byte(cur as isize, limit, b'"')?
            } else {
                self.find_any_of(cur as isize, limit, b"\r\n\"")?
            };
            let Some(pos) = found else {
                return Ok(LineEnd {
                    linelen: eob - start,
                    next_offset: eob,
                });
            };

            if quoted {
                // Must be the closing quote; we only searched for it.
                quoted = false;
            } else {
                let c = self.get_u8(pos as isize)?;
                if c == b'"' {
                    quoted = true;
                } else {
                    let mut end = pos;
                    if c == b'\r' && pos + 1 < eob && self.get_u8((pos + 1) as isize)? == b'\n' {
                        end += 1;
                    }
                    return Ok(LineEnd {
                        linelen: pos - start,
                        next_offset: end + 1,
                    });
                }
            }

            cur = pos + 1;
            if cur >= eob {
                // Quote was the window's last byte; the line is
                // presumably continued in the next packet.
                return Ok(LineEnd {
                    linelen: eob - start,
                    next_offset: eob,
                });
            }
        }
    }

    /// Returns the offset of the first non-whitespace byte at or after
    /// `offset`, looking at most `max` bytes and never past the captured
    /// data. Whitespace is ASCII space, tab, CR, and LF.
    pub fn skip_whitespace(&self, offset: isize, max: isize) -> Result<usize> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        let end = self
            .node
            .len
            .get()
            .min(w.offset.saturating_add(max.max(0).unsigned_abs()));
        let mut pos = w.offset;
        while pos < end && is_ws(self.get_u8(pos as isize)?) {
            pos += 1;
        }
        Ok(pos)
    }

    /// Scans backward from `offset` past whitespace and returns the
    /// offset one past the last non-whitespace byte encountered.
    pub fn skip_whitespace_rev(&self, offset: isize) -> Result<usize> {
        let w = check_offset_length(self.extent(), offset, 0)?;
        let mut pos = w.offset;
        while pos > 0 && is_ws(self.get_u8(pos as isize)?) {
            pos -= 1;
        }
        Ok(pos + 1)
    }
}
