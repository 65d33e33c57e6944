//! Decompression of zlib, gzip, and raw deflate payloads.
//!
//! [`Tvb::uncompress`] copies the compressed range into a scratch buffer
//! (the decoder needs stable input), inflates it, and wraps the result in
//! a new Real buffer. Wire reality drives a small retry ladder, bounded
//! by an initialization counter:
//!
//! 1. Try zlib.
//! 2. On a data error with the gzip magic at the front, skip the gzip
//!    header by hand — every advance bounds-checked against the end of
//!    the compressed range — and retry as raw deflate over the payload.
//! 3. On a data error with no output yet, retry as raw deflate (some
//!    servers send deflate without the zlib header).
//!
//! A stream that runs out of input mid-way is not an error if it already
//! produced bytes: the caller gets the partial result with
//! [`Inflated::complete`] unset, and can tell it apart from a clean end
//! of stream.

use flate2::{Decompress, FlushDecompress, Status};
use thiserror::Error;
use tracing::{debug, trace};

use crate::buffer::Tvb;
use crate::error::BoundsError;

const MIN_BUFSIZ: usize = 32 * 1024;
const MAX_BUFSIZ: usize = 10 * 1024 * 1024;

/// Why a decompression attempt produced nothing.
#[derive(Debug, Error)]
pub enum InflateError {
    /// The compressed range itself failed the bounds check.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
    /// The gzip header is malformed, or ends before its optional
    /// fields do.
    #[error("gzip header is malformed or truncated")]
    Header,
    /// The stream is not zlib, gzip, or raw deflate.
    #[error("compressed stream is corrupt")]
    Corrupt,
    /// The stream is plausible but ended before producing any data.
    #[error("compressed stream ended before producing any data")]
    Exhausted,
}

/// A successful decompression: the new Real buffer and whether the
/// stream ran to its end-of-stream marker.
#[derive(Debug)]
pub struct Inflated {
    /// Real buffer owning the decompressed bytes.
    pub tvb: Tvb,
    /// True if the deflate stream terminated properly; false if input
    /// ran out (or went bad) after some output was produced.
    pub complete: bool,
}

/// Skips a gzip member header, returning the offset of the deflate
/// payload. Returns `None` when the header is malformed or runs past the
/// end of `compr` — the caller must not read beyond the slice, ever.
fn skip_gzip_header(compr: &[u8]) -> Option<usize> {
    // Caller verified the 1F 8B magic.
    let mut c = 2usize;
    if *compr.get(c)? != 8 {
        return None; // compression method must be deflate
    }
    c += 1;
    let flags = *compr.get(c)?;
    c += 1;
    c += 6; // MTIME(4) + XFL + OS

    if flags & 0x04 != 0 {
        // Extra field: 2-byte little-endian length, then payload.
        let lo = usize::from(*compr.get(c)?);
        let hi = usize::from(*compr.get(c + 1)?);
        c = c.checked_add(2 + (lo | (hi << 8)))?;
    }
    if flags & 0x08 != 0 {
        // Null-terminated original file name.
        while *compr.get(c)? != 0 {
            c += 1;
        }
        c += 1;
    }
    if flags & 0x10 != 0 {
        // Null-terminated comment.
        while *compr.get(c)? != 0 {
            c += 1;
        }
        c += 1;
    }
    if c > compr.len() {
        return None;
    }
    Some(c)
}

impl Tvb {
    /// Inflates `comprlen` bytes at `offset` into a new Real buffer.
    ///
    /// See the module docs for the retry ladder and the partial-output
    /// contract. The output buffer starts at `max(2 × remaining, 32 KiB)`
    /// capped conservatively: an estimate above 10 MiB falls back to the
    /// minimum rather than trusting the packet.
    pub fn uncompress(&self, offset: isize, comprlen: isize) -> Result<Inflated, InflateError> {
        let compr = self.memdup(offset, comprlen)?;
        let remaining = self.length_remaining(offset).unwrap_or(0);
        let mut bufsiz = remaining.saturating_mul(2);
        if bufsiz < MIN_BUFSIZ || bufsiz > MAX_BUFSIZ {
            bufsiz = MIN_BUFSIZ;
        }
        debug!(compressed = compr.len(), bufsiz, "inflating buffer");

        let mut strm = Decompress::new(true);
        let mut inits_done: u32 = 1;
        let mut start = 0usize; // input start of the current attempt
        let mut consumed = 0usize; // input consumed within the attempt
        let mut window = vec![0u8; bufsiz];
        let mut out: Vec<u8> = Vec::new();
        let mut passes = 0u32;
        let complete;

        loop {
            let before_in = strm.total_in();
            let before_out = strm.total_out();
            let res = strm.decompress(
                &compr[start + consumed..],
                &mut window,
                FlushDecompress::Sync,
            );
            match res {
                Ok(status) => {
                    let in_delta = usize::try_from(strm.total_in() - before_in).unwrap_or(0);
                    let out_delta = usize::try_from(strm.total_out() - before_out).unwrap_or(0);
                    consumed += in_delta;
                    out.extend_from_slice(&window[..out_delta]);
                    passes += 1;
                    match status {
                        Status::StreamEnd => {
                            complete = true;
                            break;
                        }
                        Status::Ok if in_delta == 0 && out_delta == 0 => {
                            // No forward progress: out of input mid-stream.
                            if out.is_empty() {
                                return Err(InflateError::Exhausted);
                            }
                            complete = false;
                            break;
                        }
                        Status::Ok => {}
                        Status::BufError => {
                            // Needs input we do not have. Not enough
                            // frames were captured; return what exists.
                            if out.is_empty() {
                                return Err(InflateError::Exhausted);
                            }
                            complete = false;
                            break;
                        }
                    }
                }
                Err(_)
                    if inits_done == 1
                        && out.is_empty()
                        && compr.len() >= 2
                        && compr[0] == 0x1F
                        && compr[1] == 0x8B =>
                {
                    // A gzip member. Skip its header by hand and restart
                    // as raw deflate over the payload.
                    let data_off = skip_gzip_header(&compr).ok_or(InflateError::Header)?;
                    trace!(header_len = data_off, "gzip header skipped, retrying raw");
                    start = data_off;
                    consumed = 0;
                    strm = Decompress::new(false);
                    inits_done += 1;
                }
                Err(_) if inits_done <= 3 && out.is_empty() => {
                    // Possibly raw deflate without the zlib header.
                    trace!("retrying as raw deflate");
                    consumed = 0;
                    strm = Decompress::new(false);
                    inits_done += 1;
                }
                Err(_) => {
                    if out.is_empty() {
                        return Err(InflateError::Corrupt);
                    }
                    // Keep what was decoded before the stream went bad.
                    complete = false;
                    break;
                }
            }
        }

        debug!(
            passes,
            bytes_in = compr.len(),
            bytes_out = out.len(),
            complete,
            "inflate finished"
        );
        let reported = out.len() as isize;
        let tvb = Tvb::new_real(out, reported)?;
        Ok(Inflated { tvb, complete })
    }

    /// Like [`Tvb::uncompress`], additionally registering the new buffer
    /// as used in `parent` so it is torn down with the parent's chain.
    pub fn child_uncompress(
        &self,
        parent: &Tvb,
        offset: isize,
        comprlen: isize,
    ) -> Result<Inflated, InflateError> {
        let inflated = self.uncompress(offset, comprlen)?;
        parent.register_child(&inflated.tvb);
        Ok(inflated)
    }
}
