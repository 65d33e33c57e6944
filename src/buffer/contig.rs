//! Contiguity resolution: turning `(offset, length)` into actual bytes.
//!
//! A Real buffer and a Subset over contiguous data answer in O(1) from
//! their cached views. A Composite answers in O(1) when the request lies
//! wholly inside one member; a request that straddles a member boundary
//! materializes the whole composite into one owned array, caches it, and
//! every later access is O(1).
//!
//! The copy surface ([`Tvb::copy_into`], [`Tvb::memdup`]) deliberately
//! does *not* flatten: it walks composite members and copies each piece,
//! so a one-off copy does not pay for (or leave behind) a cache.

use tracing::trace;

use crate::arena::Arena;
use crate::bytes::Bytes;
use crate::error::{BoundsError, Result};

use super::bounds::check_offset_length;
use super::tvb::{CompositeKind, Tvb, TvbKind};

impl Tvb {
    /// Returns `length` contiguous bytes at `offset` as an owned view.
    ///
    /// This is the raw-pointer analog of the accessor family: the result
    /// shares storage with the buffer where possible, and a Composite is
    /// flattened if the range straddles members.
    pub fn get_bytes(&self, offset: isize, length: isize) -> Result<Bytes> {
        let w = check_offset_length(self.extent(), offset, length)?;
        Ok(self.contiguous_abs(w.offset, w.length))
    }

    /// Fast fixed-size read for the integer/float accessors (N ≤ 9).
    ///
    /// Skips variant dispatch when a direct contiguous view exists; still
    /// rejects negative offsets (routed to the general path) and
    /// out-of-bounds ends with the proper two-tier classification.
    pub(crate) fn fast_bytes<const N: usize>(&self, offset: isize) -> Result<[u8; N]> {
        if offset >= 0 {
            self.assert_live("read");
            if let Some(d) = self.node.direct() {
                let o = offset.unsigned_abs();
                let end = o.saturating_add(N);
                if end <= self.node.len.get() {
                    let mut out = [0u8; N];
                    out.copy_from_slice(&d[o..o + N]);
                    return Ok(out);
                }
                if end > self.node.reported_len.get() {
                    return Err(BoundsError::reported());
                }
                return Err(BoundsError::captured());
            }
        }
        let b = self.get_bytes(offset, N as isize)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&b[..N]);
        Ok(out)
    }

    /// Resolves an already-validated absolute window to contiguous bytes.
    ///
    /// Callers must have bounds-checked `(abs, len)` against this buffer.
    pub(crate) fn contiguous_abs(&self, abs: usize, len: usize) -> Bytes {
        if len == 0 {
            return Bytes::new();
        }
        if let Some(d) = self.node.direct() {
            return d.slice(abs..abs + len);
        }
        match &self.node.kind {
            TvbKind::Real(_) => unreachable!("real buffer without direct storage"),
            TvbKind::Subset(s) => s.backing.contiguous_abs(s.start + abs, len),
            TvbKind::Composite(c) => self.composite_contiguous(c, abs, len),
        }
    }

    fn composite_contiguous(&self, c: &CompositeKind, abs: usize, len: usize) -> Bytes {
        let idx = c.member_ends.partition_point(|&end| end <= abs);
        if abs + len <= c.member_ends[idx] {
            // Wholly inside one member.
            let member_off = abs - c.start_offsets[idx];
            return c.members[idx].contiguous_abs(member_off, len);
        }

        // Straddles a member boundary: materialize the whole composite
        // and cache it. All later accesses hit the direct path.
        let total = *c.member_ends.last().unwrap_or(&0);
        let mut buf = vec![0u8; total];
        for (i, member) in c.members.iter().enumerate() {
            let width = c.member_ends[i] - c.start_offsets[i];
            member.copy_abs(0, width, &mut buf[c.start_offsets[i]..c.member_ends[i]]);
        }
        let flat = Bytes::from(buf);
        *c.flat.borrow_mut() = Some(flat.clone());
        trace!(total, "flattened composite buffer");
        flat.slice(abs..abs + len)
    }

    /// Copies an already-validated absolute window into `target`.
    pub(crate) fn copy_abs(&self, abs: usize, len: usize, target: &mut [u8]) {
        if len == 0 {
            return;
        }
        if let Some(d) = self.node.direct() {
            target[..len].copy_from_slice(&d[abs..abs + len]);
            return;
        }
        match &self.node.kind {
            TvbKind::Real(_) => unreachable!("real buffer without direct storage"),
            TvbKind::Subset(s) => s.backing.copy_abs(s.start + abs, len, target),
            TvbKind::Composite(c) => {
                let mut abs = abs;
                let mut pos = 0;
                let mut remaining = len;
                while remaining > 0 {
                    let idx = c.member_ends.partition_point(|&end| end <= abs);
                    let member_off = abs - c.start_offsets[idx];
                    let n = remaining.min(c.member_ends[idx] - abs);
                    c.members[idx].copy_abs(member_off, n, &mut target[pos..pos + n]);
                    abs += n;
                    pos += n;
                    remaining -= n;
                }
            }
        }
    }

    /// Copies `length` bytes at `offset` into the front of `target` and
    /// returns the number of bytes copied. `length == -1` copies to the
    /// end of the captured data.
    ///
    /// # Panics
    ///
    /// Panics if `target` is smaller than the resolved length; sizing the
    /// destination is the caller's contract.
    pub fn copy_into(&self, target: &mut [u8], offset: isize, length: isize) -> Result<usize> {
        let w = check_offset_length(self.extent(), offset, length)?;
        assert!(
            target.len() >= w.length,
            "copy_into target too small: {} < {}",
            target.len(),
            w.length
        );
        self.copy_abs(w.offset, w.length, target);
        Ok(w.length)
    }

    /// Copies `length` bytes at `offset` into a fresh heap allocation.
    pub fn memdup(&self, offset: isize, length: isize) -> Result<Vec<u8>> {
        let w = check_offset_length(self.extent(), offset, length)?;
        let mut v = vec![0u8; w.length];
        self.copy_abs(w.offset, w.length, &mut v);
        Ok(v)
    }

    /// Like [`Tvb::memdup`], but the copy lives in `arena`'s scope.
    pub fn memdup_in(&self, arena: &Arena, offset: isize, length: isize) -> Result<Bytes> {
        Ok(arena.store(self.memdup(offset, length)?))
    }
}
