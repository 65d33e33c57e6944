//! The buffer graph: Real, Subset, and Composite variants, construction,
//! the length surface, and the explicit lifecycle protocol.
//!
//! A [`Tvb`] is a cheap-clone handle over a reference-counted node. Views
//! hold strong references toward the data they derive from (a Subset to
//! its backing, a Composite to its members); the cascade list used by
//! [`Tvb::free_chain`] holds weak back-references, so the graph is
//! acyclic and nothing leaks if a dissector abandons a packet mid-way.
//!
//! Constructors validate their parameters before any node is allocated:
//! a failing construction returns the error and leaves nothing behind.
//! Composites are built through [`CompositeBuilder`]; a buffer that could
//! be observed half-initialized is not representable.

use core::cell::{Cell, RefCell};
use core::fmt;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::bytes::Bytes;
use crate::error::{BoundsError, Result};

use super::bounds::{check_offset_length, compute_offset_length, Extent};

/// Hook run when a Real buffer's storage is released.
pub type FreeHook = Box<dyn FnOnce()>;

pub(crate) struct RealKind {
    pub(crate) data: Bytes,
    pub(crate) on_free: RefCell<Option<FreeHook>>,
}

pub(crate) struct SubsetKind {
    pub(crate) backing: Tvb,
    pub(crate) start: usize,
    /// Contiguous view cached at construction when the backing had one;
    /// lets single-field reads skip the recursion entirely.
    pub(crate) direct: Option<Bytes>,
}

pub(crate) struct CompositeKind {
    pub(crate) members: Vec<Tvb>,
    /// Running sum of member lengths; `start_offsets[i]` is where member
    /// `i` begins in the concatenation.
    pub(crate) start_offsets: Vec<usize>,
    /// One past the last byte of member `i` in the concatenation.
    /// Zero-length members collapse to `member_ends[i] == start_offsets[i]`
    /// and are skipped by the containment search.
    pub(crate) member_ends: Vec<usize>,
    /// Flatten cache; populated the first time a read straddles members.
    pub(crate) flat: RefCell<Option<Bytes>>,
}

pub(crate) enum TvbKind {
    Real(RealKind),
    Subset(SubsetKind),
    Composite(CompositeKind),
}

impl TvbKind {
    const fn name(&self) -> &'static str {
        match self {
            Self::Real(_) => "real",
            Self::Subset(_) => "subset",
            Self::Composite(_) => "composite",
        }
    }
}

pub(crate) struct Node {
    pub(crate) kind: TvbKind,
    pub(crate) len: Cell<usize>,
    pub(crate) reported_len: Cell<usize>,
    pub(crate) usage: Cell<usize>,
    pub(crate) freed: Cell<bool>,
    /// Buffers to tear down when this one's chain is freed: subsets over
    /// this buffer, children registered on it, a composite's members.
    pub(crate) used_in: RefCell<Vec<Weak<Node>>>,
    /// The root Real buffer this view ultimately derives from. A Real (or
    /// a finalized Composite) points at itself.
    pub(crate) data_source: Weak<Node>,
}

impl Node {
    /// The whole-buffer contiguous view, if one exists.
    pub(crate) fn direct(&self) -> Option<Bytes> {
        match &self.kind {
            TvbKind::Real(r) => Some(r.data.clone()),
            TvbKind::Subset(s) => s.direct.clone(),
            TvbKind::Composite(c) => c.flat.borrow().clone(),
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        // A Real buffer dropped without going through `free` still runs
        // its release hook exactly once.
        if let TvbKind::Real(r) = &self.kind {
            if let Some(hook) = r.on_free.borrow_mut().take() {
                hook();
            }
        }
    }
}

/// A bounds-checked, layered view over packet bytes.
///
/// Cloning the handle is O(1) and does not affect the buffer's explicit
/// usage count; the count tracks the dissection-visible lifetime
/// (see [`Tvb::free`] and friends), while the handle's own reference
/// count keeps the memory safe regardless.
#[derive(Clone)]
pub struct Tvb {
    pub(crate) node: Rc<Node>,
}

impl Tvb {
    // === Construction ===

    /// Creates a Real buffer owning `data`.
    ///
    /// `reported_len` is the length the wire protocol claims: `-1` means
    /// "unknown, unbounded"; any value below `-1` is a reported-bounds
    /// error. If the claim is shorter than the data, the captured length
    /// is clamped down to it.
    pub fn new_real(data: impl Into<Bytes>, reported_len: isize) -> Result<Self> {
        if reported_len < -1 {
            return Err(BoundsError::reported());
        }
        let data = data.into();
        let reported = if reported_len == -1 {
            usize::MAX
        } else {
            reported_len.unsigned_abs()
        };
        let len = data.len().min(reported);

        let node = Rc::new_cyclic(|weak| Node {
            kind: TvbKind::Real(RealKind {
                data,
                on_free: RefCell::new(None),
            }),
            len: Cell::new(len),
            reported_len: Cell::new(reported),
            usage: Cell::new(1),
            freed: Cell::new(false),
            used_in: RefCell::new(Vec::new()),
            data_source: weak.clone(),
        });
        Ok(Self { node })
    }

    /// Creates a Real buffer and registers it as used in `self`, so that
    /// freeing this buffer's chain frees the child as well.
    pub fn child_real(&self, data: impl Into<Bytes>, reported_len: isize) -> Result<Self> {
        self.assert_live("child_real");
        let child = Self::new_real(data, reported_len)?;
        self.register_child(&child);
        Ok(child)
    }

    /// Creates a zero-copy window into this buffer.
    ///
    /// The window is bounds-checked against this buffer; `reported_len`
    /// of `-1` inherits the backing's reported length minus the window
    /// start. The new buffer increments this buffer's usage count and is
    /// registered for cascading teardown.
    pub fn subset(&self, offset: isize, length: isize, reported_len: isize) -> Result<Self> {
        self.assert_live("subset");
        if reported_len < -1 {
            return Err(BoundsError::reported());
        }
        let window = check_offset_length(self.extent(), offset, length)?;
        let reported = if reported_len == -1 {
            self.node.reported_len.get() - window.offset
        } else {
            reported_len.unsigned_abs()
        };
        let len = window.length.min(reported);

        let direct = self
            .node
            .direct()
            .map(|d| d.slice(window.offset..window.offset + window.length));

        let node = Rc::new(Node {
            kind: TvbKind::Subset(SubsetKind {
                backing: self.clone(),
                start: window.offset,
                direct,
            }),
            len: Cell::new(len),
            reported_len: Cell::new(reported),
            usage: Cell::new(1),
            freed: Cell::new(false),
            used_in: RefCell::new(Vec::new()),
            data_source: self.node.data_source.clone(),
        });
        let subset = Self { node };
        self.increment_usage(1);
        self.node.used_in.borrow_mut().push(Rc::downgrade(&subset.node));
        Ok(subset)
    }

    /// Starts building a Composite buffer.
    #[must_use]
    pub fn composite() -> CompositeBuilder {
        CompositeBuilder {
            members: VecDeque::new(),
        }
    }

    // === Identity ===

    /// The root Real buffer this view derives from; identifies "the
    /// packet" for higher layers. A root is its own data source.
    #[must_use]
    pub fn data_source(&self) -> Option<Self> {
        self.node.data_source.upgrade().map(|node| Self { node })
    }

    /// Offset of this view from the start of its root Real buffer.
    #[must_use]
    pub fn raw_offset(&self) -> usize {
        let mut counter = 0;
        let mut cur = self.clone();
        loop {
            let next = match &cur.node.kind {
                TvbKind::Real(_) | TvbKind::Composite(_) => return counter,
                TvbKind::Subset(s) => {
                    counter += s.start;
                    s.backing.clone()
                }
            };
            cur = next;
        }
    }

    pub(crate) fn extent(&self) -> Extent {
        self.assert_live("access");
        Extent {
            captured: self.node.len.get(),
            reported: self.node.reported_len.get(),
        }
    }

    pub(crate) fn assert_live(&self, what: &str) {
        assert!(
            !self.node.freed.get(),
            "{} on a freed {} buffer",
            what,
            self.node.kind.name()
        );
    }

    // === Length surface ===

    /// Captured length: bytes actually available.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assert_live("len");
        self.node.len.get()
    }

    /// Returns true if no bytes were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reported length: bytes the wire protocol claims exist.
    #[must_use]
    pub fn reported_len(&self) -> usize {
        self.assert_live("reported_len");
        self.node.reported_len.get()
    }

    /// Captured bytes remaining at `offset`, or `None` if the offset is
    /// out of range. Never errors.
    #[must_use]
    pub fn length_remaining(&self, offset: isize) -> Option<usize> {
        compute_offset_length(self.extent(), offset, -1)
            .ok()
            .map(|w| w.length)
    }

    /// Reported bytes remaining at `offset`, or `None` if out of range.
    #[must_use]
    pub fn reported_length_remaining(&self, offset: isize) -> Option<usize> {
        let w = compute_offset_length(self.extent(), offset, -1).ok()?;
        self.node.reported_len.get().checked_sub(w.offset)
    }

    /// Like [`Tvb::length_remaining`], but errors when the offset is out
    /// of range or no bytes remain; the error kind tells truncation from
    /// malformation.
    pub fn ensure_length_remaining(&self, offset: isize) -> Result<usize> {
        let w = compute_offset_length(self.extent(), offset, -1)?;
        if w.length == 0 {
            if w.offset >= self.node.reported_len.get() {
                return Err(BoundsError::reported());
            }
            return Err(BoundsError::captured());
        }
        Ok(w.length)
    }

    /// Returns true if `length` bytes starting at `offset` are captured.
    #[must_use]
    pub fn bytes_exist(&self, offset: isize, length: isize) -> bool {
        let Ok(w) = compute_offset_length(self.extent(), offset, length) else {
            return false;
        };
        w.offset.saturating_add(w.length) <= self.node.len.get()
    }

    /// Errors unless `length` bytes starting at `offset` are captured.
    ///
    /// Unlike everywhere else, *any* negative length — including the `-1`
    /// sentinel — is treated as "more bytes than could possibly exist"
    /// and raises a reported-bounds error unconditionally.
    pub fn ensure_bytes_exist(&self, offset: isize, length: isize) -> Result<()> {
        self.assert_live("ensure_bytes_exist");
        if length < 0 {
            return Err(BoundsError::reported());
        }
        check_offset_length(self.extent(), offset, length).map(|_| ())
    }

    /// Returns true if `offset` lands on a captured byte (strictly inside;
    /// the position one past the end does not exist).
    #[must_use]
    pub fn offset_exists(&self, offset: isize) -> bool {
        match compute_offset_length(self.extent(), offset, -1) {
            Ok(w) => w.offset < self.node.len.get(),
            Err(_) => false,
        }
    }

    /// Shrinks the reported length, clamping the captured length with it.
    ///
    /// Used by protocols whose headers carry an explicit length and whose
    /// payload may include padding. Growing the reported length is an
    /// error, as is setting it on a Composite (a composite has no
    /// independent wire length).
    pub fn set_reported_length(&self, reported_len: usize) -> Result<()> {
        self.assert_live("set_reported_length");
        if matches!(self.node.kind, TvbKind::Composite(_)) {
            return Err(BoundsError::reported());
        }
        if reported_len > self.node.reported_len.get() {
            return Err(BoundsError::reported());
        }
        self.node.reported_len.set(reported_len);
        if reported_len < self.node.len.get() {
            self.node.len.set(reported_len);
        }
        Ok(())
    }

    // === Lifecycle ===

    /// Current usage count.
    #[must_use]
    pub fn usage(&self) -> usize {
        self.node.usage.get()
    }

    /// Adds `count` to the usage count and returns the new count.
    pub fn increment_usage(&self, count: usize) -> usize {
        self.assert_live("increment_usage");
        let new = self.node.usage.get() + count;
        self.node.usage.set(new);
        new
    }

    /// Subtracts `count` from the usage count, releasing the buffer when
    /// the count is consumed. Returns the new count (zero on release).
    pub fn decrement_usage(&self, count: usize) -> usize {
        self.assert_live("decrement_usage");
        let usage = self.node.usage.get();
        if count >= usage {
            self.node.usage.set(1);
            self.free();
            0
        } else {
            self.node.usage.set(usage - count);
            usage - count
        }
    }

    /// Decrements the usage count by one; at zero the buffer is released:
    /// a Real buffer runs its free hook, a Subset decrements its backing,
    /// a Composite decrements every member and drops its caches.
    ///
    /// # Panics
    ///
    /// Panics if the buffer was already released (double free).
    pub fn free(&self) {
        self.assert_live("free");
        let usage = self.node.usage.get() - 1;
        self.node.usage.set(usage);
        if usage > 0 {
            return;
        }
        self.node.freed.set(true);
        match &self.node.kind {
            TvbKind::Real(r) => {
                if let Some(hook) = r.on_free.borrow_mut().take() {
                    hook();
                }
            }
            TvbKind::Subset(s) => {
                if !s.backing.node.freed.get() {
                    s.backing.decrement_usage(1);
                }
            }
            TvbKind::Composite(c) => {
                for member in &c.members {
                    if !member.node.freed.get() {
                        member.decrement_usage(1);
                    }
                }
                c.flat.borrow_mut().take();
            }
        }
        self.node.used_in.borrow_mut().clear();
    }

    /// Releases this buffer and, transitively, every buffer registered as
    /// used in it (subsets, registered children, composite members).
    ///
    /// The cascade list is snapshotted before recursing, so entries freed
    /// along the way are simply skipped.
    pub fn free_chain(&self) {
        self.assert_live("free_chain");
        let dependents: Vec<Self> = self
            .node
            .used_in
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|node| Self { node })
            .collect();
        for dep in dependents {
            if !dep.node.freed.get() {
                dep.free_chain();
            }
        }
        if !self.node.freed.get() {
            self.free();
        }
    }

    /// Registers `child` for cascading teardown: freeing this buffer's
    /// chain frees the child too.
    pub fn register_child(&self, child: &Self) {
        self.assert_live("register_child");
        child.assert_live("register_child");
        self.node.used_in.borrow_mut().push(Rc::downgrade(&child.node));
    }

    /// Installs a hook run exactly once when this Real buffer's storage
    /// is released (by [`Tvb::free`] or, failing that, on drop).
    ///
    /// # Panics
    ///
    /// Panics if this is not a Real buffer.
    pub fn set_free_hook(&self, hook: FreeHook) {
        self.assert_live("set_free_hook");
        let TvbKind::Real(r) = &self.node.kind else {
            panic!("set_free_hook on a {} buffer", self.node.kind.name());
        };
        *r.on_free.borrow_mut() = Some(hook);
    }
}

impl PartialEq for Tvb {
    /// Buffer identity, not content equality.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Tvb {}

impl fmt::Debug for Tvb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tvb")
            .field("kind", &self.node.kind.name())
            .field("len", &self.node.len.get())
            .field("reported_len", &self.node.reported_len.get())
            .field("usage", &self.node.usage.get())
            .field("freed", &self.node.freed.get())
            .finish()
    }
}

/// Builds a Composite buffer from an ordered list of members.
///
/// Until [`CompositeBuilder::finalize`] runs, no buffer exists: there is
/// no observable zero-length pre-finalize state, and the offset tables
/// are materialized exactly once.
pub struct CompositeBuilder {
    members: VecDeque<Tvb>,
}

impl CompositeBuilder {
    /// Appends a member buffer at the end of the concatenation.
    #[must_use]
    pub fn append(mut self, member: &Tvb) -> Self {
        member.assert_live("composite append");
        self.members.push_back(member.clone());
        self
    }

    /// Prepends a member buffer at the front of the concatenation.
    #[must_use]
    pub fn prepend(mut self, member: &Tvb) -> Self {
        member.assert_live("composite prepend");
        self.members.push_front(member.clone());
        self
    }

    /// Materializes the offset tables and produces the immutable
    /// Composite. Its captured and reported lengths both equal the sum of
    /// member lengths — a composite has no independent wire length. Each
    /// member's usage count is incremented, and members are registered
    /// for cascading teardown.
    #[must_use]
    pub fn finalize(self) -> Tvb {
        let members: Vec<Tvb> = self.members.into();
        let mut start_offsets = Vec::with_capacity(members.len());
        let mut member_ends = Vec::with_capacity(members.len());
        let mut total = 0usize;
        for member in &members {
            start_offsets.push(total);
            total += member.len();
            member_ends.push(total);
        }

        let node = Rc::new_cyclic(|weak| Node {
            kind: TvbKind::Composite(CompositeKind {
                members: members.clone(),
                start_offsets,
                member_ends,
                flat: RefCell::new(None),
            }),
            len: Cell::new(total),
            reported_len: Cell::new(total),
            usage: Cell::new(1),
            freed: Cell::new(false),
            used_in: RefCell::new(Vec::new()),
            data_source: weak.clone(),
        });
        let composite = Tvb { node };
        for member in &members {
            member.increment_usage(1);
            composite
                .node
                .used_in
                .borrow_mut()
                .push(Rc::downgrade(&member.node));
        }
        composite
    }
}
