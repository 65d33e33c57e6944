//! Testy virtual buffer: layered, bounds-checked byte views for packet
//! dissection.
//!
//! A dissector walks nested protocol layers; each layer wants to see
//! "just its bytes" without copying, and every field access must be
//! checked against two distinct lengths — what was *captured* and what
//! the wire protocol *claims* exists — so truncated captures and
//! malformed packets fail differently, and recoverably.
//!
//! # Buffer shapes
//!
//! - **Real**: owns a contiguous byte range.
//! - **Subset**: a zero-copy window into a backing buffer.
//! - **Composite**: an ordered concatenation of member buffers,
//!   materialized into one contiguous array only if a read straddles a
//!   member boundary (and cached from then on).
//!
//! # Error model
//!
//! Accessors return [`Result`]; the two failure kinds are first-class
//! values ([`BoundsErrorKind::Captured`] for a truncated capture,
//! [`BoundsErrorKind::Reported`] for a malformed packet) and propagate
//! with `?` to the dissector entry point. Programmer-contract violations
//! — using a freed buffer, bit widths outside their declared range, an
//! empty caller buffer — panic instead.
//!
//! # Example
//!
//! ```
//! use tvbuf::Tvb;
//!
//! # fn main() -> tvbuf::Result<()> {
//! let packet = Tvb::new_real([0xAAu8, 0xBB, 0xCC, 0xDD].to_vec(), 4)?;
//! assert_eq!(packet.get_u32_be(0)?, 0xAABB_CCDD);
//!
//! // Hand the next layer its window; reads past it fail there, not here.
//! let payload = packet.subset(2, -1, -1)?;
//! assert_eq!(payload.get_u16_be(0)?, 0xCCDD);
//! assert!(payload.get_u8(2).is_err());
//! # Ok(())
//! # }
//! ```
//!
//! # Module structure
//!
//! - [`buffer`]: the three buffer shapes, bounds arithmetic, contiguity
//!   resolution, lifecycle
//! - [`access`]: typed accessors (integers, floats, net types, bit fields)
//! - [`scan`]: byte search, strings, line scanning, text rendering
//! - [`compress`]: zlib/gzip/raw-deflate decompression into new buffers
//! - [`arena`]: packet- and capture-scoped allocation pools
//! - [`bytes`]: the underlying immutable storage primitive

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

pub mod access;
pub mod arena;
pub mod buffer;
pub mod bytes;
pub mod compress;
pub mod error;
pub mod scan;

pub use access::{Endian, Guid};
pub use arena::{Arena, Scope};
pub use buffer::{CompositeBuilder, FreeHook, Tvb};
pub use bytes::Bytes;
pub use compress::{Inflated, InflateError};
pub use error::{BoundsError, BoundsErrorKind, Result};
pub use scan::{LineEnd, Nstringz};
