//! Typed accessors over buffer bytes.
//!
//! Every accessor bounds-checks through the contiguity resolver and then
//! reinterprets the resulting bytes: fixed-width integers in both byte
//! orders, IEEE-754 floats, IPv4/IPv6 addresses, GUIDs, and packed
//! bit-fields at arbitrary bit offsets.

mod bits;
mod float;
mod int;
mod net;

pub use net::{Endian, Guid};
