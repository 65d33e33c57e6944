//! End-to-end scenarios for the buffer core.
//!
//! Each test is a complete seed scenario covering one load-bearing
//! behavior: the zero-length-subset contract, truncation classification,
//! composite flattening, bit fields across byte boundaries, line
//! scanning, decompression, and teardown safety.

mod common;

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use common::init_test_logging;
use tvbuf::{BoundsErrorKind, Endian, LineEnd, Tvb};

fn real(bytes: Vec<u8>) -> Tvb {
    let reported = bytes.len() as isize;
    Tvb::new_real(bytes, reported).unwrap()
}

/// Scenario 1: a zero-length subset at the end of its backing buffer is
/// legal; reads through it fail in the *subset*, as reported-bounds.
#[test]
fn zero_length_subset_at_eof() {
    init_test_logging();
    let backing = real(vec![0u8; 10]);
    let sub = backing.subset(10, 0, 0).unwrap();
    assert_eq!(sub.len(), 0);
    let err = sub.get_u8(0).unwrap_err();
    assert_eq!(err.kind(), BoundsErrorKind::Reported);
}

/// Scenario 2: reads past the capture classify as truncation while the
/// wire claim still covers them, and as malformation beyond that.
#[test]
fn truncation_classification() {
    init_test_logging();
    let tvb = Tvb::new_real(vec![1u8, 2, 3, 4], 16).unwrap();
    assert_eq!(tvb.get_u8(3).unwrap(), 4);
    assert_eq!(tvb.get_u8(4).unwrap_err().kind(), BoundsErrorKind::Captured);
    assert_eq!(tvb.get_u8(16).unwrap_err().kind(), BoundsErrorKind::Reported);
}

/// Scenario 3: a read straddling composite members flattens the
/// composite; later reads use the cached contiguous array.
#[test]
fn composite_straddling_read() {
    init_test_logging();
    let a = real(vec![1, 2, 3]);
    let b = real(vec![4, 5]);
    let c = real(vec![6, 7, 8, 9]);
    let comp = Tvb::composite().append(&a).append(&b).append(&c).finalize();

    assert_eq!(comp.len(), 9);
    assert_eq!(comp.get_u32_be(2).unwrap(), 0x0304_0506);
    // Flattened now; the cached path must agree byte for byte.
    assert_eq!(comp.get_u8(0).unwrap(), 1);
    assert_eq!(comp.get_u8(8).unwrap(), 9);
    assert_eq!(
        comp.memdup(0, -1).unwrap(),
        vec![1, 2, 3, 4, 5, 6, 7, 8, 9]
    );
}

/// Scenario 4: bit fields at arbitrary bit offsets, spanning bytes.
#[test]
fn bit_fields_across_byte_boundary() {
    init_test_logging();
    let tvb = real(vec![0b1100_1010, 0b1111_0000]);
    assert_eq!(tvb.get_bits8(3, 5).unwrap(), 0b01010);
    assert_eq!(tvb.get_bits16(4, 8, Endian::Big).unwrap(), 0b1010_1111);
}

/// Scenario 5: CRLF line scanning.
#[test]
fn crlf_line_scanning() {
    init_test_logging();
    let tvb = real(b"abc\r\ndef".to_vec());
    let le = tvb.find_line_end(0, -1, false).unwrap().unwrap();
    assert_eq!(le, LineEnd { linelen: 3, next_offset: 5 });
}

/// Scenario 6: newlines inside a double-quoted string do not terminate
/// the line.
#[test]
fn quoted_string_newline_immunity() {
    init_test_logging();
    let tvb = real(b"a\"b\nc\"d\n".to_vec());
    let le = tvb.find_line_end_unquoted(0, -1).unwrap();
    assert_eq!(le, LineEnd { linelen: 7, next_offset: 8 });
}

/// Scenario 7: gzip with a filename header field decompresses; a
/// truncated filename is rejected without over-reading.
#[test]
fn gzip_with_filename() {
    init_test_logging();
    let deflated = {
        let mut enc =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"hello").unwrap();
        enc.finish().unwrap()
    };
    let mut stream = vec![0x1F, 0x8B, 0x08, 0x08, 0, 0, 0, 0, 0, 0xFF];
    stream.extend_from_slice(b"payload.bin\0");
    stream.extend_from_slice(&deflated);
    stream.extend_from_slice(&[0; 8]);

    let tvb = real(stream);
    let len = tvb.len() as isize;
    let inflated = tvb.uncompress(0, len).unwrap();
    assert_eq!(inflated.tvb.len(), 5);
    assert_eq!(inflated.tvb.memdup(0, -1).unwrap(), b"hello");

    // Negative: the filename never terminates.
    let mut bad = vec![0x1F, 0x8B, 0x08, 0x08, 0, 0, 0, 0, 0, 0xFF];
    bad.extend_from_slice(b"payload.bin");
    let tvb = real(bad);
    let len = tvb.len() as isize;
    assert!(tvb.uncompress(0, len).is_err());
}

/// Scenario 8: tearing down a composite's chain releases the composite
/// and every member exactly once.
#[test]
fn free_chain_releases_exactly_once() {
    init_test_logging();
    let a = real(b"first".to_vec());
    let b = real(b"second".to_vec());
    let a_hits = Rc::new(Cell::new(0u32));
    let b_hits = Rc::new(Cell::new(0u32));
    {
        let h = a_hits.clone();
        a.set_free_hook(Box::new(move || h.set(h.get() + 1)));
        let h = b_hits.clone();
        b.set_free_hook(Box::new(move || h.set(h.get() + 1)));
    }

    let comp = Tvb::composite().append(&a).append(&b).finalize();
    assert_eq!(a.usage(), 2);
    assert_eq!(b.usage(), 2);

    comp.free_chain();
    assert_eq!(a_hits.get(), 1, "member A released exactly once");
    assert_eq!(b_hits.get(), 1, "member B released exactly once");
    // Dropping the handles afterwards must not re-release anything.
    drop(a);
    drop(b);
    drop(comp);
    assert_eq!(a_hits.get(), 1);
    assert_eq!(b_hits.get(), 1);
}

/// The dissector-layering workflow end to end: an outer protocol reads
/// its header, delimits its payload, and the inner layer sees a clean
/// window with its own bounds.
#[test]
fn layered_dissection_workflow() {
    init_test_logging();
    // 2-byte type, 2-byte length, payload, trailing padding.
    let mut packet = vec![0x00, 0x2A, 0x00, 0x05];
    packet.extend_from_slice(b"hello");
    packet.extend_from_slice(&[0xEE; 3]);
    let tvb = real(packet);

    assert_eq!(tvb.get_u16_be(0).unwrap(), 0x2A);
    let payload_len = isize::try_from(tvb.get_u16_be(2).unwrap()).unwrap();
    let inner = tvb.subset(4, payload_len, -1).unwrap();
    assert_eq!(inner.len(), 5);
    assert!(inner.strneql(0, "hello"));
    // The inner layer cannot see the padding.
    assert!(inner.get_u8(5).is_err());
    // The data source is still the outer packet.
    assert_eq!(inner.data_source().unwrap(), tvb);
    assert_eq!(inner.raw_offset(), 4);
}
