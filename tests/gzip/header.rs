//! gzip header serialization: wire layout of the fixed prefix and the
//! optional fields.

use deflater::crc32::crc32;
use deflater::gzip::header::{xfl_for_level, HeaderConfig};
use deflater::{Options, Status};

fn config(options: &Options) -> HeaderConfig {
    HeaderConfig::from_options(options).unwrap()
}

#[test]
fn xfl_mapping() {
    assert_eq!(xfl_for_level(9), 2);
    assert_eq!(xfl_for_level(1), 4);
    assert_eq!(xfl_for_level(0), 0);
    assert_eq!(xfl_for_level(6), 0);
}

#[test]
fn minimal_header_layout() {
    let header = config(&Options::new()).encode(6);
    assert_eq!(header.len(), 10);
    assert_eq!(&header[..4], &[0x1F, 0x8B, 0x08, 0x00]);
    assert_eq!(&header[4..8], &[0, 0, 0, 0]); // MTIME
    assert_eq!(header[8], 0); // XFL for level 6
    assert_eq!(header[9], 255); // OS unknown
}

#[test]
fn mtime_and_os_are_encoded() {
    let mut options = Options::new();
    options.set_uint64("gzip.mtime", 0x0102_0304);
    options.set_uint64("gzip.os", 3);
    let header = config(&options).encode(6);
    assert_eq!(&header[4..8], &[0x04, 0x03, 0x02, 0x01]);
    assert_eq!(header[9], 3);
}

#[test]
fn explicit_xfl_wins_over_level() {
    let mut options = Options::new();
    options.set_uint64("gzip.xfl", 7);
    assert_eq!(config(&options).encode(9)[8], 7);
}

#[test]
fn optional_fields_in_order() {
    let mut options = Options::new();
    options.set_bytes("gzip.extra", &[0xAA, 0xBB, 0xCC]);
    options.set_str("gzip.name", "file.txt");
    options.set_str("gzip.comment", "note");
    let header = config(&options).encode(6);

    // FLG: FEXTRA | FNAME | FCOMMENT.
    assert_eq!(header[3], 0x04 | 0x08 | 0x10);
    // XLEN then extra bytes.
    assert_eq!(&header[10..12], &[3, 0]);
    assert_eq!(&header[12..15], &[0xAA, 0xBB, 0xCC]);
    // NUL-terminated name, then comment.
    assert_eq!(&header[15..24], b"file.txt\0");
    assert_eq!(&header[24..29], b"note\0");
    assert_eq!(header.len(), 29);
}

#[test]
fn header_crc_covers_preceding_bytes() {
    let mut options = Options::new();
    options.set_bool("gzip.header_crc", true);
    options.set_str("gzip.name", "n");
    let header = config(&options).encode(6);

    let body_len = header.len() - 2;
    let expected = (crc32(&header[..body_len]) & 0xFFFF) as u16;
    let stored = u16::from_le_bytes([header[body_len], header[body_len + 1]]);
    assert_eq!(stored, expected);
    assert_eq!(header[3] & 0x02, 0x02);
}

#[test]
fn nul_in_name_is_invalid_arg() {
    let mut options = Options::new();
    options.set_str("gzip.name", "bad\0name");
    let err = HeaderConfig::from_options(&options).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
}

#[test]
fn oversized_mtime_is_invalid_arg() {
    let mut options = Options::new();
    options.set_uint64("gzip.mtime", u64::MAX);
    let err = HeaderConfig::from_options(&options).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
}
