//! gzip decoder: reference-stream interop, trailer validation, header
//! hardening, and concatenated members.

use crate::common;
use deflater::crc32::crc32;
use deflater::{default_registry, Options, Status};

/// A complete empty-payload gzip file as produced by the reference gzip
/// tool (`gzip < /dev/null`): fixed header with OS=Unix, a fixed-Huffman
/// empty DEFLATE stream, and an all-zero trailer.
const EMPTY_GZIP: [u8; 20] = [
    0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

fn decode(data: &[u8], options: &Options, payload_bound: usize) -> deflater::Result<Vec<u8>> {
    common::decode_all(default_registry(), "gzip", options, data, payload_bound)
}

/// Build a gzip member around a raw DEFLATE body.
fn member(body: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut stream = vec![0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF];
    stream.extend_from_slice(body);
    stream.extend_from_slice(&crc32(payload).to_le_bytes());
    stream.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    stream
}

// ─────────────────────────────────────────────────────────────────────────────
// Interop
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn reference_empty_file_decodes() {
    let out = decode(&EMPTY_GZIP, &Options::new(), 16).unwrap();
    assert!(out.is_empty());
}

#[test]
fn reference_fixed_huffman_body_decodes() {
    // DEFLATE body produced by a reference encoder for "Hello, world!".
    let body = [
        0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0xD7, 0x51, 0x28, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0x04,
        0x00,
    ];
    let stream = member(&body, b"Hello, world!");
    let out = decode(&stream, &Options::new(), 32).unwrap();
    assert_eq!(out, b"Hello, world!");
}

// ─────────────────────────────────────────────────────────────────────────────
// Header validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bad_magic_is_corrupt() {
    let mut stream = EMPTY_GZIP.to_vec();
    stream[0] = 0x1E;
    assert_eq!(
        decode(&stream, &Options::new(), 16).unwrap_err().status(),
        Status::Corrupt
    );

    let mut stream = EMPTY_GZIP.to_vec();
    stream[1] = 0x8C;
    assert_eq!(
        decode(&stream, &Options::new(), 16).unwrap_err().status(),
        Status::Corrupt
    );
}

#[test]
fn unsupported_compression_method_is_corrupt() {
    let mut stream = EMPTY_GZIP.to_vec();
    stream[2] = 7;
    assert_eq!(
        decode(&stream, &Options::new(), 16).unwrap_err().status(),
        Status::Corrupt
    );
}

#[test]
fn reserved_flag_bits_are_corrupt() {
    for bit in [0x20u8, 0x40, 0x80] {
        let mut stream = EMPTY_GZIP.to_vec();
        stream[3] |= bit;
        assert_eq!(
            decode(&stream, &Options::new(), 16).unwrap_err().status(),
            Status::Corrupt,
            "reserved bit {bit:#x}"
        );
    }
}

#[test]
fn header_crc_mismatch_is_corrupt() {
    let registry = default_registry();
    let mut options = Options::new();
    options.set_bool("gzip.header_crc", true);
    let mut stream =
        common::encode_all(registry, "gzip", &options, b"checked header").unwrap();
    // The FHCRC field sits right after the 10 fixed bytes.
    stream[10] ^= 0xFF;
    assert_eq!(
        decode(&stream, &Options::new(), 32).unwrap_err().status(),
        Status::Corrupt
    );
}

#[test]
fn name_field_cap_is_enforced() {
    let registry = default_registry();
    let mut options = Options::new();
    options.set_str("gzip.name", &"n".repeat(500));
    let stream = common::encode_all(registry, "gzip", &options, b"payload").unwrap();

    let mut decode_options = Options::new();
    decode_options.set_uint64("gzip.max_name_bytes", 100);
    assert_eq!(
        decode(&stream, &decode_options, 32).unwrap_err().status(),
        Status::Corrupt
    );

    // A generous cap admits the same stream.
    let mut decode_options = Options::new();
    decode_options.set_uint64("gzip.max_name_bytes", 1000);
    assert_eq!(decode(&stream, &decode_options, 32).unwrap(), b"payload");
}

#[test]
fn extra_field_cap_is_enforced() {
    let registry = default_registry();
    let mut options = Options::new();
    options.set_bytes("gzip.extra", &vec![7u8; 4096]);
    let stream = common::encode_all(registry, "gzip", &options, b"payload").unwrap();

    let mut decode_options = Options::new();
    decode_options.set_uint64("gzip.max_extra_bytes", 100);
    assert_eq!(
        decode(&stream, &decode_options, 32).unwrap_err().status(),
        Status::Corrupt
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Trailer validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn any_crc_corruption_is_detected() {
    let registry = default_registry();
    let payload = common::text_corpus(2_000, 30);
    let stream = common::encode_all(registry, "gzip", &Options::new(), &payload).unwrap();

    let crc_offset = stream.len() - 8;
    for byte in 0..4 {
        for bit in [0x01u8, 0x80] {
            let mut corrupted = stream.clone();
            corrupted[crc_offset + byte] ^= bit;
            let err = decode(&corrupted, &Options::new(), payload.len()).unwrap_err();
            assert_eq!(err.status(), Status::Corrupt, "crc byte {byte} bit {bit:#x}");
        }
    }
}

#[test]
fn any_isize_corruption_is_detected() {
    let registry = default_registry();
    let payload = common::text_corpus(2_000, 31);
    let stream = common::encode_all(registry, "gzip", &Options::new(), &payload).unwrap();

    let isize_offset = stream.len() - 4;
    for byte in 0..4 {
        let mut corrupted = stream.clone();
        corrupted[isize_offset + byte] ^= 0x10;
        let err = decode(&corrupted, &Options::new(), payload.len()).unwrap_err();
        assert_eq!(err.status(), Status::Corrupt, "isize byte {byte}");
    }
}

#[test]
fn truncated_trailer_fails_at_finish() {
    let registry = default_registry();
    let stream = common::encode_all(registry, "gzip", &Options::new(), b"payload").unwrap();
    for cut in [stream.len() - 8, stream.len() - 1, 5] {
        let err = decode(&stream[..cut], &Options::new(), 32).unwrap_err();
        assert_eq!(err.status(), Status::Corrupt, "cut at {cut}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Concatenated members
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn concatenated_members_decode_when_enabled() {
    let registry = default_registry();
    let first = common::encode_all(registry, "gzip", &Options::new(), b"first|").unwrap();
    let second = common::encode_all(registry, "gzip", &Options::new(), b"second").unwrap();
    let mut stream = first;
    stream.extend_from_slice(&second);

    let mut options = Options::new();
    options.set_bool("gzip.concat", true);
    let out = decode(&stream, &options, 64).unwrap();
    assert_eq!(out, b"first|second");
}

#[test]
fn trailing_data_without_concat_is_corrupt() {
    let registry = default_registry();
    let first = common::encode_all(registry, "gzip", &Options::new(), b"first").unwrap();
    let mut stream = first;
    stream.push(0x00);

    let err = decode(&stream, &Options::new(), 64).unwrap_err();
    assert_eq!(err.status(), Status::Corrupt);
}

#[test]
fn concat_with_garbage_tail_is_corrupt() {
    let registry = default_registry();
    let mut stream = common::encode_all(registry, "gzip", &Options::new(), b"data").unwrap();
    stream.extend_from_slice(&[0x99, 0x98, 0x97]);

    let mut options = Options::new();
    options.set_bool("gzip.concat", true);
    let err = decode(&stream, &options, 64).unwrap_err();
    assert_eq!(err.status(), Status::Corrupt);
}

#[test]
fn three_members_with_mixed_levels() {
    let registry = default_registry();
    let mut stream = Vec::new();
    let mut expected = Vec::new();
    for (level, chunk) in [(0i64, "alpha "), (6, "beta "), (9, "gamma")] {
        let mut options = Options::new();
        options.set_int64("deflate.level", level);
        stream.extend(common::encode_all(registry, "gzip", &options, chunk.as_bytes()).unwrap());
        expected.extend_from_slice(chunk.as_bytes());
    }

    let mut options = Options::new();
    options.set_bool("gzip.concat", true);
    assert_eq!(decode(&stream, &options, 64).unwrap(), expected);
}
