//! E2E: gzip wire-format scenarios — reference-stream interop, fully loaded
//! headers under adversarial chunking, and concatenated members through the
//! drivers.

#[path = "../tests/common/mod.rs"]
mod common;

use std::cell::RefCell;

use deflater::crc32::crc32;
use deflater::{decode_stream, default_registry, Options, Status};

/// `gzip < /dev/null` (reference tool output).
const EMPTY_GZIP: [u8; 20] = [
    0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x03, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00,
];

#[test]
fn reference_stream_decodes_through_every_interface() {
    let registry = default_registry();

    // One-shot.
    let out = common::decode_all(registry, "gzip", &Options::new(), &EMPTY_GZIP, 16).unwrap();
    assert!(out.is_empty());

    // Handle-level streaming, one byte at a time.
    let out = common::stream_decode_chunked(
        registry,
        "gzip",
        &Options::new(),
        &EMPTY_GZIP,
        &[1],
        &[1],
    )
    .unwrap();
    assert!(out.is_empty());

    // Callback driver.
    let mut offset = 0usize;
    let sink = RefCell::new(Vec::new());
    decode_stream(
        registry,
        "gzip",
        &Options::new(),
        |buf: &mut [u8]| {
            let take = (EMPTY_GZIP.len() - offset).min(buf.len()).min(3);
            buf[..take].copy_from_slice(&EMPTY_GZIP[offset..offset + take]);
            offset += take;
            Ok(take)
        },
        |bytes: &[u8]| {
            sink.borrow_mut().extend_from_slice(bytes);
            Ok(bytes.len())
        },
    )
    .unwrap();
    assert!(sink.into_inner().is_empty());
}

#[test]
fn interop_member_with_reference_deflate_body() {
    // Wrap a reference-encoder DEFLATE body for "Hello, world!" in a
    // hand-assembled member with a Unix OS byte and a real mtime.
    let body: &[u8] = &[
        0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0xD7, 0x51, 0x28, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0x04,
        0x00,
    ];
    let payload = b"Hello, world!";
    let mut stream = vec![0x1F, 0x8B, 0x08, 0x00, 0x21, 0x43, 0x65, 0x07, 0x00, 0x03];
    stream.extend_from_slice(body);
    stream.extend_from_slice(&crc32(payload).to_le_bytes());
    stream.extend_from_slice(&(payload.len() as u32).to_le_bytes());

    let registry = default_registry();
    let out = common::decode_all(registry, "gzip", &Options::new(), &stream, 32).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn fully_loaded_header_survives_one_byte_chunking() {
    let registry = default_registry();
    let mut options = Options::new();
    options.set_str("gzip.name", "archive/member.txt");
    options.set_str("gzip.comment", "all optional fields present");
    options.set_bytes("gzip.extra", &[0x41, 0x70, 0x04, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]);
    options.set_bool("gzip.header_crc", true);
    options.set_uint64("gzip.mtime", 1_234_567_890);
    options.set_uint64("gzip.os", 3);
    options.set_int64("deflate.level", 9);

    let payload = common::text_corpus(8_000, 60);
    let stream = common::encode_all(registry, "gzip", &options, &payload).unwrap();

    let restored = common::stream_decode_chunked(
        registry,
        "gzip",
        &Options::new(),
        &stream,
        &[1],
        &[1, 7],
    )
    .unwrap();
    assert_eq!(restored, payload);
}

#[test]
fn concatenated_members_through_the_callback_driver() {
    let registry = default_registry();
    let mut stream = Vec::new();
    let mut expected = Vec::new();
    for seed in 0..3u64 {
        let chunk = common::text_corpus(1_000 + seed as usize * 777, 61 + seed);
        stream.extend(
            common::encode_all(registry, "gzip", &Options::new(), &chunk).unwrap(),
        );
        expected.extend_from_slice(&chunk);
    }

    let mut options = Options::new();
    options.set_bool("gzip.concat", true);

    let mut offset = 0usize;
    let sink = RefCell::new(Vec::new());
    decode_stream(
        registry,
        "gzip",
        &options,
        |buf: &mut [u8]| {
            let take = (stream.len() - offset).min(buf.len()).min(113);
            buf[..take].copy_from_slice(&stream[offset..offset + take]);
            offset += take;
            Ok(take)
        },
        |bytes: &[u8]| {
            sink.borrow_mut().extend_from_slice(bytes);
            Ok(bytes.len())
        },
    )
    .unwrap();
    assert_eq!(sink.into_inner(), expected);
}

#[test]
fn member_split_at_every_boundary_still_decodes() {
    // Split a small two-member stream at each possible point into two
    // updates; every split must decode identically.
    let registry = default_registry();
    let first = common::encode_all(registry, "gzip", &Options::new(), b"left").unwrap();
    let second = common::encode_all(registry, "gzip", &Options::new(), b"right").unwrap();
    let mut stream = first;
    stream.extend_from_slice(&second);

    let mut options = Options::new();
    options.set_bool("gzip.concat", true);

    for split in 0..=stream.len() {
        let mut decoder = deflater::Decoder::new(registry, "gzip", &options).unwrap();
        let mut out = Vec::new();
        for part in [&stream[..split], &stream[split..]] {
            let mut input = deflater::InputBuffer::new(part);
            loop {
                let mut window = [0u8; 64];
                let mut output = deflater::OutputBuffer::new(&mut window);
                decoder.update(&mut input, &mut output).unwrap();
                out.extend_from_slice(output.written());
                if input.is_exhausted() && output.used() == 0 {
                    break;
                }
            }
        }
        let mut window = [0u8; 64];
        let mut output = deflater::OutputBuffer::new(&mut window);
        decoder.finish(&mut output).unwrap();
        out.extend_from_slice(output.written());
        assert_eq!(out, b"leftright", "split at {split}");
    }
}

#[test]
fn xfl_and_os_defaults_on_the_wire() {
    let registry = default_registry();
    let stream = common::encode_all(registry, "gzip", &Options::new(), b"x").unwrap();
    assert_eq!(stream[2], 0x08, "CM must be deflate");
    assert_eq!(stream[3], 0x00, "no optional fields by default");
    assert_eq!(stream[8], 0x00, "XFL 0 at the default level");
    assert_eq!(stream[9], 0xFF, "OS defaults to unknown");
}

#[test]
fn wrong_method_on_gzip_stream_is_corrupt() {
    // A gzip stream handed to the raw deflate decoder must not decode.
    let registry = default_registry();
    let stream = common::encode_all(registry, "gzip", &Options::new(), b"payload").unwrap();
    let result = common::decode_all(registry, "deflate", &Options::new(), &stream, 64);
    match result {
        Ok(out) => assert_ne!(out, b"payload"),
        Err(e) => assert!(matches!(e.status(), Status::Corrupt | Status::Limit)),
    }
}
