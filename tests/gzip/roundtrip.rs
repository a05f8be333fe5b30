//! gzip round-trips across levels, payload shapes, and header options.

use crate::common;
use deflater::{default_registry, Options};

fn roundtrip_with(data: &[u8], encode_options: &Options, decode_options: &Options) {
    let registry = default_registry();
    let compressed = common::encode_all(registry, "gzip", encode_options, data).unwrap();
    let restored =
        common::decode_all(registry, "gzip", decode_options, &compressed, data.len()).unwrap();
    assert_eq!(restored, data);
}

#[test]
fn all_levels_all_payloads() {
    let payloads: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"A".to_vec(),
        b"Hello".to_vec(),
        vec![0u8; 256],
        common::text_corpus(10 * 1024, 20),
    ];
    for level in 0..=9 {
        let mut options = Options::new();
        options.set_int64("deflate.level", level);
        for payload in &payloads {
            roundtrip_with(payload, &options, &Options::new());
        }
    }
}

#[test]
fn header_fields_pass_through_decoding() {
    let mut options = Options::new();
    options.set_str("gzip.name", "corpus.txt");
    options.set_str("gzip.comment", "generated for testing");
    options.set_bytes("gzip.extra", &[1, 2, 3, 4]);
    options.set_bool("gzip.header_crc", true);
    options.set_uint64("gzip.mtime", 1_700_000_000);
    options.set_uint64("gzip.os", 3);

    let data = common::text_corpus(4_000, 21);
    roundtrip_with(&data, &options, &Options::new());
}

#[test]
fn stream_is_a_valid_gzip_member() {
    let data = b"check the framing";
    let compressed =
        common::encode_all(default_registry(), "gzip", &Options::new(), data).unwrap();

    assert_eq!(&compressed[..3], &[0x1F, 0x8B, 0x08]);
    let trailer = &compressed[compressed.len() - 8..];
    let crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    let isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
    assert_eq!(crc, deflater::crc32::crc32(data));
    assert_eq!(isize, data.len() as u32);
}

#[test]
fn xfl_reflects_level() {
    let registry = default_registry();
    for (level, xfl) in [(9i64, 2u8), (1, 4), (6, 0)] {
        let mut options = Options::new();
        options.set_int64("deflate.level", level);
        let compressed = common::encode_all(registry, "gzip", &options, b"data").unwrap();
        assert_eq!(compressed[8], xfl, "level {level}");
    }
}

#[test]
fn deflate_options_reach_the_wrapped_codec() {
    // A gzip stream at level 0 carries stored blocks: the payload appears
    // verbatim in the member body.
    let data = b"uncompressed gzip payload";
    let mut options = Options::new();
    options.set_int64("deflate.level", 0);
    let compressed =
        common::encode_all(default_registry(), "gzip", &options, data).unwrap();
    let body = &compressed[10..compressed.len() - 8];
    assert!(body.windows(data.len()).any(|w| w == *data));
    roundtrip_with(data, &options, &Options::new());
}

#[test]
fn chunked_gzip_equals_oneshot() {
    let registry = default_registry();
    let data = common::text_corpus(50_000, 22);
    let options = Options::new();

    let oneshot = common::encode_all(registry, "gzip", &options, &data).unwrap();
    let streamed = common::stream_encode_chunked(
        registry,
        "gzip",
        &options,
        &data,
        &[1, 13, 4096],
        &[1, 13, 4096],
    )
    .unwrap();
    assert_eq!(streamed, oneshot);

    let restored = common::stream_decode_chunked(
        registry,
        "gzip",
        &options,
        &oneshot,
        &[7, 1, 97],
        &[3, 1, 4096],
    )
    .unwrap();
    assert_eq!(restored, data);
}
