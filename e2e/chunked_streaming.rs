//! E2E: chunked streaming — chunk-invariance of the produced bytes, strict
//! partial-I/O progress, and recovery from tiny output windows.

#[path = "../tests/common/mod.rs"]
mod common;

use deflater::{default_registry, Decoder, Encoder, InputBuffer, Options, OutputBuffer};

// ─────────────────────────────────────────────────────────────────────────────
// Chunk invariance
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn encode_chunk_cycles_match_oneshot() {
    // 64 KiB of the repeating byte ramp, level 6, chunk sizes cycling
    // through 1, 13, and 4096 on both sides.
    let registry = default_registry();
    let data = common::pattern_corpus(64 * 1024);
    let mut options = Options::new();
    options.set_int64("deflate.level", 6);

    let oneshot = common::encode_all(registry, "deflate", &options, &data).unwrap();
    let chunked = common::stream_encode_chunked(
        registry,
        "deflate",
        &options,
        &data,
        &[1, 13, 4096],
        &[1, 13, 4096],
    )
    .unwrap();
    assert_eq!(chunked, oneshot);
}

#[test]
fn decode_chunk_cycles_match_payload() {
    let registry = default_registry();
    let data = common::pattern_corpus(64 * 1024);
    let mut options = Options::new();
    options.set_int64("deflate.level", 6);
    let compressed = common::encode_all(registry, "deflate", &options, &data).unwrap();

    for chunks in [&[1usize, 13, 4096][..], &[1][..], &[2, 3][..]] {
        let restored = common::stream_decode_chunked(
            registry,
            "deflate",
            &Options::new(),
            &compressed,
            chunks,
            chunks,
        )
        .unwrap();
        assert_eq!(restored, data, "chunks {chunks:?}");
    }
}

#[test]
fn many_chunkings_agree() {
    let registry = default_registry();
    let data = common::text_corpus(30_000, 50);
    let options = Options::new();
    let reference = common::encode_all(registry, "gzip", &options, &data).unwrap();

    for chunks in [
        &[1usize][..],
        &[7][..],
        &[64, 1][..],
        &[8192][..],
        &[3, 1000, 17][..],
    ] {
        let streamed = common::stream_encode_chunked(
            registry, "gzip", &options, &data, chunks, &[4096],
        )
        .unwrap();
        assert_eq!(streamed, reference, "input chunks {chunks:?}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial-I/O progress discipline
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn every_update_makes_observable_progress() {
    let registry = default_registry();
    let data = common::text_corpus(20_000, 51);
    let compressed = common::encode_all(registry, "gzip", &Options::new(), &data).unwrap();

    let mut decoder = Decoder::new(registry, "gzip", &Options::new()).unwrap();
    let mut restored = Vec::new();
    let mut in_pos = 0usize;

    while in_pos < compressed.len() {
        let take = 11.min(compressed.len() - in_pos);
        let mut input = InputBuffer::new(&compressed[in_pos..in_pos + take]);
        let mut chunk = [0u8; 5];
        let mut output = OutputBuffer::new(&mut chunk);
        decoder.update(&mut input, &mut output).unwrap();

        assert!(
            input.used() > 0 || output.used() > 0,
            "no progress with input and output space available"
        );
        in_pos += input.used();
        restored.extend_from_slice(output.written());
    }

    loop {
        let mut input = InputBuffer::new(&[]);
        let mut chunk = [0u8; 5];
        let mut output = OutputBuffer::new(&mut chunk);
        decoder.update(&mut input, &mut output).unwrap();
        if output.used() == 0 {
            break;
        }
        restored.extend_from_slice(output.written());
    }

    let mut chunk = [0u8; 5];
    let mut output = OutputBuffer::new(&mut chunk);
    decoder.finish(&mut output).unwrap();
    restored.extend_from_slice(output.written());
    assert_eq!(restored, data);
}

#[test]
fn one_byte_output_windows_drain_completely() {
    let registry = default_registry();
    let data = common::text_corpus(5_000, 52);
    let compressed = common::encode_all(registry, "deflate", &Options::new(), &data).unwrap();

    let restored = common::stream_decode_chunked(
        registry,
        "deflate",
        &Options::new(),
        &compressed,
        &[4096],
        &[1],
    )
    .unwrap();
    assert_eq!(restored, data);
}

// ─────────────────────────────────────────────────────────────────────────────
// The chunked example flow: small fixed input/output windows
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sixty_four_byte_windows_compress_and_restore() {
    let registry = default_registry();
    let data = common::text_corpus(3_000, 53);
    let mut options = Options::new();
    options.set_int64("deflate.level", 6);

    let mut encoder = Encoder::new(registry, "deflate", &options).unwrap();
    let mut compressed = Vec::new();
    let mut in_pos = 0usize;
    while in_pos < data.len() {
        let take = 64.min(data.len() - in_pos);
        let mut input = InputBuffer::new(&data[in_pos..in_pos + take]);
        let mut window = [0u8; 128];
        let mut output = OutputBuffer::new(&mut window);
        encoder.update(&mut input, &mut output).unwrap();
        in_pos += input.used();
        compressed.extend_from_slice(output.written());
    }
    loop {
        let mut window = [0u8; 128];
        let mut output = OutputBuffer::new(&mut window);
        match encoder.finish(&mut output) {
            Ok(()) => {
                compressed.extend_from_slice(output.written());
                break;
            }
            Err(e) if e.status() == deflater::Status::Limit => {
                compressed.extend_from_slice(output.written());
            }
            Err(e) => panic!("finish failed: {e}"),
        }
    }

    let restored = common::stream_decode_chunked(
        registry,
        "deflate",
        &Options::new(),
        &compressed,
        &[64],
        &[128],
    )
    .unwrap();
    assert_eq!(restored, data);
}
