//! E2E: resource caps and decoder hardening — expansion-ratio defense,
//! output and memory caps, and bounded behavior on corrupted streams.

#[path = "../tests/common/mod.rs"]
mod common;

use deflater::{default_registry, Decoder, Encoder, InputBuffer, Options, OutputBuffer, Status};

// ─────────────────────────────────────────────────────────────────────────────
// Expansion-ratio cap (decompression bombs)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn expansion_bomb_is_cut_off() {
    let registry = default_registry();
    // 1 MiB of zeros compresses to a few KiB: a several-hundred-fold bomb.
    let payload = vec![0u8; 1024 * 1024];
    let mut level = Options::new();
    level.set_int64("deflate.level", 9);
    let compressed = common::encode_all(registry, "deflate", &level, &payload).unwrap();
    assert!(compressed.len() < payload.len() / 100);

    let mut options = Options::new();
    options.set_uint64("limits.max_expansion_ratio", 10);
    let err = common::decode_all(registry, "deflate", &options, &compressed, payload.len())
        .unwrap_err();
    assert_eq!(err.status(), Status::Limit);

    // Unlimited ratio admits the same stream.
    let mut options = Options::new();
    options.set_uint64("limits.max_expansion_ratio", 0);
    let out =
        common::decode_all(registry, "deflate", &options, &compressed, payload.len()).unwrap();
    assert_eq!(out, payload);
}

#[test]
fn expansion_cap_applies_to_gzip_bodies() {
    let registry = default_registry();
    let payload = vec![0u8; 256 * 1024];
    let compressed = common::encode_all(registry, "gzip", &Options::new(), &payload).unwrap();

    let mut options = Options::new();
    options.set_uint64("limits.max_expansion_ratio", 5);
    let err = common::decode_all(registry, "gzip", &options, &compressed, payload.len())
        .unwrap_err();
    assert_eq!(err.status(), Status::Limit);
}

#[test]
fn cap_failures_are_terminal() {
    let registry = default_registry();
    let payload = vec![0u8; 512 * 1024];
    let compressed = common::encode_all(registry, "deflate", &Options::new(), &payload).unwrap();

    let mut options = Options::new();
    options.set_uint64("limits.max_expansion_ratio", 4);
    let mut decoder = Decoder::new(registry, "deflate", &options).unwrap();

    let mut input = InputBuffer::new(&compressed);
    let mut sink = vec![0u8; payload.len()];
    let mut output = OutputBuffer::new(&mut sink);
    let first = decoder.update(&mut input, &mut output).unwrap_err();
    assert_eq!(first.status(), Status::Limit);

    // The handle stays failed even with fresh buffers.
    let mut input = InputBuffer::new(&[]);
    let mut more = vec![0u8; 1024];
    let mut output = OutputBuffer::new(&mut more);
    let second = decoder.update(&mut input, &mut output).unwrap_err();
    assert_eq!(second.status(), Status::Limit);
    assert_eq!(decoder.last_error(), Status::Limit);
}

// ─────────────────────────────────────────────────────────────────────────────
// Output and memory caps
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn decoder_output_cap() {
    let registry = default_registry();
    let payload = common::text_corpus(64 * 1024, 70);
    let compressed = common::encode_all(registry, "deflate", &Options::new(), &payload).unwrap();

    let mut options = Options::new();
    options.set_uint64("limits.max_output_bytes", 1000);
    let err = common::decode_all(registry, "deflate", &options, &compressed, payload.len())
        .unwrap_err();
    assert_eq!(err.status(), Status::Limit);
}

#[test]
fn encoder_output_cap() {
    let registry = default_registry();
    let payload = common::noise_corpus(200 * 1024, 71);
    let mut options = Options::new();
    options.set_uint64("limits.max_output_bytes", 4096);
    let result = common::encode_all(registry, "deflate", &options, &payload);
    assert_eq!(result.unwrap_err().status(), Status::Limit);
}

#[test]
fn memory_cap_rejects_construction() {
    let mut options = Options::new();
    options.set_uint64("limits.max_memory_bytes", 1000);
    let err = Decoder::new(default_registry(), "deflate", &options).unwrap_err();
    assert_eq!(err.status(), Status::Limit);

    let err = Encoder::new(default_registry(), "deflate", &options).unwrap_err();
    assert_eq!(err.status(), Status::Limit);
}

#[test]
fn window_cap_rejects_construction() {
    let mut options = Options::new();
    options.set_uint64("limits.max_window_bytes", 1024);
    let err = Decoder::new(default_registry(), "deflate", &options).unwrap_err();
    assert_eq!(err.status(), Status::Limit);

    // A small encoder window fits under the same cap.
    options.set_uint64("deflate.window_bits", 10);
    assert!(Encoder::new(default_registry(), "deflate", &options).is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder robustness
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn bit_flips_terminate_with_a_verdict() {
    let registry = default_registry();
    let payload = common::text_corpus(4_096, 72);
    let compressed = common::encode_all(registry, "gzip", &Options::new(), &payload).unwrap();

    for position in (0..compressed.len()).step_by(7) {
        for bit in [0x01u8, 0x10, 0x80] {
            let mut corrupted = compressed.clone();
            corrupted[position] ^= bit;
            match common::decode_all(registry, "gzip", &Options::new(), &corrupted, payload.len())
            {
                // Some flips only touch ignored header fields.
                Ok(_) => {}
                Err(e) => assert!(
                    matches!(e.status(), Status::Corrupt | Status::Limit),
                    "byte {position} bit {bit:#x}: {:?}",
                    e.status()
                ),
            }
        }
    }
}

#[test]
fn truncations_terminate_with_a_verdict() {
    let registry = default_registry();
    let payload = common::text_corpus(4_096, 73);
    let compressed = common::encode_all(registry, "deflate", &Options::new(), &payload).unwrap();

    for cut in 0..compressed.len() {
        let err = common::decode_all(
            registry,
            "deflate",
            &Options::new(),
            &compressed[..cut],
            payload.len(),
        )
        .unwrap_err();
        assert!(
            matches!(err.status(), Status::Corrupt | Status::Limit),
            "cut {cut}: {:?}",
            err.status()
        );
    }
}
