//! E2E: identity round-trips across both methods, every level, and all three
//! driver interfaces.

#[path = "../tests/common/mod.rs"]
mod common;

use std::cell::RefCell;

use deflater::{decode_stream, default_registry, encode_stream, Options};

fn level_options(level: i64) -> Options {
    let mut options = Options::new();
    options.set_int64("deflate.level", level);
    options
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot identity across methods and levels
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn oneshot_identity_both_methods_all_levels() {
    let registry = default_registry();
    let corpora: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"A".to_vec(),
        b"Hello".to_vec(),
        vec![0u8; 256],
        common::text_corpus(10 * 1024, 40),
        common::pattern_corpus(4 * 1024),
    ];

    for method in ["deflate", "gzip"] {
        for level in 0..=9 {
            let options = level_options(level);
            for data in &corpora {
                let compressed = common::encode_all(registry, method, &options, data).unwrap();
                let restored = common::decode_all(
                    registry,
                    method,
                    &Options::new(),
                    &compressed,
                    data.len(),
                )
                .unwrap();
                assert_eq!(&restored, data, "{method} level {level}");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Interface equivalence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn streaming_equals_oneshot_bytes() {
    let registry = default_registry();
    let data = common::text_corpus(120_000, 41);
    for method in ["deflate", "gzip"] {
        let options = level_options(6);
        let oneshot = common::encode_all(registry, method, &options, &data).unwrap();
        let streamed = common::stream_encode_chunked(
            registry,
            method,
            &options,
            &data,
            &[4096, 64, 1000],
            &[512, 8192],
        )
        .unwrap();
        assert_eq!(streamed, oneshot, "{method}");
    }
}

#[test]
fn callback_driver_matches_buffer_driver() {
    let registry = default_registry();
    let data = common::text_corpus(64 * 1024, 42);
    let options = level_options(6);

    let oneshot = common::encode_all(registry, "gzip", &options, &data).unwrap();

    let mut offset = 0usize;
    let sink = RefCell::new(Vec::new());
    encode_stream(
        registry,
        "gzip",
        &options,
        |buf: &mut [u8]| {
            let take = (data.len() - offset).min(buf.len()).min(1021);
            buf[..take].copy_from_slice(&data[offset..offset + take]);
            offset += take;
            Ok(take)
        },
        |bytes: &[u8]| {
            sink.borrow_mut().extend_from_slice(bytes);
            Ok(bytes.len())
        },
    )
    .unwrap();
    assert_eq!(sink.into_inner(), oneshot);

    let mut offset = 0usize;
    let restored = RefCell::new(Vec::new());
    decode_stream(
        registry,
        "gzip",
        &Options::new(),
        |buf: &mut [u8]| {
            let take = (oneshot.len() - offset).min(buf.len()).min(509);
            buf[..take].copy_from_slice(&oneshot[offset..offset + take]);
            offset += take;
            Ok(take)
        },
        |bytes: &[u8]| {
            restored.borrow_mut().extend_from_slice(bytes);
            Ok(bytes.len())
        },
    )
    .unwrap();
    assert_eq!(restored.into_inner(), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Level behavior on a large corpus
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn levels_trade_effort_for_ratio() {
    let registry = default_registry();
    let data = common::text_corpus(1024 * 1024, 43);

    let size_at = |level: i64| {
        common::encode_all(registry, "deflate", &level_options(level), &data)
            .unwrap()
            .len()
    };

    let stored = size_at(0);
    let fast = size_at(1);
    let default = size_at(6);
    let best = size_at(9);

    assert!(stored > data.len(), "level 0 must not compress");
    assert!(fast < data.len() / 2);
    assert!(default <= fast);
    assert!(best <= default);

    // Every level still round-trips the full corpus.
    for level in [0, 1, 6, 9] {
        let compressed =
            common::encode_all(registry, "deflate", &level_options(level), &data).unwrap();
        let restored =
            common::decode_all(registry, "deflate", &Options::new(), &compressed, data.len())
                .unwrap();
        assert_eq!(restored, data, "level {level}");
    }
}
