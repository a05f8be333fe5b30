#![no_main]
use libfuzzer_sys::fuzz_target;

use deflater::{decode_buffer, default_registry, encode_buffer, Options};

fuzz_target!(|data: &[u8]| {
    // First byte picks the level and method; the rest is payload.
    let (head, payload) = match data.split_first() {
        Some(split) => split,
        None => return,
    };
    let level = (head & 0x0F) % 10;
    let method = if head & 0x10 != 0 { "gzip" } else { "deflate" };

    let registry = default_registry();
    let mut options = Options::new();
    options.set_int64("deflate.level", level as i64);

    let mut compressed = vec![0u8; payload.len() + payload.len() / 16 + 1024];
    let n = encode_buffer(registry, method, &options, payload, &mut compressed)
        .expect("compressing arbitrary payload must succeed");

    let mut restored = vec![0u8; payload.len() + 16];
    let m = decode_buffer(registry, method, &Options::new(), &compressed[..n], &mut restored)
        .expect("decoding self-compressed data must succeed");

    assert_eq!(
        &restored[..m],
        payload,
        "round-trip mismatch: {} bytes in, {m} bytes back",
        payload.len()
    );
});
