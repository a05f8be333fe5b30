#![no_main]
use libfuzzer_sys::fuzz_target;

use deflater::{decode_buffer, default_registry, Options};

fuzz_target!(|data: &[u8]| {
    let registry = default_registry();

    let mut out = vec![0u8; 1 << 16];
    let _ = decode_buffer(registry, "gzip", &Options::new(), data, &mut out);

    // Concatenated-member mode walks a different trailer transition.
    let mut options = Options::new();
    options.set_bool("gzip.concat", true);
    options.set_uint64("gzip.max_name_bytes", 256);
    options.set_uint64("gzip.max_comment_bytes", 256);
    options.set_uint64("gzip.max_extra_bytes", 256);
    let _ = decode_buffer(registry, "gzip", &options, data, &mut out);
});
