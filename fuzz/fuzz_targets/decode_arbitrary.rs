#![no_main]
use libfuzzer_sys::fuzz_target;

use deflater::{decode_buffer, default_registry, Decoder, InputBuffer, Options, OutputBuffer};

fuzz_target!(|data: &[u8]| {
    // Feed arbitrary bytes through the DEFLATE decoder. Err results are
    // expected and fine; what we verify is no panics, no unbounded loops.
    let registry = default_registry();
    let options = Options::new();

    let mut out = vec![0u8; 1 << 16];
    let _ = decode_buffer(registry, "deflate", &options, data, &mut out);

    // Also exercise the streaming path with adversarial chunk sizes.
    if let Ok(mut decoder) = Decoder::new(registry, "deflate", &options) {
        let mut pos = 0usize;
        let mut chunk = 1usize;
        let mut idle = 0usize;
        loop {
            let take = chunk.min(data.len() - pos);
            let mut input = InputBuffer::new(&data[pos..pos + take]);
            let mut window = [0u8; 61];
            let mut output = OutputBuffer::new(&mut window);
            if decoder.update(&mut input, &mut output).is_err() {
                break;
            }
            pos += input.used();
            if input.used() == 0 && output.used() == 0 {
                idle += 1;
                // End of stream, or wedged on trailing garbage.
                if pos >= data.len() || idle > 4 {
                    break;
                }
            } else {
                idle = 0;
            }
            chunk = (chunk * 3 + 1) % 37 + 1;
        }
        let mut window = [0u8; 61];
        let mut output = OutputBuffer::new(&mut window);
        let _ = decoder.finish(&mut output);
    }
});
