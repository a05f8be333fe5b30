//! Streaming-handle lifecycle: creation failures, error capture, failure
//! stickiness, and the retryable `Limit` from `finish`.

use crate::common::passthru;
use deflater::{
    default_registry, Decoder, Encoder, InputBuffer, Options, OutputBuffer, Registry, Status,
};

#[test]
fn unknown_method_is_unsupported() {
    let err = Encoder::new(default_registry(), "no-such-method", &Options::new()).unwrap_err();
    assert_eq!(err.status(), Status::Unsupported);
    let err = Decoder::new(default_registry(), "no-such-method", &Options::new()).unwrap_err();
    assert_eq!(err.status(), Status::Unsupported);
}

#[test]
fn missing_capability_is_unsupported() {
    let registry = Registry::new();
    registry.register(&passthru::ENCODE_ONLY).unwrap();
    assert!(Encoder::new(&registry, "passthru-encode-only", &Options::new()).is_ok());
    let err = Decoder::new(&registry, "passthru-encode-only", &Options::new()).unwrap_err();
    assert_eq!(err.status(), Status::Unsupported);
}

#[test]
fn schema_violation_is_invalid_arg() {
    let mut options = Options::new();
    options.set_int64("deflate.level", 99);
    let err = Encoder::new(default_registry(), "deflate", &options).unwrap_err();
    assert_eq!(err.status(), Status::InvalidArg);
}

#[test]
fn fresh_handle_reports_no_error() {
    let encoder = Encoder::new(default_registry(), "deflate", &Options::new()).unwrap();
    assert_eq!(encoder.last_error(), Status::Ok);
    assert_eq!(encoder.error_detail(), "");
    assert_eq!(encoder.method_name(), "deflate");
}

#[test]
fn decoder_captures_error_detail() {
    let mut decoder = Decoder::new(default_registry(), "deflate", &Options::new()).unwrap();
    // BFINAL=1, BTYPE=11: invalid block type.
    let data = [0x07u8];
    let mut input = InputBuffer::new(&data);
    let mut out = [0u8; 16];
    let mut output = OutputBuffer::new(&mut out);
    let err = decoder.update(&mut input, &mut output).unwrap_err();
    assert_eq!(err.status(), Status::Corrupt);
    assert_eq!(decoder.last_error(), Status::Corrupt);
    assert!(!decoder.error_detail().is_empty());
}

#[test]
fn failure_is_sticky() {
    let mut decoder = Decoder::new(default_registry(), "deflate", &Options::new()).unwrap();
    let data = [0x07u8];
    let mut input = InputBuffer::new(&data);
    let mut out = [0u8; 16];
    let mut output = OutputBuffer::new(&mut out);
    let first = decoder.update(&mut input, &mut output).unwrap_err();

    // A later call with perfectly valid input replays the same error.
    let good = [0x01u8, 0x00, 0x00, 0xFF, 0xFF];
    let mut input = InputBuffer::new(&good);
    let mut output = OutputBuffer::new(&mut out);
    let second = decoder.update(&mut input, &mut output).unwrap_err();
    assert_eq!(second.status(), first.status());
    assert_eq!(second.detail(), first.detail());
    assert_eq!(input.used(), 0);

    let mut output = OutputBuffer::new(&mut out);
    assert_eq!(
        decoder.finish(&mut output).unwrap_err().status(),
        Status::Corrupt
    );
}

#[test]
fn finish_limit_is_retryable() {
    let mut encoder = Encoder::new(default_registry(), "deflate", &Options::new()).unwrap();
    let payload = b"finish limit retry payload ".repeat(64);
    let mut input = InputBuffer::new(&payload);
    let mut sink = [0u8; 0];
    let mut output = OutputBuffer::new(&mut sink);
    encoder.update(&mut input, &mut output).unwrap();

    // Drain the finish output through 8-byte buffers until done.
    let mut collected = Vec::new();
    loop {
        let mut chunk = [0u8; 8];
        let mut output = OutputBuffer::new(&mut chunk);
        match encoder.finish(&mut output) {
            Ok(()) => {
                collected.extend_from_slice(output.written());
                break;
            }
            Err(e) => {
                assert_eq!(e.status(), Status::Limit);
                assert!(output.used() > 0, "no progress while finishing");
                collected.extend_from_slice(output.written());
            }
        }
    }
    assert!(!collected.is_empty());
    assert_eq!(encoder.last_error(), Status::Limit);

    // The stream produced through tiny buffers is still a valid stream.
    let mut decoded = vec![0u8; payload.len() + 16];
    let n = deflater::decode_buffer(
        default_registry(),
        "deflate",
        &Options::new(),
        &collected,
        &mut decoded,
    )
    .unwrap();
    assert_eq!(&decoded[..n], &payload[..]);
}

#[test]
fn destroy_in_any_state_is_safe() {
    // Dropping a fresh handle, a mid-stream handle, and a failed handle must
    // all be clean.
    let encoder = Encoder::new(default_registry(), "gzip", &Options::new()).unwrap();
    drop(encoder);

    let mut encoder = Encoder::new(default_registry(), "gzip", &Options::new()).unwrap();
    let data = b"some data";
    let mut input = InputBuffer::new(data);
    let mut out = [0u8; 64];
    let mut output = OutputBuffer::new(&mut out);
    encoder.update(&mut input, &mut output).unwrap();
    drop(encoder);

    let mut decoder = Decoder::new(default_registry(), "gzip", &Options::new()).unwrap();
    let bad = [0x00u8; 16];
    let mut input = InputBuffer::new(&bad);
    let mut output = OutputBuffer::new(&mut out);
    let _ = decoder.update(&mut input, &mut output);
    drop(decoder);
}

#[test]
fn passthru_streams_through_handles() {
    let registry = Registry::new();
    registry.register(&passthru::METHOD).unwrap();

    let mut encoder = Encoder::new(&registry, "passthru", &Options::new()).unwrap();
    let data = b"hello world";
    let mut input = InputBuffer::new(data);
    let mut out = [0u8; 32];
    let mut output = OutputBuffer::new(&mut out);
    encoder.update(&mut input, &mut output).unwrap();
    assert!(input.is_exhausted());
    assert_eq!(output.written(), data);
    let mut output = OutputBuffer::new(&mut out);
    encoder.finish(&mut output).unwrap();
    assert_eq!(output.used(), 0);
}
