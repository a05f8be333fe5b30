//! Pluggable streaming compression: DEFLATE (RFC 1951) and gzip (RFC 1952).
//!
//! The crate is organized around a method registry. A [`Method`] descriptor
//! names a codec and supplies factories for its streaming state; the generic
//! [`Encoder`] / [`Decoder`] handles drive any registered method through the
//! same `update` / `finish` surface with strict partial-I/O semantics. The
//! built-in `"deflate"` and `"gzip"` methods are registered with the
//! [`default_registry`] before its first lookup returns.
//!
//! Three interchangeable ways to run a stream:
//!
//! - **One-shot**: [`encode_buffer`] / [`decode_buffer`] between two slices.
//! - **Incremental**: create an [`Encoder`] or [`Decoder`] and feed it
//!   [`InputBuffer`] / [`OutputBuffer`] views at your own pace.
//! - **Callbacks**: [`encode_stream`] / [`decode_stream`] pull from a read
//!   callback and push to a write callback through small staging buffers.
//!
//! Untrusted input is bounded by the `limits.*` options: output size,
//! tracked memory, window size, and (for decoders) the expansion ratio that
//! defuses decompression bombs.

pub mod buffer;
pub mod crc32;
pub mod deflate;
pub mod error;
pub mod gzip;
pub mod io;
pub mod limits;
pub mod method;
pub mod options;
pub mod registry;
pub mod stream;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level re-exports for the common API surface.
// ─────────────────────────────────────────────────────────────────────────────

/// Buffer views passed to every `update`/`finish` call.
pub use buffer::{InputBuffer, OutputBuffer};
/// Status codes, error values, and the crate-wide `Result`.
pub use error::{Error, Result, Status};
/// One-shot and callback drivers.
pub use io::{decode_buffer, decode_stream, encode_buffer, encode_stream};
/// Safety limits and memory accounting.
pub use limits::{Limits, MemoryTracker};
/// Method descriptors and the traits their factories produce.
pub use method::{Capabilities, Method, MethodDecoder, MethodEncoder};
/// Typed options and per-method schemas.
pub use options::{MethodSchema, OptionSpec, OptionType, OptionValue, Options, UnknownKeyPolicy};
/// Method registries.
pub use registry::{default_registry, Registry};
/// Streaming handles.
pub use stream::{Decoder, Encoder};
