//! The DEFLATE (RFC 1951) compression method.
//!
//! Raw bit-stream compression and decompression with no framing: LZ77
//! matching over a sliding window plus canonical Huffman entropy coding,
//! in stored, fixed-code, and dynamic-code block flavors.

pub mod bitio;
pub mod compress;
pub mod decompress;
pub mod huffman;
pub mod tables;

pub use compress::DeflateEncoder;
pub use decompress::{DeflateDecoder, WINDOW_SIZE};

use crate::error::Result;
use crate::method::{Capabilities, Method, MethodDecoder, MethodEncoder};
use crate::options::{
    DefaultValue, MethodSchema, OptionSpec, OptionType, Options, Range, UnknownKeyPolicy,
};
use crate::registry::Registry;

// ─────────────────────────────────────────────────────────────────────────────
// Option schema
// ─────────────────────────────────────────────────────────────────────────────

static OPTION_SPECS: [OptionSpec; 2] = [
    OptionSpec {
        key: "deflate.level",
        ty: OptionType::Int64,
        default: DefaultValue::Int64(6),
        range: Range::Int { min: 0, max: 9 },
        help: "Compression level 0 (none) to 9 (best)",
    },
    OptionSpec {
        key: "deflate.window_bits",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(15),
        range: Range::UInt { min: 8, max: 15 },
        help: "LZ77 window size in bits (8..15, 32 KiB max)",
    },
];

static SCHEMA: MethodSchema = MethodSchema {
    options: &OPTION_SPECS,
    unknown_keys: UnknownKeyPolicy::Reject,
};

// ─────────────────────────────────────────────────────────────────────────────
// Method descriptor
// ─────────────────────────────────────────────────────────────────────────────

fn create_encoder(_registry: &Registry, options: &Options) -> Result<Box<dyn MethodEncoder>> {
    Ok(Box::new(DeflateEncoder::new(options)?))
}

fn create_decoder(_registry: &Registry, options: &Options) -> Result<Box<dyn MethodDecoder>> {
    Ok(Box::new(DeflateDecoder::new(options)?))
}

/// The `"deflate"` method descriptor.
pub static METHOD: Method = Method {
    name: "deflate",
    capabilities: Capabilities::ENCODE.union(Capabilities::DECODE),
    create_encoder,
    create_decoder,
    schema: &SCHEMA,
};
