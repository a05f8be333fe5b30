//! The gzip (RFC 1952) compression method.
//!
//! A framing wrapper around DEFLATE: magic bytes, metadata fields, a CRC32
//! of the uncompressed data, and its length mod 2³². The schema ignores
//! unknown option keys so `deflate.*` and `limits.*` settings reach the
//! wrapped codec untouched.

pub mod compress;
pub mod decompress;
pub mod header;

pub use compress::GzipEncoder;
pub use decompress::GzipDecoder;

use crate::error::Result;
use crate::method::{Capabilities, Method, MethodDecoder, MethodEncoder};
use crate::options::{
    DefaultValue, MethodSchema, OptionSpec, OptionType, Options, Range, UnknownKeyPolicy,
};
use crate::registry::Registry;

// ─────────────────────────────────────────────────────────────────────────────
// Option schema
// ─────────────────────────────────────────────────────────────────────────────

static OPTION_SPECS: [OptionSpec; 11] = [
    OptionSpec {
        key: "gzip.mtime",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(0),
        range: Range::None,
        help: "Modification time (Unix timestamp)",
    },
    OptionSpec {
        key: "gzip.os",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(255),
        range: Range::UInt { min: 0, max: 255 },
        help: "Operating system (0-255, 255 = unknown)",
    },
    OptionSpec {
        key: "gzip.name",
        ty: OptionType::Str,
        default: DefaultValue::None,
        range: Range::None,
        help: "Original filename",
    },
    OptionSpec {
        key: "gzip.comment",
        ty: OptionType::Str,
        default: DefaultValue::None,
        range: Range::None,
        help: "File comment",
    },
    OptionSpec {
        key: "gzip.extra",
        ty: OptionType::Bytes,
        default: DefaultValue::None,
        range: Range::None,
        help: "Extra field data",
    },
    OptionSpec {
        key: "gzip.header_crc",
        ty: OptionType::Bool,
        default: DefaultValue::Bool(false),
        range: Range::None,
        help: "Include header CRC (FHCRC flag)",
    },
    OptionSpec {
        key: "gzip.xfl",
        ty: OptionType::UInt64,
        default: DefaultValue::None,
        range: Range::UInt { min: 0, max: 255 },
        help: "Extra flags (auto-calculated if not set)",
    },
    OptionSpec {
        key: "gzip.concat",
        ty: OptionType::Bool,
        default: DefaultValue::Bool(false),
        range: Range::None,
        help: "Decoder: support concatenated members",
    },
    OptionSpec {
        key: "gzip.max_name_bytes",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(header::DEFAULT_MAX_NAME_BYTES),
        range: Range::UInt { min: 1, max: u64::MAX },
        help: "Decoder: max FNAME length in bytes",
    },
    OptionSpec {
        key: "gzip.max_comment_bytes",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(header::DEFAULT_MAX_COMMENT_BYTES),
        range: Range::UInt { min: 1, max: u64::MAX },
        help: "Decoder: max FCOMMENT length in bytes",
    },
    OptionSpec {
        key: "gzip.max_extra_bytes",
        ty: OptionType::UInt64,
        default: DefaultValue::UInt64(header::DEFAULT_MAX_EXTRA_BYTES),
        range: Range::UInt { min: 1, max: u64::MAX },
        help: "Decoder: max FEXTRA length in bytes",
    },
];

static SCHEMA: MethodSchema = MethodSchema {
    options: &OPTION_SPECS,
    // Unknown keys pass through to the wrapped deflate codec.
    unknown_keys: UnknownKeyPolicy::Ignore,
};

// ─────────────────────────────────────────────────────────────────────────────
// Method descriptor
// ─────────────────────────────────────────────────────────────────────────────

fn create_encoder(_registry: &Registry, options: &Options) -> Result<Box<dyn MethodEncoder>> {
    Ok(Box::new(GzipEncoder::new(options)?))
}

fn create_decoder(_registry: &Registry, options: &Options) -> Result<Box<dyn MethodDecoder>> {
    Ok(Box::new(GzipDecoder::new(options)?))
}

/// The `"gzip"` method descriptor.
pub static METHOD: Method = Method {
    name: "gzip",
    capabilities: Capabilities::ENCODE.union(Capabilities::DECODE),
    create_encoder,
    create_decoder,
    schema: &SCHEMA,
};
