//! gzip (RFC 1952) header constants and the encoder-side header builder.
//!
//! The fixed prefix is ten bytes — `ID1 ID2 CM FLG MTIME(4) XFL OS` — and may
//! be followed by the optional FEXTRA, FNAME, FCOMMENT, and FHCRC fields, in
//! that order.

use crate::crc32::Crc32;
use crate::error::{Error, Result};
use crate::options::{OptionValue, Options};

pub const ID1: u8 = 0x1F;
pub const ID2: u8 = 0x8B;
/// The only compression method gzip defines: DEFLATE.
pub const CM_DEFLATE: u8 = 8;

pub const FLG_FTEXT: u8 = 0x01;
pub const FLG_FHCRC: u8 = 0x02;
pub const FLG_FEXTRA: u8 = 0x04;
pub const FLG_FNAME: u8 = 0x08;
pub const FLG_FCOMMENT: u8 = 0x10;
/// Bits 5–7 are reserved and must be zero.
pub const FLG_RESERVED: u8 = 0xE0;

pub const OS_UNKNOWN: u8 = 255;

pub const DEFAULT_MAX_NAME_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_COMMENT_BYTES: u64 = 1024 * 1024;
pub const DEFAULT_MAX_EXTRA_BYTES: u64 = 64 * 1024;

/// XFL hint derived from the compression level when `gzip.xfl` is not set:
/// 2 flags maximum compression, 4 flags fastest.
pub fn xfl_for_level(level: i64) -> u8 {
    match level {
        9 => 2,
        1 => 4,
        _ => 0,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder-side header configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Header fields resolved from the options bag at encoder creation.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    pub mtime: u32,
    pub os: u8,
    pub xfl: Option<u8>,
    pub name: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub extra: Option<Vec<u8>>,
    pub header_crc: bool,
}

impl HeaderConfig {
    pub fn from_options(options: &Options) -> Result<HeaderConfig> {
        let mtime = match options.get_uint64("gzip.mtime").unwrap_or(0) {
            v if v <= u32::MAX as u64 => v as u32,
            _ => {
                return Err(Error::invalid_arg(
                    "option \"gzip.mtime\" does not fit a 32-bit timestamp",
                ))
            }
        };
        let os = options.get_uint64("gzip.os").unwrap_or(OS_UNKNOWN as u64) as u8;
        let xfl = options.get_uint64("gzip.xfl").map(|v| v as u8);

        let name = match options.get("gzip.name") {
            Some(OptionValue::Str(s)) => Some(latin_field("gzip.name", s.as_bytes())?),
            _ => None,
        };
        let comment = match options.get("gzip.comment") {
            Some(OptionValue::Str(s)) => Some(latin_field("gzip.comment", s.as_bytes())?),
            _ => None,
        };
        let extra = match options.get("gzip.extra") {
            Some(OptionValue::Bytes(b)) => {
                if b.len() > u16::MAX as usize {
                    return Err(Error::invalid_arg(
                        "option \"gzip.extra\" exceeds the 65535-byte field limit",
                    ));
                }
                Some(b.clone())
            }
            _ => None,
        };
        let header_crc = options.get_bool("gzip.header_crc").unwrap_or(false);

        Ok(HeaderConfig {
            mtime,
            os,
            xfl,
            name,
            comment,
            extra,
            header_crc,
        })
    }

    /// Serialize the complete header, deriving XFL from `level` when unset.
    pub fn encode(&self, level: i64) -> Vec<u8> {
        let mut flg = 0u8;
        if self.extra.is_some() {
            flg |= FLG_FEXTRA;
        }
        if self.name.is_some() {
            flg |= FLG_FNAME;
        }
        if self.comment.is_some() {
            flg |= FLG_FCOMMENT;
        }
        if self.header_crc {
            flg |= FLG_FHCRC;
        }

        let mut header = Vec::with_capacity(16);
        header.push(ID1);
        header.push(ID2);
        header.push(CM_DEFLATE);
        header.push(flg);
        header.extend_from_slice(&self.mtime.to_le_bytes());
        header.push(self.xfl.unwrap_or_else(|| xfl_for_level(level)));
        header.push(self.os);

        if let Some(extra) = &self.extra {
            header.extend_from_slice(&(extra.len() as u16).to_le_bytes());
            header.extend_from_slice(extra);
        }
        if let Some(name) = &self.name {
            header.extend_from_slice(name);
            header.push(0);
        }
        if let Some(comment) = &self.comment {
            header.extend_from_slice(comment);
            header.push(0);
        }
        if self.header_crc {
            let mut crc = Crc32::new();
            crc.update(&header);
            header.extend_from_slice(&((crc.value() & 0xFFFF) as u16).to_le_bytes());
        }
        header
    }
}

// NUL terminates these fields on the wire, so an embedded NUL cannot survive
// a round trip.
fn latin_field(key: &str, bytes: &[u8]) -> Result<Vec<u8>> {
    if bytes.contains(&0) {
        return Err(Error::invalid_arg(format!(
            "option \"{key}\" must not contain NUL bytes"
        )));
    }
    Ok(bytes.to_vec())
}
