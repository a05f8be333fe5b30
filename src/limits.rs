//! Safety limits and memory accounting.
//!
//! Four `limits.*` option keys are recognized by every method; a value of 0
//! means unlimited. Decoders additionally enforce the expansion-ratio cap,
//! the defense against decompression bombs (a small compressed input that
//! expands to a massive output).

use crate::error::{Error, Result};
use crate::options::Options;

/// Cap on produced output bytes. Default 512 MiB.
pub const KEY_MAX_OUTPUT_BYTES: &str = "limits.max_output_bytes";
/// Cap on tracked allocations. Default 256 MiB.
pub const KEY_MAX_MEMORY_BYTES: &str = "limits.max_memory_bytes";
/// Cap on window size. Default unlimited.
pub const KEY_MAX_WINDOW_BYTES: &str = "limits.max_window_bytes";
/// Cap on output/input ratio (decoders only). Default 1000.
pub const KEY_MAX_EXPANSION_RATIO: &str = "limits.max_expansion_ratio";

pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 512 * 1024 * 1024;
pub const DEFAULT_MAX_MEMORY_BYTES: u64 = 256 * 1024 * 1024;
pub const DEFAULT_MAX_EXPANSION_RATIO: u64 = 1000;

// ─────────────────────────────────────────────────────────────────────────────
// Limits
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved limit values for one encoder or decoder instance.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_output_bytes: u64,
    pub max_memory_bytes: u64,
    pub max_window_bytes: u64,
    pub max_expansion_ratio: u64,
}

impl Limits {
    /// Read the recognized limit keys from an options bag, substituting the
    /// documented defaults for absent keys.
    pub fn from_options(options: &Options) -> Limits {
        Limits {
            max_output_bytes: options
                .get_uint64(KEY_MAX_OUTPUT_BYTES)
                .unwrap_or(DEFAULT_MAX_OUTPUT_BYTES),
            max_memory_bytes: options
                .get_uint64(KEY_MAX_MEMORY_BYTES)
                .unwrap_or(DEFAULT_MAX_MEMORY_BYTES),
            max_window_bytes: options.get_uint64(KEY_MAX_WINDOW_BYTES).unwrap_or(0),
            max_expansion_ratio: options
                .get_uint64(KEY_MAX_EXPANSION_RATIO)
                .unwrap_or(DEFAULT_MAX_EXPANSION_RATIO),
        }
    }

    /// Check total produced output against the output cap.
    pub fn check_output(&self, produced: u64) -> Result<()> {
        if self.max_output_bytes != 0 && produced > self.max_output_bytes {
            return Err(Error::limit(format!(
                "output cap exceeded ({produced} > {} bytes)",
                self.max_output_bytes
            )));
        }
        Ok(())
    }

    /// Check a window allocation against the window cap.
    pub fn check_window(&self, window_bytes: u64) -> Result<()> {
        if self.max_window_bytes != 0 && window_bytes > self.max_window_bytes {
            return Err(Error::limit(format!(
                "window of {window_bytes} bytes exceeds cap of {} bytes",
                self.max_window_bytes
            )));
        }
        Ok(())
    }

    /// Check the decoder expansion ratio. No ratio can be computed until at
    /// least one input byte has been consumed.
    pub fn check_expansion(&self, input_bytes: u64, output_bytes: u64) -> Result<()> {
        if self.max_expansion_ratio == 0 || input_bytes == 0 {
            return Ok(());
        }
        if output_bytes > self.max_expansion_ratio.saturating_mul(input_bytes) {
            return Err(Error::limit(format!(
                "expansion ratio exceeded ({output_bytes} bytes out from {input_bytes} bytes in, cap {}x)",
                self.max_expansion_ratio
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory tracker
// ─────────────────────────────────────────────────────────────────────────────

/// Running total of a codec's tracked allocations.
///
/// Saturates instead of wrapping in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryTracker {
    current_bytes: usize,
}

impl MemoryTracker {
    pub fn new() -> MemoryTracker {
        MemoryTracker::default()
    }

    pub fn track_alloc(&mut self, size: usize) {
        self.current_bytes = self.current_bytes.saturating_add(size);
    }

    pub fn track_free(&mut self, size: usize) {
        self.current_bytes = self.current_bytes.saturating_sub(size);
    }

    pub fn current(&self) -> usize {
        self.current_bytes
    }

    /// Check tracked usage against the memory cap.
    pub fn check(&self, limit: u64) -> Result<()> {
        if limit != 0 && self.current_bytes as u64 > limit {
            return Err(Error::limit(format!(
                "memory cap exceeded ({} > {limit} bytes)",
                self.current_bytes
            )));
        }
        Ok(())
    }
}
