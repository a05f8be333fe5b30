//! Generic streaming encoder/decoder handles.
//!
//! A handle binds a registered method to its streaming state and captures the
//! most recent error (status + detail) for later interrogation. Handles are
//! exclusively owned; they are not thread-safe and are torn down by `Drop`.
//!
//! ## Partial-I/O contract
//!
//! `update` may consume any number of input bytes (including zero) and
//! produce any number of output bytes (including zero), advancing the `used`
//! cursor of each buffer to report what happened. A caller detects a wedged
//! stream by the pattern "nothing consumed, nothing produced" and must then
//! either supply more output space or recognize end-of-stream.
//!
//! ## Failure stickiness
//!
//! After any error other than `Limit`, the handle is failed: subsequent
//! `update`/`finish` calls return the same error. A `Limit` returned by
//! `finish` because the output buffer is full is recoverable — call `finish`
//! again with more space.

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::error::{Error, Result, Status};
use crate::method::{Method, MethodDecoder, MethodEncoder};
use crate::options::Options;
use crate::registry::Registry;

fn resolve(registry: &Registry, method_name: &str) -> Result<&'static Method> {
    registry.find(method_name).ok_or_else(|| {
        Error::unsupported(format!("unknown compression method \"{method_name}\""))
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder
// ─────────────────────────────────────────────────────────────────────────────

/// A streaming compression handle for one method instance.
pub struct Encoder {
    method: &'static Method,
    state: Box<dyn MethodEncoder>,
    last_error: Status,
    error_detail: String,
}

impl Encoder {
    /// Create an encoder for the named method.
    ///
    /// Fails with `Unsupported` if the method is unknown or cannot encode,
    /// and with `InvalidArg` if `options` violates the method's schema.
    pub fn new(registry: &Registry, method_name: &str, options: &Options) -> Result<Encoder> {
        let method = resolve(registry, method_name)?;
        if !method.capabilities.can_encode() {
            return Err(Error::unsupported(format!(
                "method \"{method_name}\" does not support encoding"
            )));
        }
        method.schema.validate(options)?;
        let state = (method.create_encoder)(registry, options)?;
        Ok(Encoder {
            method,
            state,
            last_error: Status::Ok,
            error_detail: String::new(),
        })
    }

    /// Compress more input, writing as much output as fits.
    pub fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }
        self.state.update(input, output).map_err(|e| self.capture(e))
    }

    /// Flush remaining output and terminate the stream. Retryable after a
    /// `Limit` error.
    pub fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }
        self.state.finish(output).map_err(|e| self.capture(e))
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name
    }

    /// Status of the most recent failed call, or `Ok`.
    pub fn last_error(&self) -> Status {
        self.last_error
    }

    /// Detail string of the most recent failed call; empty if none.
    pub fn error_detail(&self) -> &str {
        &self.error_detail
    }

    fn replay(&self) -> Option<Error> {
        match self.last_error {
            Status::Ok | Status::Limit => None,
            status => Some(Error::new(status, self.error_detail.clone())),
        }
    }

    fn capture(&mut self, error: Error) -> Error {
        self.last_error = error.status();
        self.error_detail.clear();
        self.error_detail.push_str(error.detail());
        error
    }
}

impl std::fmt::Debug for Encoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("method", &self.method.name)
            .field("last_error", &self.last_error)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder
// ─────────────────────────────────────────────────────────────────────────────

/// A streaming decompression handle for one method instance.
pub struct Decoder {
    method: &'static Method,
    state: Box<dyn MethodDecoder>,
    last_error: Status,
    error_detail: String,
}

impl Decoder {
    /// Create a decoder for the named method.
    pub fn new(registry: &Registry, method_name: &str, options: &Options) -> Result<Decoder> {
        let method = resolve(registry, method_name)?;
        if !method.capabilities.can_decode() {
            return Err(Error::unsupported(format!(
                "method \"{method_name}\" does not support decoding"
            )));
        }
        method.schema.validate(options)?;
        let state = (method.create_decoder)(registry, options)?;
        Ok(Decoder {
            method,
            state,
            last_error: Status::Ok,
            error_detail: String::new(),
        })
    }

    /// Decompress more input, writing as much output as fits.
    ///
    /// When the caller's output buffer fills mid-stream, decoded bytes are
    /// retained internally; keep calling with an empty input until no further
    /// output is produced.
    pub fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }
        self.state.update(input, output).map_err(|e| self.capture(e))
    }

    /// Drain buffered output and verify the stream terminated cleanly.
    /// Retryable after a `Limit` error.
    pub fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }
        self.state.finish(output).map_err(|e| self.capture(e))
    }

    pub fn method_name(&self) -> &'static str {
        self.method.name
    }

    pub fn last_error(&self) -> Status {
        self.last_error
    }

    pub fn error_detail(&self) -> &str {
        &self.error_detail
    }

    fn replay(&self) -> Option<Error> {
        match self.last_error {
            Status::Ok | Status::Limit => None,
            status => Some(Error::new(status, self.error_detail.clone())),
        }
    }

    fn capture(&mut self, error: Error) -> Error {
        self.last_error = error.status();
        self.error_detail.clear();
        self.error_detail.push_str(error.detail());
        error
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("method", &self.method.name)
            .field("last_error", &self.last_error)
            .finish()
    }
}
