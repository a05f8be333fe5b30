//! gzip encoder: RFC 1952 framing around the DEFLATE encoder.
//!
//! Emits the header once, streams the compressed body, and appends the
//! CRC32 + ISIZE trailer at `finish`. The checksum and length run over the
//! uncompressed input as it is consumed.

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::crc32::Crc32;
use crate::deflate::DeflateEncoder;
use crate::error::{Error, Result};
use crate::gzip::header::HeaderConfig;
use crate::method::MethodEncoder;
use crate::options::{OptionValue, Options};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Header (possibly partially) unemitted; body streaming.
    Stream,
    /// Body complete; trailer (possibly partially) unemitted.
    Trailer,
    Finished,
    Failed,
}

/// Streaming gzip encoder.
pub struct GzipEncoder {
    header: Vec<u8>,
    header_pos: usize,
    inner: DeflateEncoder,
    crc: Crc32,
    isize_count: u32,
    trailer: [u8; 8],
    trailer_pos: usize,
    stage: Stage,
    failure: Option<Error>,
}

impl GzipEncoder {
    pub fn new(options: &Options) -> Result<GzipEncoder> {
        let level = match options.get("deflate.level") {
            Some(OptionValue::Int64(v)) => *v,
            _ => 6,
        };
        let config = HeaderConfig::from_options(options)?;
        // The same options bag configures the wrapped codec; the schema's
        // ignore policy lets deflate.* and limits.* keys travel through.
        let inner = DeflateEncoder::new(options)?;

        Ok(GzipEncoder {
            header: config.encode(level),
            header_pos: 0,
            inner,
            crc: Crc32::new(),
            isize_count: 0,
            trailer: [0; 8],
            trailer_pos: 0,
            stage: Stage::Stream,
            failure: None,
        })
    }

    fn fail(&mut self, error: Error) -> Error {
        self.stage = Stage::Failed;
        self.failure = Some(error.clone());
        error
    }

    fn replay(&self) -> Option<Error> {
        if self.stage == Stage::Failed {
            Some(self.failure.clone().unwrap_or_else(|| {
                Error::internal("gzip encoder failed without a recorded error")
            }))
        } else {
            None
        }
    }

    /// Push pending header bytes; true once the header is fully out.
    fn emit_header(&mut self, output: &mut OutputBuffer<'_>) -> bool {
        if self.header_pos < self.header.len() {
            self.header_pos += output.push(&self.header[self.header_pos..]);
        }
        self.header_pos == self.header.len()
    }
}

impl MethodEncoder for GzipEncoder {
    fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }
        if self.stage != Stage::Stream {
            return Err(Error::invalid_arg("update after finish"));
        }

        if !self.emit_header(output) {
            // Header emission made progress; body has to wait for space.
            return Ok(());
        }

        let data = input.data();
        let from = input.used();
        let result = self.inner.update(input, output);
        let consumed = &data[from..input.used()];
        self.crc.update(consumed);
        self.isize_count = self.isize_count.wrapping_add(consumed.len() as u32);

        result.map_err(|e| self.fail(e))
    }

    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }

        if self.stage == Stage::Stream {
            if !self.emit_header(output) {
                return Err(Error::limit("output buffer full; call finish again"));
            }
            match self.inner.finish(output) {
                Ok(()) => {
                    self.trailer[..4].copy_from_slice(&self.crc.value().to_le_bytes());
                    self.trailer[4..].copy_from_slice(&self.isize_count.to_le_bytes());
                    self.stage = Stage::Trailer;
                }
                Err(e) if e.status() == crate::error::Status::Limit => return Err(e),
                Err(e) => return Err(self.fail(e)),
            }
        }

        if self.stage == Stage::Trailer {
            self.trailer_pos += output.push(&self.trailer[self.trailer_pos..]);
            if self.trailer_pos < self.trailer.len() {
                return Err(Error::limit("output buffer full; call finish again"));
            }
            self.stage = Stage::Finished;
        }

        Ok(())
    }
}
