//! Drivers over the streaming API: one-shot buffer-to-buffer helpers and
//! callback-based pull/push streaming.
//!
//! Both drivers are thin, method-agnostic loops over [`Encoder`] /
//! [`Decoder`]. The buffer helpers run a whole stream between two contiguous
//! slices; the callback helpers pull input from a read callback and push
//! output to a write callback through small staging buffers, which suits
//! sources and sinks that cannot be held in memory at once.

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::error::{Error, Result, Status};
use crate::options::Options;
use crate::registry::Registry;
use crate::stream::{Decoder, Encoder};

/// Staging buffer size for the callback drivers.
const STAGING_SIZE: usize = 8 * 1024;

// The encode and decode loops are identical; a tiny internal dispatch keeps
// one copy of the partial-I/O bookkeeping.
enum Handle {
    Encoder(Encoder),
    Decoder(Decoder),
}

impl Handle {
    fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        match self {
            Handle::Encoder(e) => e.update(input, output),
            Handle::Decoder(d) => d.update(input, output),
        }
    }

    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        match self {
            Handle::Encoder(e) => e.finish(output),
            Handle::Decoder(d) => d.finish(output),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot buffer-to-buffer
// ─────────────────────────────────────────────────────────────────────────────

/// Compress `input` into `output` in one call, returning the number of bytes
/// written. Fails with `Limit` if `output` is too small for the whole stream.
pub fn encode_buffer(
    registry: &Registry,
    method_name: &str,
    options: &Options,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    let encoder = Encoder::new(registry, method_name, options)?;
    run_to_completion(Handle::Encoder(encoder), input, output)
}

/// Decompress `input` into `output` in one call, returning the number of
/// bytes written. Fails with `Limit` if `output` is too small for the whole
/// stream.
pub fn decode_buffer(
    registry: &Registry,
    method_name: &str,
    options: &Options,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize> {
    let decoder = Decoder::new(registry, method_name, options)?;
    run_to_completion(Handle::Decoder(decoder), input, output)
}

fn run_to_completion(mut handle: Handle, input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut in_pos = 0usize;
    let mut out_pos = 0usize;

    while in_pos < input.len() {
        let (consumed, produced) = {
            let mut input_buf = InputBuffer::new(&input[in_pos..]);
            let mut output_buf = OutputBuffer::new(&mut output[out_pos..]);
            handle.update(&mut input_buf, &mut output_buf)?;
            (input_buf.used(), output_buf.used())
        };
        in_pos += consumed;
        out_pos += produced;

        if out_pos == output.len() && in_pos < input.len() {
            return Err(Error::limit("output buffer full with input remaining"));
        }
        if consumed == 0 && produced == 0 {
            // No forward progress possible on this input.
            break;
        }
    }

    // A one-shot output buffer cannot gain space, so a `Limit` here is final.
    let mut output_buf = OutputBuffer::new(&mut output[out_pos..]);
    handle.finish(&mut output_buf)?;
    out_pos += output_buf.used();
    Ok(out_pos)
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback streaming
// ─────────────────────────────────────────────────────────────────────────────

/// Compress a stream pulled from `read` and pushed to `write`.
///
/// `read` fills the provided buffer and returns the byte count; returning 0
/// signals end of input. `write` accepts a slice and returns how many bytes
/// it took — short writes are retried with the remainder. Any error from a
/// callback is propagated immediately.
pub fn encode_stream<R, W>(
    registry: &Registry,
    method_name: &str,
    options: &Options,
    read: R,
    write: W,
) -> Result<()>
where
    R: FnMut(&mut [u8]) -> Result<usize>,
    W: FnMut(&[u8]) -> Result<usize>,
{
    let encoder = Encoder::new(registry, method_name, options)?;
    run_callbacks(Handle::Encoder(encoder), read, write)
}

/// Decompress a stream pulled from `read` and pushed to `write`.
pub fn decode_stream<R, W>(
    registry: &Registry,
    method_name: &str,
    options: &Options,
    read: R,
    write: W,
) -> Result<()>
where
    R: FnMut(&mut [u8]) -> Result<usize>,
    W: FnMut(&[u8]) -> Result<usize>,
{
    let decoder = Decoder::new(registry, method_name, options)?;
    run_callbacks(Handle::Decoder(decoder), read, write)
}

fn run_callbacks<R, W>(mut handle: Handle, mut read: R, mut write: W) -> Result<()>
where
    R: FnMut(&mut [u8]) -> Result<usize>,
    W: FnMut(&[u8]) -> Result<usize>,
{
    let mut in_stage = [0u8; STAGING_SIZE];
    let mut out_stage = [0u8; STAGING_SIZE];
    let mut in_len = 0usize;
    let mut in_pos = 0usize;
    let mut eof = false;

    loop {
        if in_pos == in_len && !eof {
            let n = read(&mut in_stage)?;
            let n = n.min(in_stage.len());
            if n == 0 {
                eof = true;
            } else {
                in_len = n;
                in_pos = 0;
            }
        }

        let (consumed, produced) = {
            let mut input_buf = InputBuffer::new(&in_stage[in_pos..in_len]);
            let mut output_buf = OutputBuffer::new(&mut out_stage);
            handle.update(&mut input_buf, &mut output_buf)?;
            (input_buf.used(), output_buf.used())
        };
        in_pos += consumed;
        write_all(&mut write, &out_stage[..produced])?;

        // After EOF, keep updating with empty input until the stream drains.
        if eof && consumed == 0 && produced == 0 {
            break;
        }
    }

    loop {
        let (done, produced) = {
            let mut output_buf = OutputBuffer::new(&mut out_stage);
            match handle.finish(&mut output_buf) {
                Ok(()) => (true, output_buf.used()),
                Err(e) if e.status() == Status::Limit && output_buf.used() > 0 => {
                    (false, output_buf.used())
                }
                Err(e) => return Err(e),
            }
        };
        write_all(&mut write, &out_stage[..produced])?;
        if done {
            return Ok(());
        }
    }
}

fn write_all<W>(write: &mut W, mut data: &[u8]) -> Result<()>
where
    W: FnMut(&[u8]) -> Result<usize>,
{
    while !data.is_empty() {
        let n = write(data)?;
        if n == 0 {
            return Err(Error::io("write callback accepted no bytes"));
        }
        let n = n.min(data.len());
        data = &data[n..];
    }
    Ok(())
}
