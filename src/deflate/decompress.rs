//! Streaming DEFLATE decoder.
//!
//! A stage machine over the bit reader. Every read is resumable: when the
//! input view runs dry mid-value the decoder parks its position (stage plus
//! a small sub-state for in-flight symbols) and the partial bits stay in the
//! accumulator carry until the next `update` call.
//!
//! Decoded bytes land in a 32 KiB circular window (which resolves LZ77
//! back-references) and are simultaneously queued in a drain ring that
//! bridges to the caller's output buffer. If the caller's buffer fills
//! mid-match, the in-flight match counters and the ring survive until
//! subsequent calls — including calls with no input at all — pick up the
//! remainder.

use std::collections::VecDeque;

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::deflate::bitio::{BitCarry, BitReader};
use crate::deflate::huffman::DecodeTable;
use crate::deflate::tables::{
    fixed_dist_lengths, fixed_litlen_lengths, DIST_BASE, DIST_EXTRA, LENGTH_BASE, LENGTH_EXTRA,
};
use crate::error::{Error, Result};
use crate::limits::{Limits, MemoryTracker};
use crate::method::MethodDecoder;
use crate::options::Options;

/// Window size fixed by the format: back-references reach at most 32 KiB.
pub const WINDOW_SIZE: usize = 32 * 1024;

/// High-water mark for the drain ring. Decoding pauses rather than letting
/// the ring outgrow this when the caller's output buffer is full.
const DRAIN_LIMIT: usize = 32 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Stages
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    AwaitBlockHeader,
    StoredLen,
    StoredBytes,
    FixedBody,
    DynamicHeader,
    DynamicBody,
    AwaitFinalFlush,
    Done,
    Failed,
}

/// In-flight position within a compressed block body.
#[derive(Debug, Clone, Copy)]
enum BodySub {
    Symbol,
    LengthExtra { sym: u16 },
    DistanceSym { length: u16 },
    DistanceExtra { length: u16, sym: u16 },
    Copy { length: u16, distance: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DynStep {
    Counts,
    ClLens,
    CodeLens,
}

/// Partially decoded dynamic-block header.
struct DynHeader {
    step: DynStep,
    hlit: usize,
    hdist: usize,
    hclen: usize,
    cl_lens: [u8; 19],
    cl_idx: usize,
    cl_table: Option<DecodeTable>,
    lens: Vec<u8>,
    lens_pos: usize,
    pending_rep: Option<u16>,
}

impl DynHeader {
    fn new() -> DynHeader {
        DynHeader {
            step: DynStep::Counts,
            hlit: 0,
            hdist: 0,
            hclen: 0,
            cl_lens: [0; 19],
            cl_idx: 0,
            cl_table: None,
            lens: Vec::new(),
            lens_pos: 0,
            pending_rep: None,
        }
    }
}

enum BodyFlow {
    Starved,
    DrainFull,
    BlockEnd,
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoder
// ─────────────────────────────────────────────────────────────────────────────

/// Streaming DEFLATE (raw bit-stream) decoder.
pub struct DeflateDecoder {
    stage: Stage,
    carry: BitCarry,
    final_block: bool,

    window: Vec<u8>,
    win_pos: usize,
    /// Bytes ever written to the window; bounds legal back-reference
    /// distances early in the stream.
    total_out: u64,
    /// Committed input bytes (prior calls).
    total_in: u64,
    /// `total_in` plus bytes consumed so far in the current call.
    live_in: u64,

    drain: VecDeque<u8>,

    stored_len: Option<u16>,
    stored_remaining: usize,

    litlen: Option<DecodeTable>,
    dist: Option<DecodeTable>,
    dyn_header: DynHeader,
    body: BodySub,

    limits: Limits,
    memory: MemoryTracker,
    failure: Option<Error>,
}

impl DeflateDecoder {
    pub fn new(options: &Options) -> Result<DeflateDecoder> {
        // The decoder always keeps a full-size window so any conformant
        // stream decodes; `deflate.window_bits` only shapes the encoder.
        if let Some(value) = options.get("deflate.window_bits") {
            match value {
                crate::options::OptionValue::UInt64(bits) if (8..=15).contains(bits) => {}
                _ => {
                    return Err(Error::invalid_arg(
                        "option \"deflate.window_bits\" must be uint64 in 8..=15",
                    ))
                }
            }
        }

        let limits = Limits::from_options(options);
        limits.check_window(WINDOW_SIZE as u64)?;

        let mut memory = MemoryTracker::new();
        memory.track_alloc(WINDOW_SIZE + DRAIN_LIMIT);
        memory.check(limits.max_memory_bytes)?;

        Ok(DeflateDecoder {
            stage: Stage::AwaitBlockHeader,
            carry: BitCarry::default(),
            final_block: false,
            window: vec![0u8; WINDOW_SIZE],
            win_pos: 0,
            total_out: 0,
            total_in: 0,
            live_in: 0,
            drain: VecDeque::new(),
            stored_len: None,
            stored_remaining: 0,
            litlen: None,
            dist: None,
            dyn_header: DynHeader::new(),
            body: BodySub::Symbol,
            limits,
            memory,
            failure: None,
        })
    }

    /// True once the final block has been decoded and every byte handed out.
    pub fn is_finished(&self) -> bool {
        self.stage == Stage::Done && self.drain.is_empty()
    }

    /// Total uncompressed bytes produced so far.
    pub fn total_output(&self) -> u64 {
        self.total_out
    }

    fn fail(&mut self, error: Error) -> Error {
        self.stage = Stage::Failed;
        self.failure = Some(error.clone());
        error
    }

    fn flush_drain(&mut self, output: &mut OutputBuffer<'_>) {
        while !self.drain.is_empty() && !output.is_full() {
            let (front, _) = self.drain.as_slices();
            let n = output.push(front);
            self.drain.drain(..n);
        }
    }

    /// Write one decoded byte into the window and the drain ring. The
    /// output caps are checked before the byte is committed.
    fn emit_byte(&mut self, byte: u8) -> Result<()> {
        self.limits.check_output(self.total_out + 1)?;
        self.limits.check_expansion(self.live_in, self.total_out + 1)?;
        self.window[self.win_pos] = byte;
        self.win_pos = (self.win_pos + 1) & (WINDOW_SIZE - 1);
        self.total_out += 1;
        self.drain.push_back(byte);
        Ok(())
    }

    fn emit_slice(&mut self, bytes: &[u8]) -> Result<()> {
        let would_be = self.total_out + bytes.len() as u64;
        self.limits.check_output(would_be)?;
        self.limits.check_expansion(self.live_in, would_be)?;
        for &b in bytes {
            self.window[self.win_pos] = b;
            self.win_pos = (self.win_pos + 1) & (WINDOW_SIZE - 1);
        }
        self.total_out = would_be;
        self.drain.extend(bytes);
        Ok(())
    }

    fn install_fixed_tables(&mut self) -> Result<()> {
        let litlen = DecodeTable::build(&fixed_litlen_lengths(), 9)?;
        let dist = DecodeTable::build(&fixed_dist_lengths(), 7)?;
        self.track_tables(&litlen, &dist)?;
        self.litlen = Some(litlen);
        self.dist = Some(dist);
        Ok(())
    }

    fn track_tables(&mut self, litlen: &DecodeTable, dist: &DecodeTable) -> Result<()> {
        if let Some(old) = &self.litlen {
            self.memory.track_free(old.table_bytes());
        }
        if let Some(old) = &self.dist {
            self.memory.track_free(old.table_bytes());
        }
        self.memory.track_alloc(litlen.table_bytes() + dist.table_bytes());
        self.memory.check(self.limits.max_memory_bytes)
    }

    // ─── stage machine ───────────────────────────────────────────────────────

    fn run(&mut self, reader: &mut BitReader<'_>, output: &mut OutputBuffer<'_>) -> Result<()> {
        loop {
            self.live_in = self.total_in + reader.bytes_consumed() as u64;

            if self.drain.len() >= DRAIN_LIMIT {
                self.flush_drain(output);
                if self.drain.len() >= DRAIN_LIMIT {
                    // Caller is out of output space.
                    return Ok(());
                }
            }

            match self.stage {
                Stage::AwaitBlockHeader => {
                    let header = match reader.try_read(3) {
                        Some(bits) => bits,
                        None => return Ok(()),
                    };
                    self.final_block = header & 1 != 0;
                    match header >> 1 {
                        0 => {
                            reader.align_to_byte();
                            self.stored_len = None;
                            self.stage = Stage::StoredLen;
                        }
                        1 => {
                            self.install_fixed_tables()?;
                            self.body = BodySub::Symbol;
                            self.stage = Stage::FixedBody;
                        }
                        2 => {
                            self.dyn_header = DynHeader::new();
                            self.stage = Stage::DynamicHeader;
                        }
                        _ => {
                            return Err(Error::corrupt(format!(
                                "invalid block type 3 at offset {}",
                                self.live_in
                            )))
                        }
                    }
                }

                Stage::StoredLen => {
                    if self.stored_len.is_none() {
                        match reader.try_read(16) {
                            Some(len) => self.stored_len = Some(len as u16),
                            None => return Ok(()),
                        }
                    }
                    let nlen = match reader.try_read(16) {
                        Some(nlen) => nlen as u16,
                        None => return Ok(()),
                    };
                    let len = self.stored_len.take().unwrap_or(0);
                    if len != !nlen {
                        return Err(Error::corrupt("stored block LEN/NLEN mismatch"));
                    }
                    self.stored_remaining = len as usize;
                    self.stage = Stage::StoredBytes;
                }

                Stage::StoredBytes => match self.run_stored(reader)? {
                    BodyFlow::Starved => return Ok(()),
                    BodyFlow::DrainFull => {}
                    BodyFlow::BlockEnd => self.end_block(reader),
                },

                Stage::DynamicHeader => {
                    if !self.run_dynamic_header(reader)? {
                        return Ok(());
                    }
                    self.body = BodySub::Symbol;
                    self.stage = Stage::DynamicBody;
                }

                Stage::FixedBody | Stage::DynamicBody => match self.decode_body(reader)? {
                    BodyFlow::Starved => return Ok(()),
                    BodyFlow::DrainFull => {}
                    BodyFlow::BlockEnd => {}
                },

                Stage::AwaitFinalFlush => {
                    self.flush_drain(output);
                    if self.drain.is_empty() {
                        self.stage = Stage::Done;
                    }
                    return Ok(());
                }

                Stage::Done | Stage::Failed => return Ok(()),
            }
        }
    }

    fn end_block(&mut self, reader: &mut BitReader<'_>) {
        if self.final_block {
            // Whole bytes pulled past the end of the stream belong to the
            // caller (e.g. a gzip trailer); give them back now.
            reader.rewind_to_byte();
            self.stage = Stage::AwaitFinalFlush;
        } else {
            self.stage = Stage::AwaitBlockHeader;
        }
    }

    fn run_stored(&mut self, reader: &mut BitReader<'_>) -> Result<BodyFlow> {
        while self.stored_remaining > 0 {
            self.live_in = self.total_in + reader.bytes_consumed() as u64;
            if self.drain.len() >= DRAIN_LIMIT {
                return Ok(BodyFlow::DrainFull);
            }
            if reader.bits_buffered() >= 8 {
                // Byte-aligned in stored blocks, so whole bytes come out.
                match reader.try_read(8) {
                    Some(byte) => {
                        self.emit_byte(byte as u8)?;
                        self.stored_remaining -= 1;
                    }
                    None => return Ok(BodyFlow::Starved),
                }
            } else {
                let want = self
                    .stored_remaining
                    .min(DRAIN_LIMIT - self.drain.len());
                let chunk = reader.take_bytes(want);
                if chunk.is_empty() {
                    return Ok(BodyFlow::Starved);
                }
                self.stored_remaining -= chunk.len();
                self.emit_slice(chunk)?;
            }
        }
        Ok(BodyFlow::BlockEnd)
    }

    fn run_dynamic_header(&mut self, reader: &mut BitReader<'_>) -> Result<bool> {
        loop {
            match self.dyn_header.step {
                DynStep::Counts => {
                    let counts = match reader.try_read(14) {
                        Some(bits) => bits,
                        None => return Ok(false),
                    };
                    let hlit = (counts & 0x1F) as usize + 257;
                    let hdist = ((counts >> 5) & 0x1F) as usize + 1;
                    let hclen = ((counts >> 10) & 0x0F) as usize + 4;
                    if hlit > 286 || hdist > 30 {
                        return Err(Error::corrupt("too many literal/length or distance codes"));
                    }
                    self.dyn_header.hlit = hlit;
                    self.dyn_header.hdist = hdist;
                    self.dyn_header.hclen = hclen;
                    self.dyn_header.step = DynStep::ClLens;
                }

                DynStep::ClLens => {
                    while self.dyn_header.cl_idx < self.dyn_header.hclen {
                        match reader.try_read(3) {
                            Some(bits) => {
                                let slot = crate::deflate::tables::CL_ORDER[self.dyn_header.cl_idx];
                                self.dyn_header.cl_lens[slot] = bits as u8;
                                self.dyn_header.cl_idx += 1;
                            }
                            None => return Ok(false),
                        }
                    }
                    let cl_table = DecodeTable::build(&self.dyn_header.cl_lens, 7)?;
                    self.dyn_header.cl_table = Some(cl_table);
                    self.dyn_header.lens =
                        vec![0u8; self.dyn_header.hlit + self.dyn_header.hdist];
                    self.dyn_header.lens_pos = 0;
                    self.dyn_header.step = DynStep::CodeLens;
                }

                DynStep::CodeLens => {
                    let total = self.dyn_header.hlit + self.dyn_header.hdist;
                    while self.dyn_header.lens_pos < total {
                        if let Some(rep) = self.dyn_header.pending_rep {
                            let (extra, base) = match rep {
                                16 => (2, 3usize),
                                17 => (3, 3),
                                _ => (7, 11),
                            };
                            let bits = match reader.try_read(extra) {
                                Some(bits) => bits as usize,
                                None => return Ok(false),
                            };
                            let count = base + bits;
                            let fill = if rep == 16 {
                                if self.dyn_header.lens_pos == 0 {
                                    return Err(Error::corrupt(
                                        "length repeat with no previous length",
                                    ));
                                }
                                self.dyn_header.lens[self.dyn_header.lens_pos - 1]
                            } else {
                                0
                            };
                            if self.dyn_header.lens_pos + count > total {
                                return Err(Error::corrupt("length repeat overruns alphabet"));
                            }
                            for _ in 0..count {
                                self.dyn_header.lens[self.dyn_header.lens_pos] = fill;
                                self.dyn_header.lens_pos += 1;
                            }
                            self.dyn_header.pending_rep = None;
                        } else {
                            let sym = {
                                let table = match &self.dyn_header.cl_table {
                                    Some(table) => table,
                                    None => return Err(Error::internal("missing code-length table")),
                                };
                                table.decode(reader)?
                            };
                            match sym {
                                None => return Ok(false),
                                Some(sym) if sym <= 15 => {
                                    self.dyn_header.lens[self.dyn_header.lens_pos] = sym as u8;
                                    self.dyn_header.lens_pos += 1;
                                }
                                Some(sym) => self.dyn_header.pending_rep = Some(sym),
                            }
                        }
                    }

                    let hlit = self.dyn_header.hlit;
                    if self.dyn_header.lens[256] == 0 {
                        return Err(Error::corrupt("dynamic block lacks an end-of-block code"));
                    }
                    let litlen = DecodeTable::build(&self.dyn_header.lens[..hlit], 9)?;
                    let dist = DecodeTable::build(&self.dyn_header.lens[hlit..], 7)?;
                    self.track_tables(&litlen, &dist)?;
                    self.litlen = Some(litlen);
                    self.dist = Some(dist);
                    return Ok(true);
                }
            }
        }
    }

    fn decode_body(&mut self, reader: &mut BitReader<'_>) -> Result<BodyFlow> {
        loop {
            self.live_in = self.total_in + reader.bytes_consumed() as u64;
            if self.drain.len() >= DRAIN_LIMIT {
                return Ok(BodyFlow::DrainFull);
            }
            match self.body {
                BodySub::Symbol => {
                    let sym = match &self.litlen {
                        Some(table) => table.decode(reader)?,
                        None => return Err(Error::internal("missing literal/length table")),
                    };
                    let sym = match sym {
                        Some(sym) => sym,
                        None => return Ok(BodyFlow::Starved),
                    };
                    if sym < 256 {
                        self.emit_byte(sym as u8)?;
                    } else if sym == 256 {
                        self.end_block(reader);
                        return Ok(BodyFlow::BlockEnd);
                    } else if sym <= 285 {
                        let idx = (sym - 257) as usize;
                        if LENGTH_EXTRA[idx] == 0 {
                            self.body = BodySub::DistanceSym {
                                length: LENGTH_BASE[idx],
                            };
                        } else {
                            self.body = BodySub::LengthExtra { sym };
                        }
                    } else {
                        return Err(Error::corrupt(format!(
                            "invalid literal/length symbol {sym}"
                        )));
                    }
                }

                BodySub::LengthExtra { sym } => {
                    let idx = (sym - 257) as usize;
                    let bits = match reader.try_read(LENGTH_EXTRA[idx] as u32) {
                        Some(bits) => bits,
                        None => return Ok(BodyFlow::Starved),
                    };
                    self.body = BodySub::DistanceSym {
                        length: LENGTH_BASE[idx] + bits as u16,
                    };
                }

                BodySub::DistanceSym { length } => {
                    let sym = match &self.dist {
                        Some(table) => table.decode(reader)?,
                        None => return Err(Error::internal("missing distance table")),
                    };
                    let sym = match sym {
                        Some(sym) => sym,
                        None => return Ok(BodyFlow::Starved),
                    };
                    if sym > 29 {
                        return Err(Error::corrupt(format!("invalid distance symbol {sym}")));
                    }
                    let idx = sym as usize;
                    if DIST_EXTRA[idx] == 0 {
                        self.begin_copy(length, DIST_BASE[idx])?;
                    } else {
                        self.body = BodySub::DistanceExtra { length, sym };
                    }
                }

                BodySub::DistanceExtra { length, sym } => {
                    let idx = sym as usize;
                    let bits = match reader.try_read(DIST_EXTRA[idx] as u32) {
                        Some(bits) => bits,
                        None => return Ok(BodyFlow::Starved),
                    };
                    self.begin_copy(length, DIST_BASE[idx] + bits as u16)?;
                }

                BodySub::Copy { length, distance } => {
                    let mut remaining = length as usize;
                    let dist = distance as usize;
                    while remaining > 0 {
                        if self.drain.len() >= DRAIN_LIMIT {
                            self.body = BodySub::Copy {
                                length: remaining as u16,
                                distance,
                            };
                            return Ok(BodyFlow::DrainFull);
                        }
                        // Serial copy: bytes produced by this match feed its
                        // own later bytes, which is what makes short-distance
                        // run-length matches work.
                        let byte =
                            self.window[(self.win_pos + WINDOW_SIZE - dist) & (WINDOW_SIZE - 1)];
                        self.emit_byte(byte)?;
                        remaining -= 1;
                    }
                    self.body = BodySub::Symbol;
                }
            }
        }
    }

    fn begin_copy(&mut self, length: u16, distance: u16) -> Result<()> {
        let reach = (WINDOW_SIZE as u64).min(self.total_out);
        if distance as u64 > reach {
            return Err(Error::corrupt(format!(
                "back-reference distance {distance} exceeds {reach} bytes of history"
            )));
        }
        self.body = BodySub::Copy { length, distance };
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodDecoder impl
// ─────────────────────────────────────────────────────────────────────────────

impl MethodDecoder for DeflateDecoder {
    fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        if let Some(err) = self.failure.clone() {
            return Err(err);
        }

        self.flush_drain(output);

        let mut reader = BitReader::resume(input.remaining(), self.carry);
        let result = self.run(&mut reader, output);
        self.carry = reader.carry();
        let consumed = reader.bytes_consumed();
        input.consume(consumed);
        self.total_in += consumed as u64;

        self.flush_drain(output);

        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        if let Some(err) = self.failure.clone() {
            return Err(err);
        }

        self.flush_drain(output);

        match self.stage {
            Stage::AwaitFinalFlush if self.drain.is_empty() => {
                self.stage = Stage::Done;
                Ok(())
            }
            Stage::Done if self.drain.is_empty() => Ok(()),
            Stage::Done | Stage::AwaitFinalFlush => {
                // Recoverable: the caller may retry with more output space.
                Err(Error::limit("output buffer too small to drain decoded data"))
            }
            _ => Err(self.fail(Error::corrupt("truncated deflate stream"))),
        }
    }
}
