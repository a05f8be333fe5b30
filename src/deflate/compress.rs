//! Streaming DEFLATE encoder.
//!
//! A staged pipeline: input bytes land in a sliding window; a hash-chain
//! match finder turns window content into a literal/match token stream; when
//! the token buffer fills (or the stream ends) the block formatter prices the
//! block as stored, fixed-Huffman, and dynamic-Huffman and emits the cheapest
//! through the bit writer.
//!
//! Compression level selects the match-finder parameters. Levels 1–3 take
//! the first acceptable match at each position; levels 4–9 defer one byte to
//! see whether the next position matches longer (lazy matching). Level 0
//! bypasses matching entirely and emits stored blocks.

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::deflate::bitio::BitWriter;
use crate::deflate::huffman::{canonical_codes, limited_code_lengths};
use crate::deflate::tables::{
    dist_symbol, fixed_dist_lengths, fixed_litlen_lengths, length_symbol, CL_ORDER, DIST_EXTRA,
    LENGTH_EXTRA, MAX_MATCH, MIN_MATCH,
};
use crate::error::{Error, Result};
use crate::limits::{Limits, MemoryTracker};
use crate::method::MethodEncoder;
use crate::options::{OptionValue, Options};

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const HASH_MASK: u32 = (HASH_SIZE - 1) as u32;

/// Sentinel for "no chain entry".
const EMPTY: u32 = u32::MAX;

/// Minimum lookahead required before the match finder runs mid-stream: a
/// maximal match plus one full hash probe.
const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Matches of minimum length this far back cost more than they save.
const TOO_FAR: usize = 4096;

/// Token-buffer capacity; reaching it flushes a block.
const TOKEN_LIMIT: usize = 16 * 1024;

/// Staged-output high-water mark; input consumption pauses above it until
/// the caller drains.
const PENDING_LIMIT: usize = 64 * 1024;

/// Largest stored-block payload the format can express.
const MAX_STORED: usize = 65_535;

// ─────────────────────────────────────────────────────────────────────────────
// Level parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct LevelParams {
    /// Chain search is cut to a quarter once a match this good is in hand.
    good: u16,
    /// Lazy matching stops being attempted above this match length.
    lazy: u16,
    /// Stop searching outright at a match this long.
    nice: u16,
    /// Maximum hash-chain hops per position.
    chain: u16,
}

const LEVELS: [LevelParams; 10] = [
    LevelParams { good: 0, lazy: 0, nice: 0, chain: 0 }, // 0: stored only
    LevelParams { good: 4, lazy: 4, nice: 8, chain: 4 },
    LevelParams { good: 4, lazy: 5, nice: 16, chain: 8 },
    LevelParams { good: 4, lazy: 6, nice: 32, chain: 32 },
    LevelParams { good: 4, lazy: 8, nice: 32, chain: 32 },
    LevelParams { good: 8, lazy: 16, nice: 32, chain: 32 },
    LevelParams { good: 8, lazy: 16, nice: 128, chain: 128 },
    LevelParams { good: 8, lazy: 32, nice: 128, chain: 256 },
    LevelParams { good: 32, lazy: 128, nice: 258, chain: 1024 },
    LevelParams { good: 32, lazy: 258, nice: 258, chain: 4096 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Active,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Literal(u8),
    Match { length: u16, distance: u16 },
}

/// One code-length-code symbol with its extra bits.
struct ClSym {
    sym: u8,
    extra_bits: u8,
    extra_val: u8,
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder
// ─────────────────────────────────────────────────────────────────────────────

/// Streaming DEFLATE (raw bit-stream) encoder.
pub struct DeflateEncoder {
    params: LevelParams,
    lazy: bool,
    stored_only: bool,

    w_size: usize,
    w_mask: usize,
    /// Maximum back-reference distance the finder will use.
    max_dist: usize,

    window: Vec<u8>,
    win_have: usize,
    /// Absolute input offset of `window[0]`.
    win_base: u64,
    /// Next window position to process (level 0: next unflushed byte).
    strstart: usize,

    head: Vec<u32>,
    prev: Vec<u32>,

    tokens: Vec<Token>,
    /// Absolute input offset covered by emitted tokens.
    emitted_abs: u64,
    /// Absolute input offset of the current block's first byte.
    block_start: u64,

    // Lazy-evaluation state: the match found at the previous position.
    prev_length: usize,
    prev_match: usize,
    match_available: bool,

    writer: BitWriter,
    total_in: u64,

    limits: Limits,
    memory: MemoryTracker,
    stage: Stage,
    failure: Option<Error>,
}

impl DeflateEncoder {
    pub fn new(options: &Options) -> Result<DeflateEncoder> {
        let level: usize = match options.get("deflate.level") {
            None => 6,
            Some(OptionValue::Int64(v)) if (0..=9).contains(v) => *v as usize,
            Some(_) => {
                return Err(Error::invalid_arg(
                    "option \"deflate.level\" must be int64 in 0..=9",
                ))
            }
        };

        let window_bits = match options.get("deflate.window_bits") {
            None => 15u32,
            Some(OptionValue::UInt64(v)) if (8..=15).contains(v) => *v as u32,
            Some(_) => {
                return Err(Error::invalid_arg(
                    "option \"deflate.window_bits\" must be uint64 in 8..=15",
                ))
            }
        };

        let w_size = 1usize << window_bits;
        let limits = Limits::from_options(options);
        limits.check_window(w_size as u64)?;

        let stored_only = level == 0;
        // The buffer holds one full window of history plus room to batch
        // input copies; small windows still get enough slack for the
        // match-finder lookahead to cycle.
        let capacity = w_size + w_size.max(2 * MIN_LOOKAHEAD);
        let max_dist = match w_size.saturating_sub(MIN_LOOKAHEAD) {
            0 => w_size / 2,
            d => d,
        };

        let mut memory = MemoryTracker::new();
        memory.track_alloc(capacity + PENDING_LIMIT);
        if !stored_only {
            memory.track_alloc(4 * HASH_SIZE + 4 * w_size);
            memory.track_alloc(TOKEN_LIMIT * std::mem::size_of::<Token>());
        }
        memory.check(limits.max_memory_bytes)?;

        Ok(DeflateEncoder {
            params: LEVELS[level],
            lazy: level >= 4 && !stored_only,
            stored_only,
            w_size,
            w_mask: w_size - 1,
            max_dist,
            window: vec![0u8; capacity],
            win_have: 0,
            win_base: 0,
            strstart: 0,
            head: if stored_only { Vec::new() } else { vec![EMPTY; HASH_SIZE] },
            prev: if stored_only { Vec::new() } else { vec![EMPTY; w_size] },
            tokens: Vec::with_capacity(if stored_only { 0 } else { TOKEN_LIMIT }),
            emitted_abs: 0,
            block_start: 0,
            prev_length: 0,
            prev_match: 0,
            match_available: false,
            writer: BitWriter::new(),
            total_in: 0,
            limits,
            memory,
            stage: Stage::Active,
            failure: None,
        })
    }

    /// Total input bytes accepted so far.
    pub fn total_input(&self) -> u64 {
        self.total_in
    }

    fn fail(&mut self, error: Error) -> Error {
        self.stage = Stage::Failed;
        self.failure = Some(error.clone());
        error
    }

    // ─── window management ──────────────────────────────────────────────────

    fn fill_window(&mut self, input: &mut InputBuffer<'_>) {
        let slide_guard = if self.stored_only { 0 } else { self.max_dist };
        if self.win_have == self.window.len() && self.strstart >= self.w_size + slide_guard {
            self.slide_window();
        }
        let space = self.window.len() - self.win_have;
        if space > 0 && !input.is_exhausted() {
            let take = space.min(input.remaining().len());
            self.window[self.win_have..self.win_have + take]
                .copy_from_slice(&input.remaining()[..take]);
            self.win_have += take;
            input.consume(take);
            self.total_in += take as u64;
        }
    }

    fn slide_window(&mut self) {
        let w = self.w_size;
        self.window.copy_within(w..self.win_have, 0);
        self.win_have -= w;
        self.strstart -= w;
        self.win_base += w as u64;
        self.prev_match = self.prev_match.saturating_sub(w);

        let w32 = w as u32;
        for slot in self.head.iter_mut() {
            *slot = match *slot {
                EMPTY => EMPTY,
                pos if pos >= w32 => pos - w32,
                _ => EMPTY,
            };
        }
        for slot in self.prev.iter_mut() {
            *slot = match *slot {
                EMPTY => EMPTY,
                pos if pos >= w32 => pos - w32,
                _ => EMPTY,
            };
        }
    }

    #[inline]
    fn hash_at(&self, pos: usize) -> u32 {
        let w = &self.window;
        (((w[pos] as u32) << 10) ^ ((w[pos + 1] as u32) << 5) ^ (w[pos + 2] as u32)) & HASH_MASK
    }

    /// Insert `pos` into the hash chains, returning the previous chain head.
    #[inline]
    fn insert_and_head(&mut self, pos: usize) -> Option<usize> {
        if pos + MIN_MATCH > self.win_have {
            return None;
        }
        let h = self.hash_at(pos) as usize;
        let head = self.head[h];
        self.prev[pos & self.w_mask] = head;
        self.head[h] = pos as u32;
        if head == EMPTY {
            None
        } else {
            Some(head as usize)
        }
    }

    #[inline]
    fn insert(&mut self, pos: usize) {
        let _ = self.insert_and_head(pos);
    }

    // ─── match finder ───────────────────────────────────────────────────────

    /// Walk the hash chain from `cand`, returning the longest match found at
    /// `strstart` that beats `best_len`, as `(length, position)`.
    fn longest_match(&self, mut cand: usize, mut best_len: usize) -> (usize, usize) {
        let strstart = self.strstart;
        let max_len = MAX_MATCH.min(self.win_have - strstart);
        let limit = strstart.saturating_sub(self.max_dist);
        let nice = (self.params.nice as usize).min(max_len);

        let mut chain = self.params.chain as usize;
        if best_len >= self.params.good as usize {
            chain >>= 2;
        }

        let mut best_pos = 0usize;
        let window = &self.window;

        loop {
            if cand < limit || cand >= strstart {
                break;
            }
            if best_len >= max_len {
                break;
            }
            // Cheap rejection on the byte that would extend the best match.
            if window[cand + best_len] == window[strstart + best_len] {
                let mut len = 0usize;
                while len < max_len && window[cand + len] == window[strstart + len] {
                    len += 1;
                }
                if len > best_len {
                    best_len = len;
                    best_pos = cand;
                    if len >= nice {
                        break;
                    }
                }
            }
            chain -= 1;
            if chain == 0 {
                break;
            }
            let next = self.prev[cand & self.w_mask];
            if next == EMPTY || next as usize >= cand {
                break;
            }
            cand = next as usize;
        }
        (best_len, best_pos)
    }

    // ─── token emission ─────────────────────────────────────────────────────

    fn push_literal(&mut self, byte: u8) {
        self.tokens.push(Token::Literal(byte));
        self.emitted_abs += 1;
    }

    fn push_match(&mut self, length: usize, distance: usize) {
        self.tokens.push(Token::Match {
            length: length as u16,
            distance: distance as u16,
        });
        self.emitted_abs += length as u64;
    }

    // ─── main compression loop ──────────────────────────────────────────────

    fn compress_window(&mut self, finishing: bool) -> Result<()> {
        loop {
            let lookahead = self.win_have - self.strstart;
            if lookahead == 0 {
                if finishing && self.match_available {
                    let byte = self.window[self.strstart - 1];
                    self.push_literal(byte);
                    self.match_available = false;
                    self.prev_length = 0;
                }
                break;
            }
            if !finishing && lookahead < MIN_LOOKAHEAD {
                break;
            }
            if self.tokens.len() >= TOKEN_LIMIT {
                self.flush_block(false)?;
            }
            if self.lazy {
                self.lazy_step();
            } else {
                self.eager_step();
            }
        }
        Ok(())
    }

    fn eager_step(&mut self) {
        let strstart = self.strstart;
        let head = self.insert_and_head(strstart);

        let (match_len, match_pos) = match head {
            Some(cand) => self.longest_match(cand, MIN_MATCH - 1),
            None => (0, 0),
        };

        if match_len >= MIN_MATCH {
            self.push_match(match_len, strstart - match_pos);
            for pos in strstart + 1..strstart + match_len {
                self.insert(pos);
            }
            self.strstart += match_len;
        } else {
            let byte = self.window[strstart];
            self.push_literal(byte);
            self.strstart += 1;
        }
    }

    fn lazy_step(&mut self) {
        let strstart = self.strstart;
        let head = self.insert_and_head(strstart);

        let prev_length = self.prev_length;
        let mut match_length = MIN_MATCH - 1;
        let mut match_pos = 0usize;
        if let Some(cand) = head {
            if prev_length < self.params.lazy as usize {
                let (len, pos) = self.longest_match(cand, prev_length.max(MIN_MATCH - 1));
                match_length = len;
                match_pos = pos;
                if match_length == MIN_MATCH && strstart - match_pos > TOO_FAR {
                    match_length = MIN_MATCH - 1;
                }
            }
        }

        if prev_length >= MIN_MATCH && match_length <= prev_length {
            // The match at the previous position wins; positions strstart-1
            // and strstart are already in the hash chains.
            let distance = (strstart - 1) - self.prev_match;
            self.push_match(prev_length, distance);
            for pos in strstart + 1..strstart + prev_length - 1 {
                self.insert(pos);
            }
            self.strstart += prev_length - 1;
            self.match_available = false;
            self.prev_length = 0;
        } else if self.match_available {
            // Current position matched longer: the previous byte becomes a
            // plain literal and the decision moves one position forward.
            let byte = self.window[strstart - 1];
            self.push_literal(byte);
            self.prev_length = match_length;
            self.prev_match = match_pos;
            self.strstart += 1;
        } else {
            self.match_available = true;
            self.prev_length = match_length;
            self.prev_match = match_pos;
            self.strstart += 1;
        }
    }

    // ─── level 0: stored blocks only ────────────────────────────────────────

    fn stored_run(&mut self, finishing: bool) -> Result<()> {
        loop {
            let span = self.win_have - self.strstart;
            let cap = MAX_STORED.min(self.window.len());
            if span >= cap {
                self.emit_stored_window(cap, false)?;
            } else if self.win_have == self.window.len() && self.strstart < self.w_size && span > 0
            {
                // Window full and the flush cursor is too low to slide.
                self.emit_stored_window(span, false)?;
            } else if finishing {
                self.emit_stored_window(span, true)?;
                break;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn emit_stored_window(&mut self, span: usize, last: bool) -> Result<()> {
        let start = self.strstart;
        self.write_stored_header(span, last);
        self.writer.write_bytes(&self.window[start..start + span]);
        self.strstart += span;
        self.emitted_abs += span as u64;
        self.block_start = self.emitted_abs;
        self.limits.check_output(self.writer.bytes_written())
    }

    fn write_stored_header(&mut self, span: usize, last: bool) {
        self.writer.write(last as u32, 1);
        self.writer.write(0, 2);
        self.writer.flush_to_byte();
        let len = span as u16;
        self.writer.write_bytes(&len.to_le_bytes());
        self.writer.write_bytes(&(!len).to_le_bytes());
    }

    // ─── block formatting ───────────────────────────────────────────────────

    fn flush_block(&mut self, last: bool) -> Result<()> {
        if !last && self.tokens.is_empty() {
            return Ok(());
        }

        // Per-symbol frequencies, including the mandatory end-of-block.
        let mut lit_freq = [0u32; 286];
        let mut dist_freq = [0u32; 30];
        for token in &self.tokens {
            match *token {
                Token::Literal(byte) => lit_freq[byte as usize] += 1,
                Token::Match { length, distance } => {
                    let (sym, _, _) = length_symbol(length as usize);
                    lit_freq[sym as usize] += 1;
                    let (dsym, _, _) = dist_symbol(distance as usize);
                    dist_freq[dsym as usize] += 1;
                }
            }
        }
        lit_freq[256] += 1;

        let ll_lens = limited_code_lengths(&lit_freq, 15);
        let d_lens = limited_code_lengths(&dist_freq, 15);

        let hlit = (257..=286)
            .rev()
            .find(|&n| ll_lens[n - 1] != 0)
            .unwrap_or(257);
        let hdist = (1..=30).rev().find(|&n| d_lens[n - 1] != 0).unwrap_or(1);

        let mut combined = Vec::with_capacity(hlit + hdist);
        combined.extend_from_slice(&ll_lens[..hlit]);
        combined.extend_from_slice(&d_lens[..hdist]);
        let cl_syms = rle_code_lengths(&combined);

        let mut cl_freq = [0u32; 19];
        for cl in &cl_syms {
            cl_freq[cl.sym as usize] += 1;
        }
        let cl_lens = limited_code_lengths(&cl_freq, 7);
        let hclen = (4..=19)
            .rev()
            .find(|&n| cl_lens[CL_ORDER[n - 1]] != 0)
            .unwrap_or(4);

        // Price the three encodings in bits.
        let fixed_ll = fixed_litlen_lengths();
        let mut fixed_bits = 3u64;
        let mut dyn_body = 0u64;
        for sym in 0..286usize {
            let freq = lit_freq[sym] as u64;
            if freq == 0 {
                continue;
            }
            fixed_bits += freq * fixed_ll[sym] as u64;
            dyn_body += freq * ll_lens[sym] as u64;
            if sym >= 257 {
                let extra = LENGTH_EXTRA[sym - 257] as u64;
                fixed_bits += freq * extra;
                dyn_body += freq * extra;
            }
        }
        for dsym in 0..30usize {
            let freq = dist_freq[dsym] as u64;
            if freq == 0 {
                continue;
            }
            fixed_bits += freq * (5 + DIST_EXTRA[dsym] as u64);
            dyn_body += freq * (d_lens[dsym] as u64 + DIST_EXTRA[dsym] as u64);
        }
        let mut dyn_bits = 3 + 14 + 3 * hclen as u64 + dyn_body;
        for cl in &cl_syms {
            dyn_bits += cl_lens[cl.sym as usize] as u64 + cl.extra_bits as u64;
        }

        let span = (self.emitted_abs - self.block_start) as usize;
        let stored_valid = span <= MAX_STORED && self.block_start >= self.win_base;
        let stored_bits = (span as u64 + 5) * 8;

        if stored_valid && stored_bits <= fixed_bits && stored_bits <= dyn_bits {
            let start = (self.block_start - self.win_base) as usize;
            self.write_stored_header(span, last);
            self.writer.write_bytes(&self.window[start..start + span]);
        } else if fixed_bits <= dyn_bits {
            self.writer.write(last as u32, 1);
            self.writer.write(1, 2);
            let ll_codes = canonical_codes(&fixed_ll);
            let d_codes = canonical_codes(&fixed_dist_lengths());
            self.emit_tokens(&ll_codes, &fixed_ll, &d_codes, &fixed_dist_lengths());
        } else {
            self.writer.write(last as u32, 1);
            self.writer.write(2, 2);
            self.writer.write((hlit - 257) as u32, 5);
            self.writer.write((hdist - 1) as u32, 5);
            self.writer.write((hclen - 4) as u32, 4);
            for i in 0..hclen {
                self.writer.write(cl_lens[CL_ORDER[i]] as u32, 3);
            }
            let cl_codes = canonical_codes(&cl_lens);
            for cl in &cl_syms {
                self.writer
                    .write(cl_codes[cl.sym as usize] as u32, cl_lens[cl.sym as usize] as u32);
                if cl.extra_bits > 0 {
                    self.writer.write(cl.extra_val as u32, cl.extra_bits as u32);
                }
            }
            let ll_codes = canonical_codes(&ll_lens);
            let d_codes = canonical_codes(&d_lens);
            self.emit_tokens(&ll_codes, &ll_lens, &d_codes, &d_lens);
        }

        self.tokens.clear();
        self.block_start = self.emitted_abs;
        self.limits.check_output(self.writer.bytes_written())
    }

    fn emit_tokens(&mut self, ll_codes: &[u16], ll_lens: &[u8], d_codes: &[u16], d_lens: &[u8]) {
        for token in &self.tokens {
            match *token {
                Token::Literal(byte) => {
                    let sym = byte as usize;
                    self.writer.write(ll_codes[sym] as u32, ll_lens[sym] as u32);
                }
                Token::Match { length, distance } => {
                    let (sym, extra, bits) = length_symbol(length as usize);
                    self.writer
                        .write(ll_codes[sym as usize] as u32, ll_lens[sym as usize] as u32);
                    if extra > 0 {
                        self.writer.write(bits as u32, extra as u32);
                    }
                    let (dsym, dextra, dbits) = dist_symbol(distance as usize);
                    self.writer
                        .write(d_codes[dsym as usize] as u32, d_lens[dsym as usize] as u32);
                    if dextra > 0 {
                        self.writer.write(dbits as u32, dextra as u32);
                    }
                }
            }
        }
        self.writer.write(ll_codes[256] as u32, ll_lens[256] as u32);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Code-length run-length encoding
// ─────────────────────────────────────────────────────────────────────────────

/// Greedy RLE over the combined literal/length + distance code lengths,
/// using symbols 16 (repeat previous), 17, and 18 (zero runs).
fn rle_code_lengths(lens: &[u8]) -> Vec<ClSym> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < lens.len() {
        let cur = lens[i];
        let mut run = 1usize;
        while i + run < lens.len() && lens[i + run] == cur {
            run += 1;
        }

        if cur == 0 {
            let mut n = run;
            while n >= 11 {
                let take = n.min(138);
                out.push(ClSym {
                    sym: 18,
                    extra_bits: 7,
                    extra_val: (take - 11) as u8,
                });
                n -= take;
            }
            if n >= 3 {
                out.push(ClSym {
                    sym: 17,
                    extra_bits: 3,
                    extra_val: (n - 3) as u8,
                });
                n = 0;
            }
            for _ in 0..n {
                out.push(ClSym {
                    sym: 0,
                    extra_bits: 0,
                    extra_val: 0,
                });
            }
        } else {
            out.push(ClSym {
                sym: cur,
                extra_bits: 0,
                extra_val: 0,
            });
            let mut n = run - 1;
            while n >= 3 {
                let take = n.min(6);
                out.push(ClSym {
                    sym: 16,
                    extra_bits: 2,
                    extra_val: (take - 3) as u8,
                });
                n -= take;
            }
            for _ in 0..n {
                out.push(ClSym {
                    sym: cur,
                    extra_bits: 0,
                    extra_val: 0,
                });
            }
        }
        i += run;
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodEncoder impl
// ─────────────────────────────────────────────────────────────────────────────

impl MethodEncoder for DeflateEncoder {
    fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        match self.stage {
            Stage::Failed => {
                return Err(self.failure.clone().unwrap_or_else(|| {
                    Error::internal("encoder failed without a recorded error")
                }))
            }
            Stage::Finished => return Err(Error::invalid_arg("update after finish")),
            Stage::Active => {}
        }

        self.writer.drain_into(output);

        let result = (|| -> Result<()> {
            loop {
                if self.writer.pending() >= PENDING_LIMIT {
                    self.writer.drain_into(output);
                    if self.writer.pending() >= PENDING_LIMIT {
                        return Ok(());
                    }
                }
                self.fill_window(input);
                if self.stored_only {
                    self.stored_run(false)?;
                } else {
                    self.compress_window(false)?;
                }
                if input.is_exhausted() {
                    return Ok(());
                }
            }
        })();

        self.writer.drain_into(output);

        match result {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        match self.stage {
            Stage::Failed => {
                return Err(self.failure.clone().unwrap_or_else(|| {
                    Error::internal("encoder failed without a recorded error")
                }))
            }
            Stage::Finished => {
                self.writer.drain_into(output);
                if self.writer.pending() > 0 {
                    return Err(Error::limit("output buffer full; call finish again"));
                }
                return Ok(());
            }
            Stage::Active => {}
        }

        self.writer.drain_into(output);

        let result = (|| -> Result<()> {
            if self.stored_only {
                self.stored_run(true)?;
            } else {
                self.compress_window(true)?;
                self.flush_block(true)?;
            }
            self.writer.flush_to_byte();
            Ok(())
        })();

        if let Err(err) = result {
            return Err(self.fail(err));
        }
        self.stage = Stage::Finished;

        self.writer.drain_into(output);
        if self.writer.pending() > 0 {
            return Err(Error::limit("output buffer full; call finish again"));
        }
        Ok(())
    }
}
