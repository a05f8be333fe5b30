//! gzip decoder: header parsing, DEFLATE body, trailer validation, and
//! optional concatenated-member support.
//!
//! The header parser is a byte-at-a-time stage machine so that any split of
//! the input across `update` calls resumes cleanly, including splits inside
//! the magic bytes, a NUL-terminated field, or the trailer. Each optional
//! field is length-capped to keep hostile headers from ballooning.

use crate::buffer::{InputBuffer, OutputBuffer};
use crate::crc32::Crc32;
use crate::deflate::DeflateDecoder;
use crate::error::{Error, Result, Status};
use crate::gzip::header::{
    CM_DEFLATE, DEFAULT_MAX_COMMENT_BYTES, DEFAULT_MAX_EXTRA_BYTES, DEFAULT_MAX_NAME_BYTES,
    FLG_FCOMMENT, FLG_FEXTRA, FLG_FHCRC, FLG_FNAME, FLG_RESERVED, ID1, ID2,
};
use crate::method::MethodDecoder;
use crate::options::Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FixedHeader,
    ExtraLen,
    ExtraData,
    Name,
    Comment,
    HeaderCrc,
    Body,
    Trailer,
    Done,
    Failed,
}

/// Streaming gzip decoder.
pub struct GzipDecoder {
    stage: Stage,

    fixed: [u8; 10],
    fixed_pos: usize,
    flg: u8,
    header_crc: Crc32,
    extra_len_buf: [u8; 2],
    extra_len_pos: usize,
    extra_remaining: usize,
    name_seen: u64,
    comment_seen: u64,

    inner: DeflateDecoder,
    data_crc: Crc32,
    isize_count: u32,
    trailer_buf: [u8; 8],
    trailer_pos: usize,

    concat: bool,
    max_name: u64,
    max_comment: u64,
    max_extra: u64,
    members_done: u32,

    /// Retained to rebuild the inner decoder between concatenated members.
    options: Options,
    failure: Option<Error>,
}

impl GzipDecoder {
    pub fn new(options: &Options) -> Result<GzipDecoder> {
        let inner = DeflateDecoder::new(options)?;
        Ok(GzipDecoder {
            stage: Stage::FixedHeader,
            fixed: [0; 10],
            fixed_pos: 0,
            flg: 0,
            header_crc: Crc32::new(),
            extra_len_buf: [0; 2],
            extra_len_pos: 0,
            extra_remaining: 0,
            name_seen: 0,
            comment_seen: 0,
            inner,
            data_crc: Crc32::new(),
            isize_count: 0,
            trailer_buf: [0; 8],
            trailer_pos: 0,
            concat: options.get_bool("gzip.concat").unwrap_or(false),
            max_name: options
                .get_uint64("gzip.max_name_bytes")
                .unwrap_or(DEFAULT_MAX_NAME_BYTES),
            max_comment: options
                .get_uint64("gzip.max_comment_bytes")
                .unwrap_or(DEFAULT_MAX_COMMENT_BYTES),
            max_extra: options
                .get_uint64("gzip.max_extra_bytes")
                .unwrap_or(DEFAULT_MAX_EXTRA_BYTES),
            members_done: 0,
            options: options.clone(),
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
                Error::internal("gzip decoder failed without a recorded error")
            }))
        } else {
            None
        }
    }

    /// After a validated trailer, arm for the next concatenated member.
    fn reset_member(&mut self) -> Result<()> {
        self.inner = DeflateDecoder::new(&self.options)?;
        self.data_crc = Crc32::new();
        self.isize_count = 0;
        self.header_crc = Crc32::new();
        self.fixed_pos = 0;
        self.flg = 0;
        self.extra_len_pos = 0;
        self.extra_remaining = 0;
        self.name_seen = 0;
        self.comment_seen = 0;
        self.trailer_pos = 0;
        self.stage = Stage::FixedHeader;
        Ok(())
    }

    /// Where header parsing goes after the field `after`.
    fn next_header_stage(&self, after: Stage) -> Stage {
        let done = rank(after);
        if done < 1 && self.flg & FLG_FEXTRA != 0 {
            return Stage::ExtraLen;
        }
        if done < 2 && self.flg & FLG_FNAME != 0 {
            return Stage::Name;
        }
        if done < 3 && self.flg & FLG_FCOMMENT != 0 {
            return Stage::Comment;
        }
        if done < 4 && self.flg & FLG_FHCRC != 0 {
            return Stage::HeaderCrc;
        }
        Stage::Body
    }

    fn take_byte(input: &mut InputBuffer<'_>) -> Option<u8> {
        let remaining = input.remaining();
        if remaining.is_empty() {
            None
        } else {
            let byte = remaining[0];
            input.consume(1);
            Some(byte)
        }
    }

    fn parse_fixed_header(&mut self) -> Result<()> {
        if self.fixed[0] != ID1 || self.fixed[1] != ID2 {
            return Err(Error::corrupt(format!(
                "bad gzip magic {:02x} {:02x}",
                self.fixed[0], self.fixed[1]
            )));
        }
        if self.fixed[2] != CM_DEFLATE {
            return Err(Error::corrupt(format!(
                "unsupported gzip compression method {}",
                self.fixed[2]
            )));
        }
        let flg = self.fixed[3];
        if flg & FLG_RESERVED != 0 {
            return Err(Error::corrupt("reserved gzip header flag bits set"));
        }
        self.flg = flg;
        self.header_crc.update(&self.fixed);
        Ok(())
    }
}

// Stage ordering helper for the optional-field chain.
fn rank(stage: Stage) -> u8 {
    match stage {
        Stage::FixedHeader => 0,
        Stage::ExtraLen | Stage::ExtraData => 1,
        Stage::Name => 2,
        Stage::Comment => 3,
        Stage::HeaderCrc => 4,
        _ => 5,
    }
}

impl MethodDecoder for GzipDecoder {
    fn update(
        &mut self,
        input: &mut InputBuffer<'_>,
        output: &mut OutputBuffer<'_>,
    ) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }

        loop {
            match self.stage {
                Stage::FixedHeader => {
                    while self.fixed_pos < self.fixed.len() {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.fixed[self.fixed_pos] = byte;
                                self.fixed_pos += 1;
                            }
                            None => return Ok(()),
                        }
                    }
                    if let Err(e) = self.parse_fixed_header() {
                        return Err(self.fail(e));
                    }
                    self.stage = self.next_header_stage(Stage::FixedHeader);
                }

                Stage::ExtraLen => {
                    while self.extra_len_pos < 2 {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.extra_len_buf[self.extra_len_pos] = byte;
                                self.extra_len_pos += 1;
                            }
                            None => return Ok(()),
                        }
                    }
                    self.header_crc.update(&self.extra_len_buf);
                    let len = u16::from_le_bytes(self.extra_len_buf) as u64;
                    if self.max_extra != 0 && len > self.max_extra {
                        return Err(self.fail(Error::corrupt(format!(
                            "gzip extra field of {len} bytes exceeds cap"
                        ))));
                    }
                    self.extra_remaining = len as usize;
                    self.stage = Stage::ExtraData;
                }

                Stage::ExtraData => {
                    while self.extra_remaining > 0 {
                        let available = input.remaining();
                        if available.is_empty() {
                            return Ok(());
                        }
                        let take = available.len().min(self.extra_remaining);
                        self.header_crc.update(&available[..take]);
                        input.consume(take);
                        self.extra_remaining -= take;
                    }
                    self.stage = self.next_header_stage(Stage::ExtraData);
                }

                Stage::Name => {
                    loop {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.header_crc.update(&[byte]);
                                if byte == 0 {
                                    break;
                                }
                                self.name_seen += 1;
                                if self.max_name != 0 && self.name_seen > self.max_name {
                                    return Err(self.fail(Error::corrupt(
                                        "gzip file name field exceeds cap",
                                    )));
                                }
                            }
                            None => return Ok(()),
                        }
                    }
                    self.stage = self.next_header_stage(Stage::Name);
                }

                Stage::Comment => {
                    loop {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.header_crc.update(&[byte]);
                                if byte == 0 {
                                    break;
                                }
                                self.comment_seen += 1;
                                if self.max_comment != 0 && self.comment_seen > self.max_comment {
                                    return Err(self.fail(Error::corrupt(
                                        "gzip comment field exceeds cap",
                                    )));
                                }
                            }
                            None => return Ok(()),
                        }
                    }
                    self.stage = self.next_header_stage(Stage::Comment);
                }

                Stage::HeaderCrc => {
                    // Reuse the trailer staging buffer's first two slots.
                    while self.trailer_pos < 2 {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.trailer_buf[self.trailer_pos] = byte;
                                self.trailer_pos += 1;
                            }
                            None => return Ok(()),
                        }
                    }
                    self.trailer_pos = 0;
                    let stored = u16::from_le_bytes([self.trailer_buf[0], self.trailer_buf[1]]);
                    let computed = (self.header_crc.value() & 0xFFFF) as u16;
                    if stored != computed {
                        return Err(self.fail(Error::corrupt(format!(
                            "gzip header crc mismatch (stored {stored:04x}, computed {computed:04x})"
                        ))));
                    }
                    self.stage = Stage::Body;
                }

                Stage::Body => {
                    let before_out = output.used();
                    let before_in = input.used();
                    if let Err(e) = self.inner.update(input, output) {
                        return Err(self.fail(e));
                    }
                    let produced = output.used() - before_out;
                    let consumed = input.used() - before_in;
                    self.data_crc.update(&output.written()[before_out..]);
                    self.isize_count = self.isize_count.wrapping_add(produced as u32);

                    if self.inner.is_finished() {
                        self.stage = Stage::Trailer;
                        continue;
                    }
                    if consumed == 0 && produced == 0 {
                        // Wedged on input or output; hand control back.
                        return Ok(());
                    }
                }

                Stage::Trailer => {
                    while self.trailer_pos < 8 {
                        match Self::take_byte(input) {
                            Some(byte) => {
                                self.trailer_buf[self.trailer_pos] = byte;
                                self.trailer_pos += 1;
                            }
                            None => return Ok(()),
                        }
                    }
                    let stored_crc = u32::from_le_bytes([
                        self.trailer_buf[0],
                        self.trailer_buf[1],
                        self.trailer_buf[2],
                        self.trailer_buf[3],
                    ]);
                    let computed_crc = self.data_crc.value();
                    if stored_crc != computed_crc {
                        return Err(self.fail(Error::corrupt(format!(
                            "gzip crc mismatch (stored {stored_crc:08x}, computed {computed_crc:08x})"
                        ))));
                    }
                    let stored_isize = u32::from_le_bytes([
                        self.trailer_buf[4],
                        self.trailer_buf[5],
                        self.trailer_buf[6],
                        self.trailer_buf[7],
                    ]);
                    if stored_isize != self.isize_count {
                        return Err(self.fail(Error::corrupt(format!(
                            "gzip length mismatch (stored {stored_isize}, computed {})",
                            self.isize_count
                        ))));
                    }
                    self.members_done += 1;
                    if self.concat {
                        if let Err(e) = self.reset_member() {
                            return Err(self.fail(e));
                        }
                    } else {
                        self.stage = Stage::Done;
                    }
                }

                Stage::Done => {
                    if !input.is_exhausted() {
                        return Err(self.fail(Error::corrupt(
                            "trailing data after gzip stream",
                        )));
                    }
                    return Ok(());
                }

                Stage::Failed => {
                    return Err(self.failure.clone().unwrap_or_else(|| {
                        Error::internal("gzip decoder failed without a recorded error")
                    }))
                }
            }
        }
    }

    fn finish(&mut self, output: &mut OutputBuffer<'_>) -> Result<()> {
        if let Some(err) = self.replay() {
            return Err(err);
        }

        match self.stage {
            Stage::Done => Ok(()),
            // A clean boundary between concatenated members is a valid end.
            Stage::FixedHeader if self.fixed_pos == 0 && self.members_done > 0 => Ok(()),
            Stage::Body => {
                let before_out = output.used();
                let result = self.inner.finish(output);
                self.data_crc.update(&output.written()[before_out..]);
                self.isize_count = self
                    .isize_count
                    .wrapping_add((output.used() - before_out) as u32);
                match result {
                    Err(e) if e.status() == Status::Limit => Err(e),
                    Err(e) => Err(self.fail(e)),
                    Ok(()) => {
                        Err(self.fail(Error::corrupt("truncated gzip stream (missing trailer)")))
                    }
                }
            }
            _ => Err(self.fail(Error::corrupt("truncated gzip stream"))),
        }
    }
}
