//! Canonical Huffman construction, validation, fast decoding, and
//! length-limited code generation.

use deflater::buffer::OutputBuffer;
use deflater::deflate::bitio::{BitReader, BitWriter};
use deflater::deflate::huffman::{canonical_codes, limited_code_lengths, DecodeTable};
use deflater::Status;

/// Write symbols with `canonical_codes` output and read them back through a
/// `DecodeTable` built from the same lengths.
fn roundtrip_symbols(lengths: &[u8], symbols: &[u16], max_root_bits: u32) {
    let codes = canonical_codes(lengths);
    let mut writer = BitWriter::new();
    for &sym in symbols {
        writer.write(codes[sym as usize] as u32, lengths[sym as usize] as u32);
    }
    writer.flush_to_byte();
    let mut bytes = vec![0u8; writer.pending()];
    let mut output = OutputBuffer::new(&mut bytes);
    writer.drain_into(&mut output);

    let table = DecodeTable::build(lengths, max_root_bits).unwrap();
    let mut reader = BitReader::new(&bytes);
    for &expected in symbols {
        assert_eq!(table.decode(&mut reader).unwrap(), Some(expected));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical assignment
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn canonical_codes_match_the_worked_example() {
    // Eight symbols with lengths (3,3,3,3,3,2,4,4) yield, in symbol order,
    // the codes 010 011 100 101 110 00 1110 1111. `canonical_codes` returns
    // them pre-reversed for LSB-first emission.
    let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
    let codes = canonical_codes(&lengths);
    assert_eq!(codes[0], 0b010); // 010 reversed is itself
    assert_eq!(codes[1], 0b110); // 011 reversed
    assert_eq!(codes[2], 0b001); // 100 reversed
    assert_eq!(codes[3], 0b101);
    assert_eq!(codes[4], 0b011);
    assert_eq!(codes[5], 0b00);
    assert_eq!(codes[6], 0b0111); // 1110 reversed
    assert_eq!(codes[7], 0b1111);
}

#[test]
fn absent_symbols_get_no_code() {
    let lengths = [0u8, 1, 0, 1];
    let codes = canonical_codes(&lengths);
    assert_eq!(codes[0], 0);
    assert_eq!(codes[2], 0);
    assert_eq!(codes[1], 0b0);
    assert_eq!(codes[3], 0b1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Decode-table validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn over_subscribed_lengths_are_corrupt() {
    let err = DecodeTable::build(&[1, 1, 1], 9).unwrap_err();
    assert_eq!(err.status(), Status::Corrupt);
}

#[test]
fn incomplete_lengths_are_corrupt() {
    let err = DecodeTable::build(&[2, 2, 2], 9).unwrap_err();
    assert_eq!(err.status(), Status::Corrupt);
}

#[test]
fn single_code_is_permitted() {
    let lengths = [0u8, 1, 0];
    let table = DecodeTable::build(&lengths, 9).unwrap();

    let data = [0b0000_0000u8];
    let mut reader = BitReader::new(&data);
    assert_eq!(table.decode(&mut reader).unwrap(), Some(1));

    // The unassigned half of the coding space is invalid.
    let data = [0b0000_0001u8];
    let mut reader = BitReader::new(&data);
    assert_eq!(
        table.decode(&mut reader).unwrap_err().status(),
        Status::Corrupt
    );
}

#[test]
fn all_zero_lengths_build_an_unusable_table() {
    let table = DecodeTable::build(&[0u8; 30], 7).unwrap();
    let data = [0xFFu8];
    let mut reader = BitReader::new(&data);
    assert!(table.decode(&mut reader).is_err());
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn decodes_flat_and_skewed_codes() {
    roundtrip_symbols(&[2, 2, 2, 2], &[0, 3, 1, 2, 2, 1, 0], 9);
    roundtrip_symbols(&[1, 2, 3, 3], &[3, 0, 0, 1, 2, 0, 3], 9);
}

#[test]
fn decodes_through_subtables() {
    // Lengths 1,2,..,9,10,10 form a complete code whose two longest codes
    // overflow a 9-bit primary table.
    let lengths = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10];
    let symbols = [0u16, 10, 9, 1, 8, 0, 9, 10, 5];
    roundtrip_symbols(&lengths, &symbols, 9);
}

#[test]
fn starved_decode_returns_none() {
    // A 10-bit code with only one byte of input.
    let lengths = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10];
    let codes = canonical_codes(&lengths);
    let mut writer = BitWriter::new();
    writer.write(codes[10] as u32, 10);
    writer.flush_to_byte();
    let mut bytes = vec![0u8; writer.pending()];
    let mut output = OutputBuffer::new(&mut bytes);
    writer.drain_into(&mut output);
    assert_eq!(bytes.len(), 2);

    let table = DecodeTable::build(&lengths, 9).unwrap();
    let mut reader = BitReader::new(&bytes[..1]);
    assert_eq!(table.decode(&mut reader).unwrap(), None);

    // Resuming with the rest of the stream completes the symbol.
    let carry = reader.carry();
    let mut reader = BitReader::resume(&bytes[1..], carry);
    assert_eq!(table.decode(&mut reader).unwrap(), Some(10));
}

// ─────────────────────────────────────────────────────────────────────────────
// Length-limited lengths (package-merge)
// ─────────────────────────────────────────────────────────────────────────────

fn kraft_is_complete(lens: &[u8], max_bits: u32) -> bool {
    let total: u64 = lens
        .iter()
        .filter(|&&l| l > 0)
        .map(|&l| 1u64 << (max_bits - l as u32))
        .sum();
    total == 1u64 << max_bits
}

#[test]
fn no_frequencies_yield_no_lengths() {
    assert_eq!(limited_code_lengths(&[0, 0, 0], 15), vec![0, 0, 0]);
}

#[test]
fn single_symbol_gets_length_one() {
    assert_eq!(limited_code_lengths(&[0, 7, 0], 15), vec![0, 1, 0]);
}

#[test]
fn two_symbols_get_one_bit_each() {
    assert_eq!(limited_code_lengths(&[9, 1], 15), vec![1, 1]);
}

#[test]
fn skewed_frequencies_shorten_the_common_symbol() {
    let lens = limited_code_lengths(&[1, 1, 4], 15);
    assert_eq!(lens[2], 1);
    assert_eq!(lens[0], 2);
    assert_eq!(lens[1], 2);
}

#[test]
fn flat_frequencies_get_flat_lengths() {
    let lens = limited_code_lengths(&[3; 8], 15);
    assert_eq!(lens, vec![3; 8]);
}

#[test]
fn length_limit_is_enforced_and_code_stays_complete() {
    // Fibonacci-ish weights push unconstrained Huffman past 4 bits.
    let freqs = [1u32, 1, 2, 3, 5, 8, 13, 21];
    let lens = limited_code_lengths(&freqs, 4);
    assert!(lens.iter().all(|&l| l > 0 && l <= 4), "lens = {lens:?}");
    assert!(kraft_is_complete(&lens, 4), "lens = {lens:?}");
}

#[test]
fn limited_lengths_build_a_decode_table() {
    let freqs = [40u32, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];
    let lens = limited_code_lengths(&freqs, 7);
    assert!(kraft_is_complete(&lens, 7), "lens = {lens:?}");
    let table = DecodeTable::build(&lens, 7).unwrap();
    let codes = canonical_codes(&lens);

    let mut writer = BitWriter::new();
    for sym in 0..freqs.len() {
        writer.write(codes[sym] as u32, lens[sym] as u32);
    }
    writer.flush_to_byte();
    let mut bytes = vec![0u8; writer.pending()];
    let mut output = OutputBuffer::new(&mut bytes);
    writer.drain_into(&mut output);

    let mut reader = BitReader::new(&bytes);
    for sym in 0..freqs.len() {
        assert_eq!(table.decode(&mut reader).unwrap(), Some(sym as u16));
    }
}
