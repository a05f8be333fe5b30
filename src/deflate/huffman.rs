//! Canonical Huffman codes: construction, fast decoding, and length-limited
//! code-length generation.
//!
//! A canonical code is fully determined by its per-symbol code lengths:
//! within each length, codes are assigned in ascending symbol order. The
//! decoder builds a direct-lookup table over the first `root_bits` of a code
//! (bit-reversed, since DEFLATE transmits codes most-significant bit first
//! into an LSB-first byte stream); codes longer than `root_bits` resolve
//! through a second-level subtable.

use crate::deflate::bitio::BitReader;
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Decode table
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Entry {
    /// No code maps to this bit pattern.
    Invalid,
    /// A directly decodable symbol; `len` is the full code length.
    Leaf { sym: u16, len: u8 },
    /// Longer codes share this prefix; resolve in the subtable at `offset`.
    Link { offset: u32, bits: u8 },
}

/// A fast Huffman decode table.
#[derive(Debug)]
pub struct DecodeTable {
    root_bits: u32,
    entries: Vec<Entry>,
}

impl DecodeTable {
    /// Build a decode table from per-symbol code lengths (0 = absent).
    ///
    /// The primary table covers `min(max_used_length, max_root_bits)` bits.
    /// Over-subscribed length vectors are rejected, as are under-subscribed
    /// ones — except the degenerate case of a single code, which several
    /// parts of the format permit. An all-zero vector yields an empty table
    /// on which any decode attempt reports corruption.
    pub fn build(lengths: &[u8], max_root_bits: u32) -> Result<DecodeTable> {
        let mut bl_count = [0u32; 16];
        let mut max_len = 0u32;
        let mut present = 0usize;
        for &len in lengths {
            debug_assert!(len <= 15);
            if len > 0 {
                bl_count[len as usize] += 1;
                max_len = max_len.max(len as u32);
                present += 1;
            }
        }

        if present == 0 {
            return Ok(DecodeTable {
                root_bits: 1,
                entries: vec![Entry::Invalid; 2],
            });
        }

        // Kraft accounting: negative leftover space is over-subscription,
        // positive leftover is an incomplete code.
        let mut left = 1i64;
        for len in 1..=15usize {
            left <<= 1;
            left -= bl_count[len] as i64;
            if left < 0 {
                return Err(Error::corrupt("over-subscribed huffman code lengths"));
            }
        }
        if left > 0 && present != 1 {
            return Err(Error::corrupt("incomplete huffman code lengths"));
        }

        // Canonical starting code per length.
        let mut next_code = [0u32; 16];
        let mut code = 0u32;
        for len in 1..=15usize {
            code = (code + bl_count[len - 1]) << 1;
            next_code[len] = code;
        }

        let root_bits = max_len.min(max_root_bits);
        let root_size = 1usize << root_bits;
        let mut entries = vec![Entry::Invalid; root_size];

        // Assign codes in canonical (length, symbol) order, recording the
        // subtable span needed under each over-long prefix.
        let mut codes = vec![0u32; lengths.len()];
        let mut sub_need = vec![0u8; root_size];
        for (sym, &len) in lengths.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let len = len as u32;
            codes[sym] = next_code[len as usize];
            next_code[len as usize] += 1;
            if len > root_bits {
                let rev = reverse_bits(codes[sym], len);
                let prefix = (rev & (root_size as u32 - 1)) as usize;
                sub_need[prefix] = sub_need[prefix].max((len - root_bits) as u8);
            }
        }

        for (prefix, &bits) in sub_need.iter().enumerate() {
            if bits > 0 {
                let offset = entries.len() as u32;
                entries.resize(entries.len() + (1usize << bits), Entry::Invalid);
                entries[prefix] = Entry::Link { offset, bits };
            }
        }

        for len in 1..=15u32 {
            for (sym, &l) in lengths.iter().enumerate() {
                if l as u32 != len {
                    continue;
                }
                let rev = reverse_bits(codes[sym], len);
                let leaf = Entry::Leaf {
                    sym: sym as u16,
                    len: len as u8,
                };
                if len <= root_bits {
                    // Replicate over every index sharing the code's low bits.
                    let step = 1usize << len;
                    let mut i = rev as usize;
                    while i < root_size {
                        entries[i] = leaf;
                        i += step;
                    }
                } else {
                    let prefix = (rev & (root_size as u32 - 1)) as usize;
                    let (offset, bits) = match entries[prefix] {
                        Entry::Link { offset, bits } => (offset as usize, bits as u32),
                        _ => return Err(Error::internal("huffman subtable missing")),
                    };
                    let step = 1usize << (len - root_bits);
                    let mut i = (rev >> root_bits) as usize;
                    while i < (1usize << bits) {
                        entries[offset + i] = leaf;
                        i += step;
                    }
                }
            }
        }

        Ok(DecodeTable { root_bits, entries })
    }

    /// Decode one symbol from `reader`.
    ///
    /// Returns `Ok(None)` when the reader cannot yet supply enough bits —
    /// the caller suspends and retries with more input. Invalid bit patterns
    /// are corruption.
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<Option<u16>> {
        let idx = reader.peek(self.root_bits) as usize;
        match self.entries[idx] {
            Entry::Leaf { sym, len } => {
                if (len as u32) <= reader.bits_buffered() {
                    reader.consume(len as u32);
                    Ok(Some(sym))
                } else {
                    Ok(None)
                }
            }
            Entry::Link { offset, bits } => {
                let need = self.root_bits + bits as u32;
                let word = reader.peek(need);
                let sub = (word >> self.root_bits) as usize & ((1 << bits) - 1);
                match self.entries[offset as usize + sub] {
                    Entry::Leaf { sym, len } => {
                        if (len as u32) <= reader.bits_buffered() {
                            reader.consume(len as u32);
                            Ok(Some(sym))
                        } else {
                            Ok(None)
                        }
                    }
                    _ => {
                        if reader.bits_buffered() >= need {
                            Err(Error::corrupt("invalid huffman code"))
                        } else {
                            Ok(None)
                        }
                    }
                }
            }
            Entry::Invalid => {
                if reader.bits_buffered() >= self.root_bits {
                    Err(Error::corrupt("invalid huffman code"))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Approximate heap footprint, for memory accounting.
    pub fn table_bytes(&self) -> usize {
        self.entries.len() * std::mem::size_of::<Entry>()
    }
}

#[inline]
fn reverse_bits(code: u32, len: u32) -> u32 {
    code.reverse_bits() >> (32 - len)
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoder-side code assignment
// ─────────────────────────────────────────────────────────────────────────────

/// Assign canonical codes for the given lengths, pre-reversed for LSB-first
/// emission. Entries with length 0 get code 0.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u32; 16];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }
    let mut next_code = [0u32; 16];
    let mut code = 0u32;
    for len in 1..=15usize {
        code = (code + bl_count[len - 1]) << 1;
        next_code[len] = code;
    }
    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                0
            } else {
                let c = next_code[len as usize];
                next_code[len as usize] += 1;
                reverse_bits(c, len as u32) as u16
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Length-limited code lengths (package-merge)
// ─────────────────────────────────────────────────────────────────────────────

/// Compute optimal code lengths for `freqs` under a maximum length, via the
/// package-merge algorithm. Symbols with zero frequency get length 0; a
/// single active symbol gets length 1.
pub fn limited_code_lengths(freqs: &[u32], max_bits: u32) -> Vec<u8> {
    let mut lens = vec![0u8; freqs.len()];
    let mut leaves: Vec<(u64, u16)> = freqs
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(sym, &f)| (f as u64, sym as u16))
        .collect();

    match leaves.len() {
        0 => return lens,
        1 => {
            lens[leaves[0].1 as usize] = 1;
            return lens;
        }
        _ => {}
    }
    leaves.sort_unstable();
    debug_assert!(leaves.len() <= 1usize << max_bits);

    #[derive(Clone)]
    struct Pkg {
        weight: u64,
        syms: Vec<u16>,
    }

    let leaf_pkgs: Vec<Pkg> = leaves
        .iter()
        .map(|&(weight, sym)| Pkg {
            weight,
            syms: vec![sym],
        })
        .collect();

    let mut list = leaf_pkgs.clone();
    for _ in 1..max_bits {
        // Package adjacent pairs, then merge with the leaves by weight.
        let mut packaged: Vec<Pkg> = Vec::with_capacity(list.len() / 2);
        let mut i = 0;
        while i + 1 < list.len() {
            let mut syms = list[i].syms.clone();
            syms.extend_from_slice(&list[i + 1].syms);
            packaged.push(Pkg {
                weight: list[i].weight + list[i + 1].weight,
                syms,
            });
            i += 2;
        }

        let mut merged: Vec<Pkg> = Vec::with_capacity(leaf_pkgs.len() + packaged.len());
        let mut a = 0;
        let mut b = 0;
        while a < leaf_pkgs.len() || b < packaged.len() {
            let take_leaf = match (leaf_pkgs.get(a), packaged.get(b)) {
                (Some(l), Some(p)) => l.weight <= p.weight,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            if take_leaf {
                merged.push(leaf_pkgs[a].clone());
                a += 1;
            } else {
                merged.push(packaged[b].clone());
                b += 1;
            }
        }
        list = merged;
    }

    // Each symbol's code length is the number of selected packages that
    // contain it.
    for pkg in list.iter().take(2 * leaves.len() - 2) {
        for &sym in &pkg.syms {
            lens[sym as usize] += 1;
        }
    }
    lens
}
