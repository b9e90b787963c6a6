//! Adaptive LZW codec with fixed-width codewords.
//!
//! The dictionary starts with the 256 single-byte strings at codewords
//! 0..256. Codeword 256 is reserved as the end-of-stream marker, so new
//! entries start at 257. Each emitted codeword (except the last) adds one
//! entry until the dictionary holds 2^W codewords; after that it is frozen
//! and coding continues with the existing entries.
//!
//! The decoder rebuilds the same dictionary from the codewords it reads, so
//! no table is ever transmitted.
//!
//! # Stream Layout
//!
//! ```text
//! +------------+------------+-----+------------+
//! | codeword 0 | codeword 1 | ... | EOF (256)  |   each W bits, MSB first
//! +------------+------------+-----+------------+
//! ```
//!
//! Empty input produces an empty stream with no end-of-stream codeword.

use std::collections::HashMap;
use std::io::{Read, Write};

use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{LzwError, Result};
use crate::huffman::ALPHABET_SIZE;

/// End-of-stream codeword.
pub const EOF_CODEWORD: u32 = ALPHABET_SIZE as u32;

/// First codeword available for learned strings.
const FIRST_FREE: u32 = EOF_CODEWORD + 1;

/// What an encode call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzwSummary {
    /// Codewords written, including the end-of-stream marker
    pub codewords: u64,
    /// Codewords in use when encoding finished (seeds and EOF included)
    pub dictionary_len: u32,
}

/// Encoder-side dictionary: (prefix codeword, next byte) -> codeword.
///
/// Every stored string's prefix is itself stored, so the longest match is
/// found by extending one byte at a time.
struct EncodeDictionary {
    children: HashMap<(u32, u8), u32>,
    next: u32,
    capacity: u32,
}

impl EncodeDictionary {
    fn new(capacity: u32) -> Self {
        Self {
            children: HashMap::new(),
            next: FIRST_FREE,
            capacity,
        }
    }

    fn extend(&self, prefix: u32, byte: u8) -> Option<u32> {
        self.children.get(&(prefix, byte)).copied()
    }

    fn insert(&mut self, prefix: u32, byte: u8) {
        if self.next < self.capacity {
            self.children.insert((prefix, byte), self.next);
            self.next += 1;
        }
    }
}

/// LZW encoder/decoder for one codeword width.
#[derive(Debug, Clone)]
pub struct LzwCodec {
    width: u32,
    verbose: bool,
}

impl LzwCodec {
    /// # Errors
    /// `LzwError::InvalidWidth` if the configured width is unsupported.
    pub fn new(config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            width: config.lzw_width,
            verbose: config.verbose,
        })
    }

    /// Codeword width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Maximum number of codewords, 2^W.
    pub fn capacity(&self) -> u32 {
        1 << self.width
    }

    /// Encode `input` onto `writer`.
    pub fn encode<W: Write>(&self, input: &[u8], writer: &mut BitWriter<W>) -> Result<LzwSummary> {
        let width = self.width as usize;
        let mut dictionary = EncodeDictionary::new(self.capacity());

        let Some((&first, rest)) = input.split_first() else {
            if self.verbose {
                debug!("lzw encode: empty input, nothing written");
            }
            return Ok(LzwSummary {
                codewords: 0,
                dictionary_len: dictionary.next,
            });
        };

        let mut codewords = 0u64;
        let mut current = first as u32;

        for &byte in rest {
            match dictionary.extend(current, byte) {
                Some(longer) => current = longer,
                None => {
                    writer.write_bits(current as u64, width)?;
                    codewords += 1;
                    dictionary.insert(current, byte);
                    current = byte as u32;
                }
            }
        }

        writer.write_bits(current as u64, width)?;
        writer.write_bits(EOF_CODEWORD as u64, width)?;
        codewords += 2;

        if self.verbose {
            debug!(
                input_len = input.len(),
                codewords,
                dictionary_len = dictionary.next,
                frozen = dictionary.next == dictionary.capacity,
                "lzw encode"
            );
        }

        Ok(LzwSummary {
            codewords,
            dictionary_len: dictionary.next,
        })
    }

    /// Decode an LZW stream from `reader`.
    ///
    /// Reading stops at the end-of-stream codeword; anything after it is
    /// left unread.
    ///
    /// # Errors
    /// - `LzwError::InvalidCodeword` for a codeword the dictionary cannot have yet
    /// - `BitIoError::UnexpectedEof` if the stream ends before the marker
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        if reader.is_empty()? {
            return Ok(output);
        }

        let width = self.width as usize;
        let capacity = self.capacity() as usize;

        // Slot EOF_CODEWORD holds the empty string and is never read
        let mut table: Vec<Vec<u8>> = Vec::with_capacity(capacity);
        table.extend((0..ALPHABET_SIZE).map(|byte| vec![byte as u8]));
        table.push(Vec::new());

        let codeword = reader.read_bits(width)? as u32;
        if codeword == EOF_CODEWORD {
            return Ok(output);
        }
        if codeword > EOF_CODEWORD {
            return Err(LzwError::InvalidCodeword {
                codeword,
                next: FIRST_FREE,
            }
            .into());
        }

        let mut previous = table[codeword as usize].clone();
        output.extend_from_slice(&previous);

        loop {
            let codeword = reader.read_bits(width)? as u32;
            if codeword == EOF_CODEWORD {
                break;
            }

            let next = table.len() as u32;
            let current = if codeword < next {
                table[codeword as usize].clone()
            } else if codeword == next {
                // Entry the encoder created while emitting this very codeword
                let mut s = previous.clone();
                s.push(previous[0]);
                s
            } else {
                return Err(LzwError::InvalidCodeword { codeword, next }.into());
            };

            output.extend_from_slice(&current);

            if table.len() < capacity {
                let mut entry = std::mem::take(&mut previous);
                entry.push(current[0]);
                table.push(entry);
            }
            previous = current;
        }

        if self.verbose {
            debug!(
                output_len = output.len(),
                dictionary_len = table.len(),
                "lzw decode"
            );
        }

        Ok(output)
    }

    /// Encode `input` into a fresh byte vector.
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut writer = BitWriter::new(&mut output);
        self.encode(input, &mut writer)?;
        writer.finish()?;
        Ok(output)
    }

    /// Decode a complete LZW stream held in memory.
    pub fn expand(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(input);
        self.decode(&mut reader)
    }
}

impl Default for LzwCodec {
    fn default() -> Self {
        Self {
            width: crate::config::DEFAULT_LZW_WIDTH,
            verbose: false,
        }
    }
}
