//! Bit-level I/O over byte-oriented sinks and sources.
//!
//! `BitWriter` and `BitReader` hide byte alignment from the codecs. Both
//! operate MSB-first: multi-bit values are written most significant bit
//! first, and bits fill each byte from its high end.
//!
//! # Padding Rules
//! - BitWriter: pads the final partial byte with trailing zeros
//! - BitReader: cannot tell padding from data; callers rely on declared
//!   lengths or in-band sentinels to know where a message ends
//!
//! # Example
//! ```
//! use bitcodec_core::bitio::{BitReader, BitWriter};
//!
//! let mut bytes = Vec::new();
//! let mut writer = BitWriter::new(&mut bytes);
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//! writer.finish().unwrap();
//! // 10111 padded to 10111000
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b11);
//! ```

use std::io::{ErrorKind, Read, Write};

use crate::error::{BitIoError, Result};

/// Bytes held before handing them to the sink (and read ahead from a source).
const CHUNK_SIZE: usize = 8 * 1024;

/// Writes bits MSB-first into a byte sink.
///
/// Complete bytes are staged in an internal buffer and handed to the sink in
/// chunks. `finish` pads and flushes everything; dropping a writer that was
/// never finished still flushes what it can, so early returns do not lose
/// buffered output.
///
/// # Invariants
/// - `bit_count` is always < 8
/// - `bit_buffer` holds exactly `bit_count` meaningful high bits
pub struct BitWriter<W: Write> {
    sink: W,
    /// Complete bytes not yet handed to the sink
    pending: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
    /// Complete bytes produced so far
    bytes_written: u64,
    finished: bool,
}

impl<W: Write> BitWriter<W> {
    /// Create a writer over `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            pending: Vec::with_capacity(CHUNK_SIZE),
            bit_buffer: 0,
            bit_count: 0,
            bytes_written: 0,
            finished: false,
        }
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.bit_buffer |= (bit as u8) << (7 - self.bit_count);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.push_byte(self.bit_buffer)?;
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
        Ok(())
    }

    /// Write the low `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        while remaining > 0 {
            // How many bits fit in the current byte?
            let bits_to_write = remaining.min(8 - self.bit_count as usize);

            // Take the top bits_to_write of the bits still to be written
            let shift = remaining - bits_to_write;
            let bits = ((value >> shift) & ((1u64 << bits_to_write) - 1)) as u8;

            self.bit_buffer |= bits << (8 - self.bit_count as usize - bits_to_write);
            self.bit_count += bits_to_write as u8;

            if self.bit_count == 8 {
                self.push_byte(self.bit_buffer)?;
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            remaining -= bits_to_write;
        }

        Ok(())
    }

    /// Write one 8-bit value.
    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        if self.bit_count == 0 {
            return self.push_byte(byte);
        }
        self.write_bits(byte as u64, 8)
    }

    /// Write a 32-bit integer, MSB first.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bits(value as u64, 32)
    }

    /// Write a 64-bit integer, MSB first.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bits(value, 64)
    }

    /// Write a run of raw bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.bit_count == 0 {
            self.pending.extend_from_slice(bytes);
            self.bytes_written += bytes.len() as u64;
            if self.pending.len() >= CHUNK_SIZE {
                self.drain_pending()?;
            }
            return Ok(());
        }
        for &byte in bytes {
            self.write_bits(byte as u64, 8)?;
        }
        Ok(())
    }

    /// Return the total number of bits written (including the partial byte).
    pub fn bit_len(&self) -> u64 {
        self.bytes_written * 8 + self.bit_count as u64
    }

    /// Pad the partial byte with zeros, hand everything to the sink and flush it.
    ///
    /// On error the writer is still consumed; nothing is retried on drop, so
    /// a partly accepted chunk is never sent twice.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.flush_all()
    }

    fn push_byte(&mut self, byte: u8) -> Result<()> {
        self.pending.push(byte);
        self.bytes_written += 1;
        if self.pending.len() >= CHUNK_SIZE {
            self.drain_pending()?;
        }
        Ok(())
    }

    fn drain_pending(&mut self) -> Result<()> {
        self.sink.write_all(&self.pending)?;
        self.pending.clear();
        Ok(())
    }

    fn flush_all(&mut self) -> Result<()> {
        if self.bit_count > 0 {
            // Already zero-padded
            self.pending.push(self.bit_buffer);
            self.bytes_written += 1;
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
        self.drain_pending()?;
        self.sink.flush()?;
        Ok(())
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.flush_all();
        }
    }
}

/// Reads bits MSB-first from a byte source.
///
/// Any `Read` works; byte slices can be passed directly. Reading past the
/// end of the source is an error, and `is_empty` reports whether any bit
/// remains.
///
/// # Invariants
/// - `bit_position` never exceeds `filled * 8`
pub struct BitReader<R: Read> {
    source: R,
    /// Read-ahead bytes from the source
    chunk: Vec<u8>,
    /// Number of valid bytes in chunk
    filled: usize,
    /// Bit position within chunk (0 = MSB of chunk[0])
    bit_position: usize,
    /// Bits consumed from chunks that have already been replaced
    consumed_bits: u64,
    exhausted: bool,
}

impl<R: Read> BitReader<R> {
    /// Create a reader over `source`.
    pub fn new(source: R) -> Self {
        Self {
            source,
            chunk: vec![0; CHUNK_SIZE],
            filled: 0,
            bit_position: 0,
            consumed_bits: 0,
            exhausted: false,
        }
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        if !self.fill()? {
            return Err(BitIoError::UnexpectedEof.into());
        }
        let byte = self.chunk[self.bit_position / 8];
        let bit = (byte >> (7 - self.bit_position % 8)) & 1;
        self.bit_position += 1;
        Ok(bit == 1)
    }

    /// Read `count` bits (0-64) as an unsigned value, MSB first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::UnexpectedEof` if the source ends first
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut result = 0u64;
        let mut remaining = count;

        while remaining > 0 {
            if !self.fill()? {
                return Err(BitIoError::UnexpectedEof.into());
            }

            let byte_idx = self.bit_position / 8;
            let bit_offset = self.bit_position % 8;

            // How many bits can we read from the current byte?
            let bits_in_byte = 8 - bit_offset;
            let bits_to_read = remaining.min(bits_in_byte);

            let byte = self.chunk[byte_idx];
            let mask = ((1u16 << bits_to_read) - 1) as u8;
            let bits = (byte >> (bits_in_byte - bits_to_read)) & mask;

            result = (result << bits_to_read) | bits as u64;

            self.bit_position += bits_to_read;
            remaining -= bits_to_read;
        }

        Ok(result)
    }

    /// Read one 8-bit value.
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Read a 32-bit integer, MSB first.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Read a 64-bit integer, MSB first.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_bits(64)
    }

    /// Fill `buf` with raw bytes, returning how many were read.
    ///
    /// Stops short only when the source is exhausted; callers that need the
    /// whole buffer compare the count against `buf.len()`.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut read = 0;
        while read < buf.len() {
            if !self.fill()? {
                break;
            }
            if self.bit_position % 8 == 0 {
                let start = self.bit_position / 8;
                let n = (self.filled - start).min(buf.len() - read);
                buf[read..read + n].copy_from_slice(&self.chunk[start..start + n]);
                self.bit_position += n * 8;
                read += n;
            } else {
                // An unaligned tail needs a full 8 bits available
                match self.read_bits(8) {
                    Ok(byte) => {
                        buf[read] = byte as u8;
                        read += 1;
                    }
                    Err(crate::Error::BitIo(BitIoError::UnexpectedEof)) => break,
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(read)
    }

    /// True once no further bits remain in the source.
    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(!self.fill()?)
    }

    /// Return the number of bits consumed so far.
    pub fn position(&self) -> u64 {
        self.consumed_bits + self.bit_position as u64
    }

    /// Make at least one unread bit available. Returns false at end of source.
    fn fill(&mut self) -> Result<bool> {
        if self.bit_position < self.filled * 8 {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }

        // The whole chunk has been consumed
        self.consumed_bits += self.filled as u64 * 8;
        self.bit_position = 0;
        self.filled = 0;

        loop {
            match self.source.read(&mut self.chunk) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.filled = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}
