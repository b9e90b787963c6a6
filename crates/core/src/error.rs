//! Error types for the bitcodec codecs.
//!
//! Every codec call either completes or returns one of these. Malformed
//! streams are reported, never patched over: a corrupt trie or length
//! field has no resynchronization point.

use thiserror::Error;

/// Top-level error type for all codec operations.
///
/// Each variant corresponds to a specific failure domain:
/// - Bit I/O: reading or writing bits on the underlying stream
/// - Huffman: trie parsing or message length limits
/// - LZW: codeword validity and width configuration
/// - Archive: record framing and parsing
/// - I/O: the byte source or sink itself failed
#[derive(Debug, Error)]
pub enum Error {
    /// Bit I/O operation failed (e.g., reading past end of stream)
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// Huffman codec error (e.g., malformed trie)
    #[error("huffman codec error: {0}")]
    Huffman(#[from] HuffmanError),

    /// LZW codec error (e.g., codeword out of range)
    #[error("lzw codec error: {0}")]
    Lzw(#[from] LzwError),

    /// Archive framing error (e.g., truncated record)
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Underlying byte source or sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read past the end of the stream
    #[error("unexpected end of bit stream")]
    UnexpectedEof,

    /// Invalid bit count (more than 64 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),
}

/// Huffman codec errors.
#[derive(Debug, Error)]
pub enum HuffmanError {
    /// Serialized trie nests deeper than any 256-symbol trie can
    #[error("serialized trie exceeds maximum depth {max}")]
    TrieTooDeep { max: usize },

    /// Two leaves of the serialized trie carry the same symbol
    #[error("symbol {0:#04x} appears in more than one trie leaf")]
    DuplicateSymbol(u8),

    /// Message does not fit the 32-bit length header
    #[error("message of {0} bytes exceeds the 32-bit length field")]
    MessageTooLong(usize),

    /// A derived code is longer than the 64-bit code register
    #[error("code length {0} exceeds maximum 64")]
    CodeTooLong(usize),

    /// An input symbol has no code in the table used to encode it
    #[error("symbol {0:#04x} has no code")]
    MissingCode(u8),

    /// Declared message length exceeds the decoder's configured limit
    #[error("message declares {declared} symbols, limit is {limit}")]
    LengthOverLimit { declared: u32, limit: u32 },
}

/// LZW codec errors.
#[derive(Debug, Error)]
pub enum LzwError {
    /// Codeword refers past the next dictionary slot
    #[error("codeword {codeword} is beyond next free codeword {next}")]
    InvalidCodeword { codeword: u32, next: u32 },

    /// Codeword width outside the supported range
    #[error("codeword width {0} outside supported range 9..=16")]
    InvalidWidth(u32),
}

/// Archive framing errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Separator byte after a field is not 0xFF
    #[error("expected separator 0xff after {field}, found {found:#04x}")]
    BadSeparator { field: &'static str, found: u8 },

    /// Declared length runs past the end of the stream
    #[error("{field} declares {declared} bytes but only {available} remain")]
    Truncated {
        field: &'static str,
        declared: u64,
        available: u64,
    },

    /// Record name is not valid UTF-8
    #[error("record name is not valid UTF-8")]
    InvalidName,

    /// Record name does not fit the 32-bit length field
    #[error("record name of {0} bytes exceeds the 32-bit length field")]
    NameTooLong(usize),

    /// A framing source ended before its declared size
    #[error("source for {name:?} declared {declared} bytes but yielded {actual}")]
    SourceTooShort {
        name: String,
        declared: u64,
        actual: u64,
    },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;
