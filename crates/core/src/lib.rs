//! bitcodec-core: Huffman, LZW and archive codecs over bit-granular streams
//!
//! This library provides three self-describing binary formats:
//! - A static Huffman coder that ships its trie in the stream header
//! - An adaptive LZW coder whose dictionary is rebuilt by the decoder
//! - An archive framing format that, composed with Huffman, packs several
//!   files into one compressed unit
//!
//! # Architecture
//!
//! - `bitio`: Bit reading/writing over `Read`/`Write`
//! - `huffman`: Trie construction, serialization, encode/decode
//! - `lzw`: Fixed-width LZW with an end-of-stream codeword
//! - `archive`: Record framing and the Huffman-compressed archive
//! - `config`: Settings threaded into each codec
//! - `metrics`: Per-run counts and timing
//!
//! # Design Principles
//!
//! - **No panics**: malformed streams are reported as structured errors
//! - **No silent truncation**: a decode either reproduces the input or fails
//! - **Single-threaded**: every call runs to completion on the caller's thread

pub mod archive;
pub mod bitio;
pub mod config;
pub mod error;
pub mod huffman;
pub mod lzw;
pub mod metrics;

// Re-export commonly used types
pub use archive::{ArchiveEntry, Archiver};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use huffman::HuffmanCodec;
pub use lzw::LzwCodec;
