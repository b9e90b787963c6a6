//! Static Huffman codec over the byte alphabet.
//!
//! # Stream Layout
//!
//! ```text
//! +---------------------------+
//! | trie (depth-first)        |  internal: bit 0, then left, then right
//! |                           |  leaf:     bit 1, then 8-bit symbol
//! +---------------------------+
//! | message length (32 bits)  |  number of symbols, not bits
//! +---------------------------+
//! | code bits                 |  one code per symbol, in input order
//! +---------------------------+
//! ```
//!
//! An empty message produces an empty stream. A message with a single
//! distinct symbol produces a one-leaf trie and zero code bits per symbol.
//!
//! The length header is trusted only as far as the trie allows: a one-leaf
//! trie spends no bits per symbol, so a corrupt length expands to that many
//! copies of the symbol without reading further. Callers decoding untrusted
//! streams can bound this with `HuffmanCodec::with_max_len`.
//!
//! Ties between equal frequencies are broken by insertion order into the
//! heap. The decoder never rebuilds the trie from frequencies, only from
//! its serialized shape, so the tie-break does not affect round trips.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::io::{Read, Write};

use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{HuffmanError, Result};

/// Number of distinct symbols (one byte).
pub const ALPHABET_SIZE: usize = 256;

/// Deepest node a trie over 256 symbols can have.
const MAX_TRIE_DEPTH: usize = ALPHABET_SIZE - 1;

/// Longest code the 64-bit code register can hold.
const MAX_CODE_LEN: usize = 64;

/// A node of the Huffman trie.
///
/// Internal nodes always own exactly two children; there is no way to
/// express a node with one child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(u8),
    Internal(Box<Node>, Box<Node>),
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }
}

/// A prefix code: the low `len` bits of `bits`, read MSB first.
///
/// Left edges contribute 0, right edges 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Code {
    pub bits: u64,
    pub len: u8,
}

/// Symbol to code mapping derived from a trie.
#[derive(Debug, Clone)]
pub struct CodeTable {
    codes: [Option<Code>; ALPHABET_SIZE],
}

impl CodeTable {
    /// Code for `symbol`, or None if the symbol is not in the trie.
    pub fn get(&self, symbol: u8) -> Option<Code> {
        self.codes[symbol as usize]
    }

    /// Iterate over (symbol, code) for every symbol present.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|c| (symbol as u8, c)))
    }
}

/// Heap entry used while building the trie.
///
/// Ordered so that `BinaryHeap` (a max-heap) pops the lowest frequency
/// first, and among equal frequencies the earliest inserted.
struct HeapEntry {
    freq: u64,
    order: usize,
    node: Node,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.order == other.order
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// A complete Huffman trie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trie {
    root: Node,
}

impl Trie {
    /// Build a trie from per-symbol frequencies.
    ///
    /// Symbols with zero frequency are left out. Returns None when every
    /// frequency is zero, since there is nothing to code.
    pub fn from_frequencies(freqs: &[u64; ALPHABET_SIZE]) -> Option<Self> {
        let mut heap = BinaryHeap::new();
        let mut order = 0;

        for (symbol, &freq) in freqs.iter().enumerate() {
            if freq > 0 {
                heap.push(HeapEntry {
                    freq,
                    order,
                    node: Node::Leaf(symbol as u8),
                });
                order += 1;
            }
        }

        // Merge the two lightest trees until one remains
        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };
            heap.push(HeapEntry {
                freq: left.freq.saturating_add(right.freq),
                order,
                node: Node::Internal(Box::new(left.node), Box::new(right.node)),
            });
            order += 1;
        }

        heap.pop().map(|entry| Self { root: entry.node })
    }

    /// Build a trie from the symbol frequencies of `input`.
    pub fn from_input(input: &[u8]) -> Option<Self> {
        Self::from_frequencies(&count_frequencies(input))
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Number of leaves (distinct symbols).
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 1,
                Node::Internal(left, right) => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn depth(node: &Node) -> usize {
            match node {
                Node::Leaf(_) => 0,
                Node::Internal(left, right) => 1 + depth(left).max(depth(right)),
            }
        }
        depth(&self.root)
    }

    /// Derive the code of every leaf by walking the trie.
    ///
    /// A single-leaf trie gives its symbol the empty code.
    ///
    /// # Errors
    /// `HuffmanError::CodeTooLong` if a path is longer than 64 edges.
    pub fn code_table(&self) -> Result<CodeTable> {
        fn walk(node: &Node, code: Code, codes: &mut [Option<Code>; ALPHABET_SIZE]) -> Result<()> {
            match node {
                Node::Leaf(symbol) => {
                    codes[*symbol as usize] = Some(code);
                    Ok(())
                }
                Node::Internal(left, right) => {
                    let len = code.len as usize + 1;
                    if len > MAX_CODE_LEN {
                        return Err(HuffmanError::CodeTooLong(len).into());
                    }
                    let len = len as u8;
                    walk(left, Code { bits: code.bits << 1, len }, codes)?;
                    walk(right, Code { bits: (code.bits << 1) | 1, len }, codes)
                }
            }
        }

        let mut codes = [None; ALPHABET_SIZE];
        walk(&self.root, Code::default(), &mut codes)?;
        Ok(CodeTable { codes })
    }

    /// Serialize the trie depth-first: 1 + symbol for a leaf, 0 then both
    /// subtrees for an internal node.
    pub fn write<W: Write>(&self, writer: &mut BitWriter<W>) -> Result<()> {
        fn write_node<W: Write>(node: &Node, writer: &mut BitWriter<W>) -> Result<()> {
            match node {
                Node::Leaf(symbol) => {
                    writer.write_bit(true)?;
                    writer.write_byte(*symbol)
                }
                Node::Internal(left, right) => {
                    writer.write_bit(false)?;
                    write_node(left, writer)?;
                    write_node(right, writer)
                }
            }
        }
        write_node(&self.root, writer)
    }

    /// Parse a trie written by [`Trie::write`].
    ///
    /// # Errors
    /// - `BitIoError::UnexpectedEof` if the stream ends inside the trie
    /// - `HuffmanError::TrieTooDeep` if nesting exceeds what 256 symbols allow
    /// - `HuffmanError::DuplicateSymbol` if two leaves share a symbol
    pub fn read<R: Read>(reader: &mut BitReader<R>) -> Result<Self> {
        fn read_node<R: Read>(
            reader: &mut BitReader<R>,
            depth: usize,
            seen: &mut [bool; ALPHABET_SIZE],
        ) -> Result<Node> {
            if depth > MAX_TRIE_DEPTH {
                return Err(HuffmanError::TrieTooDeep {
                    max: MAX_TRIE_DEPTH,
                }
                .into());
            }

            if reader.read_bit()? {
                let symbol = reader.read_byte()?;
                if std::mem::replace(&mut seen[symbol as usize], true) {
                    return Err(HuffmanError::DuplicateSymbol(symbol).into());
                }
                Ok(Node::Leaf(symbol))
            } else {
                let left = read_node(reader, depth + 1, seen)?;
                let right = read_node(reader, depth + 1, seen)?;
                Ok(Node::Internal(Box::new(left), Box::new(right)))
            }
        }

        let mut seen = [false; ALPHABET_SIZE];
        let root = read_node(reader, 0, &mut seen)?;
        Ok(Self { root })
    }
}

/// Count occurrences of each byte value.
pub fn count_frequencies(input: &[u8]) -> [u64; ALPHABET_SIZE] {
    let mut freqs = [0u64; ALPHABET_SIZE];
    for &byte in input {
        freqs[byte as usize] += 1;
    }
    freqs
}

/// Huffman encoder/decoder.
#[derive(Debug, Clone, Default)]
pub struct HuffmanCodec {
    verbose: bool,
    /// Largest message length `decode` accepts; None means the full u32 range
    max_len: Option<u32>,
}

impl HuffmanCodec {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            verbose: config.verbose,
            max_len: None,
        }
    }

    /// Reject decoded messages whose length header exceeds `max_len`.
    pub fn with_max_len(mut self, max_len: u32) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Encode `input` as one Huffman message onto `writer`.
    ///
    /// Writes nothing for empty input.
    ///
    /// # Errors
    /// - `HuffmanError::MessageTooLong` if input exceeds u32::MAX bytes
    /// - I/O errors from the sink
    pub fn encode<W: Write>(&self, input: &[u8], writer: &mut BitWriter<W>) -> Result<()> {
        let length =
            u32::try_from(input.len()).map_err(|_| HuffmanError::MessageTooLong(input.len()))?;

        let Some(trie) = Trie::from_input(input) else {
            if self.verbose {
                debug!("huffman encode: empty input, nothing written");
            }
            return Ok(());
        };
        let codes = trie.code_table()?;

        if self.verbose {
            debug!(
                symbols = trie.leaf_count(),
                depth = trie.depth(),
                length,
                "huffman encode"
            );
        }

        trie.write(writer)?;
        writer.write_u32(length)?;
        write_codes(&codes, input, writer)
    }

    /// Decode one Huffman message from `reader`.
    ///
    /// An empty stream decodes to an empty message.
    ///
    /// # Errors
    /// Any truncation or malformed trie is reported; partial output is
    /// never returned. `HuffmanError::LengthOverLimit` if a limit was set
    /// with `with_max_len` and the header exceeds it.
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<Vec<u8>> {
        if reader.is_empty()? {
            return Ok(Vec::new());
        }

        let trie = Trie::read(reader)?;
        let declared = reader.read_u32()?;
        if let Some(limit) = self.max_len.filter(|&limit| declared > limit) {
            return Err(HuffmanError::LengthOverLimit { declared, limit }.into());
        }
        let length = declared as usize;

        if self.verbose {
            debug!(symbols = trie.leaf_count(), length, "huffman decode");
        }

        // The header is untrusted; cap the up-front allocation
        let mut output = Vec::with_capacity(length.min(1 << 20));
        for _ in 0..length {
            let mut node = trie.root();
            loop {
                match node {
                    Node::Leaf(symbol) => {
                        output.push(*symbol);
                        break;
                    }
                    Node::Internal(left, right) => {
                        node = if reader.read_bit()? { right } else { left };
                    }
                }
            }
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

    /// Decode a complete Huffman stream held in memory.
    pub fn expand(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(input);
        self.decode(&mut reader)
    }
}

/// Emit the code of every input byte.
fn write_codes<W: Write>(
    codes: &CodeTable,
    input: &[u8],
    writer: &mut BitWriter<W>,
) -> Result<()> {
    for &byte in input {
        let code = codes.get(byte).ok_or(HuffmanError::MissingCode(byte))?;
        writer.write_bits(code.bits, code.len as usize)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BitIoError, Error};

    fn codec() -> HuffmanCodec {
        HuffmanCodec::default()
    }

    #[test]
    fn test_round_trip() {
        let input = b"ABRACADABRA!";
        let compressed = codec().compress(input).unwrap();
        assert_eq!(codec().expand(&compressed).unwrap(), input);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let compressed = codec().compress(b"").unwrap();
        assert!(compressed.is_empty());
        assert!(codec().expand(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_single_symbol() {
        let input = vec![b'a'; 1000];
        let compressed = codec().compress(&input).unwrap();

        // 1 tag bit + 8 symbol bits + 32 length bits, no code bits
        assert_eq!(compressed.len(), 6);
        assert_eq!(codec().expand(&compressed).unwrap(), input);
    }

    #[test]
    fn test_single_leaf_trie_has_empty_code() {
        let trie = Trie::from_input(b"zzzz").unwrap();
        assert_eq!(trie.root(), &Node::Leaf(b'z'));
        assert_eq!(trie.code_table().unwrap().get(b'z'), Some(Code::default()));
    }

    #[test]
    fn test_symbol_without_code_is_an_error() {
        let codes = Trie::from_input(b"ab").unwrap().code_table().unwrap();
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        let result = write_codes(&codes, b"abc", &mut writer);
        assert!(matches!(
            result,
            Err(Error::Huffman(HuffmanError::MissingCode(b'c')))
        ));
    }

    #[test]
    fn test_length_limit() {
        let input = vec![b'a'; 1000];
        let compressed = codec().compress(&input).unwrap();

        let capped = codec().with_max_len(999);
        assert!(matches!(
            capped.expand(&compressed),
            Err(Error::Huffman(HuffmanError::LengthOverLimit {
                declared: 1000,
                limit: 999
            }))
        ));
        assert_eq!(codec().with_max_len(1000).expand(&compressed).unwrap(), input);
    }

    #[test]
    fn test_one_leaf_trie_expands_length_without_code_bits() {
        // Leaf 'x' followed by a length of 100000 and no code bits at all
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        writer.write_bit(true).unwrap();
        writer.write_byte(b'x').unwrap();
        writer.write_u32(100_000).unwrap();
        writer.finish().unwrap();

        assert_eq!(codec().expand(&bytes).unwrap(), vec![b'x'; 100_000]);
        assert!(codec().with_max_len(4096).expand(&bytes).is_err());
    }

    #[test]
    fn test_stream_layout() {
        // "ab": root with two leaves, one bit per symbol
        let compressed = codec().compress(b"ab").unwrap();
        let mut reader = BitReader::new(&compressed[..]);

        assert!(!reader.read_bit().unwrap());
        assert!(reader.read_bit().unwrap());
        let first = reader.read_byte().unwrap();
        assert!(reader.read_bit().unwrap());
        let second = reader.read_byte().unwrap();
        assert_eq!([first, second], [b'a', b'b']);
        assert_eq!(reader.read_u32().unwrap(), 2);
        assert!(!reader.read_bit().unwrap());
        assert!(reader.read_bit().unwrap());
    }

    #[test]
    fn test_trie_shape() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let trie = Trie::from_input(input).unwrap();
        let freqs = count_frequencies(input);

        fn check(node: &Node, freqs: &[u64; ALPHABET_SIZE]) {
            match node {
                Node::Leaf(symbol) => assert!(freqs[*symbol as usize] > 0),
                Node::Internal(left, right) => {
                    check(left, freqs);
                    check(right, freqs);
                }
            }
        }
        check(trie.root(), &freqs);

        let distinct = freqs.iter().filter(|&&f| f > 0).count();
        assert_eq!(trie.leaf_count(), distinct);
    }

    #[test]
    fn test_code_lengths_follow_frequency() {
        let input = b"aaaaaaaaaaaaaaaabbbbbbbbccccddeeeeeeeeeeeeeeeeeeeeeeeeeefg";
        let freqs = count_frequencies(input);
        let codes = Trie::from_frequencies(&freqs).unwrap().code_table().unwrap();

        let entries: Vec<_> = codes.iter().collect();
        for &(a, code_a) in &entries {
            for &(b, code_b) in &entries {
                if freqs[a as usize] > freqs[b as usize] {
                    assert!(
                        code_a.len <= code_b.len,
                        "{} (freq {}) got a longer code than {} (freq {})",
                        a as char,
                        freqs[a as usize],
                        b as char,
                        freqs[b as usize]
                    );
                }
            }
        }
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let codes = Trie::from_input(b"mississippi river banks")
            .unwrap()
            .code_table()
            .unwrap();
        let entries: Vec<_> = codes.iter().collect();
        for &(a, code_a) in &entries {
            for &(b, code_b) in &entries {
                if a == b || code_a.len > code_b.len {
                    continue;
                }
                let prefix = code_b.bits >> (code_b.len - code_a.len);
                assert_ne!(prefix, code_a.bits, "{a} is a prefix of {b}");
            }
        }
    }

    #[test]
    fn test_trie_serialization() {
        let trie = Trie::from_input(b"she sells sea shells").unwrap();
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        trie.write(&mut writer).unwrap();
        writer.finish().unwrap();

        let parsed = Trie::read(&mut BitReader::new(&bytes[..])).unwrap();
        assert_eq!(parsed, trie);
    }

    #[test]
    fn test_all_symbols() {
        let input: Vec<u8> = (0..=255u8).chain(0..=127u8).collect();
        let compressed = codec().compress(&input).unwrap();
        assert_eq!(codec().expand(&compressed).unwrap(), input);
    }

    #[test]
    fn test_truncated_trie() {
        let compressed = codec().compress(b"hello world").unwrap();
        let result = codec().expand(&compressed[..1]);
        assert!(matches!(
            result,
            Err(Error::BitIo(BitIoError::UnexpectedEof))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let input = b"hello world, hello huffman".repeat(4);
        let compressed = codec().compress(&input).unwrap();
        let result = codec().expand(&compressed[..compressed.len() - 1]);
        assert!(matches!(
            result,
            Err(Error::BitIo(BitIoError::UnexpectedEof))
        ));
    }

    #[test]
    fn test_unbounded_trie_rejected() {
        let zeros = vec![0u8; 64];
        let result = codec().expand(&zeros);
        assert!(matches!(
            result,
            Err(Error::Huffman(HuffmanError::TrieTooDeep { .. }))
        ));
    }

    #[test]
    fn test_duplicate_leaf_rejected() {
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        writer.write_bit(false).unwrap();
        writer.write_bit(true).unwrap();
        writer.write_byte(b'x').unwrap();
        writer.write_bit(true).unwrap();
        writer.write_byte(b'x').unwrap();
        writer.write_u32(1).unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            codec().expand(&bytes),
            Err(Error::Huffman(HuffmanError::DuplicateSymbol(b'x')))
        ));
    }
}
