//! Multi-file archive framing.
//!
//! An archive is a plain concatenation of records. There is no outer count
//! or terminator: the parser reads records until the stream is exhausted.
//!
//! # Record Format
//!
//! ```text
//! +----------------------+
//! | name length (32)     |  byte length of the UTF-8 name
//! +----------------------+
//! | separator (8)        |  0xFF
//! +----------------------+
//! | name                 |  name length bytes
//! +----------------------+
//! | separator (8)        |  0xFF
//! +----------------------+
//! | content length (64)  |
//! +----------------------+
//! | separator (8)        |  0xFF
//! +----------------------+
//! | content              |  content length bytes
//! +----------------------+
//! ```
//!
//! Field boundaries come only from the declared lengths. Content may
//! contain 0xFF freely; separators are checked where the lengths say they
//! must be, never searched for.
//!
//! A compressed archive is the framed byte sequence passed through the
//! Huffman codec as a single message.

use std::io::{Read, Write};

use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{ArchiveError, Error, Result};
use crate::huffman::HuffmanCodec;

/// Byte written after each header field.
pub const SEPARATOR: u8 = 0xFF;

/// Largest block moved per read while copying record bodies.
const COPY_BLOCK: usize = 64 * 1024;

/// One named file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Frames records into archives and parses them back.
#[derive(Debug, Clone, Default)]
pub struct Archiver {
    verbose: bool,
    huffman: HuffmanCodec,
}

impl Archiver {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            verbose: config.verbose,
            huffman: HuffmanCodec::new(config),
        }
    }

    /// Write one record whose content is the next `size` bytes of `source`.
    ///
    /// # Errors
    /// - `ArchiveError::NameTooLong` if the name exceeds the 32-bit field
    /// - `ArchiveError::SourceTooShort` if `source` ends before `size` bytes
    pub fn frame_record<W: Write, S: Read>(
        &self,
        writer: &mut BitWriter<W>,
        name: &str,
        size: u64,
        source: S,
    ) -> Result<()> {
        let name_len =
            u32::try_from(name.len()).map_err(|_| ArchiveError::NameTooLong(name.len()))?;

        writer.write_u32(name_len)?;
        writer.write_byte(SEPARATOR)?;
        writer.write_bytes(name.as_bytes())?;
        writer.write_byte(SEPARATOR)?;
        writer.write_u64(size)?;
        writer.write_byte(SEPARATOR)?;

        let mut source = source.take(size);
        let mut block = vec![0u8; COPY_BLOCK.min(size as usize)];
        let mut copied = 0u64;
        while copied < size {
            let n = match source.read(&mut block) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            writer.write_bytes(&block[..n])?;
            copied += n as u64;
        }

        if copied < size {
            return Err(ArchiveError::SourceTooShort {
                name: name.to_string(),
                declared: size,
                actual: copied,
            }
            .into());
        }

        if self.verbose {
            debug!(name, size, "framed record");
        }
        Ok(())
    }

    /// Frame every entry, in order.
    pub fn frame_archive<W: Write>(
        &self,
        writer: &mut BitWriter<W>,
        entries: &[ArchiveEntry],
    ) -> Result<()> {
        for entry in entries {
            self.frame_record(
                writer,
                &entry.name,
                entry.content.len() as u64,
                entry.content.as_slice(),
            )?;
        }
        Ok(())
    }

    /// Parse records until the stream is exhausted, handing each to
    /// `on_record` as soon as it is complete. Returns the record count.
    ///
    /// Only one record is held in memory at a time.
    ///
    /// # Errors
    /// - `BitIoError::UnexpectedEof` if a fixed-width header field is cut off
    /// - `ArchiveError::BadSeparator` if a separator byte is not 0xFF
    /// - `ArchiveError::Truncated` if a name or body is shorter than declared
    /// - `ArchiveError::InvalidName` if a name is not UTF-8
    /// - any error returned by `on_record`, which stops parsing and is
    ///   returned unchanged
    pub fn unframe_archive<R, F, E>(
        &self,
        reader: &mut BitReader<R>,
        mut on_record: F,
    ) -> std::result::Result<usize, E>
    where
        R: Read,
        F: FnMut(ArchiveEntry) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let mut count = 0;

        while !reader.is_empty()? {
            let name_len = reader.read_u32()?;
            expect_separator(reader, "name length")?;

            let name = read_declared(reader, name_len as u64, "name")?;
            let name =
                String::from_utf8(name).map_err(|_| Error::from(ArchiveError::InvalidName))?;
            expect_separator(reader, "name")?;

            let size = reader.read_u64()?;
            expect_separator(reader, "content length")?;

            let content = read_declared(reader, size, "content")?;

            if self.verbose {
                debug!(name = %name, size, "unframed record");
            }

            on_record(ArchiveEntry { name, content })?;
            count += 1;
        }

        Ok(count)
    }

    /// Frame `entries` and Huffman-encode the result as one message.
    pub fn compress_archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
        let mut framed = Vec::new();
        let mut writer = BitWriter::new(&mut framed);
        self.frame_archive(&mut writer, entries)?;
        writer.finish()?;

        if self.verbose {
            debug!(
                records = entries.len(),
                framed_len = framed.len(),
                "compressing archive"
            );
        }
        self.huffman.compress(&framed)
    }

    /// Huffman-decode `compressed`, then unframe the records.
    ///
    /// The intermediate framed bytes are dropped before returning.
    pub fn expand_archive<F, E>(
        &self,
        compressed: &[u8],
        on_record: F,
    ) -> std::result::Result<usize, E>
    where
        F: FnMut(ArchiveEntry) -> std::result::Result<(), E>,
        E: From<Error>,
    {
        let framed = self.huffman.expand(compressed)?;
        let mut reader = BitReader::new(framed.as_slice());
        self.unframe_archive(&mut reader, on_record)
    }

    /// Unframe an uncompressed archive held in memory.
    pub fn unframe_to_vec(&self, framed: &[u8]) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        let mut reader = BitReader::new(framed);
        self.unframe_archive(&mut reader, |entry| {
            entries.push(entry);
            Ok::<_, Error>(())
        })?;
        Ok(entries)
    }
}

fn expect_separator<R: Read>(reader: &mut BitReader<R>, field: &'static str) -> Result<()> {
    let found = reader.read_byte()?;
    if found != SEPARATOR {
        return Err(ArchiveError::BadSeparator { field, found }.into());
    }
    Ok(())
}

/// Read exactly `declared` bytes, growing the buffer as data actually
/// arrives so a corrupt length cannot force a huge allocation.
fn read_declared<R: Read>(
    reader: &mut BitReader<R>,
    declared: u64,
    field: &'static str,
) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut block = vec![0u8; COPY_BLOCK.min(declared as usize)];

    while (data.len() as u64) < declared {
        let want = (declared - data.len() as u64).min(block.len() as u64) as usize;
        let got = reader.read_bytes(&mut block[..want])?;
        data.extend_from_slice(&block[..got]);
        if got < want {
            return Err(ArchiveError::Truncated {
                field,
                declared,
                available: data.len() as u64,
            }
            .into());
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BitIoError, Error};

    fn framed(entries: &[ArchiveEntry]) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        Archiver::default()
            .frame_archive(&mut writer, entries)
            .unwrap();
        writer.finish().unwrap();
        bytes
    }

    #[test]
    fn test_record_layout() {
        let bytes = framed(&[ArchiveEntry::new("a.txt", "hi")]);
        let mut expected = vec![0, 0, 0, 5, 0xFF];
        expected.extend_from_slice(b"a.txt");
        expected.push(0xFF);
        expected.extend_from_slice(&2u64.to_be_bytes());
        expected.push(0xFF);
        expected.extend_from_slice(b"hi");
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_order_and_empty_file() {
        let entries = vec![
            ArchiveEntry::new("a.txt", "hello"),
            ArchiveEntry::new("b.txt", ""),
        ];
        let parsed = Archiver::default().unframe_to_vec(&framed(&entries)).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_empty_archive() {
        assert!(framed(&[]).is_empty());
        assert!(Archiver::default().unframe_to_vec(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_content_with_separator_bytes() {
        let entries = vec![
            ArchiveEntry::new("ff", vec![0xFF; 300]),
            ArchiveEntry::new("mixed", vec![0xFF, 0, 0, 0, 3, 0xFF, b'x']),
        ];
        let parsed = Archiver::default().unframe_to_vec(&framed(&entries)).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_compressed_archive() {
        let archiver = Archiver::default();
        let entries = vec![
            ArchiveEntry::new("F1", "ABRACADABRA!"),
            ArchiveEntry::new("F2", ""),
        ];
        let compressed = archiver.compress_archive(&entries).unwrap();

        let mut parsed = Vec::new();
        let count = archiver
            .expand_archive(&compressed, |entry| {
                parsed.push(entry);
                Ok::<_, Error>(())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_frame_record_from_reader() {
        let archiver = Archiver::default();
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        // Source longer than declared: only the declared prefix is taken
        archiver
            .frame_record(&mut writer, "part", 4, &b"abcdefgh"[..])
            .unwrap();
        writer.finish().unwrap();

        let parsed = archiver.unframe_to_vec(&bytes).unwrap();
        assert_eq!(parsed, vec![ArchiveEntry::new("part", "abcd")]);
    }

    #[test]
    fn test_short_source() {
        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        let result = Archiver::default().frame_record(&mut writer, "short", 10, &b"abc"[..]);
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::SourceTooShort {
                declared: 10,
                actual: 3,
                ..
            }))
        ));
    }

    #[test]
    fn test_truncated_content() {
        let bytes = framed(&[ArchiveEntry::new("a", "hello world")]);
        let result = Archiver::default().unframe_to_vec(&bytes[..bytes.len() - 3]);
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::Truncated {
                field: "content",
                declared: 11,
                available: 8,
            }))
        ));
    }

    #[test]
    fn test_absurd_name_length() {
        let mut bytes = vec![0xFF, 0xFF, 0xFF, 0xF0, SEPARATOR];
        bytes.extend_from_slice(b"tiny");
        let result = Archiver::default().unframe_to_vec(&bytes);
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::Truncated { field: "name", .. }))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = framed(&[ArchiveEntry::new("a", "x")]);
        let result = Archiver::default().unframe_to_vec(&bytes[..9]);
        assert!(matches!(
            result,
            Err(Error::BitIo(BitIoError::UnexpectedEof))
        ));
    }

    #[test]
    fn test_bad_separator() {
        let mut bytes = framed(&[ArchiveEntry::new("a", "x")]);
        bytes[4] = 0x00;
        let result = Archiver::default().unframe_to_vec(&bytes);
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::BadSeparator {
                field: "name length",
                found: 0
            }))
        ));
    }

    #[test]
    fn test_invalid_name() {
        let mut bytes = framed(&[ArchiveEntry::new("ok", "")]);
        bytes[5] = 0xC3; // lead byte without continuation
        let result = Archiver::default().unframe_to_vec(&bytes);
        assert!(matches!(
            result,
            Err(Error::Archive(ArchiveError::InvalidName))
        ));
    }

    #[derive(Debug)]
    enum ExtractError {
        Codec(Error),
        Rejected(String),
    }

    impl From<Error> for ExtractError {
        fn from(e: Error) -> Self {
            ExtractError::Codec(e)
        }
    }

    #[test]
    fn test_callback_error_stops_parsing() {
        let bytes = framed(&[ArchiveEntry::new("a", "1"), ArchiveEntry::new("b", "2")]);
        let mut seen = Vec::new();
        let mut reader = BitReader::new(&bytes[..]);
        let result = Archiver::default().unframe_archive(&mut reader, |entry| {
            seen.push(entry.name.clone());
            Err(ExtractError::Rejected(entry.name))
        });
        assert!(matches!(result, Err(ExtractError::Rejected(ref name)) if name == "a"));
        assert_eq!(seen, vec!["a".to_string()]);
    }

    #[test]
    fn test_callback_error_type_carries_codec_errors() {
        let bytes = framed(&[ArchiveEntry::new("a", "hello")]);
        let mut reader = BitReader::new(&bytes[..bytes.len() - 1]);
        let result = Archiver::default()
            .unframe_archive(&mut reader, |_| Ok::<_, ExtractError>(()));
        assert!(matches!(
            result,
            Err(ExtractError::Codec(Error::Archive(ArchiveError::Truncated { .. })))
        ));
    }
}
