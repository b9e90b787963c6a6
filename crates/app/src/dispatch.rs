//! Format dispatch: picks a codec pipeline from a file suffix and runs it
//! over files on disk.
//!
//! | suffix | pipeline                          |
//! |--------|-----------------------------------|
//! | `.hh`  | Huffman                           |
//! | `.ll`  | LZW                               |
//! | `.zh`  | archive framing, then Huffman     |
//!
//! Missing inputs are reported and skipped before any codec runs. Each
//! codec call gets its own reader or writer, released when the call ends.
//!
//! Archive entry names are stored as plain relative paths, so every archive
//! this tool writes can be extracted again under a target directory.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Component, Path, PathBuf};

use bitcodec_core::{
    bitio::{BitReader, BitWriter},
    metrics::{Direction, Metrics},
    ArchiveEntry, Archiver, CodecConfig, HuffmanCodec, LzwCodec,
};
use tracing::{debug, info, warn};

use crate::error::{io_at, AppError, Result};
use crate::input_gen::generate_sample_data;

/// A compressed file format, identified by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Huffman,
    Lzw,
    Archive,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Huffman => "hh",
            Format::Lzw => "ll",
            Format::Archive => "zh",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Huffman => "huffman",
            Format::Lzw => "lzw",
            Format::Archive => "archive",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "hh" => Some(Format::Huffman),
            "ll" => Some(Format::Lzw),
            "zh" => Some(Format::Archive),
            _ => None,
        }
    }
}

/// Huffman-compress each file to `<file>.hh`.
pub fn huffman_files(config: &CodecConfig, files: &[PathBuf]) -> Result<Metrics> {
    let codec = HuffmanCodec::new(config);
    compress_each(Format::Huffman, files, |input, writer| {
        codec.encode(input, writer)
    })
}

/// LZW-compress each file to `<file>.ll`.
pub fn lzw_files(config: &CodecConfig, files: &[PathBuf]) -> Result<Metrics> {
    let codec = LzwCodec::new(config)?;
    compress_each(Format::Lzw, files, |input, writer| {
        codec.encode(input, writer).map(|_| ())
    })
}

fn compress_each<F>(format: Format, files: &[PathBuf], encode: F) -> Result<Metrics>
where
    F: Fn(&[u8], &mut BitWriter<BufWriter<File>>) -> bitcodec_core::Result<()>,
{
    let mut metrics = Metrics::new(format.name(), Direction::Compress);

    for path in existing_files(files) {
        let input = fs::read(path).map_err(io_at(path))?;
        let output_path = append_extension(path, format.extension());
        let file = File::create(&output_path).map_err(io_at(&output_path))?;

        let mut writer = BitWriter::new(BufWriter::new(file));
        encode(&input, &mut writer)?;
        let written = writer.bit_len().div_ceil(8);
        writer.finish()?;

        metrics.record(input.len(), written as usize);
        info!("{} -> {}", path.display(), output_path.display());
    }

    metrics.complete();
    Ok(metrics)
}

/// Frame `files` into one archive and Huffman-compress it to `archive`.
///
/// Entry names are the paths as given, made relative: `/tmp/a.txt` is
/// stored as `tmp/a.txt` and `../x` as `x`.
pub fn create_archive(config: &CodecConfig, archive: &Path, files: &[PathBuf]) -> Result<Metrics> {
    if Format::from_path(archive) != Some(Format::Archive) {
        return Err(AppError::UnsupportedFormat(archive.to_path_buf()));
    }

    let archiver = Archiver::new(config);
    let mut metrics = Metrics::new(Format::Archive.name(), Direction::Compress);

    let mut framed = Vec::new();
    let mut framer = BitWriter::new(&mut framed);
    for path in existing_files(files) {
        let name = entry_name(path)?;
        let file = File::open(path).map_err(io_at(path))?;
        let size = file.metadata().map_err(io_at(path))?.len();

        archiver.frame_record(&mut framer, &name, size, BufReader::new(file))?;
        metrics.record(size as usize, 0);
        debug!(name = %name, size, "added to archive");
    }
    framer.finish()?;

    let file = File::create(archive).map_err(io_at(archive))?;
    let mut writer = BitWriter::new(BufWriter::new(file));
    HuffmanCodec::new(config).encode(&framed, &mut writer)?;
    metrics.output_bytes = writer.bit_len().div_ceil(8);
    writer.finish()?;

    info!("{} file(s) -> {}", metrics.files, archive.display());
    metrics.complete();
    Ok(metrics)
}

/// Expand each file with the pipeline its suffix names.
///
/// `.hh` and `.ll` outputs land next to their input; archive entries are
/// extracted under `dir`.
pub fn expand_files(
    config: &CodecConfig,
    files: &[PathBuf],
    dir: &Path,
) -> Result<Vec<Metrics>> {
    let mut all = Vec::new();
    for path in files {
        let format =
            Format::from_path(path).ok_or_else(|| AppError::UnsupportedFormat(path.clone()))?;
        if !path.is_file() {
            warn!("{} does not exist or is not a file, skipping", path.display());
            continue;
        }

        let metrics = match format {
            Format::Huffman => {
                let codec = HuffmanCodec::new(config);
                expand_single(format, path, |reader| codec.decode(reader))?
            }
            Format::Lzw => {
                let codec = LzwCodec::new(config)?;
                expand_single(format, path, |reader| codec.decode(reader))?
            }
            Format::Archive => extract_archive(config, path, dir)?,
        };
        all.push(metrics);
    }
    Ok(all)
}

fn expand_single<F>(format: Format, path: &Path, decode: F) -> Result<Metrics>
where
    F: FnOnce(&mut BitReader<BufReader<File>>) -> bitcodec_core::Result<Vec<u8>>,
{
    let mut metrics = Metrics::new(format.name(), Direction::Expand);
    let output_path = path.with_extension("");

    let file = File::open(path).map_err(io_at(path))?;
    let input_len = file.metadata().map_err(io_at(path))?.len();

    let output = {
        let mut reader = BitReader::new(BufReader::new(file));
        decode(&mut reader)?
    };
    fs::write(&output_path, &output).map_err(io_at(&output_path))?;

    metrics.record(input_len as usize, output.len());
    info!("{} -> {}", path.display(), output_path.display());
    metrics.complete();
    Ok(metrics)
}

fn extract_archive(config: &CodecConfig, path: &Path, dir: &Path) -> Result<Metrics> {
    let mut metrics = Metrics::new(Format::Archive.name(), Direction::Expand);
    let compressed = fs::read(path).map_err(io_at(path))?;

    Archiver::new(config).expand_archive(&compressed, |entry| {
        write_entry(dir, &entry)?;
        metrics.record(0, entry.content.len());
        info!("extracted {}", entry.name);
        Ok::<_, AppError>(())
    })?;

    metrics.input_bytes = compressed.len() as u64;
    metrics.complete();
    Ok(metrics)
}

fn write_entry(dir: &Path, entry: &ArchiveEntry) -> Result<()> {
    let path = dir.join(safe_entry_path(&entry.name)?);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_at(parent))?;
    }
    fs::write(&path, &entry.content).map_err(io_at(&path))
}

/// Only plain relative paths are extracted.
fn safe_entry_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    let safe = !name.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if safe {
        Ok(path.to_path_buf())
    } else {
        Err(AppError::UnsafeEntryName(name.to_string()))
    }
}

/// Relative archive name for `path`, joined with `/`.
///
/// Roots and prefixes are dropped and `..` removes the preceding component,
/// so the result always passes `safe_entry_path`.
fn entry_name(path: &Path) -> Result<String> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                let part = part
                    .to_str()
                    .ok_or_else(|| AppError::NonUtf8Path(path.to_path_buf()))?;
                parts.push(part);
            }
            Component::ParentDir => {
                parts.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    if parts.is_empty() {
        return Err(AppError::UnsafeEntryName(path.display().to_string()));
    }
    Ok(parts.join("/"))
}

/// Round-trip seeded sample data through every pipeline in memory.
pub fn run_demo(config: &CodecConfig, seed: u64, size: usize) -> Result<Vec<Metrics>> {
    let data = generate_sample_data(seed, size);
    info!(seed, size, "generated demo data");

    let mut all = Vec::new();

    let huffman = HuffmanCodec::new(config);
    let mut metrics = Metrics::new(Format::Huffman.name(), Direction::Compress);
    let compressed = huffman.compress(&data)?;
    metrics.record(data.len(), compressed.len());
    if huffman.expand(&compressed)? != data {
        return Err(AppError::Verification("huffman"));
    }
    metrics.complete();
    all.push(metrics);

    let lzw = LzwCodec::new(config)?;
    let mut metrics = Metrics::new(Format::Lzw.name(), Direction::Compress);
    let compressed = lzw.compress(&data)?;
    metrics.record(data.len(), compressed.len());
    if lzw.expand(&compressed)? != data {
        return Err(AppError::Verification("lzw"));
    }
    metrics.complete();
    all.push(metrics);

    // Three slices of the data plus an empty file
    let third = data.len() / 3;
    let entries = vec![
        ArchiveEntry::new("demo/part-1.bin", &data[..third]),
        ArchiveEntry::new("demo/part-2.bin", &data[third..2 * third]),
        ArchiveEntry::new("demo/part-3.bin", &data[2 * third..]),
        ArchiveEntry::new("demo/empty.bin", ""),
    ];
    let archiver = Archiver::new(config);
    let mut metrics = Metrics::new(Format::Archive.name(), Direction::Compress);
    let compressed = archiver.compress_archive(&entries)?;

    let mut restored = Vec::with_capacity(entries.len());
    archiver.expand_archive(&compressed, |entry| {
        restored.push(entry);
        Ok::<_, AppError>(())
    })?;
    if restored != entries {
        return Err(AppError::Verification("archive"));
    }
    for entry in &entries {
        metrics.record(entry.content.len(), 0);
    }
    metrics.output_bytes = compressed.len() as u64;
    metrics.complete();
    all.push(metrics);

    Ok(all)
}

/// Files that exist; the rest are reported and skipped.
fn existing_files(files: &[PathBuf]) -> impl Iterator<Item = &PathBuf> {
    files.iter().filter(|path| {
        let exists = path.is_file();
        if !exists {
            warn!("{} does not exist or is not a file, skipping", path.display());
        }
        exists
    })
}

/// `notes.txt` + `hh` -> `notes.txt.hh`
fn append_extension(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}
