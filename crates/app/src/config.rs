//! Configuration for the bitcodec command-line tool.
//!
//! Arguments are parsed by hand into a `Config`: one command word, its
//! paths, and a handful of flags that may appear anywhere.

use std::path::PathBuf;

use bitcodec_core::config::DEFAULT_LZW_WIDTH;
use bitcodec_core::CodecConfig;

/// What the tool was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Huffman-compress each file to `<file>.hh`
    Huffman { files: Vec<PathBuf> },

    /// LZW-compress each file to `<file>.ll`
    Lzw { files: Vec<PathBuf> },

    /// Pack files into one Huffman-compressed `.zh` archive
    Archive { archive: PathBuf, files: Vec<PathBuf> },

    /// Expand `.hh`, `.ll` or `.zh` files, chosen by suffix; archive
    /// entries are extracted under `dir`
    Expand { files: Vec<PathBuf>, dir: PathBuf },

    /// Round-trip generated sample data through every codec in memory
    Demo { seed: u64, size: usize },
}

/// Complete configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,

    /// Settings handed to the codecs
    pub codec: CodecConfig,

    /// Whether to print the metrics summary
    pub print_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut positional: Vec<String> = Vec::new();
        let mut verbose = false;
        let mut print_metrics = true;
        let mut lzw_width: Option<u32> = None;
        let mut seed: Option<u64> = None;
        let mut size: Option<usize> = None;
        let mut dir: Option<PathBuf> = None;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--verbose" | "-v" => {
                    verbose = true;
                }
                "--no-metrics" => {
                    print_metrics = false;
                }
                "--lzw-width" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--lzw-width requires a number".to_string());
                    }
                    lzw_width = Some(args[i].parse().map_err(|_| "invalid lzw-width")?);
                }
                "--seed" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--seed requires a number".to_string());
                    }
                    seed = Some(args[i].parse().map_err(|_| "invalid seed")?);
                }
                "--size" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--size requires a number".to_string());
                    }
                    size = Some(args[i].parse().map_err(|_| "invalid size")?);
                }
                "--dir" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("--dir requires a directory".to_string());
                    }
                    dir = Some(PathBuf::from(&args[i]));
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => {
                    return Err(format!("unknown argument: {}", flag));
                }
                _ => positional.push(args[i].clone()),
            }
            i += 1;
        }

        let codec = CodecConfig {
            verbose,
            lzw_width: lzw_width.unwrap_or(DEFAULT_LZW_WIDTH),
        };
        codec.validate().map_err(|e| e.to_string())?;

        let Some((name, rest)) = positional.split_first() else {
            return Err("missing command".to_string());
        };
        let paths = || rest.iter().map(PathBuf::from).collect::<Vec<_>>();
        if dir.is_some() && !matches!(name.as_str(), "expand" | "x") {
            return Err("--dir only applies to expand".to_string());
        }

        let command = match name.as_str() {
            "huffman" | "hh" => Command::Huffman {
                files: require_files(paths(), name)?,
            },
            "lzw" | "ll" => Command::Lzw {
                files: require_files(paths(), name)?,
            },
            "archive" | "zh" => {
                let mut files = paths();
                if files.len() < 2 {
                    return Err("archive requires an archive path and at least one file".to_string());
                }
                let archive = files.remove(0);
                Command::Archive { archive, files }
            }
            "expand" | "x" => Command::Expand {
                files: require_files(paths(), name)?,
                dir: dir.unwrap_or_else(|| PathBuf::from(".")),
            },
            "demo" => {
                if !rest.is_empty() {
                    return Err("demo takes no paths".to_string());
                }
                Command::Demo {
                    seed: seed.unwrap_or_else(time_seed),
                    size: size.unwrap_or(256 * 1024),
                }
            }
            other => return Err(format!("unknown command: {}", other)),
        };

        Ok(Config {
            command,
            codec,
            print_metrics,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Command: {:?}", self.command);
        println!("LZW codeword width: {} bits", self.codec.lzw_width);
        println!("Verbose: {}", self.codec.verbose);
        println!();
    }
}

fn require_files(files: Vec<PathBuf>, command: &str) -> Result<Vec<PathBuf>, String> {
    if files.is_empty() {
        return Err(format!("{} requires at least one file", command));
    }
    Ok(files)
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn print_help() {
    println!("bitcodec: Huffman, LZW and archive compression");
    println!();
    println!("USAGE:");
    println!("    bitcodec <COMMAND> [PATHS...] [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    huffman <FILE>...             Compress each file to <FILE>.hh");
    println!("    lzw <FILE>...                 Compress each file to <FILE>.ll");
    println!("    archive <ARCHIVE.zh> <FILE>...  Pack files into one compressed archive");
    println!("    expand <FILE>...              Expand .hh, .ll or .zh files");
    println!("    demo                          Round-trip generated data through every codec");
    println!();
    println!("OPTIONS:");
    println!("    --lzw-width <N>         LZW codeword width, 9-16 (default: 12)");
    println!("    --seed <N>              Demo data seed (default: time-based)");
    println!("    --size <N>              Demo data size in bytes (default: 262144)");
    println!("    --dir <DIR>             Extract archive entries under DIR (default: .)");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --verbose, -v           Log codec diagnostics to stderr");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    bitcodec huffman notes.txt         # writes notes.txt.hh");
    println!("    bitcodec expand notes.txt.hh       # restores notes.txt");
    println!("    bitcodec archive docs.zh a.txt b.txt");
    println!("    bitcodec demo --seed 42");
    println!();
}
