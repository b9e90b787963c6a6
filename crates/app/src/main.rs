//! bitcodec: compress and expand files with the Huffman, LZW and archive
//! formats from `bitcodec-core`.

mod config;
mod dispatch;
mod error;
mod input_gen;

use std::process::ExitCode;

use bitcodec_core::metrics::Metrics;
use tracing::{error, Level};

use crate::config::{Command, Config};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    init_tracing(config.codec.verbose);

    if config.codec.verbose {
        config.print();
    }

    match run(&config) {
        Ok(runs) => {
            if config.print_metrics {
                for metrics in &runs {
                    metrics.print_summary();
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> error::Result<Vec<Metrics>> {
    let codec = &config.codec;
    match &config.command {
        Command::Huffman { files } => Ok(vec![dispatch::huffman_files(codec, files)?]),
        Command::Lzw { files } => Ok(vec![dispatch::lzw_files(codec, files)?]),
        Command::Archive { archive, files } => {
            Ok(vec![dispatch::create_archive(codec, archive, files)?])
        }
        Command::Expand { files, dir } => dispatch::expand_files(codec, files, dir),
        Command::Demo { seed, size } => dispatch::run_demo(codec, *seed, *size),
    }
}

/// Diagnostics go to stderr so stdout carries only results.
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
