//! Run metrics for compression and expansion.
//!
//! A single `Metrics` value is threaded through one command: each processed
//! file adds its input and output sizes, and the summary derives ratio and
//! throughput from the totals.
//!
//! # Thread Safety
//!
//! `Metrics` is plain data updated by a single thread. Codec calls are
//! synchronous, so there is nothing to merge.

use std::time::{Duration, Instant};

/// Which way the bytes flowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Expand,
}

/// Counts and timing for one run.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Codec or pipeline name shown in the summary
    pub codec: &'static str,

    pub direction: Direction,

    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Volume ===
    /// Files (or archive records) processed
    pub files: u64,

    /// Bytes read by the codec
    pub input_bytes: u64,

    /// Bytes produced by the codec
    pub output_bytes: u64,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new(codec: &'static str, direction: Direction) -> Self {
        Self {
            codec,
            direction,
            start_time: Instant::now(),
            end_time: None,
            files: 0,
            input_bytes: 0,
            output_bytes: 0,
        }
    }

    /// Account for one processed file.
    pub fn record(&mut self, input_bytes: usize, output_bytes: usize) {
        self.files += 1;
        self.input_bytes += input_bytes as u64;
        self.output_bytes += output_bytes as u64;
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compressed size over raw size, whichever way the run went.
    ///
    /// Returns 0.0 if nothing raw was seen.
    pub fn compression_ratio(&self) -> f64 {
        let (raw, packed) = match self.direction {
            Direction::Compress => (self.input_bytes, self.output_bytes),
            Direction::Expand => (self.output_bytes, self.input_bytes),
        };
        if raw == 0 {
            0.0
        } else {
            packed as f64 / raw as f64
        }
    }

    /// Compute throughput in input bytes/second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.input_bytes as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        let verb = match self.direction {
            Direction::Compress => "Compressed",
            Direction::Expand => "Expanded",
        };

        println!("\n=== {} ({}) ===", verb, self.codec);
        println!("Files: {}", self.files);
        println!("Input:  {} bytes", self.input_bytes);
        println!("Output: {} bytes", self.output_bytes);
        println!("Ratio: {:.1}%", self.compression_ratio() * 100.0);
        println!("Duration: {} ms", self.duration().as_millis());
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
    }

    /// Export metrics as key=value lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "codec={}\n\
             duration_ms={}\n\
             files={}\n\
             input_bytes={}\n\
             output_bytes={}\n\
             compression_ratio={:.4}\n",
            self.codec,
            self.duration().as_millis(),
            self.files,
            self.input_bytes,
            self.output_bytes,
            self.compression_ratio(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new("huffman", Direction::Compress);
        assert!(metrics.end_time.is_none());
        assert_eq!(metrics.files, 0);
        assert!(metrics.duration().as_millis() < 100);
    }

    #[test]
    fn test_compression_ratio() {
        let mut metrics = Metrics::new("lzw", Direction::Compress);
        metrics.record(1000, 600);
        metrics.record(1000, 900);
        assert_eq!(metrics.files, 2);
        assert_eq!(metrics.compression_ratio(), 0.75);
    }

    #[test]
    fn test_ratio_when_expanding() {
        let mut metrics = Metrics::new("lzw", Direction::Expand);
        metrics.record(250, 1000);
        assert_eq!(metrics.compression_ratio(), 0.25);
    }

    #[test]
    fn test_empty_ratio() {
        let metrics = Metrics::new("huffman", Direction::Compress);
        assert_eq!(metrics.compression_ratio(), 0.0);
    }

    #[test]
    fn test_throughput() {
        let mut metrics = Metrics::new("huffman", Direction::Compress);
        metrics.record(1_000_000, 10);
        std::thread::sleep(Duration::from_millis(10));
        metrics.complete();
        assert!(metrics.throughput_bps() > 0.0);
    }

    #[test]
    fn test_export_text() {
        let mut metrics = Metrics::new("archive", Direction::Compress);
        metrics.record(1000, 500);

        let text = metrics.export_text();
        assert!(text.contains("codec=archive"));
        assert!(text.contains("input_bytes=1000"));
        assert!(text.contains("output_bytes=500"));
        assert!(text.contains("compression_ratio=0.5000"));
    }
}
