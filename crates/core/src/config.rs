//! Codec configuration.
//!
//! Settings are passed explicitly to each codec when it is constructed;
//! there is no process-wide switch.

use crate::error::{Error, LzwError, Result};

/// Default LZW codeword width in bits (4096 codewords).
pub const DEFAULT_LZW_WIDTH: u32 = 12;

/// Narrowest width that leaves room beyond the 256 seed entries and the
/// end-of-stream codeword.
pub const MIN_LZW_WIDTH: u32 = 9;

/// Widest width whose codewords fit a `u16`.
pub const MAX_LZW_WIDTH: u32 = 16;

/// Configuration shared by the codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Emit per-call diagnostics through `tracing`
    pub verbose: bool,

    /// LZW codeword width W; the dictionary holds at most 2^W entries.
    /// Encoder and decoder must agree on it, it is never sent in-band.
    pub lzw_width: u32,
}

impl CodecConfig {
    /// Default configuration with verbose diagnostics turned on.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::default()
        }
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LZW_WIDTH..=MAX_LZW_WIDTH).contains(&self.lzw_width) {
            return Err(Error::from(LzwError::InvalidWidth(self.lzw_width)));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            lzw_width: DEFAULT_LZW_WIDTH,
        }
    }
}
