//! Sample data for the demo command.
//!
//! The bytes are a sequence of sections, each aimed at a different path
//! through the codecs:
//! - `Words`: text from a small vocabulary. LZW learns whole phrases and
//!   Huffman sees a skewed alphabet.
//! - `Run`: one byte repeated, so a single Huffman symbol dominates.
//! - `Separators`: binary dense in 0xFF, the archive separator byte, which
//!   the demo archive must carry through content untouched.
//! - `Noise`: uniform random bytes that neither codec can shrink.
//!
//! Data always opens with enough noise to fill an LZW dictionary at the
//! default width, so every demo run exercises the frozen-dictionary path.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Leading noise; a 12-bit LZW dictionary is full well before this.
pub const FREEZE_NOISE: usize = 6 * 1024;

/// Largest section after the leading noise.
const MAX_SECTION: usize = 8192;

const WORDS: &[&str] = &[
    "the", "archive", "record", "huffman", "trie", "leaf", "codeword", "dictionary", "stream",
    "bit", "length", "frame", "symbol", "entry", "prefix", "of", "and", "a",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Words,
    Run,
    Separators,
    Noise,
}

impl Section {
    fn pick(rng: &mut ChaCha8Rng) -> Self {
        match rng.gen_range(0..10) {
            0..=3 => Section::Words,
            4..=5 => Section::Run,
            6..=7 => Section::Separators,
            _ => Section::Noise,
        }
    }
}

/// Generate `size_bytes` of sample data.
///
/// The same seed and size always give the same bytes.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    let mut section = Section::Noise;
    let mut section_len = FREEZE_NOISE;
    while data.len() < size_bytes {
        let len = section_len.min(size_bytes - data.len());
        fill(section, len, &mut rng, &mut data);

        section = Section::pick(&mut rng);
        section_len = rng.gen_range(MAX_SECTION / 4..=MAX_SECTION);
    }

    data
}

/// Append exactly `len` bytes of `section` to `data`.
fn fill(section: Section, len: usize, rng: &mut ChaCha8Rng, data: &mut Vec<u8>) {
    let end = data.len() + len;
    match section {
        Section::Words => {
            while data.len() < end {
                let word = WORDS.choose(rng).copied().unwrap_or("bit");
                data.extend_from_slice(word.as_bytes());
                data.push(if rng.gen_ratio(1, 12) { b'\n' } else { b' ' });
            }
            data.truncate(end);
        }
        Section::Run => {
            let byte: u8 = rng.gen();
            data.resize(end, byte);
        }
        Section::Separators => {
            while data.len() < end {
                let byte = if rng.gen_bool(0.5) { 0xFF } else { rng.gen_range(0..4) };
                data.push(byte);
            }
        }
        Section::Noise => data.extend((0..len).map(|_| rng.gen::<u8>())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcodec_core::{bitio::BitWriter, LzwCodec};

    #[test]
    fn test_determinism() {
        let data1 = generate_sample_data(12345, 50_000);
        let data2 = generate_sample_data(12345, 50_000);

        assert_eq!(data1, data2);
    }

    #[test]
    fn test_different_seeds() {
        let data1 = generate_sample_data(1, 1000);
        let data2 = generate_sample_data(2, 1000);

        assert_ne!(data1, data2);
    }

    #[test]
    fn test_various_sizes() {
        for size in [0, 1, 100, FREEZE_NOISE, FREEZE_NOISE + 1, 100_000] {
            let data = generate_sample_data(999, size);
            assert_eq!(data.len(), size);
        }
    }

    #[test]
    fn test_leading_noise_fills_lzw_dictionary() {
        let data = generate_sample_data(7, FREEZE_NOISE);
        let codec = LzwCodec::default();

        let mut bytes = Vec::new();
        let mut writer = BitWriter::new(&mut bytes);
        let summary = codec.encode(&data, &mut writer).unwrap();
        writer.finish().unwrap();

        assert_eq!(summary.dictionary_len, codec.capacity());
    }

    #[test]
    fn test_fill_sections() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut words = Vec::new();
        fill(Section::Words, 500, &mut rng, &mut words);
        assert_eq!(words.len(), 500);
        assert!(words.iter().all(|b| b.is_ascii_lowercase() || *b == b' ' || *b == b'\n'));

        let mut run = Vec::new();
        fill(Section::Run, 300, &mut rng, &mut run);
        assert!(run.iter().all(|&b| b == run[0]));

        let mut separators = Vec::new();
        fill(Section::Separators, 400, &mut rng, &mut separators);
        assert!(separators.iter().all(|&b| b == 0xFF || b < 4));
        assert!(separators.contains(&0xFF));
    }
}
