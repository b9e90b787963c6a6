//! Property tests: round-trip identity and structural bounds.

use bitcodec_core::{
    bitio::BitReader,
    huffman::{count_frequencies, Node, Trie},
    lzw::EOF_CODEWORD,
    ArchiveEntry, Archiver, Error, HuffmanCodec, LzwCodec,
};
use proptest::prelude::*;

fn every_internal_has_two_children(node: &Node) -> bool {
    match node {
        Node::Leaf(_) => true,
        Node::Internal(left, right) => {
            every_internal_has_two_children(left) && every_internal_has_two_children(right)
        }
    }
}

proptest! {
    #[test]
    fn huffman_round_trip(input in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let codec = HuffmanCodec::default();
        let compressed = codec.compress(&input).unwrap();
        prop_assert_eq!(codec.expand(&compressed).unwrap(), input);
    }

    #[test]
    fn huffman_repeated_byte(byte in any::<u8>(), len in 1usize..5000) {
        let input = vec![byte; len];
        let codec = HuffmanCodec::default();
        let compressed = codec.compress(&input).unwrap();
        prop_assert_eq!(compressed.len(), 6);
        prop_assert_eq!(codec.expand(&compressed).unwrap(), input);
    }

    #[test]
    fn lzw_round_trip(input in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let codec = LzwCodec::default();
        let compressed = codec.compress(&input).unwrap();
        prop_assert_eq!(codec.expand(&compressed).unwrap(), input);
    }

    #[test]
    fn lzw_codewords_in_range(input in proptest::collection::vec(0u8..4, 1..20_000)) {
        let codec = LzwCodec::default();
        let compressed = codec.compress(&input).unwrap();

        let mut reader = BitReader::new(&compressed[..]);
        loop {
            let codeword = reader.read_bits(12).unwrap() as u32;
            prop_assert!(codeword < codec.capacity());
            if codeword == EOF_CODEWORD {
                break;
            }
        }
    }

    #[test]
    fn trie_structure(input in proptest::collection::vec(any::<u8>(), 1..1024)) {
        let freqs = count_frequencies(&input);
        let trie = Trie::from_frequencies(&freqs).unwrap();
        prop_assert!(every_internal_has_two_children(trie.root()));

        let codes = trie.code_table().unwrap();
        for (symbol, code) in codes.iter() {
            prop_assert!(freqs[symbol as usize] > 0);
            for (other, other_code) in codes.iter() {
                if freqs[symbol as usize] > freqs[other as usize] {
                    prop_assert!(code.len <= other_code.len);
                }
            }
        }
    }

    #[test]
    fn archive_round_trip(
        files in proptest::collection::vec(
            ("[a-z]{1,12}(\\.[a-z]{1,3})?", proptest::collection::vec(any::<u8>(), 0..512)),
            0..6,
        )
    ) {
        let entries: Vec<ArchiveEntry> = files
            .into_iter()
            .map(|(name, content)| ArchiveEntry::new(name, content))
            .collect();

        let archiver = Archiver::default();
        let compressed = archiver.compress_archive(&entries).unwrap();

        let mut parsed = Vec::new();
        archiver
            .expand_archive(&compressed, |entry| {
                parsed.push(entry);
                Ok::<_, Error>(())
            })
            .unwrap();
        prop_assert_eq!(parsed, entries);
    }
}
