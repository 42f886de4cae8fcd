//! Property-based tests for the opcode table and decoder.
//!
//! These tests verify invariants of the lookaside index and decoding:
//! - Lookup through the index agrees with a scan in declaration order
//! - Every opcode is reachable from every bucket its fixed bits allow
//! - Decoding never panics and is deterministic

use proptest::prelude::*;

use mdasm_isa::{ByteStream, MIPS32_OPCODES, Mips, MipsConfig, OpcodeTable, WordStream};

fn table() -> OpcodeTable {
    OpcodeTable::new(MIPS32_OPCODES).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10000))]

    /// The index returns the first opcode in declaration order that matches.
    #[test]
    fn lookaside_agrees_with_linear_scan(word in any::<u32>()) {
        let table = table();
        let indexed = table.find(word).map(|op| op.id);
        let scanned = table.iter().find(|op| op.matches(word)).map(|op| op.id);
        prop_assert_eq!(indexed, scanned);
    }

    /// Filling an opcode's variable fields never moves it out of its buckets.
    #[test]
    fn opcode_patterns_are_found(idx in 0..MIPS32_OPCODES.len(), noise in any::<u32>()) {
        let table = table();
        let op = table.iter().nth(idx).unwrap();
        let word = op.bin | (noise & !op.bin_mask);
        let [high, ..] = word.to_be_bytes();
        prop_assert!(table.lookaside().bucket(high).contains(&op.id));

        let found = table.find(word).unwrap();
        prop_assert!(found.matches(word));
        prop_assert!(found.id <= op.id, "{} shadowed by a later opcode", op.mnemonic);
    }

    /// Flipping any fixed bit stops an opcode from matching.
    #[test]
    fn fixed_bits_are_checked(idx in 0..MIPS32_OPCODES.len(), bit in 0u32..32) {
        let table = table();
        let op = table.iter().nth(idx).unwrap();
        prop_assume!(op.bin_mask & (1 << bit) != 0);
        prop_assert!(!op.matches(op.bin ^ (1 << bit)));
    }

    /// Decoding arbitrary bytes never panics and consumes whole words.
    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..16)) {
        let mips = Mips::new(MipsConfig::default()).unwrap();
        let mut stream = ByteStream::new(&bytes, 0x1000);
        if let Some(instr) = mips.decode(&mut stream) {
            prop_assert_eq!(stream.position(), 4);
            prop_assert_eq!(instr.size, 4);
            prop_assert_eq!(instr.address, 0x1000);
        } else {
            prop_assert_eq!(stream.position(), 0);
        }
    }

    /// Same word, same instruction.
    #[test]
    fn decode_is_deterministic(word in any::<u32>()) {
        let mips = Mips::new(MipsConfig::default()).unwrap();
        let code = word.to_be_bytes();
        let first = mips.decode(&mut ByteStream::new(&code, 0x400));
        let second = mips.decode(&mut ByteStream::new(&code, 0x400));
        prop_assert_eq!(first, second);
    }
}
