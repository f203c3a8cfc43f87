//! Fuzz target for the disassembler.
//!
//! This target feeds arbitrary word sequences to the disassembler
//! to find edge cases and crashes in instruction decoding.

#![no_main]

use arbitrary::Arbitrary;
use libdcpu16::disassembler::format_listing;
use libdcpu16::{disassemble, format_instruction, DisassemblyOptions};
use libfuzzer_sys::fuzz_target;

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    words: Vec<u16>,
    start_address: u16,
    show_words: bool,
}

fuzz_target!(|input: FuzzInput| {
    // Limit input size to prevent OOM
    if input.words.len() > 65536 {
        return;
    }

    let options = DisassemblyOptions {
        start_address: input.start_address,
        show_words: input.show_words,
    };

    let instructions = disassemble(&input.words, options);

    // Verify invariants
    let mut total_size: usize = 0;
    let mut expected_address = input.start_address;

    for instr in &instructions {
        // Each instruction should have correct address
        assert_eq!(instr.address, expected_address);

        // Size should be 1-3 words, and match the decoded operands
        assert!(instr.size_words >= 1 && instr.size_words <= 3);
        let extension: u8 = instr.operands.iter().map(|op| op.extension_words()).sum();
        if !instr.is_data() {
            assert_eq!(instr.size_words, 1 + extension);
        }

        assert!(!format_instruction(instr).is_empty());

        total_size += instr.size_words as usize;
        expected_address = expected_address.wrapping_add(instr.size_words as u16);
    }

    // Total size should equal input size
    assert_eq!(total_size, input.words.len());
    assert_eq!(format_listing(&instructions, options).lines().count(), instructions.len());
});
