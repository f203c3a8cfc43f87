//! Instruction decoder for the DCPU-16 disassembler

use crate::addressing::{Operand, Position};
use crate::disassembler::Instruction;
use crate::opcodes::InstructionWord;

/// Decode a single instruction from a word slice
///
/// # Arguments
///
/// * `words` - The word slice starting at the instruction to decode
/// * `address` - The memory address of this instruction
///
/// # Returns
///
/// Some(Instruction) if the word encodes a defined operation and all of its
/// extension words are present, None otherwise
pub fn decode_instruction(words: &[u16], address: u16) -> Option<Instruction> {
    let (&word, rest) = words.split_first()?;
    let fields = InstructionWord::split(word);
    let metadata = fields.metadata()?;

    let mut extension = rest.iter().copied();
    let mut truncated = false;
    let mut next_word = || {
        extension.next().unwrap_or_else(|| {
            truncated = true;
            0
        })
    };

    // Extension words follow in B-then-A order
    let operands = if fields.is_special() {
        vec![Operand::decode(fields.a, Position::A, &mut next_word)]
    } else {
        let b = Operand::decode(fields.b, Position::B, &mut next_word);
        let a = Operand::decode(fields.a, Position::A, &mut next_word);
        vec![b, a]
    };

    if truncated {
        return None;
    }

    let size_words = 1 + operands.iter().map(|op| op.extension_words()).sum::<u8>();

    Some(Instruction {
        address,
        word,
        mnemonic: metadata.mnemonic,
        operands,
        size_words,
        base_cycles: metadata.base_cycles,
    })
}
