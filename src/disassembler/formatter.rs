//! Formatting functions for disassembled instructions

use crate::disassembler::{DisassemblyOptions, Instruction};
use std::fmt::Write;

/// Format a single instruction as assembly text
///
/// # Arguments
///
/// * `instr` - The instruction to format
///
/// # Returns
///
/// A string containing the formatted assembly instruction
pub fn format_instruction(instr: &Instruction) -> String {
    if instr.is_data() {
        return format!("DAT 0x{:04X}", instr.word);
    }

    let operands = instr
        .operands
        .iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!("{} {}", instr.mnemonic, operands)
}

/// Format a sequence of instructions as a listing, one line each
///
/// Each line is `AAAA: MNEMONIC OPERANDS`; with `show_words` the raw
/// instruction word is printed between the address and the mnemonic.
///
/// # Arguments
///
/// * `instructions` - Output of [`disassemble`](crate::disassembler::disassemble)
/// * `options` - The options the listing was produced with
pub fn format_listing(instructions: &[Instruction], options: DisassemblyOptions) -> String {
    let mut out = String::new();

    for instr in instructions {
        // Writing to a String cannot fail
        let _ = if options.show_words {
            writeln!(
                out,
                "{:04X}: {:04X}  {}",
                instr.address,
                instr.word,
                format_instruction(instr)
            )
        } else {
            writeln!(out, "{:04X}: {}", instr.address, format_instruction(instr))
        };
    }

    out
}
