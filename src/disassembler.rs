//! DCPU-16 Disassembler Module
//!
//! Converts machine words back into assembly text. The CPU uses it for its
//! instruction trace; hosts use it for debuggers and listings.

pub mod decoder;
pub mod formatter;

pub use decoder::decode_instruction;
pub use formatter::{format_instruction, format_listing};

use crate::addressing::Operand;

/// A single disassembled instruction with full metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Memory address of the instruction word
    pub address: u16,

    /// The instruction word itself
    pub word: u16,

    /// Instruction mnemonic (e.g., "SET", "IFE", "HWI"), or "DAT" for a word
    /// that does not decode
    pub mnemonic: &'static str,

    /// Decoded operands in encoding order: B then A for basic instructions,
    /// just A for special ones
    pub operands: Vec<Operand>,

    /// Total size in words (1-3: instruction word + extension words)
    pub size_words: u8,

    /// Base cycle cost (excluding extension-word and device penalties)
    pub base_cycles: u8,
}

impl Instruction {
    /// Builds the `DAT` pseudo-instruction used for words that do not decode.
    pub(crate) fn data(address: u16, word: u16) -> Self {
        Self {
            address,
            word,
            mnemonic: "DAT",
            operands: Vec::new(),
            size_words: 1,
            base_cycles: 0,
        }
    }

    /// Returns true if this is a `DAT` placeholder rather than an instruction.
    pub fn is_data(&self) -> bool {
        self.mnemonic == "DAT"
    }
}

/// Options controlling disassembly output
#[derive(Debug, Clone, Copy, Default)]
pub struct DisassemblyOptions {
    /// Address of the first word (affects address display and nothing else)
    pub start_address: u16,

    /// Whether listings include the raw instruction words
    pub show_words: bool,
}

/// Disassemble a word slice into a vector of instructions
///
/// Words that do not decode (reserved opcodes, truncated extension words)
/// become single-word `DAT` entries so the listing stays aligned.
///
/// # Arguments
///
/// * `words` - The machine code to disassemble
/// * `options` - Disassembly options
///
/// # Returns
///
/// A vector of `Instruction` structs, one for each decoded instruction
///
/// # Examples
///
/// ```
/// use libdcpu16::disassembler::{disassemble, format_instruction, DisassemblyOptions};
///
/// // SET A, 0x30 / SUB PC, 1
/// let program = [0x7C01, 0x0030, 0x8B83];
/// let listing = disassemble(&program, DisassemblyOptions::default());
///
/// assert_eq!(listing.len(), 2);
/// assert_eq!(format_instruction(&listing[0]), "SET A, 0x0030");
/// assert_eq!(format_instruction(&listing[1]), "SUB PC, 0x0001");
/// assert_eq!(listing[1].address, 0x0002);
/// ```
pub fn disassemble(words: &[u16], options: DisassemblyOptions) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut offset = 0;
    let mut address = options.start_address;

    while offset < words.len() {
        let instr = decode_instruction(&words[offset..], address)
            .unwrap_or_else(|| Instruction::data(address, words[offset]));
        offset += instr.size_words as usize;
        address = address.wrapping_add(instr.size_words as u16);
        instructions.push(instr);
    }

    instructions
}
