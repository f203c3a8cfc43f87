//! # Addressing Modes
//!
//! Every DCPU-16 operand field selects one of the addressing modes below. Operand
//! B is a 5-bit field, operand A a 6-bit field; only A can encode the packed
//! inline literals (0x20-0x3F).
//!
//! Decoding an operand may consume one extension word following the instruction
//! (`[reg + next]`, `PICK n`, `[next]`, `next`). Stack side effects (`PUSH` /
//! `POP`) are *not* applied here: they belong to operand resolution in the
//! executor, so a skipped instruction can be decoded without touching SP.

use crate::registers::Register;

/// Operand code for `PUSH` (in B) / `POP` (in A).
pub const PUSH_POP: u8 = 0x18;
/// Operand code for `PEEK` (`[SP]`).
pub const PEEK: u8 = 0x19;
/// Operand code for `PICK n` (`[SP + next word]`).
pub const PICK: u8 = 0x1A;
/// Operand code for the stack pointer.
pub const SP: u8 = 0x1B;
/// Operand code for the program counter.
pub const PC: u8 = 0x1C;
/// Operand code for the EX register.
pub const EX: u8 = 0x1D;
/// Operand code for `[next word]`.
pub const INDIRECT_NEXT: u8 = 0x1E;
/// Operand code for a literal in the next word.
pub const LITERAL_NEXT: u8 = 0x1F;

/// Operand code for a register.
pub const fn register(reg: Register) -> u8 {
    reg as u8
}

/// Operand code for `[register]`.
pub const fn register_indirect(reg: Register) -> u8 {
    0x08 | reg as u8
}

/// Operand code for `[register + next word]`.
pub const fn register_offset(reg: Register) -> u8 {
    0x10 | reg as u8
}

/// Operand code for a packed inline literal, if `value` fits the -1..=30 range.
///
/// Inline literals are only valid in operand A.
///
/// # Examples
///
/// ```
/// use libdcpu16::addressing::inline_literal;
///
/// assert_eq!(inline_literal(0xFFFF), Some(0x20)); // -1
/// assert_eq!(inline_literal(0), Some(0x21));
/// assert_eq!(inline_literal(30), Some(0x3F));
/// assert_eq!(inline_literal(31), None);
/// ```
pub const fn inline_literal(value: u16) -> Option<u8> {
    let shifted = value.wrapping_add(1);
    if shifted <= 0x1F {
        Some(0x20 | shifted as u8)
    } else {
        None
    }
}

/// Which operand slot of an instruction a field occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Destination slot (bits 5-9)
    B,
    /// Source slot (bits 10-15)
    A,
}

/// A decoded operand field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// A general-purpose register.
    ///
    /// Example: `SET A, 1`
    Register(Register),

    /// Memory at the address held in a register.
    ///
    /// Example: `SET [B], 1`
    RegisterIndirect(Register),

    /// Memory at register + extension word.
    ///
    /// Example: `SET [I+0x1000], 1`
    RegisterOffset(Register, u16),

    /// `[--SP]`, only produced for operand B.
    Push,

    /// `[SP++]`, only produced for operand A.
    Pop,

    /// `[SP]`, no SP adjustment.
    Peek,

    /// `[SP + extension word]`.
    Pick(u16),

    /// The stack pointer itself.
    StackPointer,

    /// The program counter itself.
    ProgramCounter,

    /// The EX register.
    Extra,

    /// Memory at the address in the extension word.
    ///
    /// Example: `SET [0x8000], 1`
    Indirect(u16),

    /// Literal held in the extension word. Writes are ignored.
    Literal(u16),

    /// Literal packed into the operand field (-1..=30). Writes are ignored.
    Inline(u16),
}

impl Operand {
    /// Decodes an operand field.
    ///
    /// `next_word` is called at most once, for modes that take an extension
    /// word. Codes 0x20-0x3F in operand B are not representable (the field is
    /// only five bits wide); they are masked like the hardware does.
    pub fn decode<F>(code: u8, position: Position, mut next_word: F) -> Operand
    where
        F: FnMut() -> u16,
    {
        let code = match position {
            Position::B => code & 0x1F,
            Position::A => code & 0x3F,
        };

        match code {
            0x00..=0x07 => Operand::Register(Register::from_code(code)),
            0x08..=0x0F => Operand::RegisterIndirect(Register::from_code(code)),
            0x10..=0x17 => Operand::RegisterOffset(Register::from_code(code), next_word()),
            PUSH_POP => match position {
                Position::B => Operand::Push,
                Position::A => Operand::Pop,
            },
            PEEK => Operand::Peek,
            PICK => Operand::Pick(next_word()),
            SP => Operand::StackPointer,
            PC => Operand::ProgramCounter,
            EX => Operand::Extra,
            INDIRECT_NEXT => Operand::Indirect(next_word()),
            LITERAL_NEXT => Operand::Literal(next_word()),
            _ => Operand::Inline(((code & 0x1F) as u16).wrapping_sub(1)),
        }
    }

    /// Number of extension words this operand consumed (0 or 1).
    pub fn extension_words(&self) -> u8 {
        match self {
            Operand::RegisterOffset(..)
            | Operand::Pick(_)
            | Operand::Indirect(_)
            | Operand::Literal(_) => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::RegisterIndirect(reg) => write!(f, "[{}]", reg),
            Operand::RegisterOffset(reg, offset) => write!(f, "[{}+0x{:04X}]", reg, offset),
            Operand::Push => f.write_str("PUSH"),
            Operand::Pop => f.write_str("POP"),
            Operand::Peek => f.write_str("PEEK"),
            Operand::Pick(n) => write!(f, "PICK 0x{:04X}", n),
            Operand::StackPointer => f.write_str("SP"),
            Operand::ProgramCounter => f.write_str("PC"),
            Operand::Extra => f.write_str("EX"),
            Operand::Indirect(addr) => write!(f, "[0x{:04X}]", addr),
            Operand::Literal(value) | Operand::Inline(value) => write!(f, "0x{:04X}", value),
        }
    }
}
