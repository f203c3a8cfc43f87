//! # Opcode Metadata Tables
//!
//! Two 32-entry tables are the single source of truth for instruction metadata:
//! one indexed by the basic opcode field (bits 0-4), one by the special opcode
//! field (bits 5-9 when the basic opcode is zero).
//!
//! Each entry includes:
//! - Mnemonic (instruction name)
//! - Base cycle cost (excluding extension-word and device penalties)
//! - The operation it dispatches to
//!
//! Reserved codes are `None`; decoding one is a fault, never a silent no-op.

/// Every operation the executor knows how to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // Basic (two operands)
    Set,
    Add,
    Sub,
    Mul,
    Mli,
    Div,
    Dvi,
    Mod,
    Mdi,
    And,
    Bor,
    Xor,
    Shr,
    Asr,
    Shl,
    Ifb,
    Ifc,
    Ife,
    Ifn,
    Ifg,
    Ifa,
    Ifl,
    Ifu,
    Adx,
    Sbx,
    Sti,
    Std,

    // Special (one operand)
    Jsr,
    Int,
    Iag,
    Ias,
    Rfi,
    Iaq,
    Hwn,
    Hwq,
    Hwi,
}

impl Op {
    /// Returns the value of the opcode field that selects this operation.
    ///
    /// For basic operations this is the low five bits of the instruction; for
    /// special operations it is the B field.
    pub fn code(self) -> u8 {
        match self {
            Op::Set => 0x01,
            Op::Add => 0x02,
            Op::Sub => 0x03,
            Op::Mul => 0x04,
            Op::Mli => 0x05,
            Op::Div => 0x06,
            Op::Dvi => 0x07,
            Op::Mod => 0x08,
            Op::Mdi => 0x09,
            Op::And => 0x0A,
            Op::Bor => 0x0B,
            Op::Xor => 0x0C,
            Op::Shr => 0x0D,
            Op::Asr => 0x0E,
            Op::Shl => 0x0F,
            Op::Ifb => 0x10,
            Op::Ifc => 0x11,
            Op::Ife => 0x12,
            Op::Ifn => 0x13,
            Op::Ifg => 0x14,
            Op::Ifa => 0x15,
            Op::Ifl => 0x16,
            Op::Ifu => 0x17,
            Op::Adx => 0x1A,
            Op::Sbx => 0x1B,
            Op::Sti => 0x1E,
            Op::Std => 0x1F,

            Op::Jsr => 0x01,
            Op::Int => 0x08,
            Op::Iag => 0x09,
            Op::Ias => 0x0A,
            Op::Rfi => 0x0B,
            Op::Iaq => 0x0C,
            Op::Hwn => 0x10,
            Op::Hwq => 0x11,
            Op::Hwi => 0x12,
        }
    }

    /// Returns true for single-operand (special) operations.
    pub fn is_special(self) -> bool {
        matches!(
            self,
            Op::Jsr | Op::Int | Op::Iag | Op::Ias | Op::Rfi | Op::Iaq | Op::Hwn | Op::Hwq | Op::Hwi
        )
    }

    /// Returns true for the IF* family, which chain when skipped.
    pub fn is_conditional(self) -> bool {
        matches!(
            self,
            Op::Ifb | Op::Ifc | Op::Ife | Op::Ifn | Op::Ifg | Op::Ifa | Op::Ifl | Op::Ifu
        )
    }
}

/// Metadata for a single opcode.
///
/// # Examples
///
/// ```
/// use libdcpu16::{Op, BASIC_OPCODE_TABLE};
///
/// let div = BASIC_OPCODE_TABLE[0x06].unwrap();
/// assert_eq!(div.mnemonic, "DIV");
/// assert_eq!(div.op, Op::Div);
/// assert_eq!(div.base_cycles, 3);
///
/// // 0x18 is reserved
/// assert!(BASIC_OPCODE_TABLE[0x18].is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeMetadata {
    /// Instruction mnemonic (e.g., "SET", "IFE", "HWI").
    pub mnemonic: &'static str,

    /// Base cycle cost, before extension words and device-reported cycles.
    pub base_cycles: u8,

    /// Operation dispatched by the executor.
    pub op: Op,
}

const fn entry(op: Op, mnemonic: &'static str, base_cycles: u8) -> Option<OpcodeMetadata> {
    Some(OpcodeMetadata {
        mnemonic,
        base_cycles,
        op,
    })
}

/// Basic opcode table, indexed by bits 0-4 of the instruction word.
///
/// Entry 0 is `None` because opcode 0 selects the special table.
pub const BASIC_OPCODE_TABLE: [Option<OpcodeMetadata>; 32] = [
    None, // 0x00: special instruction marker
    entry(Op::Set, "SET", 1),
    entry(Op::Add, "ADD", 2),
    entry(Op::Sub, "SUB", 2),
    entry(Op::Mul, "MUL", 2),
    entry(Op::Mli, "MLI", 2),
    entry(Op::Div, "DIV", 3),
    entry(Op::Dvi, "DVI", 3),
    entry(Op::Mod, "MOD", 3),
    entry(Op::Mdi, "MDI", 3),
    entry(Op::And, "AND", 1),
    entry(Op::Bor, "BOR", 1),
    entry(Op::Xor, "XOR", 1),
    entry(Op::Shr, "SHR", 1),
    entry(Op::Asr, "ASR", 1),
    entry(Op::Shl, "SHL", 1),
    entry(Op::Ifb, "IFB", 2),
    entry(Op::Ifc, "IFC", 2),
    entry(Op::Ife, "IFE", 2),
    entry(Op::Ifn, "IFN", 2),
    entry(Op::Ifg, "IFG", 2),
    entry(Op::Ifa, "IFA", 2),
    entry(Op::Ifl, "IFL", 2),
    entry(Op::Ifu, "IFU", 2),
    None, // 0x18
    None, // 0x19
    entry(Op::Adx, "ADX", 3),
    entry(Op::Sbx, "SBX", 3),
    None, // 0x1C
    None, // 0x1D
    entry(Op::Sti, "STI", 2),
    entry(Op::Std, "STD", 2),
];

/// Special opcode table, indexed by the B field of a word whose opcode is 0.
pub const SPECIAL_OPCODE_TABLE: [Option<OpcodeMetadata>; 32] = [
    None, // 0x00
    entry(Op::Jsr, "JSR", 3),
    None,
    None,
    None,
    None,
    None,
    None,
    entry(Op::Int, "INT", 4),
    entry(Op::Iag, "IAG", 1),
    entry(Op::Ias, "IAS", 1),
    entry(Op::Rfi, "RFI", 3),
    entry(Op::Iaq, "IAQ", 2),
    None,
    None,
    None,
    entry(Op::Hwn, "HWN", 2),
    entry(Op::Hwq, "HWQ", 4),
    entry(Op::Hwi, "HWI", 4),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

/// Fields of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionWord {
    /// Bits 0-4
    pub opcode: u8,
    /// Bits 5-9
    pub b: u8,
    /// Bits 10-15
    pub a: u8,
}

impl InstructionWord {
    /// Splits a word into its opcode and operand fields.
    pub fn split(word: u16) -> Self {
        Self {
            opcode: (word & 0x1F) as u8,
            b: ((word >> 5) & 0x1F) as u8,
            a: ((word >> 10) & 0x3F) as u8,
        }
    }

    /// Returns true if the word encodes a special (single-operand) instruction.
    pub fn is_special(&self) -> bool {
        self.opcode == 0
    }

    /// Looks up the metadata of the encoded operation, if it is defined.
    pub fn metadata(&self) -> Option<&'static OpcodeMetadata> {
        if self.is_special() {
            SPECIAL_OPCODE_TABLE[self.b as usize].as_ref()
        } else {
            BASIC_OPCODE_TABLE[self.opcode as usize].as_ref()
        }
    }
}

/// Encodes a basic instruction word.
///
/// # Examples
///
/// ```
/// use libdcpu16::{encode_basic, Op, Register};
/// use libdcpu16::addressing::{register, LITERAL_NEXT};
///
/// // SET A, 0x30 (literal in the following word)
/// assert_eq!(encode_basic(Op::Set, register(Register::A), LITERAL_NEXT), 0x7C01);
/// ```
pub fn encode_basic(op: Op, b: u8, a: u8) -> u16 {
    (op.code() as u16 & 0x1F) | ((b as u16 & 0x1F) << 5) | ((a as u16 & 0x3F) << 10)
}

/// Encodes a special instruction word.
///
/// # Examples
///
/// ```
/// use libdcpu16::{encode_special, Op};
/// use libdcpu16::addressing::LITERAL_NEXT;
///
/// // JSR 0x1000 (target in the following word)
/// assert_eq!(encode_special(Op::Jsr, LITERAL_NEXT), 0x7C20);
/// ```
pub fn encode_special(op: Op, a: u8) -> u16 {
    ((op.code() as u16 & 0x1F) << 5) | ((a as u16 & 0x3F) << 10)
}
