//! # Register File
//!
//! The DCPU-16 has eight general-purpose registers (A, B, C, X, Y, Z, I, J), a
//! program counter, a stack pointer, the EX (extra/overflow) register, and the
//! interrupt address register IA.
//!
//! All registers are plain 16-bit words; writes wrap silently. Only the
//! arithmetic instructions give EX a meaning (carry, borrow, high word).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// General-purpose register names, in operand-encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Register {
    A = 0,
    B = 1,
    C = 2,
    X = 3,
    Y = 4,
    Z = 5,
    I = 6,
    J = 7,
}

impl Register {
    /// All registers in encoding order.
    pub const ALL: [Register; 8] = [
        Register::A,
        Register::B,
        Register::C,
        Register::X,
        Register::Y,
        Register::Z,
        Register::I,
        Register::J,
    ];

    /// Returns the register selected by the low three bits of `code`.
    pub fn from_code(code: u8) -> Register {
        Self::ALL[(code & 0x07) as usize]
    }

    /// Returns the assembler name of the register.
    pub fn name(self) -> &'static str {
        match self {
            Register::A => "A",
            Register::B => "B",
            Register::C => "C",
            Register::X => "X",
            Register::Y => "Y",
            Register::Z => "Z",
            Register::I => "I",
            Register::J => "J",
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The processor's register file.
///
/// At reset every register is zero. SP = 0 means the first `PUSH` lands at
/// 0xFFFF, since the stack grows downward and pushes decrement first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Registers {
    /// General-purpose registers, indexed by [`Register`]
    pub gp: [u16; 8],

    /// Program counter (address of next word to fetch)
    pub pc: u16,

    /// Stack pointer
    pub sp: u16,

    /// Extra/overflow register
    pub ex: u16,

    /// Interrupt handler address (0 = interrupts are discarded)
    pub ia: u16,
}

impl Registers {
    /// Returns the value of a general-purpose register.
    pub fn get(&self, reg: Register) -> u16 {
        self.gp[reg as usize]
    }

    /// Sets the value of a general-purpose register.
    pub fn set(&mut self, reg: Register, value: u16) {
        self.gp[reg as usize] = value;
    }

    /// All registers on a single line, for instruction traces.
    pub fn compact(&self) -> String {
        let mut line = String::with_capacity(80);
        for reg in Register::ALL {
            line.push_str(&format!("{}={:04X} ", reg, self.get(reg)));
        }
        line.push_str(&format!(
            "PC={:04X} SP={:04X} EX={:04X} IA={:04X}",
            self.pc, self.sp, self.ex, self.ia
        ));
        line
    }

    /// Pre-decrements SP and returns the new top-of-stack address.
    pub(crate) fn push_slot(&mut self) -> u16 {
        self.sp = self.sp.wrapping_sub(1);
        self.sp
    }

    /// Returns the current top-of-stack address and post-increments SP.
    pub(crate) fn pop_slot(&mut self) -> u16 {
        let addr = self.sp;
        self.sp = self.sp.wrapping_add(1);
        addr
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for pair in Register::ALL.chunks(2) {
            writeln!(
                f,
                "{}: 0x{:04X}   {}: 0x{:04X}",
                pair[0],
                self.get(pair[0]),
                pair[1],
                self.get(pair[1])
            )?;
        }
        write!(
            f,
            "PC: 0x{:04X}  SP: 0x{:04X}  EX: 0x{:04X}  IA: 0x{:04X}",
            self.pc, self.sp, self.ex, self.ia
        )
    }
}
