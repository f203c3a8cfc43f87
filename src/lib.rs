//! # DCPU-16 Emulator Core
//!
//! A word-addressed DCPU-16 emulator with an interrupt-driven device bus,
//! designed for modularity, clarity, and WebAssembly portability.
//!
//! This crate provides the processor (registers, 64K words of memory, the
//! fetch-decode-execute loop), a bounded interrupt queue shared with devices,
//! and three stock devices: a generic keyboard, an LEM1802 display and a
//! generic clock.
//!
//! ## Quick Start
//!
//! ```rust
//! use libdcpu16::{Register, CPU};
//!
//! // SET A, 0x30
//! // SET [0x1000], 0x20
//! // SUB A, [0x1000]
//! let program = [0x7C01, 0x0030, 0x7FC1, 0x1000, 0x0020, 0x7803, 0x1000];
//!
//! let mut cpu = CPU::new();
//! cpu.load_program(&program, 0x0000);
//!
//! for _ in 0..3 {
//!     cpu.step().unwrap();
//! }
//!
//! assert_eq!(cpu.register(Register::A), 0x10);
//! assert_eq!(cpu.memory().read(0x1000), 0x20);
//! ```
//!
//! ## Architecture
//!
//! - **Ownership**: the CPU owns memory and registers; devices get a
//!   [`DeviceContext`] for the duration of one `HWI` and nothing else
//! - **Concurrency**: devices with their own schedule (the clock's ticker, a
//!   host feeding keystrokes) communicate with the CPU only by raising
//!   interrupt messages into a bounded, thread-safe queue
//! - **Determinism**: given the same program and the same interrupt arrivals,
//!   execution is bit-for-bit reproducible
//! - **Table-Driven Design**: all opcode metadata in a single source of truth
//!
//! ## Modules
//!
//! - `cpu` - CPU state and execution logic
//! - `memory` - 64K-word main memory
//! - `registers` - register file
//! - `opcodes` - opcode metadata tables and encoders
//! - `addressing` - operand field decoding
//! - `devices` - device bus, interrupt queue and stock devices
//! - `disassembler` - machine words to assembly text
//! - `config` - emulator configuration

pub mod addressing;
pub mod config;
pub mod cpu;
pub mod devices;
pub mod disassembler;
pub mod memory;
pub mod opcodes;
pub mod registers;

// Internal instruction implementations (not part of public API)
mod instructions;

// WebAssembly bindings (optional)
pub mod wasm;

// Re-export public API
pub use addressing::{Operand, Position};
pub use config::{DeviceErrorPolicy, EmulatorConfig};
pub use cpu::{CpuState, Fault, Halt, StopHandle, CPU};
pub use devices::{
    Cell, Device, DeviceBus, DeviceContext, DeviceError, DeviceInfo, Frame, GenericClock,
    GenericKeyboard, Interrupt, InterruptController, InterruptError, InterruptLine,
    InterruptSource, KeyboardHandle, Lem1802,
};
pub use disassembler::{disassemble, format_instruction, DisassemblyOptions, Instruction};
pub use memory::Memory;
pub use opcodes::{
    encode_basic, encode_special, InstructionWord, Op, OpcodeMetadata, BASIC_OPCODE_TABLE,
    SPECIAL_OPCODE_TABLE,
};
pub use registers::{Register, Registers};

use thiserror::Error;

/// Errors that stop the CPU.
///
/// Returned wrapped in a [`Fault`] that also carries the processor state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The basic opcode field holds a reserved value.
    #[error("invalid opcode 0x{opcode:02X} in word 0x{word:04X}")]
    InvalidOpcode {
        /// Offending instruction word
        word: u16,
        /// The opcode field (bits 0-4)
        opcode: u8,
    },

    /// The special opcode field holds a reserved value.
    #[error("invalid special opcode 0x{opcode:02X} in word 0x{word:04X}")]
    InvalidSpecialOpcode {
        /// Offending instruction word
        word: u16,
        /// The special opcode field (bits 5-9)
        opcode: u8,
    },

    /// `HWQ` or `HWI` named a bus index with no device behind it.
    #[error("no hardware device at index {0}")]
    InvalidHardwareIndex(u16),

    /// A device rejected an `HWI` and the policy is to abort.
    #[error("device {index} failed")]
    Device {
        /// Bus index of the device
        index: u16,
        /// What the device reported
        #[source]
        source: DeviceError,
    },

    /// `INT` raised a message into a full interrupt queue.
    #[error("interrupt queue overflow raising 0x{0:04X}")]
    InterruptQueueOverflow(u16),
}
