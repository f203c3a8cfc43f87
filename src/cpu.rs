//! # CPU State and Execution
//!
//! This module contains the CPU struct representing the DCPU-16 processor state
//! and the fetch-decode-execute loop.
//!
//! ## CPU State
//!
//! The CPU maintains:
//! - **Registers**: A, B, C, X, Y, Z, I, J plus PC, SP, EX and IA
//! - **Memory**: 65536 words, owned exclusively by the CPU
//! - **Interrupt queue**: bounded FIFO shared with devices
//! - **Device bus**: attachment-ordered list of hardware
//! - **Skip flag**: set by a failed IF*, consumed by the next fetch
//! - **Cycle counter**: u64 monotonically increasing cycle count
//!
//! ## Execution Model
//!
//! Each [`CPU::step`] runs one instruction through these phases:
//!
//! 1. **Fetch**: read the word at PC, advance PC, remember it as last PC
//! 2. **Decode**: split opcode / B / A; reserved opcodes fault
//! 3. **Resolve**: operand B, then operand A, consuming extension words and
//!    applying PUSH/POP to SP in that order
//! 4. **Execute**: apply the operation, charge its cycles
//! 5. **Interrupt check**: deliver at most one queued message
//!
//! A skipped instruction stops after decoding: its extension words are
//! consumed, nothing else happens, and no interrupt is delivered behind it.
//!
//! Hosts drive the CPU with [`CPU::step`], [`CPU::run`] or
//! [`CPU::run_for_cycles`]; another thread can end `run` through a
//! [`StopHandle`].

use crate::addressing::{Operand, Position};
use crate::config::EmulatorConfig;
use crate::devices::{
    Device, DeviceBus, DeviceError, InterruptController, InterruptError, InterruptLine,
    InterruptSource,
};
use crate::disassembler::{decode_instruction, format_instruction};
use crate::instructions;
use crate::memory::Memory;
use crate::opcodes::InstructionWord;
use crate::registers::{Register, Registers};
use crate::ExecutionError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a resolved operand reads from and writes to.
///
/// Resolution has already applied every side effect (extension words, SP
/// adjustment), so loading or storing a location is pure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Register(Register),
    Memory(u16),
    StackPointer,
    ProgramCounter,
    Extra,
    /// Read-only; stores are silently dropped
    Literal(u16),
}

/// Point-in-time copy of the processor state.
///
/// Returned by [`CPU::snapshot`] and attached to every [`Fault`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CpuState {
    /// Register file, including PC, SP, EX and IA
    pub registers: Registers,
    /// Whether queued interrupts may be delivered
    pub interrupts_enabled: bool,
    /// Whether the next instruction will be skipped
    pub skipping: bool,
    /// Total cycles executed
    pub cycles: u64,
    /// Address of the most recently fetched instruction
    pub last_pc: u16,
    /// Interrupt messages waiting for delivery
    pub pending_interrupts: usize,
}

/// An execution error together with the state it left the CPU in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at 0x{:04X}", .error, .state.last_pc)]
pub struct Fault {
    /// What went wrong
    #[source]
    pub error: ExecutionError,
    /// Processor state when the fault was raised
    pub state: CpuState,
}

/// Why [`CPU::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// A [`StopHandle`] requested a stop.
    Stopped,
    /// An instruction left PC pointing at itself (only with
    /// [`EmulatorConfig::halt_on_crash_loop`]).
    CrashLoop {
        /// Address of the looping instruction
        pc: u16,
    },
}

/// Cloneable, thread-safe request to stop a running CPU.
///
/// The request is observed before the next fetch, so the current instruction
/// always completes.
#[derive(Debug, Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Asks the CPU to stop before its next instruction.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Returns true while a stop request is outstanding.
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// DCPU-16 CPU state and execution context.
///
/// The CPU owns its memory, registers, interrupt queue and device bus. Devices
/// see processor state only inside an `HWI`, through a
/// [`DeviceContext`](crate::DeviceContext).
///
/// # Examples
///
/// ```
/// use libdcpu16::{Register, CPU};
///
/// // SET A, 0x30 / ADD A, 2
/// let mut cpu = CPU::new();
/// cpu.load_program(&[0x7C01, 0x0030, 0x8C02], 0x0000);
///
/// cpu.step().unwrap();
/// cpu.step().unwrap();
///
/// assert_eq!(cpu.register(Register::A), 0x32);
/// assert_eq!(cpu.pc(), 0x0003);
/// assert_eq!(cpu.cycles(), 4); // SET 1 + 1 extension word, ADD 2
/// ```
pub struct CPU {
    /// Register file
    pub(crate) registers: Registers,

    /// Main memory
    pub(crate) memory: Memory,

    /// Pending interrupt messages
    pub(crate) interrupts: InterruptController,

    /// Attached hardware
    pub(crate) bus: DeviceBus,

    /// Construction-time settings
    pub(crate) config: EmulatorConfig,

    /// Set by a failed IF*; the next instruction is skipped
    pub(crate) skipping: bool,

    /// Cleared while an interrupt handler runs or by `IAQ 1`
    pub(crate) interrupts_enabled: bool,

    /// Total CPU cycles executed
    pub(crate) cycles: u64,

    /// Address of the most recently fetched instruction
    pub(crate) last_pc: u16,

    /// The last step ended by entering an interrupt handler
    entered_handler: bool,

    /// Shared with every StopHandle
    stop: Arc<AtomicBool>,
}

impl CPU {
    /// Creates a CPU with default configuration.
    ///
    /// Memory and registers are zeroed, the interrupt queue is empty and
    /// interrupt delivery is enabled.
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Creates a CPU with the given configuration.
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            registers: Registers::default(),
            memory: Memory::new(),
            interrupts: InterruptController::new(config.interrupt_queue_capacity),
            bus: DeviceBus::new(),
            config,
            skipping: false,
            interrupts_enabled: true,
            cycles: 0,
            last_pc: 0,
            entered_handler: false,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resets the processor.
    ///
    /// Registers, the skip flag, the cycle counter and the interrupt queue are
    /// cleared and delivery is re-enabled. Memory and attached devices are
    /// left alone.
    pub fn reset(&mut self) {
        self.registers = Registers::default();
        self.skipping = false;
        self.interrupts_enabled = true;
        self.cycles = 0;
        self.last_pc = 0;
        self.entered_handler = false;
        self.interrupts.clear();
    }

    /// Copies a program into memory at `offset` and points PC at it.
    ///
    /// # Arguments
    ///
    /// * `words` - Program image; copying wraps past 0xFFFF
    /// * `offset` - Load address and new PC
    pub fn load_program(&mut self, words: &[u16], offset: u16) {
        self.memory.load(offset, words);
        self.registers.pc = offset;
    }

    // ========== Devices ==========

    /// Attaches a device and returns its bus index.
    ///
    /// Indices are assigned in attachment order. The device receives its
    /// interrupt line immediately, and is started if devices are running.
    pub fn attach(&mut self, device: Box<dyn Device>) -> Result<u16, DeviceError> {
        let index = self.bus.attach(device, &self.interrupts)?;
        log::debug!(
            "attached device {} (id 0x{:08X})",
            index,
            self.bus.info(index).map_or(0, |info| info.id)
        );
        Ok(index)
    }

    /// Number of attached devices (what `HWN` reports).
    pub fn device_count(&self) -> u16 {
        self.bus.len()
    }

    /// Returns the device at `index` downcast to `T`.
    pub fn device<T: Device + 'static>(&self, index: u16) -> Option<&T> {
        self.bus.device::<T>(index)
    }

    /// Returns the device at `index` mutably downcast to `T`.
    pub fn device_mut<T: Device + 'static>(&mut self, index: u16) -> Option<&mut T> {
        self.bus.device_mut::<T>(index)
    }

    /// Read-only access to the device bus.
    pub fn bus(&self) -> &DeviceBus {
        &self.bus
    }

    /// Starts every device's background loop.
    pub fn start_devices(&mut self) {
        self.bus.start_all();
    }

    /// Stops and joins every device's background loop.
    pub fn stop_devices(&mut self) {
        self.bus.stop_all();
    }

    // ========== Interrupts ==========

    /// Queues an interrupt message from the host.
    pub fn raise_interrupt(&self, message: u16) -> Result<(), InterruptError> {
        self.interrupts.raise(message, InterruptSource::Host)
    }

    /// Returns a cloneable handle the host can raise interrupts through
    /// from any thread.
    pub fn host_line(&self) -> InterruptLine {
        self.interrupts.host_line()
    }

    /// The interrupt queue.
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Returns true if queued interrupts may be delivered.
    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    // ========== Run control ==========

    /// Returns a handle that stops [`run`](Self::run) from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop),
        }
    }

    /// Executes one instruction.
    ///
    /// # Returns
    ///
    /// * `Ok(cycles)` - cycles charged for the instruction (1 if it was skipped)
    /// * `Err(Fault)` - the instruction could not execute; PC points past it
    pub fn step(&mut self) -> Result<u64, Fault> {
        self.execute_next().map_err(|error| self.fault(error))
    }

    /// Runs until stopped.
    ///
    /// Returns [`Halt::Stopped`] once a [`StopHandle`] asks for it (the
    /// request is consumed), or [`Halt::CrashLoop`] when crash-loop detection
    /// is enabled and an instruction jumps to itself.
    pub fn run(&mut self) -> Result<Halt, Fault> {
        loop {
            if self.stop.swap(false, Ordering::AcqRel) {
                return Ok(Halt::Stopped);
            }

            self.step()?;

            if self.config.halt_on_crash_loop && self.is_crash_looping() {
                log::debug!("crash loop at 0x{:04X}", self.last_pc);
                return Ok(Halt::CrashLoop { pc: self.last_pc });
            }
        }
    }

    /// Runs until at least `budget` cycles have been spent, or a stop is
    /// requested.
    ///
    /// # Returns
    ///
    /// The number of cycles actually executed, which may exceed `budget` by
    /// the cost of the final instruction.
    pub fn run_for_cycles(&mut self, budget: u64) -> Result<u64, Fault> {
        let mut spent = 0;
        while spent < budget {
            if self.stop.swap(false, Ordering::AcqRel) {
                break;
            }
            spent += self.step()?;
        }
        Ok(spent)
    }

    /// PC only counts as stuck if the instruction itself left it there;
    /// delivery can land on the address that was just executed.
    fn is_crash_looping(&self) -> bool {
        !self.skipping && !self.entered_handler && self.registers.pc == self.last_pc
    }

    fn fault(&self, error: ExecutionError) -> Fault {
        log::debug!("fault at 0x{:04X}: {}", self.last_pc, error);
        Fault {
            error,
            state: self.snapshot(),
        }
    }

    // ========== Fetch / decode / execute ==========

    pub(crate) fn next_word(&mut self) -> u16 {
        let word = self.memory.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        word
    }

    fn execute_next(&mut self) -> Result<u64, ExecutionError> {
        let pc = self.registers.pc;
        self.last_pc = pc;
        self.entered_handler = false;

        if self.config.trace_instructions && log::log_enabled!(log::Level::Trace) {
            self.trace(pc);
        }

        let word = self.next_word();
        let fields = InstructionWord::split(word);

        if self.skipping {
            return Ok(self.skip(fields));
        }

        let metadata = fields.metadata().ok_or(if fields.is_special() {
            ExecutionError::InvalidSpecialOpcode {
                word,
                opcode: fields.b,
            }
        } else {
            ExecutionError::InvalidOpcode {
                word,
                opcode: fields.opcode,
            }
        })?;

        let mut cycles = metadata.base_cycles as u64;
        if fields.is_special() {
            let (a, a_cycles) = self.resolve(fields.a, Position::A);
            cycles += a_cycles;
            cycles += instructions::execute_special(self, metadata.op, a)?;
        } else {
            let (b, b_cycles) = self.resolve(fields.b, Position::B);
            let (a, a_cycles) = self.resolve(fields.a, Position::A);
            cycles += b_cycles + a_cycles;
            instructions::execute_basic(self, metadata.op, b, a);
        }
        self.cycles += cycles;

        if !self.skipping {
            self.entered_handler = self.deliver_interrupt();
        }

        Ok(cycles)
    }

    /// Consumes a skipped instruction's extension words without resolving
    /// its operands.
    fn skip(&mut self, fields: InstructionWord) -> u64 {
        if !fields.is_special() {
            Operand::decode(fields.b, Position::B, || self.next_word());
        }
        Operand::decode(fields.a, Position::A, || self.next_word());

        // Reserved words are skipped like any other
        self.skipping = fields
            .metadata()
            .map_or(false, |metadata| metadata.op.is_conditional());
        self.cycles += 1;
        1
    }

    fn trace(&self, pc: u16) {
        let words = self.memory.read_range(pc, 3);
        let text = decode_instruction(&words, pc)
            .map(|instr| format_instruction(&instr))
            .unwrap_or_else(|| format!("DAT 0x{:04X}", words[0]));
        log::trace!(
            "{:04X}: {:<24} {}{}",
            pc,
            text,
            if self.skipping { "(skip) " } else { "" },
            self.registers.compact()
        );
    }

    // ========== Operand resolution ==========

    /// Resolves an operand field into a location, applying its side effects.
    ///
    /// # Returns
    ///
    /// The location and the extra cycles the operand costs (one per
    /// extension word).
    pub(crate) fn resolve(&mut self, code: u8, position: Position) -> (Location, u64) {
        let operand = Operand::decode(code, position, || self.next_word());
        let regs = &mut self.registers;

        let location = match operand {
            Operand::Register(reg) => Location::Register(reg),
            Operand::RegisterIndirect(reg) => Location::Memory(regs.get(reg)),
            Operand::RegisterOffset(reg, offset) => {
                Location::Memory(regs.get(reg).wrapping_add(offset))
            }
            Operand::Push => Location::Memory(regs.push_slot()),
            Operand::Pop => Location::Memory(regs.pop_slot()),
            Operand::Peek => Location::Memory(regs.sp),
            Operand::Pick(offset) => Location::Memory(regs.sp.wrapping_add(offset)),
            Operand::StackPointer => Location::StackPointer,
            Operand::ProgramCounter => Location::ProgramCounter,
            Operand::Extra => Location::Extra,
            Operand::Indirect(addr) => Location::Memory(addr),
            Operand::Literal(value) | Operand::Inline(value) => Location::Literal(value),
        };

        (location, operand.extension_words() as u64)
    }

    pub(crate) fn load(&self, location: Location) -> u16 {
        match location {
            Location::Register(reg) => self.registers.get(reg),
            Location::Memory(addr) => self.memory.read(addr),
            Location::StackPointer => self.registers.sp,
            Location::ProgramCounter => self.registers.pc,
            Location::Extra => self.registers.ex,
            Location::Literal(value) => value,
        }
    }

    pub(crate) fn store(&mut self, location: Location, value: u16) {
        match location {
            Location::Register(reg) => self.registers.set(reg, value),
            Location::Memory(addr) => self.memory.write(addr, value),
            Location::StackPointer => self.registers.sp = value,
            Location::ProgramCounter => self.registers.pc = value,
            Location::Extra => self.registers.ex = value,
            Location::Literal(_) => {}
        }
    }

    pub(crate) fn push(&mut self, value: u16) {
        let addr = self.registers.push_slot();
        self.memory.write(addr, value);
    }

    pub(crate) fn pop(&mut self) -> u16 {
        let addr = self.registers.pop_slot();
        self.memory.read(addr)
    }

    // ========== Interrupt delivery ==========

    /// Returns true if PC moved to the handler.
    fn deliver_interrupt(&mut self) -> bool {
        if !self.interrupts_enabled {
            return false;
        }
        let interrupt = match self.interrupts.poll() {
            Some(interrupt) => interrupt,
            None => return false,
        };

        if self.registers.ia == 0 {
            log::debug!(
                "discarded interrupt 0x{:04X} from {:?}: IA is 0",
                interrupt.message,
                interrupt.source
            );
            return false;
        }

        log::debug!(
            "delivering interrupt 0x{:04X} from {:?} to 0x{:04X}",
            interrupt.message,
            interrupt.source,
            self.registers.ia
        );

        self.interrupts_enabled = false;
        self.push(self.registers.pc);
        self.push(self.registers.ex);
        self.registers.ex = 0;
        self.registers.pc = self.registers.ia;
        self.registers.set(Register::A, interrupt.message);
        true
    }

    // ========== Inspection ==========

    /// Captures the current processor state.
    pub fn snapshot(&self) -> CpuState {
        CpuState {
            registers: self.registers,
            interrupts_enabled: self.interrupts_enabled,
            skipping: self.skipping,
            cycles: self.cycles,
            last_pc: self.last_pc,
            pending_interrupts: self.interrupts.len(),
        }
    }

    /// The construction-time configuration.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// The register file.
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Mutable access to the register file.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    /// Returns the value of a general-purpose register.
    pub fn register(&self, reg: Register) -> u16 {
        self.registers.get(reg)
    }

    /// Sets the value of a general-purpose register.
    pub fn set_register(&mut self, reg: Register, value: u16) {
        self.registers.set(reg, value);
    }

    /// Returns the program counter.
    pub fn pc(&self) -> u16 {
        self.registers.pc
    }

    /// Sets the program counter.
    pub fn set_pc(&mut self, value: u16) {
        self.registers.pc = value;
    }

    /// Returns the stack pointer.
    pub fn sp(&self) -> u16 {
        self.registers.sp
    }

    /// Sets the stack pointer.
    pub fn set_sp(&mut self, value: u16) {
        self.registers.sp = value;
    }

    /// Returns the EX register.
    pub fn ex(&self) -> u16 {
        self.registers.ex
    }

    /// Sets the EX register.
    pub fn set_ex(&mut self, value: u16) {
        self.registers.ex = value;
    }

    /// Returns the interrupt handler address.
    pub fn ia(&self) -> u16 {
        self.registers.ia
    }

    /// Sets the interrupt handler address.
    pub fn set_ia(&mut self, value: u16) {
        self.registers.ia = value;
    }

    /// Returns the total number of cycles executed.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Address of the most recently fetched instruction.
    pub fn last_pc(&self) -> u16 {
        self.last_pc
    }

    /// Returns true if the next instruction will be skipped.
    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Main memory.
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Mutable access to main memory.
    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    /// Reads `len` words starting at `addr`, wrapping past 0xFFFF.
    pub fn read_memory(&self, addr: u16, len: usize) -> Vec<u16> {
        self.memory.read_range(addr, len)
    }

    /// Writes `words` starting at `addr`, wrapping past 0xFFFF.
    pub fn write_memory(&mut self, addr: u16, words: &[u16]) {
        self.memory.load(addr, words);
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CPU {
    fn drop(&mut self) {
        self.bus.stop_all();
    }
}

impl std::fmt::Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("registers", &self.registers)
            .field("interrupts_enabled", &self.interrupts_enabled)
            .field("skipping", &self.skipping)
            .field("cycles", &self.cycles)
            .field("interrupts", &self.interrupts)
            .field("bus", &self.bus)
            .finish()
    }
}
