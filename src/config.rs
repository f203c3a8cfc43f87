//! # Emulator Configuration
//!
//! Knobs that change how the core reacts to unusual situations rather than
//! what the instruction set means. Everything defaults to the behaviour of
//! the stock DCPU-16: a 256-message interrupt queue, device errors abort
//! execution, no crash-loop detection, no instruction tracing.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::devices::interrupts::DEFAULT_QUEUE_CAPACITY;

/// What `HWI` does when a device rejects a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DeviceErrorPolicy {
    /// Stop with [`ExecutionError::Device`](crate::ExecutionError::Device).
    #[default]
    Abort,
    /// Log a warning and continue as if the device returned 0 cycles.
    Ignore,
}

/// Construction-time settings for a [`CPU`](crate::CPU).
///
/// # Examples
///
/// ```
/// use libdcpu16::{DeviceErrorPolicy, EmulatorConfig, CPU};
///
/// let config = EmulatorConfig {
///     device_errors: DeviceErrorPolicy::Ignore,
///     halt_on_crash_loop: true,
///     ..EmulatorConfig::default()
/// };
///
/// let cpu = CPU::with_config(config);
/// assert_eq!(cpu.config().interrupt_queue_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EmulatorConfig {
    /// Maximum number of pending interrupt messages.
    pub interrupt_queue_capacity: usize,

    /// Reaction to device errors raised during `HWI`.
    pub device_errors: DeviceErrorPolicy,

    /// Make [`CPU::run`](crate::CPU::run) return when an instruction leaves PC
    /// pointing at itself (the `SUB PC, 1` idiom).
    pub halt_on_crash_loop: bool,

    /// Emit a `trace!` record with the disassembly of every executed instruction.
    pub trace_instructions: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            interrupt_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            device_errors: DeviceErrorPolicy::Abort,
            halt_on_crash_loop: false,
            trace_instructions: false,
        }
    }
}
