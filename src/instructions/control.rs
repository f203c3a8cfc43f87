//! # Control Flow Instructions
//!
//! This module implements subroutine and interrupt control:
//! - JSR: push return address, jump
//! - INT: raise a software interrupt
//! - IAG / IAS: read / write the interrupt handler address
//! - RFI: return from an interrupt handler
//! - IAQ: turn interrupt delivery off (messages keep queueing) or back on
//!
//! The delivery sequence (push PC, push EX, jump to IA) lives in the CPU; RFI
//! undoes it in reverse.

use crate::cpu::Location;
use crate::devices::{InterruptError, InterruptSource};
use crate::{ExecutionError, CPU};

/// Executes the JSR instruction.
///
/// Pushes the address of the next instruction (PC after the operand's
/// extension word, if any) and jumps to `a`.
pub(crate) fn execute_jsr(cpu: &mut CPU, a: Location) {
    let target = cpu.load(a);
    cpu.push(cpu.registers.pc);
    cpu.registers.pc = target;
}

/// Executes the INT instruction.
///
/// The message is queued like any device interrupt and delivered at an
/// instruction boundary, at the earliest right after this INT.
///
/// # Errors
///
/// [`ExecutionError::InterruptQueueOverflow`] if the queue is full.
pub(crate) fn execute_int(cpu: &mut CPU, a: Location) -> Result<(), ExecutionError> {
    let message = cpu.load(a);
    cpu.interrupts
        .raise(message, InterruptSource::Software)
        .map_err(|err| match err {
            InterruptError::QueueFull { message, .. } => {
                ExecutionError::InterruptQueueOverflow(message)
            }
        })
}

/// Executes the IAG instruction: a = IA.
pub(crate) fn execute_iag(cpu: &mut CPU, a: Location) {
    cpu.store(a, cpu.registers.ia);
}

/// Executes the IAS instruction: IA = a.
///
/// Setting IA to 0 makes the CPU discard incoming interrupts.
pub(crate) fn execute_ias(cpu: &mut CPU, a: Location) {
    cpu.registers.ia = cpu.load(a);
}

/// Executes the RFI instruction.
///
/// Re-enables delivery, then pops EX and PC. The operand is read but
/// ignored.
pub(crate) fn execute_rfi(cpu: &mut CPU, a: Location) {
    let _ = cpu.load(a);
    cpu.interrupts_enabled = true;
    cpu.registers.ex = cpu.pop();
    cpu.registers.pc = cpu.pop();
}

/// Executes the IAQ instruction.
///
/// A nonzero operand holds messages in the queue; zero releases them.
pub(crate) fn execute_iaq(cpu: &mut CPU, a: Location) {
    cpu.interrupts_enabled = cpu.load(a) == 0;
}
