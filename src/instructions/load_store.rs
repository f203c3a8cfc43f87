//! # Load and Store Instructions
//!
//! This module implements data movement:
//! - SET: b = a
//! - STI: b = a, then increment I and J
//! - STD: b = a, then decrement I and J
//!
//! STI/STD update I and J *after* the store, so `STI [I], [J]` copies one word
//! and advances both pointers.

use crate::cpu::Location;
use crate::registers::Register;
use crate::CPU;

/// Executes the SET instruction.
pub(crate) fn execute_set(cpu: &mut CPU, b: Location, a: Location) {
    let value = cpu.load(a);
    cpu.store(b, value);
}

/// Executes the STI instruction.
pub(crate) fn execute_sti(cpu: &mut CPU, b: Location, a: Location) {
    execute_set(cpu, b, a);
    step_string_registers(cpu, 1);
}

/// Executes the STD instruction.
pub(crate) fn execute_std(cpu: &mut CPU, b: Location, a: Location) {
    execute_set(cpu, b, a);
    step_string_registers(cpu, 0xFFFF);
}

fn step_string_registers(cpu: &mut CPU, delta: u16) {
    for reg in [Register::I, Register::J] {
        let value = cpu.registers.get(reg).wrapping_add(delta);
        cpu.registers.set(reg, value);
    }
}
