//! # ALU (Arithmetic Logic Unit) Instructions
//!
//! This module implements arithmetic and logical operations:
//! - ADD, SUB, ADX, SBX: addition and subtraction with carry/borrow in EX
//! - MUL, MLI: unsigned and signed multiply, high word in EX
//! - DIV, DVI, MOD, MDI: unsigned and signed division and remainder
//! - AND, BOR, XOR: bitwise logic (EX untouched)
//!
//! Signed variants treat their operands as two's complement and round toward
//! zero. Division by zero is not a fault: the result (and EX for DIV/DVI) is 0.

use crate::cpu::Location;
use crate::CPU;

/// Writes EX, then the destination.
fn write_with_ex(cpu: &mut CPU, b: Location, result: u16, ex: u16) {
    cpu.registers.ex = ex;
    cpu.store(b, result);
}

/// Executes the ADD instruction: b = b + a, EX = 1 on carry.
pub(crate) fn execute_add(cpu: &mut CPU, b: Location, a: Location) {
    let sum = cpu.load(b) as u32 + cpu.load(a) as u32;
    write_with_ex(cpu, b, sum as u16, (sum >> 16) as u16);
}

/// Executes the SUB instruction: b = b - a, EX = 0xFFFF on borrow.
pub(crate) fn execute_sub(cpu: &mut CPU, b: Location, a: Location) {
    let (lhs, rhs) = (cpu.load(b), cpu.load(a));
    let ex = if rhs > lhs { 0xFFFF } else { 0 };
    write_with_ex(cpu, b, lhs.wrapping_sub(rhs), ex);
}

/// Executes the MUL instruction: unsigned b * a, high word in EX.
pub(crate) fn execute_mul(cpu: &mut CPU, b: Location, a: Location) {
    let product = cpu.load(b) as u32 * cpu.load(a) as u32;
    write_with_ex(cpu, b, product as u16, (product >> 16) as u16);
}

/// Executes the MLI instruction: signed b * a, high word in EX.
pub(crate) fn execute_mli(cpu: &mut CPU, b: Location, a: Location) {
    let product = cpu.load(b) as i16 as i32 * cpu.load(a) as i16 as i32;
    write_with_ex(cpu, b, product as u16, (product >> 16) as u16);
}

/// Executes the DIV instruction.
///
/// b = b / a, EX = ((b << 16) / a) & 0xFFFF: the fractional part of the
/// quotient as a 16-bit fixed-point value.
pub(crate) fn execute_div(cpu: &mut CPU, b: Location, a: Location) {
    let (lhs, rhs) = (cpu.load(b), cpu.load(a));
    if rhs == 0 {
        write_with_ex(cpu, b, 0, 0);
        return;
    }
    let fraction = ((lhs as u32) << 16) / rhs as u32;
    write_with_ex(cpu, b, lhs / rhs, fraction as u16);
}

/// Executes the DVI instruction: DIV with signed operands.
pub(crate) fn execute_dvi(cpu: &mut CPU, b: Location, a: Location) {
    let (lhs, rhs) = (cpu.load(b) as i16, cpu.load(a) as i16);
    if rhs == 0 {
        write_with_ex(cpu, b, 0, 0);
        return;
    }
    // i64 so that -0x8000 / -1 cannot overflow
    let fraction = ((lhs as i64) << 16) / rhs as i64;
    write_with_ex(cpu, b, lhs.wrapping_div(rhs) as u16, fraction as u16);
}

/// Executes the MOD instruction: b = b % a, or 0 if a is 0.
pub(crate) fn execute_mod(cpu: &mut CPU, b: Location, a: Location) {
    let (lhs, rhs) = (cpu.load(b), cpu.load(a));
    let result = if rhs == 0 { 0 } else { lhs % rhs };
    cpu.store(b, result);
}

/// Executes the MDI instruction: signed remainder, sign follows b.
pub(crate) fn execute_mdi(cpu: &mut CPU, b: Location, a: Location) {
    let (lhs, rhs) = (cpu.load(b) as i16, cpu.load(a) as i16);
    let result = if rhs == 0 { 0 } else { lhs.wrapping_rem(rhs) };
    cpu.store(b, result as u16);
}

/// Executes the AND instruction.
pub(crate) fn execute_and(cpu: &mut CPU, b: Location, a: Location) {
    let result = cpu.load(b) & cpu.load(a);
    cpu.store(b, result);
}

/// Executes the BOR instruction.
pub(crate) fn execute_bor(cpu: &mut CPU, b: Location, a: Location) {
    let result = cpu.load(b) | cpu.load(a);
    cpu.store(b, result);
}

/// Executes the XOR instruction.
pub(crate) fn execute_xor(cpu: &mut CPU, b: Location, a: Location) {
    let result = cpu.load(b) ^ cpu.load(a);
    cpu.store(b, result);
}

/// Executes the ADX instruction: b = b + a + EX, EX = 1 on overflow.
pub(crate) fn execute_adx(cpu: &mut CPU, b: Location, a: Location) {
    let sum = cpu.load(b) as u32 + cpu.load(a) as u32 + cpu.registers.ex as u32;
    let ex = if sum > 0xFFFF { 1 } else { 0 };
    write_with_ex(cpu, b, sum as u16, ex);
}

/// Executes the SBX instruction: b = b - a + EX.
///
/// Incoming EX is signed (a previous SUB leaves 0xFFFF, i.e. -1). Afterwards
/// EX is 0xFFFF on underflow, 1 on overflow, 0 otherwise.
pub(crate) fn execute_sbx(cpu: &mut CPU, b: Location, a: Location) {
    let result = cpu.load(b) as i32 - cpu.load(a) as i32 + cpu.registers.ex as i16 as i32;
    let ex = if result < 0 {
        0xFFFF
    } else if result > 0xFFFF {
        1
    } else {
        0
    };
    write_with_ex(cpu, b, result as u16, ex);
}
