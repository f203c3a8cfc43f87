//! # Shift Instructions
//!
//! This module implements the shift operations:
//! - SHR: logical shift right, bits shifted out land in EX
//! - ASR: arithmetic shift right, bits shifted out land in EX
//! - SHL: shift left, bits shifted out land in EX
//!
//! Shift counts of 16 or more are legal; the value simply shifts out
//! completely.

use crate::cpu::Location;
use crate::CPU;

/// Largest shift of a 64-bit intermediate that is still defined.
const MAX_SHIFT: u16 = 63;

/// Executes the SHR instruction: b = b >>> a, EX = ((b << 16) >> a) & 0xFFFF.
pub(crate) fn execute_shr(cpu: &mut CPU, b: Location, a: Location) {
    let wide = ((cpu.load(b) as u64) << 16) >> cpu.load(a).min(MAX_SHIFT);
    cpu.registers.ex = wide as u16;
    cpu.store(b, (wide >> 16) as u16);
}

/// Executes the ASR instruction: b = b >> a (sign-extending).
pub(crate) fn execute_asr(cpu: &mut CPU, b: Location, a: Location) {
    let wide = ((cpu.load(b) as i16 as i64) << 16) >> cpu.load(a).min(MAX_SHIFT);
    cpu.registers.ex = wide as u16;
    cpu.store(b, (wide >> 16) as u16);
}

/// Executes the SHL instruction: b = b << a, EX = ((b << a) >> 16) & 0xFFFF.
pub(crate) fn execute_shl(cpu: &mut CPU, b: Location, a: Location) {
    let wide = (cpu.load(b) as u64)
        .checked_shl(cpu.load(a) as u32)
        .unwrap_or(0);
    cpu.registers.ex = (wide >> 16) as u16;
    cpu.store(b, wide as u16);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Register;

    const B: Location = Location::Register(Register::B);

    fn shift(f: fn(&mut CPU, Location, Location), value: u16, by: u16) -> (u16, u16) {
        let mut cpu = CPU::new();
        cpu.set_register(Register::B, value);
        f(&mut cpu, B, Location::Literal(by));
        (cpu.register(Register::B), cpu.ex())
    }

    #[test]
    fn test_shr() {
        assert_eq!(shift(execute_shr, 0x8001, 1), (0x4000, 0x8000));
        assert_eq!(shift(execute_shr, 0xFFFF, 16), (0x0000, 0xFFFF));
        assert_eq!(shift(execute_shr, 0xFFFF, 40), (0x0000, 0x0000));
    }

    #[test]
    fn test_asr_keeps_sign() {
        assert_eq!(shift(execute_asr, 0x8000, 4), (0xF800, 0x0000));
        assert_eq!(shift(execute_asr, 0x8001, 1), (0xC000, 0x8000));
        assert_eq!(shift(execute_asr, 0x8000, 0xFFFF), (0xFFFF, 0xFFFF));
    }

    #[test]
    fn test_shl() {
        assert_eq!(shift(execute_shl, 0x8001, 1), (0x0002, 0x0001));
        assert_eq!(shift(execute_shl, 0x1234, 16), (0x0000, 0x1234));
        assert_eq!(shift(execute_shl, 0xFFFF, 64), (0x0000, 0x0000));
    }
}
