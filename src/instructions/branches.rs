//! # Conditional Instructions
//!
//! The IF* family never jumps. A false condition arms the skip flag, and the
//! executor then skips the next instruction. If that instruction is itself an
//! IF*, the skip carries over to the one after it, so a chain of conditions
//! behaves like a logical AND guarding the first non-conditional instruction.

use crate::cpu::Location;
use crate::opcodes::Op;
use crate::CPU;

/// Evaluates an IF* condition on already-loaded operands.
fn condition(op: Op, b: u16, a: u16) -> bool {
    match op {
        Op::Ifb => b & a != 0,
        Op::Ifc => b & a == 0,
        Op::Ife => b == a,
        Op::Ifn => b != a,
        Op::Ifg => b > a,
        Op::Ifa => (b as i16) > (a as i16),
        Op::Ifl => b < a,
        Op::Ifu => (b as i16) < (a as i16),
        _ => unreachable!("{:?} is not a conditional", op),
    }
}

/// Executes an IF* instruction: arms the skip flag when the condition fails.
pub(crate) fn execute_if(cpu: &mut CPU, op: Op, b: Location, a: Location) {
    if !condition(op, cpu.load(b), cpu.load(a)) {
        cpu.skipping = true;
    }
}
