//! # DCPU-16 Instruction Implementations
//!
//! This module contains the implementations of all DCPU-16 instructions, organized by category.
//! Each instruction is a standalone function taking the CPU and operand locations that
//! the executor has already resolved (extension words fetched, PUSH/POP applied).
//!
//! ## Categories
//!
//! - **alu**: Arithmetic and logic operations (ADD, SUB, MUL, MLI, DIV, DVI, MOD, MDI, AND, BOR, XOR, ADX, SBX)
//! - **shifts**: Shift operations (SHR, ASR, SHL)
//! - **branches**: Conditional skip instructions (IFB, IFC, IFE, IFN, IFG, IFA, IFL, IFU)
//! - **load_store**: Data movement (SET, STI, STD)
//! - **control**: Subroutine and interrupt control (JSR, INT, IAG, IAS, RFI, IAQ)
//! - **hardware**: Device bus access (HWN, HWQ, HWI)
//!
//! Every result that sets EX writes EX *before* the destination, so an
//! instruction whose destination is EX keeps the result rather than the
//! overflow.

pub mod alu;
pub mod branches;
pub mod control;
pub mod hardware;
pub mod load_store;
pub mod shifts;

use crate::cpu::Location;
use crate::opcodes::Op;
use crate::{ExecutionError, CPU};

/// Dispatches a two-operand instruction.
///
/// Basic instructions cannot fail once decoded.
pub(crate) fn execute_basic(cpu: &mut CPU, op: Op, b: Location, a: Location) {
    match op {
        Op::Set => load_store::execute_set(cpu, b, a),
        Op::Add => alu::execute_add(cpu, b, a),
        Op::Sub => alu::execute_sub(cpu, b, a),
        Op::Mul => alu::execute_mul(cpu, b, a),
        Op::Mli => alu::execute_mli(cpu, b, a),
        Op::Div => alu::execute_div(cpu, b, a),
        Op::Dvi => alu::execute_dvi(cpu, b, a),
        Op::Mod => alu::execute_mod(cpu, b, a),
        Op::Mdi => alu::execute_mdi(cpu, b, a),
        Op::And => alu::execute_and(cpu, b, a),
        Op::Bor => alu::execute_bor(cpu, b, a),
        Op::Xor => alu::execute_xor(cpu, b, a),
        Op::Shr => shifts::execute_shr(cpu, b, a),
        Op::Asr => shifts::execute_asr(cpu, b, a),
        Op::Shl => shifts::execute_shl(cpu, b, a),
        Op::Ifb | Op::Ifc | Op::Ife | Op::Ifn | Op::Ifg | Op::Ifa | Op::Ifl | Op::Ifu => {
            branches::execute_if(cpu, op, b, a)
        }
        Op::Adx => alu::execute_adx(cpu, b, a),
        Op::Sbx => alu::execute_sbx(cpu, b, a),
        Op::Sti => load_store::execute_sti(cpu, b, a),
        Op::Std => load_store::execute_std(cpu, b, a),
        Op::Jsr | Op::Int | Op::Iag | Op::Ias | Op::Rfi | Op::Iaq | Op::Hwn | Op::Hwq | Op::Hwi => {
            unreachable!("special operation {:?} in the basic table", op)
        }
    }
}

/// Dispatches a single-operand instruction.
///
/// # Returns
///
/// Extra cycles beyond the table cost (only `HWI` reports any).
pub(crate) fn execute_special(
    cpu: &mut CPU,
    op: Op,
    a: Location,
) -> Result<u64, ExecutionError> {
    match op {
        Op::Jsr => control::execute_jsr(cpu, a),
        Op::Int => control::execute_int(cpu, a)?,
        Op::Iag => control::execute_iag(cpu, a),
        Op::Ias => control::execute_ias(cpu, a),
        Op::Rfi => control::execute_rfi(cpu, a),
        Op::Iaq => control::execute_iaq(cpu, a),
        Op::Hwn => hardware::execute_hwn(cpu, a),
        Op::Hwq => hardware::execute_hwq(cpu, a)?,
        Op::Hwi => return hardware::execute_hwi(cpu, a),
        _ => unreachable!("basic operation {:?} in the special table", op),
    }
    Ok(0)
}
