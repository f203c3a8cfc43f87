//! Tests for the arithmetic, logic and shift instructions.
//!
//! Tests cover:
//! - Wrapping results and the EX register (carry, borrow, high word)
//! - Division and remainder by zero
//! - Signed variants
//! - Multi-word arithmetic with ADX / SBX
//! - Cycle counts

use libdcpu16::addressing::{inline_literal, register, EX, LITERAL_NEXT};
use libdcpu16::{encode_basic, Op, Register, CPU};

/// Helper function to run a single `op B, A` with the given register values
fn run_op(op: Op, b: u16, a: u16) -> CPU {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(op, register(Register::B), register(Register::A))], 0);
    cpu.set_register(Register::B, b);
    cpu.set_register(Register::A, a);
    cpu.step().unwrap();
    cpu
}

fn result(cpu: &CPU) -> (u16, u16) {
    (cpu.register(Register::B), cpu.ex())
}

// ========== ADD / SUB ==========

#[test]
fn test_add_basic() {
    let cpu = run_op(Op::Add, 0x0010, 0x0005);
    assert_eq!(result(&cpu), (0x0015, 0));
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn test_add_overflow_sets_ex() {
    let cpu = run_op(Op::Add, 0xFFFF, 2);
    assert_eq!(result(&cpu), (0x0001, 0x0001));
}

#[test]
fn test_sub_underflow_sets_ex() {
    let cpu = run_op(Op::Sub, 0, 1);
    assert_eq!(result(&cpu), (0xFFFF, 0xFFFF));
}

#[test]
fn test_sub_clears_ex() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Sub, register(Register::B), register(Register::A))], 0);
    cpu.set_ex(0xFFFF);
    cpu.set_register(Register::B, 5);
    cpu.set_register(Register::A, 3);
    cpu.step().unwrap();

    assert_eq!(result(&cpu), (2, 0));
}

#[test]
fn test_add_into_ex_keeps_sum() {
    // ADD EX, 1 with EX = 0x0041
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Add, EX, inline_literal(1).unwrap())], 0);
    cpu.set_ex(0x0041);
    cpu.step().unwrap();

    assert_eq!(cpu.ex(), 0x0042);
}

// ========== MUL / DIV / MOD ==========

#[test]
fn test_mul_high_word_in_ex() {
    let cpu = run_op(Op::Mul, 0x1234, 0x0100);
    assert_eq!(result(&cpu), (0x3400, 0x0012));
}

#[test]
fn test_mli_signed() {
    let cpu = run_op(Op::Mli, 0xFFFF, 0xFFFF); // -1 * -1
    assert_eq!(result(&cpu), (0x0001, 0x0000));
}

#[test]
fn test_div() {
    let cpu = run_op(Op::Div, 10, 4);
    assert_eq!(result(&cpu), (2, 0x8000));
    assert_eq!(cpu.cycles(), 3);
}

#[test]
fn test_div_by_zero() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Div, register(Register::B), register(Register::A))], 0);
    cpu.set_register(Register::B, 1234);
    cpu.set_ex(0x7777);
    cpu.step().unwrap();

    assert_eq!(result(&cpu), (0, 0));
}

#[test]
fn test_dvi_negative() {
    let cpu = run_op(Op::Dvi, 0xFFF6, 3); // -10 / 3
    assert_eq!(cpu.register(Register::B), 0xFFFD); // -3
}

#[test]
fn test_mod_and_mdi() {
    assert_eq!(run_op(Op::Mod, 17, 5).register(Register::B), 2);
    assert_eq!(run_op(Op::Mod, 17, 0).register(Register::B), 0);
    assert_eq!(run_op(Op::Mdi, 0xFFF9, 16).register(Register::B), 0xFFF9); // -7
    assert_eq!(run_op(Op::Mdi, 7, 0xFFF0).register(Register::B), 7); // 7 mod -16
}

#[test]
fn test_mod_leaves_ex_alone() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Mod, register(Register::B), register(Register::A))], 0);
    cpu.set_ex(0x1111);
    cpu.set_register(Register::B, 9);
    cpu.set_register(Register::A, 4);
    cpu.step().unwrap();

    assert_eq!(result(&cpu), (1, 0x1111));
}

// ========== Bitwise ==========

#[test]
fn test_bitwise_ops() {
    assert_eq!(run_op(Op::And, 0xF0F0, 0xFF00).register(Register::B), 0xF000);
    assert_eq!(run_op(Op::Bor, 0xF0F0, 0x0F00).register(Register::B), 0xFFF0);
    assert_eq!(run_op(Op::Xor, 0xF0F0, 0xFF00).register(Register::B), 0x0FF0);
}

#[test]
fn test_shifts() {
    assert_eq!(result(&run_op(Op::Shl, 0xC000, 2)), (0x0000, 0x0003));
    assert_eq!(result(&run_op(Op::Shr, 0x0003, 2)), (0x0000, 0xC000));
    assert_eq!(result(&run_op(Op::Asr, 0xFFF0, 4)), (0xFFFF, 0x0000));
}

// ========== ADX / SBX ==========

#[test]
fn test_32_bit_addition_with_adx() {
    // 0x0001_FFFF + 0x0000_0001, low word in B, high word in C
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Add, register(Register::B), inline_literal(1).unwrap()),
            encode_basic(Op::Adx, register(Register::C), inline_literal(0).unwrap()),
        ],
        0,
    );
    cpu.set_register(Register::B, 0xFFFF);
    cpu.set_register(Register::C, 0x0001);

    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.register(Register::B), 0x0000);
    assert_eq!(cpu.register(Register::C), 0x0002);
    assert_eq!(cpu.ex(), 0);
    assert_eq!(cpu.cycles(), 2 + 3);
}

#[test]
fn test_32_bit_subtraction_with_sbx() {
    // 0x0002_0000 - 0x0000_0001
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Sub, register(Register::B), inline_literal(1).unwrap()),
            encode_basic(Op::Sbx, register(Register::C), inline_literal(0).unwrap()),
        ],
        0,
    );
    cpu.set_register(Register::B, 0x0000);
    cpu.set_register(Register::C, 0x0002);

    cpu.step().unwrap();
    cpu.step().unwrap();

    assert_eq!(cpu.register(Register::B), 0xFFFF);
    assert_eq!(cpu.register(Register::C), 0x0001);
    assert_eq!(cpu.ex(), 0);
}

#[test]
fn test_sbx_underflow() {
    let cpu = run_op(Op::Sbx, 0, 1);
    assert_eq!(result(&cpu), (0xFFFF, 0xFFFF));
}

#[test]
fn test_adx_overflow() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Adx, register(Register::B), register(Register::A))], 0);
    cpu.set_register(Register::B, 0xFFFF);
    cpu.set_register(Register::A, 0);
    cpu.set_ex(1);
    cpu.step().unwrap();

    assert_eq!(result(&cpu), (0x0000, 0x0001));
}

// ========== Cycle Costs ==========

#[test]
fn test_extension_word_adds_cycle() {
    // MUL A, 0x0100 (next word)
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Mul, register(Register::A), LITERAL_NEXT), 0x0100], 0);
    assert_eq!(cpu.step().unwrap(), 3);
}
