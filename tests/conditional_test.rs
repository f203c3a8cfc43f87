//! Tests for the IF* family and instruction skipping.
//!
//! Tests cover:
//! - True conditions fall through, false conditions skip one instruction
//! - Skipped instructions consume their extension words
//! - Skipped instructions have no side effects and cost one cycle
//! - Chained conditionals

use libdcpu16::addressing::{inline_literal, register, LITERAL_NEXT, PUSH_POP};
use libdcpu16::{encode_basic, Op, Register, CPU};

fn lit(value: u16) -> u8 {
    inline_literal(value).unwrap()
}

const A: u8 = register(Register::A);
const B: u8 = register(Register::B);
const C: u8 = register(Register::C);

/// Helper: `IF* A, <imm>` followed by `SET B, 1` and `SET C, 1`
fn setup_cpu(op: Op, a: u16, imm: u16) -> CPU {
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(op, A, lit(imm)),
            encode_basic(Op::Set, B, lit(1)),
            encode_basic(Op::Set, C, lit(1)),
        ],
        0,
    );
    cpu.set_register(Register::A, a);
    cpu
}

/// Runs the guarded program and reports whether the guarded SET executed
fn guarded_ran(op: Op, a: u16, imm: u16) -> bool {
    let mut cpu = setup_cpu(op, a, imm);
    cpu.step().unwrap(); // IF*
    cpu.step().unwrap(); // SET B (maybe skipped)
    cpu.step().unwrap(); // SET C
    assert_eq!(cpu.register(Register::C), 1);
    cpu.register(Register::B) == 1
}

// ========== Conditions ==========

#[test]
fn test_ife_ifn() {
    assert!(guarded_ran(Op::Ife, 5, 5));
    assert!(!guarded_ran(Op::Ife, 5, 6));
    assert!(guarded_ran(Op::Ifn, 5, 6));
    assert!(!guarded_ran(Op::Ifn, 5, 5));
}

#[test]
fn test_ifb_ifc() {
    assert!(guarded_ran(Op::Ifb, 0b0110, 0b0010));
    assert!(!guarded_ran(Op::Ifb, 0b0110, 0b1001));
    assert!(guarded_ran(Op::Ifc, 0b0110, 0b1001));
    assert!(!guarded_ran(Op::Ifc, 0b0110, 0b0010));
}

#[test]
fn test_unsigned_comparisons() {
    assert!(guarded_ran(Op::Ifg, 0xFFFF, 1));
    assert!(!guarded_ran(Op::Ifg, 1, 1));
    assert!(guarded_ran(Op::Ifl, 0, 1));
    assert!(!guarded_ran(Op::Ifl, 0xFFFF, 1));
}

#[test]
fn test_signed_comparisons() {
    // 0xFFFF is -1
    assert!(!guarded_ran(Op::Ifa, 0xFFFF, 1));
    assert!(guarded_ran(Op::Ifa, 2, 1));
    assert!(guarded_ran(Op::Ifu, 0xFFFF, 1));
    assert!(!guarded_ran(Op::Ifu, 1, 0xFFFF));
}

// ========== Skip Mechanics ==========

#[test]
fn test_condition_costs() {
    let mut cpu = setup_cpu(Op::Ife, 0, 1);

    assert_eq!(cpu.step().unwrap(), 2);
    assert!(cpu.is_skipping());
    assert_eq!(cpu.step().unwrap(), 1);
    assert!(!cpu.is_skipping());
    assert_eq!(cpu.cycles(), 3);
}

#[test]
fn test_skip_consumes_extension_words() {
    // IFE A, 1 / SET [0x1000], 0x2000 / SET B, 1
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Ife, A, lit(1)),
            encode_basic(Op::Set, 0x1E, LITERAL_NEXT),
            0x1000,
            0x2000,
            encode_basic(Op::Set, B, lit(1)),
        ],
        0,
    );

    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 1);
    assert_eq!(cpu.pc(), 0x0004);
    assert_eq!(cpu.memory().read(0x1000), 0);

    cpu.step().unwrap();
    assert_eq!(cpu.register(Register::B), 1);
}

#[test]
fn test_skip_has_no_stack_side_effects() {
    // IFE A, 1 / SET PUSH, POP
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Ife, A, lit(1)),
            encode_basic(Op::Set, PUSH_POP, PUSH_POP),
            encode_basic(Op::Set, PUSH_POP, lit(3)),
        ],
        0,
    );
    cpu.set_sp(0x8000);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.sp(), 0x8000);

    cpu.step().unwrap();
    assert_eq!(cpu.sp(), 0x7FFF);
}

#[test]
fn test_chained_conditions_skip_together() {
    // IFN A, A / IFE A, A / SET B, 1 / SET C, 1
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Ifn, A, A),
            encode_basic(Op::Ife, A, A),
            encode_basic(Op::Set, B, lit(1)),
            encode_basic(Op::Set, C, lit(1)),
        ],
        0,
    );

    cpu.step().unwrap(); // IFN fails
    cpu.step().unwrap(); // IFE skipped, chain continues
    assert!(cpu.is_skipping());
    cpu.step().unwrap(); // SET B skipped
    assert!(!cpu.is_skipping());
    cpu.step().unwrap(); // SET C runs

    assert_eq!(cpu.register(Register::B), 0);
    assert_eq!(cpu.register(Register::C), 1);
    assert_eq!(cpu.pc(), 0x0004);
}

#[test]
fn test_nested_true_conditions_run_body() {
    // IFE A, 0 / IFE B, 0 / SET C, 1
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_basic(Op::Ife, A, lit(0)),
            encode_basic(Op::Ife, B, lit(0)),
            encode_basic(Op::Set, C, lit(1)),
        ],
        0,
    );

    for _ in 0..3 {
        cpu.step().unwrap();
    }
    assert_eq!(cpu.register(Register::C), 1);
}

#[test]
fn test_skipped_reserved_opcode_does_not_fault() {
    // IFE A, 1 / (reserved 0x18) / SET B, 1
    let mut cpu = CPU::new();
    cpu.load_program(
        &[encode_basic(Op::Ife, A, lit(1)), 0x0018, encode_basic(Op::Set, B, lit(1))],
        0,
    );

    cpu.step().unwrap();
    assert_eq!(cpu.step().unwrap(), 1);
    cpu.step().unwrap();
    assert_eq!(cpu.register(Register::B), 1);
}
