//! Execution loop tests
//!
//! Verifies the fetch-decode-execute cycle, run control (stop handles,
//! crash-loop detection, cycle budgets), reset, and fault reporting.

use libdcpu16::addressing::{inline_literal, register, INDIRECT_NEXT, LITERAL_NEXT, PC};
use libdcpu16::{
    encode_basic, encode_special, EmulatorConfig, ExecutionError, Halt, Op, Register, CPU,
};
use std::thread;
use std::time::Duration;

fn lit(value: u16) -> u8 {
    inline_literal(value).unwrap()
}

/// The canonical smoke program:
///
/// ```text
///         SET A, 0x30
///         SET [0x1000], 0x20
///         SUB A, [0x1000]
///         IFN A, 0x10
///         SET PC, crash
///         SET B, 1
/// crash:  SET PC, crash
/// ```
fn smoke_program() -> Vec<u16> {
    vec![
        0x7C01, 0x0030, // 0: SET A, 0x30
        0x7FC1, 0x1000, 0x0020, // 2: SET [0x1000], 0x20
        0x7803, 0x1000, // 5: SUB A, [0x1000]
        encode_basic(Op::Ifn, register(Register::A), lit(0x10)), // 7
        encode_basic(Op::Set, PC, lit(10)),                      // 8: SET PC, crash
        encode_basic(Op::Set, register(Register::B), lit(1)),    // 9
        encode_basic(Op::Set, PC, lit(10)),                      // 10: crash
    ]
}

fn crash_detecting_cpu() -> CPU {
    CPU::with_config(EmulatorConfig {
        halt_on_crash_loop: true,
        ..EmulatorConfig::default()
    })
}

// ========== Stepping ==========

#[test]
fn test_smoke_program() {
    let mut cpu = CPU::new();
    cpu.load_program(&smoke_program(), 0);

    for _ in 0..6 {
        cpu.step().unwrap();
    }

    assert_eq!(cpu.register(Register::A), 0x10);
    assert_eq!(cpu.memory().read(0x1000), 0x20);
    assert_eq!(cpu.register(Register::B), 1);
    assert_eq!(cpu.pc(), 10);
    // 2 + 3 + 3 + 2 + (skip) 1 + 1
    assert_eq!(cpu.cycles(), 12);
}

#[test]
fn test_step_advances_program_counter() {
    let mut cpu = CPU::new();
    cpu.load_program(&[0x7C01, 0x0030, 0x7FC1, 0x1000, 0x0020], 0x0200);

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0x0202);
    assert_eq!(cpu.last_pc(), 0x0200);

    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0x0205);
    assert_eq!(cpu.last_pc(), 0x0202);
}

#[test]
fn test_pc_wraps_at_top_of_memory() {
    let mut cpu = CPU::new();
    // SET A, 0x1234 straddling the end of memory
    cpu.load_program(&[encode_basic(Op::Set, register(Register::A), LITERAL_NEXT), 0x1234], 0xFFFF);

    assert_eq!(cpu.memory().read(0x0000), 0x1234);
    cpu.step().unwrap();

    assert_eq!(cpu.register(Register::A), 0x1234);
    assert_eq!(cpu.pc(), 0x0001);
}

#[test]
fn test_jsr_subroutine() {
    // JSR sub / SET B, 1 ... sub: SET A, 2 / SET PC, POP
    let mut cpu = CPU::new();
    cpu.load_program(
        &[
            encode_special(Op::Jsr, LITERAL_NEXT),
            0x0100,
            encode_basic(Op::Set, register(Register::B), lit(1)),
        ],
        0,
    );
    cpu.load_program(
        &[
            encode_basic(Op::Set, register(Register::A), lit(2)),
            encode_basic(Op::Set, PC, 0x18), // POP
        ],
        0x0100,
    );
    cpu.set_pc(0);

    assert_eq!(cpu.step().unwrap(), 4);
    assert_eq!(cpu.pc(), 0x0100);
    assert_eq!(cpu.memory().read(0xFFFF), 0x0002);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.pc(), 0x0002);
    assert_eq!(cpu.sp(), 0x0000);

    cpu.step().unwrap();
    assert_eq!(cpu.register(Register::A), 2);
    assert_eq!(cpu.register(Register::B), 1);
}

#[test]
fn test_sti_std() {
    // STI [I], [J] twice, then STD [I], [J]
    let mut cpu = CPU::new();
    let sti = encode_basic(Op::Sti, 0x0E, 0x0F);
    let std_op = encode_basic(Op::Std, 0x0E, 0x0F);
    cpu.load_program(&[sti, sti, std_op], 0);
    cpu.set_register(Register::I, 0x2000);
    cpu.set_register(Register::J, 0x3000);
    cpu.write_memory(0x3000, &[0xAAAA, 0xBBBB, 0xCCCC]);

    cpu.step().unwrap();
    cpu.step().unwrap();
    assert_eq!(cpu.read_memory(0x2000, 2), vec![0xAAAA, 0xBBBB]);
    assert_eq!(cpu.register(Register::I), 0x2002);
    assert_eq!(cpu.register(Register::J), 0x3002);

    cpu.step().unwrap();
    assert_eq!(cpu.memory().read(0x2002), 0xCCCC);
    assert_eq!(cpu.register(Register::I), 0x2001);
    assert_eq!(cpu.register(Register::J), 0x3001);
}

// ========== Faults ==========

#[test]
fn test_invalid_opcode_fault() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Set, register(Register::A), lit(1)), 0x0018], 0);

    cpu.step().unwrap();
    let fault = cpu.step().unwrap_err();

    assert_eq!(
        fault.error,
        ExecutionError::InvalidOpcode {
            word: 0x0018,
            opcode: 0x18
        }
    );
    assert_eq!(fault.state.last_pc, 0x0001);
    assert_eq!(fault.state.registers.pc, 0x0002);
    assert_eq!(fault.state.registers.gp[0], 1);
    assert_eq!(fault.state.cycles, cpu.cycles());
    assert_eq!(
        fault.to_string(),
        "invalid opcode 0x18 in word 0x0018 at 0x0001"
    );
}

#[test]
fn test_invalid_special_opcode_fault() {
    let mut cpu = CPU::new();
    // Special opcode 0x02 is reserved
    cpu.load_program(&[0x0040], 0);

    let fault = cpu.step().unwrap_err();
    assert_eq!(
        fault.error,
        ExecutionError::InvalidSpecialOpcode {
            word: 0x0040,
            opcode: 0x02
        }
    );
}

#[test]
fn test_zeroed_memory_faults() {
    let mut cpu = CPU::new();
    let fault = cpu.run().unwrap_err();

    assert!(matches!(
        fault.error,
        ExecutionError::InvalidSpecialOpcode { word: 0, .. }
    ));
}

// ========== Run Control ==========

#[test]
fn test_run_detects_crash_loop() {
    let mut cpu = crash_detecting_cpu();
    cpu.load_program(&smoke_program(), 0);

    assert_eq!(cpu.run().unwrap(), Halt::CrashLoop { pc: 10 });
    assert_eq!(cpu.register(Register::A), 0x10);
    assert_eq!(cpu.register(Register::B), 1);
}

#[test]
fn test_sub_pc_one_is_a_crash_loop() {
    let mut cpu = crash_detecting_cpu();
    cpu.load_program(&[encode_basic(Op::Sub, PC, lit(1))], 0x0040);

    assert_eq!(cpu.run().unwrap(), Halt::CrashLoop { pc: 0x0040 });
    assert_eq!(cpu.cycles(), 2);
}

#[test]
fn test_skipped_jump_does_not_halt() {
    // IFE A, 1 / SET PC, 1 (skipped) / SET PC, 2 (loop)
    let mut cpu = crash_detecting_cpu();
    cpu.load_program(
        &[
            encode_basic(Op::Ife, register(Register::A), lit(1)),
            encode_basic(Op::Set, PC, lit(1)),
            encode_basic(Op::Set, PC, lit(2)),
        ],
        0,
    );

    assert_eq!(cpu.run().unwrap(), Halt::CrashLoop { pc: 2 });
}

#[test]
fn test_back_to_back_interrupts_are_not_a_crash_loop() {
    // Loop: ADD B, 1 / SET PC, 0; handler at 0x10 is a lone RFI, so each
    // RFI hands straight over to the next queued message
    let mut cpu = crash_detecting_cpu();
    cpu.load_program(
        &[
            encode_basic(Op::Add, register(Register::B), lit(1)),
            encode_basic(Op::Set, PC, lit(0)),
        ],
        0,
    );
    cpu.load_program(&[encode_special(Op::Rfi, lit(0))], 0x0010);
    cpu.set_pc(0);
    cpu.set_ia(0x0010);
    for message in 1..=3 {
        cpu.raise_interrupt(message).unwrap();
    }
    let handle = cpu.stop_handle();

    let runner = thread::spawn(move || {
        let halt = cpu.run();
        (cpu, halt)
    });
    thread::sleep(Duration::from_millis(50));
    handle.stop();

    let (cpu, halt) = runner.join().unwrap();
    assert_eq!(halt.unwrap(), Halt::Stopped);
    assert!(cpu.interrupts().is_empty());
    assert!(cpu.register(Register::B) > 1);
}

#[test]
fn test_crash_loop_inside_handler_is_detected() {
    // Handler at 0x10 spins on SUB PC, 1 with delivery disabled
    let mut cpu = crash_detecting_cpu();
    cpu.load_program(&[encode_basic(Op::Set, PC, lit(0))], 0);
    cpu.load_program(&[encode_basic(Op::Sub, PC, lit(1))], 0x0010);
    cpu.set_pc(0);
    cpu.set_ia(0x0010);
    cpu.raise_interrupt(1).unwrap();

    assert_eq!(cpu.run().unwrap(), Halt::CrashLoop { pc: 0x0010 });
}

#[test]
fn test_stop_handle_from_another_thread() {
    let mut cpu = CPU::new();
    // Loop: ADD [0x3000], 1 / SET PC, 0
    cpu.load_program(
        &[
            encode_basic(Op::Add, INDIRECT_NEXT, lit(1)),
            0x3000,
            encode_basic(Op::Set, PC, lit(0)),
        ],
        0,
    );
    let handle = cpu.stop_handle();

    let runner = thread::spawn(move || {
        let halt = cpu.run();
        (cpu, halt)
    });
    thread::sleep(Duration::from_millis(20));
    handle.stop();

    let (cpu, halt) = runner.join().unwrap();
    assert_eq!(halt.unwrap(), Halt::Stopped);
    assert!(cpu.memory().read(0x3000) > 0);
    // The request was consumed
    assert!(!handle.is_stop_requested());
}

#[test]
fn test_stop_requested_before_run() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Sub, PC, lit(1))], 0);
    cpu.stop_handle().stop();

    assert_eq!(cpu.run().unwrap(), Halt::Stopped);
    assert_eq!(cpu.cycles(), 0);
}

#[test]
fn test_run_for_cycles_budget() {
    let mut cpu = CPU::new();
    // SUB PC, 1 costs 2 cycles
    cpu.load_program(&[encode_basic(Op::Sub, PC, lit(1))], 0);

    assert_eq!(cpu.run_for_cycles(10).unwrap(), 10);
    assert_eq!(cpu.run_for_cycles(5).unwrap(), 6);
    assert_eq!(cpu.cycles(), 16);
    assert_eq!(cpu.run_for_cycles(0).unwrap(), 0);
}

#[test]
fn test_run_for_cycles_propagates_fault() {
    let mut cpu = CPU::new();
    cpu.load_program(&[encode_basic(Op::Set, register(Register::A), lit(1)), 0x0018], 0);

    let fault = cpu.run_for_cycles(100).unwrap_err();
    assert_eq!(fault.state.last_pc, 0x0001);
}

// ========== Reset ==========

#[test]
fn test_reset_keeps_memory() {
    let mut cpu = CPU::new();
    cpu.load_program(&smoke_program(), 0);
    for _ in 0..3 {
        cpu.step().unwrap();
    }
    cpu.set_ia(0x0100);
    cpu.set_sp(0x8000);
    cpu.raise_interrupt(1).unwrap();

    cpu.reset();

    assert_eq!(cpu.pc(), 0);
    assert_eq!(cpu.sp(), 0);
    assert_eq!(cpu.ia(), 0);
    assert_eq!(cpu.register(Register::A), 0);
    assert_eq!(cpu.cycles(), 0);
    assert!(cpu.interrupts().is_empty());
    assert!(cpu.interrupts_enabled());
    assert_eq!(cpu.memory().read(0x1000), 0x20);
    assert_eq!(cpu.memory().read(0x0000), 0x7C01);
}

#[test]
fn test_snapshot_matches_accessors() {
    let mut cpu = CPU::new();
    cpu.load_program(&smoke_program(), 0);
    cpu.step().unwrap();
    cpu.raise_interrupt(3).unwrap();

    let state = cpu.snapshot();

    assert_eq!(state.registers, *cpu.registers());
    assert_eq!(state.cycles, 2);
    assert_eq!(state.last_pc, 0);
    assert_eq!(state.pending_interrupts, 1);
    assert!(!state.skipping);
}
