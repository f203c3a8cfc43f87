//! Fuzz target for CPU step execution.
//!
//! This target creates arbitrary register files and memory contents, attaches
//! the stock devices, then executes a handful of instructions to find edge
//! cases and crashes.

#![no_main]

use arbitrary::Arbitrary;
use libdcpu16::{DeviceErrorPolicy, EmulatorConfig, GenericKeyboard, Lem1802, CPU};
use libfuzzer_sys::fuzz_target;

/// Arbitrary CPU initial state for fuzzing
#[derive(Debug, Arbitrary)]
struct FuzzCpuState {
    /// General-purpose registers A..J
    gp: [u16; 8],
    /// Program counter
    pc: u16,
    /// Stack pointer
    sp: u16,
    /// Extra register
    ex: u16,
    /// Interrupt handler address
    ia: u16,
    /// Pending interrupt messages
    interrupts: Vec<u16>,
}

/// Complete fuzz input
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    cpu_state: FuzzCpuState,
    /// Words at PC
    program: [u16; 16],
    /// Words around SP
    stack: [u16; 16],
    /// Ignore device errors instead of faulting
    ignore_device_errors: bool,
    /// Instructions to execute
    steps: u8,
}

fuzz_target!(|input: FuzzInput| {
    let config = EmulatorConfig {
        interrupt_queue_capacity: 8,
        device_errors: if input.ignore_device_errors {
            DeviceErrorPolicy::Ignore
        } else {
            DeviceErrorPolicy::Abort
        },
        ..EmulatorConfig::default()
    };
    let mut cpu = CPU::with_config(config);
    cpu.attach(Box::new(Lem1802::new())).unwrap();
    cpu.attach(Box::new(GenericKeyboard::new())).unwrap();

    let state = &input.cpu_state;
    cpu.registers_mut().gp = state.gp;
    cpu.set_sp(state.sp);
    cpu.set_ex(state.ex);
    cpu.set_ia(state.ia);
    cpu.write_memory(state.sp.wrapping_sub(8), &input.stack);
    cpu.load_program(&input.program, state.pc);

    for &message in state.interrupts.iter().take(8) {
        let _ = cpu.raise_interrupt(message);
    }

    for _ in 0..input.steps.min(32) {
        let before = cpu.cycles();
        match cpu.step() {
            Ok(cycles) => {
                // Every instruction costs something, and the counter agrees
                assert!(cycles >= 1);
                assert_eq!(cpu.cycles(), before + cycles);
                assert!(cpu.interrupts().len() <= 8);
            }
            Err(fault) => {
                assert_eq!(fault.state.cycles, cpu.cycles());
                break;
            }
        }
    }
});
