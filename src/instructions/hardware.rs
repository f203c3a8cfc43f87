//! # Hardware Instructions
//!
//! This module implements device bus access:
//! - HWN: a = number of attached devices
//! - HWQ: load identification of device `a` into A, B, C, X, Y
//! - HWI: send an interrupt to device `a`
//!
//! HWI is synchronous: the device handler runs on the CPU thread, may read and
//! write registers and memory through a [`DeviceContext`], and reports how many
//! extra cycles the command took.

use crate::config::DeviceErrorPolicy;
use crate::cpu::Location;
use crate::devices::DeviceContext;
use crate::registers::Register;
use crate::{ExecutionError, CPU};

/// Executes the HWN instruction.
pub(crate) fn execute_hwn(cpu: &mut CPU, a: Location) {
    cpu.store(a, cpu.bus.len());
}

/// Executes the HWQ instruction.
///
/// A+(B<<16) = hardware id, C = version, X+(Y<<16) = manufacturer.
///
/// # Errors
///
/// [`ExecutionError::InvalidHardwareIndex`] if no device has that index.
pub(crate) fn execute_hwq(cpu: &mut CPU, a: Location) -> Result<(), ExecutionError> {
    let index = cpu.load(a);
    let info = cpu
        .bus
        .info(index)
        .ok_or(ExecutionError::InvalidHardwareIndex(index))?;

    let regs = &mut cpu.registers;
    regs.set(Register::A, info.id as u16);
    regs.set(Register::B, (info.id >> 16) as u16);
    regs.set(Register::C, info.version);
    regs.set(Register::X, info.manufacturer as u16);
    regs.set(Register::Y, (info.manufacturer >> 16) as u16);
    Ok(())
}

/// Executes the HWI instruction.
///
/// # Returns
///
/// Extra cycles reported by the device.
///
/// # Errors
///
/// * [`ExecutionError::InvalidHardwareIndex`] if no device has that index
/// * [`ExecutionError::Device`] if the device rejects the command and the
///   configured policy is [`DeviceErrorPolicy::Abort`]
pub(crate) fn execute_hwi(cpu: &mut CPU, a: Location) -> Result<u64, ExecutionError> {
    let index = cpu.load(a);
    let device = cpu
        .bus
        .get_mut(index)
        .ok_or(ExecutionError::InvalidHardwareIndex(index))?;

    log::debug!(
        "HWI {} (id 0x{:08X}) A=0x{:04X}",
        index,
        device.info().id,
        cpu.registers.get(Register::A)
    );

    let mut ctx = DeviceContext::new(&mut cpu.registers, &mut cpu.memory, &cpu.interrupts, index);
    match device.interrupt(&mut ctx) {
        Ok(cycles) => Ok(cycles as u64),
        Err(source) => match cpu.config.device_errors {
            DeviceErrorPolicy::Abort => Err(ExecutionError::Device { index, source }),
            DeviceErrorPolicy::Ignore => {
                log::warn!("ignoring error from device {}: {}", index, source);
                Ok(0)
            }
        },
    }
}
