//! Hardware device support for the DCPU-16 emulator.
//!
//! Devices are not memory-mapped. They sit on an ordered bus and talk to the
//! CPU through three instructions and one queue:
//!
//! - **HWN** reads the number of attached devices
//! - **HWQ** reads a device's identification (id, version, manufacturer)
//! - **HWI** synchronously invokes a device's interrupt handler
//! - devices raise interrupt *messages* back into the
//!   [`InterruptController`](interrupts::InterruptController)
//!
//! # Architecture
//!
//! - **Device trait**: identification, `HWI` handling, optional background loop
//! - **DeviceBus**: attachment-ordered list; bus index = attach order, stable
//!   for the lifetime of the CPU
//! - **DeviceContext**: the only window a device gets onto registers and
//!   memory, valid for the duration of a single `HWI`
//! - **Device implementations**: generic keyboard, LEM1802 display, generic clock
//!
//! # Example
//!
//! ```rust
//! use libdcpu16::{GenericClock, GenericKeyboard, Lem1802, CPU};
//!
//! let mut cpu = CPU::new();
//! let display = cpu.attach(Box::new(Lem1802::new())).unwrap();
//! let keyboard = cpu.attach(Box::new(GenericKeyboard::new())).unwrap();
//! let clock = cpu.attach(Box::new(GenericClock::new())).unwrap();
//!
//! assert_eq!((display, keyboard, clock), (0, 1, 2));
//! assert_eq!(cpu.device_count(), 3);
//! ```

use crate::memory::Memory;
use crate::registers::{Register, Registers};
use std::any::Any;
use thiserror::Error;

// Device implementations
pub mod clock;
pub mod interrupts;
pub mod keyboard;
pub mod lem1802;

// Re-export device types
pub use clock::GenericClock;
pub use interrupts::{
    Interrupt, InterruptController, InterruptError, InterruptLine, InterruptSource,
};
pub use keyboard::{GenericKeyboard, KeyboardHandle};
pub use lem1802::{Cell, Frame, Lem1802};

/// Maximum number of devices; HWN must be able to report the count in one word.
pub const MAX_DEVICES: usize = 0xFFFF;

/// Identification reported by `HWQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    /// Hardware id (returned in B:A)
    pub id: u32,
    /// Hardware version (returned in C)
    pub version: u16,
    /// Manufacturer id (returned in Y:X)
    pub manufacturer: u32,
}

/// Errors reported by devices and the device bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device received an `HWI` command it does not implement.
    #[error("{device} does not recognise hardware command 0x{command:04X}")]
    InvalidCommand {
        /// Device name, for diagnostics
        device: &'static str,
        /// Offending command word (usually register A)
        command: u16,
    },

    /// No more devices can be attached.
    #[error("device bus is full ({attached} devices attached)")]
    BusFull {
        /// Number of attached devices
        attached: usize,
    },
}

/// Abstract interface for hardware attached to the device bus.
///
/// # Contract
///
/// - `interrupt` runs on the CPU thread while the CPU is blocked on it. It must
///   return promptly; anything that blocks belongs on the device's own
///   background loop, which talks to the CPU only by raising interrupts.
/// - A device never holds a reference to memory or registers. The
///   [`DeviceContext`] it receives is valid for one call only.
/// - `start` / `stop` bracket any background loop. `stop` must join it and
///   must be safe to call more than once.
///
/// # Examples
///
/// ```rust
/// use libdcpu16::{Device, DeviceContext, DeviceError, DeviceInfo, Register};
/// use std::any::Any;
///
/// /// Answers every HWI by writing 0x1234 to register B.
/// struct Echo;
///
/// impl Device for Echo {
///     fn info(&self) -> DeviceInfo {
///         DeviceInfo { id: 0xDEADBEEF, version: 1, manufacturer: 0 }
///     }
///
///     fn interrupt(&mut self, ctx: &mut DeviceContext<'_>) -> Result<u16, DeviceError> {
///         match ctx.register(Register::A) {
///             0 => {
///                 ctx.set_register(Register::B, 0x1234);
///                 Ok(0)
///             }
///             command => Err(DeviceError::InvalidCommand { device: "echo", command }),
///         }
///     }
///
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn as_any_mut(&mut self) -> &mut dyn Any {
///         self
///     }
/// }
/// ```
pub trait Device: Send {
    /// Identification returned by `HWQ`.
    fn info(&self) -> DeviceInfo;

    /// Called once at attach time with the device's own interrupt line.
    fn connect(&mut self, line: InterruptLine) {
        let _ = line;
    }

    /// Handles an `HWI` sent to this device.
    ///
    /// # Returns
    ///
    /// * `Ok(cycles)` - extra cycles the command took, on top of HWI's base cost
    /// * `Err(DeviceError)` - the command was not understood
    fn interrupt(&mut self, ctx: &mut DeviceContext<'_>) -> Result<u16, DeviceError>;

    /// Starts the device's background loop, if it has one.
    fn start(&mut self) {}

    /// Stops and joins the device's background loop, if it has one.
    fn stop(&mut self) {}

    /// Returns a reference to self as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns a mutable reference to self as Any for downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Processor state lent to a device for the duration of one `HWI`.
pub struct DeviceContext<'a> {
    registers: &'a mut Registers,
    memory: &'a mut Memory,
    interrupts: &'a InterruptController,
    index: u16,
}

impl<'a> DeviceContext<'a> {
    pub(crate) fn new(
        registers: &'a mut Registers,
        memory: &'a mut Memory,
        interrupts: &'a InterruptController,
        index: u16,
    ) -> Self {
        Self {
            registers,
            memory,
            interrupts,
            index,
        }
    }

    /// Bus index of the device being interrupted.
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Reads a general-purpose register.
    pub fn register(&self, reg: Register) -> u16 {
        self.registers.get(reg)
    }

    /// Writes a general-purpose register.
    pub fn set_register(&mut self, reg: Register, value: u16) {
        self.registers.set(reg, value);
    }

    /// Reads a memory word.
    pub fn read(&self, addr: u16) -> u16 {
        self.memory.read(addr)
    }

    /// Writes a memory word.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.memory.write(addr, value);
    }

    /// Copies a block of words into memory (wrapping).
    pub fn load(&mut self, addr: u16, words: &[u16]) {
        self.memory.load(addr, words);
    }

    /// Raises an interrupt immediately, tagged with this device's index.
    ///
    /// The message is delivered at the next instruction boundary at the
    /// earliest, never inside the current `HWI`.
    pub fn raise(&self, message: u16) -> Result<(), InterruptError> {
        self.interrupts
            .raise(message, InterruptSource::Device(self.index))
    }
}

/// Ordered collection of attached devices.
///
/// Index order is attachment order and never changes; devices cannot be
/// detached.
#[derive(Default)]
pub struct DeviceBus {
    devices: Vec<Box<dyn Device>>,
    running: bool,
}

impl DeviceBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device, connecting it to `interrupts`, and returns its index.
    ///
    /// A device attached while the bus is running is started immediately.
    pub fn attach(
        &mut self,
        mut device: Box<dyn Device>,
        interrupts: &InterruptController,
    ) -> Result<u16, DeviceError> {
        if self.devices.len() >= MAX_DEVICES {
            return Err(DeviceError::BusFull {
                attached: self.devices.len(),
            });
        }

        let index = self.devices.len() as u16;
        device.connect(interrupts.line_for_device(index));
        if self.running {
            device.start();
        }
        self.devices.push(device);
        Ok(index)
    }

    /// Number of attached devices.
    pub fn len(&self) -> u16 {
        self.devices.len() as u16
    }

    /// Returns true if no devices are attached.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Identification of the device at `index`.
    pub fn info(&self, index: u16) -> Option<DeviceInfo> {
        self.devices.get(index as usize).map(|d| d.info())
    }

    /// Returns the device at `index`.
    pub fn get(&self, index: u16) -> Option<&dyn Device> {
        self.devices.get(index as usize).map(|d| d.as_ref())
    }

    /// Returns the device at `index` mutably.
    pub fn get_mut(&mut self, index: u16) -> Option<&mut (dyn Device + 'static)> {
        self.devices.get_mut(index as usize).map(|d| d.as_mut())
    }

    /// Returns the device at `index` downcast to `T`.
    pub fn device<T: Device + 'static>(&self, index: u16) -> Option<&T> {
        self.get(index)?.as_any().downcast_ref::<T>()
    }

    /// Returns the device at `index` mutably downcast to `T`.
    pub fn device_mut<T: Device + 'static>(&mut self, index: u16) -> Option<&mut T> {
        self.get_mut(index)?.as_any_mut().downcast_mut::<T>()
    }

    /// Starts every device's background loop.
    pub fn start_all(&mut self) {
        if self.running {
            return;
        }
        for device in &mut self.devices {
            device.start();
        }
        self.running = true;
    }

    /// Stops every device's background loop, joining each before returning.
    pub fn stop_all(&mut self) {
        if !self.running {
            return;
        }
        for device in &mut self.devices {
            device.stop();
        }
        self.running = false;
    }

    /// Returns true between `start_all` and `stop_all`.
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl std::fmt::Debug for DeviceBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.devices.iter().map(|d| d.info()))
            .finish()
    }
}
