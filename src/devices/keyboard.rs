//! Generic keyboard device.
//!
//! Keystrokes arrive from the host on its own thread (a terminal or window
//! event pump) through a [`KeyboardHandle`]. The handle buffers typed keys,
//! tracks held keys, and raises the configured interrupt message. The CPU
//! drains the buffer through `HWI`.

use super::{Device, DeviceContext, DeviceError, DeviceInfo, InterruptLine};
use crate::registers::Register;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Key codes understood by the generic keyboard.
///
/// Printable ASCII (0x20-0x7F) is passed through unchanged.
pub mod key {
    pub const BACKSPACE: u16 = 0x10;
    pub const RETURN: u16 = 0x11;
    pub const INSERT: u16 = 0x12;
    pub const DELETE: u16 = 0x13;
    pub const ARROW_UP: u16 = 0x80;
    pub const ARROW_DOWN: u16 = 0x81;
    pub const ARROW_LEFT: u16 = 0x82;
    pub const ARROW_RIGHT: u16 = 0x83;
    pub const SHIFT: u16 = 0x90;
    pub const CONTROL: u16 = 0x91;
}

/// Buffered keystrokes before new ones are dropped.
pub const KEY_BUFFER_CAPACITY: usize = 64;

const HELD_KEYS: usize = 0x100;

/// Generic keyboard `HWI` commands (register A).
///
/// | A | Name              | Effect                                         |
/// |---|-------------------|------------------------------------------------|
/// | 0 | CLEAR_BUFFER      | discard buffered keys                          |
/// | 1 | GET_NEXT          | C = next buffered key, or 0 if empty           |
/// | 2 | CHECK_KEY         | C = 1 if key B is currently held, else 0       |
/// | 3 | SET_INT           | interrupt message = B (0 disables interrupts)  |
mod command {
    pub const CLEAR_BUFFER: u16 = 0;
    pub const GET_NEXT: u16 = 1;
    pub const CHECK_KEY: u16 = 2;
    pub const SET_INT: u16 = 3;
}

struct KeyboardState {
    buffer: VecDeque<u16>,
    held: [bool; HELD_KEYS],
    interrupt_message: u16,
    line: Option<InterruptLine>,
    dropped_keys: u64,
}

impl KeyboardState {
    fn notify(&self) {
        if self.interrupt_message == 0 {
            return;
        }
        if let Some(line) = &self.line {
            if let Err(err) = line.raise(self.interrupt_message) {
                log::warn!("keyboard interrupt lost: {}", err);
            }
        }
    }
}

type Shared = Arc<Mutex<KeyboardState>>;

fn lock(shared: &Shared) -> MutexGuard<'_, KeyboardState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Generic keyboard (id 0x30CF7406, version 1).
///
/// # Example
///
/// ```rust
/// use libdcpu16::{GenericKeyboard, CPU};
///
/// let keyboard = GenericKeyboard::new();
/// let input = keyboard.handle();
///
/// let mut cpu = CPU::new();
/// cpu.attach(Box::new(keyboard)).unwrap();
///
/// // From any thread:
/// input.key_typed(b'h' as u16);
/// assert_eq!(input.buffered(), 1);
/// ```
pub struct GenericKeyboard {
    shared: Shared,
}

impl GenericKeyboard {
    /// Hardware id reported by HWQ.
    pub const ID: u32 = 0x30CF_7406;
    /// Hardware version reported by HWQ.
    pub const VERSION: u16 = 1;

    /// Creates a keyboard with an empty buffer and interrupts disabled.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(KeyboardState {
                buffer: VecDeque::with_capacity(KEY_BUFFER_CAPACITY),
                held: [false; HELD_KEYS],
                interrupt_message: 0,
                line: None,
                dropped_keys: 0,
            })),
        }
    }

    /// Returns a host-side input handle.
    pub fn handle(&self) -> KeyboardHandle {
        KeyboardHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Current interrupt message (0 = disabled).
    pub fn interrupt_message(&self) -> u16 {
        lock(&self.shared).interrupt_message
    }
}

impl Default for GenericKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for GenericKeyboard {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: Self::ID,
            version: Self::VERSION,
            manufacturer: 0,
        }
    }

    fn connect(&mut self, line: InterruptLine) {
        lock(&self.shared).line = Some(line);
    }

    fn interrupt(&mut self, ctx: &mut DeviceContext<'_>) -> Result<u16, DeviceError> {
        let mut state = lock(&self.shared);

        match ctx.register(Register::A) {
            command::CLEAR_BUFFER => state.buffer.clear(),
            command::GET_NEXT => {
                let next = state.buffer.pop_front().unwrap_or(0);
                ctx.set_register(Register::C, next);
            }
            command::CHECK_KEY => {
                let key = ctx.register(Register::B) as usize;
                let held = key < HELD_KEYS && state.held[key];
                ctx.set_register(Register::C, held as u16);
            }
            command::SET_INT => state.interrupt_message = ctx.register(Register::B),
            other => {
                return Err(DeviceError::InvalidCommand {
                    device: "generic keyboard",
                    command: other,
                })
            }
        }

        Ok(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Cloneable, thread-safe input side of a [`GenericKeyboard`].
#[derive(Clone)]
pub struct KeyboardHandle {
    shared: Shared,
}

impl KeyboardHandle {
    /// Queues a typed key and raises the keyboard interrupt.
    ///
    /// If the buffer is full the key is dropped (and counted), but the
    /// interrupt is still raised so the program notices the activity.
    pub fn key_typed(&self, key: u16) {
        let mut state = lock(&self.shared);
        if state.buffer.len() < KEY_BUFFER_CAPACITY {
            state.buffer.push_back(key);
        } else {
            state.dropped_keys += 1;
            log::warn!("keyboard buffer full, dropped key 0x{:04X}", key);
        }
        state.notify();
    }

    /// Marks a key as held and raises the keyboard interrupt.
    pub fn key_down(&self, key: u16) {
        let mut state = lock(&self.shared);
        if let Some(held) = state.held.get_mut(key as usize) {
            *held = true;
        }
        state.notify();
    }

    /// Marks a key as released and raises the keyboard interrupt.
    pub fn key_up(&self, key: u16) {
        let mut state = lock(&self.shared);
        if let Some(held) = state.held.get_mut(key as usize) {
            *held = false;
        }
        state.notify();
    }

    /// Number of keys waiting in the buffer.
    pub fn buffered(&self) -> usize {
        lock(&self.shared).buffer.len()
    }

    /// Number of keys dropped because the buffer was full.
    pub fn dropped_keys(&self) -> u64 {
        lock(&self.shared).dropped_keys
    }
}

impl std::fmt::Debug for KeyboardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardHandle")
            .field("buffered", &self.buffered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::InterruptController;
    use crate::memory::Memory;
    use crate::registers::Registers;

    fn send(keyboard: &mut GenericKeyboard, registers: &mut Registers) -> Result<u16, DeviceError> {
        let interrupts = InterruptController::default();
        let mut memory = Memory::new();
        let mut ctx = DeviceContext::new(registers, &mut memory, &interrupts, 0);
        keyboard.interrupt(&mut ctx)
    }

    #[test]
    fn test_get_next_drains_in_order() {
        let mut keyboard = GenericKeyboard::new();
        let input = keyboard.handle();
        input.key_typed(b'a' as u16);
        input.key_typed(key::RETURN);

        let mut regs = Registers::default();
        regs.set(Register::A, command::GET_NEXT);

        send(&mut keyboard, &mut regs).unwrap();
        assert_eq!(regs.get(Register::C), b'a' as u16);
        send(&mut keyboard, &mut regs).unwrap();
        assert_eq!(regs.get(Register::C), key::RETURN);
        send(&mut keyboard, &mut regs).unwrap();
        assert_eq!(regs.get(Register::C), 0);
    }

    #[test]
    fn test_buffer_overflow_drops_newest() {
        let keyboard = GenericKeyboard::new();
        let input = keyboard.handle();

        for i in 0..(KEY_BUFFER_CAPACITY as u16 + 3) {
            input.key_typed(0x20 + (i % 0x5F));
        }

        assert_eq!(input.buffered(), KEY_BUFFER_CAPACITY);
        assert_eq!(input.dropped_keys(), 3);
    }

    #[test]
    fn test_check_key_ignores_out_of_range_codes() {
        let mut keyboard = GenericKeyboard::new();
        keyboard.handle().key_down(0xFFFF);

        let mut regs = Registers::default();
        regs.set(Register::A, command::CHECK_KEY);
        regs.set(Register::B, 0xFFFF);
        regs.set(Register::C, 0x5555);

        send(&mut keyboard, &mut regs).unwrap();
        assert_eq!(regs.get(Register::C), 0);
    }
}
