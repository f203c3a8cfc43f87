//! WASM API for the DCPU-16 emulator.
//!
//! Provides JavaScript-callable interfaces for CPU control, state inspection,
//! keyboard input, display readout and disassembly.
//!
//! Browsers have no threads to spare for the clock's ticker, so devices are
//! never started here; the page drives the clock with `tick_clock` from its
//! own timer.

use crate::disassembler::{decode_instruction, format_instruction, Instruction};
use crate::{GenericClock, GenericKeyboard, KeyboardHandle, Lem1802, Register, CPU};
use wasm_bindgen::prelude::*;

/// Bus index of the display.
const DISPLAY: u16 = 0;
/// Bus index of the clock.
const CLOCK: u16 = 2;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl<E: std::error::Error> From<E> for JsError {
    fn from(err: E) -> Self {
        JsError {
            message: err.to_string(),
        }
    }
}

/// Result of disassembly operation
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct DisassemblyLine {
    address: u16,
    words: Vec<u16>,
    text: String,
}

#[wasm_bindgen]
impl DisassemblyLine {
    #[wasm_bindgen(getter)]
    pub fn address(&self) -> u16 {
        self.address
    }

    #[wasm_bindgen(getter)]
    pub fn words(&self) -> Vec<u16> {
        self.words.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn text(&self) -> String {
        self.text.clone()
    }
}

/// Main emulator interface for JavaScript
#[wasm_bindgen]
pub struct Dcpu16Emulator {
    cpu: CPU,
    keyboard: KeyboardHandle,
}

#[wasm_bindgen]
impl Dcpu16Emulator {
    /// Create a new emulator with display (0), keyboard (1) and clock (2) attached
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Dcpu16Emulator, JsError> {
        let mut cpu = CPU::new();
        let keyboard = GenericKeyboard::new();
        let handle = keyboard.handle();

        cpu.attach(Box::new(Lem1802::new()))?;
        cpu.attach(Box::new(keyboard))?;
        cpu.attach(Box::new(GenericClock::new()))?;

        Ok(Dcpu16Emulator {
            cpu,
            keyboard: handle,
        })
    }

    /// Execute a single instruction, returning its cycle cost
    pub fn step(&mut self) -> Result<u32, JsError> {
        Ok(self.cpu.step()? as u32)
    }

    /// Execute multiple cycles and return actual cycles executed
    pub fn run_for_cycles(&mut self, cycles: u32) -> Result<u32, JsError> {
        Ok(self.cpu.run_for_cycles(cycles as u64)? as u32)
    }

    /// Reset the CPU; memory and devices are kept
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    // Register getters
    #[wasm_bindgen(getter)]
    pub fn a(&self) -> u16 {
        self.cpu.register(Register::A)
    }

    #[wasm_bindgen(getter)]
    pub fn b(&self) -> u16 {
        self.cpu.register(Register::B)
    }

    #[wasm_bindgen(getter)]
    pub fn c(&self) -> u16 {
        self.cpu.register(Register::C)
    }

    #[wasm_bindgen(getter)]
    pub fn x(&self) -> u16 {
        self.cpu.register(Register::X)
    }

    #[wasm_bindgen(getter)]
    pub fn y(&self) -> u16 {
        self.cpu.register(Register::Y)
    }

    #[wasm_bindgen(getter)]
    pub fn z(&self) -> u16 {
        self.cpu.register(Register::Z)
    }

    #[wasm_bindgen(getter)]
    pub fn i(&self) -> u16 {
        self.cpu.register(Register::I)
    }

    #[wasm_bindgen(getter)]
    pub fn j(&self) -> u16 {
        self.cpu.register(Register::J)
    }

    #[wasm_bindgen(getter)]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    #[wasm_bindgen(getter)]
    pub fn sp(&self) -> u16 {
        self.cpu.sp()
    }

    #[wasm_bindgen(getter)]
    pub fn ex(&self) -> u16 {
        self.cpu.ex()
    }

    #[wasm_bindgen(getter)]
    pub fn ia(&self) -> u16 {
        self.cpu.ia()
    }

    #[wasm_bindgen(getter)]
    pub fn cycles(&self) -> f64 {
        self.cpu.cycles() as f64 // Convert u64 to f64 for JavaScript
    }

    /// Set the program counter
    pub fn set_pc(&mut self, addr: u16) {
        self.cpu.set_pc(addr);
    }

    // Keyboard methods

    /// Type a key (ASCII or one of the keyboard's special codes)
    pub fn key_typed(&self, key: u16) {
        self.keyboard.key_typed(key);
    }

    /// Report a key as pressed
    pub fn key_down(&self, key: u16) {
        self.keyboard.key_down(key);
    }

    /// Report a key as released
    pub fn key_up(&self, key: u16) {
        self.keyboard.key_up(key);
    }

    // Clock

    /// Advance the clock by one tick; returns false while it is off
    pub fn tick_clock(&mut self) -> bool {
        self.cpu
            .device_mut::<GenericClock>(CLOCK)
            .map_or(false, |clock| clock.tick())
    }

    // Display

    /// Current screen as `[char|blink<<7, fg, bg]` triples followed by the
    /// border colour, or undefined while the display is disconnected
    pub fn frame(&self) -> Option<js_sys::Uint16Array> {
        let display = self.cpu.device::<Lem1802>(DISPLAY)?;
        let frame = display.render(self.cpu.memory())?;

        let mut words = Vec::with_capacity(frame.cells.len() * 3 + 1);
        for cell in &frame.cells {
            words.push(cell.character as u16 | (cell.blink as u16) << 7);
            words.push(cell.foreground);
            words.push(cell.background);
        }
        words.push(frame.border);

        Some(js_sys::Uint16Array::from(words.as_slice()))
    }

    /// Current screen as plain text, one line per row
    pub fn screen_text(&self) -> Option<String> {
        let display = self.cpu.device::<Lem1802>(DISPLAY)?;
        display.render(self.cpu.memory()).map(|frame| frame.text())
    }

    // Memory access methods

    /// Read a single word from memory
    pub fn read_memory(&self, addr: u16) -> u16 {
        self.cpu.memory().read(addr)
    }

    /// Write a single word to memory
    pub fn write_memory(&mut self, addr: u16, value: u16) {
        self.cpu.memory_mut().write(addr, value);
    }

    /// Read a 256-word page from memory (for efficient display)
    pub fn get_memory_page(&self, page: u8) -> js_sys::Uint16Array {
        let words = self.cpu.read_memory((page as u16) << 8, 256);
        js_sys::Uint16Array::from(words.as_slice())
    }

    /// Load a program into memory and set PC
    pub fn load_program(&mut self, program: &[u16], start_addr: u16) {
        self.cpu.load_program(program, start_addr);
    }

    /// Disassemble memory starting at an address
    pub fn disassemble(&self, start_addr: u16, num_instructions: u32) -> Vec<JsValue> {
        let mut address = start_addr;
        let mut lines = Vec::with_capacity(num_instructions as usize);

        for _ in 0..num_instructions {
            let words = self.cpu.read_memory(address, 3);
            let instr = decode_instruction(&words, address)
                .unwrap_or_else(|| Instruction::data(address, words[0]));
            let size = instr.size_words as usize;

            lines.push(JsValue::from(DisassemblyLine {
                address,
                words: words[..size].to_vec(),
                text: format_instruction(&instr),
            }));
            address = address.wrapping_add(size as u16);
        }

        lines
    }
}
