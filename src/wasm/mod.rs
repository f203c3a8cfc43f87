//! WebAssembly bindings for the DCPU-16 emulator.
//!
//! This module provides JavaScript-callable interfaces to the emulator core,
//! enabling browser-based execution of DCPU-16 programs with a keyboard, an
//! LEM1802 display and a clock.

#[cfg(feature = "wasm")]
pub mod api;

#[cfg(feature = "wasm")]
pub use api::Dcpu16Emulator;
