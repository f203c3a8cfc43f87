//! LEM1802 low-energy monitor.
//!
//! The display is memory-mapped only in the sense that the program tells it
//! *where* its video, font, and palette data live. It never holds a reference
//! to memory: the host's graphics layer calls [`Lem1802::render`] once per
//! frame with a borrow of the CPU's memory, and gets back a [`Frame`] of
//! decoded cells. Turning cells into pixels is the host's job.

use super::{Device, DeviceContext, DeviceError, DeviceInfo};
use crate::memory::Memory;
use crate::registers::Register;
use std::any::Any;

/// Screen width in cells.
pub const WIDTH: usize = 32;
/// Screen height in cells.
pub const HEIGHT: usize = 12;

/// Built-in palette, as 0x0RGB words.
pub const DEFAULT_PALETTE: [u16; 16] = [
    0x0000, 0x000A, 0x00A0, 0x00AA, 0x0A00, 0x0A0A, 0x0A50, 0x0AAA, 0x0555, 0x055F, 0x05F5,
    0x05FF, 0x0F55, 0x0F5F, 0x0FF5, 0x0FFF,
];

/// Built-in font: two words per character, 128 characters.
///
/// Each glyph is 4 columns of 8 pixels. The first word holds columns 0 and 1
/// (high byte first), the second columns 2 and 3; bit 0 is the top row.
pub const DEFAULT_FONT: [u16; 256] = [
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000, 0x0000,
    0x0000, 0x0000, 0x002E, 0x0000, 0x0600, 0x0600, 0x3E14, 0x3E00,
    0x243E, 0x1200, 0x1208, 0x2400, 0x142A, 0x3400, 0x0006, 0x0000,
    0x001C, 0x2200, 0x221C, 0x0000, 0x1408, 0x1400, 0x081C, 0x0800,
    0x2010, 0x0000, 0x0808, 0x0800, 0x0020, 0x0000, 0x3008, 0x0600,
    0x3E22, 0x3E00, 0x243E, 0x2000, 0x3A2A, 0x2E00, 0x222A, 0x3E00,
    0x0E08, 0x3E00, 0x2E2A, 0x3A00, 0x3E2A, 0x3A00, 0x023A, 0x0600,
    0x3E2A, 0x3E00, 0x2E2A, 0x3E00, 0x0014, 0x0000, 0x2014, 0x0000,
    0x0814, 0x2200, 0x1414, 0x1400, 0x2214, 0x0800, 0x022A, 0x0600,
    0x1C2A, 0x2C00, 0x3C0A, 0x3C00, 0x3E2A, 0x1400, 0x1C22, 0x2200,
    0x3E22, 0x1C00, 0x3E2A, 0x2200, 0x3E0A, 0x0200, 0x1C22, 0x3A00,
    0x3E08, 0x3E00, 0x223E, 0x2200, 0x1020, 0x1E00, 0x3E08, 0x3600,
    0x3E20, 0x2000, 0x3E0C, 0x3E00, 0x3E1C, 0x3E00, 0x1C22, 0x1C00,
    0x3E0A, 0x0400, 0x1C32, 0x3C00, 0x3E0A, 0x3400, 0x242A, 0x1200,
    0x023E, 0x0200, 0x1E20, 0x3E00, 0x0E30, 0x0E00, 0x3E18, 0x3E00,
    0x3608, 0x3600, 0x0638, 0x0600, 0x322A, 0x2600, 0x3E22, 0x2200,
    0x0608, 0x3000, 0x2222, 0x3E00, 0x0402, 0x0400, 0x2020, 0x2000,
    0x0204, 0x0000, 0x342C, 0x3800, 0x3E24, 0x1800, 0x1824, 0x2400,
    0x1824, 0x3E00, 0x1834, 0x2C00, 0x083C, 0x0A00, 0x2834, 0x1C00,
    0x3E04, 0x3800, 0x003A, 0x0000, 0x1020, 0x1A00, 0x3E18, 0x2400,
    0x223E, 0x2000, 0x3C1C, 0x3C00, 0x3C04, 0x3800, 0x1824, 0x1800,
    0x3C14, 0x0800, 0x0814, 0x3C00, 0x3804, 0x0400, 0x283C, 0x1400,
    0x043E, 0x2400, 0x1C20, 0x3C00, 0x0C30, 0x0C00, 0x3C38, 0x3C00,
    0x2418, 0x2400, 0x2C30, 0x1C00, 0x343C, 0x2C00, 0x083E, 0x2200,
    0x003E, 0x0000, 0x223E, 0x0800, 0x080C, 0x0400, 0xFEFE, 0xFEFE,
];

/// LEM1802 `HWI` commands (register A).
mod command {
    pub const MEM_MAP_SCREEN: u16 = 0;
    pub const MEM_MAP_FONT: u16 = 1;
    pub const MEM_MAP_PALETTE: u16 = 2;
    pub const SET_BORDER_COLOR: u16 = 3;
    pub const MEM_DUMP_FONT: u16 = 4;
    pub const MEM_DUMP_PALETTE: u16 = 5;
}

/// One decoded character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// 7-bit character code
    pub character: u8,
    /// Foreground colour, 0x0RGB
    pub foreground: u16,
    /// Background colour, 0x0RGB
    pub background: u16,
    /// Blink attribute
    pub blink: bool,
    /// The two glyph words for this character, from font RAM or the
    /// built-in font
    pub glyph: [u16; 2],
}

/// A rendered screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Row-major cells, `WIDTH * HEIGHT` of them
    pub cells: Vec<Cell>,
    /// Border colour, 0x0RGB
    pub border: u16,
}

impl Frame {
    /// Returns the cell at column `x`, row `y`.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= WIDTH || y >= HEIGHT {
            return None;
        }
        self.cells.get(y * WIDTH + x)
    }

    /// Renders the character layer as text, one line per row.
    ///
    /// Control characters become spaces; useful for terminal front ends and
    /// tests.
    pub fn text(&self) -> String {
        self.cells
            .chunks(WIDTH)
            .map(|row| {
                row.iter()
                    .map(|cell| match cell.character {
                        c @ 0x20..=0x7E => c as char,
                        _ => ' ',
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// LEM1802 display (id 0x7349F615, version 0x1802, Nya Elektriska).
///
/// | A | Name             | Effect                                                 |
/// |---|------------------|--------------------------------------------------------|
/// | 0 | MEM_MAP_SCREEN   | video RAM = B (0 disconnects the display)              |
/// | 1 | MEM_MAP_FONT     | font RAM = B (0 uses the built-in font)                |
/// | 2 | MEM_MAP_PALETTE  | palette RAM = B (0 uses the built-in palette)          |
/// | 3 | SET_BORDER_COLOR | border = palette index B & 0xF                         |
/// | 4 | MEM_DUMP_FONT    | copy the built-in font to B (256 cycles)               |
/// | 5 | MEM_DUMP_PALETTE | copy the built-in palette to B (16 cycles)             |
///
/// # Example
///
/// ```rust
/// use libdcpu16::{Lem1802, Memory};
///
/// let display = Lem1802::with_screen(0x8000);
/// let mut memory = Memory::new();
/// memory.write(0x8000, 0xF048); // white-on-black 'H'
///
/// let frame = display.render(&memory).unwrap();
/// assert_eq!(frame.cell(0, 0).unwrap().character, b'H');
/// assert_eq!(frame.cell(0, 0).unwrap().foreground, 0x0FFF);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lem1802 {
    screen: u16,
    font: u16,
    palette: u16,
    border: u16,
}

impl Lem1802 {
    /// Hardware id reported by HWQ.
    pub const ID: u32 = 0x7349_F615;
    /// Hardware version reported by HWQ.
    pub const VERSION: u16 = 0x1802;
    /// Manufacturer id reported by HWQ.
    pub const MANUFACTURER: u32 = 0x1C6C_8B36;

    /// Creates a disconnected display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a display already mapped to video RAM at `screen`.
    pub fn with_screen(screen: u16) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    /// Video RAM base (0 = disconnected).
    pub fn screen_map(&self) -> u16 {
        self.screen
    }

    /// Font RAM base (0 = built-in).
    pub fn font_map(&self) -> u16 {
        self.font
    }

    /// Palette RAM base (0 = built-in).
    pub fn palette_map(&self) -> u16 {
        self.palette
    }

    /// Border palette index.
    pub fn border_color(&self) -> u16 {
        self.border
    }

    /// Returns true while video RAM is mapped.
    pub fn is_connected(&self) -> bool {
        self.screen != 0
    }

    fn glyph(&self, memory: &Memory, character: u8) -> [u16; 2] {
        let offset = character as u16 * 2;
        if self.font == 0 {
            let offset = offset as usize;
            [DEFAULT_FONT[offset], DEFAULT_FONT[offset + 1]]
        } else {
            let base = self.font.wrapping_add(offset);
            [memory.read(base), memory.read(base.wrapping_add(1))]
        }
    }

    fn color(&self, memory: &Memory, index: u16) -> u16 {
        let index = index & 0xF;
        if self.palette == 0 {
            DEFAULT_PALETTE[index as usize]
        } else {
            memory.read(self.palette.wrapping_add(index)) & 0x0FFF
        }
    }

    /// Decodes the current screen contents.
    ///
    /// Returns `None` while the display is disconnected.
    pub fn render(&self, memory: &Memory) -> Option<Frame> {
        if !self.is_connected() {
            return None;
        }

        let cells = memory
            .read_range(self.screen, WIDTH * HEIGHT)
            .into_iter()
            .map(|word| {
                let character = (word & 0x7F) as u8;
                Cell {
                    character,
                    foreground: self.color(memory, word >> 12),
                    background: self.color(memory, word >> 8),
                    blink: word & 0x80 != 0,
                    glyph: self.glyph(memory, character),
                }
            })
            .collect();

        Some(Frame {
            cells,
            border: self.color(memory, self.border),
        })
    }
}

impl Device for Lem1802 {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            id: Self::ID,
            version: Self::VERSION,
            manufacturer: Self::MANUFACTURER,
        }
    }

    fn interrupt(&mut self, ctx: &mut DeviceContext<'_>) -> Result<u16, DeviceError> {
        let b = ctx.register(Register::B);

        match ctx.register(Register::A) {
            command::MEM_MAP_SCREEN => self.screen = b,
            command::MEM_MAP_FONT => self.font = b,
            command::MEM_MAP_PALETTE => self.palette = b,
            command::SET_BORDER_COLOR => self.border = b & 0xF,
            command::MEM_DUMP_FONT => {
                ctx.load(b, &DEFAULT_FONT);
                return Ok(DEFAULT_FONT.len() as u16);
            }
            command::MEM_DUMP_PALETTE => {
                ctx.load(b, &DEFAULT_PALETTE);
                return Ok(DEFAULT_PALETTE.len() as u16);
            }
            other => {
                return Err(DeviceError::InvalidCommand {
                    device: "LEM1802",
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
