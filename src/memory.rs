//! # Word-Addressed Memory
//!
//! The DCPU-16 sees a single flat address space of 65536 16-bit words. There is
//! no protected or unmapped region: every 16-bit address names a real cell, and
//! any address arithmetic that runs past 0xFFFF wraps back to 0x0000.
//!
//! ## Design Principles
//!
//! - No bus errors - reads/writes always succeed
//! - Owned exclusively by the [`CPU`](crate::CPU); devices only reach it through
//!   the [`DeviceContext`](crate::DeviceContext) handed to them during `HWI`, or
//!   through an explicit `&Memory` passed to calls such as
//!   [`Lem1802::render`](crate::Lem1802::render)
//! - Zero-initialized at construction

/// Number of addressable words.
pub const MEMORY_WORDS: usize = 0x10000;

/// 64K-word flat memory.
///
/// # Examples
///
/// ```
/// use libdcpu16::Memory;
///
/// let mut mem = Memory::new();
///
/// mem.write(0x1234, 0xBEEF);
/// assert_eq!(mem.read(0x1234), 0xBEEF);
///
/// // Range accesses wrap at the end of the address space
/// mem.load(0xFFFF, &[1, 2]);
/// assert_eq!(mem.read(0xFFFF), 1);
/// assert_eq!(mem.read(0x0000), 2);
/// ```
#[derive(Clone)]
pub struct Memory {
    /// 64K contiguous word array
    words: Box<[u16; MEMORY_WORDS]>,
}

impl Memory {
    /// Creates a new memory with all words initialized to zero.
    pub fn new() -> Self {
        Self {
            words: Box::new([0; MEMORY_WORDS]),
        }
    }

    /// Reads the word at `addr`.
    pub fn read(&self, addr: u16) -> u16 {
        self.words[addr as usize]
    }

    /// Writes `value` to the word at `addr`.
    pub fn write(&mut self, addr: u16, value: u16) {
        self.words[addr as usize] = value;
    }

    /// Copies `words` into memory starting at `start`.
    ///
    /// Addresses wrap modulo the memory size, so a block that runs off the end
    /// continues at 0x0000. Blocks longer than the address space overwrite
    /// their own beginning, exactly as a word-by-word store would.
    pub fn load(&mut self, start: u16, words: &[u16]) {
        let mut addr = start;
        for &word in words {
            self.write(addr, word);
            addr = addr.wrapping_add(1);
        }
    }

    /// Reads `len` words starting at `start`, wrapping at the end of memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use libdcpu16::Memory;
    ///
    /// let mut mem = Memory::new();
    /// mem.load(0x8000, &[0x0041, 0x0042]);
    /// assert_eq!(mem.read_range(0x8000, 3), vec![0x0041, 0x0042, 0x0000]);
    /// ```
    pub fn read_range(&self, start: u16, len: usize) -> Vec<u16> {
        (0..len)
            .map(|i| self.read(start.wrapping_add(i as u16)))
            .collect()
    }

    /// Clears every word back to zero.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Borrows the whole address space as a slice.
    pub fn as_slice(&self) -> &[u16] {
        &self.words[..]
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.words.iter().filter(|&&w| w != 0).count();
        f.debug_struct("Memory")
            .field("words", &MEMORY_WORDS)
            .field("non_zero", &used)
            .finish()
    }
}
