//! Main memory and micro-program memory.
//!
//! Both stores sit behind a latched 8-bit address register: the engine
//! never addresses a cell directly, it latches an address (from the ABus
//! for EM, from the µPC for UM) and then reads or writes "the current
//! cell". Debuggers and loaders use the bypass accessors instead, which
//! leave the latch untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of cells in either memory.
pub const MEMORY_SIZE: usize = 256;

/// A micro-instruction word is 24 bits wide; bit 23 is reserved.
pub const MICRO_WORD_MASK: u32 = 0x00FF_FFFF;

/// Errors raised by the bypass accessors and bulk loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Address outside the 256-cell range.
    #[error("address {0} out of range (0-255)")]
    AddressOutOfRange(usize),

    /// Value does not fit in the cell width.
    #[error("value {0:#x} does not fit in the cell width")]
    ValueOutOfRange(u32),

    /// A bulk image is larger than the memory it targets.
    #[error("image of {size} words exceeds the {capacity}-word memory")]
    ImageTooLarge { size: usize, capacity: usize },
}

/// External memory (EM): 256 bytes behind a latched address register.
#[derive(Clone, Serialize, Deserialize)]
pub struct Memory {
    cells: Vec<u8>,
    addr: u8,
}

impl Memory {
    /// Create a zeroed memory with the address latch at 0.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
            addr: 0,
        }
    }

    /// Latch a new address.
    #[inline]
    pub fn set_addr(&mut self, addr: u8) {
        self.addr = addr;
    }

    /// Currently latched address.
    #[inline]
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Read the cell behind the latched address.
    #[inline]
    pub fn read(&self) -> u8 {
        self.cells[self.addr as usize]
    }

    /// Write the cell behind the latched address.
    #[inline]
    pub fn write(&mut self, val: u8) {
        self.cells[self.addr as usize] = val;
    }

    /// Read a cell directly, leaving the address latch untouched.
    pub fn get_at(&self, addr: usize) -> Result<u8, MemoryError> {
        if addr >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(addr));
        }

        Ok(self.cells[addr])
    }

    /// Write a cell directly, leaving the address latch untouched.
    pub fn set_at(&mut self, addr: usize, val: u32) -> Result<(), MemoryError> {
        if addr >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        if val > u8::MAX as u32 {
            return Err(MemoryError::ValueOutOfRange(val));
        }

        self.cells[addr] = val as u8;
        Ok(())
    }

    /// Zero every cell. The address latch is left alone.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&c| c != 0).count();

        f.debug_struct("Memory")
            .field("addr", &self.addr)
            .field("non_zero_cells", &non_zero)
            .finish()
    }
}

/// Micro-program memory (UM): 256 words of 24 bits, behind its own
/// address latch. The clock engine keeps the latch equal to the µPC and
/// only ever reads; loaders fill it through the bypass accessors.
#[derive(Clone, Serialize, Deserialize)]
pub struct MicroMemory {
    cells: Vec<u32>,
    addr: u8,
}

impl MicroMemory {
    /// Create a zeroed micro-program memory with the address latch at 0.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
            addr: 0,
        }
    }

    /// Latch a new address.
    #[inline]
    pub fn set_addr(&mut self, addr: u8) {
        self.addr = addr;
    }

    /// Currently latched address.
    #[inline]
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// Read the word behind the latched address.
    #[inline]
    pub fn read(&self) -> u32 {
        self.cells[self.addr as usize]
    }

    /// Read a word directly, leaving the address latch untouched.
    pub fn get_at(&self, addr: usize) -> Result<u32, MemoryError> {
        if addr >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(addr));
        }

        Ok(self.cells[addr])
    }

    /// Write a word directly, leaving the address latch untouched.
    pub fn set_at(&mut self, addr: usize, word: u32) -> Result<(), MemoryError> {
        if addr >= MEMORY_SIZE {
            return Err(MemoryError::AddressOutOfRange(addr));
        }
        if word > MICRO_WORD_MASK {
            return Err(MemoryError::ValueOutOfRange(word));
        }

        self.cells[addr] = word;
        Ok(())
    }

    /// Load an image starting at address 0.
    pub fn load_image(&mut self, words: &[u32]) -> Result<(), MemoryError> {
        if words.len() > MEMORY_SIZE {
            return Err(MemoryError::ImageTooLarge {
                size: words.len(),
                capacity: MEMORY_SIZE,
            });
        }

        for (addr, &word) in words.iter().enumerate() {
            if word > MICRO_WORD_MASK {
                return Err(MemoryError::ValueOutOfRange(word));
            }
            self.cells[addr] = word;
        }

        Ok(())
    }
}

impl Default for MicroMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MicroMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|&&c| c != 0).count();

        f.debug_struct("MicroMemory")
            .field("addr", &self.addr)
            .field("non_zero_cells", &non_zero)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latched_read_write() {
        let mut mem = Memory::new();
        mem.set_addr(0x10);
        mem.write(0x9C);

        assert_eq!(mem.read(), 0x9C);
        assert_eq!(mem.get_at(0x10).unwrap(), 0x9C);
        // Other cells are untouched.
        assert_eq!(mem.get_at(0x11).unwrap(), 0);
    }

    #[test]
    fn test_bypass_leaves_latch_alone() {
        let mut mem = Memory::new();
        mem.set_addr(0x42);
        mem.set_at(0x03, 0xAB).unwrap();

        assert_eq!(mem.addr(), 0x42);
        assert_eq!(mem.get_at(0x03).unwrap(), 0xAB);
    }

    #[test]
    fn test_bypass_range_checks() {
        let mut mem = Memory::new();
        assert_eq!(mem.get_at(256), Err(MemoryError::AddressOutOfRange(256)));
        assert_eq!(
            mem.set_at(0, 256),
            Err(MemoryError::ValueOutOfRange(256))
        );
        assert_eq!(
            mem.set_at(300, 0),
            Err(MemoryError::AddressOutOfRange(300))
        );
    }

    #[test]
    fn test_micro_word_width() {
        let mut um = MicroMemory::new();
        um.set_at(0, MICRO_WORD_MASK).unwrap();
        assert_eq!(um.get_at(0).unwrap(), 0xFF_FFFF);

        assert_eq!(
            um.set_at(0, 0x0100_0000),
            Err(MemoryError::ValueOutOfRange(0x0100_0000))
        );
    }

    #[test]
    fn test_load_image() {
        let mut um = MicroMemory::new();
        um.load_image(&[0x000001, 0x000002, 0x000003]).unwrap();

        assert_eq!(um.get_at(0).unwrap(), 1);
        assert_eq!(um.get_at(2).unwrap(), 3);
        assert_eq!(um.get_at(3).unwrap(), 0);

        let too_big = vec![0u32; MEMORY_SIZE + 1];
        assert_eq!(
            um.load_image(&too_big),
            Err(MemoryError::ImageTooLarge {
                size: 257,
                capacity: 256
            })
        );
    }
}
