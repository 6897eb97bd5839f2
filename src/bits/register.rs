//! The 8-bit storage cell every register on the board is made of.

use serde::{Deserialize, Serialize};

/// An 8-bit register cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    data: u8,
}

impl Register {
    /// Create a register holding the given value.
    pub const fn new(data: u8) -> Self {
        Self { data }
    }

    /// Current value.
    #[inline]
    pub const fn get(self) -> u8 {
        self.data
    }

    /// Overwrite the value.
    #[inline]
    pub fn set(&mut self, val: u8) {
        self.data = val;
    }

    /// Add one, wrapping at 256. Used by the PC and µPC counters.
    #[inline]
    pub fn increment(&mut self) {
        self.data = self.data.wrapping_add(1);
    }
}
