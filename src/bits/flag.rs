//! One-bit cells with explicit polarity conventions.
//!
//! The COP2000 control lines come in two flavors. Ordinary flags assert
//! their condition with a stored 1. Active-low ("negated") lines assert
//! by pulling the stored bit to 0; on the real board these are the
//! signals whose names carry an overbar.
//!
//! Both types expose the same vocabulary: `set()` asserts the condition,
//! `clear()` deasserts it, and `write()` stores a raw bit with no
//! polarity translation. `get()` always returns raw storage, so for a
//! [`NegFlag`] "currently asserted" reads as `get() == false`.

use serde::{Deserialize, Serialize};

/// Active-high one-bit cell: the condition holds when the stored bit is 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    bit: bool,
}

impl Flag {
    /// Create a flag with the given raw storage bit.
    pub const fn new(bit: bool) -> Self {
        Self { bit }
    }

    /// Raw storage bit.
    #[inline]
    pub const fn get(self) -> bool {
        self.bit
    }

    /// True when the condition holds.
    #[inline]
    pub const fn asserted(self) -> bool {
        self.bit
    }

    /// Assert the condition (stores 1).
    #[inline]
    pub fn set(&mut self) {
        self.bit = true;
    }

    /// Deassert the condition (stores 0).
    #[inline]
    pub fn clear(&mut self) {
        self.bit = false;
    }

    /// Write the raw storage bit.
    #[inline]
    pub fn write(&mut self, bit: bool) {
        self.bit = bit;
    }
}

/// Active-low one-bit cell: the condition holds when the stored bit is 0.
///
/// `set()`/`clear()` speak in terms of the *condition*, not the storage:
/// `set()` asserts (stores 0) and `clear()` deasserts (stores 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegFlag {
    bit: bool,
}

impl NegFlag {
    /// Create a negated flag with the given raw storage bit.
    pub const fn new(bit: bool) -> Self {
        Self { bit }
    }

    /// Raw storage bit. Asserted corresponds to `false`.
    #[inline]
    pub const fn get(self) -> bool {
        self.bit
    }

    /// True when the condition holds (stored bit is 0).
    #[inline]
    pub const fn asserted(self) -> bool {
        !self.bit
    }

    /// Assert the condition (stores 0).
    #[inline]
    pub fn set(&mut self) {
        self.bit = false;
    }

    /// Deassert the condition (stores 1).
    #[inline]
    pub fn clear(&mut self) {
        self.bit = true;
    }

    /// Write the raw storage bit.
    #[inline]
    pub fn write(&mut self, bit: bool) {
        self.bit = bit;
    }
}

impl Default for NegFlag {
    /// A fresh negated line is deasserted, i.e. the stored bit is 1.
    fn default() -> Self {
        Self { bit: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_polarity() {
        let mut f = Flag::default();
        assert!(!f.get());
        assert!(!f.asserted());

        f.set();
        assert!(f.get());
        assert!(f.asserted());

        f.clear();
        assert!(!f.get());
    }

    #[test]
    fn test_neg_flag_polarity() {
        let mut f = NegFlag::default();
        // Fresh line is deasserted: raw storage reads 1.
        assert!(f.get());
        assert!(!f.asserted());

        f.set();
        assert!(!f.get());
        assert!(f.asserted());

        f.clear();
        assert!(f.get());
        assert!(!f.asserted());
    }

    #[test]
    fn test_raw_write_bypasses_polarity() {
        let mut f = NegFlag::default();
        f.write(false);
        assert!(f.asserted());
        f.write(true);
        assert!(!f.asserted());

        let mut g = Flag::default();
        g.write(true);
        assert!(g.asserted());
    }
}
