//! The COP2000 register file.
//!
//! All registers are 8 bits wide. Besides the architectural set (PC,
//! MAR, IA, ST, IN, OUT, IR) this holds the micro-program counter, the
//! four general registers R0-R3 selected by the SB/SA pair, the ALU
//! operand registers A and W, the three ALU output latches L/D/R, and
//! the front-panel data-bus override value.

use crate::bits::Register;
use serde::{Deserialize, Serialize};

/// Reset value of the interrupt-address register.
pub const INTERRUPT_ADDRESS_RESET: u8 = 0xE0;

/// The full register file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registers {
    /// Program counter; drives the address bus under PCOE.
    pub pc: Register,
    /// Memory-address register; drives the address bus under MAROE.
    pub mar: Register,
    /// Interrupt-address register.
    pub ia: Register,
    /// Status register.
    pub st: Register,
    /// Input port (named `input` because `in` is reserved).
    pub input: Register,
    /// Output port.
    pub output: Register,
    /// Instruction register, latched from the instruction bus.
    pub ir: Register,
    /// Micro-program counter.
    pub upc: Register,
    /// Value driven onto the data bus by the front-panel override.
    pub manual_dbus_input: Register,
    pub r0: Register,
    pub r1: Register,
    pub r2: Register,
    pub r3: Register,
    /// ALU operand registers.
    pub a: Register,
    pub w: Register,
    /// ALU output latches: left-shifted, direct, right-shifted.
    pub l: Register,
    pub d: Register,
    pub r: Register,
}

impl Registers {
    /// Reset state: everything zero except IA.
    pub fn new() -> Self {
        Self {
            pc: Register::default(),
            mar: Register::default(),
            ia: Register::new(INTERRUPT_ADDRESS_RESET),
            st: Register::default(),
            input: Register::default(),
            output: Register::default(),
            ir: Register::default(),
            upc: Register::default(),
            manual_dbus_input: Register::default(),
            r0: Register::default(),
            r1: Register::default(),
            r2: Register::default(),
            r3: Register::default(),
            a: Register::default(),
            w: Register::default(),
            l: Register::default(),
            d: Register::default(),
            r: Register::default(),
        }
    }

    /// Read the general register selected by the SB/SA pair.
    pub fn general(&self, select: u8) -> u8 {
        match select & 0b11 {
            0 => self.r0.get(),
            1 => self.r1.get(),
            2 => self.r2.get(),
            _ => self.r3.get(),
        }
    }

    /// Write the general register selected by the SB/SA pair.
    pub fn set_general(&mut self, select: u8, val: u8) {
        match select & 0b11 {
            0 => self.r0.set(val),
            1 => self.r1.set(val),
            2 => self.r2.set(val),
            _ => self.r3.set(val),
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
