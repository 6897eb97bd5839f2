//! The COP2000 machine model.
//!
//! This module implements the complete machine at control-signal level:
//! - the ALU with its eight calculation modes and the CY/Z flag pair;
//! - the three internal buses with single-writer arbitration;
//! - external memory (256×8) and micro-program memory (256×24), each
//!   behind a latched address register;
//! - the control-signal latch fed by the current micro-instruction;
//! - the clock engine that turns one 24-bit control word into bus
//!   traffic and register updates per tick;
//! - the named external surface used by debuggers and the front panel.

pub mod alu;
pub mod bus;
pub mod control;
pub mod execute;
pub mod inspect;
pub mod memory;
pub mod registers;

pub use alu::{Alu, AluOutput, CalcType};
pub use bus::{
    AddrBus, AddrReader, AddrWriter, Bus, BusError, DataBus, DataReader, DataWriter, InstrBus,
    InstrReader, InstrWriter,
};
pub use control::{ControlSignals, INTERRUPT_VECTOR};
pub use execute::Machine;
pub use inspect::{FlagSelect, RegSelect};
pub use memory::{Memory, MemoryError, MicroMemory, MEMORY_SIZE, MICRO_WORD_MASK};
pub use registers::Registers;
