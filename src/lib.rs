//! # COP2K
//!
//! A cycle-accurate behavioral simulator of the COP2000-family 8-bit
//! educational computer.
//!
//! The machine is modeled at control-signal level: three internal buses
//! (data, address, instruction), an ALU with eight calculation modes, a
//! 256-byte main memory and a 256-word micro-program memory, all driven
//! by the 24 control bits of the current micro-instruction. One clock
//! tick latches the control word, resolves bus writers and listeners,
//! and propagates the data.
//!
//! The [`machine`] module is the core; [`repl`] is the interactive
//! front panel built on top of its external surface, and [`ucode`]
//! reads and writes microcode image files.

pub mod bits;
pub mod machine;
pub mod repl;
pub mod ucode;

// Re-export commonly used types
pub use bits::{Flag, NegFlag, Register};
pub use machine::{
    Alu, BusError, CalcType, ControlSignals, FlagSelect, Machine, Memory, MemoryError,
    MicroMemory, RegSelect, Registers,
};
pub use repl::{Repl, ReplError};
pub use ucode::{load_ucode, save_ucode, UcodeError, UcodeFile};
