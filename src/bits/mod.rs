//! Storage primitives for the COP2000 board.
//!
//! Everything the machine latches is built from two shapes: one-bit cells
//! (control lines, ALU flags) and 8-bit cells (registers). Control lines
//! additionally come in two polarities, so the one-bit cell exists in an
//! active-high and an active-low flavor.

pub mod flag;
pub mod register;

pub use flag::{Flag, NegFlag};
pub use register::Register;
