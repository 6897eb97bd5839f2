//! Internal bus abstraction.
//!
//! The COP2000 has three internal buses: the data bus (DBus), the address
//! bus (ABus) and the instruction bus (IBus). Each is an 8-bit wire with
//! at most one *writer* driving it and any number of *listeners* latching
//! from it. The wiring phase of a clock tick nominates the writer and the
//! listeners from the control signals; the transfer phase then moves the
//! data. A second writer nomination is a wiring fault and surfaces as
//! [`BusError::Conflict`]: on the real board that would be two tri-state
//! drivers fighting over the same lines.
//!
//! Bus content is tick-scoped: writer, listeners and data are all cleared
//! at the start of each wiring phase.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by bus arbitration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// A second writer tried to drive a bus that already has one.
    #[error("this bus already has a writer")]
    Conflict,

    /// Bus data was accessed while nothing drives the bus.
    #[error("this bus has no writer")]
    NoWriter,
}

/// An internal bus with single-writer arbitration.
///
/// `W` tags the possible driving sources, `R` the possible listeners.
/// The data byte is only meaningful while a writer is set; accessing it
/// otherwise is a [`BusError::NoWriter`] fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus<W, R> {
    writer: Option<W>,
    readers: Vec<R>,
    data: u8,
}

impl<W: Copy, R: Copy> Bus<W, R> {
    /// Create an idle bus.
    pub fn new() -> Self {
        Self {
            writer: None,
            readers: Vec::new(),
            data: 0,
        }
    }

    /// True when a writer currently drives the bus.
    pub fn has_writer(&self) -> bool {
        self.writer.is_some()
    }

    /// The current writer, if any.
    pub fn writer(&self) -> Option<W> {
        self.writer
    }

    /// The listeners in nomination order. Duplicates are kept.
    pub fn readers(&self) -> &[R] {
        &self.readers
    }

    /// Nominate the bus driver for this tick.
    pub fn set_writer(&mut self, writer: W) -> Result<(), BusError> {
        if self.writer.is_some() {
            return Err(BusError::Conflict);
        }

        self.writer = Some(writer);
        Ok(())
    }

    /// Append a listener. The same listener may be nominated twice and
    /// will latch twice.
    pub fn add_reader(&mut self, reader: R) {
        self.readers.push(reader);
    }

    /// Release the driver.
    pub fn clear_writer(&mut self) {
        self.writer = None;
    }

    /// Drop all listeners.
    pub fn clear_readers(&mut self) {
        self.readers.clear();
    }

    /// Latched data. Only valid while a writer is set.
    pub fn data(&self) -> Result<u8, BusError> {
        if self.writer.is_none() {
            return Err(BusError::NoWriter);
        }

        Ok(self.data)
    }

    /// Drive data onto the bus. Only valid while a writer is set.
    pub fn set_data(&mut self, val: u8) -> Result<(), BusError> {
        if self.writer.is_none() {
            return Err(BusError::NoWriter);
        }

        self.data = val;
        Ok(())
    }
}

impl<W: Copy, R: Copy> Default for Bus<W, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Sources that can drive the data bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataWriter {
    In,
    Ia,
    St,
    Pc,
    D,
    L,
    R,
    Reg,
    Em,
    /// Front-panel override value (the MANUAL_DBUS_INPUT register).
    Manual,
}

/// Listeners on the data bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataReader {
    Mar,
    Out,
    St,
    Pc,
    A,
    W,
    Reg,
    Em,
}

/// Sources that can drive the address bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrWriter {
    Pc,
    Mar,
}

/// Listeners on the address bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrReader {
    Em,
}

/// Sources that can drive the instruction bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrWriter {
    Em,
    /// The interrupt vector source, active during the handshake tick.
    Interrupt,
}

/// Listeners on the instruction bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrReader {
    Upc,
    Ir,
}

/// The 8-bit data bus.
pub type DataBus = Bus<DataWriter, DataReader>;
/// The 8-bit address bus feeding the main-memory address latch.
pub type AddrBus = Bus<AddrWriter, AddrReader>;
/// The 8-bit instruction bus feeding IR and the µPC.
pub type InstrBus = Bus<InstrWriter, InstrReader>;
