//! The control-signal latch and the micro-instruction decoder.
//!
//! Every clock tick begins by latching the 24-bit word at the current
//! µPC into the control lines (unless the operator holds the machine in
//! manual mode, in which case the lines keep whatever the front panel
//! wrote into them). The stored polarity of each active-low line equals
//! the raw bit value: a control bit of 1 means "deasserted".
//!
//! Bit layout of a micro-instruction word:
//!
//! ```text
//! bit  0  1  2   3   4   5  6  7   8   9   10  11  12   13    14    15
//!      S0 S1 S2  AEN WEN X0 X1 X2  FEN CN  RWR RRD STEN OUTEN MAROE MAREN
//! bit  16  17   18   19   20   21   22   23
//!      ELP EINT IREN EMEN PCOE EMRD EMWR (reserved)
//! ```

use crate::bits::{Flag, NegFlag};
use crate::machine::alu::Alu;
use serde::{Deserialize, Serialize};

/// Fixed vector driven onto the instruction bus during the interrupt
/// handshake tick.
pub const INTERRUPT_VECTOR: u8 = 0xB8;

/// The full set of control lines.
///
/// The active-low block mirrors the board's overbarred signals; the
/// active-high block holds the register-file select pair, the interrupt
/// handshake pair, and the three operator switches. FEN and CN live on
/// the ALU itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlSignals {
    // Active-low lines, asserted when the stored bit is 0.
    pub emwr: NegFlag,
    pub emrd: NegFlag,
    pub pcoe: NegFlag,
    pub emen: NegFlag,
    pub iren: NegFlag,
    pub eint: NegFlag,
    pub elp: NegFlag,
    pub maren: NegFlag,
    pub maroe: NegFlag,
    pub outen: NegFlag,
    pub sten: NegFlag,
    pub rrd: NegFlag,
    pub rwr: NegFlag,
    pub x2: NegFlag,
    pub x1: NegFlag,
    pub x0: NegFlag,
    pub wen: NegFlag,
    pub aen: NegFlag,
    pub s2: NegFlag,
    pub s1: NegFlag,
    pub s0: NegFlag,

    // Active-high lines.
    pub sa: Flag,
    pub sb: Flag,
    pub ireq: Flag,
    pub iack: Flag,
    /// Front-panel override: forces the data bus writer to MANUAL.
    pub manual_dbus: Flag,
    /// While raised, the control latch is skipped and the operator owns
    /// the control lines.
    pub running_manually: Flag,
    /// While raised, `run_forever` does not advance the clock.
    pub halt: Flag,
}

impl ControlSignals {
    /// Reset state: every control line deasserted, the machine halted
    /// and in manual mode.
    pub fn new() -> Self {
        Self {
            emwr: NegFlag::default(),
            emrd: NegFlag::default(),
            pcoe: NegFlag::default(),
            emen: NegFlag::default(),
            iren: NegFlag::default(),
            eint: NegFlag::default(),
            elp: NegFlag::default(),
            maren: NegFlag::default(),
            maroe: NegFlag::default(),
            outen: NegFlag::default(),
            sten: NegFlag::default(),
            rrd: NegFlag::default(),
            rwr: NegFlag::default(),
            x2: NegFlag::default(),
            x1: NegFlag::default(),
            x0: NegFlag::default(),
            wen: NegFlag::default(),
            aen: NegFlag::default(),
            s2: NegFlag::default(),
            s1: NegFlag::default(),
            s0: NegFlag::default(),
            sa: Flag::default(),
            sb: Flag::default(),
            ireq: Flag::default(),
            iack: Flag::default(),
            manual_dbus: Flag::default(),
            running_manually: Flag::new(true),
            halt: Flag::new(true),
        }
    }

    /// Latch a micro-instruction word into the control lines.
    ///
    /// FEN and CN land on the ALU; the handshake pair, the select pair
    /// and the operator switches are not part of the word and keep their
    /// state. Bit 23 is not connected.
    pub fn latch(&mut self, word: u32, alu: &mut Alu) {
        let bit = |n: u32| word >> n & 1 == 1;

        self.s0.write(bit(0));
        self.s1.write(bit(1));
        self.s2.write(bit(2));
        self.aen.write(bit(3));
        self.wen.write(bit(4));
        self.x0.write(bit(5));
        self.x1.write(bit(6));
        self.x2.write(bit(7));
        alu.fen.write(bit(8));
        alu.cn.write(bit(9));
        self.rwr.write(bit(10));
        self.rrd.write(bit(11));
        self.sten.write(bit(12));
        self.outen.write(bit(13));
        self.maroe.write(bit(14));
        self.maren.write(bit(15));
        self.elp.write(bit(16));
        self.eint.write(bit(17));
        self.iren.write(bit(18));
        self.emen.write(bit(19));
        self.pcoe.write(bit(20));
        self.emrd.write(bit(21));
        self.emwr.write(bit(22));
    }

    /// Data-bus source index formed by the raw stored X2/X1/X0 bits.
    /// All three deasserted (stored 111) selects no source.
    pub fn dbus_source_select(&self) -> u8 {
        (self.x2.get() as u8) << 2 | (self.x1.get() as u8) << 1 | self.x0.get() as u8
    }

    /// General-register index formed by the SB/SA pair.
    pub fn general_select(&self) -> u8 {
        (self.sb.get() as u8) << 1 | self.sa.get() as u8
    }
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new()
    }
}
