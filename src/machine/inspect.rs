//! The external surface: named access to registers, flags and memories.
//!
//! Debuggers, loaders and the front-panel REPL do not reach into the
//! machine's fields; they name a register or flag through the selector
//! enums here and go through one mutable handle. The selectors also
//! carry the canonical spelling of every name the front panel accepts.
//!
//! Flag access comes in two forms. `write_flag` stores a raw bit, which
//! is what the front panel's `setflag` does; `assert_flag` /
//! `deassert_flag` speak in terms of the condition and respect each
//! line's polarity.

use crate::machine::execute::Machine;
use crate::machine::memory::MemoryError;

/// Register names accepted by the external surface, in front-panel
/// display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegSelect {
    ManualDbusInput,
    Upc,
    Pc,
    Mar,
    Ia,
    St,
    In,
    Out,
    Ir,
    L,
    D,
    R,
    A,
    W,
    R0,
    R1,
    R2,
    R3,
}

impl RegSelect {
    /// Every register, in display order.
    pub const ALL: [RegSelect; 18] = [
        RegSelect::ManualDbusInput,
        RegSelect::Upc,
        RegSelect::Pc,
        RegSelect::Mar,
        RegSelect::Ia,
        RegSelect::St,
        RegSelect::In,
        RegSelect::Out,
        RegSelect::Ir,
        RegSelect::L,
        RegSelect::D,
        RegSelect::R,
        RegSelect::A,
        RegSelect::W,
        RegSelect::R0,
        RegSelect::R1,
        RegSelect::R2,
        RegSelect::R3,
    ];

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            RegSelect::ManualDbusInput => "manual_dbus_input",
            RegSelect::Upc => "upc",
            RegSelect::Pc => "pc",
            RegSelect::Mar => "mar",
            RegSelect::Ia => "ia",
            RegSelect::St => "st",
            RegSelect::In => "in",
            RegSelect::Out => "out",
            RegSelect::Ir => "ir",
            RegSelect::L => "l",
            RegSelect::D => "d",
            RegSelect::R => "r",
            RegSelect::A => "a",
            RegSelect::W => "w",
            RegSelect::R0 => "r0",
            RegSelect::R1 => "r1",
            RegSelect::R2 => "r2",
            RegSelect::R3 => "r3",
        }
    }

    /// Look a register up by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sel| sel.name() == name)
    }
}

/// Flag names accepted by the external surface, in front-panel display
/// order: the active-low control lines first, then the active-high
/// lines, then the ALU flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSelect {
    Emwr,
    Emrd,
    Pcoe,
    Emen,
    Iren,
    Eint,
    Elp,
    Maren,
    Maroe,
    Outen,
    Sten,
    Rrd,
    Rwr,
    X2,
    X1,
    X0,
    Wen,
    Aen,
    S2,
    S1,
    S0,
    Sa,
    Sb,
    Ireq,
    Iack,
    Halt,
    ManualDbus,
    RunningManually,
    Fen,
    Cn,
    Cy,
    Z,
}

impl FlagSelect {
    /// Every flag, in display order.
    pub const ALL: [FlagSelect; 32] = [
        FlagSelect::Emwr,
        FlagSelect::Emrd,
        FlagSelect::Pcoe,
        FlagSelect::Emen,
        FlagSelect::Iren,
        FlagSelect::Eint,
        FlagSelect::Elp,
        FlagSelect::Maren,
        FlagSelect::Maroe,
        FlagSelect::Outen,
        FlagSelect::Sten,
        FlagSelect::Rrd,
        FlagSelect::Rwr,
        FlagSelect::X2,
        FlagSelect::X1,
        FlagSelect::X0,
        FlagSelect::Wen,
        FlagSelect::Aen,
        FlagSelect::S2,
        FlagSelect::S1,
        FlagSelect::S0,
        FlagSelect::Sa,
        FlagSelect::Sb,
        FlagSelect::Ireq,
        FlagSelect::Iack,
        FlagSelect::Halt,
        FlagSelect::ManualDbus,
        FlagSelect::RunningManually,
        FlagSelect::Fen,
        FlagSelect::Cn,
        FlagSelect::Cy,
        FlagSelect::Z,
    ];

    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            FlagSelect::Emwr => "emwr",
            FlagSelect::Emrd => "emrd",
            FlagSelect::Pcoe => "pcoe",
            FlagSelect::Emen => "emen",
            FlagSelect::Iren => "iren",
            FlagSelect::Eint => "eint",
            FlagSelect::Elp => "elp",
            FlagSelect::Maren => "maren",
            FlagSelect::Maroe => "maroe",
            FlagSelect::Outen => "outen",
            FlagSelect::Sten => "sten",
            FlagSelect::Rrd => "rrd",
            FlagSelect::Rwr => "rwr",
            FlagSelect::X2 => "x2",
            FlagSelect::X1 => "x1",
            FlagSelect::X0 => "x0",
            FlagSelect::Wen => "wen",
            FlagSelect::Aen => "aen",
            FlagSelect::S2 => "s2",
            FlagSelect::S1 => "s1",
            FlagSelect::S0 => "s0",
            FlagSelect::Sa => "sa",
            FlagSelect::Sb => "sb",
            FlagSelect::Ireq => "ireq",
            FlagSelect::Iack => "iack",
            FlagSelect::Halt => "halt",
            FlagSelect::ManualDbus => "manual_dbus",
            FlagSelect::RunningManually => "running_manually",
            FlagSelect::Fen => "fen",
            FlagSelect::Cn => "cn",
            FlagSelect::Cy => "cy",
            FlagSelect::Z => "z",
        }
    }

    /// Look a flag up by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sel| sel.name() == name)
    }
}

impl Machine {
    /// Read a register by name.
    pub fn register(&self, sel: RegSelect) -> u8 {
        let regs = self.regs();
        match sel {
            RegSelect::ManualDbusInput => regs.manual_dbus_input.get(),
            RegSelect::Upc => regs.upc.get(),
            RegSelect::Pc => regs.pc.get(),
            RegSelect::Mar => regs.mar.get(),
            RegSelect::Ia => regs.ia.get(),
            RegSelect::St => regs.st.get(),
            RegSelect::In => regs.input.get(),
            RegSelect::Out => regs.output.get(),
            RegSelect::Ir => regs.ir.get(),
            RegSelect::L => regs.l.get(),
            RegSelect::D => regs.d.get(),
            RegSelect::R => regs.r.get(),
            RegSelect::A => regs.a.get(),
            RegSelect::W => regs.w.get(),
            RegSelect::R0 => regs.r0.get(),
            RegSelect::R1 => regs.r1.get(),
            RegSelect::R2 => regs.r2.get(),
            RegSelect::R3 => regs.r3.get(),
        }
    }

    /// Write a register by name. Writing A or W recomputes the ALU
    /// output latches.
    pub fn set_register(&mut self, sel: RegSelect, val: u8) {
        {
            let regs = self.regs_mut();
            match sel {
                RegSelect::ManualDbusInput => regs.manual_dbus_input.set(val),
                RegSelect::Upc => regs.upc.set(val),
                RegSelect::Pc => regs.pc.set(val),
                RegSelect::Mar => regs.mar.set(val),
                RegSelect::Ia => regs.ia.set(val),
                RegSelect::St => regs.st.set(val),
                RegSelect::In => regs.input.set(val),
                RegSelect::Out => regs.output.set(val),
                RegSelect::Ir => regs.ir.set(val),
                RegSelect::L => regs.l.set(val),
                RegSelect::D => regs.d.set(val),
                RegSelect::R => regs.r.set(val),
                RegSelect::A => regs.a.set(val),
                RegSelect::W => regs.w.set(val),
                RegSelect::R0 => regs.r0.set(val),
                RegSelect::R1 => regs.r1.set(val),
                RegSelect::R2 => regs.r2.set(val),
                RegSelect::R3 => regs.r3.set(val),
            }
        }

        if matches!(sel, RegSelect::A | RegSelect::W) {
            self.update_alu();
        }
    }

    /// Raw storage bit of a flag. For an active-low line "currently
    /// asserted" reads as `false`.
    pub fn flag(&self, sel: FlagSelect) -> bool {
        let ctrl = self.control();
        let alu = self.alu();
        match sel {
            FlagSelect::Emwr => ctrl.emwr.get(),
            FlagSelect::Emrd => ctrl.emrd.get(),
            FlagSelect::Pcoe => ctrl.pcoe.get(),
            FlagSelect::Emen => ctrl.emen.get(),
            FlagSelect::Iren => ctrl.iren.get(),
            FlagSelect::Eint => ctrl.eint.get(),
            FlagSelect::Elp => ctrl.elp.get(),
            FlagSelect::Maren => ctrl.maren.get(),
            FlagSelect::Maroe => ctrl.maroe.get(),
            FlagSelect::Outen => ctrl.outen.get(),
            FlagSelect::Sten => ctrl.sten.get(),
            FlagSelect::Rrd => ctrl.rrd.get(),
            FlagSelect::Rwr => ctrl.rwr.get(),
            FlagSelect::X2 => ctrl.x2.get(),
            FlagSelect::X1 => ctrl.x1.get(),
            FlagSelect::X0 => ctrl.x0.get(),
            FlagSelect::Wen => ctrl.wen.get(),
            FlagSelect::Aen => ctrl.aen.get(),
            FlagSelect::S2 => ctrl.s2.get(),
            FlagSelect::S1 => ctrl.s1.get(),
            FlagSelect::S0 => ctrl.s0.get(),
            FlagSelect::Sa => ctrl.sa.get(),
            FlagSelect::Sb => ctrl.sb.get(),
            FlagSelect::Ireq => ctrl.ireq.get(),
            FlagSelect::Iack => ctrl.iack.get(),
            FlagSelect::Halt => ctrl.halt.get(),
            FlagSelect::ManualDbus => ctrl.manual_dbus.get(),
            FlagSelect::RunningManually => ctrl.running_manually.get(),
            FlagSelect::Fen => alu.fen.get(),
            FlagSelect::Cn => alu.cn.get(),
            FlagSelect::Cy => alu.cy.get(),
            FlagSelect::Z => alu.z.get(),
        }
    }

    /// Write the raw storage bit of a flag. Writing one of the S lines
    /// recomputes the ALU output latches.
    pub fn write_flag(&mut self, sel: FlagSelect, raw: bool) {
        {
            let (ctrl, alu) = self.ctrl_alu_mut();
            match sel {
                FlagSelect::Emwr => ctrl.emwr.write(raw),
                FlagSelect::Emrd => ctrl.emrd.write(raw),
                FlagSelect::Pcoe => ctrl.pcoe.write(raw),
                FlagSelect::Emen => ctrl.emen.write(raw),
                FlagSelect::Iren => ctrl.iren.write(raw),
                FlagSelect::Eint => ctrl.eint.write(raw),
                FlagSelect::Elp => ctrl.elp.write(raw),
                FlagSelect::Maren => ctrl.maren.write(raw),
                FlagSelect::Maroe => ctrl.maroe.write(raw),
                FlagSelect::Outen => ctrl.outen.write(raw),
                FlagSelect::Sten => ctrl.sten.write(raw),
                FlagSelect::Rrd => ctrl.rrd.write(raw),
                FlagSelect::Rwr => ctrl.rwr.write(raw),
                FlagSelect::X2 => ctrl.x2.write(raw),
                FlagSelect::X1 => ctrl.x1.write(raw),
                FlagSelect::X0 => ctrl.x0.write(raw),
                FlagSelect::Wen => ctrl.wen.write(raw),
                FlagSelect::Aen => ctrl.aen.write(raw),
                FlagSelect::S2 => ctrl.s2.write(raw),
                FlagSelect::S1 => ctrl.s1.write(raw),
                FlagSelect::S0 => ctrl.s0.write(raw),
                FlagSelect::Sa => ctrl.sa.write(raw),
                FlagSelect::Sb => ctrl.sb.write(raw),
                FlagSelect::Ireq => ctrl.ireq.write(raw),
                FlagSelect::Iack => ctrl.iack.write(raw),
                FlagSelect::Halt => ctrl.halt.write(raw),
                FlagSelect::ManualDbus => ctrl.manual_dbus.write(raw),
                FlagSelect::RunningManually => ctrl.running_manually.write(raw),
                FlagSelect::Fen => alu.fen.write(raw),
                FlagSelect::Cn => alu.cn.write(raw),
                FlagSelect::Cy => alu.cy.write(raw),
                FlagSelect::Z => alu.z.write(raw),
            }
        }

        if matches!(sel, FlagSelect::S0 | FlagSelect::S1 | FlagSelect::S2) {
            self.update_alu();
        }
    }

    /// Assert a flag's condition, respecting its polarity: an active-low
    /// line stores 0, an active-high line stores 1.
    pub fn assert_flag(&mut self, sel: FlagSelect) {
        self.write_flag(sel, !sel.active_low());
    }

    /// Deassert a flag's condition, respecting its polarity.
    pub fn deassert_flag(&mut self, sel: FlagSelect) {
        self.write_flag(sel, sel.active_low());
    }

    /// Read one EM cell without disturbing the address latch.
    pub fn em_at(&self, addr: usize) -> Result<u8, MemoryError> {
        self.em().get_at(addr)
    }

    /// Write one EM cell without disturbing the address latch.
    pub fn set_em_at(&mut self, addr: usize, val: u32) -> Result<(), MemoryError> {
        self.em_mut().set_at(addr, val)
    }

    /// Read one UM word without disturbing the address latch.
    pub fn um_at(&self, addr: usize) -> Result<u32, MemoryError> {
        self.um().get_at(addr)
    }

    /// Write one UM word without disturbing the address latch.
    pub fn set_um_at(&mut self, addr: usize, word: u32) -> Result<(), MemoryError> {
        self.um_mut().set_at(addr, word)
    }

    /// Load a micro-program image into UM starting at address 0.
    pub fn load_microprogram(&mut self, words: &[u32]) -> Result<(), MemoryError> {
        self.um_mut().load_image(words)
    }
}

impl FlagSelect {
    /// True for the lines that assert their condition with a stored 0.
    pub fn active_low(self) -> bool {
        matches!(
            self,
            FlagSelect::Emwr
                | FlagSelect::Emrd
                | FlagSelect::Pcoe
                | FlagSelect::Emen
                | FlagSelect::Iren
                | FlagSelect::Eint
                | FlagSelect::Elp
                | FlagSelect::Maren
                | FlagSelect::Maroe
                | FlagSelect::Outen
                | FlagSelect::Sten
                | FlagSelect::Rrd
                | FlagSelect::Rwr
                | FlagSelect::X2
                | FlagSelect::X1
                | FlagSelect::X0
                | FlagSelect::Wen
                | FlagSelect::Aen
                | FlagSelect::S2
                | FlagSelect::S1
                | FlagSelect::S0
        )
    }
}
