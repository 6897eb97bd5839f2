//! The clock engine.
//!
//! One call to [`Machine::step`] advances the machine by exactly one
//! micro-instruction, in four phases:
//!
//! 1. **decode**: latch the 24-bit word at `UM[µPC]` into the control
//!    lines (skipped in manual mode, where the operator owns the lines);
//! 2. **wiring**: clear all three buses, then nominate writers and
//!    listeners from the control lines in the board's fixed priority
//!    order, raising [`BusError::Conflict`] if two sources fight;
//! 3. **transfer**: the writer of each bus drives its data, then the
//!    listeners latch in nomination order;
//! 4. **trailing**: the µPC advances unless this tick loaded it from
//!    the instruction bus.
//!
//! Ordering inside a tick: ABus drive < DBus drive < IBus drive < ABus
//! latch < DBus latch < IBus latch < µPC advance. Two consequences worth
//! spelling out: PC auto-increments while it drives the address bus, so
//! an ELP reload through the data bus wins over the increment; and the
//! EM cells driven onto the D/I buses are read at the address latched
//! *before* this tick's ABus value lands.

use crate::machine::alu::{Alu, CalcType};
use crate::machine::bus::{
    AddrBus, AddrReader, AddrWriter, BusError, DataBus, DataReader, DataWriter, InstrBus,
    InstrReader, InstrWriter,
};
use crate::machine::control::{ControlSignals, INTERRUPT_VECTOR};
use crate::machine::memory::{Memory, MicroMemory};
use crate::machine::registers::Registers;
use serde::{Deserialize, Serialize};

/// The COP2000 machine: registers, memories, ALU, control lines and the
/// three internal buses, advanced one micro-instruction per clock tick.
///
/// A fresh machine is halted and in manual mode: `run_forever` returns
/// immediately and only explicit `step` calls advance it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    regs: Registers,
    em: Memory,
    um: MicroMemory,
    alu: Alu,
    ctrl: ControlSignals,
    dbus: DataBus,
    abus: AddrBus,
    ibus: InstrBus,
}

impl Machine {
    /// Create a machine in its reset state: all data registers zero
    /// except IA, every control line deasserted, halted, manual mode.
    pub fn new() -> Self {
        let mut machine = Self {
            regs: Registers::new(),
            em: Memory::new(),
            um: MicroMemory::new(),
            alu: Alu::new(),
            ctrl: ControlSignals::new(),
            dbus: DataBus::new(),
            abus: AddrBus::new(),
            ibus: InstrBus::new(),
        };

        // Bring the L/D/R latches in line with the reset operands.
        machine.update_alu();
        machine
    }

    /// Execute one clock tick.
    ///
    /// On error the machine is left exactly as the failing phase left
    /// it; the caller decides whether to reset or report.
    pub fn step(&mut self) -> Result<(), BusError> {
        self.um.set_addr(self.regs.upc.get());
        self.latch_control_word();
        self.wire_buses()?;
        self.transfer()
    }

    /// Tick until the HALT switch is raised. Returns immediately on a
    /// fresh machine, which constructs halted.
    pub fn run_forever(&mut self) -> Result<(), BusError> {
        while !self.ctrl.halt.get() {
            self.step()?;
        }

        Ok(())
    }

    /// Raise the interrupt request line. The next tick services it by
    /// driving the fixed vector onto the instruction bus and raising
    /// IACK, suppressing the EM-driven instruction bus for that tick.
    pub fn trigger_interrupt(&mut self) {
        self.ctrl.ireq.set();
    }

    /// Write the front-panel data-bus override value.
    pub fn set_manual_dbus_input(&mut self, val: u8) {
        self.regs.manual_dbus_input.set(val);
    }

    /// Read-only view of the register file.
    pub fn regs(&self) -> &Registers {
        &self.regs
    }

    /// Read-only view of the control lines.
    pub fn control(&self) -> &ControlSignals {
        &self.ctrl
    }

    /// Read-only view of the ALU.
    pub fn alu(&self) -> &Alu {
        &self.alu
    }

    /// Read-only view of the external memory.
    pub fn em(&self) -> &Memory {
        &self.em
    }

    /// Read-only view of the micro-program memory.
    pub fn um(&self) -> &MicroMemory {
        &self.um
    }

    pub(crate) fn regs_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    pub(crate) fn ctrl_alu_mut(&mut self) -> (&mut ControlSignals, &mut Alu) {
        (&mut self.ctrl, &mut self.alu)
    }

    pub(crate) fn em_mut(&mut self) -> &mut Memory {
        &mut self.em
    }

    pub(crate) fn um_mut(&mut self) -> &mut MicroMemory {
        &mut self.um
    }

    /// Recompute the combinational ALU outputs into the L/D/R latches.
    ///
    /// Called at the start of every transfer phase and whenever A, W or
    /// one of the mode lines is written, so the latches always reflect
    /// the current operands before anything reads them.
    pub(crate) fn update_alu(&mut self) {
        self.alu.set_calc_type(CalcType::from_select_bits(
            self.ctrl.s2.get(),
            self.ctrl.s1.get(),
            self.ctrl.s0.get(),
        ));

        let out = self.alu.calc(self.regs.a.get(), self.regs.w.get());
        self.regs.l.set(out.left);
        self.regs.d.set(out.direct);
        self.regs.r.set(out.right);
    }

    /// Phase 1: latch the current micro-instruction into the control
    /// lines. In manual mode the operator owns the lines and the latch
    /// is skipped.
    fn latch_control_word(&mut self) {
        if self.ctrl.running_manually.get() {
            return;
        }

        let word = self.um.read();
        self.ctrl.latch(word, &mut self.alu);
    }

    /// Phase 2: resolve the control lines into bus writers and
    /// listeners, in the board's fixed priority order.
    fn wire_buses(&mut self) -> Result<(), BusError> {
        self.dbus.clear_writer();
        self.dbus.clear_readers();
        self.abus.clear_writer();
        self.abus.clear_readers();
        self.ibus.clear_writer();
        self.ibus.clear_readers();

        // Interrupt handshake: the vector source takes the instruction
        // bus and the EMRD line is released so EM cannot collide with it.
        if self.ctrl.ireq.get() && !self.ctrl.iack.get() {
            self.ibus.set_writer(InstrWriter::Interrupt)?;
            self.ctrl.emrd.clear();
            self.ctrl.iack.set();
        }

        if self.ctrl.emrd.asserted() {
            self.ibus.set_writer(InstrWriter::Em)?;
        }

        if self.ctrl.pcoe.asserted() {
            self.abus.set_writer(AddrWriter::Pc)?;
            self.abus.add_reader(AddrReader::Em);
        }

        if self.ctrl.emen.asserted() {
            if self.ctrl.emwr.asserted() {
                self.dbus.add_reader(DataReader::Em);
            }
            if self.ctrl.emrd.asserted() {
                self.dbus.set_writer(DataWriter::Em)?;
            }
        }

        if self.ctrl.iren.asserted() {
            self.ibus.add_reader(InstrReader::Ir);
            self.ibus.add_reader(InstrReader::Upc);
        }

        if self.ctrl.eint.asserted() {
            self.ctrl.iack.clear();
            self.ctrl.ireq.clear();
        }

        if self.ctrl.elp.asserted() {
            self.dbus.add_reader(DataReader::Pc);
        }

        if self.ctrl.maren.asserted() {
            self.dbus.add_reader(DataReader::Mar);
        }

        if self.ctrl.maroe.asserted() {
            self.abus.set_writer(AddrWriter::Mar)?;
            self.abus.add_reader(AddrReader::Em);
        }

        if self.ctrl.outen.asserted() {
            self.dbus.add_reader(DataReader::Out);
        }

        if self.ctrl.sten.asserted() {
            self.dbus.add_reader(DataReader::St);
        }

        if self.ctrl.rrd.asserted() {
            self.dbus.set_writer(DataWriter::Reg)?;
        }

        if self.ctrl.rwr.asserted() {
            self.dbus.add_reader(DataReader::Reg);
        }

        if self.ctrl.wen.asserted() {
            self.dbus.add_reader(DataReader::W);
        }

        if self.ctrl.aen.asserted() {
            self.dbus.add_reader(DataReader::A);
        }

        match self.ctrl.dbus_source_select() {
            0 => self.dbus.set_writer(DataWriter::In)?,
            1 => self.dbus.set_writer(DataWriter::Ia)?,
            2 => self.dbus.set_writer(DataWriter::St)?,
            3 => self.dbus.set_writer(DataWriter::Pc)?,
            4 => self.dbus.set_writer(DataWriter::D)?,
            5 => self.dbus.set_writer(DataWriter::R)?,
            6 => self.dbus.set_writer(DataWriter::L)?,
            // 7: no source selected.
            _ => {}
        }

        // The front-panel override wins over whatever the control word
        // chose as the data-bus source.
        if self.ctrl.manual_dbus.get() {
            self.dbus.clear_writer();
            self.dbus.set_writer(DataWriter::Manual)?;
        }

        Ok(())
    }

    /// Phases 3 and 4: drive the buses, latch the listeners, advance
    /// the µPC.
    fn transfer(&mut self) -> Result<(), BusError> {
        self.update_alu();

        if let Some(writer) = self.abus.writer() {
            match writer {
                AddrWriter::Mar => self.abus.set_data(self.regs.mar.get())?,
                AddrWriter::Pc => {
                    self.abus.set_data(self.regs.pc.get())?;
                    // May still be overridden by an ELP reload below.
                    self.regs.pc.increment();
                }
            }
        }

        if let Some(writer) = self.dbus.writer() {
            let val = match writer {
                DataWriter::In => self.regs.input.get(),
                DataWriter::Ia => self.regs.ia.get(),
                DataWriter::St => self.regs.st.get(),
                DataWriter::Pc => self.regs.pc.get(),
                DataWriter::D => self.regs.d.get(),
                DataWriter::L => self.regs.l.get(),
                DataWriter::R => self.regs.r.get(),
                DataWriter::Reg => self.regs.general(self.ctrl.general_select()),
                DataWriter::Em => self.em.read(),
                DataWriter::Manual => self.regs.manual_dbus_input.get(),
            };
            self.dbus.set_data(val)?;
        }

        if let Some(writer) = self.ibus.writer() {
            let val = match writer {
                InstrWriter::Em => self.em.read(),
                InstrWriter::Interrupt => INTERRUPT_VECTOR,
            };
            self.ibus.set_data(val)?;
        }

        if !self.abus.readers().is_empty() {
            let addr = self.abus.data()?;
            for reader in self.abus.readers().to_vec() {
                match reader {
                    AddrReader::Em => self.em.set_addr(addr),
                }
            }
        }

        if !self.dbus.readers().is_empty() {
            let data = self.dbus.data()?;
            for reader in self.dbus.readers().to_vec() {
                match reader {
                    DataReader::Mar => self.regs.mar.set(data),
                    DataReader::Out => self.regs.output.set(data),
                    DataReader::St => self.regs.st.set(data),
                    DataReader::Pc => self.regs.pc.set(data),
                    DataReader::A => {
                        self.regs.a.set(data);
                        self.update_alu();
                    }
                    DataReader::W => {
                        self.regs.w.set(data);
                        self.update_alu();
                    }
                    DataReader::Reg => {
                        self.regs.set_general(self.ctrl.general_select(), data);
                    }
                    DataReader::Em => self.em.write(data),
                }
            }
        }

        let mut upc_loaded = false;
        if !self.ibus.readers().is_empty() {
            let data = self.ibus.data()?;
            for reader in self.ibus.readers().to_vec() {
                match reader {
                    InstrReader::Ir => self.regs.ir.set(data),
                    InstrReader::Upc => {
                        upc_loaded = true;
                        self.regs.upc.set(data);
                    }
                }
            }
        }

        if !upc_loaded {
            self.regs.upc.increment();
        }

        Ok(())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A word with every control bit deasserted.
    const MICRO_NOP: u32 = 0x00FF_FFFF;

    /// Deassert (lower) the given active-low bits of a word.
    fn lower(bits: &[u32]) -> u32 {
        bits.iter().fold(MICRO_NOP, |word, &bit| word & !(1 << bit))
    }

    // Control-word bit positions used by the scenarios.
    const BIT_AEN: u32 = 3;
    const BIT_X0: u32 = 5;
    const BIT_X1: u32 = 6;
    const BIT_X2: u32 = 7;
    const BIT_ELP: u32 = 16;
    const BIT_IREN: u32 = 18;
    const BIT_EMEN: u32 = 19;
    const BIT_PCOE: u32 = 20;
    const BIT_EMRD: u32 = 21;

    #[test]
    fn test_idle_tick_only_advances_upc() {
        let mut machine = Machine::new();
        machine.step().unwrap();

        assert_eq!(machine.regs.upc.get(), 1);
        assert_eq!(machine.regs.pc.get(), 0);
        assert_eq!(machine.regs.ir.get(), 0);
        assert_eq!(machine.regs.ia.get(), 0xE0);
        // Control lines keep their reset (deasserted) storage.
        assert!(machine.ctrl.emrd.get());
        assert!(machine.ctrl.pcoe.get());
        assert!(machine.ctrl.s0.get());
    }

    #[test]
    fn test_upc_wraps_mod_256() {
        let mut machine = Machine::new();
        machine.regs.upc.set(0xFF);
        machine.step().unwrap();
        assert_eq!(machine.regs.upc.get(), 0);
    }

    #[test]
    fn test_run_forever_exits_immediately_when_halted() {
        let mut machine = Machine::new();
        machine.run_forever().unwrap();
        assert_eq!(machine.regs.upc.get(), 0);
    }

    #[test]
    fn test_run_forever_stops_on_engine_fault() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        machine.ctrl.halt.clear();
        // UM[0] is an idle word; UM[1] nominates a listener with no
        // driver, which must fail the run and leave the µPC in place.
        machine.um.set_at(0, MICRO_NOP).unwrap();
        machine.um.set_at(1, lower(&[BIT_AEN])).unwrap();

        assert_eq!(machine.run_forever(), Err(BusError::NoWriter));
        assert_eq!(machine.regs.upc.get(), 1);
    }

    #[test]
    fn test_manual_dbus_loads_operand_register() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        // AEN asserted, X field left at 111 (no source).
        machine.um.set_at(0, lower(&[BIT_AEN])).unwrap();
        machine.ctrl.manual_dbus.set();
        machine.set_manual_dbus_input(0x42);

        machine.step().unwrap();

        assert_eq!(machine.regs.a.get(), 0x42);
        assert_eq!(machine.regs.upc.get(), 1);
        // The operand write flowed through to the ALU latches.
        assert_eq!(machine.regs.d.get(), 0x42);
    }

    #[test]
    fn test_fetch_cycle_latches_ir_and_upc() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        machine
            .um
            .set_at(0, lower(&[BIT_PCOE, BIT_EMRD, BIT_EMEN, BIT_IREN]))
            .unwrap();
        machine.em.set_at(0x00, 0x9C).unwrap();

        machine.step().unwrap();

        // The opcode came over the instruction bus into both IR and µPC;
        // PC advanced past the fetched cell.
        assert_eq!(machine.regs.ir.get(), 0x9C);
        assert_eq!(machine.regs.upc.get(), 0x9C);
        assert_eq!(machine.regs.pc.get(), 1);
        // The address bus latched the fetch address into EM.
        assert_eq!(machine.em.addr(), 0x00);
    }

    #[test]
    fn test_pc_reload_wins_over_auto_increment() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        // PC drives the address bus (and auto-increments), but ELP also
        // reloads PC from the data bus, which IA drives (stored X = 001).
        machine
            .um
            .set_at(0, lower(&[BIT_PCOE, BIT_ELP, BIT_X2, BIT_X1]))
            .unwrap();

        machine.step().unwrap();

        assert_eq!(machine.regs.pc.get(), 0xE0);
    }

    #[test]
    fn test_mar_drives_address_bus() {
        let mut machine = Machine::new();
        machine.regs.mar.set(0x77);
        machine.ctrl.maroe.set();
        machine.ctrl.emen.set();
        machine.ctrl.emwr.set();
        machine.ctrl.manual_dbus.set();
        machine.set_manual_dbus_input(0x55);

        machine.step().unwrap();

        // ABus carried MAR into the EM address latch; the data-bus write
        // then targeted that cell.
        assert_eq!(machine.em.addr(), 0x77);
        assert_eq!(machine.em.get_at(0x77).unwrap(), 0x55);
    }

    #[test]
    fn test_alu_result_reaches_general_register() {
        let mut machine = Machine::new();
        // Manual mode: configure an ADD through the panel lines.
        machine.regs.a.set(0x21);
        machine.regs.w.set(0x21);
        machine.ctrl.s2.set();
        machine.ctrl.s1.set();
        machine.ctrl.s0.set(); // stored 000 = ADD
        machine.ctrl.rwr.set(); // REG listens
        machine.ctrl.sb.set(); // select R2
        machine.ctrl.x0.set();
        machine.ctrl.x1.set(); // stored X2X1X0 = 100 = D drives

        machine.step().unwrap();

        assert_eq!(machine.regs.r2.get(), 0x42);
    }

    #[test]
    fn test_interrupt_handshake_manual_mode() {
        let mut machine = Machine::new();
        machine.trigger_interrupt();

        machine.step().unwrap();

        // The handshake raised IACK; with IREN deasserted nothing
        // listened on the instruction bus, so the µPC just advanced.
        assert!(machine.ctrl.iack.get());
        assert!(machine.ctrl.ireq.get());
        assert_eq!(machine.regs.upc.get(), 1);
        assert_eq!(machine.regs.ir.get(), 0);

        // A second tick does not re-run the handshake while IACK holds.
        machine.step().unwrap();
        assert_eq!(machine.regs.upc.get(), 2);
    }

    #[test]
    fn test_interrupt_vector_enters_ir_and_upc() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        machine.um.set_at(0, lower(&[BIT_IREN])).unwrap();
        machine.trigger_interrupt();

        machine.step().unwrap();

        assert_eq!(machine.regs.ir.get(), INTERRUPT_VECTOR);
        assert_eq!(machine.regs.upc.get(), INTERRUPT_VECTOR);
        assert!(machine.ctrl.iack.get());
    }

    #[test]
    fn test_interrupt_suppresses_em_instruction_fetch() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        // A fetch word: EMRD + IREN. The handshake must release EMRD so
        // the vector source owns the instruction bus alone.
        machine.um.set_at(0, lower(&[BIT_EMRD, BIT_IREN])).unwrap();
        machine.em.set_at(0, 0x12).unwrap();
        machine.trigger_interrupt();

        machine.step().unwrap();

        assert_eq!(machine.regs.ir.get(), INTERRUPT_VECTOR);
        assert!(!machine.ctrl.emrd.asserted());
    }

    #[test]
    fn test_eint_clears_handshake() {
        let mut machine = Machine::new();
        machine.trigger_interrupt();
        machine.step().unwrap();
        assert!(machine.ctrl.iack.get());

        machine.ctrl.eint.set();
        machine.step().unwrap();

        assert!(!machine.ctrl.ireq.get());
        assert!(!machine.ctrl.iack.get());
    }

    #[test]
    fn test_conflicting_sources_fail_the_step() {
        let mut machine = Machine::new();
        machine.ctrl.running_manually.clear();
        // EM drives the data bus (EMEN+EMRD) while the X field also
        // selects D (stored 100): two drivers, one bus.
        machine
            .um
            .set_at(0, lower(&[BIT_EMEN, BIT_EMRD, BIT_X0, BIT_X1]))
            .unwrap();

        assert_eq!(machine.step(), Err(BusError::Conflict));
    }

    #[test]
    fn test_reader_without_writer_fails_the_step() {
        let mut machine = Machine::new();
        // AEN nominates a listener but nothing drives the data bus.
        machine.ctrl.aen.set();

        assert_eq!(machine.step(), Err(BusError::NoWriter));
    }

    #[test]
    fn test_pc_wraps_mod_256() {
        let mut machine = Machine::new();
        machine.regs.pc.set(0xFF);
        machine.ctrl.pcoe.set();

        machine.step().unwrap();

        assert_eq!(machine.regs.pc.get(), 0);
    }

    #[test]
    fn test_em_access_uses_previous_address_latch() {
        let mut machine = Machine::new();
        // Latch an EM address in one tick, then read through it in the
        // next: the data-bus EM read happens before the new ABus address
        // lands.
        machine.em.set_at(0x05, 0xAB).unwrap();
        machine.em.set_addr(0x05);
        machine.regs.mar.set(0x30);

        machine.ctrl.maroe.set();
        machine.ctrl.emen.set();
        machine.ctrl.emrd.set();
        machine.ctrl.aen.set();

        machine.step().unwrap();

        // A latched the value behind the old address; only afterwards
        // did the latch move to 0x30.
        assert_eq!(machine.regs.a.get(), 0xAB);
        assert_eq!(machine.em.addr(), 0x30);
    }
}
