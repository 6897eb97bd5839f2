//! The interactive front panel.
//!
//! A line-oriented command interpreter over the machine's external
//! surface: poke registers, flags and memories, step the clock, trigger
//! interrupts, and move microcode images in and out of UM. Input lines
//! are split on whitespace; the first token selects a command from a
//! fixed dispatch table, the rest are arguments.
//!
//! Command errors are printed and the prompt returns; they never touch
//! machine state. Engine faults raised by `clock` (a malformed
//! micro-program driving two sources onto one bus, say) are surfaced
//! the same way, with the machine left as the failing phase left it.

use crate::machine::{BusError, FlagSelect, Machine, MemoryError, RegSelect};
use crate::ucode::{self, UcodeError, UcodeFile};
use std::fmt::Write;
use thiserror::Error;

/// The front-panel prompt.
pub const PROMPT: &str = "COP2K> ";

/// Errors reported to the operator.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("command '{0}' does not exist")]
    UnknownCommand(String),

    #[error("no such flag: '{0}'")]
    UnknownFlag(String),

    #[error("no such register: '{0}'")]
    UnknownRegister(String),

    #[error("wrong argument number: expected {min}~{max}, got {got}")]
    ArgCount { min: usize, max: usize, got: usize },

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("expected 'true' or 'false', got '{0}'")]
    NotABool(String),

    #[error("value {0} does not fit in a byte")]
    ByteRange(u32),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Engine(#[from] BusError),

    #[error(transparent)]
    Ucode(#[from] UcodeError),
}

/// One entry of the dispatch table.
struct Command {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    usage: &'static str,
    run: fn(&mut Repl, &[&str]) -> Result<String, ReplError>,
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        min_args: 0,
        max_args: 1,
        usage: "help [command name]",
        run: cmd_help,
    },
    Command {
        name: "quit",
        min_args: 0,
        max_args: 0,
        usage: "quit",
        run: cmd_quit,
    },
    Command {
        name: "exit",
        min_args: 0,
        max_args: 0,
        usage: "exit",
        run: cmd_quit,
    },
    Command {
        name: "setflag",
        min_args: 2,
        max_args: 2,
        usage: "setflag <flag> {true|false}",
        run: cmd_setflag,
    },
    Command {
        name: "getflag",
        min_args: 0,
        max_args: 1,
        usage: "getflag [flag]",
        run: cmd_getflag,
    },
    Command {
        name: "getreg",
        min_args: 0,
        max_args: 1,
        usage: "getreg [reg]",
        run: cmd_getreg,
    },
    Command {
        name: "setreg",
        min_args: 2,
        max_args: 2,
        usage: "setreg <reg> <val>",
        run: cmd_setreg,
    },
    Command {
        name: "clock",
        min_args: 0,
        max_args: 1,
        usage: "clock [count]",
        run: cmd_clock,
    },
    Command {
        name: "writemem",
        min_args: 2,
        max_args: 2,
        usage: "writemem <addr> <val>",
        run: cmd_writemem,
    },
    Command {
        name: "readmem",
        min_args: 0,
        max_args: 1,
        usage: "readmem [addr]",
        run: cmd_readmem,
    },
    Command {
        name: "writeum",
        min_args: 2,
        max_args: 2,
        usage: "writeum <addr> <word>",
        run: cmd_writeum,
    },
    Command {
        name: "readum",
        min_args: 0,
        max_args: 1,
        usage: "readum [addr]",
        run: cmd_readum,
    },
    Command {
        name: "loadum",
        min_args: 1,
        max_args: 1,
        usage: "loadum <file>",
        run: cmd_loadum,
    },
    Command {
        name: "saveum",
        min_args: 1,
        max_args: 1,
        usage: "saveum <file>",
        run: cmd_saveum,
    },
    Command {
        name: "irq",
        min_args: 0,
        max_args: 0,
        usage: "irq",
        run: cmd_irq,
    },
];

/// The front-panel session: one machine plus the quit latch.
pub struct Repl {
    machine: Machine,
    quit: bool,
}

impl Repl {
    /// Create a session around a fresh machine.
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            quit: false,
        }
    }

    /// The machine under the panel.
    pub fn machine(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// True once `quit` or `exit` ran.
    pub fn wants_quit(&self) -> bool {
        self.quit
    }

    /// Execute one input line and return the printable output.
    ///
    /// An empty line is a no-op. `--help` as the first argument prints
    /// the command's usage instead of running it.
    pub fn dispatch(&mut self, line: &str) -> Result<String, ReplError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(String::new());
        };

        let command = COMMANDS
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ReplError::UnknownCommand(name.to_string()))?;

        if args.first() == Some(&"--help") {
            return Ok(format!("usage: {}\n", command.usage));
        }

        if args.len() < command.min_args || args.len() > command.max_args {
            return Err(ReplError::ArgCount {
                min: command.min_args,
                max: command.max_args,
                got: args.len(),
            });
        }

        (command.run)(self, args)
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(token: &str) -> Result<u32, ReplError> {
    let parsed = match token.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => token.parse(),
    };

    parsed.map_err(|_| ReplError::NotANumber(token.to_string()))
}

fn parse_byte(token: &str) -> Result<u8, ReplError> {
    let val = parse_number(token)?;
    u8::try_from(val).map_err(|_| ReplError::ByteRange(val))
}

fn cmd_help(_repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut out = String::new();

    if let Some(&name) = args.first() {
        let command = COMMANDS
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ReplError::UnknownCommand(name.to_string()))?;
        writeln!(out, "'{}' usage: {}", command.name, command.usage).unwrap();
        return Ok(out);
    }

    for command in COMMANDS {
        writeln!(out, "'{}' usage: {}", command.name, command.usage).unwrap();
    }

    Ok(out)
}

fn cmd_quit(repl: &mut Repl, _args: &[&str]) -> Result<String, ReplError> {
    repl.quit = true;
    Ok(String::new())
}

fn cmd_setflag(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let sel = FlagSelect::from_name(args[0]).ok_or_else(|| ReplError::UnknownFlag(args[0].into()))?;

    let raw = match args[1] {
        "true" => true,
        "false" => false,
        other => return Err(ReplError::NotABool(other.to_string())),
    };

    repl.machine.write_flag(sel, raw);
    Ok(String::new())
}

fn cmd_getflag(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut out = String::new();

    if let Some(&name) = args.first() {
        let sel = FlagSelect::from_name(name).ok_or_else(|| ReplError::UnknownFlag(name.into()))?;
        writeln!(out, "{}: {}", sel.name(), repl.machine.flag(sel)).unwrap();
        return Ok(out);
    }

    for sel in FlagSelect::ALL {
        writeln!(out, "{}: {}", sel.name(), repl.machine.flag(sel)).unwrap();
    }

    Ok(out)
}

fn cmd_getreg(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut out = String::new();

    if let Some(&name) = args.first() {
        let sel =
            RegSelect::from_name(name).ok_or_else(|| ReplError::UnknownRegister(name.into()))?;
        writeln!(out, "{}: {}", sel.name(), repl.machine.register(sel)).unwrap();
        return Ok(out);
    }

    for sel in RegSelect::ALL {
        writeln!(out, "{}: {}", sel.name(), repl.machine.register(sel)).unwrap();
    }

    Ok(out)
}

fn cmd_setreg(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let sel =
        RegSelect::from_name(args[0]).ok_or_else(|| ReplError::UnknownRegister(args[0].into()))?;
    let val = parse_byte(args[1])?;

    repl.machine.set_register(sel, val);
    Ok(String::new())
}

fn cmd_clock(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let count = match args.first() {
        Some(&token) => parse_number(token)?,
        None => 1,
    };

    for _ in 0..count {
        repl.machine.step()?;
    }

    Ok(String::new())
}

fn cmd_writemem(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let addr = parse_number(args[0])?;
    let val = parse_number(args[1])?;

    repl.machine.set_em_at(addr as usize, val)?;
    Ok(String::new())
}

fn cmd_readmem(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut out = String::new();

    if let Some(&token) = args.first() {
        let addr = parse_number(token)? as usize;
        let val = repl.machine.em_at(addr)?;
        writeln!(out, "{}: {}", addr, val).unwrap();
        return Ok(out);
    }

    // 16x16 grid of the whole memory.
    for row in 0..16usize {
        write!(out, "{}:", row << 4).unwrap();
        for col in 0..16usize {
            let val = repl.machine.em_at(row << 4 | col)?;
            write!(out, " {}", val).unwrap();
        }
        writeln!(out).unwrap();
    }

    Ok(out)
}

fn cmd_writeum(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let addr = parse_number(args[0])?;
    let word = parse_number(args[1])?;

    repl.machine.set_um_at(addr as usize, word)?;
    Ok(String::new())
}

fn cmd_readum(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut out = String::new();

    if let Some(&token) = args.first() {
        let addr = parse_number(token)? as usize;
        let word = repl.machine.um_at(addr)?;
        writeln!(out, "{}: {:06x}", addr, word).unwrap();
        return Ok(out);
    }

    // 32 rows of 8 words.
    for row in 0..32usize {
        write!(out, "{}:", row << 3).unwrap();
        for col in 0..8usize {
            let word = repl.machine.um_at(row << 3 | col)?;
            write!(out, " {:06x}", word).unwrap();
        }
        writeln!(out).unwrap();
    }

    Ok(out)
}

fn cmd_loadum(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let ucode = ucode::load_ucode(args[0])?;
    repl.machine.load_microprogram(&ucode.words)?;

    Ok(format!("loaded {} words\n", ucode.len()))
}

fn cmd_saveum(repl: &mut Repl, args: &[&str]) -> Result<String, ReplError> {
    let mut ucode = UcodeFile::new();
    for addr in 0..crate::machine::MEMORY_SIZE {
        ucode.push(repl.machine.um_at(addr)?);
    }

    ucode::save_ucode(args[0], &ucode)?;
    Ok(format!("saved {} words\n", ucode.len()))
}

fn cmd_irq(repl: &mut Repl, _args: &[&str]) -> Result<String, ReplError> {
    repl.machine.trigger_interrupt();
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line_is_noop() {
        let mut repl = Repl::new();
        assert_eq!(repl.dispatch("").unwrap(), "");
        assert_eq!(repl.dispatch("   ").unwrap(), "");
    }

    #[test]
    fn test_unknown_command() {
        let mut repl = Repl::new();
        assert!(matches!(
            repl.dispatch("frobnicate"),
            Err(ReplError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_help_variants() {
        let mut repl = Repl::new();

        let all = repl.dispatch("help").unwrap();
        assert!(all.contains("'setflag' usage: setflag <flag> {true|false}"));
        assert!(all.contains("'clock' usage: clock [count]"));

        let one = repl.dispatch("help readmem").unwrap();
        assert_eq!(one, "'readmem' usage: readmem [addr]\n");

        let usage = repl.dispatch("setreg --help").unwrap();
        assert_eq!(usage, "usage: setreg <reg> <val>\n");
    }

    #[test]
    fn test_arg_count_violation() {
        let mut repl = Repl::new();
        match repl.dispatch("setflag emrd") {
            Err(ReplError::ArgCount { min: 2, max: 2, got: 1 }) => {}
            other => panic!("expected arg-count error, got {:?}", other),
        }
    }

    #[test]
    fn test_setflag_writes_raw_bit() {
        let mut repl = Repl::new();
        repl.dispatch("setflag emrd false").unwrap();

        // Raw storage 0 on an active-low line: asserted.
        assert_eq!(repl.dispatch("getflag emrd").unwrap(), "emrd: false\n");
        assert!(repl.machine().control().emrd.asserted());
    }

    #[test]
    fn test_setflag_rejects_bad_bool() {
        let mut repl = Repl::new();
        assert!(matches!(
            repl.dispatch("setflag emrd maybe"),
            Err(ReplError::NotABool(_))
        ));
    }

    #[test]
    fn test_unknown_names() {
        let mut repl = Repl::new();
        assert!(matches!(
            repl.dispatch("setflag bogus true"),
            Err(ReplError::UnknownFlag(_))
        ));
        assert!(matches!(
            repl.dispatch("getreg bogus"),
            Err(ReplError::UnknownRegister(_))
        ));
    }

    #[test]
    fn test_register_roundtrip_decimal() {
        let mut repl = Repl::new();
        repl.dispatch("setreg r2 66").unwrap();
        assert_eq!(repl.dispatch("getreg r2").unwrap(), "r2: 66\n");

        let all = repl.dispatch("getreg").unwrap();
        assert!(all.contains("ia: 224\n"));
        assert!(all.contains("r2: 66\n"));
    }

    #[test]
    fn test_setreg_range_and_parse() {
        let mut repl = Repl::new();
        assert!(matches!(
            repl.dispatch("setreg pc 256"),
            Err(ReplError::ByteRange(256))
        ));
        assert!(matches!(
            repl.dispatch("setreg pc abc"),
            Err(ReplError::NotANumber(_))
        ));
    }

    #[test]
    fn test_clock_steps_the_machine() {
        let mut repl = Repl::new();
        repl.dispatch("clock").unwrap();
        assert_eq!(repl.dispatch("getreg upc").unwrap(), "upc: 1\n");

        repl.dispatch("clock 3").unwrap();
        assert_eq!(repl.dispatch("getreg upc").unwrap(), "upc: 4\n");
    }

    #[test]
    fn test_clock_surfaces_engine_fault() {
        let mut repl = Repl::new();
        // A listener with no driver on the data bus.
        repl.dispatch("setflag aen false").unwrap();

        assert!(matches!(
            repl.dispatch("clock"),
            Err(ReplError::Engine(BusError::NoWriter))
        ));
    }

    #[test]
    fn test_memory_commands() {
        let mut repl = Repl::new();
        repl.dispatch("writemem 16 171").unwrap();
        assert_eq!(repl.dispatch("readmem 16").unwrap(), "16: 171\n");

        let dump = repl.dispatch("readmem").unwrap();
        assert_eq!(dump.lines().count(), 16);
        assert!(dump.contains("16: 171"));

        assert!(matches!(
            repl.dispatch("writemem 300 0"),
            Err(ReplError::Memory(MemoryError::AddressOutOfRange(300)))
        ));
        assert!(matches!(
            repl.dispatch("writemem 0 300"),
            Err(ReplError::Memory(MemoryError::ValueOutOfRange(300)))
        ));
    }

    #[test]
    fn test_microprogram_commands() {
        let mut repl = Repl::new();
        repl.dispatch("writeum 0 0xc3ffff").unwrap();
        assert_eq!(repl.dispatch("readum 0").unwrap(), "0: c3ffff\n");

        let dump = repl.dispatch("readum").unwrap();
        assert_eq!(dump.lines().count(), 32);
        assert!(dump.starts_with("0: c3ffff"));
    }

    #[test]
    fn test_ucode_file_roundtrip_through_panel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.ucode");
        let path = path.to_str().unwrap();

        let mut repl = Repl::new();
        repl.dispatch("writeum 0 0xc3ffff").unwrap();
        repl.dispatch(&format!("saveum {}", path)).unwrap();

        let mut other = Repl::new();
        let report = other.dispatch(&format!("loadum {}", path)).unwrap();
        assert_eq!(report, "loaded 256 words\n");
        assert_eq!(other.dispatch("readum 0").unwrap(), "0: c3ffff\n");
    }

    #[test]
    fn test_irq_raises_request_line() {
        let mut repl = Repl::new();
        repl.dispatch("irq").unwrap();
        assert_eq!(repl.dispatch("getflag ireq").unwrap(), "ireq: true\n");

        repl.dispatch("clock").unwrap();
        assert_eq!(repl.dispatch("getflag iack").unwrap(), "iack: true\n");
    }

    #[test]
    fn test_quit_latches() {
        let mut repl = Repl::new();
        assert!(!repl.wants_quit());
        repl.dispatch("quit").unwrap();
        assert!(repl.wants_quit());

        let mut repl = Repl::new();
        repl.dispatch("exit").unwrap();
        assert!(repl.wants_quit());
    }
}
