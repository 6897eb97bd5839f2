//! COP2K - front-panel entry point.
//!
//! Starts the interactive panel, optionally preloading a microcode
//! image into the micro-program memory first:
//!
//! - `cop2k` - fresh machine, empty UM
//! - `cop2k --ucode fetch.ucode` - UM preloaded from an image

use ansi_term::Colour;
use clap::Parser;
use cop2k::repl::{Repl, PROMPT};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cop2k")]
#[command(version)]
#[command(about = "A control-signal-level simulator of the COP2000 8-bit educational computer")]
struct Cli {
    /// Microcode image to load into the micro-program memory at startup
    #[arg(short, long)]
    ucode: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let mut repl = Repl::new();

    if let Some(path) = &cli.ucode {
        match cop2k::ucode::load_ucode(path) {
            Ok(image) => match repl.machine().load_microprogram(&image.words) {
                Ok(()) => println!("loaded {} words from {}", image.len(), path.display()),
                Err(e) => {
                    eprintln!("error: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("error: cannot open terminal: {}", e);
            std::process::exit(1);
        }
    };

    let prompt = Colour::Green.bold().paint(PROMPT).to_string();

    while !repl.wants_quit() {
        match editor.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());

                match repl.dispatch(&line) {
                    Ok(output) => print!("{}", output),
                    Err(e) => eprintln!("{} {}", Colour::Red.paint("error:"), e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {}", e);
                break;
            }
        }
    }
}
