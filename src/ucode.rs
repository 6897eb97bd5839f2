//! Microcode image files.
//!
//! A flat text format for micro-program memory images:
//! - one 24-bit word per line, written as six hex digits
//! - anything after `;` is a comment
//! - blank lines are ignored
//!
//! Words are loaded into UM in file order starting at address 0.

use crate::machine::memory::{MEMORY_SIZE, MICRO_WORD_MASK};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use thiserror::Error;

/// A loaded microcode image.
#[derive(Debug, Clone, Default)]
pub struct UcodeFile {
    /// The micro-instruction words, in UM address order.
    pub words: Vec<u32>,
}

impl UcodeFile {
    /// Create an empty image.
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Append a word.
    pub fn push(&mut self, word: u32) {
        self.words.push(word);
    }

    /// Number of words in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Load a microcode image from disk.
pub fn load_ucode<P: AsRef<Path>>(path: P) -> Result<UcodeFile, UcodeError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| UcodeError::Io(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut ucode = UcodeFile::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| UcodeError::Io(e.to_string()))?;
        let text = match line.split_once(';') {
            Some((before, _)) => before,
            None => line.as_str(),
        };
        let text = text.trim();

        if text.is_empty() {
            continue;
        }

        let word = u32::from_str_radix(text, 16).map_err(|_| UcodeError::Parse {
            line: line_num + 1,
            message: format!("'{}' is not a hex word", text),
        })?;

        if word > MICRO_WORD_MASK {
            return Err(UcodeError::Parse {
                line: line_num + 1,
                message: format!("{:#x} does not fit in 24 bits", word),
            });
        }

        if ucode.len() == MEMORY_SIZE {
            return Err(UcodeError::Parse {
                line: line_num + 1,
                message: format!("image exceeds {} words", MEMORY_SIZE),
            });
        }

        ucode.push(word);
    }

    Ok(ucode)
}

/// Save a microcode image to disk.
pub fn save_ucode<P: AsRef<Path>>(path: P, ucode: &UcodeFile) -> Result<(), UcodeError> {
    let mut file = std::fs::File::create(path.as_ref()).map_err(|e| UcodeError::Io(e.to_string()))?;

    writeln!(file, "; COP2K microcode image").map_err(|e| UcodeError::Io(e.to_string()))?;
    writeln!(file, "; {} words", ucode.len()).map_err(|e| UcodeError::Io(e.to_string()))?;
    writeln!(file).map_err(|e| UcodeError::Io(e.to_string()))?;

    for (addr, word) in ucode.words.iter().enumerate() {
        writeln!(file, "{:06x} ; {:03}", word, addr).map_err(|e| UcodeError::Io(e.to_string()))?;
    }

    Ok(())
}

/// Errors that can occur while reading or writing microcode images.
#[derive(Debug, Clone, Error)]
pub enum UcodeError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}
