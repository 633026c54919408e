//! Per-instruction execution trace
//!
//! The `Display` form is the line format used by gameboy-doctor and most
//! reference traces, so logs can be diffed against known-good emulators.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registers::Registers;

/// How trace lines are logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraceFormat {
    /// Register line only, diffable against gameboy-doctor logs
    #[default]
    Doctor,
    /// Register line plus the completed instruction and cycle count
    Verbose,
}

/// Machine state right after an instruction completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub registers: Registers,
    /// Clock ticks at completion
    pub cycles: u64,
    /// Opcode of the completed instruction
    pub opcode: u8,
    pub prefixed: bool,
    pub mnemonic: &'static str,
    /// Four bytes at the new PC
    pub pcmem: [u8; 4],
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.registers;
        write!(
            f,
            "A:{:02X} F:{:02X} B:{:02X} C:{:02X} D:{:02X} E:{:02X} H:{:02X} L:{:02X} SP:{:04X} PC:{:04X} PCMEM:{:02X},{:02X},{:02X},{:02X}",
            r.a, r.f, r.b, r.c, r.d, r.e, r.h, r.l, r.sp, r.pc,
            self.pcmem[0], self.pcmem[1], self.pcmem[2], self.pcmem[3]
        )
    }
}

impl TraceEntry {
    /// Longer form with the completed instruction and cycle count
    pub fn verbose(&self) -> String {
        let prefix = if self.prefixed { "CB " } else { "" };
        format!("{} | {}{:02X} {} @{}", self, prefix, self.opcode, self.mnemonic, self.cycles)
    }

    pub fn render(&self, format: TraceFormat) -> String {
        match format {
            TraceFormat::Doctor => self.to_string(),
            TraceFormat::Verbose => self.verbose(),
        }
    }
}
