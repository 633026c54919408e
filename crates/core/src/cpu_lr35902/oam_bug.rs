//! DMG OAM corruption bug
//!
//! While the PPU is scanning OAM (mode 2) it reads one 8-byte row per machine
//! cycle. If the CPU drives an address in $FE00-$FEFF onto the bus in the
//! same cycle through the 16-bit inc/dec unit, the row the PPU is looking at
//! gets mangled with its neighbours. The merge expressions below are the
//! empirically measured ones; they do not follow from any known circuit
//! model and must not be "simplified".
//!
//! OAM is treated as 20 rows of four little-endian 16-bit words.

use super::memory::{PpuTiming, OAM_SIZE};

const ROW_BYTES: usize = 8;
const ROWS: usize = OAM_SIZE / ROW_BYTES;
/// Mode 2 lasts 80 ticks: one row per machine cycle.
const OAM_SCAN_TICKS: u16 = 80;
const MODE_OAM_SCAN: u8 = 2;

/// Which instruction cycle put the OAM address on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OamCorruption {
    /// `INC rr` / `DEC rr`, and the HL step of `LD (HL+),A` / `LD (HL-),A`
    IncDec,
    /// HL step of `LD A,(HL+)` / `LD A,(HL-)`
    ReadIncDec,
    /// First stack write of `PUSH`/`CALL`/`RST` (decrement then write)
    PushFirst,
    /// Second stack write of `PUSH`/`CALL`/`RST`
    PushSecond,
    /// First stack read of `POP`/`RET`
    PopFirst,
    /// Second stack read of `POP`/`RET`
    PopSecond,
    /// Operand fetch of `LD rr,d16`
    LoadImm16,
}

/// Address range that triggers the bug. Wider than OAM itself.
pub fn in_trigger_range(addr: u16) -> bool {
    (0xFE00..=0xFEFF).contains(&addr)
}

/// Row the PPU is scanning, if the current moment is inside the window
/// where a corruption can land.
pub fn accessed_row(ppu: &dyn PpuTiming) -> Option<usize> {
    if !ppu.lcd_enabled() || ppu.mode() != MODE_OAM_SCAN {
        return None;
    }
    let ticks = ppu.line_ticks();
    if ticks >= OAM_SCAN_TICKS {
        return None;
    }
    let row = (ticks / 4) as usize;
    // Row 0 is never affected.
    if row == 0 {
        None
    } else {
        Some(row)
    }
}

/// Apply the corruption pattern for `kind` given the PPU's position in the
/// current scanline. Returns whether OAM was touched.
pub fn corrupt(kind: OamCorruption, ppu: &dyn PpuTiming, oam: &mut [u8; OAM_SIZE]) -> bool {
    let Some(row) = accessed_row(ppu) else {
        return false;
    };

    match kind {
        OamCorruption::IncDec | OamCorruption::PushSecond => write_corruption(oam, row),
        OamCorruption::PushFirst => {
            write_corruption(oam, row);
            if row + 1 < ROWS {
                write_corruption(oam, row + 1);
            }
        }
        OamCorruption::PopFirst | OamCorruption::ReadIncDec => read_incdec_corruption(oam, row),
        OamCorruption::PopSecond => read_corruption(oam, row),
        OamCorruption::LoadImm16 => {
            read_incdec_corruption(oam, row);
            if row + 1 < ROWS {
                read_corruption(oam, row + 1);
            }
        }
    }
    true
}

fn word(oam: &[u8; OAM_SIZE], row: usize, index: usize) -> u16 {
    let at = row * ROW_BYTES + index * 2;
    u16::from_le_bytes([oam[at], oam[at + 1]])
}

fn set_word(oam: &mut [u8; OAM_SIZE], row: usize, index: usize, val: u16) {
    let at = row * ROW_BYTES + index * 2;
    oam[at..at + 2].copy_from_slice(&val.to_le_bytes());
}

/// Copy words `from_word..4` of row `src` over row `dst`.
fn copy_row(oam: &mut [u8; OAM_SIZE], src: usize, dst: usize, from_word: usize) {
    let start = from_word * 2;
    oam.copy_within(
        src * ROW_BYTES + start..(src + 1) * ROW_BYTES,
        dst * ROW_BYTES + start,
    );
}

fn write_corruption(oam: &mut [u8; OAM_SIZE], row: usize) {
    let a = word(oam, row, 0);
    let b = word(oam, row - 1, 0);
    let c = word(oam, row - 1, 2);
    set_word(oam, row, 0, ((a ^ c) & (b ^ c)) ^ c);
    copy_row(oam, row - 1, row, 1);
}

fn read_corruption(oam: &mut [u8; OAM_SIZE], row: usize) {
    let a = word(oam, row, 0);
    let b = word(oam, row - 1, 0);
    let c = word(oam, row - 1, 2);
    set_word(oam, row, 0, b | (a & c));
    copy_row(oam, row - 1, row, 1);
}

fn read_incdec_corruption(oam: &mut [u8; OAM_SIZE], row: usize) {
    if (4..ROWS - 1).contains(&row) {
        let a = word(oam, row - 2, 0);
        let b = word(oam, row - 1, 0);
        let c = word(oam, row, 0);
        let d = word(oam, row - 1, 2);
        set_word(oam, row - 1, 0, (b & (a | c | d)) | (a & c & d));
        copy_row(oam, row - 1, row, 0);
        copy_row(oam, row - 1, row - 2, 0);
    }
    read_corruption(oam, row);
}
