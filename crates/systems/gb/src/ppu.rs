//! Game Boy PPU (LCD Controller), timing only
//!
//! Nothing is rendered. The PPU walks the DMG scanline schedule so that LY,
//! STAT, the VBlank/STAT interrupts and the OAM scan window the CPU's OAM
//! corruption quirk depends on all happen on the right clock tick.
//!
//! ```text
//! line 0-143:  mode 2 (80 ticks) -> mode 3 (172 ticks) -> mode 0 (204 ticks)
//! line 144-153: mode 1 (456 ticks each)
//! ```

use lr35902_core::cpu_lr35902::{Interrupt, PpuTiming, OAM_SIZE};
use serde::{Deserialize, Serialize};

pub const TICKS_PER_LINE: u16 = 456;
pub const LINES_PER_FRAME: u8 = 154;
const VBLANK_START: u8 = 144;
const OAM_SCAN_END: u16 = 80;
const DRAWING_END: u16 = OAM_SCAN_END + 172;

pub const MODE_HBLANK: u8 = 0;
pub const MODE_VBLANK: u8 = 1;
pub const MODE_OAM_SCAN: u8 = 2;
pub const MODE_DRAWING: u8 = 3;

// LCDC bits
const LCDC_ENABLE: u8 = 0x80;

// STAT interrupt selects
const STAT_LYC_INT: u8 = 0x40;
const STAT_OAM_INT: u8 = 0x20;
const STAT_VBLANK_INT: u8 = 0x10;
const STAT_HBLANK_INT: u8 = 0x08;
const STAT_WRITABLE: u8 = 0x78;

/// LCD registers and scanline position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpuRegisters {
    /// LCD Control (0xFF40)
    pub lcdc: u8,
    /// STAT interrupt selects (0xFF41 bits 3-6)
    pub stat: u8,
    /// Scroll Y (0xFF42)
    pub scy: u8,
    /// Scroll X (0xFF43)
    pub scx: u8,
    /// LY (LCD Y coordinate, 0xFF44)
    pub ly: u8,
    /// LY Compare (0xFF45)
    pub lyc: u8,
    /// BG Palette (0xFF47)
    pub bgp: u8,
    /// OBJ Palette 0 (0xFF48)
    pub obp0: u8,
    /// OBJ Palette 1 (0xFF49)
    pub obp1: u8,
    /// Window Y (0xFF4A)
    pub wy: u8,
    /// Window X (0xFF4B)
    pub wx: u8,
    pub line_ticks: u16,
    pub mode: u8,
    /// Level of the combined STAT interrupt line; requests fire on its rising edge
    pub stat_line: bool,
}

/// Game Boy PPU state
pub struct Ppu {
    vram: [u8; 0x2000],
    pub(crate) oam: [u8; OAM_SIZE],
    pub regs: PpuRegisters,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            vram: [0; 0x2000],
            oam: [0; OAM_SIZE],
            regs: PpuRegisters {
                lcdc: 0x91,
                stat: 0x00,
                scy: 0,
                scx: 0,
                ly: 0,
                lyc: 0,
                bgp: 0xFC,
                obp0: 0xFF,
                obp1: 0xFF,
                wy: 0,
                wx: 0,
                line_ticks: 0,
                mode: MODE_OAM_SCAN,
                stat_line: false,
            },
        }
    }

    pub fn lcd_on(&self) -> bool {
        self.regs.lcdc & LCDC_ENABLE != 0
    }

    /// Read from VRAM (0x8000-0x9FFF)
    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    /// Write to VRAM (0x8000-0x9FFF)
    pub fn write_vram(&mut self, addr: u16, val: u8) {
        self.vram[(addr & 0x1FFF) as usize] = val;
    }

    /// Read from OAM (0xFE00-0xFE9F)
    pub fn read_oam(&self, offset: usize) -> u8 {
        self.oam.get(offset).copied().unwrap_or(0xFF)
    }

    /// Write to OAM (0xFE00-0xFE9F)
    pub fn write_oam(&mut self, offset: usize, val: u8) {
        if let Some(slot) = self.oam.get_mut(offset) {
            *slot = val;
        }
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    pub(crate) fn load_memory(&mut self, vram: &[u8], oam: &[u8]) -> bool {
        if vram.len() != self.vram.len() || oam.len() != self.oam.len() {
            return false;
        }
        self.vram.copy_from_slice(vram);
        self.oam.copy_from_slice(oam);
        true
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        let r = &self.regs;
        match addr {
            0xFF40 => r.lcdc,
            0xFF41 => {
                let coincidence = if r.ly == r.lyc { 0x04 } else { 0 };
                let mode = if self.lcd_on() { r.mode } else { MODE_HBLANK };
                0x80 | r.stat | coincidence | mode
            }
            0xFF42 => r.scy,
            0xFF43 => r.scx,
            0xFF44 => r.ly,
            0xFF45 => r.lyc,
            0xFF47 => r.bgp,
            0xFF48 => r.obp0,
            0xFF49 => r.obp1,
            0xFF4A => r.wy,
            0xFF4B => r.wx,
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF40 => self.write_lcdc(val),
            0xFF41 => self.regs.stat = val & STAT_WRITABLE,
            0xFF42 => self.regs.scy = val,
            0xFF43 => self.regs.scx = val,
            0xFF44 => {} // LY is read-only
            0xFF45 => self.regs.lyc = val,
            0xFF47 => self.regs.bgp = val,
            0xFF48 => self.regs.obp0 = val,
            0xFF49 => self.regs.obp1 = val,
            0xFF4A => self.regs.wy = val,
            0xFF4B => self.regs.wx = val,
            _ => {}
        }
    }

    fn write_lcdc(&mut self, val: u8) {
        let was_on = self.lcd_on();
        self.regs.lcdc = val;
        match (was_on, self.lcd_on()) {
            (true, false) => {
                self.regs.ly = 0;
                self.regs.line_ticks = 0;
                self.regs.mode = MODE_HBLANK;
                self.regs.stat_line = false;
            }
            (false, true) => {
                self.regs.line_ticks = 0;
                self.regs.mode = MODE_OAM_SCAN;
            }
            _ => {}
        }
    }

    /// Advance one clock tick. Returns the interrupt requests raised (IF layout).
    pub fn tick(&mut self) -> u8 {
        if !self.lcd_on() {
            return 0;
        }

        let r = &mut self.regs;
        r.line_ticks += 1;
        if r.line_ticks == TICKS_PER_LINE {
            r.line_ticks = 0;
            r.ly = (r.ly + 1) % LINES_PER_FRAME;
        }

        let mode = if r.ly >= VBLANK_START {
            MODE_VBLANK
        } else if r.line_ticks < OAM_SCAN_END {
            MODE_OAM_SCAN
        } else if r.line_ticks < DRAWING_END {
            MODE_DRAWING
        } else {
            MODE_HBLANK
        };

        let mut irq = 0;
        if mode != r.mode {
            if mode == MODE_VBLANK {
                irq |= Interrupt::VBlank.bit();
            }
            r.mode = mode;
        }

        let line = (r.stat & STAT_LYC_INT != 0 && r.ly == r.lyc)
            || (r.stat & STAT_OAM_INT != 0 && mode == MODE_OAM_SCAN)
            || (r.stat & STAT_VBLANK_INT != 0 && mode == MODE_VBLANK)
            || (r.stat & STAT_HBLANK_INT != 0 && mode == MODE_HBLANK);
        if line && !r.stat_line {
            irq |= Interrupt::Stat.bit();
        }
        r.stat_line = line;

        irq
    }
}

impl PpuTiming for Ppu {
    fn lcd_enabled(&self) -> bool {
        self.lcd_on()
    }

    fn mode(&self) -> u8 {
        if self.lcd_on() {
            self.regs.mode
        } else {
            MODE_HBLANK
        }
    }

    fn line_ticks(&self) -> u16 {
        self.regs.line_ticks
    }
}
