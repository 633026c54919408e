//! Game Boy memory bus
//!
//! Connects the CPU core to a flat cartridge image and the timing-relevant
//! peripherals. There is no bank switching: the image is mapped as-is at
//! $0000-$7FFF, which is what CPU conformance ROMs need.
//!
//! # Memory Map
//!
//! ```text
//! $0000-$7FFF  Image (32KB, read-only, writes ignored)
//! $8000-$9FFF  Video RAM (8KB)
//! $A000-$BFFF  External RAM (8KB)
//! $C000-$DFFF  Work RAM (8KB)
//! $E000-$FDFF  Echo RAM (mirror of $C000-$DDFF)
//! $FE00-$FE9F  OAM - Object Attribute Memory (160 bytes)
//! $FEA0-$FEFF  Not usable
//! $FF00-$FF7F  I/O Registers
//! $FF80-$FFFE  High RAM (127 bytes)
//! $FFFF        Interrupt Enable Register
//! ```
//!
//! IF ($FF0F) and IE ($FFFF) belong to the CPU's interrupt controller; CPU
//! accesses to them never reach this bus. Peripherals raise requests through
//! [`GbBus::take_interrupts`], which the system forwards once per tick.
//!
//! # I/O Registers handled here
//!
//! - `$FF00 (P1)`: Joypad matrix
//! - `$FF01 (SB)` / `$FF02 (SC)`: Serial. A transfer started with the internal
//!   clock completes immediately; the byte is appended to the capture buffer.
//! - `$FF04-$FF07`: Timer
//! - `$FF40-$FF4B`: PPU registers
//! - `$FF46 (DMA)`: OAM DMA, one byte per machine cycle

use lr35902_core::cpu_lr35902::{Interrupt, MemoryLr35902, OamAccess, PpuStatus, OAM_SIZE};
use lr35902_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};

use crate::ppu::Ppu;
use crate::timer::Timer;

/// Largest image that fits the unbanked ROM area
pub const MAX_IMAGE_SIZE: usize = 0x8000;

const DMA_LENGTH: u8 = OAM_SIZE as u8;
const SC_START_INTERNAL: u8 = 0x81;

/// In-flight OAM DMA transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dma {
    source: u16,
    /// Next byte to copy
    index: u8,
    /// Ticks into the current machine cycle
    ticks: u8,
}

/// Game Boy memory bus
pub struct GbBus {
    rom: Vec<u8>,
    ext_ram: [u8; 0x2000],
    wram: [u8; 0x2000],
    hram: [u8; 0x7F],
    pub ppu: Ppu,
    pub timer: Timer,
    /// Joypad select bits (P1 bits 4-5)
    joypad: u8,
    /// Bits: 0=Right, 1=Left, 2=Up, 3=Down, 4=A, 5=B, 6=Select, 7=Start (0 = pressed)
    button_state: u8,
    sb: u8,
    sc: u8,
    serial_out: Vec<u8>,
    dma_reg: u8,
    dma: Option<Dma>,
    /// Requests raised since the last `take_interrupts`
    irq: u8,
}

impl Default for GbBus {
    fn default() -> Self {
        Self::new()
    }
}

impl GbBus {
    pub fn new() -> Self {
        Self {
            rom: vec![0xFF; MAX_IMAGE_SIZE],
            ext_ram: [0; 0x2000],
            wram: [0; 0x2000],
            hram: [0; 0x7F],
            ppu: Ppu::new(),
            timer: Timer::new(),
            joypad: 0x30,
            button_state: 0xFF,
            sb: 0,
            sc: 0x7E,
            serial_out: Vec::new(),
            dma_reg: 0xFF,
            dma: None,
            irq: 0,
        }
    }

    /// Power-on state for everything except the loaded image
    pub fn reset(&mut self) {
        let rom = std::mem::take(&mut self.rom);
        *self = Self::new();
        self.rom = rom;
    }

    /// Map `data` at $0000; the caller checks the size.
    pub fn load_image(&mut self, data: &[u8]) {
        self.rom.fill(0xFF);
        let len = data.len().min(MAX_IMAGE_SIZE);
        self.rom[..len].copy_from_slice(&data[..len]);
    }

    /// Set joypad button state. A newly pressed button requests the joypad interrupt.
    pub fn set_buttons(&mut self, state: u8) {
        let pressed = self.button_state & !state;
        self.button_state = state;
        if pressed != 0 {
            self.irq |= Interrupt::Joypad.bit();
        }
    }

    /// Bytes sent over the serial port so far
    pub fn serial_output(&self) -> &[u8] {
        &self.serial_out
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.serial_out)
    }

    pub fn dma_active(&self) -> bool {
        self.dma.is_some()
    }

    /// Drain interrupt requests raised by peripherals (IF layout)
    pub fn take_interrupts(&mut self) -> u8 {
        std::mem::take(&mut self.irq)
    }

    /// Advance PPU, timer and DMA by one clock tick, in that order.
    pub fn tick_peripherals(&mut self) {
        self.irq |= self.ppu.tick();
        self.irq |= self.timer.tick();
        self.tick_dma();
    }

    fn tick_dma(&mut self) {
        let Some(mut dma) = self.dma else {
            return;
        };
        dma.ticks += 1;
        if dma.ticks == 4 {
            dma.ticks = 0;
            let val = self.read_raw(dma.source.wrapping_add(dma.index as u16));
            self.ppu.write_oam(dma.index as usize, val);
            dma.index += 1;
        }
        self.dma = if dma.index < DMA_LENGTH { Some(dma) } else { None };
    }

    fn read_joypad(&self) -> u8 {
        let select_buttons = (self.joypad & 0x20) == 0;
        let select_dpad = (self.joypad & 0x10) == 0;

        let mut result = 0xC0 | self.joypad;
        if select_buttons {
            result |= (self.button_state >> 4) & 0x0F;
        } else if select_dpad {
            result |= self.button_state & 0x0F;
        } else {
            result |= 0x0F;
        }
        result
    }

    fn write_serial_control(&mut self, val: u8) {
        self.sc = val | 0x7E;
        if val & SC_START_INTERNAL == SC_START_INTERNAL {
            let byte = self.sb;
            self.serial_out.push(byte);
            log(LogCategory::Bus, LogLevel::Debug, || {
                format!("SERIAL: {:02X} '{}'", byte, (byte as char).escape_default())
            });
            // No link partner: the incoming bits are all ones
            self.sb = 0xFF;
            self.sc &= !0x80;
            self.irq |= Interrupt::Serial.bit();
        }
    }

    fn start_dma(&mut self, val: u8) {
        self.dma_reg = val;
        self.dma = Some(Dma {
            source: (val as u16) << 8,
            index: 0,
            ticks: 0,
        });
        log(LogCategory::Bus, LogLevel::Debug, || {
            format!("DMA: OAM transfer from {:04X}", (val as u16) << 8)
        });
    }

    /// Bus read without DMA blocking; also the DMA engine's view of memory.
    fn read_raw(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom[addr as usize],
            0x8000..=0x9FFF => self.ppu.read_vram(addr - 0x8000),
            0xA000..=0xBFFF => self.ext_ram[(addr - 0xA000) as usize],
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.ppu.read_oam((addr - 0xFE00) as usize),
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => self.read_joypad(),
            0xFF01 => self.sb,
            0xFF02 => self.sc,
            0xFF04..=0xFF07 => self.timer.read_register(addr),
            0xFF46 => self.dma_reg,
            0xFF40..=0xFF4B => self.ppu.read_register(addr),
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            _ => 0xFF,
        }
    }

    pub(crate) fn state(&self) -> BusState {
        BusState {
            ext_ram: self.ext_ram.to_vec(),
            wram: self.wram.to_vec(),
            hram: self.hram.to_vec(),
            vram: self.ppu.vram().to_vec(),
            oam: self.ppu.oam().to_vec(),
            ppu: self.ppu.regs.clone(),
            timer: self.timer.clone(),
            joypad: self.joypad,
            sb: self.sb,
            sc: self.sc,
            dma_reg: self.dma_reg,
            dma: self.dma,
            irq: self.irq,
        }
    }

    /// Returns false if a memory block has the wrong size.
    pub(crate) fn restore(&mut self, state: &BusState) -> bool {
        if state.ext_ram.len() != self.ext_ram.len()
            || state.wram.len() != self.wram.len()
            || state.hram.len() != self.hram.len()
        {
            return false;
        }
        if !self.ppu.load_memory(&state.vram, &state.oam) {
            return false;
        }
        self.ext_ram.copy_from_slice(&state.ext_ram);
        self.wram.copy_from_slice(&state.wram);
        self.hram.copy_from_slice(&state.hram);
        self.ppu.regs = state.ppu.clone();
        self.timer = state.timer.clone();
        self.joypad = state.joypad;
        self.sb = state.sb;
        self.sc = state.sc;
        self.dma_reg = state.dma_reg;
        self.dma = state.dma;
        self.irq = state.irq;
        true
    }
}

/// Serializable bus contents, excluding the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusState {
    ext_ram: Vec<u8>,
    wram: Vec<u8>,
    hram: Vec<u8>,
    vram: Vec<u8>,
    oam: Vec<u8>,
    ppu: crate::ppu::PpuRegisters,
    timer: Timer,
    joypad: u8,
    sb: u8,
    sc: u8,
    dma_reg: u8,
    dma: Option<Dma>,
    irq: u8,
}

impl MemoryLr35902 for GbBus {
    fn read(&self, addr: u16) -> u8 {
        // During OAM DMA the CPU only sees HRAM
        if self.dma.is_some() && !(0xFF80..=0xFFFE).contains(&addr) {
            return 0xFF;
        }
        self.read_raw(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        if self.dma.is_some() && (0xFE00..=0xFE9F).contains(&addr) {
            return;
        }
        match addr {
            // Image is read-only
            0x0000..=0x7FFF => {}
            0x8000..=0x9FFF => self.ppu.write_vram(addr - 0x8000, val),
            0xA000..=0xBFFF => self.ext_ram[(addr - 0xA000) as usize] = val,
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = val,
            0xFE00..=0xFE9F => self.ppu.write_oam((addr - 0xFE00) as usize, val),
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.joypad = val & 0x30, // Only bits 4-5 are writable
            0xFF01 => self.sb = val,
            0xFF02 => self.write_serial_control(val),
            0xFF04..=0xFF07 => self.timer.write_register(addr, val),
            0xFF46 => self.start_dma(val),
            0xFF40..=0xFF4B => self.ppu.write_register(addr, val),
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            _ => {}
        }
    }

    fn oam_access(&mut self) -> Option<OamAccess<'_>> {
        let status = PpuStatus::of(&self.ppu);
        Some(OamAccess {
            status,
            oam: &mut self.ppu.oam,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_mapping_and_read_only() {
        let mut bus = GbBus::new();
        bus.load_image(&[0x31, 0xFE, 0xFF]);
        assert_eq!(bus.read(0x0000), 0x31);
        assert_eq!(bus.read(0x0003), 0xFF);
        bus.write(0x0000, 0x00);
        assert_eq!(bus.read(0x0000), 0x31);
    }

    #[test]
    fn test_echo_ram_mirrors_wram() {
        let mut bus = GbBus::new();
        bus.write(0xC123, 0x42);
        assert_eq!(bus.read(0xE123), 0x42);
        bus.write(0xE200, 0x17);
        assert_eq!(bus.read(0xC200), 0x17);
    }

    #[test]
    fn test_serial_capture() {
        let mut bus = GbBus::new();
        bus.write(0xFF01, b'O');
        bus.write(0xFF02, 0x81);
        bus.write(0xFF01, b'k');
        bus.write(0xFF02, 0x81);
        assert_eq!(bus.serial_output(), b"Ok");
        assert_eq!(bus.read(0xFF02) & 0x80, 0);
        assert_eq!(bus.take_interrupts(), Interrupt::Serial.bit());
        assert_eq!(bus.take_interrupts(), 0);
    }

    #[test]
    fn test_serial_external_clock_does_not_send() {
        let mut bus = GbBus::new();
        bus.write(0xFF01, b'x');
        bus.write(0xFF02, 0x80);
        assert!(bus.serial_output().is_empty());
    }

    #[test]
    fn test_oam_dma_one_byte_per_mcycle() {
        let mut bus = GbBus::new();
        for i in 0..OAM_SIZE {
            bus.write(0xC000 + i as u16, i as u8 ^ 0x5A);
        }
        bus.write(0xFF46, 0xC0);
        assert!(bus.dma_active());
        assert_eq!(bus.read(0xC000), 0xFF); // blocked
        bus.write(0xFF80, 0x99);
        assert_eq!(bus.read(0xFF80), 0x99); // HRAM still reachable

        for _ in 0..4 {
            bus.tick_peripherals();
        }
        assert_eq!(bus.ppu.read_oam(0), 0x5A);
        assert_eq!(bus.ppu.read_oam(1), 0x00);

        for _ in 0..(OAM_SIZE - 1) * 4 {
            bus.tick_peripherals();
        }
        assert!(!bus.dma_active());
        assert_eq!(bus.read(0xFE9F), (OAM_SIZE as u8 - 1) ^ 0x5A);
    }

    #[test]
    fn test_joypad_matrix_and_interrupt() {
        let mut bus = GbBus::new();
        bus.write(0xFF00, 0x10); // select buttons
        assert_eq!(bus.read(0xFF00) & 0x0F, 0x0F);
        bus.set_buttons(0xEF); // A pressed
        assert_eq!(bus.read(0xFF00) & 0x0F, 0x0E);
        assert_eq!(bus.take_interrupts(), Interrupt::Joypad.bit());
        bus.set_buttons(0xFF); // release raises nothing
        assert_eq!(bus.take_interrupts(), 0);
    }

    #[test]
    fn test_oam_access_reports_ppu_timing() {
        let mut bus = GbBus::new();
        for _ in 0..20 {
            bus.tick_peripherals();
        }
        let access = bus.oam_access().expect("DMG bus exposes OAM");
        assert!(access.status.lcd_enabled);
        assert_eq!(access.status.mode, 2);
        assert_eq!(access.status.line_ticks, 20);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut bus = GbBus::new();
        bus.write(0xC000, 0x12);
        bus.write(0xFE00, 0x34);
        bus.write(0xFF07, 0x05);
        let state = bus.state();

        let mut other = GbBus::new();
        assert!(other.restore(&state));
        assert_eq!(other.read(0xC000), 0x12);
        assert_eq!(other.read(0xFE00), 0x34);
        assert_eq!(other.read(0xFF07), 0xFD);
    }
}
