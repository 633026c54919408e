//! Bus contract between the CPU core and the rest of the machine

/// Size of sprite attribute memory ($FE00-$FE9F)
pub const OAM_SIZE: usize = 0xA0;

/// Memory interface trait for the LR35902 CPU
pub trait MemoryLr35902 {
    /// Read a byte from memory
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to memory
    fn write(&mut self, addr: u16, val: u8);

    /// Little-endian word read: low byte at `addr`, high byte at `addr + 1`
    fn read16(&self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Little-endian word write
    fn write16(&mut self, addr: u16, val: u16) {
        self.write(addr, val as u8);
        self.write(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Pixel pipeline state plus raw OAM, for the OAM corruption quirk.
    ///
    /// Buses without a PPU keep the default and the quirk never fires.
    fn oam_access(&mut self) -> Option<OamAccess<'_>> {
        None
    }
}

/// Read-only view of the pixel pipeline timing the CPU needs for the OAM
/// corruption quirk. Implemented by the PPU.
pub trait PpuTiming {
    /// LCDC bit 7
    fn lcd_enabled(&self) -> bool;

    /// STAT mode bits (0 = HBlank, 1 = VBlank, 2 = OAM scan, 3 = drawing)
    fn mode(&self) -> u8;

    /// Clock ticks elapsed in the current scanline (0-455)
    fn line_ticks(&self) -> u16;
}

/// Copy of the three [`PpuTiming`] values taken at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PpuStatus {
    pub lcd_enabled: bool,
    pub mode: u8,
    pub line_ticks: u16,
}

impl PpuStatus {
    pub fn of(ppu: &dyn PpuTiming) -> Self {
        Self {
            lcd_enabled: ppu.lcd_enabled(),
            mode: ppu.mode(),
            line_ticks: ppu.line_ticks(),
        }
    }
}

impl PpuTiming for PpuStatus {
    fn lcd_enabled(&self) -> bool {
        self.lcd_enabled
    }

    fn mode(&self) -> u8 {
        self.mode
    }

    fn line_ticks(&self) -> u16 {
        self.line_ticks
    }
}

/// What [`MemoryLr35902::oam_access`] hands the CPU.
pub struct OamAccess<'a> {
    pub status: PpuStatus,
    pub oam: &'a mut [u8; OAM_SIZE],
}

/// Flat 64 KiB memory, used by tests and benchmarks.
pub struct ArrayMemory(pub Box<[u8; 0x10000]>);

impl ArrayMemory {
    pub fn new() -> Self {
        Self(Box::new([0; 0x10000]))
    }

    /// Copy `bytes` into memory starting at `addr`.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.0[addr.wrapping_add(i as u16) as usize] = *b;
        }
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLr35902 for ArrayMemory {
    fn read(&self, addr: u16) -> u8 {
        self.0[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.0[addr as usize] = val;
    }
}
