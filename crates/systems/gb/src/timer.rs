//! Game Boy Timer implementation
//!
//! # Timer Registers
//!
//! - `$FF04 (DIV)`: Upper byte of the 16-bit system counter, write resets the counter
//! - `$FF05 (TIMA)`: Timer counter - Increments at rate specified by TAC
//! - `$FF06 (TMA)`: Timer modulo - TIMA is loaded with this value on overflow
//! - `$FF07 (TAC)`: Timer control
//!   - Bit 2: Timer enable (0=stop, 1=run)
//!   - Bits 1-0: Clock select
//!     - 00: 4096 Hz (counter bit 9)
//!     - 01: 262144 Hz (counter bit 3)
//!     - 10: 65536 Hz (counter bit 5)
//!     - 11: 16384 Hz (counter bit 7)
//!
//! # Timing
//!
//! TIMA is clocked by the falling edge of `enable AND counter[bit]`. That is
//! why writing DIV or changing TAC can tick TIMA once on real hardware, and
//! this implementation reproduces it.
//!
//! On overflow TIMA reads 0 for one machine cycle, then is reloaded from TMA
//! and the timer interrupt is requested. Writing TIMA during that cycle
//! cancels the reload.

use lr35902_core::cpu_lr35902::Interrupt;
use serde::{Deserialize, Serialize};

/// Ticks between TIMA overflow and the TMA reload
const RELOAD_DELAY: u8 = 4;

/// Game Boy Timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    /// 16-bit system counter, incremented every clock tick
    counter: u16,
    tima: u8,
    tma: u8,
    /// Only the low three bits are stored
    tac: u8,
    /// Ticks left until a pending overflow reload, 0 when none
    reload_in: u8,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    pub fn new() -> Self {
        Self {
            counter: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            reload_in: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn div(&self) -> u8 {
        (self.counter >> 8) as u8
    }

    pub fn tima(&self) -> u8 {
        self.tima
    }

    fn selected_bit(&self) -> u16 {
        match self.tac & 0x03 {
            0 => 1 << 9,
            1 => 1 << 3,
            2 => 1 << 5,
            _ => 1 << 7,
        }
    }

    /// Level of the signal whose falling edge clocks TIMA
    fn input(&self) -> bool {
        self.tac & 0x04 != 0 && self.counter & self.selected_bit() != 0
    }

    fn increment_tima(&mut self) {
        let (next, overflow) = self.tima.overflowing_add(1);
        self.tima = next;
        if overflow {
            self.reload_in = RELOAD_DELAY;
        }
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div(),
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8, // Upper 5 bits always read as 1
            _ => 0xFF,
        }
    }

    pub fn write_register(&mut self, addr: u16, val: u8) {
        let before = self.input();
        match addr {
            0xFF04 => self.counter = 0,
            0xFF05 => {
                self.tima = val;
                self.reload_in = 0;
            }
            0xFF06 => self.tma = val,
            0xFF07 => self.tac = val & 0x07,
            _ => {}
        }
        if before && !self.input() {
            self.increment_tima();
        }
    }

    /// Advance one clock tick. Returns the interrupt requests raised (IF layout).
    pub fn tick(&mut self) -> u8 {
        let mut irq = 0;
        if self.reload_in > 0 {
            self.reload_in -= 1;
            if self.reload_in == 0 {
                self.tima = self.tma;
                irq |= Interrupt::Timer.bit();
            }
        }

        let before = self.input();
        self.counter = self.counter.wrapping_add(1);
        if before && !self.input() {
            self.increment_tima();
        }
        irq
    }
}
