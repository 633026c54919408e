//! Interrupt controller
//!
//! Owns the IE ($FFFF) and IF ($FF0F) registers and the interrupt master
//! enable (IME). `EI` takes effect only after the instruction that follows
//! it has completed, which is modelled with a small countdown resolved in
//! [`InterruptController::on_instruction_finished`].

use serde::{Deserialize, Serialize};

/// Interrupt sources in priority order (VBlank highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interrupt {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::Stat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    pub fn index(self) -> u8 {
        match self {
            Interrupt::VBlank => 0,
            Interrupt::Stat => 1,
            Interrupt::Timer => 2,
            Interrupt::Serial => 3,
            Interrupt::Joypad => 4,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Bit in IE/IF
    pub fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Fixed handler address: $0040, $0048, $0050, $0058, $0060
    pub fn vector(self) -> u16 {
        0x0040 + 0x0008 * self.index() as u16
    }
}

/// Only the low five bits of IE/IF select interrupt sources.
pub const INTERRUPT_MASK: u8 = 0x1F;

/// Number of instruction completions an `EI` waits before IME is raised:
/// the `EI` itself, then the instruction after it.
const EI_DELAY: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptController {
    /// Interrupt enable register (IE)
    ie: u8,
    /// Interrupt request register (IF), low five bits only
    if_reg: u8,
    /// Interrupt master enable
    ime: bool,
    /// Completions left before a delayed `EI` sets IME, 0 when none is scheduled
    enable_delay: u8,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    pub fn new() -> Self {
        Self {
            ie: 0,
            if_reg: 0,
            ime: false,
            enable_delay: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Raise the request bit for `kind`
    pub fn request(&mut self, kind: Interrupt) {
        self.if_reg |= kind.bit();
    }

    /// Raise any request bits in `mask` (IF layout)
    pub fn request_mask(&mut self, mask: u8) {
        self.if_reg |= mask & INTERRUPT_MASK;
    }

    /// Drop the request bit for `kind`
    pub fn acknowledge(&mut self, kind: Interrupt) {
        self.if_reg &= !kind.bit();
    }

    pub fn ie(&self) -> u8 {
        self.ie
    }

    pub fn set_ie(&mut self, val: u8) {
        self.ie = val;
    }

    /// IF as seen by software: the three unused bits always read as 1
    pub fn if_reg(&self) -> u8 {
        self.if_reg | !INTERRUPT_MASK
    }

    pub fn set_if(&mut self, val: u8) {
        self.if_reg = val & INTERRUPT_MASK;
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    /// Whether a delayed `EI` is still waiting to take effect
    pub fn enable_pending(&self) -> bool {
        self.enable_delay != 0
    }

    /// Requested and enabled sources (IE & IF)
    pub fn pending(&self) -> u8 {
        self.ie & self.if_reg & INTERRUPT_MASK
    }

    pub fn has_pending(&self) -> bool {
        self.pending() != 0
    }

    /// The pending source with the highest priority (lowest bit)
    pub fn highest_priority(&self) -> Option<Interrupt> {
        let pending = self.pending();
        if pending == 0 {
            return None;
        }
        Interrupt::from_index(pending.trailing_zeros() as u8)
    }

    /// `EI` (delayed) or `RETI` (immediate)
    pub fn schedule_enable(&mut self, delayed: bool) {
        if delayed {
            if !self.ime {
                self.enable_delay = EI_DELAY;
            }
        } else {
            self.ime = true;
            self.enable_delay = 0;
        }
    }

    /// `DI`, and the start of interrupt dispatch. Cancels a pending `EI`.
    pub fn disable_immediately(&mut self) {
        self.ime = false;
        self.enable_delay = 0;
    }

    /// Resolve a delayed `EI`. Called by the engine after every completed instruction.
    pub fn on_instruction_finished(&mut self) {
        if self.enable_delay > 0 {
            self.enable_delay -= 1;
            if self.enable_delay == 0 {
                self.ime = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_and_bits() {
        let vectors: Vec<u16> = Interrupt::ALL.iter().map(|i| i.vector()).collect();
        assert_eq!(vectors, vec![0x40, 0x48, 0x50, 0x58, 0x60]);
        assert_eq!(Interrupt::Timer.bit(), 0x04);
        assert_eq!(Interrupt::from_index(5), None);
    }

    #[test]
    fn test_if_upper_bits_read_set() {
        let mut ic = InterruptController::new();
        assert_eq!(ic.if_reg(), 0xE0);
        ic.request(Interrupt::Serial);
        assert_eq!(ic.if_reg(), 0xE8);
        ic.set_if(0xFF);
        assert_eq!(ic.if_reg(), 0xFF);
        ic.set_if(0x00);
        assert_eq!(ic.if_reg(), 0xE0);
    }

    #[test]
    fn test_pending_requires_enable() {
        let mut ic = InterruptController::new();
        ic.request(Interrupt::Timer);
        assert!(!ic.has_pending());
        ic.set_ie(Interrupt::Timer.bit());
        assert_eq!(ic.highest_priority(), Some(Interrupt::Timer));
    }

    #[test]
    fn test_priority_is_lowest_bit() {
        let mut ic = InterruptController::new();
        ic.set_ie(0x1F);
        ic.request(Interrupt::Joypad);
        ic.request(Interrupt::Stat);
        assert_eq!(ic.highest_priority(), Some(Interrupt::Stat));
        ic.acknowledge(Interrupt::Stat);
        assert_eq!(ic.highest_priority(), Some(Interrupt::Joypad));
    }

    #[test]
    fn test_ei_waits_for_next_instruction() {
        let mut ic = InterruptController::new();
        ic.schedule_enable(true);
        ic.on_instruction_finished(); // EI itself
        assert!(!ic.ime());
        ic.on_instruction_finished(); // following instruction
        assert!(ic.ime());
    }

    #[test]
    fn test_di_cancels_scheduled_enable() {
        let mut ic = InterruptController::new();
        ic.schedule_enable(true);
        ic.on_instruction_finished();
        ic.disable_immediately();
        assert!(!ic.ime());
        ic.on_instruction_finished();
        ic.on_instruction_finished();
        assert!(!ic.ime());
    }

    #[test]
    fn test_immediate_enable() {
        let mut ic = InterruptController::new();
        ic.schedule_enable(false);
        assert!(ic.ime());
        assert!(!ic.enable_pending());
    }
}
