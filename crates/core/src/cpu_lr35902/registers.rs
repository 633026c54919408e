//! LR35902 register file
//!
//! Eight 8-bit registers that pair up into AF, BC, DE and HL, plus the
//! program counter and stack pointer. The pairs are computed from their
//! halves on every access, so writing through either view is always
//! consistent with the other.

use serde::{Deserialize, Serialize};

// Flag bit positions (in F register)
pub const FLAG_Z: u8 = 0b1000_0000; // Zero
pub const FLAG_N: u8 = 0b0100_0000; // Subtract (BCD)
pub const FLAG_H: u8 = 0b0010_0000; // Half Carry (BCD)
pub const FLAG_C: u8 = 0b0001_0000; // Carry

/// One of the eight 8-bit registers, in opcode encoding order where it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg8 {
    B,
    C,
    D,
    E,
    H,
    L,
    A,
    F,
}

impl Reg8 {
    /// Register selected by the 3-bit field used in `LD r,r'` and the ALU block.
    /// Index 6 is `(HL)` and has no register, so it returns `None`.
    pub fn from_index(index: u8) -> Option<Self> {
        match index & 0x07 {
            0 => Some(Reg8::B),
            1 => Some(Reg8::C),
            2 => Some(Reg8::D),
            3 => Some(Reg8::E),
            4 => Some(Reg8::H),
            5 => Some(Reg8::L),
            7 => Some(Reg8::A),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
            Reg8::A => "A",
            Reg8::F => "F",
        }
    }
}

/// 16-bit register views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl Reg16 {
    /// Pair selected by bits 4-5 of `LD rr,d16`, `INC rr`, `ADD HL,rr` (SP variant).
    pub fn from_sp_group(index: u8) -> Self {
        match index & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::SP,
        }
    }

    /// Pair selected by bits 4-5 of `PUSH`/`POP` (AF variant).
    pub fn from_af_group(index: u8) -> Self {
        match index & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::AF,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
        }
    }
}

/// Split a 16-bit value into its (high, low) bytes.
pub fn split_bytes(val: u16) -> (u8, u8) {
    ((val >> 8) as u8, val as u8)
}

/// Assemble a 16-bit value from its high and low bytes.
pub fn join_bytes(hi: u8, lo: u8) -> u16 {
    ((hi as u16) << 8) | lo as u16
}

/// CPU register file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    /// Stack pointer
    pub sp: u16,
    /// Program counter
    pub pc: u16,
}

impl Default for Registers {
    fn default() -> Self {
        Self::post_boot()
    }
}

impl Registers {
    /// All registers cleared, PC at 0.
    pub fn zeroed() -> Self {
        Self {
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
        }
    }

    /// DMG register state as left by the boot ROM when it hands over to the cartridge.
    pub fn post_boot() -> Self {
        Self {
            a: 0x01,
            f: 0xB0,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xD8,
            h: 0x01,
            l: 0x4D,
            sp: 0xFFFE,
            pc: 0x0100, // Game Boy starts at 0x100
        }
    }

    pub fn get(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.a,
            Reg8::F => self.f,
            Reg8::B => self.b,
            Reg8::C => self.c,
            Reg8::D => self.d,
            Reg8::E => self.e,
            Reg8::H => self.h,
            Reg8::L => self.l,
        }
    }

    pub fn set(&mut self, reg: Reg8, val: u8) {
        match reg {
            Reg8::A => self.a = val,
            Reg8::F => self.f = val & 0xF0, // Lower 4 bits always 0
            Reg8::B => self.b = val,
            Reg8::C => self.c = val,
            Reg8::D => self.d = val,
            Reg8::E => self.e = val,
            Reg8::H => self.h = val,
            Reg8::L => self.l = val,
        }
    }

    pub fn get16(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => self.af(),
            Reg16::BC => self.bc(),
            Reg16::DE => self.de(),
            Reg16::HL => self.hl(),
            Reg16::SP => self.sp,
        }
    }

    pub fn set16(&mut self, reg: Reg16, val: u16) {
        match reg {
            Reg16::AF => self.set_af(val),
            Reg16::BC => self.set_bc(val),
            Reg16::DE => self.set_de(val),
            Reg16::HL => self.set_hl(val),
            Reg16::SP => self.sp = val,
        }
    }

    // Register pair accessors
    pub fn af(&self) -> u16 {
        join_bytes(self.a, self.f)
    }

    pub fn set_af(&mut self, val: u16) {
        let (hi, lo) = split_bytes(val);
        self.a = hi;
        self.f = lo & 0xF0;
    }

    pub fn bc(&self) -> u16 {
        join_bytes(self.b, self.c)
    }

    pub fn set_bc(&mut self, val: u16) {
        (self.b, self.c) = split_bytes(val);
    }

    pub fn de(&self) -> u16 {
        join_bytes(self.d, self.e)
    }

    pub fn set_de(&mut self, val: u16) {
        (self.d, self.e) = split_bytes(val);
    }

    pub fn hl(&self) -> u16 {
        join_bytes(self.h, self.l)
    }

    pub fn set_hl(&mut self, val: u16) {
        (self.h, self.l) = split_bytes(val);
    }

    // Flag operations
    fn flag(&self, mask: u8) -> bool {
        (self.f & mask) != 0
    }

    fn set_flag(&mut self, mask: u8, val: bool) {
        if val {
            self.f |= mask;
        } else {
            self.f &= !mask;
        }
    }

    pub fn zero(&self) -> bool {
        self.flag(FLAG_Z)
    }

    pub fn set_zero(&mut self, val: bool) {
        self.set_flag(FLAG_Z, val);
    }

    pub fn subtract(&self) -> bool {
        self.flag(FLAG_N)
    }

    pub fn set_subtract(&mut self, val: bool) {
        self.set_flag(FLAG_N, val);
    }

    pub fn half_carry(&self) -> bool {
        self.flag(FLAG_H)
    }

    pub fn set_half_carry(&mut self, val: bool) {
        self.set_flag(FLAG_H, val);
    }

    pub fn carry(&self) -> bool {
        self.flag(FLAG_C)
    }

    pub fn set_carry(&mut self, val: bool) {
        self.set_flag(FLAG_C, val);
    }

    /// Set all four flags at once.
    pub fn set_flags(&mut self, z: bool, n: bool, h: bool, c: bool) {
        self.set_zero(z);
        self.set_subtract(n);
        self.set_half_carry(h);
        self.set_carry(c);
    }
}
