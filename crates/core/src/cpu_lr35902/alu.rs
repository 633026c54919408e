//! Arithmetic and logic unit
//!
//! Every operation updates the flags in the supplied register file exactly as
//! the LR35902 does. 8-bit operations take their accumulator operand
//! explicitly and return the result; the caller decides where it goes.

use super::registers::Registers;

/// The eight accumulator operations of the `0x80-0xBF` block and their
/// immediate forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

impl AluOp {
    pub fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => AluOp::Add,
            1 => AluOp::Adc,
            2 => AluOp::Sub,
            3 => AluOp::Sbc,
            4 => AluOp::And,
            5 => AluOp::Xor,
            6 => AluOp::Or,
            _ => AluOp::Cp,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            AluOp::Add => "ADD A,",
            AluOp::Adc => "ADC A,",
            AluOp::Sub => "SUB ",
            AluOp::Sbc => "SBC A,",
            AluOp::And => "AND ",
            AluOp::Xor => "XOR ",
            AluOp::Or => "OR ",
            AluOp::Cp => "CP ",
        }
    }
}

/// Rotate/shift group of the CB table (`0x00-0x3F`), also used by the
/// accumulator rotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl ShiftOp {
    pub fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Swap,
            _ => ShiftOp::Srl,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            ShiftOp::Rlc => "RLC",
            ShiftOp::Rrc => "RRC",
            ShiftOp::Rl => "RL",
            ShiftOp::Rr => "RR",
            ShiftOp::Sla => "SLA",
            ShiftOp::Sra => "SRA",
            ShiftOp::Swap => "SWAP",
            ShiftOp::Srl => "SRL",
        }
    }
}

/// Apply an accumulator operation. Returns the new accumulator value
/// (for `Cp` this is the unchanged accumulator).
pub fn alu8(regs: &mut Registers, op: AluOp, a: u8, val: u8) -> u8 {
    let carry = regs.carry();
    match op {
        AluOp::Add => add(regs, a, val, false),
        AluOp::Adc => add(regs, a, val, carry),
        AluOp::Sub => sub(regs, a, val, false),
        AluOp::Sbc => sub(regs, a, val, carry),
        AluOp::And => {
            let result = a & val;
            regs.set_flags(result == 0, false, true, false);
            result
        }
        AluOp::Xor => {
            let result = a ^ val;
            regs.set_flags(result == 0, false, false, false);
            result
        }
        AluOp::Or => {
            let result = a | val;
            regs.set_flags(result == 0, false, false, false);
            result
        }
        AluOp::Cp => {
            sub(regs, a, val, false);
            a
        }
    }
}

fn add(regs: &mut Registers, a: u8, val: u8, carry: bool) -> u8 {
    let c = carry as u8;
    let result = a as u16 + val as u16 + c as u16;
    let half = (a & 0x0F) + (val & 0x0F) + c > 0x0F;
    regs.set_flags(result as u8 == 0, false, half, result > 0xFF);
    result as u8
}

fn sub(regs: &mut Registers, a: u8, val: u8, carry: bool) -> u8 {
    let c = carry as u8;
    let result = a as i16 - val as i16 - c as i16;
    let half = (a & 0x0F) < (val & 0x0F) + c;
    regs.set_flags(result as u8 == 0, true, half, result < 0);
    result as u8
}

/// `INC r`: carry is left untouched.
pub fn inc8(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_add(1);
    regs.set_zero(result == 0);
    regs.set_subtract(false);
    regs.set_half_carry((val & 0x0F) == 0x0F);
    result
}

/// `DEC r`: carry is left untouched.
pub fn dec8(regs: &mut Registers, val: u8) -> u8 {
    let result = val.wrapping_sub(1);
    regs.set_zero(result == 0);
    regs.set_subtract(true);
    regs.set_half_carry((val & 0x0F) == 0);
    result
}

/// `ADD HL,rr`: zero untouched, half-carry out of bit 11, carry out of bit 15.
pub fn add16(regs: &mut Registers, hl: u16, val: u16) -> u16 {
    let result = hl as u32 + val as u32;
    regs.set_subtract(false);
    regs.set_half_carry((hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF);
    regs.set_carry(result > 0xFFFF);
    result as u16
}

/// `ADD SP,e` and `LD HL,SP+e`. Flags come from the unsigned addition of the
/// low byte; zero and subtract are always cleared.
pub fn add_sp_offset(regs: &mut Registers, sp: u16, offset: u8) -> u16 {
    let half = (sp & 0x000F) + (offset as u16 & 0x000F) > 0x000F;
    let carry = (sp & 0x00FF) + offset as u16 > 0x00FF;
    regs.set_flags(false, false, half, carry);
    sp.wrapping_add(offset as i8 as i16 as u16)
}

/// CB-prefixed rotate/shift/swap. Zero reflects the result.
pub fn shift(regs: &mut Registers, op: ShiftOp, val: u8) -> u8 {
    let (result, carry) = match op {
        ShiftOp::Rlc => (val.rotate_left(1), val & 0x80 != 0),
        ShiftOp::Rrc => (val.rotate_right(1), val & 0x01 != 0),
        ShiftOp::Rl => ((val << 1) | regs.carry() as u8, val & 0x80 != 0),
        ShiftOp::Rr => ((val >> 1) | ((regs.carry() as u8) << 7), val & 0x01 != 0),
        ShiftOp::Sla => (val << 1, val & 0x80 != 0),
        ShiftOp::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        ShiftOp::Swap => (val.rotate_left(4), false),
        ShiftOp::Srl => (val >> 1, val & 0x01 != 0),
    };
    regs.set_flags(result == 0, false, false, carry);
    result
}

/// `RLCA`/`RRCA`/`RLA`/`RRA`: like the CB forms but zero is always cleared.
pub fn rotate_a(regs: &mut Registers, op: ShiftOp) {
    let a = regs.a;
    regs.a = shift(regs, op, a);
    regs.set_zero(false);
}

/// `BIT b,r`: carry untouched.
pub fn bit(regs: &mut Registers, bit: u8, val: u8) {
    regs.set_zero(val & (1 << bit) == 0);
    regs.set_subtract(false);
    regs.set_half_carry(true);
}

/// `DAA`: adjust A after a BCD addition or subtraction. Subtract is preserved,
/// half-carry cleared, carry only ever set (never cleared) by an addition.
pub fn daa(regs: &mut Registers) {
    let mut adjust = 0u8;
    let mut carry = regs.carry();

    if regs.subtract() {
        if regs.half_carry() {
            adjust |= 0x06;
        }
        if regs.carry() {
            adjust |= 0x60;
        }
        regs.a = regs.a.wrapping_sub(adjust);
    } else {
        if regs.half_carry() || (regs.a & 0x0F) > 0x09 {
            adjust |= 0x06;
        }
        if regs.carry() || regs.a > 0x99 {
            adjust |= 0x60;
            carry = true;
        }
        regs.a = regs.a.wrapping_add(adjust);
    }

    regs.set_zero(regs.a == 0);
    regs.set_half_carry(false);
    regs.set_carry(carry);
}

/// `CPL`: zero and carry untouched.
pub fn cpl(regs: &mut Registers) {
    regs.a = !regs.a;
    regs.set_subtract(true);
    regs.set_half_carry(true);
}

/// `SCF`: zero untouched.
pub fn scf(regs: &mut Registers) {
    regs.set_subtract(false);
    regs.set_half_carry(false);
    regs.set_carry(true);
}

/// `CCF`: zero untouched.
pub fn ccf(regs: &mut Registers) {
    let carry = regs.carry();
    regs.set_subtract(false);
    regs.set_half_carry(false);
    regs.set_carry(!carry);
}
