//! Opcode tables
//!
//! Every base opcode and every `CB`-prefixed opcode maps to an [`Instruction`]
//! carrying its ordered list of [`MicroOp`]s, one per machine cycle after the
//! opcode fetch. Single-cycle instructions run their only step inside the
//! fetch cycle itself (and 2-cycle `CB` instructions inside the prefix fetch),
//! which is how the real chip overlaps fetch and execute.
//!
//! Cycle bookkeeping, in clock ticks:
//!
//! ```text
//! base, cycles == 4   ->  1 step, run during fetch
//! base, otherwise     ->  cycles == 4 + 4 * steps
//! CB,   cycles == 8   ->  1 step, run during prefix fetch
//! CB,   otherwise     ->  cycles == 8 + 4 * steps
//! ```
//!
//! Conditional control flow aborts the remaining steps when its condition
//! fails, which yields the architecture's shorter not-taken timing.

use std::sync::OnceLock;

use super::alu::{AluOp, ShiftOp};
use super::registers::{Reg16, Reg8};

/// Prefix selecting the extended table
pub const PREFIX_CB: u8 = 0xCB;

/// Branch condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
}

impl Condition {
    fn from_index(index: u8) -> Self {
        match index & 0x03 {
            0 => Condition::NZ,
            1 => Condition::Z,
            2 => Condition::NC,
            _ => Condition::C,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Condition::NZ => "NZ",
            Condition::Z => "Z",
            Condition::NC => "NC",
            Condition::C => "C",
        }
    }
}

/// Register-indirect addressing used by the 8-bit loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirect {
    BC,
    DE,
    HL,
    /// `(HL+)`: HL incremented after the access
    HLInc,
    /// `(HL-)`: HL decremented after the access
    HLDec,
}

impl Indirect {
    /// Whether the access also steps HL through the 16-bit inc/dec unit
    pub fn steps_hl(self) -> bool {
        matches!(self, Indirect::HLInc | Indirect::HLDec)
    }

    fn name(self) -> &'static str {
        match self {
            Indirect::BC => "(BC)",
            Indirect::DE => "(DE)",
            Indirect::HL => "(HL)",
            Indirect::HLInc => "(HL+)",
            Indirect::HLDec => "(HL-)",
        }
    }
}

/// Source of a 16-bit value pushed onto the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source16 {
    Reg(Reg16),
    Pc,
}

/// Where control goes after the last stack write of `CALL`/`RST`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// Address latched in WZ
    Wz,
    /// `RST` vector
    Fixed(u16),
}

/// Read-modify-write applied to `(HL)` in the write-back cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HlWrite {
    Inc,
    Dec,
    Shift(ShiftOp),
    Res(u8),
    Set(u8),
}

/// One machine cycle of work.
///
/// Z and W are the CPU's internal temporary byte latches (low and high half
/// of the WZ word).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    Nop,
    Halt,
    Stop,
    Di,
    Ei,
    /// Undefined opcode: the CPU locks up
    Illegal,
    Daa,
    Cpl,
    Scf,
    Ccf,
    /// `RLCA`/`RRCA`/`RLA`/`RRA`
    RotateA(ShiftOp),

    /// `LD r,r'`
    LdRR(Reg8, Reg8),
    /// `LD r,d8`: read operand into register
    LdRImm(Reg8),
    /// `LD r,(rr)`
    LdRInd(Reg8, Indirect),
    /// `LD (rr),r`
    LdIndR(Indirect, Reg8),
    /// Z <- (PC++)
    ReadImmZ,
    /// W <- (PC++)
    ReadImmW,
    /// Z <- (PC++), then abort unless the condition holds
    ReadImmZIf(Condition),
    /// W <- (PC++), then abort unless the condition holds
    ReadImmWIf(Condition),
    /// Internal cycle that only evaluates a condition
    CheckCond(Condition),
    /// First operand byte of `LD rr,d16`: Z <- (PC++)
    LdImm16Lo,
    /// Second operand byte: W <- (PC++), rr <- WZ
    LdImm16Hi(Reg16),
    /// Z <- (HL)
    ReadHlZ,
    /// (HL) <- Z
    WriteHlZ,
    /// (HL) <- f(Z)
    WriteHl(HlWrite),
    /// (WZ) <- A
    WriteWzA,
    /// A <- (WZ)
    ReadWzA,
    /// (WZ) <- SP low, WZ++
    WriteWzSpLo,
    /// (WZ) <- SP high
    WriteWzSpHi,
    /// ($FF00 + Z) <- A
    WriteHighZ,
    /// A <- ($FF00 + Z)
    ReadHighZ,
    /// ($FF00 + C) <- A
    WriteHighC,
    /// A <- ($FF00 + C)
    ReadHighC,

    /// `op A,r`
    AluR(AluOp, Reg8),
    /// `op A,(HL)`
    AluHl(AluOp),
    /// `op A,d8`
    AluImm(AluOp),
    IncR(Reg8),
    DecR(Reg8),
    Inc16(Reg16),
    Dec16(Reg16),
    AddHl(Reg16),
    /// `ADD SP,e` first internal cycle: WZ <- SP + e, flags updated
    AddSpZ,
    /// SP <- WZ
    LdSpWz,
    /// `LD HL,SP+e` internal cycle
    LdHlSpZ,
    /// `LD SP,HL`
    LdSpHl,

    /// PC <- PC + (Z as i8)
    JumpRelative,
    /// PC <- WZ
    JumpWz,
    /// PC <- WZ, IME set immediately (`RETI`)
    JumpWzEnableIme,
    /// PC <- HL
    JumpHl,
    /// Internal SP decrement before a push
    DecSp,
    /// (SP) <- high byte, SP--
    PushHi(Source16),
    /// (SP) <- low byte
    PushLo(Source16),
    /// (SP) <- PC low byte, then jump
    PushPcLoJump(JumpTarget),
    /// Z <- (SP++)
    PopZ,
    /// W <- (SP++)
    PopW,
    /// W <- (SP++), rr <- WZ
    PopInto(Reg16),

    /// CB rotate/shift on a register
    ShiftR(ShiftOp, Reg8),
    /// `BIT b,r`
    BitR(u8, Reg8),
    /// `BIT b,(HL)`
    BitHl(u8),
    ResR(u8, Reg8),
    SetR(u8, Reg8),
}

/// Immutable opcode descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    /// Lives in the `CB` table
    pub prefixed: bool,
    pub mnemonic: String,
    /// Bytes including opcode (and prefix)
    pub length: u8,
    /// Clock ticks, taken path for conditional branches
    pub cycles: u8,
    /// Clock ticks when a conditional branch is not taken
    pub cycles_not_taken: Option<u8>,
    pub steps: Vec<MicroOp>,
}

impl Instruction {
    fn new(opcode: u8, mnemonic: impl Into<String>, length: u8, cycles: u8, steps: Vec<MicroOp>) -> Self {
        Self {
            opcode,
            prefixed: false,
            mnemonic: mnemonic.into(),
            length,
            cycles,
            cycles_not_taken: None,
            steps,
        }
    }

    fn branch(
        opcode: u8,
        mnemonic: impl Into<String>,
        length: u8,
        taken: u8,
        not_taken: u8,
        steps: Vec<MicroOp>,
    ) -> Self {
        Self {
            cycles_not_taken: Some(not_taken),
            ..Self::new(opcode, mnemonic, length, taken, steps)
        }
    }

    fn prefixed(mut self) -> Self {
        self.prefixed = true;
        self
    }

    /// Fetch cycles spent before the first step that cannot overlap with it
    pub fn fetch_cycles(&self) -> u8 {
        if self.prefixed {
            8
        } else {
            4
        }
    }

    /// Whether the only step executes inside the (prefix) fetch cycle
    pub fn overlaps_fetch(&self) -> bool {
        self.cycles == self.fetch_cycles() && self.steps.len() == 1
    }

    pub fn is_conditional(&self) -> bool {
        self.cycles_not_taken.is_some()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no descriptor for opcode {opcode:#04X} (prefixed: {prefixed})")]
    MissingOpcode { opcode: u8, prefixed: bool },
    #[error("opcode {opcode:#04X} stepped past its {len}-step list")]
    StepOutOfRange { opcode: u8, len: usize },
}

/// Both opcode tables
#[derive(Debug)]
pub struct InstructionTable {
    base: Vec<Instruction>,
    extended: Vec<Instruction>,
}

impl InstructionTable {
    fn build() -> Self {
        Self {
            base: (0..=255u8).map(base_instruction).collect(),
            extended: (0..=255u8).map(cb_instruction).collect(),
        }
    }

    pub fn base(&self, opcode: u8) -> Result<&Instruction, DecodeError> {
        self.base.get(opcode as usize).ok_or(DecodeError::MissingOpcode {
            opcode,
            prefixed: false,
        })
    }

    pub fn extended(&self, opcode: u8) -> Result<&Instruction, DecodeError> {
        self.extended.get(opcode as usize).ok_or(DecodeError::MissingOpcode {
            opcode,
            prefixed: true,
        })
    }

    pub fn base_iter(&self) -> impl Iterator<Item = &Instruction> {
        self.base.iter()
    }

    pub fn extended_iter(&self) -> impl Iterator<Item = &Instruction> {
        self.extended.iter()
    }
}

/// Process-wide tables, built on first use
pub fn tables() -> &'static InstructionTable {
    static TABLES: OnceLock<InstructionTable> = OnceLock::new();
    TABLES.get_or_init(InstructionTable::build)
}

fn reg_or_hl(index: u8) -> &'static str {
    Reg8::from_index(index).map_or("(HL)", Reg8::name)
}

fn base_instruction(op: u8) -> Instruction {
    use MicroOp::*;

    let y = (op >> 3) & 0x07;
    let z = op & 0x07;
    let p = (op >> 4) & 0x03;

    match op {
        0x00 => Instruction::new(op, "NOP", 1, 4, vec![Nop]),
        0x10 => Instruction::new(op, "STOP", 2, 4, vec![Stop]),
        0x76 => Instruction::new(op, "HALT", 1, 4, vec![Halt]),
        0xF3 => Instruction::new(op, "DI", 1, 4, vec![Di]),
        0xFB => Instruction::new(op, "EI", 1, 4, vec![Ei]),
        0x27 => Instruction::new(op, "DAA", 1, 4, vec![Daa]),
        0x2F => Instruction::new(op, "CPL", 1, 4, vec![Cpl]),
        0x37 => Instruction::new(op, "SCF", 1, 4, vec![Scf]),
        0x3F => Instruction::new(op, "CCF", 1, 4, vec![Ccf]),
        0x07 => Instruction::new(op, "RLCA", 1, 4, vec![RotateA(ShiftOp::Rlc)]),
        0x0F => Instruction::new(op, "RRCA", 1, 4, vec![RotateA(ShiftOp::Rrc)]),
        0x17 => Instruction::new(op, "RLA", 1, 4, vec![RotateA(ShiftOp::Rl)]),
        0x1F => Instruction::new(op, "RRA", 1, 4, vec![RotateA(ShiftOp::Rr)]),

        // LD rr,d16
        0x01 | 0x11 | 0x21 | 0x31 => {
            let rr = Reg16::from_sp_group(p);
            Instruction::new(op, format!("LD {},d16", rr.name()), 3, 12, vec![LdImm16Lo, LdImm16Hi(rr)])
        }

        // LD (rr),A / LD A,(rr)
        0x02 | 0x12 | 0x22 | 0x32 | 0x0A | 0x1A | 0x2A | 0x3A => {
            let ind = match p {
                0 => Indirect::BC,
                1 => Indirect::DE,
                2 => Indirect::HLInc,
                _ => Indirect::HLDec,
            };
            if op & 0x08 == 0 {
                Instruction::new(op, format!("LD {},A", ind.name()), 1, 8, vec![LdIndR(ind, Reg8::A)])
            } else {
                Instruction::new(op, format!("LD A,{}", ind.name()), 1, 8, vec![LdRInd(Reg8::A, ind)])
            }
        }

        // INC rr / DEC rr / ADD HL,rr
        0x03 | 0x13 | 0x23 | 0x33 => {
            let rr = Reg16::from_sp_group(p);
            Instruction::new(op, format!("INC {}", rr.name()), 1, 8, vec![Inc16(rr)])
        }
        0x0B | 0x1B | 0x2B | 0x3B => {
            let rr = Reg16::from_sp_group(p);
            Instruction::new(op, format!("DEC {}", rr.name()), 1, 8, vec![Dec16(rr)])
        }
        0x09 | 0x19 | 0x29 | 0x39 => {
            let rr = Reg16::from_sp_group(p);
            Instruction::new(op, format!("ADD HL,{}", rr.name()), 1, 8, vec![AddHl(rr)])
        }

        // INC (HL) / DEC (HL) / LD (HL),d8
        0x34 => Instruction::new(op, "INC (HL)", 1, 12, vec![ReadHlZ, WriteHl(HlWrite::Inc)]),
        0x35 => Instruction::new(op, "DEC (HL)", 1, 12, vec![ReadHlZ, WriteHl(HlWrite::Dec)]),
        0x36 => Instruction::new(op, "LD (HL),d8", 2, 12, vec![ReadImmZ, WriteHlZ]),

        // INC r / DEC r / LD r,d8
        _ if op < 0x40 && z == 4 => {
            let r = reg8(y);
            Instruction::new(op, format!("INC {}", r.name()), 1, 4, vec![IncR(r)])
        }
        _ if op < 0x40 && z == 5 => {
            let r = reg8(y);
            Instruction::new(op, format!("DEC {}", r.name()), 1, 4, vec![DecR(r)])
        }
        _ if op < 0x40 && z == 6 => {
            let r = reg8(y);
            Instruction::new(op, format!("LD {},d8", r.name()), 2, 8, vec![LdRImm(r)])
        }

        // LD (a16),SP
        0x08 => Instruction::new(
            op,
            "LD (a16),SP",
            3,
            20,
            vec![ReadImmZ, ReadImmW, WriteWzSpLo, WriteWzSpHi],
        ),

        // JR r8 / JR cc,r8
        0x18 => Instruction::new(op, "JR r8", 2, 12, vec![ReadImmZ, JumpRelative]),
        0x20 | 0x28 | 0x30 | 0x38 => {
            let cc = Condition::from_index(y - 4);
            Instruction::branch(
                op,
                format!("JR {},r8", cc.name()),
                2,
                12,
                8,
                vec![ReadImmZIf(cc), JumpRelative],
            )
        }

        // LD r,r' / LD r,(HL) / LD (HL),r
        0x40..=0x7F => match (Reg8::from_index(y), Reg8::from_index(z)) {
            (Some(dst), Some(src)) => {
                Instruction::new(op, format!("LD {},{}", dst.name(), src.name()), 1, 4, vec![LdRR(dst, src)])
            }
            (Some(dst), None) => {
                Instruction::new(op, format!("LD {},(HL)", dst.name()), 1, 8, vec![LdRInd(dst, Indirect::HL)])
            }
            (None, Some(src)) => {
                Instruction::new(op, format!("LD (HL),{}", src.name()), 1, 8, vec![LdIndR(Indirect::HL, src)])
            }
            // 0x76 is matched above
            (None, None) => Instruction::new(op, "HALT", 1, 4, vec![Halt]),
        },

        // ALU A,r / ALU A,(HL)
        0x80..=0xBF => {
            let alu = AluOp::from_index(y);
            match Reg8::from_index(z) {
                Some(r) => Instruction::new(op, format!("{}{}", alu.mnemonic(), r.name()), 1, 4, vec![AluR(alu, r)]),
                None => Instruction::new(op, format!("{}(HL)", alu.mnemonic()), 1, 8, vec![AluHl(alu)]),
            }
        }

        // ALU A,d8
        0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
            let alu = AluOp::from_index(y);
            Instruction::new(op, format!("{}d8", alu.mnemonic()), 2, 8, vec![AluImm(alu)])
        }

        // RET cc / RET / RETI
        0xC0 | 0xC8 | 0xD0 | 0xD8 => {
            let cc = Condition::from_index(y);
            Instruction::branch(
                op,
                format!("RET {}", cc.name()),
                1,
                20,
                8,
                vec![CheckCond(cc), PopZ, PopW, JumpWz],
            )
        }
        0xC9 => Instruction::new(op, "RET", 1, 16, vec![PopZ, PopW, JumpWz]),
        0xD9 => Instruction::new(op, "RETI", 1, 16, vec![PopZ, PopW, JumpWzEnableIme]),

        // POP rr / PUSH rr
        0xC1 | 0xD1 | 0xE1 | 0xF1 => {
            let rr = Reg16::from_af_group(p);
            Instruction::new(op, format!("POP {}", rr.name()), 1, 12, vec![PopZ, PopInto(rr)])
        }
        0xC5 | 0xD5 | 0xE5 | 0xF5 => {
            let rr = Reg16::from_af_group(p);
            Instruction::new(
                op,
                format!("PUSH {}", rr.name()),
                1,
                16,
                vec![DecSp, PushHi(Source16::Reg(rr)), PushLo(Source16::Reg(rr))],
            )
        }

        // JP a16 / JP cc,a16 / JP (HL)
        0xC3 => Instruction::new(op, "JP a16", 3, 16, vec![ReadImmZ, ReadImmW, JumpWz]),
        0xC2 | 0xCA | 0xD2 | 0xDA => {
            let cc = Condition::from_index(y);
            Instruction::branch(
                op,
                format!("JP {},a16", cc.name()),
                3,
                16,
                12,
                vec![ReadImmZ, ReadImmWIf(cc), JumpWz],
            )
        }
        0xE9 => Instruction::new(op, "JP (HL)", 1, 4, vec![JumpHl]),

        // CALL a16 / CALL cc,a16
        0xCD => Instruction::new(
            op,
            "CALL a16",
            3,
            24,
            vec![ReadImmZ, ReadImmW, DecSp, PushHi(Source16::Pc), PushPcLoJump(JumpTarget::Wz)],
        ),
        0xC4 | 0xCC | 0xD4 | 0xDC => {
            let cc = Condition::from_index(y);
            Instruction::branch(
                op,
                format!("CALL {},a16", cc.name()),
                3,
                24,
                12,
                vec![
                    ReadImmZ,
                    ReadImmWIf(cc),
                    DecSp,
                    PushHi(Source16::Pc),
                    PushPcLoJump(JumpTarget::Wz),
                ],
            )
        }

        // RST n
        0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
            let vector = (op & 0x38) as u16;
            Instruction::new(
                op,
                format!("RST {:02X}H", vector),
                1,
                16,
                vec![DecSp, PushHi(Source16::Pc), PushPcLoJump(JumpTarget::Fixed(vector))],
            )
        }

        // CB prefix: the table entry only accounts for the prefix fetch
        PREFIX_CB => Instruction::new(op, "PREFIX CB", 1, 4, Vec::new()),

        // LDH (a8),A / LDH A,(a8) / LD (C),A / LD A,(C)
        0xE0 => Instruction::new(op, "LDH (a8),A", 2, 12, vec![ReadImmZ, WriteHighZ]),
        0xF0 => Instruction::new(op, "LDH A,(a8)", 2, 12, vec![ReadImmZ, ReadHighZ]),
        0xE2 => Instruction::new(op, "LD (C),A", 1, 8, vec![WriteHighC]),
        0xF2 => Instruction::new(op, "LD A,(C)", 1, 8, vec![ReadHighC]),

        // LD (a16),A / LD A,(a16)
        0xEA => Instruction::new(op, "LD (a16),A", 3, 16, vec![ReadImmZ, ReadImmW, WriteWzA]),
        0xFA => Instruction::new(op, "LD A,(a16)", 3, 16, vec![ReadImmZ, ReadImmW, ReadWzA]),

        // ADD SP,r8 / LD HL,SP+r8 / LD SP,HL
        0xE8 => Instruction::new(op, "ADD SP,r8", 2, 16, vec![ReadImmZ, AddSpZ, LdSpWz]),
        0xF8 => Instruction::new(op, "LD HL,SP+r8", 2, 12, vec![ReadImmZ, LdHlSpZ]),
        0xF9 => Instruction::new(op, "LD SP,HL", 1, 8, vec![LdSpHl]),

        // D3 DB DD E3 E4 EB EC ED F4 FC FD
        _ => Instruction::new(op, "ILLEGAL", 1, 4, vec![Illegal]),
    }
}

/// Register for an index known not to be 6 in the `INC r`/`DEC r`/`LD r,d8`
/// columns (index 6 is routed to the `(HL)` arms first).
fn reg8(index: u8) -> Reg8 {
    Reg8::from_index(index).unwrap_or(Reg8::A)
}

fn cb_instruction(op: u8) -> Instruction {
    use MicroOp::*;

    let y = (op >> 3) & 0x07;
    let target = Reg8::from_index(op);
    let operand = reg_or_hl(op & 0x07);

    let ins = match (op >> 6, target) {
        (0, Some(r)) => {
            let shift = ShiftOp::from_index(y);
            Instruction::new(op, format!("{} {}", shift.mnemonic(), operand), 2, 8, vec![ShiftR(shift, r)])
        }
        (0, None) => {
            let shift = ShiftOp::from_index(y);
            Instruction::new(
                op,
                format!("{} {}", shift.mnemonic(), operand),
                2,
                16,
                vec![ReadHlZ, WriteHl(HlWrite::Shift(shift))],
            )
        }
        (1, Some(r)) => Instruction::new(op, format!("BIT {},{}", y, operand), 2, 8, vec![BitR(y, r)]),
        (1, None) => Instruction::new(op, format!("BIT {},{}", y, operand), 2, 12, vec![BitHl(y)]),
        (2, Some(r)) => Instruction::new(op, format!("RES {},{}", y, operand), 2, 8, vec![ResR(y, r)]),
        (2, None) => Instruction::new(
            op,
            format!("RES {},{}", y, operand),
            2,
            16,
            vec![ReadHlZ, WriteHl(HlWrite::Res(y))],
        ),
        (_, Some(r)) => Instruction::new(op, format!("SET {},{}", y, operand), 2, 8, vec![SetR(y, r)]),
        (_, None) => Instruction::new(
            op,
            format!("SET {},{}", y, operand),
            2,
            16,
            vec![ReadHlZ, WriteHl(HlWrite::Set(y))],
        ),
    };
    ins.prefixed()
}
