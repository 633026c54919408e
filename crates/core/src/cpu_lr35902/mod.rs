//! Sharp LR35902 CPU core (Game Boy CPU)
//!
//! Z80-like CPU with some instructions removed and others added. This core is
//! stepped one clock tick at a time through [`CpuLr35902::advance`]; all
//! observable work happens on the first tick of each 4-tick machine cycle, so
//! the rest of the machine (PPU, timer, DMA) can be advanced in lockstep and
//! see every bus access in the machine cycle it really happens in.
//!
//! Instructions are decoded through the tables in [`instructions`], each of
//! which is an ordered list of one-machine-cycle [`MicroOp`]s.

pub mod alu;
pub mod instructions;
pub mod interrupts;
pub mod memory;
pub mod oam_bug;
pub mod registers;
pub mod trace;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::logging::{log, LogCategory, LogLevel};

pub use instructions::{tables, DecodeError, Instruction, MicroOp, PREFIX_CB};
pub use interrupts::{Interrupt, InterruptController};
pub use memory::{ArrayMemory, MemoryLr35902, OamAccess, PpuStatus, PpuTiming, OAM_SIZE};
pub use oam_bug::OamCorruption;
pub use registers::{Reg16, Reg8, Registers};
pub use trace::{TraceEntry, TraceFormat};

use instructions::{Condition, HlWrite, Indirect, JumpTarget, Source16};
use registers::{join_bytes, split_bytes};

/// Interrupt request register, owned by the interrupt controller
pub const IF_ADDR: u16 = 0xFF0F;
/// Interrupt enable register, owned by the interrupt controller
pub const IE_ADDR: u16 = 0xFFFF;

/// Clock ticks per machine cycle
pub const TICKS_PER_MCYCLE: u8 = 4;

/// Sub-phase of the 5-machine-cycle interrupt dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchPhase {
    If,
    Ie,
    Push1,
    Push2,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    Fetch,
    FetchExtendedPrefix,
    WorkPending,
    InterruptDispatch(DispatchPhase),
    Halted,
    Stopped,
}

/// Runtime options of the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    /// Emulate DMG OAM corruption
    pub oam_bug: bool,
    /// Build a [`TraceEntry`] after every instruction and log it
    pub trace: bool,
    pub trace_format: TraceFormat,
    /// Start from the register values the DMG boot ROM leaves behind
    pub post_boot: bool,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            oam_bug: true,
            trace: false,
            trace_format: TraceFormat::Doctor,
            post_boot: true,
        }
    }
}

/// Complete engine state, excluding the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub registers: Registers,
    pub interrupts: InterruptController,
    pub state: ExecutionState,
    pub halt_bug: bool,
    pub locked: bool,
    pub cycles: u64,
    pub tick: u8,
    pub opcode: u8,
    pub prefixed: bool,
    pub step_index: usize,
    pub z: u8,
    pub w: u8,
}

/// Result of one micro-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Condition failed, skip the remaining steps
    Abort,
}

/// Sharp LR35902 CPU state
#[derive(Debug)]
pub struct CpuLr35902<M: MemoryLr35902> {
    pub regs: Registers,
    pub interrupts: InterruptController,
    pub state: ExecutionState,
    pub config: CpuConfig,
    /// Total clock ticks executed
    pub cycles: u64,
    /// Memory interface
    pub memory: M,
    /// Next fetch does not advance PC
    halt_bug: bool,
    /// Hung by an undefined opcode; only `reset` recovers
    locked: bool,
    /// Position inside the current machine cycle (0 = work tick)
    tick: u8,
    opcode: u8,
    prefixed: bool,
    step_index: usize,
    /// Temporary latches (WZ)
    z: u8,
    w: u8,
    /// An instruction or dispatch finished during the last machine cycle
    boundary: bool,
    last_trace: Option<TraceEntry>,
}

impl<M: MemoryLr35902> CpuLr35902<M> {
    /// Create a new LR35902 CPU with the default configuration
    pub fn new(memory: M) -> Self {
        Self::with_config(memory, CpuConfig::default())
    }

    pub fn with_config(memory: M, config: CpuConfig) -> Self {
        let mut cpu = Self {
            regs: Registers::zeroed(),
            interrupts: InterruptController::new(),
            state: ExecutionState::Fetch,
            config,
            cycles: 0,
            memory,
            halt_bug: false,
            locked: false,
            tick: 0,
            opcode: 0,
            prefixed: false,
            step_index: 0,
            z: 0,
            w: 0,
            boundary: false,
            last_trace: None,
        };
        cpu.reset();
        cpu
    }

    /// Reset the CPU
    pub fn reset(&mut self) {
        self.regs = if self.config.post_boot {
            Registers::post_boot()
        } else {
            Registers::zeroed()
        };
        self.interrupts.reset();
        self.state = ExecutionState::Fetch;
        self.cycles = 0;
        self.halt_bug = false;
        self.locked = false;
        self.tick = 0;
        self.opcode = 0;
        self.prefixed = false;
        self.step_index = 0;
        self.z = 0;
        self.w = 0;
        self.boundary = false;
        self.last_trace = None;
    }

    pub fn halt_bug_pending(&self) -> bool {
        self.halt_bug
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Most recent trace entry, when tracing is enabled
    pub fn last_trace(&self) -> Option<&TraceEntry> {
        self.last_trace.as_ref()
    }

    /// Whether the last machine cycle completed an instruction or an interrupt dispatch
    pub fn instruction_completed(&self) -> bool {
        self.boundary
    }

    /// Whether the tick that [`advance`](Self::advance) will run next starts a machine cycle
    pub fn at_mcycle_boundary(&self) -> bool {
        self.tick == 0
    }

    /// Advance by one clock tick.
    pub fn advance(&mut self) {
        let work = self.tick == 0;
        self.tick = (self.tick + 1) % TICKS_PER_MCYCLE;
        self.cycles += 1;
        if work {
            self.machine_cycle();
        }
    }

    /// Run until the next instruction or interrupt dispatch completes, or one
    /// idle machine cycle while halted/stopped. Returns clock ticks consumed.
    pub fn step(&mut self) -> u32 {
        let start = self.cycles;
        self.boundary = false;
        loop {
            self.advance();
            while self.tick != 0 {
                self.advance();
            }
            if self.boundary || matches!(self.state, ExecutionState::Halted | ExecutionState::Stopped) {
                break;
            }
        }
        (self.cycles - start) as u32
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            registers: self.regs,
            interrupts: self.interrupts.clone(),
            state: self.state,
            halt_bug: self.halt_bug,
            locked: self.locked,
            cycles: self.cycles,
            tick: self.tick,
            opcode: self.opcode,
            prefixed: self.prefixed,
            step_index: self.step_index,
            z: self.z,
            w: self.w,
        }
    }

    pub fn restore(&mut self, snap: &CpuSnapshot) {
        self.regs = snap.registers;
        self.interrupts = snap.interrupts.clone();
        self.state = snap.state;
        self.halt_bug = snap.halt_bug;
        self.locked = snap.locked;
        self.cycles = snap.cycles;
        self.tick = snap.tick % TICKS_PER_MCYCLE;
        self.opcode = snap.opcode;
        self.prefixed = snap.prefixed;
        self.step_index = snap.step_index;
        self.z = snap.z;
        self.w = snap.w;
        self.boundary = false;
        self.last_trace = None;
    }

    fn machine_cycle(&mut self) {
        self.boundary = false;
        let idle = matches!(
            self.state,
            ExecutionState::Fetch | ExecutionState::Halted | ExecutionState::Stopped
        );
        if idle && !self.locked && self.interrupts.ime() && self.interrupts.has_pending() {
            self.state = ExecutionState::InterruptDispatch(DispatchPhase::If);
        }

        match self.state {
            ExecutionState::Fetch => self.fetch(),
            ExecutionState::FetchExtendedPrefix => self.fetch_extended(),
            ExecutionState::WorkPending => self.work(),
            ExecutionState::InterruptDispatch(phase) => self.dispatch(phase),
            ExecutionState::Halted => {
                if self.interrupts.has_pending() {
                    log(LogCategory::Cpu, LogLevel::Debug, || {
                        format!("CPU: wake from HALT at PC={:04X}", self.regs.pc)
                    });
                    self.state = ExecutionState::Fetch;
                }
            }
            ExecutionState::Stopped => {
                let joypad = self.interrupts.if_reg() & Interrupt::Joypad.bit() != 0;
                if !self.locked && joypad {
                    log(LogCategory::Cpu, LogLevel::Debug, || {
                        format!("CPU: joypad wake from STOP at PC={:04X}", self.regs.pc)
                    });
                    self.state = ExecutionState::Fetch;
                }
            }
        }
    }

    fn decode(prefixed: bool, opcode: u8) -> &'static Instruction {
        let table = tables();
        let found = if prefixed {
            table.extended(opcode)
        } else {
            table.base(opcode)
        };
        match found {
            Ok(ins) => ins,
            Err(e) => panic!("LR35902 decode failure: {}", e),
        }
    }

    fn current(&self) -> &'static Instruction {
        Self::decode(self.prefixed, self.opcode)
    }

    fn fetch(&mut self) {
        let pc = self.regs.pc;
        let opcode = self.bus_read(pc);
        if self.halt_bug {
            self.halt_bug = false;
        } else {
            self.regs.pc = pc.wrapping_add(1);
        }

        self.opcode = opcode;
        self.prefixed = false;
        self.step_index = 0;

        if opcode == PREFIX_CB {
            self.state = ExecutionState::FetchExtendedPrefix;
            return;
        }
        self.begin(Self::decode(false, opcode));
    }

    fn fetch_extended(&mut self) {
        let opcode = self.read_pc();
        self.opcode = opcode;
        self.prefixed = true;
        self.step_index = 0;
        self.state = ExecutionState::Fetch;
        self.begin(Self::decode(true, opcode));
    }

    /// Either run the only step inside the fetch cycle or queue the steps.
    fn begin(&mut self, ins: &'static Instruction) {
        if ins.overlaps_fetch() {
            self.state = ExecutionState::Fetch;
            self.step_index = 1;
            self.execute(ins.steps[0]);
            self.finish_instruction(ins);
        } else {
            self.state = ExecutionState::WorkPending;
        }
    }

    fn work(&mut self) {
        let ins = self.current();
        let Some(&op) = ins.steps.get(self.step_index) else {
            panic!(
                "LR35902 decode failure: {}",
                DecodeError::StepOutOfRange {
                    opcode: ins.opcode,
                    len: ins.steps.len(),
                }
            );
        };
        self.step_index += 1;

        let flow = self.execute(op);
        if flow == Flow::Abort || self.step_index >= ins.steps.len() {
            if self.state == ExecutionState::WorkPending {
                self.state = ExecutionState::Fetch;
            }
            self.finish_instruction(ins);
        }
    }

    fn finish_instruction(&mut self, ins: &'static Instruction) {
        self.interrupts.on_instruction_finished();
        self.boundary = true;

        if self.config.trace {
            let pc = self.regs.pc;
            let entry = TraceEntry {
                registers: self.regs,
                // End of the current machine cycle
                cycles: self.cycles + (TICKS_PER_MCYCLE - 1) as u64,
                opcode: ins.opcode,
                prefixed: ins.prefixed,
                mnemonic: ins.mnemonic.as_str(),
                pcmem: [
                    self.bus_read(pc),
                    self.bus_read(pc.wrapping_add(1)),
                    self.bus_read(pc.wrapping_add(2)),
                    self.bus_read(pc.wrapping_add(3)),
                ],
            };
            let format = self.config.trace_format;
            log(LogCategory::Trace, LogLevel::Trace, || entry.render(format));
            self.last_trace = Some(entry);
        }
    }

    fn dispatch(&mut self, phase: DispatchPhase) {
        use DispatchPhase::*;

        match phase {
            If => {
                self.state = ExecutionState::InterruptDispatch(Ie);
            }
            Ie => match self.interrupts.highest_priority() {
                Some(kind) => {
                    self.interrupts.acknowledge(kind);
                    self.interrupts.disable_immediately();
                    // EI; HALT with a request already pending: the dispatch
                    // takes the repeated fetch and returns to the HALT itself
                    if self.halt_bug {
                        self.halt_bug = false;
                        self.regs.pc = self.regs.pc.wrapping_sub(1);
                    }
                    // Vector is recomputed from the latch at the jump
                    self.z = kind.index();
                    self.state = ExecutionState::InterruptDispatch(Push1);
                }
                None => {
                    log(LogCategory::Interrupts, LogLevel::Debug, || {
                        "INT: request withdrawn during dispatch".to_string()
                    });
                    self.state = ExecutionState::Fetch;
                    self.boundary = true;
                }
            },
            Push1 => {
                let (hi, _) = split_bytes(self.regs.pc);
                self.regs.sp = self.regs.sp.wrapping_sub(1);
                self.bus_write(self.regs.sp, hi);
                self.state = ExecutionState::InterruptDispatch(Push2);
            }
            Push2 => {
                let (_, lo) = split_bytes(self.regs.pc);
                self.regs.sp = self.regs.sp.wrapping_sub(1);
                self.bus_write(self.regs.sp, lo);
                self.state = ExecutionState::InterruptDispatch(Jump);
            }
            Jump => {
                let kind = Interrupt::from_index(self.z).unwrap_or(Interrupt::VBlank);
                let from = self.regs.pc;
                self.regs.pc = kind.vector();
                self.state = ExecutionState::Fetch;
                self.boundary = true;
                log(LogCategory::Interrupts, LogLevel::Debug, || {
                    format!("INT: {:?} dispatched, PC {:04X} -> {:04X}", kind, from, kind.vector())
                });
            }
        }
    }

    fn bus_read(&self, addr: u16) -> u8 {
        match addr {
            IF_ADDR => self.interrupts.if_reg(),
            IE_ADDR => self.interrupts.ie(),
            _ => self.memory.read(addr),
        }
    }

    fn bus_write(&mut self, addr: u16, val: u8) {
        match addr {
            IF_ADDR => self.interrupts.set_if(val),
            IE_ADDR => self.interrupts.set_ie(val),
            _ => self.memory.write(addr, val),
        }
    }

    fn read_pc(&mut self) -> u8 {
        let val = self.bus_read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        val
    }

    fn wz(&self) -> u16 {
        join_bytes(self.w, self.z)
    }

    fn set_wz(&mut self, val: u16) {
        let (w, z) = split_bytes(val);
        self.w = w;
        self.z = z;
    }

    fn indirect(&mut self, ind: Indirect) -> u16 {
        match ind {
            Indirect::BC => self.regs.bc(),
            Indirect::DE => self.regs.de(),
            Indirect::HL => self.regs.hl(),
            Indirect::HLInc => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_add(1));
                hl
            }
            Indirect::HLDec => {
                let hl = self.regs.hl();
                self.regs.set_hl(hl.wrapping_sub(1));
                hl
            }
        }
    }

    fn source16(&self, src: Source16) -> u16 {
        match src {
            Source16::Reg(rr) => self.regs.get16(rr),
            Source16::Pc => self.regs.pc,
        }
    }

    fn condition(&self, cc: Condition) -> bool {
        match cc {
            Condition::NZ => !self.regs.zero(),
            Condition::Z => self.regs.zero(),
            Condition::NC => !self.regs.carry(),
            Condition::C => self.regs.carry(),
        }
    }

    fn check(&self, cc: Condition) -> Flow {
        if self.condition(cc) {
            Flow::Continue
        } else {
            Flow::Abort
        }
    }

    /// Apply the OAM corruption quirk if `addr` is in its range.
    fn oam_quirk(&mut self, kind: OamCorruption, addr: u16) {
        if !self.config.oam_bug || !oam_bug::in_trigger_range(addr) {
            return;
        }
        let hit = match self.memory.oam_access() {
            Some(access) => oam_bug::corrupt(kind, &access.status, access.oam),
            None => false,
        };
        if hit {
            log(LogCategory::Oam, LogLevel::Debug, || {
                format!("OAM: {:?} corruption via {:04X} at PC={:04X}", kind, addr, self.regs.pc)
            });
        }
    }

    fn halt(&mut self) {
        if !self.interrupts.ime() && self.interrupts.has_pending() {
            self.halt_bug = true;
            log(LogCategory::Cpu, LogLevel::Debug, || {
                format!("CPU: HALT bug triggered at PC={:04X}", self.regs.pc)
            });
        } else {
            self.state = ExecutionState::Halted;
        }
    }

    fn execute(&mut self, op: MicroOp) -> Flow {
        use MicroOp::*;

        match op {
            Nop => {}
            Halt => self.halt(),
            Stop => {
                // Padding byte
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.state = ExecutionState::Stopped;
                log(LogCategory::Cpu, LogLevel::Debug, || {
                    format!("CPU: STOP at PC={:04X}", self.regs.pc)
                });
            }
            Di => self.interrupts.disable_immediately(),
            Ei => self.interrupts.schedule_enable(true),
            Illegal => {
                self.locked = true;
                self.state = ExecutionState::Stopped;
                log(LogCategory::Cpu, LogLevel::Warn, || {
                    format!(
                        "CPU: undefined opcode {:02X} at PC={:04X}, CPU locked",
                        self.opcode,
                        self.regs.pc.wrapping_sub(1)
                    )
                });
            }
            Daa => alu::daa(&mut self.regs),
            Cpl => alu::cpl(&mut self.regs),
            Scf => alu::scf(&mut self.regs),
            Ccf => alu::ccf(&mut self.regs),
            RotateA(shift) => alu::rotate_a(&mut self.regs, shift),

            LdRR(dst, src) => {
                let val = self.regs.get(src);
                self.regs.set(dst, val);
            }
            LdRImm(r) => {
                let val = self.read_pc();
                self.regs.set(r, val);
            }
            LdRInd(r, ind) => {
                let addr = self.indirect(ind);
                if ind.steps_hl() {
                    self.oam_quirk(OamCorruption::ReadIncDec, addr);
                }
                let val = self.bus_read(addr);
                self.regs.set(r, val);
            }
            LdIndR(ind, r) => {
                let addr = self.indirect(ind);
                if ind.steps_hl() {
                    self.oam_quirk(OamCorruption::IncDec, addr);
                }
                let val = self.regs.get(r);
                self.bus_write(addr, val);
            }
            ReadImmZ => self.z = self.read_pc(),
            ReadImmW => self.w = self.read_pc(),
            ReadImmZIf(cc) => {
                self.z = self.read_pc();
                return self.check(cc);
            }
            ReadImmWIf(cc) => {
                self.w = self.read_pc();
                return self.check(cc);
            }
            CheckCond(cc) => return self.check(cc),
            LdImm16Lo => {
                self.oam_quirk(OamCorruption::LoadImm16, self.regs.pc);
                self.z = self.read_pc();
            }
            LdImm16Hi(rr) => {
                self.w = self.read_pc();
                self.regs.set16(rr, self.wz());
            }
            ReadHlZ => self.z = self.bus_read(self.regs.hl()),
            WriteHlZ => self.bus_write(self.regs.hl(), self.z),
            WriteHl(kind) => {
                let val = self.z;
                let result = match kind {
                    HlWrite::Inc => alu::inc8(&mut self.regs, val),
                    HlWrite::Dec => alu::dec8(&mut self.regs, val),
                    HlWrite::Shift(shift) => alu::shift(&mut self.regs, shift, val),
                    HlWrite::Res(bit) => val & !(1 << bit),
                    HlWrite::Set(bit) => val | (1 << bit),
                };
                self.bus_write(self.regs.hl(), result);
            }
            WriteWzA => self.bus_write(self.wz(), self.regs.a),
            ReadWzA => self.regs.a = self.bus_read(self.wz()),
            WriteWzSpLo => {
                let addr = self.wz();
                let (_, lo) = split_bytes(self.regs.sp);
                self.bus_write(addr, lo);
                self.set_wz(addr.wrapping_add(1));
            }
            WriteWzSpHi => {
                let (hi, _) = split_bytes(self.regs.sp);
                self.bus_write(self.wz(), hi);
            }
            WriteHighZ => self.bus_write(0xFF00 | self.z as u16, self.regs.a),
            ReadHighZ => self.regs.a = self.bus_read(0xFF00 | self.z as u16),
            WriteHighC => self.bus_write(0xFF00 | self.regs.c as u16, self.regs.a),
            ReadHighC => self.regs.a = self.bus_read(0xFF00 | self.regs.c as u16),

            AluR(alu_op, r) => {
                let val = self.regs.get(r);
                let a = self.regs.a;
                self.regs.a = alu::alu8(&mut self.regs, alu_op, a, val);
            }
            AluHl(alu_op) => {
                let val = self.bus_read(self.regs.hl());
                let a = self.regs.a;
                self.regs.a = alu::alu8(&mut self.regs, alu_op, a, val);
            }
            AluImm(alu_op) => {
                let val = self.read_pc();
                let a = self.regs.a;
                self.regs.a = alu::alu8(&mut self.regs, alu_op, a, val);
            }
            IncR(r) => {
                let val = self.regs.get(r);
                let result = alu::inc8(&mut self.regs, val);
                self.regs.set(r, result);
            }
            DecR(r) => {
                let val = self.regs.get(r);
                let result = alu::dec8(&mut self.regs, val);
                self.regs.set(r, result);
            }
            Inc16(rr) => {
                let old = self.regs.get16(rr);
                self.oam_quirk(OamCorruption::IncDec, old);
                self.regs.set16(rr, old.wrapping_add(1));
            }
            Dec16(rr) => {
                let old = self.regs.get16(rr);
                self.oam_quirk(OamCorruption::IncDec, old);
                self.regs.set16(rr, old.wrapping_sub(1));
            }
            AddHl(rr) => {
                let val = self.regs.get16(rr);
                let hl = self.regs.hl();
                let result = alu::add16(&mut self.regs, hl, val);
                self.regs.set_hl(result);
            }
            AddSpZ => {
                let sp = self.regs.sp;
                let result = alu::add_sp_offset(&mut self.regs, sp, self.z);
                self.set_wz(result);
            }
            LdSpWz => self.regs.sp = self.wz(),
            LdHlSpZ => {
                let sp = self.regs.sp;
                let result = alu::add_sp_offset(&mut self.regs, sp, self.z);
                self.regs.set_hl(result);
            }
            LdSpHl => self.regs.sp = self.regs.hl(),

            JumpRelative => {
                let offset = self.z as i8 as i16 as u16;
                self.regs.pc = self.regs.pc.wrapping_add(offset);
            }
            JumpWz => self.regs.pc = self.wz(),
            JumpWzEnableIme => {
                self.regs.pc = self.wz();
                self.interrupts.schedule_enable(false);
            }
            JumpHl => self.regs.pc = self.regs.hl(),
            DecSp => {
                self.oam_quirk(OamCorruption::PushFirst, self.regs.sp);
                self.regs.sp = self.regs.sp.wrapping_sub(1);
            }
            PushHi(src) => {
                let (hi, _) = split_bytes(self.source16(src));
                self.oam_quirk(OamCorruption::PushSecond, self.regs.sp);
                self.bus_write(self.regs.sp, hi);
                self.regs.sp = self.regs.sp.wrapping_sub(1);
            }
            PushLo(src) => {
                let (_, lo) = split_bytes(self.source16(src));
                self.bus_write(self.regs.sp, lo);
            }
            PushPcLoJump(target) => {
                let (_, lo) = split_bytes(self.regs.pc);
                self.bus_write(self.regs.sp, lo);
                self.regs.pc = match target {
                    JumpTarget::Wz => self.wz(),
                    JumpTarget::Fixed(vector) => vector,
                };
            }
            PopZ => {
                self.oam_quirk(OamCorruption::PopFirst, self.regs.sp);
                self.z = self.bus_read(self.regs.sp);
                self.regs.sp = self.regs.sp.wrapping_add(1);
            }
            PopW => self.pop_w(),
            PopInto(rr) => {
                self.pop_w();
                self.regs.set16(rr, self.wz());
            }

            ShiftR(shift, r) => {
                let val = self.regs.get(r);
                let result = alu::shift(&mut self.regs, shift, val);
                self.regs.set(r, result);
            }
            BitR(bit, r) => {
                let val = self.regs.get(r);
                alu::bit(&mut self.regs, bit, val);
            }
            BitHl(bit) => {
                let val = self.bus_read(self.regs.hl());
                alu::bit(&mut self.regs, bit, val);
            }
            ResR(bit, r) => {
                let val = self.regs.get(r) & !(1 << bit);
                self.regs.set(r, val);
            }
            SetR(bit, r) => {
                let val = self.regs.get(r) | (1 << bit);
                self.regs.set(r, val);
            }
        }
        Flow::Continue
    }

    fn pop_w(&mut self) {
        self.oam_quirk(OamCorruption::PopSecond, self.regs.sp);
        self.w = self.bus_read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
    }
}

impl<M: MemoryLr35902> crate::Cpu for CpuLr35902<M> {
    fn reset(&mut self) {
        self.reset();
    }

    fn step(&mut self) -> u32 {
        self.step()
    }
}
