use super::*;
use crate::cpu_lr35902::registers::FLAG_Z;

fn make_cpu(program: &[u8]) -> CpuLr35902<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load(0x0100, program);
    CpuLr35902::new(mem)
}

fn run_mcycles<M: MemoryLr35902>(cpu: &mut CpuLr35902<M>, mcycles: usize) {
    for _ in 0..mcycles * TICKS_PER_MCYCLE as usize {
        cpu.advance();
    }
}

#[test]
fn test_nop() {
    let mut cpu = make_cpu(&[0x00]);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.regs.pc, 0x0101);
}

#[test]
fn test_work_happens_on_first_tick() {
    let mut cpu = make_cpu(&[0x3C]); // INC A
    cpu.advance();
    assert_eq!(cpu.regs.a, 0x02);
    assert!(!cpu.at_mcycle_boundary());
    cpu.advance();
    cpu.advance();
    cpu.advance();
    assert_eq!(cpu.regs.a, 0x02);
    assert!(cpu.at_mcycle_boundary());
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn test_ld_bc_d16() {
    let mut cpu = make_cpu(&[0x01, 0x34, 0x12]);
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_eq!(cpu.regs.pc, 0x0103);
}

#[test]
fn test_jr_not_taken_takes_8_ticks() {
    let mut cpu = make_cpu(&[0x20, 0x05]); // JR NZ,+5
    cpu.regs.f = FLAG_Z;
    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.regs.pc, 0x0102);
}

#[test]
fn test_jr_taken_takes_12_ticks() {
    let mut cpu = make_cpu(&[0x20, 0x05]);
    cpu.regs.f = 0;
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.pc, 0x0107);
}

#[test]
fn test_jr_backwards() {
    let mut cpu = make_cpu(&[0x18, 0xFE]); // JR -2: tight loop
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.pc, 0x0100);
}

#[test]
fn test_jp_conditional() {
    let mut cpu = make_cpu(&[0xC2, 0x00, 0x02]); // JP NZ,$0200
    cpu.regs.f = FLAG_Z;
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.pc, 0x0103);

    cpu.regs.pc = 0x0100;
    cpu.regs.f = 0;
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.pc, 0x0200);
}

#[test]
fn test_call_ret() {
    let mut cpu = make_cpu(&[0xCD, 0x00, 0x02]); // CALL $0200
    cpu.memory.0[0x0200] = 0xC9; // RET
    assert_eq!(cpu.step(), 24);
    assert_eq!(cpu.regs.pc, 0x0200);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(cpu.memory.0[0xFFFD], 0x01);
    assert_eq!(cpu.memory.0[0xFFFC], 0x03);

    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.pc, 0x0103);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_call_not_taken() {
    let mut cpu = make_cpu(&[0xCC, 0x00, 0x02]); // CALL Z,$0200
    cpu.regs.f = 0;
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.pc, 0x0103);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_ret_conditional() {
    let mut cpu = make_cpu(&[0xC0, 0xC8]); // RET NZ ; RET Z
    cpu.regs.f = FLAG_Z;
    cpu.regs.sp = 0xC000;
    cpu.memory.0[0xC000] = 0x34;
    cpu.memory.0[0xC001] = 0x12;
    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.regs.pc, 0x0101);
    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.sp, 0xC002);
}

#[test]
fn test_rst() {
    let mut cpu = make_cpu(&[0xFF]); // RST 38H
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.pc, 0x0038);
    assert_eq!(cpu.memory.read16(0xFFFC), 0x0101);
}

#[test]
fn test_push_pop() {
    let mut cpu = make_cpu(&[0xC5, 0xD1]); // PUSH BC ; POP DE
    cpu.regs.set_bc(0xBEEF);
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.de(), 0xBEEF);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_pop_af_masks_low_nibble() {
    let mut cpu = make_cpu(&[0xC5, 0xF1]); // PUSH BC ; POP AF
    cpu.regs.set_bc(0x12FF);
    cpu.step();
    cpu.step();
    assert_eq!(cpu.regs.af(), 0x12F0);
}

#[test]
fn test_ld_hl_increment() {
    let mut cpu = make_cpu(&[0x22]); // LD (HL+),A
    cpu.regs.set_hl(0xC000);
    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.memory.0[0xC000], 0x01);
    assert_eq!(cpu.regs.hl(), 0xC001);
}

#[test]
fn test_ld_a16_sp() {
    let mut cpu = make_cpu(&[0x08, 0x00, 0xC0]);
    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.memory.0[0xC000], 0xFE);
    assert_eq!(cpu.memory.0[0xC001], 0xFF);
}

#[test]
fn test_add_sp_negative() {
    let mut cpu = make_cpu(&[0xE8, 0xFE]); // ADD SP,-2
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert!(!cpu.regs.zero());
    assert!(!cpu.regs.subtract());
    assert!(cpu.regs.half_carry());
    assert!(cpu.regs.carry());
}

#[test]
fn test_cb_register_and_memory_timing() {
    let mut cpu = make_cpu(&[0xCB, 0x37, 0xCB, 0x06, 0xCB, 0x46]); // SWAP A ; RLC (HL) ; BIT 0,(HL)
    cpu.regs.set_hl(0xC000);
    cpu.memory.0[0xC000] = 0x80;

    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.regs.a, 0x10);

    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.memory.0[0xC000], 0x01);
    assert!(cpu.regs.carry());

    assert_eq!(cpu.step(), 12);
    assert!(!cpu.regs.zero());
    assert_eq!(cpu.regs.pc, 0x0106);
}

#[test]
fn test_interrupt_dispatch_five_mcycles() {
    let mut cpu = make_cpu(&[0x00]);
    cpu.interrupts.schedule_enable(false);
    cpu.interrupts.set_ie(Interrupt::VBlank.bit());
    cpu.interrupts.request(Interrupt::VBlank);

    run_mcycles(&mut cpu, 4);
    assert_eq!(cpu.regs.pc, 0x0100);
    assert_eq!(cpu.state, ExecutionState::InterruptDispatch(DispatchPhase::Jump));

    run_mcycles(&mut cpu, 1);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(cpu.memory.0[0xFFFD], 0x01); // high byte first
    assert_eq!(cpu.memory.0[0xFFFC], 0x00);
    assert!(!cpu.interrupts.ime());
    assert_eq!(cpu.interrupts.if_reg() & Interrupt::VBlank.bit(), 0);
    assert_eq!(cpu.state, ExecutionState::Fetch);
}

#[test]
fn test_dispatch_picks_highest_priority() {
    let mut cpu = make_cpu(&[0x00]);
    cpu.interrupts.schedule_enable(false);
    cpu.interrupts.set_ie(0x1F);
    cpu.interrupts.request(Interrupt::Joypad);
    cpu.interrupts.request(Interrupt::Timer);
    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.regs.pc, 0x0050);
    assert_eq!(cpu.interrupts.if_reg() & 0x1F, Interrupt::Joypad.bit());
}

#[test]
fn test_dispatch_aborts_when_request_withdrawn() {
    let mut cpu = make_cpu(&[0x00]);
    cpu.interrupts.schedule_enable(false);
    cpu.interrupts.set_ie(Interrupt::VBlank.bit());
    cpu.interrupts.request(Interrupt::VBlank);

    run_mcycles(&mut cpu, 1);
    assert_eq!(cpu.state, ExecutionState::InterruptDispatch(DispatchPhase::Ie));
    cpu.interrupts.set_if(0);
    run_mcycles(&mut cpu, 1);
    assert_eq!(cpu.state, ExecutionState::Fetch);
    assert_eq!(cpu.regs.pc, 0x0100);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_halt_bug_repeats_next_byte() {
    let mut cpu = make_cpu(&[0x76, 0x3C, 0x00]); // HALT ; INC A ; NOP
    cpu.interrupts.set_ie(Interrupt::Timer.bit());
    cpu.interrupts.request(Interrupt::Timer);

    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.state, ExecutionState::Fetch);
    assert!(cpu.halt_bug_pending());
    assert_eq!(cpu.regs.pc, 0x0101);

    cpu.step();
    assert_eq!(cpu.regs.a, 0x02);
    assert_eq!(cpu.regs.pc, 0x0101); // INC A fetched without advancing
    assert!(!cpu.halt_bug_pending());

    cpu.step();
    assert_eq!(cpu.regs.a, 0x03);
    assert_eq!(cpu.regs.pc, 0x0102);
}

#[test]
fn test_halt_waits_then_wakes_without_ime() {
    let mut cpu = make_cpu(&[0x76, 0x00]);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.state, ExecutionState::Halted);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.state, ExecutionState::Halted);

    cpu.interrupts.set_ie(Interrupt::Serial.bit());
    cpu.interrupts.request(Interrupt::Serial);
    // One cycle to wake, one for the NOP
    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.regs.pc, 0x0102);
    assert_ne!(cpu.interrupts.if_reg() & Interrupt::Serial.bit(), 0);
}

#[test]
fn test_halt_with_ime_dispatches() {
    let mut cpu = make_cpu(&[0x76]);
    cpu.interrupts.schedule_enable(false);
    cpu.interrupts.set_ie(Interrupt::Stat.bit());
    cpu.step();
    assert_eq!(cpu.state, ExecutionState::Halted);

    cpu.interrupts.request(Interrupt::Stat);
    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.regs.pc, 0x0048);
    assert_eq!(cpu.memory.read16(cpu.regs.sp), 0x0101);
}

#[test]
fn test_ei_halt_with_pending_request_dispatches_cleanly() {
    let mut mem = ArrayMemory::new();
    mem.load(0x0100, &[0xFB, 0x76, 0x00]); // EI ; HALT ; NOP
    mem.load(0x0040, &[0x3C, 0x18, 0xFE]); // INC A ; JR -2
    let mut cpu = CpuLr35902::new(mem);
    cpu.interrupts.set_ie(Interrupt::VBlank.bit());
    cpu.interrupts.request(Interrupt::VBlank);

    cpu.step(); // EI
    cpu.step(); // HALT: IME still clear, so the bug triggers
    assert!(cpu.interrupts.ime());
    assert!(cpu.halt_bug_pending());

    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert!(!cpu.halt_bug_pending());
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(cpu.memory.read16(cpu.regs.sp), 0x0101); // the HALT

    cpu.step(); // INC A
    assert_eq!(cpu.regs.a, 0x02);
    assert_eq!(cpu.regs.pc, 0x0041);
    cpu.step(); // JR -2
    assert_eq!(cpu.regs.a, 0x02);
    assert_eq!(cpu.regs.pc, 0x0041);
}

#[test]
fn test_ei_then_di_never_enables() {
    let mut cpu = make_cpu(&[0xFB, 0xF3, 0x00]); // EI ; DI ; NOP
    cpu.interrupts.set_ie(Interrupt::VBlank.bit());
    cpu.interrupts.request(Interrupt::VBlank);

    cpu.step();
    assert!(!cpu.interrupts.ime());
    cpu.step();
    assert!(!cpu.interrupts.ime());
    cpu.step();
    assert!(!cpu.interrupts.ime());
    assert_eq!(cpu.regs.pc, 0x0103);
}

#[test]
fn test_ei_takes_effect_after_next_instruction() {
    let mut cpu = make_cpu(&[0xFB, 0x00, 0x00]); // EI ; NOP ; NOP
    cpu.interrupts.set_ie(Interrupt::VBlank.bit());
    cpu.interrupts.request(Interrupt::VBlank);

    cpu.step();
    assert!(!cpu.interrupts.ime());
    cpu.step();
    assert!(cpu.interrupts.ime());
    assert_eq!(cpu.regs.pc, 0x0102);

    assert_eq!(cpu.step(), 20);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert_eq!(cpu.memory.read16(cpu.regs.sp), 0x0102);
}

#[test]
fn test_reti_enables_immediately() {
    let mut cpu = make_cpu(&[0xD9]);
    cpu.regs.sp = 0xC000;
    cpu.memory.0[0xC000] = 0x34;
    cpu.memory.0[0xC001] = 0x12;
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.pc, 0x1234);
    assert!(cpu.interrupts.ime());
}

#[test]
fn test_illegal_opcode_locks_cpu() {
    let mut cpu = make_cpu(&[0xD3, 0x3C]);
    assert_eq!(cpu.step(), 4);
    assert!(cpu.is_locked());
    assert_eq!(cpu.state, ExecutionState::Stopped);

    cpu.interrupts.schedule_enable(false);
    cpu.interrupts.set_ie(0x1F);
    cpu.interrupts.request_mask(0x1F);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.regs.pc, 0x0101);
    assert_eq!(cpu.regs.a, 0x01);

    cpu.reset();
    assert!(!cpu.is_locked());
    assert_eq!(cpu.state, ExecutionState::Fetch);
}

#[test]
fn test_stop_wakes_on_joypad() {
    let mut cpu = make_cpu(&[0x10, 0x00, 0x3C]); // STOP ; INC A
    cpu.step();
    assert_eq!(cpu.state, ExecutionState::Stopped);
    assert_eq!(cpu.regs.pc, 0x0102);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.state, ExecutionState::Stopped);

    cpu.interrupts.request(Interrupt::Joypad);
    assert_eq!(cpu.step(), 8);
    assert_eq!(cpu.regs.a, 0x02);
}

#[test]
fn test_if_and_ie_are_routed_to_controller() {
    let program = [
        0x3E, 0x05, // LD A,$05
        0xE0, 0x0F, // LDH ($0F),A
        0xE0, 0xFF, // LDH ($FF),A
        0xF0, 0x0F, // LDH A,($0F)
    ];
    let mut cpu = make_cpu(&program);
    cpu.step();
    assert_eq!(cpu.step(), 12);
    cpu.step();
    cpu.step();
    assert_eq!(cpu.interrupts.if_reg(), 0xE5);
    assert_eq!(cpu.interrupts.ie(), 0x05);
    assert_eq!(cpu.regs.a, 0xE5);
    assert_eq!(cpu.memory.0[0xFF0F], 0x00);
    assert_eq!(cpu.memory.0[0xFFFF], 0x00);
}

struct OamStub {
    ram: ArrayMemory,
    oam: [u8; OAM_SIZE],
    status: PpuStatus,
}

impl OamStub {
    fn new(program: &[u8], line_ticks: u16) -> Self {
        let mut ram = ArrayMemory::new();
        ram.load(0x0100, program);
        let mut oam = [0u8; OAM_SIZE];
        for (i, b) in oam.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        Self {
            ram,
            oam,
            status: PpuStatus {
                lcd_enabled: true,
                mode: 2,
                line_ticks,
            },
        }
    }
}

impl MemoryLr35902 for OamStub {
    fn read(&self, addr: u16) -> u8 {
        self.ram.read(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.ram.write(addr, val);
    }

    fn oam_access(&mut self) -> Option<OamAccess<'_>> {
        Some(OamAccess {
            status: self.status,
            oam: &mut self.oam,
        })
    }
}

#[test]
fn test_inc_rr_in_oam_range_corrupts() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[0x23], 20)); // INC HL
    cpu.regs.set_hl(0xFE10);
    let before = cpu.memory.oam;
    cpu.step();
    assert_eq!(cpu.regs.hl(), 0xFE11);
    assert_ne!(cpu.memory.oam[40..48], before[40..48]);
    assert_eq!(cpu.memory.oam[..40], before[..40]);
}

#[test]
fn test_inc_rr_outside_oam_range_is_clean() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[0x23], 20));
    cpu.regs.set_hl(0xC000);
    let before = cpu.memory.oam;
    cpu.step();
    assert_eq!(cpu.memory.oam, before);
}

#[test]
fn test_oam_bug_can_be_disabled() {
    let config = CpuConfig {
        oam_bug: false,
        ..CpuConfig::default()
    };
    let mut cpu = CpuLr35902::with_config(OamStub::new(&[0xC5], 20), config); // PUSH BC
    cpu.regs.sp = 0xFE20;
    let before = cpu.memory.oam;
    cpu.step();
    assert_eq!(cpu.memory.oam, before);
}

#[test]
fn test_push_in_oam_range_corrupts() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[0xC5], 20)); // PUSH BC
    cpu.regs.sp = 0xFE20;
    let before = cpu.memory.oam;
    assert_eq!(cpu.step(), 16);
    assert_eq!(cpu.regs.sp, 0xFE1E);
    // Row 5 is under the scan; the first push write also reaches row 6
    assert_ne!(cpu.memory.oam[40..48], before[40..48]);
    assert_eq!(cpu.memory.oam[..40], before[..40]);
}

#[test]
fn test_ld_rr_d16_fetched_from_oam_range_corrupts() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[], 24));
    cpu.memory.ram.load(0xFE50, &[0x01, 0x34, 0x12]); // LD BC,$1234
    cpu.regs.pc = 0xFE50;
    let before = cpu.memory.oam;
    assert_eq!(cpu.step(), 12);
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_ne!(cpu.memory.oam, before);
}

#[test]
fn test_ld_hl_increment_in_oam_range_corrupts() {
    // LD A,(HL+) ; LD (HL-),A
    for program in [[0x2A], [0x32]] {
        let mut cpu = CpuLr35902::new(OamStub::new(&program, 20));
        cpu.regs.set_hl(0xFE30);
        let before = cpu.memory.oam;
        cpu.step();
        assert_ne!(cpu.memory.oam, before, "opcode {:02X}", program[0]);
    }
}

#[test]
fn test_ld_hl_indirect_without_step_is_clean() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[0x7E], 20)); // LD A,(HL)
    cpu.regs.set_hl(0xFE30);
    let before = cpu.memory.oam;
    cpu.step();
    assert_eq!(cpu.memory.oam, before);
}

#[test]
fn test_pop_in_oam_range_corrupts() {
    let mut cpu = CpuLr35902::new(OamStub::new(&[0xC1], 40)); // POP BC
    cpu.regs.sp = 0xFE40;
    let before = cpu.memory.oam;
    cpu.step();
    assert_ne!(cpu.memory.oam, before);
    assert_eq!(cpu.regs.sp, 0xFE42);
}

#[test]
fn test_trace_entry_after_instruction() {
    let config = CpuConfig {
        trace: true,
        ..CpuConfig::default()
    };
    let mut mem = ArrayMemory::new();
    mem.load(0x0100, &[0x00, 0xC3, 0x13, 0x02, 0x00]);
    let mut cpu = CpuLr35902::with_config(mem, config);
    cpu.step();

    let entry = cpu.last_trace().expect("trace entry");
    assert_eq!(entry.mnemonic, "NOP");
    assert_eq!(entry.cycles, 4);
    assert_eq!(
        entry.to_string(),
        "A:01 F:B0 B:00 C:13 D:00 E:D8 H:01 L:4D SP:FFFE PC:0101 PCMEM:C3,13,02,00"
    );
}

#[test]
fn test_verbose_trace_format_names_instruction() {
    let config = CpuConfig {
        trace: true,
        trace_format: TraceFormat::Verbose,
        ..CpuConfig::default()
    };
    let mut mem = ArrayMemory::new();
    mem.load(0x0100, &[0x00]);
    let mut cpu = CpuLr35902::with_config(mem, config);
    cpu.step();

    let entry = cpu.last_trace().expect("trace entry");
    let line = entry.render(cpu.config.trace_format);
    assert!(line.starts_with("A:01 F:B0"));
    assert!(line.ends_with("| 00 NOP @4"));
}

#[test]
fn test_config_without_trace_format_deserializes() {
    let config: CpuConfig = serde_json::from_str(r#"{"oam_bug":false,"trace":true}"#).expect("config");
    assert!(!config.oam_bug);
    assert_eq!(config.trace_format, TraceFormat::Doctor);
    assert!(config.post_boot);
}

#[test]
fn test_no_trace_by_default() {
    let mut cpu = make_cpu(&[0x00]);
    cpu.step();
    assert!(cpu.last_trace().is_none());
}

#[test]
fn test_snapshot_restore_mid_instruction() {
    let mut cpu = make_cpu(&[0x01, 0x34, 0x12, 0x3C]); // LD BC,$1234 ; INC A
    run_mcycles(&mut cpu, 2);
    assert_eq!(cpu.state, ExecutionState::WorkPending);

    let snap = cpu.snapshot();
    let json = serde_json::to_string(&snap).expect("serialize");
    let snap: CpuSnapshot = serde_json::from_str(&json).expect("deserialize");

    cpu.step();
    cpu.step();
    assert_eq!(cpu.regs.a, 0x02);

    cpu.restore(&snap);
    assert_eq!(cpu.regs.pc, 0x0102);
    cpu.step();
    assert_eq!(cpu.regs.bc(), 0x1234);
    assert_eq!(cpu.cycles, 12);
}

#[test]
fn test_zeroed_start() {
    let config = CpuConfig {
        post_boot: false,
        ..CpuConfig::default()
    };
    let cpu = CpuLr35902::with_config(ArrayMemory::new(), config);
    assert_eq!(cpu.regs, Registers::zeroed());
}

#[test]
fn test_cpu_trait() {
    use crate::Cpu;

    fn run<C: Cpu>(cpu: &mut C) -> u32 {
        cpu.step() + cpu.step()
    }

    let mut cpu = make_cpu(&[0x00, 0x06, 0x42]); // NOP ; LD B,$42
    assert_eq!(run(&mut cpu), 12);
    assert_eq!(cpu.regs.b, 0x42);
    Cpu::reset(&mut cpu);
    assert_eq!(cpu.regs.pc, 0x0100);
}
