//! DMG harness around the LR35902 core
//!
//! Wires the CPU to a flat image, a timing-only PPU, the timer, OAM DMA and a
//! serial capture port, and advances all of them in lockstep one clock tick
//! at a time. This is what CPU conformance ROMs need; there is no cartridge
//! banking, audio or pixel output.

use lr35902_core::cpu_lr35902::{CpuConfig, CpuLr35902, CpuSnapshot, ExecutionState, TICKS_PER_MCYCLE};
use lr35902_core::logging::{log, LogCategory, LogLevel};
use lr35902_core::System;
use serde_json::Value;

pub mod bus;
pub mod ppu;
pub mod timer;

use bus::{BusState, GbBus, MAX_IMAGE_SIZE};

/// Clock ticks in one 154-line frame
pub const TICKS_PER_FRAME: u32 = ppu::TICKS_PER_LINE as u32 * ppu::LINES_PER_FRAME as u32;

const SAVE_STATE_VERSION: u64 = 1;

#[derive(thiserror::Error, Debug)]
pub enum GbError {
    #[error("Image is {size} bytes; at most {max} bytes can be mapped")]
    ImageTooLarge { size: usize, max: usize },
    #[error("No image loaded")]
    NoImage,
    #[error("Unsupported save state version {0}")]
    UnsupportedVersion(u64),
    #[error("Invalid save state: {0}")]
    InvalidState(&'static str),
    #[error("Save state decode failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct GbSystem {
    cpu: CpuLr35902<GbBus>,
    image_loaded: bool,
}

impl Default for GbSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl GbSystem {
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    pub fn with_config(config: CpuConfig) -> Self {
        Self {
            cpu: CpuLr35902::with_config(GbBus::new(), config),
            image_loaded: false,
        }
    }

    /// Map a flat image at $0000 and reset the machine.
    pub fn load_image(&mut self, data: &[u8]) -> Result<(), GbError> {
        if data.len() > MAX_IMAGE_SIZE {
            return Err(GbError::ImageTooLarge {
                size: data.len(),
                max: MAX_IMAGE_SIZE,
            });
        }
        self.cpu.memory.load_image(data);
        self.image_loaded = true;
        self.reset();
        log(LogCategory::Bus, LogLevel::Info, || {
            format!("Loaded {} byte image", data.len())
        });
        Ok(())
    }

    pub fn image_loaded(&self) -> bool {
        self.image_loaded
    }

    pub fn cpu(&self) -> &CpuLr35902<GbBus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut CpuLr35902<GbBus> {
        &mut self.cpu
    }

    pub fn bus(&self) -> &GbBus {
        &self.cpu.memory
    }

    /// Set controller state (Game Boy buttons)
    /// Bits: 0=Right, 1=Left, 2=Up, 3=Down, 4=A, 5=B, 6=Select, 7=Start (0 = pressed)
    pub fn set_buttons(&mut self, state: u8) {
        self.cpu.memory.set_buttons(state);
    }

    pub fn serial_output(&self) -> &[u8] {
        self.cpu.memory.serial_output()
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.cpu.memory.take_serial_output()
    }

    fn require_image(&self) -> Result<(), GbError> {
        if self.image_loaded {
            Ok(())
        } else {
            Err(GbError::NoImage)
        }
    }

    /// Run `ticks` clock ticks.
    pub fn run_ticks(&mut self, ticks: u64) -> Result<(), GbError> {
        self.require_image()?;
        for _ in 0..ticks {
            self.tick();
        }
        Ok(())
    }

    /// Run until the next instruction or interrupt dispatch completes. A
    /// halted, stopped or locked CPU counts one idle machine cycle as a step.
    /// Returns clock ticks consumed.
    pub fn step_instruction(&mut self) -> Result<u32, GbError> {
        self.require_image()?;
        let mut ticks = 0;
        loop {
            self.tick();
            ticks += 1;
            if !self.cpu.at_mcycle_boundary() {
                continue;
            }
            let idle = matches!(self.cpu.state, ExecutionState::Halted | ExecutionState::Stopped);
            if self.cpu.instruction_completed() || idle {
                return Ok(ticks);
            }
        }
    }

    /// Run `count` steps as defined by [`step_instruction`](Self::step_instruction).
    pub fn run_instructions(&mut self, count: u64) -> Result<u64, GbError> {
        let mut ticks = 0;
        for _ in 0..count {
            ticks += self.step_instruction()? as u64;
        }
        Ok(ticks)
    }

    /// Run one full LCD frame worth of ticks.
    pub fn run_frame(&mut self) -> Result<(), GbError> {
        self.run_ticks(TICKS_PER_FRAME as u64)
    }

    /// Machine cycles executed since reset
    pub fn mcycles(&self) -> u64 {
        self.cpu.cycles / TICKS_PER_MCYCLE as u64
    }
}

impl System for GbSystem {
    type Error = GbError;

    fn reset(&mut self) {
        self.cpu.reset();
        self.cpu.memory.reset();
    }

    fn tick(&mut self) {
        self.cpu.advance();
        self.cpu.memory.tick_peripherals();
        let irq = self.cpu.memory.take_interrupts();
        if irq != 0 {
            self.cpu.interrupts.request_mask(irq);
        }
    }

    fn save_state(&self) -> Value {
        serde_json::json!({
            "system": "gb",
            "version": SAVE_STATE_VERSION,
            "cpu": self.cpu.snapshot(),
            "bus": self.cpu.memory.state(),
        })
    }

    fn load_state(&mut self, v: &Value) -> Result<(), Self::Error> {
        if v.get("system").and_then(Value::as_str) != Some("gb") {
            return Err(GbError::InvalidState("not a gb save state"));
        }
        let version = v
            .get("version")
            .and_then(Value::as_u64)
            .ok_or(GbError::InvalidState("missing version"))?;
        if version != SAVE_STATE_VERSION {
            return Err(GbError::UnsupportedVersion(version));
        }

        let cpu = v.get("cpu").ok_or(GbError::InvalidState("missing cpu"))?;
        let bus = v.get("bus").ok_or(GbError::InvalidState("missing bus"))?;
        let snapshot: CpuSnapshot = serde_json::from_value(cpu.clone())?;
        let bus_state: BusState = serde_json::from_value(bus.clone())?;

        if !self.cpu.memory.restore(&bus_state) {
            return Err(GbError::InvalidState("memory block has the wrong size"));
        }
        self.cpu.restore(&snapshot);
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }
}
