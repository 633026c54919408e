//! Core LR35902 primitives and traits.

pub mod cpu_lr35902;
pub mod logging;

use serde_json::Value;

/// A CPU-like component that can be stepped; returns clock ticks consumed.
pub trait Cpu {
    fn reset(&mut self);
    fn step(&mut self) -> u32;
}

/// A whole machine advanced in lockstep, one clock tick at a time.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Advance every component by one clock tick.
    fn tick(&mut self);

    /// Return a JSON-serializable save state.
    /// Note: Save states should NOT include the loaded image, only machine state.
    fn save_state(&self) -> Value;

    /// Load a JSON save state.
    fn load_state(&mut self, v: &Value) -> Result<(), Self::Error>;

    /// Check if this system supports save/load state functionality
    fn supports_save_states(&self) -> bool {
        false // Default: no save state support
    }
}
