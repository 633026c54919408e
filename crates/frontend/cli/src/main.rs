use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use lr35902_core::cpu_lr35902::{CpuConfig, TraceFormat};
use lr35902_core::logging::{LogCategory, LogConfig, LogLevel};
use lr35902_core::System;
use lr35902_gb::{GbSystem, TICKS_PER_FRAME};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum TraceStyle {
    /// gameboy-doctor register lines
    Doctor,
    /// Register line plus opcode, mnemonic and cycle count
    Verbose,
}

impl From<TraceStyle> for TraceFormat {
    fn from(style: TraceStyle) -> Self {
        match style {
            TraceStyle::Doctor => TraceFormat::Doctor,
            TraceStyle::Verbose => TraceFormat::Verbose,
        }
    }
}

/// Run a flat Game Boy image headlessly on the cycle-stepped LR35902 core.
#[derive(Parser)]
struct Args {
    /// Path to the image, mapped at $0000 (at most 32 KiB)
    image: PathBuf,

    /// Number of clock ticks to run (default: 60 frames)
    #[arg(long, conflicts_with = "instructions")]
    ticks: Option<u64>,

    /// Number of instructions to run instead of a tick count
    #[arg(long)]
    instructions: Option<u64>,

    /// Log a trace line after every instruction
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Trace line layout
    #[arg(long, value_enum, default_value_t = TraceStyle::Doctor)]
    trace_format: TraceStyle,

    /// Write core logs (including the trace) to this file instead of stderr
    #[arg(long)]
    trace_file: Option<PathBuf>,

    /// Global core log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Log level for CPU execution events
    #[arg(long)]
    log_cpu: Option<String>,

    /// Log level for interrupt dispatch
    #[arg(long)]
    log_int: Option<String>,

    /// Dump save-state to this file as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Disable emulation of the DMG OAM corruption quirk
    #[arg(long, default_value_t = false)]
    no_oam_bug: bool,

    /// Print captured serial output; fails if it reports "Failed"
    #[arg(long, default_value_t = false)]
    serial: bool,
}

fn parse_level(flag: &str, value: &str) -> Result<LogLevel> {
    match LogLevel::from_str(value) {
        Some(level) => Ok(level),
        None => bail!("Invalid {} level: {}", flag, value),
    }
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    if let Some(level) = args.log_level.as_deref() {
        config.set_global_level(parse_level("--log-level", level)?);
    }
    if let Some(level) = args.log_cpu.as_deref() {
        config.set_level(LogCategory::Cpu, parse_level("--log-cpu", level)?);
    }
    if let Some(level) = args.log_int.as_deref() {
        config.set_level(LogCategory::Interrupts, parse_level("--log-int", level)?);
    }
    if args.trace {
        config.set_level(LogCategory::Trace, LogLevel::Trace);
    }
    if let Some(path) = args.trace_file.as_ref() {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening {}", path.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    configure_logging(&args)?;

    let data = fs::read(&args.image).with_context(|| format!("reading {}", args.image.display()))?;
    let config = CpuConfig {
        oam_bug: !args.no_oam_bug,
        trace: args.trace,
        trace_format: args.trace_format.into(),
        ..CpuConfig::default()
    };
    let mut sys = GbSystem::with_config(config);
    sys.load_image(&data)?;
    log::info!("Loaded {} ({} bytes)", args.image.display(), data.len());

    match args.instructions {
        Some(count) => {
            let ticks = sys.run_instructions(count)?;
            log::info!("Ran {} instructions in {} ticks", count, ticks);
        }
        None => {
            let ticks = args.ticks.unwrap_or(TICKS_PER_FRAME as u64 * 60);
            sys.run_ticks(ticks)?;
            log::info!("Ran {} ticks", ticks);
        }
    }

    let cpu = sys.cpu();
    log::info!(
        "Stopped at PC={:04X} SP={:04X} state={:?} cycles={}",
        cpu.regs.pc,
        cpu.regs.sp,
        cpu.state,
        cpu.cycles
    );
    if cpu.is_locked() {
        log::warn!("CPU locked up on an undefined opcode");
    }

    if let Some(path) = args.save.as_ref() {
        let state = sys.save_state();
        let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
        log::info!("Saved state to {}", path.display());
    }

    LogConfig::global().clear_log_file();

    if args.serial {
        let output = String::from_utf8_lossy(sys.serial_output()).into_owned();
        println!("{}", output);
        if output.contains("Failed") {
            bail!("Image reported failure over serial");
        }
    }

    Ok(())
}
