//! RISC-V lockstep differential-testing simulator CLI.
//!
//! This binary provides the single entry point for a simulation run. It
//! performs:
//! 1. **Setup:** Loads the configuration and a flat program image, and wires
//!    the optional serial/RTC device regions.
//! 2. **Oracle:** Attaches the differential-testing oracle against either an
//!    in-process reference core or a NEMU-compatible shared object.
//! 3. **Run:** Executes to completion and maps the verdict to the process
//!    exit status (0 only for a clean `ebreak` halt with a zero result).

use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use rvdiff_core::config::Config;
use rvdiff_core::core::Cpu;
use rvdiff_core::sim::difftest::{Difftest, LocalRef, RefTarget, SharedObjectRef};
use rvdiff_core::sim::{Simulator, loader};
use rvdiff_core::soc::{Bus, devices};

#[derive(Parser, Debug)]
#[command(
    name = "rvdiff",
    version,
    about = "RV32IM lockstep differential-testing simulator",
    long_about = "Run a flat RV32IM binary image, optionally checking every retirement \
                  against a reference implementation.\n\nExamples:\n  \
                  rvdiff -i prog.bin\n  \
                  rvdiff -i prog.bin --difftest\n  \
                  rvdiff -i prog.bin --ref-so nemu-interpreter-so --devices"
)]
struct Cli {
    /// Flat binary image, loaded at the base of physical memory.
    #[arg(short, long)]
    image: String,

    /// JSON configuration file (defaults are used when absent).
    #[arg(short, long)]
    config: Option<String>,

    /// Check every retirement against an in-process reference core.
    #[arg(long)]
    difftest: bool,

    /// Check against a NEMU-compatible reference shared object.
    #[arg(long, value_name = "PATH")]
    ref_so: Option<String>,

    /// Port handed to the reference implementation at init.
    #[arg(long, default_value_t = 1234)]
    port: i32,

    /// Register the serial and RTC device regions.
    #[arg(long)]
    devices: bool,

    /// Maximum number of instructions to retire.
    #[arg(short = 'n', long, default_value_t = u64::MAX)]
    limit: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    process::exit(run(&cli).unwrap_or_else(|e| {
        eprintln!("[rvdiff] FATAL: {e}");
        1
    }));
}

/// Builds the machine, runs it, and returns the process exit status.
fn run(cli: &Cli) -> Result<i32, rvdiff_core::common::SimError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    config.difftest.enabled |= cli.difftest || cli.ref_so.is_some();
    if cli.ref_so.is_some() {
        config.difftest.ref_so.clone_from(&cli.ref_so);
    }
    config.difftest.port = cli.port;
    config.system.devices |= cli.devices;

    let mut bus = Bus::new(config.system.memory_base, config.system.memory_size);
    if config.system.devices {
        bus.add_region(devices::serial(config.system.serial_base))?;
        bus.add_region(devices::rtc(config.system.rtc_base))?;
    }

    let image = loader::load_image(&mut bus, &cli.image)?;
    let cpu = Cpu::new(bus);
    let mut sim = Simulator::new(cpu);
    tracing::info!(
        "machine ready: {} bytes of memory at {:#010x}, difftest {}",
        config.system.memory_size,
        config.system.memory_base,
        if config.difftest.enabled { "on" } else { "off" }
    );

    if config.difftest.enabled {
        let target: Box<dyn RefTarget> = match config.difftest.ref_so.as_deref() {
            Some(path) => Box::new(SharedObjectRef::open(path)?),
            None => Box::new(LocalRef::new(&config)),
        };
        let oracle = Difftest::new(
            target,
            &image,
            config.system.memory_base,
            &sim.cpu.state(),
            config.difftest.port,
        );
        sim.attach_difftest(oracle);
    }

    sim.exec(cli.limit);
    sim.stats.report();
    Ok(sim.exit_code())
}
