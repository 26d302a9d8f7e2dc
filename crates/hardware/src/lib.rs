//! RISC-V lockstep differential-testing simulator library.
//!
//! This crate implements an RV32IM machine-mode instruction-set simulator and
//! the harness that checks it against a second implementation instruction by
//! instruction. It provides:
//! 1. **Core:** GPR/CSR architectural state and the fetch-decode-execute loop.
//! 2. **ISA:** The ordered instruction pattern table and operand decoding for
//!    the six RV32 instruction formats.
//! 3. **SoC:** The physical/MMIO address-space dispatcher and minimal device
//!    regions (serial, RTC).
//! 4. **Simulation:** Run loop, flat-image loader, statistics, and the
//!    differential-testing oracle with its reference ABI.

/// Common types and constants (memory layout, register counts, fatal errors).
pub mod common;
/// Simulator configuration (defaults, hierarchical config structures).
pub mod config;
/// CPU core (architectural state, execution, trap controller).
pub mod core;
/// Instruction set (pattern table, operand decoding, ABI names, trap causes).
pub mod isa;
/// Simulation (run loop, loader, differential-testing oracle, reference ABI).
pub mod sim;
/// System-on-chip (address-space dispatcher, MMIO regions, devices).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; holds architectural state, the pattern table, and the bus.
pub use crate::core::Cpu;
/// Top-level simulator; owns the CPU and drives the oracle per retirement.
pub use crate::sim::Simulator;
