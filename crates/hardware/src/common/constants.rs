//! Global System Constants.
//!
//! This module defines the fixed architectural parameters of the simulated
//! machine: the physical memory window, the reset vector, and the register
//! file geometry.

/// Base physical address of main memory.
///
/// The program image is loaded verbatim at this address and the core starts
/// fetching here after reset. All addresses below this value are either MMIO
/// regions or unmapped.
pub const MEMORY_BASE: u32 = 0x8000_0000;

/// Default size of main memory in bytes (128 MiB).
///
/// Accesses beyond `MEMORY_BASE + memory_size` that hit no registered MMIO
/// region are fatal bus errors.
pub const MEMORY_SIZE: usize = 128 * 1024 * 1024;

/// Address of the first instruction executed after reset.
pub const RESET_VECTOR: u32 = MEMORY_BASE;

/// Width of one instruction fetch in bytes (no compressed instructions).
pub const INSTRUCTION_LEN: u32 = 4;

/// Number of general-purpose registers (RV32E: 16).
#[cfg(feature = "rv32e")]
pub const GPR_COUNT: usize = 16;

/// Number of general-purpose registers (RV32I: 32).
#[cfg(not(feature = "rv32e"))]
pub const GPR_COUNT: usize = 32;

/// Number of implemented control/status registers
/// (`mstatus`, `mtvec`, `mepc`, `mcause`, `mtval`).
pub const CSR_COUNT: usize = 5;
