//! Fatal Simulator Errors.
//!
//! This module defines the error type that ends a simulation run. It covers:
//! 1. **Configuration errors:** Bad MMIO registration, unreadable images.
//! 2. **Program errors:** Illegal instructions, unmapped bus accesses.
//! 3. **Divergence errors:** DUT/REF state mismatch or failed resynchronization.
//!
//! Nothing here is recoverable by design: this simulator is a correctness
//! oracle, and silent continuation after any of these would defeat its
//! purpose.

use thiserror::Error;

use crate::soc::BusError;

/// A fatal error that terminates the simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// A bus access failed while executing the instruction at `pc`.
    ///
    /// Raised for unmapped addresses and unsupported access widths; carries
    /// the faulting program counter for diagnosis.
    #[error("{source} at pc = {pc:#010x}")]
    Bus {
        /// Program counter of the faulting instruction.
        pc: u32,
        /// The underlying dispatcher failure.
        source: BusError,
    },

    /// MMIO region registration or image loading failed before execution.
    #[error(transparent)]
    Setup(#[from] BusError),

    /// The fetched word matched no pattern except the catch-all.
    #[error("illegal instruction {inst:#010x} at pc = {pc:#010x}")]
    IllegalInstruction {
        /// The offending 32-bit encoding.
        inst: u32,
        /// Program counter of the offending instruction.
        pc: u32,
    },

    /// The DUT and REF register state disagreed after a retirement.
    ///
    /// A side-by-side register dump has already been emitted by the oracle.
    #[error("DUT state diverged from REF at pc = {pc:#010x}")]
    Divergence {
        /// DUT program counter at the point of divergence.
        pc: u32,
    },

    /// The catch-up budget ran out before REF reached the DUT's pc.
    #[error("REF could not catch up: ref pc = {ref_pc:#010x}, dut pc = {pc:#010x}")]
    CatchUpExhausted {
        /// Where REF stalled.
        ref_pc: u32,
        /// Where the DUT currently is.
        pc: u32,
    },

    /// The reference shared object could not be loaded or is incomplete.
    #[error("failed to load reference module: {0}")]
    RefLoad(String),

    /// The program image file could not be read.
    #[error("failed to read image '{path}'")]
    Image {
        /// Path of the image file.
        path: String,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration '{path}': {reason}")]
    Config {
        /// Path of the configuration file.
        path: String,
        /// Human-readable parse or I/O failure.
        reason: String,
    },
}

impl SimError {
    /// Wraps a dispatcher failure with the program counter of the
    /// instruction that triggered it.
    pub fn bus(pc: u32, source: BusError) -> Self {
        Self::Bus { pc, source }
    }
}
