//! General-Purpose Register File.
//!
//! This module implements the integer register file. It performs the
//! following:
//! 1. **Storage:** Maintains the architectural registers (`x0`-`x31`, or
//!    `x0`-`x15` with the `rv32e` feature).
//! 2. **Invariant Enforcement:** Register `x0` is hardwired to zero; writes
//!    to it are ignored, so the zero invariant holds at every retirement
//!    boundary by construction.
//! 3. **Debugging:** Dumps the complete register state for diagnostics.

use crate::common::constants::GPR_COUNT;
use crate::isa::abi;

/// The general-purpose register file.
#[derive(Debug, Clone)]
pub struct Gpr {
    regs: [u32; GPR_COUNT],
}

impl Default for Gpr {
    fn default() -> Self {
        Self::new()
    }
}

impl Gpr {
    /// Creates a register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; GPR_COUNT],
        }
    }

    /// Reads a register value. Register `x0` always returns 0.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range; register indices come from 5-bit
    /// (4-bit for RV32E) instruction fields and are always in range.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u32 {
        if idx == 0 { 0 } else { self.regs[idx] }
    }

    /// Writes a register value. Writes to `x0` are ignored.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of range (see [`Gpr::read`]).
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Returns a copy of the whole register array.
    pub fn snapshot(&self) -> [u32; GPR_COUNT] {
        self.regs
    }

    /// Replaces the whole register array, forcing `x0` back to zero.
    pub fn restore(&mut self, regs: &[u32; GPR_COUNT]) {
        self.regs = *regs;
        self.regs[0] = 0;
    }

    /// Dumps all registers to stdout with their ABI names.
    pub fn dump(&self) {
        for (i, value) in self.regs.iter().enumerate() {
            let name = abi::name(i).unwrap_or("?");
            println!("{name:>4}: {value:#010x}");
        }
    }
}
