//! Copyable register-state snapshot.
//!
//! `CpuState` is the unit of exchange across the differential-testing
//! boundary: the oracle copies it between the DUT and REF, never aliasing
//! either side's live state. The layout is `#[repr(C)]` — general-purpose
//! registers, then the pc, then the CSR file — matching the register block a
//! NEMU-compatible reference shared object expects in `difftest_regcpy`.

use crate::common::constants::{CSR_COUNT, GPR_COUNT};
use crate::core::arch::csr::CSR_NAMES;
use crate::isa::abi;

/// A plain-old-data snapshot of the full architectural register state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    /// General-purpose registers.
    pub gpr: [u32; GPR_COUNT],
    /// Program counter.
    pub pc: u32,
    /// Control/status registers, in [`crate::core::arch::csr`] file order.
    pub csr: [u32; CSR_COUNT],
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            gpr: [0; GPR_COUNT],
            pc: 0,
            csr: [0; CSR_COUNT],
        }
    }
}

impl CpuState {
    /// Dumps the snapshot to stdout in a human-readable form.
    pub fn dump(&self) {
        println!("Registers:");
        for (i, value) in self.gpr.iter().enumerate() {
            let name = abi::name(i).unwrap_or("?");
            println!("{name:>4}: {value:#010x}");
        }
        println!("PC is currently at {:#010x}", self.pc);
        println!("CSRs:");
        for (name, value) in CSR_NAMES.iter().zip(self.csr.iter()) {
            println!("{name:>8}: {value:#010x}");
        }
    }
}
