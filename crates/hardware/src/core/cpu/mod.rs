//! The CPU structure and its execution engine.
//!
//! `Cpu` owns the architectural state, the compiled pattern table, and the
//! bus it reads and writes through. There is no ambient global state: every
//! simulated hart is an explicit value, which is what lets the oracle hold a
//! DUT and a REF side by side in one process.

use crate::core::arch::{CpuState, Csr, Gpr};
use crate::isa::InstructionTable;
use crate::isa::abi;
use crate::soc::Bus;

/// The main execution loop (`step`).
pub mod execution;
/// The trap controller.
pub mod trap;

pub use execution::StepResult;

/// One simulated RV32IM machine-mode hart.
#[derive(Debug)]
pub struct Cpu {
    /// General-purpose register file.
    pub regs: Gpr,
    /// Program counter of the next instruction to fetch.
    pub pc: u32,
    /// Control/status register file.
    pub csrs: Csr,
    /// The address space this hart reads and writes through.
    pub bus: Bus,
    table: InstructionTable,
}

impl Cpu {
    /// Creates a hart over `bus`, with the pc at the reset vector (the base
    /// of physical memory) and all registers zeroed.
    pub fn new(bus: Bus) -> Self {
        let pc = bus.memory_base();
        Self {
            regs: Gpr::new(),
            pc,
            csrs: Csr::new(),
            bus,
            table: InstructionTable::new(),
        }
    }

    /// Copies the full register state out of the hart.
    pub fn state(&self) -> CpuState {
        CpuState {
            gpr: self.regs.snapshot(),
            pc: self.pc,
            csr: self.csrs.snapshot(),
        }
    }

    /// Replaces the full register state of the hart.
    pub fn set_state(&mut self, state: &CpuState) {
        self.regs.restore(&state.gpr);
        self.pc = state.pc;
        self.csrs.restore(&state.csr);
    }

    /// Looks up a register value by ABI name (`"a0"`, `"x10"`, or `"pc"`).
    ///
    /// This is the accessor the debug console builds its expression
    /// evaluator and watchpoints on.
    pub fn reg_by_name(&self, name: &str) -> Option<u32> {
        if name == "pc" {
            return Some(self.pc);
        }
        abi::index_of(name).map(|idx| self.regs.read(idx))
    }
}
