//! The lockstep differential-testing oracle.
//!
//! The oracle drives a reference implementation ("REF") in lockstep with the
//! simulated hart ("DUT") and compares the full register state after each
//! retirement. It tolerates implementations that cannot stay in lockstep
//! through two escape hatches:
//! 1. **`skip_ref`:** One retirement whose effect REF cannot reproduce
//!    (typically a device access) — DUT state is copied into REF and the
//!    comparison is suppressed once.
//! 2. **`skip_dut` / catch-up:** REF retires a different number of steps
//!    than the DUT (e.g. macro-instruction expansion) — REF is stepped ahead
//!    eagerly, then comparison is suspended until REF's pc meets the DUT's,
//!    within a bounded budget.
//!
//! DUT and REF each own their state exclusively; the oracle only ever copies
//! snapshots across the boundary, never aliases them.

use std::fmt;

use tracing::error;

use crate::common::SimError;
use crate::common::constants::{CSR_COUNT, GPR_COUNT};
use crate::core::arch::CpuState;
use crate::core::arch::csr::CSR_NAMES;
use crate::isa::abi;

/// The `dlopen` bridge to an external reference shared object.
pub mod ffi;
/// The reference ABI and the in-process reference core.
pub mod reference;

pub use ffi::SharedObjectRef;
pub use reference::{Direction, LocalRef, RefTarget};

/// Comparison skip state of the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Compare after every retirement.
    Normal,
    /// Copy DUT state into REF instead of comparing, once.
    SkipRef,
    /// Comparison suspended for at most `remaining` retirements while REF
    /// catches up to the DUT's pc.
    CatchUp {
        /// Uncompared DUT retirements left before giving up.
        remaining: u32,
    },
}

/// What a successful oracle step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// REF was stepped and the states were compared.
    Compared,
    /// The comparison was suppressed (skip or catch-up in progress).
    Skipped,
}

/// The differential-testing oracle.
pub struct Difftest {
    target: Box<dyn RefTarget>,
    mode: Mode,
}

impl fmt::Debug for Difftest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Difftest").field("mode", &self.mode).finish()
    }
}

impl Difftest {
    /// Initializes the oracle: hands `port` to REF, mirrors the program
    /// image into REF's memory at `memory_base`, and copies the DUT's
    /// current register state into REF so both sides start identically.
    pub fn new(
        mut target: Box<dyn RefTarget>,
        image: &[u8],
        memory_base: u32,
        dut_state: &CpuState,
        port: i32,
    ) -> Self {
        target.init(port);
        let mut staging = image.to_vec();
        target.memcpy(memory_base, &mut staging, Direction::ToRef);
        let mut state = *dut_state;
        target.regcpy(&mut state, Direction::ToRef);
        Self {
            target,
            mode: Mode::Normal,
        }
    }

    /// Suppresses exactly one comparison, forcing REF into agreement with
    /// the DUT instead.
    ///
    /// Any pending catch-up budget is discarded.
    pub fn skip_ref(&mut self) {
        self.mode = Mode::SkipRef;
    }

    /// Steps REF forward `nr_ref` times immediately (uncompared) and arms a
    /// budget of `nr_dut` uncompared DUT retirements to resynchronize in.
    pub fn skip_dut(&mut self, nr_ref: u32, nr_dut: u32) {
        self.target.exec(u64::from(nr_ref));
        let carried = match self.mode {
            Mode::CatchUp { remaining } => remaining,
            Mode::Normal | Mode::SkipRef => 0,
        };
        self.mode = match carried + nr_dut {
            0 => Mode::Normal,
            remaining => Mode::CatchUp { remaining },
        };
    }

    /// Forwards an interrupt request to REF.
    pub fn raise_intr(&mut self, no: u32) {
        self.target.raise_intr(no);
    }

    /// Checks one DUT retirement that moved the pc from `pc` to `next_pc`.
    ///
    /// In the normal mode REF retires exactly one instruction and the full
    /// register state is compared.
    ///
    /// # Errors
    ///
    /// [`SimError::Divergence`] when the states disagree (a side-by-side
    /// register dump has been emitted), or [`SimError::CatchUpExhausted`]
    /// when the catch-up budget runs out before REF reaches `next_pc`. Both
    /// are unrecoverable.
    pub fn step(
        &mut self,
        dut: &CpuState,
        pc: u32,
        next_pc: u32,
    ) -> Result<StepOutcome, SimError> {
        match self.mode {
            Mode::CatchUp { remaining } => {
                let mut ref_state = CpuState::default();
                self.target.regcpy(&mut ref_state, Direction::ToDut);
                if ref_state.pc == next_pc {
                    self.mode = Mode::Normal;
                    check(&ref_state, dut, next_pc)?;
                    return Ok(StepOutcome::Compared);
                }
                let remaining = remaining - 1;
                if remaining == 0 {
                    return Err(SimError::CatchUpExhausted {
                        ref_pc: ref_state.pc,
                        pc,
                    });
                }
                self.mode = Mode::CatchUp { remaining };
                Ok(StepOutcome::Skipped)
            }
            Mode::SkipRef => {
                // To skip the checking of an instruction, just copy the DUT
                // register state into the reference design.
                let mut dut_copy = *dut;
                self.target.regcpy(&mut dut_copy, Direction::ToRef);
                self.mode = Mode::Normal;
                Ok(StepOutcome::Skipped)
            }
            Mode::Normal => {
                self.target.exec(1);
                let mut ref_state = CpuState::default();
                self.target.regcpy(&mut ref_state, Direction::ToDut);
                check(&ref_state, dut, pc)?;
                Ok(StepOutcome::Compared)
            }
        }
    }
}

/// Compares the two snapshots, dumping both sides on mismatch.
fn check(ref_state: &CpuState, dut: &CpuState, pc: u32) -> Result<(), SimError> {
    if ref_state == dut {
        return Ok(());
    }
    error!("DUT state diverged from REF at pc = {pc:#010x}");
    dump_divergence(ref_state, dut);
    Err(SimError::Divergence { pc })
}

/// Emits a side-by-side register dump, marking every mismatch.
fn dump_divergence(ref_state: &CpuState, dut: &CpuState) {
    eprintln!("{:>8} {:>12} {:>12}", "", "DUT", "REF");
    for i in 0..GPR_COUNT {
        let marker = if dut.gpr[i] == ref_state.gpr[i] {
            ""
        } else {
            " <-- mismatch"
        };
        eprintln!(
            "{:>8} {:#012x} {:#012x}{marker}",
            abi::name(i).unwrap_or("?"),
            dut.gpr[i],
            ref_state.gpr[i],
        );
    }
    let marker = if dut.pc == ref_state.pc {
        ""
    } else {
        " <-- mismatch"
    };
    eprintln!("{:>8} {:#012x} {:#012x}{marker}", "pc", dut.pc, ref_state.pc);
    for i in 0..CSR_COUNT {
        let marker = if dut.csr[i] == ref_state.csr[i] {
            ""
        } else {
            " <-- mismatch"
        };
        eprintln!(
            "{:>8} {:#012x} {:#012x}{marker}",
            CSR_NAMES[i], dut.csr[i], ref_state.csr[i],
        );
    }
}
