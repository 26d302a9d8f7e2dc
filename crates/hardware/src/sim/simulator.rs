//! The run loop and run-state machine.
//!
//! `Simulator` owns the DUT hart, the optional oracle, and the run state. It
//! performs the following per retirement:
//! 1. **Step:** Asks the hart to retire one instruction.
//! 2. **Skip:** If the instruction touched a device region, arms the
//!    oracle's one-shot `skip_ref`.
//! 3. **Compare:** Hands the `(pc, next_pc)` pair to the oracle, which
//!    replays the instruction on REF and compares state.
//!
//! An `ebreak` halt is the designed termination path; divergence, illegal
//! instructions, and bus faults abort the run. Nothing is retried.

use tracing::error;

use crate::common::SimError;
use crate::core::cpu::{Cpu, StepResult};
use crate::sim::difftest::{Difftest, StepOutcome};
use crate::stats::Stats;

/// State of the simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The loop is retiring instructions.
    Running,
    /// The loop stopped on request (debug console) and can resume.
    Stop,
    /// The program halted through `ebreak`.
    End,
    /// A fatal error ended the run.
    Abort,
    /// The user asked to quit.
    Quit,
}

/// Top-level simulator: DUT hart + oracle + run state.
#[derive(Debug)]
pub struct Simulator {
    /// The device-under-test hart.
    pub cpu: Cpu,
    /// Run counters.
    pub stats: Stats,
    difftest: Option<Difftest>,
    state: RunState,
    halt_pc: u32,
    halt_code: u32,
}

impl Simulator {
    /// Creates a simulator around an initialized hart, in the `Stop` state.
    pub fn new(cpu: Cpu) -> Self {
        Self {
            cpu,
            stats: Stats::new(),
            difftest: None,
            state: RunState::Stop,
            halt_pc: 0,
            halt_code: 0,
        }
    }

    /// Attaches the differential-testing oracle.
    ///
    /// The oracle must have been initialized from this simulator's image and
    /// register state so both sides start identically.
    pub fn attach_difftest(&mut self, oracle: Difftest) {
        self.difftest = Some(oracle);
    }

    /// Returns the current run state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Marks the run as quit; subsequent `exec` calls do nothing.
    pub fn quit(&mut self) {
        self.state = RunState::Quit;
    }

    /// Retires up to `n` instructions.
    ///
    /// This is also the debug console's single-step-N entry point. Returns
    /// early on halt, abort, or quit; prints the end-of-run verdict when the
    /// run finishes.
    pub fn exec(&mut self, n: u64) {
        match self.state {
            RunState::End | RunState::Abort | RunState::Quit => {
                println!("[sim] the run has ended; nothing left to execute");
                return;
            }
            RunState::Running | RunState::Stop => self.state = RunState::Running,
        }

        for _ in 0..n {
            self.exec_once();
            if self.state != RunState::Running {
                break;
            }
        }

        match self.state {
            RunState::Running => self.state = RunState::Stop,
            RunState::End | RunState::Abort => self.report_verdict(),
            RunState::Stop | RunState::Quit => {}
        }
    }

    /// Retires one instruction and drives the oracle.
    fn exec_once(&mut self) {
        match self.cpu.step() {
            Ok(StepResult::Retired {
                pc,
                next_pc,
                device_access,
            }) => {
                self.stats.instructions += 1;
                if let Some(oracle) = self.difftest.as_mut() {
                    if device_access {
                        oracle.skip_ref();
                    }
                    match oracle.step(&self.cpu.state(), pc, next_pc) {
                        Ok(StepOutcome::Compared) => self.stats.comparisons += 1,
                        Ok(StepOutcome::Skipped) => self.stats.skipped += 1,
                        Err(e) => {
                            error!("{e}");
                            eprintln!("[sim] {e}");
                            self.state = RunState::Abort;
                            self.halt_pc = pc;
                        }
                    }
                }
            }
            Ok(StepResult::Halted { pc, code }) => {
                self.stats.instructions += 1;
                self.state = RunState::End;
                self.halt_pc = pc;
                self.halt_code = code;
            }
            Err(e) => {
                error!("{e}");
                eprintln!("[sim] {e}");
                self.state = RunState::Abort;
                self.halt_pc = self.cpu.pc;
            }
        }
    }

    /// Prints the end-of-run verdict.
    fn report_verdict(&self) {
        match self.state {
            RunState::End if self.halt_code == 0 => {
                println!("[sim] HIT GOOD TRAP at pc = {:#010x}", self.halt_pc);
            }
            RunState::End => {
                println!(
                    "[sim] HIT BAD TRAP at pc = {:#010x}, exit code {}",
                    self.halt_pc, self.halt_code
                );
            }
            _ => {
                println!("[sim] ABORT at pc = {:#010x}", self.halt_pc);
            }
        }
    }

    /// Maps the run outcome to a process exit status.
    ///
    /// Zero only for a clean `ebreak` halt with a zero result register;
    /// non-zero for bad traps, aborts, and unfinished runs.
    pub fn exit_code(&self) -> i32 {
        match self.state {
            RunState::End if self.halt_code == 0 => 0,
            _ => 1,
        }
    }

    /// Looks up a register (or `"pc"`) by name — debug console accessor.
    pub fn reg_by_name(&self, name: &str) -> Option<u32> {
        self.cpu.reg_by_name(name)
    }

    /// Reads `len` bytes at `addr` — debug console accessor.
    ///
    /// # Errors
    ///
    /// Fatal on an unmapped address or unsupported width, like any other
    /// bus access.
    pub fn read_mem(&mut self, addr: u32, len: usize) -> Result<u64, SimError> {
        let pc = self.cpu.pc;
        self.cpu
            .bus
            .read(addr, len)
            .map_err(|e| SimError::bus(pc, e))
    }
}
