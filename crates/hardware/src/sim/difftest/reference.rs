//! The reference ABI and the in-process reference core.
//!
//! A reference implementation is reached through a narrow five-call
//! contract; the contract, not the loading mechanism, is load-bearing. Two
//! realizations exist:
//! 1. **[`LocalRef`]:** A second, independently owned hart in this process —
//!    the default REF and the one the test-suite uses.
//! 2. **[`super::SharedObjectRef`]:** A bridge to an external
//!    NEMU-compatible shared object.

use crate::config::Config;
use crate::core::arch::CpuState;
use crate::core::cpu::{Cpu, StepResult};
use crate::soc::Bus;

/// Direction of a state copy across the oracle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Copy out of REF (REF -> DUT-side buffer).
    ToDut,
    /// Copy into REF (DUT-side buffer -> REF).
    ToRef,
}

/// The reference implementation behind the oracle.
///
/// An opaque, independently evolving state machine: the oracle only moves
/// memory and register snapshots across this boundary and asks it to retire
/// instructions.
pub trait RefTarget {
    /// One-time initialization; `port` is an opaque channel identifier.
    fn init(&mut self, port: i32);

    /// Copies `buf` into REF memory at `addr` (`ToRef`) or REF memory at
    /// `addr` into `buf` (`ToDut`).
    fn memcpy(&mut self, addr: u32, buf: &mut [u8], direction: Direction);

    /// Copies `state` into REF (`ToRef`) or REF's register state into
    /// `state` (`ToDut`).
    fn regcpy(&mut self, state: &mut CpuState, direction: Direction);

    /// Retires `n` instructions on REF.
    fn exec(&mut self, n: u64);

    /// Raises interrupt `no` on REF.
    fn raise_intr(&mut self, no: u32);
}

/// An in-process reference core: a second hart with its own memory.
#[derive(Debug)]
pub struct LocalRef {
    cpu: Cpu,
}

impl LocalRef {
    /// Creates a reference hart with its own zeroed physical memory and no
    /// device regions.
    pub fn new(config: &Config) -> Self {
        let bus = Bus::new(config.system.memory_base, config.system.memory_size);
        Self { cpu: Cpu::new(bus) }
    }
}

impl RefTarget for LocalRef {
    fn init(&mut self, _port: i32) {}

    fn memcpy(&mut self, addr: u32, buf: &mut [u8], direction: Direction) {
        match direction {
            Direction::ToRef => {
                for (i, byte) in buf.iter().enumerate() {
                    let _ = self.cpu.bus.write(addr + i as u32, 1, u64::from(*byte));
                }
            }
            Direction::ToDut => {
                for (i, byte) in buf.iter_mut().enumerate() {
                    *byte = self
                        .cpu
                        .bus
                        .read(addr + i as u32, 1)
                        .map_or(0, |value| value as u8);
                }
            }
        }
    }

    fn regcpy(&mut self, state: &mut CpuState, direction: Direction) {
        match direction {
            Direction::ToRef => self.cpu.set_state(state),
            Direction::ToDut => *state = self.cpu.state(),
        }
    }

    fn exec(&mut self, n: u64) {
        for _ in 0..n {
            match self.cpu.step() {
                Ok(StepResult::Retired { .. }) => {}
                // A halted or faulted REF stops evolving; the oracle will
                // observe the stale pc and report the mismatch.
                Ok(StepResult::Halted { .. }) | Err(_) => break,
            }
        }
    }

    fn raise_intr(&mut self, no: u32) {
        let epc = self.cpu.pc;
        let handler = self.cpu.raise_trap(no, epc, 0);
        self.cpu.pc = handler;
    }
}
