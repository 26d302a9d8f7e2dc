//! Simulation: the run loop and its collaborators.
//!
//! This module drives everything above the core:
//! 1. **Simulator:** The run-state machine that retires instructions, feeds
//!    the oracle, and decides the end-of-run verdict.
//! 2. **Loader:** Flat little-endian image loading.
//! 3. **Difftest:** The lockstep differential-testing oracle and the
//!    reference ABI behind it.

/// The differential-testing oracle and reference ABI.
pub mod difftest;
/// Flat program-image loading.
pub mod loader;
/// The run loop and run-state machine.
pub mod simulator;

pub use simulator::{RunState, Simulator};
