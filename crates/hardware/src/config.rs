//! Configuration system for the simulator.
//!
//! This module defines the configuration structures used to parameterize a
//! simulation run. It provides:
//! 1. **Defaults:** Baseline machine constants (memory window, device bases,
//!    difftest port).
//! 2. **Structures:** Hierarchical config for the system, devices, and the
//!    differential-testing oracle.
//!
//! Configuration is supplied as JSON (`Config::from_json_file`) or use
//! `Config::default()` for the CLI and tests.

use std::fs;

use serde::Deserialize;

use crate::common::SimError;
use crate::common::constants;

/// Default configuration constants for the simulator.
///
/// These values define the baseline machine when not explicitly overridden
/// in a JSON configuration file.
mod defaults {
    /// Base address of the serial port MMIO region.
    pub const SERIAL_BASE: u32 = 0xA000_03F8;

    /// Base address of the real-time clock MMIO region.
    pub const RTC_BASE: u32 = 0xA000_0048;

    /// Default port handed to the reference implementation at init.
    pub const DIFFTEST_PORT: i32 = 1234;
}

/// System-level configuration: the physical memory window and device bases.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Base physical address of main memory.
    pub memory_base: u32,
    /// Size of main memory in bytes.
    pub memory_size: usize,
    /// Register the serial and RTC device regions at start-up.
    pub devices: bool,
    /// Base address of the serial port region.
    pub serial_base: u32,
    /// Base address of the real-time clock region.
    pub rtc_base: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            memory_base: constants::MEMORY_BASE,
            memory_size: constants::MEMORY_SIZE,
            devices: false,
            serial_base: defaults::SERIAL_BASE,
            rtc_base: defaults::RTC_BASE,
        }
    }
}

/// Differential-testing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DifftestConfig {
    /// Drive a reference implementation in lockstep and compare state.
    pub enabled: bool,
    /// Path to a NEMU-compatible reference shared object. When absent, an
    /// in-process reference core is used instead.
    pub ref_so: Option<String>,
    /// Port handed to the reference implementation's `init` entry point.
    pub port: i32,
}

impl Default for DifftestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ref_so: None,
            port: defaults::DIFFTEST_PORT,
        }
    }
}

/// Root configuration for a simulation run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Physical memory window and device bases.
    pub system: SystemConfig,
    /// Differential-testing oracle settings.
    pub difftest: DifftestConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if the file cannot be read or does not
    /// parse as a `Config`.
    pub fn from_json_file(path: &str) -> Result<Self, SimError> {
        let text = fs::read_to_string(path).map_err(|e| SimError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| SimError::Config {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }
}
