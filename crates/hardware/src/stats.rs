//! Simulation statistics collection and reporting.
//!
//! A small counter block updated by the run loop and reported at the end of
//! a run.

use std::time::Instant;

/// Counters for one simulation run.
#[derive(Debug)]
pub struct Stats {
    /// Instructions retired by the DUT.
    pub instructions: u64,
    /// Reference comparisons performed by the oracle.
    pub comparisons: u64,
    /// Comparisons suppressed by `skip_ref` / catch-up.
    pub skipped: u64,
    start: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Creates a zeroed counter block, stamping the start time.
    pub fn new() -> Self {
        Self {
            instructions: 0,
            comparisons: 0,
            skipped: 0,
            start: Instant::now(),
        }
    }

    /// Prints the end-of-run summary to stdout.
    pub fn report(&self) {
        let elapsed = self.start.elapsed();
        let secs = elapsed.as_secs_f64();
        let ips = if secs > 0.0 {
            (self.instructions as f64 / secs) as u64
        } else {
            0
        };
        println!(
            "[stats] {} instructions in {:.3}s ({} inst/s), {} compared, {} skipped",
            self.instructions, secs, ips, self.comparisons, self.skipped
        );
    }
}
