//! Minimal device regions.
//!
//! Device models proper live outside the core; what the core carries is the
//! region registration each device amounts to. Two are provided:
//! 1. **Serial:** A one-byte transmit port. Written bytes stream to stdout
//!    from the write callback, which observes the just-stored value.
//! 2. **RTC:** An eight-byte microsecond counter. The read callback refreshes
//!    the backing bytes before the raw load, so the guest always reads a
//!    fresh timestamp.

use std::io::Write;
use std::time::Instant;

use crate::soc::region::MmioRegion;

/// Size of the serial region in bytes.
const SERIAL_SIZE: u32 = 8;

/// Size of the RTC region in bytes (one 64-bit microsecond counter).
const RTC_SIZE: u32 = 8;

/// Builds the serial port region at `base`.
///
/// Writes to offset 0 emit the stored byte on stdout immediately.
pub fn serial(base: u32) -> MmioRegion {
    MmioRegion::new("serial", base, SERIAL_SIZE).with_callback(Box::new(
        |backing, offset, _len, is_write| {
            if is_write && offset == 0 {
                let byte = backing[0];
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(&[byte]);
                let _ = stdout.flush();
            }
        },
    ))
}

/// Builds the real-time clock region at `base`.
///
/// Reads latch the microseconds elapsed since the region was built into the
/// backing buffer as a little-endian 64-bit value.
pub fn rtc(base: u32) -> MmioRegion {
    let start = Instant::now();
    MmioRegion::new("rtc", base, RTC_SIZE).with_callback(Box::new(
        move |backing, _offset, _len, is_write| {
            if !is_write {
                let us = start.elapsed().as_micros() as u64;
                crate::soc::store_le(&mut backing[0..8], us);
            }
        },
    ))
}
