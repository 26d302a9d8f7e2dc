//! The bus: physical memory plus MMIO region routing.
//!
//! This module implements the address-space dispatcher. It performs:
//! 1. **Physical memory:** Direct little-endian access to an owned,
//!    bounds-checked byte buffer at a fixed base — no callbacks, no pointer
//!    aliasing with the region views.
//! 2. **Region routing:** A linear scan over registered regions in
//!    registration order, first hit wins; a hit sets the device-access flag
//!    the simulation loop consumes to drive the oracle's `skip_ref`.
//! 3. **Registration:** A pairwise interval-overlap check run at
//!    registration time; overlapping a previous region or physical memory is
//!    a fatal configuration error detected before any instruction executes.

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::soc::region::MmioRegion;
use crate::soc::{load_le, store_le};

/// A failure inside the address-space dispatcher.
///
/// Configuration variants (`RegionOverlap`, `InvalidRegionBounds`,
/// `ImageTooLarge`) are detected before execution starts; the access
/// variants end the run when raised while executing.
#[derive(Debug, Error)]
pub enum BusError {
    /// The access width is not one of 1, 2, 4, or 8 bytes.
    #[error("access width {len} is unsupported (must be 1, 2, 4, or 8)")]
    InvalidAccessWidth {
        /// The rejected width.
        len: usize,
    },

    /// The address hit neither physical memory nor any registered region.
    #[error("address {addr:#010x} is outside every mapped region")]
    UnmappedAddress {
        /// The offending address.
        addr: u32,
    },

    /// The access starts inside a region but runs past its upper bound.
    #[error("access at {addr:#010x} overruns region '{name}'")]
    RegionOverrun {
        /// Name of the region the access started in.
        name: String,
        /// The offending address.
        addr: u32,
    },

    /// The new region intersects physical memory or an existing region.
    #[error(
        "region '{name}' [{low:#010x}, {high:#010x}] overlaps \
         '{other}' [{other_low:#010x}, {other_high:#010x}]"
    )]
    RegionOverlap {
        /// Name of the rejected region.
        name: String,
        /// Lower bound of the rejected region.
        low: u32,
        /// Upper bound of the rejected region.
        high: u32,
        /// Name of the existing claimant (`"pmem"` for physical memory).
        other: String,
        /// Lower bound of the existing claimant.
        other_low: u32,
        /// Upper bound of the existing claimant.
        other_high: u32,
    },

    /// The new region's bounds are inverted or empty.
    #[error("region '{name}' has invalid bounds [{low:#010x}, {high:#010x}]")]
    InvalidRegionBounds {
        /// Name of the rejected region.
        name: String,
        /// Lower bound of the rejected region.
        low: u32,
        /// Upper bound of the rejected region.
        high: u32,
    },

    /// The program image does not fit in physical memory.
    #[error("image ({size} bytes) does not fit in physical memory ({capacity} bytes)")]
    ImageTooLarge {
        /// Size of the rejected image.
        size: usize,
        /// Capacity of physical memory.
        capacity: usize,
    },
}

/// The address-space dispatcher: physical memory plus MMIO regions.
pub struct Bus {
    memory: Vec<u8>,
    memory_base: u32,
    regions: Vec<MmioRegion>,
    device_access: bool,
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("memory_base", &format_args!("{:#010x}", self.memory_base))
            .field("memory_size", &self.memory.len())
            .field("regions", &self.regions)
            .finish()
    }
}

impl Bus {
    /// Creates a bus with zeroed physical memory and no regions.
    pub fn new(memory_base: u32, memory_size: usize) -> Self {
        Self {
            memory: vec![0; memory_size],
            memory_base,
            regions: Vec::new(),
            device_access: false,
        }
    }

    /// Returns the base physical address of main memory.
    pub fn memory_base(&self) -> u32 {
        self.memory_base
    }

    /// Returns the size of main memory in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.len()
    }

    /// Returns `true` if `addr` falls inside physical memory.
    #[inline(always)]
    pub fn contains_memory(&self, addr: u32) -> bool {
        (addr.wrapping_sub(self.memory_base) as usize) < self.memory.len()
    }

    /// Registers a device region.
    ///
    /// # Errors
    ///
    /// Rejects, fatally, a region with inverted bounds or one whose
    /// `[low, high]` intersects physical memory or any previously registered
    /// region. Region ranges are fixed after registration.
    pub fn add_region(&mut self, region: MmioRegion) -> Result<(), BusError> {
        if region.low() > region.high() {
            return Err(BusError::InvalidRegionBounds {
                name: region.name().to_owned(),
                low: region.low(),
                high: region.high(),
            });
        }

        let pmem_high = self.memory_base + (self.memory.len() as u32) - 1;
        if region.low() <= pmem_high && region.high() >= self.memory_base {
            return Err(BusError::RegionOverlap {
                name: region.name().to_owned(),
                low: region.low(),
                high: region.high(),
                other: "pmem".to_owned(),
                other_low: self.memory_base,
                other_high: pmem_high,
            });
        }

        for existing in &self.regions {
            if region.low() <= existing.high() && region.high() >= existing.low() {
                return Err(BusError::RegionOverlap {
                    name: region.name().to_owned(),
                    low: region.low(),
                    high: region.high(),
                    other: existing.name().to_owned(),
                    other_low: existing.low(),
                    other_high: existing.high(),
                });
            }
        }

        info!(
            "mapped device region '{}' at [{:#010x}, {:#010x}]",
            region.name(),
            region.low(),
            region.high()
        );
        self.regions.push(region);
        Ok(())
    }

    /// Reads `len` bytes little-endian at `addr`.
    ///
    /// Physical memory is accessed directly; otherwise the first region
    /// containing `addr` (in registration order) serves the access and the
    /// device-access flag is set.
    ///
    /// # Errors
    ///
    /// Fatal on a width outside {1, 2, 4, 8}, an unmapped address, or an
    /// access that overruns its region or physical memory.
    pub fn read(&mut self, addr: u32, len: usize) -> Result<u64, BusError> {
        check_width(len)?;
        if self.contains_memory(addr) {
            let offset = (addr - self.memory_base) as usize;
            let end = offset + len;
            if end > self.memory.len() {
                return Err(BusError::UnmappedAddress { addr });
            }
            return Ok(load_le(&self.memory[offset..end]));
        }

        self.device_access = true;
        let region = find_region(&mut self.regions, addr)?;
        if !region.contains_access(addr, len) {
            return Err(BusError::RegionOverrun {
                name: region.name().to_owned(),
                addr,
            });
        }
        Ok(region.read(addr, len))
    }

    /// Writes `len` bytes of `data` little-endian at `addr`.
    ///
    /// Routing and failure modes mirror [`Bus::read`].
    ///
    /// # Errors
    ///
    /// Fatal on a width outside {1, 2, 4, 8}, an unmapped address, or an
    /// access that overruns its region or physical memory.
    pub fn write(&mut self, addr: u32, len: usize, data: u64) -> Result<(), BusError> {
        check_width(len)?;
        if self.contains_memory(addr) {
            let offset = (addr - self.memory_base) as usize;
            let end = offset + len;
            if end > self.memory.len() {
                return Err(BusError::UnmappedAddress { addr });
            }
            store_le(&mut self.memory[offset..end], data);
            return Ok(());
        }

        self.device_access = true;
        let region = find_region(&mut self.regions, addr)?;
        if !region.contains_access(addr, len) {
            return Err(BusError::RegionOverrun {
                name: region.name().to_owned(),
                addr,
            });
        }
        region.write(addr, len, data);
        Ok(())
    }

    /// Copies a byte blob verbatim into physical memory at the base address.
    ///
    /// # Errors
    ///
    /// Fatal if the blob is larger than physical memory.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), BusError> {
        if image.len() > self.memory.len() {
            return Err(BusError::ImageTooLarge {
                size: image.len(),
                capacity: self.memory.len(),
            });
        }
        self.memory[..image.len()].copy_from_slice(image);
        Ok(())
    }

    /// Returns and clears the device-access flag.
    ///
    /// Set whenever a read or write was served by a region rather than
    /// physical memory; the simulation loop uses it to suppress the
    /// reference comparison for MMIO-touching instructions.
    pub fn take_device_access(&mut self) -> bool {
        std::mem::take(&mut self.device_access)
    }
}

/// Validates the access width.
fn check_width(len: usize) -> Result<(), BusError> {
    match len {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(BusError::InvalidAccessWidth { len }),
    }
}

/// Returns the first region containing `addr`, in registration order.
fn find_region(regions: &mut [MmioRegion], addr: u32) -> Result<&mut MmioRegion, BusError> {
    regions
        .iter_mut()
        .find(|region| region.contains(addr))
        .ok_or(BusError::UnmappedAddress { addr })
}
