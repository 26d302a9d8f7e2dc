//! Flat program-image loading.
//!
//! Images are flat little-endian byte blobs copied verbatim to the base of
//! physical memory before simulation starts. The returned size is what the
//! oracle later mirrors into the reference implementation.

use std::fs;

use tracing::info;

use crate::common::SimError;
use crate::soc::Bus;

/// Reads `path` and copies its bytes to the base of physical memory.
///
/// Returns the image so the caller can hand it to the oracle, which must
/// mirror the same bytes into REF at init.
///
/// # Errors
///
/// Fatal if the file cannot be read or does not fit in physical memory.
pub fn load_image(bus: &mut Bus, path: &str) -> Result<Vec<u8>, SimError> {
    let image = fs::read(path).map_err(|source| SimError::Image {
        path: path.to_owned(),
        source,
    })?;
    bus.load_image(&image)?;
    info!(path, size = image.len(), "loaded program image");
    Ok(image)
}
