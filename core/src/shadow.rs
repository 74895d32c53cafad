//! Shadow copy of the firmware into executable RAM.
//!
//! The signature is followed by a 32-bit little-endian field holding the
//! offset of the entry function. The entry sits at most one page before the
//! end of the image, so the image spans `field + 4096` bytes from the start
//! of the signature.

use core::fmt;

use bbapi_abi::PhysAddr;
use bbapi_lib::klog_info;
use bbapi_mm::{ExecAllocation, ExecRegion, MemoryHost, WindowMapping};

use crate::bridge::EntryPoint;
use crate::error::{BridgeError, BridgeResult, DiscoveryFailure};

/// Distance from the signature to the entry offset field.
pub const LENGTH_FIELD_OFFSET: usize = 8;

/// Bytes of image past the entry offset.
pub const IMAGE_TAIL: usize = 4096;

/// Location and size of a loaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageInfo {
    /// Physical address of the signature.
    pub phys: PhysAddr,
    /// Offset of the signature inside the search window.
    pub window_offset: usize,
    pub size: usize,
    pub entry_offset: usize,
}

impl fmt::Display for ImageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:#x} (+{:#x}) size {:#x} entry +{:#x}",
            self.phys, self.window_offset, self.size, self.entry_offset
        )
    }
}

/// The shadowed firmware. Immutable once built.
#[derive(Debug)]
pub struct FirmwareImage {
    info: ImageInfo,
    region: ExecRegion,
    entry: EntryPoint,
}

impl FirmwareImage {
    #[inline]
    pub fn info(&self) -> ImageInfo {
        self.info
    }

    #[inline]
    pub fn entry(&self) -> EntryPoint {
        self.entry
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.region.as_slice()
    }

    #[inline]
    pub fn region(&self) -> &ExecRegion {
        &self.region
    }

    /// # Safety
    ///
    /// `host` must be the host the image was loaded with and no firmware
    /// call may be in progress.
    pub unsafe fn release<H: MemoryHost + ?Sized>(self, host: &H) {
        unsafe { self.region.release(host) };
    }
}

/// Size of the image whose signature starts at `offset`, checked against the
/// window.
pub fn image_extent<H: MemoryHost + ?Sized>(
    window: &WindowMapping<'_, H>,
    offset: usize,
) -> BridgeResult<(usize, usize)> {
    let field_at = offset
        .checked_add(LENGTH_FIELD_OFFSET)
        .ok_or(DiscoveryFailure::LengthOverflow { field: 0 })?;
    let field = window
        .read_u32_le(field_at)
        .map_err(DiscoveryFailure::Window)?;
    let entry_offset = field as usize;
    let size = entry_offset
        .checked_add(IMAGE_TAIL)
        .ok_or(DiscoveryFailure::LengthOverflow { field })?;
    if !window.is_valid_offset(offset, size) {
        return Err(DiscoveryFailure::ImageOutOfWindow {
            offset,
            size,
            window: window.size(),
        }
        .into());
    }
    Ok((entry_offset, size))
}

/// Copy the image at `offset` of `window` into a new executable region.
///
/// Nothing stays allocated on failure.
pub fn shadow_image<H: MemoryHost + ?Sized>(
    host: &H,
    window: &WindowMapping<'_, H>,
    offset: usize,
) -> BridgeResult<FirmwareImage> {
    let (entry_offset, size) = image_extent(window, offset)?;

    let mut alloc = ExecAllocation::allocate(host, size).map_err(BridgeError::Resource)?;
    alloc.make_executable().map_err(BridgeError::Resource)?;
    debug_assert!(alloc.is_executable());
    window
        .copy_out(offset, alloc.as_mut_slice())
        .map_err(DiscoveryFailure::Window)?;
    let region = alloc.commit();

    let Some(entry_ptr) = region.at(entry_offset) else {
        // SAFETY: nothing has run from the region yet.
        unsafe { region.release(host) };
        return Err(DiscoveryFailure::LengthOverflow {
            field: entry_offset as u32,
        }
        .into());
    };
    // SAFETY: the region holds the firmware copied verbatim and stays
    // executable until released together with the image.
    let entry = unsafe { EntryPoint::new(entry_ptr) };

    let info = ImageInfo {
        phys: window
            .phys_base()
            .checked_offset(offset as u64)
            .unwrap_or(window.phys_base()),
        window_offset: offset,
        size,
        entry_offset,
    };
    klog_info!("bbapi: shadowed firmware {}", info);

    Ok(FirmwareImage {
        info,
        region,
        entry,
    })
}
