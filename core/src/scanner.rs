//! Signature scan over the firmware search window.
//!
//! The marker is not guaranteed to be aligned. The window is walked in
//! 16-byte strides once for every byte phase 0..16, so every start offset is
//! visited exactly once.

use bbapi_lib::{klog_debug, klog_info};
use bbapi_mm::{MemoryHost, WindowMapping};

use crate::config::SearchConfig;
use crate::error::{BridgeResult, DiscoveryFailure};
use crate::shadow::{FirmwareImage, shadow_image};

/// `"BBIOSAPI"` read as two little-endian words.
#[cfg(target_arch = "x86")]
pub const BBAPI_SIGNATURE: u64 = 0x4950_4153_4F49_4242;

/// `"BBAPIX64"` read as two little-endian words.
#[cfg(not(target_arch = "x86"))]
pub const BBAPI_SIGNATURE: u64 = 0x3436_5849_5041_4242;

pub const SCAN_STRIDE: usize = 0x10;

/// Offset of the first `signature` match in `window`, phase-major.
pub fn find_signature<H: MemoryHost + ?Sized>(
    window: &WindowMapping<'_, H>,
    signature: u64,
) -> Option<usize> {
    let len = window.size();
    if len < SCAN_STRIDE {
        return None;
    }
    let last = len - SCAN_STRIDE;

    for phase in 0..SCAN_STRIDE {
        let mut pos = phase;
        while pos <= last {
            let (Ok(low), Ok(high)) = (window.read_u32_le(pos), window.read_u32_le(pos + 4)) else {
                break;
            };
            if (u64::from(high) << 32 | u64::from(low)) == signature {
                klog_debug!("bbapi: signature at +{:#x} (phase {})", pos, phase);
                return Some(pos);
            }
            pos += SCAN_STRIDE;
        }
    }
    None
}

/// Map the configured window, find the firmware and shadow it.
///
/// The window is unmapped before returning on every path.
pub fn discover<H: MemoryHost + ?Sized>(
    host: &H,
    config: &SearchConfig,
) -> BridgeResult<FirmwareImage> {
    config.validate()?;

    let window = WindowMapping::map(host, config.phys_base, config.window_len)
        .map_err(DiscoveryFailure::Window)?;
    let Some(offset) = find_signature(&window, BBAPI_SIGNATURE) else {
        klog_info!(
            "bbapi: no firmware in {:#x} + {:#x}",
            config.phys_base,
            config.window_len
        );
        return Err(DiscoveryFailure::NotFound {
            phys: config.phys_base,
            len: config.window_len,
        }
        .into());
    };

    shadow_image(host, &window, offset)
}
