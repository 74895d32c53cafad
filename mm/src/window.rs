//! Bounds-checked, read-only view of a mapped physical window.
//!
//! The window is unmapped when the [`WindowMapping`] is dropped, so every
//! exit path of a scan releases it.

use core::ptr::{self, NonNull, read_volatile};

use bbapi_abi::PhysAddr;
use bbapi_lib::klog_debug;

use crate::error::{MmError, MmResult};
use crate::host::MemoryHost;

pub struct WindowMapping<'h, H: MemoryHost + ?Sized> {
    host: &'h H,
    base: NonNull<u8>,
    phys_base: PhysAddr,
    size: usize,
}

impl<'h, H: MemoryHost + ?Sized> WindowMapping<'h, H> {
    /// Map `size` bytes of physical memory at `phys`.
    pub fn map(host: &'h H, phys: PhysAddr, size: usize) -> MmResult<Self> {
        if phys.is_null() || size == 0 {
            return Err(MmError::InvalidRange { phys, len: size });
        }
        if phys.checked_offset(size as u64).is_none() {
            return Err(MmError::InvalidRange { phys, len: size });
        }

        let base = host.map_phys(phys, size)?;
        klog_debug!("mm: mapped window {:#x} + {:#x}", phys, size);
        Ok(Self {
            host,
            base,
            phys_base: phys,
            size,
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn phys_base(&self) -> PhysAddr {
        self.phys_base
    }

    #[inline]
    pub fn is_valid_offset(&self, offset: usize, access_size: usize) -> bool {
        offset
            .checked_add(access_size)
            .is_some_and(|end| end <= self.size)
    }

    #[inline]
    fn check(&self, offset: usize, len: usize) -> MmResult {
        if self.is_valid_offset(offset, len) {
            Ok(())
        } else {
            Err(MmError::OutOfBounds {
                offset,
                len,
                size: self.size,
            })
        }
    }

    #[cfg(test)]
    pub(crate) fn read_u8(&self, offset: usize) -> MmResult<u8> {
        self.check(offset, 1)?;
        // SAFETY: offset is inside the live mapping.
        Ok(unsafe { read_volatile(self.base.as_ptr().add(offset)) })
    }

    /// Read a little-endian u32 at any byte offset.
    ///
    /// Assembled from single-byte reads so that unaligned offsets never
    /// produce an unaligned access.
    pub fn read_u32_le(&self, offset: usize) -> MmResult<u32> {
        self.check(offset, 4)?;
        let mut raw = [0u8; 4];
        for (i, byte) in raw.iter_mut().enumerate() {
            // SAFETY: offset + i < offset + 4 <= size.
            *byte = unsafe { read_volatile(self.base.as_ptr().add(offset + i)) };
        }
        Ok(u32::from_le_bytes(raw))
    }

    /// Copy `dst.len()` bytes starting at `offset` out of the window.
    pub fn copy_out(&self, offset: usize, dst: &mut [u8]) -> MmResult {
        self.check(offset, dst.len())?;
        if dst.is_empty() {
            return Ok(());
        }
        // SAFETY: the source range was bounds-checked; `dst` is a distinct
        // Rust allocation and cannot overlap a live read-only mapping.
        unsafe {
            ptr::copy_nonoverlapping(self.base.as_ptr().add(offset), dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }
}

impl<H: MemoryHost + ?Sized> Drop for WindowMapping<'_, H> {
    fn drop(&mut self) {
        // SAFETY: base/size come from `map_phys`; reads never hand out
        // references into the mapping.
        unsafe { self.host.unmap_phys(self.base, self.size) };
        klog_debug!("mm: unmapped window {:#x}", self.phys_base);
    }
}
