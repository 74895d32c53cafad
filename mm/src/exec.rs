//! Owned executable regions.
//!
//! [`ExecAllocation`] is the in-construction form: it frees itself on drop
//! unless committed. [`ExecRegion`] is the committed form, which the owner
//! must hand back to the host with [`ExecRegion::release`].

use core::ptr::NonNull;

use crate::error::{MmError, MmResult};
use crate::host::{MemoryHost, Protection};

/// A committed executable region.
#[derive(Debug)]
pub struct ExecRegion {
    base: NonNull<u8>,
    len: usize,
}

// SAFETY: the region is exclusively owned memory; nothing about it is tied
// to the thread that allocated it.
unsafe impl Send for ExecRegion {}
unsafe impl Sync for ExecRegion {}

impl ExecRegion {
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns true if `addr` lies inside the region.
    #[inline]
    pub fn contains(&self, addr: *const u8) -> bool {
        let start = self.base.as_ptr() as usize;
        let addr = addr as usize;
        addr >= start && addr - start < self.len
    }

    /// Pointer `offset` bytes into the region, if in bounds.
    #[inline]
    pub fn at(&self, offset: usize) -> Option<NonNull<u8>> {
        if offset < self.len {
            // SAFETY: offset < len keeps the pointer inside the allocation.
            Some(unsafe { self.base.add(offset) })
        } else {
            None
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: an ExecRegion only exists for a live, readable allocation
        // of `len` bytes that no one else writes.
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), self.len) }
    }

    /// Return the memory to the host.
    ///
    /// # Safety
    ///
    /// `host` must be the host the region was allocated from, and no
    /// firmware call may be executing from the region.
    pub unsafe fn release<H: MemoryHost + ?Sized>(self, host: &H) {
        unsafe { host.free_region(self.base, self.len) };
    }
}

/// A region being filled. Frees itself on drop unless committed.
pub struct ExecAllocation<'h, H: MemoryHost + ?Sized> {
    host: &'h H,
    base: NonNull<u8>,
    len: usize,
    executable: bool,
}

impl<'h, H: MemoryHost + ?Sized> ExecAllocation<'h, H> {
    pub fn allocate(host: &'h H, len: usize) -> MmResult<Self> {
        if len == 0 {
            return Err(MmError::NoMemory { len });
        }
        let base = host.alloc_region(len)?;
        Ok(Self {
            host,
            base,
            len,
            executable: false,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_executable(&self) -> bool {
        self.executable
    }

    /// Grant execute permission while keeping the region writable.
    pub fn make_executable(&mut self) -> MmResult {
        // SAFETY: base/len describe the live allocation owned by self.
        unsafe { self.host.protect_region(self.base, self.len, Protection::RWX)? };
        self.executable = true;
        Ok(())
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: exclusively owned, writable, `len` bytes long.
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.len) }
    }

    /// Stop tracking the allocation and hand ownership to an [`ExecRegion`].
    pub fn commit(self) -> ExecRegion {
        let region = ExecRegion {
            base: self.base,
            len: self.len,
        };
        core::mem::forget(self);
        region
    }
}

impl<H: MemoryHost + ?Sized> Drop for ExecAllocation<'_, H> {
    fn drop(&mut self) {
        // SAFETY: exclusively owned; nothing has been executed from it yet.
        unsafe { self.host.free_region(self.base, self.len) };
    }
}
