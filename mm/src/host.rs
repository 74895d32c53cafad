//! Host memory primitives.
//!
//! A [`MemoryHost`] is the only place that creates or destroys mappings.
//! Implementations exist for the Linux userspace host (`bbapi-host`) and for
//! the test fixtures; a kernel port supplies its own.

use core::ptr::NonNull;

use bitflags::bitflags;

use bbapi_abi::PhysAddr;

use crate::error::MmResult;

bitflags! {
    /// Access rights of an allocated region.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Protection: u32 {
        const READ  = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC  = 1 << 2;

        const RW  = Self::READ.bits() | Self::WRITE.bits();
        const RWX = Self::READ.bits() | Self::WRITE.bits() | Self::EXEC.bits();
    }
}

/// Platform memory services the bridge depends on.
///
/// # Contract
///
/// - `map_phys` returns a pointer valid for reads of `len` bytes until the
///   matching `unmap_phys`.
/// - `alloc_region` returns a read/write region of at least `len` bytes that
///   stays valid until `free_region`.
/// - `protect_region` changes the rights of a whole region returned by
///   `alloc_region`.
pub trait MemoryHost: Send + Sync {
    fn map_phys(&self, phys: PhysAddr, len: usize) -> MmResult<NonNull<u8>>;

    /// # Safety
    ///
    /// `base` and `len` must come from a successful `map_phys` on this host,
    /// and no reference into the mapping may outlive this call.
    unsafe fn unmap_phys(&self, base: NonNull<u8>, len: usize);

    fn alloc_region(&self, len: usize) -> MmResult<NonNull<u8>>;

    /// # Safety
    ///
    /// `base` and `len` must describe a live region from `alloc_region`.
    unsafe fn protect_region(&self, base: NonNull<u8>, len: usize, prot: Protection) -> MmResult;

    /// # Safety
    ///
    /// `base` and `len` must describe a live region from `alloc_region`, and
    /// no code may still be executing from it.
    unsafe fn free_region(&self, base: NonNull<u8>, len: usize);
}

impl<H: MemoryHost + ?Sized> MemoryHost for &H {
    fn map_phys(&self, phys: PhysAddr, len: usize) -> MmResult<NonNull<u8>> {
        (**self).map_phys(phys, len)
    }

    unsafe fn unmap_phys(&self, base: NonNull<u8>, len: usize) {
        unsafe { (**self).unmap_phys(base, len) }
    }

    fn alloc_region(&self, len: usize) -> MmResult<NonNull<u8>> {
        (**self).alloc_region(len)
    }

    unsafe fn protect_region(&self, base: NonNull<u8>, len: usize, prot: Protection) -> MmResult {
        unsafe { (**self).protect_region(base, len, prot) }
    }

    unsafe fn free_region(&self, base: NonNull<u8>, len: usize) {
        unsafe { (**self).free_region(base, len) }
    }
}
