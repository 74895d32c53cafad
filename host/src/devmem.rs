//! Physical memory through a file descriptor.
//!
//! `/dev/mem` maps physical address N at file offset N. An image file dumped
//! from a board maps its first byte at `origin`, so the scanner can be pointed
//! at firmware captured from a real machine.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::ptr::{self, NonNull};

use bbapi_abi::PhysAddr;
use bbapi_lib::{align_down, align_up, klog_debug, klog_warn};
use bbapi_mm::{MemoryHost, MmError, MmResult, Protection};

pub const DEV_MEM: &str = "/dev/mem";

const FALLBACK_PAGE_SIZE: usize = 4096;

pub struct DevMemHost {
    file: File,
    origin: u64,
    /// File length for image files. `/dev/mem` has none.
    limit: Option<u64>,
    page_size: usize,
}

impl DevMemHost {
    /// Open `/dev/mem` read-only.
    pub fn open() -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(DEV_MEM)?;
        Ok(Self::from_file(file, 0, None))
    }

    /// Use an image file whose first byte sits at physical `origin`.
    pub fn open_image(path: impl AsRef<Path>, origin: u64) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::from_file(file, origin, Some(len)))
    }

    fn from_file(file: File, origin: u64, limit: Option<u64>) -> Self {
        Self {
            file,
            origin,
            limit,
            page_size: page_size(),
        }
    }

    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// File offset of `phys`, if `len` bytes from there are backed.
    fn file_offset(&self, phys: PhysAddr, len: usize) -> Option<u64> {
        let offset = phys.as_u64().checked_sub(self.origin)?;
        let end = offset.checked_add(len as u64)?;
        match self.limit {
            Some(limit) if end > limit => None,
            _ => Some(offset),
        }
    }

    fn region_len(&self, len: usize) -> usize {
        align_up(len.max(1), self.page_size)
    }
}

fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    usize::try_from(raw)
        .ok()
        .filter(|size| size.is_power_of_two())
        .unwrap_or(FALLBACK_PAGE_SIZE)
}

fn prot_bits(prot: Protection) -> libc::c_int {
    let mut bits = libc::PROT_NONE;
    if prot.contains(Protection::READ) {
        bits |= libc::PROT_READ;
    }
    if prot.contains(Protection::WRITE) {
        bits |= libc::PROT_WRITE;
    }
    if prot.contains(Protection::EXEC) {
        bits |= libc::PROT_EXEC;
    }
    bits
}

impl MemoryHost for DevMemHost {
    fn map_phys(&self, phys: PhysAddr, len: usize) -> MmResult<NonNull<u8>> {
        if len == 0 {
            return Err(MmError::InvalidRange { phys, len });
        }
        let fail = MmError::MappingFailed { phys, len };
        let Some(offset) = self.file_offset(phys, len) else {
            klog_warn!("bbapi-host: {:#x} + {:#x} is not backed", phys, len);
            return Err(fail);
        };
        let offset = usize::try_from(offset).map_err(|_| fail)?;
        let aligned = align_down(offset, self.page_size);
        let delta = offset - aligned;
        let map_len = align_up(len + delta, self.page_size);
        let file_off = libc::off_t::try_from(aligned).map_err(|_| fail)?;

        // SAFETY: fresh shared read-only mapping of our own descriptor.
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                self.file.as_raw_fd(),
                file_off,
            )
        };
        if base == libc::MAP_FAILED {
            klog_warn!(
                "bbapi-host: mmap of {:#x} + {:#x} failed: {}",
                phys,
                len,
                io::Error::last_os_error()
            );
            return Err(fail);
        }
        klog_debug!("bbapi-host: mapped {:#x} + {:#x}", phys, len);
        // SAFETY: delta < page size <= map_len.
        NonNull::new(unsafe { base.cast::<u8>().add(delta) }).ok_or(fail)
    }

    unsafe fn unmap_phys(&self, base: NonNull<u8>, len: usize) {
        let delta = base.as_ptr() as usize % self.page_size;
        let map_len = align_up(len + delta, self.page_size);
        // SAFETY: `base` is `delta` bytes into a mapping from map_phys.
        let rc = unsafe { libc::munmap(base.as_ptr().sub(delta).cast(), map_len) };
        if rc != 0 {
            klog_warn!("bbapi-host: munmap failed: {}", io::Error::last_os_error());
        }
    }

    fn alloc_region(&self, len: usize) -> MmResult<NonNull<u8>> {
        // SAFETY: anonymous private mapping, no existing memory involved.
        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                self.region_len(len),
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            klog_warn!(
                "bbapi-host: allocating {:#x} bytes failed: {}",
                len,
                io::Error::last_os_error()
            );
            return Err(MmError::NoMemory { len });
        }
        NonNull::new(base.cast::<u8>()).ok_or(MmError::NoMemory { len })
    }

    unsafe fn protect_region(&self, base: NonNull<u8>, len: usize, prot: Protection) -> MmResult {
        // SAFETY: base/len describe a region from alloc_region.
        let rc = unsafe {
            libc::mprotect(base.as_ptr().cast(), self.region_len(len), prot_bits(prot))
        };
        if rc != 0 {
            klog_warn!(
                "bbapi-host: mprotect {:?} failed: {}",
                prot,
                io::Error::last_os_error()
            );
            return Err(MmError::ProtectionFailed { len });
        }
        Ok(())
    }

    unsafe fn free_region(&self, base: NonNull<u8>, len: usize) {
        // SAFETY: base/len describe a region from alloc_region.
        let rc = unsafe { libc::munmap(base.as_ptr().cast(), self.region_len(len)) };
        if rc != 0 {
            klog_warn!("bbapi-host: munmap failed: {}", io::Error::last_os_error());
        }
    }
}
