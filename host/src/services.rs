//! Physical mapping services offered to the firmware.

use std::ptr::{self, NonNull};

use bbapi_abi::PhysAddr;
use bbapi_core::{ExtOsServices, register_extos_services};
use bbapi_lib::klog_warn;
use bbapi_mm::MemoryHost;

use crate::devmem::DevMemHost;

impl ExtOsServices for DevMemHost {
    fn map_phys(&self, phys: u64, len: u32) -> *mut u8 {
        let Some(phys) = PhysAddr::try_new(phys) else {
            klog_warn!("bbapi-host: firmware asked to map invalid address {:#x}", phys);
            return ptr::null_mut();
        };
        match MemoryHost::map_phys(self, phys, len as usize) {
            Ok(base) => base.as_ptr(),
            Err(err) => {
                klog_warn!("bbapi-host: firmware mapping failed: {}", err);
                ptr::null_mut()
            }
        }
    }

    unsafe fn unmap_phys(&self, virt: *mut u8, len: u32) {
        if let Some(base) = NonNull::new(virt) {
            // SAFETY: `virt` came from map_phys above with the same length.
            unsafe { MemoryHost::unmap_phys(self, base, len as usize) };
        }
    }
}

/// Make `host` live for the rest of the process and offer it to the firmware.
///
/// Returns the host for use by the bridge, and whether the registration took
/// effect. Only the first registration in a process does.
pub fn install_services(host: DevMemHost) -> (&'static DevMemHost, bool) {
    let host: &'static DevMemHost = Box::leak(Box::new(host));
    let installed = register_extos_services(host);
    if !installed {
        klog_warn!("bbapi-host: firmware services already registered");
    }
    (host, installed)
}
