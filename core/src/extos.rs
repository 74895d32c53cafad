//! Host service table handed to the firmware after startup.
//!
//! Some firmware services need to map physical memory themselves. They call
//! back into the host through a table of named handlers:
//!
//! ```text
//! entry   0..8    name, ASCII, NUL padded
//!         8..16   handler address, or 0
//! ```
//!
//! Only `MAPMEM` and `UNMAPMEM` are implemented; the table ends with an
//! all-zero entry. The callbacks carry no context pointer, so the services
//! behind them are registered process-wide.

use core::ptr;

use spin::Once;

use bbapi_abi::index::{BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_EXTOS_INIT};
use bbapi_lib::{klog_debug, klog_warn};
use bbapi_mm::MemoryHost;

use crate::context::BiosApi;

/// Physical mapping services for firmware callbacks.
pub trait ExtOsServices: Sync {
    /// Map `len` bytes at `phys`. Returns null on failure.
    fn map_phys(&self, phys: u64, len: u32) -> *mut u8;

    /// # Safety
    ///
    /// `virt` and `len` must come from a successful `map_phys`.
    unsafe fn unmap_phys(&self, virt: *mut u8, len: u32);
}

static SERVICES: Once<&'static dyn ExtOsServices> = Once::new();

/// Install the services behind the firmware callbacks. The first
/// registration wins; returns false if one was already installed.
pub fn register_extos_services(services: &'static dyn ExtOsServices) -> bool {
    let mut installed = false;
    SERVICES.call_once(|| {
        installed = true;
        services
    });
    installed
}

pub fn registered_services() -> Option<&'static dyn ExtOsServices> {
    SERVICES.get().copied()
}

fn map_mem(phys: i64, size: u32) -> *mut u8 {
    match registered_services() {
        Some(services) => services.map_phys(phys as u64, size),
        None => ptr::null_mut(),
    }
}

fn unmap_mem(virt: *mut u8, size: u32) {
    if virt.is_null() {
        return;
    }
    if let Some(services) = registered_services() {
        // SAFETY: the firmware only unmaps what MAPMEM returned.
        unsafe { services.unmap_phys(virt, size) };
    }
}

macro_rules! firmware_callbacks {
    ($(fn $name:ident($($arg:ident: $ty:ty),*) $(-> $ret:ty)? => $body:ident;)*) => {
        $(
            #[cfg(target_arch = "x86_64")]
            pub extern "win64" fn $name($($arg: $ty),*) $(-> $ret)? {
                $body($($arg),*)
            }

            #[cfg(not(target_arch = "x86_64"))]
            pub extern "C" fn $name($($arg: $ty),*) $(-> $ret)? {
                $body($($arg),*)
            }
        )*
    };
}

firmware_callbacks! {
    fn extos_map_mem(phys: i64, size: u32) -> *mut u8 => map_mem;
    fn extos_unmap_mem(virt: *mut u8, size: u32) => unmap_mem;
}

pub const EXTOS_ENTRY_SIZE: usize = 16;
pub const EXTOS_TABLE_ENTRIES: usize = 7;
pub const EXTOS_TABLE_SIZE: usize = EXTOS_ENTRY_SIZE * EXTOS_TABLE_ENTRIES;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtOsEntry {
    pub name: [u8; 8],
    pub handler: u64,
}

impl ExtOsEntry {
    const fn named(name: &[u8], handler: u64) -> Self {
        let mut raw = [0u8; 8];
        let mut i = 0;
        while i < name.len() && i < raw.len() {
            raw[i] = name[i];
            i += 1;
        }
        Self { name: raw, handler }
    }

    #[inline]
    pub(crate) const fn is_terminator(&self) -> bool {
        self.handler == 0 && u64::from_ne_bytes(self.name) == 0
    }
}

/// Table entries in firmware order.
pub fn extos_entries() -> [ExtOsEntry; EXTOS_TABLE_ENTRIES] {
    let map = extos_map_mem as *const () as usize as u64;
    let unmap = extos_unmap_mem as *const () as usize as u64;
    [
        ExtOsEntry::named(b"READMSR", 0),
        ExtOsEntry::named(b"GETBUSDT", 0),
        ExtOsEntry::named(b"MAPMEM", map),
        ExtOsEntry::named(b"UNMAPMEM", unmap),
        ExtOsEntry::named(b"WRITEMSR", 0),
        ExtOsEntry::named(b"SETBUSDT", 0),
        ExtOsEntry::default(),
    ]
}

pub fn encode_table(entries: &[ExtOsEntry; EXTOS_TABLE_ENTRIES]) -> [u8; EXTOS_TABLE_SIZE] {
    debug_assert!(entries[EXTOS_TABLE_ENTRIES - 1].is_terminator());
    let mut out = [0u8; EXTOS_TABLE_SIZE];
    for (slot, entry) in out.chunks_exact_mut(EXTOS_ENTRY_SIZE).zip(entries) {
        slot[..8].copy_from_slice(&entry.name);
        slot[8..].copy_from_slice(&entry.handler.to_ne_bytes());
    }
    out
}

static TABLE: Once<[u8; EXTOS_TABLE_SIZE]> = Once::new();

/// The encoded table. Built once; the firmware may keep pointing at it.
pub fn extos_table() -> &'static [u8; EXTOS_TABLE_SIZE] {
    TABLE.call_once(|| encode_table(&extos_entries()))
}

/// Hand the table to a ready bridge if services are registered.
pub fn announce<H: MemoryHost>(api: &BiosApi<H>) -> bool {
    announce_with(api, registered_services())
}

/// Returns true if the firmware accepted the table. A rejection is logged
/// and otherwise ignored.
pub fn announce_with<H: MemoryHost>(
    api: &BiosApi<H>,
    services: Option<&'static dyn ExtOsServices>,
) -> bool {
    if services.is_none() {
        klog_debug!("bbapi: no host services registered");
        return false;
    }
    match api.write(BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_EXTOS_INIT, extos_table()) {
        Ok(()) => true,
        Err(err) => {
            klog_warn!("bbapi: initializing firmware services failed: {}", err);
            false
        }
    }
}
