//! Calls into the shadowed firmware.
//!
//! The firmware entry takes seven arguments in the calling convention it was
//! built for: `win64` on x86_64, stack-passed `cdecl`/`stdcall` on i386.
//! This module is the only place that knows about either.

use core::ptr::{self, NonNull};

#[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
use bbapi_abi::BIOSAPI_SRVNOTSUPP;

/// Address of the firmware entry function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPoint(NonNull<u8>);

// SAFETY: the entry is an address into an immutable executable image; the
// serialization lock decides who may jump to it.
unsafe impl Send for EntryPoint {}
unsafe impl Sync for EntryPoint {}

impl EntryPoint {
    /// # Safety
    ///
    /// `addr` must point at executable code that follows the firmware calling
    /// convention for as long as the value is used.
    pub const unsafe fn new(addr: NonNull<u8>) -> Self {
        Self(addr)
    }

    #[inline]
    pub const fn as_ptr(self) -> *const u8 {
        self.0.as_ptr()
    }
}

/// Arguments of one firmware invocation.
#[derive(Clone, Copy, Debug)]
pub struct FirmwareCall {
    pub group: u32,
    pub offset: u32,
    pub input: *const u8,
    pub input_len: u32,
    pub output: *mut u8,
    pub output_len: u32,
    pub bytes_written: *mut u32,
}

impl FirmwareCall {
    /// Call without payload.
    pub const fn bare(group: u32, offset: u32) -> Self {
        Self {
            group,
            offset,
            input: ptr::null(),
            input_len: 0,
            output: ptr::null_mut(),
            output_len: 0,
            bytes_written: ptr::null_mut(),
        }
    }
}

#[cfg(target_arch = "x86_64")]
type EntryFn = unsafe extern "win64" fn(u32, u32, *const u8, u32, *mut u8, u32, *mut u32) -> u32;

/// Invoke the firmware and return its raw status.
///
/// # Safety
///
/// `entry` must be the entry of a live image. Every non-null pointer in `call`
/// must be valid for the firmware to access with the paired length, and the
/// caller must hold the serialization lock.
#[cfg(target_arch = "x86_64")]
pub unsafe fn invoke(entry: EntryPoint, call: &FirmwareCall) -> u32 {
    // SAFETY: guaranteed by the caller.
    unsafe {
        let func = core::mem::transmute::<*const u8, EntryFn>(entry.as_ptr());
        func(
            call.group,
            call.offset,
            call.input,
            call.input_len,
            call.output,
            call.output_len,
            call.bytes_written,
        )
    }
}

/// Invoke the firmware and return its raw status.
///
/// The arguments are pushed right to left from a frame on the Rust stack and
/// `esp` is restored from `edi` afterwards, which works whether the firmware
/// pops its own arguments or not.
///
/// # Safety
///
/// See the x86_64 variant.
#[cfg(target_arch = "x86")]
pub unsafe fn invoke(entry: EntryPoint, call: &FirmwareCall) -> u32 {
    let frame: [u32; 8] = [
        call.group,
        call.offset,
        call.input as u32,
        call.input_len,
        call.output as u32,
        call.output_len,
        call.bytes_written as u32,
        entry.as_ptr() as u32,
    ];
    let status: u32;
    // SAFETY: guaranteed by the caller. edi is callee-saved in both i386
    // firmware conventions.
    unsafe {
        core::arch::asm!(
            "mov edi, esp",
            "push dword ptr [{frame} + 24]",
            "push dword ptr [{frame} + 20]",
            "push dword ptr [{frame} + 16]",
            "push dword ptr [{frame} + 12]",
            "push dword ptr [{frame} + 8]",
            "push dword ptr [{frame} + 4]",
            "push dword ptr [{frame}]",
            "call dword ptr [{frame} + 28]",
            "mov esp, edi",
            frame = in(reg) frame.as_ptr(),
            out("edi") _,
            lateout("eax") status,
            clobber_abi("C"),
        );
    }
    status
}

/// No firmware convention exists for this architecture.
///
/// # Safety
///
/// Always safe; kept `unsafe` for a uniform signature.
#[cfg(not(any(target_arch = "x86_64", target_arch = "x86")))]
pub unsafe fn invoke(_entry: EntryPoint, _call: &FirmwareCall) -> u32 {
    BIOSAPI_SRVNOTSUPP
}
