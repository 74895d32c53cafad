//! Caller memory for clients in this process.

use std::ptr;

use bbapi_mm::{UserMemory, UserPtrError};

/// Reads and writes caller buffers by address in the current process.
///
/// Range and null checks happen in the gate before these are called; this
/// type only performs the copy.
#[derive(Debug)]
pub struct ProcessMemory {
    _private: (),
}

impl ProcessMemory {
    /// # Safety
    ///
    /// Every request submitted with this memory must describe buffers that are
    /// live, and writable where written, for the duration of the call.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl UserMemory for ProcessMemory {
    fn read_into(&self, src: usize, dst: &mut [u8]) -> Result<(), UserPtrError> {
        if src == 0 {
            return Err(UserPtrError::Null);
        }
        // SAFETY: upheld by the constructor's contract.
        unsafe { ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) };
        Ok(())
    }

    fn write_from(&self, dst: usize, src: &[u8]) -> Result<(), UserPtrError> {
        if dst == 0 {
            return Err(UserPtrError::Null);
        }
        // SAFETY: as above.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) };
        Ok(())
    }
}
