//! Request gate: the validation and staging half of every external call.
//!
//! Caller buffers never reach the firmware. Input is staged into a fixed
//! scratch buffer, the firmware writes into a second one, and only the bytes
//! it reports are copied back. Both buffers live behind the serialization
//! lock together with the image.

use bbapi_abi::CallRequest;
use bbapi_abi::index::BBAPI_USER_OFFSET_LIMIT;
use bbapi_lib::{klog_debug, klog_warn};
use bbapi_mm::{UserBytes, UserMemory, copy_bytes_from_user, copy_bytes_to_user, copy_u32_to_user};

use crate::bridge::{self, EntryPoint, FirmwareCall};
use crate::error::{ArgumentFault, BridgeError, BridgeResult};

pub const SCRATCH_IN_CAPACITY: usize = 4096;
pub const SCRATCH_OUT_CAPACITY: usize = 4096;

/// Who is asking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Caller {
    /// In-process clients of the bridge. May use reserved offsets.
    Trusted,
    /// Anything that arrives through the request descriptor.
    Untrusted,
}

pub struct ScratchBuffers {
    input: [u8; SCRATCH_IN_CAPACITY],
    output: [u8; SCRATCH_OUT_CAPACITY],
}

impl ScratchBuffers {
    pub const fn new() -> Self {
        Self {
            input: [0; SCRATCH_IN_CAPACITY],
            output: [0; SCRATCH_OUT_CAPACITY],
        }
    }

    #[inline]
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    #[inline]
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

impl Default for ScratchBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject offsets reserved for trusted callers.
#[inline]
pub fn check_access(request: &CallRequest, caller: Caller) -> BridgeResult {
    if caller == Caller::Untrusted && request.offset >= BBAPI_USER_OFFSET_LIMIT {
        klog_warn!(
            "bbapi: access to {:#x}:{:#x} denied",
            request.group,
            request.offset
        );
        return Err(BridgeError::Access {
            group: request.group,
            offset: request.offset,
        });
    }
    Ok(())
}

/// Every check that does not need the lock, in order: access, reserved
/// field, sizes.
pub fn validate(request: &CallRequest, caller: Caller) -> BridgeResult {
    check_access(request, caller)?;

    if request.reserved.is_some() {
        return Err(ArgumentFault::ReservedField.into());
    }
    if request.input_len as usize > SCRATCH_IN_CAPACITY {
        return Err(ArgumentFault::InputTooLarge {
            requested: request.input_len as usize,
            capacity: SCRATCH_IN_CAPACITY,
        }
        .into());
    }
    if request.output_len as usize > SCRATCH_OUT_CAPACITY {
        return Err(ArgumentFault::OutputTooLarge {
            requested: request.output_len as usize,
            capacity: SCRATCH_OUT_CAPACITY,
        }
        .into());
    }
    Ok(())
}

/// Stage, invoke and deliver one validated request.
///
/// Must run under the serialization lock that owns `scratch`. Returns the
/// number of bytes copied back to the caller.
pub fn dispatch<M: UserMemory + ?Sized>(
    entry: EntryPoint,
    scratch: &mut ScratchBuffers,
    request: &CallRequest,
    mem: &M,
) -> BridgeResult<u32> {
    let in_len = request.input_len as usize;
    let out_len = request.output_len as usize;
    let input = UserBytes::try_new(request.input, in_len)?;
    let output = UserBytes::try_new(request.output, out_len)?;
    if out_len > SCRATCH_OUT_CAPACITY {
        return Err(ArgumentFault::OutputTooLarge {
            requested: out_len,
            capacity: SCRATCH_OUT_CAPACITY,
        }
        .into());
    }

    let stage = scratch
        .input
        .get_mut(..in_len)
        .ok_or(ArgumentFault::InputTooLarge {
            requested: in_len,
            capacity: SCRATCH_IN_CAPACITY,
        })?;
    copy_bytes_from_user(mem, input, stage)?;

    let mut written: u32 = 0;
    let call = FirmwareCall {
        group: request.group,
        offset: request.offset,
        input: scratch.input.as_ptr(),
        input_len: request.input_len,
        output: scratch.output.as_mut_ptr(),
        output_len: request.output_len,
        bytes_written: &mut written,
    };
    // SAFETY: both scratch buffers are at least as large as the lengths
    // passed, and the caller holds the lock that owns them.
    let status = unsafe { bridge::invoke(entry, &call) };
    if status != 0 {
        klog_debug!(
            "bbapi: {:#x}:{:#x} failed with {:#x}",
            request.group,
            request.offset,
            status
        );
        return Err(BridgeError::Firmware(status));
    }

    let count = (written as usize).min(out_len).min(SCRATCH_OUT_CAPACITY);
    copy_bytes_to_user(mem, output, &scratch.output[..count])?;
    if let Some(addr) = request.bytes_returned {
        copy_u32_to_user(mem, addr, count as u32)?;
    }
    Ok(count as u32)
}
