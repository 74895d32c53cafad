//! Firmware status codes.
//!
//! The BIOS API reports failures with the device error codes of the vendor's
//! automation protocol. Zero is success; everything else is a failure code the
//! bridge passes through without interpreting, except for the two codes the
//! capability probe keys on.

pub const BIOSAPI_SUCCESS: u32 = 0x000;
pub const BIOSAPI_ERROR: u32 = 0x700;
pub const BIOSAPI_SRVNOTSUPP: u32 = 0x701;
pub const BIOSAPI_INVALIDGRP: u32 = 0x702;
pub const BIOSAPI_INVALIDOFFSET: u32 = 0x703;
pub const BIOSAPI_INVALIDACCESS: u32 = 0x704;
pub const BIOSAPI_INVALIDSIZE: u32 = 0x705;
pub const BIOSAPI_INVALIDDATA: u32 = 0x706;
pub const BIOSAPI_NOTREADY: u32 = 0x707;
pub const BIOSAPI_BUSY: u32 = 0x708;
pub const BIOSAPI_INVALIDCONTEXT: u32 = 0x709;
pub const BIOSAPI_NOMEMORY: u32 = 0x70A;
pub const BIOSAPI_INVALIDPARM: u32 = 0x70B;

/// Offset ORed into every firmware status before it is negated and handed to
/// a caller, lifting firmware failures above the errno range.
#[cfg(not(feature = "legacy-errors"))]
pub const BIOSAPIERR_OFFSET: u32 = 0x2000_0000;

/// Legacy numbering: firmware status codes are returned as-is.
#[cfg(feature = "legacy-errors")]
pub const BIOSAPIERR_OFFSET: u32 = 0;

/// Caller-visible error number for a nonzero firmware status.
#[inline]
pub const fn firmware_errno(status: u32) -> i64 {
    -((status | BIOSAPIERR_OFFSET) as i64)
}

/// Short name for the well-known status codes, for log lines.
pub fn status_name(status: u32) -> &'static str {
    match status {
        BIOSAPI_SUCCESS => "success",
        BIOSAPI_ERROR => "error",
        BIOSAPI_SRVNOTSUPP => "service not supported",
        BIOSAPI_INVALIDGRP => "invalid group",
        BIOSAPI_INVALIDOFFSET => "invalid offset",
        BIOSAPI_INVALIDACCESS => "invalid access",
        BIOSAPI_INVALIDSIZE => "invalid size",
        BIOSAPI_INVALIDDATA => "invalid data",
        BIOSAPI_NOTREADY => "not ready",
        BIOSAPI_BUSY => "busy",
        BIOSAPI_INVALIDCONTEXT => "invalid context",
        BIOSAPI_NOMEMORY => "out of memory",
        BIOSAPI_INVALIDPARM => "invalid parameter",
        _ => "unknown",
    }
}
