//! Index groups and offsets of the BIOS API.
//!
//! Every firmware service is addressed by a 32-bit index group and a 32-bit
//! index offset within that group. Only the ids the bridge itself uses, and
//! the ones callers most commonly need, are listed here.
//!
//! # Reserved offsets
//!
//! Offsets at or above [`BBAPI_USER_OFFSET_LIMIT`] are reserved for the
//! bridge (host service registration, unload notification) and are refused
//! for untrusted callers in every group.

/// Offsets `>=` this value are unreachable from untrusted callers.
pub const BBAPI_USER_OFFSET_LIMIT: u32 = 0xB0;

// =============================================================================
// General
// =============================================================================

pub const BIOSIGRP_GENERAL: u32 = 0x0000_0000;
pub const BIOSIOFFS_GENERAL_GETBOARDNAME: u32 = 0x0000_0001;
pub const BIOSIOFFS_GENERAL_GETBOARDREVISION: u32 = 0x0000_0002;
pub const BIOSIOFFS_GENERAL_GETBIOSVERSION: u32 = 0x0000_0003;
pub const BIOSIOFFS_GENERAL_GETPLATFORMINFO: u32 = 0x0000_0004;
pub const BIOSIOFFS_GENERAL_VERSION: u32 = 0x0000_0005;

/// Host service table registration (trusted only).
pub const BIOSIOFFS_GENERAL_EXTOS_INIT: u32 = 0x0000_00FE;

/// Unload notification sent before the image is released (trusted only).
pub const BIOSIOFFS_GENERAL_UNLOAD: u32 = 0x0000_00FF;

// =============================================================================
// System
// =============================================================================

pub const BIOSIGRP_SYSTEM: u32 = 0x0000_1000;

// =============================================================================
// Software UPS
// =============================================================================

pub const BIOSIGRP_SUPS: u32 = 0x0000_7000;
pub const BIOSIOFFS_SUPS_ENABLE: u32 = 0x0000_0000;
pub const BIOSIOFFS_SUPS_STATUS: u32 = 0x0000_0001;
pub const BIOSIOFFS_SUPS_REVISION: u32 = 0x0000_0002;
pub const BIOSIOFFS_SUPS_GPIO_PIN: u32 = 0x0000_00A0;
pub const BIOSIOFFS_SUPS_GPIO_PIN_EX: u32 = 0x0000_00A1;

// =============================================================================
// CX power supply / front panel
// =============================================================================

pub const BIOSIGRP_CXPWRSUPP: u32 = 0x0000_9000;
pub const BIOSIOFFS_CXPWRSUPP_GETTYPE: u32 = 0x0000_0010;
pub const BIOSIOFFS_CXPWRSUPP_GETSERIALNO: u32 = 0x0000_0011;
pub const BIOSIOFFS_CXPWRSUPP_GETFWVERSION: u32 = 0x0000_0012;
pub const BIOSIOFFS_CXPWRSUPP_GETBOOTCOUNTER: u32 = 0x0000_0013;
pub const BIOSIOFFS_CXPWRSUPP_GETOPERATIONTIME: u32 = 0x0000_0014;
pub const BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT: u32 = 0x0000_0060;
pub const BIOSIOFFS_CXPWRSUPP_DISPLAYLINE1: u32 = 0x0000_0061;
pub const BIOSIOFFS_CXPWRSUPP_DISPLAYLINE2: u32 = 0x0000_0062;

/// Size of one front-panel display line, including the terminating NUL.
pub const CXPWRSUPP_MAX_DISPLAY_LINE: usize = 17;

/// Returns true if `offset` is reserved for trusted callers.
#[inline]
pub const fn is_reserved_offset(offset: u32) -> bool {
    offset >= BBAPI_USER_OFFSET_LIMIT
}
