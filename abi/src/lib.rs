//! BBAPI caller/bridge ABI types
//!
//! Canonical definitions shared between the bridge and the processes that
//! talk to it: the request descriptor layout, the index group/offset
//! numbering of the firmware, firmware status codes and the error numbers
//! the gateway hands back.
//!
//! Everything here is plain data. Layout-sensitive types are `#[repr(C)]`
//! and decoded from bytes, never transmuted.

#![no_std]
#![forbid(unsafe_code)]

pub mod addr;
pub mod errno;
pub mod index;
pub mod request;
pub mod status;

#[cfg(test)]
extern crate std;

pub use addr::PhysAddr;
pub use errno::*;
pub use request::{CallRequest, RequestDecodeError, RequestLayout};
pub use status::*;
