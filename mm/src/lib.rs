//! Memory seams of the bridge.
//!
//! The bridge never touches raw memory on its own. Physical windows and
//! executable buffers come from a [`MemoryHost`]; caller buffers are reached
//! through [`UserMemory`]. The wrappers in this crate bound-check every access
//! so that `unsafe` stays inside the host primitives.

#![no_std]

pub mod error;
pub mod exec;
pub mod host;
pub mod user_copy;
pub mod user_ptr;
pub mod window;

#[cfg(test)]
extern crate std;


pub use error::{MmError, MmResult};
pub use exec::{ExecAllocation, ExecRegion};
pub use host::{MemoryHost, Protection};
pub use user_copy::{UserMemory, copy_bytes_from_user, copy_bytes_to_user, copy_u32_to_user};
pub use user_ptr::{UserBytes, UserPtrError};
pub use window::WindowMapping;
