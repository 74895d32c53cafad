//! Bridge to the Beckhoff BIOS API firmware.
//!
//! Startup finds the firmware image in a physical search window, shadows it
//! into executable RAM and probes which optional feature groups it serves.
//! Afterwards every call, from in-process clients or through the request
//! gate, is serialized behind one lock and dispatched to the firmware entry
//! in its own calling convention.

#![no_std]

pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod extos;
pub mod gate;
pub mod platform;
pub mod probe;
pub mod scanner;
pub mod shadow;

#[cfg(test)]
extern crate std;

#[cfg(all(test, unix, target_arch = "x86_64"))]
mod test_fixtures;




pub use config::{BBAPI_DEFAULT_PHYS_BASE, BBAPI_MAX_SEARCH_AREA, SearchConfig, config_from_cmdline};
pub use context::BiosApi;
pub use error::{ArgumentFault, BridgeError, BridgeResult, DiscoveryFailure};
pub use extos::{ExtOsServices, register_extos_services};
pub use gate::Caller;
pub use probe::Capabilities;
pub use shadow::{FirmwareImage, ImageInfo};
