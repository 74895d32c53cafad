//! Linux userspace host for the bridge.
//!
//! Supplies the physical window through `/dev/mem` (or a dumped image file),
//! executable regions through anonymous mappings, in-process caller memory,
//! and a stderr log backend.

pub mod devmem;
pub mod env;
pub mod logging;
pub mod process;
pub mod services;

#[cfg(test)]
mod test_support;


pub use devmem::DevMemHost;
pub use env::{CMDLINE_VAR, LOG_VAR, config_from_env, log_level_from_env};
pub use logging::{init_logging, shutdown_logging};
pub use process::ProcessMemory;
pub use services::install_services;
