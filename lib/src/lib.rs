//! Support code shared by the bridge crates: logging, alignment and the
//! lifecycle flag.

#![no_std]

pub mod alignment;
pub mod klog;
pub mod lifecycle;

#[cfg(test)]
extern crate std;

pub use alignment::{align_down_u64, align_down_usize, align_up_u64, align_up_usize};
pub use alignment::{align_down_usize as align_down, align_up_usize as align_up};
pub use klog::{
    KlogLevel, klog_enabled, klog_get_level, klog_init, klog_register_backend, klog_set_level,
};
pub use lifecycle::{Lifecycle, LifecycleFlag};
