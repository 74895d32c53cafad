//! Error numbers returned by the gateway.
//!
//! Gateway-origin failures use the conventional low errno range and are
//! returned negated. Firmware-origin failures are folded into a disjoint
//! range with [`crate::status::BIOSAPIERR_OFFSET`], see
//! [`crate::status::firmware_errno`].

pub const ENXIO: i64 = 6;
pub const ENOMEM: i64 = 12;
pub const EACCES: i64 = 13;
pub const EFAULT: i64 = 14;
pub const ENODEV: i64 = 19;
pub const EINVAL: i64 = 22;
