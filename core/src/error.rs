//! Error type of the bridge.
//!
//! Every failure a caller can observe is one [`BridgeError`]. At the gateway
//! boundary it is folded into a negative error number with
//! [`BridgeError::errno`].

use core::fmt;

use bbapi_abi::{
    EACCES, EFAULT, EINVAL, ENODEV, ENOMEM, ENXIO, PhysAddr, RequestDecodeError, firmware_errno,
};
use bbapi_mm::{MmError, UserPtrError};

/// Why discovery did not produce an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryFailure {
    /// The search window could not be mapped or read.
    Window(MmError),
    /// No signature in any phase of the window.
    NotFound { phys: PhysAddr, len: usize },
    /// The length field makes the image size overflow.
    LengthOverflow { field: u32 },
    /// The image as described by its length field runs past the window.
    ImageOutOfWindow {
        offset: usize,
        size: usize,
        window: usize,
    },
}

impl fmt::Display for DiscoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(err) => write!(f, "search window: {}", err),
            Self::NotFound { phys, len } => {
                write!(f, "no signature in {:#x} + {:#x}", phys, len)
            }
            Self::LengthOverflow { field } => write!(f, "image length {:#x} overflows", field),
            Self::ImageOutOfWindow {
                offset,
                size,
                window,
            } => write!(
                f,
                "image {:#x} + {:#x} exceeds {:#x}-byte window",
                offset, size, window
            ),
        }
    }
}

/// Why a request was refused before reaching the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentFault {
    /// The reserved descriptor field was set.
    ReservedField,
    InputTooLarge { requested: usize, capacity: usize },
    OutputTooLarge { requested: usize, capacity: usize },
    Descriptor(RequestDecodeError),
}

impl fmt::Display for ArgumentFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservedField => f.write_str("reserved field must be null"),
            Self::InputTooLarge {
                requested,
                capacity,
            } => write!(f, "input size {} exceeds {}", requested, capacity),
            Self::OutputTooLarge {
                requested,
                capacity,
            } => write!(f, "output size {} exceeds {}", requested, capacity),
            Self::Descriptor(err) => write!(f, "descriptor: {}", err),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// The configured search window exceeds the supported maximum.
    Configuration { requested: usize, max: usize },
    Discovery(DiscoveryFailure),
    /// Executable memory for the shadow copy could not be provided.
    Resource(MmError),
    Argument(ArgumentFault),
    /// Offset reserved for trusted callers.
    Access { group: u32, offset: u32 },
    /// Copying to or from caller memory failed.
    Transfer(UserPtrError),
    /// Raw nonzero firmware status.
    Firmware(u32),
    /// The bridge is not ready.
    ServiceUnavailable,
}

impl BridgeError {
    /// Negative error number handed back to callers.
    pub const fn errno(&self) -> i64 {
        match self {
            Self::Configuration { .. } | Self::Argument(_) => -EINVAL,
            Self::Discovery(_) => -ENXIO,
            Self::Resource(_) => -ENOMEM,
            Self::Access { .. } => -EACCES,
            Self::Transfer(_) => -EFAULT,
            Self::Firmware(status) => firmware_errno(*status),
            Self::ServiceUnavailable => -ENODEV,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { requested, max } => {
                write!(f, "search area {:#x} exceeds maximum {:#x}", requested, max)
            }
            Self::Discovery(err) => write!(f, "firmware not found: {}", err),
            Self::Resource(err) => write!(f, "shadow memory: {}", err),
            Self::Argument(err) => write!(f, "invalid argument: {}", err),
            Self::Access { group, offset } => {
                write!(f, "access to {:#x}:{:#x} denied", group, offset)
            }
            Self::Transfer(err) => write!(f, "transfer: {}", err),
            Self::Firmware(status) => write!(
                f,
                "firmware status {:#x} ({})",
                status,
                bbapi_abi::status_name(*status)
            ),
            Self::ServiceUnavailable => f.write_str("service unavailable"),
        }
    }
}

impl From<DiscoveryFailure> for BridgeError {
    fn from(err: DiscoveryFailure) -> Self {
        Self::Discovery(err)
    }
}

impl From<ArgumentFault> for BridgeError {
    fn from(err: ArgumentFault) -> Self {
        Self::Argument(err)
    }
}

impl From<UserPtrError> for BridgeError {
    fn from(err: UserPtrError) -> Self {
        Self::Transfer(err)
    }
}

impl From<RequestDecodeError> for BridgeError {
    fn from(err: RequestDecodeError) -> Self {
        Self::Argument(ArgumentFault::Descriptor(err))
    }
}

pub type BridgeResult<T = ()> = Result<T, BridgeError>;
