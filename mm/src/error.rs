//! Error type for the memory seams.

use core::fmt;

use bbapi_abi::PhysAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// The host could not provide the requested memory.
    NoMemory { len: usize },
    /// Mapping a physical range failed.
    MappingFailed { phys: PhysAddr, len: usize },
    /// Changing page protection failed.
    ProtectionFailed { len: usize },
    /// Address or length rejected before reaching the host.
    InvalidRange { phys: PhysAddr, len: usize },
    /// An access fell outside a mapped window or region.
    OutOfBounds { offset: usize, len: usize, size: usize },
}

impl fmt::Display for MmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMemory { len } => write!(f, "could not allocate {:#x} bytes", len),
            Self::MappingFailed { phys, len } => {
                write!(f, "mapping {:#x} bytes at {:#x} failed", len, phys)
            }
            Self::ProtectionFailed { len } => {
                write!(f, "changing protection of {:#x} bytes failed", len)
            }
            Self::InvalidRange { phys, len } => {
                write!(f, "invalid range {:#x} + {:#x}", phys, len)
            }
            Self::OutOfBounds { offset, len, size } => write!(
                f,
                "access {:#x}..{:#x} outside {:#x}-byte region",
                offset,
                offset.saturating_add(*len),
                size
            ),
        }
    }
}

/// Convenience result type for memory operations.
pub type MmResult<T = ()> = Result<T, MmError>;
