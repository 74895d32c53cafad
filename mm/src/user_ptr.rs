//! Caller pointer validation.
//!
//! Addresses that arrive in a request descriptor belong to the caller's
//! address space. They are validated into [`UserBytes`] before any copy is
//! attempted, the Rust equivalent of an `access_ok()` check.

/// Error type for caller pointer validation and copies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UserPtrError {
    /// Pointer is null but a non-zero length was requested
    Null = 1,
    /// Address + length would overflow the address space
    Overflow = 4,
    /// The caller's memory is not mapped (or not accessible) at this range
    NotMapped = 5,
    /// Copy operation failed during actual memory transfer
    CopyFailed = 6,
}

impl core::fmt::Display for UserPtrError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            Self::Null => "null caller pointer",
            Self::Overflow => "caller range overflows the address space",
            Self::NotMapped => "caller range not mapped",
            Self::CopyFailed => "copy to or from caller memory failed",
        };
        f.write_str(text)
    }
}

/// A validated caller byte range.
///
/// Guarantees that a non-empty range has a non-null base and does not wrap.
/// An empty range may carry any address, including null; copies of it are
/// no-ops.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UserBytes {
    base: usize,
    len: usize,
}

impl UserBytes {
    pub const EMPTY: Self = Self { base: 0, len: 0 };

    pub fn try_new(addr: usize, len: usize) -> Result<Self, UserPtrError> {
        if len == 0 {
            return Ok(Self { base: addr, len: 0 });
        }
        if addr == 0 {
            return Err(UserPtrError::Null);
        }
        addr.checked_add(len).ok_or(UserPtrError::Overflow)?;
        Ok(Self { base: addr, len })
    }

    #[inline]
    pub const fn base(&self) -> usize {
        self.base
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
