//! Physical addresses.
//!
//! A `PhysAddr` names a location in the platform memory map, such as the
//! BIOS flash window below 4 GiB. Nothing dereferences one directly; a
//! `MemoryHost` maps it first.

/// Address in the 52-bit physical address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PhysAddr(u64);

impl PhysAddr {
    pub const NULL: Self = Self(0);

    /// Highest representable address.
    pub const LIMIT: u64 = (1 << 52) - 1;

    /// # Panics
    ///
    /// If `addr` is above [`PhysAddr::LIMIT`].
    #[inline]
    pub fn new(addr: u64) -> Self {
        match Self::try_new(addr) {
            Some(phys) => phys,
            None => panic!("physical address {:#x} above the 52-bit limit", addr),
        }
    }

    #[inline]
    pub const fn try_new(addr: u64) -> Option<Self> {
        if addr > Self::LIMIT { None } else { Some(Self(addr)) }
    }

    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// `self + off`, or `None` past the limit.
    #[inline]
    pub const fn checked_offset(self, off: u64) -> Option<Self> {
        match self.0.checked_add(off) {
            Some(end) => Self::try_new(end),
            None => None,
        }
    }
}

impl core::fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::LowerHex::fmt(&self.0, f)
    }
}
