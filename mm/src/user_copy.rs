use crate::user_ptr::{UserBytes, UserPtrError};

/// Access to one caller's address space.
///
/// The gateway receives one of these per request. A kernel port backs it
/// with `copy_from_user`/`copy_to_user`; a userspace host reads its own
/// address space.
pub trait UserMemory {
    /// Fill `dst` from caller memory at `src`.
    fn read_into(&self, src: usize, dst: &mut [u8]) -> Result<(), UserPtrError>;

    /// Store `src` into caller memory at `dst`.
    fn write_from(&self, dst: usize, src: &[u8]) -> Result<(), UserPtrError>;
}

impl<M: UserMemory + ?Sized> UserMemory for &M {
    fn read_into(&self, src: usize, dst: &mut [u8]) -> Result<(), UserPtrError> {
        (**self).read_into(src, dst)
    }

    fn write_from(&self, dst: usize, src: &[u8]) -> Result<(), UserPtrError> {
        (**self).write_from(dst, src)
    }
}

pub fn copy_bytes_from_user<M: UserMemory + ?Sized>(
    mem: &M,
    src: UserBytes,
    dst: &mut [u8],
) -> Result<usize, UserPtrError> {
    let copy_len = src.len().min(dst.len());
    if copy_len == 0 {
        return Ok(0);
    }
    mem.read_into(src.base(), &mut dst[..copy_len])?;
    Ok(copy_len)
}

pub fn copy_bytes_to_user<M: UserMemory + ?Sized>(
    mem: &M,
    dst: UserBytes,
    src: &[u8],
) -> Result<usize, UserPtrError> {
    let copy_len = src.len().min(dst.len());
    if copy_len == 0 {
        return Ok(0);
    }
    mem.write_from(dst.base(), &src[..copy_len])?;
    Ok(copy_len)
}

/// Store a native-endian `u32` at caller address `dst`.
pub fn copy_u32_to_user<M: UserMemory + ?Sized>(
    mem: &M,
    dst: usize,
    value: u32,
) -> Result<(), UserPtrError> {
    let bytes = value.to_ne_bytes();
    let target = UserBytes::try_new(dst, bytes.len())?;
    copy_bytes_to_user(mem, target, &bytes)?;
    Ok(())
}
