//! Request descriptor exchanged between a caller and the gateway.
//!
//! The descriptor has one shape with two trailing fields that are optional on
//! the wire:
//!
//! ```text
//! offset  field            full   legacy
//! 0       index_group      u32    u32
//! 4       index_offset     u32    u32
//! 8       in_buffer        ptr    ptr
//! ..      in_size          u32    u32
//! ..      out_buffer       ptr    ptr
//! ..      out_size         u32    u32
//! ..      bytes_returned   ptr    -
//! ..      mode (reserved)  ptr    -
//! ```
//!
//! Pointer fields have the caller's native width and the struct follows C
//! layout rules. The legacy short form is the same prefix without the last
//! two pointers; both are then treated as absent. The layout is selected by
//! the number of bytes supplied.

use core::mem::{offset_of, size_of};

/// C layout of the full request descriptor.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawRequest {
    pub index_group: u32,
    pub index_offset: u32,
    pub in_buffer: usize,
    pub in_size: u32,
    pub out_buffer: usize,
    pub out_size: u32,
    pub bytes_returned: usize,
    pub mode: usize,
}

/// Size in bytes of the full descriptor.
pub const REQUEST_SIZE: usize = size_of::<RawRequest>();

/// Size in bytes of the legacy descriptor (no `bytes_returned`, no `mode`).
pub const LEGACY_REQUEST_SIZE: usize = REQUEST_SIZE - 2 * size_of::<usize>();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestLayout {
    Full,
    Legacy,
}

impl RequestLayout {
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Full => REQUEST_SIZE,
            Self::Legacy => LEGACY_REQUEST_SIZE,
        }
    }

    /// Layout matching a descriptor of `len` bytes, if any.
    #[inline]
    pub const fn for_len(len: usize) -> Option<Self> {
        if len == REQUEST_SIZE {
            Some(Self::Full)
        } else if len == LEGACY_REQUEST_SIZE {
            Some(Self::Legacy)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestDecodeError {
    /// Byte count matches neither the full nor the legacy layout.
    InvalidLength(usize),
    /// Destination buffer too small to encode into.
    BufferTooSmall { needed: usize, available: usize },
}

impl core::fmt::Display for RequestDecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidLength(len) => write!(
                f,
                "request length {} is neither {} nor {} bytes",
                len, REQUEST_SIZE, LEGACY_REQUEST_SIZE
            ),
            Self::BufferTooSmall { needed, available } => {
                write!(f, "need {} bytes to encode request, have {}", needed, available)
            }
        }
    }
}

/// One firmware call as described by a caller.
///
/// Pointer fields are caller addresses, meaningful only in the caller's
/// address space; nothing in this type dereferences them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub group: u32,
    pub offset: u32,
    pub input: usize,
    pub input_len: u32,
    pub output: usize,
    pub output_len: u32,
    /// Where to store the number of bytes the firmware produced.
    pub bytes_returned: Option<usize>,
    /// Reserved for a future extension. Must be `None`.
    pub reserved: Option<usize>,
}

impl CallRequest {
    /// Request that reads `len` bytes into `output`.
    pub const fn read(group: u32, offset: u32, output: usize, len: u32) -> Self {
        Self {
            group,
            offset,
            input: 0,
            input_len: 0,
            output,
            output_len: len,
            bytes_returned: None,
            reserved: None,
        }
    }

    /// Request that writes `len` bytes from `input`.
    pub const fn write(group: u32, offset: u32, input: usize, len: u32) -> Self {
        Self {
            group,
            offset,
            input,
            input_len: len,
            output: 0,
            output_len: 0,
            bytes_returned: None,
            reserved: None,
        }
    }

    pub const fn with_bytes_returned(mut self, addr: usize) -> Self {
        self.bytes_returned = non_null(addr);
        self
    }

    /// Decode a descriptor, picking the layout from `bytes.len()`.
    pub fn decode(bytes: &[u8]) -> Result<(Self, RequestLayout), RequestDecodeError> {
        let layout = RequestLayout::for_len(bytes.len())
            .ok_or(RequestDecodeError::InvalidLength(bytes.len()))?;

        let mut request = Self {
            group: read_u32(bytes, offset_of!(RawRequest, index_group)),
            offset: read_u32(bytes, offset_of!(RawRequest, index_offset)),
            input: read_usize(bytes, offset_of!(RawRequest, in_buffer)),
            input_len: read_u32(bytes, offset_of!(RawRequest, in_size)),
            output: read_usize(bytes, offset_of!(RawRequest, out_buffer)),
            output_len: read_u32(bytes, offset_of!(RawRequest, out_size)),
            bytes_returned: None,
            reserved: None,
        };

        if layout == RequestLayout::Full {
            request.bytes_returned =
                non_null(read_usize(bytes, offset_of!(RawRequest, bytes_returned)));
            request.reserved = non_null(read_usize(bytes, offset_of!(RawRequest, mode)));
        }

        Ok((request, layout))
    }

    /// Encode into `out` using `layout`, returning the number of bytes written.
    ///
    /// The trailing fields are dropped silently for the legacy layout.
    pub fn encode(
        &self,
        layout: RequestLayout,
        out: &mut [u8],
    ) -> Result<usize, RequestDecodeError> {
        let needed = layout.size();
        if out.len() < needed {
            return Err(RequestDecodeError::BufferTooSmall {
                needed,
                available: out.len(),
            });
        }

        let raw = RawRequest {
            index_group: self.group,
            index_offset: self.offset,
            in_buffer: self.input,
            in_size: self.input_len,
            out_buffer: self.output,
            out_size: self.output_len,
            bytes_returned: self.bytes_returned.unwrap_or(0),
            mode: self.reserved.unwrap_or(0),
        };

        let out = &mut out[..needed];
        out.fill(0);
        write_u32(out, offset_of!(RawRequest, index_group), raw.index_group);
        write_u32(out, offset_of!(RawRequest, index_offset), raw.index_offset);
        write_usize(out, offset_of!(RawRequest, in_buffer), raw.in_buffer);
        write_u32(out, offset_of!(RawRequest, in_size), raw.in_size);
        write_usize(out, offset_of!(RawRequest, out_buffer), raw.out_buffer);
        write_u32(out, offset_of!(RawRequest, out_size), raw.out_size);
        if layout == RequestLayout::Full {
            write_usize(out, offset_of!(RawRequest, bytes_returned), raw.bytes_returned);
            write_usize(out, offset_of!(RawRequest, mode), raw.mode);
        }
        Ok(needed)
    }
}

#[inline]
const fn non_null(addr: usize) -> Option<usize> {
    if addr == 0 { None } else { Some(addr) }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; size_of::<u32>()];
    raw.copy_from_slice(&bytes[at..at + size_of::<u32>()]);
    u32::from_ne_bytes(raw)
}

fn read_usize(bytes: &[u8], at: usize) -> usize {
    let mut raw = [0u8; size_of::<usize>()];
    raw.copy_from_slice(&bytes[at..at + size_of::<usize>()]);
    usize::from_ne_bytes(raw)
}

fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + size_of::<u32>()].copy_from_slice(&value.to_ne_bytes());
}

fn write_usize(bytes: &mut [u8], at: usize, value: usize) {
    bytes[at..at + size_of::<usize>()].copy_from_slice(&value.to_ne_bytes());
}
