//! Hosts, firmware stubs and caller address spaces for the bridge tests.
//!
//! Firmware images are planted in a heap-backed search window: the
//! signature, the entry offset field, and at the entry a `movabs rax; jmp
//! rax` trampoline into one of the `extern "win64"` stubs below. The shadow
//! copy lands in real `mmap`ed memory, so calls go through the actual
//! bridge.

#![allow(dead_code)]

use core::cell::{Cell, RefCell};
use core::ops::Range;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use std::boxed::Box;
use std::vec;
use std::vec::Vec;

use bbapi_abi::PhysAddr;
use bbapi_lib::align_up;
use bbapi_mm::{MemoryHost, MmError, MmResult, Protection, UserMemory, UserPtrError};

use crate::config::{BBAPI_DEFAULT_PHYS_BASE, SearchConfig};
use crate::scanner::BBAPI_SIGNATURE;

pub const TEST_WINDOW_LEN: usize = 0x4000;
pub const TEST_MATCH_OFFSET: usize = 37;
pub const TEST_ENTRY_OFFSET: u32 = 0x2000;

const PAGE: usize = 4096;

// =============================================================================
// Memory host
// =============================================================================

/// Search window in a heap buffer, executable regions from `mmap`.
pub struct TestHost {
    origin: u64,
    window: Box<[u8]>,
    maps: AtomicUsize,
    unmaps: AtomicUsize,
    allocs: AtomicUsize,
    frees: AtomicUsize,
    last_alloc_len: AtomicUsize,
    pub fail_alloc: AtomicBool,
    pub fail_exec: AtomicBool,
}

impl TestHost {
    pub fn new(window: Vec<u8>) -> Self {
        Self {
            origin: BBAPI_DEFAULT_PHYS_BASE,
            window: window.into_boxed_slice(),
            maps: AtomicUsize::new(0),
            unmaps: AtomicUsize::new(0),
            allocs: AtomicUsize::new(0),
            frees: AtomicUsize::new(0),
            last_alloc_len: AtomicUsize::new(0),
            fail_alloc: AtomicBool::new(false),
            fail_exec: AtomicBool::new(false),
        }
    }

    /// Window with a firmware image whose entry jumps to `target`.
    pub fn with_firmware(target: usize) -> Self {
        Self::new(firmware_window(
            TEST_WINDOW_LEN,
            TEST_MATCH_OFFSET,
            TEST_ENTRY_OFFSET,
            target,
        ))
    }

    pub fn config(&self) -> SearchConfig {
        SearchConfig {
            phys_base: PhysAddr::new(self.origin),
            window_len: self.window.len(),
        }
    }

    pub fn window(&self) -> &[u8] {
        &self.window
    }

    pub fn maps(&self) -> usize {
        self.maps.load(Ordering::SeqCst)
    }

    pub fn unmaps(&self) -> usize {
        self.unmaps.load(Ordering::SeqCst)
    }

    pub fn allocs(&self) -> usize {
        self.allocs.load(Ordering::SeqCst)
    }

    pub fn frees(&self) -> usize {
        self.frees.load(Ordering::SeqCst)
    }

    pub fn last_alloc_len(&self) -> usize {
        self.last_alloc_len.load(Ordering::SeqCst)
    }

    pub fn live_mappings(&self) -> usize {
        self.maps() - self.unmaps()
    }

    pub fn live_regions(&self) -> usize {
        self.allocs() - self.frees()
    }
}

impl MemoryHost for TestHost {
    fn map_phys(&self, phys: PhysAddr, len: usize) -> MmResult<NonNull<u8>> {
        let fail = MmError::MappingFailed { phys, len };
        let start = phys.as_u64().checked_sub(self.origin).ok_or(fail)? as usize;
        if start.checked_add(len).is_none_or(|end| end > self.window.len()) {
            return Err(fail);
        }
        self.maps.fetch_add(1, Ordering::SeqCst);
        NonNull::new(self.window[start..].as_ptr() as *mut u8).ok_or(fail)
    }

    unsafe fn unmap_phys(&self, _base: NonNull<u8>, _len: usize) {
        self.unmaps.fetch_add(1, Ordering::SeqCst);
    }

    fn alloc_region(&self, len: usize) -> MmResult<NonNull<u8>> {
        if self.fail_alloc.load(Ordering::SeqCst) {
            return Err(MmError::NoMemory { len });
        }
        // SAFETY: anonymous private mapping, no existing memory involved.
        let ptr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                align_up(len, PAGE),
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(MmError::NoMemory { len });
        }
        self.allocs.fetch_add(1, Ordering::SeqCst);
        self.last_alloc_len.store(len, Ordering::SeqCst);
        NonNull::new(ptr.cast::<u8>()).ok_or(MmError::NoMemory { len })
    }

    unsafe fn protect_region(&self, base: NonNull<u8>, len: usize, prot: Protection) -> MmResult {
        if self.fail_exec.load(Ordering::SeqCst) {
            return Err(MmError::ProtectionFailed { len });
        }
        let mut flags = libc::PROT_NONE;
        if prot.contains(Protection::READ) {
            flags |= libc::PROT_READ;
        }
        if prot.contains(Protection::WRITE) {
            flags |= libc::PROT_WRITE;
        }
        if prot.contains(Protection::EXEC) {
            flags |= libc::PROT_EXEC;
        }
        // SAFETY: base/len describe a region from alloc_region.
        let rc = unsafe { libc::mprotect(base.as_ptr().cast(), align_up(len, PAGE), flags) };
        if rc != 0 {
            return Err(MmError::ProtectionFailed { len });
        }
        Ok(())
    }

    unsafe fn free_region(&self, base: NonNull<u8>, len: usize) {
        // SAFETY: base/len describe a region from alloc_region.
        unsafe { libc::munmap(base.as_ptr().cast(), align_up(len, PAGE)) };
        self.frees.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Window builders
// =============================================================================

pub fn plant_signature(window: &mut [u8], at: usize) {
    window[at..at + 8].copy_from_slice(&BBAPI_SIGNATURE.to_le_bytes());
}

pub fn plant_image_header(window: &mut [u8], at: usize, entry_offset: u32) {
    plant_signature(window, at);
    window[at + 8..at + 12].copy_from_slice(&entry_offset.to_le_bytes());
}

/// `movabs rax, target; jmp rax`
pub fn trampoline(target: usize) -> [u8; 12] {
    let mut code = [0u8; 12];
    code[0] = 0x48;
    code[1] = 0xB8;
    code[2..10].copy_from_slice(&(target as u64).to_le_bytes());
    code[10] = 0xFF;
    code[11] = 0xE0;
    code
}

/// Window of `len` bytes with filler, holding an image at `at`.
pub fn firmware_window(len: usize, at: usize, entry_offset: u32, target: usize) -> Vec<u8> {
    let mut window: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
    plant_image_header(&mut window, at, entry_offset);
    let entry = at + entry_offset as usize;
    window[entry..entry + 12].copy_from_slice(&trampoline(target));
    window
}

/// Filler only, guaranteed to contain no signature.
pub fn empty_window(len: usize) -> Vec<u8> {
    vec![0x5A; len]
}

// =============================================================================
// Firmware stubs
// =============================================================================

pub const ECHO_GROUP: u32 = 0x4242;
pub const STATUS_GROUP: u32 = 0x5353;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub group: u32,
    pub offset: u32,
    pub input: Vec<u8>,
    pub output_len: u32,
    pub has_output: bool,
    pub has_bytes_written: bool,
}

/// Returns `(status, bytes_written)`.
pub type Responder = fn(&Invocation, &mut [u8]) -> (u32, u32);

std::thread_local! {
    static RESPONDER: Cell<Responder> = const { Cell::new(standard_responder as Responder) };
    static INVOCATIONS: RefCell<Vec<Invocation>> = const { RefCell::new(Vec::new()) };
}

pub fn set_responder(responder: Responder) {
    RESPONDER.with(|r| r.set(responder));
}

pub fn clear_invocations() {
    INVOCATIONS.with(|calls| calls.borrow_mut().clear());
}

pub fn invocations() -> Vec<Invocation> {
    INVOCATIONS.with(|calls| calls.borrow().clone())
}

pub fn invocations_of(group: u32, offset: u32) -> Vec<Invocation> {
    invocations()
        .into_iter()
        .filter(|inv| inv.group == group && inv.offset == offset)
        .collect()
}

fn put(output: &mut [u8], data: &[u8]) -> u32 {
    let n = data.len().min(output.len());
    output[..n].copy_from_slice(&data[..n]);
    n as u32
}

pub fn standard_responder(inv: &Invocation, output: &mut [u8]) -> (u32, u32) {
    use bbapi_abi::index::*;
    use bbapi_abi::*;

    match (inv.group, inv.offset) {
        (BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_GETBOARDNAME) => (0, put(output, b"CX2030")),
        (BIOSIGRP_GENERAL, BIOSIOFFS_GENERAL_EXTOS_INIT | BIOSIOFFS_GENERAL_UNLOAD) => (0, 0),
        (BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_GETTYPE) => {
            if output.is_empty() {
                (BIOSAPI_INVALIDSIZE, 0)
            } else {
                (0, put(output, &[0x02]))
            }
        }
        (BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT) => {
            if inv.input.is_empty() {
                (BIOSAPI_INVALIDPARM, 0)
            } else {
                (0, 0)
            }
        }
        (
            BIOSIGRP_CXPWRSUPP,
            BIOSIOFFS_CXPWRSUPP_DISPLAYLINE1 | BIOSIOFFS_CXPWRSUPP_DISPLAYLINE2,
        ) => (0, 0),
        (BIOSIGRP_SUPS, _) => (BIOSAPI_SRVNOTSUPP, 0),
        (ECHO_GROUP, _) => {
            put(output, &inv.input);
            // Reports the full input length even when the output is shorter.
            (0, inv.input.len() as u32)
        }
        (STATUS_GROUP, status) => (status, 0),
        _ => (BIOSAPI_INVALIDGRP, 0),
    }
}

/// Firmware stub backed by the current thread's responder.
pub extern "win64" fn scripted_firmware(
    group: u32,
    offset: u32,
    input: *const u8,
    input_len: u32,
    output: *mut u8,
    output_len: u32,
    bytes_written: *mut u32,
) -> u32 {
    let input_bytes = if input.is_null() || input_len == 0 {
        &[][..]
    } else {
        // SAFETY: the bridge passes buffers valid for the given lengths.
        unsafe { core::slice::from_raw_parts(input, input_len as usize) }
    };
    let output_bytes = if output.is_null() || output_len == 0 {
        &mut [][..]
    } else {
        // SAFETY: as above.
        unsafe { core::slice::from_raw_parts_mut(output, output_len as usize) }
    };

    let inv = Invocation {
        group,
        offset,
        input: input_bytes.to_vec(),
        output_len,
        has_output: !output.is_null(),
        has_bytes_written: !bytes_written.is_null(),
    };
    let responder = RESPONDER.with(|r| r.get());
    let (status, written) = responder(&inv, output_bytes);
    INVOCATIONS.with(|calls| calls.borrow_mut().push(inv));

    if !bytes_written.is_null() {
        // SAFETY: non-null bytes_written points at a live u32.
        unsafe { *bytes_written = written };
    }
    status
}

pub fn scripted_target() -> usize {
    scripted_firmware as *const () as usize
}

pub static SERIAL_IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
pub static SERIAL_OVERLAPS: AtomicUsize = AtomicUsize::new(0);
pub static SERIAL_CALLS: AtomicUsize = AtomicUsize::new(0);

/// Echo stub that detects concurrent entry and caller-visible tearing.
pub extern "win64" fn serial_firmware(
    group: u32,
    _offset: u32,
    input: *const u8,
    input_len: u32,
    output: *mut u8,
    output_len: u32,
    bytes_written: *mut u32,
) -> u32 {
    if group != ECHO_GROUP {
        return bbapi_abi::BIOSAPI_SRVNOTSUPP;
    }
    if SERIAL_IN_FLIGHT.fetch_add(1, Ordering::SeqCst) != 0 {
        SERIAL_OVERLAPS.fetch_add(1, Ordering::SeqCst);
    }
    SERIAL_CALLS.fetch_add(1, Ordering::SeqCst);

    let n = input_len.min(output_len) as usize;
    for i in 0..n {
        // SAFETY: i < both buffer lengths.
        unsafe { *output.add(i) = *input.add(i) };
        for _ in 0..16 {
            core::hint::spin_loop();
        }
    }
    for i in 0..n {
        // SAFETY: as above.
        if unsafe { *output.add(i) != *input.add(i) } {
            SERIAL_OVERLAPS.fetch_add(1, Ordering::SeqCst);
            break;
        }
    }
    if !bytes_written.is_null() {
        // SAFETY: non-null bytes_written points at a live u32.
        unsafe { *bytes_written = n as u32 };
    }

    SERIAL_IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
    0
}

pub fn serial_target() -> usize {
    serial_firmware as *const () as usize
}

// =============================================================================
// Caller memory
// =============================================================================

/// A caller address space of `len` bytes starting at `base`, counting every
/// access.
pub struct FakeUserSpace {
    base: usize,
    bytes: RefCell<Vec<u8>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
}

impl FakeUserSpace {
    pub const BASE: usize = 0x7F00_0000;

    pub fn new(len: usize) -> Self {
        Self {
            base: Self::BASE,
            bytes: RefCell::new(vec![0; len]),
            reads: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    pub fn addr(&self, offset: usize) -> usize {
        self.base + offset
    }

    pub fn fill(&self, offset: usize, data: &[u8]) {
        self.bytes.borrow_mut()[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn bytes(&self, offset: usize, len: usize) -> Vec<u8> {
        self.bytes.borrow()[offset..offset + len].to_vec()
    }

    pub fn u32_at(&self, offset: usize) -> u32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes.borrow()[offset..offset + 4]);
        u32::from_ne_bytes(raw)
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    fn range(&self, addr: usize, len: usize) -> Result<Range<usize>, UserPtrError> {
        let start = addr.checked_sub(self.base).ok_or(UserPtrError::NotMapped)?;
        let end = start.checked_add(len).ok_or(UserPtrError::Overflow)?;
        if end > self.bytes.borrow().len() {
            return Err(UserPtrError::NotMapped);
        }
        Ok(start..end)
    }
}

impl UserMemory for FakeUserSpace {
    fn read_into(&self, src: usize, dst: &mut [u8]) -> Result<(), UserPtrError> {
        self.reads.set(self.reads.get() + 1);
        let range = self.range(src, dst.len())?;
        dst.copy_from_slice(&self.bytes.borrow()[range]);
        Ok(())
    }

    fn write_from(&self, dst: usize, src: &[u8]) -> Result<(), UserPtrError> {
        self.writes.set(self.writes.get() + 1);
        let range = self.range(dst, src.len())?;
        self.bytes.borrow_mut()[range].copy_from_slice(src);
        Ok(())
    }
}

/// Caller buffers in this process, addressed by raw pointer value.
pub struct LocalMemory;

impl UserMemory for LocalMemory {
    fn read_into(&self, src: usize, dst: &mut [u8]) -> Result<(), UserPtrError> {
        // SAFETY: tests only pass addresses of live local buffers.
        unsafe { core::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len()) };
        Ok(())
    }

    fn write_from(&self, dst: usize, src: &[u8]) -> Result<(), UserPtrError> {
        // SAFETY: as above.
        unsafe { core::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len()) };
        Ok(())
    }
}
