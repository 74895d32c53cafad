//! Leveled logging for the bridge.
//!
//! Lines go to one backend function registered by the host: a serial port in
//! a kernel port, stderr in `bbapi-host`. With no backend registered lines
//! are dropped, since the bridge owns no output device.
//!
//! A backend writes one whole line per call, newline included, without
//! interleaving with other threads.

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum KlogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

const LEVELS: [KlogLevel; 5] = [
    KlogLevel::Error,
    KlogLevel::Warn,
    KlogLevel::Info,
    KlogLevel::Debug,
    KlogLevel::Trace,
];

impl KlogLevel {
    fn from_raw(raw: u8) -> Self {
        LEVELS
            .get(raw as usize)
            .copied()
            .unwrap_or(KlogLevel::Trace)
    }

    /// Case-insensitive level name, as in `bbapi.log=debug`.
    pub fn from_name(name: &str) -> Option<Self> {
        LEVELS
            .into_iter()
            .find(|level| name.eq_ignore_ascii_case(level.as_str()))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            KlogLevel::Error => "error",
            KlogLevel::Warn => "warn",
            KlogLevel::Info => "info",
            KlogLevel::Debug => "debug",
            KlogLevel::Trace => "trace",
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(KlogLevel::Info as u8);

pub type KlogBackend = fn(KlogLevel, fmt::Arguments<'_>);

/// Null until a backend is registered.
static BACKEND: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

pub fn klog_register_backend(backend: KlogBackend) {
    BACKEND.store(backend as *mut (), Ordering::Release);
}

pub fn klog_clear_backend() {
    BACKEND.store(core::ptr::null_mut(), Ordering::Release);
}

/// Reset the level to `Info`.
pub fn klog_init() {
    klog_set_level(KlogLevel::Info);
}

pub fn klog_set_level(level: KlogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn klog_get_level() -> KlogLevel {
    KlogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

#[inline]
pub fn klog_enabled(level: KlogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

/// Emit one line at `level`. Format strings carry no trailing newline.
pub fn log_args(level: KlogLevel, args: fmt::Arguments<'_>) {
    if !klog_enabled(level) {
        return;
    }
    let raw = BACKEND.load(Ordering::Acquire);
    if raw.is_null() {
        return;
    }
    // SAFETY: BACKEND only ever holds null or a `KlogBackend` stored by
    // `klog_register_backend`.
    let backend = unsafe { core::mem::transmute::<*mut (), KlogBackend>(raw) };
    backend(level, args);
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

#[macro_export]
macro_rules! klog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::klog::log_args($level, ::core::format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! klog_error {
    ($($arg:tt)*) => {
        $crate::klog!($crate::klog::KlogLevel::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! klog_warn {
    ($($arg:tt)*) => {
        $crate::klog!($crate::klog::KlogLevel::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! klog_info {
    ($($arg:tt)*) => {
        $crate::klog!($crate::klog::KlogLevel::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! klog_debug {
    ($($arg:tt)*) => {
        $crate::klog!($crate::klog::KlogLevel::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! klog_trace {
    ($($arg:tt)*) => {
        $crate::klog!($crate::klog::KlogLevel::Trace, $($arg)*)
    };
}
