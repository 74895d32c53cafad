//! stderr backend for klog.

use std::fmt;
use std::io::{self, Write};

use bbapi_lib::klog::{self, KlogLevel};

fn stderr_klog_backend(level: KlogLevel, args: fmt::Arguments<'_>) {
    // One locked write per line keeps lines from different threads apart.
    let mut err = io::stderr().lock();
    let _ = writeln!(err, "[{:5}] {}", level.as_str(), args);
}

/// Route klog to stderr at `level`.
pub fn init_logging(level: KlogLevel) {
    klog::klog_init();
    klog::klog_set_level(level);
    klog::klog_register_backend(stderr_klog_backend);
}

/// Stop writing log lines.
pub fn shutdown_logging() {
    klog::klog_clear_backend();
}
