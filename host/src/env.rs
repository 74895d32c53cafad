//! Configuration from the process environment.
//!
//! `BBAPI_CMDLINE` carries the same tokens a kernel command line would
//! (`bbapi.search_area=`, `bbapi.phys_base=`, `bbapi.log=`). `BBAPI_LOG`
//! overrides the log level.

use std::env;

use bbapi_core::{SearchConfig, config_from_cmdline};
use bbapi_lib::KlogLevel;

pub const CMDLINE_VAR: &str = "BBAPI_CMDLINE";
pub const LOG_VAR: &str = "BBAPI_LOG";

const DEFAULT_LEVEL: KlogLevel = KlogLevel::Info;

pub fn config_from_env() -> SearchConfig {
    config_from_cmdline(env::var(CMDLINE_VAR).ok().as_deref())
}

pub fn log_level_from_env() -> KlogLevel {
    log_level(
        env::var(LOG_VAR).ok().as_deref(),
        env::var(CMDLINE_VAR).ok().as_deref(),
    )
}

/// `explicit` wins over a `bbapi.log=` token; unknown names are ignored.
pub fn log_level(explicit: Option<&str>, cmdline: Option<&str>) -> KlogLevel {
    explicit
        .and_then(KlogLevel::from_name)
        .or_else(|| {
            cmdline?
                .split_whitespace()
                .filter_map(|token| token.strip_prefix("bbapi.log="))
                .filter_map(KlogLevel::from_name)
                .last()
        })
        .unwrap_or(DEFAULT_LEVEL)
}
