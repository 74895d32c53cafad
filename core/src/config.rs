//! Where to look for the firmware.

use bbapi_abi::PhysAddr;

use crate::error::{BridgeError, BridgeResult};

/// Physical address the search window starts at on every supported board.
pub const BBAPI_DEFAULT_PHYS_BASE: u64 = 0xFFE0_0000;

/// Largest search window the bridge accepts, and its default size.
pub const BBAPI_MAX_SEARCH_AREA: usize = 0x1F_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    pub phys_base: PhysAddr,
    pub window_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            phys_base: PhysAddr::new(BBAPI_DEFAULT_PHYS_BASE),
            window_len: BBAPI_MAX_SEARCH_AREA,
        }
    }
}

impl SearchConfig {
    /// Window of `window_len` bytes at the default base.
    pub fn new(window_len: usize) -> BridgeResult<Self> {
        let cfg = Self {
            window_len,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub const fn with_phys_base(mut self, phys_base: PhysAddr) -> Self {
        self.phys_base = phys_base;
        self
    }

    pub fn validate(&self) -> BridgeResult {
        if self.window_len > BBAPI_MAX_SEARCH_AREA {
            return Err(BridgeError::Configuration {
                requested: self.window_len,
                max: BBAPI_MAX_SEARCH_AREA,
            });
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Option<u64> {
    if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u64>().ok()
    }
}

/// Build a search configuration from a kernel-style command line.
///
/// Recognised tokens are `bbapi.search_area=<n>` and `bbapi.phys_base=<n>`,
/// decimal or `0x` hex. Malformed values are ignored. The window size is not
/// validated here; [`SearchConfig::validate`] runs when the bridge starts.
pub fn config_from_cmdline(cmdline: Option<&str>) -> SearchConfig {
    let mut cfg = SearchConfig::default();
    if let Some(cmdline) = cmdline {
        for token in cmdline.split_whitespace() {
            if let Some(value) = token.strip_prefix("bbapi.search_area=") {
                if let Some(parsed) = parse_number(value).and_then(|v| usize::try_from(v).ok()) {
                    cfg.window_len = parsed;
                }
            } else if let Some(value) = token.strip_prefix("bbapi.phys_base=") {
                if let Some(phys) = parse_number(value).and_then(PhysAddr::try_new) {
                    cfg.phys_base = phys;
                }
            }
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_board_layout() {
        let cfg = config_from_cmdline(None);
        assert_eq!(cfg.phys_base.as_u64(), 0xFFE0_0000);
        assert_eq!(cfg.window_len, 0x1F_FFFF);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn cmdline_accepts_hex_and_decimal() {
        let cfg = config_from_cmdline(Some(
            "quiet bbapi.search_area=0x1000 bbapi.phys_base=4293918720",
        ));
        assert_eq!(cfg.window_len, 0x1000);
        assert_eq!(cfg.phys_base.as_u64(), 0xFFF0_0000);
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let cfg = config_from_cmdline(Some("bbapi.search_area=lots bbapi.phys_base=0xzz"));
        assert_eq!(cfg, SearchConfig::default());
    }

    #[test]
    fn oversized_window_fails_validation() {
        let cfg = config_from_cmdline(Some("bbapi.search_area=0x200000"));
        assert_eq!(
            cfg.validate(),
            Err(BridgeError::Configuration {
                requested: 0x20_0000,
                max: BBAPI_MAX_SEARCH_AREA
            })
        );
        assert!(SearchConfig::new(BBAPI_MAX_SEARCH_AREA + 1).is_err());
        assert!(SearchConfig::new(0x1000).is_ok());
    }
}
