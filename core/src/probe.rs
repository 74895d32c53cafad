//! Capability probe.
//!
//! The firmware has no feature query. Presence of a feature group is
//! inferred from how the firmware rejects a zero-length read: a group it
//! knows answers "invalid size" or "invalid parameter", an unknown one
//! answers "service not supported". This ties detection to incidental
//! error semantics and is fragile; a firmware revision that changes those
//! codes silently disables the optional subsystems. No better signal is
//! exposed.

use bitflags::bitflags;

use bbapi_abi::index::{
    BIOSIGRP_CXPWRSUPP, BIOSIGRP_SUPS, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT,
    BIOSIOFFS_CXPWRSUPP_GETTYPE, BIOSIOFFS_SUPS_GPIO_PIN, BIOSIOFFS_SUPS_GPIO_PIN_EX,
};
use bbapi_abi::{BIOSAPI_INVALIDPARM, BIOSAPI_INVALIDSIZE};
use bbapi_lib::klog_info;

bitflags! {
    /// Optional feature groups present on this board.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// CX power supply.
        const POWER   = 1 << 0;
        /// Software UPS.
        const SUPS    = 1 << 1;
        /// Front-panel display.
        const DISPLAY = 1 << 2;
    }
}

/// One feature group and the calls that reveal it. Any hit counts.
pub struct ProbeTarget {
    pub capability: Capabilities,
    pub name: &'static str,
    pub calls: &'static [(u32, u32)],
}

pub const PROBE_TARGETS: [ProbeTarget; 3] = [
    ProbeTarget {
        capability: Capabilities::POWER,
        name: "power",
        calls: &[(BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_GETTYPE)],
    },
    ProbeTarget {
        capability: Capabilities::SUPS,
        name: "sups",
        calls: &[
            (BIOSIGRP_SUPS, BIOSIOFFS_SUPS_GPIO_PIN_EX),
            (BIOSIGRP_SUPS, BIOSIOFFS_SUPS_GPIO_PIN),
        ],
    },
    ProbeTarget {
        capability: Capabilities::DISPLAY,
        name: "display",
        calls: &[(BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT)],
    },
];

/// Interpretation of the raw status of a zero-length probe read.
#[inline]
pub const fn status_indicates_support(status: u32) -> bool {
    matches!(status, BIOSAPI_INVALIDSIZE | BIOSAPI_INVALIDPARM)
}

/// Run every probe through `raw_status`, which performs one zero-length
/// trusted read and returns the firmware status.
pub fn probe_capabilities(mut raw_status: impl FnMut(u32, u32) -> u32) -> Capabilities {
    let mut caps = Capabilities::empty();
    for target in &PROBE_TARGETS {
        let present = target
            .calls
            .iter()
            .any(|&(group, offset)| status_indicates_support(raw_status(group, offset)));
        if present {
            caps |= target.capability;
        }
        klog_info!(
            "bbapi: {} {}",
            target.name,
            if present { "present" } else { "absent" }
        );
    }
    caps
}

macro_rules! capability_accessors {
    ($($name:ident => $flag:ident),* $(,)?) => {
        paste::paste! {
            impl Capabilities {
                $(
                    #[inline]
                    pub const fn [<supports_ $name>](&self) -> bool {
                        self.contains(Self::$flag)
                    }
                )*
            }
        }
    };
}

capability_accessors! {
    power => POWER,
    sups => SUPS,
    display => DISPLAY,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbapi_abi::{BIOSAPI_ERROR, BIOSAPI_SRVNOTSUPP, BIOSAPI_SUCCESS};
    use std::vec::Vec;

    #[test]
    fn only_argument_rejections_mean_present() {
        assert!(status_indicates_support(BIOSAPI_INVALIDSIZE));
        assert!(status_indicates_support(BIOSAPI_INVALIDPARM));
        for status in [BIOSAPI_SUCCESS, BIOSAPI_SRVNOTSUPP, BIOSAPI_ERROR, 0x702, 0x2] {
            assert!(!status_indicates_support(status), "{:#x}", status);
        }
    }

    #[test]
    fn probe_is_deterministic() {
        let all = probe_capabilities(|_, _| BIOSAPI_INVALIDPARM);
        assert_eq!(all, Capabilities::all());
        assert_eq!(probe_capabilities(|_, _| BIOSAPI_INVALIDPARM), all);

        let none = probe_capabilities(|_, _| BIOSAPI_SUCCESS);
        assert!(none.is_empty());
    }

    #[test]
    fn sups_accepts_either_pin_query() {
        let caps = probe_capabilities(|group, offset| {
            if group == BIOSIGRP_SUPS && offset == BIOSIOFFS_SUPS_GPIO_PIN {
                BIOSAPI_INVALIDSIZE
            } else {
                BIOSAPI_SRVNOTSUPP
            }
        });
        assert_eq!(caps, Capabilities::SUPS);
        assert!(caps.supports_sups());
        assert!(!caps.supports_power());
        assert!(!caps.supports_display());
    }

    #[test]
    fn probe_issues_one_call_per_pair_at_most() {
        let mut seen = Vec::new();
        probe_capabilities(|group, offset| {
            seen.push((group, offset));
            BIOSAPI_SRVNOTSUPP
        });
        assert_eq!(
            seen,
            [
                (BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_GETTYPE),
                (BIOSIGRP_SUPS, BIOSIOFFS_SUPS_GPIO_PIN_EX),
                (BIOSIGRP_SUPS, BIOSIOFFS_SUPS_GPIO_PIN),
                (BIOSIGRP_CXPWRSUPP, BIOSIOFFS_CXPWRSUPP_ENABLEBACKLIGHT),
            ]
        );
    }
}
