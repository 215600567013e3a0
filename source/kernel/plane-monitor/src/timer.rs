// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-plane generic timer shadow (EL1 physical and virtual channels).

use realm_abi::timer::TimerCtl;

/// Timer comparator state reported at the last exit of a plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerShadow {
    pub cntp_ctl: u64,
    pub cntp_cval: u64,
    pub cntv_ctl: u64,
    pub cntv_cval: u64,
}

impl TimerShadow {
    pub const fn new() -> Self {
        Self { cntp_ctl: 0, cntp_cval: 0, cntv_ctl: 0, cntv_cval: 0 }
    }

    /// True when either channel is enabled, unmasked and has fired.
    pub fn asserted(&self) -> bool {
        channel_asserted(self.cntp_ctl) || channel_asserted(self.cntv_ctl)
    }
}

fn channel_asserted(ctl: u64) -> bool {
    let relevant = TimerCtl::ENABLE | TimerCtl::IMASK | TimerCtl::ISTATUS;
    (TimerCtl::from_bits_truncate(ctl) & relevant) == (TimerCtl::ENABLE | TimerCtl::ISTATUS)
}
