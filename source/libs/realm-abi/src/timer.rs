// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Generic timer control register bits (CNTP_CTL_EL0 / CNTV_CTL_EL0).

use bitflags::bitflags;

bitflags! {
    /// `CNTx_CTL` layout shared by the physical and virtual channel.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct TimerCtl: u64 {
        /// Timer enabled.
        const ENABLE = 1 << 0;
        /// Timer interrupt masked.
        const IMASK = 1 << 1;
        /// Timer condition met (read-only in hardware).
        const ISTATUS = 1 << 2;
    }
}
