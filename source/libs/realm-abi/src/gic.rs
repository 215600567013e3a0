// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! GICv3 virtualization register fields (ICH_LR<n>_EL2, ICH_HCR_EL2, ICH_MISR_EL2).

use bitflags::bitflags;

/// ICH_LR.State shift.
pub const LR_STATE_SHIFT: u64 = 62;
/// ICH_LR.State mask.
pub const LR_STATE_MASK: u64 = 0b11 << LR_STATE_SHIFT;
/// ICH_LR.HW.
pub const LR_HW: u64 = 1 << 61;
/// ICH_LR.Group.
pub const LR_GROUP: u64 = 1 << 60;
/// ICH_LR.Priority shift.
pub const LR_PRIORITY_SHIFT: u64 = 48;
/// ICH_LR.EOI (maintenance interrupt on deactivation when HW == 0).
pub const LR_EOI: u64 = 1 << 41;
/// ICH_LR.vINTID mask.
pub const LR_VINTID_MASK: u64 = 0xffff_ffff;

/// PPI raised by the EL1 virtual timer.
pub const VIRTUAL_TIMER_INTID: u32 = 27;

/// ICH_MISR_EL2 value reported when the list registers underflow.
pub const MISR_UNDERFLOW: u64 = 0x1;

/// Life-cycle state of a list-register entry.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LrState {
    /// Free slot.
    Inactive = 0b00,
    /// Pending in the virtual CPU interface.
    Pending = 0b01,
    /// Acknowledged, not yet deactivated.
    Active = 0b10,
    /// Active and pending again.
    ActivePending = 0b11,
}

impl LrState {
    /// Reads the state field of a raw list register.
    pub const fn of(lr: u64) -> Self {
        match (lr & LR_STATE_MASK) >> LR_STATE_SHIFT {
            0b00 => Self::Inactive,
            0b01 => Self::Pending,
            0b10 => Self::Active,
            _ => Self::ActivePending,
        }
    }
}

/// Software description of one virtual interrupt entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRegister {
    /// Entry state.
    pub state: LrState,
    /// Group 1 (true) or group 0.
    pub group1: bool,
    /// Request a maintenance interrupt on EOI.
    pub eoi_maintenance: bool,
    /// Virtual priority.
    pub priority: u8,
    /// Virtual interrupt identity.
    pub vintid: u32,
}

impl ListRegister {
    /// Packs the fields into the ICH_LR<n>_EL2 encoding.
    pub const fn encode(self) -> u64 {
        let mut raw = (self.state as u64) << LR_STATE_SHIFT;
        if self.group1 {
            raw |= LR_GROUP;
        }
        if self.eoi_maintenance {
            raw |= LR_EOI;
        }
        raw | ((self.priority as u64) << LR_PRIORITY_SHIFT) | (self.vintid as u64 & LR_VINTID_MASK)
    }
}

bitflags! {
    /// ICH_HCR_EL2 bits the monitor programs.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct IchHcr: u64 {
        /// Global enable of the virtual CPU interface.
        const EN = 1 << 0;
        /// Underflow maintenance interrupt enable.
        const UIE = 1 << 1;
        /// List-register-entry-not-present maintenance interrupt enable.
        const LRENPIE = 1 << 2;
        /// No-pending maintenance interrupt enable.
        const NPIE = 1 << 3;
        /// Count EOIs of virtual SGIs that have no list register.
        const VSGI_EOI_COUNT = 1 << 8;
        /// Directly-injected virtual interrupts mode.
        const DVIM = 1 << 15;
    }
}
