// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Realm Services Interface command identifiers and status codes
//! OWNERS: @realm-runtime
//! PUBLIC API: fid::*, RsiError, status_to_result(), Ripas, ChangeFlags, EnterFlags, ExitReason
//! INVARIANTS: FIDs are SMC64 fast calls owned by the standard secure service range

use core::fmt;

use bitflags::bitflags;

use crate::smccc::{fast_call, OWNER_STANDARD};

const fn rsi_fid(function: u64) -> u64 {
    fast_call(true, OWNER_STANDARD, function)
}

/// RSI function identifiers.
pub mod fid {
    use super::rsi_fid;

    /// `RSI_VERSION`.
    pub const ABI_VERSION: u64 = rsi_fid(0x190);
    /// `RSI_FEATURES`.
    pub const FEATURES: u64 = rsi_fid(0x191);
    /// `RSI_MEASUREMENT_READ`.
    pub const MEASUREMENT_READ: u64 = rsi_fid(0x192);
    /// `RSI_MEASUREMENT_EXTEND`.
    pub const MEASUREMENT_EXTEND: u64 = rsi_fid(0x193);
    /// `RSI_ATTESTATION_TOKEN_INIT`.
    pub const ATTESTATION_TOKEN_INIT: u64 = rsi_fid(0x194);
    /// `RSI_ATTESTATION_TOKEN_CONTINUE`.
    pub const ATTESTATION_TOKEN_CONTINUE: u64 = rsi_fid(0x195);
    /// `RSI_REALM_CONFIG`.
    pub const REALM_CONFIG: u64 = rsi_fid(0x196);
    /// `RSI_IPA_STATE_SET`.
    pub const IPA_STATE_SET: u64 = rsi_fid(0x197);
    /// `RSI_IPA_STATE_GET`.
    pub const IPA_STATE_GET: u64 = rsi_fid(0x198);
    /// `RSI_HOST_CALL`.
    pub const HOST_CALL: u64 = rsi_fid(0x199);
    /// `RSI_PLANE_ENTER`.
    pub const PLANE_ENTER: u64 = rsi_fid(0x1a3);
    /// `RSI_PLANE_SYSREG_READ`.
    pub const PLANE_SYSREG_READ: u64 = rsi_fid(0x1ae);
    /// `RSI_PLANE_SYSREG_WRITE`.
    pub const PLANE_SYSREG_WRITE: u64 = rsi_fid(0x1af);
}

/// Raw status codes returned in x0.
pub mod status {
    /// Command completed.
    pub const SUCCESS: u64 = 0;
    /// An input argument was invalid.
    pub const ERROR_INPUT: u64 = 1;
    /// The target object is in the wrong state.
    pub const ERROR_STATE: u64 = 2;
    /// The operation completed only partially.
    pub const INCOMPLETE: u64 = 3;
    /// Unknown error.
    pub const ERROR_UNKNOWN: u64 = 4;
}

/// Non-success RSI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiError {
    /// `RSI_ERROR_INPUT`.
    Input,
    /// `RSI_ERROR_STATE`.
    State,
    /// `RSI_INCOMPLETE`.
    Incomplete,
    /// `RSI_ERROR_UNKNOWN`.
    Unknown,
    /// Status outside the architected set.
    Other(u64),
}

impl RsiError {
    /// Maps a non-zero status word to an error.
    pub const fn from_status(raw: u64) -> Self {
        match raw {
            status::ERROR_INPUT => Self::Input,
            status::ERROR_STATE => Self::State,
            status::INCOMPLETE => Self::Incomplete,
            status::ERROR_UNKNOWN => Self::Unknown,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for RsiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("RSI_ERROR_INPUT"),
            Self::State => f.write_str("RSI_ERROR_STATE"),
            Self::Incomplete => f.write_str("RSI_INCOMPLETE"),
            Self::Unknown => f.write_str("RSI_ERROR_UNKNOWN"),
            Self::Other(raw) => write!(f, "RSI status {raw:#x}"),
        }
    }
}

/// Converts a raw x0 status into a `Result`.
pub const fn status_to_result(raw: u64) -> Result<(), RsiError> {
    if raw == status::SUCCESS {
        Ok(())
    } else {
        Err(RsiError::from_status(raw))
    }
}

/// Realm IPA state as tracked by the isolation firmware.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ripas {
    /// Unbacked; accesses fault to the host.
    Empty = 0,
    /// Protected realm RAM.
    Ram = 1,
    /// Destroyed by the host; inaccessible until re-accepted.
    Destroyed = 2,
    /// Device memory assigned to the realm.
    Dev = 3,
}

/// Flags for `RSI_IPA_STATE_SET`.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFlags {
    /// Refuse to change `DESTROYED` granules.
    NoChangeDestroyed = 0,
    /// Allow `DESTROYED` granules to change state.
    ChangeDestroyed = 1,
}

/// Response word (x2) of `RSI_IPA_STATE_SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpaResponse {
    /// The host accepted the state change.
    Accept,
    /// The host rejected the state change.
    Reject,
}

impl IpaResponse {
    /// Decodes x2; anything other than `RSI_ACCEPT` counts as a rejection.
    pub const fn from_raw(raw: u64) -> Self {
        if raw == 0 {
            Self::Accept
        } else {
            Self::Reject
        }
    }
}

/// Granule shift used by RSI range commands.
pub const GRANULE_SHIFT: u64 = 12;
/// Granule size used by RSI range commands.
pub const GRANULE_SIZE: u64 = 1 << GRANULE_SHIFT;

bitflags! {
    /// `RsiPlaneEnterFlags`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct EnterFlags: u64 {
        /// Trap WFI executed by the plane.
        const TRAP_WFI = 1 << 0;
        /// Trap WFE executed by the plane.
        const TRAP_WFE = 1 << 1;
        /// Trap host calls executed by the plane.
        const TRAP_HC = 1 << 2;
        /// The plane owns the GIC CPU interface on entry.
        const GIC_OWNER = 1 << 3;
        /// SIMD state is shared with the plane.
        const GIC_SIMD = 1 << 4;
    }
}

/// Exit reason reported in `PlaneExit::reason`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Synchronous exception taken to P0.
    Sync = 0,
    /// Physical IRQ or GIC maintenance interrupt.
    Irq = 1,
    /// Host-initiated exit.
    Host = 2,
}

impl ExitReason {
    /// Decodes the raw reason byte.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Sync),
            1 => Some(Self::Irq),
            2 => Some(Self::Host),
            _ => None,
        }
    }
}

/// Encodes a system register the way `RSI_PLANE_SYSREG_*` expects it
/// (`sys_reg(op0, op1, crn, crm, op2) >> 5`).
pub const fn sysreg_id(op0: u64, op1: u64, crn: u64, crm: u64, op2: u64) -> u64 {
    ((op0 << 19) | (op1 << 16) | (crn << 12) | (crm << 8) | (op2 << 5)) >> 5
}

/// `TTBR1_EL1`.
pub const SYSREG_TTBR1_EL1: u64 = sysreg_id(3, 0, 2, 0, 1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fids_match_published_values() {
        assert_eq!(fid::ABI_VERSION, 0xc400_0190);
        assert_eq!(fid::REALM_CONFIG, 0xc400_0196);
        assert_eq!(fid::IPA_STATE_SET, 0xc400_0197);
        assert_eq!(fid::PLANE_ENTER, 0xc400_01a3);
        assert_eq!(fid::PLANE_SYSREG_READ, 0xc400_01ae);
    }

    #[test]
    fn status_words_decode() {
        assert_eq!(status_to_result(0), Ok(()));
        assert_eq!(status_to_result(1), Err(RsiError::Input));
        assert_eq!(status_to_result(9), Err(RsiError::Other(9)));
    }

    #[test]
    fn ttbr1_id_matches_sysreg_encoding() {
        assert_eq!(SYSREG_TTBR1_EL1, 0x182020 >> 5);
    }

    #[test]
    fn unknown_exit_reason_is_rejected() {
        assert_eq!(ExitReason::from_raw(2), Some(ExitReason::Host));
        assert_eq!(ExitReason::from_raw(7), None);
    }
}
