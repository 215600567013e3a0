// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Realm Services Interface call gate used by P0
//! OWNERS: @realm-runtime
//! PUBLIC API: Rsi trait, SmcRsi (aarch64), set_memory_range(), set_memory_range_shared()
//! DEPENDS_ON: realm-abi::rsi (FIDs, status codes, RIPAS)
//! INVARIANTS: Calls are synchronous; plane_enter blocks until the plane exits;
//!             range conversion only ever moves forward through [start, end)

use core::fmt;

use realm_abi::rsi::{ChangeFlags, IpaResponse, Ripas, RsiError};
use realm_abi::{PlaneRun, RealmConfig};

/// Outcome of one `RSI_IPA_STATE_SET` round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpaStateChange {
    /// First IPA not yet converted.
    pub top: u64,
    /// Whether the host accepted the change.
    pub response: IpaResponse,
}

/// Synchronous gate to the realm firmware.
///
/// Everything privileged the monitor does goes through this trait so the scheduler and the
/// trap handlers can run against scripted firmware in tests.
pub trait Rsi {
    /// Reads system register `id` (see [`realm_abi::rsi::sysreg_id`]) of `plane`.
    fn plane_sysreg_read(&mut self, plane: u64, id: u64) -> Result<u64, RsiError>;

    /// Writes system register `id` of `plane`.
    fn plane_sysreg_write(&mut self, plane: u64, id: u64, value: u64) -> Result<(), RsiError>;

    /// Enters or resumes `plane`; returns the raw status once the plane exits.
    ///
    /// `run == None` passes a null run page (only the debug hook does this).
    fn plane_enter(&mut self, plane: u64, run: Option<&mut PlaneRun>) -> u64;

    /// Requests a RIPAS change of `[start, end)`.
    fn ipa_state_set(
        &mut self,
        start: u64,
        end: u64,
        ripas: Ripas,
        flags: ChangeFlags,
    ) -> Result<IpaStateChange, RsiError>;

    /// Fills `config` with the realm configuration page.
    fn realm_config(&mut self, config: &mut RealmConfig) -> Result<(), RsiError>;
}

/// Failure to convert a whole IPA range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// The firmware returned an error status.
    Rsi(RsiError),
    /// The host refused the change starting at `at`.
    Rejected { at: u64 },
    /// The reported top did not move past `at`.
    NoProgress { at: u64 },
    /// The reported top lies beyond the requested end.
    TopOutOfRange { top: u64, end: u64 },
}

impl From<RsiError> for RangeError {
    fn from(err: RsiError) -> Self {
        RangeError::Rsi(err)
    }
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Rsi(err) => write!(f, "ipa state set failed: {err}"),
            RangeError::Rejected { at } => write!(f, "host rejected ripas change at {at:#x}"),
            RangeError::NoProgress { at } => write!(f, "ripas change stalled at {at:#x}"),
            RangeError::TopOutOfRange { top, end } => {
                write!(f, "ripas top {top:#x} beyond end {end:#x}")
            }
        }
    }
}

/// Converts `[start, end)` to `ripas`, looping until the firmware reports the whole range done.
pub fn set_memory_range<R: Rsi + ?Sized>(
    rsi: &mut R,
    mut start: u64,
    end: u64,
    ripas: Ripas,
    flags: ChangeFlags,
) -> Result<(), RangeError> {
    while start < end {
        let change = rsi.ipa_state_set(start, end, ripas, flags)?;
        if change.response != IpaResponse::Accept {
            return Err(RangeError::Rejected { at: start });
        }
        if change.top <= start {
            return Err(RangeError::NoProgress { at: start });
        }
        if change.top > end {
            return Err(RangeError::TopOutOfRange { top: change.top, end });
        }
        start = change.top;
    }
    Ok(())
}

/// Makes `[start, end)` shared with the host (RIPAS `EMPTY`, destroyed granules allowed).
pub fn set_memory_range_shared<R: Rsi + ?Sized>(
    rsi: &mut R,
    start: u64,
    end: u64,
) -> Result<(), RangeError> {
    set_memory_range(rsi, start, end, Ripas::Empty, ChangeFlags::ChangeDestroyed)
}

#[cfg(target_arch = "aarch64")]
pub use smc::SmcRsi;

#[cfg(target_arch = "aarch64")]
mod smc {
    use core::arch::asm;

    use realm_abi::rsi::{fid, status_to_result, ChangeFlags, IpaResponse, Ripas, RsiError};
    use realm_abi::{PlaneRun, RealmConfig};

    use super::{IpaStateChange, Rsi};

    /// RSI over `SMC #0` (SMCCC 64-bit fast calls).
    ///
    /// P0 runs with a flat mapping, so the addresses of the run and config pages are passed
    /// to the firmware as IPAs unchanged.
    pub struct SmcRsi;

    #[inline(always)]
    fn smc(x0: u64, x1: u64, x2: u64, x3: u64, x4: u64) -> [u64; 3] {
        let (mut r0, mut r1, mut r2) = (x0, x1, x2);
        // SAFETY: SMCCC call; the firmware only touches registers x0-x17 and the memory
        // handed over by the caller.
        unsafe {
            asm!(
                "smc #0",
                inout("x0") r0,
                inout("x1") r1,
                inout("x2") r2,
                inout("x3") x3 => _,
                inout("x4") x4 => _,
                lateout("x5") _, lateout("x6") _, lateout("x7") _,
                lateout("x8") _, lateout("x9") _, lateout("x10") _,
                lateout("x11") _, lateout("x12") _, lateout("x13") _,
                lateout("x14") _, lateout("x15") _, lateout("x16") _,
                lateout("x17") _,
                options(nostack),
            );
        }
        [r0, r1, r2]
    }

    impl Rsi for SmcRsi {
        fn plane_sysreg_read(&mut self, plane: u64, id: u64) -> Result<u64, RsiError> {
            let [status, value, _] = smc(fid::PLANE_SYSREG_READ, plane, id, 0, 0);
            status_to_result(status).map(|()| value)
        }

        fn plane_sysreg_write(&mut self, plane: u64, id: u64, value: u64) -> Result<(), RsiError> {
            let [status, _, _] = smc(fid::PLANE_SYSREG_WRITE, plane, id, value, 0);
            status_to_result(status)
        }

        fn plane_enter(&mut self, plane: u64, run: Option<&mut PlaneRun>) -> u64 {
            let addr = run.map_or(0, |run| run as *mut PlaneRun as u64);
            smc(fid::PLANE_ENTER, plane, addr, 0, 0)[0]
        }

        fn ipa_state_set(
            &mut self,
            start: u64,
            end: u64,
            ripas: Ripas,
            flags: ChangeFlags,
        ) -> Result<IpaStateChange, RsiError> {
            let [status, top, response] =
                smc(fid::IPA_STATE_SET, start, end, ripas as u64, flags as u64);
            status_to_result(status)?;
            Ok(IpaStateChange { top, response: IpaResponse::from_raw(response) })
        }

        fn realm_config(&mut self, config: &mut RealmConfig) -> Result<(), RsiError> {
            let addr = config as *mut RealmConfig as u64;
            status_to_result(smc(fid::REALM_CONFIG, addr, 0, 0, 0)[0])
        }
    }
}
