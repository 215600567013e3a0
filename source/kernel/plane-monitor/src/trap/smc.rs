// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! SMCCC/PSCI calls emulated for plane kernels.

use realm_abi::rsi::fid::ABI_VERSION as RSI_ABI_VERSION;
use realm_abi::smccc::{self, NOT_SUPPORTED, SUCCESS};

use super::Fault;
use crate::context::PlaneContext;
use crate::rsi::Rsi;

/// Function id of the bring-up hook that re-enters RSI_PLANE_ENTER directly.
pub const DEBUG_HOOK_FID: u64 = 0xbeef_dead;
/// Plane argument passed by the bring-up hook.
pub const DEBUG_HOOK_PLANE: u64 = 0xdead_beef;

/// Result registers written back on a handled call.
const RESULT_REGS: usize = 5;

/// Answer to `fid` in x0, or `None` when the call is not emulated.
fn emulate(fid: u64, x1: u64) -> Option<u64> {
    let x0 = match fid {
        smccc::SMCCC_VERSION => smccc::version(1, 2),
        smccc::SMCCC_ARCH_FEATURES => NOT_SUPPORTED,
        smccc::PSCI_VERSION => smccc::version(1, 1),
        smccc::PSCI_MIGRATE_INFO_TYPE => NOT_SUPPORTED,
        smccc::PSCI_FEATURES => match x1 {
            smccc::SMCCC_VERSION | smccc::PSCI_CPU_SUSPEND_64 => SUCCESS,
            _ => NOT_SUPPORTED,
        },
        smccc::PSCI_TRNG => NOT_SUPPORTED,
        RSI_ABI_VERSION => NOT_SUPPORTED,
        _ => return None,
    };
    Some(x0)
}

pub(super) fn handle<R: Rsi + ?Sized>(rsi: &mut R, ctx: &mut PlaneContext) -> Result<(), Fault> {
    let fid = ctx.gprs[0];
    if fid == DEBUG_HOOK_FID {
        debug_hook(rsi);
        return Err(Fault::UnhandledSmc { fid });
    }

    let Some(x0) = emulate(fid, ctx.gprs[1]) else {
        log_warn!(target: "trap", "{}: SMC {:#x} not handled", ctx.index(), fid);
        return Err(Fault::UnhandledSmc { fid });
    };

    // x4 is passed through untouched; x1..x3 are cleared.
    let mut results = [0u64; RESULT_REGS];
    results[0] = x0;
    results[4] = ctx.gprs[4];
    ctx.gprs[..RESULT_REGS].copy_from_slice(&results);
    ctx.pc = ctx.pc.wrapping_add(4);
    Ok(())
}

#[cfg(feature = "smc_debug_hook")]
fn debug_hook<R: Rsi + ?Sized>(rsi: &mut R) {
    let status = rsi.plane_enter(DEBUG_HOOK_PLANE, None);
    log_debug!(target: "trap", "SMC debug hook: plane_enter -> {:#x}", status);
}

#[cfg(not(feature = "smc_debug_hook"))]
fn debug_hook<R: Rsi + ?Sized>(_rsi: &mut R) {}
