// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Trapped MSR/MRS accesses.

use super::Fault;
use crate::context::PlaneContext;

/// ISS of `msr mdscr_el1, x1`, issued by plane kernels while setting up debug state.
pub const MDSCR_EL1_WRITE_X1: u32 = 0x24_0024;

/// Skips the one access plane kernels are allowed to make; everything else is fatal.
pub(super) fn handle(ctx: &mut PlaneContext, iss: u32) -> Result<(), Fault> {
    if iss != MDSCR_EL1_WRITE_X1 {
        return Err(Fault::UnhandledSysReg { iss });
    }
    ctx.pc = ctx.pc.wrapping_add(4);
    Ok(())
}
