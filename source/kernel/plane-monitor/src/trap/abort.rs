// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stage-2 data aborts on device and firmware windows.
//!
//! Plane kernels map MMIO through the protected IPA alias. An access there faults to P0,
//! which flips the governing stage-1 descriptor to the unprotected alias (IPA top bit)
//! and lets the plane retry the same instruction.

use realm_abi::esr::hpfar_to_ipa;
use realm_abi::rsi::{GRANULE_SHIFT, GRANULE_SIZE};

use super::{Fault, Syndrome};
use crate::boot::RealmParams;
use crate::context::PlaneIndex;
use crate::mm::{walk, TableMemory, WalkError};
use crate::platform;
use crate::rsi::Rsi;

pub(super) fn handle<R, M>(
    rsi: &mut R,
    mem: &mut M,
    params: &RealmParams,
    plane: PlaneIndex,
    syndrome: &Syndrome,
) -> Result<(), Fault>
where
    R: Rsi + ?Sized,
    M: TableMemory + ?Sized,
{
    let ipa = hpfar_to_ipa(syndrome.hpfar);
    let far = syndrome.far;
    if !platform::is_shared_pfn(ipa >> GRANULE_SHIFT) {
        log_warn!(target: "trap", "{}: DABT ipa={:#x} far={:#x} not a device window", plane, ipa, far);
        return Err(Fault::UnrecognizedAbort { ipa, far });
    }

    let va = far & !(GRANULE_SIZE - 1);
    let fail = move |error: WalkError| Fault::Walk { ipa, far, error };
    let descriptor = walk(rsi, &*mem, plane, va).map_err(fail)?;
    let value = mem
        .set_bits(descriptor, params.shared_attr())
        .map_err(|err| fail(err.into()))?;
    log_debug!(target: "trap", "{}: DABT ipa={:#x} desc@{:#x}={:#x}", plane, ipa, descriptor, value);
    Ok(())
}
