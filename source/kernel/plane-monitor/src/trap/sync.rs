// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Synchronous exception classifier.

use realm_abi::esr;
use realm_abi::ExceptionClass;

use super::{abort, smc, sysreg, Fault, Syndrome};
use crate::boot::RealmParams;
use crate::context::PlaneContext;
use crate::mm::TableMemory;
use crate::rsi::Rsi;

pub(super) fn handle<R, M>(
    rsi: &mut R,
    mem: &mut M,
    params: &RealmParams,
    ctx: &mut PlaneContext,
    syndrome: &Syndrome,
) -> Result<(), Fault>
where
    R: Rsi + ?Sized,
    M: TableMemory + ?Sized,
{
    let ec = esr::ec(syndrome.esr);
    match ExceptionClass::from_raw(ec) {
        Some(ExceptionClass::DataAbortLower) => abort::handle(rsi, mem, params, ctx.index(), syndrome),
        Some(ExceptionClass::Smc64) => smc::handle(rsi, ctx),
        Some(ExceptionClass::Sys64) => sysreg::handle(ctx, esr::iss(syndrome.esr)),
        // WFx, instruction aborts and HVC64 have no handler yet and stop the monitor
        // like any other class.
        _ => Err(Fault::UnhandledClass { ec, esr: syndrome.esr }),
    }
}
