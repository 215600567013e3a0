// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Plane exit dispatch (sync exceptions, IRQ bookkeeping, host exits)
//! OWNERS: @realm-runtime
//! PUBLIC API: Syndrome, dispatch(), Fault, Halt
//! DEPENDS_ON: gic (reclaim), mm (walk), rsi (debug hook, TTBR reads), platform (abort allow-list)
//! INVARIANTS: Handlers only mutate the saved PlaneContext and plane memory, never the run page;
//!             an Err(Fault) is always final for the whole monitor

use core::fmt;

use realm_abi::gic::MISR_UNDERFLOW;
use realm_abi::{ExceptionClass, ExitReason, PlaneExit};

use crate::boot::RealmParams;
use crate::context::{PlaneContext, PlaneIndex};
use crate::mm::{TableMemory, WalkError};
use crate::rsi::Rsi;

mod abort;
mod smc;
mod sync;
mod sysreg;

pub use sysreg::MDSCR_EL1_WRITE_X1;

/// Exit-only fields of the run page that decide how an exit is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Syndrome {
    pub reason: u8,
    pub esr: u64,
    pub far: u64,
    pub hpfar: u64,
}

impl Syndrome {
    pub fn from_exit(exit: &PlaneExit) -> Self {
        Self { reason: exit.reason, esr: exit.esr_el2, far: exit.far_el2, hpfar: exit.hpfar_el2 }
    }

    /// Synchronous exit with syndrome `esr`.
    pub const fn sync(esr: u64) -> Self {
        Self { reason: ExitReason::Sync as u8, esr, far: 0, hpfar: 0 }
    }
}

/// Why an exit could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Exception class without a handler.
    UnhandledClass { ec: u8, esr: u64 },
    /// SMC function outside the emulated set.
    UnhandledSmc { fid: u64 },
    /// Trapped system-register access other than the ignored one.
    UnhandledSysReg { iss: u32 },
    /// Stage-2 abort on an IPA outside the device allow-list.
    UnrecognizedAbort { ipa: u64, far: u64 },
    /// Allow-listed abort whose descriptor could not be patched.
    Walk { ipa: u64, far: u64, error: WalkError },
    /// Host-initiated exit.
    HostExit,
    /// Exit reason outside the RSI set.
    UnknownExit { reason: u8 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::UnhandledClass { ec, esr } => match ExceptionClass::from_raw(*ec) {
                Some(class) => write!(f, "unhandled {class:?} (esr={esr:#x})"),
                None => write!(f, "unhandled ec {ec:#x} (esr={esr:#x})"),
            },
            Fault::UnhandledSmc { fid } => write!(f, "unhandled smc {fid:#x}"),
            Fault::UnhandledSysReg { iss } => {
                write!(f, "unhandled sysreg trap iss={iss:#x} ({})", realm_abi::esr::SysRegIss::decode(*iss))
            }
            Fault::UnrecognizedAbort { ipa, far } => {
                write!(f, "data abort outside device windows ipa={ipa:#x} far={far:#x}")
            }
            Fault::Walk { ipa, far, error } => {
                write!(f, "cannot share ipa={ipa:#x} far={far:#x}: {error}")
            }
            Fault::HostExit => f.write_str("host exit"),
            Fault::UnknownExit { reason } => write!(f, "unknown exit reason {reason}"),
        }
    }
}

/// Terminal state of the monitor: which plane stopped it and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
    pub plane: PlaneIndex,
    pub fault: Fault,
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} halted: {}", self.plane, self.fault)
    }
}

/// Resolves one exit of `ctx` (already saved from the run page).
pub fn dispatch<R, M>(
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
    match ExitReason::from_raw(syndrome.reason) {
        Some(ExitReason::Sync) => sync::handle(rsi, mem, params, ctx, syndrome),
        Some(ExitReason::Irq) => {
            handle_irq(ctx);
            Ok(())
        }
        Some(ExitReason::Host) => Err(Fault::HostExit),
        None => Err(Fault::UnknownExit { reason: syndrome.reason }),
    }
}

fn handle_irq(ctx: &mut PlaneContext) {
    if ctx.gic.misr == MISR_UNDERFLOW {
        let cleared = ctx.gic.reclaim();
        log_trace!(target: "trap", "{}: lr underflow, reclaimed {}", ctx.index(), cleared);
    }
}
