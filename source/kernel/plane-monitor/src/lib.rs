// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Primary-plane (P0) monitor for an Arm CCA realm with auxiliary planes
//! OWNERS: @realm-runtime
//! PUBLIC API: Monitor (step/run), boot::{boot, boot_single}, Rsi, TableMemory, Halt/Fault
//! DEPENDS_ON: realm-abi (encodings), spin (diag sink), static_assertions
//! INVARIANTS: Exactly one plane runs at a time; the PlaneRun page is shared serially;
//!             the first unhandled exit halts every plane (fail-stop)
//!
//! P0 cooperatively multiplexes one physical CPU across the auxiliary planes of a realm.
//! Each exit from a plane is either resolved locally (device-memory attribute fixups,
//! a tiny PSCI/SMCCC surface, virtual timer and GIC list-register bookkeeping) or it
//! terminates the monitor.

#![cfg_attr(not(test), no_std)]
#![forbid(clippy::unwrap_used)]

#[macro_use]
pub mod diag;

pub mod boot;
pub mod context;
pub mod gic;
pub mod mm;
pub mod platform;
pub mod rsi;
pub mod sched;
pub mod timer;
pub mod trap;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
mod entry;
#[cfg(all(feature = "panic_handler", target_arch = "aarch64", target_os = "none", not(test)))]
mod panic;

#[cfg(test)]
mod testing;

pub use boot::{boot, boot_single, Boot, ConfigError, RealmParams};
pub use context::{PlaneContext, PlaneIndex, PlaneState};
pub use mm::{IdentityMapped, MemError, TableMemory, WalkError};
pub use rsi::{IpaStateChange, RangeError, Rsi};
pub use sched::{Monitor, Step};
pub use trap::{Fault, Halt};

/// Maximum number of auxiliary planes the monitor can host (slots 1..=3).
pub const MAX_AUX_PLANES: usize = 3;
