// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Fixed encodings shared between the primary-plane monitor and realm firmware
//! OWNERS: @realm-runtime
//! PUBLIC API: rsi (FIDs, status, RIPAS, enter flags), smccc/psci IDs, esr (classes + ISS),
//!             gic (list-register fields, HCR), timer (CNTx_CTL), layout (RealmConfig, PlaneRun)
//! DEPENDS_ON: bitflags, static_assertions
//! INVARIANTS: PlaneRun is exactly one 4 KiB page (enter @0x000, exit @0x800);
//!             RealmConfig is exactly one 4 KiB page; FIDs follow SMCCC fast/SMC64/standard

pub mod esr;
pub mod gic;
pub mod layout;
pub mod rsi;
pub mod smccc;
pub mod timer;

pub use esr::ExceptionClass;
pub use layout::{PlaneEnter, PlaneExit, PlaneRun, RealmConfig, PLANE_GIC_LRS, PLANE_GPRS};
pub use rsi::{EnterFlags, ExitReason, Ripas, RsiError};
