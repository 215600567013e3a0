// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Diagnostics for the P0 monitor (byte sink + leveled log lines)
//! OWNERS: @realm-runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! PUBLIC API: console::{ByteSink, Pl011, install, uninstall}, log::{Level, emit}, log_* macros
//! DEPENDS_ON: spin
//! INVARIANTS: Optional; with no sink installed every line is dropped and behaviour is unchanged

#[macro_use]
pub mod log;
pub mod console;
