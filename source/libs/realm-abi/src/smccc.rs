// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! SMC Calling Convention and PSCI function identifiers (DEN0028 / DEN0022).

/// Bit 31: fast call.
pub const FAST_CALL: u64 = 1 << 31;
/// Bit 30: SMC64 calling convention.
pub const SMC64: u64 = 1 << 30;
/// Owning entity field shift (bits 29:24).
pub const OWNER_SHIFT: u64 = 24;
/// Owning entity: standard secure service calls.
pub const OWNER_STANDARD: u64 = 4;

/// Builds a fast-call function identifier.
pub const fn fast_call(smc64: bool, owner: u64, function: u64) -> u64 {
    let cc = if smc64 { SMC64 } else { 0 };
    FAST_CALL | cc | ((owner & 0x3f) << OWNER_SHIFT) | (function & 0xffff)
}

/// `SMCCC_VERSION`.
pub const SMCCC_VERSION: u64 = 0x8000_0000;
/// `SMCCC_ARCH_FEATURES`.
pub const SMCCC_ARCH_FEATURES: u64 = 0x8000_0001;

/// `PSCI_VERSION`.
pub const PSCI_VERSION: u64 = 0x8400_0000;
/// `CPU_SUSPEND` (SMC64).
pub const PSCI_CPU_SUSPEND_64: u64 = 0xc400_0001;
/// `MIGRATE_INFO_TYPE`.
pub const PSCI_MIGRATE_INFO_TYPE: u64 = 0x8400_0006;
/// `PSCI_FEATURES`.
pub const PSCI_FEATURES: u64 = 0x8400_000a;
/// TRNG range probe issued by guests that look for a firmware entropy source.
pub const PSCI_TRNG: u64 = 0x8400_0050;

/// Generic `NOT_SUPPORTED` return (-1 in x0).
pub const NOT_SUPPORTED: u64 = u64::MAX;
/// Generic success return.
pub const SUCCESS: u64 = 0;

/// Encodes a `major.minor` version the way SMCCC and PSCI report it in x0.
pub const fn version(major: u16, minor: u16) -> u64 {
    ((major as u64) << 16) | minor as u64
}
