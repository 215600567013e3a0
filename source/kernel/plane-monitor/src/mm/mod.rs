// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Access to plane-owned translation tables from P0
//! OWNERS: @realm-runtime
//! PUBLIC API: TableMemory, IdentityMapped, MemError, walk(), TableLevel, WalkError
//! DEPENDS_ON: rsi::Rsi (TTBR1_EL1 of the target plane), platform::PLANE_RAM
//! INVARIANTS: Every descriptor access is 8-byte aligned and bounds-checked against the view;
//!             a walk never dereferences an address the view did not accept

use core::fmt;

use crate::platform::{IpaWindow, PLANE_RAM};

mod walk;

pub use walk::{walk, TableLevel, WalkError, DESC_ADDR_MASK, TTBR_BADDR_MASK};

/// Failure of a single word access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemError {
    /// Address lies outside the memory this view exposes.
    NotMapped { addr: u64 },
    /// Address is not 8-byte aligned.
    Misaligned { addr: u64 },
}

impl fmt::Display for MemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemError::NotMapped { addr } => write!(f, "{addr:#x} not mapped"),
            MemError::Misaligned { addr } => write!(f, "{addr:#x} misaligned"),
        }
    }
}

/// Word-addressed view of the memory holding plane translation tables.
pub trait TableMemory {
    fn read_u64(&self, addr: u64) -> Result<u64, MemError>;

    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), MemError>;

    /// ORs `bits` into the word at `addr` and returns the new value.
    fn set_bits(&mut self, addr: u64, bits: u64) -> Result<u64, MemError> {
        let value = self.read_u64(addr)? | bits;
        self.write_u64(addr, value)?;
        Ok(value)
    }
}

/// Plane RAM mapped 1:1 into P0, restricted to a fixed set of windows.
#[derive(Debug, Clone, Copy)]
pub struct IdentityMapped {
    windows: &'static [IpaWindow],
}

impl IdentityMapped {
    pub const fn new(windows: &'static [IpaWindow]) -> Self {
        Self { windows }
    }

    /// View over the platform's plane RAM.
    pub const fn platform() -> Self {
        Self::new(PLANE_RAM)
    }

    fn check(&self, addr: u64) -> Result<*mut u64, MemError> {
        if addr % 8 != 0 {
            return Err(MemError::Misaligned { addr });
        }
        let end = addr.checked_add(8).ok_or(MemError::NotMapped { addr })?;
        if self.windows.iter().any(|w| w.start <= addr && end <= w.end) {
            Ok(addr as usize as *mut u64)
        } else {
            Err(MemError::NotMapped { addr })
        }
    }
}

impl TableMemory for IdentityMapped {
    fn read_u64(&self, addr: u64) -> Result<u64, MemError> {
        let ptr = self.check(addr)?;
        // SAFETY: `check` confined the access to aligned plane RAM that P0 maps 1:1.
        Ok(unsafe { core::ptr::read_volatile(ptr) })
    }

    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), MemError> {
        let ptr = self.check(addr)?;
        // SAFETY: as for `read_u64`.
        unsafe { core::ptr::write_volatile(ptr, value) };
        Ok(())
    }
}
