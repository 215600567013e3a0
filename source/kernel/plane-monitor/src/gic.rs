// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-plane GICv3 virtual CPU interface shadow
//! OWNERS: @realm-runtime
//! PUBLIC API: GicShadow (init/inject_virtual_timer_irq/reclaim), VIRTUAL_TIMER_LR, MANAGED_LRS
//! DEPENDS_ON: realm-abi::gic (list-register fields)
//! INVARIANTS: Injection and reclamation only touch list registers 0..MANAGED_LRS;
//!             at most one canonical timer entry is ever queued by injection

use realm_abi::gic::{IchHcr, ListRegister, LrState, VIRTUAL_TIMER_INTID};
use realm_abi::PLANE_GIC_LRS;

/// List registers scanned by injection and reclamation.
pub const MANAGED_LRS: usize = 4;

/// Pending group-1 virtual timer PPI at priority 0xc0 with EOI maintenance.
pub const VIRTUAL_TIMER_LR: u64 = ListRegister {
    state: LrState::Pending,
    group1: true,
    eoi_maintenance: true,
    priority: 0xc0,
    vintid: VIRTUAL_TIMER_INTID,
}
.encode();

static_assertions::const_assert_eq!(VIRTUAL_TIMER_LR, 0x50c0_0200_0000_001b);
static_assertions::const_assert!(MANAGED_LRS <= PLANE_GIC_LRS);

/// Control bits programmed into ICH_HCR_EL2 for every plane.
pub const PLANE_HCR: IchHcr = IchHcr::EN.union(IchHcr::VSGI_EOI_COUNT).union(IchHcr::DVIM);

/// Result of a timer injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// A canonical entry was already present in `slot`.
    AlreadyQueued { slot: usize },
    /// The canonical entry was written to `slot`.
    Queued { slot: usize },
    /// No managed slot was free; the interrupt is lost.
    Dropped,
}

/// Saved virtual interface state of one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GicShadow {
    pub hcr: u64,
    pub lrs: [u64; PLANE_GIC_LRS],
    pub misr: u64,
    pub vmcr: u64,
}

impl GicShadow {
    pub const fn new() -> Self {
        Self { hcr: 0, lrs: [0; PLANE_GIC_LRS], misr: 0, vmcr: 0 }
    }

    /// Resets the shadow to the state every plane starts with.
    pub fn init(&mut self) {
        *self = Self { hcr: PLANE_HCR.bits(), ..Self::new() };
    }

    /// Queues the virtual timer interrupt unless it is already queued.
    pub fn inject_virtual_timer_irq(&mut self) -> Injection {
        let managed = &mut self.lrs[..MANAGED_LRS];
        if let Some(slot) = managed.iter().position(|&lr| lr == VIRTUAL_TIMER_LR) {
            return Injection::AlreadyQueued { slot };
        }
        match managed.iter().position(|&lr| LrState::of(lr) == LrState::Inactive) {
            Some(slot) => {
                managed[slot] = VIRTUAL_TIMER_LR;
                Injection::Queued { slot }
            }
            None => Injection::Dropped,
        }
    }

    /// Zeroes every managed list register whose entry has been consumed.
    ///
    /// Returns the number of slots that held stale data.
    pub fn reclaim(&mut self) -> usize {
        let mut cleared = 0;
        for lr in self.lrs[..MANAGED_LRS].iter_mut() {
            if LrState::of(*lr) == LrState::Inactive {
                if *lr != 0 {
                    cleared += 1;
                }
                *lr = 0;
            }
        }
        cleared
    }
}

impl Default for GicShadow {
    fn default() -> Self {
        Self::new()
    }
}
