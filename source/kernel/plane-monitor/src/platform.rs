// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Fixed platform description for the QEMU `virt` realm image
//! OWNERS: @realm-runtime
//! PUBLIC API: MMIO_PFNS, is_shared_pfn(), SHARED_WINDOWS, PLANE_RAM, UART0_BASE
//! INVARIANTS: Tables are sorted and non-overlapping; every range is inclusive on both ends

/// Inclusive page-frame range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PfnRange {
    pub first: u64,
    pub last: u64,
}

impl PfnRange {
    const fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    const fn single(pfn: u64) -> Self {
        Self { first: pfn, last: pfn }
    }

    #[inline]
    pub const fn contains(&self, pfn: u64) -> bool {
        self.first <= pfn && pfn <= self.last
    }
}

/// IPA pages a plane may touch only through the shared (unprotected) alias.
///
/// GIC distributor/redistributors, UART, RTC, fw_cfg, flash and the firmware-shared
/// buffers that the host hands to plane kernels.
pub const MMIO_PFNS: &[PfnRange] = &[
    PfnRange::new(0x8000, 0x800f),
    PfnRange::new(0x8080, 0x808f),
    PfnRange::new(0x80a0, 0x8fff),
    PfnRange::single(0x9000),
    PfnRange::single(0x9010),
    PfnRange::single(0x9040),
    PfnRange::new(0xa000, 0xa003),
    PfnRange::new(0x10000, 0x10001),
    PfnRange::new(0x40030, 0x4007f),
    PfnRange::new(0x409da, 0x40a22),
    PfnRange::new(0x41270, 0x4127f),
    PfnRange::new(0xb1600, 0xb55ff),
    PfnRange::new(0xbac00, 0xbacc1),
    PfnRange::single(0xbf4e0),
    PfnRange::new(0x401_0000, 0x401_ffff),
    PfnRange::new(0x800_0000, 0x800_0007),
];

/// Returns true when a stage-2 fault on `pfn` should be resolved by marking the page shared.
pub fn is_shared_pfn(pfn: u64) -> bool {
    MMIO_PFNS.iter().any(|range| range.contains(pfn))
}

/// Half-open IPA window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpaWindow {
    pub start: u64,
    pub end: u64,
}

/// RAM windows converted to RIPAS `EMPTY` before the first plane is built.
pub const SHARED_WINDOWS: &[IpaWindow] = &[
    IpaWindow { start: 0x4003_0000, end: 0x4008_0000 },
    IpaWindow { start: 0x409d_a000, end: 0x40a2_3000 },
    IpaWindow { start: 0x4127_0000, end: 0x4128_0000 },
    IpaWindow { start: 0xb160_0000, end: 0xb560_0000 },
    IpaWindow { start: 0xbac0_0000, end: 0xbacc_2000 },
];

/// Realm RAM that holds plane translation tables, identity-mapped in P0.
pub const PLANE_RAM: &[IpaWindow] = &[IpaWindow { start: 0x4000_0000, end: 0x1_0000_0000 }];

/// PL011 data register of the diagnostic UART.
pub const UART0_BASE: usize = 0x0900_0000;
