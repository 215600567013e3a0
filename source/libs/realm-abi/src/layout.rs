// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Memory layouts exchanged with realm firmware by physical address
//! OWNERS: @realm-runtime
//! PUBLIC API: RealmConfig, PlaneEnter, PlaneExit, PlaneRun
//! INVARIANTS: Field offsets are fixed by the RSI planes extension; checked at compile time

use core::mem::{offset_of, size_of};

use static_assertions::const_assert_eq;

/// General purpose registers carried across plane entry (x0..x30).
pub const PLANE_GPRS: usize = 31;
/// List registers carried across plane entry.
pub const PLANE_GIC_LRS: usize = 16;

/// `RsiRealmConfig`: one page written by `RSI_REALM_CONFIG`.
#[repr(C, align(0x1000))]
#[derive(Debug, Clone)]
pub struct RealmConfig {
    /// IPA width in bits.
    pub ipa_bits: u64,
    /// Measurement hash algorithm.
    pub hash_algo: u64,
    /// Number of auxiliary planes.
    pub num_aux_planes: u64,
    /// ICH_VTR_EL2 as seen by the realm.
    pub gicv3_vtr: u64,
    /// Plane that owns ATS.
    pub ats_plane: u64,
    _pad0: [u64; (0x200 - 5 * 8) / 8],
    /// Realm personalization value.
    pub rpv: [u8; 64],
    _pad1: [u64; (0xe00 - 64) / 8],
}

impl RealmConfig {
    /// Returns a zero-filled configuration page.
    pub const fn zeroed() -> Self {
        Self {
            ipa_bits: 0,
            hash_algo: 0,
            num_aux_planes: 0,
            gicv3_vtr: 0,
            ats_plane: 0,
            _pad0: [0; (0x200 - 5 * 8) / 8],
            rpv: [0; 64],
            _pad1: [0; (0xe00 - 64) / 8],
        }
    }
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// `RsiPlaneEnter`: state installed into the target plane.
#[repr(C, align(0x800))]
#[derive(Debug, Clone)]
pub struct PlaneEnter {
    /// `RsiPlaneEnterFlags`.
    pub flags: u64,
    /// Program counter to resume at.
    pub pc: u64,
    _pad0: [u64; (0x100 - 0x10) / 8],
    /// x0..x30.
    pub gprs: [u64; PLANE_GPRS],
    _pad1: [u64; 1],
    /// ICH_HCR_EL2.
    pub gicv3_hcr: u64,
    /// ICH_LR<n>_EL2.
    pub gicv3_lrs: [u64; PLANE_GIC_LRS],
    _pad2: [u64; (0x100 - 8 - PLANE_GIC_LRS * 8) / 8],
    /// Saved program status to resume with.
    pub spsr_el2: u64,
    _pad3: [u64; (0x500 - 8) / 8],
}

/// `RsiPlaneExit`: state reported back when the plane exits to P0.
#[repr(C, align(0x800))]
#[derive(Debug, Clone)]
pub struct PlaneExit {
    /// `RsiExitReason`.
    pub reason: u8,
    _pad0: [u8; 7],
    _pad1: [u64; (0x100 - 8) / 8],
    /// Exception link register.
    pub elr_el2: u64,
    /// Exception syndrome.
    pub esr_el2: u64,
    /// Faulting virtual address.
    pub far_el2: u64,
    /// Faulting IPA (page granular, shifted).
    pub hpfar_el2: u64,
    /// Program status at exit.
    pub spsr_el2: u64,
    _pad2: [u64; (0x100 - 5 * 8) / 8],
    /// x0..x30.
    pub gprs: [u64; PLANE_GPRS],
    _pad3: [u64; 1],
    /// ICH_HCR_EL2.
    pub gicv3_hcr: u64,
    /// ICH_LR<n>_EL2.
    pub gicv3_lrs: [u64; PLANE_GIC_LRS],
    /// ICH_MISR_EL2.
    pub gicv3_misr: u64,
    /// ICH_VMCR_EL2.
    pub gicv3_vmcr: u64,
    _pad4: [u64; (0x100 - 8 - PLANE_GIC_LRS * 8 - 16) / 8],
    /// CNTP_CTL_EL0.
    pub cntp_ctl: u64,
    /// CNTP_CVAL_EL0.
    pub cntp_cval: u64,
    /// CNTV_CTL_EL0.
    pub cntv_ctl: u64,
    /// CNTV_CVAL_EL0.
    pub cntv_cval: u64,
    _pad5: [u64; (0x400 - 4 * 8) / 8],
}

/// `RsiPlaneRun`: the single page passed to `RSI_PLANE_ENTER`.
#[repr(C, align(0x1000))]
#[derive(Debug, Clone)]
pub struct PlaneRun {
    /// Entry half, written by P0 before entering.
    pub enter: PlaneEnter,
    /// Exit half, written by firmware on return.
    pub exit: PlaneExit,
}

impl PlaneEnter {
    /// Zero-filled entry record.
    pub const fn zeroed() -> Self {
        Self {
            flags: 0,
            pc: 0,
            _pad0: [0; (0x100 - 0x10) / 8],
            gprs: [0; PLANE_GPRS],
            _pad1: [0; 1],
            gicv3_hcr: 0,
            gicv3_lrs: [0; PLANE_GIC_LRS],
            _pad2: [0; (0x100 - 8 - PLANE_GIC_LRS * 8) / 8],
            spsr_el2: 0,
            _pad3: [0; (0x500 - 8) / 8],
        }
    }
}

impl PlaneExit {
    /// Zero-filled exit record.
    pub const fn zeroed() -> Self {
        Self {
            reason: 0,
            _pad0: [0; 7],
            _pad1: [0; (0x100 - 8) / 8],
            elr_el2: 0,
            esr_el2: 0,
            far_el2: 0,
            hpfar_el2: 0,
            spsr_el2: 0,
            _pad2: [0; (0x100 - 5 * 8) / 8],
            gprs: [0; PLANE_GPRS],
            _pad3: [0; 1],
            gicv3_hcr: 0,
            gicv3_lrs: [0; PLANE_GIC_LRS],
            gicv3_misr: 0,
            gicv3_vmcr: 0,
            _pad4: [0; (0x100 - 8 - PLANE_GIC_LRS * 8 - 16) / 8],
            cntp_ctl: 0,
            cntp_cval: 0,
            cntv_ctl: 0,
            cntv_cval: 0,
            _pad5: [0; (0x400 - 4 * 8) / 8],
        }
    }
}

impl PlaneRun {
    /// Zero-filled run page.
    pub const fn zeroed() -> Self {
        Self { enter: PlaneEnter::zeroed(), exit: PlaneExit::zeroed() }
    }
}

impl Default for PlaneRun {
    fn default() -> Self {
        Self::zeroed()
    }
}

const_assert_eq!(size_of::<RealmConfig>(), 0x1000);
const_assert_eq!(offset_of!(RealmConfig, num_aux_planes), 0x10);
const_assert_eq!(offset_of!(RealmConfig, rpv), 0x200);

const_assert_eq!(size_of::<PlaneEnter>(), 0x800);
const_assert_eq!(offset_of!(PlaneEnter, pc), 0x8);
const_assert_eq!(offset_of!(PlaneEnter, gprs), 0x100);
const_assert_eq!(offset_of!(PlaneEnter, gicv3_hcr), 0x200);
const_assert_eq!(offset_of!(PlaneEnter, gicv3_lrs), 0x208);
const_assert_eq!(offset_of!(PlaneEnter, spsr_el2), 0x300);

const_assert_eq!(size_of::<PlaneExit>(), 0x800);
const_assert_eq!(offset_of!(PlaneExit, elr_el2), 0x100);
const_assert_eq!(offset_of!(PlaneExit, hpfar_el2), 0x118);
const_assert_eq!(offset_of!(PlaneExit, gprs), 0x200);
const_assert_eq!(offset_of!(PlaneExit, gicv3_hcr), 0x300);
const_assert_eq!(offset_of!(PlaneExit, gicv3_misr), 0x388);
const_assert_eq!(offset_of!(PlaneExit, cntp_ctl), 0x400);

const_assert_eq!(size_of::<PlaneRun>(), 0x1000);
const_assert_eq!(offset_of!(PlaneRun, exit), 0x800);
