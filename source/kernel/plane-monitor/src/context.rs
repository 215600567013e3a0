// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Persistent per-plane register record and its exchange with the run page
//! OWNERS: @realm-runtime
//! PUBLIC API: PlaneContext (init/restore/save), PlaneState, PlaneIndex
//! DEPENDS_ON: gic::GicShadow, timer::TimerShadow, realm-abi::layout::PlaneRun
//! INVARIANTS: restore/save are the only paths between a context and the run page;
//!             `index` never changes once the context exists

use core::fmt;

use realm_abi::rsi::EnterFlags;
use realm_abi::{PlaneRun, PLANE_GPRS};

use crate::gic::GicShadow;
use crate::timer::TimerShadow;
use crate::MAX_AUX_PLANES;

/// SPSR for the first entry: EL1h with D, A, I and F masked.
pub const INITIAL_PSTATE: u64 = 0x3c5;

/// Life-cycle state of a plane slot.
///
/// `Idle -> Pending -> Active -> Stopped -> Pending | Abort`; `Abort` is terminal.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneState {
    Idle = 0,
    Pending = 1,
    Active = 2,
    Abort = 3,
    Stopped = 4,
}

/// Auxiliary plane number (1..=MAX_AUX_PLANES); plane 0 is the monitor itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct PlaneIndex(u8);

impl PlaneIndex {
    pub const fn new(raw: usize) -> Option<Self> {
        if raw >= 1 && raw <= MAX_AUX_PLANES {
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Plane number as passed to RSI calls.
    #[inline]
    pub const fn rsi_id(self) -> u64 {
        self.0 as u64
    }

    /// Inverse of [`PlaneIndex::slot`]; `slot` must be below `MAX_AUX_PLANES`.
    pub(crate) const fn from_slot(slot: usize) -> Self {
        Self(slot as u8 + 1)
    }

    /// Position in a zero-based array of aux planes.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for PlaneIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Everything P0 keeps about a plane between two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneContext {
    state: PlaneState,
    index: PlaneIndex,
    pub pc: u64,
    pub gprs: [u64; PLANE_GPRS],
    pub pstate: u64,
    pub flags: EnterFlags,
    pub gic: GicShadow,
    pub timer: TimerShadow,
}

impl PlaneContext {
    pub const fn new(index: PlaneIndex) -> Self {
        Self {
            state: PlaneState::Idle,
            index,
            pc: 0,
            gprs: [0; PLANE_GPRS],
            pstate: 0,
            flags: EnterFlags::empty(),
            gic: GicShadow::new(),
            timer: TimerShadow::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> PlaneState {
        self.state
    }

    #[inline]
    pub fn index(&self) -> PlaneIndex {
        self.index
    }

    pub(crate) fn set_state(&mut self, state: PlaneState) {
        self.state = state;
    }

    /// Prepares the first entry at `entry` with the boot descriptor in x0.
    pub(crate) fn init(&mut self, entry: u64, fdt: u64) {
        *self = Self::new(self.index);
        self.pc = entry;
        self.gprs[0] = fdt;
        self.pstate = INITIAL_PSTATE;
        self.flags = EnterFlags::GIC_OWNER;
        self.gic.init();
        self.state = PlaneState::Pending;
    }

    /// Loads the enter half of `run` from this context.
    pub(crate) fn restore(&mut self, run: &mut PlaneRun) {
        let enter = &mut run.enter;
        enter.pc = self.pc;
        enter.flags = self.flags.bits();
        enter.spsr_el2 = self.pstate;
        enter.gprs = self.gprs;
        enter.gicv3_hcr = self.gic.hcr;
        enter.gicv3_lrs = self.gic.lrs;
        self.state = PlaneState::Active;
    }

    /// Captures the exit half of `run` into this context.
    pub(crate) fn save(&mut self, run: &PlaneRun) {
        let exit = &run.exit;
        self.pc = exit.elr_el2;
        self.pstate = exit.spsr_el2;
        self.gprs = exit.gprs;
        self.gic.hcr = exit.gicv3_hcr;
        self.gic.lrs = exit.gicv3_lrs;
        self.gic.misr = exit.gicv3_misr;
        self.gic.vmcr = exit.gicv3_vmcr;
        self.timer = TimerShadow {
            cntp_ctl: exit.cntp_ctl,
            cntp_cval: exit.cntp_cval,
            cntv_ctl: exit.cntv_ctl,
            cntv_cval: exit.cntv_cval,
        };
        self.state = PlaneState::Stopped;
    }
}
