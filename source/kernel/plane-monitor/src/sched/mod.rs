// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Cooperative round-robin driver over the auxiliary planes
//! OWNERS: @realm-runtime
//! PUBLIC API: Monitor (new/init_plane/init_all/step/run/plane/halted), Step
//! DEPENDS_ON: context (restore/save), trap::dispatch, rsi::Rsi (plane_enter), gic, timer
//! INVARIANTS: One plane is Active at a time and only between restore and save;
//!             once halted no further plane_enter is issued; the cursor visits slots in order

use core::marker::PhantomData;

use realm_abi::PlaneRun;

use crate::boot::RealmParams;
use crate::context::{PlaneContext, PlaneIndex, PlaneState};
use crate::gic::Injection;
use crate::mm::TableMemory;
use crate::platform::SHARED_WINDOWS;
use crate::rsi::{self, Rsi};
use crate::trap::{self, Halt, Syndrome};
use crate::MAX_AUX_PLANES;

/// Outcome of one scheduling step.
#[must_use = "a halted monitor must not be stepped as if it made progress"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `plane` ran and its exit was resolved.
    Ran { plane: PlaneIndex, syndrome: Syndrome },
    /// No plane is runnable.
    Idle,
    /// The monitor is halted; nothing ran.
    Halted(Halt),
}

/// P0 state: the firmware gate, plane memory, every plane context and the shared run page.
///
/// ## Send/Sync
///
/// `Monitor` is `!Send` and `!Sync`: it drives the single physical CPU P0 runs on and the
/// run page it owns is handed to the firmware by address.
pub struct Monitor<R: Rsi, M: TableMemory> {
    rsi: R,
    mem: M,
    params: RealmParams,
    planes: [PlaneContext; MAX_AUX_PLANES],
    run: PlaneRun,
    cursor: usize,
    halted: Option<Halt>,
    _not_send_sync: PhantomData<*mut ()>,
}

impl<R: Rsi, M: TableMemory> Monitor<R, M> {
    /// Creates a monitor with every plane `Idle`.
    pub fn new(rsi: R, mem: M, params: RealmParams) -> Self {
        let planes = core::array::from_fn(|slot| PlaneContext::new(PlaneIndex::from_slot(slot)));
        Self {
            rsi,
            mem,
            params,
            planes,
            run: PlaneRun::zeroed(),
            cursor: 0,
            halted: None,
            _not_send_sync: PhantomData,
        }
    }

    /// Prepares `plane` for its first entry at `entry` with the boot descriptor `fdt` in x0.
    ///
    /// Also converts the platform's shared windows; a failed conversion is logged and the
    /// plane is still made runnable.
    pub fn init_plane(&mut self, plane: PlaneIndex, entry: u64, fdt: u64) {
        for window in SHARED_WINDOWS {
            if let Err(err) = rsi::set_memory_range_shared(&mut self.rsi, window.start, window.end) {
                log_warn!(
                    target: "sched",
                    "{}: share {:#x}..{:#x} failed: {}",
                    plane,
                    window.start,
                    window.end,
                    err
                );
            }
        }
        self.planes[plane.slot()].init(entry, fdt);
        log_debug!(target: "sched", "{}: init pc={:#x} fdt={:#x}", plane, entry, fdt);
    }

    /// Initializes every configured plane.
    pub fn init_all(&mut self, entry: u64, fdt: u64) {
        for raw in 1..=self.params.num_aux_planes() {
            if let Some(plane) = PlaneIndex::new(raw) {
                self.init_plane(plane, entry, fdt);
            }
        }
    }

    /// Advances the cursor to the next `Pending` plane and runs it through one exit.
    pub fn step(&mut self) -> Step {
        if let Some(halt) = self.halted {
            return Step::Halted(halt);
        }
        let count = self.params.num_aux_planes();
        for _ in 0..count {
            self.cursor = (self.cursor + 1) % count;
            if self.planes[self.cursor].state() == PlaneState::Pending {
                return self.run_slot(self.cursor);
            }
        }
        Step::Idle
    }

    /// Steps until a plane faults. With no runnable plane this spins forever.
    pub fn run(&mut self) -> Halt {
        loop {
            match self.step() {
                Step::Halted(halt) => return halt,
                Step::Ran { .. } => {}
                Step::Idle => core::hint::spin_loop(),
            }
        }
    }

    fn run_slot(&mut self, slot: usize) -> Step {
        let ctx = &mut self.planes[slot];
        let plane = ctx.index();

        if ctx.timer.asserted() && ctx.gic.inject_virtual_timer_irq() == Injection::Dropped {
            log_debug!(target: "sched", "{}: vtimer irq dropped, no free lr", plane);
        }

        ctx.restore(&mut self.run);
        let status = self.rsi.plane_enter(plane.rsi_id(), Some(&mut self.run));
        if status != 0 {
            log_warn!(target: "sched", "{}: plane_enter status {:#x} ignored", plane, status);
        }
        ctx.save(&self.run);

        let syndrome = Syndrome::from_exit(&self.run.exit);
        match trap::dispatch(&mut self.rsi, &mut self.mem, &self.params, ctx, &syndrome) {
            Ok(()) => {
                ctx.set_state(PlaneState::Pending);
                Step::Ran { plane, syndrome }
            }
            Err(fault) => {
                ctx.set_state(PlaneState::Abort);
                let halt = Halt { plane, fault };
                log_error!(target: "sched", "{}", halt);
                self.halted = Some(halt);
                Step::Halted(halt)
            }
        }
    }

    /// Context of `plane`.
    pub fn plane(&self, plane: PlaneIndex) -> &PlaneContext {
        &self.planes[plane.slot()]
    }

    pub fn params(&self) -> &RealmParams {
        &self.params
    }

    /// The fault that stopped the monitor, if any.
    pub fn halted(&self) -> Option<Halt> {
        self.halted
    }

    pub fn rsi(&self) -> &R {
        &self.rsi
    }

    pub fn rsi_mut(&mut self) -> &mut R {
        &mut self.rsi
    }

    pub fn mem(&self) -> &M {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut M {
        &mut self.mem
    }
}

#[cfg(test)]
mod tests_prop;
