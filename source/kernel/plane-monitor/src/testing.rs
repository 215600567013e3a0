// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Scripted firmware and sparse memory for unit tests
//! OWNERS: @realm-runtime
//! NOTE: Tests only; no monitor logic.

use std::collections::{BTreeMap, VecDeque};

use realm_abi::rsi::{ChangeFlags, IpaResponse, Ripas, RsiError};
use realm_abi::{PlaneRun, RealmConfig};

use crate::mm::{MemError, TableMemory};
use crate::rsi::{IpaStateChange, Rsi};

/// Behaviour of a plane for one entry: mutate the run page, return the RSI status.
pub type EnterHook = Box<dyn FnMut(u64, &mut PlaneRun) -> u64>;

/// Copies the enter half into the exit half, as if the plane trapped before its first instruction.
pub fn echo_enter(run: &mut PlaneRun) {
    run.exit.elr_el2 = run.enter.pc;
    run.exit.spsr_el2 = run.enter.spsr_el2;
    run.exit.gprs = run.enter.gprs;
    run.exit.gicv3_hcr = run.enter.gicv3_hcr;
    run.exit.gicv3_lrs = run.enter.gicv3_lrs;
}

pub struct FakeRsi {
    pub num_aux_planes: u64,
    pub ipa_bits: u64,
    pub config_error: Option<RsiError>,
    pub sysregs: BTreeMap<(u64, u64), u64>,
    pub sysreg_error: Option<RsiError>,
    pub ipa_replies: VecDeque<Result<IpaStateChange, RsiError>>,
    pub ipa_calls: Vec<(u64, u64, Ripas, ChangeFlags)>,
    /// Planes entered with a run page, in order.
    pub entered: Vec<u64>,
    /// Planes entered without a run page.
    pub detached: Vec<u64>,
    pub on_enter: EnterHook,
}

impl FakeRsi {
    /// Firmware whose planes exit with a spurious IRQ every time.
    pub fn new(num_aux_planes: u64, ipa_bits: u64) -> Self {
        Self {
            num_aux_planes,
            ipa_bits,
            config_error: None,
            sysregs: BTreeMap::new(),
            sysreg_error: None,
            ipa_replies: VecDeque::new(),
            ipa_calls: Vec::new(),
            entered: Vec::new(),
            detached: Vec::new(),
            on_enter: Box::new(|_, run| {
                echo_enter(run);
                run.exit.reason = 1;
                run.exit.gicv3_misr = 0;
                0
            }),
        }
    }

    pub fn on_enter(mut self, hook: impl FnMut(u64, &mut PlaneRun) -> u64 + 'static) -> Self {
        self.on_enter = Box::new(hook);
        self
    }

    pub fn with_sysreg(mut self, plane: u64, id: u64, value: u64) -> Self {
        self.sysregs.insert((plane, id), value);
        self
    }
}

impl Rsi for FakeRsi {
    fn plane_sysreg_read(&mut self, plane: u64, id: u64) -> Result<u64, RsiError> {
        if let Some(err) = self.sysreg_error {
            return Err(err);
        }
        Ok(self.sysregs.get(&(plane, id)).copied().unwrap_or(0))
    }

    fn plane_sysreg_write(&mut self, plane: u64, id: u64, value: u64) -> Result<(), RsiError> {
        if let Some(err) = self.sysreg_error {
            return Err(err);
        }
        self.sysregs.insert((plane, id), value);
        Ok(())
    }

    fn plane_enter(&mut self, plane: u64, run: Option<&mut PlaneRun>) -> u64 {
        match run {
            Some(run) => {
                self.entered.push(plane);
                (self.on_enter)(plane, run)
            }
            None => {
                self.detached.push(plane);
                0
            }
        }
    }

    fn ipa_state_set(
        &mut self,
        start: u64,
        end: u64,
        ripas: Ripas,
        flags: ChangeFlags,
    ) -> Result<IpaStateChange, RsiError> {
        self.ipa_calls.push((start, end, ripas, flags));
        self.ipa_replies
            .pop_front()
            .unwrap_or(Ok(IpaStateChange { top: end, response: IpaResponse::Accept }))
    }

    fn realm_config(&mut self, config: &mut RealmConfig) -> Result<(), RsiError> {
        if let Some(err) = self.config_error {
            return Err(err);
        }
        config.num_aux_planes = self.num_aux_planes;
        config.ipa_bits = self.ipa_bits;
        Ok(())
    }
}

/// Word-granular memory holding only the words a test wrote.
#[derive(Debug, Default)]
pub struct FakeMemory {
    words: BTreeMap<u64, u64>,
}

impl FakeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, addr: u64, value: u64) {
        self.words.insert(addr, value);
    }

    pub fn get(&self, addr: u64) -> Option<u64> {
        self.words.get(&addr).copied()
    }
}

impl TableMemory for FakeMemory {
    fn read_u64(&self, addr: u64) -> Result<u64, MemError> {
        if addr % 8 != 0 {
            return Err(MemError::Misaligned { addr });
        }
        self.get(addr).ok_or(MemError::NotMapped { addr })
    }

    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), MemError> {
        if addr % 8 != 0 {
            return Err(MemError::Misaligned { addr });
        }
        match self.words.get_mut(&addr) {
            Some(word) => {
                *word = value;
                Ok(())
            }
            None => Err(MemError::NotMapped { addr }),
        }
    }
}
