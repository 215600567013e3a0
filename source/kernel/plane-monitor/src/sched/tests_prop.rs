// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for the plane scheduler
//! OWNERS: @realm-runtime
//! NOTE: Tests only; no monitor logic.
//!
//! TEST_SCOPE:
//!   - Fairness of the round-robin cursor for every supported plane count
//!   - Fail-stop: the first unhandled exit ends all plane entries
//!
//! TEST_SCENARIOS:
//!   - every_window_of_n_rounds_visits_every_plane(): n consecutive entries cover 1..=n
//!   - first_fault_stops_all_entries(): entries == index of first fault + 1

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use proptest::prelude::*;
use realm_abi::esr::EC_SHIFT;

use super::{Monitor, Step};
use crate::boot::RealmParams;
use crate::context::PlaneState;
use crate::testing::{echo_enter, FakeMemory, FakeRsi};

#[derive(Debug, Clone, Copy)]
enum Exit {
    /// Spurious IRQ, always handled.
    Irq,
    /// PSCI_VERSION, always handled.
    PsciVersion,
    /// WFI trap, never handled.
    Wfi,
}

impl Exit {
    fn handled(self) -> bool {
        !matches!(self, Exit::Wfi)
    }

    fn apply(self, run: &mut realm_abi::PlaneRun) {
        echo_enter(run);
        match self {
            Exit::Irq => run.exit.reason = 1,
            Exit::PsciVersion => {
                run.exit.reason = 0;
                run.exit.esr_el2 = 0x17 << EC_SHIFT;
                run.exit.gprs[0] = 0x8400_0000;
            }
            Exit::Wfi => {
                run.exit.reason = 0;
                run.exit.esr_el2 = 0x01 << EC_SHIFT;
            }
        }
    }
}

fn arb_exit() -> impl Strategy<Value = Exit> {
    prop_oneof![4 => Just(Exit::Irq), 4 => Just(Exit::PsciVersion), 1 => Just(Exit::Wfi)]
}

fn scripted(planes: usize, script: Vec<Exit>) -> Monitor<FakeRsi, FakeMemory> {
    let script = Rc::new(RefCell::new(VecDeque::from(script)));
    let rsi = FakeRsi::new(planes as u64, 40).on_enter(move |_, run| {
        script.borrow_mut().pop_front().unwrap_or(Exit::Irq).apply(run);
        0
    });
    let params = RealmParams::new(planes as u64, 40).expect("params");
    let mut monitor = Monitor::new(rsi, FakeMemory::new(), params);
    monitor.init_all(0x4020_0000, 0x4800_0000);
    monitor
}

proptest! {
    #[test]
    fn every_window_of_n_rounds_visits_every_plane(planes in 1usize..=3, rounds in 1usize..40) {
        let mut monitor = scripted(planes, Vec::new());
        for _ in 0..rounds {
            prop_assert!(matches!(monitor.step(), Step::Ran { .. }), "step must run a plane");
        }
        let entered = &monitor.rsi().entered;
        prop_assert_eq!(entered.len(), rounds);
        for window in entered.windows(planes) {
            let mut seen: Vec<u64> = window.to_vec();
            seen.sort_unstable();
            prop_assert_eq!(seen, (1..=planes as u64).collect::<Vec<_>>());
        }
        prop_assert_eq!(monitor.halted(), None);
    }

    #[test]
    fn first_fault_stops_all_entries(
        planes in 1usize..=3,
        script in proptest::collection::vec(arb_exit(), 1..30),
    ) {
        let first_fault = script.iter().position(|exit| !exit.handled());
        let steps = script.len() + 5;
        let mut monitor = scripted(planes, script.clone());

        for _ in 0..steps {
            let _ = monitor.step();
        }

        let entries = monitor.rsi().entered.len();
        match first_fault {
            Some(at) => {
                prop_assert_eq!(entries, at + 1);
                let halt = monitor.halted().expect("halted");
                prop_assert_eq!(monitor.plane(halt.plane).state(), PlaneState::Abort);
                let aborted = (1..=planes)
                    .filter_map(crate::context::PlaneIndex::new)
                    .filter(|&p| monitor.plane(p).state() == PlaneState::Abort)
                    .count();
                prop_assert_eq!(aborted, 1);
            }
            None => {
                prop_assert_eq!(entries, steps);
                prop_assert_eq!(monitor.halted(), None);
            }
        }
    }
}
