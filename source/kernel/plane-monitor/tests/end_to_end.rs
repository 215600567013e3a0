//! CONTEXT: End-to-end tests from realm configuration to monitor halt
//! OWNERS: @realm-runtime
//! STATUS: Functional
//! TEST_COVERAGE: 7 integration tests
//!
//! TEST_SCOPE:
//!   - Direct kernel entry when the realm has no aux planes
//!   - Fail-stop after an unhandled exit
//!   - PSCI emulation and device-window data aborts through the public Monitor API

mod common;

use common::{PlannedExit, ScriptedRealm, SparseMemory};
use plane_monitor::{boot, Boot, ConfigError, Fault, Halt, Monitor, PlaneIndex, PlaneState, Step};

const KERNEL: u64 = 0x4020_0000;
const FDT: u64 = 0x4800_0000;

fn scheduled(realm: ScriptedRealm, mem: SparseMemory) -> Monitor<ScriptedRealm, SparseMemory> {
    match boot(realm, mem, KERNEL, FDT) {
        Ok(Boot::Scheduled(monitor)) => monitor,
        other => panic!("expected a scheduled monitor, got {other:?}"),
    }
}

fn plane(raw: usize) -> PlaneIndex {
    PlaneIndex::new(raw).expect("plane")
}

#[test]
fn zero_planes_jump_straight_to_kernel() {
    match boot(ScriptedRealm::new(0), SparseMemory::default(), KERNEL, FDT) {
        Ok(Boot::DirectKernel { entry, args }) => {
            assert_eq!(entry, KERNEL);
            assert_eq!(args, [FDT, 0, 0, 0]);
        }
        other => panic!("expected direct kernel entry, got {other:?}"),
    }
}

#[test]
fn too_many_planes_is_a_config_error() {
    let result = boot(ScriptedRealm::new(4), SparseMemory::default(), KERNEL, FDT);
    assert!(matches!(result, Err(ConfigError::TooManyPlanes(4))));
}

#[test]
fn first_entry_uses_kernel_entry_and_boot_descriptor() {
    let mut monitor = scheduled(ScriptedRealm::new(1), SparseMemory::default());
    assert!(matches!(monitor.step(), Step::Ran { .. }));
    assert_eq!(monitor.rsi().entries, vec![(1, KERNEL)]);
    assert_eq!(monitor.rsi().last_x0.get(&1), Some(&FDT));
}

#[test]
fn unhandled_class_stops_every_plane() {
    let realm = ScriptedRealm::new(2).script(1, [PlannedExit::Irq, PlannedExit::class(0x16)]);
    let mut monitor = scheduled(realm, SparseMemory::default());

    let halt = monitor.run();

    assert_eq!(halt, Halt { plane: plane(1), fault: Fault::UnhandledClass { ec: 0x16, esr: 0x16 << 26 } });
    assert_eq!(monitor.plane(plane(1)).state(), PlaneState::Abort);
    let entries_at_halt = monitor.rsi().entries.len();
    for _ in 0..10 {
        assert_eq!(monitor.step(), Step::Halted(halt));
    }
    assert_eq!(monitor.rsi().entries.len(), entries_at_halt);
    assert_eq!(monitor.rsi().entered_planes(), vec![2, 1, 2, 1]);
}

#[test]
fn psci_version_is_answered_and_plane_resumes_after_call() {
    let realm = ScriptedRealm::new(1).script(1, [PlannedExit::smc(0x8400_0000), PlannedExit::Host]);
    let mut monitor = scheduled(realm, SparseMemory::default());

    assert!(matches!(monitor.step(), Step::Ran { .. }));
    let ctx = monitor.plane(plane(1));
    assert_eq!(ctx.gprs[0], (1 << 16) | 1);
    assert_eq!(ctx.pc, KERNEL + 4);

    assert_eq!(monitor.run(), Halt { plane: plane(1), fault: Fault::HostExit });
    assert_eq!(monitor.rsi().entries, vec![(1, KERNEL), (1, KERNEL + 4)]);
    assert_eq!(monitor.rsi().last_x0.get(&1), Some(&0x1_0001));
}

mod device_abort {
    use super::*;

    const ROOT: u64 = 0x4100_0000;
    const P4D: u64 = 0x4100_1000;
    const PUD: u64 = 0x4100_2000;
    const PMD: u64 = 0x4100_3000;
    const PTE: u64 = 0x4100_4000;
    const UART_VA: u64 = 0xffff_0000_0000_0000 | (7 << 39) | (1 << 30) | (2 << 21) | (9 << 12);

    fn leaf() -> u64 {
        PTE + 9 * 8
    }

    fn tables() -> SparseMemory {
        let mut mem = SparseMemory::default();
        mem.0.insert(ROOT + 0xf * 8, P4D | 0b11);
        mem.0.insert(P4D + 7 * 8, PUD | 0b11);
        mem.0.insert(PUD + 8, PMD | 0b11);
        mem.0.insert(PMD + 2 * 8, PTE | 0b11);
        mem.0.insert(leaf(), 0x0900_0000 | 0x70b);
        mem
    }

    #[test]
    fn uart_access_is_shared_and_retried() {
        let mut realm = ScriptedRealm::new(1).script(1, [PlannedExit::data_abort(UART_VA | 0x18, 0x9000)]);
        realm.ttbr1 = ROOT;
        let mut monitor = scheduled(realm, tables());

        assert!(matches!(monitor.step(), Step::Ran { .. }));
        assert_eq!(monitor.mem().0.get(&leaf()), Some(&(0x0900_0000 | 0x70b | (1 << 39))));
        assert!(matches!(monitor.step(), Step::Ran { .. }));
        // Same instruction re-executed after the fixup.
        assert_eq!(monitor.rsi().entries, vec![(1, KERNEL), (1, KERNEL)]);
    }

    #[test]
    fn ram_abort_is_fatal() {
        let mut realm = ScriptedRealm::new(1).script(1, [PlannedExit::data_abort(UART_VA, 0x20000)]);
        realm.ttbr1 = ROOT;
        let mut monitor = scheduled(realm, tables());

        let halt = monitor.run();

        assert_eq!(
            halt.fault,
            Fault::UnrecognizedAbort { ipa: 0x2000_0000, far: UART_VA }
        );
        assert_eq!(monitor.mem().0.get(&leaf()), Some(&(0x0900_0000 | 0x70b)));
    }
}
