//! CONTEXT: Scripted realm firmware and sparse plane memory for integration tests
//! OWNERS: @realm-runtime
//! STATUS: Functional
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};

use plane_monitor::{IpaStateChange, MemError, Rsi, TableMemory};
use realm_abi::rsi::{ChangeFlags, IpaResponse, Ripas, RsiError, SYSREG_TTBR1_EL1};
use realm_abi::{PlaneRun, RealmConfig};

/// Exit a plane reports on its next entry.
#[derive(Debug, Clone, Copy)]
pub enum PlannedExit {
    Irq,
    Host,
    /// Synchronous exception with class `ec`; `x0` overrides the returned x0 when set.
    Sync { ec: u8, iss: u32, far: u64, hpfar: u64, x0: Option<u64> },
}

impl PlannedExit {
    pub fn smc(fid: u64) -> Self {
        PlannedExit::Sync { ec: 0x17, iss: 0, far: 0, hpfar: 0, x0: Some(fid) }
    }

    pub fn data_abort(far: u64, pfn: u64) -> Self {
        PlannedExit::Sync { ec: 0x24, iss: 0x46, far, hpfar: pfn << 4, x0: None }
    }

    pub fn class(ec: u8) -> Self {
        PlannedExit::Sync { ec, iss: 0, far: 0, hpfar: 0, x0: None }
    }
}

/// Realm firmware that replays a fixed exit script per plane.
pub struct ScriptedRealm {
    pub num_aux_planes: u64,
    pub ipa_bits: u64,
    pub ttbr1: u64,
    pub scripts: BTreeMap<u64, VecDeque<PlannedExit>>,
    /// Plane and enter-half pc of every entry, in order.
    pub entries: Vec<(u64, u64)>,
    pub last_x0: BTreeMap<u64, u64>,
}

impl ScriptedRealm {
    pub fn new(num_aux_planes: u64) -> Self {
        Self {
            num_aux_planes,
            ipa_bits: 40,
            ttbr1: 0,
            scripts: BTreeMap::new(),
            entries: Vec::new(),
            last_x0: BTreeMap::new(),
        }
    }

    pub fn script(mut self, plane: u64, exits: impl IntoIterator<Item = PlannedExit>) -> Self {
        self.scripts.entry(plane).or_default().extend(exits);
        self
    }

    pub fn entered_planes(&self) -> Vec<u64> {
        self.entries.iter().map(|&(plane, _)| plane).collect()
    }
}

impl Rsi for ScriptedRealm {
    fn plane_sysreg_read(&mut self, _plane: u64, id: u64) -> Result<u64, RsiError> {
        if id == SYSREG_TTBR1_EL1 {
            Ok(self.ttbr1)
        } else {
            Err(RsiError::Input)
        }
    }

    fn plane_sysreg_write(&mut self, _: u64, _: u64, _: u64) -> Result<(), RsiError> {
        Err(RsiError::Input)
    }

    fn plane_enter(&mut self, plane: u64, run: Option<&mut PlaneRun>) -> u64 {
        let Some(run) = run else {
            return 0;
        };
        self.entries.push((plane, run.enter.pc));
        self.last_x0.insert(plane, run.enter.gprs[0]);

        let exit = &mut run.exit;
        exit.elr_el2 = run.enter.pc;
        exit.spsr_el2 = run.enter.spsr_el2;
        exit.gprs = run.enter.gprs;
        exit.gicv3_hcr = run.enter.gicv3_hcr;
        exit.gicv3_lrs = run.enter.gicv3_lrs;
        exit.gicv3_misr = 0;
        exit.esr_el2 = 0;

        let next = self
            .scripts
            .get_mut(&plane)
            .and_then(VecDeque::pop_front)
            .unwrap_or(PlannedExit::Irq);
        match next {
            PlannedExit::Irq => exit.reason = 1,
            PlannedExit::Host => exit.reason = 2,
            PlannedExit::Sync { ec, iss, far, hpfar, x0 } => {
                exit.reason = 0;
                exit.esr_el2 = ((ec as u64) << 26) | iss as u64;
                exit.far_el2 = far;
                exit.hpfar_el2 = hpfar;
                if let Some(x0) = x0 {
                    exit.gprs[0] = x0;
                }
            }
        }
        0
    }

    fn ipa_state_set(
        &mut self,
        _start: u64,
        end: u64,
        _ripas: Ripas,
        _flags: ChangeFlags,
    ) -> Result<IpaStateChange, RsiError> {
        Ok(IpaStateChange { top: end, response: IpaResponse::Accept })
    }

    fn realm_config(&mut self, config: &mut RealmConfig) -> Result<(), RsiError> {
        config.num_aux_planes = self.num_aux_planes;
        config.ipa_bits = self.ipa_bits;
        Ok(())
    }
}

/// Plane memory holding only explicitly written words.
#[derive(Debug, Default)]
pub struct SparseMemory(pub BTreeMap<u64, u64>);

impl TableMemory for SparseMemory {
    fn read_u64(&self, addr: u64) -> Result<u64, MemError> {
        self.0.get(&addr).copied().ok_or(MemError::NotMapped { addr })
    }

    fn write_u64(&mut self, addr: u64, value: u64) -> Result<(), MemError> {
        match self.0.get_mut(&addr) {
            Some(word) => {
                *word = value;
                Ok(())
            }
            None => Err(MemError::NotMapped { addr }),
        }
    }
}
