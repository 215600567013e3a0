// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Stage-1 walk of a plane's TTBR1 tables (4 KiB granule, sparse top level).

use core::fmt;

use realm_abi::rsi::{RsiError, SYSREG_TTBR1_EL1};

use super::{MemError, TableMemory};
use crate::context::PlaneIndex;

/// Table base bits of TTBR1_EL1 (ASID and CnP dropped).
pub const TTBR_BADDR_MASK: u64 = 0x0000_ffff_ffff_fffc;
/// Output address bits of a table or block descriptor.
pub const DESC_ADDR_MASK: u64 = 0x0000_ffff_ffff_f000;

const DESC_VALID: u64 = 0b01;
const DESC_TYPE_MASK: u64 = 0b11;
const DESC_BLOCK: u64 = 0b01;

/// Translation level, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLevel {
    Pgd,
    P4d,
    Pud,
    Pmd,
    Pte,
}

impl TableLevel {
    /// Levels that hold table descriptors.
    const TABLES: [TableLevel; 4] = [TableLevel::Pgd, TableLevel::P4d, TableLevel::Pud, TableLevel::Pmd];

    const fn shift(self) -> u32 {
        match self {
            TableLevel::Pgd => 48,
            TableLevel::P4d => 39,
            TableLevel::Pud => 30,
            TableLevel::Pmd => 21,
            TableLevel::Pte => 12,
        }
    }

    /// Descriptor index of `va` at this level.
    pub const fn index(self, va: u64) -> u64 {
        let mask = match self {
            TableLevel::Pgd => 0xf,
            _ => 0x1ff,
        };
        (va >> self.shift()) & mask
    }

    const fn allows_block(self) -> bool {
        matches!(self, TableLevel::P4d | TableLevel::Pud | TableLevel::Pmd)
    }
}

/// Why no descriptor could be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    /// TTBR1_EL1 of the plane could not be read.
    TranslationBase(RsiError),
    /// A table word lies outside the memory view.
    Memory(MemError),
    /// A descriptor on the path is invalid for its level.
    Malformed { level: TableLevel, descriptor: u64 },
}

impl From<MemError> for WalkError {
    fn from(err: MemError) -> Self {
        WalkError::Memory(err)
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::TranslationBase(err) => write!(f, "ttbr1 read failed: {err}"),
            WalkError::Memory(err) => write!(f, "table access: {err}"),
            WalkError::Malformed { level, descriptor } => {
                write!(f, "bad {level:?} descriptor {descriptor:#x}")
            }
        }
    }
}

/// Returns the address of the descriptor that maps `va` in `plane`'s TTBR1 tables.
///
/// The result is a block descriptor when the walk hits one at P4D, PUD or PMD level,
/// otherwise the PTE slot itself (which is not read).
///
/// The PGD entry is checked like the lower table levels: an invalid entry, or one carrying
/// block-type low bits, is reported as `Malformed` instead of being followed blindly.
pub fn walk<R, M>(rsi: &mut R, mem: &M, plane: PlaneIndex, va: u64) -> Result<u64, WalkError>
where
    R: crate::rsi::Rsi + ?Sized,
    M: TableMemory + ?Sized,
{
    let ttbr = rsi
        .plane_sysreg_read(plane.rsi_id(), SYSREG_TTBR1_EL1)
        .map_err(WalkError::TranslationBase)?;
    let mut table = ttbr & TTBR_BADDR_MASK;

    for level in TableLevel::TABLES {
        let entry = table + level.index(va) * 8;
        let descriptor = mem.read_u64(entry)?;
        if descriptor & DESC_VALID == 0 {
            return Err(WalkError::Malformed { level, descriptor });
        }
        if descriptor & DESC_TYPE_MASK == DESC_BLOCK {
            if level.allows_block() {
                return Ok(entry);
            }
            return Err(WalkError::Malformed { level, descriptor });
        }
        table = descriptor & DESC_ADDR_MASK;
    }

    Ok(table + TableLevel::Pte.index(va) * 8)
}
