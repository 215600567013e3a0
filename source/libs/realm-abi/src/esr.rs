// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Exception syndrome (ESR_ELx) decoding.

use core::fmt;

/// Exception-class field position.
pub const EC_SHIFT: u64 = 26;
/// Exception-class field width mask (after shifting).
pub const EC_MASK: u64 = 0x3f;
/// Instruction-specific syndrome mask.
pub const ISS_MASK: u64 = 0x01ff_ffff;

/// Extracts the raw 6-bit exception class.
#[inline]
pub const fn ec(esr: u64) -> u8 {
    ((esr >> EC_SHIFT) & EC_MASK) as u8
}

/// Extracts the 25-bit ISS.
#[inline]
pub const fn iss(esr: u64) -> u32 {
    (esr & ISS_MASK) as u32
}

/// Architected exception classes (subset used by AArch64 lower-EL exits).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ExceptionClass {
    Unknown = 0x00,
    Wfx = 0x01,
    Cp15Mcr = 0x03,
    Cp15Mcrr = 0x04,
    Cp14Mcr = 0x05,
    Cp14Ldc = 0x06,
    FpAsimd = 0x07,
    Cp10Id = 0x08,
    Pac = 0x09,
    Cp14Mcrr = 0x0c,
    Bti = 0x0d,
    IllegalState = 0x0e,
    Svc32 = 0x11,
    Hvc32 = 0x12,
    Smc32 = 0x13,
    Svc64 = 0x15,
    Hvc64 = 0x16,
    Smc64 = 0x17,
    Sys64 = 0x18,
    Sve = 0x19,
    Eret = 0x1a,
    Fpac = 0x1c,
    Sme = 0x1d,
    ImpDef = 0x1f,
    InstructionAbortLower = 0x20,
    InstructionAbortCurrent = 0x21,
    PcAlignment = 0x22,
    DataAbortLower = 0x24,
    DataAbortCurrent = 0x25,
    SpAlignment = 0x26,
    Mops = 0x27,
    FpException32 = 0x28,
    FpException64 = 0x2c,
    Gcs = 0x2d,
    SError = 0x2f,
    BreakpointLower = 0x30,
    BreakpointCurrent = 0x31,
    SoftwareStepLower = 0x32,
    SoftwareStepCurrent = 0x33,
    WatchpointLower = 0x34,
    WatchpointCurrent = 0x35,
    Bkpt32 = 0x38,
    VectorCatch32 = 0x3a,
    Brk64 = 0x3c,
}

impl ExceptionClass {
    /// Decodes a raw class; unallocated encodings yield `None`.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        use ExceptionClass::*;
        Some(match raw {
            0x00 => Unknown,
            0x01 => Wfx,
            0x03 => Cp15Mcr,
            0x04 => Cp15Mcrr,
            0x05 => Cp14Mcr,
            0x06 => Cp14Ldc,
            0x07 => FpAsimd,
            0x08 => Cp10Id,
            0x09 => Pac,
            0x0c => Cp14Mcrr,
            0x0d => Bti,
            0x0e => IllegalState,
            0x11 => Svc32,
            0x12 => Hvc32,
            0x13 => Smc32,
            0x15 => Svc64,
            0x16 => Hvc64,
            0x17 => Smc64,
            0x18 => Sys64,
            0x19 => Sve,
            0x1a => Eret,
            0x1c => Fpac,
            0x1d => Sme,
            0x1f => ImpDef,
            0x20 => InstructionAbortLower,
            0x21 => InstructionAbortCurrent,
            0x22 => PcAlignment,
            0x24 => DataAbortLower,
            0x25 => DataAbortCurrent,
            0x26 => SpAlignment,
            0x27 => Mops,
            0x28 => FpException32,
            0x2c => FpException64,
            0x2d => Gcs,
            0x2f => SError,
            0x30 => BreakpointLower,
            0x31 => BreakpointCurrent,
            0x32 => SoftwareStepLower,
            0x33 => SoftwareStepCurrent,
            0x34 => WatchpointLower,
            0x35 => WatchpointCurrent,
            0x38 => Bkpt32,
            0x3a => VectorCatch32,
            0x3c => Brk64,
            _ => return None,
        })
    }

    /// Decodes the class of a full ESR value.
    pub const fn from_esr(esr: u64) -> Option<Self> {
        Self::from_raw(ec(esr))
    }
}

/// HPFAR_EL2.FIPA holds IPA[55:12] starting at bit 4.
pub const HPFAR_FIPA_SHIFT: u64 = 8;

/// Converts an HPFAR_EL2 value into the page-aligned faulting IPA.
#[inline]
pub const fn hpfar_to_ipa(hpfar: u64) -> u64 {
    hpfar << HPFAR_FIPA_SHIFT
}

/// Decoded ISS of an MSR/MRS/system-instruction trap (EC 0x18).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SysRegIss {
    /// `Op0`.
    pub op0: u8,
    /// `Op1`.
    pub op1: u8,
    /// `CRn`.
    pub crn: u8,
    /// `CRm`.
    pub crm: u8,
    /// `Op2`.
    pub op2: u8,
    /// Transfer register.
    pub rt: u8,
    /// `true` for MRS (read), `false` for MSR (write).
    pub read: bool,
}

impl SysRegIss {
    /// Splits a raw ISS into its register-access fields.
    pub const fn decode(iss: u32) -> Self {
        Self {
            op0: ((iss >> 20) & 0x3) as u8,
            op2: ((iss >> 17) & 0x7) as u8,
            op1: ((iss >> 14) & 0x7) as u8,
            crn: ((iss >> 10) & 0xf) as u8,
            rt: ((iss >> 5) & 0x1f) as u8,
            crm: ((iss >> 1) & 0xf) as u8,
            read: iss & 1 != 0,
        }
    }
}

impl fmt::Display for SysRegIss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.read { "mrs" } else { "msr" };
        write!(
            f,
            "{dir} S{}_{}_C{}_C{}_{} x{}",
            self.op0, self.op1, self.crn, self.crm, self.op2, self.rt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_extraction_uses_bits_26_to_31() {
        let esr = (0x17u64 << EC_SHIFT) | 0x1234;
        assert_eq!(ec(esr), 0x17);
        assert_eq!(ExceptionClass::from_esr(esr), Some(ExceptionClass::Smc64));
        assert_eq!(iss(esr), 0x1234);
    }

    #[test]
    fn unallocated_classes_are_none() {
        for raw in [0x02u8, 0x0a, 0x14, 0x1b, 0x23, 0x3f] {
            assert_eq!(ExceptionClass::from_raw(raw), None);
        }
    }

    #[test]
    fn mdscr_write_decodes() {
        let iss = SysRegIss::decode(0x24_0024);
        assert_eq!((iss.op0, iss.op1, iss.crn, iss.crm, iss.op2), (2, 0, 0, 2, 2));
        assert_eq!(iss.rt, 1);
        assert!(!iss.read);
    }
}
