// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Realm configuration and the hand-off from the boot stub to the monitor
//! OWNERS: @realm-runtime
//! PUBLIC API: RealmParams, ConfigError, fetch_params(), boot(), boot_single(), Boot
//! DEPENDS_ON: rsi::Rsi (realm_config), sched::Monitor, diag::console
//! INVARIANTS: Configuration is read once; with zero aux planes no monitor is built

use core::fmt;

use realm_abi::rsi::RsiError;
use realm_abi::RealmConfig;

use crate::context::PlaneIndex;
use crate::diag::console;
use crate::mm::TableMemory;
use crate::rsi::Rsi;
use crate::sched::Monitor;
use crate::MAX_AUX_PLANES;

/// Configuration retrieval failure; P0 cannot start any plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `RSI_REALM_CONFIG` failed.
    Rsi(RsiError),
    /// More aux planes than the monitor has slots for.
    TooManyPlanes(u64),
    /// IPA width the shared bit cannot be derived from.
    IpaWidth(u64),
}

impl From<RsiError> for ConfigError {
    fn from(err: RsiError) -> Self {
        ConfigError::Rsi(err)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Rsi(err) => write!(f, "realm config: {err}"),
            ConfigError::TooManyPlanes(n) => {
                write!(f, "realm has {n} aux planes, at most {MAX_AUX_PLANES} supported")
            }
            ConfigError::IpaWidth(bits) => write!(f, "unsupported ipa width {bits}"),
        }
    }
}

/// The parts of the realm configuration P0 acts on.
///
/// Only built through [`RealmParams::new`] or [`RealmParams::from_config`], so the plane
/// count always fits the monitor's slots and the IPA width names a real address bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealmParams {
    num_aux_planes: usize,
    ipa_bits: u32,
}

impl RealmParams {
    pub const fn new(num_aux_planes: u64, ipa_bits: u64) -> Result<Self, ConfigError> {
        if num_aux_planes > MAX_AUX_PLANES as u64 {
            return Err(ConfigError::TooManyPlanes(num_aux_planes));
        }
        if ipa_bits == 0 || ipa_bits > 64 {
            return Err(ConfigError::IpaWidth(ipa_bits));
        }
        Ok(Self { num_aux_planes: num_aux_planes as usize, ipa_bits: ipa_bits as u32 })
    }

    pub fn from_config(config: &RealmConfig) -> Result<Self, ConfigError> {
        Self::new(config.num_aux_planes, config.ipa_bits)
    }

    #[inline]
    pub const fn num_aux_planes(&self) -> usize {
        self.num_aux_planes
    }

    #[inline]
    pub const fn ipa_bits(&self) -> u32 {
        self.ipa_bits
    }

    /// Descriptor bit that selects the unprotected IPA alias.
    pub const fn shared_attr(&self) -> u64 {
        1 << (self.ipa_bits - 1)
    }
}

/// Fetches and validates the realm configuration.
pub fn fetch_params<R: Rsi + ?Sized>(rsi: &mut R) -> Result<RealmParams, ConfigError> {
    let mut config = RealmConfig::zeroed();
    rsi.realm_config(&mut config)?;
    RealmParams::from_config(&config)
}

/// What the boot stub does next.
pub enum Boot<R: Rsi, M: TableMemory> {
    /// No aux planes: jump to `entry` with `args` in x0..x3.
    DirectKernel { entry: u64, args: [u64; 4] },
    /// Planes are initialized; drive the monitor.
    Scheduled(Monitor<R, M>),
}

impl<R: Rsi, M: TableMemory> fmt::Debug for Boot<R, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boot::DirectKernel { entry, args } => f
                .debug_struct("DirectKernel")
                .field("entry", &format_args!("{entry:#x}"))
                .field("args", args)
                .finish(),
            Boot::Scheduled(monitor) => f.debug_tuple("Scheduled").field(monitor.params()).finish(),
        }
    }
}

fn direct_kernel<R: Rsi, M: TableMemory>(entry: u64, fdt: u64) -> Boot<R, M> {
    log_info!(target: "boot", "no aux planes, entering kernel at {:#x}", entry);
    Boot::DirectKernel { entry, args: [fdt, 0, 0, 0] }
}

/// Reads the realm configuration and builds a monitor with every aux plane ready to run
/// `entry` with `fdt` in x0.
pub fn boot<R: Rsi, M: TableMemory>(
    mut rsi: R,
    mem: M,
    entry: u64,
    fdt: u64,
) -> Result<Boot<R, M>, ConfigError> {
    let params = fetch_params(&mut rsi).map_err(|err| {
        log_error!(target: "boot", "{}", err);
        err
    })?;
    log_info!(
        target: "boot",
        "realm config: {} aux planes, ipa_bits={}",
        params.num_aux_planes(),
        params.ipa_bits()
    );
    if params.num_aux_planes() == 0 {
        return Ok(direct_kernel(entry, fdt));
    }

    let mut monitor = Monitor::new(rsi, mem, params);
    monitor.init_all(entry, fdt);
    Ok(Boot::Scheduled(monitor))
}

/// Bring-up variant of [`boot`]: initializes plane 1 only and reports progress as plain
/// console lines.
pub fn boot_single<R: Rsi, M: TableMemory>(
    mut rsi: R,
    mem: M,
    entry: u64,
    fdt: u64,
) -> Result<Boot<R, M>, ConfigError> {
    console::write_line("Hello UART");
    let params = match fetch_params(&mut rsi) {
        Ok(params) => params,
        Err(err) => {
            console::write_line("[P0]\tGet realm config failed");
            return Err(err);
        }
    };
    console::write_line("[P0]\tGet realm config");
    if params.num_aux_planes() == 0 {
        return Ok(direct_kernel(entry, fdt));
    }
    console::write_line("[P0]\tCurrent realm have pn");

    let mut monitor = Monitor::new(rsi, mem, params);
    monitor.init_plane(PlaneIndex::from_slot(0), entry, fdt);
    console::write_line("[P0]\tExit Plane code");
    Ok(Boot::Scheduled(monitor))
}
