// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: `extern "C"` entry symbols called by the realm boot stub
//! OWNERS: @realm-runtime
//! PUBLIC API: plane_main (never returns), plane_main_svsm (returns after building plane 1)
//! DEPENDS_ON: boot, rsi::SmcRsi, mm::IdentityMapped, diag::console
//! INVARIANTS: Configuration failure parks the CPU; no monitor is built for zero aux planes

use core::arch::asm;

use crate::boot::{boot, boot_single, Boot};
use crate::diag::console::{self, Pl011};
use crate::mm::IdentityMapped;
use crate::platform::UART0_BASE;
use crate::rsi::SmcRsi;

static UART0: Pl011 = Pl011::new(UART0_BASE);

type KernelEntry = unsafe extern "C" fn(u64, u64, u64, u64) -> !;

/// Jumps to the kernel image with `args` in x0..x3.
///
/// # Safety
/// `entry` must be the address of executable kernel code expecting the Linux arm64 boot
/// protocol.
unsafe fn enter_kernel(entry: u64, args: [u64; 4]) -> ! {
    let entry = core::mem::transmute::<usize, KernelEntry>(entry as usize);
    entry(args[0], args[1], args[2], args[3])
}

fn park() -> ! {
    loop {
        // SAFETY: `wfe` has no memory or register side effects.
        unsafe { asm!("wfe", options(nomem, nostack, preserves_flags)) };
    }
}

/// Boots every configured aux plane and schedules them until one faults.
#[no_mangle]
pub extern "C" fn plane_main(kernel_entry: u64, kernel_fdt_addr: u64) -> ! {
    if cfg!(feature = "debug_uart") {
        console::install(&UART0);
    }
    match boot(SmcRsi, IdentityMapped::platform(), kernel_entry, kernel_fdt_addr) {
        // SAFETY: the boot stub passes the loaded kernel's entry point.
        Ok(Boot::DirectKernel { entry, args }) => unsafe { enter_kernel(entry, args) },
        Ok(Boot::Scheduled(mut monitor)) => {
            let halt = monitor.run();
            log_error!(target: "p0", "monitor stopped: {}", halt);
            park()
        }
        Err(_) => park(),
    }
}

/// Bring-up entry: prepares plane 1 only, reports progress on the UART and returns.
#[no_mangle]
pub extern "C" fn plane_main_svsm(kernel_entry: u64, kernel_fdt_addr: u64) {
    console::install(&UART0);
    match boot_single(SmcRsi, IdentityMapped::platform(), kernel_entry, kernel_fdt_addr) {
        // SAFETY: as in `plane_main`.
        Ok(Boot::DirectKernel { entry, args }) => unsafe { enter_kernel(entry, args) },
        Ok(Boot::Scheduled(_)) => {}
        Err(_) => park(),
    }
}
