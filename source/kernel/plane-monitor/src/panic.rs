// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Panic handler for bare-metal monitor images
//! OWNERS: @realm-runtime
//! PUBLIC API: panic handler (no_std, `panic_handler` feature)
//! DEPENDS_ON: diag::console (Pl011, SinkWriter)
//! INVARIANTS: Writes straight to the UART without taking the console lock; never returns

use core::{fmt::Write, panic::PanicInfo};

use crate::diag::console::{Pl011, SinkWriter};
use crate::platform::UART0_BASE;

static PANIC_UART: Pl011 = Pl011::new(UART0_BASE);

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let mut w = SinkWriter::new(&PANIC_UART);
    let _ = w.write_str("\n[P0] PANIC: ");
    if let Some(location) = info.location() {
        let _ = write!(w, "{}:{}: ", location.file(), location.line());
    }
    let _ = writeln!(w, "{}", info.message());

    loop {
        // SAFETY: `wfe` has no memory or register side effects.
        unsafe { core::arch::asm!("wfe", options(nomem, nostack, preserves_flags)) };
    }
}
