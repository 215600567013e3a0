// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Optional byte-at-a-time diagnostic output.

use core::fmt::{self, Write};

use spin::Mutex;

/// Destination for diagnostic bytes.
pub trait ByteSink: Sync {
    /// Emits one byte.
    fn put(&self, byte: u8);
}

/// PL011 data register without flow control; writes are fire-and-forget.
pub struct Pl011 {
    base: usize,
}

impl Pl011 {
    /// Creates a sink rooted at the UART data register `base`.
    pub const fn new(base: usize) -> Self {
        Self { base }
    }
}

impl ByteSink for Pl011 {
    fn put(&self, byte: u8) {
        // SAFETY: `base` names a device register mapped for the lifetime of the monitor.
        unsafe { core::ptr::write_volatile(self.base as *mut u8, byte) }
    }
}

static SINK: Mutex<Option<&'static dyn ByteSink>> = Mutex::new(None);

/// Routes diagnostics to `sink`, replacing any previous sink.
pub fn install(sink: &'static dyn ByteSink) {
    *SINK.lock() = Some(sink);
}

/// Drops diagnostics from now on.
pub fn uninstall() {
    *SINK.lock() = None;
}

/// Formatter over the installed sink; expands `\n` to `\r\n`.
pub struct SinkWriter<'a> {
    sink: &'a dyn ByteSink,
}

impl<'a> SinkWriter<'a> {
    /// Writer that bypasses the registry; used where the registry lock may be held.
    pub fn new(sink: &'a dyn ByteSink) -> Self {
        Self { sink }
    }
}

impl Write for SinkWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            if byte == b'\n' {
                self.sink.put(b'\r');
            }
            self.sink.put(byte);
        }
        Ok(())
    }
}

/// Runs `f` with exclusive access to the sink; does nothing when none is installed.
pub(crate) fn with_writer(f: impl FnOnce(&mut SinkWriter<'_>)) {
    let guard = SINK.lock();
    if let Some(sink) = *guard {
        let mut writer = SinkWriter { sink };
        f(&mut writer);
    }
}

/// Writes `message` followed by a newline.
pub fn write_line(message: &str) {
    with_writer(|w| {
        let _ = w.write_str(message);
        let _ = w.write_char('\n');
    });
}
