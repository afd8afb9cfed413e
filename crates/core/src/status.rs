// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! One-way diagnostic text output.

/// Human-visible status sink. Strictly one-way: nothing is ever echoed back,
/// and every consumer must tolerate the sink being absent entirely.
pub trait StatusSink {
    fn write_str(&mut self, s: &str);
}

/// The absent sink.
pub struct NullSink;

impl StatusSink for NullSink {
    fn write_str(&mut self, _s: &str) {}
}

/// Host-side sink that forwards status lines to `tracing`.
#[cfg(feature = "std")]
pub struct TraceSink;

#[cfg(feature = "std")]
impl StatusSink for TraceSink {
    fn write_str(&mut self, s: &str) {
        tracing::info!(target: "bootflow::status", "{}", s.trim_end());
    }
}

/// Sink that appends into a string, for tests.
#[cfg(feature = "std")]
#[derive(Default)]
pub struct BufferSink(pub String);

#[cfg(feature = "std")]
impl StatusSink for BufferSink {
    fn write_str(&mut self, s: &str) {
        self.0.push_str(s);
    }
}
