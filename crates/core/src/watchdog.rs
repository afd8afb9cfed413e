// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hardware watchdog servicing.

use crate::regs::iwdg;
use crate::registers::RegisterAccess;

/// Services the independent watchdog's key register.
///
/// The countdown itself lives entirely in hardware; software's only window
/// into it is the write-only key register. The main loop is the intended
/// sole caller of [`refresh`](Self::refresh) — a missed refresh window is
/// never reported to software and manifests only as the device reset that is
/// the watchdog's whole purpose.
pub struct WatchdogSupervisor<R> {
    regs: R,
}

impl<R: RegisterAccess> WatchdogSupervisor<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Start the hardware countdown. Irreversible until the next power
    /// cycle.
    pub fn start(&mut self) {
        self.regs.write(iwdg::KR_ADDR, iwdg::KEY_START);
    }

    /// Reload the countdown. Must happen again before the configured
    /// timeout window elapses.
    pub fn refresh(&mut self) {
        self.regs.write(iwdg::KR_ADDR, iwdg::KEY_REFRESH);
    }

    #[cfg(test)]
    pub(crate) fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }
}
