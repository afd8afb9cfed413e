// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Simulated register backends for host-side tests.
//!
//! Bring-up timeouts are iteration counts, not wall-clock time, so the
//! simulated clock registers model latency in poll counts: a status bit
//! stays clear for a scripted number of reads after its enable bit is
//! written, then sets. The simulated watchdog models the hardware countdown
//! the real key register hides.

use core::cell::Cell;

use serde::Serialize;

use crate::regs::{cfgr, cr, iwdg, pllcfgr};
use crate::registers::RegisterAccess;

/// Scripted RCC register bank.
///
/// Reads take `&self` on the trait, so the poll bookkeeping lives in cells.
#[derive(Debug, Serialize)]
pub struct SimRcc {
    cr: Cell<u32>,
    pllcfgr: Cell<u32>,
    cfgr: Cell<u32>,

    /// Failing status reads before HSERDY sets; `None` never sets it.
    hse_ready_after: Option<u32>,
    /// Failing status reads before PLLRDY sets; `None` never sets it.
    pll_lock_after: Option<u32>,
    /// Failing status reads before SWS follows SW.
    switch_after: u32,

    hse_polls: Cell<u32>,
    pll_polls: Cell<u32>,
    switch_polls: Cell<u32>,

    cr_reads: Cell<u32>,
    pllcfgr_writes: Cell<u32>,
    cfgr_writes: Cell<u32>,
}

impl SimRcc {
    /// Bank where every status bit comes up on the first poll.
    pub fn responsive() -> Self {
        Self {
            cr: Cell::new(0),
            pllcfgr: Cell::new(0),
            cfgr: Cell::new(0),
            hse_ready_after: Some(0),
            pll_lock_after: Some(0),
            switch_after: 0,
            hse_polls: Cell::new(0),
            pll_polls: Cell::new(0),
            switch_polls: Cell::new(0),
            cr_reads: Cell::new(0),
            pllcfgr_writes: Cell::new(0),
            cfgr_writes: Cell::new(0),
        }
    }

    pub fn hse_ready_after(mut self, polls: u32) -> Self {
        self.hse_ready_after = Some(polls);
        self
    }

    pub fn hse_never_ready(mut self) -> Self {
        self.hse_ready_after = None;
        self
    }

    pub fn pll_lock_after(mut self, polls: u32) -> Self {
        self.pll_lock_after = Some(polls);
        self
    }

    pub fn pll_never_locks(mut self) -> Self {
        self.pll_lock_after = None;
        self
    }

    pub fn switch_after(mut self, polls: u32) -> Self {
        self.switch_after = polls;
        self
    }

    /// Seed a register with initial contents, e.g. a reserved-bit pattern
    /// that a read-modify-write sequence must leave untouched.
    pub fn seed(self, addr: u32, value: u32) -> Self {
        match addr {
            cr::ADDR => self.cr.set(value),
            pllcfgr::ADDR => self.pllcfgr.set(value),
            cfgr::ADDR => self.cfgr.set(value),
            _ => {}
        }
        self
    }

    /// Current register word without advancing any poll bookkeeping.
    pub fn peek(&self, addr: u32) -> u32 {
        match addr {
            cr::ADDR => self.cr.get(),
            pllcfgr::ADDR => self.pllcfgr.get(),
            cfgr::ADDR => self.cfgr.get(),
            _ => 0,
        }
    }

    pub fn cr_reads(&self) -> u32 {
        self.cr_reads.get()
    }

    /// Status reads seen while the oscillator enable bit was set.
    pub fn hse_polls(&self) -> u32 {
        self.hse_polls.get()
    }

    /// Status reads seen while the PLL enable bit was set.
    pub fn pll_polls(&self) -> u32 {
        self.pll_polls.get()
    }

    pub fn pllcfgr_writes(&self) -> u32 {
        self.pllcfgr_writes.get()
    }

    pub fn cfgr_writes(&self) -> u32 {
        self.cfgr_writes.get()
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn read_cr(&self) -> u32 {
        self.cr_reads.set(self.cr_reads.get() + 1);
        let mut val = self.cr.get();

        if val & cr::Cr::HSEON.bits() != 0 {
            self.hse_polls.set(self.hse_polls.get() + 1);
            if let Some(after) = self.hse_ready_after {
                if self.hse_polls.get() > after {
                    val |= cr::Cr::HSERDY.bits();
                }
            }
        }
        if val & cr::Cr::PLLON.bits() != 0 {
            self.pll_polls.set(self.pll_polls.get() + 1);
            if let Some(after) = self.pll_lock_after {
                if self.pll_polls.get() > after {
                    val |= cr::Cr::PLLRDY.bits();
                }
            }
        }

        self.cr.set(val);
        val
    }

    fn read_cfgr(&self) -> u32 {
        let mut val = self.cfgr.get();
        let sw = (val >> cfgr::SW_SHIFT) & cfgr::SW_MASK;

        if sw == cfgr::SRC_PLL {
            self.switch_polls.set(self.switch_polls.get() + 1);
            if self.switch_polls.get() > self.switch_after {
                val &= !(cfgr::SWS_MASK << cfgr::SWS_SHIFT);
                val |= cfgr::SRC_PLL << cfgr::SWS_SHIFT;
            }
        }

        self.cfgr.set(val);
        val
    }
}

impl Default for SimRcc {
    fn default() -> Self {
        Self::responsive()
    }
}

impl RegisterAccess for SimRcc {
    fn read(&self, addr: u32) -> u32 {
        match addr {
            cr::ADDR => self.read_cr(),
            pllcfgr::ADDR => self.pllcfgr.get(),
            cfgr::ADDR => self.read_cfgr(),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u32, value: u32) {
        match addr {
            cr::ADDR => {
                let old = self.cr.get();
                if value & !old & cr::Cr::HSEON.bits() != 0 {
                    self.hse_polls.set(0);
                }
                if value & !old & cr::Cr::PLLON.bits() != 0 {
                    self.pll_polls.set(0);
                }
                self.cr.set(value);
            }
            pllcfgr::ADDR => {
                self.pllcfgr_writes.set(self.pllcfgr_writes.get() + 1);
                self.pllcfgr.set(value);
            }
            cfgr::ADDR => {
                self.cfgr_writes.set(self.cfgr_writes.get() + 1);
                let old_sw = (self.cfgr.get() >> cfgr::SW_SHIFT) & cfgr::SW_MASK;
                let new_sw = (value >> cfgr::SW_SHIFT) & cfgr::SW_MASK;
                if old_sw != new_sw {
                    self.switch_polls.set(0);
                }
                self.cfgr.set(value);
            }
            _ => {}
        }
    }
}

/// Simulated independent watchdog: the hardware countdown plus a latched
/// reset. Tests advance hardware time explicitly with [`step`](Self::step).
#[derive(Debug, Serialize)]
pub struct SimWatchdog {
    window: u32,
    remaining: u32,
    running: bool,
    resets: u32,
    refreshes: u32,
}

impl SimWatchdog {
    /// A watchdog whose timeout window is `window` ticks.
    pub fn new(window: u32) -> Self {
        Self {
            window,
            remaining: 0,
            running: false,
            resets: 0,
            refreshes: 0,
        }
    }

    /// Advance hardware time. If the window elapses without a refresh the
    /// reset fires exactly once and the countdown stops, like the real
    /// device rebooting.
    pub fn step(&mut self, ticks: u32) {
        if !self.running {
            return;
        }
        if ticks >= self.remaining {
            self.remaining = 0;
            self.running = false;
            self.resets += 1;
        } else {
            self.remaining -= ticks;
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn resets(&self) -> u32 {
        self.resets
    }

    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl RegisterAccess for SimWatchdog {
    /// The key register is write-only; reads see nothing.
    fn read(&self, _addr: u32) -> u32 {
        0
    }

    fn write(&mut self, addr: u32, value: u32) {
        if addr != iwdg::KR_ADDR {
            return;
        }
        match value {
            iwdg::KEY_START => {
                self.running = true;
                self.remaining = self.window;
            }
            iwdg::KEY_REFRESH => {
                if self.running {
                    self.remaining = self.window;
                    self.refreshes += 1;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hse_latency_counts_failing_reads() {
        let mut rcc = SimRcc::responsive().hse_ready_after(3);
        rcc.write(cr::ADDR, cr::Cr::HSEON.bits());

        for _ in 0..3 {
            assert_eq!(rcc.read(cr::ADDR) & cr::Cr::HSERDY.bits(), 0);
        }
        assert_ne!(rcc.read(cr::ADDR) & cr::Cr::HSERDY.bits(), 0);
    }

    #[test]
    fn test_status_never_sets_without_enable() {
        let rcc = SimRcc::responsive();
        for _ in 0..10 {
            assert_eq!(rcc.read(cr::ADDR) & cr::Cr::HSERDY.bits(), 0);
        }
    }

    #[test]
    fn test_seeded_bits_survive_peek() {
        let reserved = 0x8000_0000;
        let rcc = SimRcc::responsive().seed(pllcfgr::ADDR, reserved);
        assert_eq!(rcc.peek(pllcfgr::ADDR), reserved);
    }

    #[test]
    fn test_sws_follows_sw_after_latency() {
        let mut rcc = SimRcc::responsive().switch_after(2);
        rcc.write(cfgr::ADDR, cfgr::SRC_PLL << cfgr::SW_SHIFT);

        let sws = |v: u32| (v >> cfgr::SWS_SHIFT) & cfgr::SWS_MASK;
        assert_ne!(sws(rcc.read(cfgr::ADDR)), cfgr::SRC_PLL);
        assert_ne!(sws(rcc.read(cfgr::ADDR)), cfgr::SRC_PLL);
        assert_eq!(sws(rcc.read(cfgr::ADDR)), cfgr::SRC_PLL);
    }

    #[test]
    fn test_watchdog_idle_until_started() {
        let mut dog = SimWatchdog::new(8);
        dog.step(1000);
        assert_eq!(dog.resets(), 0);
        assert!(!dog.running());
    }

    #[test]
    fn test_snapshot_is_structured() {
        let dog = SimWatchdog::new(8);
        assert!(dog.snapshot().is_object());
    }
}
