// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The main control loop.
//!
//! Clock bring-up runs once before this loop starts; from then on the loop's
//! contract is simple and absolute: the watchdog refresh is reachable on
//! every iteration, whatever branches the body grows over time. A refresh
//! that can be starved by a long-running branch reintroduces exactly the
//! hang the watchdog exists to catch, so it comes first in the iteration.

use crate::registers::RegisterAccess;
use crate::status::StatusSink;
use crate::watchdog::WatchdogSupervisor;

/// Heartbeat line emitted once per loop iteration.
pub const HEARTBEAT: &str = "bootflow: alive\r\n";

/// Composes the watchdog supervisor with the diagnostic sink. Firmware never
/// exits, so the loop itself never returns.
pub struct MainLoop<R, S> {
    watchdog: WatchdogSupervisor<R>,
    sink: S,
}

impl<R: RegisterAccess, S: StatusSink> MainLoop<R, S> {
    pub fn new(watchdog: WatchdogSupervisor<R>, sink: S) -> Self {
        Self { watchdog, sink }
    }

    /// One loop iteration. Refresh first, unconditionally.
    pub fn service(&mut self) {
        self.watchdog.refresh();
        self.sink.write_str(HEARTBEAT);
    }

    pub fn run(mut self) -> ! {
        loop {
            self.service();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimWatchdog;
    use crate::status::BufferSink;

    #[test]
    fn test_service_refreshes_before_the_window_closes() {
        let mut dog = WatchdogSupervisor::new(SimWatchdog::new(4));
        dog.start();
        let mut main_loop = MainLoop::new(dog, BufferSink::default());

        // Three ticks of work per iteration against a four-tick window.
        for _ in 0..100 {
            main_loop.service();
            main_loop.watchdog.regs_mut().step(3);
        }

        assert_eq!(main_loop.watchdog.regs_mut().resets(), 0);
        assert!(main_loop.sink.0.contains(HEARTBEAT));
    }

    #[test]
    fn test_stalled_loop_is_caught_by_hardware() {
        let mut dog = WatchdogSupervisor::new(SimWatchdog::new(4));
        dog.start();
        let mut main_loop = MainLoop::new(dog, BufferSink::default());

        main_loop.service();
        // The loop hangs; nobody refreshes.
        main_loop.watchdog.regs_mut().step(50);
        assert_eq!(main_loop.watchdog.regs_mut().resets(), 1);
    }
}
