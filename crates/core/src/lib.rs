#![cfg_attr(not(feature = "std"), no_std)]
// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Boot bring-up engine for STM32-class microcontrollers.
//!
//! The crate takes a device from power-on reset to a stable operating
//! frequency and keeps it alive afterwards: the clock bring-up state machine
//! ([`clock`]), the hardware vector table ([`vector`]), and the watchdog
//! refresh discipline tied to the main control loop ([`watchdog`],
//! [`runtime`]).
//!
//! All hardware access goes through the [`registers::RegisterAccess`] trait.
//! Components receive their register handle at construction, so host tests
//! can substitute the simulated backends in [`sim`] while firmware injects
//! [`registers::Mmio`].

pub mod clock;
pub mod regs;
pub mod registers;
pub mod runtime;
#[cfg(feature = "std")]
pub mod sim;
pub mod status;
pub mod vector;
pub mod watchdog;

pub use clock::{ClockConfiguration, ClockController, ClockError, ClockState};
pub use registers::{Mmio, RegisterAccess};
pub use runtime::MainLoop;
pub use status::{NullSink, StatusSink};
pub use vector::{Handler, Vector, VectorHandlers, VectorTable};
pub use watchdog::WatchdogSupervisor;
