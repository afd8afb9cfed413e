#![no_std]
// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]

//! Reference bring-up firmware.
//!
//! Owns the hardware vector table and reset entry, runs the clock bring-up
//! once, then parks in the supervised main loop: refresh the watchdog, emit
//! a heartbeat, forever.

use bootflow_core::clock::{
    AhbPrescaler, ApbPrescaler, ClockConfiguration, ClockController, OscillatorSource, SysClkDiv,
};
use bootflow_core::registers::Mmio;
use bootflow_core::runtime::MainLoop;
use bootflow_core::status::StatusSink;
use bootflow_core::vector::{Handler, Vector, VectorHandlers, VectorTable};
use bootflow_core::watchdog::WatchdogSupervisor;
use panic_halt as _;

extern "C" {
    // Provided by the linker script. The stack symbol is function-typed only
    // so it can sit in the table's first slot; never call it.
    fn __stack_top();

    static mut __sbss: u32;
    static mut __ebss: u32;
    static mut __sdata: u32;
    static mut __edata: u32;
    static __sidata: u32;
}

struct Board;

impl VectorHandlers for Board {
    const RESET: Handler = reset_handler;
}

/// The table hardware reads at power-on. Position is interrupt identity;
/// everything except reset falls back to the default handler.
#[link_section = ".vectors"]
#[used]
pub static VECTORS: VectorTable = VectorTable::new::<Board>(Vector::handler(__stack_top));

/// 8 MHz crystal up to a 168 MHz core clock, 48 MHz on the peripheral tap.
const CLOCK: ClockConfiguration = ClockConfiguration {
    source: OscillatorSource::External,
    input_div: 8,
    multiplier: 336,
    sysclk_div: SysClkDiv::Div2,
    periph_div: 7,
    ahb_prescaler: AhbPrescaler::Div1,
    apb1_prescaler: ApbPrescaler::Div4,
    apb2_prescaler: ApbPrescaler::Div2,
};

/// Reset entry: bring up RAM, run the runtime stubs, hand off to `main`.
unsafe extern "C" fn reset_handler() {
    // Zero .bss before anything reads a static.
    let mut bss = core::ptr::addr_of_mut!(__sbss);
    let bss_end = core::ptr::addr_of_mut!(__ebss);
    while bss < bss_end {
        core::ptr::write_volatile(bss, 0);
        bss = bss.add(1);
    }

    // Copy initialized .data from its flash image.
    let mut src = core::ptr::addr_of!(__sidata);
    let mut data = core::ptr::addr_of_mut!(__sdata);
    let data_end = core::ptr::addr_of_mut!(__edata);
    while data < data_end {
        core::ptr::write_volatile(data, core::ptr::read(src));
        data = data.add(1);
        src = src.add(1);
    }

    _sbrk();
    _init();

    main()
}

/// Stub satisfying the allocator's expectation of an extensible heap
/// region. This firmware performs no dynamic allocation.
#[no_mangle]
pub extern "C" fn _sbrk() {}

/// Stub for the static-constructor convention. Nothing to run.
#[no_mangle]
pub extern "C" fn _init() {}

// USART2 data register, the board's virtual-COM-port path.
const USART2_DR: *mut u32 = 0x4000_4404 as *mut u32;

/// One-way status output over the serial port.
struct SerialSink;

impl StatusSink for SerialSink {
    fn write_str(&mut self, s: &str) {
        for &byte in s.as_bytes() {
            unsafe {
                core::ptr::write_volatile(USART2_DR, byte as u32);
            }
            // Pace the output so the heartbeat is readable on the wire.
            for _ in 0..100 {
                cortex_m::asm::nop();
            }
        }
    }
}

fn main() -> ! {
    let mut clocks = ClockController::new(unsafe { Mmio::new() });
    if clocks.initialize(&CLOCK).is_err() {
        // Stay on the internal oscillator: the heartbeat cadence degrades
        // but the loop and the watchdog discipline still hold.
    }

    let mut watchdog = WatchdogSupervisor::new(unsafe { Mmio::new() });
    watchdog.start();

    MainLoop::new(watchdog, SerialSink).run()
}
