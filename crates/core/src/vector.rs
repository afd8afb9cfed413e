// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hardware vector table construction and default-handler policy.
//!
//! The table is a fixed-length, positionally-addressed sequence read directly
//! by hardware: position IS interrupt identity. [`VectorHandlers`] carries
//! one associated handler constant per named vector, each defaulting to
//! [`default_handler`]; overriding a constant in the implementation is the
//! whole override mechanism. Resolution is finished at compile time — there
//! is no runtime "is this overridden?" check and no fallback lookup.

use crate::regs::aircr;

/// Interrupt/exception entry point, as hardware calls it.
pub type Handler = unsafe extern "C" fn();

/// System (fault/exception) slots ahead of the peripheral vectors,
/// including the initial stack word and the reserved positions.
pub const SYSTEM_VECTORS: usize = 16;
/// Peripheral interrupt count for this device.
pub const DEVICE_IRQS: usize = 60;
/// Total table length in words.
pub const TABLE_WORDS: usize = SYSTEM_VECTORS + DEVICE_IRQS;

/// Fault and system exception positions within the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exception {
    Nmi = 2,
    HardFault = 3,
    MemManage = 4,
    BusFault = 5,
    UsageFault = 6,
    SVCall = 11,
    DebugMonitor = 12,
    PendSV = 14,
    SysTick = 15,
}

/// Peripheral interrupt positions, numbered from the start of the
/// peripheral section (table position = [`SYSTEM_VECTORS`] + value).
/// The order reproduces the device's documented table exactly.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Irq {
    WWDG = 0,
    PVD = 1,
    TAMPER = 2,
    RTC = 3,
    FLASH = 4,
    RCC = 5,
    EXTI0 = 6,
    EXTI1 = 7,
    EXTI2 = 8,
    EXTI3 = 9,
    EXTI4 = 10,
    DMA1_CHANNEL1 = 11,
    DMA1_CHANNEL2 = 12,
    DMA1_CHANNEL3 = 13,
    DMA1_CHANNEL4 = 14,
    DMA1_CHANNEL5 = 15,
    DMA1_CHANNEL6 = 16,
    DMA1_CHANNEL7 = 17,
    ADC1_2 = 18,
    USB_HP_CAN_TX = 19,
    USB_LP_CAN_RX0 = 20,
    CAN_RX1 = 21,
    CAN_SCE = 22,
    EXTI9_5 = 23,
    TIM1_BRK = 24,
    TIM1_UP = 25,
    TIM1_TRG_COM = 26,
    TIM1_CC = 27,
    TIM2 = 28,
    TIM3 = 29,
    TIM4 = 30,
    I2C1_EV = 31,
    I2C1_ER = 32,
    I2C2_EV = 33,
    I2C2_ER = 34,
    SPI1 = 35,
    SPI2 = 36,
    USART1 = 37,
    USART2 = 38,
    USART3 = 39,
    EXTI15_10 = 40,
    RTC_ALARM = 41,
    USB_WAKEUP = 42,
    TIM8_BRK = 43,
    TIM8_UP = 44,
    TIM8_TRG_COM = 45,
    TIM8_CC = 46,
    ADC3 = 47,
    FSMC = 48,
    SDIO = 49,
    TIM5 = 50,
    SPI3 = 51,
    UART4 = 52,
    UART5 = 53,
    TIM6 = 54,
    TIM7 = 55,
    DMA2_CHANNEL1 = 56,
    DMA2_CHANNEL2 = 57,
    DMA2_CHANNEL3 = 58,
    DMA2_CHANNEL4_5 = 59,
}

impl Irq {
    /// Absolute position of this interrupt in the table.
    pub const fn position(self) -> usize {
        SYSTEM_VECTORS + self as usize
    }
}

/// One word of the table: a handler entry, the initial stack value, or a
/// reserved zero. Function pointers and data words share representation in
/// the table on every supported target.
#[derive(Clone, Copy)]
pub union Vector {
    handler: Handler,
    word: usize,
}

impl Vector {
    pub const fn handler(h: Handler) -> Self {
        Vector { handler: h }
    }

    pub const fn reserved() -> Self {
        Vector { word: 0 }
    }

    /// Initial stack-pointer word for slot zero.
    pub const fn stack(addr: usize) -> Self {
        Vector { word: addr }
    }

    /// Raw table word, for inspection and tests.
    pub fn word(self) -> usize {
        unsafe { self.word }
    }
}

/// Handler bindings for every named vector. Anything not overridden binds to
/// [`default_handler`]; only the reset entry must be supplied.
pub trait VectorHandlers {
    const RESET: Handler;

    const NMI: Handler = default_handler;
    const HARD_FAULT: Handler = default_handler;
    const MEM_MANAGE: Handler = default_handler;
    const BUS_FAULT: Handler = default_handler;
    const USAGE_FAULT: Handler = default_handler;
    const SVCALL: Handler = default_handler;
    const DEBUG_MONITOR: Handler = default_handler;
    const PENDSV: Handler = default_handler;
    const SYSTICK: Handler = default_handler;

    const WWDG: Handler = default_handler;
    const PVD: Handler = default_handler;
    const TAMPER: Handler = default_handler;
    const RTC: Handler = default_handler;
    const FLASH: Handler = default_handler;
    const RCC: Handler = default_handler;
    const EXTI0: Handler = default_handler;
    const EXTI1: Handler = default_handler;
    const EXTI2: Handler = default_handler;
    const EXTI3: Handler = default_handler;
    const EXTI4: Handler = default_handler;
    const DMA1_CHANNEL1: Handler = default_handler;
    const DMA1_CHANNEL2: Handler = default_handler;
    const DMA1_CHANNEL3: Handler = default_handler;
    const DMA1_CHANNEL4: Handler = default_handler;
    const DMA1_CHANNEL5: Handler = default_handler;
    const DMA1_CHANNEL6: Handler = default_handler;
    const DMA1_CHANNEL7: Handler = default_handler;
    const ADC1_2: Handler = default_handler;
    const USB_HP_CAN_TX: Handler = default_handler;
    const USB_LP_CAN_RX0: Handler = default_handler;
    const CAN_RX1: Handler = default_handler;
    const CAN_SCE: Handler = default_handler;
    const EXTI9_5: Handler = default_handler;
    const TIM1_BRK: Handler = default_handler;
    const TIM1_UP: Handler = default_handler;
    const TIM1_TRG_COM: Handler = default_handler;
    const TIM1_CC: Handler = default_handler;
    const TIM2: Handler = default_handler;
    const TIM3: Handler = default_handler;
    const TIM4: Handler = default_handler;
    const I2C1_EV: Handler = default_handler;
    const I2C1_ER: Handler = default_handler;
    const I2C2_EV: Handler = default_handler;
    const I2C2_ER: Handler = default_handler;
    const SPI1: Handler = default_handler;
    const SPI2: Handler = default_handler;
    const USART1: Handler = default_handler;
    const USART2: Handler = default_handler;
    const USART3: Handler = default_handler;
    const EXTI15_10: Handler = default_handler;
    const RTC_ALARM: Handler = default_handler;
    const USB_WAKEUP: Handler = default_handler;
    const TIM8_BRK: Handler = default_handler;
    const TIM8_UP: Handler = default_handler;
    const TIM8_TRG_COM: Handler = default_handler;
    const TIM8_CC: Handler = default_handler;
    const ADC3: Handler = default_handler;
    const FSMC: Handler = default_handler;
    const SDIO: Handler = default_handler;
    const TIM5: Handler = default_handler;
    const SPI3: Handler = default_handler;
    const UART4: Handler = default_handler;
    const UART5: Handler = default_handler;
    const TIM6: Handler = default_handler;
    const TIM7: Handler = default_handler;
    const DMA2_CHANNEL1: Handler = default_handler;
    const DMA2_CHANNEL2: Handler = default_handler;
    const DMA2_CHANNEL3: Handler = default_handler;
    const DMA2_CHANNEL4_5: Handler = default_handler;
}

/// The fixed hardware vector table. Built once, immutable thereafter.
#[repr(transparent)]
pub struct VectorTable(pub [Vector; TABLE_WORDS]);

impl VectorTable {
    /// Build the device's table for the handler set `H`, bit-exact to the
    /// documented layout: initial stack, reset, the fault/system block with
    /// its reserved zero slots, then the peripheral vectors in order.
    pub const fn new<H: VectorHandlers>(initial_stack: Vector) -> Self {
        let mut t = [Vector::reserved(); TABLE_WORDS];

        t[0] = initial_stack;
        t[1] = Vector::handler(H::RESET);
        t[Exception::Nmi as usize] = Vector::handler(H::NMI);
        t[Exception::HardFault as usize] = Vector::handler(H::HARD_FAULT);
        t[Exception::MemManage as usize] = Vector::handler(H::MEM_MANAGE);
        t[Exception::BusFault as usize] = Vector::handler(H::BUS_FAULT);
        t[Exception::UsageFault as usize] = Vector::handler(H::USAGE_FAULT);
        // 7..=10 reserved.
        t[Exception::SVCall as usize] = Vector::handler(H::SVCALL);
        t[Exception::DebugMonitor as usize] = Vector::handler(H::DEBUG_MONITOR);
        // 13 reserved.
        t[Exception::PendSV as usize] = Vector::handler(H::PENDSV);
        t[Exception::SysTick as usize] = Vector::handler(H::SYSTICK);

        t[Irq::WWDG.position()] = Vector::handler(H::WWDG);
        t[Irq::PVD.position()] = Vector::handler(H::PVD);
        t[Irq::TAMPER.position()] = Vector::handler(H::TAMPER);
        t[Irq::RTC.position()] = Vector::handler(H::RTC);
        t[Irq::FLASH.position()] = Vector::handler(H::FLASH);
        t[Irq::RCC.position()] = Vector::handler(H::RCC);
        t[Irq::EXTI0.position()] = Vector::handler(H::EXTI0);
        t[Irq::EXTI1.position()] = Vector::handler(H::EXTI1);
        t[Irq::EXTI2.position()] = Vector::handler(H::EXTI2);
        t[Irq::EXTI3.position()] = Vector::handler(H::EXTI3);
        t[Irq::EXTI4.position()] = Vector::handler(H::EXTI4);
        t[Irq::DMA1_CHANNEL1.position()] = Vector::handler(H::DMA1_CHANNEL1);
        t[Irq::DMA1_CHANNEL2.position()] = Vector::handler(H::DMA1_CHANNEL2);
        t[Irq::DMA1_CHANNEL3.position()] = Vector::handler(H::DMA1_CHANNEL3);
        t[Irq::DMA1_CHANNEL4.position()] = Vector::handler(H::DMA1_CHANNEL4);
        t[Irq::DMA1_CHANNEL5.position()] = Vector::handler(H::DMA1_CHANNEL5);
        t[Irq::DMA1_CHANNEL6.position()] = Vector::handler(H::DMA1_CHANNEL6);
        t[Irq::DMA1_CHANNEL7.position()] = Vector::handler(H::DMA1_CHANNEL7);
        t[Irq::ADC1_2.position()] = Vector::handler(H::ADC1_2);
        t[Irq::USB_HP_CAN_TX.position()] = Vector::handler(H::USB_HP_CAN_TX);
        t[Irq::USB_LP_CAN_RX0.position()] = Vector::handler(H::USB_LP_CAN_RX0);
        t[Irq::CAN_RX1.position()] = Vector::handler(H::CAN_RX1);
        t[Irq::CAN_SCE.position()] = Vector::handler(H::CAN_SCE);
        t[Irq::EXTI9_5.position()] = Vector::handler(H::EXTI9_5);
        t[Irq::TIM1_BRK.position()] = Vector::handler(H::TIM1_BRK);
        t[Irq::TIM1_UP.position()] = Vector::handler(H::TIM1_UP);
        t[Irq::TIM1_TRG_COM.position()] = Vector::handler(H::TIM1_TRG_COM);
        t[Irq::TIM1_CC.position()] = Vector::handler(H::TIM1_CC);
        t[Irq::TIM2.position()] = Vector::handler(H::TIM2);
        t[Irq::TIM3.position()] = Vector::handler(H::TIM3);
        t[Irq::TIM4.position()] = Vector::handler(H::TIM4);
        t[Irq::I2C1_EV.position()] = Vector::handler(H::I2C1_EV);
        t[Irq::I2C1_ER.position()] = Vector::handler(H::I2C1_ER);
        t[Irq::I2C2_EV.position()] = Vector::handler(H::I2C2_EV);
        t[Irq::I2C2_ER.position()] = Vector::handler(H::I2C2_ER);
        t[Irq::SPI1.position()] = Vector::handler(H::SPI1);
        t[Irq::SPI2.position()] = Vector::handler(H::SPI2);
        t[Irq::USART1.position()] = Vector::handler(H::USART1);
        t[Irq::USART2.position()] = Vector::handler(H::USART2);
        t[Irq::USART3.position()] = Vector::handler(H::USART3);
        t[Irq::EXTI15_10.position()] = Vector::handler(H::EXTI15_10);
        t[Irq::RTC_ALARM.position()] = Vector::handler(H::RTC_ALARM);
        t[Irq::USB_WAKEUP.position()] = Vector::handler(H::USB_WAKEUP);
        t[Irq::TIM8_BRK.position()] = Vector::handler(H::TIM8_BRK);
        t[Irq::TIM8_UP.position()] = Vector::handler(H::TIM8_UP);
        t[Irq::TIM8_TRG_COM.position()] = Vector::handler(H::TIM8_TRG_COM);
        t[Irq::TIM8_CC.position()] = Vector::handler(H::TIM8_CC);
        t[Irq::ADC3.position()] = Vector::handler(H::ADC3);
        t[Irq::FSMC.position()] = Vector::handler(H::FSMC);
        t[Irq::SDIO.position()] = Vector::handler(H::SDIO);
        t[Irq::TIM5.position()] = Vector::handler(H::TIM5);
        t[Irq::SPI3.position()] = Vector::handler(H::SPI3);
        t[Irq::UART4.position()] = Vector::handler(H::UART4);
        t[Irq::UART5.position()] = Vector::handler(H::UART5);
        t[Irq::TIM6.position()] = Vector::handler(H::TIM6);
        t[Irq::TIM7.position()] = Vector::handler(H::TIM7);
        t[Irq::DMA2_CHANNEL1.position()] = Vector::handler(H::DMA2_CHANNEL1);
        t[Irq::DMA2_CHANNEL2.position()] = Vector::handler(H::DMA2_CHANNEL2);
        t[Irq::DMA2_CHANNEL3.position()] = Vector::handler(H::DMA2_CHANNEL3);
        t[Irq::DMA2_CHANNEL4_5.position()] = Vector::handler(H::DMA2_CHANNEL4_5);

        VectorTable(t)
    }

    /// Raw word at `position`, for inspection and tests.
    pub fn entry(&self, position: usize) -> usize {
        self.0[position].word()
    }

    pub fn entry_for(&self, irq: Irq) -> usize {
        self.entry(irq.position())
    }
}

/// Fallback for every vector without an explicit override.
///
/// Diagnostic builds (`diagnostic` feature) park the core here so a debugger
/// can attach and inspect state. Production builds escalate to a full system
/// reset instead of spinning unattended — no richer recovery is possible at
/// this layer.
pub extern "C" fn default_handler() {
    #[cfg(feature = "diagnostic")]
    loop {
        core::hint::spin_loop();
    }

    #[cfg(not(feature = "diagnostic"))]
    system_reset();
}

/// Request a system reset through the reset control register, then wait for
/// it to take effect.
pub fn system_reset() -> ! {
    unsafe {
        core::ptr::write_volatile(
            aircr::ADDR as *mut u32,
            aircr::VECTKEY | aircr::SYSRESETREQ,
        );
    }
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn spy_reset() {}
    extern "C" fn spy_systick() {}

    struct Defaults;
    impl VectorHandlers for Defaults {
        const RESET: Handler = spy_reset;
    }

    struct WithOverride;
    impl VectorHandlers for WithOverride {
        const RESET: Handler = spy_reset;
        const SYSTICK: Handler = spy_systick;
        const TIM2: Handler = spy_systick;
    }

    const STACK: usize = 0x2000_5000;

    fn table<H: VectorHandlers>() -> VectorTable {
        VectorTable::new::<H>(Vector::stack(STACK))
    }

    #[test]
    fn test_stack_and_reset_lead_the_table() {
        let t = table::<Defaults>();
        assert_eq!(t.entry(0), STACK);
        assert_eq!(t.entry(1), spy_reset as usize);
    }

    #[test]
    fn test_reserved_slots_are_zero() {
        let t = table::<Defaults>();
        for pos in [7, 8, 9, 10, 13] {
            assert_eq!(t.entry(pos), 0, "slot {pos} must stay reserved");
        }
    }

    #[test]
    fn test_unset_vectors_bind_to_default_handler() {
        let t = table::<Defaults>();
        let fallback = default_handler as usize;
        for pos in 2..TABLE_WORDS {
            let word = t.entry(pos);
            if word != 0 {
                assert_eq!(word, fallback, "slot {pos} escaped the default");
            }
        }
    }

    #[test]
    fn test_override_binds_only_its_own_slots() {
        let t = table::<WithOverride>();
        assert_eq!(t.entry(Exception::SysTick as usize), spy_systick as usize);
        assert_eq!(t.entry_for(Irq::TIM2), spy_systick as usize);
        // Neighbours keep the default.
        assert_eq!(t.entry(Exception::PendSV as usize), default_handler as usize);
        assert_eq!(t.entry_for(Irq::TIM3), default_handler as usize);
    }

    #[test]
    fn test_peripheral_positions_match_documented_table() {
        assert_eq!(Irq::WWDG.position(), 16);
        assert_eq!(Irq::RCC.position(), 21);
        assert_eq!(Irq::USART2.position(), 54);
        assert_eq!(Irq::DMA2_CHANNEL4_5.position(), TABLE_WORDS - 1);
    }

    #[test]
    fn test_every_populated_word_is_callable_or_stack() {
        // No slot may point into arbitrary memory: every non-zero word is
        // either the stack word or one of the handlers we supplied.
        let t = table::<WithOverride>();
        let known = [
            STACK,
            spy_reset as usize,
            spy_systick as usize,
            default_handler as usize,
        ];
        for pos in 0..TABLE_WORDS {
            let word = t.entry(pos);
            assert!(
                word == 0 || known.contains(&word),
                "slot {pos} holds unknown word {word:#x}"
            );
        }
    }
}
