// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bit-exact register map for the target device.
//!
//! Addresses and field positions follow the reference manual and must not be
//! adjusted: position is meaning. Each module covers one register; the
//! `FIELD_MASK` constants name exactly the bits the bring-up code owns, so
//! read-modify-write sequences can preserve every reserved bit.

use bitflags::bitflags;

/// Reset and clock control block.
pub const RCC_BASE: u32 = 0x4002_3800;
/// Independent watchdog block.
pub const IWDG_BASE: u32 = 0x4000_3000;

/// RCC clock control register: oscillator and PLL enable/status bits.
pub mod cr {
    use super::bitflags;

    pub const ADDR: u32 = super::RCC_BASE;

    bitflags! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct Cr: u32 {
            /// External oscillator enable.
            const HSEON = 1 << 16;
            /// External oscillator ready, set by hardware.
            const HSERDY = 1 << 17;
            /// Main PLL enable.
            const PLLON = 1 << 24;
            /// Main PLL locked, set by hardware.
            const PLLRDY = 1 << 25;
        }
    }
}

/// RCC PLL configuration register.
///
/// One input divider (M) ahead of the VCO, the multiplier (N), and two
/// independent output taps: P feeds the system clock, Q feeds the 48 MHz
/// peripheral domain.
pub mod pllcfgr {
    pub const ADDR: u32 = super::RCC_BASE + 0x04;

    pub const PLLM_SHIFT: u32 = 0;
    pub const PLLM_MASK: u32 = 0x3F;
    pub const PLLN_SHIFT: u32 = 6;
    pub const PLLN_MASK: u32 = 0x1FF;
    pub const PLLP_SHIFT: u32 = 16;
    pub const PLLP_MASK: u32 = 0x3;
    /// Source select: 0 = internal oscillator, 1 = external.
    pub const PLLSRC: u32 = 1 << 22;
    pub const PLLQ_SHIFT: u32 = 24;
    pub const PLLQ_MASK: u32 = 0xF;

    /// Every bit the clock controller owns; the rest are reserved and must
    /// survive a configuration write unchanged.
    pub const FIELD_MASK: u32 = (PLLM_MASK << PLLM_SHIFT)
        | (PLLN_MASK << PLLN_SHIFT)
        | (PLLP_MASK << PLLP_SHIFT)
        | PLLSRC
        | (PLLQ_MASK << PLLQ_SHIFT);
}

/// RCC clock configuration register: bus prescalers and system clock source.
pub mod cfgr {
    pub const ADDR: u32 = super::RCC_BASE + 0x08;

    /// Source select written by software.
    pub const SW_SHIFT: u32 = 0;
    pub const SW_MASK: u32 = 0x3;
    /// Active source reported back by hardware.
    pub const SWS_SHIFT: u32 = 2;
    pub const SWS_MASK: u32 = 0x3;

    pub const SRC_HSI: u32 = 0b00;
    pub const SRC_HSE: u32 = 0b01;
    pub const SRC_PLL: u32 = 0b10;

    /// Core (AHB) prescaler.
    pub const HPRE_SHIFT: u32 = 4;
    pub const HPRE_MASK: u32 = 0xF;
    /// Low-speed peripheral bus (APB1) prescaler.
    pub const PPRE1_SHIFT: u32 = 10;
    pub const PPRE1_MASK: u32 = 0x7;
    /// High-speed peripheral bus (APB2) prescaler.
    pub const PPRE2_SHIFT: u32 = 13;
    pub const PPRE2_MASK: u32 = 0x7;

    /// Bits owned by the clock controller. SWS is hardware-written status
    /// and deliberately not part of this mask.
    pub const FIELD_MASK: u32 = (SW_MASK << SW_SHIFT)
        | (HPRE_MASK << HPRE_SHIFT)
        | (PPRE1_MASK << PPRE1_SHIFT)
        | (PPRE2_MASK << PPRE2_SHIFT);
}

/// Independent watchdog key register. Write-only; reads as zero.
pub mod iwdg {
    pub const KR_ADDR: u32 = super::IWDG_BASE;

    /// Reload the countdown.
    pub const KEY_REFRESH: u32 = 0x0000_AAAA;
    /// Start the watchdog. Cannot be undone until the next power cycle.
    pub const KEY_START: u32 = 0x0000_CCCC;
    /// Unlock the prescaler/reload registers for writes.
    pub const KEY_UNLOCK: u32 = 0x0000_5555;
}

/// Application interrupt and reset control register (system control block).
pub mod aircr {
    pub const ADDR: u32 = 0xE000_ED0C;

    /// Writes are ignored without this key in the upper half-word.
    pub const VECTKEY: u32 = 0x05FA << 16;
    pub const SYSRESETREQ: u32 = 1 << 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pllcfgr_fields_do_not_overlap() {
        let fields = [
            pllcfgr::PLLM_MASK << pllcfgr::PLLM_SHIFT,
            pllcfgr::PLLN_MASK << pllcfgr::PLLN_SHIFT,
            pllcfgr::PLLP_MASK << pllcfgr::PLLP_SHIFT,
            pllcfgr::PLLSRC,
            pllcfgr::PLLQ_MASK << pllcfgr::PLLQ_SHIFT,
        ];
        let mut seen = 0u32;
        for f in fields {
            assert_eq!(seen & f, 0, "field {f:#010x} overlaps");
            seen |= f;
        }
        assert_eq!(seen, pllcfgr::FIELD_MASK);
    }

    #[test]
    fn test_cfgr_status_field_not_software_owned() {
        assert_eq!(cfgr::FIELD_MASK & (cfgr::SWS_MASK << cfgr::SWS_SHIFT), 0);
    }

    #[test]
    fn test_watchdog_keys_are_distinct() {
        assert_ne!(iwdg::KEY_REFRESH, iwdg::KEY_START);
        assert_ne!(iwdg::KEY_REFRESH, iwdg::KEY_UNLOCK);
        assert!(iwdg::KEY_REFRESH <= 0xFFFF);
        assert!(iwdg::KEY_START <= 0xFFFF);
    }
}
