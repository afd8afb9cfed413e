// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Clock bring-up state machine.
//!
//! Drives the one-time sequence external-oscillator-enable → PLL-configure →
//! PLL-lock → clock-source-switch over an injected [`RegisterAccess`] handle.
//! Every wait is a bounded busy-poll: no calibrated timer is running this
//! early in boot, so timeouts are deterministic iteration counts rather than
//! wall-clock time.

use crate::regs::{cfgr, cr, pllcfgr};
use crate::registers::RegisterAccess;

/// Status polls allowed for the external oscillator to report ready.
pub const OSC_READY_POLLS: u32 = 4096;
/// Status polls allowed for the PLL to report locked.
pub const PLL_LOCK_POLLS: u32 = 4096;
/// Status polls allowed for the source switch to complete. The reference
/// behavior waited forever here; bounding it surfaces a third error kind
/// instead of hanging boot.
pub const SWITCH_POLLS: u32 = 16_384;

/// Reference clock feeding the PLL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum OscillatorSource {
    /// Factory-trimmed internal RC oscillator.
    Internal,
    /// External crystal.
    External,
}

/// System-clock output tap divider (the P field encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum SysClkDiv {
    Div2 = 0b00,
    Div4 = 0b01,
    Div6 = 0b10,
    Div8 = 0b11,
}

impl SysClkDiv {
    pub fn divisor(self) -> u32 {
        (self as u32 + 1) * 2
    }

    fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Div2,
            0b01 => Self::Div4,
            0b10 => Self::Div6,
            _ => Self::Div8,
        }
    }
}

/// Core (AHB) bus prescaler encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum AhbPrescaler {
    Div1 = 0b0000,
    Div2 = 0b1000,
    Div4 = 0b1001,
    Div8 = 0b1010,
    Div16 = 0b1011,
    Div64 = 0b1100,
    Div128 = 0b1101,
    Div256 = 0b1110,
    Div512 = 0b1111,
}

/// Peripheral (APB) bus prescaler encoding, shared by both buses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ApbPrescaler {
    Div1 = 0b000,
    Div2 = 0b100,
    Div4 = 0b101,
    Div8 = 0b110,
    Div16 = 0b111,
}

/// Immutable target parameters for one bring-up attempt.
///
/// The PLL frequency-range invariants (VCO input and output windows, system
/// clock ceiling) are a precondition validated when a configuration is
/// authored — see the `bootflow-config` crate — not re-checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockConfiguration {
    pub source: OscillatorSource,
    /// PLL input divider (M), ahead of the VCO.
    pub input_div: u8,
    /// VCO multiplier (N).
    pub multiplier: u16,
    /// Output tap feeding the system clock (P).
    pub sysclk_div: SysClkDiv,
    /// Output tap feeding the peripheral clock domain (Q).
    pub periph_div: u8,
    pub ahb_prescaler: AhbPrescaler,
    pub apb1_prescaler: ApbPrescaler,
    pub apb2_prescaler: ApbPrescaler,
}

impl ClockConfiguration {
    /// PLL configuration fields as a single register word, covering exactly
    /// [`pllcfgr::FIELD_MASK`].
    pub fn encode_pll(&self) -> u32 {
        let src = match self.source {
            OscillatorSource::Internal => 0,
            OscillatorSource::External => pllcfgr::PLLSRC,
        };
        ((self.input_div as u32 & pllcfgr::PLLM_MASK) << pllcfgr::PLLM_SHIFT)
            | ((self.multiplier as u32 & pllcfgr::PLLN_MASK) << pllcfgr::PLLN_SHIFT)
            | ((self.sysclk_div as u32) << pllcfgr::PLLP_SHIFT)
            | src
            | ((self.periph_div as u32 & pllcfgr::PLLQ_MASK) << pllcfgr::PLLQ_SHIFT)
    }

    /// Bus prescaler fields for the clock configuration register. The source
    /// select is appended by the controller at switch time.
    pub fn encode_buses(&self) -> u32 {
        ((self.ahb_prescaler as u32) << cfgr::HPRE_SHIFT)
            | ((self.apb1_prescaler as u32) << cfgr::PPRE1_SHIFT)
            | ((self.apb2_prescaler as u32) << cfgr::PPRE2_SHIFT)
    }

    /// The PLL fields this configuration intends to program.
    pub fn pll_fields(&self) -> PllFields {
        PllFields::from_word(self.encode_pll())
    }
}

/// PLL field values recovered from a configuration register word, with
/// reserved bits masked away. Round-tripping a written configuration through
/// this type yields the originally intended values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllFields {
    pub source: OscillatorSource,
    pub input_div: u8,
    pub multiplier: u16,
    pub sysclk_div: SysClkDiv,
    pub periph_div: u8,
}

impl PllFields {
    pub fn from_word(word: u32) -> Self {
        let source = if word & pllcfgr::PLLSRC != 0 {
            OscillatorSource::External
        } else {
            OscillatorSource::Internal
        };
        Self {
            source,
            input_div: ((word >> pllcfgr::PLLM_SHIFT) & pllcfgr::PLLM_MASK) as u8,
            multiplier: ((word >> pllcfgr::PLLN_SHIFT) & pllcfgr::PLLN_MASK) as u16,
            sysclk_div: SysClkDiv::from_bits(word >> pllcfgr::PLLP_SHIFT),
            periph_div: ((word >> pllcfgr::PLLQ_SHIFT) & pllcfgr::PLLQ_MASK) as u8,
        }
    }
}

/// Bring-up progress. Transitions are strictly forward; a failure state is
/// terminal for the boot attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize))]
pub enum ClockState {
    Reset,
    OscillatorStarting,
    OscillatorFailed,
    PllConfiguring,
    PllLocking,
    PllLockFailed,
    SwitchingSource,
    SwitchFailed,
    Stable,
}

/// Bring-up failures. All are surfaced as return values; the controller
/// never halts or resets the device itself — the caller decides whether to
/// retry, stay on the internal oscillator, or give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The external oscillator never reported ready within
    /// [`OSC_READY_POLLS`] status reads.
    OscillatorTimeout,
    /// The PLL never reported locked within [`PLL_LOCK_POLLS`] status reads.
    PllLockTimeout,
    /// The source switch never completed within [`SWITCH_POLLS`] status
    /// reads.
    SwitchTimeout,
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OscillatorTimeout => write!(f, "external oscillator did not become ready"),
            Self::PllLockTimeout => write!(f, "PLL did not lock"),
            Self::SwitchTimeout => write!(f, "clock source switch did not complete"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ClockError {}

/// Drives the bring-up sequence. One attempt per controller: after a failure
/// the state machine stays in its failure state, and a retrying caller
/// constructs a fresh controller around the same register handle.
pub struct ClockController<R> {
    regs: R,
    state: ClockState,
}

impl<R: RegisterAccess> ClockController<R> {
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            state: ClockState::Reset,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Hand the register handle back, e.g. for a fresh attempt.
    pub fn release(self) -> R {
        self.regs
    }

    /// Run the full bring-up sequence.
    ///
    /// On success the PLL is the active system clock source and
    /// [`ClockState::Stable`] is returned. On failure the corresponding
    /// failure state is latched and the error reported; registers written up
    /// to that point are left as-is.
    pub fn initialize(&mut self, config: &ClockConfiguration) -> Result<ClockState, ClockError> {
        debug_assert!(
            self.state == ClockState::Reset,
            "one bring-up attempt per controller"
        );

        // Step 1: external oscillator on, wait for ready.
        self.state = ClockState::OscillatorStarting;
        self.regs.modify(cr::ADDR, 0, cr::Cr::HSEON.bits());
        if !self.poll(cr::ADDR, cr::Cr::HSERDY.bits(), cr::Cr::HSERDY.bits(), OSC_READY_POLLS) {
            self.state = ClockState::OscillatorFailed;
            tracing::warn!("oscillator ready timed out after {} polls", OSC_READY_POLLS);
            return Err(ClockError::OscillatorTimeout);
        }
        tracing::debug!("external oscillator ready");

        // Step 2: one atomic configuration write, reserved bits preserved.
        self.state = ClockState::PllConfiguring;
        self.regs
            .modify(pllcfgr::ADDR, pllcfgr::FIELD_MASK, config.encode_pll());

        // Step 3: PLL on, wait for lock.
        self.state = ClockState::PllLocking;
        self.regs.modify(cr::ADDR, 0, cr::Cr::PLLON.bits());
        if !self.poll(cr::ADDR, cr::Cr::PLLRDY.bits(), cr::Cr::PLLRDY.bits(), PLL_LOCK_POLLS) {
            self.state = ClockState::PllLockFailed;
            tracing::warn!("PLL lock timed out after {} polls", PLL_LOCK_POLLS);
            return Err(ClockError::PllLockTimeout);
        }
        tracing::debug!("PLL locked");

        // Step 4: bus prescalers and source select in one write.
        self.state = ClockState::SwitchingSource;
        self.regs.modify(
            cfgr::ADDR,
            cfgr::FIELD_MASK,
            config.encode_buses() | (cfgr::SRC_PLL << cfgr::SW_SHIFT),
        );

        // Step 5: wait until hardware reports the PLL as the active source.
        if !self.poll(
            cfgr::ADDR,
            cfgr::SWS_MASK << cfgr::SWS_SHIFT,
            cfgr::SRC_PLL << cfgr::SWS_SHIFT,
            SWITCH_POLLS,
        ) {
            self.state = ClockState::SwitchFailed;
            tracing::warn!("source switch timed out after {} polls", SWITCH_POLLS);
            return Err(ClockError::SwitchTimeout);
        }

        self.state = ClockState::Stable;
        tracing::debug!("system clock stable on PLL");
        Ok(ClockState::Stable)
    }

    /// Busy-poll `addr & mask == want` with a deterministic upper bound on
    /// the number of status reads. Exactly `bound` reads happen before a
    /// timeout is declared.
    fn poll(&mut self, addr: u32, mask: u32, want: u32, bound: u32) -> bool {
        for _ in 0..bound {
            if self.regs.read(addr) & mask == want {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClockConfiguration {
        ClockConfiguration {
            source: OscillatorSource::External,
            input_div: 8,
            multiplier: 336,
            sysclk_div: SysClkDiv::Div2,
            periph_div: 7,
            ahb_prescaler: AhbPrescaler::Div1,
            apb1_prescaler: ApbPrescaler::Div4,
            apb2_prescaler: ApbPrescaler::Div2,
        }
    }

    #[test]
    fn test_pll_encoding_round_trips() {
        let cfg = config();
        let fields = PllFields::from_word(cfg.encode_pll());
        assert_eq!(fields.source, OscillatorSource::External);
        assert_eq!(fields.input_div, 8);
        assert_eq!(fields.multiplier, 336);
        assert_eq!(fields.sysclk_div, SysClkDiv::Div2);
        assert_eq!(fields.periph_div, 7);
    }

    #[test]
    fn test_pll_encoding_stays_inside_field_mask() {
        assert_eq!(
            config().encode_pll() & !crate::regs::pllcfgr::FIELD_MASK,
            0
        );
    }

    #[test]
    fn test_bus_encoding_stays_inside_cfgr_mask() {
        assert_eq!(config().encode_buses() & !crate::regs::cfgr::FIELD_MASK, 0);
        // Source select bits stay clear until the controller appends them.
        assert_eq!(config().encode_buses() & crate::regs::cfgr::SW_MASK, 0);
    }

    #[test]
    fn test_sysclk_div_divisors() {
        assert_eq!(SysClkDiv::Div2.divisor(), 2);
        assert_eq!(SysClkDiv::Div4.divisor(), 4);
        assert_eq!(SysClkDiv::Div6.divisor(), 6);
        assert_eq!(SysClkDiv::Div8.divisor(), 8);
    }
}
