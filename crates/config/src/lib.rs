// Bootflow - MCU Boot Bring-Up Toolkit
// Copyright (C) 2026 Bootflow Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Authoring-time clock profiles.
//!
//! The runtime clock controller takes its configuration on faith: the PLL
//! frequency-range invariants are a precondition, enforced here when a
//! profile is authored, not re-checked on the device. A [`ClockProfile`]
//! comes from YAML (or is built in code), passes
//! [`validate`](ClockProfile::validate), and converts into the core's
//! [`ClockConfiguration`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use bootflow_core::clock::{
    AhbPrescaler, ApbPrescaler, ClockConfiguration, OscillatorSource, SysClkDiv,
};

/// Default schema version for YAML profiles.
fn default_schema_version() -> String {
    "1.0".to_string()
}

// Hardware-documented windows for the main PLL.
const VCO_INPUT_MIN_HZ: u64 = 1_000_000;
const VCO_INPUT_MAX_HZ: u64 = 2_000_000;
const VCO_OUTPUT_MIN_HZ: u64 = 100_000_000;
const VCO_OUTPUT_MAX_HZ: u64 = 432_000_000;
const SYSCLK_MAX_HZ: u64 = 168_000_000;

/// A named clock target for one board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockProfile {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    /// External crystal frequency in Hz.
    pub hse_hz: u32,
    pub pll: PllSettings,
    #[serde(default)]
    pub buses: BusSettings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PllSettings {
    /// Input divider (M); the divided crystal feeds the VCO.
    pub input_div: u8,
    /// VCO multiplier (N).
    pub multiplier: u16,
    /// System-clock tap divider (P): 2, 4, 6 or 8.
    pub sysclk_div: u8,
    /// Peripheral-domain tap divider (Q).
    pub periph_div: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BusSettings {
    #[serde(default = "BusSettings::default_ahb")]
    pub ahb_div: u16,
    #[serde(default = "BusSettings::default_apb1")]
    pub apb1_div: u8,
    #[serde(default = "BusSettings::default_apb2")]
    pub apb2_div: u8,
}

impl BusSettings {
    fn default_ahb() -> u16 {
        1
    }
    // The low-speed peripheral bus tops out at a quarter of the maximum
    // core clock, the high-speed one at half.
    fn default_apb1() -> u8 {
        4
    }
    fn default_apb2() -> u8 {
        2
    }
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            ahb_div: Self::default_ahb(),
            apb1_div: Self::default_apb1(),
            apb2_div: Self::default_apb2(),
        }
    }
}

/// Authoring-time validation failures.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    #[error("PLL input divider {0} outside 2..=63")]
    InputDivRange(u8),
    #[error("PLL multiplier {0} outside 50..=432")]
    MultiplierRange(u16),
    #[error("system clock tap divider {0} is not one of 2, 4, 6, 8")]
    SysclkDivValue(u8),
    #[error("peripheral tap divider {0} outside 2..=15")]
    PeriphDivRange(u8),
    #[error("AHB divider {0} is not a supported power of two")]
    AhbDivValue(u16),
    #[error("APB divider {0} is not one of 1, 2, 4, 8, 16")]
    ApbDivValue(u8),
    #[error("VCO input {0} Hz outside the 1..=2 MHz window")]
    VcoInputRange(u64),
    #[error("VCO output {0} Hz outside the 100..=432 MHz window")]
    VcoOutputRange(u64),
    #[error("system clock {0} Hz above the {SYSCLK_MAX_HZ} Hz ceiling")]
    SysclkTooFast(u64),
}

impl ClockProfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read clock profile {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse clock profile YAML")
    }

    /// Frequency of the divided reference feeding the VCO.
    pub fn vco_input_hz(&self) -> u64 {
        self.hse_hz as u64 / self.pll.input_div.max(1) as u64
    }

    pub fn vco_output_hz(&self) -> u64 {
        self.vco_input_hz() * self.pll.multiplier as u64
    }

    pub fn sysclk_hz(&self) -> u64 {
        self.vco_output_hz() / self.pll.sysclk_div.max(1) as u64
    }

    /// Frequency of the peripheral-domain tap (USB and friends want 48 MHz).
    pub fn periph_tap_hz(&self) -> u64 {
        self.vco_output_hz() / self.pll.periph_div.max(1) as u64
    }

    /// Enforce the field ranges and the hardware frequency windows.
    pub fn validate(&self) -> Result<(), ProfileError> {
        let pll = &self.pll;
        if !(2..=63).contains(&pll.input_div) {
            return Err(ProfileError::InputDivRange(pll.input_div));
        }
        if !(50..=432).contains(&pll.multiplier) {
            return Err(ProfileError::MultiplierRange(pll.multiplier));
        }
        sysclk_div(pll.sysclk_div).ok_or(ProfileError::SysclkDivValue(pll.sysclk_div))?;
        if !(2..=15).contains(&pll.periph_div) {
            return Err(ProfileError::PeriphDivRange(pll.periph_div));
        }
        ahb_prescaler(self.buses.ahb_div).ok_or(ProfileError::AhbDivValue(self.buses.ahb_div))?;
        apb_prescaler(self.buses.apb1_div).ok_or(ProfileError::ApbDivValue(self.buses.apb1_div))?;
        apb_prescaler(self.buses.apb2_div).ok_or(ProfileError::ApbDivValue(self.buses.apb2_div))?;

        let vco_in = self.vco_input_hz();
        if !(VCO_INPUT_MIN_HZ..=VCO_INPUT_MAX_HZ).contains(&vco_in) {
            return Err(ProfileError::VcoInputRange(vco_in));
        }
        let vco_out = self.vco_output_hz();
        if !(VCO_OUTPUT_MIN_HZ..=VCO_OUTPUT_MAX_HZ).contains(&vco_out) {
            return Err(ProfileError::VcoOutputRange(vco_out));
        }
        let sysclk = self.sysclk_hz();
        if sysclk > SYSCLK_MAX_HZ {
            return Err(ProfileError::SysclkTooFast(sysclk));
        }
        Ok(())
    }

    /// Validate and convert into the register-level configuration the clock
    /// controller consumes.
    pub fn to_configuration(&self) -> Result<ClockConfiguration, ProfileError> {
        self.validate()?;
        Ok(ClockConfiguration {
            source: OscillatorSource::External,
            input_div: self.pll.input_div,
            multiplier: self.pll.multiplier,
            sysclk_div: sysclk_div(self.pll.sysclk_div)
                .ok_or(ProfileError::SysclkDivValue(self.pll.sysclk_div))?,
            periph_div: self.pll.periph_div,
            ahb_prescaler: ahb_prescaler(self.buses.ahb_div)
                .ok_or(ProfileError::AhbDivValue(self.buses.ahb_div))?,
            apb1_prescaler: apb_prescaler(self.buses.apb1_div)
                .ok_or(ProfileError::ApbDivValue(self.buses.apb1_div))?,
            apb2_prescaler: apb_prescaler(self.buses.apb2_div)
                .ok_or(ProfileError::ApbDivValue(self.buses.apb2_div))?,
        })
    }
}

fn sysclk_div(div: u8) -> Option<SysClkDiv> {
    match div {
        2 => Some(SysClkDiv::Div2),
        4 => Some(SysClkDiv::Div4),
        6 => Some(SysClkDiv::Div6),
        8 => Some(SysClkDiv::Div8),
        _ => None,
    }
}

fn ahb_prescaler(div: u16) -> Option<AhbPrescaler> {
    match div {
        1 => Some(AhbPrescaler::Div1),
        2 => Some(AhbPrescaler::Div2),
        4 => Some(AhbPrescaler::Div4),
        8 => Some(AhbPrescaler::Div8),
        16 => Some(AhbPrescaler::Div16),
        64 => Some(AhbPrescaler::Div64),
        128 => Some(AhbPrescaler::Div128),
        256 => Some(AhbPrescaler::Div256),
        512 => Some(AhbPrescaler::Div512),
        _ => None,
    }
}

fn apb_prescaler(div: u8) -> Option<ApbPrescaler> {
    match div {
        1 => Some(ApbPrescaler::Div1),
        2 => Some(ApbPrescaler::Div2),
        4 => Some(ApbPrescaler::Div4),
        8 => Some(ApbPrescaler::Div8),
        16 => Some(ApbPrescaler::Div16),
        _ => None,
    }
}
