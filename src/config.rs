//! Engine configuration
//!
//! Everything here is fixed at engine construction. Patch parameters, which may change while the engine runs, live in
//! [`crate::patch`].

use crate::error::{Error, Result};

/// How the clock decides between following MIDI clock and running on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockMode {
    /// Always run from the internal tempo
    Master,
    /// Only ever follow incoming MIDI clock
    Slave,
    /// Follow MIDI clock while it keeps arriving, fall back to the internal tempo otherwise
    Auto,
}

/// Linear rescaling of the 12 bit cutoff into the range the filter actually responds to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterCalibration {
    pub min: u16,
    pub max: u16,
}

impl Default for FilterCalibration {
    fn default() -> Self {
        Self { min: 0, max: 1536 }
    }
}

/// Engine wide configuration is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Divides every table derived rate, scaling the whole time base at once
    pub speed_factor: u8,

    /// How often the host calls [`crate::engine::Engine::tick`]
    pub tick_rate_hz: u16,

    pub clock_mode: ClockMode,

    /// Tempo used while the clock runs as master
    pub master_bpm: u16,

    pub filter_calibration: FilterCalibration,

    /// Seed for the arpeggiator and LFO random generators
    pub random_seed: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed_factor: 2,
            tick_rate_hz: 1_000,
            clock_mode: ClockMode::Auto,
            master_bpm: 120,
            filter_calibration: FilterCalibration::default(),
            random_seed: 0x4d42_5344,
        }
    }
}

impl EngineConfig {
    /// `cfg.validate()` is `Ok` iff the configuration can drive an engine
    pub fn validate(&self) -> Result<()> {
        if self.speed_factor == 0 {
            return Err(Error::ZeroSpeedFactor);
        }
        if self.tick_rate_hz == 0 {
            return Err(Error::ZeroTickRate);
        }
        if self.master_bpm == 0 {
            return Err(Error::ZeroTempo);
        }
        let FilterCalibration { min, max } = self.filter_calibration;
        if min > max {
            return Err(Error::InvertedCalibration { min, max });
        }
        if max > 0xfff {
            log::warn!("filter calibration maximum {} exceeds 12 bits, clamping", max);
        }
        Ok(())
    }

    /// `cfg.calibration()` is the filter calibration with the maximum limited to 12 bits
    pub fn calibration(&self) -> FilterCalibration {
        let max = self.filter_calibration.max.min(0xfff);
        FilterCalibration {
            min: self.filter_calibration.min.min(max),
            max,
        }
    }
}
