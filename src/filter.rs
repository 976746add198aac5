//! # Filter and volume
//!
//! One filter unit per chip. Cutoff and volume are modulated through the modulation bus, the cutoff is then
//! rescaled into the range the chip's filter actually responds to. Resonance and routing pass straight through.

use crate::{
    config::FilterCalibration,
    modulation::{ModBus, ModDestination},
    patch::FilterPatch,
    registers::SidChip,
    utils::{saturate_u12, saturate_u16},
};

/// The filter and master volume stage of one chip is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    index: usize,
    calibration: FilterCalibration,
}

impl Filter {
    /// `Filter::new(n, cal)` is a new filter stage for chip `n`, its cutoff rescaled into `cal`
    pub fn new(index: usize, calibration: FilterCalibration) -> Self {
        Self { index, calibration }
    }

    /// `f.tick(p, vol, bus, chip)` writes the filter and volume registers of `chip`
    ///
    /// # Arguments:
    ///
    /// * `patch` - The filter parameters of this chip
    ///
    /// * `volume` - The 7 bit master volume
    ///
    /// * `bus` - The modulation bus, read for cutoff and volume modulation
    ///
    /// * `chip` - The register shadow of this chip
    pub fn tick(&self, patch: &FilterPatch, volume: u8, bus: &ModBus, chip: &mut SidChip) {
        let n = self.index as u8;

        let cutoff = (patch.cutoff & 0xfff) as i32 + bus.destination(ModDestination::Cutoff(n)) / 8;
        let cutoff = self.calibrate(saturate_u12(cutoff));
        // 12 bits down to the chip's 11
        chip.filter_l = ((cutoff >> 1) & 0x07) as u8;
        chip.filter_h = (cutoff >> 4) as u8;

        chip.resonance = patch.resonance >> 4;
        chip.filter_select = patch.channels();
        chip.filter_mode = patch.mode();

        let volume = saturate_u16(((volume as i32) << 9) + bus.destination(ModDestination::Volume(n)));
        chip.volume = (volume >> 12) as u8;
    }

    /// `f.calibrate(c)` is 12 bit cutoff `c` rescaled into the calibrated range
    fn calibrate(&self, cutoff: u16) -> u16 {
        let FilterCalibration { min, max } = self.calibration;
        min + ((cutoff as u32 * (max - min) as u32) / 4096) as u16
    }
}
