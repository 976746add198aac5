//! # Modulation bus
//!
//! The modulation bus connects the modulation generators (LFOs, envelopes, wavetables) to the parameters they
//! modulate. Every generator owns one signed 16 bit source slot. Every modulated parameter owns one destination slot
//! which accumulates the signed contributions of all paths routed to it.
//!
//! Destination slots are cleared and re-accumulated once per tick by [`ModMatrix::route`], before voices, filters and
//! LFOs read them.

use crate::{NUM_ENV, NUM_FILTERS, NUM_LFO, NUM_VOICES, NUM_WT};

/// Modulation sources are represented here, one per generator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModSource {
    Env(u8),
    Lfo(u8),
    Wt(u8),
}

impl ModSource {
    /// `src.index()` is the bus slot of the source, `None` if the instance number is out of range
    pub fn index(self) -> Option<usize> {
        let (base, n, count) = match self {
            Self::Env(n) => (0, n, NUM_ENV),
            Self::Lfo(n) => (NUM_ENV, n, NUM_LFO),
            Self::Wt(n) => (NUM_ENV + NUM_LFO, n, NUM_WT),
        };
        ((n as usize) < count).then_some(base + n as usize)
    }
}

/// Number of source slots on the bus
pub const NUM_MOD_SOURCES: usize = NUM_ENV + NUM_LFO + NUM_WT;

/// Modulation destinations are represented here, one per modulated parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModDestination {
    Pitch(u8),
    PulseWidth(u8),
    Cutoff(u8),
    Volume(u8),
    LfoDepth(u8),
    LfoRate(u8),
    Wt(u8),
}

impl ModDestination {
    /// `dst.index()` is the bus slot of the destination, `None` if the instance number is out of range
    pub fn index(self) -> Option<usize> {
        const PW: usize = NUM_VOICES;
        const CUTOFF: usize = PW + NUM_VOICES;
        const VOLUME: usize = CUTOFF + NUM_FILTERS;
        const DEPTH: usize = VOLUME + NUM_FILTERS;
        const RATE: usize = DEPTH + NUM_LFO;
        const WT: usize = RATE + NUM_LFO;

        let (base, n, count) = match self {
            Self::Pitch(n) => (0, n, NUM_VOICES),
            Self::PulseWidth(n) => (PW, n, NUM_VOICES),
            Self::Cutoff(n) => (CUTOFF, n, NUM_FILTERS),
            Self::Volume(n) => (VOLUME, n, NUM_FILTERS),
            Self::LfoDepth(n) => (DEPTH, n, NUM_LFO),
            Self::LfoRate(n) => (RATE, n, NUM_LFO),
            Self::Wt(n) => (WT, n, NUM_WT),
        };
        ((n as usize) < count).then_some(base + n as usize)
    }
}

/// Number of destination slots on the bus
pub const NUM_MOD_DESTINATIONS: usize = 2 * NUM_VOICES + 2 * NUM_FILTERS + 2 * NUM_LFO + NUM_WT;

/// The shared modulation bus is represented here
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModBus {
    sources: [i16; NUM_MOD_SOURCES],
    destinations: [i32; NUM_MOD_DESTINATIONS],
}

impl Default for ModBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ModBus {
    /// `ModBus::new()` is a new bus with every slot at zero
    pub const fn new() -> Self {
        Self {
            sources: [0; NUM_MOD_SOURCES],
            destinations: [0; NUM_MOD_DESTINATIONS],
        }
    }

    /// `bus.source(s)` is the current value of source `s`, zero for unknown sources
    pub fn source(&self, src: ModSource) -> i16 {
        src.index().map_or(0, |ix| self.sources[ix])
    }

    /// `bus.set_source(s, v)` writes value `v` into source slot `s`
    pub fn set_source(&mut self, src: ModSource, value: i16) {
        if let Some(ix) = src.index() {
            self.sources[ix] = value;
        }
    }

    /// `bus.destination(d)` is the accumulated value of destination `d`, zero for unknown destinations
    pub fn destination(&self, dst: ModDestination) -> i32 {
        dst.index().map_or(0, |ix| self.destinations[ix])
    }

    /// `bus.add_to_destination(d, v)` accumulates `v` into destination `d`, saturating
    pub fn add_to_destination(&mut self, dst: ModDestination, value: i32) {
        if let Some(ix) = dst.index() {
            self.destinations[ix] = self.destinations[ix].saturating_add(value);
        }
    }

    /// `bus.clear_destinations()` zeros every destination slot, done by the owner of the routing once per tick
    pub fn clear_destinations(&mut self) {
        self.destinations = [0; NUM_MOD_DESTINATIONS];
    }
}

/// A single modulation path is represented here
///
/// The path adds `source * depth / 128` to its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModPath {
    pub source: Option<ModSource>,
    pub depth: i8,
    pub destination: Option<ModDestination>,
}

/// Number of paths in the modulation matrix
pub const NUM_MOD_PATHS: usize = 8;

/// The modulation matrix, a fixed set of source to destination paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModMatrix {
    pub paths: [ModPath; NUM_MOD_PATHS],
}

impl ModMatrix {
    /// `mm.route(bus)` clears every destination of `bus` and accumulates all active paths into it
    pub fn route(&self, bus: &mut ModBus) {
        bus.clear_destinations();
        for path in &self.paths {
            if let (Some(src), Some(dst)) = (path.source, path.destination) {
                let contribution = bus.source(src) as i32 * path.depth as i32 / 128;
                bus.add_to_destination(dst, contribution);
            }
        }
    }
}
