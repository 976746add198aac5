//! # Trigger vector
//!
//! Generators raise trigger *sources* on transitions: a note starting or stopping, an envelope reaching its sustain
//! phase, an LFO completing a period, the tempo clock, a MIDI start. Once per tick the pending sources are fanned out
//! through the patch's [`TriggerMatrix`] into trigger *destinations*: envelope attack/release, LFO restart, wavetable
//! reset/step. The destinations are consumed by the units which own them.
//!
//! The destination bit layout is the patch format:
//!
//! | bits    | destinations                       |
//! |---------|------------------------------------|
//! | 0..=5   | voice gates, driven by the voices  |
//! | 6, 7    | ENV1, ENV2 attack                  |
//! | 8, 9    | ENV1, ENV2 release                 |
//! | 10..=15 | LFO1..LFO6 restart                 |
//! | 16..=19 | WT1..WT4 reset                     |
//! | 20..=23 | WT1..WT4 step                      |

use crate::{NUM_ENV, NUM_LFO};

/// Trigger sources are represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerSource {
    NoteOn,
    NoteOff,
    EnvSustain(u8),
    LfoPeriod(u8),
    Clock,
    MidiStart,
}

impl TriggerSource {
    /// `src.bit()` is the position of the source in the pending source set, `None` for unknown instances
    pub fn bit(self) -> Option<usize> {
        match self {
            Self::NoteOn => Some(0),
            Self::NoteOff => Some(1),
            Self::EnvSustain(n) if (n as usize) < NUM_ENV => Some(2 + n as usize),
            Self::LfoPeriod(n) if (n as usize) < NUM_LFO => Some(2 + NUM_ENV + n as usize),
            Self::Clock => Some(2 + NUM_ENV + NUM_LFO),
            Self::MidiStart => Some(3 + NUM_ENV + NUM_LFO),
            _ => None,
        }
    }
}

/// Number of trigger sources
pub const NUM_TRIGGER_SOURCES: usize = 4 + NUM_ENV + NUM_LFO;

/// A set of trigger destinations is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerDestinations(pub u32);

impl TriggerDestinations {
    /// No destination at all
    pub const NONE: Self = Self(0);

    /// Gate destinations, the voices drive their gates directly so routing never sets these
    pub const GATES: Self = Self(0x3f);

    /// Attack of envelope `n`
    pub const fn env_attack(n: usize) -> Self {
        Self(1 << (6 + n))
    }

    /// Release of envelope `n`
    pub const fn env_release(n: usize) -> Self {
        Self(1 << (8 + n))
    }

    /// Restart of LFO `n`
    pub const fn lfo_restart(n: usize) -> Self {
        Self(1 << (10 + n))
    }

    /// Reset of wavetable `n` to its first step
    pub const fn wt_reset(n: usize) -> Self {
        Self(1 << (16 + n))
    }

    /// One step of wavetable `n`
    pub const fn wt_step(n: usize) -> Self {
        Self(1 << (20 + n))
    }

    /// `d.union(o)` is every destination in `d` or `o`
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `d.contains(o)` is true iff every destination in `o` is also in `d`
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `d.is_empty()` is true iff there are no destinations in `d`
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// The trigger matrix, one destination set per trigger source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TriggerMatrix {
    pub rows: [TriggerDestinations; NUM_TRIGGER_SOURCES],
}

impl TriggerMatrix {
    /// `tm.connect(s, d)` adds destinations `d` to the row of source `s`
    pub fn connect(&mut self, src: TriggerSource, dst: TriggerDestinations) {
        if let Some(bit) = src.bit() {
            self.rows[bit] = self.rows[bit].union(dst);
        }
    }
}

/// The shared trigger vector, pending sources plus routed destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerVector {
    sources: u16,
    destinations: TriggerDestinations,
}

impl TriggerVector {
    /// `TriggerVector::new()` is a new trigger vector with nothing pending
    pub const fn new() -> Self {
        Self {
            sources: 0,
            destinations: TriggerDestinations::NONE,
        }
    }

    /// `tv.raise(s)` marks source `s` as pending until the next routing
    pub fn raise(&mut self, src: TriggerSource) {
        if let Some(bit) = src.bit() {
            self.sources |= 1 << bit;
        }
    }

    /// `tv.is_raised(s)` is true iff source `s` is pending
    pub fn is_raised(&self, src: TriggerSource) -> bool {
        src.bit().is_some_and(|bit| self.sources & (1 << bit) != 0)
    }

    /// `tv.request(d)` sets destinations `d` directly, bypassing the matrix
    pub fn request(&mut self, dst: TriggerDestinations) {
        self.destinations = self.destinations.union(dst);
    }

    /// `tv.route(tm)` fans every pending source out through matrix `tm` and clears the sources
    pub fn route(&mut self, matrix: &TriggerMatrix) {
        for (bit, row) in matrix.rows.iter().enumerate() {
            if self.sources & (1 << bit) != 0 {
                self.destinations = self.destinations.union(*row);
            }
        }
        self.destinations.0 &= !TriggerDestinations::GATES.0;
        self.sources = 0;
    }

    /// `tv.is_requested(d)` is true iff all of `d` are requested
    pub fn is_requested(&self, dst: TriggerDestinations) -> bool {
        !dst.is_empty() && self.destinations.contains(dst)
    }

    /// `tv.take(d)` is true iff all of `d` are requested, consuming them
    pub fn take(&mut self, dst: TriggerDestinations) -> bool {
        let requested = self.is_requested(dst);
        if requested {
            self.clear(dst);
        }
        requested
    }

    /// `tv.clear(d)` drops any request for destinations `d`
    pub fn clear(&mut self, dst: TriggerDestinations) {
        self.destinations.0 &= !dst.0;
    }

    /// `tv.destinations()` is every destination currently requested
    pub fn destinations(&self) -> TriggerDestinations {
        self.destinations
    }
}
