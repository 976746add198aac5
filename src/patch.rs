//! # Patch parameters
//!
//! Patch parameters are authored and stored elsewhere, the engine only reads them. They may be rewritten between two
//! ticks.
//!
//! Byte sized parameters which the patch format centers around 0x80 (or 0x40 for transpose) keep that
//! encoding, so a neutral value is the center and not zero.

use crate::{
    modulation::ModMatrix, triggers::TriggerMatrix, NUM_ENV, NUM_FILTERS, NUM_LFO, NUM_VOICES,
    NUM_WT, WT_MEMORY_SIZE,
};

/// Center value of 0x80 centered parameters
pub const CENTER: u8 = 0x80;

/// Center value of the transpose parameters
pub const TRANSPOSE_CENTER: u8 = 0x40;

/// Oscillator waveform selection of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waveform {
    pub triangle: bool,
    pub saw: bool,
    pub pulse: bool,
    pub noise: bool,
    /// Turns the voice off, its gate is cleared and held off
    pub off: bool,
    pub sync: bool,
    pub ring: bool,
}

/// How the voice moves from one note to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PortaMode {
    /// Glide speed proportional to the current frequency
    #[default]
    Proportional,
    /// Every glide takes the same time
    ConstantTime,
    /// Step through the semitones in between
    Glissando,
}

/// Order in which the arpeggiator walks the note stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArpDirection {
    #[default]
    Up,
    Down,
    /// Up then down, the turning notes are not repeated
    UpDown,
    /// Down then up, the turning notes are not repeated
    DownUp,
    /// Up then down, the turning notes are played twice
    UpDownRepeat,
    /// Down then up, the turning notes are played twice
    DownUpRepeat,
    Random,
}

impl ArpDirection {
    /// `d.alternates()` is true for the modes which flip direction at each end of the stack
    pub fn alternates(self) -> bool {
        matches!(
            self,
            Self::UpDown | Self::DownUp | Self::UpDownRepeat | Self::DownUpRepeat
        )
    }

    /// `d.skips_turning_note()` is true for the alternating modes which don't repeat the note at the turn
    pub fn skips_turning_note(self) -> bool {
        matches!(self, Self::UpDown | Self::DownUp)
    }

    /// `d.starts_down()` is true for the modes which walk the stack top-down
    pub fn starts_down(self) -> bool {
        matches!(self, Self::Down | Self::DownUp | Self::DownUpRepeat)
    }
}

/// Arpeggiator parameters of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArpPatch {
    pub enabled: bool,
    pub direction: ArpDirection,
    /// Keep the note stack sorted by pitch instead of by key press order
    pub sorted: bool,
    /// Keep playing after all keys have been released
    pub hold: bool,
    /// Don't reset the divider when a new key sequence starts
    pub sync: bool,
    /// Count-as-chord: the divider advances by the number of held keys per clock
    pub count_as_chord: bool,
    /// Clock divider, a new note every `speed_div + 1` clocks, in `[0, 63]`
    pub speed_div: u8,
    /// Stop after one pass through the held notes
    pub oneshot: bool,
    /// Gate length in clocks, in `[0, 31]`
    pub gate_length: u8,
    /// Number of extra octaves to walk through, in `[0, 7]`
    pub octave_range: u8,
}

impl Default for ArpPatch {
    fn default() -> Self {
        Self {
            enabled: false,
            direction: ArpDirection::Up,
            sorted: false,
            hold: false,
            sync: false,
            count_as_chord: false,
            speed_div: 5,
            oneshot: false,
            gate_length: 3,
            octave_range: 0,
        }
    }
}

/// Parameters of one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoicePatch {
    pub waveform: Waveform,
    /// Chip attack/decay register value
    pub ad: u8,
    /// Chip sustain/release register value
    pub sr: u8,
    /// 12 bit pulse width
    pub pulsewidth: u16,
    /// Gate delay, zero for none
    pub delay: u8,
    /// Transpose in semitones, centered at 0x40
    pub transpose: u8,
    /// Fine tuning, centered at 0x80
    pub finetune: u8,
    /// Range of pitch bend and fine tune, zero disables both
    pub pitchrange: u8,
    /// Portamento rate, zero disables portamento
    pub portamento: u8,
    pub porta_mode: PortaMode,
    /// Gate stays active: the chip gate is not cleared on note off
    pub gate_stays_active: bool,
    pub arp: ArpPatch,
}

impl Default for VoicePatch {
    fn default() -> Self {
        Self {
            waveform: Waveform {
                pulse: true,
                ..Default::default()
            },
            ad: 0x00,
            sr: 0xf0,
            pulsewidth: 0x800,
            delay: 0,
            transpose: TRANSPOSE_CENTER,
            finetune: CENTER,
            pitchrange: 2,
            portamento: 0,
            porta_mode: PortaMode::Proportional,
            gate_stays_active: false,
            arp: ArpPatch::default(),
        }
    }
}

/// Parameters of one filter unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterPatch {
    /// 12 bit cutoff
    pub cutoff: u16,
    /// Resonance, only the upper nibble reaches the chip
    pub resonance: u8,
    /// Low nibble: voice routing into the filter, high nibble: filter mode
    pub chn_mode: u8,
}

impl FilterPatch {
    /// `fp.channels()` is the 4 bit voice routing
    pub fn channels(&self) -> u8 {
        self.chn_mode & 0x0f
    }

    /// `fp.mode()` is the 4 bit filter mode
    pub fn mode(&self) -> u8 {
        self.chn_mode >> 4
    }
}

impl Default for FilterPatch {
    fn default() -> Self {
        Self {
            cutoff: 0x800,
            resonance: 0,
            chn_mode: 0x10,
        }
    }
}

/// LFO waveforms, the positive variants are unipolar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LfoWaveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Pulse,
    /// Sample and hold, a new random value on each period
    Random,
    PositiveSine,
    PositiveTriangle,
    PositiveSaw,
    PositivePulse,
}

/// Parameters of one LFO
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LfoPatch {
    pub enabled: bool,
    /// Stop at the end of the first period until restarted
    pub oneshot: bool,
    /// Advance with the tempo clock instead of freely
    pub clock_sync: bool,
    pub waveform: LfoWaveform,
    pub rate: u8,
    /// Depth, centered at 0x80
    pub depth: u8,
    /// Start phase, 0x80 is half a period
    pub phase: u8,
    /// Start delay, zero for none
    pub delay: u8,
}

impl Default for LfoPatch {
    fn default() -> Self {
        Self {
            enabled: false,
            oneshot: false,
            clock_sync: false,
            waveform: LfoWaveform::Sine,
            rate: 0x80,
            depth: CENTER,
            phase: 0,
            delay: 0,
        }
    }
}

/// Parameters of one envelope
///
/// Levels are 8 bit, rates index the envelope rate table (0 is fastest), curves are centered at 0x80 for a linear
/// segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnvPatch {
    /// Advance with the tempo clock instead of every tick
    pub clock_sync: bool,
    /// Depth, centered at 0x80
    pub depth: u8,
    /// Start delay, zero for none
    pub delay: u8,
    pub attack1: u8,
    pub attack_level: u8,
    pub attack2: u8,
    pub decay1: u8,
    pub decay_level: u8,
    pub decay2: u8,
    pub sustain: u8,
    pub release1: u8,
    pub release_level: u8,
    pub release2: u8,
    pub attack_curve: u8,
    pub decay_curve: u8,
    pub release_curve: u8,
}

impl Default for EnvPatch {
    fn default() -> Self {
        Self {
            clock_sync: false,
            depth: CENTER,
            delay: 0,
            attack1: 0x30,
            attack_level: 0x80,
            attack2: 0x30,
            decay1: 0x30,
            decay_level: 0xc0,
            decay2: 0x30,
            sustain: 0x80,
            release1: 0x30,
            release_level: 0x40,
            release2: 0x30,
            attack_curve: CENTER,
            decay_curve: CENTER,
            release_curve: CENTER,
        }
    }
}

/// Parameters of one wavetable sequencer
///
/// The flag bits are part of the patch format:
///
/// - `speed[5:0]` clock divider, `speed[7:6]` chip selection passed on to the parameter dispatcher
/// - `begin[7]` step position controlled by the modulation bus
/// - `end[7]` step position controlled by the played key
/// - `loop_pos[7]` oneshot, stop after passing `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WtPatch {
    pub speed: u8,
    /// Parameter the table values are assigned to, zero for none
    pub assign: u8,
    pub begin: u8,
    pub end: u8,
    pub loop_pos: u8,
}

impl WtPatch {
    /// `wp.divider()` is the clock divider, a step every `divider + 1` clocks
    pub fn divider(&self) -> u8 {
        self.speed & 0x3f
    }

    /// `wp.sid_select()` is the chip selection handed to the parameter dispatcher
    pub fn sid_select(&self) -> u8 {
        self.speed >> 6
    }

    /// `wp.begin_pos()` is the first step position
    pub fn begin_pos(&self) -> u8 {
        self.begin & 0x7f
    }

    /// `wp.end_pos()` is the last step position
    pub fn end_pos(&self) -> u8 {
        self.end & 0x7f
    }

    /// `wp.loop_to()` is the position played after `end_pos`
    pub fn loop_to(&self) -> u8 {
        self.loop_pos & 0x7f
    }

    /// `wp.mod_controlled()` is true iff the step position follows the modulation bus
    pub fn mod_controlled(&self) -> bool {
        self.begin & 0x80 != 0
    }

    /// `wp.key_controlled()` is true iff the step position follows the played key
    pub fn key_controlled(&self) -> bool {
        self.end & 0x80 != 0
    }

    /// `wp.oneshot()` is true iff the sequence stops after passing `end_pos`
    pub fn oneshot(&self) -> bool {
        self.loop_pos & 0x80 != 0
    }
}

/// A complete patch is represented here
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patch {
    pub voices: [VoicePatch; NUM_VOICES],
    pub filters: [FilterPatch; NUM_FILTERS],
    pub lfos: [LfoPatch; NUM_LFO],
    pub envs: [EnvPatch; NUM_ENV],
    pub wts: [WtPatch; NUM_WT],
    #[cfg_attr(feature = "serde", serde(with = "wt_memory_serde"))]
    pub wt_memory: [u8; WT_MEMORY_SIZE],
    /// Master volume, 7 bit
    pub volume: u8,
    /// Detuning between the oscillators of the two chips
    pub osc_detune: u8,
    /// Phase offset between the oscillators on note start, zero disables oscillator synchronisation
    pub osc_phase: u8,
    /// ADSR bug workaround: release the chip envelope completely before every note
    pub adsr_bug_workaround: bool,
    pub trigger_matrix: TriggerMatrix,
    pub mod_matrix: ModMatrix,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            voices: [VoicePatch::default(); NUM_VOICES],
            filters: [FilterPatch::default(); NUM_FILTERS],
            lfos: [LfoPatch::default(); NUM_LFO],
            envs: [EnvPatch::default(); NUM_ENV],
            wts: [WtPatch::default(); NUM_WT],
            wt_memory: [0x40; WT_MEMORY_SIZE],
            volume: 0x7f,
            osc_detune: 0,
            osc_phase: 0,
            adsr_bug_workaround: false,
            trigger_matrix: TriggerMatrix::default(),
            mod_matrix: ModMatrix::default(),
        }
    }
}

/// Wavetable memory as a byte string, serde derives nothing for arrays this long
#[cfg(feature = "serde")]
mod wt_memory_serde {
    use core::fmt;

    use serde::{
        de::{self, SeqAccess, Visitor},
        Deserializer, Serializer,
    };

    use crate::WT_MEMORY_SIZE;

    pub fn serialize<S: Serializer>(memory: &[u8; WT_MEMORY_SIZE], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(memory)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; WT_MEMORY_SIZE], D::Error> {
        deserializer.deserialize_bytes(MemoryVisitor)
    }

    struct MemoryVisitor;

    impl<'de> Visitor<'de> for MemoryVisitor {
        type Value = [u8; WT_MEMORY_SIZE];

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "{} bytes of wavetable memory", WT_MEMORY_SIZE)
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
            v.try_into().map_err(|_| E::invalid_length(v.len(), &self))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut memory = [0; WT_MEMORY_SIZE];
            for (ix, byte) in memory.iter_mut().enumerate() {
                *byte = seq
                    .next_element::<u8>()?
                    .ok_or_else(|| <A::Error as de::Error>::invalid_length(ix, &self))?;
            }
            Ok(memory)
        }
    }
}
