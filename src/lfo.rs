//! # Low Frequency Oscillator
//!
//! ## Acronyms used:
//!
//! - `LFO`: Low Frequency Oscillator
//! - `LUT`: Look Up Table
//!
//! LFOs are a standard component of most analog synthesizers. They are used to
//! modulate various parameters such as loudness, timbre, or pitch.
//!
//! The LFO is a 16 bit phase counter which advances by a LUT derived increment every tick. The rate and depth may
//! themselves be modulated through the modulation bus.
//!
//! When synced to the tempo clock the counter only advances on the divided clock pulses, and the fastest rate
//! settings are replaced by increments which complete a period in a whole number of clock pulses.
//!
//! Since this oscillator is intended as a low frequency control source, no
//! attempts at antialiasing are made.

use crate::{
    context::TickContext,
    delay::{DelayCounter, MOD_DELAY_LIMIT},
    lookup_tables,
    modulation::{ModBus, ModDestination, ModSource},
    patch::{LfoPatch, LfoWaveform, CENTER},
    phase_accumulator::PhaseAccumulator,
    random::Random,
    triggers::TriggerSource,
    utils::saturate_i16,
};

/// A Low Frequency Oscillator is represented here
#[derive(Debug, Clone)]
pub struct Lfo {
    index: u8,
    phase_accumulator: PhaseAccumulator,
    delay: DelayCounter,
    // set by the first overrun, a oneshot LFO stays parked until restarted
    overrun: bool,
    rng: Random,
}

impl Lfo {
    /// `Lfo::new(n, seed)` is a new LFO writing to modulation source LFO `n`, random waves seeded by `seed`
    pub fn new(index: u8, seed: u32) -> Self {
        Self {
            index,
            phase_accumulator: PhaseAccumulator::new(),
            delay: DelayCounter::new(),
            overrun: false,
            rng: Random::new(seed),
        }
    }

    /// `lfo.tick(p, ctx)` advances the LFO by one engine tick and writes its modulation source
    pub fn tick(&mut self, patch: &LfoPatch, ctx: &mut TickContext) {
        if !patch.enabled {
            ctx.bus.set_source(ModSource::Lfo(self.index), 0);
            return;
        }

        let delay_inc = ctx.rate(lookup_tables::ENV_TABLE[patch.delay as usize]);
        if self.delay.is_pending() && self.delay.tick(delay_inc, MOD_DELAY_LIMIT) {
            return;
        }

        let mut stalled = false;
        if patch.oneshot && self.overrun {
            self.phase_accumulator.park();
            stalled = true;
        }
        if patch.clock_sync && !ctx.sync_pulse() {
            stalled = true;
        }

        let mut rolled_over = false;
        if !stalled {
            let rate = self.rate(patch, ctx.bus);
            if self.phase_accumulator.advance(self.increment(patch, rate, ctx), patch.oneshot) {
                rolled_over = true;
                self.overrun = true;
                ctx.triggers.raise(TriggerSource::LfoPeriod(self.index));
            }
        }

        self.generate(patch, rolled_over, ctx.bus);
    }

    /// `lfo.restart(p, bus)` restarts the LFO at the phase of `p`, delayed if `p` asks for it
    pub fn restart(&mut self, patch: &LfoPatch, bus: &mut ModBus) {
        self.phase_accumulator.set_phase(patch.phase);
        self.overrun = false;
        self.delay.arm(patch.delay != 0);
        self.generate(patch, false, bus);
    }

    /// `lfo.counter()` is the raw 16 bit phase counter
    pub fn counter(&self) -> u16 {
        self.phase_accumulator.value()
    }

    /// `lfo.rate(p, bus)` is the modulated rate in `[0, 255]`
    fn rate(&self, patch: &LfoPatch, bus: &ModBus) -> usize {
        let modulation = bus.destination(ModDestination::LfoRate(self.index)) / 256;
        (patch.rate as i32 + modulation).clamp(0, 255) as usize
    }

    /// `lfo.increment(p, r, ctx)` is the phase increment for rate `r`
    fn increment(&self, patch: &LfoPatch, rate: usize, ctx: &TickContext) -> u16 {
        if patch.clock_sync && rate >= lookup_tables::LFO_MCLK_FIRST_RATE {
            // locked to the clock pulses, so not scaled by the speed factor
            lookup_tables::LFO_TABLE_MCLK[rate - lookup_tables::LFO_MCLK_FIRST_RATE]
        } else {
            ctx.rate(lookup_tables::LFO_TABLE[rate])
        }
    }

    /// `lfo.generate(p, r, bus)` maps the phase to the waveform and writes the depth scaled result to the bus
    fn generate(&mut self, patch: &LfoPatch, rolled_over: bool, bus: &mut ModBus) {
        let Some(wave) = self.wave(patch.waveform, rolled_over) else {
            return;
        };

        let depth_mod = bus.destination(ModDestination::LfoDepth(self.index)) / 256;
        let depth = (patch.depth as i32 - CENTER as i32 + depth_mod).clamp(-128, 127);

        bus.set_source(ModSource::Lfo(self.index), saturate_i16(wave as i32 * depth / 128));
    }

    /// `lfo.wave(w, r)` is the current value of waveform `w`, `None` when it holds its previous value
    fn wave(&mut self, waveform: LfoWaveform, rolled_over: bool) -> Option<i16> {
        let ctr = self.phase_accumulator.value();
        let second_half = ctr & 0x8000 != 0;

        let wave = match waveform {
            LfoWaveform::Sine => {
                // quarter sine LUT, mirrored in the 2nd and 4th quadrant and negated in the 2nd half
                let mut ix = (ctr >> 7) & 0x7f;
                if ctr & 0x4000 != 0 {
                    ix ^= 0x7f;
                }
                let wave = lookup_tables::SIN_TABLE[ix as usize];
                if second_half {
                    -wave
                } else {
                    wave
                }
            }
            LfoWaveform::Triangle => {
                let mut wave = ((ctr & 0x3fff) << 1) as i16;
                if ctr & 0x4000 != 0 {
                    wave = 0x7fff - wave;
                }
                if second_half {
                    -wave
                } else {
                    wave
                }
            }
            LfoWaveform::Saw => (ctr as i32 - 0x8000) as i16,
            // low for the first half of the period
            LfoWaveform::Pulse => {
                if second_half {
                    0x7fff
                } else {
                    -0x8000
                }
            }
            LfoWaveform::Random => {
                if !rolled_over {
                    return None;
                }
                self.rng.gen_range(0, 0xffff) as i16
            }
            LfoWaveform::PositiveSine => {
                let mut ix = (ctr >> 8) & 0xff;
                if second_half {
                    ix ^= 0x7f;
                }
                lookup_tables::SIN_TABLE[(ix & 0x7f) as usize]
            }
            LfoWaveform::PositiveTriangle => {
                let wave = (ctr & 0x7fff) as i16;
                if second_half {
                    0x7fff - wave
                } else {
                    wave
                }
            }
            LfoWaveform::PositiveSaw => (ctr >> 1) as i16,
            LfoWaveform::PositivePulse => {
                if second_half {
                    0x7fff
                } else {
                    0
                }
            }
        };

        Some(wave)
    }
}
