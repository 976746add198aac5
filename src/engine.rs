//! # Engine
//!
//! The engine owns every runtime unit and runs them once per tick in a fixed order:
//!
//! 1. Clock and transport
//! 2. Trigger routing, then the envelope and LFO triggers it produced
//! 3. Modulation matrix
//! 4. Voices: arpeggiator, gate, pitch, pulse width
//! 5. Filter and volume of each chip
//! 6. LFOs, envelopes and wavetables
//! 7. Commit of the register shadow
//!
//! Note events and realtime events may arrive at any time between two ticks. Note events go straight to the voices,
//! realtime events wait in a [`RealtimeInbox`] until the next tick drains it.

use crate::{
    clock::{Clock, RealtimeInbox},
    config::EngineConfig,
    context::TickContext,
    envelope::Envelope,
    error::{check_index, Result},
    filter::Filter,
    lfo::Lfo,
    modulation::ModBus,
    patch::Patch,
    registers::{SidChip, SidVoiceRegs, VOICES_PER_CHIP},
    triggers::{TriggerDestinations, TriggerSource, TriggerVector},
    voice::Voice,
    wavetable::{ParameterDispatch, Wavetable},
    NUM_CHIPS, NUM_ENV, NUM_FILTERS, NUM_LFO, NUM_VOICES, NUM_WT,
};

/// The sound engine is represented here
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    clock: Clock,
    bus: ModBus,
    triggers: TriggerVector,
    voices: [Voice; NUM_VOICES],
    filters: [Filter; NUM_FILTERS],
    lfos: [Lfo; NUM_LFO],
    envs: [Envelope; NUM_ENV],
    wts: [Wavetable; NUM_WT],
    working: [SidChip; NUM_CHIPS],
    committed: [SidChip; NUM_CHIPS],
    changed: [bool; NUM_CHIPS],
}

impl Engine {
    /// `Engine::new(cfg)` is a new silent engine configured by `cfg`, or an error if `cfg` is not usable
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let calibration = config.calibration();
        let seed = |n: usize| config.random_seed.wrapping_add(0x9e37_79b9_u32.wrapping_mul(n as u32));

        log::debug!("engine ready, {:?} clock at {} Hz", config.clock_mode, config.tick_rate_hz);

        Ok(Self {
            config,
            clock: Clock::new(&config),
            bus: ModBus::new(),
            triggers: TriggerVector::new(),
            voices: core::array::from_fn(|n| Voice::new(n, seed(n))),
            filters: core::array::from_fn(|n| Filter::new(n, calibration)),
            lfos: core::array::from_fn(|n| Lfo::new(n as u8, seed(NUM_VOICES + n))),
            envs: core::array::from_fn(|n| Envelope::new(n as u8)),
            wts: core::array::from_fn(Wavetable::new),
            working: [SidChip::default(); NUM_CHIPS],
            committed: [SidChip::default(); NUM_CHIPS],
            changed: [false; NUM_CHIPS],
        })
    }

    /// `e.tick(p, inbox, pd)` advances the whole engine by one tick
    ///
    /// # Arguments:
    ///
    /// * `patch` - The patch to play, it may be edited between ticks
    ///
    /// * `inbox` - Realtime events received since the last tick
    ///
    /// * `dispatch` - Receives wavetable steps assigned to patch parameters, `&mut ()` if there are none
    pub fn tick<D: ParameterDispatch + ?Sized>(&mut self, patch: &Patch, inbox: &RealtimeInbox, dispatch: &mut D) {
        self.clock.tick(inbox);
        if self.clock.clk() {
            self.triggers.raise(TriggerSource::Clock);
        }
        if self.clock.midi_start() {
            self.triggers.raise(TriggerSource::MidiStart);
        }

        self.triggers.route(&patch.trigger_matrix);
        for (n, env) in self.envs.iter_mut().enumerate() {
            if self.triggers.take(TriggerDestinations::env_attack(n)) {
                env.restart(&patch.envs[n]);
            }
            if self.triggers.take(TriggerDestinations::env_release(n)) {
                env.release();
            }
        }
        for (n, lfo) in self.lfos.iter_mut().enumerate() {
            if self.triggers.take(TriggerDestinations::lfo_restart(n)) {
                lfo.restart(&patch.lfos[n], &mut self.bus);
            }
        }

        patch.mod_matrix.route(&mut self.bus);

        let mut ctx = TickContext {
            speed_factor: self.config.speed_factor,
            clock: &self.clock,
            bus: &mut self.bus,
            triggers: &mut self.triggers,
        };

        for (n, voice) in self.voices.iter_mut().enumerate() {
            voice.tick(patch, voice_regs(&mut self.working, n), &mut ctx);
        }

        for ((filter, fp), chip) in self.filters.iter().zip(&patch.filters).zip(&mut self.working) {
            filter.tick(fp, patch.volume, ctx.bus, chip);
        }

        for (lfo, lp) in self.lfos.iter_mut().zip(&patch.lfos) {
            lfo.tick(lp, &mut ctx);
        }
        for (env, ep) in self.envs.iter_mut().zip(&patch.envs) {
            env.tick(ep, &mut ctx);
        }
        let played_note = self.voices[0].played_note();
        for (wt, wp) in self.wts.iter_mut().zip(&patch.wts) {
            wt.tick(wp, &patch.wt_memory, played_note, &mut ctx, dispatch);
        }

        self.commit();
    }

    /// `e.commit()` publishes the register shadow and notes which chips changed since the last commit
    fn commit(&mut self) {
        for ((working, committed), changed) in self
            .working
            .iter()
            .zip(self.committed.iter_mut())
            .zip(self.changed.iter_mut())
        {
            *changed = working != committed;
            *committed = *working;
        }
    }

    /// `e.note_on(v, n, p)` starts note `n` on voice `v`
    pub fn note_on(&mut self, voice: usize, note: u8, patch: &Patch) -> Result<()> {
        let v = check_index("voice", voice, NUM_VOICES)?;
        self.voices[v].note_on(
            note & 0x7f,
            patch,
            voice_regs(&mut self.working, v),
            &mut self.triggers,
        );
        Ok(())
    }

    /// `e.note_off(v, n, p)` stops note `n` on voice `v`
    pub fn note_off(&mut self, voice: usize, note: u8, patch: &Patch) -> Result<()> {
        let v = check_index("voice", voice, NUM_VOICES)?;
        self.voices[v].note_off(note & 0x7f, patch, &mut self.triggers);
        Ok(())
    }

    /// `e.set_pitchbend(v, pb)` sets the pitch bender of voice `v`, centered at 0x80
    pub fn set_pitchbend(&mut self, voice: usize, value: u8) -> Result<()> {
        let v = check_index("voice", voice, NUM_VOICES)?;
        self.voices[v].set_pitchbend(value);
        Ok(())
    }

    /// `e.set_transpose(v, t)` sets the transposition of voice `v`, centered at 0x40
    pub fn set_transpose(&mut self, voice: usize, value: u8) -> Result<()> {
        let v = check_index("voice", voice, NUM_VOICES)?;
        self.voices[v].set_transpose(value);
        Ok(())
    }

    /// `e.restart_envelope(n)` starts the attack of envelope `n` on the next tick
    pub fn restart_envelope(&mut self, env: usize) -> Result<()> {
        let n = check_index("envelope", env, NUM_ENV)?;
        self.triggers.request(TriggerDestinations::env_attack(n));
        Ok(())
    }

    /// `e.release_envelope(n)` starts the release of envelope `n` on the next tick
    pub fn release_envelope(&mut self, env: usize) -> Result<()> {
        let n = check_index("envelope", env, NUM_ENV)?;
        self.triggers.request(TriggerDestinations::env_release(n));
        Ok(())
    }

    /// `e.restart_lfo(n)` restarts LFO `n` on the next tick
    pub fn restart_lfo(&mut self, lfo: usize) -> Result<()> {
        let n = check_index("lfo", lfo, NUM_LFO)?;
        self.triggers.request(TriggerDestinations::lfo_restart(n));
        Ok(())
    }

    /// `e.reset_wavetable(n)` moves wavetable `n` back to its begin position on the next tick
    pub fn reset_wavetable(&mut self, wt: usize) -> Result<()> {
        let n = check_index("wavetable", wt, NUM_WT)?;
        self.triggers.request(TriggerDestinations::wt_reset(n));
        Ok(())
    }

    /// `e.frame()` is the register state committed by the last tick, one entry per chip
    pub fn frame(&self) -> &[SidChip; NUM_CHIPS] {
        &self.committed
    }

    /// `e.is_changed(c)` is true iff the last tick changed any register of chip `c`
    pub fn is_changed(&self, chip: usize) -> bool {
        self.changed.get(chip).copied().unwrap_or(false)
    }

    /// `e.config()` is the configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// `e.clock()` is the tempo clock
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// `e.bus()` is the modulation bus as left by the last tick
    pub fn bus(&self) -> &ModBus {
        &self.bus
    }

    /// `e.voice(n)` is voice `n`, if there is one
    pub fn voice(&self, voice: usize) -> Option<&Voice> {
        self.voices.get(voice)
    }

    /// `e.envelope(n)` is envelope `n`, if there is one
    pub fn envelope(&self, env: usize) -> Option<&Envelope> {
        self.envs.get(env)
    }

    /// `e.lfo(n)` is LFO `n`, if there is one
    pub fn lfo(&self, lfo: usize) -> Option<&Lfo> {
        self.lfos.get(lfo)
    }

    /// `e.wavetable(n)` is wavetable sequencer `n`, if there is one
    pub fn wavetable(&self, wt: usize) -> Option<&Wavetable> {
        self.wts.get(wt)
    }
}

/// `voice_regs(chips, n)` is the register shadow of voice `n`, voices fill the chips in order
fn voice_regs(chips: &mut [SidChip; NUM_CHIPS], voice: usize) -> &mut SidVoiceRegs {
    &mut chips[voice / VOICES_PER_CHIP].voices[voice % VOICES_PER_CHIP]
}
