//! # Voice
//!
//! A voice turns held keys into the pitch, pulse width, waveform and gate registers of one chip voice.
//!
//! Once per tick the voice runs its arpeggiator, commits gate requests, and updates pitch and pulse width. Pitch is
//! handled in linear frequency, where one semitone spans 512 units, and converted into the chip's frequency register
//! by interpolating the frequency table. The frequency register is only written when the linear frequency changes.

use crate::{
    arpeggiator::Arpeggiator,
    context::TickContext,
    gate::{Gate, PitchUpdate},
    glide::Glide,
    lookup_tables::{FRQ_TABLE, FRQ_TABLE_MAX_IX, FRQ_TABLE_NOTE_OFFSET},
    modulation::ModDestination,
    note_stack::NoteStack,
    patch::{Patch, VoicePatch, CENTER, TRANSPOSE_CENTER},
    registers::SidVoiceRegs,
    triggers::{TriggerSource, TriggerVector},
    utils::{fold_octaves, linear_interp, saturate_u12, saturate_u16},
};

/// Number of fractional bits between two semitones of a linear frequency
const SEMITONE_BITS: u32 = 9;

/// A synth voice is represented here
#[derive(Debug, Clone)]
pub struct Voice {
    index: usize,
    stack: NoteStack,
    arp: Arpeggiator,
    gate: Gate,
    glide: Glide,
    keys_held: u8,
    note: u8,
    played_note: u8,
    pitchbender: u8,
    transpose: u8,
    linear_frq: u16,
    force_write: bool,
}

impl Voice {
    /// `Voice::new(n, seed)` is a new silent voice driving chip voice `n`
    pub fn new(index: usize, seed: u32) -> Self {
        Self {
            index,
            stack: NoteStack::new(),
            arp: Arpeggiator::new(seed),
            gate: Gate::new(),
            glide: Glide::new(),
            keys_held: 0,
            note: 0,
            played_note: 0,
            pitchbender: CENTER,
            transpose: TRANSPOSE_CENTER,
            linear_frq: 0,
            force_write: true,
        }
    }

    /// `v.note_on(n, p, regs, tv)` handles key `n` going down
    ///
    /// Without the arpeggiator the voice retriggers, with it the first key of a new chord restarts the sequence.
    pub fn note_on(&mut self, note: u8, patch: &Patch, regs: &mut SidVoiceRegs, triggers: &mut TriggerVector) {
        let vp = &patch.voices[self.index];
        let arp = &vp.arp;
        let first_key = self.keys_held == 0;

        // a new chord replaces the latched one
        if arp.enabled && arp.hold && first_key {
            self.stack.clear();
        }

        self.keys_held = self.keys_held.saturating_add(1);
        self.stack.push(note, arp.sorted);
        self.gate.set_voice_active(true);

        if arp.enabled {
            if first_key {
                self.arp.request_sync();
            }
        } else {
            self.note = note;
            self.gate.restart(vp, patch.adsr_bug_workaround, regs);
            triggers.raise(TriggerSource::NoteOn);
        }
    }

    /// `v.note_off(n, p, tv)` handles key `n` going up
    ///
    /// Releasing a key while others are held plays the top remaining key without retriggering.
    pub fn note_off(&mut self, note: u8, patch: &Patch, triggers: &mut TriggerVector) {
        let arp = &patch.voices[self.index].arp;

        // latched until hold is released
        if arp.enabled && arp.hold {
            if self.stack.as_slice().contains(&note) {
                self.keys_held = self.keys_held.saturating_sub(1);
            }
            return;
        }

        if !self.stack.remove(note) {
            return;
        }
        self.keys_held = self.keys_held.saturating_sub(1);

        match self.stack.top() {
            Some(top) => {
                if !arp.enabled {
                    self.note = top;
                }
            }
            None => {
                self.keys_held = 0;
                self.gate.set_voice_active(false);
                if !arp.enabled {
                    self.gate.request_clear();
                    triggers.raise(TriggerSource::NoteOff);
                }
            }
        }
    }

    /// `v.tick(p, regs, ctx)` advances the voice by one engine tick and updates its chip registers
    pub fn tick(&mut self, patch: &Patch, regs: &mut SidVoiceRegs, ctx: &mut TickContext) {
        let vp = &patch.voices[self.index];

        self.arp.tick(&vp.arp, &mut self.stack, &mut self.gate, ctx);
        if self.stack.is_empty() {
            self.keys_held = 0;
            self.gate.set_voice_active(false);
        }

        let update = self.gate.tick(
            vp,
            patch.osc_phase,
            patch.adsr_bug_workaround,
            self.index,
            regs,
            ctx.speed_factor,
        );
        match update {
            PitchUpdate::Update => self.pitch(patch, regs, ctx),
            PitchUpdate::Hold => (),
            PitchUpdate::Rewrite => self.force_write = true,
        }

        self.pulsewidth(vp, regs, ctx);
        waveform(vp, regs);
        // with the workaround the gate owns the envelope registers
        if !patch.adsr_bug_workaround {
            regs.ad = vp.ad;
            regs.sr = vp.sr;
        }
    }

    /// `v.pitch(p, regs, ctx)` updates the frequency register from the played note, glide and modulation
    fn pitch(&mut self, patch: &Patch, regs: &mut SidVoiceRegs, ctx: &TickContext) {
        let vp = &patch.voices[self.index];

        let base = if vp.arp.enabled {
            self.arp.note()
        } else {
            self.note
        };
        let transposed = base as i32 + vp.transpose as i32 - TRANSPOSE_CENTER as i32 + self.transpose as i32
            - TRANSPOSE_CENTER as i32;
        let transposed = fold_octaves(transposed, 0, 128) as u8;
        self.played_note = transposed;

        let note = self
            .glide
            .note(transposed, vp.portamento, vp.porta_mode, ctx.speed_factor);

        let mut target = (note as i32) << SEMITONE_BITS;
        if vp.pitchrange != 0 {
            let delta = self.pitchbender as i32 - CENTER as i32 + vp.finetune as i32 - CENTER as i32
                + detune(patch.osc_detune, self.index);
            target += delta * 4 * vp.pitchrange as i32;
        }

        let frq = self.glide.frequency(
            saturate_u16(target),
            vp.portamento,
            vp.porta_mode,
            ctx.speed_factor,
        );

        let modulation = ctx.bus.destination(ModDestination::Pitch(self.index as u8));
        let linear_frq = saturate_u16(frq as i32 + modulation);

        if linear_frq != self.linear_frq || self.force_write {
            self.linear_frq = linear_frq;
            self.force_write = false;
            regs.set_frequency(chip_frequency(linear_frq));
        }
    }

    /// `v.pulsewidth(p, regs, ctx)` updates the pulse width registers
    fn pulsewidth(&self, patch: &VoicePatch, regs: &mut SidVoiceRegs, ctx: &TickContext) {
        let modulation = ctx.bus.destination(ModDestination::PulseWidth(self.index as u8)) / 16;
        regs.set_pulsewidth(saturate_u12((patch.pulsewidth & 0xfff) as i32 + modulation));
    }

    /// `v.set_pitchbend(pb)` sets the pitch bender, centered at 0x80
    pub fn set_pitchbend(&mut self, value: u8) {
        self.pitchbender = value;
    }

    /// `v.set_transpose(t)` sets the transposition in semitones applied on top of the patch, centered at 0x40
    pub fn set_transpose(&mut self, value: u8) {
        self.transpose = value;
    }

    /// `v.played_note()` is the transposed note most recently played
    pub fn played_note(&self) -> u8 {
        self.played_note
    }

    /// `v.linear_frequency()` is the linear frequency most recently written
    pub fn linear_frequency(&self) -> u16 {
        self.linear_frq
    }

    /// `v.gate()` is the gate of the voice
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// `v.note_stack()` is the stack of keys held on the voice
    pub fn note_stack(&self) -> &NoteStack {
        &self.stack
    }

    /// `v.arpeggiator()` is the arpeggiator of the voice
    pub fn arpeggiator(&self) -> &Arpeggiator {
        &self.arp
    }
}

/// `waveform(p, regs)` copies the waveform selection of `p` into the control register bits
fn waveform(patch: &VoicePatch, regs: &mut SidVoiceRegs) {
    let w = &patch.waveform;
    regs.triangle = w.triangle;
    regs.saw = w.saw;
    regs.pulse = w.pulse;
    regs.noise = w.noise;
    regs.sync = w.sync;
    regs.ring = w.ring;
}

/// `detune(d, v)` is the detuning of voice `v`, spreading the oscillators of the two chips apart
fn detune(detune: u8, voice: usize) -> i32 {
    let d = detune as i32;
    match voice {
        0 => d / 4,
        3 => -d / 4,
        1 | 5 => d,
        2 | 4 => -d,
        _ => 0,
    }
}

/// `chip_frequency(lf)` is the chip frequency register value for linear frequency `lf`
///
/// Notes beyond the top of the frequency table saturate at its last entry.
pub fn chip_frequency(linear_frq: u16) -> u16 {
    let ix = (linear_frq >> SEMITONE_BITS) as usize + FRQ_TABLE_NOTE_OFFSET;
    if ix >= FRQ_TABLE_MAX_IX {
        return FRQ_TABLE[FRQ_TABLE_MAX_IX];
    }

    let frac = (linear_frq & ((1 << SEMITONE_BITS) - 1)) as i32;
    let frq = linear_interp(FRQ_TABLE[ix] as i32, FRQ_TABLE[ix + 1] as i32, frac, SEMITONE_BITS);
    debug_assert!((0..=0xffff).contains(&frq));
    frq as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::Clock, config::EngineConfig, modulation::ModBus};

    struct Rig {
        clock: Clock,
        bus: ModBus,
        triggers: TriggerVector,
        patch: Patch,
        regs: SidVoiceRegs,
        voice: Voice,
    }

    impl Rig {
        fn new(index: usize) -> Self {
            Self {
                clock: Clock::new(&EngineConfig::default()),
                bus: ModBus::new(),
                triggers: TriggerVector::new(),
                patch: Patch::default(),
                regs: SidVoiceRegs::default(),
                voice: Voice::new(index, 1),
            }
        }

        fn note_on(&mut self, note: u8) {
            self.voice
                .note_on(note, &self.patch, &mut self.regs, &mut self.triggers);
        }

        fn note_off(&mut self, note: u8) {
            self.voice.note_off(note, &self.patch, &mut self.triggers);
        }

        fn tick(&mut self) {
            let mut ctx = TickContext {
                speed_factor: 2,
                clock: &self.clock,
                bus: &mut self.bus,
                triggers: &mut self.triggers,
            };
            self.voice.tick(&self.patch, &mut self.regs, &mut ctx);
        }
    }

    fn note_frq(note: u8) -> u16 {
        chip_frequency((note as u16) << SEMITONE_BITS)
    }

    #[test]
    fn chip_frequency_is_monotonic() {
        let mut prev = chip_frequency(0);
        for lf in 1..=u16::MAX {
            let frq = chip_frequency(lf);
            assert!(frq >= prev, "not monotonic at {:#x}", lf);
            prev = frq;
        }
        assert_eq!(chip_frequency(u16::MAX), FRQ_TABLE[FRQ_TABLE_MAX_IX]);
    }

    #[test]
    fn chip_frequency_hits_table_entries_on_semitones() {
        for note in 0..100u8 {
            assert_eq!(note_frq(note), FRQ_TABLE[note as usize + FRQ_TABLE_NOTE_OFFSET]);
        }
    }

    #[test]
    fn note_on_plays_the_note() {
        let mut rig = Rig::new(0);
        rig.note_on(60);
        assert!(rig.triggers.is_raised(TriggerSource::NoteOn));
        rig.tick();
        assert!(rig.regs.gate);
        assert_eq!(rig.regs.frequency(), note_frq(60));
        assert_eq!(rig.voice.played_note(), 60);
    }

    #[test]
    fn last_note_off_clears_the_gate() {
        let mut rig = Rig::new(0);
        rig.note_on(60);
        rig.tick();
        rig.note_off(60);
        assert!(rig.triggers.is_raised(TriggerSource::NoteOff));
        rig.tick();
        assert!(!rig.regs.gate);
    }

    #[test]
    fn releasing_a_key_falls_back_to_the_held_one() {
        let mut rig = Rig::new(0);
        rig.note_on(60);
        rig.tick();
        rig.note_on(67);
        rig.tick();
        rig.tick();
        assert_eq!(rig.regs.frequency(), note_frq(67));

        rig.note_off(67);
        rig.tick();
        assert!(rig.regs.gate);
        assert_eq!(rig.regs.frequency(), note_frq(60));
    }

    #[test]
    fn pitch_is_frozen_while_the_gate_delay_is_pending() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].delay = 0x80;
        rig.note_on(60);

        rig.tick();
        assert!(rig.voice.gate().is_delay_pending());
        while rig.voice.gate().is_delay_pending() {
            assert_eq!(rig.regs.frequency(), 0);
            assert!(!rig.regs.gate);
            rig.tick();
        }
        assert_eq!(rig.regs.frequency(), note_frq(60));
        rig.tick();
        assert!(rig.regs.gate);
    }

    #[test]
    fn transpose_and_global_transpose_add_up() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].transpose = TRANSPOSE_CENTER + 12;
        rig.voice.set_transpose(TRANSPOSE_CENTER - 5);
        rig.note_on(60);
        rig.tick();
        assert_eq!(rig.voice.played_note(), 67);
        assert_eq!(rig.regs.frequency(), note_frq(67));
    }

    #[test]
    fn transposition_folds_by_octaves() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].transpose = 0x7f;
        rig.note_on(120);
        rig.tick();
        assert!(rig.voice.played_note() < 128);
        assert_eq!(rig.voice.played_note() % 12, (120 + 0x7f - 0x40) % 12);
    }

    #[test]
    fn pitchbend_scales_with_pitchrange() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].pitchrange = 2;
        rig.voice.set_pitchbend(CENTER + 64);
        rig.note_on(60);
        rig.tick();
        // 64 * 4 * 2 = one semitone
        assert_eq!(rig.voice.linear_frequency(), 61 << SEMITONE_BITS);

        rig.patch.voices[0].pitchrange = 0;
        rig.tick();
        assert_eq!(rig.voice.linear_frequency(), 60 << SEMITONE_BITS);
    }

    #[test]
    fn detune_spreads_the_chips() {
        assert_eq!(detune(40, 0), 10);
        assert_eq!(detune(40, 3), -10);
        assert_eq!(detune(40, 1), 40);
        assert_eq!(detune(40, 5), 40);
        assert_eq!(detune(40, 2), -40);
        assert_eq!(detune(40, 4), -40);

        let mut rig = Rig::new(1);
        rig.patch.osc_detune = 40;
        rig.note_on(60);
        rig.tick();
        assert_eq!(rig.voice.linear_frequency(), (60 << SEMITONE_BITS) + 40 * 4 * 2);
    }

    #[test]
    fn pitch_modulation_saturates() {
        let mut rig = Rig::new(2);
        rig.bus.add_to_destination(ModDestination::Pitch(2), 0x10_0000);
        rig.note_on(60);
        rig.tick();
        assert_eq!(rig.voice.linear_frequency(), 0xffff);

        rig.bus.clear_destinations();
        rig.bus.add_to_destination(ModDestination::Pitch(2), -0x10_0000);
        rig.tick();
        assert_eq!(rig.voice.linear_frequency(), 0);
    }

    #[test]
    fn pulsewidth_is_modulated_and_clamped() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].pulsewidth = 0x800;
        rig.bus.add_to_destination(ModDestination::PulseWidth(0), 0x100 * 16);
        rig.tick();
        assert_eq!(rig.regs.pulsewidth(), 0x900);

        rig.bus.add_to_destination(ModDestination::PulseWidth(0), 0x7fff_0000);
        rig.tick();
        assert_eq!(rig.regs.pulsewidth(), 0xfff);
    }

    #[test]
    fn waveform_reaches_the_control_register() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].waveform.pulse = false;
        rig.patch.voices[0].waveform.saw = true;
        rig.patch.voices[0].waveform.ring = true;
        rig.tick();
        assert!(rig.regs.saw && rig.regs.ring);
        assert!(!rig.regs.pulse);
    }

    #[test]
    fn arpeggiated_voice_plays_the_arp_note() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].arp.enabled = true;
        rig.note_on(64);
        rig.note_on(60);
        // the arp raises its own note-on
        assert!(!rig.triggers.is_raised(TriggerSource::NoteOn));
        rig.tick();
        assert!(rig.regs.gate);
        assert_eq!(rig.voice.arpeggiator().note(), 60);
        assert_eq!(rig.regs.frequency(), note_frq(60));
    }

    #[test]
    fn arp_hold_latches_released_keys() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].arp.enabled = true;
        rig.patch.voices[0].arp.hold = true;
        rig.note_on(60);
        rig.note_on(64);
        rig.note_off(60);
        rig.note_off(64);
        rig.tick();
        assert_eq!(rig.voice.note_stack().len(), 2);
        assert!(rig.regs.gate);

        // the next chord replaces the latched one
        rig.note_on(72);
        assert_eq!(rig.voice.note_stack().as_slice(), &[72]);
    }

    #[test]
    fn envelope_registers_follow_the_patch() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].ad = 0x12;
        rig.patch.voices[0].sr = 0xf4;
        rig.note_on(60);
        rig.tick();
        assert_eq!((rig.regs.ad, rig.regs.sr), (0x12, 0xf4));

        rig.patch.voices[0].sr = 0xa0;
        rig.tick();
        assert_eq!(rig.regs.sr, 0xa0);
    }

    #[test]
    fn adsr_bug_workaround_zeroes_the_envelope_until_the_gate_opens() {
        let mut rig = Rig::new(0);
        rig.patch.adsr_bug_workaround = true;
        rig.patch.voices[0].ad = 0x12;
        rig.patch.voices[0].sr = 0xf4;
        rig.regs.ad = 0x55;
        rig.regs.sr = 0x55;
        rig.note_on(60);
        rig.tick();
        assert_eq!((rig.regs.ad, rig.regs.sr), (0, 0));

        for _ in 0..1000 {
            if rig.regs.gate {
                break;
            }
            rig.tick();
        }
        assert!(rig.regs.gate);
        assert_eq!((rig.regs.ad, rig.regs.sr), (0x12, 0xf4));
    }

    #[test]
    fn releasing_an_unheld_key_is_ignored() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].arp.enabled = true;
        rig.patch.voices[0].arp.hold = true;
        rig.note_on(60);
        // never pressed, must not count as the chord being released
        rig.note_off(67);
        rig.note_on(64);
        assert_eq!(rig.voice.note_stack().len(), 2);

        rig.note_off(60);
        rig.note_off(64);
        rig.note_on(72);
        assert_eq!(rig.voice.note_stack().as_slice(), &[72]);
    }

    #[test]
    fn keys_released_after_the_arp_cleared_the_stack_start_a_new_chord() {
        let mut rig = Rig::new(0);
        rig.patch.voices[0].arp.enabled = true;
        rig.patch.voices[0].arp.hold = true;
        rig.note_on(60);
        rig.tick();

        // releasing hold drops the latched note while its key is still down
        rig.patch.voices[0].arp.hold = false;
        rig.tick();
        assert!(rig.voice.note_stack().is_empty());
        rig.note_off(60);

        rig.patch.voices[0].arp.hold = true;
        rig.note_on(64);
        rig.tick();
        assert_eq!(rig.voice.note_stack().as_slice(), &[64]);
        assert_eq!(rig.voice.arpeggiator().note(), 64);
    }
}
