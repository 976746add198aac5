//! # Arpeggiator
//!
//! The arpeggiator walks through the note stack of its voice, one note per divided clock pulse. Its gate is
//! cleared again after a configurable number of clock pulses.
//!
//! On each full pass through the stack the note is transposed up by another octave, until the configured octave
//! range is exhausted. Notes which would run off the top of the frequency table are folded down by octaves. A
//! oneshot sequence plays a single pass and ignores the octave range.
//!
//! A MIDI start or a sync request (the first key of a new chord) resets the counters so that the next tick plays the
//! first note of the sequence.

use crate::{
    context::TickContext,
    gate::Gate,
    note_stack::NoteStack,
    patch::{ArpDirection, ArpPatch},
    random::Random,
    triggers::TriggerSource,
    utils::fold_octaves,
};

/// Arpeggiated notes are kept below this note, the frequency table saturates above it
const ARP_NOTE_CEILING: i32 = 0x6c;

/// Note counter value of a oneshot sequence which has finished
const ONESHOT_STOPPED: u8 = 0xaa;

/// Counter value which makes the next increment land on zero
const COUNTER_RESET: u8 = 0xff;

/// The arpeggiator of one voice is represented here
#[derive(Debug, Clone)]
pub struct Arpeggiator {
    note_ctr: u8,
    oct_ctr: u8,
    div_ctr: u8,
    gl_ctr: u8,
    up: bool,
    hold_saved: bool,
    sync_req: bool,
    active: bool,
    note: u8,
    rng: Random,
}

impl Arpeggiator {
    /// `Arpeggiator::new(seed)` is a new idle arpeggiator, the random direction seeded by `seed`
    pub fn new(seed: u32) -> Self {
        Self {
            note_ctr: 0,
            oct_ctr: 0,
            div_ctr: 0,
            gl_ctr: 0,
            up: false,
            hold_saved: false,
            sync_req: false,
            active: false,
            note: 0,
            rng: Random::new(seed),
        }
    }

    /// `arp.request_sync()` restarts the sequence on the next tick
    pub fn request_sync(&mut self) {
        self.sync_req = true;
    }

    /// `arp.note()` is the most recently arpeggiated note
    pub fn note(&self) -> u8 {
        self.note
    }

    /// `arp.is_active()` is true while the arpeggiator is enabled and playing
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `arp.tick(p, stack, gate, ctx)` advances the arpeggiator by one engine tick
    pub fn tick(&mut self, patch: &ArpPatch, stack: &mut NoteStack, gate: &mut Gate, ctx: &mut TickContext) {
        let mut new_note_req = false;
        let mut first_note_req = false;
        let mut gate_clr_req = false;
        let midi_start = ctx.clock.midi_start();

        if midi_start || self.sync_req {
            self.note_ctr = COUNTER_RESET;
            self.oct_ctr = COUNTER_RESET;
            // flipped to up by the first note
            self.up = false;
            first_note_req = true;
            if midi_start || !patch.sync {
                self.div_ctr = COUNTER_RESET;
                self.gl_ctr = COUNTER_RESET;
                new_note_req = true;
            }
        }

        if ctx.clock.clk() {
            let inc = if patch.count_as_chord {
                stack.len().max(1) as u8
            } else {
                1
            };
            let speed_div = (patch.speed_div & 0x3f) + 1;
            let mut div_ctr = self.div_ctr.wrapping_add(inc);
            while div_ctr >= speed_div {
                div_ctr -= speed_div;
                new_note_req = true;
                if !gate.voice_active() {
                    gate_clr_req = true;
                }
            }
            self.div_ctr = div_ctr;

            self.gl_ctr = self.gl_ctr.wrapping_add(1);
            if self.gl_ctr > patch.gate_length & 0x1f {
                self.gl_ctr = 0;
                gate_clr_req = true;
            }
        }

        // releasing hold drops every latched note
        let disable_notes = !patch.hold && self.hold_saved;
        self.hold_saved = patch.hold;

        if disable_notes || !patch.enabled {
            if self.active {
                self.active = false;
                stack.clear();
                ctx.triggers.raise(TriggerSource::NoteOff);
                gate.request_clear();
            }
        } else {
            self.active = true;

            if (gate_clr_req || (!patch.hold && !patch.sync && !gate.voice_active())) && gate.is_active() {
                ctx.triggers.raise(TriggerSource::NoteOff);
                gate.request_clear();
            }

            if new_note_req && self.note_ctr != ONESHOT_STOPPED {
                self.next_note(patch, stack, gate, first_note_req, ctx);
            }
        }

        self.sync_req = false;
    }

    /// `arp.next_note(p, stack, gate, first, ctx)` selects and plays the next note of the sequence
    fn next_note(
        &mut self,
        patch: &ArpPatch,
        stack: &NoteStack,
        gate: &mut Gate,
        first_note_req: bool,
        ctx: &mut TickContext,
    ) {
        let len = stack.len();
        self.gl_ctr = 0;

        self.note_ctr = self.note_ctr.wrapping_add(1);
        if self.note_ctr as usize >= len {
            self.note_ctr = 0;
        }

        let note_number = if patch.direction == ArpDirection::Random {
            self.rng.gen_range(0, len.saturating_sub(1) as u16) as usize
        } else {
            let up = if patch.direction.alternates() {
                if self.note_ctr == 0 {
                    self.up = !self.up;
                    // don't play the turning note twice
                    if patch.direction.skips_turning_note() {
                        self.note_ctr += 1;
                        if self.note_ctr as usize >= len {
                            self.note_ctr = 0;
                        }
                    }
                }
                self.up != patch.direction.starts_down()
            } else {
                !patch.direction.starts_down()
            };

            if up || len == 0 {
                self.note_ctr as usize
            } else {
                len - self.note_ctr as usize - 1
            }
        };

        let mut new_note = stack.get(note_number).unwrap_or(0);

        // a oneshot sequence ends when it wraps back to its first note
        if !first_note_req && patch.oneshot && (new_note == 0 || (note_number == 0 && self.oct_ctr == 0)) {
            self.note_ctr = ONESHOT_STOPPED;
            new_note = 0;
        }

        if new_note == 0 {
            return;
        }

        if first_note_req {
            self.oct_ctr = 0;
        } else if note_number == 0 {
            self.oct_ctr = self.oct_ctr.wrapping_add(1);
        }
        if self.oct_ctr > patch.octave_range & 0x07 {
            self.oct_ctr = 0;
        }

        let transposed = new_note as i32 + 12 * self.oct_ctr as i32;
        self.note = fold_octaves(transposed, 0, ARP_NOTE_CEILING) as u8;

        if gate.voice_active() {
            // a clear request from the gate length counter must not cut the new note
            gate.cancel_clear();
            if !gate.is_active() {
                gate.request_set();
                ctx.triggers.raise(TriggerSource::NoteOn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::{Clock, RealtimeEvent, RealtimeInbox},
        config::{ClockMode, EngineConfig},
        modulation::ModBus,
        patch::VoicePatch,
        registers::SidVoiceRegs,
        triggers::TriggerVector,
    };

    /// a voice reduced to what the arpeggiator touches, clocked once per tick
    struct Rig {
        clock: Clock,
        inbox: RealtimeInbox,
        bus: ModBus,
        triggers: TriggerVector,
        arp: Arpeggiator,
        stack: NoteStack,
        gate: Gate,
        regs: SidVoiceRegs,
        voice: VoicePatch,
    }

    impl Rig {
        fn new(arp: ArpPatch) -> Self {
            let config = EngineConfig {
                clock_mode: ClockMode::Master,
                // one clock pulse per tick
                master_bpm: 625,
                tick_rate_hz: 1000,
                ..Default::default()
            };
            Self {
                clock: Clock::new(&config),
                inbox: RealtimeInbox::new(),
                bus: ModBus::new(),
                triggers: TriggerVector::new(),
                arp: Arpeggiator::new(1),
                stack: NoteStack::new(),
                gate: Gate::new(),
                regs: SidVoiceRegs::default(),
                voice: VoicePatch {
                    arp,
                    ..Default::default()
                },
            }
        }

        fn hold_keys(&mut self, notes: &[u8]) {
            for &n in notes {
                self.stack.push(n, self.voice.arp.sorted);
            }
            self.gate.set_voice_active(true);
            self.arp.request_sync();
        }

        fn tick(&mut self) {
            self.clock.tick(&self.inbox);
            let mut ctx = TickContext {
                speed_factor: 2,
                clock: &self.clock,
                bus: &mut self.bus,
                triggers: &mut self.triggers,
            };
            self.arp.tick(&self.voice.arp, &mut self.stack, &mut self.gate, &mut ctx);
            self.gate.tick(&self.voice, 0, false, 0, &mut self.regs, 2);
        }

        /// the note played after each of the next `n` note changes
        fn sequence<const N: usize>(&mut self) -> [u8; N] {
            let mut out = [0; N];
            let mut last = None;
            let mut i = 0;
            for _ in 0..N * 64 {
                self.tick();
                let gate_on = self.regs.gate;
                if gate_on && last != Some((self.arp.note(), self.arp.note_ctr, self.arp.oct_ctr)) {
                    last = Some((self.arp.note(), self.arp.note_ctr, self.arp.oct_ctr));
                    out[i] = self.arp.note();
                    i += 1;
                    if i == N {
                        break;
                    }
                }
            }
            out
        }
    }

    fn arp(direction: ArpDirection) -> ArpPatch {
        ArpPatch {
            enabled: true,
            direction,
            speed_div: 3,
            gate_length: 1,
            ..Default::default()
        }
    }

    #[test]
    fn up_visits_the_stack_bottom_to_top() {
        let mut rig = Rig::new(arp(ArpDirection::Up));
        rig.hold_keys(&[67, 64, 60]);
        assert_eq!(rig.stack.as_slice(), &[60, 64, 67]);
        assert_eq!(rig.sequence::<7>(), [60, 64, 67, 60, 64, 67, 60]);
    }

    #[test]
    fn down_visits_the_stack_top_to_bottom() {
        let mut rig = Rig::new(arp(ArpDirection::Down));
        rig.hold_keys(&[67, 64, 60]);
        assert_eq!(rig.sequence::<6>(), [67, 64, 60, 67, 64, 60]);
    }

    #[test]
    fn sorted_stack_ignores_key_order() {
        let mut rig = Rig::new(ArpPatch {
            sorted: true,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[64, 67, 60]);
        assert_eq!(rig.sequence::<3>(), [60, 64, 67]);
    }

    #[test]
    fn up_down_does_not_repeat_the_turning_notes() {
        let mut rig = Rig::new(arp(ArpDirection::UpDown));
        rig.hold_keys(&[67, 64, 60]);
        // the bottom note is a turning note too, so the sequence starts above it
        assert_eq!(rig.sequence::<7>(), [64, 67, 64, 60, 64, 67, 64]);
    }

    #[test]
    fn down_up_starts_below_the_top_note() {
        let mut rig = Rig::new(arp(ArpDirection::DownUp));
        rig.hold_keys(&[67, 64, 60]);
        assert_eq!(rig.sequence::<5>(), [64, 60, 64, 67, 64]);
    }

    #[test]
    fn octave_range_transposes_each_pass() {
        let mut rig = Rig::new(ArpPatch {
            octave_range: 1,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[64, 60]);
        assert_eq!(rig.sequence::<6>(), [60, 64, 72, 76, 60, 64]);
    }

    #[test]
    fn high_notes_fold_below_the_ceiling() {
        let mut rig = Rig::new(ArpPatch {
            octave_range: 2,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[100]);
        for n in rig.sequence::<4>() {
            assert!((n as i32) < ARP_NOTE_CEILING);
        }
    }

    #[test]
    fn oneshot_stops_after_one_pass() {
        let mut rig = Rig::new(ArpPatch {
            oneshot: true,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[67, 64, 60]);
        assert_eq!(rig.sequence::<3>(), [60, 64, 67]);
        for _ in 0..200 {
            rig.tick();
        }
        assert_eq!(rig.arp.note_ctr, ONESHOT_STOPPED);
        assert!(!rig.regs.gate);

        // a new sync starts over
        rig.arp.request_sync();
        assert_eq!(rig.sequence::<1>(), [60]);
    }

    #[test]
    fn oneshot_ignores_the_octave_range() {
        let mut rig = Rig::new(ArpPatch {
            oneshot: true,
            octave_range: 2,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[64, 60]);
        assert_eq!(rig.sequence::<2>(), [60, 64]);
        for _ in 0..200 {
            rig.tick();
        }
        assert_eq!(rig.arp.note_ctr, ONESHOT_STOPPED);
        assert_eq!(rig.arp.note(), 64);
    }

    #[test]
    fn speed_divider_is_limited_to_six_bits() {
        let mut wide = Rig::new(ArpPatch {
            speed_div: 0xff,
            ..arp(ArpDirection::Up)
        });
        let mut max = Rig::new(ArpPatch {
            speed_div: 0x3f,
            ..arp(ArpDirection::Up)
        });
        wide.hold_keys(&[60, 64, 67]);
        max.hold_keys(&[60, 64, 67]);

        let mut changes = 0;
        let mut prev = max.arp.note_ctr;
        for _ in 0..300 {
            wide.tick();
            max.tick();
            assert_eq!(wide.arp.note_ctr, max.arp.note_ctr);
            if max.arp.note_ctr != prev {
                changes += 1;
            }
            prev = max.arp.note_ctr;
        }
        assert!(changes >= 3);
    }

    #[test]
    fn gate_length_clears_the_gate_between_notes() {
        let mut rig = Rig::new(arp(ArpDirection::Up));
        rig.hold_keys(&[60]);
        let mut on = 0;
        let mut off = 0;
        for _ in 0..100 {
            rig.tick();
            if rig.regs.gate {
                on += 1;
            } else {
                off += 1;
            }
        }
        assert!(on > 0 && off > 0);
    }

    #[test]
    fn count_as_chord_advances_by_the_number_of_keys() {
        let notes_in_48_clocks = |count_as_chord: bool| {
            let mut rig = Rig::new(ArpPatch {
                count_as_chord,
                ..arp(ArpDirection::Up)
            });
            rig.hold_keys(&[60, 64, 67]);
            rig.tick();
            let mut changes = 0;
            let mut prev = rig.arp.note_ctr;
            for _ in 0..48 {
                rig.tick();
                if rig.arp.note_ctr != prev {
                    changes += 1;
                }
                prev = rig.arp.note_ctr;
            }
            changes
        };
        assert_eq!(notes_in_48_clocks(false), 12);
        assert_eq!(notes_in_48_clocks(true), 36);
    }

    #[test]
    fn disabling_clears_the_stack_and_sends_one_note_off() {
        let mut rig = Rig::new(arp(ArpDirection::Up));
        rig.hold_keys(&[60, 64]);
        rig.sequence::<1>();

        rig.voice.arp.enabled = false;
        rig.triggers.route(&Default::default());
        rig.tick();
        assert!(rig.triggers.is_raised(TriggerSource::NoteOff));
        assert!(rig.stack.is_empty());
        assert!(!rig.regs.gate);

        rig.triggers.route(&Default::default());
        rig.tick();
        assert!(!rig.triggers.is_raised(TriggerSource::NoteOff));
    }

    #[test]
    fn releasing_hold_drops_latched_notes() {
        let mut rig = Rig::new(ArpPatch {
            hold: true,
            ..arp(ArpDirection::Up)
        });
        rig.hold_keys(&[60, 64]);
        rig.sequence::<2>();
        assert_eq!(rig.stack.len(), 2);

        rig.voice.arp.hold = false;
        rig.tick();
        assert!(rig.stack.is_empty());
    }

    #[test]
    fn midi_start_restarts_the_sequence() {
        let mut rig = Rig::new(arp(ArpDirection::Up));
        rig.hold_keys(&[67, 64, 60]);
        rig.sequence::<2>();

        rig.inbox.post(RealtimeEvent::Start);
        rig.tick();
        assert_eq!(rig.arp.note(), 60);
    }
}
