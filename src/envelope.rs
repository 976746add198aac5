//! # Multi segment envelope generator
//!
//! ## Acronyms used:
//!
//! - `ENV`: Envelope generator
//! - `LUT`: Look Up Table
//!
//! The envelope walks through seven segments:
//!
//! `Attack1 -> Attack2 -> Decay1 -> Decay2 -> Sustain -> Release1 -> Release2`
//!
//! Each segment moves a 16 bit level counter towards a target level at a rate taken from a LUT. A segment is complete
//! when the counter sits exactly on its target, which moves the envelope on to the next segment.
//!
//! Segments may be curve shaped. With a neutral curve (0x80) the rate comes straight from the envelope rate LUT. Any
//! other curve picks the rate from the exponential frequency LUT, indexed by a "bend" which depends on the curve and
//! the current level. This approximates the RC curves of analog envelopes.
//!
//! The envelope responds to two kinds of events:
//!
//! - Restart, which starts the attack after an optional delay
//! - Release, which jumps to the first release segment from anywhere
//!
//! Before the first restart the envelope idles and never writes its modulation source.

use crate::{
    context::TickContext,
    delay::{DelayCounter, MOD_DELAY_LIMIT},
    lookup_tables,
    modulation::ModSource,
    patch::{EnvPatch, CENTER},
    triggers::TriggerSource,
    utils::{saturate_i16, scaled_rate},
};

/// Envelope states are represented here
///
/// An envelope is in exactly one of these states at any given time
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum State {
    Idle,
    Attack1,
    Attack2,
    Decay1,
    Decay2,
    Sustain,
    Release1,
    Release2,
}

/// An envelope generator is represented here
#[derive(Debug, Clone)]
pub struct Envelope {
    index: u8,
    state: State,
    ctr: u16,
    delay: DelayCounter,
}

impl Envelope {
    /// `Envelope::new(n)` is a new idle envelope writing to modulation source ENV `n`
    pub fn new(index: u8) -> Self {
        Self {
            index,
            state: State::Idle,
            ctr: 0,
            delay: DelayCounter::new(),
        }
    }

    /// `env.restart(p)` starts a new attack phase, delayed if `p` asks for it
    pub fn restart(&mut self, patch: &EnvPatch) {
        self.state = State::Attack1;
        self.delay.arm(patch.delay != 0);
    }

    /// `env.release()` starts the release phase, whatever the envelope was doing before
    pub fn release(&mut self) {
        self.state = State::Release1;
    }

    /// `env.tick(p, ctx)` advances the envelope by one engine tick and writes its modulation source
    pub fn tick(&mut self, patch: &EnvPatch, ctx: &mut TickContext) {
        if patch.clock_sync && !ctx.sync_pulse() {
            // no advancement between sync pulses, but the output still follows depth changes
            if self.state == State::Idle {
                return;
            }
        } else {
            let sf = ctx.speed_factor;
            match self.state {
                State::Idle => return,
                State::Attack1 => {
                    let inc = ctx.rate(lookup_tables::ENV_TABLE[patch.delay as usize]);
                    if self.delay.is_pending() && self.delay.tick(inc, MOD_DELAY_LIMIT) {
                        return;
                    }
                    let target = (patch.attack_level as u16) << 8;
                    if step(&mut self.ctr, target, patch.attack1, patch.attack_curve, sf) {
                        self.state = State::Attack2;
                    }
                }
                State::Attack2 => {
                    if step(&mut self.ctr, 0xffff, patch.attack2, patch.attack_curve, sf) {
                        self.state = State::Decay1;
                    }
                }
                State::Decay1 => {
                    let target = (patch.decay_level as u16) << 8;
                    if step(&mut self.ctr, target, patch.decay1, patch.decay_curve, sf) {
                        self.state = State::Decay2;
                    }
                }
                State::Decay2 => {
                    let target = (patch.sustain as u16) << 8;
                    if step(&mut self.ctr, target, patch.decay2, patch.decay_curve, sf) {
                        self.state = State::Sustain;
                        ctx.triggers.raise(TriggerSource::EnvSustain(self.index));
                    }
                }
                State::Sustain => {
                    // re-latched every tick so that live edits of the sustain level are heard
                    self.ctr = (patch.sustain as u16) << 8;
                }
                State::Release1 => {
                    let target = (patch.release_level as u16) << 8;
                    if step(&mut self.ctr, target, patch.release1, patch.release_curve, sf) {
                        self.state = State::Release2;
                    }
                }
                State::Release2 => {
                    if self.ctr != 0 {
                        step(&mut self.ctr, 0, patch.release2, patch.release_curve, sf);
                    }
                }
            }
        }

        ctx.bus.set_source(ModSource::Env(self.index), self.output(patch));
    }

    /// `env.output(p)` is the level scaled by the depth of `p`, in `[-0x8000, 0x7fff]`
    fn output(&self, patch: &EnvPatch) -> i16 {
        let depth = patch.depth as i32 - CENTER as i32;
        saturate_i16(((self.ctr / 2) as i32 * depth) / 128)
    }

    /// `env.state()` is the current state of the envelope
    pub fn state(&self) -> State {
        self.state
    }

    /// `env.level()` is the raw 16 bit level counter
    pub fn level(&self) -> u16 {
        self.ctr
    }
}

/// `step(ctr, target, rate, curve, sf)` moves `ctr` towards `target` and is true iff `ctr` has reached it
///
/// Calling it again once the target is reached returns true without touching `ctr`.
pub fn step(ctr: &mut u16, target: u16, rate: u8, curve: u8, speed_factor: u8) -> bool {
    if *ctr == target {
        return true;
    }

    let inc = scaled_rate(segment_rate(*ctr, rate, curve), speed_factor) as i32;

    let current = *ctr as i32;
    let target_i = target as i32;
    let (next, reached) = if target_i > current {
        let next = current + inc;
        (next, next >= target_i)
    } else {
        let next = current - inc;
        (next, next <= target_i)
    };

    if reached {
        *ctr = target;
    } else {
        debug_assert!((0..=0xffff).contains(&next));
        *ctr = next as u16;
    }
    reached
}

/// `segment_rate(ctr, rate, curve)` is the unscaled increment of a segment at level `ctr`
///
/// A curved segment looks its rate up in the frequency table instead, shifted by a feedback term of
/// `|curve - 0x80| * (ctr >> 8) / 256`. Both bend directions use the same magnitude: the feedback is subtracted for
/// curves above 0x80 and added below it, without inverting the magnitude of upward curves.
fn segment_rate(ctr: u16, rate: u8, curve: u8) -> u16 {
    if curve == CENTER {
        return lookup_tables::ENV_TABLE[rate as usize];
    }

    let abs_curve = (curve as i32 - CENTER as i32).abs();
    let feedback = (abs_curve * (ctr >> 8) as i32) >> 8;
    let base = ((rate >> 1) ^ 0x7f) as i32;

    let ix = if curve > CENTER {
        // bend up
        base - feedback
    } else {
        // bend down
        base + feedback
    }
    .clamp(0, lookup_tables::FRQ_TABLE_MAX_IX as i32);

    lookup_tables::FRQ_TABLE[ix as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::Clock, config::EngineConfig, modulation::ModBus, triggers::TriggerVector};

    const SF: u8 = 2;

    struct Rig {
        clock: Clock,
        bus: ModBus,
        triggers: TriggerVector,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                clock: Clock::new(&EngineConfig::default()),
                bus: ModBus::new(),
                triggers: TriggerVector::new(),
            }
        }

        fn tick(&mut self, env: &mut Envelope, patch: &EnvPatch) {
            let mut ctx = TickContext {
                speed_factor: SF,
                clock: &self.clock,
                bus: &mut self.bus,
                triggers: &mut self.triggers,
            };
            env.tick(patch, &mut ctx);
        }

        fn run_until(&mut self, env: &mut Envelope, patch: &EnvPatch, state: State) -> u32 {
            for n in 1..=200_000 {
                self.tick(env, patch);
                if env.state() == state {
                    return n;
                }
            }
            panic!("envelope never reached {:?}", state);
        }
    }

    // straightforward re-statement of a linear segment, independent of `step`
    fn reference_linear_step(ctr: u16, target: u16, rate: u8) -> (u16, bool) {
        let inc = (lookup_tables::ENV_TABLE[rate as usize] as i64 / SF as i64).max(1);
        let ctr = ctr as i64;
        let target = target as i64;
        if ctr == target {
            (target as u16, true)
        } else if ctr < target {
            let moved = (ctr + inc).min(target);
            (moved as u16, moved == target)
        } else {
            let moved = (ctr - inc).max(target);
            (moved as u16, moved == target)
        }
    }

    #[test]
    fn step_reaches_target_for_every_rate_and_curve() {
        for rate in [0u8, 1, 17, 128, 200, 254, 255] {
            for curve in [0x00u8, 0x40, 0x80, 0xc0, 0xff] {
                for (start, target) in [(0u16, 0xffff), (0xffff, 0), (0x1234, 0x8000)] {
                    let mut ctr = start;
                    let mut completions = 0;
                    for _ in 0..=0x10000 {
                        if step(&mut ctr, target, rate, curve, SF) {
                            completions += 1;
                            break;
                        }
                    }
                    assert_eq!(completions, 1, "rate {} curve {:#x}", rate, curve);
                    assert_eq!(ctr, target);
                }
            }
        }
    }

    #[test]
    fn step_is_idempotent_after_completion() {
        let mut ctr = 0x4000;
        assert!(step(&mut ctr, 0x4000, 10, 0x80, SF));
        assert!(step(&mut ctr, 0x4000, 10, 0x20, SF));
        assert_eq!(ctr, 0x4000);
    }

    #[test]
    fn neutral_curve_matches_reference_table() {
        for rate in 0..=255u8 {
            for (start, target) in [(0u16, 0xffff), (0xffff, 0x1000), (0x8000, 0x8001), (0x10, 0)] {
                let mut ctr = start;
                let mut expected = start;
                for _ in 0..4 {
                    let done = step(&mut ctr, target, rate, CENTER, SF);
                    let (e, e_done) = reference_linear_step(expected, target, rate);
                    expected = e;
                    assert_eq!(ctr, expected);
                    assert_eq!(done, e_done);
                }
            }
        }
    }

    #[test]
    fn curves_bend_the_rate() {
        // at full level a bend-down curve picks a faster rate than a bend-up curve
        let up = segment_rate(0xff00, 100, 0xff);
        let down = segment_rate(0xff00, 100, 0x00);
        assert!(up < down);
    }

    #[test]
    fn curve_feedback_has_the_same_magnitude_both_ways() {
        // rate 100 starts at table index 77, |0xc0 - 0x80| at half level is 32 indices of feedback
        assert_eq!(segment_rate(0x8000, 100, 0xc0), lookup_tables::FRQ_TABLE[77 - 32]);
        assert_eq!(segment_rate(0x8000, 100, 0x40), lookup_tables::FRQ_TABLE[77 + 32]);
    }

    #[test]
    fn idle_envelope_does_nothing() {
        let mut rig = Rig::new();
        let mut env = Envelope::new(0);
        rig.bus.set_source(ModSource::Env(0), 1234);

        rig.tick(&mut env, &EnvPatch::default());
        assert_eq!(env.state(), State::Idle);
        assert_eq!(rig.bus.source(ModSource::Env(0)), 1234);
    }

    #[test]
    fn transition_through_phases() {
        let mut rig = Rig::new();
        let patch = EnvPatch {
            attack1: 0,
            attack2: 0,
            decay1: 0,
            decay2: 0,
            release1: 0,
            release2: 0,
            ..Default::default()
        };
        let mut env = Envelope::new(1);
        env.restart(&patch);
        assert_eq!(env.state(), State::Attack1);

        rig.run_until(&mut env, &patch, State::Attack2);
        rig.run_until(&mut env, &patch, State::Decay1);
        assert_eq!(env.level(), 0xffff);
        rig.run_until(&mut env, &patch, State::Decay2);
        rig.run_until(&mut env, &patch, State::Sustain);
        assert_eq!(env.level(), (patch.sustain as u16) << 8);

        // sustain holds until released
        for _ in 0..100 {
            rig.tick(&mut env, &patch);
        }
        assert_eq!(env.state(), State::Sustain);

        env.release();
        rig.run_until(&mut env, &patch, State::Release2);
        for _ in 0..100 {
            rig.tick(&mut env, &patch);
        }
        assert_eq!(env.level(), 0);
    }

    #[test]
    fn sustain_reached_triggers_exactly_once() {
        let mut rig = Rig::new();
        let patch = EnvPatch {
            attack1: 0,
            attack2: 0,
            decay1: 0,
            decay2: 0,
            ..Default::default()
        };
        let mut env = Envelope::new(0);
        env.restart(&patch);

        let mut raised = 0;
        for _ in 0..50 {
            rig.tick(&mut env, &patch);
            if rig.triggers.is_raised(TriggerSource::EnvSustain(0)) {
                raised += 1;
                rig.triggers.route(&Default::default());
            }
        }
        assert_eq!(env.state(), State::Sustain);
        assert_eq!(raised, 1);
    }

    #[test]
    fn sustain_follows_live_edits() {
        let mut rig = Rig::new();
        let mut patch = EnvPatch {
            attack1: 0,
            attack2: 0,
            decay1: 0,
            decay2: 0,
            ..Default::default()
        };
        let mut env = Envelope::new(0);
        env.restart(&patch);
        rig.run_until(&mut env, &patch, State::Sustain);

        patch.sustain = 0x20;
        rig.tick(&mut env, &patch);
        assert_eq!(env.level(), 0x2000);
    }

    #[test]
    fn release_can_start_from_any_phase() {
        let patch = EnvPatch::default();
        for state in [State::Idle, State::Attack1, State::Decay2, State::Sustain, State::Release2] {
            let mut env = Envelope::new(0);
            env.state = state;
            env.release();
            assert_eq!(env.state(), State::Release1);
        }

        // release heads for the release level
        let mut rig = Rig::new();
        let mut env = Envelope::new(0);
        env.restart(&patch);
        env.release();
        rig.tick(&mut env, &patch);
        assert_eq!(env.state(), State::Release1);
        assert!(env.level() > 0);
    }

    #[test]
    fn delay_holds_the_attack() {
        let mut rig = Rig::new();
        let patch = EnvPatch {
            delay: 128,
            attack1: 0,
            ..Default::default()
        };
        let mut env = Envelope::new(0);
        env.restart(&patch);

        let inc = scaled_rate(lookup_tables::ENV_TABLE[128], SF) as u32;
        let delay_ticks = (0x1_0000 - 1 + inc - 1) / inc;
        for _ in 0..delay_ticks - 1 {
            rig.tick(&mut env, &patch);
            assert_eq!(env.level(), 0);
        }

        // the delay passes and the attack moves on the same tick
        rig.tick(&mut env, &patch);
        rig.tick(&mut env, &patch);
        assert!(env.level() > 0);
    }

    #[test]
    fn clock_sync_only_advances_on_sync_pulses() {
        let mut rig = Rig::new();
        let patch = EnvPatch {
            clock_sync: true,
            attack1: 0,
            ..Default::default()
        };
        let mut env = Envelope::new(0);
        env.restart(&patch);

        // no clock has ticked, so no sync pulse
        for _ in 0..10 {
            rig.tick(&mut env, &patch);
        }
        assert_eq!(env.level(), 0);
        assert_eq!(env.state(), State::Attack1);
    }

    #[test]
    fn output_is_scaled_by_depth() {
        let mut rig = Rig::new();
        let mut patch = EnvPatch::default();
        let mut env = Envelope::new(0);
        env.restart(&patch);
        env.state = State::Sustain;

        patch.sustain = 0xff;
        patch.depth = 0xff;
        rig.tick(&mut env, &patch);
        assert_eq!(rig.bus.source(ModSource::Env(0)), ((0x7f80_i32 * 127) / 128) as i16);

        patch.depth = 0x00;
        rig.tick(&mut env, &patch);
        assert_eq!(rig.bus.source(ModSource::Env(0)), -0x7f80);

        patch.depth = CENTER;
        rig.tick(&mut env, &patch);
        assert_eq!(rig.bus.source(ModSource::Env(0)), 0);
    }
}
