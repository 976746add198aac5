//! # Glide
//!
//! Music synthesizers often have a glide control so that new notes slide into each other instead of stepping
//! directly to the new note. The terms glide, lag, and portamento are often used interchangeably.
//!
//! Three flavours are available:
//!
//! - Proportional: the linear frequency moves towards the target by a fraction of itself each tick
//! - Constant time: the linear frequency is interpolated between the old and the new target, so every glide takes
//!   the same time regardless of the interval
//! - Glissando: the note steps through every semitone in between
//!
//! A glide starts whenever the played note changes and ends once the target is reached.

use crate::{lookup_tables, patch::PortaMode, utils::scaled_rate};

/// The portamento state of one voice is represented here
#[derive(Debug, Clone, Default)]
pub struct Glide {
    active: bool,
    ctr: u16,
    prev_note: Option<u8>,
    glissando_note: u8,
    begin_frq: u16,
    end_frq: u16,
    // unmodulated linear frequency produced by the last tick
    frq: u16,
}

impl Glide {
    /// `Glide::new()` is a new glide processor at rest
    pub fn new() -> Self {
        Self::default()
    }

    /// `g.note(n, porta, mode, sf)` is the note to play for target note `n`, stepped through semitones when gliding
    pub fn note(&mut self, note: u8, portamento: u8, mode: PortaMode, speed_factor: u8) -> u8 {
        if self.prev_note != Some(note) {
            // the very first note has nothing to glide from
            if self.prev_note.is_some() {
                self.active = true;
            }
            self.prev_note = Some(note);
            if mode == PortaMode::Glissando {
                // step right away
                self.ctr = u16::MAX;
            }
        }

        if !(self.active && portamento != 0 && mode == PortaMode::Glissando) {
            self.glissando_note = note;
            return note;
        }

        let inc = scaled_rate(lookup_tables::ENV_TABLE[(portamento >> 1) as usize], speed_factor);
        let next = self.ctr as u32 + inc as u32;
        if next >= 0xffff {
            self.ctr = 0;
            if note > self.glissando_note {
                self.glissando_note += 1;
            } else if note < self.glissando_note {
                self.glissando_note -= 1;
            }
            if note == self.glissando_note {
                self.active = false;
            }
        } else {
            self.ctr = next as u16;
        }

        self.glissando_note
    }

    /// `g.frequency(f, porta, mode, sf)` is the linear frequency to play on the way to target frequency `f`
    pub fn frequency(&mut self, target: u16, portamento: u8, mode: PortaMode, speed_factor: u8) -> u16 {
        if self.end_frq != target {
            self.end_frq = target;
            self.begin_frq = self.frq;
            if mode != PortaMode::Glissando {
                self.ctr = 0;
            }
            if target == self.frq {
                self.active = false;
            }
        }

        let mut frq = target;
        if self.active && portamento != 0 && mode != PortaMode::Glissando {
            let multiplier = scaled_rate(lookup_tables::ENV_TABLE[portamento as usize], speed_factor);
            frq = match mode {
                PortaMode::ConstantTime => self.constant_time(target, multiplier),
                _ => self.proportional(target, multiplier),
            };
        }

        self.frq = frq;
        frq
    }

    /// `g.constant_time(f, m)` is the next step of a constant time glide towards `f`
    fn constant_time(&mut self, target: u16, multiplier: u16) -> u16 {
        let next = self.ctr as u32 + multiplier as u32;
        if next >= 0xffff {
            self.active = false;
            return target;
        }
        self.ctr = next as u16;

        let delta = self.end_frq as i64 - self.begin_frq as i64;
        let frq = self.begin_frq as i64 + ((delta * next as i64) >> 16);
        let overshoot = if delta > 0 {
            frq >= target as i64
        } else {
            frq <= target as i64
        };
        if overshoot {
            self.active = false;
            target
        } else {
            frq as u16
        }
    }

    /// `g.proportional(f, m)` is the next step of a proportional glide towards `f`
    fn proportional(&mut self, target: u16, multiplier: u16) -> u16 {
        let frq = self.frq as i32;
        let inc = (((self.frq as u32 * multiplier as u32) >> 16) as i32).max(1);

        let (next, reached) = if target as i32 > frq {
            let next = frq + inc;
            (next, next >= target as i32)
        } else {
            let next = frq - inc;
            (next, next <= target as i32)
        };

        if reached {
            self.active = false;
            target
        } else {
            next as u16
        }
    }

    /// `g.is_active()` is true while a glide is in progress
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SF: u8 = 2;

    /// runs one pitch update, note stage then frequency stage
    fn step(g: &mut Glide, note: u8, porta: u8, mode: PortaMode) -> u16 {
        let n = g.note(note, porta, mode, SF);
        g.frequency((n as u16) << 9, porta, mode, SF)
    }

    fn glide_from_to(from: u8, to: u8, porta: u8, mode: PortaMode) -> ([u16; 4096], Glide) {
        let mut g = Glide::new();
        step(&mut g, from, porta, mode);
        let mut out = [0; 4096];
        for y in out.iter_mut() {
            *y = step(&mut g, to, porta, mode);
        }
        (out, g)
    }

    #[test]
    fn first_note_does_not_glide() {
        let mut g = Glide::new();
        assert_eq!(step(&mut g, 60, 0x80, PortaMode::Proportional), 60 << 9);
        assert!(!g.is_active());
    }

    #[test]
    fn zero_portamento_jumps() {
        let mut g = Glide::new();
        step(&mut g, 60, 0, PortaMode::Proportional);
        assert_eq!(step(&mut g, 72, 0, PortaMode::Proportional), 72 << 9);
    }

    #[test]
    fn proportional_glide_is_monotonic_and_reaches_target() {
        for (from, to) in [(36, 84), (84, 36)] {
            let (out, g) = glide_from_to(from, to, 0x60, PortaMode::Proportional);
            let rising = to > from;
            for w in out.windows(2) {
                assert!(if rising { w[0] <= w[1] } else { w[0] >= w[1] });
            }
            assert_eq!(out[out.len() - 1], (to as u16) << 9);
            assert!(!g.is_active());
        }
    }

    #[test]
    fn constant_time_glides_take_the_same_time() {
        let ticks_to_target = |from: u8, to: u8| {
            let (out, _) = glide_from_to(from, to, 0x60, PortaMode::ConstantTime);
            out.iter().position(|&f| f == (to as u16) << 9).unwrap()
        };
        let short = ticks_to_target(60, 62);
        let long = ticks_to_target(30, 90);
        assert!(short > 0);
        assert!((short as i32 - long as i32).abs() <= 1);
    }

    #[test]
    fn glissando_steps_through_semitones() {
        let (out, g) = glide_from_to(60, 64, 0x80, PortaMode::Glissando);
        let mut seen = [false; 5];
        for f in out {
            assert_eq!(f & 0x1ff, 0);
            let n = (f >> 9) as u8;
            assert!((60..=64).contains(&n));
            seen[(n - 60) as usize] = true;
        }
        // the first step happens right away
        assert_eq!(out[0], 61 << 9);
        assert!(seen[1..].iter().all(|&s| s));
        assert!(!g.is_active());
    }

    #[test]
    fn retarget_mid_glide_starts_from_current_frequency() {
        let mut g = Glide::new();
        step(&mut g, 48, 0x80, PortaMode::ConstantTime);
        let mut mid = 0;
        for _ in 0..5 {
            mid = step(&mut g, 72, 0x80, PortaMode::ConstantTime);
        }
        assert!(mid > 48 << 9 && mid < 72 << 9);

        // heads back down from where the first glide was interrupted
        let next = step(&mut g, 36, 0x80, PortaMode::ConstantTime);
        assert!(next < mid);
        assert!(next > 36 << 9);
    }
}
