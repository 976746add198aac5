//! # Wavetable sequencer
//!
//! A wavetable steps through a range of the patch's wavetable memory. Each step decodes one byte into a modulation
//! source value and, if the wavetable is assigned to a parameter, hands the raw byte to a [`ParameterDispatch`].
//!
//! The step position comes from one of three places:
//!
//! - Key control: the note played by the first voice, scaled into the `begin..=end` range
//! - Modulation control: the wavetable's modulation bus destination, scaled into the same range
//! - Sequential: reset and step triggers from the trigger matrix walk from `begin` to `end`, then continue at the loop
//!   position, or stop in oneshot mode until the next reset
//!
//! Memory bytes below 0x80 are relative values centered at 0x40, bytes from 0x80 up are absolute values.

use crate::{
    context::TickContext,
    modulation::{ModDestination, ModSource},
    patch::WtPatch,
    triggers::TriggerDestinations,
    WT_MEMORY_SIZE,
};

/// Position of a oneshot wavetable which has passed its end
pub const WT_STOPPED: u8 = 0xaa;

/// A wavetable step assigned to a patch parameter is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WtAssignment {
    /// Wavetable number
    pub wt: u8,
    /// Parameter the wavetable is assigned to
    pub assign: u8,
    /// Raw wavetable memory byte of the step
    pub value: u8,
    /// Which of the two chips the parameter should be changed on
    pub sid_select: u8,
}

/// Receiver of wavetable parameter assignments
///
/// Parameter tables belong to the patch editor side, the engine only reports which assigned parameter a wavetable
/// wants to change.
pub trait ParameterDispatch {
    /// `pd.dispatch(a)` applies wavetable assignment `a`
    fn dispatch(&mut self, assignment: WtAssignment);
}

/// Drops every assignment
impl ParameterDispatch for () {
    fn dispatch(&mut self, _assignment: WtAssignment) {}
}

/// The sequencer state of one wavetable is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wavetable {
    index: usize,
    pos: u8,
    div_ctr: u8,
}

impl Wavetable {
    /// `Wavetable::new(n)` is a new wavetable `n` at the start of memory
    pub fn new(index: usize) -> Self {
        Self {
            index,
            pos: 0,
            div_ctr: 0,
        }
    }

    /// `wt.tick(p, mem, note, ctx, pd)` advances the wavetable by one engine tick
    ///
    /// # Arguments:
    ///
    /// * `patch` - The wavetable parameters
    ///
    /// * `memory` - The wavetable memory shared by all wavetables
    ///
    /// * `played_note` - The note currently played by the first voice, used in key control mode
    ///
    /// * `ctx` - The tick context, the reset and step triggers of this wavetable are consumed from it
    ///
    /// * `dispatch` - Receives the step if the wavetable is assigned to a parameter
    pub fn tick<D: ParameterDispatch + ?Sized>(
        &mut self,
        patch: &WtPatch,
        memory: &[u8; WT_MEMORY_SIZE],
        played_note: u8,
        ctx: &mut TickContext,
        dispatch: &mut D,
    ) {
        let reset = ctx.triggers.take(TriggerDestinations::wt_reset(self.index));
        let step_trigger = ctx.triggers.take(TriggerDestinations::wt_step(self.index));

        let step = if patch.key_controlled() {
            Some(scale_into_range(played_note & 0x7f, patch))
        } else if patch.mod_controlled() {
            let modulation = ctx.bus.destination(ModDestination::Wt(self.index as u8));
            let step = ((modulation + 0x8000) >> 9).clamp(0, 0x7f) as u8;
            Some(scale_into_range(step, patch))
        } else {
            self.sequence(patch, reset, step_trigger)
        };

        let Some(step) = step else {
            return;
        };

        let value = memory[(step & 0x7f) as usize];
        ctx.bus.set_source(ModSource::Wt(self.index as u8), decode(value));

        if patch.assign != 0 {
            let assignment = WtAssignment {
                wt: self.index as u8,
                assign: patch.assign,
                value,
                sid_select: patch.sid_select(),
            };
            log::trace!("wavetable {} step {:#04x}: {:?}", self.index, step, assignment);
            dispatch.dispatch(assignment);
        }
    }

    /// `wt.sequence(p, reset, step)` is the position to play in sequential mode, if any
    fn sequence(&mut self, patch: &WtPatch, reset: bool, step: bool) -> Option<u8> {
        if reset {
            // the next step lands on begin
            self.div_ctr = 0xff;
            self.pos = patch.begin_pos().wrapping_sub(1);
        }

        if !step {
            return None;
        }

        self.div_ctr = self.div_ctr.wrapping_add(1);
        if !(self.div_ctr == 0 || self.div_ctr > patch.divider()) {
            return None;
        }
        self.div_ctr = 0;

        if self.pos == WT_STOPPED {
            return None;
        }

        self.pos = self.pos.wrapping_add(1);
        if self.pos > patch.end_pos() {
            if patch.oneshot() {
                self.pos = WT_STOPPED;
                return None;
            }
            self.pos = patch.loop_to();
        }
        Some(self.pos)
    }

    /// `wt.position()` is the current sequencer position, [`WT_STOPPED`] once a oneshot wavetable has finished
    pub fn position(&self) -> u8 {
        self.pos
    }
}

/// `scale_into_range(s, p)` is 7 bit step `s` scaled into the `begin..=end` range of `p`
///
/// With `begin` above `end` the range is walked downwards.
fn scale_into_range(step: u8, patch: &WtPatch) -> u8 {
    let begin = patch.begin_pos() as i32;
    let end = patch.end_pos() as i32;
    let range = (end - begin).abs() + 1;
    let offset = step as i32 * range / 128;
    let pos = if end >= begin {
        begin + offset
    } else {
        begin - offset
    };
    pos as u8
}

/// `decode(v)` is the modulation value of wavetable memory byte `v`
fn decode(value: u8) -> i16 {
    if value < 0x80 {
        (value as i16 - 0x40) * 512
    } else {
        (value & 0x7f) as i16 * 256
    }
}
