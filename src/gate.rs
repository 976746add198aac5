//! # Voice gate
//!
//! The gate of a chip voice starts and stops the chip's own envelope. Requests to set or clear the gate are collected
//! between ticks and committed by [`Gate::tick`]:
//!
//! - The most recent request wins, a clear request also cancels a delayed set which is still pending
//! - A set request may be delayed, the pitch of the voice is frozen while the delay is pending
//! - With a non-zero oscillator phase the oscillator is held in test mode for one tick at a reference frequency
//!   which depends on the voice, so that the oscillators of all voices restart with a fixed phase offset
//!
//! A voice whose waveform is switched off has its gate cleared and no set request is committed until it is switched
//! on again.

use crate::{
    delay::{DelayCounter, GATE_DELAY_LIMIT},
    lookup_tables,
    patch::VoicePatch,
    registers::{SidVoiceRegs, VOICES_PER_CHIP},
    utils::scaled_rate,
};

/// Chip frequency of roughly 1kHz, used as the oscillator sync reference
const OSC_SYNC_REFERENCE_FRQ: u32 = 16779;

/// Minimum gate delay while the ADSR bug workaround is active
const ABW_MIN_DELAY: u8 = 25;

/// What the pitch stage of a voice may do after the gate was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchUpdate {
    /// Update the pitch as usual
    Update,
    /// Leave the frequency register alone this tick
    Hold,
    /// Leave the frequency register alone this tick and rewrite it on the next one
    Rewrite,
}

/// The gate state of one voice is represented here
#[derive(Debug, Clone, Default)]
pub struct Gate {
    active: bool,
    set_req: bool,
    clr_req: bool,
    osc_sync_in_progress: bool,
    voice_active: bool,
    voice_disabled: bool,
    delay: DelayCounter,
}

impl Gate {
    /// `Gate::new()` is a new inactive gate
    pub fn new() -> Self {
        Self::default()
    }

    /// `g.request_set()` asks for the gate to be set on the next tick, cancelling a clear request
    pub fn request_set(&mut self) {
        self.clr_req = false;
        self.set_req = true;
    }

    /// `g.request_clear()` asks for the gate to be cleared, cancelling a set request which was not committed yet
    pub fn request_clear(&mut self) {
        self.set_req = false;
        self.clr_req = true;
        self.delay.arm(false);
    }

    /// `g.cancel_clear()` drops a clear request which was not committed yet
    pub fn cancel_clear(&mut self) {
        self.clr_req = false;
    }

    /// `g.restart(p, abw, regs)` retriggers the gate for a new note
    ///
    /// The gate is cleared first and set again on the following tick, after the delay of `p` if there is one. With
    /// the ADSR bug workaround the chip envelope registers are zeroed so that the chip envelope fully releases.
    pub fn restart(&mut self, patch: &VoicePatch, adsr_bug_workaround: bool, regs: &mut SidVoiceRegs) {
        self.clr_req = true;
        if self.voice_active {
            self.set_req = true;
        }

        self.delay.arm(patch.delay != 0 || adsr_bug_workaround);
        if adsr_bug_workaround {
            regs.ad = 0;
            regs.sr = 0;
        }
    }

    /// `g.tick(p, osc_phase, abw, voice, regs, sf)` commits pending requests to the gate register of `regs`
    pub fn tick(
        &mut self,
        patch: &VoicePatch,
        osc_phase: u8,
        adsr_bug_workaround: bool,
        voice: usize,
        regs: &mut SidVoiceRegs,
        speed_factor: u8,
    ) -> PitchUpdate {
        let mut update = PitchUpdate::Update;
        let off = patch.waveform.off;

        if self.voice_disabled {
            if !off {
                self.voice_disabled = false;
                if self.voice_active {
                    self.set_req = true;
                }
            }
        } else if off {
            self.voice_disabled = true;
            self.set_req = false;
            self.clr_req = true;
        }

        // nothing to clear
        if !self.active {
            self.clr_req = false;
        }

        if self.clr_req {
            self.clr_req = false;
            if !patch.gate_stays_active {
                regs.gate = false;
            }
            self.active = false;
        } else if self.set_req || self.osc_sync_in_progress {
            if !off {
                if self.delay.is_pending() {
                    let mut delay = patch.delay;
                    if adsr_bug_workaround {
                        delay = delay.saturating_add(ABW_MIN_DELAY);
                    }
                    let inc = scaled_rate(lookup_tables::ENV_TABLE[delay as usize], speed_factor);
                    if self.delay.tick(inc, GATE_DELAY_LIMIT) {
                        update = PitchUpdate::Hold;
                    }
                } else {
                    self.set_req = false;

                    if adsr_bug_workaround {
                        regs.ad = patch.ad;
                        regs.sr = patch.sr;
                    }

                    if !self.osc_sync_in_progress && osc_phase != 0 {
                        self.osc_sync_in_progress = true;
                        regs.test = true;
                        regs.set_frequency(osc_sync_frequency(voice, osc_phase));
                        update = PitchUpdate::Hold;
                    } else if regs.test {
                        regs.test = false;
                        update = PitchUpdate::Rewrite;
                    } else {
                        regs.gate = true;
                        self.osc_sync_in_progress = false;
                    }
                }
            }
            self.active = true;
        }

        update
    }

    /// `g.set_voice_active(a)` marks whether keys are held on the voice
    pub fn set_voice_active(&mut self, active: bool) {
        self.voice_active = active;
    }

    /// `g.voice_active()` is true iff keys are held on the voice
    pub fn voice_active(&self) -> bool {
        self.voice_active
    }

    /// `g.is_active()` is true iff the gate is set or about to be set
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// `g.is_delay_pending()` is true while a delayed set request is waiting
    pub fn is_delay_pending(&self) -> bool {
        self.delay.is_pending()
    }
}

/// `osc_sync_frequency(v, p)` is the test mode frequency of voice `v` for oscillator phase `p`
fn osc_sync_frequency(voice: usize, osc_phase: u8) -> u16 {
    let frq = match voice % VOICES_PER_CHIP {
        1 => OSC_SYNC_REFERENCE_FRQ * (1000 + 4 * osc_phase as u32) / 1000,
        2 => OSC_SYNC_REFERENCE_FRQ * (1000 + 8 * osc_phase as u32) / 1000,
        _ => OSC_SYNC_REFERENCE_FRQ,
    };
    frq.min(u16::MAX as u32) as u16
}
