//! # Clock and transport
//!
//! The clock turns MIDI realtime events into a normalized clock pulse which runs at 96 pulses per quarter note. Each
//! incoming MIDI clock byte (24 per quarter note) is followed by three interpolated pulses spaced evenly across the
//! measured delay between two MIDI clock bytes. When no MIDI clock is present the clock free-runs from an internal
//! tempo.
//!
//! Two divided pulses are derived from the normalized pulse: one every 6 pulses and one every 24 pulses.
//!
//! Realtime events arrive from the MIDI receive context through a [`RealtimeInbox`], the only state shared between
//! contexts. The clock drains the inbox inside a critical section once per tick.

use core::cell::Cell;

use critical_section::Mutex;
use midi_convert::midi_types::MidiMessage;

use crate::config::{ClockMode, EngineConfig};

/// MIDI realtime events the clock understands are represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeEvent {
    Clock,
    Start,
    Continue,
    Stop,
}

impl RealtimeEvent {
    /// `RealtimeEvent::from_status(b)` is the event for realtime status byte `b`, if the clock cares about it
    pub fn from_status(byte: u8) -> Option<Self> {
        match byte {
            0xf8 => Some(Self::Clock),
            0xfa => Some(Self::Start),
            0xfb => Some(Self::Continue),
            0xfc => Some(Self::Stop),
            _ => None,
        }
    }
}

impl TryFrom<MidiMessage> for RealtimeEvent {
    type Error = MidiMessage;

    fn try_from(msg: MidiMessage) -> Result<Self, Self::Error> {
        match msg {
            MidiMessage::TimingClock => Ok(Self::Clock),
            MidiMessage::Start => Ok(Self::Start),
            MidiMessage::Continue => Ok(Self::Continue),
            MidiMessage::Stop => Ok(Self::Stop),
            other => Err(other),
        }
    }
}

/// Realtime events received since the clock last looked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Pending {
    clocks: u8,
    start: bool,
    cont: bool,
    stop: bool,
}

/// Mailbox between the MIDI receive context and the tick
///
/// Meant to live in a `static` so that the MIDI receive interrupt can post into it.
pub struct RealtimeInbox {
    pending: Mutex<Cell<Pending>>,
}

impl Default for RealtimeInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeInbox {
    /// `RealtimeInbox::new()` is a new empty inbox
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(Pending {
                clocks: 0,
                start: false,
                cont: false,
                stop: false,
            })),
        }
    }

    /// `inbox.post(e)` queues realtime event `e` for the next tick
    pub fn post(&self, event: RealtimeEvent) {
        critical_section::with(|cs| {
            let cell = self.pending.borrow(cs);
            let mut p = cell.get();
            match event {
                RealtimeEvent::Clock => p.clocks = p.clocks.saturating_add(1),
                RealtimeEvent::Start => {
                    // a start cancels every clock queued before it
                    p.start = true;
                    p.clocks = 0;
                }
                RealtimeEvent::Continue => p.cont = true,
                RealtimeEvent::Stop => p.stop = true,
            }
            cell.set(p);
        });
    }

    /// `inbox.post_status(b)` queues the realtime status byte `b`, other bytes are ignored
    pub fn post_status(&self, byte: u8) {
        if let Some(event) = RealtimeEvent::from_status(byte) {
            self.post(event);
        }
    }

    /// `inbox.post_message(m)` queues MIDI message `m` if it is a realtime event the clock cares about
    pub fn post_message(&self, msg: MidiMessage) {
        if let Ok(event) = RealtimeEvent::try_from(msg) {
            self.post(event);
        }
    }

    /// `inbox.take()` is everything posted so far, leaving the inbox empty
    fn take(&self) -> Pending {
        critical_section::with(|cs| self.pending.borrow(cs).replace(Pending::default()))
    }
}

/// Transport state as seen through MIDI start/continue/stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stopped,
    Running,
}

/// Pulses produced by one clock tick, all cleared at the beginning of the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClockEvents {
    pub clk: bool,
    pub midi_start: bool,
    pub midi_continue: bool,
    pub midi_stop: bool,
}

/// A clock counter saturated at this value means that no MIDI clock was received for a long time
const INCOMING_CLK_TIMEOUT: u16 = 0xfff;

/// Normalized pulses per MIDI clock byte, the received one plus three interpolated ones
const PULSES_PER_MIDI_CLOCK: u8 = 4;

/// Normalized pulses per quarter note
const PULSES_PER_QUARTER: u64 = 24 * PULSES_PER_MIDI_CLOCK as u64;

/// The clock generator is represented here
#[derive(Debug, Clone)]
pub struct Clock {
    mode: ClockMode,
    events: ClockEvents,
    transport: Transport,
    slave: bool,

    // ticks since the last MIDI clock byte, and the delay measured between the last two
    incoming_clk_ctr: u16,
    incoming_clk_delay: u16,

    // interpolation of the three extra pulses
    sent_clk_ctr: u8,
    sent_clk_delay: u16,

    // pulses requested but not yet emitted
    clk_req_ctr: u8,

    global_clk_ctr6: u8,
    global_clk_ctr24: u8,

    // 16.16 fixed point master tempo accumulator
    master_phase: u32,
    master_increment: u32,
}

impl Clock {
    /// `Clock::new(cfg)` is a new clock configured by `cfg`
    pub fn new(config: &EngineConfig) -> Self {
        let master_increment = ((config.master_bpm.max(1) as u64 * PULSES_PER_QUARTER) << 16)
            / (60 * config.tick_rate_hz.max(1) as u64);

        Self {
            mode: config.clock_mode,
            events: ClockEvents::default(),
            transport: Transport::Stopped,
            slave: false,
            incoming_clk_ctr: u16::MAX,
            incoming_clk_delay: 0,
            sent_clk_ctr: 0,
            sent_clk_delay: 0,
            clk_req_ctr: 0,
            global_clk_ctr6: 0,
            global_clk_ctr24: 0,
            master_phase: 0,
            // at most one pulse per tick
            master_increment: master_increment.min(1 << 16) as u32,
        }
    }

    /// `clk.tick(inbox)` advances the clock by one engine tick, consuming everything posted to `inbox`
    pub fn tick(&mut self, inbox: &RealtimeInbox) {
        self.events = ClockEvents::default();

        // measures the delay between two MIDI clock bytes
        if self.incoming_clk_ctr != u16::MAX {
            self.incoming_clk_ctr += 1;
        }

        // interpolated pulses, only emitted in slave mode
        if self.sent_clk_delay > 0 {
            self.sent_clk_delay -= 1;
            if self.sent_clk_delay == 0 && self.sent_clk_ctr < PULSES_PER_MIDI_CLOCK - 1 {
                self.sent_clk_ctr += 1;
                self.clk_req_ctr = self.clk_req_ctr.saturating_add(1);
                self.sent_clk_delay = self.interpolation_delay();
            }
        }

        let pending = inbox.take();
        if pending.start {
            if self.incoming_clk_ctr > INCOMING_CLK_TIMEOUT {
                self.incoming_clk_ctr = 0;
            }
            self.clk_req_ctr = 0;
            self.sent_clk_ctr = PULSES_PER_MIDI_CLOCK - 1;
        }
        for _ in 0..pending.clocks {
            self.incoming_midi_clock();
        }

        let slave = match self.mode {
            ClockMode::Master => false,
            ClockMode::Slave => true,
            ClockMode::Auto => self.incoming_clk_ctr < INCOMING_CLK_TIMEOUT,
        };
        if slave != self.slave {
            log::debug!("clock switched to {} mode", if slave { "slave" } else { "master" });
            self.slave = slave;
        }

        if pending.start {
            log::debug!("transport start");
            self.events.midi_start = true;
            self.transport = Transport::Running;
            self.global_clk_ctr6 = 0;
            self.global_clk_ctr24 = 0;
            self.master_phase = 0;
        }
        if pending.cont {
            log::debug!("transport continue");
            self.events.midi_continue = true;
            self.transport = Transport::Running;
        }
        if pending.stop {
            log::debug!("transport stop");
            self.events.midi_stop = true;
            self.transport = Transport::Stopped;
        }

        if self.clk_req_ctr > 0 {
            // further requests are handled on the next ticks
            self.clk_req_ctr -= 1;
            self.events.clk = slave;
        } else if !slave {
            self.master_phase += self.master_increment;
            if self.master_phase >= 1 << 16 {
                self.master_phase -= 1 << 16;
                self.events.clk = true;
            }
        }

        if self.events.clk {
            self.global_clk_ctr6 += 1;
            if self.global_clk_ctr6 >= 6 {
                self.global_clk_ctr6 = 0;
                self.global_clk_ctr24 += 1;
                if self.global_clk_ctr24 >= 4 {
                    self.global_clk_ctr24 = 0;
                }
            }
        }
    }

    /// `clk.incoming_midi_clock()` takes over a new delay measurement and requests the pulses for one MIDI clock
    fn incoming_midi_clock(&mut self) {
        self.incoming_clk_delay = self.incoming_clk_ctr;
        self.incoming_clk_ctr = 0;

        // the received pulse plus whatever interpolated pulses did not make it out in time
        self.clk_req_ctr = self
            .clk_req_ctr
            .saturating_add(PULSES_PER_MIDI_CLOCK - self.sent_clk_ctr);
        self.sent_clk_ctr = 0;

        self.sent_clk_delay = self.interpolation_delay();
    }

    /// `clk.interpolation_delay()` is the number of ticks between two interpolated pulses, at least 1
    fn interpolation_delay(&self) -> u16 {
        (self.incoming_clk_delay >> 2).max(1)
    }

    /// `clk.events()` is the set of pulses produced by the most recent tick
    pub fn events(&self) -> ClockEvents {
        self.events
    }

    /// `clk.clk()` is true iff the most recent tick produced a normalized clock pulse
    pub fn clk(&self) -> bool {
        self.events.clk
    }

    /// `clk.clk6()` is true iff the most recent tick produced a pulse of the divide-by-6 output
    pub fn clk6(&self) -> bool {
        self.events.clk && self.global_clk_ctr6 == 0
    }

    /// `clk.clk24()` is true iff the most recent tick produced a pulse of the divide-by-24 output
    pub fn clk24(&self) -> bool {
        self.clk6() && self.global_clk_ctr24 == 0
    }

    /// `clk.midi_start()` is true iff a MIDI start was taken over by the most recent tick
    pub fn midi_start(&self) -> bool {
        self.events.midi_start
    }

    /// `clk.transport()` is the current transport state
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// `clk.is_slave()` is true iff the clock currently follows incoming MIDI clock
    pub fn is_slave(&self) -> bool {
        self.slave
    }
}
