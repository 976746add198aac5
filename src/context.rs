use crate::{clock::Clock, modulation::ModBus, triggers::TriggerVector, utils::scaled_rate};

/// Shared state handed to every unit for one tick
///
/// Units own their counters, everything they share with other units comes in through here.
pub struct TickContext<'a> {
    pub speed_factor: u8,
    pub clock: &'a Clock,
    pub bus: &'a mut ModBus,
    pub triggers: &'a mut TriggerVector,
}

impl TickContext<'_> {
    /// `ctx.rate(r)` is table rate `r` scaled by the global speed factor
    pub fn rate(&self, table_value: u16) -> u16 {
        scaled_rate(table_value, self.speed_factor)
    }

    /// `ctx.sync_pulse()` is true on the clock pulses which advance clock synced generators
    pub fn sync_pulse(&self) -> bool {
        self.clock.clk6()
    }
}
