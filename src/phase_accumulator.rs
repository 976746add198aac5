/// A 16 bit phase accumulator is represented here
///
/// One full cycle spans the whole `u16` range, the two top bits select the quadrant of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseAccumulator {
    accumulator: u16,
}

impl PhaseAccumulator {
    /// `PhaseAccumulator::new()` is a new phase accumulator at phase zero
    pub const fn new() -> Self {
        Self { accumulator: 0 }
    }

    /// `pa.advance(inc, hold)` advances the accumulator by `inc` and is true iff it rolled over into a new cycle
    ///
    /// When `hold` is true a roll-over parks the accumulator at the end of the cycle instead of wrapping.
    pub fn advance(&mut self, increment: u16, hold: bool) -> bool {
        match self.accumulator.checked_add(increment) {
            Some(next) => {
                self.accumulator = next;
                false
            }
            None if hold => {
                self.accumulator = u16::MAX;
                true
            }
            None => {
                self.accumulator = self.accumulator.wrapping_add(increment);
                true
            }
        }
    }

    /// `pa.set_phase(p)` moves the accumulator to the 8 bit phase `p`, where 0x80 is half a cycle
    pub fn set_phase(&mut self, phase: u8) {
        self.accumulator = (phase as u16) << 8;
    }

    /// `pa.park()` parks the accumulator at the very end of the cycle
    pub fn park(&mut self) {
        self.accumulator = u16::MAX;
    }

    /// `pa.value()` is the raw accumulator value
    pub fn value(&self) -> u16 {
        self.accumulator
    }

    /// `pa.set_value(v)` sets the raw accumulator value
    #[cfg(test)]
    pub fn set_value(&mut self, value: u16) {
        self.accumulator = value;
    }
}
