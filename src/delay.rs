//! # Start delay
//!
//! Gates, LFOs and envelopes may hold off for a while after being (re)started. The delay is a 16 bit counter which is
//! armed at 1 and climbs by a curve-table derived increment every tick until it runs past its limit.

/// Gate delays end once the counter would reach 0xffff
pub const GATE_DELAY_LIMIT: u32 = 0xffff;

/// LFO and envelope delays end once the counter would exceed 0xffff
pub const MOD_DELAY_LIMIT: u32 = 0x1_0000;

/// A start delay counter is represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayCounter {
    ctr: u16,
}

impl DelayCounter {
    /// `DelayCounter::new()` is a new delay counter which is not pending
    pub const fn new() -> Self {
        Self { ctr: 0 }
    }

    /// `dc.arm(e)` starts a new delay iff `e`, otherwise cancels any delay
    pub fn arm(&mut self, enabled: bool) {
        self.ctr = enabled as u16;
    }

    /// `dc.is_pending()` is true while the delay has not yet passed
    pub fn is_pending(&self) -> bool {
        self.ctr != 0
    }

    /// `dc.tick(inc, limit)` advances a pending delay and is true iff it is still pending afterwards
    ///
    /// The delay passes on the tick where the counter would reach `limit`.
    pub fn tick(&mut self, increment: u16, limit: u32) -> bool {
        if self.ctr == 0 {
            return false;
        }

        let next = self.ctr as u32 + increment as u32;
        if next >= limit {
            self.ctr = 0;
            false
        } else {
            self.ctr = next as u16;
            true
        }
    }

    /// `dc.value()` is the raw counter value
    #[cfg(test)]
    pub fn value(&self) -> u16 {
        self.ctr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_delay_is_never_pending() {
        let mut dc = DelayCounter::new();
        assert!(!dc.tick(1000, MOD_DELAY_LIMIT));
        assert!(!dc.is_pending());
    }

    #[test]
    fn armed_delay_passes_after_enough_ticks() {
        let mut dc = DelayCounter::new();
        dc.arm(true);

        // 1 + 3 * 0x5555 = 0xffff, still below the modulation limit
        for _ in 0..3 {
            assert!(dc.tick(0x5555, MOD_DELAY_LIMIT));
        }
        assert_eq!(dc.value(), 0xffff);
        assert!(!dc.tick(0x5555, MOD_DELAY_LIMIT));
        assert!(!dc.is_pending());
    }

    #[test]
    fn gate_limit_is_one_lower() {
        let mut dc = DelayCounter::new();
        dc.arm(true);
        for _ in 0..2 {
            assert!(dc.tick(0x5555, GATE_DELAY_LIMIT));
        }
        // reaching exactly 0xffff ends a gate delay
        assert!(!dc.tick(0x5555, GATE_DELAY_LIMIT));
    }

    #[test]
    fn arm_false_cancels() {
        let mut dc = DelayCounter::new();
        dc.arm(true);
        dc.arm(false);
        assert!(!dc.is_pending());
    }
}
