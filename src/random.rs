/// A tiny xorshift32 pseudo random generator, cheap enough for the tick path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Random {
    state: u32,
}

impl Random {
    /// `Random::new(s)` is a new generator seeded with `s`, a zero seed is replaced since xorshift sticks at zero
    pub const fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x2545_f491 } else { seed },
        }
    }

    /// `rng.next_u32()` is the next raw 32 bit value
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// `rng.gen_range(lo, hi)` is a value in `[lo, hi]`, inclusive
    pub fn gen_range(&mut self, lo: u16, hi: u16) -> u16 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo) as u32 + 1;
        lo + (self.next_u32() % span) as u16
    }
}
