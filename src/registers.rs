//! # Chip registers
//!
//! Register shaped output of the engine. Field widths and splits follow the sound chip's register map, and
//! [`SidChip::to_bytes`] produces the 25 write-only registers in chip order, ready for a bus driver.

/// Number of voices per physical chip
pub const VOICES_PER_CHIP: usize = 3;

/// Number of write-only registers of one chip
pub const NUM_REGISTERS: usize = 25;

/// The registers of one chip voice are represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidVoiceRegs {
    pub frq_l: u8,
    pub frq_h: u8,
    pub pw_l: u8,
    /// Upper 4 bits of the pulse width
    pub pw_h: u8,
    pub gate: bool,
    pub sync: bool,
    pub ring: bool,
    pub test: bool,
    pub triangle: bool,
    pub saw: bool,
    pub pulse: bool,
    pub noise: bool,
    pub ad: u8,
    pub sr: u8,
}

impl SidVoiceRegs {
    /// `v.set_frequency(f)` splits the 16 bit frequency `f` into its two registers
    pub fn set_frequency(&mut self, frq: u16) {
        self.frq_l = (frq & 0xff) as u8;
        self.frq_h = (frq >> 8) as u8;
    }

    /// `v.frequency()` is the 16 bit frequency
    pub fn frequency(&self) -> u16 {
        ((self.frq_h as u16) << 8) | self.frq_l as u16
    }

    /// `v.set_pulsewidth(pw)` splits the 12 bit pulse width `pw` into its two registers
    pub fn set_pulsewidth(&mut self, pw: u16) {
        self.pw_l = (pw & 0xff) as u8;
        self.pw_h = ((pw >> 8) & 0x0f) as u8;
    }

    /// `v.pulsewidth()` is the 12 bit pulse width
    pub fn pulsewidth(&self) -> u16 {
        ((self.pw_h as u16) << 8) | self.pw_l as u16
    }

    /// `v.control()` is the control register byte
    pub fn control(&self) -> u8 {
        (self.gate as u8)
            | (self.sync as u8) << 1
            | (self.ring as u8) << 2
            | (self.test as u8) << 3
            | (self.triangle as u8) << 4
            | (self.saw as u8) << 5
            | (self.pulse as u8) << 6
            | (self.noise as u8) << 7
    }
}

/// The registers of one physical chip are represented here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SidChip {
    pub voices: [SidVoiceRegs; VOICES_PER_CHIP],
    /// Lower 3 bits of the 11 bit cutoff
    pub filter_l: u8,
    /// Upper 8 bits of the 11 bit cutoff
    pub filter_h: u8,
    pub resonance: u8,
    /// Voice routing into the filter
    pub filter_select: u8,
    pub filter_mode: u8,
    pub volume: u8,
}

impl SidChip {
    /// `chip.to_bytes()` is the register file in chip order
    pub fn to_bytes(&self) -> [u8; NUM_REGISTERS] {
        let mut regs = [0; NUM_REGISTERS];
        for (v, chunk) in self.voices.iter().zip(regs.chunks_exact_mut(7)) {
            chunk.copy_from_slice(&[v.frq_l, v.frq_h, v.pw_l, v.pw_h & 0x0f, v.control(), v.ad, v.sr]);
        }
        regs[21] = self.filter_l & 0x07;
        regs[22] = self.filter_h;
        regs[23] = (self.resonance & 0x0f) << 4 | (self.filter_select & 0x0f);
        regs[24] = (self.filter_mode & 0x0f) << 4 | (self.volume & 0x0f);
        regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_splits_into_two_bytes() {
        let mut v = SidVoiceRegs::default();
        v.set_frequency(0x1234);
        assert_eq!((v.frq_l, v.frq_h), (0x34, 0x12));
        assert_eq!(v.frequency(), 0x1234);
    }

    #[test]
    fn pulsewidth_keeps_12_bits() {
        let mut v = SidVoiceRegs::default();
        v.set_pulsewidth(0xfabc);
        assert_eq!((v.pw_l, v.pw_h), (0xbc, 0x0a));
    }

    #[test]
    fn control_register_bit_order() {
        let v = SidVoiceRegs {
            gate: true,
            test: true,
            pulse: true,
            ..Default::default()
        };
        assert_eq!(v.control(), 0b0100_1001);
    }

    #[test]
    fn register_map_layout() {
        let mut chip = SidChip::default();
        chip.voices[1].set_frequency(0xbeef);
        chip.voices[2].sr = 0x5a;
        chip.filter_l = 0x05;
        chip.filter_h = 0x99;
        chip.resonance = 0xc;
        chip.filter_select = 0x3;
        chip.filter_mode = 0x1;
        chip.volume = 0xf;

        let regs = chip.to_bytes();
        assert_eq!(regs[7], 0xef);
        assert_eq!(regs[8], 0xbe);
        assert_eq!(regs[20], 0x5a);
        assert_eq!(regs[21], 0x05);
        assert_eq!(regs[22], 0x99);
        assert_eq!(regs[23], 0xc3);
        assert_eq!(regs[24], 0x1f);
    }
}
