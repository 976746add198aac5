/// `linear_interp(y0, y1, frac, bits)` is integer linear interpolation of `y0` and `y1`
///
/// # Arguments:
///
/// * `y0`, `y1` - The two y-values, a straight line can be drawn through these with an x-distance of `1 << bits`
///
/// * `frac` - The fractional x-distance, in `[0, 1 << bits)`
///
/// * `bits` - The number of fractional bits in `frac`
pub fn linear_interp(y0: i32, y1: i32, frac: i32, bits: u32) -> i32 {
    y0 + (((y1 - y0) * frac) >> bits)
}

/// `saturate_u16(v)` is `v` clamped into `[0, 0xffff]`
pub fn saturate_u16(v: i32) -> u16 {
    v.clamp(0, 0xffff) as u16
}

/// `saturate_u12(v)` is `v` clamped into `[0, 0xfff]`
pub fn saturate_u12(v: i32) -> u16 {
    v.clamp(0, 0xfff) as u16
}

/// `saturate_i16(v)` is `v` clamped into the signed 16 bit range
pub fn saturate_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// `scaled_rate(r, sf)` is the table rate `r` divided by the global speed factor `sf`
///
/// Never less than 1 so that every counter driven by a rate keeps moving.
pub fn scaled_rate(rate: u16, speed_factor: u8) -> u16 {
    (rate / speed_factor.max(1) as u16).max(1)
}

/// `fold_octaves(n, lo, hi)` moves note `n` by whole octaves until it lies in `[lo, hi)`
pub fn fold_octaves(note: i32, lo: i32, hi: i32) -> i32 {
    debug_assert!(hi - lo >= 12);
    let mut note = note;
    while note < lo {
        note += 12;
    }
    while note >= hi {
        note -= 12;
    }
    note
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_interp_endpoints() {
        assert_eq!(linear_interp(0, 512, 0, 9), 0);
        assert_eq!(linear_interp(0, 512, 511, 9), 511);
    }

    #[test]
    fn lin_interp_halfway() {
        assert_eq!(linear_interp(100, 300, 256, 9), 200);
    }

    #[test]
    fn lin_interp_falling_line() {
        assert_eq!(linear_interp(300, 100, 256, 9), 200);
    }

    #[test]
    fn saturation_clamps_both_ends() {
        assert_eq!(saturate_u16(-5), 0);
        assert_eq!(saturate_u16(0x1_0000), 0xffff);
        assert_eq!(saturate_u12(0x1000), 0xfff);
        assert_eq!(saturate_i16(40_000), i16::MAX);
        assert_eq!(saturate_i16(-40_000), i16::MIN);
    }

    #[test]
    fn scaled_rate_never_stalls() {
        assert_eq!(scaled_rate(1, 2), 1);
        assert_eq!(scaled_rate(0xffff, 2), 0x7fff);
        assert_eq!(scaled_rate(100, 0), 100);
    }

    #[test]
    fn folding_keeps_pitch_class() {
        assert_eq!(fold_octaves(-1, 0, 128), 11);
        assert_eq!(fold_octaves(130, 0, 128), 118);
        assert_eq!(fold_octaves(0x6c, 0, 0x6c), 0x6c - 12);
    }
}
