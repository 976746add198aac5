//! Errors reported by the public configuration and control API
//!
//! The per-tick path never fails, every accumulation saturates and every table index is clamped.

use thiserror::Error;

/// Everything that can go wrong outside the tick path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("speed factor must be at least 1")]
    ZeroSpeedFactor,

    #[error("tick rate must be at least 1 Hz")]
    ZeroTickRate,

    #[error("master tempo must be at least 1 BPM")]
    ZeroTempo,

    #[error("filter calibration minimum {min} is above its maximum {max}")]
    InvertedCalibration { min: u16, max: u16 },

    #[error("{kind} index {index} is out of range, only {count} available")]
    UnitOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },
}

/// Result type used throughout the engine's public API
pub type Result<T> = core::result::Result<T, Error>;

/// `check_index(kind, i, n)` is `Ok(i)` iff `i < n`
pub(crate) fn check_index(kind: &'static str, index: usize, count: usize) -> Result<usize> {
    if index < count {
        Ok(index)
    } else {
        Err(Error::UnitOutOfRange { kind, index, count })
    }
}
