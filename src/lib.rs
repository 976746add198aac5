#![no_std]
#![doc = include_str!("../README.md")]

pub mod arpeggiator;
pub mod clock;
pub mod config;
pub mod context;
mod delay;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod filter;
pub mod gate;
pub mod glide;
pub mod lfo;
mod lookup_tables;
pub mod modulation;
pub mod note_stack;
pub mod patch;
mod phase_accumulator;
mod random;
pub mod registers;
pub mod triggers;
mod utils;
pub mod voice;
pub mod wavetable;

pub use clock::{RealtimeEvent, RealtimeInbox};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use patch::Patch;
pub use registers::SidChip;
pub use wavetable::{ParameterDispatch, WtAssignment};

/// Number of synth voices, spread over the chips three at a time
pub const NUM_VOICES: usize = 6;

/// Number of physical chips
pub const NUM_CHIPS: usize = NUM_VOICES / registers::VOICES_PER_CHIP;

/// Number of filter units, one per chip
pub const NUM_FILTERS: usize = NUM_CHIPS;

/// Number of LFOs
pub const NUM_LFO: usize = 6;

/// Number of envelopes
pub const NUM_ENV: usize = 2;

/// Number of wavetable sequencers
pub const NUM_WT: usize = 4;

/// Bytes of wavetable memory shared by all wavetables
pub const WT_MEMORY_SIZE: usize = 128;

/// Maximum number of notes held per voice
pub const NOTE_STACK_SIZE: usize = 10;
