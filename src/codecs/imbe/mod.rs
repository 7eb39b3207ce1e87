//! IMBE Speech Vocoder Implementation
//!
//! This module implements a fixed-point Improved Multi-Band Excitation
//! vocoder: 8 kHz PCM in 20 ms frames to a 4400 bps parametric bitstream
//! and back. Each coded frame carries a pitch period, per-band
//! voiced/unvoiced decisions and per-harmonic spectral amplitudes in
//! 88 bits (11 bytes on the wire).
//!
//! # Architecture
//!
//! The implementation is split into several modules:
//! - `codec`: High-level codec implementation
//! - `pitch`: Pitch tracking over low-passed, DC-free speech
//! - `voicing`: Per-band voiced/unvoiced classification
//! - `spectral`: Harmonic amplitude measurement and quantization
//! - `enhance`: Decoder-side spectral amplitude enhancement
//! - `voiced`/`unvoiced`: Harmonic oscillator bank and shaped-noise
//!   synthesis
//! - `transform`: Fixed-point 256-point FFT shared by both directions
//! - `bits`: Frame vector layout and 11-byte wire packing
//! - `ops`: Saturating 16/32-bit basic operators
//! - `tables`: Sine/window/filter tables and quantizer constants
//! - `state`: State management structures
//!
//! All arithmetic saturates rather than wraps, so every state variable
//! stays inside its nominal Q format no matter the input.

pub mod bits;
pub mod codec;
pub mod enhance;
pub mod ops;
pub mod pitch;
pub mod spectral;
pub mod state;
pub mod tables;
pub mod transform;
pub mod unvoiced;
pub mod voiced;
pub mod voicing;

#[cfg(test)]
mod tests;

// Re-export the main codec struct
pub use codec::ImbeVocoder;

// Re-export key types
pub use bits::{FrameVector, FRAME_BITS, FRAME_BYTES};
pub use state::{ImbeParam, ImbeState};

/// Samples per 20 ms frame at 8 kHz.
pub const FRAME: usize = 160;

/// Size of the analysis transform.
pub const FFT_SIZE: usize = 256;

/// Most harmonics a frame can carry (longest pitch).
pub const NUM_HARMS_MAX: usize = 56;

/// Fewest harmonics a frame can carry (shortest pitch).
pub const NUM_HARMS_MIN: usize = 9;

/// Most voicing bands a frame can carry.
pub const NUM_BANDS_MAX: usize = 12;

/// Speech history kept for pitch estimation and spectral analysis:
/// the current frame plus 141 samples of look-back.
pub const PITCH_EST_FRAME: usize = 301;

/// Taps in the pitch-estimation low-pass prefilter.
pub const PE_LPF_ORD: usize = 21;

/// Length of the spectral analysis window.
pub const PITCH_WINDOW: usize = 221;
