//! # IMBE Vocoder: Fixed-Point Multi-Band Excitation Speech Codec
//!
//! This library provides a fixed-point implementation of the IMBE (Improved
//! Multi-Band Excitation) speech vocoder at 4400 bit/s. The encoder analyzes
//! 8 kHz narrowband speech into a fundamental pitch, per-band voiced/unvoiced
//! decisions, and per-harmonic spectral amplitudes; the decoder resynthesizes
//! speech from those parameters with a bank of harmonic oscillators plus
//! spectrally shaped noise.
//!
//! ## Features
//!
//! - **4400 bit/s**: each 20 ms frame of 160 samples compresses to 88 bits
//! - **Multi-band excitation**: voicing is decided per frequency band, so
//!   mixed voiced/unvoiced sounds keep their character
//! - **Fixed-point**: all signal processing uses saturating 16/32-bit
//!   arithmetic and produces identical output on every platform
//! - **Zero-copy APIs**: pre-allocated buffer variants for both directions
//!
//! ## Frame formats
//!
//! Each 20 ms frame exists in three forms:
//!
//! - 160 signed 16-bit PCM samples at 8 kHz
//! - a [`FrameVector`] of eight words holding the 88 frame bits
//! - 11 bytes of wire format, packed MSB-first
//!
//! [`ImbeVocoder::encode_frame`] and [`ImbeVocoder::decode_frame`] work on
//! frame vectors; the [`AudioCodec`] trait works on the wire format.
//!
//! ## Usage
//!
//! ```rust
//! use imbe_vocoder::{AudioCodec, ImbeVocoder};
//!
//! // Create an IMBE codec
//! let mut codec = ImbeVocoder::new();
//!
//! // Encode one frame (20ms at 8kHz)
//! let samples = vec![0i16; 160];
//! let encoded = codec.encode(&samples)?;
//! assert_eq!(encoded.len(), 11);
//!
//! // Decode back to samples
//! let decoded = codec.decode(&encoded)?;
//! assert_eq!(decoded.len(), 160);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod codecs;
pub mod error;
pub mod types;

// Re-export commonly used types and traits
pub use codecs::imbe::{FrameVector, ImbeParam, ImbeVocoder};
pub use error::{CodecError, Result};
pub use types::{AudioCodec, AudioCodecExt, CodecInfo};

/// Version information for the vocoder library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the vocoder library
///
/// This function should be called once at program startup to initialize
/// logging and the lookup tables. It's safe to call multiple times.
pub fn init() {
    // Initialize logging if not already done
    let _ = tracing_subscriber::fmt::try_init();

    // Build the lazily constructed lookup tables up front
    codecs::imbe::tables::init_tables();

    tracing::info!("IMBE vocoder v{} initialized", VERSION);
}
