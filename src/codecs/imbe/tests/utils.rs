//! IMBE Test Utilities
//!
//! Shared signal generators and measurement helpers for the IMBE test
//! modules. Everything here is deterministic so every run sees the same
//! data.

use crate::codecs::imbe::{FrameVector, ImbeVocoder, FRAME};

/// One frame of a sine wave with the given period in samples. `start` is
/// the absolute index of the first sample, so consecutive frames continue
/// the waveform seamlessly.
pub fn sine_frame(start: usize, period: f64, amp: f64) -> [i16; FRAME] {
    let mut pcm = [0i16; FRAME];
    for (n, s) in pcm.iter_mut().enumerate() {
        let t = (start + n) as f64;
        *s = (amp * (std::f64::consts::TAU * t / period).sin()) as i16;
    }
    pcm
}

/// One frame of a harmonic series: `harms` equal-amplitude partials of
/// the fundamental `1/period`, normalized to peak near `amp`. A crude but
/// effective stand-in for voiced speech.
pub fn harmonic_frame(start: usize, period: f64, harms: usize, amp: f64) -> [i16; FRAME] {
    let mut pcm = [0i16; FRAME];
    for (n, s) in pcm.iter_mut().enumerate() {
        let t = (start + n) as f64;
        let mut acc = 0.0;
        for h in 1..=harms {
            acc += (std::f64::consts::TAU * h as f64 * t / period).sin();
        }
        *s = (amp * acc / (harms as f64).sqrt()) as i16;
    }
    pcm
}

/// Root-mean-square level of a block of samples.
pub fn rms(x: &[i16]) -> f64 {
    let e: f64 = x.iter().map(|&s| s as f64 * s as f64).sum();
    (e / x.len() as f64).sqrt()
}

/// Feeds `frames` frames of a continuous sine through the encoder and
/// returns the last frame vector.
pub fn encode_tone(codec: &mut ImbeVocoder, period: f64, amp: f64, frames: usize) -> FrameVector {
    let mut fv = FrameVector::default();
    for i in 0..frames {
        fv = codec.encode_frame(&sine_frame(i * FRAME, period, amp));
    }
    fv
}
