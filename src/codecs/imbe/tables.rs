//! Tables and tuning constants for the IMBE codec.
//!
//! Fixed tables are Q15/Q10 constants; the window shapes are derived once at
//! first use from float prototypes and quantized to Q15.

use once_cell::sync::Lazy;

use super::ops::Word16;
use super::{FFT_SIZE, FRAME, PE_LPF_ORD, PITCH_WINDOW};

/// log2 fraction table, 33 entries of `32767 * log2(1 + i/32)` (Q15).
pub const LOG2_TABLE: [Word16; 33] = [
    0, 1455, 2866, 4236, 5568, 6863, 8124, 9352, 10549, 11716, 12855, 13967,
    15054, 16117, 17156, 18172, 19167, 20142, 21097, 22033, 22951, 23852,
    24735, 25603, 26455, 27291, 28113, 28922, 29716, 30497, 31266, 32023,
    32767,
];

/// 2^x fraction table, 33 entries of `16384 * 2^(i/32)` (Q14, last entry
/// saturated).
pub const POW2_TABLE: [Word16; 33] = [
    16384, 16743, 17109, 17484, 17867, 18258, 18658, 19066, 19484, 19911,
    20347, 20792, 21247, 21713, 22188, 22674, 23170, 23678, 24196, 24726,
    25268, 25821, 26386, 26964, 27554, 28158, 28774, 29405, 30048, 30706,
    31379, 32066, 32767,
];

/// Gain (mean log2 amplitude) quantizer: 64 levels, Q10 step.
///
/// Index 0 maps to 0.0 (unity amplitude); index 63 to just under 14 log2,
/// the full dynamic range of a 16-bit amplitude.
pub const GAIN_STEP_Q10: Word16 = 227;
/// Number of gain quantizer levels (6-bit field).
pub const GAIN_LEVELS: Word16 = 64;

/// Amplitude residual quantizer step per field width (Q10, index = width).
///
/// Width w spans +/-2.5 log2 across 2^w levels; width 0 carries nothing and
/// reconstructs as zero residual.
pub const RESIDUAL_STEP_Q10: [Word16; 7] = [0, 2560, 1280, 640, 320, 160, 80];

/// Widest residual field handed to a single harmonic.
pub const MAX_RESIDUAL_BITS: u8 = 6;

/// Amplitude prediction coefficient, 0.7 in Q15.
pub const PRED_COEF_Q15: Word16 = 22938;

/// Voicing: fraction of the tracked maximum error used as the decision
/// threshold, 0.35 in Q15.
pub const VU_THRESH_BASE_Q15: Word16 = 11469;
/// Voicing: per-frame decay of the tracked maximum error, 15/16 in Q15.
pub const VU_DECAY_Q15: Word16 = 30720;

/// Enhancement: peak gain exponent, 0.5 in Q15.
pub const ENH_GAMMA_Q15: Word16 = 16384;
/// Enhancement: log-domain gain clamp, log2(1.5) in Q10.
pub const ENH_GAIN_BOUND_Q10: Word16 = 599;

/// Pitch tracker: score ratio above which the continuity candidate wins
/// over the global best, 0.9 in Q15.
pub const PITCH_CONT_RATIO_Q15: Word16 = 29491;

/// Quarter-wave resolution sine table length (full turn).
pub const SIN_TABLE_LEN: usize = 1024;

/// Q15 sine over one full turn, indexed by the top bits of a u32 phase.
/// Built from the first quadrant and mirrored, so the quarter-wave
/// symmetries hold exactly.
pub static SIN_TABLE: Lazy<[Word16; SIN_TABLE_LEN]> = Lazy::new(|| {
    let quarter = SIN_TABLE_LEN / 4;
    let half = SIN_TABLE_LEN / 2;
    let mut t = [0; SIN_TABLE_LEN];
    for i in 0..=quarter {
        let x = (i as f64 / SIN_TABLE_LEN as f64) * std::f64::consts::TAU;
        t[i] = (x.sin() * 32767.0).round() as Word16;
    }
    for i in quarter + 1..half {
        t[i] = t[half - i];
    }
    for i in half..SIN_TABLE_LEN {
        t[i] = -t[i - half];
    }
    t
});

/// Q15 Hamming analysis window, 221 points, applied zero-phase around the
/// pitch reference point before the spectral transform.
pub static SPEECH_WINDOW: Lazy<[Word16; PITCH_WINDOW]> = Lazy::new(|| {
    let mut w = [0; PITCH_WINDOW];
    for (dst, src) in w.iter_mut().zip(apodize::hamming_iter(PITCH_WINDOW)) {
        *dst = (src * 32767.0).round() as Word16;
    }
    w
});

/// Q15 low-pass prototype for pitch estimation: 21-tap Hamming-windowed
/// sinc, 600 Hz cutoff at 8 kHz, unity DC gain before quantization.
pub static PE_LPF_COEF: Lazy<[Word16; PE_LPF_ORD]> = Lazy::new(|| {
    const CUTOFF: f64 = 600.0 / 8000.0;
    let mid = (PE_LPF_ORD - 1) as f64 / 2.0;
    let mut taps = [0.0f64; PE_LPF_ORD];
    for (n, (tap, win)) in taps
        .iter_mut()
        .zip(apodize::hamming_iter(PE_LPF_ORD))
        .enumerate()
    {
        let x = n as f64 - mid;
        let sinc = if x == 0.0 {
            1.0
        } else {
            let px = std::f64::consts::PI * 2.0 * CUTOFF * x;
            px.sin() / px
        };
        *tap = 2.0 * CUTOFF * sinc * win;
    }
    let dc: f64 = taps.iter().sum();
    let mut q = [0; PE_LPF_ORD];
    for (dst, tap) in q.iter_mut().zip(taps.iter()) {
        *dst = (tap / dc * 32767.0).round() as Word16;
    }
    q
});

/// Triangular crossfade ramp for unvoiced overlap-add, Q15, length equal to
/// the overlap tail (FFT_SIZE - FRAME samples).
pub static UV_FADE: Lazy<[Word16; FFT_SIZE - FRAME]> = Lazy::new(|| {
    let len = FFT_SIZE - FRAME;
    let mut w = [0; FFT_SIZE - FRAME];
    for (i, v) in w.iter_mut().enumerate() {
        *v = (((i as i32 + 1) << 15) / (len as i32 + 1)) as Word16;
    }
    w
});

/// Force construction of the lazily built tables so the first frame pays no
/// setup cost. Safe to call more than once.
pub fn init_tables() {
    Lazy::force(&SIN_TABLE);
    Lazy::force(&SPEECH_WINDOW);
    Lazy::force(&PE_LPF_COEF);
    Lazy::force(&UV_FADE);
    tracing::debug!("IMBE lookup tables initialized");
}
