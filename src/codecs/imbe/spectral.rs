//! Spectral amplitude analysis, quantization and reconstruction.
//!
//! Amplitudes live in the log2 domain (Q10) end to end. The encoder
//! measures one amplitude per harmonic from the windowed analysis spectrum,
//! removes the quantized frame gain and a scaled prediction from the
//! previous frame's reconstruction, and sends the residual through uniform
//! quantizers whose widths come from a deterministic bit allocation. The
//! decoder mirrors every step from its own copy of the reconstruction
//! history, so encoder and decoder log-amplitude memories never drift.

use num_complex::Complex;

use super::bits::FRAME_BITS;
use super::ops::{log2_fx, mult, pow2_fx, saturate, Word16, Word32};
use super::state::{bands_for, DecoderState, EncoderState};
use super::tables::{
    GAIN_LEVELS, GAIN_STEP_Q10, MAX_RESIDUAL_BITS, PRED_COEF_Q15, RESIDUAL_STEP_Q10,
    SPEECH_WINDOW,
};
use super::transform::{fft, Cmplx16, CZERO};
use super::voicing::{harmonic_center_q8, harmonic_spacing_q8};
use super::{FFT_SIZE, NUM_HARMS_MAX, PITCH_WINDOW};

/// Log2-domain compensation for the analysis window energy and transform
/// scaling, Q10. Maps measured region energy onto harmonic amplitude in
/// PCM units.
const SA_COMP_Q10: Word16 = 1813;

/// First history sample under the analysis window.
const WINDOW_BASE: usize = 40;
/// History sample under the window center (maps to FFT index zero).
const WINDOW_CENTER: usize = 110;

/// Quantized amplitude data of one frame: the gain index, one residual
/// index per harmonic, and the allocation that gives each index its width.
#[derive(Debug, Clone)]
pub struct AmplitudeCode {
    /// 6-bit frame gain index.
    pub gain_idx: u16,
    /// Residual quantizer index per harmonic.
    pub resid_idx: [u16; NUM_HARMS_MAX],
    /// Residual bits assigned to each harmonic.
    pub alloc: [u8; NUM_HARMS_MAX],
}

impl Default for AmplitudeCode {
    fn default() -> Self {
        AmplitudeCode {
            gain_idx: 0,
            resid_idx: [0; NUM_HARMS_MAX],
            alloc: [0; NUM_HARMS_MAX],
        }
    }
}

/// Windowed zero-phase spectrum of the current analysis frame. The window
/// center goes to FFT index 0 with the negative half wrapped to the top,
/// so harmonic peaks come out (approximately) real-valued.
pub fn analysis_spectrum(enc: &EncoderState) -> [Cmplx16; FFT_SIZE] {
    let mut buf = [CZERO; FFT_SIZE];
    for i in 0..PITCH_WINDOW {
        let v = mult(enc.pitch_ref_buf[WINDOW_BASE + i], SPEECH_WINDOW[i]);
        let idx = (i + FFT_SIZE - WINDOW_CENTER) & (FFT_SIZE - 1);
        buf[idx] = Complex { re: v, im: 0 };
    }
    fft(&mut buf);
    buf
}

/// Deterministic residual bit allocation. The amplitude budget is what the
/// frame has left after pitch, voicing and gain; bits go one at a time to
/// the harmonic with the lowest weighted fill level (voiced harmonics
/// weigh 3, unvoiced 2, ties to the lowest harmonic), capped per harmonic.
pub fn allocate_bits(num_harms: usize, voiced: &[bool; NUM_HARMS_MAX]) -> [u8; NUM_HARMS_MAX] {
    let budget = FRAME_BITS - 8 - 6 - bands_for(num_harms);
    let mut alloc = [0u8; NUM_HARMS_MAX];
    for _ in 0..budget {
        let mut pick = None;
        let mut best_key = u32::MAX;
        for l in 0..num_harms {
            if alloc[l] >= MAX_RESIDUAL_BITS {
                continue;
            }
            // alloc/weight compared via alloc * (24 / weight), exact for
            // weights 2 and 3.
            let key = alloc[l] as u32 * if voiced[l] { 8 } else { 12 };
            if key < best_key {
                best_key = key;
                pick = Some(l);
            }
        }
        match pick {
            Some(l) => alloc[l] += 1,
            None => break,
        }
    }
    alloc
}

/// Log2 amplitude of each harmonic measured from the analysis spectrum,
/// Q10. The spectral region of harmonic `l` is the half-open bin interval
/// within half a harmonic spacing of its center.
fn measure_log_amps(
    spectrum: &[Cmplx16; FFT_SIZE],
    fund_freq: u32,
    num_harms: usize,
) -> [Word16; NUM_HARMS_MAX] {
    let spacing = harmonic_spacing_q8(fund_freq);
    let mut out = [0; NUM_HARMS_MAX];
    for l in 1..=num_harms {
        let center = harmonic_center_q8(fund_freq, l);
        let lo = center - spacing / 2;
        let hi = center + spacing / 2;
        let mut energy: i64 = 0;
        for b in 1..FFT_SIZE / 2 {
            let pos = (b as i64) << 8;
            if pos >= lo && pos < hi {
                let c = spectrum[b];
                energy += c.re as i64 * c.re as i64 + c.im as i64 * c.im as i64;
            }
        }
        // log2 of a 64-bit energy via shift-out: log2(e) = log2(e >> s) + s.
        let mut e = energy.max(1);
        let mut shift: i32 = 0;
        while e > Word32::MAX as i64 {
            e >>= 1;
            shift += 1;
        }
        let log2_e = log2_fx(e as Word32) as i32 + (shift << 10);
        out[l - 1] = saturate((log2_e >> 1) + SA_COMP_Q10 as i32);
    }
    out
}

/// Mean of the first `n` log amplitudes, Q10.
fn mean_log_amp(log_amps: &[Word16; NUM_HARMS_MAX], n: usize) -> Word16 {
    let sum: i32 = log_amps[..n].iter().map(|&a| a as i32).sum();
    (sum / n as i32) as Word16
}

/// Prediction for harmonic `l` (1-based) of an `num_harms`-harmonic frame
/// from the previous reconstruction: the previous log amplitude at the
/// proportionally nearest harmonic, mean-removed, scaled by the prediction
/// coefficient.
fn predict(
    prev: &[Word16; NUM_HARMS_MAX],
    prev_num_harms: usize,
    prev_mean: Word16,
    l: usize,
    num_harms: usize,
) -> Word16 {
    let lp = ((l * prev_num_harms + num_harms / 2) / num_harms).clamp(1, prev_num_harms);
    mult(PRED_COEF_Q15, saturate(prev[lp - 1] as i32 - prev_mean as i32))
}

/// Uniform residual quantizer index for `width` bits; cells are symmetric
/// around zero and out-of-range residuals clamp to the end cells.
fn quantize_residual(resid: i32, width: u8) -> u16 {
    let step = RESIDUAL_STEP_Q10[width as usize] as i32;
    let half = 1i32 << (width - 1);
    (resid.div_euclid(step) + half).clamp(0, (1 << width) - 1) as u16
}

/// Cell midpoint of a residual index, Q10. Indices beyond the width clamp,
/// matching the decoder's out-of-range policy.
fn residual_value(idx: u16, width: u8) -> i32 {
    if width == 0 {
        return 0;
    }
    let step = RESIDUAL_STEP_Q10[width as usize] as i32;
    let half = 1i32 << (width - 1);
    let idx = (idx as i32).min((1 << width) - 1);
    (idx - half) * step + step / 2
}

/// Reconstructs log amplitudes from quantized data against a given
/// previous-frame history. Shared verbatim by both codec directions.
fn reconstruct(
    code: &AmplitudeCode,
    num_harms: usize,
    prev: &[Word16; NUM_HARMS_MAX],
    prev_num_harms: usize,
) -> [Word16; NUM_HARMS_MAX] {
    let gain = code.gain_idx.min(GAIN_LEVELS as u16 - 1) as i32 * GAIN_STEP_Q10 as i32;
    let prev_mean = mean_log_amp(prev, prev_num_harms);
    let mut recon = [0; NUM_HARMS_MAX];
    for l in 1..=num_harms {
        let pred = predict(prev, prev_num_harms, prev_mean, l, num_harms);
        let resid = residual_value(code.resid_idx[l - 1], code.alloc[l - 1]);
        recon[l - 1] = saturate(gain + pred as i32 + resid);
    }
    recon
}

/// Linear amplitudes from log2 amplitudes, saturating at full scale.
pub fn linear_amps(
    log_amps: &[Word16; NUM_HARMS_MAX],
    num_harms: usize,
) -> [Word16; NUM_HARMS_MAX] {
    let mut out = [0; NUM_HARMS_MAX];
    for l in 0..num_harms {
        out[l] = saturate(pow2_fx(log_amps[l]));
    }
    out
}

/// Encoder side: measures, quantizes, and rotates the prediction history
/// to this frame's reconstruction. Returns the quantized code plus the
/// reconstructed log and linear amplitudes for the parameter view.
pub fn encode_amplitudes(
    enc: &mut EncoderState,
    spectrum: &[Cmplx16; FFT_SIZE],
    fund_freq: u32,
    num_harms: usize,
    voiced: &[bool; NUM_HARMS_MAX],
) -> (AmplitudeCode, [Word16; NUM_HARMS_MAX], [Word16; NUM_HARMS_MAX]) {
    let measured = measure_log_amps(spectrum, fund_freq, num_harms);

    let mean = mean_log_amp(&measured, num_harms);
    let gain_idx = (mean as i32 / GAIN_STEP_Q10 as i32).clamp(0, GAIN_LEVELS as i32 - 1) as u16;
    let gain = gain_idx as i32 * GAIN_STEP_Q10 as i32;

    let alloc = allocate_bits(num_harms, voiced);
    let prev_mean = mean_log_amp(&enc.prev_log2_sa, enc.prev_log2_harms);

    let mut code = AmplitudeCode {
        gain_idx,
        resid_idx: [0; NUM_HARMS_MAX],
        alloc,
    };
    for l in 1..=num_harms {
        let pred = predict(&enc.prev_log2_sa, enc.prev_log2_harms, prev_mean, l, num_harms);
        let resid = measured[l - 1] as i32 - gain - pred as i32;
        if alloc[l - 1] > 0 {
            code.resid_idx[l - 1] = quantize_residual(resid, alloc[l - 1]);
        }
    }

    let recon = reconstruct(&code, num_harms, &enc.prev_log2_sa, enc.prev_log2_harms);
    enc.prev_log2_sa = recon;
    enc.prev_log2_harms = num_harms;

    let sa = linear_amps(&recon, num_harms);
    (code, recon, sa)
}

/// Decoder side: reconstructs from quantized data and rotates the decoder's
/// own prediction history.
pub fn decode_amplitudes(
    dec: &mut DecoderState,
    code: &AmplitudeCode,
    num_harms: usize,
) -> [Word16; NUM_HARMS_MAX] {
    let recon = reconstruct(code, num_harms, &dec.prev_log2_sa, dec.prev_log2_harms);
    dec.prev_log2_sa = recon;
    dec.prev_log2_harms = num_harms;
    recon
}
