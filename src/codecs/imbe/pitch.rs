//! Pitch track: history conditioning and the pitch estimator.
//!
//! Each encode call first appends the new frame to the two 301-sample
//! histories (DC-removed reference signal and its low-passed copy), then
//! searches the low-passed history for the pitch period. The search is a
//! normalized autocorrelation over integer lags with parabolic refinement
//! to quarter-sample resolution, followed by a continuity rule that keeps
//! the track from jumping octaves between frames.

use super::ops::{l_mac, l_mult, l_shl, round, sub, Word16, Word32};
use super::state::EncoderState;
use super::tables::{PE_LPF_COEF, PITCH_CONT_RATIO_Q15};
use super::{FRAME, PITCH_EST_FRAME};

/// Shortest / longest pitch period searched, in whole samples.
const LAG_MIN: usize = 21;
const LAG_MAX: usize = 122;

/// Start of the correlation window inside the history buffers; every
/// window sample can look back a full `LAG_MAX` without underrunning.
const CORR_START: usize = PITCH_EST_FRAME - LAG_MAX;
const HISTORY_KEEP: usize = PITCH_EST_FRAME - FRAME;

/// Half of the DC-removal pole (0.95 / 2 in Q15); `l_mac` doubles it back.
const DC_POLE_HALF_Q15: Word16 = 15565;

/// Shifts the analysis histories and appends one DC-removed, low-passed
/// frame. Must run once per encoded frame before any analysis.
pub fn prepare_frame(enc: &mut EncoderState, speech: &[Word16; FRAME]) {
    enc.pitch_ref_buf.copy_within(FRAME.., 0);
    enc.pitch_est_buf.copy_within(FRAME.., 0);
    dc_rmv(enc, speech);
    pe_lpf(enc);
}

/// First-order high-pass, y[n] = x[n] - x[n-1] + 0.95 y[n-1], run over the
/// new frame into the top of the reference history. The accumulator stays
/// in 32 bits (Q15) across samples and frames.
fn dc_rmv(enc: &mut EncoderState, speech: &[Word16; FRAME]) {
    let mut x1 = enc.dc_prev_in;
    let mut y1: Word32 = enc.dc_prev_out;
    for (n, &x) in speech.iter().enumerate() {
        let diff = sub(x, x1);
        let y = l_mac(l_mult(diff, 16384), DC_POLE_HALF_Q15, round(l_shl(y1, 1)));
        enc.pitch_ref_buf[HISTORY_KEEP + n] = round(l_shl(y, 1));
        x1 = x;
        y1 = y;
    }
    enc.dc_prev_in = x1;
    enc.dc_prev_out = y1;
}

/// 21-tap low-pass over the reference history into the estimation history.
/// The reference buffer carries enough past samples to serve as the filter
/// delay line across frame boundaries.
fn pe_lpf(enc: &mut EncoderState) {
    for n in 0..FRAME {
        let mut acc: Word32 = 0;
        for (k, &c) in PE_LPF_COEF.iter().enumerate() {
            acc = l_mac(acc, c, enc.pitch_ref_buf[HISTORY_KEEP + n - k]);
        }
        enc.pitch_est_buf[HISTORY_KEEP + n] = round(acc);
    }
}

/// Pitch search over the low-passed history. Returns the pitch in Q14.2
/// samples (clamped to 84..=488) and the pitch-error metric `e_p` in Q15
/// (one minus the squared normalized correlation at the chosen lag).
/// Rotates the two-frame pitch track used by the continuity rule.
pub fn pitch_estimate(enc: &mut EncoderState) -> (Word16, Word16) {
    let buf = &enc.pitch_est_buf;
    let num_lags = LAG_MAX - LAG_MIN + 1;

    // Raw correlation and lagged energy per candidate lag. Sums fit i64
    // comfortably (122 products of two 16-bit words per lag).
    let mut corr = [0i64; LAG_MAX - LAG_MIN + 1];
    let mut energy = [0i64; LAG_MAX - LAG_MIN + 1];
    let mut energy0: i64 = 0;
    for n in CORR_START..PITCH_EST_FRAME {
        let x = buf[n] as i64;
        energy0 += x * x;
        for (i, lag) in (LAG_MIN..=LAG_MAX).enumerate() {
            let y = buf[n - lag] as i64;
            corr[i] += x * y;
            energy[i] += y * y;
        }
    }

    // score(lag) = corr^2 / energy (the common 1/energy0 factor drops out
    // of comparisons). Cross-multiplied in 128 bits, so no normalization
    // ladder is needed and ties resolve toward the shorter lag.
    let score_gt = |a: usize, b: usize| -> bool {
        let ca = corr[a].max(0) as u128;
        let cb = corr[b].max(0) as u128;
        ca * ca * energy[b].max(1) as u128 > cb * cb * energy[a].max(1) as u128
    };
    let mut best = 0;
    for i in 1..num_lags {
        if score_gt(i, best) {
            best = i;
        }
    }

    // A periodic signal also correlates at multiples of its true period.
    // Walk the sub-multiples of the winner and take the shortest lag whose
    // score stays within the acceptance ratio of the best.
    let score_within_ratio = |i: usize, of: usize| -> bool {
        let ci = corr[i].max(0) as u128;
        let co = corr[of].max(0) as u128;
        ci * ci * energy[of].max(1) as u128 * 32768
            >= co * co * energy[i].max(1) as u128 * PITCH_CONT_RATIO_Q15 as u128
    };
    for div in (2..=4).rev() {
        let sub_lag = (best + LAG_MIN + div / 2) / div;
        if sub_lag < LAG_MIN {
            continue;
        }
        let lo = sub_lag.saturating_sub(1).max(LAG_MIN) - LAG_MIN;
        let hi = (sub_lag + 1).min(LAG_MAX) - LAG_MIN;
        let mut cand = lo;
        for i in lo..=hi {
            if score_gt(i, cand) {
                cand = i;
            }
        }
        if score_within_ratio(cand, best) {
            best = cand;
            break;
        }
    }

    // Continuity rule: if a lag near the linear prediction of the last two
    // pitches scores within 90% of the global best, prefer it.
    if enc.prev_pitch > 0 && enc.prev_prev_pitch > 0 {
        let pred = (2 * enc.prev_pitch as i32 - enc.prev_prev_pitch as i32 + 2) / 4;
        let lo = (pred - 2).clamp(LAG_MIN as i32, LAG_MAX as i32) as usize - LAG_MIN;
        let hi = (pred + 2).clamp(LAG_MIN as i32, LAG_MAX as i32) as usize - LAG_MIN;
        let mut local = lo;
        for i in lo..=hi {
            if score_gt(i, local) {
                local = i;
            }
        }
        if score_within_ratio(local, best) {
            best = local;
        }
    }

    let lag = best + LAG_MIN;

    // Parabolic refinement to quarter-sample resolution on the raw
    // correlation around the winning lag.
    let mut offset_q2: i64 = 0;
    if best > 0 && best < num_lags - 1 {
        let sm = corr[best - 1];
        let s0 = corr[best];
        let sp = corr[best + 1];
        let den = sm - 2 * s0 + sp;
        if den != 0 {
            offset_q2 = (2 * (sm - sp) / den).clamp(-2, 2);
        }
    }
    let pitch = ((lag as i64 * 4 + offset_q2).clamp(84, 488)) as Word16;

    // Squared normalized correlation in Q15; zero when either window has
    // no energy, which pushes silence toward fully unvoiced.
    let rho2 = if energy0 > 0 && energy[best] > 0 {
        let c = corr[best].max(0) as u128;
        let den = energy0 as u128 * energy[best] as u128;
        ((c * c * 32768 / den) as i64).min(32767) as Word16
    } else {
        0
    };
    let e_p = 32767 - rho2;

    enc.prev_prev_pitch = enc.prev_pitch;
    enc.prev_pitch = pitch;
    (pitch, e_p)
}
