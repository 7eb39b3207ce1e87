//! Voiced synthesis: a bank of phase-continuous harmonic oscillators.
//!
//! Each harmonic slot owns a 32-bit phase accumulator (wrap = one cycle)
//! that persists across frames. Within a frame, both the fundamental and
//! the per-harmonic amplitude interpolate linearly from the previous
//! frame's values, so voicing onsets ramp in from zero and offsets ramp
//! out, and there is no phase discontinuity at frame boundaries.

use super::ops::{l_add, saturate, Word16, Word32};
use super::state::DecoderState;
use super::tables::SIN_TABLE;
use super::{FRAME, NUM_HARMS_MAX};

/// Synthesizes the voiced part of one frame. Reads the previous-frame
/// parameters from the decoder state and advances the phase accumulators;
/// the caller rotates the rest of the state afterwards.
pub fn synth_voiced(
    dec: &mut DecoderState,
    sa: &[Word16; NUM_HARMS_MAX],
    voiced: &[bool; NUM_HARMS_MAX],
    num_harms: usize,
    fund_freq: u32,
) -> [Word16; FRAME] {
    let mut out = [0; FRAME];
    let slots = num_harms.max(dec.prev_num_harms);
    let fund_delta = fund_freq as i64 - dec.prev_fund_freq as i64;

    for (n, sample) in out.iter_mut().enumerate() {
        // Interpolation weight for this sample, Q15.
        let alpha = (n as i64 * 32768) / FRAME as i64;
        let w = (dec.prev_fund_freq as i64 + (fund_delta * alpha >> 15)) as u32;

        let mut acc: Word32 = 0;
        for l in 0..slots {
            dec.phase[l] = dec.phase[l].wrapping_add((l as u32 + 1).wrapping_mul(w));

            let amp_prev = if l < dec.prev_num_harms && dec.prev_voiced[l] {
                dec.prev_sa[l] as i64
            } else {
                0
            };
            let amp_cur = if l < num_harms && voiced[l] {
                sa[l] as i64
            } else {
                0
            };
            if amp_prev == 0 && amp_cur == 0 {
                continue;
            }
            let amp = amp_prev + ((amp_cur - amp_prev) * alpha >> 15);
            let sin = SIN_TABLE[(dec.phase[l] >> 22) as usize] as i64;
            acc = l_add(acc, ((amp * sin) >> 15) as Word32);
        }
        *sample = saturate(acc);
    }
    out
}
