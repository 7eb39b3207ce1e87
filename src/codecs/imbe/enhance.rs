//! Spectral amplitude enhancement.
//!
//! Sharpens the decoded envelope before synthesis: each log amplitude moves
//! away from its local mean (peaks up, valleys down) by half the distance,
//! bounded to ±0.585 log2 (a factor of 1.5 either way), then the whole
//! frame is shifted back in the log domain so total energy is unchanged.
//! Pure function of the current frame, no cross-frame state.

use super::ops::{log2_fx, mult, pow2_fx, saturate, Word16};
use super::tables::{ENH_GAIN_BOUND_Q10, ENH_GAMMA_Q15};
use super::NUM_HARMS_MAX;

/// Half-width of the local-mean window, in harmonics.
const WINDOW: usize = 2;

/// Sharpens `log2_sa[..num_harms]` in place, preserving frame energy.
pub fn enhance(log2_sa: &mut [Word16; NUM_HARMS_MAX], num_harms: usize) {
    if num_harms == 0 {
        return;
    }

    let before = log_energy(log2_sa, num_harms);

    let original = *log2_sa;
    for l in 0..num_harms {
        let lo = l.saturating_sub(WINDOW);
        let hi = (l + WINDOW).min(num_harms - 1);
        let mut sum: i32 = 0;
        for &a in &original[lo..=hi] {
            sum += a as i32;
        }
        let local_mean = (sum / (hi - lo + 1) as i32) as Word16;

        let delta = saturate(original[l] as i32 - local_mean as i32);
        let boost = (mult(ENH_GAMMA_Q15, delta) as i32)
            .clamp(-(ENH_GAIN_BOUND_Q10 as i32), ENH_GAIN_BOUND_Q10 as i32);
        log2_sa[l] = saturate(original[l] as i32 + boost);
    }

    // Log-domain renormalization: half the energy log ratio, applied to
    // every harmonic.
    let after = log_energy(log2_sa, num_harms);
    let correction = ((before - after) / 2) as i32;
    for a in log2_sa.iter_mut().take(num_harms) {
        *a = saturate(*a as i32 + correction);
    }
}

/// log2 of the frame energy (sum of squared linear amplitudes), Q10.
/// Computed relative to the largest amplitude so the fixed-point pow2
/// stays in range for any signal level.
fn log_energy(log2_sa: &[Word16; NUM_HARMS_MAX], num_harms: usize) -> i32 {
    let max = log2_sa[..num_harms].iter().copied().max().unwrap_or(0);
    let mut sum: i32 = 0;
    for &a in &log2_sa[..num_harms] {
        // 2^(2(a - max) + 14), a Q14 fraction of the peak term.
        let x = saturate(2 * (a as i32 - max as i32) + (14 << 10));
        sum += pow2_fx(x.max(0));
    }
    // log2(sum * 2^(2 max - 14)).
    log2_fx(sum.max(1)) as i32 - (14 << 10) + 2 * max as i32
}
