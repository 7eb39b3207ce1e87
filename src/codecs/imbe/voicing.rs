//! Per-band voiced/unvoiced classification.
//!
//! Each voicing band covers three consecutive harmonics (the last band
//! takes any remainder). A band is judged by how much of its spectral
//! energy sits away from the harmonic centers: a periodic band concentrates
//! energy at multiples of the fundamental, a noisy band spreads it. The
//! decision threshold adapts to a decaying maximum of past band errors and
//! tightens when the pitch estimate itself was poor.

use super::ops::{mult, Word16};
use super::state::EncoderState;
use super::tables::{VU_DECAY_Q15, VU_THRESH_BASE_Q15};
use super::transform::Cmplx16;
use super::{FFT_SIZE, NUM_BANDS_MAX, NUM_HARMS_MAX};

/// Voicing band of a 1-based harmonic index; harmonics beyond three per
/// band all fall in the last band.
pub fn band_of(l: usize, num_bands: usize) -> usize {
    ((l - 1) / 3).min(num_bands - 1)
}

/// Spreads per-band voicing decisions onto individual harmonics.
pub fn expand_voicing(
    voiced: &[bool; NUM_BANDS_MAX],
    num_harms: usize,
    num_bands: usize,
) -> [bool; NUM_HARMS_MAX] {
    let mut out = [false; NUM_HARMS_MAX];
    for l in 1..=num_harms {
        out[l - 1] = voiced[band_of(l, num_bands)];
    }
    out
}

/// Center of harmonic `l` on the FFT bin axis, Q8 bins.
pub(crate) fn harmonic_center_q8(fund_freq: u32, l: usize) -> i64 {
    ((l as u64 * fund_freq as u64) >> 16) as i64
}

/// Harmonic spacing on the FFT bin axis, Q8 bins.
pub(crate) fn harmonic_spacing_q8(fund_freq: u32) -> i64 {
    (fund_freq >> 16) as i64
}

/// Energy of one spectrum bin. Fits in 32 bits, summed in 64.
#[inline]
fn bin_energy(c: Cmplx16) -> i64 {
    c.re as i64 * c.re as i64 + c.im as i64 * c.im as i64
}

/// Classifies the voicing bands of one frame from the analysis spectrum.
/// Reads and updates the adaptive threshold statistic in the encoder state.
pub fn classify(
    enc: &mut EncoderState,
    spectrum: &[Cmplx16; FFT_SIZE],
    fund_freq: u32,
    num_harms: usize,
    num_bands: usize,
    e_p: Word16,
) -> [bool; NUM_BANDS_MAX] {
    let spacing = harmonic_spacing_q8(fund_freq);
    // Peak half-width: a quarter of the harmonic spacing, at least one bin.
    let halfwidth = (spacing / 4).max(256);

    // Threshold from the previous frames' statistic, tightened by a poor
    // pitch estimate (halved as e_p approaches one).
    let tighten = 32767 - mult(e_p, 16384);
    let threshold = mult(VU_THRESH_BASE_Q15, tighten) as i64 + (enc.th_max >> 2) as i64;

    let mut voiced = [false; NUM_BANDS_MAX];
    let mut frame_max_err: Word16 = 0;
    for k in 0..num_bands {
        let lo = 3 * k + 1;
        let hi = if k == num_bands - 1 {
            num_harms
        } else {
            (3 * k + 3).min(num_harms)
        };
        let band_lo = harmonic_center_q8(fund_freq, lo) - spacing / 2;
        let band_hi = harmonic_center_q8(fund_freq, hi) + spacing / 2;

        let mut total: i64 = 0;
        let mut off_peak: i64 = 0;
        for b in 1..FFT_SIZE / 2 {
            let pos = (b as i64) << 8;
            if pos < band_lo || pos > band_hi {
                continue;
            }
            let e = bin_energy(spectrum[b]);
            total += e;
            let near_peak = (lo..=hi)
                .any(|l| (pos - harmonic_center_q8(fund_freq, l)).abs() <= halfwidth);
            if !near_peak {
                off_peak += e;
            }
        }

        // Off-peak energy fraction in Q15; an empty band counts as fully
        // aperiodic.
        let err: Word16 = if total > 0 {
            ((off_peak as u64 * 32768 / total as u64) as i64).min(32767) as Word16
        } else {
            32767
        };
        frame_max_err = frame_max_err.max(err);
        voiced[k] = (err as i64) < threshold;
    }

    enc.th_max = frame_max_err.max(mult(enc.th_max, VU_DECAY_Q15));
    voiced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codecs::imbe::state::fund_freq_for;
    use crate::codecs::imbe::transform::CZERO;
    use num_complex::Complex;

    /// Spectrum with all energy exactly on the harmonic grid.
    fn harmonic_spectrum(fund: u32, num_harms: usize) -> [Cmplx16; FFT_SIZE] {
        let mut spec = [CZERO; FFT_SIZE];
        for l in 1..=num_harms {
            let bin = ((harmonic_center_q8(fund, l) + 128) >> 8) as usize;
            if bin < FFT_SIZE / 2 {
                spec[bin] = Complex { re: 6000, im: 0 };
            }
        }
        spec
    }

    #[test]
    fn test_band_of_mapping() {
        assert_eq!(band_of(1, 3), 0);
        assert_eq!(band_of(3, 3), 0);
        assert_eq!(band_of(4, 3), 1);
        assert_eq!(band_of(9, 3), 2);
        // Harmonics beyond three per band collapse into the last band.
        assert_eq!(band_of(56, 12), 11);
        assert_eq!(band_of(37, 12), 11);
    }

    #[test]
    fn test_expand_voicing() {
        let mut bands = [false; NUM_BANDS_MAX];
        bands[0] = true;
        bands[2] = true;
        let per_harm = expand_voicing(&bands, 9, 3);
        assert_eq!(&per_harm[..9], &[true, true, true, false, false, false, true, true, true]);
        assert!(per_harm[9..].iter().all(|&v| !v));
    }

    #[test]
    fn test_harmonic_grid_reads_voiced() {
        let mut enc = EncoderState::new();
        let fund = fund_freq_for(320); // 80-sample pitch
        let num_harms = 37;
        let num_bands = 12;
        let spec = harmonic_spectrum(fund, num_harms);
        let v = classify(&mut enc, &spec, fund, num_harms, num_bands, 1000);
        assert!(
            v[..num_bands].iter().all(|&b| b),
            "voiced bands {:?}",
            &v[..num_bands]
        );
    }

    #[test]
    fn test_flat_noise_reads_unvoiced() {
        let mut enc = EncoderState::new();
        let fund = fund_freq_for(320);
        let mut spec = [CZERO; FFT_SIZE];
        for (b, s) in spec.iter_mut().enumerate() {
            // Flat magnitude, alternating phase so nothing looks tonal.
            let v = if b % 2 == 0 { 3000 } else { -3000 };
            *s = Complex { re: v, im: -v };
        }
        let v = classify(&mut enc, &spec, fund, 37, 12, 30000);
        let voiced_count = v[..12].iter().filter(|&&b| b).count();
        assert!(voiced_count <= 2, "voiced bands {:?}", &v[..12]);
    }

    #[test]
    fn test_th_max_tracks_and_decays() {
        let mut enc = EncoderState::new();
        let fund = fund_freq_for(320);
        let mut spec = [CZERO; FFT_SIZE];
        for s in spec.iter_mut() {
            *s = Complex { re: 2000, im: 2000 };
        }
        classify(&mut enc, &spec, fund, 37, 12, 30000);
        let after_noise = enc.th_max;
        assert!(after_noise > 8000, "th_max {}", after_noise);

        // A clean harmonic frame lets the statistic decay geometrically.
        let clean = harmonic_spectrum(fund, 37);
        classify(&mut enc, &clean, fund, 37, 12, 1000);
        assert!(enc.th_max < after_noise);
        assert!(enc.th_max >= mult(after_noise, VU_DECAY_Q15) - 1);
    }
}
