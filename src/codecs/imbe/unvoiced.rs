//! Unvoiced synthesis: spectrally shaped noise.
//!
//! A deterministic congruential generator produces one 256-sample noise
//! block per frame (the seed advances exactly once per sample, so the
//! noise sequence is a function of call count alone). The block goes
//! through the forward transform, every bin outside an unvoiced harmonic
//! region is zeroed, each region is gain-matched in the log domain to its
//! harmonic's amplitude, and the inverse transform plus a triangular
//! crossfade against the previous frame's tail yields the output.

use num_complex::Complex;

use super::ops::{l_mac, l_mult, l_shl, log2_fx, pow2_fx, round, saturate, sub, Word16, Word32};
use super::state::DecoderState;
use super::tables::UV_FADE;
use super::transform::{fft, ifft, CZERO};
use super::voicing::{harmonic_center_q8, harmonic_spacing_q8};
use super::{FFT_SIZE, FRAME, NUM_HARMS_MAX};

const NOISE_MUL: u32 = 1_103_515_245;
const NOISE_INC: u32 = 12345;

/// Part of the transform scaling restored after the inverse pass; the
/// remainder is folded into the bin gain targets so the inverse transform
/// keeps enough sample resolution at quiet levels.
const SYNTH_SHIFT: Word16 = 5;

/// Samples shared between consecutive synthesis blocks.
const OVERLAP: usize = FFT_SIZE - FRAME;

/// Synthesizes the unvoiced part of one frame from the reconstructed log
/// amplitudes. Advances the noise seed and the overlap memory.
pub fn synth_unvoiced(
    dec: &mut DecoderState,
    log2_sa: &[Word16; NUM_HARMS_MAX],
    voiced: &[bool; NUM_HARMS_MAX],
    num_harms: usize,
    fund_freq: u32,
) -> [Word16; FRAME] {
    let mut buf = [CZERO; FFT_SIZE];
    for slot in buf.iter_mut() {
        dec.seed = dec.seed.wrapping_mul(NOISE_MUL).wrapping_add(NOISE_INC);
        let v = ((dec.seed >> 16) & 0x7fff) as i32 - 16384;
        *slot = Complex { re: v as i16, im: 0 };
    }
    fft(&mut buf);

    // Rebuild the positive-frequency half from the unvoiced regions only,
    // gain-matched per harmonic; everything else stays zero.
    let mut shaped = [CZERO; FFT_SIZE];
    let spacing = harmonic_spacing_q8(fund_freq);
    for l in 1..=num_harms {
        if voiced[l - 1] {
            continue;
        }
        let center = harmonic_center_q8(fund_freq, l);
        let lo = center - spacing / 2;
        let hi = center + spacing / 2;

        let mut energy: i64 = 0;
        for b in 1..FFT_SIZE / 2 {
            let pos = (b as i64) << 8;
            if pos >= lo && pos < hi {
                let c = buf[b];
                energy += c.re as i64 * c.re as i64 + c.im as i64 * c.im as i64;
            }
        }
        let mut e = energy.max(1);
        let mut shift: i32 = 0;
        while e > Word32::MAX as i64 {
            e >>= 1;
            shift += 1;
        }
        let measured_log = log2_fx(e as Word32) as i32 + (shift << 10);

        // Target region energy for amplitude A is 16 A^2 under the block
        // scaling in use: log2 target = 2 log2(A) + 4.
        let target_log = 2 * log2_sa[l - 1] as i32 + 4096;
        let gain_log = ((target_log - measured_log) / 2).clamp(-(14 << 10), 14 << 10);
        let factor = pow2_fx(saturate(gain_log + (10 << 10)));

        for b in 1..FFT_SIZE / 2 {
            let pos = (b as i64) << 8;
            if pos >= lo && pos < hi {
                shaped[b] = Complex {
                    re: saturate(((buf[b].re as i64 * factor as i64) >> 10) as Word32),
                    im: saturate(((buf[b].im as i64 * factor as i64) >> 10) as Word32),
                };
            }
        }
    }
    // Conjugate mirror keeps the inverse transform real.
    for b in 1..FFT_SIZE / 2 {
        shaped[FFT_SIZE - b] = shaped[b].conj();
    }

    ifft(&mut shaped);
    let mut block = [0i16; FFT_SIZE];
    for (dst, src) in block.iter_mut().zip(shaped.iter()) {
        *dst = saturate(l_shl(src.re as Word32, SYNTH_SHIFT));
    }

    // Triangular crossfade of the first samples against the saved tail of
    // the previous block.
    let mut out = [0i16; FRAME];
    for n in 0..OVERLAP {
        let f = UV_FADE[n];
        let acc = l_mac(l_mult(block[n], f), dec.uv_mem[n], sub(32767, f));
        out[n] = round(acc);
    }
    out[OVERLAP..].copy_from_slice(&block[OVERLAP..FRAME]);
    dec.uv_mem.copy_from_slice(&block[FRAME..]);
    out
}
