//! Fixed-size, fixed-point spectral transform.
//!
//! In-place radix-2 FFT/IFFT over 256 complex 16-bit samples. Every
//! butterfly stage halves the data (eight stages in total), so the forward
//! transform produces the DFT scaled by 1/256 and never overflows; the
//! inverse transform produces the exact mathematical inverse under the same
//! rule. Callers fold the known 1/256 factors into their gain computations.

use num_complex::Complex;

use super::ops::{saturate, Word32};
use super::tables::{SIN_TABLE, SIN_TABLE_LEN};
use super::FFT_SIZE;

/// Complex sample of two 16-bit words.
pub type Cmplx16 = Complex<i16>;

/// Zero complex sample, handy for buffer initialization.
pub const CZERO: Cmplx16 = Complex { re: 0, im: 0 };

/// Forward transform; output is the DFT of the input scaled by 1/256.
pub fn fft(buf: &mut [Cmplx16; FFT_SIZE]) {
    transform(buf, false);
}

/// Inverse transform; exact inverse of the unscaled DFT (the 1/256 factor
/// of the usual inverse is supplied by the per-stage halving).
pub fn ifft(buf: &mut [Cmplx16; FFT_SIZE]) {
    transform(buf, true);
}

fn transform(buf: &mut [Cmplx16; FFT_SIZE], inverse: bool) {
    debug_assert_eq!(FFT_SIZE, 256);

    // Bit-reversal permutation; FFT_SIZE = 256 makes u8 reversal exact.
    for i in 0..FFT_SIZE {
        let j = (i as u8).reverse_bits() as usize;
        if i < j {
            buf.swap(i, j);
        }
    }

    let mut m = 2;
    while m <= FFT_SIZE {
        let half = m / 2;
        let twiddle_step = FFT_SIZE / m;
        for group in (0..FFT_SIZE).step_by(m) {
            for j in 0..half {
                let (wr, wi) = twiddle(j * twiddle_step, inverse);
                let a = buf[group + j];
                let b = buf[group + j + half];

                // Q15 rotation of b; kept in 32 bits until combined.
                let t_re =
                    (wr as Word32 * b.re as Word32 - wi as Word32 * b.im as Word32) >> 15;
                let t_im =
                    (wr as Word32 * b.im as Word32 + wi as Word32 * b.re as Word32) >> 15;

                buf[group + j] = Complex {
                    re: saturate((a.re as Word32 + t_re) >> 1),
                    im: saturate((a.im as Word32 + t_im) >> 1),
                };
                buf[group + j + half] = Complex {
                    re: saturate((a.re as Word32 - t_re) >> 1),
                    im: saturate((a.im as Word32 - t_im) >> 1),
                };
            }
        }
        m *= 2;
    }
}

/// Twiddle factor exp(-2*pi*i*k/FFT_SIZE) (conjugated for the inverse),
/// from the shared sine table. The table length is a multiple of FFT_SIZE,
/// so the lookup is exact.
#[inline]
fn twiddle(k: usize, inverse: bool) -> (i16, i16) {
    let idx = k * (SIN_TABLE_LEN / FFT_SIZE);
    let cos = SIN_TABLE[(idx + SIN_TABLE_LEN / 4) & (SIN_TABLE_LEN - 1)];
    let sin = SIN_TABLE[idx & (SIN_TABLE_LEN - 1)];
    if inverse {
        (cos, sin)
    } else {
        (cos, -sin)
    }
}
