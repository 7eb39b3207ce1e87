//! Saturating fixed-point primitives for the IMBE codec.
//!
//! These mirror the basic operator set of classic fixed-point DSP speech
//! coders: 16-bit words, 32-bit accumulators, and every operation clamps to
//! the representable range instead of wrapping. Overflow behavior is the
//! contract here: the synthesis path depends on saturation, not wraparound,
//! at every intermediate sum.

use super::tables::{LOG2_TABLE, POW2_TABLE};

/// 16-bit fixed-point word.
pub type Word16 = i16;
/// 32-bit fixed-point accumulator.
pub type Word32 = i32;

/// Clamp a 32-bit value into the 16-bit signed range.
#[inline]
pub fn saturate(x: Word32) -> Word16 {
    x.clamp(Word16::MIN as Word32, Word16::MAX as Word32) as Word16
}

/// Saturating 16-bit addition.
#[inline]
pub fn add(a: Word16, b: Word16) -> Word16 {
    saturate(a as Word32 + b as Word32)
}

/// Saturating 16-bit subtraction.
#[inline]
pub fn sub(a: Word16, b: Word16) -> Word16 {
    saturate(a as Word32 - b as Word32)
}

/// Absolute value with the -32768 case saturated to 32767.
#[inline]
pub fn abs_s(a: Word16) -> Word16 {
    if a == Word16::MIN {
        Word16::MAX
    } else {
        a.abs()
    }
}

/// Negation with the -32768 case saturated to 32767.
#[inline]
pub fn negate(a: Word16) -> Word16 {
    if a == Word16::MIN {
        Word16::MAX
    } else {
        -a
    }
}

/// Saturating left shift; negative `n` shifts right.
#[inline]
pub fn shl(a: Word16, n: Word16) -> Word16 {
    if n < 0 {
        return shr(a, negate(n));
    }
    if n >= 15 {
        return if a > 0 {
            Word16::MAX
        } else if a < 0 {
            Word16::MIN
        } else {
            0
        };
    }
    saturate((a as Word32) << n)
}

/// Arithmetic right shift; negative `n` shifts left.
#[inline]
pub fn shr(a: Word16, n: Word16) -> Word16 {
    if n < 0 {
        return shl(a, negate(n));
    }
    if n >= 15 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else {
        a >> n
    }
}

/// Q15 multiply: (a * b) >> 15, saturated.
#[inline]
pub fn mult(a: Word16, b: Word16) -> Word16 {
    saturate(((a as Word32 * b as Word32) >> 15) as Word32)
}

/// Q15 multiply with rounding.
#[inline]
pub fn mult_r(a: Word16, b: Word16) -> Word16 {
    saturate(((a as Word32 * b as Word32 + 0x4000) >> 15) as Word32)
}

/// 16x16 -> 32 multiply with the DSP doubling convention (result in Q31
/// when both inputs are Q15). The single overflow case -32768 * -32768
/// saturates.
#[inline]
pub fn l_mult(a: Word16, b: Word16) -> Word32 {
    let p = a as Word32 * b as Word32;
    if p == 0x4000_0000 {
        Word32::MAX
    } else {
        p.wrapping_mul(2)
    }
}

/// Saturating 32-bit addition.
#[inline]
pub fn l_add(a: Word32, b: Word32) -> Word32 {
    a.saturating_add(b)
}

/// Saturating 32-bit subtraction.
#[inline]
pub fn l_sub(a: Word32, b: Word32) -> Word32 {
    a.saturating_sub(b)
}

/// Multiply-accumulate: acc + (a * b doubled), saturated.
#[inline]
pub fn l_mac(acc: Word32, a: Word16, b: Word16) -> Word32 {
    l_add(acc, l_mult(a, b))
}

/// Multiply-subtract: acc - (a * b doubled), saturated.
#[inline]
pub fn l_msu(acc: Word32, a: Word16, b: Word16) -> Word32 {
    l_sub(acc, l_mult(a, b))
}

/// Saturating 32-bit left shift; negative `n` shifts right.
#[inline]
pub fn l_shl(a: Word32, n: Word16) -> Word32 {
    if n < 0 {
        return l_shr(a, saturate(-(n as Word32)));
    }
    if n >= 31 {
        return if a > 0 {
            Word32::MAX
        } else if a < 0 {
            Word32::MIN
        } else {
            0
        };
    }
    let wide = (a as i64) << n;
    wide.clamp(Word32::MIN as i64, Word32::MAX as i64) as Word32
}

/// Arithmetic 32-bit right shift; negative `n` shifts left.
#[inline]
pub fn l_shr(a: Word32, n: Word16) -> Word32 {
    if n < 0 {
        return l_shl(a, saturate(-(n as Word32)));
    }
    if n >= 31 {
        if a < 0 {
            -1
        } else {
            0
        }
    } else {
        a >> n
    }
}

/// High 16 bits of an accumulator.
#[inline]
pub fn extract_h(a: Word32) -> Word16 {
    (a >> 16) as Word16
}

/// Low 16 bits of an accumulator.
#[inline]
pub fn extract_l(a: Word32) -> Word16 {
    (a & 0xffff) as Word16
}

/// Places a word in the high half of an accumulator.
#[inline]
pub fn l_deposit_h(a: Word16) -> Word32 {
    (a as Word32) << 16
}

/// Sign-extends a word into an accumulator.
#[inline]
pub fn l_deposit_l(a: Word16) -> Word32 {
    a as Word32
}

/// Round the high word out of a 32-bit accumulator.
#[inline]
pub fn round(a: Word32) -> Word16 {
    extract_h(l_add(a, 0x8000))
}

/// Left-shift count that normalizes `a` into [0x4000, 0x8000); 0 for 0.
#[inline]
pub fn norm_s(a: Word16) -> Word16 {
    if a == 0 {
        return 0;
    }
    if a == -1 {
        return 15;
    }
    let mut v = if a < 0 { !a } else { a };
    let mut n = 0;
    while v < 0x4000 {
        v <<= 1;
        n += 1;
    }
    n
}

/// Left-shift count that normalizes `a` into [0x4000_0000, 0x8000_0000); 0 for 0.
#[inline]
pub fn norm_l(a: Word32) -> Word16 {
    if a == 0 {
        return 0;
    }
    if a == -1 {
        return 31;
    }
    let mut v = if a < 0 { !a } else { a };
    let mut n = 0;
    while v < 0x4000_0000 {
        v <<= 1;
        n += 1;
    }
    n
}

/// Q15 ratio of two non-negative accumulators, clamped to [0, 32767].
///
/// Used for normalized correlation and energy-fraction scores where the
/// numerator may not exceed the denominator by much; full 64-bit
/// intermediate, so no internal overflow.
#[inline]
pub fn div_q15(num: Word32, den: Word32) -> Word16 {
    if den <= 0 || num <= 0 {
        return 0;
    }
    let q = ((num as i64) << 15) / den as i64;
    q.min(Word16::MAX as i64) as Word16
}

/// log2 of a positive accumulator in Q10 (table lookup + linear
/// interpolation). Non-positive input returns 0.
pub fn log2_fx(x: Word32) -> Word16 {
    if x <= 0 {
        return 0;
    }
    let exp = norm_l(x);
    let m = l_shl(x, exp); // normalized to [2^30, 2^31)
    let int_part = (30 - exp) as Word32; // integer log2
    // Fraction bits: index from bits 25..30, interpolate on bits 20..25.
    let idx = ((m >> 25) & 0x1f) as usize;
    let sub = (m >> 20) & 0x1f;
    let base = LOG2_TABLE[idx] as Word32;
    let next = LOG2_TABLE[idx + 1] as Word32;
    let frac_q15 = base + (((next - base) * sub) >> 5);
    saturate((int_part << 10) + (frac_q15 >> 5))
}

/// 2^x for x in Q10, as a positive accumulator. Saturates above 2^30.
pub fn pow2_fx(x: Word16) -> Word32 {
    let int_part = (x >> 10) as Word32;
    if int_part > 30 {
        return Word32::MAX;
    }
    if int_part < -14 {
        return 0;
    }
    let frac = (x & 0x3ff) as Word32; // Q10 fraction in [0, 1)
    let idx = (frac >> 5) as usize;
    let sub = frac & 0x1f;
    let base = POW2_TABLE[idx] as Word32;
    let next = POW2_TABLE[idx + 1] as Word32;
    let t = base + (((next - base) * sub) >> 5); // Q14 value of 2^frac
    l_shl(t, saturate(int_part - 14))
}
