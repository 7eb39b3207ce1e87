//! Codec state and the cross-frame parameter model.
//!
//! One `ImbeState` per vocoder instance. The encoder half carries the
//! pitch-analysis history and quantizer prediction memory; the decoder half
//! carries its own prediction memory plus everything the synthesizer
//! interpolates across frame boundaries. Encode and decode never touch each
//! other's half, so one instance can run full duplex.

use super::ops::{Word16, Word32};
use super::{FFT_SIZE, FRAME, NUM_BANDS_MAX, NUM_HARMS_MAX, NUM_HARMS_MIN, PITCH_EST_FRAME};

/// Fundamental frequency the decoder assumes before the first frame
/// (pitch 19.75 samples in Q0.32 cycles/sample).
pub const DEFAULT_FUND_FREQ: u32 = 0x0cf6_474a;

/// Pitch matching [`DEFAULT_FUND_FREQ`], Q14.2 samples.
pub const DEFAULT_PITCH: Word16 = 79;

/// Harmonic count for a pitch in Q14.2 samples: floor(0.4627 * pitch),
/// clamped to the representable range. Both codec directions derive the
/// band structure from the pitch through this one rule.
pub fn harms_for(pitch: Word16) -> usize {
    let l = (pitch as i32 * 15162) >> 17;
    l.clamp(NUM_HARMS_MIN as i32, NUM_HARMS_MAX as i32) as usize
}

/// Voicing band count for a harmonic count: bands of three, capped.
pub fn bands_for(num_harms: usize) -> usize {
    ((num_harms + 2) / 3).min(NUM_BANDS_MAX)
}

/// Fundamental frequency for a pitch in Q14.2 samples, as Q0.32
/// cycles/sample (2^34 / pitch, so a phase accumulator wraps once per
/// pitch period). Defined for any pitch of at least two samples; the
/// transmitted range is narrower and enforced by the pitch quantizer.
pub fn fund_freq_for(pitch: Word16) -> u32 {
    let p = pitch.max(8) as u64;
    ((1u64 << 34) / p) as u32
}

/// Quantizes a pitch to the 8-bit transmitted index (half-sample steps
/// from 21.0 samples). Out-of-range pitches clamp.
pub fn pitch_to_index(pitch: Word16) -> u16 {
    ((pitch.clamp(84, 488) - 84) / 2) as u16
}

/// Reconstructs a Q14.2 pitch from a transmitted index. Indices above the
/// valid range clamp to the longest pitch.
pub fn index_to_pitch(index: u16) -> Word16 {
    84 + 2 * index.min(202) as Word16
}

/// Parameters of one 20 ms frame, the common currency of analysis,
/// quantization and synthesis.
#[derive(Debug, Clone)]
pub struct ImbeParam {
    /// Pitch period, Q14.2 samples (21.0..=122.0).
    pub pitch: Word16,
    /// Fundamental frequency, Q0.32 cycles/sample.
    pub fund_freq: u32,
    /// Harmonic count L.
    pub num_harms: usize,
    /// Voicing band count K.
    pub num_bands: usize,
    /// Per-band voiced/unvoiced decisions; only the first K entries apply.
    pub voiced: [bool; NUM_BANDS_MAX],
    /// Linear spectral amplitudes per harmonic.
    pub sa: [Word16; NUM_HARMS_MAX],
    /// Log2 spectral amplitudes per harmonic, Q10.
    pub log2_sa: [Word16; NUM_HARMS_MAX],
    /// Pitch-estimate error metric, Q15 (0 = fully periodic).
    pub e_p: Word16,
}

impl ImbeParam {
    /// Silence-equivalent parameter set assumed before the first frame.
    pub fn new() -> Self {
        ImbeParam {
            pitch: DEFAULT_PITCH,
            fund_freq: DEFAULT_FUND_FREQ,
            num_harms: NUM_HARMS_MIN,
            num_bands: bands_for(NUM_HARMS_MIN),
            voiced: [false; NUM_BANDS_MAX],
            sa: [0; NUM_HARMS_MAX],
            log2_sa: [0; NUM_HARMS_MAX],
            e_p: 0,
        }
    }
}

impl Default for ImbeParam {
    fn default() -> Self {
        Self::new()
    }
}

/// Analysis-side memories.
#[derive(Debug, Clone)]
pub struct EncoderState {
    /// DC-removed speech history; the spectral analysis window reads from
    /// here. Newest frame occupies the top `FRAME` samples.
    pub pitch_ref_buf: [Word16; PITCH_EST_FRAME],
    /// Low-passed copy of the same history driving the autocorrelation
    /// pitch search.
    pub pitch_est_buf: [Word16; PITCH_EST_FRAME],
    /// DC-removal filter input memory.
    pub dc_prev_in: Word16,
    /// DC-removal filter output memory, kept wide.
    pub dc_prev_out: Word32,
    /// Pitch of the previous frame, Q14.2, for the continuity rule.
    pub prev_pitch: Word16,
    /// Pitch of the frame before that, Q14.2.
    pub prev_prev_pitch: Word16,
    /// Decaying maximum of the band voicing errors, Q15.
    pub th_max: Word16,
    /// Reconstructed log2 amplitudes of the previous frame, Q10. Matches
    /// the decoder's copy bit for bit, keeping prediction drift-free.
    pub prev_log2_sa: [Word16; NUM_HARMS_MAX],
    /// Harmonic count that goes with `prev_log2_sa`.
    pub prev_log2_harms: usize,
}

impl EncoderState {
    /// Fresh analysis state over silent history.
    pub fn new() -> Self {
        EncoderState {
            pitch_ref_buf: [0; PITCH_EST_FRAME],
            pitch_est_buf: [0; PITCH_EST_FRAME],
            dc_prev_in: 0,
            dc_prev_out: 0,
            prev_pitch: 0,
            prev_prev_pitch: 0,
            th_max: 0,
            prev_log2_sa: [0; NUM_HARMS_MAX],
            prev_log2_harms: NUM_HARMS_MIN,
        }
    }

    /// Returns the state to its initial silence.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for EncoderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Synthesis-side memories.
#[derive(Debug, Clone)]
pub struct DecoderState {
    /// Reconstructed log2 amplitudes of the previous frame, Q10
    /// (prediction memory, decoder's own copy).
    pub prev_log2_sa: [Word16; NUM_HARMS_MAX],
    /// Harmonic count that goes with `prev_log2_sa`. Rotates with the
    /// prediction memory, ahead of the synthesis fields below.
    pub prev_log2_harms: usize,
    /// Previous-frame linear amplitudes for synthesis interpolation.
    pub prev_sa: [Word16; NUM_HARMS_MAX],
    /// Previous-frame per-harmonic voicing.
    pub prev_voiced: [bool; NUM_HARMS_MAX],
    /// Harmonic count of the previous frame.
    pub prev_num_harms: usize,
    /// Fundamental of the previous frame, Q0.32 cycles/sample.
    pub prev_fund_freq: u32,
    /// Oscillator phase accumulators, one per harmonic slot; wrap = one
    /// cycle. Persist across frames so voiced harmonics stay continuous.
    pub phase: [u32; NUM_HARMS_MAX],
    /// Tail of the previous unvoiced synthesis block for the overlap-add.
    pub uv_mem: [Word16; FFT_SIZE - FRAME],
    /// Noise generator state; advanced only by unvoiced synthesis.
    pub seed: u32,
}

impl DecoderState {
    /// Fresh synthesis state assuming silence before the first frame.
    pub fn new() -> Self {
        DecoderState {
            prev_log2_sa: [0; NUM_HARMS_MAX],
            prev_log2_harms: NUM_HARMS_MIN,
            prev_sa: [0; NUM_HARMS_MAX],
            prev_voiced: [false; NUM_HARMS_MAX],
            prev_num_harms: NUM_HARMS_MIN,
            prev_fund_freq: DEFAULT_FUND_FREQ,
            phase: [0; NUM_HARMS_MAX],
            uv_mem: [0; FFT_SIZE - FRAME],
            seed: 1,
        }
    }

    /// Returns the state to its initial silence.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for DecoderState {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete per-instance codec state.
#[derive(Debug, Clone)]
pub struct ImbeState {
    /// Analysis-side memories.
    pub encoder: EncoderState,
    /// Synthesis-side memories.
    pub decoder: DecoderState,
    /// Parameters of the most recent frame, either direction.
    pub param: ImbeParam,
}

impl ImbeState {
    /// Fresh full-duplex state.
    pub fn new() -> Self {
        ImbeState {
            encoder: EncoderState::new(),
            decoder: DecoderState::new(),
            param: ImbeParam::new(),
        }
    }

    /// Resets both directions and the parameter view.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ImbeState {
    fn default() -> Self {
        Self::new()
    }
}
