//! IMBE codec facade.
//!
//! Ties the analysis and synthesis stages together behind the frame-based
//! interface the rest of the crate exposes: 160 samples of 8 kHz PCM in,
//! one 88-bit frame vector (11 bytes on the wire) out, and back again.

use tracing::{debug, trace};

use crate::error::{CodecError, Result};
use crate::types::{AudioCodec, AudioCodecExt, CodecInfo};

use super::bits::{BitReader, BitWriter, FrameVector, FRAME_BYTES};
use super::ops::{add, Word16};
use super::spectral::{self, AmplitudeCode};
use super::state::{
    bands_for, fund_freq_for, harms_for, index_to_pitch, pitch_to_index, ImbeParam, ImbeState,
};
use super::{enhance, pitch, unvoiced, voiced, voicing};
use super::{FRAME, NUM_BANDS_MAX, NUM_HARMS_MAX};

/// IMBE vocoder, full duplex.
///
/// One instance carries independent encoder and decoder state, so the same
/// object can service both directions of a call. Frames are fixed: every
/// encode consumes exactly [`FRAME`] samples and every decode produces the
/// same.
///
/// # Example
/// ```
/// use imbe_vocoder::codecs::imbe::ImbeVocoder;
///
/// let mut codec = ImbeVocoder::new();
///
/// let pcm = [0i16; 160];
/// let frame = codec.encode_frame(&pcm);
/// let synth = codec.decode_frame(&frame);
/// assert_eq!(synth.len(), 160);
/// ```
#[derive(Debug, Clone)]
pub struct ImbeVocoder {
    state: ImbeState,
}

impl ImbeVocoder {
    /// Creates a codec in the silence-equivalent initial state.
    pub fn new() -> Self {
        debug!(
            "Creating IMBE codec: 8000Hz, 4400bps, {} samples/frame",
            FRAME
        );
        ImbeVocoder {
            state: ImbeState::new(),
        }
    }

    /// Returns the codec to its initial state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.state.reset();
        debug!("IMBE codec reset");
    }

    /// Parameters of the most recently processed frame, either direction.
    pub fn params(&self) -> &ImbeParam {
        &self.state.param
    }

    /// Analyzes one 20 ms frame of speech into a quantized frame vector.
    ///
    /// Cannot fail: any 160-sample input produces a valid frame. The band
    /// structure is derived from the quantized pitch, never the raw
    /// estimate, so the decoder recovers the identical layout from the
    /// 8-bit pitch field alone.
    pub fn encode_frame(&mut self, speech: &[Word16; FRAME]) -> FrameVector {
        pitch::prepare_frame(&mut self.state.encoder, speech);
        let (pitch_raw, e_p) = pitch::pitch_estimate(&mut self.state.encoder);

        let pitch_idx = pitch_to_index(pitch_raw);
        let pitch = index_to_pitch(pitch_idx);
        let num_harms = harms_for(pitch);
        let num_bands = bands_for(num_harms);
        let fund_freq = fund_freq_for(pitch);

        let spectrum = spectral::analysis_spectrum(&self.state.encoder);
        let voiced_bands = voicing::classify(
            &mut self.state.encoder,
            &spectrum,
            fund_freq,
            num_harms,
            num_bands,
            e_p,
        );
        let voiced_harms = voicing::expand_voicing(&voiced_bands, num_harms, num_bands);
        let (code, log2_sa, sa) = spectral::encode_amplitudes(
            &mut self.state.encoder,
            &spectrum,
            fund_freq,
            num_harms,
            &voiced_harms,
        );

        let mut w = BitWriter::new();
        w.put(pitch_idx, 8);
        for &v in voiced_bands.iter().take(num_bands) {
            w.put(v as u16, 1);
        }
        w.put(code.gain_idx, 6);
        for l in 0..num_harms {
            if code.alloc[l] > 0 {
                w.put(code.resid_idx[l], code.alloc[l] as u32);
            }
        }
        let fv = w.finish();

        self.state.param = ImbeParam {
            pitch,
            fund_freq,
            num_harms,
            num_bands,
            voiced: voiced_bands,
            sa,
            log2_sa,
            e_p,
        };
        trace!(
            "IMBE encoded frame: pitch {}.{:02}, {} harmonics, {} bands",
            pitch / 4,
            25 * (pitch % 4),
            num_harms,
            num_bands
        );
        fv
    }

    /// Synthesizes one 20 ms frame of speech from a quantized frame vector.
    ///
    /// Cannot fail: every bit pattern decodes to something (out-of-range
    /// fields clamp), so corrupted frames degrade the output rather than
    /// the call.
    pub fn decode_frame(&mut self, fv: &FrameVector) -> [Word16; FRAME] {
        let mut r = BitReader::new(fv);
        let pitch = index_to_pitch(r.get(8));
        let num_harms = harms_for(pitch);
        let num_bands = bands_for(num_harms);
        let fund_freq = fund_freq_for(pitch);

        let mut voiced_bands = [false; NUM_BANDS_MAX];
        for band in voiced_bands.iter_mut().take(num_bands) {
            *band = r.get(1) != 0;
        }
        let gain_idx = r.get(6);

        let voiced_harms = voicing::expand_voicing(&voiced_bands, num_harms, num_bands);
        let alloc = spectral::allocate_bits(num_harms, &voiced_harms);
        let mut code = AmplitudeCode {
            gain_idx,
            resid_idx: [0; NUM_HARMS_MAX],
            alloc,
        };
        for l in 0..num_harms {
            if alloc[l] > 0 {
                code.resid_idx[l] = r.get(alloc[l] as u32);
            }
        }

        let log2_sa = spectral::decode_amplitudes(&mut self.state.decoder, &code, num_harms);

        // Synthesis runs on enhanced amplitudes; the prediction history
        // keeps the plain reconstruction so it stays in lockstep with the
        // encoder's copy.
        let mut enhanced = log2_sa;
        enhance::enhance(&mut enhanced, num_harms);
        let sa = spectral::linear_amps(&enhanced, num_harms);

        let v = voiced::synth_voiced(
            &mut self.state.decoder,
            &sa,
            &voiced_harms,
            num_harms,
            fund_freq,
        );
        let uv = unvoiced::synth_unvoiced(
            &mut self.state.decoder,
            &enhanced,
            &voiced_harms,
            num_harms,
            fund_freq,
        );

        let mut out = [0; FRAME];
        for (o, (&a, &b)) in out.iter_mut().zip(v.iter().zip(uv.iter())) {
            *o = add(a, b);
        }

        // Synthesis memories rotate only now, after both synthesizers have
        // interpolated against the previous frame.
        let dec = &mut self.state.decoder;
        dec.prev_sa = sa;
        dec.prev_voiced = voiced_harms;
        dec.prev_num_harms = num_harms;
        dec.prev_fund_freq = fund_freq;

        self.state.param = ImbeParam {
            pitch,
            fund_freq,
            num_harms,
            num_bands,
            voiced: voiced_bands,
            sa,
            log2_sa: enhanced,
            e_p: 0,
        };
        trace!(
            "IMBE decoded frame: pitch {}.{:02}, {} harmonics, {} bands",
            pitch / 4,
            25 * (pitch % 4),
            num_harms,
            num_bands
        );
        out
    }

    /// Encodes one frame straight to the 11-byte 4400 bps wire format.
    pub fn encode_4400(&mut self, speech: &[Word16; FRAME]) -> [u8; FRAME_BYTES] {
        self.encode_frame(speech).pack()
    }

    /// Decodes one 11-byte 4400 bps wire frame.
    pub fn decode_4400(&mut self, bytes: &[u8; FRAME_BYTES]) -> [Word16; FRAME] {
        self.decode_frame(&FrameVector::unpack(bytes))
    }
}

impl Default for ImbeVocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCodec for ImbeVocoder {
    fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>> {
        let frame: &[i16; FRAME] =
            samples
                .try_into()
                .map_err(|_| CodecError::InvalidFrameSize {
                    expected: FRAME,
                    actual: samples.len(),
                })?;
        let bytes = self.encode_4400(frame);
        trace!("IMBE encoded {} samples to {} bytes", FRAME, bytes.len());
        Ok(bytes.to_vec())
    }

    fn decode(&mut self, data: &[u8]) -> Result<Vec<i16>> {
        let bytes: &[u8; FRAME_BYTES] =
            data.try_into().map_err(|_| CodecError::InvalidFrameSize {
                expected: FRAME_BYTES,
                actual: data.len(),
            })?;
        let pcm = self.decode_4400(bytes);
        trace!("IMBE decoded {} bytes to {} samples", FRAME_BYTES, FRAME);
        Ok(pcm.to_vec())
    }

    fn info(&self) -> CodecInfo {
        CodecInfo {
            name: "IMBE",
            sample_rate: 8000,
            channels: 1,
            bitrate: 4400,
            frame_size: FRAME,
            payload_type: None,
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.reset();
        Ok(())
    }

    fn frame_size(&self) -> usize {
        FRAME
    }
}

impl AudioCodecExt for ImbeVocoder {
    fn encode_to_buffer(&mut self, samples: &[i16], output: &mut [u8]) -> Result<usize> {
        let frame: &[i16; FRAME] =
            samples
                .try_into()
                .map_err(|_| CodecError::InvalidFrameSize {
                    expected: FRAME,
                    actual: samples.len(),
                })?;
        if output.len() < FRAME_BYTES {
            return Err(CodecError::BufferTooSmall {
                needed: FRAME_BYTES,
                actual: output.len(),
            });
        }
        output[..FRAME_BYTES].copy_from_slice(&self.encode_4400(frame));
        Ok(FRAME_BYTES)
    }

    fn decode_to_buffer(&mut self, data: &[u8], output: &mut [i16]) -> Result<usize> {
        let bytes: &[u8; FRAME_BYTES] =
            data.try_into().map_err(|_| CodecError::InvalidFrameSize {
                expected: FRAME_BYTES,
                actual: data.len(),
            })?;
        if output.len() < FRAME {
            return Err(CodecError::BufferTooSmall {
                needed: FRAME,
                actual: output.len(),
            });
        }
        output[..FRAME].copy_from_slice(&self.decode_4400(bytes));
        Ok(FRAME)
    }

    fn max_encoded_size(&self, input_samples: usize) -> usize {
        // 160 samples become 11 bytes
        input_samples.div_ceil(FRAME) * FRAME_BYTES
    }

    fn max_decoded_size(&self, input_bytes: usize) -> usize {
        // 11 bytes become 160 samples
        input_bytes.div_ceil(FRAME_BYTES) * FRAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_frame(start: usize, period: usize, amp: f64) -> [i16; FRAME] {
        let mut pcm = [0i16; FRAME];
        for (n, s) in pcm.iter_mut().enumerate() {
            let t = (start + n) as f64;
            *s = (amp * (2.0 * std::f64::consts::PI * t / period as f64).sin()) as i16;
        }
        pcm
    }

    fn rms(frame: &[i16]) -> f64 {
        let e: f64 = frame.iter().map(|&s| s as f64 * s as f64).sum();
        (e / frame.len() as f64).sqrt()
    }

    #[test]
    fn test_encode_emits_well_formed_frames() {
        let mut codec = ImbeVocoder::new();
        for i in 0..4 {
            let fv = codec.encode_frame(&sine_frame(i * FRAME, 40, 8000.0));
            // Every word within its field width, wire round trip lossless.
            assert_eq!(FrameVector::new(fv.words), fv);
            assert_eq!(FrameVector::unpack(&fv.pack()), fv);
        }
    }

    #[test]
    fn test_silence_codes_to_silence() {
        let mut codec = ImbeVocoder::new();
        let quiet = [0i16; FRAME];
        for _ in 0..4 {
            let fv = codec.encode_frame(&quiet);
            let out = codec.decode_frame(&fv);
            assert!(out.iter().all(|&s| s.unsigned_abs() < 100));
        }
    }

    #[test]
    fn test_tone_round_trip_preserves_level() {
        // 200 Hz tone at amplitude 8000: after a few frames of history the
        // synthesized level should sit near the input level.
        let mut codec = ImbeVocoder::new();
        let mut out = [0i16; FRAME];
        for i in 0..8 {
            let fv = codec.encode_frame(&sine_frame(i * FRAME, 40, 8000.0));
            out = codec.decode_frame(&fv);
        }
        let level = rms(&out);
        let input_level = 8000.0 / std::f64::consts::SQRT_2;
        assert!(
            level > input_level * 0.35 && level < input_level * 2.8,
            "rms {} vs input {}",
            level,
            input_level,
        );
    }

    #[test]
    fn test_tone_is_classified_voiced() {
        let mut codec = ImbeVocoder::new();
        for i in 0..6 {
            codec.encode_frame(&sine_frame(i * FRAME, 40, 8000.0));
        }
        let p = codec.params();
        // Pitch lock: 40 samples = 160 quarter-samples.
        assert!((p.pitch - 160).abs() <= 4, "pitch {}", p.pitch);
        assert!(p.voiced[..p.num_bands].iter().any(|&v| v));
    }

    #[test]
    fn test_decode_is_deterministic() {
        let mut a = ImbeVocoder::new();
        let mut b = ImbeVocoder::new();
        let fv = FrameVector::new([0x5a3, 0x7ff, 0x001, 0x234, 0x3c3, 0x555, 0x0aa, 0x42]);
        for _ in 0..3 {
            assert_eq!(a.decode_frame(&fv), b.decode_frame(&fv));
        }
    }

    #[test]
    fn test_reset_restores_initial_behavior() {
        let mut codec = ImbeVocoder::new();
        let mut first = Vec::new();
        for i in 0..3 {
            first.push(codec.encode_frame(&sine_frame(i * FRAME, 52, 6000.0)));
        }
        codec.reset();
        for (i, fv) in first.iter().enumerate() {
            assert_eq!(codec.encode_frame(&sine_frame(i * FRAME, 52, 6000.0)), *fv);
        }
    }

    #[test]
    fn test_extreme_frames_decode_without_panic() {
        let mut codec = ImbeVocoder::new();
        // Shortest pitch, everything unvoiced, zero residuals.
        codec.decode_frame(&FrameVector::default());
        // Longest pitch, all bands voiced, saturated fields.
        codec.decode_frame(&FrameVector::new([0xfff; 8]));
        // Out-of-range pitch index clamps rather than wraps.
        let out = codec.decode_frame(&FrameVector::new([0xff0, 0, 0, 0, 0, 0, 0, 0]));
        assert_eq!(out.len(), FRAME);
        assert_eq!(codec.params().pitch, 488);
    }

    #[test]
    fn test_params_track_decoded_frame() {
        let mut codec = ImbeVocoder::new();
        codec.decode_frame(&FrameVector::new([0x600, 0, 0, 0, 0, 0, 0, 0]));
        let p = codec.params();
        assert!((84..=488).contains(&p.pitch));
        assert_eq!(p.num_harms, harms_for(p.pitch));
        assert_eq!(p.num_bands, bands_for(p.num_harms));
        assert_eq!(p.fund_freq, fund_freq_for(p.pitch));
    }

    #[test]
    fn test_trait_rejects_wrong_sizes() {
        let mut codec = ImbeVocoder::new();
        let r = AudioCodec::encode(&mut codec, &[0i16; 100]);
        assert!(matches!(
            r,
            Err(CodecError::InvalidFrameSize {
                expected: FRAME,
                actual: 100,
            })
        ));
        let r = AudioCodec::decode(&mut codec, &[0u8; 10]);
        assert!(matches!(
            r,
            Err(CodecError::InvalidFrameSize {
                expected: FRAME_BYTES,
                actual: 10,
            })
        ));
    }

    #[test]
    fn test_trait_round_trip() {
        let mut codec = ImbeVocoder::new();
        let pcm = sine_frame(0, 40, 4000.0);
        let bytes = AudioCodec::encode(&mut codec, &pcm).unwrap();
        assert_eq!(bytes.len(), FRAME_BYTES);
        let out = AudioCodec::decode(&mut codec, &bytes).unwrap();
        assert_eq!(out.len(), FRAME);
    }

    #[test]
    fn test_buffer_api_sizes() {
        let mut codec = ImbeVocoder::new();
        let pcm = [0i16; FRAME];
        let mut small = [0u8; FRAME_BYTES - 1];
        assert!(matches!(
            codec.encode_to_buffer(&pcm, &mut small),
            Err(CodecError::BufferTooSmall {
                needed: FRAME_BYTES,
                actual: 10,
            })
        ));

        let mut bytes = [0u8; FRAME_BYTES];
        assert_eq!(codec.encode_to_buffer(&pcm, &mut bytes).unwrap(), FRAME_BYTES);

        let mut short_pcm = [0i16; FRAME - 1];
        assert!(matches!(
            codec.decode_to_buffer(&bytes, &mut short_pcm),
            Err(CodecError::BufferTooSmall { .. })
        ));
        let mut out = [0i16; FRAME];
        assert_eq!(codec.decode_to_buffer(&bytes, &mut out).unwrap(), FRAME);

        assert_eq!(codec.max_encoded_size(FRAME), FRAME_BYTES);
        assert_eq!(codec.max_encoded_size(FRAME * 3), FRAME_BYTES * 3);
        assert_eq!(codec.max_decoded_size(FRAME_BYTES), FRAME);
    }

    #[test]
    fn test_info() {
        let codec = ImbeVocoder::new();
        let info = codec.info();
        assert_eq!(info.name, "IMBE");
        assert_eq!(info.sample_rate, 8000);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bitrate, 4400);
        assert_eq!(info.frame_size, FRAME);
        assert_eq!(info.payload_type, None);
        assert!(!codec.supports_variable_frame_size());
    }

    #[test]
    fn test_wire_and_vector_paths_agree() {
        let mut a = ImbeVocoder::new();
        let mut b = ImbeVocoder::new();
        for i in 0..3 {
            let pcm = sine_frame(i * FRAME, 66, 5000.0);
            let fv = a.encode_frame(&pcm);
            let bytes = b.encode_4400(&pcm);
            assert_eq!(fv.pack(), bytes);
            assert_eq!(a.decode_frame(&fv), b.decode_4400(&bytes));
        }
    }
}
