//! Benchmarks for the IMBE codec
//!
//! Run with: cargo bench --bench codec_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use imbe_vocoder::codecs::imbe::{FRAME, FRAME_BYTES};
use imbe_vocoder::{AudioCodec, AudioCodecExt, FrameVector, ImbeVocoder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One frame of a steady tone with the given period in samples.
fn tone_frame(start: usize, period: f64, amp: f64) -> [i16; FRAME] {
    let mut frame = [0i16; FRAME];
    for (i, s) in frame.iter_mut().enumerate() {
        let phase = 2.0 * std::f64::consts::PI * ((start + i) as f64) / period;
        *s = (amp * phase.sin()) as i16;
    }
    frame
}

/// One frame of deterministic pseudo-random noise.
fn noise_frame(seed: u64, amp: i16) -> [i16; FRAME] {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut frame = [0i16; FRAME];
    for s in frame.iter_mut() {
        *s = rng.gen_range(-amp..amp);
    }
    frame
}

// ============================================================================
// Encoder Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("imbe_encode");

    let signals = [
        ("silence", [0i16; FRAME]),
        ("tone", tone_frame(0, 57.0, 12000.0)),
        ("noise", noise_frame(0x5eed, 9000)),
    ];

    for (name, frame) in signals.iter() {
        group.throughput(Throughput::Elements(FRAME as u64));

        group.bench_with_input(BenchmarkId::new("frame", name), frame, |b, frame| {
            let mut codec = ImbeVocoder::new();
            b.iter(|| codec.encode_frame(black_box(frame)))
        });
    }

    group.finish();
}

// ============================================================================
// Decoder Benchmarks
// ============================================================================

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("imbe_decode");

    // Encode representative signals once, then time the decoder alone.
    let tone_fv = {
        let mut codec = ImbeVocoder::new();
        let mut fv = FrameVector::default();
        for k in 0..4 {
            fv = codec.encode_frame(&tone_frame(k * FRAME, 57.0, 12000.0));
        }
        fv
    };
    let noise_fv = ImbeVocoder::new().encode_frame(&noise_frame(0x5eed, 9000));
    // All field bits set decodes with the longest pitch and all 56 harmonics.
    let dense_fv = FrameVector::new([0xffff; 8]);

    let inputs = [
        ("tone", tone_fv),
        ("noise", noise_fv),
        ("max_harmonics", dense_fv),
    ];

    for (name, fv) in inputs.iter() {
        group.throughput(Throughput::Elements(FRAME as u64));

        group.bench_with_input(BenchmarkId::new("frame", name), fv, |b, fv| {
            let mut codec = ImbeVocoder::new();
            b.iter(|| codec.decode_frame(black_box(fv)))
        });
    }

    group.finish();
}

// ============================================================================
// Full Path Benchmarks
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("imbe_round_trip");
    group.throughput(Throughput::Elements(FRAME as u64));

    let samples: Vec<i16> = tone_frame(0, 80.0, 8000.0).to_vec();

    group.bench_function("trait_api", |b| {
        let mut codec = ImbeVocoder::new();
        b.iter(|| {
            let encoded = codec.encode(black_box(&samples)).unwrap();
            codec.decode(&encoded).unwrap()
        })
    });

    group.bench_function("buffer_api", |b| {
        let mut codec = ImbeVocoder::new();
        let mut bytes = [0u8; FRAME_BYTES];
        let mut pcm = [0i16; FRAME];
        b.iter(|| {
            codec
                .encode_to_buffer(black_box(&samples), &mut bytes)
                .unwrap();
            codec.decode_to_buffer(&bytes, &mut pcm).unwrap();
            pcm[0]
        })
    });

    group.finish();
}

// ============================================================================
// Wire Format Benchmarks
// ============================================================================

fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("imbe_packing");

    let fv = FrameVector::new([
        0x0123, 0x0456, 0x0789, 0x0abc, 0x0def, 0x0135, 0x0246, 0x0042,
    ]);
    let bytes = fv.pack();

    group.bench_function("pack", |b| b.iter(|| black_box(&fv).pack()));

    group.bench_function("unpack", |b| {
        b.iter(|| FrameVector::unpack(black_box(&bytes)))
    });

    group.finish();
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    name = codec_benches;
    config = Criterion::default();
    targets = bench_encode, bench_decode, bench_round_trip
);

criterion_group!(
    name = wire_benches;
    config = Criterion::default();
    targets = bench_packing
);

criterion_main!(codec_benches, wire_benches);
