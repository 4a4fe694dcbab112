//! DSP Benchmarks
//!
//! Performance benchmarks for EQ automation and cue extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use segue::analysis::CuePointExtractor;
use segue::dsp::{EqEngine, GainPair, InterpolationMode, Keyframe, TransitionScheduler};
use segue::AudioBuffer;

fn benchmark_static_eq(c: &mut Criterion) {
    let buffer = AudioBuffer::sine_wave(440.0, 0.8, 10.0, 44100);
    let engine = EqEngine::default();
    let gains = GainPair { low: 0.2, high: 1.0 };

    c.bench_function("eq_10s_mono", |b| {
        b.iter(|| engine.apply_gains(black_box(&buffer), gains).unwrap())
    });
}

fn benchmark_transition(c: &mut Criterion) {
    let buffer = AudioBuffer::sine_wave(440.0, 0.8, 30.0, 44100);
    let scheduler = TransitionScheduler::default();
    let keyframes = [
        Keyframe::new(0.0, 1.0, 1.0),
        Keyframe::new(10.0, 1.0, 1.0),
        Keyframe::new(20.0, 1.0, 0.1),
    ];

    c.bench_function("sigmoid_transition_30s", |b| {
        b.iter(|| {
            scheduler
                .schedule(black_box(&buffer), &keyframes, 44100, InterpolationMode::Sigmoid)
                .unwrap()
        })
    });
}

fn benchmark_cue_extraction(c: &mut Criterion) {
    let buffer = AudioBuffer::sine_wave(110.0, 0.5, 60.0, 44100);
    let beats: Vec<f64> = (0..120).map(|i| i as f64 * 0.5).collect();
    let extractor = CuePointExtractor::default();

    c.bench_function("cues_60s_120_beats", |b| {
        b.iter(|| extractor.extract(black_box(&buffer), &beats).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_static_eq,
    benchmark_transition,
    benchmark_cue_extraction
);
criterion_main!(benches);
