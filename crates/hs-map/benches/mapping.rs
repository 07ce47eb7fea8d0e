use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hs_core::scale::SCALE_C_MAJOR_DIATONIC;
use hs_map::quantize::{QuantizeOptions, quantize};
use hs_map::runs::encode;
use hs_map::voice::{PipelineParams, VoiceInput, render_voices};

/// Ten years of synthetic daily flow with a seasonal swing.
fn synthetic_flow(days: usize, phase: f64) -> Vec<f64> {
    (0..days)
        .map(|d| {
            let t = d as f64 / 365.25 * std::f64::consts::TAU + phase;
            800.0 + 600.0 * t.sin() + 40.0 * (t * 13.0).cos()
        })
        .collect()
}

fn bench_quantize(c: &mut Criterion) {
    let series = synthetic_flow(3650, 0.0);
    let opts = QuantizeOptions {
        log_scale: true,
        ..QuantizeOptions::default()
    };
    c.bench_function("quantize_3650_log", |b| {
        b.iter(|| quantize(black_box(&series), SCALE_C_MAJOR_DIATONIC, &opts))
    });
}

fn bench_encode(c: &mut Criterion) {
    let opts = QuantizeOptions::default();
    let pitches = quantize(&synthetic_flow(3650, 0.0), SCALE_C_MAJOR_DIATONIC, &opts)
        .unwrap_or_default();
    c.bench_function("encode_3650", |b| b.iter(|| encode(black_box(&pitches))));
}

fn bench_three_voices(c: &mut Criterion) {
    let inputs: Vec<VoiceInput> = (0..3)
        .map(|i| VoiceInput {
            series_id: format!("g{i}"),
            values: synthetic_flow(3650, f64::from(i)),
            scale: SCALE_C_MAJOR_DIATONIC.to_vec(),
            program: 0,
            invert: i == 1,
            offset: 0,
        })
        .collect();
    let params = PipelineParams::default();
    c.bench_function("render_3_voices_3650", |b| {
        b.iter(|| render_voices(black_box(&inputs), &params))
    });
}

criterion_group!(benches, bench_quantize, bench_encode, bench_three_voices);
criterion_main!(benches);
