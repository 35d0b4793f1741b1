//! Benchmarks for the per-tick scheduler path.
//!
//! Run with: cargo bench -p cm-engine --bench tick_bench

use cm_engine::{factory_channels, link, Engine};
use cm_ir::{ChannelConfig, ChannelKind, ClockLength, BAR_TICKS, NUM_CHANNELS};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fastrand::Rng;

fn running_engine(configs: [ChannelConfig; NUM_CHANNELS], swing: u8) -> Engine {
    let (tx, rx) = link(120, 0);
    if swing > 0 {
        tx.stage_swing(swing);
    }
    tx.set_running(true);
    // the sender is dropped; the control block lives on in the receiver
    Engine::new(configs, 1, rx)
}

fn bench_one_bar(c: &mut Criterion) {
    let mut group = c.benchmark_group("one_bar");

    group.bench_function("factory", |b| {
        let mut engine = running_engine(factory_channels(&mut Rng::with_seed(1)), 0);
        b.iter(|| {
            for _ in 0..BAR_TICKS {
                black_box(engine.on_tick());
            }
        });
    });

    group.bench_function("all_sine", |b| {
        let sine = ChannelConfig::with_kind(ChannelKind::Sine, ClockLength::N4);
        let mut engine = running_engine([sine; NUM_CHANNELS], 0);
        b.iter(|| {
            for _ in 0..BAR_TICKS {
                black_box(engine.on_tick());
            }
        });
    });

    group.bench_function("swung_sixteenths", |b| {
        let clock = ChannelConfig::clock(ClockLength::N16, ClockLength::N32);
        let mut engine = running_engine([clock; NUM_CHANNELS], 20);
        b.iter(|| {
            for _ in 0..BAR_TICKS {
                black_box(engine.on_tick());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_one_bar);
criterion_main!(benches);
