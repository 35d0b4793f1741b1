//! Allocation-free tick path tests.
//!
//! These tests verify that `Engine::on_tick()` does not allocate, whether
//! running, stopped, committing staged configuration or applying swing.
//! They run long enough to cover tick wraparound and every channel kind.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use cm_engine::{factory_channels, link, Engine, StageSender};
use cm_ir::{
    ChannelConfig, ChannelKind, ClockLength, StepSequence, BAR_TICKS, NUM_CHANNELS,
    TICK_LIMIT,
};
use fastrand::Rng;

fn running_engine(configs: [ChannelConfig; NUM_CHANNELS]) -> (Engine, StageSender) {
    let (tx, rx) = link(120, 0);
    tx.set_running(true);
    (Engine::new(configs, 1, rx), tx)
}

/// Tick `engine` for `ticks`, aborting on any heap allocation.
fn assert_ticks_alloc_free(engine: &mut Engine, ticks: u32) {
    assert_no_alloc(|| {
        for _ in 0..ticks {
            engine.on_tick();
        }
    });
}

#[test]
fn factory_layout_alloc_free() {
    let (mut engine, _tx) = running_engine(factory_channels(&mut Rng::with_seed(1)));
    assert_ticks_alloc_free(&mut engine, TICK_LIMIT + BAR_TICKS);
}

#[test]
fn every_kind_alloc_free() {
    let configs = [
        ChannelConfig::clock(ClockLength::N16, ClockLength::N32),
        ChannelConfig::with_kind(ChannelKind::Euclidean { steps: 7, length: 13 }, ClockLength::N16),
        ChannelConfig::with_kind(
            ChannelKind::RandomTrigger { probability: 40, length: 0, pattern: None },
            ClockLength::N32,
        ),
        ChannelConfig::with_kind(
            ChannelKind::RandomTrigger { probability: 60, length: 32, pattern: Some(StepSequence::from_bits(0xA5A5_0F0F)) },
            ClockLength::N16,
        ),
        ChannelConfig::with_kind(ChannelKind::RampUp, ClockLength::N4),
        ChannelConfig::with_kind(ChannelKind::RampDown, ClockLength::N2),
        ChannelConfig::with_kind(ChannelKind::Voltage { length: 0, levels: None }, ClockLength::N8),
        ChannelConfig::with_kind(ChannelKind::Sine, ClockLength::N1),
    ];
    let (mut engine, _tx) = running_engine(configs);
    assert_ticks_alloc_free(&mut engine, BAR_TICKS * 16);
}

#[test]
fn commits_and_swing_alloc_free() {
    let (mut engine, mut tx) = running_engine([ChannelConfig::default(); NUM_CHANNELS]);
    for bar in 0..8u32 {
        let channel = bar as usize % NUM_CHANNELS;
        tx.publish_config(channel, ChannelConfig::clock(ClockLength::N16, ClockLength::N64)).unwrap();
        tx.stage_swing((bar * 4) as u8);
        assert_ticks_alloc_free(&mut engine, BAR_TICKS);
    }
}

#[test]
fn stop_and_restart_alloc_free() {
    let (mut engine, mut tx) = running_engine(factory_channels(&mut Rng::with_seed(2)));
    assert_ticks_alloc_free(&mut engine, 500);
    tx.set_running(false);
    tx.publish_config(3, ChannelConfig::clock(ClockLength::N8, ClockLength::N16)).unwrap();
    assert_ticks_alloc_free(&mut engine, 50);
    tx.set_running(true);
    assert_ticks_alloc_free(&mut engine, 500);
}
