//! Tick loop driven by the manual timer.

use std::sync::atomic::AtomicBool;

use cm_engine::{link, Engine};
use cm_io::{level_stream, run_tick_loop, spawn_tick_thread, ManualTimer, TraceSink};
use cm_ir::{ChannelConfig, ClockLength, BAR_TICKS, NUM_CHANNELS};

fn quarter_clocks() -> [ChannelConfig; NUM_CHANNELS] {
    [ChannelConfig::clock(ClockLength::N4, ClockLength::N8); NUM_CHANNELS]
}

#[test]
fn loop_runs_until_timer_stops() {
    let (tx, rx) = link(120, 0);
    tx.set_running(true);
    let mut engine = Engine::new(quarter_clocks(), 1, rx);
    let mut sink = TraceSink::new();
    let stop = AtomicBool::new(false);
    let ticks = run_tick_loop(&mut engine, &mut ManualTimer::new(BAR_TICKS as u64, 120), &mut sink, &stop).unwrap();
    assert_eq!(ticks, BAR_TICKS as u64);
    assert_eq!(engine.now(), BAR_TICKS);
    // four opens and four closes per channel
    assert_eq!(sink.changes().len(), NUM_CHANNELS * 8);
}

#[test]
fn raised_stop_flag_runs_nothing() {
    let (tx, rx) = link(120, 0);
    tx.set_running(true);
    let mut engine = Engine::new(quarter_clocks(), 1, rx);
    let stop = AtomicBool::new(true);
    let ticks = run_tick_loop(&mut engine, &mut ManualTimer::new(10, 120), &mut TraceSink::new(), &stop).unwrap();
    assert_eq!(ticks, 0);
}

#[test]
fn thread_hands_engine_back() {
    let (tx, rx) = link(120, 0);
    tx.set_running(true);
    let engine = Engine::new(quarter_clocks(), 1, rx);
    let (sink, mut stream) = level_stream(4096);
    let thread = spawn_tick_thread(engine, ManualTimer::new(200, 120), sink).unwrap();
    while !thread.is_finished() {
        std::thread::yield_now();
    }
    let engine = thread.stop().unwrap();
    assert_eq!(engine.now(), 200);
    let opens = stream.drain().into_iter().filter(|c| c.channel == 0 && c.gate).count();
    assert_eq!(opens, 2);
}
