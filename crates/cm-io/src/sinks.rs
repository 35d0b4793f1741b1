//! Output sinks.

use cm_engine::LevelChange;
use cm_ir::Tick;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::traits::OutputSink;

/// Forwards level changes from the tick thread into a ring buffer.
///
/// Pushing never blocks; if the reader falls behind, changes are dropped
/// and counted.
pub struct RingbufSink {
    producer: HeapProd<LevelChange>,
    tick: Tick,
    dropped: u64,
}

/// Reading end of a [`RingbufSink`].
pub struct LevelStream {
    consumer: HeapCons<LevelChange>,
}

/// Create a connected sink and stream holding up to `capacity` changes.
pub fn level_stream(capacity: usize) -> (RingbufSink, LevelStream) {
    let (producer, consumer) = HeapRb::<LevelChange>::new(capacity.max(1)).split();
    (RingbufSink { producer, tick: 0, dropped: 0 }, LevelStream { consumer })
}

impl RingbufSink {
    /// Changes lost because the stream was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl OutputSink for RingbufSink {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        let change = LevelChange { tick: self.tick, channel: channel as u8, gate, pwm };
        if self.producer.try_push(change).is_err() {
            self.dropped += 1;
        }
    }

    fn begin_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }
}

impl LevelStream {
    pub fn try_next(&mut self) -> Option<LevelChange> {
        self.consumer.try_pop()
    }

    /// Take every change currently buffered.
    pub fn drain(&mut self) -> Vec<LevelChange> {
        let mut out = Vec::new();
        while let Some(change) = self.consumer.try_pop() {
            out.push(change);
        }
        out
    }
}

/// Collects every change in memory. Used for offline traces.
#[derive(Debug, Default)]
pub struct TraceSink {
    tick: Tick,
    changes: Vec<LevelChange>,
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> &[LevelChange] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<LevelChange> {
        self.changes
    }
}

impl OutputSink for TraceSink {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        self.changes.push(LevelChange { tick: self.tick, channel: channel as u8, gate, pwm });
    }

    fn begin_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }
}

/// Logs every change at `trace` level.
#[derive(Debug, Default)]
pub struct LogSink {
    tick: Tick,
}

impl OutputSink for LogSink {
    fn set_channel_level(&mut self, channel: usize, gate: bool, pwm: u8) {
        tracing::trace!(tick = self.tick, channel, gate, pwm, "level");
    }

    fn begin_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::deliver;
    use cm_engine::TickReport;

    fn report(tick: Tick, changes: &[(u8, bool, u8)]) -> TickReport {
        let mut report = TickReport { tick, ..TickReport::default() };
        for &(channel, gate, pwm) in changes {
            report.changes.push(LevelChange { tick, channel, gate, pwm }).unwrap();
        }
        report
    }

    #[test]
    fn ring_sink_streams_in_order() {
        let (mut sink, mut stream) = level_stream(16);
        deliver(&report(4, &[(0, true, 0), (3, false, 0)]), &mut sink);
        deliver(&report(5, &[(7, false, 128)]), &mut sink);
        let got: Vec<(Tick, u8)> = stream.drain().iter().map(|c| (c.tick, c.channel)).collect();
        assert_eq!(got, vec![(4, 0), (4, 3), (5, 7)]);
        assert_eq!(stream.try_next(), None);
    }

    #[test]
    fn full_ring_drops_and_counts() {
        let (mut sink, mut stream) = level_stream(2);
        deliver(&report(1, &[(0, true, 0), (1, true, 0), (2, true, 0)]), &mut sink);
        assert_eq!(sink.dropped(), 1);
        assert_eq!(stream.drain().len(), 2);
    }

    #[test]
    fn tuple_sink_feeds_both() {
        let mut sinks = (TraceSink::new(), TraceSink::new());
        deliver(&report(9, &[(2, true, 0)]), &mut sinks);
        assert_eq!(sinks.0.changes(), sinks.1.changes());
        assert_eq!(sinks.0.changes()[0].tick, 9);
    }
}
