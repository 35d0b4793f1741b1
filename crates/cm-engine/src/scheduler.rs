//! Tick scheduler: the single owner of the tick counter and the live channels.
//!
//! [`Engine::on_tick`] is called once per timer period. Within one tick the
//! order is fixed: bar-boundary commits, channel dispatch in index order,
//! level diffing, then the counter increment. Nothing on this path
//! allocates or blocks.

use cm_ir::{is_bar_boundary, wrap_add, ChannelConfig, Tick, NUM_CHANNELS};
use fastrand::Rng;
use heapless::Vec;

use crate::channel::{Channel, OutputLevel};
use crate::commit::StageReceiver;
use crate::swing::SwingTable;

/// One output changing level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelChange {
    pub tick: Tick,
    pub channel: u8,
    pub gate: bool,
    pub pwm: u8,
}

/// What happened during one call to [`Engine::on_tick`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick that was processed.
    pub tick: Tick,
    /// Outputs whose level changed, in channel order.
    pub changes: Vec<LevelChange, NUM_CHANNELS>,
    /// Bit `i` set when channel `i` took a staged configuration.
    pub committed: u8,
    /// Whether a staged swing amount was applied.
    pub swing_committed: bool,
}

impl TickReport {
    fn new(tick: Tick) -> Self {
        Self { tick, ..Self::default() }
    }

    pub fn is_committed(&self, channel: usize) -> bool {
        channel < NUM_CHANNELS && self.committed & (1 << channel) != 0
    }
}

/// The real-time core: eight channels driven from one tick counter.
pub struct Engine {
    channels: [Channel; NUM_CHANNELS],
    published: [OutputLevel; NUM_CHANNELS],
    now: Tick,
    swing: SwingTable,
    rng: Rng,
    link: StageReceiver,
    running: bool,
    /// Stop count last acted on.
    stops_seen: u32,
}

impl Engine {
    /// Build an engine with every channel reset to tick 0. The transport
    /// follows the link's running flag.
    pub fn new(configs: [ChannelConfig; NUM_CHANNELS], seed: u64, link: StageReceiver) -> Self {
        let mut rng = Rng::with_seed(seed);
        let mut channels = configs.map(|config| Channel::new(config, &mut rng));
        for channel in channels.iter_mut() {
            channel.reset(0, &mut rng);
        }
        Self {
            channels,
            published: [OutputLevel::default(); NUM_CHANNELS],
            now: 0,
            swing: SwingTable::new(link.swing()),
            rng,
            stops_seen: link.stop_count(),
            link,
            running: false,
        }
    }

    /// Process one tick.
    pub fn on_tick(&mut self) -> TickReport {
        let stops = self.link.stop_count();
        if stops != self.stops_seen {
            self.stops_seen = stops;
            if self.running {
                self.running = false;
                self.halt();
            }
        }
        if !self.link.is_running() {
            return self.stopped_tick();
        }
        if !self.running {
            self.running = true;
            tracing::trace!(tick = self.now, "transport running");
        }

        let mut report = TickReport::new(self.now);
        if is_bar_boundary(self.now) {
            self.commit_staged(&mut report);
        }
        for channel in self.channels.iter_mut() {
            channel.dispatch(self.now, &self.swing, &mut self.rng);
        }
        self.collect_changes(&mut report);
        self.now = wrap_add(self.now, 1);
        report
    }

    /// [`Engine::on_tick`] under the allocation guard; any heap allocation
    /// aborts when the `assert_no_alloc` allocator is installed.
    #[cfg(feature = "alloc_check")]
    pub fn on_tick_checked(&mut self) -> TickReport {
        assert_no_alloc::assert_no_alloc(|| self.on_tick())
    }

    /// A tick with the transport stopped: halt if the stop count has not
    /// caught up yet, then apply staged configuration immediately.
    fn stopped_tick(&mut self) -> TickReport {
        if self.running {
            self.running = false;
            self.halt();
        }
        let mut report = TickReport::new(self.now);
        self.commit_staged(&mut report);
        self.collect_changes(&mut report);
        report
    }

    /// Return to tick 0 with every channel on its default timeline.
    fn halt(&mut self) {
        tracing::trace!(tick = self.now, "transport stopped");
        self.now = 0;
        for channel in self.channels.iter_mut() {
            channel.reset(0, &mut self.rng);
        }
    }

    fn commit_staged(&mut self, report: &mut TickReport) {
        if let Some(amount) = self.link.take_swing() {
            self.swing = SwingTable::new(amount);
            for channel in self.channels.iter_mut() {
                channel.reset(self.now, &mut self.rng);
            }
            report.swing_committed = true;
            tracing::trace!(tick = self.now, amount, "swing committed");
        }
        for (index, channel) in self.channels.iter_mut().enumerate() {
            if let Some(config) = self.link.take_config(index) {
                channel.apply_config(config, &mut self.rng);
                channel.reset(self.now, &mut self.rng);
                report.committed |= 1 << index;
                tracing::trace!(tick = self.now, channel = index, "channel committed");
            }
        }
    }

    fn collect_changes(&mut self, report: &mut TickReport) {
        for (index, channel) in self.channels.iter().enumerate() {
            let level = channel.level();
            if level != self.published[index] {
                self.published[index] = level;
                // At most one change per channel, so this never overflows.
                let _ = report.changes.push(LevelChange {
                    tick: report.tick,
                    channel: index as u8,
                    gate: level.gate,
                    pwm: level.pwm,
                });
            }
        }
    }

    /// Tick the next call to [`Engine::on_tick`] will process.
    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn swing(&self) -> &SwingTable {
        &self.swing
    }

    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// Levels as last reported through [`TickReport::changes`].
    pub fn levels(&self) -> [OutputLevel; NUM_CHANNELS] {
        self.published
    }
}
