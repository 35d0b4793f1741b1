//! Headless controller for the clockmod generator.
//!
//! Owns the foreground side of the module: tempo and swing, the transport,
//! staging and committing channel configuration, live snapshots, and the
//! tick thread that runs the engine. Both the CLI and tests drive the
//! module through [`Controller`].

mod config;
mod edit;
mod error;
mod view;

use std::sync::Arc;

use cm_engine::{link, Engine, StageSender};
use cm_io::{run_tick_loop, spawn_tick_thread, LogSink, ManualTimer, OutputSink, ThreadTimer, TickThread, TraceSink};
use cm_ir::{clamp_swing, ChannelConfig, Tick, NUM_CHANNELS};
use fastrand::Rng;

pub use cm_engine::{LevelChange, OutputLevel};
pub use cm_ir::{ChannelKind, ClockLength, KindTag};
pub use config::{fit_to_output, ModuleConfig, DEFAULT_SEED};
pub use edit::{kind_with_tag, ChannelEditor, EditRow, PROBABILITY_STEP};
pub use error::ControlError;
pub use view::{SharedView, ViewPublisher};

/// One channel as seen from the foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSnapshot {
    /// Configuration the engine is running.
    pub live: ChannelConfig,
    /// Staged but not yet committed.
    pub staged: Option<ChannelConfig>,
    /// Committed and waiting for the next bar boundary.
    pub pending: Option<ChannelConfig>,
    pub level: OutputLevel,
}

/// Module state as seen from the foreground.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleSnapshot {
    pub tempo: u8,
    pub swing: u8,
    pub swing_pending: bool,
    /// Swing changes the engine has applied since power-on.
    pub swing_commits: u32,
    pub running: bool,
    pub powered: bool,
    pub tick: Tick,
    pub channels: [ChannelSnapshot; NUM_CHANNELS],
}

/// Headless module controller: owns the configuration and the tick thread.
pub struct Controller {
    config: ModuleConfig,
    staged: [Option<ChannelConfig>; NUM_CHANNELS],
    in_flight: [Option<ChannelConfig>; NUM_CHANNELS],
    sender: StageSender,
    view: Arc<SharedView>,
    engine: Option<Engine>,
    playback: Option<TickThread>,
    running: bool,
    preview_rng: Rng,
}

impl Controller {
    pub fn new(config: ModuleConfig) -> Self {
        let mut config = config.normalized();
        let mut preview_rng = Rng::with_seed(config.seed.rotate_left(17));
        config.channels = config
            .channels
            .map(|channel| cm_engine::generators::with_generated_pattern(&mut preview_rng, channel));
        let (sender, receiver) = link(config.tempo, config.swing);
        let engine = Engine::new(config.channels, config.seed, receiver);
        Self {
            staged: [None; NUM_CHANNELS],
            in_flight: [None; NUM_CHANNELS],
            sender,
            view: Arc::new(SharedView::default()),
            engine: Some(engine),
            playback: None,
            running: false,
            preview_rng,
            config,
        }
    }

    /// Configuration as last committed. Channels still waiting for a bar
    /// boundary show their previous configuration.
    pub fn config(&mut self) -> &ModuleConfig {
        self.refresh();
        &self.config
    }

    pub fn view(&self) -> Arc<SharedView> {
        self.view.clone()
    }

    // --- Tick thread ---

    /// Start the tick thread with outputs logged at trace level.
    pub fn power_on(&mut self) -> Result<(), ControlError> {
        self.power_on_with(LogSink::default())
    }

    /// Start the tick thread, delivering levels to `sink` as well as the shared view.
    pub fn power_on_with<S>(&mut self, sink: S) -> Result<(), ControlError>
    where
        S: OutputSink + Send + 'static,
    {
        if self.playback.is_some() {
            return Ok(());
        }
        let Some(engine) = self.engine.take() else {
            return Ok(());
        };
        let timer = ThreadTimer::new(self.sender.control());
        let sink = (ViewPublisher::new(self.view.clone()), sink);
        self.playback = Some(spawn_tick_thread(engine, timer, sink)?);
        tracing::info!(tempo = self.config.tempo, "module powered on");
        Ok(())
    }

    /// Stop the tick thread. The engine keeps its state for the next power-on.
    pub fn shutdown(&mut self) -> Result<(), ControlError> {
        if let Some(playback) = self.playback.take() {
            self.engine = Some(playback.stop()?);
            tracing::info!("module shut down");
        }
        Ok(())
    }

    pub fn is_powered(&self) -> bool {
        self.playback.as_ref().is_some_and(|p| !p.is_finished())
    }

    // --- Transport, tempo and swing ---

    pub fn start_transport(&mut self) {
        self.running = true;
        self.sender.set_running(true);
        tracing::info!("transport started");
    }

    /// Stop and rewind. Staged and pending configuration is kept and
    /// applies on the next tick.
    pub fn stop_transport(&mut self) {
        self.running = false;
        self.sender.set_running(false);
        tracing::info!("transport stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Set the tempo, clamped. Takes effect on the next timer period.
    pub fn set_tempo(&mut self, bpm: i32) -> u8 {
        let bpm = self.sender.set_tempo(bpm);
        if bpm != self.config.tempo {
            tracing::info!(bpm, "tempo changed");
        }
        self.config.tempo = bpm;
        bpm
    }

    pub fn nudge_tempo(&mut self, delta: i32) -> u8 {
        self.set_tempo(self.config.tempo as i32 + delta)
    }

    pub fn tempo(&self) -> u8 {
        self.config.tempo
    }

    /// Stage a swing amount, clamped. Applies at the next bar boundary
    /// and restarts every channel's timeline.
    pub fn set_swing(&mut self, amount: i32) -> u8 {
        let amount = clamp_swing(amount);
        self.sender.stage_swing(amount);
        self.config.swing = amount;
        tracing::debug!(amount, "swing staged");
        amount
    }

    pub fn nudge_swing(&mut self, delta: i32) -> u8 {
        self.set_swing(self.config.swing as i32 + delta)
    }

    pub fn swing(&self) -> u8 {
        self.config.swing
    }

    // --- Channel configuration ---

    fn check_channel(channel: usize) -> Result<(), ControlError> {
        if channel < NUM_CHANNELS {
            Ok(())
        } else {
            Err(ControlError::ChannelOutOfRange(channel))
        }
    }

    /// Stage `config` for `channel` and return the normalized preview that
    /// would be committed, with any random pattern already rolled.
    pub fn stage_channel_config(
        &mut self,
        channel: usize,
        config: ChannelConfig,
    ) -> Result<ChannelConfig, ControlError> {
        Self::check_channel(channel)?;
        if self.sender.is_pending(channel) {
            return Err(ControlError::CommitPending(channel));
        }
        let preview = cm_engine::generators::with_generated_pattern(
            &mut self.preview_rng,
            fit_to_output(channel, config),
        );
        self.staged[channel] = Some(preview);
        Ok(preview)
    }

    /// Hand the staged configuration for `channel` to the engine. It takes
    /// effect at the next bar boundary, or on the next tick while stopped.
    pub fn commit_channel_config(&mut self, channel: usize) -> Result<(), ControlError> {
        Self::check_channel(channel)?;
        let config = self.staged[channel].ok_or(ControlError::NothingStaged(channel))?;
        self.sender.publish_config(channel, config)?;
        self.staged[channel] = None;
        self.in_flight[channel] = Some(config);
        tracing::debug!(channel, kind = config.tag().long_label(), "channel config committed");
        Ok(())
    }

    /// Drop a staged configuration that was never committed.
    pub fn discard_staged(&mut self, channel: usize) -> Result<(), ControlError> {
        Self::check_channel(channel)?;
        self.staged[channel] = None;
        Ok(())
    }

    pub fn is_commit_pending(&self, channel: usize) -> bool {
        self.sender.is_pending(channel)
    }

    /// Open an editor on `channel`. Refused while its last commit is pending.
    pub fn edit(&mut self, channel: usize) -> Result<ChannelEditor, ControlError> {
        Self::check_channel(channel)?;
        if self.sender.is_pending(channel) {
            return Err(ControlError::CommitPending(channel));
        }
        self.refresh();
        Ok(ChannelEditor::new(channel, &self.config.channels[channel], self.preview_rng.u64(..)))
    }

    /// Stage and commit what `editor` produced.
    pub fn finish_edit(&mut self, editor: ChannelEditor) -> Result<ChannelConfig, ControlError> {
        let channel = editor.channel();
        let config = self.stage_channel_config(channel, *editor.preview())?;
        self.commit_channel_config(channel)?;
        Ok(config)
    }

    /// Move configurations the engine has taken into the live mirror.
    fn refresh(&mut self) {
        for channel in 0..NUM_CHANNELS {
            if self.in_flight[channel].is_some() && !self.sender.is_pending(channel) {
                if let Some(config) = self.in_flight[channel].take() {
                    self.config.channels[channel] = config;
                }
            }
        }
    }

    pub fn snapshot(&mut self) -> ModuleSnapshot {
        self.refresh();
        let levels = self.view.levels();
        ModuleSnapshot {
            tempo: self.config.tempo,
            swing: self.config.swing,
            swing_pending: self.sender.swing_pending(),
            swing_commits: self.view.swing_commits(),
            running: self.running,
            powered: self.is_powered(),
            tick: self.view.tick(),
            channels: core::array::from_fn(|ch| ChannelSnapshot {
                live: self.config.channels[ch],
                staged: self.staged[ch],
                pending: self.in_flight[ch],
                level: levels[ch],
            }),
        }
    }

    // --- Offline rendering ---

    /// Run a fresh engine on the live configuration for `ticks` ticks and
    /// collect every level change.
    pub fn render_trace(&mut self, ticks: u32) -> Result<Vec<LevelChange>, ControlError> {
        self.refresh();
        let (sender, receiver) = link(self.config.tempo, self.config.swing);
        sender.set_running(true);
        let mut engine = Engine::new(self.config.channels, self.config.seed, receiver);
        let mut timer = ManualTimer::new(ticks as u64, self.config.tempo);
        let mut sink = TraceSink::new();
        let stop = std::sync::atomic::AtomicBool::new(false);
        run_tick_loop(&mut engine, &mut timer, &mut sink, &stop)?;
        Ok(sink.into_changes())
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ModuleConfig::default())
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(playback) = self.playback.take() {
            let _ = playback.stop();
        }
    }
}
