//! The tick loop and the thread that runs it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use cm_engine::{Engine, TickReport};

use crate::traits::{deliver, IoError, OutputSink, TickTimer};

fn tick(engine: &mut Engine) -> TickReport {
    #[cfg(feature = "alloc_check")]
    let report = engine.on_tick_checked();
    #[cfg(not(feature = "alloc_check"))]
    let report = engine.on_tick();
    report
}

/// Run `engine` until `stop` is raised or the timer stops. Returns the
/// number of ticks processed.
pub fn run_tick_loop<T, S>(
    engine: &mut Engine,
    timer: &mut T,
    sink: &mut S,
    stop: &AtomicBool,
) -> Result<u64, IoError>
where
    T: TickTimer + ?Sized,
    S: OutputSink + ?Sized,
{
    let mut ticks = 0u64;
    while !stop.load(Ordering::Relaxed) {
        match timer.wait_next() {
            Ok(()) => {}
            Err(IoError::TimerStopped) => break,
            Err(e) => return Err(e),
        }
        let report = tick(engine);
        deliver(&report, sink);
        ticks += 1;
    }
    Ok(ticks)
}

/// Handle to a running tick thread.
pub struct TickThread {
    stop_signal: Arc<AtomicBool>,
    thread: JoinHandle<Result<Engine, IoError>>,
}

/// Move `engine` onto a dedicated thread paced by `timer`.
pub fn spawn_tick_thread<T, S>(mut engine: Engine, mut timer: T, mut sink: S) -> Result<TickThread, IoError>
where
    T: TickTimer + Send + 'static,
    S: OutputSink + Send + 'static,
{
    let stop_signal = Arc::new(AtomicBool::new(false));
    let stop = stop_signal.clone();
    let thread = std::thread::Builder::new()
        .name("cm-tick".into())
        .spawn(move || {
            let ticks = run_tick_loop(&mut engine, &mut timer, &mut sink, &stop)?;
            tracing::debug!(ticks, "tick thread finished");
            Ok(engine)
        })?;
    tracing::debug!("tick thread started");
    Ok(TickThread { stop_signal, thread })
}

impl TickThread {
    /// Whether the loop has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Stop the loop and hand the engine back.
    pub fn stop(self) -> Result<Engine, IoError> {
        self.stop_signal.store(true, Ordering::Relaxed);
        self.thread.join().map_err(|_| IoError::TickThreadPanicked)?
    }
}
