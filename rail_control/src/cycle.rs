//! Frame clock: pulls input frames and runs one simulator tick per frame.
//!
//! ## Loop
//! `run` paces ticks at the configured frame time with `std::thread::sleep`
//! and feeds the measured wall-clock `dt` to the simulator. `run_fixed` uses
//! a constant `dt` and never sleeps (replays, tests, benchmarks).
//!
//! ## Stop Conditions
//! Source exhausted, `Exit` action, tick limit reached, running flag cleared.
//! Both loops check the flag before every frame. [`BackgroundFrames`] also
//! returns from a blocked read once the flag is cleared.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::input::{InputError, InputFrame};
use crate::simulator::{Simulator, TickOutcome};

// ─── Tick Statistics ────────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct TickStats {
    /// Total ticks executed.
    pub tick_count: u64,
    /// Last tick body duration [ns].
    pub last_tick_ns: i64,
    /// Minimum tick body duration [ns].
    pub min_tick_ns: i64,
    /// Maximum tick body duration [ns].
    pub max_tick_ns: i64,
    /// Running sum for average computation.
    pub sum_tick_ns: i64,
    /// Ticks whose body exceeded the frame time.
    pub overruns: u64,
    /// Largest `dt` handed to the simulator [s].
    pub max_dt: f64,
}

impl TickStats {
    pub const fn new() -> Self {
        Self {
            tick_count: 0,
            last_tick_ns: 0,
            min_tick_ns: i64::MAX,
            max_tick_ns: 0,
            sum_tick_ns: 0,
            overruns: 0,
            max_dt: 0.0,
        }
    }

    /// Record a tick. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, dt: f64) {
        self.tick_count += 1;
        self.last_tick_ns = duration_ns;
        self.min_tick_ns = self.min_tick_ns.min(duration_ns);
        self.max_tick_ns = self.max_tick_ns.max(duration_ns);
        self.sum_tick_ns += duration_ns;
        if dt > self.max_dt {
            self.max_dt = dt;
        }
    }

    /// Average tick duration [ns] (0 if no ticks).
    #[inline]
    pub fn avg_tick_ns(&self) -> i64 {
        if self.tick_count == 0 {
            0
        } else {
            self.sum_tick_ns / self.tick_count as i64
        }
    }
}

impl Default for TickStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Frame Sources ──────────────────────────────────────────────────

/// Errors raised while pulling frames.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("input read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Input {
        line: usize,
        #[source]
        source: InputError,
    },
}

/// Supplier of per-tick input frames.
pub trait FrameSource {
    /// Next frame, or `None` when the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<InputFrame>, RunnerError>;
}

/// Pre-built frame queue.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrames {
    frames: VecDeque<InputFrame>,
}

impl ScriptedFrames {
    pub fn new(frames: impl IntoIterator<Item = InputFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Append `count` copies of `frame`.
    pub fn repeat(mut self, frame: InputFrame, count: usize) -> Self {
        self.frames.extend(std::iter::repeat_n(frame, count));
        self
    }

    pub fn then(mut self, frame: InputFrame) -> Self {
        self.frames.push_back(frame);
        self
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ScriptedFrames {
    fn next_frame(&mut self) -> Result<Option<InputFrame>, RunnerError> {
        Ok(self.frames.pop_front())
    }
}

/// Frames parsed from text lines. Blank lines and `#` comments are skipped.
pub struct LineFrames<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> LineFrames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for LineFrames<R> {
    fn next_frame(&mut self) -> Result<Option<InputFrame>, RunnerError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if let Some(frame) = parse_frame_line(&self.buf, self.line_no)? {
                return Ok(Some(frame));
            }
        }
    }
}

/// Parse one text line; `None` for blank lines and comments.
fn parse_frame_line(text: &str, line: usize) -> Result<Option<InputFrame>, RunnerError> {
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }
    InputFrame::parse(text)
        .map(Some)
        .map_err(|source| RunnerError::Input { line, source })
}

/// Default wait between checks of the running flag while no line arrives.
pub const READER_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Text frames read on a background thread.
///
/// The reader thread may stay blocked on its input forever; the consumer
/// side stops waiting as soon as the running flag is cleared.
pub struct BackgroundFrames {
    lines: Receiver<io::Result<String>>,
    running: Arc<AtomicBool>,
    poll: Duration,
    line_no: usize,
}

impl BackgroundFrames {
    pub fn spawn<R>(reader: R, running: Arc<AtomicBool>) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });
        Self {
            lines: rx,
            running,
            poll: READER_POLL_INTERVAL,
            line_no: 0,
        }
    }

    pub fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }
}

impl FrameSource for BackgroundFrames {
    fn next_frame(&mut self) -> Result<Option<InputFrame>, RunnerError> {
        loop {
            match self.lines.recv_timeout(self.poll) {
                Ok(line) => {
                    let line = line?;
                    self.line_no += 1;
                    if let Some(frame) = parse_frame_line(&line, self.line_no)? {
                        return Ok(Some(frame));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if !self.running.load(Ordering::SeqCst) {
                        debug!("Frame read abandoned after shutdown request");
                        return Ok(None);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(None),
            }
        }
    }
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    ExitRequested,
    TickLimit,
    Interrupted,
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed during this run.
    pub ticks: u64,
    pub reason: StopReason,
}

/// Owns the simulator and paces its ticks.
pub struct TickRunner {
    sim: Simulator,
    stats: TickStats,
    frame_time: Duration,
    max_ticks: Option<u64>,
}

impl TickRunner {
    pub fn new(sim: Simulator, cycle_time_us: u32) -> Self {
        Self {
            sim,
            stats: TickStats::new(),
            frame_time: Duration::from_micros(u64::from(cycle_time_us)),
            max_ticks: None,
        }
    }

    /// Stop after `limit` ticks.
    pub fn with_max_ticks(mut self, limit: Option<u64>) -> Self {
        self.max_ticks = limit;
        self
    }

    #[inline]
    pub const fn simulator(&self) -> &Simulator {
        &self.sim
    }

    #[inline]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    #[inline]
    pub const fn frame_time(&self) -> Duration {
        self.frame_time
    }

    /// Run one tick and record its duration.
    pub fn step(&mut self, frame: &InputFrame, dt: f64) -> TickOutcome {
        let start = Instant::now();
        let outcome = self.sim.tick(dt, frame);
        let elapsed = start.elapsed();

        self.stats.record(elapsed.as_nanos() as i64, dt);
        if elapsed > self.frame_time {
            self.stats.overruns += 1;
            debug!(
                "Tick overrun: {}µs > {}µs",
                elapsed.as_micros(),
                self.frame_time.as_micros()
            );
        }
        outcome
    }

    /// Paced loop with wall-clock `dt`. The first tick uses the frame time.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        running: &AtomicBool,
    ) -> Result<RunSummary, RunnerError> {
        let mut ticks = 0;
        let mut last = Instant::now();
        let mut dt = self.frame_time.as_secs_f64();

        let reason = loop {
            if !running.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }
            if self.max_ticks.is_some_and(|limit| ticks >= limit) {
                break StopReason::TickLimit;
            }
            let Some(frame) = source.next_frame()? else {
                break end_of_input(running);
            };

            let frame_start = Instant::now();
            if ticks > 0 {
                dt = frame_start.duration_since(last).as_secs_f64();
            }
            last = frame_start;

            ticks += 1;
            if self.step(&frame, dt) == TickOutcome::Exit {
                break StopReason::ExitRequested;
            }

            if let Some(remaining) = self.frame_time.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        };

        info!("Run ended: {reason:?} after {ticks} ticks");
        Ok(RunSummary { ticks, reason })
    }

    /// Unpaced loop with a constant `dt`.
    pub fn run_fixed(
        &mut self,
        source: &mut dyn FrameSource,
        dt: f64,
        running: &AtomicBool,
    ) -> Result<RunSummary, RunnerError> {
        let mut ticks = 0;
        let reason = loop {
            if !running.load(Ordering::SeqCst) {
                break StopReason::Interrupted;
            }
            if self.max_ticks.is_some_and(|limit| ticks >= limit) {
                break StopReason::TickLimit;
            }
            let Some(frame) = source.next_frame()? else {
                break end_of_input(running);
            };
            ticks += 1;
            if self.step(&frame, dt) == TickOutcome::Exit {
                break StopReason::ExitRequested;
            }
        };
        debug!("Fixed run ended: {reason:?} after {ticks} ticks");
        Ok(RunSummary { ticks, reason })
    }
}

/// A source that ran dry because of a shutdown request counts as interrupted.
fn end_of_input(running: &AtomicBool) -> StopReason {
    if running.load(Ordering::SeqCst) {
        StopReason::SourceExhausted
    } else {
        StopReason::Interrupted
    }
}
