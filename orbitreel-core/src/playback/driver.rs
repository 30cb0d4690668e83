use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::{
    foundation::core::Fps,
    foundation::error::{OrbitError, OrbitResult},
    playback::ease::{Ease, RateFunction},
    playback::scrub::{ScrubBounds, ScrubState},
    render::fingerprint::{FrameFingerprint, fingerprint_frame},
    render::frontend::{Frontend, FrontendConfig, Tick},
    render::state::EntityRenderState,
    render::trace::TraceBook,
};

/// Options controlling [`PlaybackDriver`] behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DriverOpts {
    /// Tick rate.
    #[serde(default)]
    pub fps: Fps,
    /// Skip presenting ticks whose frame fingerprint and traces did not change.
    #[serde(default)]
    pub elide_unchanged: bool,
}

/// Paces ticks against some notion of wall-clock time.
pub trait Clock {
    /// Start a new run; later deadlines are measured from here.
    fn reset(&mut self);
    /// Block until `offset_secs` after the last reset.
    fn sleep_until(&mut self, offset_secs: f64);
}

/// Real time, sleeping the thread between ticks.
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn reset(&mut self) {
        self.start = Instant::now();
    }

    fn sleep_until(&mut self, offset_secs: f64) {
        let deadline = self.start + Duration::from_secs_f64(offset_secs.max(0.0));
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Never sleeps; records how far time would have advanced. Use for tests and offline export.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    elapsed: f64,
    run_start: f64,
    runs: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total simulated seconds across every run.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    /// Number of runs started.
    pub fn runs(&self) -> u32 {
        self.runs
    }
}

impl Clock for ManualClock {
    fn reset(&mut self) {
        self.run_start = self.elapsed;
        self.runs += 1;
    }

    fn sleep_until(&mut self, offset_secs: f64) {
        self.elapsed = self.elapsed.max(self.run_start + offset_secs.max(0.0));
    }
}

/// Cooperative pause/cancel flags, shared with an external controller.
///
/// Cloning shares the same flags. The driver reads them once per tick.
#[derive(Clone, Debug, Default)]
pub struct PlaybackHandle {
    paused: Arc<AtomicBool>,
    cancelled: Arc<AtomicBool>,
}

impl PlaybackHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the next tick, keeping the current segment.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Allow the next run to continue where the pause left off.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Stop at the next tick and drop every queued segment.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn take_cancel(&self) -> bool {
        self.cancelled.swap(false, Ordering::SeqCst)
    }
}

/// What happens when a segment finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// Start the next segment right away.
    #[default]
    Auto,
    /// Stop until [`PlaybackDriver::proceed`] is called.
    WaitForInput,
}

/// How a looping segment restarts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Jump back to the start after each cycle.
    #[default]
    Repeat,
    /// Alternate direction every cycle.
    PingPong,
}

/// Loop settings of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Looping {
    #[serde(default)]
    pub mode: LoopMode,
    /// Total cycles including the first one; `None` loops until paused or cancelled.
    #[serde(default)]
    pub cycles: Option<u32>,
}

/// One queued move of the scrub value.
pub struct Segment {
    from: Option<f64>,
    to: f64,
    duration_secs: f64,
    rate: Box<dyn RateFunction>,
    advance: AdvanceMode,
    looping: Option<Looping>,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration_secs", &self.duration_secs)
            .field("advance", &self.advance)
            .field("looping", &self.looping)
            .finish_non_exhaustive()
    }
}

impl Segment {
    /// Move from wherever the scrub is to `to` over `duration_secs`, linearly.
    pub fn to(to: f64, duration_secs: f64) -> OrbitResult<Self> {
        if !(0.0..=1.0).contains(&to) {
            return Err(OrbitError::validation(format!(
                "segment target {to} is outside [0, 1]"
            )));
        }
        if !(duration_secs.is_finite() && duration_secs >= 0.0) {
            return Err(OrbitError::validation(format!(
                "segment duration must be finite and >= 0, got {duration_secs}"
            )));
        }
        Ok(Self {
            from: None,
            to,
            duration_secs,
            rate: Box::new(Ease::Linear),
            advance: AdvanceMode::Auto,
            looping: None,
        })
    }

    /// Move across `bounds`, jumping to `bounds.from` first.
    pub fn between(bounds: ScrubBounds, duration_secs: f64) -> OrbitResult<Self> {
        bounds.validate()?;
        let mut s = Self::to(bounds.to, duration_secs)?;
        s.from = Some(bounds.from);
        Ok(s)
    }

    pub fn with_rate(mut self, rate: impl RateFunction + 'static) -> Self {
        self.rate = Box::new(rate);
        self
    }

    pub fn with_advance(mut self, advance: AdvanceMode) -> Self {
        self.advance = advance;
        self
    }

    /// Loop this segment. Without an explicit start, the scrub value at segment start is used.
    pub fn looping(mut self, looping: Looping) -> OrbitResult<Self> {
        if looping.cycles == Some(0) {
            return Err(OrbitError::validation("loop cycles must be >= 1"));
        }
        if looping.cycles.is_none() && self.duration_secs <= 0.0 {
            return Err(OrbitError::validation(
                "an endless loop needs a positive duration",
            ));
        }
        self.looping = Some(looping);
        Ok(self)
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    pub fn advance(&self) -> AdvanceMode {
        self.advance
    }

    /// Ticks after the start tick, at `fps`.
    fn tick_count(&self, fps: Fps) -> u64 {
        fps.secs_to_frames_ceil(self.duration_secs)
    }

    fn progress_at(&self, tick: u64, fps: Fps) -> f64 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        let elapsed = fps.frames_to_secs(tick).min(self.duration_secs);
        let p = self.rate.progress(elapsed / self.duration_secs);
        if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 }
    }
}

/// Why [`PlaybackDriver::run_until_idle`] returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Queue drained.
    Idle,
    /// A wait-for-input segment finished; call [`PlaybackDriver::proceed`].
    WaitingForInput,
    /// The handle was paused; the active segment is kept.
    Paused,
    /// The handle was cancelled; queued segments were dropped.
    Cancelled,
}

/// Driver counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PlaybackStats {
    /// Ticks evaluated.
    pub ticks: u64,
    /// Ticks forwarded to the frontend.
    pub frames_presented: u64,
    /// Ticks skipped because nothing changed.
    pub frames_elided: u64,
    /// Segments run to completion.
    pub segments_completed: u64,
}

struct ActiveSegment {
    segment: Segment,
    from: f64,
    /// Next tick to evaluate within the current cycle.
    tick: u64,
    ticks: u64,
    /// Zero-based cycle counter.
    cycle: u32,
}

impl ActiveSegment {
    fn bounds(&self) -> ScrubBounds {
        let forward = ScrubBounds {
            from: self.from,
            to: self.segment.to,
        };
        let reversed = matches!(
            self.segment.looping,
            Some(Looping {
                mode: LoopMode::PingPong,
                ..
            })
        ) && self.cycle % 2 == 1;
        if reversed {
            ScrubBounds {
                from: forward.to,
                to: forward.from,
            }
        } else {
            forward
        }
    }

    /// Advance to the next cycle; false when the loop is over.
    fn next_cycle(&mut self) -> bool {
        let Some(looping) = self.segment.looping else {
            return false;
        };
        if looping.cycles.is_some_and(|c| self.cycle + 1 >= c) {
            return false;
        }
        self.cycle += 1;
        self.tick = 0;
        true
    }
}

/// Drives the scrub value over wall-clock time and forwards rendered ticks to a frontend.
///
/// Single-threaded: each tick reads the handle flags, samples the active segment's rate
/// function, renders, and presents. Segment starts that coincide with the current scrub value
/// are not presented twice.
pub struct PlaybackDriver<F: Frontend, C: Clock = SystemClock> {
    state: EntityRenderState,
    frontend: F,
    clock: C,
    opts: DriverOpts,
    handle: PlaybackHandle,
    scrub: ScrubState,
    queue: VecDeque<Segment>,
    active: Option<ActiveSegment>,
    traces: TraceBook,
    awaiting_input: bool,
    begun: bool,
    presented_any: bool,
    last_fingerprint: Option<FrameFingerprint>,
    clock_secs: f64,
    stats: PlaybackStats,
}

impl<F: Frontend> PlaybackDriver<F, SystemClock> {
    /// Driver pacing ticks in real time.
    pub fn new(state: EntityRenderState, frontend: F, opts: DriverOpts) -> Self {
        Self::with_clock(state, frontend, opts, SystemClock::default())
    }
}

impl<F: Frontend, C: Clock> PlaybackDriver<F, C> {
    /// Driver with a custom clock.
    pub fn with_clock(state: EntityRenderState, frontend: F, opts: DriverOpts, clock: C) -> Self {
        Self {
            state,
            frontend,
            clock,
            opts,
            handle: PlaybackHandle::new(),
            scrub: ScrubState::default(),
            queue: VecDeque::new(),
            active: None,
            traces: TraceBook::new(),
            awaiting_input: false,
            begun: false,
            presented_any: false,
            last_fingerprint: None,
            clock_secs: 0.0,
            stats: PlaybackStats::default(),
        }
    }

    /// Share flags with an existing handle.
    pub fn with_handle(mut self, handle: PlaybackHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Start at `scrub` instead of 0.
    pub fn with_scrub(mut self, scrub: f64) -> Self {
        self.scrub.set(scrub);
        self
    }

    /// A clone of the control handle.
    pub fn handle(&self) -> PlaybackHandle {
        self.handle.clone()
    }

    pub fn scrub(&self) -> f64 {
        self.scrub.get()
    }

    pub fn stats(&self) -> PlaybackStats {
        self.stats
    }

    pub fn state(&self) -> &EntityRenderState {
        &self.state
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Playback clock in seconds, as used for view spin.
    pub fn clock_secs(&self) -> f64 {
        self.clock_secs
    }

    /// Segments waiting behind the active one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is active or queued.
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    pub fn enqueue(&mut self, segment: Segment) {
        self.queue.push_back(segment);
    }

    /// Queue a move from the current scrub to `to`.
    pub fn advance_to(
        &mut self,
        to: f64,
        duration_secs: f64,
        rate: impl RateFunction + 'static,
    ) -> OrbitResult<()> {
        self.enqueue(Segment::to(to, duration_secs)?.with_rate(rate));
        Ok(())
    }

    /// Queue a loop across `bounds`.
    pub fn loop_between(
        &mut self,
        bounds: ScrubBounds,
        duration_secs: f64,
        rate: impl RateFunction + 'static,
        looping: Looping,
    ) -> OrbitResult<()> {
        let segment = Segment::between(bounds, duration_secs)?
            .with_rate(rate)
            .looping(looping)?;
        self.enqueue(segment);
        Ok(())
    }

    pub fn pause(&self) {
        self.handle.pause();
    }

    pub fn resume(&self) {
        self.handle.resume();
    }

    /// Release a wait-for-input stop.
    pub fn proceed(&mut self) {
        self.awaiting_input = false;
    }

    /// Play `from -> to` over `duration_secs`, then return.
    pub fn run(
        &mut self,
        from: f64,
        to: f64,
        duration_secs: f64,
        rate: impl RateFunction + 'static,
    ) -> OrbitResult<RunOutcome> {
        let bounds = ScrubBounds::new(from, to)?;
        self.enqueue(Segment::between(bounds, duration_secs)?.with_rate(rate));
        self.run_until_idle()
    }

    /// Render and present the current scrub value once, outside any segment.
    pub fn present_now(&mut self) -> OrbitResult<()> {
        self.ensure_begun()?;
        self.tick()
    }

    /// Tick until the queue drains, input is awaited, or the handle pauses or cancels.
    #[tracing::instrument(skip(self))]
    pub fn run_until_idle(&mut self) -> OrbitResult<RunOutcome> {
        if self.awaiting_input {
            return Ok(RunOutcome::WaitingForInput);
        }
        tracing::debug!(
            queued = self.queue.len(),
            resuming = self.active.is_some(),
            scrub = self.scrub.get(),
            "run"
        );
        self.ensure_begun()?;
        self.clock.reset();
        let dt = self.opts.fps.frame_duration_secs();
        let mut run_ticks: u64 = 0;

        loop {
            if self.handle.take_cancel() {
                self.queue.clear();
                self.active = None;
                tracing::debug!(scrub = self.scrub.get(), "playback cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            if self.handle.is_paused() {
                tracing::debug!(scrub = self.scrub.get(), "playback paused");
                return Ok(RunOutcome::Paused);
            }

            if self.active.is_none() {
                let Some(segment) = self.queue.pop_front() else {
                    return Ok(RunOutcome::Idle);
                };
                self.start_segment(segment);
            }

            let Some(active) = self.active.as_mut() else {
                continue;
            };
            let fps = self.opts.fps;
            let value = active
                .bounds()
                .at(active.segment.progress_at(active.tick, fps));
            let is_start = active.tick == 0;
            active.tick += 1;
            let cycle_done = active.tick > active.ticks;

            // A start tick that lands on the current value would repeat the previous frame.
            let skip = is_start && self.presented_any && value == self.scrub.get();
            if !skip {
                if run_ticks > 0 {
                    self.clock.sleep_until(run_ticks as f64 * dt);
                    self.clock_secs += dt;
                }
                run_ticks += 1;
                self.scrub.set(value);
                self.tick()?;
            }

            if cycle_done && self.finish_cycle() {
                return Ok(RunOutcome::WaitingForInput);
            }
        }
    }

    /// Call `end` on the frontend and hand it back.
    pub fn finish(mut self) -> OrbitResult<(F, PlaybackStats)> {
        if self.begun {
            self.frontend.end()?;
        }
        tracing::debug!(stats = ?self.stats, "playback finished");
        Ok((self.frontend, self.stats))
    }

    fn start_segment(&mut self, segment: Segment) {
        let from = segment.from.unwrap_or(self.scrub.get());
        let ticks = segment.tick_count(self.opts.fps);
        tracing::debug!(
            from,
            to = segment.to,
            duration_secs = segment.duration_secs,
            ticks,
            looping = segment.looping.is_some(),
            "segment started"
        );
        self.active = Some(ActiveSegment {
            segment,
            from,
            tick: 0,
            ticks,
            cycle: 0,
        });
    }

    /// Close the current cycle; returns true when the driver must wait for input.
    fn finish_cycle(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.next_cycle() {
            tracing::trace!(cycle = active.cycle, "loop cycle");
            return false;
        }
        let advance = active.segment.advance;
        self.active = None;
        self.stats.segments_completed += 1;
        tracing::debug!(scrub = self.scrub.get(), ?advance, "segment finished");
        if advance == AdvanceMode::WaitForInput {
            self.awaiting_input = true;
            return true;
        }
        false
    }

    fn ensure_begun(&mut self) -> OrbitResult<()> {
        if self.begun {
            return Ok(());
        }
        let cfg = FrontendConfig {
            fps: self.opts.fps,
            entity_count: self.state.entity_count(),
            statics: self.state.statics()?,
        };
        self.frontend.begin(&cfg)?;
        self.begun = true;
        Ok(())
    }

    fn tick(&mut self) -> OrbitResult<()> {
        let index = self.stats.ticks;
        self.stats.ticks += 1;

        let scrub = self.scrub.get();
        let frame = self.state.render_at(scrub, self.clock_secs)?;
        let traces = self.state.trace_deltas(scrub, &mut self.traces)?;

        let fingerprint = fingerprint_frame(&frame);
        if self.opts.elide_unchanged
            && traces.is_empty()
            && self.last_fingerprint == Some(fingerprint)
        {
            self.stats.frames_elided += 1;
            return Ok(());
        }
        self.last_fingerprint = Some(fingerprint);

        self.frontend.present(&Tick {
            index,
            clock_secs: self.clock_secs,
            frame,
            traces,
        })?;
        self.presented_any = true;
        self.stats.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/driver.rs"]
mod tests;
