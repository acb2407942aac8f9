//! The animation scheduler.
//!
//! Each started animation owns a small record (its callbacks plus timing
//! state) that is moved into a frame callback, stepped when the frame fires,
//! and moved into the next frame callback if it keeps running.
//!
//! ## Dropped frames
//!
//! When a frame arrives later than one frame period after the previous one,
//! the missed frames are replayed as *virtual* steps before the rendered one:
//! the step callback runs with `rendered == false` so state that is
//! integrated per frame (velocities, springs) stays in sync with wall-clock
//! time. At most [`SchedulerConfig::max_catch_up`] frames are replayed per
//! rendered step.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::animation::{Animation, AnimationId, Completion, Registry, StepControl};
use crate::clock::{Clock, SystemClock};
use crate::frame::FrameSource;

/// Tuning for the step engine
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Frame rate the catch-up logic assumes
    pub desired_fps: f64,
    /// Most virtual frames replayed before one rendered frame
    pub max_catch_up: u32,
    /// Registry compaction interval, in started animations
    pub compact_every: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            desired_fps: 60.0,
            max_catch_up: 4,
            compact_every: Registry::DEFAULT_COMPACT_EVERY,
        }
    }
}

impl SchedulerConfig {
    pub fn desired_fps(mut self, desired_fps: f64) -> Self {
        self.desired_fps = desired_fps;
        self
    }

    pub fn max_catch_up(mut self, max_catch_up: u32) -> Self {
        self.max_catch_up = max_catch_up;
        self
    }

    pub fn compact_every(mut self, compact_every: u64) -> Self {
        self.compact_every = compact_every;
        self
    }

    fn frame_ms(&self) -> f64 {
        1000.0 / self.desired_fps
    }
}

/// Timing state of one animation
#[derive(Clone, Copy, Debug)]
struct StepState {
    start_time: f64,
    /// Time of the last rendered step
    last_frame_time: f64,
    progress: f64,
    dropped: u32,
}

impl StepState {
    fn new(now: f64) -> Self {
        Self {
            start_time: now,
            last_frame_time: now,
            progress: 0.0,
            dropped: 0,
        }
    }
}

struct Running<R> {
    id: AnimationId,
    animation: Animation<R>,
    state: StepState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Continue,
    Finished,
}

struct Inner<S> {
    source: S,
    clock: Rc<dyn Clock>,
    config: SchedulerConfig,
    registry: RefCell<Registry>,
}

/// Runs animations in step with a [`FrameSource`].
///
/// Cloning gives another handle to the same scheduler. Everything runs on
/// the thread that dispatches the frame source; animations may be started
/// and stopped from inside any callback.
pub struct Scheduler<S: FrameSource> {
    inner: Rc<Inner<S>>,
}

impl<S: FrameSource> Clone for Scheduler<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: FrameSource + 'static> Scheduler<S> {
    pub fn new(source: S) -> Self {
        Self::with_clock(source, Rc::new(SystemClock::new()))
    }

    pub fn with_clock(source: S, clock: Rc<dyn Clock>) -> Self {
        Self::with_config(source, clock, SchedulerConfig::default())
    }

    /// Create a scheduler with explicit timing settings.
    ///
    /// A `desired_fps` that is not a positive finite number falls back to
    /// the default rate.
    pub fn with_config(source: S, clock: Rc<dyn Clock>, mut config: SchedulerConfig) -> Self {
        if !config.desired_fps.is_finite() || config.desired_fps <= 0.0 {
            let fallback = SchedulerConfig::default().desired_fps;
            log::warn!(
                "Invalid desired fps {}, using {}",
                config.desired_fps,
                fallback
            );
            config.desired_fps = fallback;
        }
        Self {
            inner: Rc::new(Inner {
                source,
                clock,
                config,
                registry: RefCell::new(Registry::with_compaction(config.compact_every)),
            }),
        }
    }

    /// Start an animation. Its first step runs on the next frame.
    pub fn start(&self, animation: Animation<S::Root>) -> AnimationId {
        let now = self.inner.clock.now();
        let id = self.inner.registry.borrow_mut().start();
        log::debug!("Starting animation {} ({:?})", id, animation);

        Inner::schedule(
            &self.inner,
            Running {
                id,
                animation,
                state: StepState::new(now),
            },
        );
        id
    }

    /// Stop an animation. Returns whether it was running.
    ///
    /// The completion callback fires on the animation's next frame.
    pub fn stop(&self, id: AnimationId) -> bool {
        let stopped = self.inner.registry.borrow_mut().stop(id);
        if stopped {
            log::debug!("Stopping animation {}", id);
        }
        stopped
    }

    pub fn is_running(&self, id: AnimationId) -> bool {
        self.inner.registry.borrow().is_running(id)
    }

    /// Number of animations currently running
    pub fn live_count(&self) -> usize {
        self.inner.registry.borrow().live_count()
    }

    /// Registry entries held, including stopped ones awaiting compaction
    pub fn registry_len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }
}

impl<S: FrameSource + 'static> Inner<S> {
    fn schedule(inner: &Rc<Self>, running: Running<S::Root>) {
        let weak: Weak<Self> = Rc::downgrade(inner);
        let root = running.animation.root.clone();
        inner.source.request_frame(
            Box::new(move |_timestamp| {
                // Pending frames of a dropped scheduler are discarded
                if let Some(inner) = weak.upgrade() {
                    Inner::frame(&inner, running);
                }
            }),
            root.as_ref(),
        );
    }

    fn frame(inner: &Rc<Self>, mut running: Running<S::Root>) {
        if inner.step(&mut running, true) == Outcome::Continue {
            Inner::schedule(inner, running);
        }
    }

    fn step(&self, running: &mut Running<S::Root>, render: bool) -> Outcome {
        let now = self.clock.now();
        let id = running.id;

        let live = self.registry.borrow().is_running(id);
        let verified = live
            && running
                .animation
                .verify
                .as_mut()
                .map_or(true, |verify| verify(id));
        if !verified {
            self.finish(running, now, false);
            return Outcome::Finished;
        }

        if render {
            let frames_since_last =
                ((now - running.state.last_frame_time) / self.config.frame_ms()).round();
            let behind = frames_since_last - 1.0;
            let catch_up = behind.clamp(0.0, f64::from(self.config.max_catch_up)) as u32;
            if catch_up > 0 {
                log::trace!("Animation {} replaying {} dropped frame(s)", id, catch_up);
            }
            for _ in 0..catch_up {
                if self.step(running, false) == Outcome::Finished {
                    return Outcome::Finished;
                }
                running.state.dropped += 1;
            }
        }

        if let Some(duration) = running.animation.duration {
            let duration_ms = duration.as_secs_f64() * 1000.0;
            running.state.progress =
                ((now - running.state.start_time) / duration_ms).clamp(0.0, 1.0);
        }

        let progress = running.state.progress;
        let value = running
            .animation
            .easing
            .as_ref()
            .map_or(progress, |easing| easing.evaluate(progress));
        let control = (running.animation.step)(value, now, render);

        if !render {
            return Outcome::Continue;
        }

        if control == StepControl::Stop || progress >= 1.0 {
            let finished = progress >= 1.0 || running.animation.duration.is_none();
            self.finish(running, now, finished);
            Outcome::Finished
        } else {
            running.state.last_frame_time = now;
            Outcome::Continue
        }
    }

    fn finish(&self, running: &mut Running<S::Root>, now: f64, finished: bool) {
        self.registry.borrow_mut().stop(running.id);

        let estimated_fps = self.estimated_fps(&running.state, now);
        log::debug!(
            "Animation {} {} ({} dropped frame(s), ~{:.1} fps)",
            running.id,
            if finished { "finished" } else { "cancelled" },
            running.state.dropped,
            estimated_fps
        );

        if let Some(on_complete) = running.animation.on_complete.take() {
            on_complete(Completion {
                id: running.id,
                estimated_fps,
                finished,
            });
        }
    }

    fn estimated_fps(&self, state: &StepState, now: f64) -> f64 {
        let elapsed_secs = (now - state.start_time) / 1000.0;
        if elapsed_secs <= 0.0 {
            return self.config.desired_fps;
        }
        self.config.desired_fps - f64::from(state.dropped) / elapsed_secs
    }
}
