//! Fixed-rate frame emulation for hosts without a compositor frame callback.
//!
//! A single `calloop` timer fires at the target rate while anyone is waiting
//! for frames. Once no callback has fired for `idle_timeout`, the timer is
//! removed from the loop so an idle application costs no wakeups. The next
//! frame request puts it back.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};

use super::{dispatch, FrameCallback, FrameHandle, FrameQueue, FrameSource};
use crate::clock::{Clock, SystemClock};
use crate::error::FrameSourceError;

/// Configuration for [`TimerFrameSource`]
#[derive(Clone, Copy, Debug)]
pub struct TimerConfig {
    /// Target frame rate in frames per second
    pub fps: f64,
    /// How long the timer keeps running with nothing to dispatch
    pub idle_timeout: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            idle_timeout: Duration::from_millis(2500),
        }
    }
}

impl TimerConfig {
    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Time between two ticks
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }
}

struct TimerState {
    queue: FrameQueue,
    token: Option<RegistrationToken>,
    last_active: f64,
}

/// Frame source that emulates vsync with a shared `calloop` timer.
///
/// `D` is the event loop's shared data type. `R` is the render root type the
/// source accepts; it is ignored, so the source can stand in for one that
/// does care about surfaces.
pub struct TimerFrameSource<D: 'static, R = ()> {
    handle: LoopHandle<'static, D>,
    state: Rc<RefCell<TimerState>>,
    clock: Rc<dyn Clock>,
    config: TimerConfig,
    _root: PhantomData<fn() -> R>,
}

impl<D: 'static, R> TimerFrameSource<D, R> {
    /// Create a 60 Hz source on the given loop.
    ///
    /// The timer is registered and removed again right away, so a loop that
    /// cannot host it is reported here. It only starts ticking on the first
    /// frame request.
    pub fn new(handle: LoopHandle<'static, D>) -> Result<Self, FrameSourceError> {
        Self::with_config(handle, TimerConfig::default(), Rc::new(SystemClock::new()))
    }

    pub fn with_config(
        handle: LoopHandle<'static, D>,
        config: TimerConfig,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, FrameSourceError> {
        if !config.fps.is_finite() || config.fps <= 0.0 {
            return Err(FrameSourceError::InvalidRate(config.fps));
        }

        let state = Rc::new(RefCell::new(TimerState {
            queue: FrameQueue::new(),
            token: None,
            last_active: clock.now(),
        }));

        let source = Self {
            handle,
            state,
            clock,
            config,
            _root: PhantomData,
        };
        source.arm()?;
        source.disarm();
        Ok(source)
    }

    /// Whether the timer is currently registered with the loop
    pub fn is_armed(&self) -> bool {
        self.state.borrow().token.is_some()
    }

    /// Number of callbacks waiting for the next tick
    pub fn pending(&self) -> usize {
        self.state.borrow().queue.len()
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    fn arm(&self) -> Result<(), FrameSourceError> {
        if self.is_armed() {
            return Ok(());
        }

        let period = self.config.period();
        let idle_ms = self.config.idle_timeout.as_secs_f64() * 1000.0;
        let state = self.state.clone();
        let clock = self.clock.clone();

        let token = self
            .handle
            .insert_source(Timer::from_duration(period), move |_deadline, _, _data| {
                if tick(&state, clock.as_ref(), idle_ms) {
                    TimeoutAction::ToDuration(period)
                } else {
                    TimeoutAction::Drop
                }
            })
            .map_err(|err| FrameSourceError::TimerUnavailable(err.error.to_string()))?;

        let mut state = self.state.borrow_mut();
        state.token = Some(token);
        state.last_active = self.clock.now();
        log::info!("Frame timer armed at {} fps", self.config.fps);
        Ok(())
    }

    fn disarm(&self) {
        if let Some(token) = self.state.borrow_mut().token.take() {
            self.handle.remove(token);
        }
    }
}

/// One timer tick. Returns whether the timer should keep running.
fn tick(state: &RefCell<TimerState>, clock: &dyn Clock, idle_ms: f64) -> bool {
    let start = clock.now();

    // Requests made by these callbacks land in the fresh queue
    let frames = state.borrow_mut().queue.take();
    let fired = dispatch(frames, start);

    let mut state = state.borrow_mut();
    if fired > 0 {
        state.last_active = start;
    }

    if start - state.last_active > idle_ms {
        state.token = None;
        log::info!(
            "Frame timer idle for {:.0}ms, stopping",
            start - state.last_active
        );
        return false;
    }
    true
}

impl<D: 'static, R: Clone + 'static> FrameSource for TimerFrameSource<D, R> {
    type Root = R;

    /// Queue `callback` and arm the timer if it went idle.
    ///
    /// If the loop refuses the timer, the failure is logged and the callback
    /// stays queued; it runs once a later request manages to arm the timer.
    /// Until then the animation waiting on it stays running.
    fn request_frame(&self, callback: FrameCallback, _root: Option<&R>) -> FrameHandle {
        let handle = self.state.borrow_mut().queue.push(callback);
        if let Err(err) = self.arm() {
            log::error!("Failed to re-arm frame timer: {}", err);
        }
        handle
    }
}

impl<D: 'static, R> Drop for TimerFrameSource<D, R> {
    fn drop(&mut self) {
        self.disarm();
    }
}
