mod registry;
mod timing;

pub use registry::Registry;
pub use timing::Easing;

use std::time::Duration;

/// Identifier returned by `Scheduler::start`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnimationId(pub(crate) u64);

impl AnimationId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AnimationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a step callback wants to happen next
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StepControl {
    #[default]
    Continue,
    /// End the animation after this frame
    Stop,
}

impl From<bool> for StepControl {
    fn from(keep_going: bool) -> Self {
        if keep_going {
            StepControl::Continue
        } else {
            StepControl::Stop
        }
    }
}

impl From<()> for StepControl {
    fn from(_: ()) -> Self {
        StepControl::Continue
    }
}

/// Summary passed to the completion callback
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Completion {
    pub id: AnimationId,
    /// Frame rate actually achieved, derived from the number of replayed
    /// frames. Diagnostic only; unstable for very short animations.
    pub estimated_fps: f64,
    /// `true` when the animation ran to its end (or the step callback ended
    /// an animation without a duration), `false` when it was cancelled
    pub finished: bool,
}

pub(crate) type StepFn = Box<dyn FnMut(f64, f64, bool) -> StepControl>;
pub(crate) type VerifyFn = Box<dyn FnMut(AnimationId) -> bool>;
pub(crate) type CompleteFn = Box<dyn FnOnce(Completion)>;

/// Description of an animation to hand to `Scheduler::start`.
///
/// The step callback receives `(value, timestamp_ms, rendered)`. With a
/// duration, `value` is the eased progress in `[0, 1]`; without one it stays
/// at the eased value of `0` and the callback decides when to stop.
/// `rendered` is `false` for frames replayed to make up for dropped ones.
///
/// # Example
/// ```ignore
/// let id = scheduler.start(
///     Animation::new(move |value, _now, rendered| {
///         if rendered {
///             surface.set_offset(value * 300.0);
///         }
///     })
///     .duration(Duration::from_millis(300))
///     .easing(Easing::EaseOutCubic)
///     .on_complete(|done| log::info!("{} finished: {}", done.id, done.finished)),
/// );
/// ```
pub struct Animation<R = ()> {
    pub(crate) step: StepFn,
    pub(crate) verify: Option<VerifyFn>,
    pub(crate) on_complete: Option<CompleteFn>,
    pub(crate) duration: Option<Duration>,
    pub(crate) easing: Option<Easing>,
    pub(crate) root: Option<R>,
}

impl<R> Animation<R> {
    /// Create an animation from its step callback. The callback may return
    /// [`StepControl`], `bool` (`false` stops) or `()`.
    pub fn new<F, T>(mut step: F) -> Self
    where
        F: FnMut(f64, f64, bool) -> T + 'static,
        T: Into<StepControl>,
    {
        Self {
            step: Box::new(move |value, now, rendered| step(value, now, rendered).into()),
            verify: None,
            on_complete: None,
            duration: None,
            easing: None,
            root: None,
        }
    }

    /// Checked before every step; returning `false` cancels the animation
    pub fn verify<F>(mut self, verify: F) -> Self
    where
        F: FnMut(AnimationId) -> bool + 'static,
    {
        self.verify = Some(Box::new(verify));
        self
    }

    /// Called exactly once when the animation ends, for any reason
    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnOnce(Completion) + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Run for a fixed time. A zero duration means no duration.
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = (!duration.is_zero()).then_some(duration);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Surface to request frames for
    pub fn root(mut self, root: R) -> Self {
        self.root = Some(root);
        self
    }
}

impl<R> std::fmt::Debug for Animation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("verify", &self.verify.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("root", &self.root.is_some())
            .finish()
    }
}
