//! Frame-paced animation scheduling.
//!
//! A [`Scheduler`] drives caller-supplied step callbacks once per display
//! frame, delivered by a [`FrameSource`](frame::FrameSource): compositor
//! frame callbacks when available (feature `wayland`), otherwise a fixed-rate
//! `calloop` timer. Frames the source failed to deliver are replayed as
//! virtual steps so per-frame state stays in sync with wall-clock time.
//!
//! ```ignore
//! let mut event_loop = EventLoop::<()>::try_new()?;
//! let scheduler = Scheduler::new(TimerFrameSource::new(event_loop.handle())?);
//!
//! scheduler.start(
//!     Animation::new(|value, _now, rendered| {
//!         if rendered {
//!             log::info!("value {value:.3}");
//!         }
//!     })
//!     .duration(Duration::from_millis(300))
//!     .easing(Easing::EaseOutCubic),
//! );
//!
//! event_loop.run(None, &mut (), |_| {})?;
//! ```

pub mod animation;
pub mod clock;
pub mod error;
pub mod frame;
mod scheduler;

pub use scheduler::{Scheduler, SchedulerConfig};

pub mod prelude {
    pub use crate::animation::{Animation, AnimationId, Completion, Easing, StepControl};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::error::FrameSourceError;
    #[cfg(feature = "wayland")]
    pub use crate::frame::{CompositorFrameSource, HostFrameSource};
    pub use crate::frame::{FrameSource, ManualFrameSource, TimerConfig, TimerFrameSource};
    pub use crate::{Scheduler, SchedulerConfig};
}
