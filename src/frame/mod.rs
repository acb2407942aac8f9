//! Frame sources: "call me before the next repaint".
//!
//! A [`FrameSource`] accepts one-shot callbacks and invokes each of them once,
//! with a millisecond timestamp, when the next frame is due. Callbacks that
//! want another frame must request it again.
//!
//! - [`ManualFrameSource`] - frames are dispatched by the host calling `tick`
//! - [`TimerFrameSource`] - a fixed-rate `calloop` timer emulating vsync
//! - `CompositorFrameSource` (feature `wayland`) - `wl_surface.frame` callbacks

mod manual;
mod timer;
#[cfg(feature = "wayland")]
mod wayland;

pub use manual::ManualFrameSource;
pub use timer::{TimerConfig, TimerFrameSource};
#[cfg(feature = "wayland")]
pub use wayland::{CompositorFrameSource, HostFrameSource};

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// One-shot callback receiving the frame timestamp in milliseconds
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Handle identifying a pending frame request within one queue
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Something that can run callbacks in step with the display refresh
pub trait FrameSource {
    /// The surface a frame is requested for. Sources that do not
    /// distinguish surfaces ignore it.
    type Root: Clone + 'static;

    /// Queue `callback` for the next frame. Without a root the source uses
    /// its own default surface.
    ///
    /// Requests never fail. A source that temporarily cannot deliver frames
    /// keeps the callback queued and logs the problem; callbacks are never
    /// dropped without running, so an animation waiting on one stays
    /// running until frames resume or its scheduler is dropped.
    fn request_frame(&self, callback: FrameCallback, root: Option<&Self::Root>) -> FrameHandle;
}

impl<S: FrameSource + ?Sized> FrameSource for Rc<S> {
    type Root = S::Root;

    fn request_frame(&self, callback: FrameCallback, root: Option<&Self::Root>) -> FrameHandle {
        (**self).request_frame(callback, root)
    }
}

/// Callbacks taken out of a [`FrameQueue`], in request order
pub type PendingFrames = BTreeMap<FrameHandle, FrameCallback>;

/// Pending frame callbacks keyed by freshly minted handles.
///
/// Dispatch always swaps the pending set out first (see [`FrameQueue::take`]),
/// so a callback registered while a frame is being dispatched waits for the
/// next one.
#[derive(Default)]
pub struct FrameQueue {
    pending: PendingFrames,
    next_handle: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, callback: FrameCallback) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending.insert(handle, callback);
        handle
    }

    /// Swap the pending set for an empty one
    pub fn take(&mut self) -> PendingFrames {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.pending.len())
            .field("next_handle", &self.next_handle)
            .finish()
    }
}

/// Run a batch of taken callbacks, returning how many fired
pub fn dispatch(frames: PendingFrames, timestamp: f64) -> usize {
    let count = frames.len();
    for callback in frames.into_values() {
        callback(timestamp);
    }
    count
}

/// Swap `queue` out and dispatch it without holding the borrow, so
/// callbacks are free to request new frames on the same queue.
pub(crate) fn dispatch_queue(queue: &RefCell<FrameQueue>, timestamp: f64) -> usize {
    let frames = queue.borrow_mut().take();
    dispatch(frames, timestamp)
}
