//! Compositor-driven frames for Wayland surfaces.
//!
//! The compositor tells a client when it is a good time to draw the next
//! frame through `wl_surface.frame`. This is the native counterpart of the
//! timer emulation and is preferred whenever a surface is available.
//!
//! The host forwards the callback from its compositor handler:
//!
//! ```ignore
//! impl CompositorHandler for AppState {
//!     fn frame(&mut self, _: &Connection, _: &QueueHandle<Self>, surface: &WlSurface, time: u32) {
//!         self.scheduler.source().frame_done(surface, time);
//!     }
//!     // ...
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use calloop::LoopHandle;
use wayland_client::backend::ObjectId;
use wayland_client::protocol::{wl_callback, wl_surface::WlSurface};
use wayland_client::{Dispatch, Proxy, QueueHandle};

use super::{dispatch, FrameCallback, FrameHandle, FrameQueue, FrameSource, TimerFrameSource};
use crate::error::FrameSourceError;

struct SurfaceFrames {
    surface: WlSurface,
    queue: FrameQueue,
    /// A `wl_surface.frame` request is outstanding
    awaiting: bool,
}

/// Frame source backed by `wl_surface.frame` callbacks.
///
/// Requests without a root go to the surface the source was created with.
/// Frame handles are unique per surface.
pub struct CompositorFrameSource<D> {
    qh: QueueHandle<D>,
    default_surface: WlSurface,
    surfaces: RefCell<HashMap<ObjectId, SurfaceFrames>>,
}

impl<D> CompositorFrameSource<D>
where
    D: Dispatch<wl_callback::WlCallback, WlSurface> + 'static,
{
    pub fn new(qh: QueueHandle<D>, default_surface: WlSurface) -> Self {
        Self {
            qh,
            default_surface,
            surfaces: RefCell::new(HashMap::new()),
        }
    }

    /// Dispatch the callbacks waiting on `surface`. Call this from
    /// `CompositorHandler::frame`.
    pub fn frame_done(&self, surface: &WlSurface, time: u32) -> usize {
        let frames = {
            let mut surfaces = self.surfaces.borrow_mut();
            match surfaces.get_mut(&surface.id()) {
                Some(entry) => {
                    entry.awaiting = false;
                    entry.queue.take()
                }
                None => return 0,
            }
        };
        dispatch(frames, f64::from(time))
    }

    /// Drop everything pending on a surface that is being destroyed
    pub fn forget_surface(&self, surface: &WlSurface) {
        if let Some(entry) = self.surfaces.borrow_mut().remove(&surface.id()) {
            log::debug!(
                "Dropping {} pending frame(s) for surface {}",
                entry.queue.len(),
                entry.surface.id()
            );
        }
    }

    /// Number of callbacks waiting on `surface`
    pub fn pending(&self, surface: &WlSurface) -> usize {
        self.surfaces
            .borrow()
            .get(&surface.id())
            .map_or(0, |entry| entry.queue.len())
    }
}

impl<D> FrameSource for CompositorFrameSource<D>
where
    D: Dispatch<wl_callback::WlCallback, WlSurface> + 'static,
{
    type Root = WlSurface;

    fn request_frame(&self, callback: FrameCallback, root: Option<&WlSurface>) -> FrameHandle {
        let surface = root.unwrap_or(&self.default_surface);
        let mut surfaces = self.surfaces.borrow_mut();
        let entry = surfaces
            .entry(surface.id())
            .or_insert_with(|| SurfaceFrames {
                surface: surface.clone(),
                queue: FrameQueue::new(),
                awaiting: false,
            });

        let handle = entry.queue.push(callback);
        if !entry.awaiting {
            entry.surface.frame(&self.qh, entry.surface.clone());
            entry.surface.commit();
            entry.awaiting = true;
        }
        handle
    }
}

/// Compositor frames when a surface is available, the timer otherwise.
///
/// The choice is made once, at construction.
pub enum HostFrameSource<D: 'static> {
    Compositor(CompositorFrameSource<D>),
    Timer(TimerFrameSource<D, WlSurface>),
}

impl<D> HostFrameSource<D>
where
    D: Dispatch<wl_callback::WlCallback, WlSurface> + 'static,
{
    pub fn new(
        handle: LoopHandle<'static, D>,
        compositor: Option<(QueueHandle<D>, WlSurface)>,
    ) -> Result<Self, FrameSourceError> {
        match compositor {
            Some((qh, surface)) => {
                log::info!("Using compositor frame callbacks");
                Ok(Self::Compositor(CompositorFrameSource::new(qh, surface)))
            }
            None => {
                log::info!("No compositor surface available, emulating frames with a timer");
                Ok(Self::Timer(TimerFrameSource::new(handle)?))
            }
        }
    }

    /// Forward a compositor frame event. A no-op for the timer source.
    pub fn frame_done(&self, surface: &WlSurface, time: u32) -> usize {
        match self {
            Self::Compositor(source) => source.frame_done(surface, time),
            Self::Timer(_) => 0,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Compositor(_))
    }
}

impl<D> FrameSource for HostFrameSource<D>
where
    D: Dispatch<wl_callback::WlCallback, WlSurface> + 'static,
{
    type Root = WlSurface;

    fn request_frame(&self, callback: FrameCallback, root: Option<&WlSurface>) -> FrameHandle {
        match self {
            Self::Compositor(source) => source.request_frame(callback, root),
            Self::Timer(source) => source.request_frame(callback, root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::os::unix::net::UnixStream;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use calloop::EventLoop;
    use wayland_client::{Connection, EventQueue};

    struct TestState;

    impl Dispatch<wl_callback::WlCallback, WlSurface> for TestState {
        fn event(
            _: &mut Self,
            _: &wl_callback::WlCallback,
            _: wl_callback::Event,
            _: &WlSurface,
            _: &Connection,
            _: &QueueHandle<Self>,
        ) {
        }
    }

    /// A connection over a socket pair with no compositor behind it. Requests
    /// on inert surfaces are discarded locally.
    fn offline() -> (Connection, EventQueue<TestState>, WlSurface, UnixStream) {
        let (client, server) = UnixStream::pair().expect("socket pair");
        let conn = Connection::from_socket(client).expect("connection");
        let queue = conn.new_event_queue::<TestState>();
        let surface = WlSurface::inert(conn.backend().downgrade());
        (conn, queue, surface, server)
    }

    fn counter() -> (Rc<Cell<u32>>, FrameCallback) {
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        (fired, Box::new(move |_| f.set(f.get() + 1)))
    }

    #[test]
    fn test_host_without_surface_uses_timer() {
        let mut event_loop: EventLoop<'static, TestState> =
            EventLoop::try_new().expect("event loop");
        let source = HostFrameSource::new(event_loop.handle(), None).expect("host source");
        assert!(!source.is_native());

        let (_conn, _queue, surface, _server) = offline();
        let (fired, callback) = counter();
        source.request_frame(callback, Some(&surface));

        match &source {
            HostFrameSource::Timer(timer) => {
                assert!(timer.is_armed());
                assert_eq!(timer.pending(), 1);
            }
            HostFrameSource::Compositor(_) => panic!("expected the timer source"),
        }

        // Compositor events do not reach the timer queue
        assert_eq!(source.frame_done(&surface, 16), 0);
        assert_eq!(fired.get(), 0);

        let deadline = Instant::now() + Duration::from_secs(2);
        while fired.get() == 0 && Instant::now() < deadline {
            event_loop
                .dispatch(Some(Duration::from_millis(5)), &mut TestState)
                .expect("dispatch failed");
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_host_with_surface_is_native() {
        let event_loop: EventLoop<'static, TestState> = EventLoop::try_new().expect("event loop");
        let (_conn, queue, surface, _server) = offline();
        let source =
            HostFrameSource::new(event_loop.handle(), Some((queue.handle(), surface.clone())))
                .expect("host source");
        assert!(source.is_native());

        let (fired, callback) = counter();
        source.request_frame(callback, None);
        assert_eq!(fired.get(), 0);

        assert_eq!(source.frame_done(&surface, 33), 1);
        assert_eq!(fired.get(), 1);
        assert_eq!(source.frame_done(&surface, 50), 0);
    }

    #[test]
    fn test_compositor_batches_requests_per_frame() {
        let (_conn, queue, surface, _server) = offline();
        let source = CompositorFrameSource::new(queue.handle(), surface.clone());

        let seen = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let seen = seen.clone();
            source.request_frame(
                Box::new(move |ts: f64| seen.borrow_mut().push((i, ts))),
                Some(&surface),
            );
        }
        assert_eq!(source.pending(&surface), 3);

        assert_eq!(source.frame_done(&surface, 1000), 3);
        assert_eq!(*seen.borrow(), vec![(0, 1000.0), (1, 1000.0), (2, 1000.0)]);
        assert_eq!(source.pending(&surface), 0);
    }

    #[test]
    fn test_forgotten_surface_drops_pending_frames() {
        let (_conn, queue, surface, _server) = offline();
        let source = CompositorFrameSource::new(queue.handle(), surface.clone());

        let (fired, callback) = counter();
        source.request_frame(callback, None);
        assert_eq!(source.pending(&surface), 1);

        source.forget_surface(&surface);
        assert_eq!(source.pending(&surface), 0);
        assert_eq!(source.frame_done(&surface, 16), 0);
        assert_eq!(fired.get(), 0);
    }
}
