use std::cell::RefCell;
use std::marker::PhantomData;

use super::{dispatch_queue, FrameCallback, FrameHandle, FrameQueue, FrameSource};

/// Frame source driven by the host.
///
/// Nothing happens until [`ManualFrameSource::tick`] is called; each tick
/// dispatches every callback requested before it. Useful for hosts that own
/// their render loop and for deterministic tests.
pub struct ManualFrameSource<R = ()> {
    queue: RefCell<FrameQueue>,
    _root: PhantomData<fn() -> R>,
}

impl<R> ManualFrameSource<R> {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(FrameQueue::new()),
            _root: PhantomData,
        }
    }

    /// Dispatch one frame at `timestamp`, returning how many callbacks ran
    pub fn tick(&self, timestamp: f64) -> usize {
        dispatch_queue(&self.queue, timestamp)
    }

    /// Number of callbacks waiting for the next tick
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<R> Default for ManualFrameSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Clone + 'static> FrameSource for ManualFrameSource<R> {
    type Root = R;

    fn request_frame(&self, callback: FrameCallback, _root: Option<&R>) -> FrameHandle {
        self.queue.borrow_mut().push(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_tick_runs_pending_once() {
        let source = ManualFrameSource::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        source.request_frame(Box::new(move |_| h.set(h.get() + 1)), None);

        assert_eq!(source.pending(), 1);
        assert_eq!(source.tick(16.0), 1);
        assert_eq!(source.tick(32.0), 0);
        assert_eq!(hits.get(), 1);
    }
}
