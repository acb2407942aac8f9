use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use calloop::EventLoop;
use framepace::prelude::*;

fn run_until(event_loop: &mut EventLoop<'static, ()>, limit: Duration, done: impl Fn() -> bool) {
    let deadline = Instant::now() + limit;
    while !done() && Instant::now() < deadline {
        event_loop
            .dispatch(Some(Duration::from_millis(5)), &mut ())
            .expect("dispatch failed");
    }
}

#[test]
fn test_animation_completes_on_timer_frames() {
    let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new().expect("event loop");
    let source = TimerFrameSource::<()>::new(event_loop.handle()).expect("timer source");
    let scheduler = Scheduler::new(source);

    let rendered = Rc::new(Cell::new(0));
    let done = Rc::new(Cell::new(None));
    let (r, d) = (rendered.clone(), done.clone());
    let id = scheduler.start(
        Animation::new(move |_, _, is_rendered| {
            if is_rendered {
                r.set(r.get() + 1);
            }
        })
        .duration(Duration::from_millis(100))
        .on_complete(move |c| d.set(Some(c))),
    );

    run_until(&mut event_loop, Duration::from_secs(2), || done.get().is_some());

    let completion = done.get().expect("animation did not complete");
    assert_eq!(completion.id, id);
    assert!(completion.finished);
    assert!(rendered.get() >= 2);
    assert!(!scheduler.is_running(id));
}

#[test]
fn test_timer_stops_when_idle_and_rearms() {
    let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new().expect("event loop");
    let config = TimerConfig::default().idle_timeout(Duration::from_millis(50));
    let source = TimerFrameSource::<()>::with_config(
        event_loop.handle(),
        config,
        Rc::new(SystemClock::new()),
    )
    .expect("timer source");
    let scheduler = Scheduler::new(source);
    // Nothing to dispatch yet, so no timer
    assert!(!scheduler.source().is_armed());

    let finished = Rc::new(Cell::new(0));
    let f = finished.clone();
    scheduler.start(Animation::new(|_, _, _| false).on_complete(move |_| f.set(f.get() + 1)));
    assert!(scheduler.source().is_armed());
    run_until(&mut event_loop, Duration::from_secs(2), || finished.get() == 1);
    assert_eq!(finished.get(), 1);

    let armed = || scheduler.source().is_armed();
    run_until(&mut event_loop, Duration::from_secs(2), || !armed());
    assert!(!scheduler.source().is_armed());

    let f = finished.clone();
    scheduler.start(Animation::new(|_, _, _| false).on_complete(move |_| f.set(f.get() + 1)));
    assert!(scheduler.source().is_armed());
    run_until(&mut event_loop, Duration::from_secs(2), || finished.get() == 2);
    assert_eq!(finished.get(), 2);
}

#[test]
fn test_invalid_rate_is_rejected() {
    let event_loop: EventLoop<'static, ()> = EventLoop::try_new().expect("event loop");
    let result = TimerFrameSource::<()>::with_config(
        event_loop.handle(),
        TimerConfig::default().fps(0.0),
        Rc::new(SystemClock::new()),
    );
    assert!(matches!(result, Err(FrameSourceError::InvalidRate(_))));
}

#[test]
fn test_new_source_stays_quiet_until_requested() {
    let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new().expect("event loop");
    let source = Rc::new(TimerFrameSource::<()>::new(event_loop.handle()).expect("timer source"));
    assert!(!source.is_armed());

    // Dispatching an idle loop fires nothing
    event_loop
        .dispatch(Some(Duration::from_millis(40)), &mut ())
        .expect("dispatch failed");
    assert!(!source.is_armed());
    assert_eq!(source.pending(), 0);

    let fired = Rc::new(Cell::new(false));
    let f = fired.clone();
    source.request_frame(Box::new(move |_| f.set(true)), None);
    assert!(source.is_armed());
    assert_eq!(source.pending(), 1);

    run_until(&mut event_loop, Duration::from_secs(2), || fired.get());
    assert!(fired.get());
    assert_eq!(source.pending(), 0);
}
