//! Runs one eased animation on a calloop loop with the timer frame source.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example timer_demo
//! ```

use std::time::Duration;

use calloop::EventLoop;
use framepace::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut event_loop: EventLoop<'static, ()> = EventLoop::try_new()?;
    let source = TimerFrameSource::<()>::new(event_loop.handle())?;
    let scheduler = Scheduler::new(source);

    let signal = event_loop.get_signal();
    let distance = 480.0;
    scheduler.start(
        Animation::new(move |value, now, rendered| {
            if rendered {
                log::info!("{:>8.1}ms  offset {:>6.1}px", now, value * distance);
            }
        })
        .duration(Duration::from_millis(600))
        .easing(Easing::EaseOutCubic)
        .on_complete(move |done| {
            log::info!(
                "Animation {} {} at ~{:.1} fps",
                done.id,
                if done.finished { "finished" } else { "was cancelled" },
                done.estimated_fps
            );
            signal.stop();
        }),
    );

    event_loop.run(None::<Duration>, &mut (), |_| {})?;
    Ok(())
}
