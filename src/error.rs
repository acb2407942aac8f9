use thiserror::Error;

/// Errors raised while setting up a frame source.
///
/// These are configuration failures surfaced once at construction; running
/// animations never produce errors.
#[derive(Debug, Error)]
pub enum FrameSourceError {
    #[error("frame timer could not be registered with the event loop: {0}")]
    TimerUnavailable(String),
    #[error("frame rate must be positive and finite, got {0}")]
    InvalidRate(f64),
}
