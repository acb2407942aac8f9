//! Easing curves for duration-based animations.
//!
//! The scheduler clamps progress to `[0, 1]` before easing, so every curve
//! starts at `evaluate(0.0)` and lands exactly on `evaluate(1.0)` on the
//! final step. Only [`Easing::CubicBezier`] and [`Easing::Custom`] can
//! produce values outside that range in between.
//!
//! [`Easing::EaseIn`], [`Easing::EaseOut`] and [`Easing::EaseInOut`] are
//! quadratic; the `Cubic` variants bend harder. [`Easing::EaseOutCubic`] is
//! what scroll deceleration normally wants.
//!
//! ## Example
//!
//! ```ignore
//! scheduler.start(
//!     Animation::new(|value, _, _| scroll_to(value * distance))
//!         .duration(Duration::from_millis(250))
//!         .easing(Easing::EaseOutCubic),
//! );
//! ```

use std::rc::Rc;

/// Easing function applied to animation progress
#[derive(Clone)]
pub enum Easing {
    /// Linear interpolation (constant speed)
    Linear,
    /// Starts slow, ends fast
    EaseIn,
    /// Starts fast, ends slow
    EaseOut,
    /// Starts slow, speeds up, then slows down
    EaseInOut,
    /// Cubic deceleration
    EaseOutCubic,
    /// Cubic acceleration then deceleration
    EaseInOutCubic,
    /// CSS cubic-bezier curve (x1, y1, x2, y2)
    CubicBezier(f64, f64, f64, f64),
    /// Custom easing function
    Custom(Rc<dyn Fn(f64) -> f64>),
}

impl Easing {
    /// Evaluate the easing at progress `t` (0.0 to 1.0).
    /// The result may leave [0, 1] for curves that overshoot.
    pub fn evaluate(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => ease_in(t),
            Easing::EaseOut => ease_out(t),
            Easing::EaseInOut => ease_in_out(t),
            Easing::EaseOutCubic => ease_out_cubic(t),
            Easing::EaseInOutCubic => ease_in_out_cubic(t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, *x1, *y1, *x2, *y2),
            Easing::Custom(f) => f(t),
        }
    }

    /// Create a custom easing from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + 'static,
    {
        Easing::Custom(Rc::new(f))
    }
}

impl std::fmt::Debug for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Easing::Linear => write!(f, "Linear"),
            Easing::EaseIn => write!(f, "EaseIn"),
            Easing::EaseOut => write!(f, "EaseOut"),
            Easing::EaseInOut => write!(f, "EaseInOut"),
            Easing::EaseOutCubic => write!(f, "EaseOutCubic"),
            Easing::EaseInOutCubic => write!(f, "EaseInOutCubic"),
            Easing::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "CubicBezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
            Easing::Custom(_) => write!(f, "Custom"),
        }
    }
}

fn ease_in(t: f64) -> f64 {
    t * t
}

fn ease_out(t: f64) -> f64 {
    t * (2.0 - t)
}

fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

fn ease_out_cubic(t: f64) -> f64 {
    (t - 1.0).powi(3) + 1.0
}

fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t * 2.0;
    if t < 1.0 {
        0.5 * t.powi(3)
    } else {
        0.5 * ((t - 2.0).powi(3) + 2.0)
    }
}

/// Cubic bezier curve evaluation
/// Simplified implementation assuming x1, x2 are in [0, 1]
fn cubic_bezier(t: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Newton-Raphson for the curve parameter whose x equals t
    let mut current_t = t;
    for _ in 0..8 {
        let current_x = cubic_bezier_x(current_t, x1, x2);
        let current_slope = cubic_bezier_slope(current_t, x1, x2);
        if current_slope.abs() < 1e-6 {
            break;
        }
        current_t -= (current_x - t) / current_slope;
    }
    cubic_bezier_y(current_t, y1, y2)
}

fn cubic_bezier_x(t: f64, x1: f64, x2: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * x1 + 3.0 * mt * t2 * x2 + t3
}

fn cubic_bezier_y(t: f64, y1: f64, y2: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    3.0 * mt * mt * t * y1 + 3.0 * mt * t2 * y2 + t3
}

fn cubic_bezier_slope(t: f64, x1: f64, x2: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * x1 + 6.0 * mt * t * (x2 - x1) + 3.0 * t * t * (1.0 - x2)
}
