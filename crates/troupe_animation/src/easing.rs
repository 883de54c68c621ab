//! Easing curves for animation progress.
//!
//! An easing maps normalized timeline progress in [0, 1] to an
//! interpolation factor. Most curves stay within [0, 1]; custom curves may
//! overshoot.

use std::rc::Rc;

/// Easing function selector
#[derive(Clone)]
pub enum Easing {
    /// Constant speed (no easing)
    Linear,
    /// Starts slow, ends fast
    EaseInQuad,
    /// Starts fast, ends slow
    EaseOutQuad,
    /// Slow start and end, fast middle
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    /// CSS cubic-bezier curve (x1, y1, x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// User-defined curve
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl Easing {
    /// Evaluate the easing at progress `t` (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Easing::EaseOutSine => (t * std::f32::consts::FRAC_PI_2).sin(),
            Easing::EaseInOutSine => 0.5 * (1.0 - (t * std::f32::consts::PI).cos()),
            Easing::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * (t - 1.0))
                }
            }
            Easing::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, *x1, *y1, *x2, *y2),
            Easing::Custom(f) => f(t),
        }
    }

    /// Create a custom easing from a closure
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f32) -> f32 + 'static,
    {
        Easing::Custom(Rc::new(f))
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Linear
    }
}

impl std::fmt::Debug for Easing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Easing::Linear => write!(f, "Linear"),
            Easing::EaseInQuad => write!(f, "EaseInQuad"),
            Easing::EaseOutQuad => write!(f, "EaseOutQuad"),
            Easing::EaseInOutQuad => write!(f, "EaseInOutQuad"),
            Easing::EaseInCubic => write!(f, "EaseInCubic"),
            Easing::EaseOutCubic => write!(f, "EaseOutCubic"),
            Easing::EaseInOutCubic => write!(f, "EaseInOutCubic"),
            Easing::EaseInSine => write!(f, "EaseInSine"),
            Easing::EaseOutSine => write!(f, "EaseOutSine"),
            Easing::EaseInOutSine => write!(f, "EaseInOutSine"),
            Easing::EaseInExpo => write!(f, "EaseInExpo"),
            Easing::EaseOutExpo => write!(f, "EaseOutExpo"),
            Easing::CubicBezier(x1, y1, x2, y2) => {
                write!(f, "CubicBezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
            Easing::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Cubic bezier curve evaluation
/// Simplified implementation assuming x1, x2 are in [0, 1]
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    // Use Newton-Raphson to solve for the curve parameter given x
    let mut current_t = t;
    for _ in 0..8 {
        let current_x = cubic_bezier_axis(current_t, x1, x2);
        let current_slope = cubic_bezier_slope(current_t, x1, x2);
        if current_slope.abs() < 1e-6 {
            break;
        }
        current_t -= (current_x - t) / current_slope;
    }
    cubic_bezier_axis(current_t, y1, y2)
}

fn cubic_bezier_axis(t: f32, p1: f32, p2: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    let mt = 1.0 - t;
    let mt2 = mt * mt;
    3.0 * mt2 * t * p1 + 3.0 * mt * t2 * p2 + t3
}

fn cubic_bezier_slope(t: f32, p1: f32, p2: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear() {
        assert_eq!(Easing::Linear.apply(0.0), 0.0);
        assert_eq!(Easing::Linear.apply(0.5), 0.5);
        assert_eq!(Easing::Linear.apply(1.0), 1.0);
    }

    #[test]
    fn test_ease_in_is_slow_at_start() {
        assert!(Easing::EaseInQuad.apply(0.5) < 0.5);
        assert!(Easing::EaseInCubic.apply(0.5) < 0.5);
        assert!(Easing::EaseInSine.apply(0.5) < 0.5);
    }

    #[test]
    fn test_ease_out_is_fast_at_start() {
        assert!(Easing::EaseOutQuad.apply(0.5) > 0.5);
        assert!(Easing::EaseOutCubic.apply(0.5) > 0.5);
        assert!(Easing::EaseOutSine.apply(0.5) > 0.5);
    }

    #[test]
    fn test_endpoints_are_exact() {
        let curves = [
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutQuad,
            Easing::EaseInOutQuad,
            Easing::EaseInCubic,
            Easing::EaseOutCubic,
            Easing::EaseInOutCubic,
            Easing::EaseInSine,
            Easing::EaseOutSine,
            Easing::EaseInOutSine,
            Easing::EaseInExpo,
            Easing::EaseOutExpo,
        ];
        for curve in curves {
            assert!(curve.apply(0.0).abs() < 1e-3, "{curve:?} at 0");
            assert!((curve.apply(1.0) - 1.0).abs() < 1e-3, "{curve:?} at 1");
        }
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn test_cubic_bezier_ease_matches_shape() {
        // The CSS "ease" curve: slow start, fast middle.
        let ease = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
        assert!(ease.apply(0.1) < 0.1);
        assert!(ease.apply(0.5) > 0.5);
    }

    #[test]
    fn test_custom() {
        let step = Easing::custom(|t| if t < 0.5 { 0.0 } else { 1.0 });
        assert_eq!(step.apply(0.25), 0.0);
        assert_eq!(step.apply(0.75), 1.0);
    }
}
