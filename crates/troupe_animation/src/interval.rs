//! Typed interpolation intervals.
//!
//! An [`Interval`] is the `(from, to)` endpoint pair a behaviour animates a
//! property across. Both endpoints carry the same [`PropertyValue`] kind;
//! the pairing is validated at construction so interpolation can never
//! observe a mismatch.

use troupe_core::{Color, PropertyValue, Vec2};

use crate::error::{AnimationError, Result};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

/// Opacity channel: interpolates in float space, rounds back to 0–255
impl Interpolate for u8 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let v = *self as f32 + (*other as f32 - *self as f32) * t;
        v.round().clamp(0.0, 255.0) as u8
    }
}

/// A typed endpoint pair for property animation
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    from: PropertyValue,
    to: PropertyValue,
}

impl Interval {
    /// Create an interval between two endpoints of the same kind
    pub fn new(from: impl Into<PropertyValue>, to: impl Into<PropertyValue>) -> Result<Self> {
        let from = from.into();
        let to = to.into();
        if from.kind() != to.kind() {
            return Err(AnimationError::IntervalKindMismatch);
        }
        Ok(Self { from, to })
    }

    pub fn from_value(&self) -> PropertyValue {
        self.from
    }

    pub fn to_value(&self) -> PropertyValue {
        self.to
    }

    /// Interpolate between the endpoints by eased factor `t`.
    ///
    /// Boolean intervals step at the midpoint.
    pub fn lerp(&self, t: f32) -> PropertyValue {
        match (&self.from, &self.to) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => {
                PropertyValue::Float(a.lerp(b, t))
            }
            (PropertyValue::Vec2(a), PropertyValue::Vec2(b)) => PropertyValue::Vec2(a.lerp(b, t)),
            (PropertyValue::Color(a), PropertyValue::Color(b)) => {
                PropertyValue::Color(a.lerp(b, t))
            }
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => {
                PropertyValue::Bool(if t < 0.5 { *a } else { *b })
            }
            // Kinds are validated at construction.
            _ => unreachable!("interval endpoints have mismatched kinds"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_interpolation() {
        assert!((0.0f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_vec2_interpolation() {
        let mid = Vec2::new(0.0, 0.0).lerp(&Vec2::new(10.0, 20.0), 0.5);
        assert!((mid.x - 5.0).abs() < 1e-6);
        assert!((mid.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_opacity_interpolation_rounds() {
        assert_eq!(0u8.lerp(&255, 0.5), 128);
        assert_eq!(0u8.lerp(&255, 0.0), 0);
        assert_eq!(0u8.lerp(&255, 1.0), 255);
    }

    #[test]
    fn test_interval_lerp() {
        let interval = Interval::new(0.0f32, 100.0f32).unwrap();
        assert_eq!(interval.lerp(0.5), PropertyValue::Float(50.0));
        assert_eq!(interval.lerp(0.0), PropertyValue::Float(0.0));
        assert_eq!(interval.lerp(1.0), PropertyValue::Float(100.0));
    }

    #[test]
    fn test_interval_kind_mismatch_is_rejected() {
        let err = Interval::new(0.0f32, true).unwrap_err();
        assert_eq!(err, AnimationError::IntervalKindMismatch);
    }

    #[test]
    fn test_bool_interval_steps_at_midpoint() {
        let interval = Interval::new(false, true).unwrap();
        assert_eq!(interval.lerp(0.4), PropertyValue::Bool(false));
        assert_eq!(interval.lerp(0.6), PropertyValue::Bool(true));
    }
}
