//! 2D affine transforms.
//!
//! Actor transforms compose parent-to-child during paint traversal; nothing
//! here is cached, an actor's world transform is always derived from its
//! current transform state.

use crate::geometry::{Point, Rect, Vec2};

/// 2D affine transform
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2D {
    /// Matrix elements [a, b, c, d, tx, ty]
    /// | a  c  tx |
    /// | b  d  ty |
    /// | 0  0   1 |
    pub elements: [f32; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2D {
    pub const IDENTITY: Affine2D = Affine2D {
        elements: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            elements: [1.0, 0.0, 0.0, 1.0, x, y],
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            elements: [sx, 0.0, 0.0, sy, 0.0, 0.0],
        }
    }

    /// Rotation by `angle` radians, counter-clockwise
    pub fn rotation(angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            elements: [c, s, -s, c, 0.0, 0.0],
        }
    }

    /// Build an actor's local transform from its transform state.
    ///
    /// Composition order is translate → rotate → scale, with rotation and
    /// scale applied about the anchor point: a local point is shifted by
    /// `-anchor`, scaled, rotated, and placed at `position`.
    pub fn from_trs(position: Point, rotation: f32, scale: Vec2, anchor: Point) -> Self {
        Self::translation(position.x, position.y)
            .then(&Self::rotation(rotation))
            .then(&Self::scale(scale.x, scale.y))
            .then(&Self::translation(-anchor.x, -anchor.y))
    }

    pub fn transform_point(&self, point: Point) -> Point {
        let [a, b, c, d, tx, ty] = self.elements;
        Point::new(
            a * point.x + c * point.y + tx,
            b * point.x + d * point.y + ty,
        )
    }

    /// Axis-aligned bounding box of a rect under this transform.
    ///
    /// Exact for translation and scale; conservative under rotation.
    pub fn transform_rect_aabb(&self, rect: Rect) -> Rect {
        let p0 = self.transform_point(rect.origin);
        let p1 = self.transform_point(Point::new(rect.x() + rect.width(), rect.y()));
        let p2 = self.transform_point(Point::new(rect.x(), rect.y() + rect.height()));
        let p3 = self.transform_point(Point::new(
            rect.x() + rect.width(),
            rect.y() + rect.height(),
        ));
        Rect::from_points(p0, p1)
            .expand_to_include(p2)
            .expand_to_include(p3)
    }

    /// Concatenate this transform with another (self * other)
    /// The resulting transform first applies `other`, then `self`.
    pub fn then(&self, other: &Affine2D) -> Affine2D {
        let [a1, b1, c1, d1, tx1, ty1] = self.elements;
        let [a2, b2, c2, d2, tx2, ty2] = other.elements;

        // Matrix multiplication for 2D affine transforms:
        // [a1 c1 tx1]   [a2 c2 tx2]
        // [b1 d1 ty1] * [b2 d2 ty2]
        // [0  0  1  ]   [0  0  1  ]
        Affine2D {
            elements: [
                a1 * a2 + c1 * b2,         // a
                b1 * a2 + d1 * b2,         // b
                a1 * c2 + c1 * d2,         // c
                b1 * c2 + d1 * d2,         // d
                a1 * tx2 + c1 * ty2 + tx1, // tx
                b1 * tx2 + d1 * ty2 + ty1, // ty
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, c, d, _, _] = self.elements;
        a * d - b * c
    }

    /// Invert the transform, if it is invertible.
    ///
    /// Returns None for degenerate transforms (e.g. zero scale).
    pub fn invert(&self) -> Option<Affine2D> {
        let det = self.determinant();
        if det.abs() < f32::EPSILON {
            return None;
        }
        let [a, b, c, d, tx, ty] = self.elements;
        let inv_det = 1.0 / det;
        Some(Affine2D {
            elements: [
                d * inv_det,
                -b * inv_det,
                -c * inv_det,
                a * inv_det,
                (c * ty - d * tx) * inv_det,
                (b * tx - a * ty) * inv_det,
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(p: Point, x: f32, y: f32) {
        assert!((p.x - x).abs() < 1e-4, "x: {} != {}", p.x, x);
        assert!((p.y - y).abs() < 1e-4, "y: {} != {}", p.y, y);
    }

    #[test]
    fn test_identity() {
        let p = Affine2D::IDENTITY.transform_point(Point::new(3.0, 4.0));
        assert_point_eq(p, 3.0, 4.0);
    }

    #[test]
    fn test_then_applies_right_to_left() {
        // Scale first, then translate.
        let t = Affine2D::translation(10.0, 0.0).then(&Affine2D::scale(2.0, 2.0));
        let p = t.transform_point(Point::new(1.0, 1.0));
        assert_point_eq(p, 12.0, 2.0);
    }

    #[test]
    fn test_from_trs_anchor() {
        // A point at the anchor always lands exactly on the position,
        // regardless of rotation or scale.
        let t = Affine2D::from_trs(
            Point::new(100.0, 50.0),
            std::f32::consts::FRAC_PI_2,
            Vec2::new(3.0, 3.0),
            Point::new(10.0, 10.0),
        );
        let p = t.transform_point(Point::new(10.0, 10.0));
        assert_point_eq(p, 100.0, 50.0);
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Affine2D::from_trs(
            Point::new(20.0, -7.0),
            0.3,
            Vec2::new(2.0, 0.5),
            Point::new(5.0, 5.0),
        );
        let inv = t.invert().unwrap();
        let p = Point::new(13.0, 42.0);
        let back = inv.transform_point(t.transform_point(p));
        assert_point_eq(back, p.x, p.y);
    }

    #[test]
    fn test_invert_degenerate() {
        assert!(Affine2D::scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_rect_aabb_under_rotation() {
        // A unit square rotated 45° has an AABB of side sqrt(2).
        let t = Affine2D::rotation(std::f32::consts::FRAC_PI_4);
        let aabb = t.transform_rect_aabb(Rect::new(0.0, 0.0, 1.0, 1.0));
        let side = 2f32.sqrt();
        assert!((aabb.width() - side).abs() < 1e-4);
        assert!((aabb.height() - side).abs() < 1e-4);
    }
}
