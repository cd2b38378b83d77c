//! Vector and orientation primitives.
//!
//! Thin wrappers over [`nalgebra`] types: raw sensor readings are plain [`Vector`]s,
//! rotations are [`Orientation`]s, and anything compared against the target is a
//! [`Direction`] (a horizontal unit vector).

use std::f64::consts::PI;
use std::fmt;
use std::ops::Mul;

use nalgebra::{Unit, UnitQuaternion, Vector3};

/// A 3D vector with `f64` components.
pub type Vector = Vector3<f64>;

/// Returns `v` scaled to unit length, or `None` for zero-length or non-finite input.
pub fn normalized(v: &Vector) -> Option<Vector> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    v.try_normalize(0.0)
}

/// A rotation transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation(UnitQuaternion<f64>);

impl Orientation {
    pub fn identity() -> Self {
        Self(UnitQuaternion::identity())
    }

    /// The minimal rotation carrying `from` onto `to`.
    ///
    /// Opposite vectors are joined by a half turn about an axis orthogonal to `from`.
    /// A zero-length input yields the identity.
    pub fn vec_to_vec(from: &Vector, to: &Vector) -> Self {
        if let Some(q) = UnitQuaternion::rotation_between(from, to) {
            return Self(q);
        }

        let axis = Unit::try_new(from.cross(&Vector::x()), 1.0e-9)
            .or_else(|| Unit::try_new(from.cross(&Vector::y()), 1.0e-9));
        match axis {
            Some(axis) => Self(UnitQuaternion::from_axis_angle(&axis, PI)),
            None => Self::identity(),
        }
    }

    /// Rotation of the reference frame about the vertical axis by `angle` radians.
    ///
    /// Vectors are re-expressed in the rotated frame, so a horizontal vector turns
    /// by `-angle`: `rot_z(-PI / 2) * (1, 0, 0) == (0, 1, 0)`.
    pub fn rot_z(angle: f64) -> Self {
        Self(UnitQuaternion::from_axis_angle(&Vector::z_axis(), -angle))
    }

    pub fn apply(&self, v: &Vector) -> Vector {
        self.0.transform_vector(v)
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.inverse())
    }
}

impl Mul<Vector> for Orientation {
    type Output = Vector;

    fn mul(self, rhs: Vector) -> Vector {
        self.apply(&rhs)
    }
}

impl Mul for Orientation {
    type Output = Orientation;

    /// `(a * b) * v == a * (b * v)`
    fn mul(self, rhs: Orientation) -> Orientation {
        Orientation(self.0 * rhs.0)
    }
}

/// A horizontal unit vector (z is always zero).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction(Vector);

impl Direction {
    /// Builds a direction from planar components, normalizing them.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        Self::from_horizontal(&Vector::new(x, y, 0.0))
    }

    /// `(cos angle, sin angle)`
    pub fn from_angle(angle: f64) -> Self {
        Self(Vector::new(angle.cos(), angle.sin(), 0.0))
    }

    /// Projects `v` onto the horizontal plane and normalizes it.
    pub fn from_horizontal(v: &Vector) -> Option<Self> {
        normalized(&Vector::new(v.x, v.y, 0.0)).map(Self)
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn as_vector(&self) -> &Vector {
        &self.0
    }

    pub fn dot(&self, v: &Vector) -> f64 {
        self.0.dot(v)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.0.x, self.0.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1.0e-9;

    fn assert_close(a: &Vector, b: &Vector) {
        assert!((a - b).norm() < EPS, "{a:?} != {b:?}");
    }

    #[test]
    fn normalized_rejects_zero_and_non_finite() {
        assert!(normalized(&Vector::zeros()).is_none());
        assert!(normalized(&Vector::new(f64::NAN, 0.0, 1.0)).is_none());

        let v = normalized(&Vector::new(3.0, 0.0, 4.0)).expect("non-zero vector");
        assert!((v.norm() - 1.0).abs() < EPS);
    }

    #[test]
    fn vec_to_vec_aligns_source_onto_target() {
        let from = normalized(&Vector::new(0.3, -0.8, 0.5)).expect("non-zero vector");
        let to = Vector::new(0.0, 0.0, 1.0);
        assert_close(&(Orientation::vec_to_vec(&from, &to) * from), &to);
    }

    #[test]
    fn vec_to_vec_handles_opposite_vectors() {
        let from = Vector::new(0.0, 0.0, -1.0);
        let to = Vector::new(0.0, 0.0, 1.0);
        assert_close(&(Orientation::vec_to_vec(&from, &to) * from), &to);
    }

    #[test]
    fn rot_z_turns_frame() {
        let east = Vector::new(1.0, 0.0, 0.0);
        assert_close(
            &(Orientation::rot_z(-PI / 2.0) * east),
            &Vector::new(0.0, 1.0, 0.0),
        );
        assert_close(
            &(Orientation::rot_z(PI / 2.0) * east),
            &Vector::new(0.0, -1.0, 0.0),
        );
    }

    #[test]
    fn composition_and_inverse() {
        let a = Orientation::rot_z(0.4);
        let b = Orientation::rot_z(0.2);
        let v = Vector::new(0.6, 0.8, 0.0);

        assert_close(&((a * b) * v), &(Orientation::rot_z(0.6) * v));
        assert_close(&((a * a.inverse()) * v), &v);
    }

    #[test]
    fn direction_is_horizontal_unit() {
        let d = Direction::from_horizontal(&Vector::new(2.0, 2.0, 7.0))
            .expect("non-zero projection");
        assert_eq!(d.as_vector().z, 0.0);
        assert!((d.as_vector().norm() - 1.0).abs() < EPS);

        assert!(Direction::from_horizontal(&Vector::new(0.0, 0.0, 5.0)).is_none());
    }
}
