use approx::AbsDiffEq;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::error::KernelError;

/// A vector in 3D Euclidean space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: &Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length(&self) -> f64 {
        self.length_squared().sqrt()
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn normalized(&self) -> Option<Self> {
        let len = self.length();
        if len < 1e-15 || !len.is_finite() {
            None
        } else {
            Some(*self / len)
        }
    }

    pub fn angle_to(&self, other: &Self) -> f64 {
        let len_product = self.length() * other.length();
        if len_product < 1e-15 {
            return 0.0;
        }
        (self.dot(other) / len_product).clamp(-1.0, 1.0).acos()
    }

    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (*self - *other).length() <= epsilon
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Triple scalar product: self . (b x c)
    pub fn triple(&self, b: &Self, c: &Self) -> f64 {
        self.dot(&b.cross(c))
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl AbsDiffEq for Vec3 {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        crate::default_tolerance().coincidence
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.approx_eq(other, epsilon)
    }
}

/// A unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec3", into = "Vec3")]
pub struct Direction(Vec3);

impl Direction {
    pub const X: Self = Self(Vec3::X);
    pub const Y: Self = Self(Vec3::Y);
    pub const Z: Self = Self(Vec3::Z);

    /// Reference "up" axis used to pick the seed face during orientation repair.
    pub const UP: Self = Self::Z;

    /// Normalize `v`; `None` for a zero or non-finite vector.
    pub fn new(v: Vec3) -> Option<Self> {
        v.normalized().map(Self)
    }

    pub fn as_vec3(&self) -> Vec3 {
        self.0
    }

    pub fn reversed(&self) -> Self {
        Self(-self.0)
    }

    pub fn dot(&self, v: &Vec3) -> f64 {
        self.0.dot(v)
    }

    /// True when the two directions are perpendicular within `tolerance`
    /// (absolute value of the cosine).
    pub fn is_perpendicular_to(&self, other: &Direction, tolerance: f64) -> bool {
        self.0.dot(&other.0).abs() <= tolerance
    }

    pub fn approx_eq(&self, other: &Direction, epsilon: f64) -> bool {
        self.0.approx_eq(&other.0, epsilon)
    }
}

impl TryFrom<Vec3> for Direction {
    type Error = KernelError;

    fn try_from(v: Vec3) -> Result<Self, Self::Error> {
        Self::new(v).ok_or_else(|| KernelError::DegenerateInput {
            reason: format!("cannot build a direction from {v:?}"),
        })
    }
}

impl From<Direction> for Vec3 {
    fn from(d: Direction) -> Self {
        d.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_cross_product() {
        let result = Vec3::X.cross(&Vec3::Y);
        assert!(result.approx_eq(&Vec3::Z, 1e-12));
    }

    #[test]
    fn test_normalized() {
        let n = Vec3::new(3.0, 0.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-12);
        assert!((n.x - 0.6).abs() < 1e-12);
        assert!(Vec3::ZERO.normalized().is_none());
    }

    #[test]
    fn test_angle_to() {
        assert!((Vec3::X.angle_to(&Vec3::Y) - FRAC_PI_2).abs() < 1e-12);
        assert!((Vec3::X.angle_to(&(-Vec3::X)) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_direction_is_unit() {
        let d = Direction::new(Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert!(d.approx_eq(&Direction::Z.reversed(), 1e-12));
        assert!(Direction::new(Vec3::ZERO).is_none());
        assert!(Direction::X.is_perpendicular_to(&Direction::UP, 1e-12));
        assert!(!d.is_perpendicular_to(&Direction::UP, 1e-12));
    }

    #[test]
    fn test_direction_try_from_rejects_zero() {
        assert!(Direction::try_from(Vec3::ZERO).is_err());
        let d = Direction::try_from(Vec3::new(2.0, 0.0, 0.0)).unwrap();
        assert_eq!(Vec3::from(d), Vec3::X);
    }

    #[test]
    fn test_triple_product() {
        assert!((Vec3::X.triple(&Vec3::Y, &Vec3::Z) - 1.0).abs() < 1e-12);
    }
}
