//! 3-component vector math for the simulation
//!
//! `Vector3` is a plain `f64` value type with the operations the engine
//! needs: arithmetic, dot product, magnitude, unit vector, and angle
//! between vectors. Directional operations on a (near-)zero vector are
//! undefined and return [`SimError::DegenerateVector`] so the force pass
//! can skip the offending pair instead of feeding NaN into body state.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::error::SimError;

/// Magnitudes below this are treated as zero for unit/angle purposes.
pub const EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn magnitude_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Always defined and non-negative.
    pub fn magnitude(&self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    /// Vector of magnitude 1 pointing the same way as `self`.
    ///
    /// Fails for inputs of magnitude below [`EPSILON`], which have no
    /// direction.
    pub fn unit(&self) -> Result<Self, SimError> {
        let m = self.magnitude();
        if m < EPSILON {
            return Err(SimError::DegenerateVector);
        }
        Ok(Self::new(self.x / m, self.y / m, self.z / m))
    }

    /// Angle between `self` and `other` in radians, in `[0, pi]`.
    ///
    /// Fails if either vector has magnitude below [`EPSILON`].
    pub fn angle_with(&self, other: &Self) -> Result<f64, SimError> {
        let ma = self.magnitude();
        let mb = other.magnitude();
        if ma < EPSILON || mb < EPSILON {
            return Err(SimError::DegenerateVector);
        }
        // Clamp against rounding before acos so parallel vectors stay defined.
        Ok((self.dot(other) / (ma * mb)).clamp(-1.0, 1.0).acos())
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vector3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector3 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vector3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vector3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

impl Mul<Vector3> for f64 {
    type Output = Vector3;

    fn mul(self, v: Vector3) -> Vector3 {
        v * self
    }
}
