//! Direction vector with a cached magnitude
//!
//! `Vector` keeps its length next to its components so hot paths (the grid's
//! light-direction clamp, the mesh builder's repeated resizes) never pay for a
//! square root they already know. Every mutation goes through a method that
//! updates both together.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub};

use crate::core::error::Error;
use crate::core::types::{DVec3, Point, Result};
use crate::math::angles::SphericalAngles;
use crate::math::constants::trunc4;

/// 3D vector plus its magnitude
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector {
    v: DVec3,
    mag: f64,
}

impl Vector {
    pub const ZERO: Self = Self { v: DVec3::ZERO, mag: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_dvec3(DVec3::new(x, y, z))
    }

    pub fn from_dvec3(v: DVec3) -> Self {
        Self { v, mag: v.length() }
    }

    /// Vector from `from` to `to`
    pub fn between(from: Point, to: Point) -> Self {
        Self::from_dvec3(to - from)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.v.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.v.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.v.z
    }

    /// Cached length
    #[inline]
    pub fn mag(&self) -> f64 {
        self.mag
    }

    #[inline]
    pub fn as_dvec3(&self) -> DVec3 {
        self.v
    }

    pub fn is_zero(&self) -> bool {
        self.mag == 0.0
    }

    /// Scale in place to `new_length`
    pub fn resize(&mut self, new_length: f64) -> Result<()> {
        *self = self.resized(new_length)?;
        Ok(())
    }

    /// Copy scaled to `new_length`
    pub fn resized(&self, new_length: f64) -> Result<Self> {
        if self.mag == 0.0 {
            return Err(Error::DegenerateVector);
        }
        let normalizer = new_length / self.mag;
        Ok(Self { v: self.v * normalizer, mag: new_length.abs() })
    }

    /// Like [`Vector::resized`], but logs and yields a zero vector when
    /// `self` has no length. `context` names the caller in the warning.
    pub fn resized_or_zero(&self, new_length: f64, context: &str) -> Self {
        self.resized(new_length).unwrap_or_else(|e| {
            log::warn!("{e} (in {context}); using zero displacement");
            Self::ZERO
        })
    }

    /// Unit-length copy
    pub fn normalized(&self) -> Result<Self> {
        self.resized(1.0)
    }

    /// Turn toward `v` by adding it, keeping the original length
    pub fn change_direction(&mut self, v: &Vector) -> Result<()> {
        let original_length = self.mag;
        *self += *v;
        self.resize(original_length)
    }

    /// Truncate each component at the 4th decimal and recompute the length
    pub fn trunc4(&mut self) {
        *self = Self::new(trunc4(self.v.x), trunc4(self.v.y), trunc4(self.v.z));
    }

    /// Same vector with the vertical component negated
    pub fn flipped_y(&self) -> Self {
        Self { v: DVec3::new(self.v.x, -self.v.y, self.v.z), mag: self.mag }
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.v.dot(other.v)
    }

    pub fn cross(&self, other: &Vector) -> Self {
        Self::from_dvec3(self.v.cross(other.v))
    }

    /// Angle in radians, `0..=π`
    pub fn angle_between(&self, other: &Vector) -> Result<f64> {
        angle_between(self, other)
    }

    /// Polar/azimuth direction of this vector
    pub fn angles(&self) -> SphericalAngles {
        SphericalAngles::from_vector(self)
    }
}

/// Distance between two points
pub fn distance(p: Point, q: Point) -> f64 {
    p.distance(q)
}

/// Angle in radians between `a` and `b`, cosine clamped to [-1, 1]
pub fn angle_between(a: &Vector, b: &Vector) -> Result<f64> {
    let mag_product = a.mag * b.mag;
    if mag_product == 0.0 {
        return Err(Error::DegenerateVector);
    }
    Ok((a.dot(b) / mag_product).clamp(-1.0, 1.0).acos())
}

impl From<DVec3> for Vector {
    fn from(v: DVec3) -> Self {
        Self::from_dvec3(v)
    }
}

impl From<Vector> for DVec3 {
    fn from(v: Vector) -> Self {
        v.v
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::from_dvec3(self.v + rhs.v)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::from_dvec3(self.v - rhs.v)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        Vector { v: self.v * rhs, mag: self.mag * rhs.abs() }
    }
}

impl MulAssign<f64> for Vector {
    fn mul_assign(&mut self, rhs: f64) {
        *self = *self * rhs;
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector { v: -self.v, mag: self.mag }
    }
}

impl Add<Vector> for DVec3 {
    type Output = DVec3;

    fn add(self, rhs: Vector) -> DVec3 {
        self + rhs.v
    }
}

impl Sub<Vector> for DVec3 {
    type Output = DVec3;

    fn sub(self, rhs: Vector) -> DVec3 {
        self - rhs.v
    }
}

impl AddAssign<Vector> for DVec3 {
    fn add_assign(&mut self, rhs: Vector) {
        *self += rhs.v;
    }
}

impl std::ops::SubAssign<Vector> for DVec3 {
    fn sub_assign(&mut self, rhs: Vector) {
        *self -= rhs.v;
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {}, {} ]", self.v.x, self.v.y, self.v.z)
    }
}
