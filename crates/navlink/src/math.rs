//! Small, dependency-free 3D math used by the navigation graph.

use core::ops::{Add, AddAssign, Div, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used by the geometric predicates in this module.
pub const CMP_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }

    /// Unit-length copy of `self`, or [`Vec3::ZERO`] for a zero-length vector.
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            self / len
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Exact bitwise comparison (distinguishes `0.0` from `-0.0`).
    pub fn bits_eq(self, other: Self) -> bool {
        self.x.to_bits() == other.x.to_bits()
            && self.y.to_bits() == other.y.to_bits()
            && self.z.to_bits() == other.z.to_bits()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Affine transform: a 3x3 basis (stored as columns) followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    pub basis: [Vec3; 3],
    pub origin: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        basis: [Vec3::X, Vec3::Y, Vec3::Z],
        origin: Vec3::ZERO,
    };

    pub fn from_translation(origin: Vec3) -> Self {
        Self {
            origin,
            ..Self::IDENTITY
        }
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            basis: [Vec3::X * scale.x, Vec3::Y * scale.y, Vec3::Z * scale.z],
            origin: Vec3::ZERO,
        }
    }

    /// Rotation of `angle` radians about `axis` (Rodrigues' formula).
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let axis = axis.normalize_or_zero();
        if axis == Vec3::ZERO {
            return Self::IDENTITY;
        }
        let (sin, cos) = angle.sin_cos();
        let rotate = |v: Vec3| v * cos + axis.cross(v) * sin + axis * (axis.dot(v) * (1.0 - cos));
        Self {
            basis: [rotate(Vec3::X), rotate(Vec3::Y), rotate(Vec3::Z)],
            origin: Vec3::ZERO,
        }
    }

    /// Builds `translation * rotation(up, angle) * scale`.
    pub fn from_parts(translation: Vec3, up: Vec3, angle: f32, scale: Vec3) -> Self {
        Self::from_translation(translation)
            .compose(&Self::from_axis_angle(up, angle))
            .compose(&Self::from_scale(scale))
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.basis[0] * v.x + self.basis[1] * v.y + self.basis[2] * v.z
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform_vector(p) + self.origin
    }

    /// Composition: the result applies `other` first, then `self`.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            basis: [
                self.transform_vector(other.basis[0]),
                self.transform_vector(other.basis[1]),
                self.transform_vector(other.basis[2]),
            ],
            origin: self.transform_point(other.origin),
        }
    }

    pub fn bits_eq(&self, other: &Self) -> bool {
        self.origin.bits_eq(other.origin)
            && self
                .basis
                .iter()
                .zip(other.basis.iter())
                .all(|(a, b)| a.bits_eq(*b))
    }
}

/// Plane `normal · p = d`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal,
            d: normal.dot(point),
        }
    }

    /// Plane through three points; the normal is `(a - c) × (a - b)`, normalized.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (a - c).cross(a - b).normalize_or_zero();
        Self::new(normal, a)
    }

    /// Intersection of the segment `a..b` with the plane, if any.
    pub fn intersects_segment(&self, a: Vec3, b: Vec3) -> Option<Vec3> {
        let dir = b - a;
        let den = self.normal.dot(dir);
        if den.abs() <= CMP_EPSILON * CMP_EPSILON {
            return None;
        }
        let t = (self.d - self.normal.dot(a)) / den;
        if !(-CMP_EPSILON..=1.0 + CMP_EPSILON).contains(&t) {
            return None;
        }
        Some(a + dir * t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face3 {
    pub vertices: [Vec3; 3],
}

impl Face3 {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    pub fn plane(&self) -> Plane {
        let [a, b, c] = self.vertices;
        Plane::from_points(a, b, c)
    }

    /// Closest point on the (filled) triangle to `p`.
    pub fn closest_point_to(&self, p: Vec3) -> Vec3 {
        let [a, b, c] = self.vertices;
        let ab = b - a;
        let ac = c - a;

        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        // Interior: drop `p` straight onto the triangle's plane.
        let n = ab.cross(ac);
        let n2 = n.length_squared();
        if n2 <= f32::EPSILON * f32::EPSILON {
            return closest_point_on_segment(p, a, b);
        }
        p - n * (n.dot(ap) / n2)
    }

    /// Intersection of the segment `from..to` with the triangle (either side).
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> Option<Vec3> {
        let [a, b, c] = self.vertices;
        let e1 = b - a;
        let e2 = c - a;
        let dir = to - from;

        let h = dir.cross(e2);
        let det = e1.dot(h);
        if det.abs() <= 1e-12 {
            return None;
        }
        let inv = 1.0 / det;

        let s = from - a;
        let u = inv * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(e1);
        let v = inv * dir.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv * e2.dot(q);
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(from + dir * t)
    }
}

pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let denom = ab.length_squared();
    if denom <= f32::EPSILON * f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / denom).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `p1..q1` and `p2..q2`, returned in that order.
pub fn closest_points_between_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let tiny = f32::EPSILON * f32::EPSILON;

    if a <= tiny && e <= tiny {
        return (p1, p2);
    }

    let (s, t) = if a <= tiny {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= tiny {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let s = if denom != 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / a).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / a).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// Distance from `p` to the segment `a..b`.
pub fn distance_to_segment(p: Vec3, a: Vec3, b: Vec3) -> f32 {
    p.distance(closest_point_on_segment(p, a, b))
}
