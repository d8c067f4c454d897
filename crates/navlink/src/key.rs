//! Quantized vertex keys used to detect coincident vertices and edges across meshes.

use crate::Vec3;

/// Integer grid cell of a position at a fixed `cell_size`.
///
/// Keys only drive edge matching. Geometry always uses the real transformed positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PointKey {
    /// Rounds each coordinate to the nearest cell, so positions closer than half a cell to the
    /// same cell center share a key.
    pub fn quantize(p: Vec3, cell_size: f32) -> Self {
        let q = |v: f32| (v / cell_size).round() as i32;
        Self {
            x: q(p.x),
            y: q(p.y),
            z: q(p.z),
        }
    }
}

/// Unordered pair of vertex keys identifying an edge independently of its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey(PointKey, PointKey);

impl EdgeKey {
    pub fn new(a: PointKey, b: PointKey) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn endpoints(&self) -> (PointKey, PointKey) {
        (self.0, self.1)
    }

    /// Both endpoints quantize to the same cell.
    pub fn is_degenerate(&self) -> bool {
        self.0 == self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearby_positions_share_a_key() {
        let a = PointKey::quantize(Vec3::new(1.0, 0.0, 2.0), 0.01);
        let b = PointKey::quantize(Vec3::new(1.004, -0.003, 1.9961), 0.01);
        assert_eq!(a, b);

        let c = PointKey::quantize(Vec3::new(1.02, 0.0, 2.0), 0.01);
        assert_ne!(a, c);
    }

    #[test]
    fn test_negative_coordinates_round_symmetrically() {
        let a = PointKey::quantize(Vec3::new(-0.5, -0.004, 0.0), 0.01);
        assert_eq!(a, PointKey { x: -50, y: 0, z: 0 });
    }

    #[test]
    fn test_edge_key_ignores_direction() {
        let a = PointKey::quantize(Vec3::new(0.0, 0.0, 0.0), 0.01);
        let b = PointKey::quantize(Vec3::new(1.0, 0.0, 0.0), 0.01);
        assert_eq!(EdgeKey::new(a, b), EdgeKey::new(b, a));
        assert!(!EdgeKey::new(a, b).is_degenerate());
        assert!(EdgeKey::new(a, a).is_degenerate());
    }
}
