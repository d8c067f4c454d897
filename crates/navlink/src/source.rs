use crate::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Input polygon mesh: shared vertex positions plus one index list per polygon.
///
/// Polygons are expected to be convex (or at least simple) and are fanned from their first
/// vertex for closest-point queries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavMeshSource {
    pub vertices: Vec<Vec3>,
    pub polygons: Vec<Vec<u32>>,
}

impl NavMeshSource {
    pub fn new(vertices: Vec<Vec3>, polygons: Vec<Vec<u32>>) -> Self {
        Self { vertices, polygons }
    }

    /// One polygon per triangle.
    pub fn from_triangles(vertices: Vec<Vec3>, triangles: &[[u32; 3]]) -> Self {
        Self {
            vertices,
            polygons: triangles.iter().map(|t| t.to_vec()).collect(),
        }
    }

    /// Appends a polygon with its own copy of `points`.
    pub fn push_polygon(&mut self, points: &[Vec3]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(points);
        self.polygons
            .push((0..points.len() as u32).map(|i| base + i).collect());
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }
}
