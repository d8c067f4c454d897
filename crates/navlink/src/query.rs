//! Closest-point queries over every linked polygon.
//!
//! All queries are linear scans. Ties go to the first candidate in mesh id, polygon index, fan
//! triangle order.

use crate::graph::{Navigation, PolygonRef};
use crate::math::{closest_points_between_segments, Face3};
use crate::Vec3;

struct Closest<'a, O> {
    polygon: PolygonRef,
    face: Face3,
    point: Vec3,
    owner: &'a O,
}

impl<O> Navigation<O> {
    /// Closest point on the navigation surface to `point`.
    pub fn closest_point(&self, point: Vec3) -> Option<Vec3> {
        self.closest(point).map(|c| c.point)
    }

    /// Surface normal of the triangle holding the closest point.
    pub fn closest_point_normal(&self, point: Vec3) -> Option<Vec3> {
        self.closest(point).map(|c| c.face.plane().normal)
    }

    /// Owner of the mesh holding the closest point.
    pub fn closest_point_owner(&self, point: Vec3) -> Option<&O> {
        self.closest(point).map(|c| c.owner)
    }

    /// Closest point on the navigation surface to the segment `from`-`to`.
    ///
    /// With `use_collision`, a surface hit nearest to `from` wins. Otherwise, or when the segment
    /// hits nothing, the result is the point on a polygon boundary edge closest to the segment.
    pub fn closest_point_to_segment(&self, from: Vec3, to: Vec3, use_collision: bool) -> Option<Vec3> {
        if use_collision {
            let mut best: Option<(f32, Vec3)> = None;
            for (_, polygon, _) in self.linked_polygons() {
                for face in polygon.faces() {
                    let Some(hit) = face.intersects_segment(from, to) else {
                        continue;
                    };
                    let d = from.distance_squared(hit);
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, hit));
                    }
                }
            }
            if let Some((_, hit)) = best {
                return Some(hit);
            }
        }

        let mut best: Option<(f32, Vec3)> = None;
        for (_, polygon, _) in self.linked_polygons() {
            for i in 0..polygon.vertex_count() {
                let (a, b) = polygon.edge_segment(i);
                let (on_segment, on_edge) = closest_points_between_segments(from, to, a, b);
                let d = on_segment.distance_squared(on_edge);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, on_edge));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    /// Polygon holding the closest surface point, and that point.
    pub(crate) fn locate(&self, point: Vec3) -> Option<(PolygonRef, Vec3)> {
        self.closest(point).map(|c| (c.polygon, c.point))
    }

    fn closest(&self, point: Vec3) -> Option<Closest<'_, O>> {
        let mut best: Option<(f32, Closest<'_, O>)> = None;
        for (polygon_ref, polygon, owner) in self.linked_polygons() {
            for face in polygon.faces() {
                let candidate = face.closest_point_to(point);
                let d = point.distance_squared(candidate);
                if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                    best = Some((
                        d,
                        Closest {
                            polygon: polygon_ref,
                            face,
                            point: candidate,
                            owner,
                        },
                    ));
                }
            }
        }
        best.map(|(_, c)| c)
    }
}
