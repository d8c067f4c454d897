//! Funnel ("string pulling") smoothing of a polygon chain into a point path.
//!
//! The funnel walks the chain from the end polygon back to the begin polygon, which is the
//! direction in which every polygon's entry edge is defined, and the emitted points are reversed
//! at the end.

use tracing::warn;

use crate::graph::{Navigation, Polygon};
use crate::math::{distance_to_segment, Plane};
use crate::search::{NavQuery, PolygonChain};
use crate::{PathError, Vec3};

/// Signed turn `((a - c) × (a - b)) · up`.
fn clock_tangent(up: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (a - c).cross(a - b).dot(up)
}

impl<O> Navigation<O> {
    /// Path between the surface projections of `start` and `end`.
    ///
    /// With `optimize`, the path is pulled taut through the traversed polygons. Otherwise it visits
    /// the midpoint of every portal.
    pub fn simple_path(&self, start: Vec3, end: Vec3, optimize: bool) -> Result<Vec<Vec3>, PathError> {
        let mut query = NavQuery::new();
        let mut out = Vec::new();
        self.simple_path_into(start, end, optimize, &mut query, &mut out)?;
        Ok(out)
    }

    pub fn simple_path_into(
        &self,
        start: Vec3,
        end: Vec3,
        optimize: bool,
        query: &mut NavQuery,
        out: &mut Vec<Vec3>,
    ) -> Result<(), PathError> {
        out.clear();
        let mut chain = std::mem::take(&mut query.chain);
        let found = self.find_polygon_path_into(start, end, query, &mut chain);
        if found.is_ok() {
            self.smooth_path_into(&chain, optimize, out);
        }
        query.chain = chain;
        found
    }

    pub fn smooth_path(&self, chain: &PolygonChain, optimize: bool) -> Vec<Vec3> {
        let mut out = Vec::new();
        self.smooth_path_into(chain, optimize, &mut out);
        out
    }

    /// Converts `chain` into points running from its begin point to its end point.
    pub fn smooth_path_into(&self, chain: &PolygonChain, optimize: bool, out: &mut Vec<Vec3>) {
        out.clear();
        if chain.steps.len() <= 1 {
            out.extend([chain.begin_point, chain.end_point]);
            return;
        }

        out.push(chain.end_point);
        if optimize {
            Funnel::new(self, chain).run(out);
        } else {
            for i in (1..chain.steps.len()).rev() {
                if let Some((a, b)) = self.entry_portal(chain, i) {
                    self.push_point(out, (a + b) * 0.5);
                }
            }
        }
        self.finish(out, chain.begin_point);
        out.reverse();
    }

    fn push_point(&self, path: &mut Vec<Vec3>, point: Vec3) {
        match path.last() {
            Some(last) if last.distance(point) < self.config().path_epsilon => {}
            _ => path.push(point),
        }
    }

    /// Ends the backward path exactly on `begin_point`.
    fn finish(&self, path: &mut Vec<Vec3>, begin_point: Vec3) {
        let eps = self.config().path_epsilon;
        match path.split_last_mut() {
            Some((last, rest)) if !rest.is_empty() && last.distance(begin_point) < eps => {
                *last = begin_point;
            }
            _ => path.push(begin_point),
        }
    }

    fn step_polygon(&self, chain: &PolygonChain, i: usize) -> Option<&Polygon> {
        self.polygon(chain.steps.get(i)?.polygon)
    }

    /// Endpoints of the edge through which chain step `i` was entered, in polygon order.
    fn entry_portal(&self, chain: &PolygonChain, i: usize) -> Option<(Vec3, Vec3)> {
        let edge = chain.steps.get(i)?.entry_edge?;
        Some(self.step_polygon(chain, i)?.edge_segment(edge))
    }

    /// Funnel `(left, right)` of chain step `i` as seen walking backward.
    pub(crate) fn funnel_portal(&self, chain: &PolygonChain, i: usize) -> Option<(Vec3, Vec3)> {
        if i == 0 {
            return Some((chain.begin_point, chain.begin_point));
        }
        let (left, right) = self.entry_portal(chain, i)?;
        if self.step_polygon(chain, i)?.is_clockwise() {
            Some((right, left))
        } else {
            Some((left, right))
        }
    }

    /// Inserts the crossings of the portals between chain steps `from` and `to` with the vertical
    /// plane through the last emitted point and `to_point`.
    fn clip_path(&self, chain: &PolygonChain, path: &mut Vec<Vec3>, from: usize, to_point: Vec3, to: usize) {
        let Some(&origin) = path.last() else {
            return;
        };
        let eps = self.config().path_epsilon;
        if origin.distance(to_point) < eps {
            return;
        }

        let normal = (origin - to_point).cross(self.up_vector()).normalize_or_zero();
        if normal == Vec3::ZERO {
            return;
        }
        let cut = Plane::new(normal, origin);
        let tolerance = self.config().clip_tolerance();

        for i in ((to + 1)..=from).rev() {
            let Some((a, b)) = self.entry_portal(chain, i) else {
                continue;
            };
            if a.distance(b) <= eps {
                continue;
            }
            let Some(hit) = cut.intersects_segment(a, b) else {
                continue;
            };
            let Some(&last) = path.last() else {
                continue;
            };
            if hit.distance(to_point) <= eps || hit.distance(last) <= eps {
                continue;
            }
            if distance_to_segment(hit, origin, to_point) <= tolerance {
                continue;
            }
            path.push(hit);
        }
    }
}

struct Funnel<'a, O> {
    nav: &'a Navigation<O>,
    chain: &'a PolygonChain,
    up: Vec3,
    apex: Vec3,
    apex_step: usize,
    left: Vec3,
    left_step: usize,
    right: Vec3,
    right_step: usize,
}

impl<'a, O> Funnel<'a, O> {
    fn new(nav: &'a Navigation<O>, chain: &'a PolygonChain) -> Self {
        let last = chain.steps.len() - 1;
        Self {
            nav,
            chain,
            up: nav.up_vector(),
            apex: chain.end_point,
            apex_step: last,
            left: chain.end_point,
            left_step: last,
            right: chain.end_point,
            right_step: last,
        }
    }

    /// Moves the apex onto a portal corner held by chain step `step`.
    fn restart(&mut self, path: &mut Vec<Vec3>, corner: Vec3, step: usize) {
        self.nav.clip_path(self.chain, path, self.apex_step, corner, step);
        self.apex = corner;
        self.apex_step = step;
        self.left = corner;
        self.left_step = step;
        self.right = corner;
        self.right_step = step;
        self.nav.push_point(path, corner);
    }

    fn run(mut self, path: &mut Vec<Vec3>) {
        let n = self.chain.steps.len();
        let budget = (n + 1) * (n + 1) + 16;
        let mut iterations = 0;
        let mut step = Some(n - 1);

        while let Some(i) = step {
            iterations += 1;
            if iterations > budget {
                warn!(steps = n, "funnel did not converge, truncating smoothing");
                break;
            }

            let Some((left, right)) = self.nav.funnel_portal(self.chain, i) else {
                break;
            };
            let mut current = i;
            let mut restarted = false;

            if clock_tangent(self.up, self.apex, self.left, left) >= 0.0 {
                if self.left == self.apex || clock_tangent(self.up, self.apex, left, self.right) > 0.0 {
                    self.left = left;
                    self.left_step = i;
                } else {
                    let (corner, at) = (self.right, self.right_step);
                    self.restart(path, corner, at);
                    current = at;
                    restarted = true;
                }
            }

            if !restarted && clock_tangent(self.up, self.apex, self.right, right) <= 0.0 {
                if self.right == self.apex || clock_tangent(self.up, self.apex, right, self.left) < 0.0 {
                    self.right = right;
                    self.right_step = i;
                } else {
                    let (corner, at) = (self.left, self.left_step);
                    self.restart(path, corner, at);
                    current = at;
                }
            }

            step = current.checked_sub(1);
        }
    }
}
