use crate::graph::{Navigation, PolygonRef};
use crate::search::NavQuery;
use crate::{PathError, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec3>,
}

impl NavPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }
}

/// Debug-friendly corridor result for path following / visualization.
///
/// `portals.len()` equals `regions.len()` where:
/// - `portals[..regions.len()-1]` are the shared edges between successive regions, oriented as
///   `(left, right)` for travel from start to goal.
/// - `portals[regions.len()-1]` is a degenerate `(goal, goal)` portal.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavCorridor {
    pub regions: Vec<PolygonRef>,
    pub portals: Vec<(Vec3, Vec3)>,
    /// Smoothed path through `portals`; `corners[0]` is the start projection and `corners.last()`
    /// the goal projection.
    pub corners: Vec<Vec3>,
}

impl NavCorridor {
    fn clear(&mut self) {
        self.regions.clear();
        self.portals.clear();
        self.corners.clear();
    }
}

pub trait Navigator {
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath>;

    /// Return a corridor (region path + portals) suitable for debugging/funnel path following.
    ///
    /// Backends that don't support corridor queries may return `None`.
    fn corridor(&self, _start: Vec3, _goal: Vec3) -> Option<NavCorridor> {
        None
    }

    /// Project a point onto the nearest navigable surface.
    ///
    /// Backends that don't support projection may return `None`.
    fn nearest_point(&self, _point: Vec3) -> Option<Vec3> {
        None
    }
}

impl<O> Navigation<O> {
    pub fn find_corridor(&self, start: Vec3, goal: Vec3) -> Result<NavCorridor, PathError> {
        let mut query = NavQuery::new();
        let mut out = NavCorridor::default();
        self.find_corridor_into(start, goal, &mut query, &mut out)?;
        Ok(out)
    }

    pub fn find_corridor_into(
        &self,
        start: Vec3,
        goal: Vec3,
        query: &mut NavQuery,
        out: &mut NavCorridor,
    ) -> Result<(), PathError> {
        out.clear();
        let mut chain = std::mem::take(&mut query.chain);
        let found = self.find_polygon_path_into(start, goal, query, &mut chain);
        if found.is_ok() {
            out.regions.extend(chain.polygons());
            for i in 1..chain.steps.len() {
                // Funnel portals face backward along the chain.
                if let Some((left, right)) = self.funnel_portal(&chain, i) {
                    out.portals.push((right, left));
                }
            }
            out.portals.push((chain.end_point, chain.end_point));
            self.smooth_path_into(&chain, true, &mut out.corners);
        }
        query.chain = chain;
        found
    }
}

impl<O> Navigator for Navigation<O> {
    fn find_path(&self, start: Vec3, goal: Vec3) -> Option<NavPath> {
        self.simple_path(start, goal, true).ok().map(NavPath::new)
    }

    fn corridor(&self, start: Vec3, goal: Vec3) -> Option<NavCorridor> {
        self.find_corridor(start, goal).ok()
    }

    fn nearest_point(&self, point: Vec3) -> Option<Vec3> {
        self.closest_point(point)
    }
}
