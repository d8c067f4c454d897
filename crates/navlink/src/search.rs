use core::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::{debug, error, warn};

use crate::graph::{Navigation, PolygonRef};
use crate::math::closest_point_on_segment;
use crate::{PathError, Vec3};

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    cost: f32,
    distance: f32,
    slot: usize,
    polygon: PolygonRef,
    tie: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-polygon search state, indexed by the polygon's dense slot.
#[derive(Debug, Clone, Copy, Default)]
struct SearchNode {
    visited: bool,
    closed: bool,
    /// Edge of this polygon leading back toward the begin polygon.
    prev_edge: Option<usize>,
    distance: f32,
    entry: Vec3,
}

/// Reusable scratch buffers for [`Navigation`] path queries.
///
/// This avoids per-query allocations when paths are requested every frame, and keeps transient
/// search state out of the shared graph.
#[derive(Debug, Default)]
pub struct NavQuery {
    open: BinaryHeap<OpenNode>,
    nodes: Vec<SearchNode>,
    pub(crate) chain: PolygonChain,
}

impl NavQuery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStep {
    pub polygon: PolygonRef,
    /// Edge of `polygon` shared with the previous step; `None` for the begin polygon.
    pub entry_edge: Option<usize>,
}

/// Ordered polygons traversed from the start projection to the end projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonChain {
    pub steps: Vec<ChainStep>,
    pub begin_point: Vec3,
    pub end_point: Vec3,
}

impl PolygonChain {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn polygons(&self) -> impl Iterator<Item = PolygonRef> + '_ {
        self.steps.iter().map(|s| s.polygon)
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.begin_point = Vec3::ZERO;
        self.end_point = Vec3::ZERO;
    }
}

impl<O> Navigation<O> {
    /// Finds the chain of polygons connecting the projections of `start` and `end`.
    pub fn find_polygon_path(&self, start: Vec3, end: Vec3) -> Result<PolygonChain, PathError> {
        let mut query = NavQuery::new();
        let mut out = PolygonChain::default();
        self.find_polygon_path_into(start, end, &mut query, &mut out)?;
        Ok(out)
    }

    pub fn find_polygon_path_into(
        &self,
        start: Vec3,
        end: Vec3,
        query: &mut NavQuery,
        out: &mut PolygonChain,
    ) -> Result<(), PathError> {
        self.find_polygon_path_into_scratch(start, end, &mut query.open, &mut query.nodes, out)
    }

    fn find_polygon_path_into_scratch(
        &self,
        start: Vec3,
        end: Vec3,
        open: &mut BinaryHeap<OpenNode>,
        nodes: &mut Vec<SearchNode>,
        out: &mut PolygonChain,
    ) -> Result<(), PathError> {
        out.clear();

        let (begin_polygon, begin_point) = self.locate(start).ok_or(PathError::NoNavigableSurface)?;
        let (end_polygon, end_point) = self.locate(end).ok_or(PathError::NoNavigableSurface)?;
        out.begin_point = begin_point;
        out.end_point = end_point;

        if begin_polygon == end_polygon {
            out.steps.push(ChainStep {
                polygon: begin_polygon,
                entry_edge: None,
            });
            return Ok(());
        }

        let slot_of = |r: PolygonRef| self.slot(r).ok_or(PathError::NoNavigableSurface);
        let begin_slot = slot_of(begin_polygon)?;

        open.clear();
        nodes.clear();
        nodes.resize(self.polygon_count(), SearchNode::default());

        nodes[begin_slot] = SearchNode {
            visited: true,
            closed: false,
            prev_edge: None,
            distance: 0.0,
            entry: begin_point,
        };
        open.push(OpenNode {
            cost: begin_point.distance(end_point),
            distance: 0.0,
            slot: begin_slot,
            polygon: begin_polygon,
            tie: 0,
        });
        let mut tie: u64 = 1;
        let mut expanded = 0usize;

        while let Some(node) = open.pop() {
            let state = nodes[node.slot];
            if state.closed || state.distance.to_bits() != node.distance.to_bits() {
                continue;
            }

            if node.polygon == end_polygon {
                debug!(expanded, "polygon search reached end polygon");
                return self.reconstruct(begin_polygon, end_polygon, nodes, out);
            }

            if let Some(limit) = self.config().max_search_nodes {
                if expanded >= limit {
                    warn!(expanded, limit, "polygon search truncated");
                    return Err(PathError::SearchTruncated { expanded });
                }
            }
            expanded += 1;
            nodes[node.slot].closed = true;

            let Some(polygon) = self.polygon(node.polygon) else {
                continue;
            };
            for (i, edge) in polygon.edges().iter().enumerate() {
                let Some(link) = edge.link() else {
                    continue;
                };
                let Some(next_slot) = self.slot(link.polygon) else {
                    continue;
                };

                let (a, b) = polygon.edge_segment(i);
                let entry = closest_point_on_segment(state.entry, a, b);
                let distance = state.distance + state.entry.distance(entry);

                let next = &mut nodes[next_slot];
                if next.visited && distance >= next.distance {
                    continue;
                }

                let was_closed = next.closed;
                *next = SearchNode {
                    visited: true,
                    closed: was_closed,
                    prev_edge: Some(link.edge),
                    distance,
                    entry,
                };
                // An expanded polygon keeps its better predecessor but is not expanded again.
                if was_closed {
                    continue;
                }
                open.push(OpenNode {
                    cost: distance + entry.distance(end_point),
                    distance,
                    slot: next_slot,
                    polygon: link.polygon,
                    tie,
                });
                tie += 1;
            }
        }

        debug!(expanded, "polygon search exhausted frontier");
        Err(PathError::Disconnected)
    }

    fn reconstruct(
        &self,
        begin_polygon: PolygonRef,
        end_polygon: PolygonRef,
        nodes: &[SearchNode],
        out: &mut PolygonChain,
    ) -> Result<(), PathError> {
        let mut current = end_polygon;
        loop {
            if out.steps.len() > self.polygon_count() {
                error!(?begin_polygon, ?end_polygon, "cycle while reconstructing polygon chain");
                out.steps.clear();
                return Err(PathError::Disconnected);
            }

            if current == begin_polygon {
                out.steps.push(ChainStep {
                    polygon: current,
                    entry_edge: None,
                });
                break;
            }

            let slot = self.slot(current).ok_or(PathError::Disconnected)?;
            let prev_edge = nodes[slot].prev_edge.ok_or(PathError::Disconnected)?;
            out.steps.push(ChainStep {
                polygon: current,
                entry_edge: Some(prev_edge),
            });

            current = self
                .polygon(current)
                .and_then(|p| p.edges().get(prev_edge))
                .and_then(|e| e.link())
                .map(|l| l.polygon)
                .ok_or(PathError::Disconnected)?;
        }

        out.steps.reverse();
        Ok(())
    }
}
