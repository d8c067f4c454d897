//! Polygon adjacency graph built incrementally from registered meshes.
//!
//! Every registered mesh owns an arena of [`Polygon`]s. Polygon edges are matched across all
//! meshes through a connection table keyed by the quantized endpoints of each edge. At most one
//! pair of edges is joined per key at a time; further coincident edges wait in a pending queue and
//! are promoted when an active partner goes away.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::key::{EdgeKey, PointKey};
use crate::math::Face3;
use crate::{ConfigError, NavConfig, NavError, NavMeshSource, Result, Transform, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Handle returned by [`Navigation::add_mesh`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshId(pub u32);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a polygon: owning mesh plus index into that mesh's polygon arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonRef {
    pub mesh: MeshId,
    pub index: usize,
}

/// Address of one polygon edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeRef {
    pub polygon: PolygonRef,
    pub edge: usize,
}

/// Boundary segment starting at this edge's vertex and ending at the next polygon vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    key: PointKey,
    vertex: Vec3,
    link: Option<EdgeRef>,
    pending: bool,
}

impl Edge {
    pub fn key(&self) -> PointKey {
        self.key
    }

    pub fn vertex(&self) -> Vec3 {
        self.vertex
    }

    /// Active neighbour across this edge.
    pub fn link(&self) -> Option<EdgeRef> {
        self.link
    }

    /// Queued behind an already joined pair of coincident edges.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    edges: Vec<Edge>,
    center: Vec3,
    clockwise: bool,
}

impl Polygon {
    fn new(points: &[Vec3], config: &NavConfig) -> Self {
        let mut center = Vec3::ZERO;
        let mut winding = 0.0;
        for (j, p) in points.iter().copied().enumerate() {
            center += p;
            if j >= 2 {
                let a = points[j - 2];
                let b = points[j - 1];
                winding += config.up.dot((b - a).cross(p - a));
            }
        }

        let edges = points
            .iter()
            .map(|&vertex| Edge {
                key: PointKey::quantize(vertex, config.cell_size),
                vertex,
                link: None,
                pending: false,
            })
            .collect();

        Self {
            edges,
            center: center / points.len() as f32,
            clockwise: winding > 0.0,
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.edges.iter().map(|e| e.vertex)
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Winding relative to the configured up vector at link time.
    pub fn is_clockwise(&self) -> bool {
        self.clockwise
    }

    /// Endpoints of edge `edge`, in polygon order.
    pub fn edge_segment(&self, edge: usize) -> (Vec3, Vec3) {
        let next = (edge + 1) % self.edges.len();
        (self.edges[edge].vertex, self.edges[next].vertex)
    }

    pub fn edge_key(&self, edge: usize) -> EdgeKey {
        let next = (edge + 1) % self.edges.len();
        EdgeKey::new(self.edges[edge].key, self.edges[next].key)
    }

    /// Triangle fan `(v0, v[i-1], v[i])` covering the polygon.
    pub fn faces(&self) -> impl Iterator<Item = Face3> + '_ {
        let v0 = self.edges[0].vertex;
        (2..self.edges.len())
            .map(move |i| Face3::new(v0, self.edges[i - 1].vertex, self.edges[i].vertex))
    }
}

/// Polygons currently sharing one edge key.
///
/// `a` is always occupied while the connection exists; `b` is the active partner, `pending` holds
/// further coincident edges in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    a: EdgeRef,
    b: Option<EdgeRef>,
    pending: Vec<EdgeRef>,
}

impl Connection {
    pub fn a(&self) -> EdgeRef {
        self.a
    }

    pub fn b(&self) -> Option<EdgeRef> {
        self.b
    }

    pub fn pending(&self) -> &[EdgeRef] {
        &self.pending
    }
}

#[derive(Debug)]
pub(crate) struct MeshEntry<O> {
    source: Arc<NavMeshSource>,
    transform: Transform,
    owner: O,
    linked: bool,
    polygons: Vec<Polygon>,
    /// Offset of this mesh's first polygon in the dense per-search scratch arrays.
    first_slot: usize,
}

/// Navigation graph over any number of independently registered meshes.
///
/// All reads take `&self` and all mutations `&mut self`; share across threads with an external
/// `RwLock`.
#[derive(Debug)]
pub struct Navigation<O = ()> {
    config: NavConfig,
    meshes: BTreeMap<MeshId, MeshEntry<O>>,
    connections: BTreeMap<EdgeKey, Connection>,
    next_id: u32,
    polygon_count: usize,
}

impl<O> Default for Navigation<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Navigation<O> {
    pub fn new() -> Self {
        Self {
            config: NavConfig::default(),
            meshes: BTreeMap::new(),
            connections: BTreeMap::new(),
            next_id: 1,
            polygon_count: 0,
        }
    }

    pub fn with_config(config: NavConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn up_vector(&self) -> Vec3 {
        self.config.up
    }

    /// Changes the up vector and relinks every mesh so windings are recomputed.
    pub fn set_up_vector(&mut self, up: Vec3) -> std::result::Result<(), ConfigError> {
        let config = NavConfig { up, ..self.config };
        config.validate()?;
        if config.up.bits_eq(self.config.up) {
            return Ok(());
        }

        let ids: Vec<MeshId> = self.meshes.keys().copied().collect();
        for &id in &ids {
            self.unlink(id);
        }
        self.config = config;
        for &id in &ids {
            self.link(id);
        }
        Ok(())
    }

    /// Registers a mesh placed by `transform` and links it into the graph.
    ///
    /// A mesh without vertices is kept as an unlinked, empty entry.
    pub fn add_mesh(
        &mut self,
        source: impl Into<Arc<NavMeshSource>>,
        transform: Transform,
        owner: O,
    ) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        self.meshes.insert(
            id,
            MeshEntry {
                source: source.into(),
                transform,
                owner,
                linked: false,
                polygons: Vec::new(),
                first_slot: 0,
            },
        );
        self.link(id);
        id
    }

    /// Moves a mesh. A bit-for-bit identical transform is a no-op.
    pub fn set_mesh_transform(&mut self, id: MeshId, transform: Transform) -> Result<()> {
        let entry = self.meshes.get(&id).ok_or(NavError::UnknownMesh(id))?;
        if entry.transform.bits_eq(&transform) {
            return Ok(());
        }

        self.unlink(id);
        if let Some(entry) = self.meshes.get_mut(&id) {
            entry.transform = transform;
        }
        self.link(id);
        Ok(())
    }

    /// Unlinks and drops a mesh, handing back its owner.
    pub fn remove_mesh(&mut self, id: MeshId) -> Result<O> {
        if !self.meshes.contains_key(&id) {
            return Err(NavError::UnknownMesh(id));
        }
        self.unlink(id);
        let entry = self
            .meshes
            .remove(&id)
            .ok_or(NavError::UnknownMesh(id))?;
        self.refresh_slots();
        Ok(entry.owner)
    }

    pub fn mesh_ids(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.meshes.keys().copied()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_linked(&self, id: MeshId) -> bool {
        self.meshes.get(&id).is_some_and(|m| m.linked)
    }

    pub fn mesh_polygon_count(&self, id: MeshId) -> Option<usize> {
        self.meshes.get(&id).map(|m| m.polygons.len())
    }

    pub fn mesh_transform(&self, id: MeshId) -> Option<&Transform> {
        self.meshes.get(&id).map(|m| &m.transform)
    }

    pub fn mesh_owner(&self, id: MeshId) -> Option<&O> {
        self.meshes.get(&id).map(|m| &m.owner)
    }

    pub fn mesh_source(&self, id: MeshId) -> Option<&Arc<NavMeshSource>> {
        self.meshes.get(&id).map(|m| &m.source)
    }

    /// Number of polygons across all linked meshes.
    pub fn polygon_count(&self) -> usize {
        self.polygon_count
    }

    pub fn polygon(&self, r: PolygonRef) -> Option<&Polygon> {
        self.meshes.get(&r.mesh)?.polygons.get(r.index)
    }

    pub fn connection_table(&self) -> &BTreeMap<EdgeKey, Connection> {
        &self.connections
    }

    /// Linked polygons in mesh id order, then polygon index order.
    pub fn polygons(&self) -> impl Iterator<Item = (PolygonRef, &Polygon)> + '_ {
        self.linked_polygons().map(|(r, p, _)| (r, p))
    }

    pub(crate) fn linked_polygons(&self) -> impl Iterator<Item = (PolygonRef, &Polygon, &O)> + '_ {
        self.meshes
            .iter()
            .filter(|(_, m)| m.linked)
            .flat_map(|(&mesh, m)| {
                m.polygons
                    .iter()
                    .enumerate()
                    .map(move |(index, p)| (PolygonRef { mesh, index }, p, &m.owner))
            })
    }

    /// Dense index of a polygon for per-search scratch storage.
    pub(crate) fn slot(&self, r: PolygonRef) -> Option<usize> {
        let entry = self.meshes.get(&r.mesh)?;
        (r.index < entry.polygons.len()).then_some(entry.first_slot + r.index)
    }

    fn refresh_slots(&mut self) {
        let mut next = 0;
        for entry in self.meshes.values_mut() {
            entry.first_slot = next;
            next += entry.polygons.len();
        }
        self.polygon_count = next;
    }

    fn link(&mut self, id: MeshId) {
        let config = self.config;
        let Some(entry) = self.meshes.get_mut(&id) else {
            return;
        };
        debug_assert!(!entry.linked, "navmesh {id} linked twice");
        if entry.source.vertices.is_empty() {
            debug!(mesh = %id, "navmesh has no vertices, leaving it unlinked");
            return;
        }

        entry.polygons = build_polygons(id, &entry.source, &entry.transform, &config);
        entry.linked = true;

        let mut edges = Vec::new();
        for (index, polygon) in entry.polygons.iter().enumerate() {
            for edge in 0..polygon.edges.len() {
                let r = EdgeRef {
                    polygon: PolygonRef { mesh: id, index },
                    edge,
                };
                edges.push((polygon.edge_key(edge), r));
            }
        }
        for (key, edge) in edges {
            self.connect(key, edge);
        }

        self.refresh_slots();
        debug!(
            mesh = %id,
            polygons = self.mesh_polygon_count(id).unwrap_or(0),
            connections = self.connections.len(),
            "linked navmesh"
        );
    }

    fn unlink(&mut self, id: MeshId) {
        let Some(entry) = self.meshes.get_mut(&id) else {
            return;
        };
        if !entry.linked {
            return;
        }
        let polygons = std::mem::take(&mut entry.polygons);
        entry.linked = false;

        for (index, polygon) in polygons.iter().enumerate() {
            for edge in 0..polygon.edges.len() {
                let r = EdgeRef {
                    polygon: PolygonRef { mesh: id, index },
                    edge,
                };
                self.disconnect(polygon.edge_key(edge), r);
            }
        }

        self.refresh_slots();
        debug!(
            mesh = %id,
            polygons = polygons.len(),
            connections = self.connections.len(),
            "unlinked navmesh"
        );
    }

    fn connect(&mut self, key: EdgeKey, edge: EdgeRef) {
        let Some(conn) = self.connections.get_mut(&key) else {
            self.connections.insert(
                key,
                Connection {
                    a: edge,
                    b: None,
                    pending: Vec::new(),
                },
            );
            return;
        };

        if conn.b.is_some() {
            conn.pending.push(edge);
            if let Some(e) = edge_mut(&mut self.meshes, edge) {
                e.pending = true;
            }
            return;
        }

        conn.b = Some(edge);
        join(&mut self.meshes, conn.a, edge);
    }

    fn disconnect(&mut self, key: EdgeKey, edge: EdgeRef) {
        let Some(conn) = self.connections.get_mut(&key) else {
            error!(?key, ?edge, "unlinking an edge missing from the connection table");
            debug_assert!(false, "edge {edge:?} missing from the connection table");
            return;
        };

        if let Some(pos) = conn.pending.iter().position(|p| *p == edge) {
            conn.pending.remove(pos);
            return;
        }

        let Some(b) = conn.b else {
            debug_assert_eq!(conn.a, edge);
            self.connections.remove(&key);
            return;
        };

        if conn.a != edge && b != edge {
            error!(?key, ?edge, "unlinking an edge that is not part of its connection");
            debug_assert!(false, "edge {edge:?} not part of its connection");
            return;
        }

        for side in [conn.a, b] {
            if let Some(e) = edge_mut(&mut self.meshes, side) {
                e.link = None;
            }
        }
        if conn.a == edge {
            conn.a = b;
        }
        conn.b = None;

        if !conn.pending.is_empty() {
            let next = conn.pending.remove(0);
            conn.b = Some(next);
            join(&mut self.meshes, conn.a, next);
        }
    }
}

fn build_polygons(
    id: MeshId,
    source: &NavMeshSource,
    transform: &Transform,
    config: &NavConfig,
) -> Vec<Polygon> {
    let vertices: Vec<Vec3> = source
        .vertices
        .iter()
        .map(|&v| transform.transform_point(v))
        .collect();

    let mut polygons = Vec::with_capacity(source.polygons.len());
    let mut points = Vec::new();
    for (face, indices) in source.polygons.iter().enumerate() {
        if indices.len() < 3 {
            warn!(mesh = %id, face, vertices = indices.len(), "dropping degenerate navmesh polygon");
            continue;
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            warn!(mesh = %id, face, index = bad, "dropping navmesh polygon with out-of-range vertex");
            continue;
        }

        points.clear();
        points.extend(indices.iter().map(|&i| vertices[i as usize]));
        polygons.push(Polygon::new(&points, config));
    }
    polygons
}

fn edge_mut<O>(meshes: &mut BTreeMap<MeshId, MeshEntry<O>>, r: EdgeRef) -> Option<&mut Edge> {
    meshes
        .get_mut(&r.polygon.mesh)?
        .polygons
        .get_mut(r.polygon.index)?
        .edges
        .get_mut(r.edge)
}

/// Cross-wires two edges as each other's active neighbour.
fn join<O>(meshes: &mut BTreeMap<MeshId, MeshEntry<O>>, a: EdgeRef, b: EdgeRef) {
    if let Some(e) = edge_mut(meshes, a) {
        e.link = Some(b);
        e.pending = false;
    }
    if let Some(e) = edge_mut(meshes, b) {
        e.link = Some(a);
        e.pending = false;
    }
}
