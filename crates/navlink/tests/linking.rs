use std::collections::BTreeMap;
use std::sync::Arc;

use navlink::{
    ConfigError, Connection, EdgeKey, EdgeRef, MeshId, NavConfig, NavError, NavMeshSource,
    Navigation, PolygonRef, Transform, Vec3,
};

fn square(x0: f32, x1: f32) -> [Vec3; 4] {
    [
        Vec3::new(x0, 0.0, 0.0),
        Vec3::new(x1, 0.0, 0.0),
        Vec3::new(x1, 0.0, 1.0),
        Vec3::new(x0, 0.0, 1.0),
    ]
}

fn square_mesh(x0: f32, x1: f32) -> NavMeshSource {
    let mut mesh = NavMeshSource::default();
    mesh.push_polygon(&square(x0, x1));
    mesh
}

fn edge(mesh: MeshId, index: usize, edge: usize) -> EdgeRef {
    EdgeRef {
        polygon: PolygonRef { mesh, index },
        edge,
    }
}

/// Connection table with side order folded away.
fn normalized(table: &BTreeMap<EdgeKey, Connection>) -> Vec<(EdgeKey, Vec<EdgeRef>, Vec<EdgeRef>)> {
    table
        .iter()
        .map(|(key, conn)| {
            let mut sides: Vec<EdgeRef> = std::iter::once(conn.a()).chain(conn.b()).collect();
            sides.sort();
            (*key, sides, conn.pending().to_vec())
        })
        .collect()
}

#[test]
fn polygons_within_one_mesh_link_across_shared_vertices() {
    let mut mesh = NavMeshSource::new(
        (0..4)
            .flat_map(|i| {
                let x = i as f32;
                [Vec3::new(x, 0.0, 0.0), Vec3::new(x, 0.0, 1.0)]
            })
            .collect(),
        Vec::new(),
    );
    for i in 0..3u32 {
        mesh.polygons.push(vec![2 * i, 2 * i + 2, 2 * i + 3, 2 * i + 1]);
    }

    let mut nav = Navigation::new();
    let id = nav.add_mesh(mesh, Transform::IDENTITY, ());
    assert!(nav.is_linked(id));
    assert_eq!(nav.mesh_polygon_count(id), Some(3));
    assert_eq!(nav.polygon_count(), 3);

    // 12 edges, two of them shared.
    assert_eq!(nav.connection_table().len(), 10);

    let a = nav.polygon(PolygonRef { mesh: id, index: 0 }).expect("polygon 0");
    assert_eq!(a.edges()[1].link(), Some(edge(id, 1, 3)));
    let b = nav.polygon(PolygonRef { mesh: id, index: 1 }).expect("polygon 1");
    assert_eq!(b.edges()[3].link(), Some(edge(id, 0, 1)));
    assert_eq!(b.edges()[1].link(), Some(edge(id, 2, 3)));
    assert!(!a.is_clockwise());
}

#[test]
fn triangle_mesh_links_its_shared_diagonal() {
    let source = Arc::new(NavMeshSource::from_triangles(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        &[[0, 1, 2], [0, 2, 3]],
    ));
    assert_eq!(source.polygons, vec![vec![0, 1, 2], vec![0, 2, 3]]);

    let mut nav = Navigation::new();
    let id = nav.add_mesh(Arc::clone(&source), Transform::IDENTITY, ());
    assert!(Arc::ptr_eq(nav.mesh_source(id).expect("source"), &source));
    assert_eq!(nav.mesh_source(MeshId(99)), None);

    // Six edges, the diagonal shared.
    assert_eq!(nav.connection_table().len(), 5);
    let first = nav.polygon(PolygonRef { mesh: id, index: 0 }).expect("polygon 0");
    assert_eq!(first.edges()[2].link(), Some(edge(id, 1, 0)));
}

#[test]
fn separate_meshes_link_on_coincident_edges() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    // Within half a cell of the shared edge.
    let m2 = nav.add_mesh(square_mesh(1.003, 2.0), Transform::IDENTITY, ());

    let a = nav.polygon(PolygonRef { mesh: m1, index: 0 }).expect("polygon");
    assert_eq!(a.edges()[1].link(), Some(edge(m2, 0, 3)));
    assert_eq!(nav.connection_table().len(), 7);
}

#[test]
fn add_then_remove_restores_connection_table() {
    let mut nav = Navigation::new();
    nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    let before = nav.connection_table().clone();

    let m2 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());
    assert_ne!(nav.connection_table(), &before);

    nav.remove_mesh(m2).expect("remove");
    assert_eq!(nav.connection_table(), &before);
    assert_eq!(nav.polygon_count(), 1);
}

#[test]
fn third_coincident_edge_waits_in_pending_queue_and_is_promoted() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    let m2 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());
    let m3 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());

    let key = nav
        .polygon(PolygonRef { mesh: m1, index: 0 })
        .expect("polygon")
        .edge_key(1);
    let conn = nav.connection_table()[&key].clone();
    assert_eq!(conn.a(), edge(m1, 0, 1));
    assert_eq!(conn.b(), Some(edge(m2, 0, 3)));
    assert_eq!(conn.pending(), &[edge(m3, 0, 3)]);

    let queued = &nav.polygon(PolygonRef { mesh: m3, index: 0 }).expect("polygon").edges()[3];
    assert!(queued.is_pending());
    assert_eq!(queued.link(), None);

    let chain = nav
        .find_polygon_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(1.5, 0.0, 0.5))
        .expect("path");
    assert_eq!(chain.steps.last().map(|s| s.polygon.mesh), Some(m2));

    nav.remove_mesh(m2).expect("remove");

    let conn = nav.connection_table()[&key].clone();
    assert_eq!(conn.a(), edge(m1, 0, 1));
    assert_eq!(conn.b(), Some(edge(m3, 0, 3)));
    assert!(conn.pending().is_empty());

    let promoted = &nav.polygon(PolygonRef { mesh: m3, index: 0 }).expect("polygon").edges()[3];
    assert!(!promoted.is_pending());
    assert_eq!(promoted.link(), Some(edge(m1, 0, 1)));

    let chain = nav
        .find_polygon_path(Vec3::new(0.5, 0.0, 0.5), Vec3::new(1.5, 0.0, 0.5))
        .expect("path");
    assert_eq!(chain.len(), 2);
    assert_eq!(chain.steps.last().map(|s| s.polygon.mesh), Some(m3));
}

#[test]
fn removing_a_mesh_with_a_pending_edge_leaves_active_pair_intact() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    let m2 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());
    let m3 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());

    let key = nav
        .polygon(PolygonRef { mesh: m1, index: 0 })
        .expect("polygon")
        .edge_key(1);

    nav.remove_mesh(m3).expect("remove");
    let conn = &nav.connection_table()[&key];
    assert_eq!(conn.a(), edge(m1, 0, 1));
    assert_eq!(conn.b(), Some(edge(m2, 0, 3)));
    assert!(conn.pending().is_empty());
}

#[test]
fn retransform_and_back_restores_connection_table() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    let m2 = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());
    let before = nav.connection_table().clone();

    nav.set_mesh_transform(m2, Transform::from_translation(Vec3::new(10.0, 0.0, 0.0)))
        .expect("move");
    let a = nav.polygon(PolygonRef { mesh: m1, index: 0 }).expect("polygon");
    assert_eq!(a.edges()[1].link(), None);

    nav.set_mesh_transform(m2, Transform::IDENTITY).expect("move back");
    assert_eq!(nav.connection_table(), &before);

    // Moving the first side away and back flips which side is `a`.
    nav.set_mesh_transform(m1, Transform::from_translation(Vec3::new(0.0, 5.0, 0.0)))
        .expect("move");
    nav.set_mesh_transform(m1, Transform::IDENTITY).expect("move back");
    assert_eq!(normalized(nav.connection_table()), normalized(&before));
}

#[test]
fn identical_transform_is_a_no_op() {
    let mut nav = Navigation::new();
    let t = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let id = nav.add_mesh(square_mesh(0.0, 1.0), t, ());
    let before = nav.connection_table().clone();

    nav.set_mesh_transform(id, t).expect("same transform");
    assert_eq!(nav.connection_table(), &before);
    assert_eq!(nav.mesh_transform(id), Some(&t));
}

#[test]
fn unknown_mesh_ids_are_rejected() {
    let mut nav: Navigation = Navigation::new();
    assert_eq!(
        nav.set_mesh_transform(MeshId(42), Transform::IDENTITY),
        Err(NavError::UnknownMesh(MeshId(42)))
    );
    assert_eq!(nav.remove_mesh(MeshId(42)), Err(NavError::UnknownMesh(MeshId(42))));
}

#[test]
fn mesh_without_vertices_stays_unlinked() {
    let mut nav = Navigation::new();
    let id = nav.add_mesh(NavMeshSource::default(), Transform::IDENTITY, ());
    assert!(!nav.is_linked(id));
    assert_eq!(nav.mesh_polygon_count(id), Some(0));
    assert!(nav.connection_table().is_empty());
    assert_eq!(nav.mesh_ids().collect::<Vec<_>>(), vec![id]);
}

#[test]
fn malformed_polygons_are_dropped() {
    let mesh = NavMeshSource::new(
        square(0.0, 1.0).to_vec(),
        vec![vec![0, 1], vec![0, 1, 2, 3], vec![0, 1, 9]],
    );
    let mut nav = Navigation::new();
    let id = nav.add_mesh(mesh, Transform::IDENTITY, ());
    assert!(nav.is_linked(id));
    assert_eq!(nav.mesh_polygon_count(id), Some(1));
    assert_eq!(nav.connection_table().len(), 4);
}

#[test]
fn remove_mesh_hands_back_owner() {
    let mut nav = Navigation::new();
    let floor = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, "floor");
    let ramp = nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, "ramp");
    assert_eq!(nav.mesh_owner(ramp), Some(&"ramp"));

    assert_eq!(nav.remove_mesh(floor), Ok("floor"));
    assert_eq!(nav.mesh_count(), 1);
    assert_eq!(nav.polygon_count(), 1);
    assert_eq!(nav.closest_point_owner(Vec3::new(0.0, 0.0, 0.0)), Some(&"ramp"));
}

#[test]
fn mesh_ids_are_not_reused() {
    let mut nav = Navigation::new();
    let a = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    nav.remove_mesh(a).expect("remove");
    let b = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    assert_ne!(a, b);
}

#[test]
fn up_vector_change_relinks_with_new_winding() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    nav.add_mesh(square_mesh(1.0, 2.0), Transform::IDENTITY, ());
    let before = nav.connection_table().clone();
    let polygon = PolygonRef { mesh: m1, index: 0 };
    assert!(!nav.polygon(polygon).expect("polygon").is_clockwise());

    nav.set_up_vector(Vec3::new(0.0, -1.0, 0.0)).expect("up");
    assert_eq!(nav.up_vector(), Vec3::new(0.0, -1.0, 0.0));
    assert!(nav.polygon(polygon).expect("polygon").is_clockwise());
    assert_eq!(nav.connection_table(), &before);

    assert_eq!(nav.set_up_vector(Vec3::ZERO), Err(ConfigError::UpVector));
    assert_eq!(nav.up_vector(), Vec3::new(0.0, -1.0, 0.0));
}

#[test]
fn invalid_config_is_rejected() {
    let config = NavConfig {
        cell_size: 0.0,
        ..NavConfig::default()
    };
    assert!(matches!(
        Navigation::<()>::with_config(config),
        Err(ConfigError::CellSize(_))
    ));

    let config = NavConfig {
        path_epsilon: -1.0,
        ..NavConfig::default()
    };
    assert!(matches!(
        Navigation::<()>::with_config(config),
        Err(ConfigError::PathEpsilon(_))
    ));
}

#[test]
fn transformed_meshes_link_after_rotation_and_scale() {
    let mut nav = Navigation::new();
    let m1 = nav.add_mesh(square_mesh(0.0, 1.0), Transform::IDENTITY, ());
    // Stretched to x in [0, 2] and turned half a turn about +Y, the square covers x in [-2, 0],
    // z in [-1, 0]; shifting it by (3, 0, 1) puts an edge on x = 1 against the first square.
    let t = Transform::from_parts(
        Vec3::new(3.0, 0.0, 1.0),
        Vec3::Y,
        core::f32::consts::PI,
        Vec3::new(2.0, 1.0, 1.0),
    );
    let m2 = nav.add_mesh(square_mesh(0.0, 1.0), t, ());

    let a = nav.polygon(PolygonRef { mesh: m1, index: 0 }).expect("polygon");
    assert_eq!(a.edges()[1].link().map(|e| e.polygon.mesh), Some(m2));
}
