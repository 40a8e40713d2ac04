//! Integration tests for mesh construction.
//!
//! - Delaunay property and symmetric adjacency on seeded random clouds
//! - Convex hull on seeded random clouds
//! - Rejection of near-duplicate and non-finite input
//! - Construction reports and diagnostics

#![forbid(unsafe_code)]

use rand::{Rng, SeedableRng, rngs::StdRng};
use tetra_interp::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn random_cloud(seed: u64, count: usize, extent: f32) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
                rng.random_range(-extent..extent),
            )
        })
        .collect()
}

fn unit_tetrahedron() -> Vec<Vec3> {
    vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z()]
}

#[test]
fn random_clouds_are_delaunay() {
    init_tracing();
    for seed in [1, 7, 42, 12345] {
        let positions = random_cloud(seed, 200, 10.0);
        let (mesh, report) = TetrahedralMeshBuilder::new(&positions).build().unwrap_or_else(|err| {
            panic!("seed {seed}: construction failed: {err}");
        });

        assert!(report.rejected_vertices.len() <= 2, "seed {seed}: {:?}", report.rejected_vertices);
        assert_eq!(mesh.vertices().len(), positions.len());
        assert_eq!(report.num_inner_tetrahedrons, mesh.num_inner_tetrahedrons());
        assert_eq!(report.num_outer_tetrahedrons, mesh.num_outer_tetrahedrons());
        mesh.validate_adjacency().unwrap_or_else(|err| panic!("seed {seed}: {err}"));
        mesh.validate_delaunay(1e-3).unwrap_or_else(|err| panic!("seed {seed}: {err}"));
    }
}

#[test]
fn random_clouds_have_convex_hulls() {
    init_tracing();
    for (seed, count, extent) in [(3, 1000, 0.5), (11, 1000, 10.0), (42, 200, 10.0)] {
        let positions = random_cloud(seed, count, extent);
        let mesh = TetrahedralMesh::new(&positions).unwrap();
        mesh.validate_hull_convexity(1e-3 * f64::from(extent))
            .unwrap_or_else(|err| panic!("seed {seed}: {err}"));
    }
}

#[test]
fn hull_is_closed_and_outer_cells_match_hull_faces() {
    init_tracing();
    let positions = random_cloud(99, 60, 1.0);
    let mesh = TetrahedralMesh::new(&positions).unwrap();

    // Every hull face of a closed triangulated surface has three neighbors, so
    // Euler's formula gives an even face count.
    assert_eq!(mesh.num_outer_tetrahedrons() % 2, 0);
    for tet in &mesh.tetrahedrons()[mesh.num_inner_tetrahedrons()..] {
        assert!(tet.apex.is_at_infinity());
        assert!(tet.neighbors[3].regular().is_some_and(|n| n < mesh.num_inner_tetrahedrons()));
        for &v in &tet.indices {
            assert!((mesh.hull_normals()[v].norm() - 1.0).abs() < 1e-5);
        }
    }
}

#[test]
fn duplicate_vertices_are_rejected_and_ignored() {
    init_tracing();
    let mut positions = unit_tetrahedron();
    positions.push(Vec3::new(0.2, 0.2, 0.2));
    positions.push(Vec3::x());
    positions.push(Vec3::new(0.2, 0.2, 0.2 + 1e-6));

    let mut log = DiagnosticLog::default();
    let (mesh, report) = TetrahedralMeshBuilder::new(&positions)
        .build_with_diagnostics(&mut log)
        .unwrap();

    let rejected: Vec<usize> = report.rejected_vertices.iter().map(InsertionError::vertex).collect();
    assert_eq!(rejected, vec![5, 6]);
    assert!(matches!(
        report.rejected_vertices[0],
        InsertionError::NearDuplicate { vertex: 5, existing: 1, .. }
    ));
    assert!(matches!(
        report.rejected_vertices[1],
        InsertionError::NearDuplicate { vertex: 6, existing: 4, .. }
    ));
    assert_eq!(log.rejected, report.rejected_vertices);
    assert_eq!(mesh.ignored_vertices(), &[5, 6]);
    assert!(!report.is_complete());

    // The interior vertex splits the tetrahedron in four.
    assert_eq!(mesh.num_inner_tetrahedrons(), 4);
    mesh.validate_adjacency().unwrap();
}

#[test]
fn looser_duplicate_tolerance_rejects_more() {
    let mut positions = unit_tetrahedron();
    positions.push(Vec3::new(0.25, 0.25, 0.25));
    positions.push(Vec3::new(0.25, 0.25, 0.26));

    let (_, strict) = TetrahedralMeshBuilder::new(&positions).build().unwrap();
    assert!(strict.rejected_vertices.is_empty());

    let options = ConstructionOptionsBuilder::default()
        .duplicate_tolerance(0.05)
        .build()
        .unwrap();
    let (mesh, loose) = TetrahedralMeshBuilder::new(&positions).options(options).build().unwrap();
    assert_eq!(loose.rejected_vertices.len(), 1);
    assert_eq!(loose.rejected_vertices[0].vertex(), 5);
    assert_eq!(mesh.ignored_vertices(), &[5]);
}

#[test]
fn degenerate_input_fails() {
    assert_eq!(
        TetrahedralMesh::new(&unit_tetrahedron()[..3]),
        Err(TetrahedralMeshError::InsufficientVertices { count: 3 })
    );

    let coplanar: Vec<Vec3> = (0..10)
        .map(|i| Vec3::new(i as f32, (i * i % 7) as f32, 0.0))
        .collect();
    assert_eq!(TetrahedralMesh::new(&coplanar), Err(TetrahedralMeshError::NoInnerTetrahedra));

    let mut positions = unit_tetrahedron();
    positions[3].y = f32::INFINITY;
    assert_eq!(
        TetrahedralMesh::new(&positions),
        Err(TetrahedralMeshError::NonFiniteVertex { index: 3 })
    );
}

#[test]
fn construction_is_deterministic() {
    let positions = random_cloud(5, 80, 3.0);
    let first = TetrahedralMesh::new(&positions).unwrap();
    let second = TetrahedralMesh::new(&positions).unwrap();
    assert_eq!(first, second);
}

#[test]
fn meshes_can_be_shared_between_threads() {
    let positions = random_cloud(11, 50, 2.0);
    let mesh = TetrahedralMesh::new(&positions).unwrap();
    let values: Vec<f32> = positions.iter().map(|p| p.x).collect();

    std::thread::scope(|scope| {
        for offset in [-0.5_f32, 0.0, 0.5] {
            let (mesh, values) = (&mesh, &values);
            scope.spawn(move || {
                let mut hint = 0;
                let value: f32 = mesh.sample(values.as_slice(), &Vec3::new(offset, 0.0, 0.0), &mut hint);
                assert!(value.is_finite());
            });
        }
    });
}
