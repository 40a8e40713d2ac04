//! Serialization roundtrips and validation of deserialized meshes.

#![forbid(unsafe_code)]

use tetra_interp::prelude::*;

fn sample_mesh() -> TetrahedralMesh {
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(0.0, 0.0, 2.0),
        Vec3::new(2.5, 2.5, 2.5),
        Vec3::new(0.5, 0.4, 0.3),
        Vec3::new(0.5, 0.4, 0.3),
    ];
    TetrahedralMesh::new(&positions).unwrap()
}

#[test]
fn json_roundtrip_preserves_the_mesh() {
    let mesh = sample_mesh();
    assert_eq!(mesh.ignored_vertices(), &[6]);

    let json = serde_json::to_string(&mesh).expect("Serialization failed");
    let restored: TetrahedralMesh = serde_json::from_str(&json).expect("Deserialization failed");

    assert_eq!(restored, mesh);
    assert!(restored.validate_adjacency().is_ok());

    let values: Vec<f32> = (0..mesh.vertices().len()).map(|i| i as f32).collect();
    let query = Vec3::new(0.7, 0.6, 0.9);
    let (mut a, mut b) = (0, 0);
    let before: f32 = mesh.sample(values.as_slice(), &query, &mut a);
    let after: f32 = restored.sample(values.as_slice(), &query, &mut b);
    assert_eq!(before, after);
}

#[test]
fn empty_mesh_roundtrips() {
    let json = serde_json::to_string(&TetrahedralMesh::default()).unwrap();
    let restored: TetrahedralMesh = serde_json::from_str(&json).unwrap();
    assert!(restored.is_empty());
}

#[test]
fn mesh_index_is_tagged() {
    let json = serde_json::to_string(&[MeshIndex::Regular(3), MeshIndex::None, MeshIndex::AtInfinityCubic]).unwrap();
    let restored: Vec<MeshIndex> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, vec![MeshIndex::Regular(3), MeshIndex::None, MeshIndex::AtInfinityCubic]);
}

#[test]
fn out_of_range_vertex_is_rejected() {
    let mut value = serde_json::to_value(sample_mesh()).unwrap();
    value["tetrahedrons"][0]["indices"][1] = serde_json::json!(99);

    let error = serde_json::from_value::<TetrahedralMesh>(value).unwrap_err();
    assert!(error.to_string().contains("vertex 99 out of range"), "{error}");
}

#[test]
fn out_of_range_neighbor_is_rejected() {
    let mut value = serde_json::to_value(sample_mesh()).unwrap();
    value["tetrahedrons"][0]["neighbors"][0] = serde_json::to_value(MeshIndex::Regular(1000)).unwrap();

    let error = serde_json::from_value::<TetrahedralMesh>(value).unwrap_err();
    assert!(error.to_string().contains("out of range"), "{error}");
}

#[test]
fn misplaced_outer_tetrahedron_is_rejected() {
    let mesh = sample_mesh();
    let mut value = serde_json::to_value(&mesh).unwrap();
    value["num_inner_tetrahedrons"] = serde_json::json!(mesh.num_inner_tetrahedrons() + 1);

    let error = serde_json::from_value::<TetrahedralMesh>(value).unwrap_err();
    assert!(error.to_string().contains("wrong partition"), "{error}");
}

#[test]
fn missing_hull_normals_are_rejected() {
    let mut value = serde_json::to_value(sample_mesh()).unwrap();
    value["hull_normals"] = serde_json::json!([]);

    let error = serde_json::from_value::<TetrahedralMesh>(value).unwrap_err();
    assert!(error.to_string().contains("hull normals"), "{error}");
}
