use dike_design::{
    config::DesignConfig,
    design::ReferenceLocation,
    geometry::{Geometry, Point},
    io::project::{read_project_json, write_project_json, ProjectFile},
    profile::FlatTerrain,
    DesignError, Session,
};

fn designed_session() -> Session {
    let mut session = Session::new(DesignConfig::default(), Box::new(FlatTerrain(0.25)));
    session
        .set_alignment(vec![
            Point::new(155_000.123, 463_000.456),
            Point::new(155_060.0, 463_020.0),
            Point::new(155_110.0, 463_000.0),
        ])
        .unwrap();
    session.add_vak("vak 1");
    session.add_vak("vak 2");
    session.add_control_point("vak 1", 0.0, None, 3.0).unwrap();
    session.add_control_point("vak 1", 40.0, None, 3.5).unwrap();
    session
        .add_control_point("vak 1", 10.0, Some(ReferenceLocation::OuterToe), 0.25)
        .unwrap();
    session.add_control_point("vak 2", 60.0, None, 2.0).unwrap();
    session.add_control_point("vak 2", 100.0, None, 2.5).unwrap();
    session
}

#[test]
fn saved_project_restores_the_session() {
    let session = designed_session();
    let project = session.to_project("vak 1", "basis").unwrap();
    assert_eq!(project.all_chart_data.len(), 2);
    assert_eq!(project.chart_data.len(), 3);
    assert!(!project.geometries.design3d.is_empty());
    assert!(!project.geometries.ruimtebeslag2d.is_empty());
    assert_eq!(project.geometries.cross_section_points.len(), 3);
    assert!(project.design_values.fill_volume > 0.0);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vak1_basis.json");
    write_project_json(&path, &project).unwrap();
    let loaded = read_project_json(&path).unwrap();

    let mut restored = Session::new(DesignConfig::default(), Box::new(FlatTerrain(0.25)));
    restored.load_project(&loaded).unwrap();

    let before = session.alignment().unwrap().vertices();
    let after = restored.alignment().unwrap().vertices();
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after) {
        assert!(a.approx_eq(b, 0.01));
    }

    for name in ["vak 1", "vak 2"] {
        let a = session.vak(name).unwrap().points();
        let b = restored.vak(name).unwrap().points();
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b) {
            assert_eq!(p.id, q.id);
            assert_eq!(p.reference, q.reference);
            assert!((p.chainage - q.chainage).abs() < 0.01);
            assert!((p.height - q.height).abs() < 0.01);
        }
    }

    let (v0, v1) = (session.volume().unwrap(), restored.volume().unwrap());
    assert!((v0.fill - v1.fill).abs() < 0.01);
    assert!((v0.excavation - v1.excavation).abs() < 0.01);
    assert_eq!(
        session.profile().unwrap().len(),
        restored.profile().unwrap().len()
    );
    assert!(restored.surface().is_some());
    assert!(restored.footprint().is_some());
}

#[test]
fn restored_session_recomputes_to_the_same_volume() {
    let session = designed_session();
    let project = session.to_project("vak 1", "basis").unwrap();
    let mut restored = Session::new(DesignConfig::default(), Box::new(FlatTerrain(0.25)));
    restored.load_project(&project).unwrap();
    restored.recompute().unwrap();
    let (v0, v1) = (session.volume().unwrap(), restored.volume().unwrap());
    assert!((v0.fill - v1.fill).abs() < 1e-6);
}

#[test]
fn input_line_is_stored_as_a_line() {
    let project = designed_session().to_project("vak 2", "alt").unwrap();
    assert_eq!(project.metadata.vak, "vak 2");
    assert!(matches!(
        project.geometries.input_line[0].geometry,
        Geometry::Line(_)
    ));
    assert_eq!(project.chart_data.len(), 2);
}

#[test]
fn mesh_with_dangling_triangle_is_refused() {
    let mut project = designed_session().to_project("vak 1", "basis").unwrap();
    if let Geometry::Mesh(mesh) = &mut project.geometries.design3d[0].geometry {
        mesh.triangles[0] = [0, 1, 99_999];
    } else {
        panic!("design3d holds a mesh");
    }

    let mut restored = Session::new(DesignConfig::default(), Box::new(FlatTerrain(0.25)));
    assert!(matches!(
        restored.load_project(&project),
        Err(DesignError::GeometricFailure(_))
    ));
    assert!(restored.alignment().is_none());
    assert!(restored.surface().is_none());

    let json = project.to_json().unwrap();
    assert!(ProjectFile::from_json(&json).is_err());
}
