use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use dike_design::{
    config::DesignConfig, geometry::Point, io::project::write_project_json, profile::FlatTerrain,
    Session,
};
use predicates::prelude::*;
use std::process::Command;

const FLAT_TERRAIN: &str = "x,y,z\n-50,-50,0\n150,-50,0\n150,50,0\n-50,50,0\n";

fn write_project(path: &std::path::Path, origin: (f64, f64)) {
    let mut session = Session::new(DesignConfig::default(), Box::new(FlatTerrain(0.0)));
    session
        .set_alignment(vec![
            Point::new(origin.0, origin.1),
            Point::new(origin.0 + 100.0, origin.1),
        ])
        .unwrap();
    session.add_vak("vak 1");
    for (c, h) in [(0.0, 2.0), (50.0, 5.0), (100.0, 2.0)] {
        session.add_control_point("vak 1", c, None, h).unwrap();
    }
    let project = session.to_project("vak 1", "basis").unwrap();
    write_project_json(path, &project).unwrap();
}

#[test]
fn profile_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let alignment = dir.child("alignment.csv");
    alignment.write_str("0,0\n10,0\n").unwrap();
    let terrain = dir.child("terrain.csv");
    terrain
        .write_str("-1,-1,1.5\n11,-1,1.5\n11,1,1.5\n-1,1,1.5\n")
        .unwrap();

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "profile",
            alignment.path().to_str().unwrap(),
            terrain.path().to_str().unwrap(),
            "--step",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,5.000,5.000,0.000,1.500"))
        .stdout(predicate::str::contains("2,10.000,10.000,0.000,1.500"));
    dir.close().unwrap();
}

#[test]
fn volume_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let project = dir.child("project.json");
    write_project(project.path(), (0.0, 0.0));
    let terrain = dir.child("terrain.csv");
    terrain.write_str(FLAT_TERRAIN).unwrap();

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "volume",
            project.path().to_str().unwrap(),
            terrain.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fill:"))
        .stdout(predicate::str::contains("Net:"));
    dir.close().unwrap();
}

#[test]
fn intersect_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let line = dir.child("a.csv");
    line.write_str("0,0\n10,10\n").unwrap();
    let target = dir.child("b.csv");
    target.write_str("0,10\n10,0\n").unwrap();

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "intersect",
            "--line",
            line.path().to_str().unwrap(),
            "--target",
            target.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("5.000,5.000"));
}

#[test]
fn offset_command_writes_csv() {
    let dir = assert_fs::TempDir::new().unwrap();
    let line = dir.child("line.csv");
    line.write_str("0,0\n10,0\n").unwrap();
    let out = dir.child("shifted.csv");

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "offset",
            line.path().to_str().unwrap(),
            "--distance",
            "2",
            "--side",
            "right",
            "--output",
            out.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 points"));
    out.assert("0,-2\n10,-2\n");
}

#[test]
fn export_geojson_command() {
    let dir = assert_fs::TempDir::new().unwrap();
    let project = dir.child("project.json");
    write_project(project.path(), (155_000.0, 463_000.0));
    let output = dir.child("project.geojson");

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "export-geojson",
            project.path().to_str().unwrap(),
            output.path().to_str().unwrap(),
            "--crs",
            "EPSG:28992",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported"));
    output.assert(predicate::str::contains("FeatureCollection"));
    output.assert(predicate::str::contains("EPSG:4326"));
    output.assert(predicate::str::contains("ruimtebeslag2d"));
}

#[test]
fn config_flag_is_read() {
    let dir = assert_fs::TempDir::new().unwrap();
    let config = dir.child("config.json");
    config.write_str("{ \"sampler\": { \"step\": 2.5 } }").unwrap();
    let alignment = dir.child("alignment.csv");
    alignment.write_str("0,0\n5,0\n").unwrap();
    let terrain = dir.child("terrain.csv");
    terrain.write_str("-1,-1,0\n6,-1,0\n6,1,0\n-1,1,0\n").unwrap();

    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args([
            "profile",
            alignment.path().to_str().unwrap(),
            terrain.path().to_str().unwrap(),
            "--config",
            config.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,2.500,2.500"));
}

#[test]
fn missing_input_fails() {
    Command::cargo_bin("dike_design_cli")
        .unwrap()
        .args(["intersect", "--line", "nope.csv", "--target", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}
