use dike_design::{
    crs::Crs,
    geometry::{Point, Polygon, Polyline},
    measure::{Measure, MeasureMode},
};

#[test]
fn epsg_names_and_fallback() {
    assert_eq!(Crs::parse("EPSG:28992").epsg(), 28992);
    assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::3857").epsg(), 3857);
    assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").epsg(), 4326);
    assert_eq!(Crs::parse("").epsg(), 4326);
    assert_eq!(Crs::parse("local grid").epsg(), 4326);
}

#[test]
fn geodesic_measures_agree_with_rd_plane() {
    let square = Polygon::new(vec![
        Point::new(155_000.0, 463_000.0),
        Point::new(155_100.0, 463_000.0),
        Point::new(155_100.0, 463_100.0),
        Point::new(155_000.0, 463_100.0),
    ]);
    let geodesic = Measure::new(Crs::rd_new(), MeasureMode::Geodesic);
    let planar = Measure::new(Crs::rd_new(), MeasureMode::Planar);
    assert!((planar.area(&square) - 10_000.0).abs() < 1e-6);
    let area = geodesic.area(&square);
    assert!((area - 10_000.0).abs() < 50.0, "{area}");

    let edge = Polyline::new(square.exterior[..2].to_vec());
    let length = geodesic.length(&edge);
    assert!((length - 100.0).abs() < 0.5, "{length}");
}

#[test]
fn unknown_crs_measures_in_the_plane() {
    let square = Polygon::new(vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ]);
    let measure = Measure::new(Crs::from_epsg(999_999), MeasureMode::Geodesic);
    assert!((measure.area(&square) - 100.0).abs() < 1e-9);
}
