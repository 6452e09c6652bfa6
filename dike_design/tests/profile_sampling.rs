use dike_design::{
    alignment::Alignment,
    config::{SamplerConfig, UnresolvedPolicy},
    dtm::Tin,
    geometry::{Point, Point3},
    profile::{sample_profile, ElevationFn},
    DesignError,
};

fn bent_alignment() -> Alignment {
    Alignment::new(vec![
        Point::new(0.0, 0.0),
        Point::new(30.0, 0.0),
        Point::new(30.0, 17.5),
    ])
    .unwrap()
}

#[test]
fn chainage_increases_and_ends_at_length() {
    let alignment = bent_alignment();
    let slope = ElevationFn(|x: f64, y: f64| Some(0.1 * x + 0.2 * y));
    let profile = sample_profile(&alignment, &slope, &SamplerConfig::default()).unwrap();
    let points = profile.points();
    assert_eq!(points.first().unwrap().chainage, 0.0);
    assert!((points.last().unwrap().chainage - 47.5).abs() < 1e-9);
    assert!(points.windows(2).all(|w| w[1].chainage > w[0].chainage));
    // chainage 40 lies 10 along the second leg
    let p = profile.nearest(40.0).unwrap();
    assert!((p.x - 30.0).abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9);
    assert!((p.elevation - 5.0).abs() < 1e-9);
}

#[test]
fn sample_count_is_capped() {
    let config = SamplerConfig {
        step: 0.01,
        max_samples: 11,
        ..SamplerConfig::default()
    };
    let alignment = Alignment::new(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)]).unwrap();
    let profile = sample_profile(&alignment, &ElevationFn(|_: f64, _: f64| Some(1.0)), &config).unwrap();
    assert_eq!(profile.len(), 11);
}

#[test]
fn gaps_in_the_terrain_are_interpolated_or_rejected() {
    let alignment = Alignment::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]).unwrap();
    let holey = ElevationFn(|x: f64, _: f64| (!(3.5..6.5).contains(&x)).then_some(x));
    let profile = sample_profile(&alignment, &holey, &SamplerConfig::default()).unwrap();
    assert!((profile.elevation_at_chainage(5.0).unwrap() - 5.0).abs() < 1e-9);

    let strict = SamplerConfig {
        unresolved: UnresolvedPolicy::Fail,
        ..SamplerConfig::default()
    };
    assert!(matches!(
        sample_profile(&alignment, &holey, &strict),
        Err(DesignError::MissingInput(_))
    ));
    let nowhere = ElevationFn(|_: f64, _: f64| -> Option<f64> { None });
    assert!(sample_profile(&alignment, &nowhere, &SamplerConfig::default()).is_err());
}

#[test]
fn tin_terrain_outside_the_hull_is_filled() {
    let tin = Tin::from_points(vec![
        Point3::new(-1.0, -5.0, 2.0),
        Point3::new(6.0, -5.0, 2.0),
        Point3::new(6.0, 5.0, 2.0),
        Point3::new(-1.0, 5.0, 2.0),
    ]);
    let alignment = Alignment::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]).unwrap();
    let profile = sample_profile(&alignment, &tin, &SamplerConfig::default()).unwrap();
    assert_eq!(profile.len(), 11);
    assert!(profile.points().iter().all(|p| (p.elevation - 2.0).abs() < 1e-9));
}
