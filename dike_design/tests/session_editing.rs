use std::sync::{Arc, Mutex};

use dike_design::{
    config::DesignConfig,
    geometry::Point,
    profile::FlatTerrain,
    session::{EditMode, SessionEvent},
    DesignError, Session,
};

fn session() -> Session {
    let mut s = Session::new(DesignConfig::default(), Box::new(FlatTerrain(1.0)));
    s.set_alignment(vec![Point::new(0.0, 0.0), Point::new(60.0, 0.0)])
        .unwrap();
    s.add_vak("A");
    s
}

#[test]
fn rejected_moves_leave_points_in_place() {
    let mut s = session();
    let a = s.add_control_point("A", 0.0, None, 3.0).unwrap();
    let b = s.add_control_point("A", 60.0, None, 3.0).unwrap();
    let fill = s.volume().unwrap().fill;

    assert!(matches!(
        s.move_control_point("A", b, 0.2, 4.0),
        Err(DesignError::DuplicateChainage { .. })
    ));
    assert_eq!(s.vak("A").unwrap().point(b).unwrap().chainage, 60.0);
    assert_eq!(s.volume().unwrap().fill, fill);

    let moved = s.move_control_point("A", a, 0.0, 4.1).unwrap();
    assert_eq!(moved.height, 4.0);
    assert!(s.volume().unwrap().fill > fill);

    assert!(matches!(
        s.remove_control_point("A", 99),
        Err(DesignError::UnknownControlPoint(99))
    ));
    s.remove_control_point("A", b).unwrap();
    assert!(s.surface().is_none());
    assert!(s.volume().is_none());
}

#[test]
fn events_describe_each_edit() {
    let mut s = session();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    s.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

    s.add_control_point("A", 0.0, None, 2.0).unwrap();
    s.add_control_point("A", 60.0, None, 2.0).unwrap();
    s.begin_placing("A", None).unwrap();
    s.cancel();

    let events = seen.lock().unwrap();
    assert_eq!(
        events[0],
        SessionEvent::ControlPointsChanged { vak: "A".into() }
    );
    assert!(events.contains(&SessionEvent::SurfaceRebuilt));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::VolumeUpdated(v) if v.fill > 0.0)));
    assert_eq!(
        events[events.len() - 1],
        SessionEvent::ModeChanged(EditMode::Idle)
    );
}

#[test]
fn removing_profile_points_keeps_other_ids() {
    let mut s = session();
    let before = s.profile().unwrap().len();
    let removed = s.remove_profile_point(10).unwrap();
    assert_eq!(removed.id, 10);
    let profile = s.profile().unwrap();
    assert_eq!(profile.len(), before - 1);
    assert!(profile.points().iter().any(|p| p.id == 11));
    assert!(s.remove_profile_point(10).is_err());
}

#[test]
fn unknown_vak_cannot_be_armed() {
    let mut s = session();
    assert!(matches!(
        s.begin_placing("B", None),
        Err(DesignError::UnknownVak(_))
    ));
    assert_eq!(s.mode(), &EditMode::Idle);
    assert!(s.anchors("B").is_err());
}
