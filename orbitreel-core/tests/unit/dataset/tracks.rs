use super::*;

fn cloud(steps: usize, n: usize) -> TrajectoryDataset {
    let data = vec![0.0; steps * n * 2];
    TrajectoryDataset::from_dense("ships", [steps, n, 2], &data).unwrap()
}

#[test]
fn status_codes_round_trip() {
    for s in EntityStatus::ALL {
        assert_eq!(EntityStatus::from_code(s.code()), Some(s));
    }
    assert_eq!(EntityStatus::from_code(4), None);
    assert_eq!(EntityStatus::from_code(-1), None);
}

#[test]
fn constant_status_track_applies_to_every_step() {
    let t = StatusTrack::constant(vec![0, 3]).unwrap();
    t.check_against(&cloud(10, 2)).unwrap();
    assert_eq!(t.code_at(0, 1).unwrap(), 3);
    assert_eq!(t.code_at(9, 1).unwrap(), 3);
}

#[test]
fn per_step_status_track_must_match_dataset() {
    let t = StatusTrack::new(2, 2, vec![0, 1, 2, 3]).unwrap();
    t.check_against(&cloud(2, 2)).unwrap();
    assert_eq!(t.code_at(1, 0).unwrap(), 2);
    assert!(matches!(
        t.check_against(&cloud(3, 2)),
        Err(OrbitError::ShapeMismatch(_))
    ));
    assert!(matches!(
        t.check_against(&cloud(2, 3)),
        Err(OrbitError::ShapeMismatch(_))
    ));
    assert!(t.code_at(2, 0).is_err());
    assert!(StatusTrack::new(2, 2, vec![0; 3]).is_err());
}

#[test]
fn oversized_status_shape_is_a_shape_error() {
    assert!(matches!(
        StatusTrack::new(usize::MAX, 2, vec![0; 4]),
        Err(OrbitError::ShapeMismatch(_))
    ));
}

#[test]
fn distinct_codes_are_sorted() {
    let t = StatusTrack::new(2, 2, vec![3, 0, 3, 7]).unwrap();
    assert_eq!(t.distinct_codes(), vec![0, 3, 7]);
}

#[test]
fn index_track_validates_entities_and_length() {
    let d = cloud(4, 3);
    IndexTrack::Constant(2).check_against(&d).unwrap();
    assert!(matches!(
        IndexTrack::Constant(3).check_against(&d),
        Err(OrbitError::IndexOutOfRange { .. })
    ));
    IndexTrack::PerStep(vec![1]).check_against(&d).unwrap();
    assert!(IndexTrack::PerStep(vec![0, 1]).check_against(&d).is_err());
    let track = IndexTrack::PerStep(vec![0, 1, 2, 1]);
    track.check_against(&d).unwrap();
    assert_eq!(track.at(2).unwrap(), 2);
    assert_eq!(IndexTrack::PerStep(vec![1]).at(3).unwrap(), 1);
}

#[test]
fn index_track_json_accepts_number_or_array() {
    let a: IndexTrack = serde_json::from_str("5").unwrap();
    assert_eq!(a, IndexTrack::Constant(5));
    let b: IndexTrack = serde_json::from_str("[1, 2]").unwrap();
    assert_eq!(b, IndexTrack::PerStep(vec![1, 2]));
}
