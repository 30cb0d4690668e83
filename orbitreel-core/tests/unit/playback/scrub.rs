use super::*;

#[test]
fn endpoints_map_to_first_and_last_sample() {
    for len in [1usize, 2, 3, 5, 10, 25_000] {
        assert_eq!(index_for(0.0, len), 0);
        assert_eq!(index_for(1.0, len), len - 1);
    }
}

#[test]
fn every_scrub_value_stays_in_range() {
    for len in [1usize, 2, 7, 100] {
        for k in 0..=1000 {
            let s = k as f64 / 1000.0;
            assert!(index_for(s, len) < len);
        }
    }
}

#[test]
fn out_of_range_scrub_is_clamped() {
    assert_eq!(index_for(-0.5, 10), 0);
    assert_eq!(index_for(1.5, 10), 9);
    assert_eq!(index_for(f64::NAN, 10), 0);
    assert_eq!(index_for(0.5, 0), 0);
}

#[test]
fn three_sample_scenario() {
    assert_eq!(index_for(0.0, 3), 0);
    assert_eq!(index_for(0.5, 3), 1);
    assert_eq!(index_for(1.0, 3), 2);
}

#[test]
fn different_lengths_share_progress() {
    assert_eq!(index_for(0.5, 5), 2);
    assert_eq!(index_for(0.5, 10), 4);
}

#[test]
fn scrub_state_clamps_and_ignores_nan() {
    let mut s = ScrubState::new(2.0);
    assert_eq!(s.get(), 1.0);
    s.set(0.25);
    s.set(f64::NAN);
    assert_eq!(s.get(), 0.25);
    assert_eq!(s.index_for(5), 1);
}

#[test]
fn bounds_validate_and_interpolate() {
    assert!(ScrubBounds::new(0.0, 1.5).is_err());
    let b = ScrubBounds::new(1.0, 0.5).unwrap();
    assert_eq!(b.at(0.0), 1.0);
    assert_eq!(b.at(1.0), 0.5);
    assert_eq!(ScrubBounds::full().at(0.25), 0.25);
}

#[test]
fn align_index_matches_progress_rule() {
    assert_eq!(align_index(0, 5, 3), 0);
    assert_eq!(align_index(4, 5, 3), 2);
    assert_eq!(align_index(2, 5, 3), 1);
    assert_eq!(align_index(3, 5, 3), 1);
    assert_eq!(align_index(7, 5, 3), 2);
    assert_eq!(align_index(3, 1, 9), 0);
    for len in [2usize, 4, 11] {
        for i in 0..len {
            assert_eq!(align_index(i, len, len), i);
        }
    }
}
