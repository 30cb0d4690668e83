use super::*;

#[test]
fn endpoints_are_stable() {
    for ease in Ease::ALL {
        assert!(ease.apply(0.0).abs() < 1e-12, "{ease:?}");
        assert!((ease.apply(1.0) - 1.0).abs() < 1e-12, "{ease:?}");
    }
}

#[test]
fn monotonic_spot_check() {
    for ease in Ease::ALL {
        let a = ease.apply(0.25);
        let b = ease.apply(0.5);
        let c = ease.apply(0.75);
        assert!(a < b, "{ease:?}");
        assert!(b < c, "{ease:?}");
    }
}

#[test]
fn smooth_is_symmetric_and_flat_at_ends() {
    let s = Ease::Smooth;
    assert!((s.apply(0.5) - 0.5).abs() < 1e-12);
    assert!((s.apply(0.2) + s.apply(0.8) - 1.0).abs() < 1e-12);
    assert!(s.apply(0.05) < 0.05);
}

#[test]
fn closures_are_rate_functions() {
    let half = |t: f64| t * 0.5;
    assert_eq!(half.progress(1.0), 0.5);
    let boxed: Box<dyn RateFunction> = Box::new(Ease::InQuad);
    assert_eq!(boxed.progress(0.5), 0.25);
}

#[test]
fn names_are_snake_case_in_json() {
    let e: Ease = serde_json::from_str("\"in_out_cubic\"").unwrap();
    assert_eq!(e, Ease::InOutCubic);
    assert_eq!(serde_json::to_string(&Ease::Smooth).unwrap(), "\"smooth\"");
}
