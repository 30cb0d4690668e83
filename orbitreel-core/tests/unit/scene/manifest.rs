use super::*;
use crate::frame::spec::{Origin, Rotation};
use crate::playback::driver::LoopMode;

const MINIMAL: &str = r#"{
    "datasets": [
        { "name": "ship", "shape": [2, 1, 2], "data": [0.0, 0.0, 1.0, 1.0] }
    ]
}"#;

#[test]
fn minimal_manifest_fills_defaults() {
    let m = SceneManifest::from_reader(MINIMAL.as_bytes()).unwrap();
    assert_eq!(m.display, FrameSpec::base());
    assert_eq!(m.fps, Fps::default());
    assert!(!m.elide_unchanged);
    assert!(m.playback.is_empty());
    let def = &m.datasets[0];
    assert_eq!(def.role, EntityRole::Ship);
    assert_eq!(def.trace, TraceStyle::Off);
    assert!(def.coloring.is_none());

    let ds = def.to_dataset().unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.position(1, 0).unwrap(), Position::new(1.0, 1.0));
}

#[test]
fn unknown_fields_are_rejected() {
    let bad = r#"{ "datasets": [], "dispaly": {} }"#;
    let err = SceneManifest::from_reader(bad.as_bytes()).unwrap_err();
    assert!(matches!(err, OrbitError::Serde(_)));
    assert!(err.to_string().contains("parse scene manifest JSON"));
}

#[test]
fn missing_file_is_a_validation_error() {
    let err = SceneManifest::from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, OrbitError::Validation(_)));
}

#[test]
fn full_manifest_parses() {
    let json = r##"{
        "system": { "m1": 1.0, "m2": 0.0123 },
        "display": { "origin": { "entity": { "dataset": "moon", "index": 0 } }, "scale": 2.0 },
        "datasets": [
            {
                "name": "moon", "role": "body", "shape": [3, 1, 2],
                "data": [1.0, 0.0, 0.0, 1.0, -1.0, 0.0],
                "labels": ["Moon"],
                "time": { "span": { "duration": 3.14 } }
            },
            {
                "name": "cloud", "shape": [3, 2, 2], "data": [0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5],
                "frame": { "rotation": "synodic" },
                "time": { "step": { "dt": 0.5 } },
                "coloring": { "status": { "colors": ["white", "#ff0000"], "default": "gray" } },
                "trace": { "mode": "accumulate", "stride": 2 },
                "floors": [{ "axis": "y", "min": 0.0 }],
                "status": { "shape": [1, 2], "codes": [0, 1] }
            }
        ],
        "highlights": [{ "name": "best", "dataset": "cloud", "index": [0, 1, 1] }],
        "markers": [{ "at": "l1", "label": "L1" }],
        "circles": [{ "radius": 0.5, "color": "blue" }],
        "lines": [{ "from": { "x": -1.0, "y": 0.0 }, "to": { "x": 1.0, "y": 0.0 } }],
        "texts": [{ "text": "Earth", "at": "m1", "color": "yellow" }],
        "spin": { "rate": 0.1 },
        "fps": { "num": 24, "den": 1 },
        "elide_unchanged": true,
        "playback": [
            { "to": 1.0, "duration": 2.0, "rate": "smooth" },
            { "from": 0.2, "to": 0.8, "duration": 1.0, "advance": "wait_for_input",
              "loop": { "mode": "ping_pong", "cycles": 3 } }
        ]
    }"##;
    let m = SceneManifest::from_reader(json.as_bytes()).unwrap();
    assert_eq!(m.system, Some(PrimaryPair::EARTH_MOON));
    assert_eq!(
        m.display.origin,
        Origin::Entity {
            dataset: "moon".to_owned(),
            index: 0
        }
    );
    assert_eq!(m.display.scale, 2.0);
    assert_eq!(m.datasets[1].frame.rotation, Rotation::Synodic);
    assert_eq!(m.datasets[1].trace, TraceStyle::Accumulate { stride: 2 });
    assert_eq!(m.datasets[1].floors.len(), 1);
    assert_eq!(m.markers[0].at, Anchor::Named(NamedPoint::L1));
    assert_eq!(m.markers[0].color, Color::WHITE);
    assert_eq!(m.circles[0].center, Anchor::Point(Position::ZERO));
    assert_eq!(m.texts[0].at, Anchor::Named(NamedPoint::M1));
    assert_eq!(m.fps, Fps::new(24, 1).unwrap());
    assert_eq!(m.playback[0].rate, Ease::Smooth);
    assert_eq!(m.playback[1].advance, AdvanceMode::WaitForInput);
    assert_eq!(m.playback[1].looping.unwrap().mode, LoopMode::PingPong);

    let status = m.datasets[1].status.as_ref().unwrap().to_track().unwrap();
    assert!(status.is_constant());

    let again = SceneManifest::from_reader(m.to_json().unwrap().as_bytes()).unwrap();
    assert_eq!(again, m);
}

#[test]
fn bad_dataset_shape_surfaces_on_conversion() {
    let def = DatasetDef {
        name: "bad".to_owned(),
        role: EntityRole::Ship,
        shape: [2, 1, 2],
        data: vec![0.0; 3],
        labels: None,
        time: None,
        frame: FrameSpec::base(),
        coloring: None,
        trace: TraceStyle::Off,
        floors: Vec::new(),
        status: None,
    };
    assert!(matches!(
        def.to_dataset().unwrap_err(),
        OrbitError::ShapeMismatch(_)
    ));
}

#[test]
fn huge_shapes_fail_without_panicking() {
    let dataset = r#"{
        "datasets": [{ "name": "a", "shape": [9223372036854775807, 3, 2], "data": [] }]
    }"#;
    let m = SceneManifest::from_reader(dataset.as_bytes()).unwrap();
    assert!(matches!(
        m.datasets[0].to_dataset(),
        Err(OrbitError::ShapeMismatch(_))
    ));
    assert!(matches!(
        crate::scene::builder::Scene::from_manifest(&m),
        Err(OrbitError::ShapeMismatch(_))
    ));

    let status = StatusDef {
        shape: [usize::MAX, 2],
        codes: vec![0, 1],
    };
    assert!(matches!(
        status.to_track(),
        Err(OrbitError::ShapeMismatch(_))
    ));
}

#[test]
fn named_anchors_need_a_system() {
    let sys = PrimaryPair::EARTH_MOON;
    assert_eq!(
        Anchor::Named(NamedPoint::Barycenter).resolve(Some(sys)).unwrap(),
        Position::ZERO
    );
    assert_eq!(
        Anchor::Named(NamedPoint::M2).resolve(Some(sys)).unwrap(),
        Position::new(1.0 - sys.mu(), 0.0)
    );
    let l1 = Anchor::Named(NamedPoint::L1).resolve(Some(sys)).unwrap();
    assert!(l1.x > 0.0 && l1.x < 1.0 - sys.mu());

    let p = Position::new(0.3, -0.2);
    assert_eq!(Anchor::from(p).resolve(None).unwrap(), p);
    assert!(matches!(
        Anchor::Named(NamedPoint::L1).resolve(None).unwrap_err(),
        OrbitError::FrameSpec(_)
    ));
}

#[test]
fn segment_defs_validate() {
    let ok = SegmentDef {
        from: Some(0.25),
        to: 0.75,
        duration: 1.5,
        rate: Ease::InOutCubic,
        advance: AdvanceMode::WaitForInput,
        looping: None,
    };
    let seg = ok.to_segment().unwrap();
    assert_eq!(seg.duration_secs(), 1.5);
    assert_eq!(seg.advance(), AdvanceMode::WaitForInput);

    let negative = SegmentDef {
        duration: -1.0,
        ..ok
    };
    assert!(negative.to_segment().is_err());

    let zero_cycles = SegmentDef {
        looping: Some(Looping {
            mode: LoopMode::Repeat,
            cycles: Some(0),
        }),
        ..ok
    };
    assert!(zero_cycles.to_segment().is_err());
}
