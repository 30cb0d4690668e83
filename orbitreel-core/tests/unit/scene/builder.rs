use super::*;
use crate::foundation::core::{Axis, Position};
use crate::playback::driver::{ManualClock, RunOutcome};
use crate::render::frontend::InMemoryFrontend;
use crate::render::state::EntityId;

fn approx(a: Position, b: Position) -> bool {
    a.distance(b) < 1e-9
}

fn moon() -> TrajectoryDataset {
    TrajectoryDataset::from_dense("moon", [3, 1, 2], &[1.0, 0.0, 0.0, 1.0, -1.0, 0.0]).unwrap()
}

/// Ship sitting 0.1 above the moon at every step, stored moon-relative.
fn ship_near_moon() -> TrajectoryDataset {
    TrajectoryDataset::from_dense("ship", [3, 1, 2], &[0.0, 0.1, 0.0, 0.1, 0.0, 0.1]).unwrap()
}

fn pos(frame: &RenderFrame, group: &str) -> Position {
    frame.get(&EntityId::new(group, 0)).unwrap().position
}

#[test]
fn datasets_are_moved_into_the_display_frame() {
    let scene = SceneBuilder::default()
        .dataset(TrackedDataset::new(moon()))
        .dataset_in(
            TrackedDataset::new(ship_near_moon()),
            FrameSpec::centered_on("moon", 0),
            Vec::new(),
        )
        .build()
        .unwrap();
    for (scrub, want) in [(0.0, (1.0, 0.1)), (0.5, (0.0, 1.1)), (1.0, (-1.0, 0.1))] {
        let frame = scene.render(scrub).unwrap();
        assert!(approx(pos(&frame, "ship"), Position::new(want.0, want.1)));
    }
}

#[test]
fn display_can_follow_a_reference() {
    let scene = SceneBuilder::new(FrameSpec::centered_on("moon", 0))
        .dataset(TrackedDataset::new(moon()))
        .build()
        .unwrap();
    for scrub in [0.0, 0.5, 1.0] {
        assert!(approx(pos(&scene.render(scrub).unwrap(), "moon"), Position::ZERO));
    }
}

#[test]
fn references_may_live_in_other_frames() {
    // Moon stored relative to a fixed point at (1, 0); ship stored relative to the moon.
    let moon_offset =
        TrajectoryDataset::from_dense("moon", [3, 1, 2], &[0.0, 0.0, -1.0, 1.0, -2.0, 0.0])
            .unwrap();
    let scene = SceneBuilder::default()
        .dataset_in(
            TrackedDataset::new(ship_near_moon()),
            FrameSpec::centered_on("moon", 0),
            Vec::new(),
        )
        .dataset_in(
            TrackedDataset::new(moon_offset),
            FrameSpec::fixed(Position::new(1.0, 0.0)),
            Vec::new(),
        )
        .build()
        .unwrap();
    for (scrub, want) in [(0.0, (1.0, 0.1)), (0.5, (0.0, 1.1)), (1.0, (-1.0, 0.1))] {
        let frame = scene.render(scrub).unwrap();
        assert!(approx(pos(&frame, "moon"), Position::new(want.0, want.1 - 0.1)));
        assert!(approx(pos(&frame, "ship"), Position::new(want.0, want.1)));
    }
}

#[test]
fn circular_references_are_rejected() {
    let err = SceneBuilder::default()
        .dataset_in(
            TrackedDataset::new(moon()),
            FrameSpec::centered_on("ship", 0),
            Vec::new(),
        )
        .dataset_in(
            TrackedDataset::new(ship_near_moon()),
            FrameSpec::centered_on("moon", 0),
            Vec::new(),
        )
        .build()
        .unwrap_err();
    assert!(matches!(err, OrbitError::FrameSpec(_)));
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn floors_clamp_after_the_move() {
    let below = TrajectoryDataset::from_dense("low", [1, 2, 2], &[0.0, -2.0, 0.0, 3.0]).unwrap();
    let scene = SceneBuilder::default()
        .dataset_in(
            TrackedDataset::new(below),
            FrameSpec::base(),
            vec![AxisFloor {
                axis: Axis::Y,
                min: 0.0,
            }],
        )
        .build()
        .unwrap();
    let frame = scene.render(0.0).unwrap();
    assert_eq!(frame.get(&EntityId::new("low", 0)).unwrap().position.y, 0.0);
    assert_eq!(frame.get(&EntityId::new("low", 1)).unwrap().position.y, 3.0);
}

#[test]
fn decorations_follow_a_fixed_display_frame() {
    let display = FrameSpec::fixed(Position::new(1.0, 0.0)).with_scale(2.0);
    let scene = SceneBuilder::new(display)
        .marker(Position::new(2.0, 0.0), Color::RED, Some("here".to_owned()))
        .circle(Position::new(1.0, 1.0), 0.5, Color::BLUE)
        .build()
        .unwrap();
    let statics = scene.state().statics().unwrap();
    assert_eq!(statics.len(), 2);
    match &statics[0] {
        StaticPrimitive::Marker { at, label, .. } => {
            assert!(approx(*at, Position::new(2.0, 0.0)));
            assert_eq!(label.as_deref(), Some("here"));
        }
        other => panic!("unexpected primitive {other:?}"),
    }
    match &statics[1] {
        StaticPrimitive::Circle { center, radius, .. } => {
            assert!(approx(*center, Position::new(0.0, 2.0)));
            assert_eq!(*radius, 1.0);
        }
        other => panic!("unexpected primitive {other:?}"),
    }
}

#[test]
fn decorations_reject_moving_display_and_bad_radius() {
    let moving = SceneBuilder::new(FrameSpec::centered_on("moon", 0))
        .dataset(TrackedDataset::new(moon()))
        .marker(Position::ZERO, Color::WHITE, None)
        .build()
        .unwrap_err();
    assert!(matches!(moving, OrbitError::FrameSpec(_)));

    let radius = SceneBuilder::default()
        .circle(Position::ZERO, 0.0, Color::WHITE)
        .build()
        .unwrap_err();
    assert!(matches!(radius, OrbitError::Validation(_)));
}

#[test]
fn named_anchors_resolve_against_the_system() {
    let scene = SceneBuilder::new(FrameSpec::synodic())
        .system(PrimaryPair::EARTH_MOON)
        .marker(Anchor::Named(crate::scene::manifest::NamedPoint::M2), Color::WHITE, None)
        .build()
        .unwrap();
    let statics = scene.state().statics().unwrap();
    let StaticPrimitive::Marker { at, .. } = &statics[0] else {
        panic!("expected marker");
    };
    assert!(approx(*at, PrimaryPair::EARTH_MOON.position(crate::frame::spec::Primary::M2)));
}

#[test]
fn invalid_playback_fails_the_build() {
    let err = SceneBuilder::default()
        .segment(SegmentDef {
            from: None,
            to: 1.5,
            duration: 1.0,
            rate: Default::default(),
            advance: Default::default(),
            looping: None,
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, OrbitError::Validation(_)));
}

#[test]
fn manifest_scene_plays_its_script() {
    let json = r#"{
        "datasets": [
            { "name": "bodies", "role": "body", "shape": [4, 2, 2],
              "data": [0, 0, 1, 0, 0, 0, 1, 1, 0, 0, 0, 1, 0, 0, -1, 0] }
        ],
        "fps": { "num": 10, "den": 1 },
        "playback": [ { "to": 1.0, "duration": 0.3 } ]
    }"#;
    let manifest = SceneManifest::from_reader(json.as_bytes()).unwrap();
    let scene = Scene::from_manifest(&manifest).unwrap();
    assert_eq!(scene.playback().len(), 1);

    let first = scene.render(0.0).unwrap();
    assert_eq!(first.get(&EntityId::new("bodies", 0)).unwrap().color, Color::BLUE);
    assert_eq!(first.get(&EntityId::new("bodies", 1)).unwrap().color, Color::GRAY);

    let mut driver = scene
        .into_driver(InMemoryFrontend::new(), ManualClock::new())
        .unwrap();
    assert_eq!(driver.queued(), 1);
    assert_eq!(driver.run_until_idle().unwrap(), RunOutcome::Idle);
    let (frontend, stats) = driver.finish().unwrap();
    assert!(frontend.ended());
    assert_eq!(stats.segments_completed, 1);
    let last = frontend.last().unwrap();
    assert_eq!(last.frame.scrub, 1.0);
    assert_eq!(pos(&last.frame, "bodies"), Position::ZERO);
}
