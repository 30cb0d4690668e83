use super::*;
use crate::render::trace::TraceBook;
use std::f64::consts::FRAC_PI_2;

/// Entity `e` sits at `(step, e)` at every step.
fn grid(name: &str, steps: usize, n: usize) -> TrajectoryDataset {
    let mut data = Vec::with_capacity(steps * n * 2);
    for s in 0..steps {
        for e in 0..n {
            data.push(s as f64);
            data.push(e as f64);
        }
    }
    TrajectoryDataset::from_dense(name, [steps, n, 2], &data).unwrap()
}

fn step_of(frame: &RenderFrame, group: &str, index: usize) -> f64 {
    frame.get(&EntityId::new(group, index)).unwrap().position.x
}

#[test]
fn three_step_scenario() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("a", 3, 1))).unwrap();
    assert_eq!(step_of(&state.render(0.0).unwrap(), "a", 0), 0.0);
    assert_eq!(step_of(&state.render(0.5).unwrap(), "a", 0), 1.0);
    assert_eq!(step_of(&state.render(1.0).unwrap(), "a", 0), 2.0);
}

#[test]
fn datasets_share_progress() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("short", 5, 1))).unwrap();
    state.add_dataset(TrackedDataset::new(grid("long", 10, 2))).unwrap();
    let frame = state.render(0.5).unwrap();
    assert_eq!(frame.len(), 3);
    assert_eq!(step_of(&frame, "short", 0), 2.0);
    assert_eq!(step_of(&frame, "long", 1), 4.0);
    assert_eq!(frame.get(&EntityId::new("long", 1)).unwrap().position.y, 1.0);
}

#[test]
fn status_palette_and_default_color() {
    let track = StatusTrack::constant(vec![0, 1, 7]).unwrap();
    let layer = TrackedDataset::new(grid("ships", 4, 3))
        .with_coloring(Coloring::Status(StatusPalette::default()))
        .with_status(track);
    let mut state = EntityRenderState::new();
    state.add_dataset(layer).unwrap();

    let frame = state.render(0.3).unwrap();
    let e0 = frame.get(&EntityId::new("ships", 0)).unwrap();
    let e1 = frame.get(&EntityId::new("ships", 1)).unwrap();
    let e2 = frame.get(&EntityId::new("ships", 2)).unwrap();
    assert_eq!((e0.color, e0.status), (Color::WHITE, Some(EntityStatus::Nominal)));
    assert_eq!((e1.color, e1.status), (Color::RED, Some(EntityStatus::Returned)));
    assert_eq!((e2.color, e2.status), (Color::GRAY, None));
}

#[test]
fn palette_lookup_reports_unknown_codes() {
    let p = StatusPalette::default();
    assert_eq!(p.lookup(3).unwrap(), Color::YELLOW);
    assert!(matches!(
        p.lookup(-2),
        Err(OrbitError::UnknownStatusCode { code: -2, palette_len: 4 })
    ));
    assert_eq!(p.color_for(99), Color::GRAY);
}

#[test]
fn per_step_status_changes_color() {
    let track = StatusTrack::new(2, 1, vec![0, 3]).unwrap();
    let layer = TrackedDataset::new(grid("ships", 2, 1))
        .with_coloring(Coloring::Status(StatusPalette::default()))
        .with_status(track);
    let mut state = EntityRenderState::new();
    state.add_dataset(layer).unwrap();
    assert_eq!(state.render(0.0).unwrap().entities[0].color, Color::WHITE);
    assert_eq!(state.render(1.0).unwrap().entities[0].color, Color::YELLOW);
}

#[test]
fn body_colors_cycle_and_meta_overrides() {
    let ds = grid("bodies", 2, 6)
        .with_role(EntityRole::Body)
        .with_entity_color(1, Color::LIME_GREEN)
        .unwrap();
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(ds)).unwrap();
    let frame = state.render(0.0).unwrap();
    let colors: Vec<Color> = frame.entities.iter().map(|e| e.color).collect();
    assert_eq!(
        colors,
        vec![
            Color::BLUE,
            Color::LIME_GREEN,
            Color::RED,
            Color::YELLOW,
            Color::PURPLE,
            Color::BLUE
        ]
    );
    assert!(frame.entities.iter().all(|e| e.role == EntityRole::Body));
}

#[test]
fn highlight_follows_index_track() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("ships", 3, 4))).unwrap();
    state
        .add_highlight(Highlight::new("best", "ships", IndexTrack::PerStep(vec![3, 1, 2])))
        .unwrap();

    let frame = state.render(0.5).unwrap();
    let best = frame.get(&EntityId::new("best", 0)).unwrap();
    assert_eq!(best.position, Position::new(1.0, 1.0));
    assert_eq!(best.color, Color::LIME_GREEN);
    assert_eq!(frame.len(), 5);

    let trail = state.trace_at(&EntityId::new("best", 0), 1.0).unwrap();
    assert_eq!(
        trail,
        vec![Position::new(0.0, 3.0), Position::new(1.0, 1.0), Position::new(2.0, 2.0)]
    );
}

#[test]
fn registration_errors() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("a", 2, 1))).unwrap();
    assert!(matches!(
        state.add_dataset(TrackedDataset::new(grid("a", 2, 1))),
        Err(OrbitError::Validation(_))
    ));
    assert!(matches!(
        state.add_dataset(
            TrackedDataset::new(grid("b", 2, 1))
                .with_coloring(Coloring::Status(StatusPalette::default()))
        ),
        Err(OrbitError::Validation(_))
    ));
    assert!(matches!(
        state.add_dataset(
            TrackedDataset::new(grid("c", 2, 2)).with_status(StatusTrack::constant(vec![0]).unwrap())
        ),
        Err(OrbitError::ShapeMismatch(_))
    ));
    assert!(matches!(
        state.add_highlight(Highlight::new("h", "missing", IndexTrack::Constant(0))),
        Err(OrbitError::Validation(_))
    ));
    assert!(matches!(
        state.add_highlight(Highlight::new("h", "a", IndexTrack::Constant(5))),
        Err(OrbitError::IndexOutOfRange { .. })
    ));
}

#[test]
fn trace_replay_matches_direct_scrub() {
    let build = || {
        let mut state = EntityRenderState::new();
        state
            .add_dataset(
                TrackedDataset::new(grid("bodies", 101, 2)).with_trace(TraceStyle::accumulate()),
            )
            .unwrap();
        state
    };
    let replay = |path: &[f64]| {
        let state = build();
        let mut book = TraceBook::new();
        let mut line = Vec::new();
        for &s in path {
            for d in state.trace_deltas(s, &mut book).unwrap() {
                if d.id == EntityId::new("bodies", 1) {
                    d.apply_to(&mut line);
                }
            }
        }
        line
    };

    let direct = replay(&[0.0, 0.5]);
    let round = replay(&[0.0, 1.0, 0.5]);
    assert_eq!(direct, round);
    assert_eq!(direct.len(), 51);
    assert_eq!(
        direct,
        build().trace_at(&EntityId::new("bodies", 1), 0.5).unwrap()
    );
}

#[test]
fn unchanged_step_sends_no_delta() {
    let mut state = EntityRenderState::new();
    state
        .add_dataset(TrackedDataset::new(grid("a", 3, 1)).with_trace(TraceStyle::accumulate()))
        .unwrap();
    let mut book = TraceBook::new();
    assert_eq!(state.trace_deltas(0.5, &mut book).unwrap().len(), 1);
    assert!(state.trace_deltas(0.6, &mut book).unwrap().is_empty());
    let d = state.trace_deltas(1.0, &mut book).unwrap();
    assert_eq!((d[0].keep, d[0].appended.len()), (2, 1));
    assert_eq!(d[0].color, Color::WHITE.with_opacity(TRACE_OPACITY));
}

#[test]
fn trace_delta_color_follows_current_status() {
    let layer = TrackedDataset::new(grid("ships", 3, 1))
        .with_coloring(Coloring::Status(StatusPalette::default()))
        .with_status(StatusTrack::new(3, 1, vec![0, 0, 3]).unwrap())
        .with_trace(TraceStyle::accumulate());
    let mut state = EntityRenderState::new();
    state.add_dataset(layer).unwrap();
    let mut book = TraceBook::new();
    let d = state.trace_deltas(0.5, &mut book).unwrap();
    assert_eq!(d[0].color, Color::WHITE.with_opacity(TRACE_OPACITY));
    let d = state.trace_deltas(1.0, &mut book).unwrap();
    assert_eq!((d[0].keep, d[0].appended.len()), (2, 1));
    assert_eq!(d[0].color, Color::YELLOW.with_opacity(TRACE_OPACITY));
}

#[test]
fn full_traces_become_static_paths() {
    let mut state = EntityRenderState::new();
    state
        .add_dataset(TrackedDataset::new(grid("orbit", 5, 1)).with_trace(TraceStyle::Full { stride: 2 }))
        .unwrap();
    state.add_static(StaticPrimitive::Marker {
        at: Position::ZERO,
        color: Color::WHITE,
        label: Some("L1".into()),
    });
    let statics = state.statics().unwrap();
    assert_eq!(statics.len(), 2);
    let StaticPrimitive::Path { points, .. } = &statics[1] else {
        panic!("expected a path, got {:?}", statics[1]);
    };
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    assert_eq!(xs, vec![0.0, 2.0, 4.0]);

    let mut book = TraceBook::new();
    assert!(state.trace_deltas(1.0, &mut book).unwrap().is_empty());
}

#[test]
fn spin_rotates_view_not_entities() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("a", 2, 1))).unwrap();
    state
        .set_spin(Some(ViewSpin {
            rate: FRAC_PI_2,
            pivot: Position::ZERO,
        }))
        .unwrap();
    let still = state.render(0.0).unwrap();
    let spun = state.render_at(0.0, 1.0).unwrap();
    assert_eq!(still.view, ViewTransform::IDENTITY);
    assert!((spun.view.rotation_rad - FRAC_PI_2).abs() < 1e-12);
    assert_eq!(still.entities, spun.entities);

    let p = spun.view.to_affine() * kurbo::Point::new(1.0, 0.0);
    assert!((p - kurbo::Point::new(0.0, 1.0)).hypot() < 1e-12);
    assert!(state.set_spin(Some(ViewSpin { rate: f64::NAN, pivot: Position::ZERO })).is_err());
}

#[test]
fn render_is_repeatable() {
    let mut state = EntityRenderState::new();
    state.add_dataset(TrackedDataset::new(grid("a", 7, 3))).unwrap();
    assert_eq!(state.render(0.42).unwrap(), state.render(0.42).unwrap());
}
