//! Orbitreel plays back precomputed three-body trajectories for presentations.
//!
//! Datasets of `[steps, entities, dims]` positions are moved into a common display frame once at
//! load time, then a single scrub value in `[0, 1]` drives every dataset by shared progress:
//!
//! - Describe or load a [`Scene`] (builder or JSON [`SceneManifest`])
//! - Render single scrub values into [`RenderFrame`]s
//! - Drive scripted playback through a [`PlaybackDriver`] into a [`Frontend`]
#![forbid(unsafe_code)]

/// Trajectory data and per-step side tracks.
pub mod dataset;
mod foundation;
/// Reference frames and the transforms between them.
pub mod frame;
/// Scrub rule, rate functions and the tick-driven playback loop.
pub mod playback;
/// Per-frame render state, traces and presentation frontends.
pub mod render;
/// Scene assembly from code or JSON manifests.
pub mod scene;

pub use crate::foundation::core::{Affine, Axis, Color, Dims, Fps, Point, Position, Vec2};
pub use crate::foundation::error::{OrbitError, OrbitResult};

pub use crate::dataset::tracks::{EntityStatus, IndexTrack, StatusTrack};
pub use crate::dataset::trajectory::{
    EntityRole, Snapshot, TimeBase, Trajectory, TrajectoryDataset,
};
pub use crate::frame::spec::{FrameSpec, Origin, Primary, PrimaryPair, Rotation};
pub use crate::frame::transform::{
    AxisFloor, FrameTransform, NoReferences, ReferenceLookup, transform,
};
pub use crate::playback::driver::{
    AdvanceMode, Clock, DriverOpts, LoopMode, Looping, ManualClock, PlaybackDriver,
    PlaybackHandle, PlaybackStats, RunOutcome, Segment, SystemClock,
};
pub use crate::playback::ease::{Ease, RateFunction};
pub use crate::playback::scrub::{ScrubBounds, ScrubState, align_index, index_for};
pub use crate::render::fingerprint::{FrameFingerprint, fingerprint_frame};
pub use crate::render::frontend::{
    Frontend, FrontendConfig, InMemoryFrontend, JsonLinesFrontend, StaticPrimitive, Tick,
};
pub use crate::render::state::{
    Coloring, EntityId, EntityRenderState, Highlight, RenderFrame, RenderedEntity, StatusPalette,
    TrackedDataset, ViewSpin, ViewTransform,
};
pub use crate::render::trace::{TraceDelta, TraceStyle};
pub use crate::scene::builder::{Scene, SceneBuilder};
pub use crate::scene::manifest::{Anchor, NamedPoint, SceneManifest, SegmentDef};
