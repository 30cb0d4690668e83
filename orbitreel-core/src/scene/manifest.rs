use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    dataset::tracks::StatusTrack,
    dataset::trajectory::{EntityRole, TimeBase, TrajectoryDataset},
    foundation::core::{Color, Fps, Position},
    foundation::error::{OrbitError, OrbitResult},
    frame::spec::{FrameSpec, PrimaryPair},
    frame::transform::AxisFloor,
    playback::driver::{AdvanceMode, Looping, Segment},
    playback::ease::Ease,
    render::state::{Coloring, Highlight, ViewSpin},
    render::trace::TraceStyle,
};

/// JSON document describing a whole scene: data, styling, decorations and playback script.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneManifest {
    /// Primary masses, needed for synodic frames, primary origins and named anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<PrimaryPair>,
    /// Frame everything is shown in.
    #[serde(default)]
    pub display: FrameSpec,
    pub datasets: Vec<DatasetDef>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
    #[serde(default)]
    pub markers: Vec<MarkerDef>,
    #[serde(default)]
    pub circles: Vec<CircleDef>,
    #[serde(default)]
    pub lines: Vec<LineDef>,
    #[serde(default)]
    pub texts: Vec<TextDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin: Option<ViewSpin>,
    #[serde(default)]
    pub fps: Fps,
    #[serde(default)]
    pub elide_unchanged: bool,
    #[serde(default)]
    pub playback: Vec<SegmentDef>,
}

impl SceneManifest {
    /// Parse a manifest from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> OrbitResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| OrbitError::serde(format!("parse scene manifest JSON: {e}")))
    }

    /// Parse a manifest from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> OrbitResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            OrbitError::validation(format!("open scene manifest '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> OrbitResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Dense status codes, `[steps, entities]` with `steps` 1 or `T`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatusDef {
    pub shape: [usize; 2],
    pub codes: Vec<i64>,
}

impl StatusDef {
    pub fn to_track(&self) -> OrbitResult<StatusTrack> {
        let [steps, entities] = self.shape;
        StatusTrack::new(steps, entities, self.codes.clone())
    }
}

/// One dataset in the dense external layout.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetDef {
    pub name: String,
    #[serde(default)]
    pub role: EntityRole,
    /// `[steps, entities, dims]`.
    pub shape: [usize; 3],
    /// Row-major values, `steps * entities * dims` of them.
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeBase>,
    /// Frame the data is stored in.
    #[serde(default)]
    pub frame: FrameSpec,
    /// Defaults to the role's coloring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coloring: Option<Coloring>,
    #[serde(default)]
    pub trace: TraceStyle,
    /// Applied after moving into the display frame.
    #[serde(default)]
    pub floors: Vec<AxisFloor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusDef>,
}

impl DatasetDef {
    /// Raw dataset in its native frame.
    pub fn to_dataset(&self) -> OrbitResult<TrajectoryDataset> {
        let mut ds =
            TrajectoryDataset::from_dense(&self.name, self.shape, &self.data)?.with_role(self.role);
        if let Some(labels) = &self.labels {
            ds = ds.with_labels(labels.clone())?;
        }
        if let Some(time) = self.time {
            ds = ds.with_time_base(time)?;
        }
        Ok(ds)
    }
}

/// A well-known point of the configured system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedPoint {
    /// First Lagrange point.
    L1,
    /// Larger primary.
    M1,
    /// Smaller primary.
    M2,
    /// Barycenter.
    Barycenter,
}

/// Location of a decoration in base coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Anchor {
    Named(NamedPoint),
    Point(Position),
}

impl Default for Anchor {
    fn default() -> Self {
        Self::Point(Position::ZERO)
    }
}

impl From<Position> for Anchor {
    fn from(p: Position) -> Self {
        Self::Point(p)
    }
}

impl Anchor {
    /// Base-coordinate position; named points need the system masses.
    pub fn resolve(self, system: Option<PrimaryPair>) -> OrbitResult<Position> {
        let named = match self {
            Self::Point(p) => return Ok(p),
            Self::Named(n) => n,
        };
        let system = system.ok_or_else(|| {
            OrbitError::frame_spec(format!("anchor {named:?} requires a primary pair config"))
        })?;
        Ok(match named {
            NamedPoint::L1 => Position::new(system.l1_x()?, 0.0),
            NamedPoint::M1 => system.position(crate::frame::spec::Primary::M1),
            NamedPoint::M2 => system.position(crate::frame::spec::Primary::M2),
            NamedPoint::Barycenter => Position::ZERO,
        })
    }
}

fn white() -> Color {
    Color::WHITE
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarkerDef {
    pub at: Anchor,
    #[serde(default = "white")]
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Circle with a radius in base units.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CircleDef {
    #[serde(default)]
    pub center: Anchor,
    pub radius: f64,
    #[serde(default = "white")]
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineDef {
    pub from: Anchor,
    pub to: Anchor,
    #[serde(default = "white")]
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextDef {
    pub text: String,
    pub at: Anchor,
    #[serde(default = "white")]
    pub color: Color,
}

/// One step of the playback script.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentDef {
    /// Jump here first; omitted means "from wherever playback is".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    pub to: f64,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub rate: Ease,
    #[serde(default)]
    pub advance: AdvanceMode,
    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looping: Option<Looping>,
}

impl SegmentDef {
    /// Runtime segment.
    pub fn to_segment(&self) -> OrbitResult<Segment> {
        let mut segment = match self.from {
            Some(from) => Segment::between(
                crate::playback::scrub::ScrubBounds::new(from, self.to)?,
                self.duration,
            )?,
            None => Segment::to(self.to, self.duration)?,
        };
        segment = segment.with_rate(self.rate).with_advance(self.advance);
        if let Some(looping) = self.looping {
            segment = segment.looping(looping)?;
        }
        Ok(segment)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/manifest.rs"]
mod tests;
