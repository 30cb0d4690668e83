use std::path::Path;

use crate::{
    dataset::trajectory::TrajectoryDataset,
    foundation::core::{Color, Fps},
    foundation::error::{OrbitError, OrbitResult},
    frame::spec::{FrameSpec, Origin, PrimaryPair},
    frame::transform::{AxisFloor, FrameTransform, ReferenceLookup},
    playback::driver::{Clock, DriverOpts, PlaybackDriver},
    render::frontend::{Frontend, StaticPrimitive},
    render::state::{
        Coloring, EntityRenderState, Highlight, RenderFrame, TrackedDataset, ViewSpin,
    },
    scene::manifest::{Anchor, SceneManifest, SegmentDef},
};

struct PendingDataset {
    tracked: TrackedDataset,
    native: FrameSpec,
    floors: Vec<AxisFloor>,
}

enum Decoration {
    Marker {
        at: Anchor,
        color: Color,
        label: Option<String>,
    },
    Circle {
        center: Anchor,
        radius: f64,
        color: Color,
    },
    Line {
        from: Anchor,
        to: Anchor,
        color: Color,
    },
    Text {
        text: String,
        at: Anchor,
        color: Color,
    },
}

/// Builder for [`Scene`].
///
/// Datasets are added in their native frame; [`SceneBuilder::build`] moves every one of them into
/// the display frame before anything is rendered.
pub struct SceneBuilder {
    display: FrameSpec,
    system: Option<PrimaryPair>,
    datasets: Vec<PendingDataset>,
    highlights: Vec<Highlight>,
    decorations: Vec<Decoration>,
    spin: Option<ViewSpin>,
    opts: DriverOpts,
    playback: Vec<SegmentDef>,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self::new(FrameSpec::base())
    }
}

impl SceneBuilder {
    /// Create a builder showing everything in `display`.
    pub fn new(display: FrameSpec) -> Self {
        Self {
            display,
            system: None,
            datasets: Vec::new(),
            highlights: Vec::new(),
            decorations: Vec::new(),
            spin: None,
            opts: DriverOpts::default(),
            playback: Vec::new(),
        }
    }

    /// Set the primary masses.
    pub fn system(mut self, system: PrimaryPair) -> Self {
        self.system = Some(system);
        self
    }

    /// Add a dataset stored in base coordinates.
    pub fn dataset(self, tracked: TrackedDataset) -> Self {
        self.dataset_in(tracked, FrameSpec::base(), Vec::new())
    }

    /// Add a dataset stored in `native`, clamped by `floors` once in the display frame.
    pub fn dataset_in(
        mut self,
        tracked: TrackedDataset,
        native: FrameSpec,
        floors: Vec<AxisFloor>,
    ) -> Self {
        self.datasets.push(PendingDataset {
            tracked,
            native,
            floors,
        });
        self
    }

    pub fn highlight(mut self, highlight: Highlight) -> Self {
        self.highlights.push(highlight);
        self
    }

    /// Labelled dot at a base-coordinate anchor.
    pub fn marker(mut self, at: impl Into<Anchor>, color: Color, label: Option<String>) -> Self {
        self.decorations.push(Decoration::Marker {
            at: at.into(),
            color,
            label,
        });
        self
    }

    /// Circle with a radius in base units.
    pub fn circle(mut self, center: impl Into<Anchor>, radius: f64, color: Color) -> Self {
        self.decorations.push(Decoration::Circle {
            center: center.into(),
            radius,
            color,
        });
        self
    }

    pub fn line(mut self, from: impl Into<Anchor>, to: impl Into<Anchor>, color: Color) -> Self {
        self.decorations.push(Decoration::Line {
            from: from.into(),
            to: to.into(),
            color,
        });
        self
    }

    pub fn text(mut self, text: impl Into<String>, at: impl Into<Anchor>, color: Color) -> Self {
        self.decorations.push(Decoration::Text {
            text: text.into(),
            at: at.into(),
            color,
        });
        self
    }

    pub fn spin(mut self, spin: ViewSpin) -> Self {
        self.spin = Some(spin);
        self
    }

    pub fn fps(mut self, fps: Fps) -> Self {
        self.opts.fps = fps;
        self
    }

    pub fn elide_unchanged(mut self, on: bool) -> Self {
        self.opts.elide_unchanged = on;
        self
    }

    /// Append a playback segment.
    pub fn segment(mut self, segment: SegmentDef) -> Self {
        self.playback.push(segment);
        self
    }

    /// Transform, validate and register everything.
    #[tracing::instrument(skip_all, fields(datasets = self.datasets.len()))]
    pub fn build(self) -> OrbitResult<Scene> {
        if let Some(system) = self.system {
            system.validate()?;
        }
        self.display.validate()?;
        Fps::new(self.opts.fps.num, self.opts.fps.den)?;
        for def in &self.playback {
            def.to_segment()?;
        }

        let raw = self.base_datasets()?;
        let mut state = EntityRenderState::new();
        for pending in self.datasets {
            let mut transform = FrameTransform::new(pending.native, self.display.clone())?;
            if let Some(system) = self.system {
                transform = transform.with_system(system)?;
            }
            for floor in pending.floors {
                transform = transform.with_floor(floor.axis, floor.min)?;
            }
            let tracked = pending
                .tracked
                .map_dataset(|ds| transform.apply(ds, &raw))?;
            state.add_dataset(tracked)?;
        }
        for h in self.highlights {
            state.add_highlight(h)?;
        }
        state.set_spin(self.spin)?;

        let mut statics = FrameTransform::new(FrameSpec::base(), self.display.clone())?;
        if let Some(system) = self.system {
            statics = statics.with_system(system)?;
        }
        for decoration in self.decorations {
            state.add_static(map_decoration(decoration, &statics, self.system, &self.display)?);
        }

        tracing::info!(
            entities = state.entity_count(),
            segments = self.playback.len(),
            "scene built"
        );
        Ok(Scene {
            state,
            display: self.display,
            system: self.system,
            opts: self.opts,
            playback: self.playback,
        })
    }
}

impl SceneBuilder {
    /// Every dataset in base coordinates, the frame entity origins are read in.
    ///
    /// Datasets whose native frame follows another dataset are converted after that dataset.
    fn base_datasets(&self) -> OrbitResult<Vec<TrajectoryDataset>> {
        let base = FrameSpec::base();
        let mut done: Vec<Option<TrajectoryDataset>> = vec![None; self.datasets.len()];
        loop {
            let mut progressed = false;
            for (i, pending) in self.datasets.iter().enumerate() {
                if done[i].is_some() || !self.origin_ready(&pending.native, &done) {
                    continue;
                }
                let ds = pending.tracked.dataset();
                let converted = if pending.native == base {
                    ds.clone()
                } else {
                    let mut to_base = FrameTransform::new(pending.native.clone(), base.clone())?;
                    if let Some(system) = self.system {
                        to_base = to_base.with_system(system)?;
                    }
                    to_base.apply(ds, &Converted(&done))?
                };
                tracing::debug!(dataset = %ds.name(), "dataset in base coordinates");
                done[i] = Some(converted);
                progressed = true;
            }
            if done.iter().all(Option::is_some) {
                return Ok(done.into_iter().flatten().collect());
            }
            if !progressed {
                let stuck: Vec<&str> = self
                    .datasets
                    .iter()
                    .zip(&done)
                    .filter(|(_, d)| d.is_none())
                    .map(|(p, _)| p.tracked.dataset().name())
                    .collect();
                return Err(OrbitError::frame_spec(format!(
                    "datasets {stuck:?} reference each other in a cycle"
                )));
            }
        }
    }

    /// Unknown references count as ready so the transform reports them.
    fn origin_ready(&self, native: &FrameSpec, done: &[Option<TrajectoryDataset>]) -> bool {
        let Origin::Entity { dataset, .. } = &native.origin else {
            return true;
        };
        match self
            .datasets
            .iter()
            .position(|p| p.tracked.dataset().name() == dataset)
        {
            Some(i) => done[i].is_some(),
            None => true,
        }
    }
}

/// Lookup over the datasets converted so far.
struct Converted<'a>(&'a [Option<TrajectoryDataset>]);

impl ReferenceLookup for Converted<'_> {
    fn reference(&self, name: &str) -> Option<&TrajectoryDataset> {
        self.0.iter().flatten().find(|d| d.name() == name)
    }
}

fn map_decoration(
    decoration: Decoration,
    statics: &FrameTransform,
    system: Option<PrimaryPair>,
    display: &FrameSpec,
) -> OrbitResult<StaticPrimitive> {
    let place = |a: Anchor| statics.apply_static(a.resolve(system)?);
    Ok(match decoration {
        Decoration::Marker { at, color, label } => StaticPrimitive::Marker {
            at: place(at)?,
            color,
            label,
        },
        Decoration::Circle {
            center,
            radius,
            color,
        } => {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(OrbitError::validation(format!(
                    "circle radius must be finite and > 0, got {radius}"
                )));
            }
            StaticPrimitive::Circle {
                center: place(center)?,
                radius: radius * display.scale,
                color,
            }
        }
        Decoration::Line { from, to, color } => StaticPrimitive::Line {
            from: place(from)?,
            to: place(to)?,
            color,
        },
        Decoration::Text { text, at, color } => StaticPrimitive::Label {
            text,
            at: place(at)?,
            color,
        },
    })
}

/// A built scene: display-frame datasets, styling, decorations and the playback script.
#[derive(Clone, Debug)]
pub struct Scene {
    state: EntityRenderState,
    display: FrameSpec,
    system: Option<PrimaryPair>,
    opts: DriverOpts,
    playback: Vec<SegmentDef>,
}

impl Scene {
    /// Build from a parsed manifest.
    pub fn from_manifest(manifest: &SceneManifest) -> OrbitResult<Self> {
        let mut b = SceneBuilder::new(manifest.display.clone())
            .fps(manifest.fps)
            .elide_unchanged(manifest.elide_unchanged);
        if let Some(system) = manifest.system {
            b = b.system(system);
        }
        for def in &manifest.datasets {
            let ds = def.to_dataset()?;
            let coloring = def
                .coloring
                .clone()
                .unwrap_or_else(|| Coloring::for_role(ds.role()));
            let mut tracked = TrackedDataset::new(ds)
                .with_coloring(coloring)
                .with_trace(def.trace);
            if let Some(status) = &def.status {
                tracked = tracked.with_status(status.to_track()?);
            }
            b = b.dataset_in(tracked, def.frame.clone(), def.floors.clone());
        }
        for h in &manifest.highlights {
            b = b.highlight(h.clone());
        }
        for m in &manifest.markers {
            b = b.marker(m.at, m.color, m.label.clone());
        }
        for c in &manifest.circles {
            b = b.circle(c.center, c.radius, c.color);
        }
        for l in &manifest.lines {
            b = b.line(l.from, l.to, l.color);
        }
        for t in &manifest.texts {
            b = b.text(t.text.clone(), t.at, t.color);
        }
        if let Some(spin) = manifest.spin {
            b = b.spin(spin);
        }
        for s in &manifest.playback {
            b = b.segment(*s);
        }
        b.build()
    }

    /// Parse and build a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> OrbitResult<Self> {
        Self::from_manifest(&SceneManifest::from_path(path)?)
    }

    pub fn state(&self) -> &EntityRenderState {
        &self.state
    }

    pub fn display(&self) -> &FrameSpec {
        &self.display
    }

    pub fn system(&self) -> Option<PrimaryPair> {
        self.system
    }

    pub fn opts(&self) -> DriverOpts {
        self.opts
    }

    pub fn playback(&self) -> &[SegmentDef] {
        &self.playback
    }

    /// Render one scrub value with the view at rest.
    pub fn render(&self, scrub: f64) -> OrbitResult<RenderFrame> {
        self.state.render(scrub)
    }

    /// A driver with the playback script queued.
    pub fn into_driver<F: Frontend, C: Clock>(
        self,
        frontend: F,
        clock: C,
    ) -> OrbitResult<PlaybackDriver<F, C>> {
        let mut driver = PlaybackDriver::with_clock(self.state, frontend, self.opts, clock);
        for def in &self.playback {
            driver.enqueue(def.to_segment()?);
        }
        Ok(driver)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/builder.rs"]
mod tests;
